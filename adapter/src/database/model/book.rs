use kernel::model::book::Book;
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct BookRow {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub copies_available: i64,
    pub category: String,
}

impl TryFrom<BookRow> for Book {
    type Error = AppError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Book {
            id: row.book_id.parse()?,
            title: row.title,
            author: row.author,
            isbn: row.isbn,
            copies_available: row.copies_available,
            category: row.category.parse()?,
        })
    }
}
