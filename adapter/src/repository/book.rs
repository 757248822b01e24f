use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{
        book::{event::CreateBook, Book},
        id::BookId,
    },
    repository::book::BookRepository,
};
use shared::error::{AppError, AppResult};

use crate::database::{model::book::BookRow, ConnectionPool};

#[derive(new)]
pub struct BookRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl BookRepository for BookRepositoryImpl {
    async fn create(&self, event: CreateBook) -> AppResult<BookId> {
        if event.copies_available < 0 {
            return Err(AppError::UnprocessableEntity(
                "copies_available must not be negative".into(),
            ));
        }

        let book_id = BookId::new();
        sqlx::query(
            "INSERT INTO books (book_id, title, author, isbn, copies_available, category)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(book_id.to_string())
        .bind(&event.title)
        .bind(&event.author)
        .bind(&event.isbn)
        .bind(event.copies_available)
        .bind(event.category.to_string())
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(book_id)
    }

    async fn find_by_id(&self, book_id: BookId) -> AppResult<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(
            "SELECT book_id, title, author, isbn, copies_available, category
             FROM books
             WHERE book_id = ?",
        )
        .bind(book_id.to_string())
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.map(Book::try_from).transpose()
    }

    async fn availability(&self, book_id: BookId) -> AppResult<i64> {
        let copies: Option<i64> =
            sqlx::query_scalar("SELECT copies_available FROM books WHERE book_id = ?")
                .bind(book_id.to_string())
                .fetch_optional(self.db.inner_ref())
                .await
                .map_err(AppError::SpecificOperationError)?;

        copies.ok_or_else(|| AppError::EntityNotFound(format!("book not found: {book_id}")))
    }
}
