use super::BookCategory;

#[derive(Debug)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub copies_available: i64,
    pub category: BookCategory,
}
