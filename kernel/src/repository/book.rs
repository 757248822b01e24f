use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    book::{event::CreateBook, Book},
    id::BookId,
};

#[mockall::automock]
#[async_trait]
pub trait BookRepository: Send + Sync {
    // Catalog insertion
    async fn create(&self, event: CreateBook) -> AppResult<BookId>;
    async fn find_by_id(&self, book_id: BookId) -> AppResult<Option<Book>>;
    // Current copies_available; EntityNotFound when the book is unknown
    async fn availability(&self, book_id: BookId) -> AppResult<i64>;
}
