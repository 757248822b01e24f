use shared::error::AppError;

use super::id::BookId;

pub mod event;

#[derive(Debug, Clone)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub copies_available: i64,
    pub category: BookCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookCategory {
    Science,
    Fiction,
    History,
    Technology,
    Other,
}

impl std::fmt::Display for BookCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BookCategory::Science => "Science",
            BookCategory::Fiction => "Fiction",
            BookCategory::History => "History",
            BookCategory::Technology => "Technology",
            BookCategory::Other => "Other",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for BookCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Science" => Ok(BookCategory::Science),
            "Fiction" => Ok(BookCategory::Fiction),
            "History" => Ok(BookCategory::History),
            "Technology" => Ok(BookCategory::Technology),
            "Other" => Ok(BookCategory::Other),
            other => Err(AppError::ConversionEntityError(format!(
                "unknown book category: {other}"
            ))),
        }
    }
}
