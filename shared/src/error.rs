use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    EntityNotFound(String),
    #[error("no copies of the book are currently available: {0}")]
    OutOfStock(String),
    #[error("the student already has this book on loan: {0}")]
    AlreadyOutstanding(String),
    #[error("no open loan exists for this book and student: {0}")]
    NoOpenLoan(String),
    #[error("no unpaid fine exists for this book and student: {0}")]
    NoUnpaidFine(String),
    // sqlx::Error appears in more than one variant, so [from] cannot be
    // used here; [source] keeps the cause chain intact.
    #[error("failed to run the transaction")]
    TransactionError(#[source] sqlx::Error),
    #[error("an error occurred while executing a database operation")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("no rows affected: {0}")]
    NoRowAffectedError(String),
    #[error("{0}")]
    ConvertToUuidError(#[from] uuid::Error),
    #[error("{0}")]
    ConversionEntityError(String),
}

pub type AppResult<T> = Result<T, AppError>;
