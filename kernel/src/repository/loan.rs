use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    id::{BookId, LoanId},
    loan::{
        event::{IssueLoan, ReturnLoan, SettleFine},
        Loan, UnpaidFine,
    },
};

#[mockall::automock]
#[async_trait]
pub trait LoanRepository: Send + Sync {
    // Lending operation: open-loan guard, conditional copy reservation and
    // loan insert commit as one unit
    async fn issue(&self, event: IssueLoan) -> AppResult<LoanId>;
    // Return operation: closes the open loan and releases the copy as one
    // unit; yields the fine charged (0 when on time)
    async fn return_loan(&self, event: ReturnLoan) -> AppResult<i64>;
    // All loans still out
    async fn find_unreturned_all(&self) -> AppResult<Vec<Loan>>;
    // Lending history for one book, returned loans included
    async fn find_history_by_book_id(&self, book_id: BookId) -> AppResult<Vec<Loan>>;
    // Closed loans with a fine charged and not yet paid
    async fn unpaid_fines(&self) -> AppResult<Vec<UnpaidFine>>;
    // Marks the most recent unpaid fine for the pair as paid
    async fn settle(&self, event: SettleFine) -> AppResult<()>;
}
