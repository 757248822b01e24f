use chrono::NaiveDate;

use super::id::{BookId, LoanId, StudentId};

pub mod event;

/// A lending record. Loans are append-only: issuance creates the row,
/// return closes it exactly once (sets `actual_return_date` and `fine`),
/// settlement flips `paid`. Rows are never deleted.
#[derive(Debug, Clone)]
pub struct Loan {
    pub id: LoanId,
    pub book_id: BookId,
    pub student_id: StudentId,
    pub date_borrowed: NaiveDate,
    pub due_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub fine: Option<i64>,
    pub paid: bool,
}

impl Loan {
    /// A copy is currently checked out under this loan.
    pub fn is_open(&self) -> bool {
        self.actual_return_date.is_none()
    }
}

/// One row of the unpaid-fines listing.
#[derive(Debug, Clone)]
pub struct UnpaidFine {
    pub student_id: StudentId,
    pub book_id: BookId,
    pub fine: i64,
}
