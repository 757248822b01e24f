use chrono::NaiveDate;

use super::super::id::{BookId, StudentId};

/// Check a copy out to a student. `today` becomes the borrow date; the
/// due date is derived from it by the fine policy.
#[derive(Debug, Clone, Copy)]
pub struct IssueLoan {
    pub book_id: BookId,
    pub student_id: StudentId,
    pub today: NaiveDate,
}

/// Return the copy currently checked out for this (book, student) pair.
#[derive(Debug, Clone, Copy)]
pub struct ReturnLoan {
    pub book_id: BookId,
    pub student_id: StudentId,
    pub today: NaiveDate,
}

/// Mark the most recent unpaid fine for this pair as paid.
#[derive(Debug, Clone, Copy)]
pub struct SettleFine {
    pub student_id: StudentId,
    pub book_id: BookId,
}
