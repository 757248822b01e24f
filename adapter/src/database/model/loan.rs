use chrono::NaiveDate;
use kernel::model::loan::{Loan, UnpaidFine};
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct LoanRow {
    pub loan_id: String,
    pub book_id: String,
    pub student_id: String,
    pub date_borrowed: NaiveDate,
    pub due_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub fine: Option<i64>,
    pub paid: bool,
}

impl TryFrom<LoanRow> for Loan {
    type Error = AppError;

    fn try_from(row: LoanRow) -> Result<Self, Self::Error> {
        Ok(Loan {
            id: row.loan_id.parse()?,
            book_id: row.book_id.parse()?,
            student_id: row.student_id.parse()?,
            date_borrowed: row.date_borrowed,
            due_date: row.due_date,
            actual_return_date: row.actual_return_date,
            fine: row.fine,
            paid: row.paid,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct UnpaidFineRow {
    pub student_id: String,
    pub book_id: String,
    pub fine: i64,
}

impl TryFrom<UnpaidFineRow> for UnpaidFine {
    type Error = AppError;

    fn try_from(row: UnpaidFineRow) -> Result<Self, Self::Error> {
        Ok(UnpaidFine {
            student_id: row.student_id.parse()?,
            book_id: row.book_id.parse()?,
            fine: row.fine,
        })
    }
}
