use async_trait::async_trait;
use chrono::NaiveDate;
use derive_new::new;
use kernel::{
    fine,
    model::{
        id::{BookId, LoanId},
        loan::{
            event::{IssueLoan, ReturnLoan, SettleFine},
            Loan, UnpaidFine,
        },
    },
    repository::loan::LoanRepository,
};
use shared::error::{AppError, AppResult};

use crate::database::{
    model::loan::{LoanRow, UnpaidFineRow},
    ConnectionPool,
};

#[derive(new)]
pub struct LoanRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl LoanRepository for LoanRepositoryImpl {
    async fn issue(&self, event: IssueLoan) -> AppResult<LoanId> {
        let mut tx = self.db.begin().await?;

        // Guard: at most one open loan per (book, student) pair. The same
        // check is enforced by a partial unique index, so a racing issuance
        // that slips past this read still cannot create a duplicate.
        let open: Option<String> = sqlx::query_scalar(
            "SELECT loan_id FROM loans
             WHERE book_id = ? AND student_id = ? AND actual_return_date IS NULL",
        )
        .bind(event.book_id.to_string())
        .bind(event.student_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;
        if open.is_some() {
            return Err(AppError::AlreadyOutstanding(format!(
                "book {} / student {}",
                event.book_id, event.student_id
            )));
        }

        let student: Option<String> =
            sqlx::query_scalar("SELECT student_id FROM students WHERE student_id = ?")
                .bind(event.student_id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(AppError::SpecificOperationError)?;
        if student.is_none() {
            return Err(AppError::EntityNotFound(format!(
                "student not found: {}",
                event.student_id
            )));
        }

        // Reserve one copy. The conditional update is the linearization
        // point: the row count tells an empty shelf apart from a book that
        // was never catalogued.
        let reserved = sqlx::query(
            "UPDATE books SET copies_available = copies_available - 1
             WHERE book_id = ? AND copies_available > 0",
        )
        .bind(event.book_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;
        if reserved.rows_affected() == 0 {
            let known: Option<i64> =
                sqlx::query_scalar("SELECT copies_available FROM books WHERE book_id = ?")
                    .bind(event.book_id.to_string())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(AppError::SpecificOperationError)?;
            return Err(match known {
                Some(_) => AppError::OutOfStock(event.book_id.to_string()),
                None => AppError::EntityNotFound(format!("book not found: {}", event.book_id)),
            });
        }

        // The loan row and the reservation above commit or roll back as one
        // unit; dropping the transaction on any error path undoes the
        // decrement.
        let loan_id = LoanId::new();
        sqlx::query(
            "INSERT INTO loans (loan_id, book_id, student_id, date_borrowed, due_date)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(loan_id.to_string())
        .bind(event.book_id.to_string())
        .bind(event.student_id.to_string())
        .bind(event.today)
        .bind(fine::due_date(event.today))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                AppError::AlreadyOutstanding(format!(
                    "book {} / student {}",
                    event.book_id, event.student_id
                ))
            } else {
                AppError::SpecificOperationError(e)
            }
        })?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(loan_id)
    }

    async fn return_loan(&self, event: ReturnLoan) -> AppResult<i64> {
        let mut tx = self.db.begin().await?;

        let open: Option<(String, NaiveDate)> = sqlx::query_as(
            "SELECT loan_id, due_date FROM loans
             WHERE book_id = ? AND student_id = ? AND actual_return_date IS NULL",
        )
        .bind(event.book_id.to_string())
        .bind(event.student_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;
        let Some((loan_id, due_date)) = open else {
            return Err(AppError::NoOpenLoan(format!(
                "book {} / student {}",
                event.book_id, event.student_id
            )));
        };

        let charged = fine::calculate_fine(due_date, event.today);

        // Closing the loan and releasing the copy commit together. The
        // IS NULL condition makes a second close a no-op we can detect.
        let closed = sqlx::query(
            "UPDATE loans SET actual_return_date = ?, fine = ?
             WHERE loan_id = ? AND actual_return_date IS NULL",
        )
        .bind(event.today)
        .bind(charged)
        .bind(&loan_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;
        if closed.rows_affected() == 0 {
            return Err(AppError::NoRowAffectedError(format!(
                "loan already closed: {loan_id}"
            )));
        }

        let released =
            sqlx::query("UPDATE books SET copies_available = copies_available + 1 WHERE book_id = ?")
                .bind(event.book_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(AppError::SpecificOperationError)?;
        if released.rows_affected() == 0 {
            return Err(AppError::EntityNotFound(format!(
                "book not found: {}",
                event.book_id
            )));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(charged)
    }

    async fn find_unreturned_all(&self) -> AppResult<Vec<Loan>> {
        let rows: Vec<LoanRow> = sqlx::query_as(
            "SELECT loan_id, book_id, student_id, date_borrowed, due_date,
                    actual_return_date, fine, paid
             FROM loans
             WHERE actual_return_date IS NULL
             ORDER BY date_borrowed ASC, loan_id ASC",
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Loan::try_from).collect()
    }

    async fn find_history_by_book_id(&self, book_id: BookId) -> AppResult<Vec<Loan>> {
        let rows: Vec<LoanRow> = sqlx::query_as(
            "SELECT loan_id, book_id, student_id, date_borrowed, due_date,
                    actual_return_date, fine, paid
             FROM loans
             WHERE book_id = ?
             ORDER BY date_borrowed DESC, loan_id ASC",
        )
        .bind(book_id.to_string())
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Loan::try_from).collect()
    }

    async fn unpaid_fines(&self) -> AppResult<Vec<UnpaidFine>> {
        let rows: Vec<UnpaidFineRow> = sqlx::query_as(
            "SELECT student_id, book_id, fine
             FROM loans
             WHERE actual_return_date IS NOT NULL AND fine > 0 AND paid = FALSE
             ORDER BY actual_return_date ASC, loan_id ASC",
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(UnpaidFine::try_from).collect()
    }

    async fn settle(&self, event: SettleFine) -> AppResult<()> {
        // Settles only the most recent unpaid fine for the pair; earlier
        // settled loans between the same pair stay untouched.
        let res = sqlx::query(
            "UPDATE loans SET paid = TRUE
             WHERE loan_id = (
                 SELECT loan_id FROM loans
                 WHERE student_id = ? AND book_id = ?
                   AND actual_return_date IS NOT NULL AND fine > 0 AND paid = FALSE
                 ORDER BY actual_return_date DESC, date_borrowed DESC
                 LIMIT 1
             )",
        )
        .bind(event.student_id.to_string())
        .bind(event.book_id.to_string())
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() == 0 {
            return Err(AppError::NoUnpaidFine(format!(
                "book {} / student {}",
                event.book_id, event.student_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kernel::{
        model::{
            book::{event::CreateBook, BookCategory},
            id::StudentId,
            student::event::CreateStudent,
        },
        repository::{book::BookRepository, student::StudentRepository},
    };

    use super::*;
    use crate::{
        database::connect_test_database,
        repository::{book::BookRepositoryImpl, student::StudentRepositoryImpl},
    };

    struct Fixture {
        pool: ConnectionPool,
        books: BookRepositoryImpl,
        loans: LoanRepositoryImpl,
    }

    impl Fixture {
        async fn new() -> Self {
            let pool = connect_test_database().await;
            Self {
                books: BookRepositoryImpl::new(pool.clone()),
                loans: LoanRepositoryImpl::new(pool.clone()),
                pool,
            }
        }

        async fn add_book(&self, copies: i64) -> BookId {
            self.books
                .create(CreateBook {
                    title: "The Left Hand of Darkness".into(),
                    author: "Ursula K. Le Guin".into(),
                    isbn: "978-0441478125".into(),
                    copies_available: copies,
                    category: BookCategory::Fiction,
                })
                .await
                .unwrap()
        }

        async fn enroll(&self, name: &str) -> StudentId {
            StudentRepositoryImpl::new(self.pool.clone())
                .create(CreateStudent {
                    name: name.into(),
                    email: "someone@example.edu".into(),
                    phone: "555-0100".into(),
                    department: "Physics".into(),
                })
                .await
                .unwrap()
        }

        async fn copies(&self, book_id: BookId) -> i64 {
            self.books.availability(book_id).await.unwrap()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn issuing_reserves_one_copy_and_sets_the_due_date() {
        let fx = Fixture::new().await;
        let book_id = fx.add_book(3).await;
        let student_id = fx.enroll("Ada Lovelace").await;

        let loan_id = fx
            .loans
            .issue(IssueLoan {
                book_id,
                student_id,
                today: date(2024, 1, 1),
            })
            .await
            .unwrap();

        assert_eq!(fx.copies(book_id).await, 2);

        let open = fx.loans.find_unreturned_all().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, loan_id);
        assert!(open[0].is_open());
        assert_eq!(open[0].date_borrowed, date(2024, 1, 1));
        assert_eq!(open[0].due_date, date(2024, 1, 15));
    }

    #[tokio::test]
    async fn issuing_with_no_copies_left_fails_and_mutates_nothing() {
        let fx = Fixture::new().await;
        let book_id = fx.add_book(0).await;
        let student_id = fx.enroll("Ada Lovelace").await;

        let err = fx
            .loans
            .issue(IssueLoan {
                book_id,
                student_id,
                today: date(2024, 1, 1),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::OutOfStock(_)));
        assert_eq!(fx.copies(book_id).await, 0);
        assert!(fx.loans.find_unreturned_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn issuing_an_uncatalogued_book_is_not_found() {
        let fx = Fixture::new().await;
        let student_id = fx.enroll("Ada Lovelace").await;

        let err = fx
            .loans
            .issue(IssueLoan {
                book_id: BookId::new(),
                student_id,
                today: date(2024, 1, 1),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::EntityNotFound(_)));
    }

    #[tokio::test]
    async fn issuing_to_an_unknown_student_is_not_found() {
        let fx = Fixture::new().await;
        let book_id = fx.add_book(1).await;

        let err = fx
            .loans
            .issue(IssueLoan {
                book_id,
                student_id: StudentId::new(),
                today: date(2024, 1, 1),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::EntityNotFound(_)));
        assert_eq!(fx.copies(book_id).await, 1);
    }

    #[tokio::test]
    async fn a_second_issue_for_the_same_pair_is_rejected() {
        let fx = Fixture::new().await;
        let book_id = fx.add_book(3).await;
        let student_id = fx.enroll("Ada Lovelace").await;
        let today = date(2024, 1, 1);

        fx.loans
            .issue(IssueLoan {
                book_id,
                student_id,
                today,
            })
            .await
            .unwrap();
        let err = fx
            .loans
            .issue(IssueLoan {
                book_id,
                student_id,
                today,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AlreadyOutstanding(_)));
        // decremented exactly once
        assert_eq!(fx.copies(book_id).await, 2);
    }

    #[tokio::test]
    async fn returning_on_time_releases_the_copy_without_a_fine() {
        let fx = Fixture::new().await;
        let book_id = fx.add_book(1).await;
        let student_id = fx.enroll("Ada Lovelace").await;

        fx.loans
            .issue(IssueLoan {
                book_id,
                student_id,
                today: date(2024, 1, 1),
            })
            .await
            .unwrap();
        let charged = fx
            .loans
            .return_loan(ReturnLoan {
                book_id,
                student_id,
                today: date(2024, 1, 15),
            })
            .await
            .unwrap();

        assert_eq!(charged, 0);
        assert_eq!(fx.copies(book_id).await, 1);
        assert!(fx.loans.find_unreturned_all().await.unwrap().is_empty());

        let history = fx.loans.find_history_by_book_id(book_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].is_open());
        assert_eq!(history[0].actual_return_date, Some(date(2024, 1, 15)));
        assert_eq!(history[0].fine, Some(0));
    }

    #[tokio::test]
    async fn a_late_return_is_fined_per_day() {
        let fx = Fixture::new().await;
        let book_id = fx.add_book(1).await;
        let student_id = fx.enroll("Ada Lovelace").await;

        fx.loans
            .issue(IssueLoan {
                book_id,
                student_id,
                today: date(2024, 1, 1),
            })
            .await
            .unwrap();
        // due 2024-01-15, returned two days past it
        let charged = fx
            .loans
            .return_loan(ReturnLoan {
                book_id,
                student_id,
                today: date(2024, 1, 17),
            })
            .await
            .unwrap();

        assert_eq!(charged, 200);
        assert_eq!(fx.copies(book_id).await, 1);
    }

    #[tokio::test]
    async fn returning_with_nothing_open_fails() {
        let fx = Fixture::new().await;
        let book_id = fx.add_book(1).await;
        let student_id = fx.enroll("Ada Lovelace").await;

        let err = fx
            .loans
            .return_loan(ReturnLoan {
                book_id,
                student_id,
                today: date(2024, 1, 1),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NoOpenLoan(_)));
        assert_eq!(fx.copies(book_id).await, 1);
    }

    #[tokio::test]
    async fn the_pair_can_borrow_again_after_returning() {
        let fx = Fixture::new().await;
        let book_id = fx.add_book(1).await;
        let student_id = fx.enroll("Ada Lovelace").await;

        fx.loans
            .issue(IssueLoan {
                book_id,
                student_id,
                today: date(2024, 1, 1),
            })
            .await
            .unwrap();
        fx.loans
            .return_loan(ReturnLoan {
                book_id,
                student_id,
                today: date(2024, 1, 8),
            })
            .await
            .unwrap();
        fx.loans
            .issue(IssueLoan {
                book_id,
                student_id,
                today: date(2024, 2, 1),
            })
            .await
            .unwrap();

        assert_eq!(fx.copies(book_id).await, 0);
        assert_eq!(
            fx.loans.find_history_by_book_id(book_id).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn two_concurrent_issues_cannot_share_the_last_copy() {
        let fx = Fixture::new().await;
        let book_id = fx.add_book(1).await;
        let first = fx.enroll("Ada Lovelace").await;
        let second = fx.enroll("Alan Turing").await;
        let today = date(2024, 1, 1);

        let loans = Arc::new(LoanRepositoryImpl::new(fx.pool.clone()));
        let a = tokio::spawn({
            let loans = Arc::clone(&loans);
            async move {
                loans
                    .issue(IssueLoan {
                        book_id,
                        student_id: first,
                        today,
                    })
                    .await
            }
        });
        let b = tokio::spawn({
            let loans = Arc::clone(&loans);
            async move {
                loans
                    .issue(IssueLoan {
                        book_id,
                        student_id: second,
                        today,
                    })
                    .await
            }
        });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let err = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(matches!(err, AppError::OutOfStock(_)));
        assert_eq!(fx.copies(book_id).await, 0);
        assert_eq!(fx.loans.find_unreturned_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unpaid_fines_are_listed_until_settled() {
        let fx = Fixture::new().await;
        let book_id = fx.add_book(1).await;
        let student_id = fx.enroll("Ada Lovelace").await;

        fx.loans
            .issue(IssueLoan {
                book_id,
                student_id,
                today: date(2024, 1, 1),
            })
            .await
            .unwrap();
        fx.loans
            .return_loan(ReturnLoan {
                book_id,
                student_id,
                today: date(2024, 1, 20),
            })
            .await
            .unwrap();

        let fines = fx.loans.unpaid_fines().await.unwrap();
        assert_eq!(fines.len(), 1);
        assert_eq!(fines[0].student_id, student_id);
        assert_eq!(fines[0].book_id, book_id);
        assert_eq!(fines[0].fine, 500);

        fx.loans
            .settle(SettleFine {
                student_id,
                book_id,
            })
            .await
            .unwrap();
        assert!(fx.loans.unpaid_fines().await.unwrap().is_empty());

        // nothing left to settle
        let err = fx
            .loans
            .settle(SettleFine {
                student_id,
                book_id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoUnpaidFine(_)));
    }

    #[tokio::test]
    async fn an_on_time_return_leaves_nothing_to_settle() {
        let fx = Fixture::new().await;
        let book_id = fx.add_book(1).await;
        let student_id = fx.enroll("Ada Lovelace").await;

        fx.loans
            .issue(IssueLoan {
                book_id,
                student_id,
                today: date(2024, 1, 1),
            })
            .await
            .unwrap();
        fx.loans
            .return_loan(ReturnLoan {
                book_id,
                student_id,
                today: date(2024, 1, 10),
            })
            .await
            .unwrap();

        assert!(fx.loans.unpaid_fines().await.unwrap().is_empty());
        let err = fx
            .loans
            .settle(SettleFine {
                student_id,
                book_id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoUnpaidFine(_)));
    }

    #[tokio::test]
    async fn settlement_takes_the_most_recent_fine_first() {
        let fx = Fixture::new().await;
        let book_id = fx.add_book(1).await;
        let student_id = fx.enroll("Ada Lovelace").await;

        // two late loans for the same pair, returned on different dates
        for (out, back) in [
            (date(2024, 1, 1), date(2024, 1, 20)),
            (date(2024, 2, 1), date(2024, 2, 25)),
        ] {
            fx.loans
                .issue(IssueLoan {
                    book_id,
                    student_id,
                    today: out,
                })
                .await
                .unwrap();
            fx.loans
                .return_loan(ReturnLoan {
                    book_id,
                    student_id,
                    today: back,
                })
                .await
                .unwrap();
        }
        assert_eq!(fx.loans.unpaid_fines().await.unwrap().len(), 2);

        fx.loans
            .settle(SettleFine {
                student_id,
                book_id,
            })
            .await
            .unwrap();

        // the February loan is settled, the January one still owes 500
        let remaining = fx.loans.unpaid_fines().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].fine, 500);

        let history = fx.loans.find_history_by_book_id(book_id).await.unwrap();
        let paid_dates: Vec<_> = history
            .iter()
            .filter(|l| l.paid)
            .map(|l| l.actual_return_date.unwrap())
            .collect();
        assert_eq!(paid_dates, vec![date(2024, 2, 25)]);
    }
}
