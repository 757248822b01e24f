use std::sync::Arc;

use adapter::{
    database::ConnectionPool,
    repository::{
        book::BookRepositoryImpl, loan::LoanRepositoryImpl, student::StudentRepositoryImpl,
    },
};
use kernel::repository::{
    book::BookRepository, loan::LoanRepository, student::StudentRepository,
};
use shared::clock::{Clock, SystemClock};

/// Wires the concrete repositories to one pool and hands them out as trait
/// objects. Callers pull `clock().today()` into the loan events they build,
/// so tests can pin the date.
#[derive(Clone)]
pub struct AppRegistry {
    book_repository: Arc<dyn BookRepository>,
    student_repository: Arc<dyn StudentRepository>,
    loan_repository: Arc<dyn LoanRepository>,
    clock: Arc<dyn Clock>,
}

impl AppRegistry {
    pub fn new(pool: ConnectionPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: ConnectionPool, clock: Arc<dyn Clock>) -> Self {
        let book_repository: Arc<dyn BookRepository> =
            Arc::new(BookRepositoryImpl::new(pool.clone()));
        let student_repository: Arc<dyn StudentRepository> =
            Arc::new(StudentRepositoryImpl::new(pool.clone()));
        let loan_repository: Arc<dyn LoanRepository> = Arc::new(LoanRepositoryImpl::new(pool));
        Self {
            book_repository,
            student_repository,
            loan_repository,
            clock,
        }
    }

    pub fn book_repository(&self) -> Arc<dyn BookRepository> {
        self.book_repository.clone()
    }

    pub fn student_repository(&self) -> Arc<dyn StudentRepository> {
        self.student_repository.clone()
    }

    pub fn loan_repository(&self) -> Arc<dyn LoanRepository> {
        self.loan_repository.clone()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }
}
