pub mod book;
pub mod id;
pub mod loan;
pub mod student;
