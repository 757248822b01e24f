pub mod fine;
pub mod model;
pub mod repository;
