pub mod file;
pub mod repository;
pub mod submission;
