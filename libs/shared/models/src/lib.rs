pub mod client;
pub mod error;
pub mod professional;
pub mod repository;
