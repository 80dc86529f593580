pub mod models;
pub mod sender;
pub mod subscribers;
