pub mod models;
pub mod subscribers;
pub mod sync;
