pub mod events;
pub mod models;
pub mod repository;
pub mod services;
