//! # Application Layer

pub mod manager;

pub use manager::TransactionManager;
