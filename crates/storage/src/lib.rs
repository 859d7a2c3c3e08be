#![forbid(unsafe_code)]

pub mod json;
pub mod repository;

pub use repository::{Storage, StorageError};
