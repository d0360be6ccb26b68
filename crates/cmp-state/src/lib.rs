#![doc = include_str!("../README.md")]

mod consent_store;
mod repository;

pub use consent_store::{keys, ConsentRecord, ConsentStore};
pub use repository::{ConsentRepository, InMemoryRepository, RepositoryError};
