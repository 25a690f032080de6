//! Durable record store.
//!
//! This crate provides:
//! - A fixed set of named collections declared when the store is opened
//! - Load / save / delete of opaque records by string key (redb transactions)
//! - The `Record` trait records use to encode themselves
//! - Typed repositories for owners, jobs, history items and converter registrations

pub mod collections;
pub mod error;
pub mod record;
pub mod repos;
pub mod store;

pub use collections::{CONVERTERS, DEFAULT_COLLECTIONS, HISTORY, JOBS, USERS};
pub use error::{StoreError, StoreResult};
pub use record::Record;
pub use repos::{
    ConverterRegistration, ConverterRepository, HistoryRepository, JobRepository, UserRepository,
};
pub use store::{Store, StoreConfig};
