//! Record encoding.

use serde::de::DeserializeOwned;
use serde::Serialize;

use y2a_models::{HistoryItem, Job, User};

use crate::repos::ConverterRegistration;

/// A value that can be stored in a collection.
///
/// The store only sees bytes; each record type owns its encoding. The default
/// encoding is JSON.
pub trait Record: Serialize + DeserializeOwned {
    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl Record for User {}
impl Record for Job {}
impl Record for HistoryItem {}
impl Record for ConverterRegistration {}
