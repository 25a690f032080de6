//! Outbound HTTP collaborators.
//!
//! This crate provides:
//! - The converter worker client (dispatch a job, delete an artifact)
//! - The video metadata source used before dispatch

pub mod converter;
pub mod error;
pub mod youtube;

pub use converter::{ConverterClient, ConverterClientConfig, DispatchRequest};
pub use error::{ClientError, ClientResult};
pub use youtube::{Format, MetadataSource, VideoInfo, VideoInfoClient, VideoInfoConfig};
