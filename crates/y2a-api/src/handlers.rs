//! Request handlers.

pub mod converter;
pub mod health;
pub mod jobs;
pub mod users;

pub use converter::*;
pub use health::*;
pub use jobs::*;
pub use users::*;
