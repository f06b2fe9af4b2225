pub mod api;
pub mod clock;
pub mod common;
pub mod config;
pub mod error;
pub mod presence;
pub mod storage;

pub use error::{ChatError, ChatResult};
