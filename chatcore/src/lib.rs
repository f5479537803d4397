pub mod auth;
pub mod feed;
pub mod media;
pub mod net;
pub mod prompt;
pub mod query;
pub mod realtime;
pub mod thread;
pub mod types;

pub use types::*;
