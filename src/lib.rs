// Re-export the platform-agnostic core
pub use chatcore::{prompt, query, thread, types};

pub mod app;
pub mod auth;
pub mod calls;
pub mod client;
pub mod composer;
pub mod config;
pub mod conversation;
pub mod error;
pub mod features;
pub mod gemini;
pub mod http;
pub mod profile_cache;
pub mod realtime;
pub mod recorder;
pub mod rest;
pub mod suggest;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_utils;

pub use app::{ChatApp, ChatAppBuilder};
pub use client::Client;
pub use config::ClientConfig;
pub use error::ClientError;
