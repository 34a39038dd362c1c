//! External collaborator seams
//!
//! The REST command API and the identity provider live outside this crate.
//! The engine talks to them only through [`CommandApi`] and the
//! [`AuthState`] watch channel, so tests substitute in-memory fakes.

pub mod auth;
pub mod client;
pub mod config;
pub mod types;

pub use auth::{auth_channel, AuthState, SharedToken, TokenProvider};
pub use client::{CommandApi, HttpCommandApi};
pub use config::ApiConfig;
pub use types::{CameraRecord, CameraSettings, MessageResponse, NewCamera};
