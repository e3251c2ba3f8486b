//! Adapters layer: Concrete implementations of ports.
//!
//! - `http`: blocking HTTP/JSON client for the remote scoring service

pub mod http;

pub use http::{HttpScoringClient, ServiceConfig};
