//! # Glycoscope
//!
//! Diabetes risk screening console backed by a remote scoring service.
//!
//! This crate provides:
//! - Local validation of screening metrics before anything reaches the
//!   network
//! - A typed client for the remote scoring service
//! - A session state store that keeps one canonical prediction live and
//!   reconciles out-of-order responses by revision
//! - Derived views: detailed breakdown, per-feature risk map, what-if
//!   probes, history trend and model/usage statistics
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (metrics, predictions, risk tiers)
//! - `ports`: Trait definition for the remote scoring service
//! - `adapters`: Concrete HTTP implementation of the scoring port
//! - `application`: Session orchestration, analytics, what-if, history

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

pub use application::{HistoryLedger, InsightBoard, SessionService, WhatIfService};
pub use domain::{HealthMetrics, MetricsDraft, Prediction};

/// Result type for Glycoscope operations
pub type Result<T> = std::result::Result<T, GlycoscopeError>;

/// Main error type for Glycoscope
#[derive(Debug, thiserror::Error)]
pub enum GlycoscopeError {
    #[error("invalid screening input: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("scoring service failure: {0}")]
    Scoring(#[from] ports::ScoringError),

    #[error("analytics failure: {0}")]
    Analytics(#[from] application::AnalyticsError),

    #[error("session state unavailable: {0}")]
    State(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
