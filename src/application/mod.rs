//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with the scoring port: the
//! session state store, the derived analytics, the what-if engine, the
//! history ledger and the revision-stamped refresh pipeline.

pub mod analytics;
mod history;
mod insights;
mod session;
mod what_if;
mod worker;

pub use analytics::{AnalyticsError, HistorySummary, TierSummary, TrendPoint};
pub use history::{HistoryLedger, HistoryMirror};
pub use insights::InsightBoard;
pub use session::{Revision, SessionService, SessionSnapshot, Stamped, SubscriptionId};
pub use what_if::WhatIfService;
pub use worker::{RefreshUpdate, RefreshWorker, RefreshWorkerHandle};
