// SPDX-License-Identifier: Apache-2.0

//! Portfolio API library.
//!
//! Backend for an academic personal site:
//!
//! - Public contact gateway with a database-backed sliding-window
//!   rate limit per source address
//! - Public content reads (profile, publications, research projects,
//!   students, gallery)
//! - Bearer-token admin API for message triage and content editing
//! - Periodic sweep of expired rate-limit ledger rows

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod models;
pub mod validator;

pub use config::Config;
pub use db::Database;
pub use error::{AppError, Result};
pub use limiter::{QuotaDecision, SubmissionLimiter};
