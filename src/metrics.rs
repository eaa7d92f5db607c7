// SPDX-License-Identifier: Apache-2.0
//! Prometheus metrics for the contact gateway

use lazy_static::lazy_static;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

lazy_static! {
    /// Submissions accepted and stored
    pub static ref CONTACT_ACCEPTED: IntCounter = register_int_counter!(
        "contact_submissions_accepted_total",
        "Contact submissions accepted and stored"
    )
    .unwrap();

    /// Submissions rejected by the quota
    pub static ref CONTACT_RATE_LIMITED: IntCounter = register_int_counter!(
        "contact_submissions_rate_limited_total",
        "Contact submissions rejected by the rate limit"
    )
    .unwrap();

    /// Submissions rejected by validation
    pub static ref CONTACT_REJECTED: IntCounter = register_int_counter!(
        "contact_submissions_rejected_total",
        "Contact submissions rejected as malformed"
    )
    .unwrap();

    /// Submissions that passed the quota but failed to store
    pub static ref CONTACT_FAILED: IntCounter = register_int_counter!(
        "contact_submission_failures_total",
        "Contact submissions that failed to store"
    )
    .unwrap();

    /// Ledger rows removed by the sweep
    pub static ref LEDGER_ROWS_SWEPT: IntCounter = register_int_counter!(
        "contact_ledger_rows_swept_total",
        "Expired rate-limit windows removed by the sweep"
    )
    .unwrap();
}

/// Render all registered metrics in the Prometheus text format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
