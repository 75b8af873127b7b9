//! Clock skew advisory
//!
//! Signed requests embed a local epoch timestamp the upstream checks against
//! its own clock, so a badly skewed local clock produces confusing signature
//! rejections. At startup the advisor probes a trusted time source and warns
//! the operator when the difference exceeds the tolerance. Purely advisory:
//! an unreachable time source is a warning, never a failed request, and the
//! probe runs on its own task without gating dispatch.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use ruten_domain::constants::{
    CLOCK_SKEW_TOLERANCE_SECS, DEFAULT_TIME_PROBE_URL, TIME_PROBE_TIMEOUT_SECS,
};
use ruten_domain::{Result, RutenError, SkewReport};

/// worldtimeapi-style payload; only the epoch field matters here.
#[derive(Debug, Deserialize)]
struct TimeProbeResponse {
    unixtime: i64,
}

/// Compares the local clock against a trusted external time source.
#[derive(Debug, Clone)]
pub struct ClockSkewAdvisor {
    probe_url: String,
    http: reqwest::Client,
}

impl ClockSkewAdvisor {
    /// Advisor against the default public time source.
    pub fn new() -> Result<Self> {
        Self::with_probe_url(DEFAULT_TIME_PROBE_URL)
    }

    /// Advisor against a custom time endpoint (used by tests).
    pub fn with_probe_url(probe_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIME_PROBE_TIMEOUT_SECS))
            .build()
            .map_err(|e| RutenError::Internal(format!("failed to build probe client: {e}")))?;

        Ok(Self { probe_url: probe_url.into(), http })
    }

    /// Fetch trusted time and compare against the local clock.
    ///
    /// # Errors
    /// Returns `RutenError::Network` when the time source is unreachable or
    /// returns an unusable payload. Callers treat this as "skew unknown".
    pub async fn check_skew(&self) -> Result<SkewReport> {
        let response = self
            .http
            .get(&self.probe_url)
            .send()
            .await
            .map_err(|e| RutenError::Network(format!("time probe failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RutenError::Network(format!(
                "time probe returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let trusted = response
            .json::<TimeProbeResponse>()
            .await
            .map_err(|e| RutenError::Network(format!("time probe payload unusable: {e}")))?;

        let local = Utc::now().timestamp();
        let difference_seconds = (local - trusted.unixtime).abs();

        Ok(SkewReport {
            difference_seconds,
            within_tolerance: difference_seconds <= CLOCK_SKEW_TOLERANCE_SECS,
        })
    }

    /// Run the skew check once on its own task, logging the outcome.
    ///
    /// Never blocks or serializes with request dispatch; every failure mode
    /// is reported as a warning and swallowed.
    pub fn spawn_startup_check(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            match self.check_skew().await {
                Ok(report) if report.within_tolerance => {
                    debug!(
                        difference_seconds = report.difference_seconds,
                        "local clock is in sync with trusted time source"
                    );
                }
                Ok(report) => {
                    warn!(
                        difference_seconds = report.difference_seconds,
                        tolerance_seconds = CLOCK_SKEW_TOLERANCE_SECS,
                        "local clock may be out of sync; signed requests can be rejected upstream"
                    );
                }
                Err(err) => {
                    warn!(error = %err, "could not verify local clock against trusted time source");
                }
            }
        })
    }
}
