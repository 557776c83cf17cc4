//! Per-endpoint health classification with hysteresis.
//!
//! An endpoint becomes healthy after `healthy_threshold` consecutive
//! passing probes and unhealthy after `unhealthy_threshold` consecutive
//! failures; anything in between retains the previous classification.

use tracing::{debug, warn};

use cutover_state::HealthCheckConfig;

/// Result of a single probe against one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The health endpoint returned 2xx.
    Pass,
    /// The health endpoint returned non-2xx.
    Fail,
    /// The probe could not reach the endpoint (connect error or timeout).
    Error,
}

/// Classification of a single endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointHealth {
    Healthy,
    Unhealthy,
    /// Not enough consecutive results yet to classify either way.
    Unknown,
}

/// Tracks consecutive probe results for a single endpoint.
#[derive(Debug)]
pub struct EndpointTracker {
    status: EndpointHealth,
    consecutive_passes: u32,
    consecutive_failures: u32,
    healthy_threshold: u32,
    unhealthy_threshold: u32,
}

impl EndpointTracker {
    /// Create a tracker from a pool's health check config.
    pub fn new(config: &HealthCheckConfig) -> Self {
        Self::with_thresholds(config.healthy_threshold, config.unhealthy_threshold)
    }

    /// Create a tracker with explicit thresholds.
    pub fn with_thresholds(healthy_threshold: u32, unhealthy_threshold: u32) -> Self {
        Self {
            status: EndpointHealth::Unknown,
            consecutive_passes: 0,
            consecutive_failures: 0,
            healthy_threshold: healthy_threshold.max(1),
            unhealthy_threshold: unhealthy_threshold.max(1),
        }
    }

    /// Record a probe outcome and return the new classification.
    pub fn record(&mut self, outcome: ProbeOutcome) -> EndpointHealth {
        match outcome {
            ProbeOutcome::Pass => {
                self.consecutive_failures = 0;
                self.consecutive_passes += 1;
                if self.consecutive_passes >= self.healthy_threshold {
                    if self.status != EndpointHealth::Healthy {
                        debug!(
                            passes = self.consecutive_passes,
                            "endpoint classified healthy"
                        );
                    }
                    self.status = EndpointHealth::Healthy;
                }
            }
            ProbeOutcome::Fail | ProbeOutcome::Error => {
                self.consecutive_passes = 0;
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.unhealthy_threshold {
                    if self.status != EndpointHealth::Unhealthy {
                        warn!(
                            failures = self.consecutive_failures,
                            threshold = self.unhealthy_threshold,
                            "endpoint classified unhealthy"
                        );
                    }
                    self.status = EndpointHealth::Unhealthy;
                }
            }
        }
        self.status
    }

    /// Current classification.
    pub fn status(&self) -> EndpointHealth {
        self.status
    }

    /// Whether the tracker has settled on a definite classification.
    pub fn is_settled(&self) -> bool {
        self.status != EndpointHealth::Unknown
    }
}
