//! Prometheus adapter for real-time chat metrics.
//!
//! # Metrics
//!
//! - `portal_chat_open_sockets` (gauge): sockets currently joined to a group.
//! - `portal_chat_fan_out_total` (counter, label `outcome`): per-member
//!   delivery results, one of `delivered`, `dropped` or `pruned`.

use prometheus::{IntCounterVec, IntGauge, Opts, Registry};

use crate::domain::ports::{ChatMetrics, FanOutReport};

/// Prometheus-backed chat metrics recorder.
pub struct PrometheusChatMetrics {
    open_sockets: IntGauge,
    fan_out_total: IntCounterVec,
}

impl PrometheusChatMetrics {
    /// Create and register metrics with the given registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric with the same name is already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let open_sockets = IntGauge::new(
            "portal_chat_open_sockets",
            "Chat sockets currently joined to a conversation group",
        )?;
        let fan_out_total = IntCounterVec::new(
            Opts::new(
                "portal_chat_fan_out_total",
                "Chat event deliveries by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(open_sockets.clone()))?;
        registry.register(Box::new(fan_out_total.clone()))?;
        Ok(Self {
            open_sockets,
            fan_out_total,
        })
    }

    fn add(&self, outcome: &str, count: usize) {
        if count > 0 {
            self.fan_out_total
                .with_label_values(&[outcome])
                .inc_by(u64::try_from(count).unwrap_or(u64::MAX));
        }
    }
}

impl ChatMetrics for PrometheusChatMetrics {
    fn socket_opened(&self) {
        self.open_sockets.inc();
    }

    fn socket_closed(&self) {
        self.open_sockets.dec();
    }

    fn fan_out(&self, report: &FanOutReport) {
        self.add("delivered", report.delivered);
        self.add("dropped", report.dropped);
        self.add("pruned", report.pruned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_open_sockets() {
        let registry = Registry::new();
        let metrics =
            PrometheusChatMetrics::new(&registry).expect("metric registration should succeed");

        metrics.socket_opened();
        metrics.socket_opened();
        metrics.socket_closed();
        assert_eq!(metrics.open_sockets.get(), 1);
    }

    #[test]
    fn counts_fan_out_outcomes() {
        let registry = Registry::new();
        let metrics =
            PrometheusChatMetrics::new(&registry).expect("metric registration should succeed");

        metrics.fan_out(&FanOutReport {
            delivered: 2,
            dropped: 1,
            pruned: 0,
        });
        metrics.fan_out(&FanOutReport {
            delivered: 1,
            dropped: 0,
            pruned: 1,
        });

        let value = |outcome: &str| metrics.fan_out_total.with_label_values(&[outcome]).get();
        assert_eq!(value("delivered"), 3);
        assert_eq!(value("dropped"), 1);
        assert_eq!(value("pruned"), 1);
    }

    #[test]
    fn rejects_double_registration() {
        let registry = Registry::new();
        let _first =
            PrometheusChatMetrics::new(&registry).expect("metric registration should succeed");
        assert!(PrometheusChatMetrics::new(&registry).is_err());
    }
}
