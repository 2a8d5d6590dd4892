//! Domain port for chat socket and fan-out metrics.

use crate::domain::ports::FanOutReport;

/// Metrics sink for the real-time chat path.
///
/// Calls happen on the hot path, so implementations must not block.
#[cfg_attr(test, mockall::automock)]
pub trait ChatMetrics: Send + Sync {
    /// A socket joined a group.
    fn socket_opened(&self);

    /// A socket left its group.
    fn socket_closed(&self);

    /// Result of one fan-out.
    fn fan_out(&self, report: &FanOutReport);
}

/// No-op implementation for when metrics are disabled or in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpChatMetrics;

impl ChatMetrics for NoOpChatMetrics {
    fn socket_opened(&self) {}

    fn socket_closed(&self) {}

    fn fan_out(&self, _report: &FanOutReport) {}
}
