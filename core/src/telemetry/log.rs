use log::{debug, info, warn};

/// Logger tagging every message with the component it comes from.
pub struct LogManager {
    component: &'static str,
}

impl LogManager {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.component, message);
    }

    pub fn warn(&self, message: &str) {
        warn!("[{}] {}", self.component, message);
    }

    pub fn station_failure(&self, code: &str, reason: &dyn std::fmt::Display) {
        debug!("[{}] station {} skipped: {}", self.component, code, reason);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("network")
    }
}
