use log::{info, warn};

/// Stage-scoped wrapper over the `log` facade.
pub struct LogManager {
    scope: &'static str,
}

impl LogManager {
    pub fn scoped(scope: &'static str) -> Self {
        Self { scope }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.scope, message);
    }

    pub fn warn(&self, message: &str) {
        warn!("[{}] {}", self.scope, message);
    }
}
