//! Application Configuration

/// Feed application configuration
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Attempts made by `update_with_retry` before reporting a conflict
    pub max_update_attempts: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_update_attempts: 3,
        }
    }
}

impl FeedConfig {
    /// Development settings; same limits as production
    pub fn development() -> Self {
        Self::default()
    }
}
