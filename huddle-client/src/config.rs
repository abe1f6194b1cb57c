use std::time::Duration;

/// Default upper bound on local capture acquisition.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of consecutive failed calls to a listed peer before giving up.
pub const DEFAULT_MAX_REDIAL_ATTEMPTS: u32 = 3;

/// Default size of the handle command queue.
pub const DEFAULT_COMMAND_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub capture_timeout: Duration,
    pub max_redial_attempts: u32,
    pub command_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
            max_redial_attempts: DEFAULT_MAX_REDIAL_ATTEMPTS,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}
