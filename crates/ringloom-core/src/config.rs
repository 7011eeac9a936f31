//! Runtime configuration
//!
//! Compile-time defaults with runtime environment overrides.
//!
//! # Configuration priority (highest wins)
//!
//! 1. Builder methods (programmatic)
//! 2. Environment variables (`RINGLOOM_*`)
//! 3. Library defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use ringloom_core::Config;
//!
//! // Defaults with env overrides
//! let config = Config::from_env();
//!
//! // Or customize programmatically
//! let config = Config::from_env().ctx_count(4).ring_entries(4096);
//! ```

use crate::constants;

/// Env override for one knob: unset or unparsable values keep the default.
macro_rules! env_or {
    ($key:literal, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or($default)
    };
}

/// Policy used by the scheduler to pick a target context for a new task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStrategy {
    /// Atomic counter modulo context count.
    RoundRobin,
    /// Always context 0. Placeholder for an embedder-supplied dispatcher.
    Direct,
}

/// Runtime configuration with builder pattern.
///
/// Use `from_env()` to start from library defaults with any environment
/// variable overrides applied.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of worker contexts. 0 means hardware concurrency.
    pub ctx_count: usize,
    /// Ready-queue capacity per engine.
    pub queue_capacity: usize,
    /// io_uring submission queue depth per engine.
    pub ring_entries: u32,
    /// Cap on inline resumes when a full queue pushes back to the
    /// submitting worker.
    pub max_recursive_depth: usize,
    /// Registered-file slots per ring. 0 disables the fixed-fd pool.
    pub fixed_fd_slots: u32,
    /// Dispatch policy.
    pub dispatch: DispatchStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Config {
    /// Library defaults, no environment override.
    pub fn new() -> Self {
        Self {
            ctx_count: 0,
            queue_capacity: constants::DEFAULT_QUEUE_CAPACITY,
            ring_entries: constants::DEFAULT_RING_ENTRIES,
            max_recursive_depth: constants::DEFAULT_MAX_RECURSIVE_DEPTH,
            fixed_fd_slots: constants::DEFAULT_FIXED_FD_SLOTS,
            dispatch: DispatchStrategy::RoundRobin,
        }
    }

    /// Create config from library defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `RINGLOOM_WORKERS` - number of worker contexts (0 = hardware)
    /// - `RINGLOOM_QUEUE_CAPACITY` - ready-queue capacity per engine
    /// - `RINGLOOM_RING_ENTRIES` - io_uring SQ depth per engine
    /// - `RINGLOOM_MAX_RECURSIVE_DEPTH` - inline-resume cap on overflow
    /// - `RINGLOOM_FIXED_FD_SLOTS` - registered-file slots per ring
    pub fn from_env() -> Self {
        Self {
            ctx_count: env_or!("RINGLOOM_WORKERS", 0),
            queue_capacity: env_or!("RINGLOOM_QUEUE_CAPACITY", constants::DEFAULT_QUEUE_CAPACITY),
            ring_entries: env_or!("RINGLOOM_RING_ENTRIES", constants::DEFAULT_RING_ENTRIES),
            max_recursive_depth: env_or!(
                "RINGLOOM_MAX_RECURSIVE_DEPTH",
                constants::DEFAULT_MAX_RECURSIVE_DEPTH
            ),
            fixed_fd_slots: env_or!("RINGLOOM_FIXED_FD_SLOTS", constants::DEFAULT_FIXED_FD_SLOTS),
            dispatch: DispatchStrategy::RoundRobin,
        }
    }

    // Builder methods

    pub fn ctx_count(mut self, n: usize) -> Self {
        self.ctx_count = n;
        self
    }

    pub fn queue_capacity(mut self, cap: usize) -> Self {
        self.queue_capacity = cap;
        self
    }

    pub fn ring_entries(mut self, entries: u32) -> Self {
        self.ring_entries = entries;
        self
    }

    pub fn max_recursive_depth(mut self, depth: usize) -> Self {
        self.max_recursive_depth = depth;
        self
    }

    pub fn fixed_fd_slots(mut self, slots: u32) -> Self {
        self.fixed_fd_slots = slots;
        self
    }

    pub fn dispatch(mut self, strategy: DispatchStrategy) -> Self {
        self.dispatch = strategy;
        self
    }

    /// Validate configuration and return an error if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ctx_count > 256 {
            return Err(ConfigError::InvalidValue("ctx_count must be <= 256"));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue("queue_capacity must be > 0"));
        }
        if self.ring_entries == 0 {
            return Err(ConfigError::InvalidValue("ring_entries must be > 0"));
        }
        if self.ring_entries > constants::MAX_RING_ENTRIES {
            return Err(ConfigError::InvalidValue("ring_entries must be <= 32768"));
        }
        if self.fixed_fd_slots > 4096 {
            return Err(ConfigError::InvalidValue("fixed_fd_slots must be <= 4096"));
        }
        Ok(())
    }
}

/// Configuration error
#[derive(Debug, Clone)]
pub enum ConfigError {
    InvalidValue(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
