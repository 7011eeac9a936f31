//! Error types for the ringloom runtime

use core::fmt;

/// Result type for runtime operations
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors that can occur in runtime operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    /// Scheduler not initialized
    NotInitialized,

    /// Scheduler already initialized
    AlreadyInitialized,

    /// Ready queue is full and the task could not be inlined
    QueueFull,

    /// Inline-resume depth limit reached while the ready queue was full
    RecursionLimit,

    /// io_uring / eventfd error
    RingError(RingError),

    /// Invalid configuration
    InvalidConfig(&'static str),
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::NotInitialized => write!(f, "scheduler not initialized"),
            SchedError::AlreadyInitialized => write!(f, "scheduler already initialized"),
            SchedError::QueueFull => write!(f, "ready queue full"),
            SchedError::RecursionLimit => write!(f, "inline resume depth limit reached"),
            SchedError::RingError(e) => write!(f, "ring error: {}", e),
            SchedError::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for SchedError {}

/// io_uring and eventfd errors, carrying the raw negative errno
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    /// io_uring_setup failed
    Setup(i32),

    /// io_uring_enter failed
    Submit(i32),

    /// eventfd creation failed
    EventFd(i32),

    /// Registering a resource (eventfd, file table) with the ring failed
    Register(i32),

    /// Submission queue full
    SqFull,

    /// No registered-file slot available
    FixedFdExhausted,
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RingError::Setup(errno) => write!(f, "io_uring setup failed: errno {}", errno),
            RingError::Submit(errno) => write!(f, "io_uring submit failed: errno {}", errno),
            RingError::EventFd(errno) => write!(f, "eventfd creation failed: errno {}", errno),
            RingError::Register(errno) => write!(f, "ring registration failed: errno {}", errno),
            RingError::SqFull => write!(f, "submission queue full"),
            RingError::FixedFdExhausted => write!(f, "no registered-file slot available"),
        }
    }
}

impl std::error::Error for RingError {}

impl From<RingError> for SchedError {
    fn from(e: RingError) -> Self {
        SchedError::RingError(e)
    }
}
