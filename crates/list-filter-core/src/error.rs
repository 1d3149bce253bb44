//! Error types for the List Filter runtime.

use std::fmt;

/// The main error type for runtime operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The event loop has been dropped and no longer accepts work.
    EventLoopExited,
    /// Timer-related error.
    Timer(TimerError),
    /// The worker thread has been stopped or its queue is full.
    WorkerUnavailable,
    /// The operating system refused to spawn a worker thread.
    WorkerSpawn(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventLoopExited => write!(f, "The event loop has already exited"),
            Self::Timer(err) => write!(f, "Timer error: {err}"),
            Self::WorkerUnavailable => {
                write!(f, "The worker is stopped or its task queue is full")
            }
            Self::WorkerSpawn(msg) => write!(f, "Failed to spawn worker thread: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timer(err) => Some(err),
            _ => None,
        }
    }
}

/// Timer-specific errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The timer ID is invalid, has already fired, or has been stopped.
    InvalidTimerId,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimerId => write!(f, "Invalid or expired timer ID"),
        }
    }
}

impl std::error::Error for TimerError {}

impl From<TimerError> for CoreError {
    fn from(err: TimerError) -> Self {
        Self::Timer(err)
    }
}

/// A specialized Result type for runtime operations.
pub type Result<T> = std::result::Result<T, CoreError>;
