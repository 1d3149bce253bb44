//! Event types carried by the event loop queue.

use crate::invocation::QueuedInvocation;

/// Internal events dispatched through the event loop.
///
/// Events are delivered in FIFO order. Timers are not events: the loop polls
/// its timer manager between events and uses the next deadline as its wait
/// timeout.
#[derive(Debug)]
pub enum LoopEvent {
    /// Run a closure on the loop thread.
    Invoke(QueuedInvocation),

    /// Wake up the event loop so it recomputes its wait deadline.
    WakeUp,

    /// Request to stop `run()`.
    Quit,
}

impl LoopEvent {
    /// Short name used in trace output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Invoke(_) => "invoke",
            Self::WakeUp => "wake_up",
            Self::Quit => "quit",
        }
    }
}
