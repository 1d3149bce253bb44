//! Runtime primitives for the list filter pipeline.
//!
//! This crate provides the building blocks that the `list-filter` crate wires
//! together:
//!
//! - **Event Loop**: a headless interaction-thread loop with a thread-safe handle
//! - **Timers**: one-shot timers whose callbacks run on the loop thread
//! - **Signal/Slot System**: ordered, type-safe change notification
//! - **Property System**: observable cells that report whether a set changed them
//! - **Worker**: a single dedicated background thread with a FIFO task queue
//!
//! # Signal/Slot Example
//!
//! ```
//! use list_filter_core::Signal;
//!
//! let query_changed = Signal::<String>::new();
//!
//! let conn_id = query_changed.connect(|query| {
//!     println!("Query changed to: {}", query);
//! });
//!
//! query_changed.emit("ap".to_string());
//! query_changed.disconnect(conn_id);
//! ```
//!
//! # Event Loop Example
//!
//! ```
//! use list_filter_core::{EventLoop, Worker};
//! use std::time::Duration;
//!
//! let event_loop = EventLoop::new();
//! let handle = event_loop.handle();
//! let worker = Worker::<u64>::new(handle.clone()).unwrap();
//!
//! let quit_handle = handle.clone();
//! worker
//!     .send_with_callback(|| 6 * 7, move |answer| {
//!         assert_eq!(answer, 42);
//!         quit_handle.quit();
//!     })
//!     .unwrap();
//!
//! // Blocks until the callback requests quit.
//! event_loop.run().unwrap();
//! worker.stop();
//! ```

mod error;
mod event;
mod event_loop;
pub mod invocation;
pub mod logging;
pub mod property;
pub mod signal;
pub mod thread_check;
mod timer;
pub mod worker;

pub use error::{CoreError, Result, TimerError};
pub use event_loop::{EventLoop, EventLoopHandle};
pub use logging::PerfSpan;
pub use property::Property;
pub use signal::{ConnectionId, Signal};
pub use timer::TimerId;
pub use worker::{CancellationToken, Worker, WorkerBuilder, WorkerConfig};
