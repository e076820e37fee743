#![forbid(unsafe_code)]

//! Runtime services for Veil overlays.
//!
//! # Role in Veil
//! `veil-runtime` is the stand-in for the page's event loop. Widgets never
//! block: work that would suspend (loading remote content) is deferred onto
//! a [`TaskQueue`] and finished when the host drains it.
//!
//! # Primary responsibilities
//! - **TaskQueue**: single-threaded FIFO of deferred tasks.
//! - **ContentLoader**: the remote content collaborator, with an in-memory
//!   [`StaticLoader`] and an optional blocking HTTP loader.
//! - **Fetcher**: pairs a loader with a queue so completions always run
//!   asynchronously, success or failure.
//! - **Telemetry**: optional `tracing-subscriber` setup (`telemetry`
//!   feature).

pub mod fetch;
pub mod loader;
pub mod scheduler;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use fetch::Fetcher;
#[cfg(feature = "http")]
pub use loader::HttpLoader;
pub use loader::{ContentLoader, LoadError, StaticLoader};
pub use scheduler::TaskQueue;
#[cfg(feature = "telemetry")]
pub use telemetry::{LOG_ENV, TelemetryError, init_tracing};
