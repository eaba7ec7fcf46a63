//! `offload_rt` — an async runtime that turns a callback-driven,
//! single-threaded, polled hardware-offload API (progress engine, contexts,
//! tasks, memory buffers) into a composable, awaitable, fiber-based
//! programming model on top of [`std::future::Future`].
//!
//! See `SPEC_FULL.md` at the workspace root for the full design. Module
//! layout mirrors the component table there (A through F), leaf-first:
//! [`awaitable`] is the bridge between native completion events and
//! suspended futures; [`task_coro`] and [`fiber`] are the two coroutine
//! shapes built on top of it; [`engine`] drives the event loop; [`context`]
//! adapts the native lifecycle state machine; [`task_adapter`] wraps each
//! native task kind.
//!
//! The native hardware library itself is out of scope (see `SPEC_FULL.md`
//! section 1) — [`native::Native`] is the trait boundary a real binding
//! crate would implement; [`native::fake`] is the deterministic in-memory
//! backend this crate's own test suite runs against.

#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

pub mod awaitable;
pub mod buffer;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod fiber;
pub mod memory;
pub mod native;
pub mod task_adapter;
pub mod task_coro;
pub mod test_support;

pub use config::EngineConfig;
pub use context::{Context, ContextState};
pub use engine::Engine;
pub use error::{Error, Result};
