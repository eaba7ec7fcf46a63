//! One module per native task kind, each following the five-step submit
//! contract and four-step completion contract verbatim from `SPEC_FULL.md`
//! section 4.F. Every function here is a thin wrapper: build a
//! [`crate::native::TaskPayload`] from the caller's [`crate::buffer::Buffer`]
//! arguments, hand it to [`crate::engine::Engine::submit_task`], await the
//! returned awaitable, and unwrap the matching [`crate::native::TaskOutcome`]
//! variant.
//!
//! A mismatched `TaskOutcome` variant can only mean this crate's own
//! dispatch table (task-kind submitted vs. outcome kind returned) is wrong
//! — never caller misuse — so every adapter maps that case to
//! [`crate::error::Error::Unexpected`] rather than panicking.

pub mod comch;
pub mod compress;
pub mod crypto;
pub mod dma;
pub mod erasure;
pub mod rdma;
pub mod sync_event;
