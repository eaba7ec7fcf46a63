//! Engine configuration. Kept as a plain constructor-args struct rather
//! than env/file driven config — the native offload devices this runtime
//! talks to are enumerated and opened by the host application, not by this
//! library, so there is nothing here a config file would meaningfully
//! override beyond the two knobs below.

use std::time::Duration;

/// Tuning knobs for one [`crate::engine::Engine`] instance.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Upper bound on how many times `native.progress()` is called back to
    /// back within a single notification wakeup before yielding back to
    /// the `select!` in [`crate::engine::Engine::run`]. Guards against a
    /// pathological native backend that never reports zero work done.
    pub max_progress_calls_per_wakeup: u32,

    /// Timer-heap granularity. Two deadlines closer together than this are
    /// coalesced into the same wakeup; ties still break in insertion
    /// order as required by section 5 of the design.
    pub timer_granularity: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_progress_calls_per_wakeup: 4096,
            timer_granularity: Duration::from_micros(100),
        }
    }
}
