//! The native FFI surface this runtime adapts, captured as a trait instead
//! of `extern "C"` declarations.
//!
//! The real hardware library (out of scope for this crate, see
//! `SPEC_FULL.md` section 1) would be wrapped by a concrete `impl Native`
//! built on raw bindings. Keeping the boundary as a trait is what lets
//! [`crate::engine::Engine`], [`crate::context::Context`], and the
//! `task_adapter` modules be exercised without real hardware — the same
//! seam `r3bl_terminal_async` puts around `crossterm`'s `EventStream` and
//! `stdout` via `PinnedInputStream`/`SafeRawTerminal`.
//!
//! Native "callbacks" are realized as events drained from [`Native::progress`]
//! rather than raw function pointers — the state-change and task-completion
//! callbacks spec.md describes. This is a deliberate simplification: the
//! ordering and batching semantics spec.md requires (section 4.D, "Event
//! loop algorithm") are unaffected by whether delivery is via callback
//! pointer or via a drained event, but the latter has no `unsafe extern
//! "C" fn` boilerplate at this layer. The two remaining unsafe
//! pointer-reconstruction sites (the value-slot `Arc` and the context
//! `Weak`) live in [`crate::awaitable`] and [`crate::context`], matching
//! section 9's redesign note.

use std::os::unix::io::RawFd;

/// Opaque native context identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CtxId(pub u64);

/// Opaque native task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

/// Capability kind behind a context. Flow pipelines, Ethernet-frame
/// accessors, and device enumeration are out of scope (section 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    ComchClient,
    ComchServer,
    Consumer,
    Producer,
    Dma,
    Compress,
    Sha,
    AesGcm,
    Erasure,
    Rdma,
    SyncEvent,
}

/// Per-kind construction arguments. Mirrors the constructor parameters the
/// sample programs under `original_source/progs/` pass to their context
/// wrappers.
#[derive(Debug, Clone)]
pub enum ContextArgs {
    ComchClient { server_addr: String },
    ComchServer { bind_addr: String },
    Consumer,
    Producer,
    Dma,
    Compress,
    Sha,
    AesGcm,
    Erasure,
    Rdma,
    SyncEvent,
}

/// Mirrors the native context state machine (section 4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeCtxState {
    Idle,
    Starting,
    Running,
    Stopping,
}

/// One native task kind per offload capability, with its input payload.
#[derive(Debug, Clone)]
pub enum TaskPayload {
    Dma { src: *const u8, dst: *mut u8, len: usize },
    Compress { input: *const u8, input_len: usize, output: *mut u8, output_cap: usize },
    Decompress { input: *const u8, input_len: usize, output: *mut u8, output_cap: usize },
    AesGcmEncrypt { key: [u8; 32], iv: [u8; 12], aad: Vec<u8>, tag_size: usize, input: Vec<u8> },
    AesGcmDecrypt { key: [u8; 32], iv: [u8; 12], aad: Vec<u8>, tag_size: usize, input: Vec<u8> },
    Sha { algorithm: ShaAlgorithm, input: Vec<u8> },
    ErasureEncode { data_blocks: Vec<Vec<u8>>, redundancy_count: usize },
    /// `available` pairs a global block index (`0..data_count` for data
    /// blocks, `data_count..data_count+redundancy_count` for redundancy
    /// blocks) with its bytes; `recover_indices` names which data-block
    /// indices (always `< data_count`) the caller wants reconstructed.
    ErasureRecover {
        available: Vec<(usize, Vec<u8>)>,
        recover_indices: Vec<usize>,
        data_count: usize,
        redundancy_count: usize,
    },
    ComchSend { payload: Vec<u8> },
    ComchRecv,
    RdmaWrite { local: Vec<u8>, remote_addr: u64, remote_key: u32 },
    RdmaRead { remote_addr: u64, remote_key: u32, len: usize },
    SyncEventWait { target_value: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaAlgorithm {
    Sha256,
    Sha1,
}

/// Result payload produced by a completed task. One variant per
/// [`TaskPayload`] kind; `task_adapter` functions unwrap the variant they
/// expect and treat a mismatch as [`crate::error::Error::Unexpected`] —
/// that can only happen if this crate's own dispatch table is wrong, never
/// from caller misuse.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Dma,
    Compress { bytes_written: usize, crc32: u32, adler32: u32 },
    Decompress { bytes_written: usize },
    AesGcm { output: Vec<u8> },
    Sha { digest: Vec<u8> },
    ErasureEncode { redundancy_blocks: Vec<Vec<u8>> },
    ErasureRecover { recovered: Vec<Vec<u8>> },
    ComchSend,
    ComchRecv { payload: Vec<u8>, sender_id: u64, immediate_data: u32 },
    Rdma,
    SyncEvent,
}

#[derive(Debug, Clone)]
pub enum TaskStatus {
    Success(TaskOutcome),
    Failure { native_code: i32, message: String },
}

/// One drained native event. [`Native::progress`] returns a batch of these
/// per call; the engine keeps calling until a call returns an empty batch,
/// matching "repeatedly call native progress() until it returns zero
/// work-done" (section 4.D).
#[derive(Debug, Clone)]
pub enum NativeEvent {
    ContextStateChanged {
        ctx: CtxId,
        prev: NativeCtxState,
        next: NativeCtxState,
        /// The value last passed to [`Native::ctx_set_user_data`] for
        /// `ctx` — a `Weak<ContextShared>` reconstituted (without being
        /// consumed; the context may outlive any single event) by
        /// [`crate::context`].
        user_data: usize,
    },
    TaskCompleted {
        task: TaskId,
        /// The raw pointer stashed by the task adapter at submit time —
        /// reconstituted as `Rc<RefCell<_>>` (the backing storage of a
        /// [`crate::awaitable::Slot`]) exactly once, here.
        user_data: usize,
        status: TaskStatus,
    },
}

/// The FFI surface this crate depends on, modeled as a trait.
pub trait Native {
    /// File descriptor that becomes readable when the native library has
    /// work for [`Native::progress`] to drain. Non-owning: closed when the
    /// engine (and thus this `Native` impl) is dropped.
    fn notification_fd(&self) -> RawFd;

    /// Arm one-shot notification delivery on the fd above.
    fn request_notification(&self);

    /// Clear a pending notification after the fd became readable.
    fn clear_notification(&self);

    /// Drain and return completed events. An empty return means no more
    /// work is currently available; the engine stops looping and goes
    /// back to waiting on the notification fd / timers.
    fn progress(&self) -> Vec<NativeEvent>;

    /// Create a native context of the given kind. Fails synchronously on
    /// allocation/setup error (`Error::Construction`).
    fn ctx_create(&self, kind: ContextKind, args: ContextArgs) -> crate::error::Result<CtxId>;

    fn ctx_destroy(&self, id: CtxId);

    /// Request `idle -> starting`. May complete synchronously (the
    /// returned events on the *next* `progress()` call reflect the
    /// resulting transition) or asynchronously.
    fn ctx_start(&self, id: CtxId) -> crate::error::Result<()>;

    /// Request `running -> stopping`.
    fn ctx_stop(&self, id: CtxId) -> crate::error::Result<()>;

    fn ctx_get_state(&self, id: CtxId) -> NativeCtxState;

    /// Stash an opaque value the state-change callback will hand back on
    /// every future `ContextStateChanged` event for `id`.
    fn ctx_set_user_data(&self, id: CtxId, user_data: usize);

    /// Submit a task against `ctx`, stashing `user_data` in the native
    /// task's opaque user-data slot. Fails synchronously on queue-full /
    /// allocation error (`Error::SubmitFailed`).
    fn task_submit(
        &self,
        ctx: CtxId,
        payload: TaskPayload,
        user_data: usize,
    ) -> crate::error::Result<TaskId>;

    /// Release the native task's bookkeeping after its completion event
    /// has been fully processed.
    fn task_free(&self, id: TaskId);

    /// Lets test code recover the concrete backend (`native::fake::FakeNative`)
    /// from `Engine::native_any` to script start-denial / peer-loss
    /// scenarios that have no surface in the trait itself.
    fn as_any(&self) -> &dyn std::any::Any;
}

mod erasure_math;
pub mod fake;
