//! Common lifecycle base shared by every capability context. See
//! `SPEC_FULL.md` section 4.E.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::awaitable::Slot;
use crate::engine::Engine;
use crate::error::Error;
use crate::native::{CtxId, NativeCtxState};

/// Lifecycle state mirroring the native context state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Idle,
    Starting,
    Running,
    Stopping,
}

pub(crate) struct ContextShared {
    id: CtxId,
    engine: Engine,
    state: Cell<ContextState>,
    pending_start: RefCell<Option<Slot<()>>>,
    pending_stop: RefCell<Option<Slot<()>>>,
    /// The raw `Weak<ContextShared>` pointer registered with the native
    /// library via `ctx_set_user_data`, released exactly once in `Drop`.
    user_data_ptr: Cell<usize>,
}

impl Drop for ContextShared {
    fn drop(&mut self) {
        debug_assert_eq!(
            self.state.get(),
            ContextState::Idle,
            "context dropped outside idle state"
        );
        self.engine.native_ref().ctx_destroy(self.id);

        let ptr = self.user_data_ptr.get();
        if ptr != 0 {
            // SAFETY: `ptr` was produced by exactly one `Weak::into_raw` in
            // `Context::create` and every other consumer
            // (`Context::dispatch_state_change`) only ever peeks it via
            // `Weak::from_raw` immediately followed by `mem::forget`. This
            // is the one call that actually lets the weak count drop.
            unsafe {
                drop(Weak::from_raw(ptr as *const ContextShared));
            }
        }
    }
}

/// A bound endpoint or offload engine with a start/stop state machine.
/// Shared (`Rc`) so task-adapter operations and the engine's context
/// registry can each hold a reference without the context outliving the
/// engine that serves it.
#[derive(Clone)]
pub struct Context(Rc<ContextShared>);

impl Context {
    pub(crate) fn create(
        engine: &Engine,
        kind: crate::native::ContextKind,
        args: crate::native::ContextArgs,
    ) -> Result<Context, Error> {
        let id = engine.native_ref().ctx_create(kind, args)?;
        let shared = Rc::new(ContextShared {
            id,
            engine: engine.clone(),
            state: Cell::new(ContextState::Idle),
            pending_start: RefCell::new(None),
            pending_stop: RefCell::new(None),
            user_data_ptr: Cell::new(0),
        });

        let user_data = Weak::into_raw(Rc::downgrade(&shared)) as usize;
        shared.user_data_ptr.set(user_data);
        engine.native_ref().ctx_set_user_data(id, user_data);
        engine.register_context(Rc::downgrade(&shared));

        Ok(Context(shared))
    }

    pub fn state(&self) -> ContextState {
        self.0.state.get()
    }

    pub(crate) fn id(&self) -> CtxId {
        self.0.id
    }

    /// The engine this context was created on. Used by `task_adapter`
    /// operations to reach [`Engine::submit_task`](crate::engine::Engine::submit_task).
    pub(crate) fn engine(&self) -> &Engine {
        &self.0.engine
    }

    /// Only valid in `idle`. Suspends until `starting -> running` (success)
    /// or `starting -> idle` (start denied).
    pub async fn start(&self) -> Result<(), Error> {
        if self.0.state.get() != ContextState::Idle {
            return Err(Error::InvalidState("start() called outside idle"));
        }

        let (slot, awaitable) = Slot::<()>::create_space();
        *self.0.pending_start.borrow_mut() = Some(slot);
        self.0.state.set(ContextState::Starting);

        if let Err(err) = self.0.engine.native_ref().ctx_start(self.0.id) {
            self.0.pending_start.borrow_mut().take();
            self.0.state.set(ContextState::Idle);
            return Err(err);
        }

        awaitable.await
    }

    /// Only valid in `running`. Suspends until `stopping -> idle`.
    pub async fn stop(&self) -> Result<(), Error> {
        if self.0.state.get() != ContextState::Running {
            return Err(Error::InvalidState("stop() called outside running"));
        }

        let (slot, awaitable) = Slot::<()>::create_space();
        *self.0.pending_stop.borrow_mut() = Some(slot);
        self.0.state.set(ContextState::Stopping);

        if let Err(err) = self.0.engine.native_ref().ctx_stop(self.0.id) {
            self.0.pending_stop.borrow_mut().take();
            self.0.state.set(ContextState::Running);
            return Err(err);
        }

        awaitable.await
    }

    /// Called by [`crate::engine::Engine`] when a `ContextStateChanged`
    /// event is drained from `native.progress()`. `user_data` is the value
    /// passed to `ctx_set_user_data` at construction.
    pub(crate) fn dispatch_state_change(
        user_data: usize,
        prev: NativeCtxState,
        next: NativeCtxState,
    ) {
        if user_data == 0 {
            return;
        }

        // SAFETY: peeking, not consuming — a context fires this callback
        // many times over its life, so the weak reference must survive
        // past this single use. `mem::forget` below cancels the implicit
        // drop that `Weak::from_raw` would otherwise perform.
        let weak: Weak<ContextShared> = unsafe { Weak::from_raw(user_data as *const ContextShared) };
        let upgraded = weak.upgrade();
        std::mem::forget(weak);

        let Some(shared) = upgraded else { return };
        Context(shared).apply_transition(prev, next);
    }

    fn apply_transition(&self, prev: NativeCtxState, next: NativeCtxState) {
        use NativeCtxState::{Idle, Running, Starting, Stopping};

        match (prev, next) {
            (Idle, Starting) => {
                // informational only
            }
            (Starting, Running) => {
                self.0.state.set(ContextState::Running);
                if let Some(slot) = self.0.pending_start.borrow_mut().take() {
                    slot.set_value(());
                    slot.wake();
                }
            }
            (Starting, Idle) => {
                self.0.state.set(ContextState::Idle);
                if let Some(slot) = self.0.pending_start.borrow_mut().take() {
                    slot.set_error(Error::StartDenied {
                        native_code: 0,
                        message: "context refused to start".to_string(),
                    });
                    slot.wake();
                }
            }
            (Running, Stopping) => {
                // informational only
            }
            (Stopping, Idle) => {
                self.0.state.set(ContextState::Idle);
                if let Some(slot) = self.0.pending_stop.borrow_mut().take() {
                    slot.set_value(());
                    slot.wake();
                }
            }
            (Running, Idle) => {
                // Implicit self-stop on peer loss. Resolve whichever
                // awaiter(s) are pending before the state is observed as
                // idle (section 4.E invariants).
                self.0.state.set(ContextState::Idle);
                if let Some(slot) = self.0.pending_stop.borrow_mut().take() {
                    slot.set_value(());
                    slot.wake();
                }
                if let Some(slot) = self.0.pending_start.borrow_mut().take() {
                    slot.set_error(Error::Unexpected(
                        "context lost its peer before start completed".to_string(),
                    ));
                    slot.wake();
                }
            }
            _ => {
                tracing::warn!(?prev, ?next, "unexpected context state transition");
            }
        }
    }
}
