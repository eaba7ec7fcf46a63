//! The progress engine: owns the native PE handle and notification fd,
//! multiplexes the notification fd, fiber-yield signals, and timer
//! expirations, and runs the cooperative event loop. See `SPEC_FULL.md`
//! section 4.D.

use std::cell::{Cell, RefCell};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, VecDeque};
use std::future::Future;
use std::os::unix::io::{AsRawFd, RawFd};
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context as TaskContext, Poll, Waker};
use std::time::{Duration, Instant};

use tokio::io::unix::AsyncFd;

use crate::awaitable::{Slot, ValueAwaitable};
use crate::config::EngineConfig;
use crate::context::{Context, ContextShared};
use crate::error::{Error, Result};
use crate::native::{ContextArgs, ContextKind, CtxId, Native, NativeEvent, TaskOutcome, TaskPayload, TaskStatus};

/// A deadline far enough out that it never meaningfully competes with a
/// real timer; used only when the timer heap and yield queue are both
/// empty and we still need a concrete `Instant` to sleep until.
const FAR_FUTURE: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Draining,
}

struct TimerEntry {
    deadline: Instant,
    seq: u64,
    waker: Waker,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}
impl Eq for TimerEntry {}
impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline.cmp(&other.deadline).then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Wraps the native notification fd so it can be registered with
/// [`AsyncFd`]. Non-owning: the fd itself is closed by `Native`'s own
/// teardown, not by this wrapper.
struct NotifyFd(RawFd);
impl AsRawFd for NotifyFd {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

struct EngineInner {
    native: Box<dyn Native>,
    config: EngineConfig,
    notify: AsyncFd<NotifyFd>,
    yield_queue: RefCell<VecDeque<Waker>>,
    /// Lets [`Engine::enqueue_yield`]/[`Engine::register_timer`] wake a
    /// `step()` already parked in its `select!` on a stale, far-future
    /// deadline — without this, a fiber that calls `yield_now()`/`timeout()`
    /// while the engine sleeps would not be serviced until the next
    /// notification-fd wakeup.
    wake_step: tokio::sync::Notify,
    timers: RefCell<BinaryHeap<Reverse<TimerEntry>>>,
    next_timer_seq: Cell<u64>,
    contexts: RefCell<Vec<Weak<ContextShared>>>,
    pending_tasks: Cell<u64>,
    state: Cell<EngineState>,
}

/// Owns the native progress-engine handle and drives the cooperative
/// event loop. Cheap to clone — every clone shares the same underlying
/// state (`Rc`), matching the single-threaded, lock-free model in
/// `SPEC_FULL.md` section 5.
#[derive(Clone)]
pub struct Engine(Rc<EngineInner>);

impl Engine {
    /// Wrap a native backend. `native.notification_fd()` must already be
    /// non-blocking, as real hardware SDKs guarantee for their
    /// notification descriptors.
    pub fn new(native: Box<dyn Native>, config: EngineConfig) -> Result<Engine> {
        let fd = native.notification_fd();
        let notify = AsyncFd::new(NotifyFd(fd)).map_err(|err| Error::Construction {
            native_code: 0,
            message: format!("failed to register notification fd with epoll: {err}"),
        })?;

        Ok(Engine(Rc::new(EngineInner {
            native,
            config,
            notify,
            yield_queue: RefCell::new(VecDeque::new()),
            wake_step: tokio::sync::Notify::new(),
            timers: RefCell::new(BinaryHeap::new()),
            next_timer_seq: Cell::new(0),
            contexts: RefCell::new(Vec::new()),
            pending_tasks: Cell::new(0),
            state: Cell::new(EngineState::Idle),
        })))
    }

    pub fn state(&self) -> EngineState {
        self.0.state.get()
    }

    pub(crate) fn native_ref(&self) -> &dyn Native {
        self.0.native.as_ref()
    }

    /// Escape hatch for test code that needs to reach the concrete backend
    /// behind `Box<dyn Native>` — `native::fake::FakeNative`'s scripting
    /// hooks (`script_next_start_denied`, `force_peer_loss`) have no
    /// equivalent on the `Native` trait itself.
    pub fn native_any(&self) -> &dyn std::any::Any {
        self.0.native.as_any()
    }

    pub(crate) fn register_context(&self, weak: Weak<ContextShared>) {
        self.0.contexts.borrow_mut().push(weak);
    }

    /// Allocate a context of kind `kind`, connect it to this engine, start
    /// it, and suspend until `starting -> running`.
    pub async fn create_context(&self, kind: ContextKind, args: ContextArgs) -> Result<Context> {
        let ctx = Context::create(self, kind, args)?;
        ctx.start().await?;
        Ok(ctx)
    }

    /// Suspend the caller and enqueue it on the yield queue; resumes on
    /// the next loop iteration.
    pub fn yield_now(&self) -> Yield {
        Yield { engine: self.clone(), suspended: false }
    }

    /// Suspend the caller until `duration` has elapsed.
    pub fn timeout(&self, duration: Duration) -> Timeout {
        Timeout {
            engine: self.clone(),
            deadline: Instant::now() + duration,
            registered: false,
        }
    }

    /// Internal: write `payload`'s completion destination into the native
    /// task's user-data and submit it. Failure is surfaced synchronously.
    pub(crate) fn submit_task(&self, ctx: CtxId, payload: TaskPayload) -> Result<ValueAwaitable<TaskOutcome>> {
        let (slot, awaitable) = Slot::<TaskOutcome>::create_space();
        // SAFETY: this raw pointer is reconstituted exactly once, either
        // by `dispatch_event` on the matching `TaskCompleted` event, or
        // immediately below if submission itself fails synchronously.
        let user_data = slot.into_raw() as usize;

        match self.0.native.task_submit(ctx, payload, user_data) {
            Ok(_task_id) => {
                self.0.pending_tasks.set(self.0.pending_tasks.get() + 1);
                Ok(awaitable)
            }
            Err(err) => {
                // SAFETY: no completion event will ever arrive for this
                // user_data now that submission failed; reclaim it here
                // instead of leaking the slot forever.
                unsafe { drop(Slot::<TaskOutcome>::from_raw(user_data as *const ())) };
                Err(err)
            }
        }
    }

    /// Synchronously drive the event loop until no contexts remain
    /// active and no pending coroutines/timers/tasks exist.
    pub async fn run(&self) {
        self.0.state.set(EngineState::Running);
        loop {
            self.prune_dead_contexts();
            if self.0.contexts.borrow().is_empty() && self.0.pending_tasks.get() == 0 {
                self.0.state.set(EngineState::Draining);
            }
            if self.is_quiescent() {
                break;
            }
            self.step().await;
        }
        self.0.state.set(EngineState::Idle);
    }

    fn prune_dead_contexts(&self) {
        self.0.contexts.borrow_mut().retain(|weak| weak.strong_count() > 0);
    }

    fn is_quiescent(&self) -> bool {
        self.0.contexts.borrow().is_empty()
            && self.0.pending_tasks.get() == 0
            && self.0.yield_queue.borrow().is_empty()
            && self.0.timers.borrow().is_empty()
    }

    /// One iteration of the event loop algorithm (section 4.D).
    async fn step(&self) {
        // 1. Drain the yield queue entirely (fairness: exactly the set
        // that existed when this step started).
        let drained: Vec<Waker> = self.0.yield_queue.borrow_mut().drain(..).collect();
        for waker in drained {
            waker.wake();
        }

        // 2. Compute next_deadline.
        let now = Instant::now();
        let next_deadline = if !self.0.yield_queue.borrow().is_empty() {
            now
        } else {
            self.0
                .timers
                .borrow()
                .peek()
                .map(|Reverse(entry)| entry.deadline)
                .unwrap_or(now + FAR_FUTURE)
        };

        // 3. Arm the notification fd.
        self.0.native.request_notification();

        // 4. Block on the multiplexer.
        tokio::select! {
            biased;
            ready = self.0.notify.readable() => {
                match ready {
                    Ok(mut guard) => {
                        self.0.native.clear_notification();
                        self.drain_progress();
                        guard.clear_ready();
                    }
                    Err(err) => {
                        tracing::warn!(%err, "notification fd poll failed");
                    }
                }
            }
            () = tokio::time::sleep_until(tokio::time::Instant::from_std(next_deadline)) => {
                self.fire_due_timers();
            }
            () = self.0.wake_step.notified() => {
                // Nothing to do here directly: whoever called `notify_one`
                // already mutated the yield queue or timer heap. Looping
                // back to the top of `run()` re-evaluates `next_deadline`
                // against the now-current state.
            }
        }
    }

    fn drain_progress(&self) {
        for _ in 0..self.0.config.max_progress_calls_per_wakeup {
            let events = self.0.native.progress();
            if events.is_empty() {
                break;
            }
            for event in events {
                self.dispatch_event(event);
            }
        }
    }

    fn dispatch_event(&self, event: NativeEvent) {
        match event {
            NativeEvent::ContextStateChanged { prev, next, user_data, .. } => {
                Context::dispatch_state_change(user_data, prev, next);
            }
            NativeEvent::TaskCompleted { task, user_data, status } => {
                // SAFETY: `user_data` was produced by `submit_task`'s
                // `Slot::into_raw` and a `TaskCompleted` event fires
                // exactly once per submitted task.
                let slot = unsafe { Slot::<TaskOutcome>::from_raw(user_data as *const ()) };
                match status {
                    TaskStatus::Success(outcome) => slot.set_value(outcome),
                    TaskStatus::Failure { native_code, message } => {
                        slot.set_error(Error::OperationFailed { native_code, message });
                    }
                }
                slot.wake();
                self.0.native.task_free(task);
                self.0.pending_tasks.set(self.0.pending_tasks.get().saturating_sub(1));
            }
        }
    }

    fn fire_due_timers(&self) {
        let now = Instant::now();
        let due = {
            let mut timers = self.0.timers.borrow_mut();
            let mut due = Vec::new();
            while let Some(Reverse(entry)) = timers.peek() {
                if entry.deadline <= now {
                    let Reverse(entry) = timers.pop().expect("peeked entry must pop");
                    due.push(entry.waker);
                } else {
                    break;
                }
            }
            due
        };
        // Timer-expired coroutines are deferred to the next iteration —
        // enqueue, don't wake directly (section 4.D "Ordering & fairness").
        self.0.yield_queue.borrow_mut().extend(due);
    }

    pub(crate) fn next_timer_seq(&self) -> u64 {
        let seq = self.0.next_timer_seq.get();
        self.0.next_timer_seq.set(seq + 1);
        seq
    }

    pub(crate) fn register_timer(&self, deadline: Instant, waker: Waker) {
        let seq = self.next_timer_seq();
        self.0.timers.borrow_mut().push(Reverse(TimerEntry { deadline, seq, waker }));
        self.0.wake_step.notify_one();
    }

    pub(crate) fn enqueue_yield(&self, waker: Waker) {
        self.0.yield_queue.borrow_mut().push_back(waker);
        self.0.wake_step.notify_one();
    }
}

#[must_use = "a Yield does nothing unless polled"]
pub struct Yield {
    engine: Engine,
    suspended: bool,
}

impl Future for Yield {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.suspended {
            return Poll::Ready(());
        }
        this.suspended = true;
        this.engine.enqueue_yield(cx.waker().clone());
        Poll::Pending
    }
}

#[must_use = "a Timeout does nothing unless polled"]
pub struct Timeout {
    engine: Engine,
    deadline: Instant,
    registered: bool,
}

impl Future for Timeout {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.registered {
            return Poll::Ready(());
        }
        this.registered = true;
        this.engine.register_timer(this.deadline, cx.waker().clone());
        Poll::Pending
    }
}

/// Result of [`race`] — which of the two futures completed first.
#[derive(Debug)]
pub enum Either<A, B> {
    Left(A),
    Right(B),
}

/// Races two awaitables against each other, e.g. `engine.timeout(d)`
/// against an operation-specific awaitable. Spec.md section 5 leaves this
/// to callers ("not covered here; callers build it by racing two slots");
/// provided as a small composable helper in the style of the teacher's
/// `pause_and_resume_support` helpers rather than a full cancellation
/// framework.
pub async fn race<A, B>(a: A, b: B) -> Either<A::Output, B::Output>
where
    A: Future,
    B: Future,
{
    tokio::select! {
        out = a => Either::Left(out),
        out = b => Either::Right(out),
    }
}
