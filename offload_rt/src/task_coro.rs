//! Task coroutines: lazy and eager variants, both awaitable by other
//! coroutines via continuation chaining. See `SPEC_FULL.md` section 4.B.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::error::Error;

/// Eager task: the body begins executing immediately, suspending at its
/// first internal suspension point, as soon as [`EagerTask::spawn`] is
/// called — the natural behavior of `tokio::task::spawn_local`, which
/// starts polling the task the next time the `LocalSet` is driven, not
/// only once awaited.
#[must_use = "an EagerTask does nothing unless awaited"]
pub struct EagerTask<T> {
    handle: JoinHandle<Result<T, Error>>,
}

impl<T: 'static> EagerTask<T> {
    pub fn spawn<F>(body: F) -> Self
    where
        F: Future<Output = Result<T, Error>> + 'static,
    {
        Self { handle: tokio::task::spawn_local(body) }
    }
}

impl<T> Future for EagerTask<T> {
    type Output = Result<T, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(join_err)) => {
                Poll::Ready(Err(Error::Unexpected(format!("task panicked: {join_err}"))))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

enum LazyState<T> {
    /// Body not yet started — execution begins on first `.await`.
    Unstarted(Pin<Box<dyn Future<Output = Result<T, Error>>>>),
    Spawned(JoinHandle<Result<T, Error>>),
    /// The `JoinHandle` has already resolved and been consumed once.
    /// Polling again is a caller bug ("double-await is undefined").
    Done,
}

/// Lazy task: the body does not execute until the first `.await`.
#[must_use = "a LazyTask does nothing unless awaited"]
pub struct LazyTask<T> {
    state: LazyState<T>,
}

impl<T: 'static> LazyTask<T> {
    pub fn new<F>(body: F) -> Self
    where
        F: Future<Output = Result<T, Error>> + 'static,
    {
        Self { state: LazyState::Unstarted(Box::pin(body)) }
    }
}

impl<T: 'static> Future for LazyTask<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let LazyState::Unstarted(_) = &this.state {
            let LazyState::Unstarted(body) = std::mem::replace(&mut this.state, LazyState::Done)
            else {
                unreachable!()
            };
            this.state = LazyState::Spawned(tokio::task::spawn_local(body));
        }

        match &mut this.state {
            LazyState::Spawned(handle) => match Pin::new(handle).poll(cx) {
                Poll::Ready(outcome) => {
                    this.state = LazyState::Done;
                    match outcome {
                        Ok(result) => Poll::Ready(result),
                        Err(join_err) => {
                            Poll::Ready(Err(Error::Unexpected(format!("task panicked: {join_err}"))))
                        }
                    }
                }
                Poll::Pending => Poll::Pending,
            },
            LazyState::Done => panic!("LazyTask polled again after completion (double-await)"),
            LazyState::Unstarted(_) => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[tokio::test]
    async fn eager_task_runs_before_first_await() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let started = Rc::new(Cell::new(false));
                let started_clone = started.clone();
                let task = EagerTask::spawn(async move {
                    started_clone.set(true);
                    Ok(5)
                });
                // Give the spawned task a chance to run before we await it.
                tokio::task::yield_now().await;
                assert!(started.get(), "eager task body must start at construction");
                assert_eq!(task.await.unwrap(), 5);
            })
            .await;
    }

    #[tokio::test]
    async fn lazy_task_does_not_run_until_first_await() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let started = Rc::new(Cell::new(false));
                let started_clone = started.clone();
                let task = LazyTask::new(async move {
                    started_clone.set(true);
                    Ok::<_, Error>(9)
                });
                tokio::task::yield_now().await;
                assert!(!started.get(), "lazy task body must not start before being awaited");
                assert_eq!(task.await.unwrap(), 9);
                assert!(started.get());
            })
            .await;
    }

    #[tokio::test]
    async fn eager_task_propagates_a_thrown_error() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let task = EagerTask::<()>::spawn(async { Err(Error::Unexpected("boom".to_string())) });
                let err = task.await.unwrap_err();
                assert!(matches!(err, Error::Unexpected(_)));
            })
            .await;
    }
}
