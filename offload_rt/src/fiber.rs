//! Fibers: detached, top-level, fire-and-forget coroutines. See
//! `SPEC_FULL.md` section 4.C.

use std::future::Future;

use crate::error::Error;

/// Spawn a detached fiber. Unlike [`crate::task_coro::EagerTask`], no
/// handle is returned — a fiber cannot be awaited, matching "has no
/// observable resource beyond the coroutine frame" (spec.md section 3).
///
/// An error returned from `body` is caught and logged at `warn` severity,
/// never propagated — the realization of "errors thrown out of the fiber
/// body are caught and logged".
pub fn spawn<F>(body: F)
where
    F: Future<Output = Result<(), Error>> + 'static,
{
    tokio::task::spawn_local(async move {
        if let Err(error) = body.await {
            tracing::warn!(%error, "fiber exited with error");
        }
    });
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[tokio::test]
    async fn spawn_runs_the_body_to_completion() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let ran = Rc::new(Cell::new(false));
                let ran_clone = ran.clone();
                spawn(async move {
                    ran_clone.set(true);
                    Ok(())
                });
                tokio::task::yield_now().await;
                assert!(ran.get());
            })
            .await;
    }

    #[tokio::test]
    async fn spawn_swallows_an_error_instead_of_propagating_it() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                spawn(async { Err(Error::Unexpected("handled by the fiber".to_string())) });
                // If the error escaped, nothing here would observe it directly
                // (a fiber cannot be awaited) — reaching this point without a
                // panic is the assertion.
                tokio::task::yield_now().await;
            })
            .await;
    }
}
