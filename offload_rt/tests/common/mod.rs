//! Shared scaffolding for integration tests: every test needs a
//! [`tokio::task::LocalSet`] (contexts, slots, and the engine are all `Rc`-based
//! and `!Send`, per `SPEC_FULL.md` section 5) plus a fresh [`FakeNative`]
//! backend and [`Engine`].

use offload_rt::config::EngineConfig;
use offload_rt::engine::Engine;
use offload_rt::native::fake::FakeNative;

/// Builds a fresh engine over a fresh fake backend and hands it to `body`,
/// running `body` concurrently with `engine.run()` inside one `LocalSet`.
/// `engine.run()` exits once `body` has dropped every context it created and
/// no tasks/timers/yields remain outstanding, so `body`'s return value is
/// available by the time this function returns.
///
/// Tests that need to script native-level behavior (`script_next_start_denied`,
/// `force_peer_loss`) reach the fake backend through `engine.native_any()`:
///
/// ```ignore
/// engine.native_any().downcast_ref::<FakeNative>().unwrap().script_next_start_denied();
/// ```
pub async fn run<F, Fut, T>(body: F) -> T
where
    F: FnOnce(Engine) -> Fut + 'static,
    Fut: std::future::Future<Output = T> + 'static,
    T: 'static,
{
    offload_rt::test_support::init_tracing_once();

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async move {
            let native = Box::new(FakeNative::new());
            let engine = Engine::new(native, EngineConfig::default()).expect("engine construction");
            let engine_for_run = engine.clone();
            // Spawned in the background and awaited directly; `body` below
            // drives the `LocalSet`'s one polled-inline future, so it always
            // registers its first context/task/yield/timer before
            // `engine.run()` gets its first chance to check quiescence.
            let run_handle = tokio::task::spawn_local(async move { engine_for_run.run().await });
            let result = body(engine).await;
            run_handle.await.expect("engine.run() task panicked");
            result
        })
        .await
}

/// Downcasts an [`Engine`]'s native backend to [`FakeNative`], for test
/// bodies that need `script_next_start_denied`/`force_peer_loss`.
pub fn fake_native(engine: &Engine) -> &FakeNative {
    engine.native_any().downcast_ref::<FakeNative>().expect("engine built over a FakeNative backend")
}
