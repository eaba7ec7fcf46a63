//! Sync-event wait. Grounded on `original_source/progs/sync_event_host.cpp`,
//! `sync_event_dpu.cpp`, `sync_event_remote_pci.cpp`.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::native::{TaskOutcome, TaskPayload};

/// Suspends until the sync event reaches `target_value`.
pub async fn wait(ctx: &Context, target_value: u64) -> Result<()> {
    let payload = TaskPayload::SyncEventWait { target_value };

    let outcome = ctx.engine().submit_task(ctx.id(), payload)?.await?;
    match outcome {
        TaskOutcome::SyncEvent => Ok(()),
        _ => Err(Error::Unexpected("sync event wait task returned an unexpected outcome variant".to_string())),
    }
}
