//! RDMA write/read. Grounded on `original_source/progs/rdma_dpu_receive.cpp`
//! and `rdma_host_send.cpp`.

use crate::buffer::Buffer;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::native::{TaskOutcome, TaskPayload};

pub async fn submit_write(
    ctx: &Context,
    local: Buffer<'_>,
    remote_addr: u64,
    remote_key: u32,
) -> Result<()> {
    let payload = TaskPayload::RdmaWrite { local: local.to_vec(), remote_addr, remote_key };

    let outcome = ctx.engine().submit_task(ctx.id(), payload)?.await?;
    match outcome {
        TaskOutcome::Rdma => Ok(()),
        _ => Err(Error::Unexpected("rdma write task returned an unexpected outcome variant".to_string())),
    }
}

/// Reads `local.len()` bytes from `remote_addr` into `local`.
pub async fn submit_read(
    ctx: &Context,
    local: Buffer<'_>,
    remote_addr: u64,
    remote_key: u32,
) -> Result<()> {
    let len = local.len();
    let payload = TaskPayload::RdmaRead { remote_addr, remote_key, len };

    let outcome = ctx.engine().submit_task(ctx.id(), payload)?.await?;
    match outcome {
        TaskOutcome::Rdma => Ok(()),
        _ => Err(Error::Unexpected("rdma read task returned an unexpected outcome variant".to_string())),
    }
}
