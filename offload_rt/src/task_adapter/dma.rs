//! DMA copy. Grounded on `original_source/progs/dma_client.cpp` /
//! `dma_server.cpp`.

use crate::buffer::Buffer;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::native::{TaskOutcome, TaskPayload};

/// Copies `src` into `dst`. Both buffers must be the same length.
///
/// # Panics
/// Panics if `src.len() != dst.len()`.
pub async fn submit_copy(ctx: &Context, src: Buffer<'_>, mut dst: Buffer<'_>) -> Result<()> {
    assert_eq!(src.len(), dst.len(), "dma copy requires equal-length source and destination");
    let len = src.len();
    let payload = TaskPayload::Dma {
        src: src.as_slice().as_ptr(),
        dst: dst.as_mut_slice().as_mut_ptr(),
        len,
    };

    let outcome = ctx.engine().submit_task(ctx.id(), payload)?.await?;
    match outcome {
        TaskOutcome::Dma => Ok(()),
        _ => Err(Error::Unexpected("dma task returned an unexpected outcome variant".to_string())),
    }
}
