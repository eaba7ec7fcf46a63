//! Erasure-coding encode/recover. Grounded on
//! `original_source/samples/erasure_encode.cpp` and `erasure_recover.cpp`.

use crate::buffer::Buffer;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::native::{TaskOutcome, TaskPayload};

/// Computes `redundancy_blocks.len()` redundancy blocks from `data_blocks`
/// using a Cauchy coding matrix, writing each redundancy block in place.
pub async fn submit_encode(
    ctx: &Context,
    data_blocks: &[Buffer<'_>],
    redundancy_blocks: &mut [Buffer<'_>],
) -> Result<()> {
    let payload = TaskPayload::ErasureEncode {
        data_blocks: data_blocks.iter().map(Buffer::to_vec).collect(),
        redundancy_count: redundancy_blocks.len(),
    };

    let outcome = ctx.engine().submit_task(ctx.id(), payload)?.await?;
    match outcome {
        TaskOutcome::ErasureEncode { redundancy_blocks: computed } => {
            if computed.len() != redundancy_blocks.len() {
                return Err(Error::Unexpected(
                    "erasure encode returned a different number of redundancy blocks than requested"
                        .to_string(),
                ));
            }
            for (dst, src) in redundancy_blocks.iter_mut().zip(computed.into_iter()) {
                dst.as_mut_slice().copy_from_slice(&src);
            }
            Ok(())
        }
        _ => Err(Error::Unexpected("erasure encode task returned an unexpected outcome variant".to_string())),
    }
}

/// Reconstructs the blocks at `recover_indices` (indices into the original
/// `0..data_count` data-block numbering) from `available` surviving blocks,
/// each tagged with its global index (`0..data_count` for data blocks,
/// `data_count..data_count+redundancy_count` for redundancy blocks).
/// Recovered bytes are written into `out`, one entry per `recover_indices`
/// element, in the same order.
pub async fn submit_recover(
    ctx: &Context,
    data_count: usize,
    redundancy_count: usize,
    available: &[(usize, Buffer<'_>)],
    recover_indices: &[usize],
    out: &mut [Buffer<'_>],
) -> Result<()> {
    if out.len() != recover_indices.len() {
        return Err(Error::Unexpected(
            "erasure recover output slice does not match recover_indices length".to_string(),
        ));
    }

    let payload = TaskPayload::ErasureRecover {
        available: available.iter().map(|(idx, buf)| (*idx, buf.to_vec())).collect(),
        recover_indices: recover_indices.to_vec(),
        data_count,
        redundancy_count,
    };

    let outcome = ctx.engine().submit_task(ctx.id(), payload)?.await?;
    match outcome {
        TaskOutcome::ErasureRecover { recovered } => {
            if recovered.len() != out.len() {
                return Err(Error::Unexpected(
                    "erasure recover returned a different number of blocks than requested".to_string(),
                ));
            }
            for (dst, src) in out.iter_mut().zip(recovered.into_iter()) {
                dst.as_mut_slice().copy_from_slice(&src);
            }
            Ok(())
        }
        _ => Err(Error::Unexpected("erasure recover task returned an unexpected outcome variant".to_string())),
    }
}
