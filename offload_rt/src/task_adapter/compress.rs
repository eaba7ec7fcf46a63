//! Compression / decompression. Grounded on
//! `original_source/samples/simple_compress.cpp` and `parallel_compress.cpp`.

use crate::buffer::Buffer;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::native::{TaskOutcome, TaskPayload};

/// Checksums of the *source* data, computed by the device as part of
/// compression — mirrors `shoc::compress_checksums` in
/// `original_source/samples/simple_compress.cpp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressResult {
    pub bytes_written: usize,
    pub crc32: u32,
    pub adler32: u32,
}

pub async fn submit_compress(
    ctx: &Context,
    input: Buffer<'_>,
    mut output: Buffer<'_>,
) -> Result<CompressResult> {
    let payload = TaskPayload::Compress {
        input: input.as_slice().as_ptr(),
        input_len: input.len(),
        output: output.as_mut_slice().as_mut_ptr(),
        output_cap: output.len(),
    };

    let outcome = ctx.engine().submit_task(ctx.id(), payload)?.await?;
    match outcome {
        TaskOutcome::Compress { bytes_written, crc32, adler32 } => {
            Ok(CompressResult { bytes_written, crc32, adler32 })
        }
        _ => Err(Error::Unexpected("compress task returned an unexpected outcome variant".to_string())),
    }
}

/// Returns the number of decompressed bytes written into `output`.
pub async fn submit_decompress(ctx: &Context, input: Buffer<'_>, mut output: Buffer<'_>) -> Result<usize> {
    let payload = TaskPayload::Decompress {
        input: input.as_slice().as_ptr(),
        input_len: input.len(),
        output: output.as_mut_slice().as_mut_ptr(),
        output_cap: output.len(),
    };

    let outcome = ctx.engine().submit_task(ctx.id(), payload)?.await?;
    match outcome {
        TaskOutcome::Decompress { bytes_written } => Ok(bytes_written),
        _ => {
            Err(Error::Unexpected("decompress task returned an unexpected outcome variant".to_string()))
        }
    }
}
