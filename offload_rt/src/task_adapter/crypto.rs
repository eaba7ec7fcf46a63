//! AES-GCM encrypt/decrypt and SHA hashing. Grounded on
//! `original_source/samples/encrypt.cpp` and `original_source/tests/group_sha.cpp`.

use crate::buffer::Buffer;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::native::{ShaAlgorithm, TaskOutcome, TaskPayload};

/// AES-256-GCM with a 256-bit key and a 12-byte IV, matching
/// `original_source/samples/encrypt.cpp`'s `DOCA_AES_GCM_KEY_256` usage.
pub async fn submit_aes_gcm_encrypt(
    ctx: &Context,
    key: [u8; 32],
    iv: [u8; 12],
    aad: &[u8],
    tag_size: usize,
    input: Buffer<'_>,
    mut output: Buffer<'_>,
) -> Result<usize> {
    let payload = TaskPayload::AesGcmEncrypt {
        key,
        iv,
        aad: aad.to_vec(),
        tag_size,
        input: input.to_vec(),
    };

    let outcome = ctx.engine().submit_task(ctx.id(), payload)?.await?;
    match outcome {
        TaskOutcome::AesGcm { output: bytes } => {
            if bytes.len() > output.len() {
                return Err(Error::OperationFailed {
                    native_code: -1,
                    message: "encrypted output exceeds destination buffer".to_string(),
                });
            }
            output.as_mut_slice()[..bytes.len()].copy_from_slice(&bytes);
            Ok(bytes.len())
        }
        _ => Err(Error::Unexpected("aes-gcm encrypt task returned an unexpected outcome variant".to_string())),
    }
}

pub async fn submit_aes_gcm_decrypt(
    ctx: &Context,
    key: [u8; 32],
    iv: [u8; 12],
    aad: &[u8],
    tag_size: usize,
    input: Buffer<'_>,
    mut output: Buffer<'_>,
) -> Result<usize> {
    let payload = TaskPayload::AesGcmDecrypt {
        key,
        iv,
        aad: aad.to_vec(),
        tag_size,
        input: input.to_vec(),
    };

    let outcome = ctx.engine().submit_task(ctx.id(), payload)?.await?;
    match outcome {
        TaskOutcome::AesGcm { output: bytes } => {
            if bytes.len() > output.len() {
                return Err(Error::OperationFailed {
                    native_code: -1,
                    message: "decrypted output exceeds destination buffer".to_string(),
                });
            }
            output.as_mut_slice()[..bytes.len()].copy_from_slice(&bytes);
            Ok(bytes.len())
        }
        _ => Err(Error::Unexpected("aes-gcm decrypt task returned an unexpected outcome variant".to_string())),
    }
}

/// Computes a digest over `input` using `algorithm`. Grounded on
/// `original_source/tests/group_sha.cpp`.
pub async fn submit_sha(ctx: &Context, algorithm: ShaAlgorithm, input: Buffer<'_>) -> Result<Vec<u8>> {
    let payload = TaskPayload::Sha { algorithm, input: input.to_vec() };

    let outcome = ctx.engine().submit_task(ctx.id(), payload)?.await?;
    match outcome {
        TaskOutcome::Sha { digest } => Ok(digest),
        _ => Err(Error::Unexpected("sha task returned an unexpected outcome variant".to_string())),
    }
}
