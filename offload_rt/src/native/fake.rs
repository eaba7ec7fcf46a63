//! Deterministic in-memory implementation of [`super::Native`] used by this
//! crate's own test suite (see `SPEC_FULL.md` sections 2 and 8). No real
//! hardware offload happens here — every task kind's math runs in software,
//! synchronously, inside [`FakeNative::task_submit`], so the completion
//! event is always ready by the time the engine's next `progress()` drain
//! picks it up.
//!
//! Always compiled (not `#[cfg(test)]`): integration tests under `tests/`
//! build against a normal (non-`--cfg test`) copy of this crate and would
//! not see a `cfg(test)`-gated module, so this is deliberately public,
//! the same reasoning `SPEC_FULL.md` section 9 documents for
//! `test_support`.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;

use aes_gcm::aead::generic_array::typenum::U12;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{AesGcm, Key, Nonce};
use sha2::Digest;

use super::erasure_math::Tables;
use super::{
    ContextArgs, ContextKind, CtxId, Native, NativeCtxState, NativeEvent, ShaAlgorithm, TaskId,
    TaskOutcome, TaskPayload, TaskStatus,
};
use crate::error::{Error, Result};

/// AES-256-GCM with a 96-bit (12-byte) authentication tag, matching the
/// `tag_size = 12` the S5 test vector and `original_source/samples/encrypt.cpp`
/// both use (the `aes_gcm` crate's `Aes256Gcm` alias defaults to a 16-byte
/// tag, so this crate parameterizes `AesGcm` directly instead).
type Aes256Gcm96 = AesGcm<aes_gcm::aes::Aes256, U12, U12>;

struct CtxRecord {
    #[allow(dead_code)] // kept for parity with a real backend's capability dispatch
    kind: ContextKind,
    state: NativeCtxState,
    user_data: usize,
}

struct Inner {
    contexts: HashMap<u64, CtxRecord>,
    next_ctx_id: u64,
    next_task_id: u64,
    events: VecDeque<NativeEvent>,
    next_start_denied: bool,
    tables: Tables,
}

/// Fake backend: a real Linux socketpair stands in for the native
/// notification fd (so [`tokio::io::unix::AsyncFd`] has something genuine
/// to poll), everything else is plain in-process bookkeeping behind a
/// `RefCell` (single-threaded, per `SPEC_FULL.md` section 5).
pub struct FakeNative {
    inner: RefCell<Inner>,
    notify_read: UnixStream,
    notify_write: RefCell<UnixStream>,
}

impl Default for FakeNative {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeNative {
    #[must_use]
    pub fn new() -> Self {
        let (read, write) =
            UnixStream::pair().expect("failed to create notification fd socketpair");
        read.set_nonblocking(true).expect("set_nonblocking on notification read end");
        write.set_nonblocking(true).expect("set_nonblocking on notification write end");
        Self {
            inner: RefCell::new(Inner {
                contexts: HashMap::new(),
                next_ctx_id: 1,
                next_task_id: 1,
                events: VecDeque::new(),
                next_start_denied: false,
                tables: Tables::build(),
            }),
            notify_read: read,
            notify_write: RefCell::new(write),
        }
    }

    /// Test hook: the *next* `ctx_create`'d context will fail to start
    /// (`starting -> idle`), exercising the `start_denied` path (section
    /// 4.E's state table).
    pub fn script_next_start_denied(&self) {
        self.inner.borrow_mut().next_start_denied = true;
    }

    /// Test hook: simulates the `running -> idle` peer-loss transition
    /// (section 4.E / 9 — the non-monotonic state machine case).
    pub fn force_peer_loss(&self, ctx: CtxId) {
        let user_data = {
            let mut inner = self.inner.borrow_mut();
            let Some(record) = inner.contexts.get_mut(&ctx.0) else { return };
            record.state = NativeCtxState::Idle;
            record.user_data
        };
        self.push_event(NativeEvent::ContextStateChanged {
            ctx,
            prev: NativeCtxState::Running,
            next: NativeCtxState::Idle,
            user_data,
        });
    }

    fn signal(&self) {
        // Best-effort: a full pipe just means a notification is already
        // pending, which is exactly the state we want.
        let _ = self.notify_write.borrow_mut().write(&[1]);
    }

    fn push_event(&self, event: NativeEvent) {
        self.inner.borrow_mut().events.push_back(event);
        self.signal();
    }
}

impl Native for FakeNative {
    fn notification_fd(&self) -> RawFd {
        self.notify_read.as_raw_fd()
    }

    fn request_notification(&self) {
        // The fake backend signals eagerly at event-enqueue time (`push_event`),
        // so there is nothing to separately arm here.
    }

    fn clear_notification(&self) {
        let mut buf = [0u8; 64];
        loop {
            match (&self.notify_read).read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    }

    fn progress(&self) -> Vec<NativeEvent> {
        self.inner.borrow_mut().events.drain(..).collect()
    }

    fn ctx_create(&self, kind: ContextKind, _args: ContextArgs) -> Result<CtxId> {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_ctx_id;
        inner.next_ctx_id += 1;
        inner
            .contexts
            .insert(id, CtxRecord { kind, state: NativeCtxState::Idle, user_data: 0 });
        Ok(CtxId(id))
    }

    fn ctx_destroy(&self, id: CtxId) {
        self.inner.borrow_mut().contexts.remove(&id.0);
    }

    fn ctx_start(&self, id: CtxId) -> Result<()> {
        let (deny, user_data) = {
            let mut inner = self.inner.borrow_mut();
            let deny = std::mem::take(&mut inner.next_start_denied);
            let record = inner
                .contexts
                .get_mut(&id.0)
                .ok_or(Error::InvalidState("ctx_start on unknown context"))?;
            record.state = NativeCtxState::Starting;
            (deny, record.user_data)
        };
        self.push_event(NativeEvent::ContextStateChanged {
            ctx: id,
            prev: NativeCtxState::Idle,
            next: NativeCtxState::Starting,
            user_data,
        });

        let next = if deny { NativeCtxState::Idle } else { NativeCtxState::Running };
        self.inner.borrow_mut().contexts.get_mut(&id.0).expect("context exists").state = next;
        self.push_event(NativeEvent::ContextStateChanged {
            ctx: id,
            prev: NativeCtxState::Starting,
            next,
            user_data,
        });
        Ok(())
    }

    fn ctx_stop(&self, id: CtxId) -> Result<()> {
        let user_data = {
            let mut inner = self.inner.borrow_mut();
            let record = inner
                .contexts
                .get_mut(&id.0)
                .ok_or(Error::InvalidState("ctx_stop on unknown context"))?;
            record.state = NativeCtxState::Stopping;
            record.user_data
        };
        self.push_event(NativeEvent::ContextStateChanged {
            ctx: id,
            prev: NativeCtxState::Running,
            next: NativeCtxState::Stopping,
            user_data,
        });
        self.inner.borrow_mut().contexts.get_mut(&id.0).expect("context exists").state =
            NativeCtxState::Idle;
        self.push_event(NativeEvent::ContextStateChanged {
            ctx: id,
            prev: NativeCtxState::Stopping,
            next: NativeCtxState::Idle,
            user_data,
        });
        Ok(())
    }

    fn ctx_get_state(&self, id: CtxId) -> NativeCtxState {
        self.inner.borrow().contexts.get(&id.0).map_or(NativeCtxState::Idle, |r| r.state)
    }

    fn ctx_set_user_data(&self, id: CtxId, user_data: usize) {
        if let Some(record) = self.inner.borrow_mut().contexts.get_mut(&id.0) {
            record.user_data = user_data;
        }
    }

    fn task_submit(&self, _ctx: CtxId, payload: TaskPayload, user_data: usize) -> Result<TaskId> {
        let tables_ptr: *const Tables = &self.inner.borrow().tables;
        // SAFETY: `tables` is never mutated after construction and this
        // borrow does not outlive the synchronous call below; taking a raw
        // pointer just avoids holding the `RefCell` borrow across `compute`,
        // which itself never touches `self.inner`.
        let tables = unsafe { &*tables_ptr };

        let outcome = compute(tables, payload);
        let task_id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_task_id;
            inner.next_task_id += 1;
            id
        };

        let status = match outcome {
            Ok(outcome) => TaskStatus::Success(outcome),
            Err(err) => TaskStatus::Failure {
                native_code: err.native_code().unwrap_or(-1),
                message: err.to_string(),
            },
        };
        self.push_event(NativeEvent::TaskCompleted { task: TaskId(task_id), user_data, status });
        Ok(TaskId(task_id))
    }

    fn task_free(&self, _id: TaskId) {}

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn adler32(data: &[u8]) -> u32 {
    const MOD_ADLER: u32 = 65521;
    let (mut a, mut b) = (1u32, 0u32);
    for &byte in data {
        a = (a + u32::from(byte)) % MOD_ADLER;
        b = (b + a) % MOD_ADLER;
    }
    (b << 16) | a
}

fn compute(tables: &Tables, payload: TaskPayload) -> Result<TaskOutcome> {
    match payload {
        TaskPayload::Dma { src, dst, len } => {
            // SAFETY: `task_adapter::dma::submit_copy` derives `src`/`dst`
            // from live `Buffer<'a>` borrows for the duration of this
            // synchronous call (the caller contract in `SPEC_FULL.md`
            // section 5, "owners must outlive the task").
            unsafe { std::ptr::copy_nonoverlapping(src, dst, len) };
            Ok(TaskOutcome::Dma)
        }

        TaskPayload::Compress { input, input_len, output, output_cap } => {
            // SAFETY: see above; `input`/`output` are live for this call.
            let input_slice = unsafe { std::slice::from_raw_parts(input, input_len) };
            let crc32 = crc32fast::hash(input_slice);
            let adler = adler32(input_slice);

            let mut encoder =
                flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
            encoder
                .write_all(input_slice)
                .and_then(|()| encoder.finish())
                .map_err(|err| Error::OperationFailed { native_code: -1, message: err.to_string() })
                .and_then(|compressed| {
                    if compressed.len() > output_cap {
                        return Err(Error::OperationFailed {
                            native_code: -1,
                            message: "compressed output exceeds destination buffer".to_string(),
                        });
                    }
                    // SAFETY: `output_cap` bytes are live for this call.
                    let output_slice =
                        unsafe { std::slice::from_raw_parts_mut(output, output_cap) };
                    output_slice[..compressed.len()].copy_from_slice(&compressed);
                    Ok(TaskOutcome::Compress { bytes_written: compressed.len(), crc32, adler32: adler })
                })
        }

        TaskPayload::Decompress { input, input_len, output, output_cap } => {
            let input_slice = unsafe { std::slice::from_raw_parts(input, input_len) };
            let mut decoder = flate2::read::DeflateDecoder::new(input_slice);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|err| Error::OperationFailed { native_code: -1, message: err.to_string() })?;
            if decompressed.len() > output_cap {
                return Err(Error::OperationFailed {
                    native_code: -1,
                    message: "decompressed output exceeds destination buffer".to_string(),
                });
            }
            let output_slice = unsafe { std::slice::from_raw_parts_mut(output, output_cap) };
            output_slice[..decompressed.len()].copy_from_slice(&decompressed);
            Ok(TaskOutcome::Decompress { bytes_written: decompressed.len() })
        }

        TaskPayload::AesGcmEncrypt { key, iv, aad, tag_size, input } => {
            if tag_size != 12 {
                return Err(Error::OperationFailed {
                    native_code: -1,
                    message: format!("fake backend only supports a 12-byte tag, got {tag_size}"),
                });
            }
            let cipher = Aes256Gcm96::new(Key::<Aes256Gcm96>::from_slice(&key));
            let nonce = Nonce::from_slice(&iv);
            let output = cipher
                .encrypt(nonce, Payload { msg: &input, aad: &aad })
                .map_err(|err| Error::OperationFailed { native_code: -1, message: err.to_string() })?;
            Ok(TaskOutcome::AesGcm { output })
        }

        TaskPayload::AesGcmDecrypt { key, iv, aad, tag_size, input } => {
            if tag_size != 12 {
                return Err(Error::OperationFailed {
                    native_code: -1,
                    message: format!("fake backend only supports a 12-byte tag, got {tag_size}"),
                });
            }
            let cipher = Aes256Gcm96::new(Key::<Aes256Gcm96>::from_slice(&key));
            let nonce = Nonce::from_slice(&iv);
            let output = cipher
                .decrypt(nonce, Payload { msg: &input, aad: &aad })
                .map_err(|err| Error::OperationFailed { native_code: -1, message: err.to_string() })?;
            Ok(TaskOutcome::AesGcm { output })
        }

        TaskPayload::Sha { algorithm, input } => {
            let digest = match algorithm {
                ShaAlgorithm::Sha256 => sha2::Sha256::digest(&input).to_vec(),
                ShaAlgorithm::Sha1 => sha1::Sha1::digest(&input).to_vec(),
            };
            Ok(TaskOutcome::Sha { digest })
        }

        TaskPayload::ErasureEncode { data_blocks, redundancy_count } => {
            let redundancy_blocks =
                super::erasure_math::encode(tables, &data_blocks, redundancy_count);
            Ok(TaskOutcome::ErasureEncode { redundancy_blocks })
        }

        TaskPayload::ErasureRecover { available, recover_indices, data_count, redundancy_count } => {
            let recovered = super::erasure_math::recover(
                tables,
                data_count,
                redundancy_count,
                &available,
                &recover_indices,
            );
            Ok(TaskOutcome::ErasureRecover { recovered })
        }

        TaskPayload::ComchSend { payload } => {
            let _ = payload;
            Ok(TaskOutcome::ComchSend)
        }

        TaskPayload::ComchRecv => Ok(TaskOutcome::ComchRecv {
            payload: Vec::new(),
            sender_id: 0,
            immediate_data: 0,
        }),

        TaskPayload::RdmaWrite { .. } | TaskPayload::RdmaRead { .. } => Ok(TaskOutcome::Rdma),

        TaskPayload::SyncEventWait { .. } => Ok(TaskOutcome::SyncEvent),
    }
}
