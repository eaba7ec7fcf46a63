//! Communication-channel send/receive. Grounded on
//! `original_source/progs/comch_data_client.cpp` / `comch_data_server.cpp`.

use crate::buffer::Buffer;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::native::{TaskOutcome, TaskPayload};

pub async fn submit_send(ctx: &Context, buf: Buffer<'_>) -> Result<()> {
    let payload = TaskPayload::ComchSend { payload: buf.to_vec() };

    let outcome = ctx.engine().submit_task(ctx.id(), payload)?.await?;
    match outcome {
        TaskOutcome::ComchSend => Ok(()),
        _ => Err(Error::Unexpected("comch send task returned an unexpected outcome variant".to_string())),
    }
}

/// Result of a completed receive: the payload, the sending peer's id, and
/// any immediate data piggy-backed on the message (mirrors DOCA comch's
/// consumer/producer message shape).
#[derive(Debug, Clone)]
pub struct ComchResult {
    pub payload: Vec<u8>,
    pub sender_id: u64,
    pub immediate_data: u32,
}

pub async fn submit_recv(ctx: &Context) -> Result<ComchResult> {
    let payload = TaskPayload::ComchRecv;

    let outcome = ctx.engine().submit_task(ctx.id(), payload)?.await?;
    match outcome {
        TaskOutcome::ComchRecv { payload, sender_id, immediate_data } => {
            Ok(ComchResult { payload, sender_id, immediate_data })
        }
        _ => Err(Error::Unexpected("comch recv task returned an unexpected outcome variant".to_string())),
    }
}
