//! S3 from `SPEC_FULL.md` section 8: a task submission round-trips through
//! a native completion event exactly once.

mod common;

use offload_rt::memory::MemoryMap;
use offload_rt::native::{ContextArgs, ContextKind};
use offload_rt::task_adapter::dma;

#[tokio::test]
async fn dma_copy_round_trips_a_single_byte_through_a_completion_event() {
    common::run(|engine| async move {
        let ctx = engine.create_context(ContextKind::Dma, ContextArgs::Dma).await.unwrap();

        let src_map = MemoryMap::from_static(&[42u8]);
        let mut dst_map = MemoryMap::new(1);

        dma::submit_copy(&ctx, src_map.whole(), dst_map.whole_mut()).await.unwrap();

        assert_eq!(dst_map.whole().as_slice(), &[42u8]);

        ctx.stop().await.unwrap();
    })
    .await;
}

#[tokio::test]
async fn two_sequential_dma_copies_each_complete_exactly_once() {
    common::run(|engine| async move {
        let ctx = engine.create_context(ContextKind::Dma, ContextArgs::Dma).await.unwrap();

        let src_a = MemoryMap::from_static(&[7u8, 8, 9]);
        let mut dst_a = MemoryMap::new(3);
        dma::submit_copy(&ctx, src_a.whole(), dst_a.whole_mut()).await.unwrap();
        assert_eq!(dst_a.whole().as_slice(), &[7u8, 8, 9]);

        let src_b = MemoryMap::from_static(&[1u8, 2, 3, 4]);
        let mut dst_b = MemoryMap::new(4);
        dma::submit_copy(&ctx, src_b.whole(), dst_b.whole_mut()).await.unwrap();
        assert_eq!(dst_b.whole().as_slice(), &[1u8, 2, 3, 4]);

        ctx.stop().await.unwrap();
    })
    .await;
}
