//! S4 from `SPEC_FULL.md` section 8: compression round-trip with the
//! literal test vector from `original_source/tests/group_compress.cpp`.

mod common;

use offload_rt::memory::MemoryMap;
use offload_rt::native::{ContextArgs, ContextKind};
use offload_rt::task_adapter::compress;

const PLAINTEXT: &[u8] = b"Lorem ipsum dolor sit amet, consetetur sadipscing elitr, sed diam \
nonumy eirmod tempor invidunt ut labore et dolore magna aliquyam erat, sed diam voluptua.";

#[tokio::test]
async fn compress_then_decompress_round_trips_and_matches_known_checksums() {
    common::run(|engine| async move {
        let ctx = engine.create_context(ContextKind::Compress, ContextArgs::Compress).await.unwrap();

        let input_map = MemoryMap::from_static(PLAINTEXT);
        let mut compressed_map = MemoryMap::new(PLAINTEXT.len());

        let result =
            compress::submit_compress(&ctx, input_map.whole(), compressed_map.whole_mut())
                .await
                .unwrap();

        assert!(result.bytes_written < PLAINTEXT.len());
        assert_eq!(result.crc32, 4_025_347_724);
        assert_eq!(result.adler32, 2_629_515_667);

        let compressed_bytes = compressed_map.whole().as_slice()[..result.bytes_written].to_vec();
        let compressed_map = MemoryMap::from_vec(compressed_bytes);
        let mut decompressed_map = MemoryMap::new(PLAINTEXT.len());

        let bytes_written =
            compress::submit_decompress(&ctx, compressed_map.whole(), decompressed_map.whole_mut())
                .await
                .unwrap();

        assert_eq!(bytes_written, PLAINTEXT.len());
        assert_eq!(&decompressed_map.whole().as_slice()[..bytes_written], PLAINTEXT);

        ctx.stop().await.unwrap();
    })
    .await;
}
