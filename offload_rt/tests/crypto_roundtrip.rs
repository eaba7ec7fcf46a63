//! S5 from `SPEC_FULL.md` section 8: AES-256-GCM round-trip with the
//! literal key/IV/tag-size test vector from spec.md, against the same
//! 155-byte lorem-ipsum payload `original_source/tests/group_aes_gcm.cpp`
//! encrypts.

mod common;

use offload_rt::memory::MemoryMap;
use offload_rt::native::{ContextArgs, ContextKind};
use offload_rt::task_adapter::crypto;

const KEY: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz123456";
const IV: [u8; 12] = [0u8; 12];
const TAG_SIZE: usize = 12;
const PLAINTEXT: &[u8] = b"Lorem ipsum dolor sit amet, consetetur sadipscing elitr, sed diam \
nonumy eirmod tempor invidunt ut labore et dolore magna aliquyam erat, sed diam voluptua.";

#[tokio::test]
async fn aes_gcm_encrypt_then_decrypt_round_trips() {
    offload_rt::hardware_gated_test!(run_round_trip().await)
}

async fn run_round_trip() {
    common::run(|engine| async move {
        let ctx = engine.create_context(ContextKind::AesGcm, ContextArgs::AesGcm).await.unwrap();

        let input_map = MemoryMap::from_static(PLAINTEXT);
        let mut ciphertext_map = MemoryMap::new(PLAINTEXT.len() + TAG_SIZE);

        let written = crypto::submit_aes_gcm_encrypt(
            &ctx,
            *KEY,
            IV,
            &[],
            TAG_SIZE,
            input_map.whole(),
            ciphertext_map.whole_mut(),
        )
        .await
        .unwrap();

        assert_eq!(written, PLAINTEXT.len() + TAG_SIZE);

        let ciphertext = ciphertext_map.whole().as_slice()[..written].to_vec();
        let ciphertext_map = MemoryMap::from_vec(ciphertext);
        let mut decrypted_map = MemoryMap::new(PLAINTEXT.len());

        let decrypted_len = crypto::submit_aes_gcm_decrypt(
            &ctx,
            *KEY,
            IV,
            &[],
            TAG_SIZE,
            ciphertext_map.whole(),
            decrypted_map.whole_mut(),
        )
        .await
        .unwrap();

        assert_eq!(decrypted_len, PLAINTEXT.len());
        assert_eq!(&decrypted_map.whole().as_slice()[..decrypted_len], PLAINTEXT);

        ctx.stop().await.unwrap();
    })
    .await;
}
