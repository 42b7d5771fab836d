/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Animation frames and opaque extension chunks

use fresco::{FrescoDecoder, FrescoEncoder};
use fresco_core::bit_depth::BitDepth;
use fresco_core::colorspace::ColorSpace;
use fresco_core::mode::CompressionMode;
use fresco_core::options::EncoderOptions;
use fresco_core::status::Status;
use nanorand::{Rng, WyRand};

fn frame(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = WyRand::new_seed(seed);
    let mut out = vec![0_u8; len];
    rng.fill(&mut out);
    out
}

fn animated_options() -> EncoderOptions {
    EncoderOptions::new(64, 48, ColorSpace::RGB, BitDepth::Eight)
        .set_mode(CompressionMode::Lossless)
        .set_tile_size(32)
        .set_animation(true)
}

#[test]
fn animation_round_trips_frames_and_timing() {
    let options = animated_options();
    let size = options.buffer_size();
    let frames = [frame(1, size), frame(2, size), frame(3, size)];

    let mut encoder = FrescoEncoder::new(&frames[0], options).unwrap();
    encoder.set_frame_duration(0, 40).unwrap();
    encoder.add_frame(&frames[1], 60).unwrap();
    encoder.add_frame(&frames[2], 80).unwrap();
    encoder.set_frame_rate(25.0);
    let container = encoder.encode().unwrap();

    let metadata = fresco::extract_metadata(&container).unwrap();
    assert_eq!(metadata.frame_count, 3);
    assert_eq!(metadata.frame_rate, 25.0);

    let mut decoder = FrescoDecoder::new(&container);
    let decoded = decoder.decode_frames().unwrap();
    assert_eq!(decoded.len(), 3);
    for (i, decoded_frame) in decoded.iter().enumerate() {
        assert_eq!(decoded_frame.pixels, frames[i], "frame {i} differs");
    }
    assert_eq!(decoded[0].duration_ms, 40);
    assert_eq!(decoded[1].duration_ms, 60);
    assert_eq!(decoded[2].duration_ms, 80);

    // the primary frame fast path returns frame zero
    assert_eq!(FrescoDecoder::new(&container).decode().unwrap(), frames[0]);
}

#[test]
fn adding_frames_requires_the_animation_gate() {
    let options = EncoderOptions::new(64, 48, ColorSpace::RGB, BitDepth::Eight);
    let pixels = frame(5, options.buffer_size());
    let extra = frame(6, options.buffer_size());

    let mut encoder = FrescoEncoder::new(&pixels, options).unwrap();
    let error = encoder.add_frame(&extra, 50).err().unwrap();
    assert_eq!(error.status(), Status::InvalidParameter);
}

#[test]
fn mismatched_frame_length_rejected() {
    let options = animated_options();
    let pixels = frame(7, options.buffer_size());

    let mut encoder = FrescoEncoder::new(&pixels, options).unwrap();
    assert!(encoder.add_frame(&pixels[1..], 50).is_err());
}

#[test]
fn mesh_and_vector_chunks_round_trip() {
    let options = animated_options().set_animation(false).set_mesh(true).set_vector(true);
    let pixels = frame(9, options.buffer_size());
    let mesh = b"mesh payload, opaque to the raster pipeline".to_vec();
    let vector = b"vector payload".to_vec();

    let mut encoder = FrescoEncoder::new(&pixels, options).unwrap();
    encoder.set_mesh_chunk(&mesh).unwrap();
    encoder.set_vector_chunk(&vector).unwrap();
    let container = encoder.encode().unwrap();

    let metadata = fresco::extract_metadata(&container).unwrap();
    assert!(metadata.has_mesh);
    assert!(metadata.has_vector);

    let mut decoder = FrescoDecoder::new(&container);
    decoder.decode_headers().unwrap();
    assert_eq!(decoder.mesh_chunk().unwrap().unwrap(), &mesh[..]);
    assert_eq!(decoder.vector_chunk().unwrap().unwrap(), &vector[..]);

    // chunks ride along without disturbing the raster data
    assert_eq!(decoder.decode().unwrap(), pixels);
}

#[test]
fn chunks_require_their_gates() {
    let options = EncoderOptions::new(64, 48, ColorSpace::RGB, BitDepth::Eight);
    let pixels = frame(11, options.buffer_size());

    let mut encoder = FrescoEncoder::new(&pixels, options).unwrap();
    assert_eq!(
        encoder.set_mesh_chunk(b"m").err().unwrap().status(),
        Status::InvalidParameter
    );
    assert_eq!(
        encoder.set_vector_chunk(b"v").err().unwrap().status(),
        Status::InvalidParameter
    );
}

#[test]
fn disabled_gates_do_not_change_raster_output() {
    // the extension gates only control which chunks are recognized,
    // raster tile bytes must be identical either way
    let pixels = frame(13, 64 * 48 * 3);

    let plain = EncoderOptions::new(64, 48, ColorSpace::RGB, BitDepth::Eight)
        .set_mode(CompressionMode::Lossless)
        .set_tile_size(32);
    let gated = plain.set_mesh(true).set_vector(true);

    let without = FrescoEncoder::new(&pixels, plain).unwrap().encode().unwrap();
    let with_gates = FrescoEncoder::new(&pixels, gated).unwrap().encode().unwrap();

    // no chunk was attached, so the containers decode identically
    assert_eq!(
        FrescoDecoder::new(&without).decode().unwrap(),
        FrescoDecoder::new(&with_gates).decode().unwrap()
    );
}

#[test]
fn truncated_chunk_is_detected_on_access() {
    let options = EncoderOptions::new(64, 48, ColorSpace::RGB, BitDepth::Eight)
        .set_mode(CompressionMode::Lossless)
        .set_tile_size(32)
        .set_mesh(true);
    let pixels = frame(15, options.buffer_size());

    let mut encoder = FrescoEncoder::new(&pixels, options).unwrap();
    encoder.set_mesh_chunk(b"a mesh that will be cut off").unwrap();
    let container = encoder.encode().unwrap();

    // drop the tail of the chunk, headers still parse
    let cut = &container[..container.len() - 5];
    let mut decoder = FrescoDecoder::new(cut);
    decoder.decode_headers().unwrap();
    assert!(decoder.mesh_chunk().is_err());
}
