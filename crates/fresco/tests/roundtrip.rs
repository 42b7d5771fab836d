/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Lossless round trip guarantees

use fresco::{FrescoDecoder, FrescoEncoder};
use fresco_core::bit_depth::BitDepth;
use fresco_core::colorspace::{ColorSpace, ALL_COLORSPACES};
use fresco_core::mode::CompressionMode;
use fresco_core::options::EncoderOptions;
use nanorand::{Rng, WyRand};

fn random_buffer(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = WyRand::new_seed(seed);
    let mut out = vec![0_u8; len];
    rng.fill(&mut out);
    out
}

fn lossless_options(
    width: usize, height: usize, colorspace: ColorSpace, depth: BitDepth
) -> EncoderOptions {
    EncoderOptions::new(width, height, colorspace, depth)
        .set_mode(CompressionMode::Lossless)
        .set_tile_size(64)
}

#[test]
fn lossless_every_colorspace_eight_bit() {
    for colorspace in ALL_COLORSPACES {
        let options = lossless_options(100, 75, colorspace, BitDepth::Eight);
        let pixels = random_buffer(options.buffer_size(), 11);

        let container = FrescoEncoder::new(&pixels, options).unwrap().encode().unwrap();
        let decoded = FrescoDecoder::new(&container).decode().unwrap();
        assert_eq!(decoded, pixels, "{colorspace:?} did not round trip");
    }
}

#[test]
fn lossless_every_colorspace_sixteen_bit() {
    for colorspace in ALL_COLORSPACES {
        let options = lossless_options(49, 37, colorspace, BitDepth::Sixteen);
        let pixels = random_buffer(options.buffer_size(), 23);

        let container = FrescoEncoder::new(&pixels, options).unwrap().encode().unwrap();
        let decoded = FrescoDecoder::new(&container).decode().unwrap();
        assert_eq!(decoded, pixels, "{colorspace:?} did not round trip");
    }
}

#[test]
fn lossless_512_rgb_high_effort_large_tiles() {
    // 512x512 RGB, lossless, effort 8, tile 256: metadata reports the
    // geometry and decode reproduces the exact input bytes
    let options = EncoderOptions::new(512, 512, ColorSpace::RGB, BitDepth::Eight)
        .set_mode(CompressionMode::Lossless)
        .set_effort(8)
        .set_tile_size(256);

    let mut pixels = Vec::with_capacity(512 * 512 * 3);
    for y in 0..512_usize {
        for x in 0..512_usize {
            pixels.push((x % 256) as u8);
            pixels.push((y % 256) as u8);
            pixels.push(((x + y) % 256) as u8);
        }
    }

    let container = FrescoEncoder::new(&pixels, options).unwrap().encode().unwrap();

    let metadata = fresco::extract_metadata(&container).unwrap();
    assert_eq!(metadata.width, 512);
    assert_eq!(metadata.height, 512);
    assert_eq!(metadata.channels, 3);
    assert_eq!(metadata.bit_depth, BitDepth::Eight);
    assert_eq!(metadata.file_size, container.len() as u64);

    let decoded = FrescoDecoder::new(&container).decode().unwrap();
    assert_eq!(decoded, pixels);
}

#[test]
fn boundary_tiles_reproduce_exact_dimensions() {
    // dimensions that are not multiples of the tile size decode to
    // exactly the original geometry, no padding artifacts
    for (width, height) in [(257, 123), (65, 64), (63, 65), (1, 1), (16, 300)] {
        let options = lossless_options(width, height, ColorSpace::Gray, BitDepth::Eight);
        let pixels = random_buffer(options.buffer_size(), 31);

        let container = FrescoEncoder::new(&pixels, options).unwrap().encode().unwrap();
        let mut decoder = FrescoDecoder::new(&container);
        let decoded = decoder.decode().unwrap();

        assert_eq!(decoder.dimensions(), Some((width, height)));
        assert_eq!(decoded.len(), width * height);
        assert_eq!(decoded, pixels, "{width}x{height}");
    }
}

#[test]
fn effort_changes_size_never_content() {
    let pixels = random_buffer(80 * 60 * 3, 47);
    let mut containers = Vec::new();

    for effort in [1, 5, 10] {
        let options = lossless_options(80, 60, ColorSpace::RGB, BitDepth::Eight)
            .set_effort(effort);
        let container = FrescoEncoder::new(&pixels, options).unwrap().encode().unwrap();
        let decoded = FrescoDecoder::new(&container).decode().unwrap();
        assert_eq!(decoded, pixels, "effort {effort} broke losslessness");
        containers.push(container);
    }
}

#[test]
fn encode_is_deterministic() {
    let options = lossless_options(150, 90, ColorSpace::RGBA, BitDepth::Eight);
    let pixels = random_buffer(options.buffer_size(), 59);

    let first = FrescoEncoder::new(&pixels, options).unwrap().encode().unwrap();
    let second = FrescoEncoder::new(&pixels, options).unwrap().encode().unwrap();
    assert_eq!(first, second);
}

#[test]
fn encode_is_identical_across_thread_counts() {
    let base = lossless_options(150, 90, ColorSpace::RGB, BitDepth::Eight);
    let pixels = random_buffer(base.buffer_size(), 61);

    let single = FrescoEncoder::new(&pixels, base.set_num_threads(1))
        .unwrap()
        .encode()
        .unwrap();
    let parallel = FrescoEncoder::new(&pixels, base.set_num_threads(4))
        .unwrap()
        .encode()
        .unwrap();
    let auto = FrescoEncoder::new(&pixels, base.set_num_threads(0))
        .unwrap()
        .encode()
        .unwrap();

    assert_eq!(single, parallel);
    assert_eq!(single, auto);
}

#[test]
fn invalid_configuration_fails_before_any_work() {
    use fresco_core::status::Status;

    let options = EncoderOptions::new(16, 16, ColorSpace::RGB, BitDepth::Eight).set_quality(150);
    let pixels = vec![0_u8; options.buffer_size()];

    let error = FrescoEncoder::new(&pixels, options).err().unwrap();
    assert_eq!(error.status(), Status::InvalidParameter);
}

#[test]
fn wrong_buffer_length_rejected() {
    use fresco_core::status::Status;

    let options = EncoderOptions::new(16, 16, ColorSpace::RGB, BitDepth::Eight);
    let error = FrescoEncoder::new(&[0_u8; 10], options).err().unwrap();
    assert_eq!(error.status(), Status::InvalidParameter);
}
