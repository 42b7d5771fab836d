/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Corruption and truncation semantics

use fresco::{extract_metadata, FrescoDecoder, FrescoEncoder};
use fresco_core::bit_depth::BitDepth;
use fresco_core::colorspace::ColorSpace;
use fresco_core::mode::CompressionMode;
use fresco_core::options::EncoderOptions;
use fresco_core::status::Status;
use nanorand::{Rng, WyRand};

fn sample_container() -> (Vec<u8>, Vec<u8>) {
    let options = EncoderOptions::new(128, 96, ColorSpace::RGB, BitDepth::Eight)
        .set_mode(CompressionMode::Lossless)
        .set_tile_size(64);
    let mut rng = WyRand::new_seed(77);
    let mut pixels = vec![0_u8; options.buffer_size()];
    rng.fill(&mut pixels);

    let container = FrescoEncoder::new(&pixels, options).unwrap().encode().unwrap();
    (container, pixels)
}

/// Start of the payload region, every byte before it belongs to the
/// header and metadata block
fn payload_start(container: &[u8]) -> usize {
    let metadata = extract_metadata(container).unwrap();
    (metadata.file_size - metadata.compressed_size) as usize
}

fn adler32(data: &[u8]) -> u32 {
    let mut a: u32 = 1;
    let mut b: u32 = 0;
    for byte in data {
        a = (a + u32::from(*byte)) % 65521;
        b = (b + a) % 65521;
    }
    (b << 16) | a
}

#[test]
fn single_corrupt_tile_fails_whole_decode() {
    let (mut container, _) = sample_container();
    let start = payload_start(&container);
    container[start + 3] ^= 0xFF;

    let error = FrescoDecoder::new(&container).decode().err().unwrap();
    assert_eq!(error.status(), Status::CorruptedData);
}

#[test]
fn metadata_never_touches_payload_bytes() {
    let (mut container, _) = sample_container();
    let clean = extract_metadata(&container).unwrap();

    // scorch the entire payload region
    let start = payload_start(&container);
    for byte in container[start..].iter_mut() {
        *byte = 0xEE;
    }

    let metadata = extract_metadata(&container).unwrap();
    assert_eq!(metadata.width, clean.width);
    assert_eq!(metadata.height, clean.height);
    assert_eq!(metadata.channels, clean.channels);
    assert_eq!(metadata.compressed_size, clean.compressed_size);

    // while a real decode of the same bytes must fail
    assert!(FrescoDecoder::new(&container).decode().is_err());
}

#[test]
fn metadata_works_on_truncated_payloads() {
    let (container, _) = sample_container();
    let start = payload_start(&container);

    let metadata = extract_metadata(&container[..start + 10]).unwrap();
    assert_eq!(metadata.width, 128);
    assert_eq!(metadata.height, 96);
}

#[test]
fn truncated_container_fails_decode_with_corrupted_data() {
    let (container, _) = sample_container();

    let error = FrescoDecoder::new(&container[..container.len() - 5])
        .decode()
        .err()
        .unwrap();
    assert_eq!(error.status(), Status::CorruptedData);
}

#[test]
fn truncated_header_region_fails_metadata() {
    let (container, _) = sample_container();
    assert!(extract_metadata(&container[..20]).is_err());
}

#[test]
fn newer_version_reports_unsupported_format() {
    let (mut container, _) = sample_container();
    let region = payload_start(&container);

    // bump the version and re-seal the header checksum so version
    // detection, not corruption detection, is what fires
    container[4] = 9;
    let checksum = adler32(&container[..region - 4]);
    container[region - 4..region].copy_from_slice(&checksum.to_le_bytes());

    let error = extract_metadata(&container).err().unwrap();
    assert_eq!(error.status(), Status::UnsupportedFormat);
}

#[test]
fn flipped_header_bit_reports_corrupted_data() {
    let (mut container, _) = sample_container();
    container[16] ^= 0x04;

    let error = extract_metadata(&container).err().unwrap();
    assert_eq!(error.status(), Status::CorruptedData);
}

#[test]
fn wrong_magic_reports_corrupted_data() {
    let (mut container, _) = sample_container();
    container[0] = b'J';

    let error = FrescoDecoder::new(&container).decode().err().unwrap();
    assert_eq!(error.status(), Status::CorruptedData);
}

#[test]
fn trailing_garbage_rejected_on_full_decode() {
    let (mut container, _) = sample_container();
    container.extend_from_slice(&[1, 2, 3]);

    assert!(FrescoDecoder::new(&container).decode().is_err());
    // header region is still coherent, metadata keeps working
    assert!(extract_metadata(&container).is_ok());
}

#[test]
fn error_strings_are_stable() {
    assert_eq!(
        Status::CorruptedData.error_string(),
        "corrupted or invalid data"
    );
    assert_eq!(
        Status::UnsupportedFormat.error_string(),
        "unsupported image format"
    );
}
