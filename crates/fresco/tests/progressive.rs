/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Progressive decode state machine behavior

use fresco::{DecodePhase, FrescoDecoder, FrescoEncoder, ProgressiveDecoder};
use fresco_core::bit_depth::BitDepth;
use fresco_core::colorspace::ColorSpace;
use fresco_core::mode::CompressionMode;
use fresco_core::options::{DecoderOptions, EncoderOptions};
use fresco_core::status::Status;
use nanorand::{Rng, WyRand};

/// 160x128 gray image tiled 64, a 3x2 grid of six tiles
fn sample_container() -> (Vec<u8>, Vec<u8>) {
    let options = EncoderOptions::new(160, 128, ColorSpace::Gray, BitDepth::Eight)
        .set_mode(CompressionMode::Lossless)
        .set_tile_size(64);
    let mut rng = WyRand::new_seed(101);
    let mut pixels = vec![0_u8; options.buffer_size()];
    rng.fill(&mut pixels);

    let container = FrescoEncoder::new(&pixels, options).unwrap().encode().unwrap();
    (container, pixels)
}

fn payload_start(container: &[u8]) -> usize {
    let metadata = fresco::extract_metadata(container).unwrap();
    (metadata.file_size - metadata.compressed_size) as usize
}

#[test]
fn walks_through_every_state() {
    let (container, pixels) = sample_container();
    let mut decoder = ProgressiveDecoder::new(DecoderOptions::default().set_progressive(true));

    assert_eq!(decoder.phase(), DecodePhase::HeaderPending);
    assert!(decoder.metadata().is_none());
    assert!(decoder.snapshot().is_none());

    let mut seen_metadata_ready = false;
    let mut seen_streaming = false;

    for piece in container.chunks(97) {
        let phase = decoder.feed(piece).unwrap();
        match phase {
            DecodePhase::MetadataReady => {
                seen_metadata_ready = true;
                let metadata = decoder.metadata().unwrap();
                assert_eq!((metadata.width, metadata.height), (160, 128));
            }
            DecodePhase::TilesStreaming => {
                seen_streaming = true;
                let (done, total) = decoder.progress().unwrap();
                assert!(done > 0 && done < total);
            }
            _ => ()
        }
    }

    assert!(seen_metadata_ready);
    assert!(seen_streaming);
    assert_eq!(decoder.phase(), DecodePhase::Complete);

    // complete output is byte identical to a one shot decode
    let one_shot = FrescoDecoder::new(&container).decode().unwrap();
    assert_eq!(decoder.pixels().unwrap(), one_shot);
    assert_eq!(decoder.pixels().unwrap(), pixels);
}

#[test]
fn snapshot_tracks_finished_regions() {
    let (container, pixels) = sample_container();
    let mut decoder = ProgressiveDecoder::new(DecoderOptions::default().set_progressive(true));

    // feed everything except the last few hundred bytes, leaving the
    // tail tiles unavailable
    let cut = container.len() - 400;
    decoder.feed(&container[..cut]).unwrap();

    let snapshot = decoder.snapshot().unwrap();
    assert_eq!((snapshot.tiles_x, snapshot.tiles_y), (3, 2));
    assert!(snapshot.finished.iter().any(|f| *f));
    assert!(snapshot.finished.iter().any(|f| !*f));
    assert_eq!(snapshot.pixels.len(), pixels.len());

    // finished tiles already show final pixels, edge tiles are
    // narrower than the nominal tile size
    for (index, done) in snapshot.finished.iter().enumerate() {
        if !done {
            continue;
        }
        let (gx, gy) = (index % 3, index / 3);
        let tile_w = 64.min(160 - gx * 64);
        for y in 0..64 {
            let row = gy * 64 + y;
            let start = row * 160 + gx * 64;
            assert_eq!(
                &snapshot.pixels[start..start + tile_w],
                &pixels[start..start + tile_w],
                "finished tile {index} row {y} differs"
            );
        }
    }

    // snapshots are deterministic
    let again = decoder.snapshot().unwrap();
    assert_eq!(again.pixels, snapshot.pixels);
    assert_eq!(again.finished, snapshot.finished);
}

#[test]
fn placeholder_is_the_directory_mean() {
    let (container, pixels) = sample_container();
    let mut decoder = ProgressiveDecoder::new(DecoderOptions::default().set_progressive(true));

    // stop right after the header region, no tile decodable
    let start = payload_start(&container);
    let phase = decoder.feed(&container[..start]).unwrap();
    assert_eq!(phase, DecodePhase::MetadataReady);

    let snapshot = decoder.snapshot().unwrap();
    assert!(snapshot.finished.iter().all(|f| !*f));

    // the placeholder for the first tile is its channel mean
    let tile_mean = {
        let mut sum = 0_u64;
        for y in 0..64 {
            for x in 0..64 {
                sum += u64::from(pixels[y * 160 + x]);
            }
        }
        (sum / (64 * 64)) as u8
    };
    assert_eq!(snapshot.pixels[0], tile_mean);
}

#[test]
fn corrupt_tile_fails_but_keeps_siblings() {
    let (mut container, pixels) = sample_container();

    // flip a byte in the last tile's payload
    let index = container.len() - 10;
    container[index] ^= 0xFF;

    let mut decoder = ProgressiveDecoder::new(DecoderOptions::default().set_progressive(true));
    let error = decoder.feed(&container).err().unwrap();
    assert_eq!(error.status(), Status::CorruptedData);
    assert_eq!(decoder.phase(), DecodePhase::Failed);

    // sibling tiles decoded before the failure stay retrievable
    let snapshot = decoder.snapshot().unwrap();
    let finished = snapshot.finished.iter().filter(|f| **f).count();
    assert_eq!(finished, 5);
    // tile zero's pixels are final and correct
    assert_eq!(&snapshot.pixels[0..64], &pixels[0..64]);
}

#[test]
fn failure_without_progressive_keeps_nothing() {
    let (mut container, _) = sample_container();
    let index = container.len() - 10;
    container[index] ^= 0xFF;

    let mut decoder = ProgressiveDecoder::new(DecoderOptions::default());
    assert!(decoder.feed(&container).is_err());
    assert_eq!(decoder.phase(), DecodePhase::Failed);
    assert!(decoder.snapshot().is_none());

    // the machine stays failed on further input
    assert!(decoder.feed(&[0; 16]).is_err());
}

#[test]
fn corrupt_header_fails_immediately() {
    let (mut container, _) = sample_container();
    container[8] ^= 0xFF;

    let mut decoder = ProgressiveDecoder::new(DecoderOptions::default().set_progressive(true));
    let error = decoder.feed(&container).err().unwrap();
    assert_eq!(error.status(), Status::CorruptedData);
    assert!(decoder.snapshot().is_none());
}
