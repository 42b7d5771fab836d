/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Block transform and quantizer for the lossy path
//!
//! Tiles are cut into 8x8 blocks, edge blocks replicate their last
//! row/column. Each block runs an orthonormal float DCT-II, the
//! coefficients are divided by a frequency weighted step derived from
//! `quality` and rounded. Decode multiplies by the identical step, so
//! the only error in the whole pipeline is the rounding done here.
//!
//! The AC dead zone widens the band around zero that quantizes to
//! nothing. Candidate dead zones are an encode side search knob, the
//! decoder never sees them.

use crate::utils::{zigzag_decode, zigzag_encode};

pub(crate) const BLOCK_SIZE: usize = 8;
const BLOCK_AREA: usize = BLOCK_SIZE * BLOCK_SIZE;

/// Scan order mapping scan position to block index, low frequencies
/// first so zero runs cluster at the tail
#[rustfmt::skip]
const SCAN_ORDER: [usize; BLOCK_AREA] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63
];

/// Quantization step for scan position `position`.
///
/// Strictly monotonic decreasing in `quality` and scaled to the
/// sample range so sixteen bit planes quantize proportionally.
/// The decoder calls this with the same arguments, making
/// dequantization the literal inverse
pub(crate) fn quant_step(quality: u8, position: usize, mask: u32) -> f32 {
    debug_assert!((1..=100).contains(&quality));

    let block_index = SCAN_ORDER[position];
    let (u, v) = (block_index % BLOCK_SIZE, block_index / BLOCK_SIZE);
    // mild high frequency emphasis, DC weight 1, corner weight 8
    let weight = 1.0 + (u + v) as f32 * 0.5;
    let scale = ((50.0 - f32::from(quality)) / 10.0).exp2();
    let range_scale = (mask + 1) as f32 / 256.0;

    8.0 * weight * scale * range_scale
}

/// Dead zone candidates tried per tile for a given effort.
///
/// `0.5` is plain rounding. The winner is picked by rate and
/// distortion on the encode side only
pub(crate) fn deadzone_candidates(effort: u8) -> &'static [f32] {
    match effort {
        1..=3 => &[0.5],
        4..=7 => &[0.5, 0.75, 1.0],
        _ => &[0.5, 0.75, 1.0, 1.25, 1.5]
    }
}

/// The orthonormal 8 point DCT-II basis, `basis[u][x]`
fn dct_basis() -> [[f32; BLOCK_SIZE]; BLOCK_SIZE] {
    let mut basis = [[0.0_f32; BLOCK_SIZE]; BLOCK_SIZE];
    for (u, row) in basis.iter_mut().enumerate() {
        let amplitude = if u == 0 {
            (1.0_f32 / BLOCK_SIZE as f32).sqrt()
        } else {
            (2.0_f32 / BLOCK_SIZE as f32).sqrt()
        };
        for (x, value) in row.iter_mut().enumerate() {
            let angle =
                ((2 * x + 1) as f32) * (u as f32) * core::f32::consts::PI / (2 * BLOCK_SIZE) as f32;
            *value = amplitude * angle.cos();
        }
    }
    basis
}

fn forward_block(block: &[f32; BLOCK_AREA], basis: &[[f32; 8]; 8]) -> [f32; BLOCK_AREA] {
    let mut rows = [0.0_f32; BLOCK_AREA];
    for y in 0..BLOCK_SIZE {
        for u in 0..BLOCK_SIZE {
            let mut acc = 0.0;
            for x in 0..BLOCK_SIZE {
                acc += block[y * BLOCK_SIZE + x] * basis[u][x];
            }
            rows[y * BLOCK_SIZE + u] = acc;
        }
    }
    let mut out = [0.0_f32; BLOCK_AREA];
    for v in 0..BLOCK_SIZE {
        for u in 0..BLOCK_SIZE {
            let mut acc = 0.0;
            for y in 0..BLOCK_SIZE {
                acc += rows[y * BLOCK_SIZE + u] * basis[v][y];
            }
            out[v * BLOCK_SIZE + u] = acc;
        }
    }
    out
}

fn inverse_block(coeffs: &[f32; BLOCK_AREA], basis: &[[f32; 8]; 8]) -> [f32; BLOCK_AREA] {
    let mut rows = [0.0_f32; BLOCK_AREA];
    for u in 0..BLOCK_SIZE {
        for y in 0..BLOCK_SIZE {
            let mut acc = 0.0;
            for v in 0..BLOCK_SIZE {
                acc += coeffs[v * BLOCK_SIZE + u] * basis[v][y];
            }
            rows[y * BLOCK_SIZE + u] = acc;
        }
    }
    let mut out = [0.0_f32; BLOCK_AREA];
    for y in 0..BLOCK_SIZE {
        for x in 0..BLOCK_SIZE {
            let mut acc = 0.0;
            for u in 0..BLOCK_SIZE {
                acc += rows[y * BLOCK_SIZE + u] * basis[u][x];
            }
            out[y * BLOCK_SIZE + x] = acc;
        }
    }
    out
}

/// Number of quantized values one plane region produces
pub(crate) fn coefficient_count(width: usize, height: usize) -> usize {
    width.div_ceil(BLOCK_SIZE) * height.div_ceil(BLOCK_SIZE) * BLOCK_AREA
}

/// Transform and quantize one tile plane.
///
/// Returns the zigzag mapped quantized coefficients in block row
/// major, scan order, plus the summed squared coefficient error the
/// quantizer introduced (used by the dead zone search)
pub(crate) fn forward_tile(
    samples: &[u16], width: usize, height: usize, mask: u32, quality: u8, deadzone: f32
) -> (Vec<u32>, f64) {
    debug_assert_eq!(samples.len(), width * height);

    let basis = dct_basis();
    let center = ((mask + 1) / 2) as f32;
    let blocks_x = width.div_ceil(BLOCK_SIZE);
    let blocks_y = height.div_ceil(BLOCK_SIZE);

    let mut out = Vec::with_capacity(blocks_x * blocks_y * BLOCK_AREA);
    let mut distortion = 0.0_f64;

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let mut block = [0.0_f32; BLOCK_AREA];
            for y in 0..BLOCK_SIZE {
                // replicate the last row/column into edge blocks,
                // the padding never reaches the output since decode
                // crops to the true region size
                let sy = (by * BLOCK_SIZE + y).min(height - 1);
                for x in 0..BLOCK_SIZE {
                    let sx = (bx * BLOCK_SIZE + x).min(width - 1);
                    block[y * BLOCK_SIZE + x] = f32::from(samples[sy * width + sx]) - center;
                }
            }
            let coeffs = forward_block(&block, &basis);

            for position in 0..BLOCK_AREA {
                let coeff = coeffs[SCAN_ORDER[position]];
                let step = quant_step(quality, position, mask);
                let scaled = coeff / step;

                let quantized = if position > 0 && scaled.abs() < deadzone {
                    0
                } else {
                    scaled.round() as i32
                };
                let error = f64::from(coeff - quantized as f32 * step);
                distortion += error * error;
                out.push(zigzag_encode(quantized));
            }
        }
    }
    (out, distortion)
}

/// Dequantize and inverse transform one tile plane, cropping away
/// block padding
pub(crate) fn inverse_tile(
    values: &[u32], width: usize, height: usize, mask: u32, quality: u8
) -> Vec<u16> {
    debug_assert_eq!(values.len(), coefficient_count(width, height));

    let basis = dct_basis();
    let center = ((mask + 1) / 2) as f32;
    let blocks_x = width.div_ceil(BLOCK_SIZE);
    let mut samples = vec![0_u16; width * height];

    for (block_index, chunk) in values.chunks_exact(BLOCK_AREA).enumerate() {
        let bx = block_index % blocks_x;
        let by = block_index / blocks_x;

        let mut coeffs = [0.0_f32; BLOCK_AREA];
        for (position, value) in chunk.iter().enumerate() {
            let step = quant_step(quality, position, mask);
            coeffs[SCAN_ORDER[position]] = zigzag_decode(*value) as f32 * step;
        }
        let block = inverse_block(&coeffs, &basis);

        for y in 0..BLOCK_SIZE {
            let sy = by * BLOCK_SIZE + y;
            if sy >= height {
                break;
            }
            for x in 0..BLOCK_SIZE {
                let sx = bx * BLOCK_SIZE + x;
                if sx >= width {
                    continue;
                }
                let restored = (block[y * BLOCK_SIZE + x] + center).round();
                samples[sy * width + sx] = restored.clamp(0.0, mask as f32) as u16;
            }
        }
    }
    samples
}
