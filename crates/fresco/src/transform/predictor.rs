/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Reversible integer predictors for the lossless path
//!
//! The predictor family is the PNG filter set, applied per tile plane
//! with tile local neighbors only. Pixels outside the tile predict as
//! zero, which keeps every tile decodable on its own and is what
//! allows unrestricted tile parallelism.
//!
//! Residuals are differences wrapped to the sample width, mapped
//! small-magnitude-first for the entropy coder. Wrapping makes the
//! inverse exact for any sample depth.

use crate::utils::{zigzag_decode, zigzag_encode};

/// Available prediction modes.
///
/// The discriminant is the byte stored in the tile payload
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Predictor {
    /// Predict zero, residuals are the raw samples
    Zero = 0,
    /// Predict the sample to the left
    Left = 1,
    /// Predict the sample above
    Top = 2,
    /// Predict the rounded down mean of left and top
    Average = 3,
    /// The Paeth predictor from PNG
    Paeth = 4
}

impl Predictor {
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    pub const fn from_u8(value: u8) -> Option<Predictor> {
        match value {
            0 => Some(Predictor::Zero),
            1 => Some(Predictor::Left),
            2 => Some(Predictor::Top),
            3 => Some(Predictor::Average),
            4 => Some(Predictor::Paeth),
            _ => None
        }
    }

    /// The candidate set tried per plane for a given effort.
    ///
    /// Higher effort widens the search, it never changes what any
    /// single predictor produces
    pub fn candidates(effort: u8) -> &'static [Predictor] {
        match effort {
            1..=2 => &[Predictor::Paeth],
            3..=4 => &[Predictor::Paeth, Predictor::Left, Predictor::Top],
            _ => &[
                Predictor::Paeth,
                Predictor::Left,
                Predictor::Top,
                Predictor::Average,
                Predictor::Zero
            ]
        }
    }
}

#[inline]
fn paeth(left: i32, top: i32, top_left: i32) -> i32 {
    let initial = left + top - top_left;
    let distance_left = (initial - left).abs();
    let distance_top = (initial - top).abs();
    let distance_top_left = (initial - top_left).abs();

    if distance_left <= distance_top && distance_left <= distance_top_left {
        left
    } else if distance_top <= distance_top_left {
        top
    } else {
        top_left
    }
}

#[inline]
fn predict(
    samples: &[u16], width: usize, x: usize, y: usize, index: usize, predictor: Predictor
) -> i32 {
    let left = if x > 0 { i32::from(samples[index - 1]) } else { 0 };
    let top = if y > 0 { i32::from(samples[index - width]) } else { 0 };

    match predictor {
        Predictor::Zero => 0,
        Predictor::Left => left,
        Predictor::Top => top,
        Predictor::Average => (left + top) >> 1,
        Predictor::Paeth => {
            let top_left = if x > 0 && y > 0 {
                i32::from(samples[index - width - 1])
            } else {
                0
            };
            paeth(left, top, top_left)
        }
    }
}

/// Produce the residual plane for one tile plane.
///
/// `mask` is the sample range mask, `0xff` for eight bit samples and
/// `0xffff` for sixteen
pub(crate) fn forward(
    samples: &[u16], width: usize, height: usize, mask: u32, predictor: Predictor
) -> Vec<u32> {
    debug_assert_eq!(samples.len(), width * height);

    let half = (mask >> 1) as i32;
    let range = mask as i32 + 1;
    let mut residuals = Vec::with_capacity(samples.len());

    for y in 0..height {
        for x in 0..width {
            let index = y * width + x;
            let prediction = predict(samples, width, x, y, index, predictor);
            let wrapped = (i32::from(samples[index]) - prediction) & mask as i32;
            // fold the wrapped difference around zero so small moves
            // in either direction stay small
            let signed = if wrapped > half { wrapped - range } else { wrapped };
            residuals.push(zigzag_encode(signed));
        }
    }
    residuals
}

/// Exact inverse of [`forward`]
pub(crate) fn inverse(
    residuals: &[u32], width: usize, height: usize, mask: u32, predictor: Predictor
) -> Vec<u16> {
    debug_assert_eq!(residuals.len(), width * height);

    let mut samples = vec![0_u16; residuals.len()];

    for y in 0..height {
        for x in 0..width {
            let index = y * width + x;
            let prediction = predict(&samples, width, x, y, index, predictor);
            let difference = zigzag_decode(residuals[index]);
            samples[index] = ((prediction + difference) & mask as i32) as u16;
        }
    }
    samples
}

/// Cheap proxy for the compressed size of a residual plane, used by
/// the low effort predictor search
pub(crate) fn residual_cost(residuals: &[u32]) -> u64 {
    residuals
        .iter()
        .map(|r| u64::from(32 - r.leading_zeros()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> Vec<u16> {
        let mut out = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                out.push(((x * 3 + y * 7) % 256) as u16);
            }
        }
        out
    }

    #[test]
    fn every_predictor_inverts_exactly() {
        let (w, h) = (19, 13);
        let samples = gradient(w, h);

        for predictor in [
            Predictor::Zero,
            Predictor::Left,
            Predictor::Top,
            Predictor::Average,
            Predictor::Paeth
        ] {
            let residuals = forward(&samples, w, h, 0xff, predictor);
            let restored = inverse(&residuals, w, h, 0xff, predictor);
            assert_eq!(restored, samples, "{predictor:?}");
        }
    }

    #[test]
    fn sixteen_bit_extremes_invert() {
        let samples: Vec<u16> = vec![0, u16::MAX, 1, u16::MAX - 1, 32768, 0, 12345, 54321, 9];
        let residuals = forward(&samples, 3, 3, 0xffff, Predictor::Paeth);
        let restored = inverse(&residuals, 3, 3, 0xffff, Predictor::Paeth);
        assert_eq!(restored, samples);
    }

    #[test]
    fn smooth_data_gives_small_residuals() {
        let (w, h) = (32, 32);
        let samples = gradient(w, h);
        let paeth = forward(&samples, w, h, 0xff, Predictor::Paeth);
        let zero = forward(&samples, w, h, 0xff, Predictor::Zero);
        assert!(residual_cost(&paeth) < residual_cost(&zero));
    }

    #[test]
    fn mode_byte_round_trips() {
        for predictor in Predictor::candidates(10) {
            assert_eq!(Predictor::from_u8(predictor.to_u8()), Some(*predictor));
        }
        assert_eq!(Predictor::from_u8(5), None);
    }
}
