/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Compression mode selection

/// How image samples are compressed
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CompressionMode {
    /// Transform and quantize samples, trading fidelity
    /// for size under the `quality` knob
    Lossy,
    /// Reversible prediction and residual coding,
    /// `decode(encode(x)) == x` bit exact
    Lossless
}

impl Default for CompressionMode {
    fn default() -> Self {
        Self::Lossy
    }
}

impl CompressionMode {
    pub const fn is_lossless(self) -> bool {
        matches!(self, Self::Lossless)
    }
}
