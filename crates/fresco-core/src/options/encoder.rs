/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Global encoder options

use core::fmt::{Debug, Display, Formatter};

use crate::bit_depth::BitDepth;
use crate::colorspace::ColorSpace;
use crate::mode::CompressionMode;
use crate::status::Status;

/// Images wider or taller than this are rejected outright
pub const MAX_DIMENSIONS: usize = 1 << 30;

/// Smallest and largest accepted tile edge, both inclusive.
///
/// Tile edges must also be a multiple of [`TILE_SIZE_ALIGN`] so that
/// lossy block processing and chroma subsampling never straddle a
/// tile boundary
pub const TILE_SIZE_RANGE: (u32, u32) = (16, 4096);
pub const TILE_SIZE_ALIGN: u32 = 8;

/// A configuration value rejected at validation time
///
/// Validation runs when an encoder is constructed, before any pixel
/// work, so an invalid configuration never creates partial state
pub enum OptionsError {
    /// Quality outside `1..=100`
    QualityOutOfRange(u8),
    /// Effort outside `1..=10`
    EffortOutOfRange(u8),
    /// Tile size outside the documented range or not a multiple of 8
    BadTileSize(u32),
    /// Width or height is zero
    ZeroDimension(&'static str),
    /// Width or height above [`MAX_DIMENSIONS`]
    TooLargeDimensions(usize)
}

impl OptionsError {
    /// The stable status code this error collapses to
    pub const fn status(&self) -> Status {
        // every mis-configuration is the caller's fault
        Status::InvalidParameter
    }
}

impl Debug for OptionsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            OptionsError::QualityOutOfRange(quality) => {
                writeln!(f, "Quality {quality} outside the accepted range 1..=100")
            }
            OptionsError::EffortOutOfRange(effort) => {
                writeln!(f, "Effort {effort} outside the accepted range 1..=10")
            }
            OptionsError::BadTileSize(size) => {
                writeln!(
                    f,
                    "Tile size {size} not accepted, must be a multiple of {TILE_SIZE_ALIGN} between {} and {}",
                    TILE_SIZE_RANGE.0, TILE_SIZE_RANGE.1
                )
            }
            OptionsError::ZeroDimension(name) => {
                writeln!(f, "The {name} is zero")
            }
            OptionsError::TooLargeDimensions(value) => {
                writeln!(
                    f,
                    "Too large dimensions {value}, greater than supported dimensions {MAX_DIMENSIONS}"
                )
            }
        }
    }
}

impl Display for OptionsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for OptionsError {}

/// Encoder options
///
/// The image geometry lives here next to the compression knobs since
/// the engine consumes bare sample buffers with no self-describing
/// framing.
#[derive(Debug, Copy, Clone)]
pub struct EncoderOptions {
    width:      usize,
    height:     usize,
    colorspace: ColorSpace,
    depth:      BitDepth,
    mode:       CompressionMode,
    /// Lossy quality, 1..=100. Monotonic with output fidelity
    quality:    u8,
    /// Encode effort, 1..=10. Monotonic with encode time and,
    /// non-strictly, with compression ratio
    effort:     u8,
    /// Worker threads, `0` resolves to detected hardware concurrency
    /// once at encode start
    threads:    u32,
    /// Tile edge length in pixels
    tile_size:  u32,
    animation:  bool,
    mesh:       bool,
    vector:     bool
}

impl EncoderOptions {
    /// Create encoder options for an image of the given geometry,
    /// all knobs at their defaults
    pub const fn new(
        width: usize, height: usize, colorspace: ColorSpace, depth: BitDepth
    ) -> EncoderOptions {
        EncoderOptions {
            width,
            height,
            colorspace,
            depth,
            mode: CompressionMode::Lossy,
            quality: 85,
            effort: 5,
            threads: 0,
            tile_size: 256,
            animation: false,
            mesh: false,
            vector: false
        }
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub const fn colorspace(&self) -> ColorSpace {
        self.colorspace
    }

    pub const fn depth(&self) -> BitDepth {
        self.depth
    }

    pub const fn mode(&self) -> CompressionMode {
        self.mode
    }

    pub const fn quality(&self) -> u8 {
        self.quality
    }

    pub const fn effort(&self) -> u8 {
        self.effort
    }

    pub const fn num_threads(&self) -> u32 {
        self.threads
    }

    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub const fn animation(&self) -> bool {
        self.animation
    }

    pub const fn mesh(&self) -> bool {
        self.mesh
    }

    pub const fn vector(&self) -> bool {
        self.vector
    }

    pub fn set_mode(mut self, mode: CompressionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the lossy quality knob.
    ///
    /// Ignored when mode is lossless. Values outside `1..=100` are
    /// rejected by [`validate`](Self::validate), not clamped
    pub fn set_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set the effort knob, trading encode time for compression ratio.
    ///
    /// Never affects lossless correctness, only ratio and speed
    pub fn set_effort(mut self, effort: u8) -> Self {
        self.effort = effort;
        self
    }

    /// Set the maximum number of worker threads for encoding.
    ///
    /// `0` means detect hardware concurrency when encoding starts,
    /// `1` forces single threaded execution
    pub fn set_num_threads(mut self, threads: u32) -> Self {
        self.threads = threads;
        self
    }

    pub fn set_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Allow additional animation frames to be attached to the encoder
    pub fn set_animation(mut self, yes: bool) -> Self {
        self.animation = yes;
        self
    }

    /// Allow an opaque 3D mesh chunk to be attached to the container
    pub fn set_mesh(mut self, yes: bool) -> Self {
        self.mesh = yes;
        self
    }

    /// Allow an opaque vector graphics chunk to be attached to the container
    pub fn set_vector(mut self, yes: bool) -> Self {
        self.vector = yes;
        self
    }

    /// Check every knob against its documented range.
    ///
    /// Runs once at encoder construction so failures happen before
    /// any work starts
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.width == 0 {
            return Err(OptionsError::ZeroDimension("width"));
        }
        if self.height == 0 {
            return Err(OptionsError::ZeroDimension("height"));
        }
        if self.width > MAX_DIMENSIONS {
            return Err(OptionsError::TooLargeDimensions(self.width));
        }
        if self.height > MAX_DIMENSIONS {
            return Err(OptionsError::TooLargeDimensions(self.height));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(OptionsError::QualityOutOfRange(self.quality));
        }
        if !(1..=10).contains(&self.effort) {
            return Err(OptionsError::EffortOutOfRange(self.effort));
        }
        let (min_tile, max_tile) = TILE_SIZE_RANGE;
        if self.tile_size < min_tile
            || self.tile_size > max_tile
            || self.tile_size % TILE_SIZE_ALIGN != 0
        {
            return Err(OptionsError::BadTileSize(self.tile_size));
        }
        Ok(())
    }

    /// Dimensions of a single plane after chroma subsampling,
    /// rounded up
    pub const fn plane_dimensions(&self, channel: usize) -> (usize, usize) {
        let (sx, sy) = self.colorspace.subsampling(channel);
        (self.width.div_ceil(sx), self.height.div_ceil(sy))
    }

    /// The exact byte length a caller buffer for one frame must have.
    ///
    /// Interleaved colorspaces count `width * height * channels`
    /// samples, planar ones sum their per-plane areas
    pub fn buffer_size(&self) -> usize {
        let mut samples = 0;
        for channel in 0..self.colorspace.num_components() {
            let (w, h) = self.plane_dimensions(channel);
            samples += w * h;
        }
        samples * self.depth.size_of()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let options = EncoderOptions::new(512, 512, ColorSpace::RGB, BitDepth::Eight);
        assert!(options.validate().is_ok());
        assert_eq!(options.quality(), 85);
        assert_eq!(options.effort(), 5);
        assert_eq!(options.tile_size(), 256);
    }

    #[test]
    fn bad_quality_fails_at_configuration_time() {
        let options =
            EncoderOptions::new(16, 16, ColorSpace::RGB, BitDepth::Eight).set_quality(150);
        assert!(matches!(
            options.validate(),
            Err(OptionsError::QualityOutOfRange(150))
        ));
        assert_eq!(
            options.validate().unwrap_err().status(),
            Status::InvalidParameter
        );

        let options = options.set_quality(0);
        assert!(options.validate().is_err());
    }

    #[test]
    fn bad_effort_and_tile_size_fail() {
        let base = EncoderOptions::new(16, 16, ColorSpace::RGB, BitDepth::Eight);
        assert!(base.set_effort(0).validate().is_err());
        assert!(base.set_effort(11).validate().is_err());
        assert!(base.set_tile_size(100).validate().is_err());
        assert!(base.set_tile_size(8).validate().is_err());
        assert!(base.set_tile_size(8192).validate().is_err());
        assert!(base.set_tile_size(64).validate().is_ok());
    }

    #[test]
    fn buffer_size_counts_subsampled_planes() {
        let options = EncoderOptions::new(5, 5, ColorSpace::Yuv420, BitDepth::Eight);
        // 25 luma samples plus two 3x3 chroma planes
        assert_eq!(options.buffer_size(), 25 + 9 + 9);

        let options = EncoderOptions::new(4, 4, ColorSpace::RGBA, BitDepth::Sixteen);
        assert_eq!(options.buffer_size(), 4 * 4 * 4 * 2);
    }
}
