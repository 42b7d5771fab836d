/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Metadata extraction without touching tile payloads
//!
//! The fast path for size/colorspace queries: only the header region
//! is parsed, runtime and allocations are bounded by the header size
//! and completely independent of pixel count. Works on partially
//! downloaded containers as long as the header region is intact.

use fresco_core::bit_depth::BitDepth;
use fresco_core::colorspace::ColorSpace;
use fresco_core::mode::CompressionMode;
use fresco_core::options::DecoderOptions;

use crate::container::{self, ContainerFlags};
use crate::errors::DecodeErrors;

/// Properties of a container answerable from its header alone
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FrescoMetadata {
    /// Image width in pixels
    pub width:           usize,
    /// Image height in pixels
    pub height:          usize,
    /// Number of color channels
    pub channels:        u8,
    /// Bits per channel
    pub bit_depth:       BitDepth,
    /// Color space
    pub colorspace:      ColorSpace,
    /// Compression mode the samples were stored with
    pub mode:            CompressionMode,
    /// Number of frames, greater than one for animations
    pub frame_count:     u32,
    /// Frame rate for animations, zero for stills
    pub frame_rate:      f32,
    /// Total container size in bytes as declared by the header
    pub file_size:       u64,
    /// Compressed payload bytes, the container minus its header region
    pub compressed_size: u64,
    /// Raw sample bytes across all frames
    pub original_size:   u64,
    /// Tile edge length used for encoding
    pub tile_size:       u32,
    /// Whether a 3D mesh chunk is present
    pub has_mesh:        bool,
    /// Whether a vector graphics chunk is present
    pub has_vector:      bool
}

/// Extract metadata from a serialized container.
///
/// Never allocates proportional to image size and never reads tile
/// payload bytes, corrupting every payload byte does not affect this
/// call. Fails with [`DecodeErrors::WrongMagicBytes`] or
/// [`DecodeErrors::Corrupted`] on damaged headers and
/// [`DecodeErrors::UnsupportedVersion`] on containers from newer
/// engines
pub fn extract_metadata(data: &[u8]) -> Result<FrescoMetadata, DecodeErrors> {
    // metadata queries have no allocation tied to dimensions, so no
    // dimension limit applies here
    let options = DecoderOptions::default()
        .set_max_width(usize::MAX)
        .set_max_height(usize::MAX);
    let parsed = container::parse_header(data, &options)?;
    Ok(from_parsed(&parsed))
}

/// Map an already parsed header region onto the metadata struct
pub(crate) fn from_parsed(parsed: &crate::container::ParsedContainer) -> FrescoMetadata {
    let header = &parsed.header;

    let mode = if header.flags.contains(ContainerFlags::LOSSLESS) {
        CompressionMode::Lossless
    } else {
        CompressionMode::Lossy
    };

    FrescoMetadata {
        width:           header.width,
        height:          header.height,
        channels:        header.colorspace.num_components() as u8,
        bit_depth:       header.depth,
        colorspace:      header.colorspace,
        mode,
        frame_count:     header.frame_count,
        frame_rate:      header.frame_rate,
        file_size:       header.compressed_size,
        compressed_size: header.compressed_size - parsed.header_region as u64,
        original_size:   header.original_size,
        tile_size:       header.tile_size,
        has_mesh:        header.flags.contains(ContainerFlags::MESH),
        has_vector:      header.flags.contains(ContainerFlags::VECTOR)
    }
}
