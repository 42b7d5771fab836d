/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! The FRESCO bitstream container
//!
//! Layout, all integers little endian:
//!
//! ```text
//! fixed header, 56 bytes
//!   magic `FRSC`, version, flags, colorspace, bit depth, channels,
//!   quality, effort, width, height, tile size, frame count,
//!   frame rate, original size, compressed size, tile count,
//!   chunk count
//! metadata block
//!   frame durations   (only when the animation flag is set)
//!   tile directory    (row major grid order, frame major)
//!   chunk table
//!   adler-32 over everything above
//! payloads
//!   tile payloads back to back, then extension chunks
//! ```
//!
//! The header region is self contained: parsing it never touches
//! payload bytes, which is what makes metadata queries cheap and
//! keeps them working on truncated downloads. Unknown future versions
//! are rejected outright instead of best-effort parsed.

use bitflags::bitflags;
use fresco_core::bit_depth::BitDepth;
use fresco_core::bytestream::{BytesReader, BytesWriter};
use fresco_core::colorspace::ColorSpace;
use fresco_core::options::DecoderOptions;

use crate::errors::DecodeErrors;
use crate::extensions::{ChunkEntry, ChunkKind};
use crate::tile::TileGrid;
use crate::utils::adler32;

pub(crate) const MAGIC: [u8; 4] = *b"FRSC";
pub(crate) const VERSION: u16 = 1;
pub(crate) const FIXED_HEADER_SIZE: usize = 56;
pub(crate) const TILE_ENTRY_SIZE: usize = 36;
pub(crate) const CHUNK_ENTRY_SIZE: usize = 16;
const CHECKSUM_SIZE: usize = 4;

bitflags! {
    /// Feature bits stored in the container header
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub(crate) struct ContainerFlags: u8 {
        const LOSSLESS  = 0b0001;
        const ANIMATION = 0b0010;
        const MESH      = 0b0100;
        const VECTOR    = 0b1000;
    }
}

/// Everything the fixed header carries
#[derive(Copy, Clone, Debug)]
pub(crate) struct ImageHeader {
    pub flags:           ContainerFlags,
    pub colorspace:      ColorSpace,
    pub depth:           BitDepth,
    pub quality:         u8,
    pub effort:          u8,
    pub width:           usize,
    pub height:          usize,
    pub tile_size:       u32,
    pub frame_count:     u32,
    pub frame_rate:      f32,
    pub original_size:   u64,
    pub compressed_size: u64
}

impl ImageHeader {
    pub fn grid(&self) -> TileGrid {
        TileGrid::new(self.width, self.height, self.tile_size as usize)
    }
}

/// One tile directory entry
#[derive(Copy, Clone, Debug)]
pub(crate) struct TileEntry {
    pub frame:    u32,
    pub grid_x:   u32,
    pub grid_y:   u32,
    /// Payload byte range relative to the container start
    pub offset:   u64,
    pub length:   u32,
    /// adler-32 of the payload bytes
    pub checksum: u32,
    /// Per channel mean sample, the deterministic placeholder used
    /// by progressive snapshots. Unused channels stay zero
    pub means:    [u16; 4]
}

/// The parsed header region of a container
pub(crate) struct ParsedContainer {
    pub header:        ImageHeader,
    /// Per frame display durations in milliseconds, empty for stills
    pub durations:     Vec<u32>,
    pub tiles:         Vec<TileEntry>,
    pub chunks:        Vec<ChunkEntry>,
    /// Bytes occupied by the header plus metadata block
    pub header_region: usize
}

impl ParsedContainer {
    pub fn tiles_per_frame(&self) -> usize {
        self.tiles.len() / self.header.frame_count as usize
    }

    pub fn chunk(&self, kind: ChunkKind) -> Option<&ChunkEntry> {
        self.chunks.iter().find(|c| c.kind == kind)
    }
}

/// Size of the header region for the given table counts
pub(crate) fn header_region_size(
    animated: bool, frame_count: u32, tile_count: usize, chunk_count: usize
) -> usize {
    let durations = if animated { frame_count as usize * 4 } else { 0 };
    FIXED_HEADER_SIZE
        + durations
        + tile_count * TILE_ENTRY_SIZE
        + chunk_count * CHUNK_ENTRY_SIZE
        + CHECKSUM_SIZE
}

/// Serialize the header region.
///
/// `header.compressed_size` and `header.original_size` must already
/// account for every payload byte that will follow
pub(crate) fn serialize_header_region(
    header: &ImageHeader, durations: &[u32], tiles: &[TileEntry], chunks: &[ChunkEntry]
) -> Vec<u8> {
    let animated = header.flags.contains(ContainerFlags::ANIMATION);
    let region = header_region_size(animated, header.frame_count, tiles.len(), chunks.len());
    let mut writer = BytesWriter::with_capacity(region);

    writer.write_bytes(&MAGIC);
    writer.write_u16_le(VERSION);
    writer.write_u8(header.flags.bits());
    writer.write_u8(header.colorspace.to_u8());
    writer.write_u8(header.depth.to_u8());
    writer.write_u8(header.colorspace.num_components() as u8);
    writer.write_u8(header.quality);
    writer.write_u8(header.effort);
    writer.write_u32_le(header.width as u32);
    writer.write_u32_le(header.height as u32);
    writer.write_u32_le(header.tile_size);
    writer.write_u32_le(header.frame_count);
    writer.write_f32_le(header.frame_rate);
    writer.write_u64_le(header.original_size);
    writer.write_u64_le(header.compressed_size);
    writer.write_u32_le(tiles.len() as u32);
    writer.write_u32_le(chunks.len() as u32);

    if animated {
        for duration in durations {
            writer.write_u32_le(*duration);
        }
    }
    for tile in tiles {
        writer.write_u32_le(tile.frame);
        writer.write_u32_le(tile.grid_x);
        writer.write_u32_le(tile.grid_y);
        writer.write_u64_le(tile.offset);
        writer.write_u32_le(tile.length);
        writer.write_u32_le(tile.checksum);
        for mean in tile.means {
            writer.write_u16_le(mean);
        }
    }
    for chunk in chunks {
        writer.write_u8(chunk.kind.to_u8());
        writer.write_bytes(&[0, 0, 0]);
        writer.write_u64_le(chunk.offset);
        writer.write_u32_le(chunk.length);
    }

    let checksum = adler32(writer.as_slice());
    writer.write_u32_le(checksum);

    debug_assert_eq!(writer.position(), region);
    writer.into_inner()
}

/// Parse the header region of a container.
///
/// Succeeds on truncated payloads as long as the header region
/// itself is intact. Byte ranges in the returned directory are
/// validated for order, adjacency and agreement with the declared
/// compressed size, but not against `data.len()`, callers doing a
/// full decode check that separately
pub(crate) fn parse_header(
    data: &[u8], options: &DecoderOptions
) -> Result<ParsedContainer, DecodeErrors> {
    if data.len() < FIXED_HEADER_SIZE {
        return Err(DecodeErrors::TruncatedInput(FIXED_HEADER_SIZE, data.len()));
    }
    let mut reader = BytesReader::new(data);

    if reader.get_fixed::<4>()? != MAGIC {
        return Err(DecodeErrors::WrongMagicBytes);
    }
    let version = reader.get_u16_le()?;
    if version > VERSION {
        return Err(DecodeErrors::UnsupportedVersion(version));
    }
    if version == 0 {
        return Err(DecodeErrors::Corrupted("version zero container"));
    }

    let flags = ContainerFlags::from_bits(reader.get_u8()?)
        .ok_or(DecodeErrors::Corrupted("unknown flag bits set"))?;
    let colorspace = ColorSpace::from_u8(reader.get_u8()?)
        .ok_or(DecodeErrors::Corrupted("unknown colorspace byte"))?;
    let depth = BitDepth::from_u8(reader.get_u8()?)
        .ok_or(DecodeErrors::Corrupted("unknown bit depth byte"))?;
    let channels = reader.get_u8()?;
    if usize::from(channels) != colorspace.num_components() {
        return Err(DecodeErrors::Corrupted(
            "channel count disagrees with colorspace"
        ));
    }

    let quality = reader.get_u8()?;
    let effort = reader.get_u8()?;
    if !(1..=100).contains(&quality) || !(1..=10).contains(&effort) {
        return Err(DecodeErrors::Corrupted("quality or effort out of range"));
    }

    let width = reader.get_u32_le()? as usize;
    let height = reader.get_u32_le()? as usize;
    if width == 0 || height == 0 {
        return Err(DecodeErrors::Corrupted("zero image dimension"));
    }
    if width > options.max_width() {
        return Err(DecodeErrors::LargerThanLimits(width, options.max_width()));
    }
    if height > options.max_height() {
        return Err(DecodeErrors::LargerThanLimits(height, options.max_height()));
    }

    let tile_size = reader.get_u32_le()?;
    if !(16..=4096).contains(&tile_size) || tile_size % 8 != 0 {
        return Err(DecodeErrors::Corrupted("tile size out of range"));
    }

    let frame_count = reader.get_u32_le()?;
    let animated = flags.contains(ContainerFlags::ANIMATION);
    if frame_count == 0 {
        return Err(DecodeErrors::Corrupted("zero frame count"));
    }
    if !animated && frame_count != 1 {
        return Err(DecodeErrors::Corrupted("multiple frames without animation"));
    }

    let frame_rate = reader.get_f32_le()?;
    let original_size = reader.get_u64_le()?;
    let compressed_size = reader.get_u64_le()?;
    let tile_count = reader.get_u32_le()? as usize;
    let chunk_count = reader.get_u32_le()? as usize;

    let header = ImageHeader {
        flags,
        colorspace,
        depth,
        quality,
        effort,
        width,
        height,
        tile_size,
        frame_count,
        frame_rate,
        original_size,
        compressed_size
    };

    let grid = header.grid();
    let expected_tiles = grid.len() as u64 * u64::from(frame_count);
    if tile_count as u64 != expected_tiles {
        return Err(DecodeErrors::Corrupted(
            "tile count disagrees with grid and frame count"
        ));
    }
    if chunk_count > 2 {
        return Err(DecodeErrors::Corrupted("too many extension chunks"));
    }

    let region = header_region_size(animated, frame_count, tile_count, chunk_count);
    if data.len() < region {
        return Err(DecodeErrors::TruncatedInput(region, data.len()));
    }

    let declared = adler32(&data[..region - CHECKSUM_SIZE]);
    let mut tail = BytesReader::new(&data[region - CHECKSUM_SIZE..]);
    if tail.get_u32_le()? != declared {
        return Err(DecodeErrors::Corrupted("header checksum mismatch"));
    }

    let mut durations = Vec::new();
    if animated {
        durations.reserve(frame_count as usize);
        for _ in 0..frame_count {
            durations.push(reader.get_u32_le()?);
        }
    }

    // payloads are laid out back to back right after the header
    // region, the running offset pins every entry in place
    let mut running = region as u64;
    let tiles_per_frame = grid.len();
    let mut tiles = Vec::with_capacity(tile_count);

    for index in 0..tile_count {
        let entry = TileEntry {
            frame:    reader.get_u32_le()?,
            grid_x:   reader.get_u32_le()?,
            grid_y:   reader.get_u32_le()?,
            offset:   reader.get_u64_le()?,
            length:   reader.get_u32_le()?,
            checksum: reader.get_u32_le()?,
            means:    [
                reader.get_u16_le()?,
                reader.get_u16_le()?,
                reader.get_u16_le()?,
                reader.get_u16_le()?
            ]
        };
        let rect = grid.tile(index % tiles_per_frame);
        if entry.frame as usize != index / tiles_per_frame
            || entry.grid_x as usize != rect.grid_x
            || entry.grid_y as usize != rect.grid_y
        {
            return Err(DecodeErrors::Corrupted("tile directory out of order"));
        }
        if entry.offset != running || entry.length == 0 {
            return Err(DecodeErrors::Corrupted("tile directory byte ranges broken"));
        }
        running += u64::from(entry.length);
        tiles.push(entry);
    }

    let mut chunks = Vec::with_capacity(chunk_count);
    for _ in 0..chunk_count {
        let kind = ChunkKind::from_u8(reader.get_u8()?)
            .ok_or(DecodeErrors::Corrupted("unknown chunk kind"))?;
        reader.skip(3)?;
        let entry = ChunkEntry {
            kind,
            offset: reader.get_u64_le()?,
            length: reader.get_u32_le()?
        };
        if chunks.iter().any(|c: &ChunkEntry| c.kind == kind) {
            return Err(DecodeErrors::Corrupted("duplicate chunk kind"));
        }
        if entry.offset != running {
            return Err(DecodeErrors::Corrupted("chunk byte ranges broken"));
        }
        running += u64::from(entry.length);
        chunks.push(entry);
    }

    if compressed_size != running {
        return Err(DecodeErrors::Corrupted(
            "compressed size disagrees with directory"
        ));
    }

    Ok(ParsedContainer {
        header,
        durations,
        tiles,
        chunks,
        header_region: region
    })
}
