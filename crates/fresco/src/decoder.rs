/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! The FRESCO decoder

use fresco_core::bytestream::BytesReader;
use fresco_core::colorspace::ColorSpace;
use fresco_core::options::DecoderOptions;
use log::trace;

use crate::container::{parse_header, ContainerFlags, ImageHeader, ParsedContainer, TileEntry};
use crate::entropy;
use crate::errors::DecodeErrors;
use crate::extensions::{ChunkKind, DecodedFrame};
use crate::metadata::FrescoMetadata;
use crate::planes::{merge_planes, Plane};
use crate::scheduler::{self, CancelToken, PoolError};
use crate::tile::TileRect;
use crate::transform::dct;
use crate::transform::predictor::{self, Predictor};
use crate::utils::adler32;

/// A FRESCO container decoder
///
/// The decoder is initialized by calling [`new`](FrescoDecoder::new)
/// and either of [`decode_headers`](FrescoDecoder::decode_headers) to
/// parse headers or [`decode`](FrescoDecoder::decode) to return raw
/// samples.
///
/// Width, height and other details of the compressed image are
/// accessible after decoding headers.
///
/// # Example
/// ```no_run
/// use fresco::FrescoDecoder;
///
/// let data = std::fs::read("image.frsc").unwrap();
/// let mut decoder = FrescoDecoder::new(&data);
/// let pixels = decoder.decode().unwrap();
/// ```
pub struct FrescoDecoder<'a> {
    data:    &'a [u8],
    options: DecoderOptions,
    parsed:  Option<ParsedContainer>,
    cancel:  CancelToken
}

impl<'a> FrescoDecoder<'a> {
    /// Create a new decoder with the default options
    pub fn new(data: &'a [u8]) -> FrescoDecoder<'a> {
        FrescoDecoder::new_with_options(data, DecoderOptions::default())
    }

    /// Create a new decoder that obeys specified restrictions.
    ///
    /// E.g. can be used to set width and height limits to prevent
    /// out of memory attacks from hostile headers
    pub fn new_with_options(data: &'a [u8], options: DecoderOptions) -> FrescoDecoder<'a> {
        FrescoDecoder {
            data,
            options,
            parsed: None,
            cancel: CancelToken::new()
        }
    }

    /// Parse the header and metadata block, storing the directory
    /// in the decoder instance.
    ///
    /// Succeeds on truncated payloads as long as the header region
    /// is intact, so metadata queries work on partial downloads
    pub fn decode_headers(&mut self) -> Result<(), DecodeErrors> {
        if self.parsed.is_none() {
            self.parsed = Some(parse_header(self.data, &self.options)?);
        }
        Ok(())
    }

    /// Image dimensions, present after headers have been decoded
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.parsed
            .as_ref()
            .map(|p| (p.header.width, p.header.height))
    }

    /// Image colorspace, present after headers have been decoded
    pub fn colorspace(&self) -> Option<ColorSpace> {
        self.parsed.as_ref().map(|p| p.header.colorspace)
    }

    /// Container metadata, present after headers have been decoded
    pub fn metadata(&self) -> Option<FrescoMetadata> {
        self.parsed.as_ref().map(crate::metadata::from_parsed)
    }

    /// A handle that cancels this decode from another thread
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Borrow the opaque 3D mesh chunk if the container carries one.
    ///
    /// The byte range is validated against the data actually present
    pub fn mesh_chunk(&self) -> Result<Option<&'a [u8]>, DecodeErrors> {
        self.chunk(ChunkKind::Mesh)
    }

    /// Borrow the opaque vector graphics chunk if present
    pub fn vector_chunk(&self) -> Result<Option<&'a [u8]>, DecodeErrors> {
        self.chunk(ChunkKind::Vector)
    }

    fn chunk(&self, kind: ChunkKind) -> Result<Option<&'a [u8]>, DecodeErrors> {
        match self.parsed.as_ref().and_then(|p| p.chunk(kind)) {
            Some(entry) => Ok(Some(entry.slice(self.data)?)),
            None => Ok(None)
        }
    }

    /// Decode the primary frame into its caller facing byte layout.
    ///
    /// A single corrupted tile fails the whole call with a
    /// `CorruptedData` mapped error and no pixel buffer is returned,
    /// use the progressive decoder when partial results are wanted
    pub fn decode(&mut self) -> Result<Vec<u8>, DecodeErrors> {
        self.decode_headers()?;
        self.check_full_length()?;

        let parsed = self.parsed.as_ref().unwrap();
        let planes = decode_frame_planes(self.data, parsed, 0, &self.options, &self.cancel)?;
        Ok(merge_planes(
            &planes,
            parsed.header.colorspace,
            parsed.header.depth
        ))
    }

    /// Decode every frame along with its display duration
    pub fn decode_frames(&mut self) -> Result<Vec<DecodedFrame>, DecodeErrors> {
        self.decode_headers()?;
        self.check_full_length()?;

        let parsed = self.parsed.as_ref().unwrap();
        let mut frames = Vec::with_capacity(parsed.header.frame_count as usize);

        for frame in 0..parsed.header.frame_count as usize {
            let planes = decode_frame_planes(self.data, parsed, frame, &self.options, &self.cancel)?;
            frames.push(DecodedFrame {
                pixels:      merge_planes(&planes, parsed.header.colorspace, parsed.header.depth),
                duration_ms: parsed.durations.get(frame).copied().unwrap_or(0)
            });
        }
        Ok(frames)
    }

    /// A full decode needs the whole container, not just the header
    /// region
    fn check_full_length(&self) -> Result<(), DecodeErrors> {
        let declared = self.parsed.as_ref().unwrap().header.compressed_size;
        let actual = self.data.len() as u64;

        if actual < declared {
            return Err(DecodeErrors::TruncatedInput(declared as usize, self.data.len()));
        }
        if actual > declared {
            return Err(DecodeErrors::Corrupted("trailing bytes after container end"));
        }
        Ok(())
    }
}

/// Decode all tiles of one frame into freshly allocated planes
fn decode_frame_planes(
    data: &[u8], parsed: &ParsedContainer, frame: usize, options: &DecoderOptions,
    cancel: &CancelToken
) -> Result<Vec<Plane>, DecodeErrors> {
    let header = &parsed.header;
    let grid = header.grid();
    let tiles_per_frame = parsed.tiles_per_frame();
    let threads = scheduler::resolve_threads(options.num_threads());

    trace!(
        "FRESCO decode frame {frame}, {}x{} tiles, {} threads",
        grid.tiles_x(),
        grid.tiles_y(),
        threads
    );

    let base = frame * tiles_per_frame;
    let results = scheduler::run_tiles(tiles_per_frame, threads, cancel, |index| {
        let entry = &parsed.tiles[base + index];
        let rect = grid.tile(index);
        decode_tile(data, entry, rect, header, base + index)
    });

    let tiles = match results {
        Ok(tiles) => tiles,
        Err(PoolError::Cancelled) => return Err(DecodeErrors::Cancelled),
        Err(PoolError::Task(error)) => return Err(error)
    };

    let mut planes: Vec<Plane> = (0..header.colorspace.num_components())
        .map(|channel| {
            let (w, h) = crate::planes::plane_dimensions(
                header.width,
                header.height,
                header.colorspace,
                channel
            );
            Plane::new(w, h)
        })
        .collect();

    for (index, tile) in tiles.into_iter().enumerate() {
        let rect = grid.tile(index);
        write_tile_planes(&mut planes, &rect, header.colorspace, tile);
    }
    Ok(planes)
}

/// Scatter one decoded tile into the frame planes, regions are
/// disjoint by construction
pub(crate) fn write_tile_planes(
    planes: &mut [Plane], rect: &TileRect, colorspace: ColorSpace, tile: Vec<Vec<u16>>
) {
    for (channel, samples) in tile.into_iter().enumerate() {
        let (px0, py0, pw, ph) = rect.plane_region(colorspace, channel);
        planes[channel].write_region(px0, py0, pw, ph, &samples);
    }
}

/// Validate and decode a single tile payload into per channel
/// region samples
pub(crate) fn decode_tile(
    data: &[u8], entry: &TileEntry, rect: TileRect, header: &ImageHeader, directory_index: usize
) -> Result<Vec<Vec<u16>>, DecodeErrors> {
    let start = entry.offset as usize;
    let end = start + entry.length as usize;
    let payload = data
        .get(start..end)
        .ok_or(DecodeErrors::TruncatedInput(end, data.len()))?;

    if adler32(payload) != entry.checksum {
        return Err(DecodeErrors::CorruptedTile(
            directory_index,
            "payload checksum mismatch"
        ));
    }

    let lossless = header.flags.contains(ContainerFlags::LOSSLESS);
    let mask = u32::from(header.depth.max_value());
    let mut reader = BytesReader::new(payload);
    let mut out = Vec::with_capacity(header.colorspace.num_components());

    for channel in 0..header.colorspace.num_components() {
        let (_, _, pw, ph) = rect.plane_region(header.colorspace, channel);
        let mode = reader
            .get_u8()
            .map_err(|_| DecodeErrors::CorruptedTile(directory_index, "payload ended early"))?;

        let expected = if lossless {
            pw * ph
        } else {
            dct::coefficient_count(pw, ph)
        };
        let remaining = &payload[reader.position()..];
        let (values, consumed) = entropy::decompress(remaining, expected)
            .map_err(|_| DecodeErrors::CorruptedTile(directory_index, "entropy stream damaged"))?;
        reader.skip(consumed)?;

        let samples = if lossless {
            let mode = Predictor::from_u8(mode).ok_or(DecodeErrors::CorruptedTile(
                directory_index,
                "unknown predictor mode"
            ))?;
            predictor::inverse(&values, pw, ph, mask, mode)
        } else {
            if mode != 0 {
                return Err(DecodeErrors::CorruptedTile(
                    directory_index,
                    "unknown transform mode"
                ));
            }
            dct::inverse_tile(&values, pw, ph, mask, header.quality)
        };
        out.push(samples);
    }

    if reader.remaining() != 0 {
        return Err(DecodeErrors::CorruptedTile(
            directory_index,
            "trailing bytes in tile payload"
        ));
    }
    Ok(out)
}
