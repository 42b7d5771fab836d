/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! The FRESCO encoder

use fresco_core::bytestream::BytesWriter;
use fresco_core::mode::CompressionMode;
use fresco_core::options::EncoderOptions;
use log::trace;

use crate::container::{
    header_region_size, serialize_header_region, ContainerFlags, ImageHeader, TileEntry
};
use crate::entropy;
use crate::errors::EncodeErrors;
use crate::extensions::{ChunkEntry, ChunkKind};
use crate::planes::{split_into_planes, Plane};
use crate::scheduler::{self, CancelToken, PoolError};
use crate::tile::TileRect;
use crate::transform::dct;
use crate::transform::predictor::{self, Predictor};
use crate::utils::adler32;

/// One raster frame waiting to be encoded
struct FrameSource<'a> {
    data:        &'a [u8],
    duration_ms: u32
}

/// Result of encoding a single tile
struct EncodedTile {
    payload: Vec<u8>,
    means:   [u16; 4]
}

/// A FRESCO container encoder
///
/// Borrows raw sample buffers and produces a serialized container.
/// Configuration is validated when the encoder is created, an invalid
/// configuration never reaches the pixel pipeline.
///
/// # Multithreading
/// Tiles are encoded in parallel when the `threads` feature is on,
/// bounded by [`EncoderOptions::set_num_threads`]. The output is byte
/// identical regardless of thread count.
///
/// # Example
/// - Encode a gray image losslessly
///
/// ```
/// use fresco::FrescoEncoder;
/// use fresco_core::bit_depth::BitDepth;
/// use fresco_core::colorspace::ColorSpace;
/// use fresco_core::mode::CompressionMode;
/// use fresco_core::options::EncoderOptions;
///
/// fn main() -> Result<(), fresco::EncodeErrors> {
///     let pixels: [u8; 64 * 64] = std::array::from_fn(|i| (i % 251) as u8);
///     let options = EncoderOptions::new(64, 64, ColorSpace::Gray, BitDepth::Eight)
///         .set_mode(CompressionMode::Lossless);
///
///     let encoder = FrescoEncoder::new(&pixels, options)?;
///     let container = encoder.encode()?;
///     assert!(!container.is_empty());
///     Ok(())
/// }
/// ```
pub struct FrescoEncoder<'a> {
    frames:     Vec<FrameSource<'a>>,
    options:    EncoderOptions,
    frame_rate: f32,
    mesh:       Option<&'a [u8]>,
    vector:     Option<&'a [u8]>,
    cancel:     CancelToken
}

impl<'a> FrescoEncoder<'a> {
    /// Create an encoder for a single frame of raw samples.
    ///
    /// Fails fast with an `InvalidParameter` mapped error when any
    /// option is out of range or the buffer length disagrees with
    /// the configured geometry, before any encoding work happens
    pub fn new(data: &'a [u8], options: EncoderOptions) -> Result<FrescoEncoder<'a>, EncodeErrors> {
        options.validate()?;

        let expected = options.buffer_size();
        if data.len() != expected {
            return Err(EncodeErrors::LengthMismatch(expected, data.len()));
        }
        Ok(FrescoEncoder {
            frames: vec![FrameSource {
                data,
                duration_ms: 0
            }],
            options,
            frame_rate: 0.0,
            mesh: None,
            vector: None,
            cancel: CancelToken::new()
        })
    }

    /// Append an animation frame sharing the geometry of frame zero.
    ///
    /// Requires [`EncoderOptions::set_animation`] to have been enabled
    pub fn add_frame(&mut self, data: &'a [u8], duration_ms: u32) -> Result<(), EncodeErrors> {
        if !self.options.animation() {
            return Err(EncodeErrors::ExtensionDisabled("animation"));
        }
        let expected = self.options.buffer_size();
        if data.len() != expected {
            return Err(EncodeErrors::LengthMismatch(expected, data.len()));
        }
        self.frames.push(FrameSource { data, duration_ms });
        Ok(())
    }

    /// Change the display duration of an already attached frame
    pub fn set_frame_duration(&mut self, index: usize, duration_ms: u32) -> Result<(), EncodeErrors> {
        match self.frames.get_mut(index) {
            Some(frame) => {
                frame.duration_ms = duration_ms;
                Ok(())
            }
            None => Err(EncodeErrors::NoSuchFrame(index))
        }
    }

    /// Set the nominal frame rate recorded in the container metadata
    pub fn set_frame_rate(&mut self, frame_rate: f32) {
        self.frame_rate = frame_rate;
    }

    /// Attach an opaque 3D mesh chunk.
    ///
    /// The chunk is framed in the container and validated only for
    /// length consistency, its internal structure is not this
    /// crate's business. Requires [`EncoderOptions::set_mesh`]
    pub fn set_mesh_chunk(&mut self, data: &'a [u8]) -> Result<(), EncodeErrors> {
        if !self.options.mesh() {
            return Err(EncodeErrors::ExtensionDisabled("mesh"));
        }
        self.mesh = Some(data);
        Ok(())
    }

    /// Attach an opaque vector graphics chunk.
    ///
    /// Requires [`EncoderOptions::set_vector`]
    pub fn set_vector_chunk(&mut self, data: &'a [u8]) -> Result<(), EncodeErrors> {
        if !self.options.vector() {
            return Err(EncodeErrors::ExtensionDisabled("vector"));
        }
        self.vector = Some(data);
        Ok(())
    }

    /// A handle that cancels this encode from another thread.
    ///
    /// In flight tiles run to completion, nothing new is dispatched
    /// afterwards and [`encode`](Self::encode) reports a failure
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Encode every attached frame and chunk into a container.
    ///
    /// Encoding the same input with the same options twice produces
    /// byte identical output, whatever the thread count
    pub fn encode(&self) -> Result<Vec<u8>, EncodeErrors> {
        let options = &self.options;
        let threads = scheduler::resolve_threads(options.num_threads());
        let grid = crate::tile::TileGrid::new(
            options.width(),
            options.height(),
            options.tile_size() as usize
        );
        let tiles_per_frame = grid.len();

        trace!("FRESCO encode");
        trace!("Width: {}", options.width());
        trace!("Height: {}", options.height());
        trace!("Colorspace: {:?}", options.colorspace());
        trace!("Depth: {:?}", options.depth());
        trace!("Mode: {:?}", options.mode());
        trace!("Tile grid: {}x{}", grid.tiles_x(), grid.tiles_y());
        trace!("Frames: {}", self.frames.len());
        trace!("Resolved threads: {}", threads);

        let frame_planes: Vec<Vec<Plane>> = self
            .frames
            .iter()
            .map(|frame| {
                split_into_planes(
                    frame.data,
                    options.width(),
                    options.height(),
                    options.colorspace(),
                    options.depth()
                )
            })
            .collect();

        let job_count = self.frames.len() * tiles_per_frame;
        let results = scheduler::run_tiles(job_count, threads, &self.cancel, |index| {
            let rect = grid.tile(index % tiles_per_frame);
            Ok::<_, EncodeErrors>(encode_tile(&frame_planes[index / tiles_per_frame], rect, options))
        });

        let tiles = match results {
            Ok(tiles) => tiles,
            Err(PoolError::Cancelled) => return Err(EncodeErrors::Cancelled),
            Err(PoolError::Task(error)) => return Err(error)
        };

        self.assemble(&grid, tiles)
    }

    /// Lay out the final container from encoded tiles
    fn assemble(
        &self, grid: &crate::tile::TileGrid, tiles: Vec<EncodedTile>
    ) -> Result<Vec<u8>, EncodeErrors> {
        let options = &self.options;
        let tiles_per_frame = grid.len();

        let mut flags = ContainerFlags::empty();
        if options.mode().is_lossless() {
            flags |= ContainerFlags::LOSSLESS;
        }
        if options.animation() {
            flags |= ContainerFlags::ANIMATION;
        }
        if self.mesh.is_some() {
            flags |= ContainerFlags::MESH;
        }
        if self.vector.is_some() {
            flags |= ContainerFlags::VECTOR;
        }

        let chunk_sources: Vec<(ChunkKind, &[u8])> = [
            self.mesh.map(|data| (ChunkKind::Mesh, data)),
            self.vector.map(|data| (ChunkKind::Vector, data))
        ]
        .into_iter()
        .flatten()
        .collect();

        let region = header_region_size(
            options.animation(),
            self.frames.len() as u32,
            tiles.len(),
            chunk_sources.len()
        );

        // directory entries pin every payload to its byte range,
        // written in frame major, row major grid order
        let mut running = region as u64;
        let mut entries = Vec::with_capacity(tiles.len());
        for (index, tile) in tiles.iter().enumerate() {
            let rect = grid.tile(index % tiles_per_frame);
            entries.push(TileEntry {
                frame:    (index / tiles_per_frame) as u32,
                grid_x:   rect.grid_x as u32,
                grid_y:   rect.grid_y as u32,
                offset:   running,
                length:   tile.payload.len() as u32,
                checksum: adler32(&tile.payload),
                means:    tile.means
            });
            running += tile.payload.len() as u64;
        }

        let mut chunks = Vec::with_capacity(chunk_sources.len());
        for (kind, data) in &chunk_sources {
            chunks.push(ChunkEntry {
                kind:   *kind,
                offset: running,
                length: data.len() as u32
            });
            running += data.len() as u64;
        }

        let header = ImageHeader {
            flags,
            colorspace: options.colorspace(),
            depth: options.depth(),
            quality: options.quality(),
            effort: options.effort(),
            width: options.width(),
            height: options.height(),
            tile_size: options.tile_size(),
            frame_count: self.frames.len() as u32,
            frame_rate: self.frame_rate,
            original_size: self.frames.iter().map(|f| f.data.len() as u64).sum(),
            compressed_size: running
        };
        let durations: Vec<u32> = self.frames.iter().map(|f| f.duration_ms).collect();

        let mut out = serialize_header_region(&header, &durations, &entries, &chunks);
        out.reserve((running as usize).saturating_sub(out.len()));
        for tile in &tiles {
            out.extend_from_slice(&tile.payload);
        }
        for (_, data) in &chunk_sources {
            out.extend_from_slice(data);
        }

        if out.len() as u64 != running {
            return Err(EncodeErrors::Internal("assembled size drifted from directory"));
        }
        Ok(out)
    }
}

/// Encode one tile across every channel plane
fn encode_tile(planes: &[Plane], rect: TileRect, options: &EncoderOptions) -> EncodedTile {
    let mask = u32::from(options.depth().max_value());
    let mut payload = BytesWriter::new();
    let mut means = [0_u16; 4];

    for (channel, plane) in planes.iter().enumerate() {
        let (px0, py0, pw, ph) = rect.plane_region(options.colorspace(), channel);
        let region = plane.extract_region(px0, py0, pw, ph);

        let sum: u64 = region.iter().map(|s| u64::from(*s)).sum();
        means[channel] = (sum / region.len() as u64) as u16;

        match options.mode() {
            CompressionMode::Lossless => {
                let (mode, stream) =
                    best_predictor_stream(&region, pw, ph, mask, options.effort());
                payload.write_u8(mode.to_u8());
                payload.write_bytes(&stream);
            }
            CompressionMode::Lossy => {
                let stream = best_lossy_stream(
                    &region,
                    pw,
                    ph,
                    mask,
                    options.quality(),
                    options.effort()
                );
                payload.write_u8(0);
                payload.write_bytes(&stream);
            }
        }
    }
    EncodedTile {
        payload: payload.into_inner(),
        means
    }
}

/// Pick the cheapest predictor for one plane region.
///
/// Low efforts rank candidates by a residual magnitude heuristic and
/// compress only the winner, high efforts compress every candidate
/// and compare true sizes. Either way the choice only moves bytes,
/// decode is exact for every mode
fn best_predictor_stream(
    region: &[u16], width: usize, height: usize, mask: u32, effort: u8
) -> (Predictor, Vec<u8>) {
    let candidates = Predictor::candidates(effort);

    if effort >= 8 {
        let mut best: Option<(Predictor, Vec<u8>)> = None;
        for candidate in candidates {
            let residuals = predictor::forward(region, width, height, mask, *candidate);
            let stream = entropy::compress(&residuals);
            if best.as_ref().map_or(true, |(_, s)| stream.len() < s.len()) {
                best = Some((*candidate, stream));
            }
        }
        return best.unwrap();
    }

    let mut best = candidates[0];
    let mut best_residuals = None;
    let mut best_cost = u64::MAX;
    for candidate in candidates {
        let residuals = predictor::forward(region, width, height, mask, *candidate);
        let cost = predictor::residual_cost(&residuals);
        if cost < best_cost {
            best = *candidate;
            best_cost = cost;
            best_residuals = Some(residuals);
        }
    }
    (best, entropy::compress(&best_residuals.unwrap()))
}

/// Quantize one plane region at every candidate dead zone and keep
/// the best rate/distortion trade
fn best_lossy_stream(
    region: &[u16], width: usize, height: usize, mask: u32, quality: u8, effort: u8
) -> Vec<u8> {
    // higher quality weighs distortion harder, pushing the search
    // toward narrow dead zones
    let lambda = f64::from(quality).powi(2) / 100_000.0;
    let mut best: Option<(f64, Vec<u8>)> = None;

    for deadzone in dct::deadzone_candidates(effort) {
        let (coefficients, distortion) =
            dct::forward_tile(region, width, height, mask, quality, *deadzone);
        let stream = entropy::compress(&coefficients);
        let score = stream.len() as f64 + lambda * distortion;
        if best.as_ref().map_or(true, |(s, _)| score < *s) {
            best = Some((score, stream));
        }
    }
    best.unwrap().1
}
