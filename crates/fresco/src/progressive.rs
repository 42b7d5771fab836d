/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! The progressive decode state machine
//!
//! Drives coarse to fine reconstruction over an incrementally
//! arriving bitstream:
//!
//! ```text
//! HeaderPending -> MetadataReady -> TilesStreaming -> Complete
//!        \______________\________________\________ Failed
//! ```
//!
//! States are a tagged enum carrying their own context, so asking a
//! question the current state cannot answer (metadata before the
//! header parsed, snapshots before a buffer exists) comes back as
//! `None` instead of garbage.
//!
//! Tiles are decoded as soon as their byte range is fully buffered.
//! A snapshot fills not-yet-final tiles with the per channel means
//! recorded in the directory, a deterministic coarse placeholder,
//! and reports which regions are final. Once every tile of the
//! primary frame has landed the output is byte identical to a one
//! shot decode of the same container.

use fresco_core::options::DecoderOptions;
use log::trace;

use crate::container::{parse_header, ParsedContainer};
use crate::decoder::{decode_tile, write_tile_planes};
use crate::errors::DecodeErrors;
use crate::metadata::FrescoMetadata;
use crate::planes::{merge_planes, plane_dimensions, Plane};
use crate::tile::TileGrid;

/// Where a progressive decode currently stands
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DecodePhase {
    /// Not enough bytes buffered to parse the header region
    HeaderPending,
    /// Header and directory parsed, dimensions known, no tile
    /// decoded yet
    MetadataReady,
    /// At least one tile decoded, more byte ranges outstanding
    TilesStreaming,
    /// Every tile of the primary frame is final
    Complete,
    /// A corrupted byte range was hit
    Failed
}

/// Everything a streaming decode carries between feeds
struct StreamCtx {
    parsed:    ParsedContainer,
    planes:    Vec<Plane>,
    finished:  Vec<bool>,
    completed: usize
}

impl StreamCtx {
    fn new(parsed: ParsedContainer) -> StreamCtx {
        let header = &parsed.header;
        let planes = (0..header.colorspace.num_components())
            .map(|channel| {
                let (w, h) =
                    plane_dimensions(header.width, header.height, header.colorspace, channel);
                Plane::new(w, h)
            })
            .collect();
        let tiles = parsed.tiles_per_frame();

        StreamCtx {
            parsed,
            planes,
            finished: vec![false; tiles],
            completed: 0
        }
    }

    fn grid(&self) -> TileGrid {
        self.parsed.header.grid()
    }
}

enum State {
    HeaderPending,
    MetadataReady(Box<StreamCtx>),
    TilesStreaming(Box<StreamCtx>),
    Complete(Box<StreamCtx>),
    /// Context survives a failure only when partial results were
    /// requested up front
    Failed(Option<Box<StreamCtx>>)
}

/// A best effort view of a partially decoded image
pub struct Snapshot {
    /// Raw samples in the caller facing layout, undecoded tiles
    /// filled with their directory means
    pub pixels:   Vec<u8>,
    /// Row major grid flags, true where the region holds final
    /// pixels
    pub finished: Vec<bool>,
    pub tiles_x:  usize,
    pub tiles_y:  usize
}

/// Incremental decoder over a byte stream arriving in arbitrary
/// sized pieces
///
/// # Example
/// ```no_run
/// use fresco::{DecodePhase, ProgressiveDecoder};
/// use fresco_core::options::DecoderOptions;
///
/// let options = DecoderOptions::default().set_progressive(true);
/// let mut decoder = ProgressiveDecoder::new(options);
/// let stream: Vec<u8> = std::fs::read("image.frsc").unwrap();
///
/// for piece in stream.chunks(4096) {
///     match decoder.feed(piece) {
///         Ok(DecodePhase::Complete) => break,
///         Ok(_) => {
///             if let Some(snapshot) = decoder.snapshot() {
///                 // hand the coarse preview to the caller
///                 drop(snapshot);
///             }
///         }
///         Err(error) => panic!("stream damaged: {error:?}")
///     }
/// }
/// ```
pub struct ProgressiveDecoder {
    buffer:  Vec<u8>,
    options: DecoderOptions,
    state:   State
}

impl ProgressiveDecoder {
    pub fn new(options: DecoderOptions) -> ProgressiveDecoder {
        ProgressiveDecoder {
            buffer: Vec::new(),
            options,
            state: State::HeaderPending
        }
    }

    /// The state the machine is currently in
    pub fn phase(&self) -> DecodePhase {
        match &self.state {
            State::HeaderPending => DecodePhase::HeaderPending,
            State::MetadataReady(_) => DecodePhase::MetadataReady,
            State::TilesStreaming(_) => DecodePhase::TilesStreaming,
            State::Complete(_) => DecodePhase::Complete,
            State::Failed(_) => DecodePhase::Failed
        }
    }

    /// Container metadata, available from `MetadataReady` onward
    pub fn metadata(&self) -> Option<FrescoMetadata> {
        self.ctx().map(|ctx| crate::metadata::from_parsed(&ctx.parsed))
    }

    /// Number of finished tiles and the primary frame tile total
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.ctx().map(|ctx| (ctx.completed, ctx.finished.len()))
    }

    /// Append newly arrived bytes and advance the machine.
    ///
    /// Returns the phase after this feed. A structural error moves
    /// the machine to `Failed` and is returned, previously decoded
    /// tiles stay snapshottable when the options asked for
    /// progressive results
    pub fn feed(&mut self, bytes: &[u8]) -> Result<DecodePhase, DecodeErrors> {
        match self.state {
            State::Failed(_) => {
                return Err(DecodeErrors::Corrupted("progressive decoder already failed"))
            }
            State::Complete(_) => return Ok(DecodePhase::Complete),
            _ => ()
        }
        self.buffer.extend_from_slice(bytes);

        if matches!(self.state, State::HeaderPending) {
            match parse_header(&self.buffer, &self.options) {
                Ok(parsed) => {
                    trace!(
                        "progressive header parsed, {}x{} with {} tiles",
                        parsed.header.width,
                        parsed.header.height,
                        parsed.tiles.len()
                    );
                    self.state = State::MetadataReady(Box::new(StreamCtx::new(parsed)));
                }
                // the header region simply isn't complete yet
                Err(DecodeErrors::TruncatedInput(..)) => return Ok(DecodePhase::HeaderPending),
                Err(error) => {
                    self.state = State::Failed(None);
                    return Err(error);
                }
            }
        }
        self.pump_tiles()
    }

    /// Decode every tile whose byte range is fully buffered
    fn pump_tiles(&mut self) -> Result<DecodePhase, DecodeErrors> {
        let mut ctx = match std::mem::replace(&mut self.state, State::HeaderPending) {
            State::MetadataReady(ctx) | State::TilesStreaming(ctx) => ctx,
            other => {
                self.state = other;
                return Ok(self.phase());
            }
        };
        let grid = ctx.grid();

        for index in 0..ctx.finished.len() {
            if ctx.finished[index] {
                continue;
            }
            let entry = ctx.parsed.tiles[index];
            let end = entry.offset as usize + entry.length as usize;
            if end > self.buffer.len() {
                continue;
            }

            match decode_tile(
                &self.buffer,
                &entry,
                grid.tile(index),
                &ctx.parsed.header,
                index
            ) {
                Ok(tile) => {
                    write_tile_planes(
                        &mut ctx.planes,
                        &grid.tile(index),
                        ctx.parsed.header.colorspace,
                        tile
                    );
                    ctx.finished[index] = true;
                    ctx.completed += 1;
                }
                Err(error) => {
                    // siblings decoded so far stay retrievable when
                    // the caller opted into partial results
                    self.state = if self.options.progressive() {
                        State::Failed(Some(ctx))
                    } else {
                        State::Failed(None)
                    };
                    return Err(error);
                }
            }
        }

        self.state = if ctx.completed == ctx.finished.len() {
            State::Complete(ctx)
        } else if ctx.completed > 0 {
            State::TilesStreaming(ctx)
        } else {
            State::MetadataReady(ctx)
        };
        Ok(self.phase())
    }

    /// A best effort view of the primary frame.
    ///
    /// Available from `MetadataReady` onward, and after `Failed`
    /// when the options asked for progressive results. Tiles not yet
    /// final show their per channel directory mean
    pub fn snapshot(&self) -> Option<Snapshot> {
        let ctx = self.ctx()?;
        let header = &ctx.parsed.header;
        let grid = ctx.grid();

        let mut planes = ctx.planes.clone();
        for (index, done) in ctx.finished.iter().enumerate() {
            if *done {
                continue;
            }
            let entry = &ctx.parsed.tiles[index];
            let rect = grid.tile(index);
            for (channel, plane) in planes.iter_mut().enumerate() {
                let (px0, py0, pw, ph) = rect.plane_region(header.colorspace, channel);
                plane.fill_region(px0, py0, pw, ph, entry.means[channel]);
            }
        }

        Some(Snapshot {
            pixels:   merge_planes(&planes, header.colorspace, header.depth),
            finished: ctx.finished.clone(),
            tiles_x:  grid.tiles_x(),
            tiles_y:  grid.tiles_y()
        })
    }

    /// The final pixel buffer, only once the machine is `Complete`.
    ///
    /// Byte identical to a non progressive decode of the same
    /// container
    pub fn pixels(&self) -> Option<Vec<u8>> {
        match &self.state {
            State::Complete(ctx) => Some(merge_planes(
                &ctx.planes,
                ctx.parsed.header.colorspace,
                ctx.parsed.header.depth
            )),
            _ => None
        }
    }

    fn ctx(&self) -> Option<&StreamCtx> {
        match &self.state {
            State::MetadataReady(ctx) | State::TilesStreaming(ctx) | State::Complete(ctx) => {
                Some(ctx)
            }
            State::Failed(Some(ctx)) => Some(ctx),
            State::HeaderPending | State::Failed(None) => None
        }
    }
}
