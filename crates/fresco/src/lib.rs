/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! A tile parallel FRESCO image container encoder and decoder
//!
//! FRESCO stores raster images as independently coded tiles, which
//! buys unrestricted parallelism, cheap metadata queries and
//! progressive decoding, and multiplexes animation frames plus
//! opaque 3D/vector payloads alongside the raster data.
//!
//! Supported modes
//! - Lossless: reversible prediction, bit exact round trips for
//!   every colorspace and depth
//! - Lossy: block transform with a quality controlled quantizer
//!
//! # Example
//! - Round trip an RGB image losslessly
//!
//! ```
//! use fresco::{FrescoDecoder, FrescoEncoder};
//! use fresco_core::bit_depth::BitDepth;
//! use fresco_core::colorspace::ColorSpace;
//! use fresco_core::mode::CompressionMode;
//! use fresco_core::options::EncoderOptions;
//!
//! let pixels: Vec<u8> = (0..32 * 32 * 3).map(|i| (i % 256) as u8).collect();
//! let options = EncoderOptions::new(32, 32, ColorSpace::RGB, BitDepth::Eight)
//!     .set_mode(CompressionMode::Lossless);
//!
//! let container = FrescoEncoder::new(&pixels, options).unwrap().encode().unwrap();
//! let decoded = FrescoDecoder::new(&container).decode().unwrap();
//! assert_eq!(decoded, pixels);
//! ```
//!
//! # Crate features
//! - `threads`: tile parallel encode and decode (on by default)
//! - `serde`: serialization support for [`FrescoMetadata`]
#![allow(clippy::needless_range_loop)]

pub use crate::decoder::FrescoDecoder;
pub use crate::encoder::FrescoEncoder;
pub use crate::errors::{DecodeErrors, EncodeErrors};
pub use crate::extensions::{ChunkKind, DecodedFrame};
pub use crate::metadata::{extract_metadata, FrescoMetadata};
pub use crate::progressive::{DecodePhase, ProgressiveDecoder, Snapshot};
pub use crate::scheduler::CancelToken;

mod container;
mod decoder;
mod encoder;
mod entropy;
mod errors;
mod extensions;
mod metadata;
mod planes;
mod progressive;
mod scheduler;
mod tile;
mod transform;
mod utils;
