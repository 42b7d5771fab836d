/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

#![allow(clippy::uninlined_format_args)]

use core::fmt::{Debug, Display, Formatter};

use fresco_core::bytestream::BytesError;
use fresco_core::options::OptionsError;
use fresco_core::status::Status;

/// Errors that may arise during encoding
pub enum EncodeErrors {
    /// A configuration value failed validation
    InvalidOptions(OptionsError),
    /// The input buffer length doesn't match the configured geometry.
    ///
    /// First argument is the expected byte length, second the found one
    LengthMismatch(usize, usize),
    /// An extension payload was attached while its gate was off.
    ///
    /// The argument names the gate
    ExtensionDisabled(&'static str),
    /// A frame index outside the frames attached so far
    NoSuchFrame(usize),
    /// The operation was cancelled through its [`CancelToken`](crate::CancelToken)
    Cancelled,
    /// An internal invariant was violated
    Internal(&'static str)
}

impl EncodeErrors {
    /// The stable status code this error collapses to
    pub const fn status(&self) -> Status {
        match self {
            EncodeErrors::InvalidOptions(_)
            | EncodeErrors::LengthMismatch(..)
            | EncodeErrors::ExtensionDisabled(_)
            | EncodeErrors::NoSuchFrame(_) => Status::InvalidParameter,
            EncodeErrors::Cancelled | EncodeErrors::Internal(_) => Status::EncodingFailed
        }
    }
}

impl Debug for EncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            EncodeErrors::InvalidOptions(err) => {
                writeln!(f, "Invalid configuration: {:?}", err)
            }
            EncodeErrors::LengthMismatch(expected, found) => {
                writeln!(f, "Expected buffer of length {expected} but found {found}")
            }
            EncodeErrors::ExtensionDisabled(gate) => {
                writeln!(
                    f,
                    "The {gate} payload gate is disabled in the encoder options"
                )
            }
            EncodeErrors::NoSuchFrame(index) => {
                writeln!(f, "No frame with index {index} attached to the encoder")
            }
            EncodeErrors::Cancelled => {
                writeln!(f, "Encode cancelled before all tiles were dispatched")
            }
            EncodeErrors::Internal(msg) => {
                writeln!(f, "Internal error: {msg}")
            }
        }
    }
}

impl Display for EncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for EncodeErrors {}

impl From<OptionsError> for EncodeErrors {
    fn from(value: OptionsError) -> Self {
        EncodeErrors::InvalidOptions(value)
    }
}

/// Errors that may arise during decoding
pub enum DecodeErrors {
    /// The input does not start with the `FRSC` magic bytes
    WrongMagicBytes,
    /// The container was written by a newer engine than this one
    UnsupportedVersion(u16),
    /// Structural inconsistency in the header or metadata block
    Corrupted(&'static str),
    /// A tile payload failed validation or decoding.
    ///
    /// First argument is the directory index of the tile
    CorruptedTile(usize, &'static str),
    /// The input ended before the required byte range.
    ///
    /// First argument is the number of bytes required,
    /// second the number present
    TruncatedInput(usize, usize),
    /// Declared dimensions above the configured decoder limits
    LargerThanLimits(usize, usize),
    /// The operation was cancelled through its [`CancelToken`](crate::CancelToken)
    Cancelled
}

impl DecodeErrors {
    /// The stable status code this error collapses to
    pub const fn status(&self) -> Status {
        match self {
            DecodeErrors::WrongMagicBytes
            | DecodeErrors::Corrupted(_)
            | DecodeErrors::CorruptedTile(..)
            | DecodeErrors::TruncatedInput(..) => Status::CorruptedData,
            DecodeErrors::UnsupportedVersion(_) => Status::UnsupportedFormat,
            DecodeErrors::LargerThanLimits(..) | DecodeErrors::Cancelled => Status::DecodingFailed
        }
    }
}

impl Debug for DecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            DecodeErrors::WrongMagicBytes => {
                writeln!(f, "Wrong magic bytes, expected `FRSC` as container start")
            }
            DecodeErrors::UnsupportedVersion(version) => {
                writeln!(
                    f,
                    "Container version {version} is newer than this engine supports"
                )
            }
            DecodeErrors::Corrupted(reason) => {
                writeln!(f, "Corrupted container: {reason}")
            }
            DecodeErrors::CorruptedTile(index, reason) => {
                writeln!(f, "Corrupted tile payload {index}: {reason}")
            }
            DecodeErrors::TruncatedInput(expected, found) => {
                writeln!(
                    f,
                    "Truncated input, required {expected} bytes but found {found}"
                )
            }
            DecodeErrors::LargerThanLimits(dimension, limit) => {
                writeln!(
                    f,
                    "Dimension {dimension} greater than configured decoder limit {limit}"
                )
            }
            DecodeErrors::Cancelled => {
                writeln!(f, "Decode cancelled before all tiles were dispatched")
            }
        }
    }
}

impl Display for DecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for DecodeErrors {}

impl From<BytesError> for DecodeErrors {
    fn from(value: BytesError) -> Self {
        match value {
            BytesError::NotEnoughBytes(expected, found) => {
                DecodeErrors::TruncatedInput(expected, found)
            }
            BytesError::OutOfBounds(..) => DecodeErrors::Corrupted("position out of bounds")
        }
    }
}
