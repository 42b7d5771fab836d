/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Stable status codes surfaced across the engine boundary
//!
//! Rich error enums inside the engine carry context for logging and
//! debugging, but the boundary consumed by language bindings needs a
//! small fixed enumeration plus a string lookup. Every engine error
//! collapses to one of these codes.

/// Stable result codes for the engine boundary
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    /// Operation completed successfully
    Ok,
    /// Caller supplied configuration out of documented range
    InvalidParameter,
    /// Memory allocation failed
    OutOfMemory,
    /// Input/output error.
    ///
    /// Reserved for binding layer file operations, the engine itself
    /// only consumes in-memory buffers and never raises this
    Io,
    /// Version or feature the engine does not implement
    UnsupportedFormat,
    /// Structural or checksum inconsistency in a container or tile
    CorruptedData,
    /// Encoding operation failed
    EncodingFailed,
    /// Decoding operation failed
    DecodingFailed,
    /// Feature flag accepted but not backed by this build
    NotImplemented
}

impl Status {
    /// A human readable description of the status code.
    ///
    /// The returned string is static and never changes between calls
    /// with the same code, bindings may expose it directly
    pub const fn error_string(self) -> &'static str {
        match self {
            Status::Ok => "operation completed successfully",
            Status::InvalidParameter => "invalid parameter provided",
            Status::OutOfMemory => "memory allocation failed",
            Status::Io => "input/output error",
            Status::UnsupportedFormat => "unsupported image format",
            Status::CorruptedData => "corrupted or invalid data",
            Status::EncodingFailed => "encoding operation failed",
            Status::DecodingFailed => "decoding operation failed",
            Status::NotImplemented => "feature not yet implemented"
        }
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}
