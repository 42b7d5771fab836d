/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Bounds checked little endian byte I/O for the container format
//!
//! The engine never touches files or sockets, the binding layer hands
//! it complete in-memory buffers or incremental byte ranges. So the
//! reader walks a borrowed slice and the writer appends to an owned
//! vector, both with explicit errors instead of panics when the data
//! runs short.

use core::fmt::{Debug, Display, Formatter};

/// Errors raised by the byte reader
pub enum BytesError {
    /// The slice ended before the requested read.
    ///
    /// First argument is the number of bytes requested,
    /// second is the number of bytes remaining
    NotEnoughBytes(usize, usize),
    /// A seek target lies outside the slice
    OutOfBounds(usize, usize)
}

impl Debug for BytesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            BytesError::NotEnoughBytes(expected, found) => {
                writeln!(f, "Not enough bytes, expected {expected} but found {found}")
            }
            BytesError::OutOfBounds(position, length) => {
                writeln!(
                    f,
                    "Position {position} out of bounds for stream of length {length}"
                )
            }
        }
    }
}

impl Display for BytesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for BytesError {}

/// A bounds checked reader over a borrowed byte slice
pub struct BytesReader<'a> {
    data:     &'a [u8],
    position: usize
}

impl<'a> BytesReader<'a> {
    pub const fn new(data: &'a [u8]) -> BytesReader<'a> {
        BytesReader { data, position: 0 }
    }

    /// Current read position from the start of the slice
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Number of bytes not yet consumed
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Move the cursor to an absolute position
    pub fn set_position(&mut self, position: usize) -> Result<(), BytesError> {
        if position > self.data.len() {
            return Err(BytesError::OutOfBounds(position, self.data.len()));
        }
        self.position = position;
        Ok(())
    }

    /// Advance the cursor without looking at the bytes
    pub fn skip(&mut self, num: usize) -> Result<(), BytesError> {
        let new_position = self
            .position
            .checked_add(num)
            .ok_or(BytesError::OutOfBounds(usize::MAX, self.data.len()))?;
        self.set_position(new_position)
    }

    /// Borrow `num` bytes from the current position, advancing past them
    pub fn get_slice(&mut self, num: usize) -> Result<&'a [u8], BytesError> {
        match self.data[self.position..].get(..num) {
            Some(bytes) => {
                self.position += num;
                Ok(bytes)
            }
            None => Err(BytesError::NotEnoughBytes(num, self.remaining()))
        }
    }

    /// Read a fixed number of bytes into an array
    pub fn get_fixed<const N: usize>(&mut self) -> Result<[u8; N], BytesError> {
        let mut out = [0_u8; N];
        out.copy_from_slice(self.get_slice(N)?);
        Ok(out)
    }

    pub fn get_u8(&mut self) -> Result<u8, BytesError> {
        Ok(self.get_fixed::<1>()?[0])
    }

    pub fn get_u16_le(&mut self) -> Result<u16, BytesError> {
        Ok(u16::from_le_bytes(self.get_fixed()?))
    }

    pub fn get_u32_le(&mut self) -> Result<u32, BytesError> {
        Ok(u32::from_le_bytes(self.get_fixed()?))
    }

    pub fn get_u64_le(&mut self) -> Result<u64, BytesError> {
        Ok(u64::from_le_bytes(self.get_fixed()?))
    }

    pub fn get_f32_le(&mut self) -> Result<f32, BytesError> {
        Ok(f32::from_le_bytes(self.get_fixed()?))
    }
}

/// An append-only little endian writer over an owned vector
#[derive(Default)]
pub struct BytesWriter {
    data: Vec<u8>
}

impl BytesWriter {
    pub fn new() -> BytesWriter {
        BytesWriter { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> BytesWriter {
        BytesWriter {
            data: Vec::with_capacity(capacity)
        }
    }

    /// Number of bytes written so far
    pub fn position(&self) -> usize {
        self.data.len()
    }

    /// Consume the writer returning the bytes written
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Borrow the bytes written so far
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_u16_le(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64_le(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32_le(&mut self, value: f32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Overwrite previously written bytes in place.
    ///
    /// Used to patch fields whose value is only known once the rest of
    /// the stream has been produced, e.g. total container length
    pub fn patch_u32_le(&mut self, position: usize, value: u32) {
        self.data[position..position + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn patch_u64_le(&mut self, position: usize, value: u64) {
        self.data[position..position + 8].copy_from_slice(&value.to_le_bytes());
    }
}
