/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Extension payload handling
//!
//! Animation frames reuse the whole raster pipeline, only their
//! timing table lives here. 3D mesh and vector graphics payloads are
//! opaque to the raster pipeline, the container frames them as length
//! prefixed chunks and this module validates nothing beyond that
//! framing. Their internal structure is a separate format.

use crate::errors::DecodeErrors;

/// Kinds of opaque extension chunks the container recognizes
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChunkKind {
    /// A 3D mesh block
    Mesh,
    /// A vector graphics block
    Vector
}

impl ChunkKind {
    pub(crate) const fn to_u8(self) -> u8 {
        match self {
            ChunkKind::Mesh => 1,
            ChunkKind::Vector => 2
        }
    }

    pub(crate) const fn from_u8(value: u8) -> Option<ChunkKind> {
        match value {
            1 => Some(ChunkKind::Mesh),
            2 => Some(ChunkKind::Vector),
            _ => None
        }
    }
}

/// A chunk table entry, byte range relative to the container start
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct ChunkEntry {
    pub kind:   ChunkKind,
    pub offset: u64,
    pub length: u32
}

impl ChunkEntry {
    /// Borrow the chunk bytes, validating the recorded byte range
    /// against the data actually present
    pub fn slice<'a>(&self, data: &'a [u8]) -> Result<&'a [u8], DecodeErrors> {
        let start = self.offset as usize;
        let end = start + self.length as usize;
        data.get(start..end)
            .ok_or(DecodeErrors::Corrupted("extension chunk out of range"))
    }
}

/// One decoded animation frame
pub struct DecodedFrame {
    /// Raw samples in the caller facing layout of the container's
    /// colorspace and depth
    pub pixels:      Vec<u8>,
    /// How long this frame should be shown, zero for still images
    pub duration_ms: u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_byte_round_trips() {
        for kind in [ChunkKind::Mesh, ChunkKind::Vector] {
            assert_eq!(ChunkKind::from_u8(kind.to_u8()), Some(kind));
        }
        assert_eq!(ChunkKind::from_u8(0), None);
        assert_eq!(ChunkKind::from_u8(3), None);
    }

    #[test]
    fn out_of_range_chunk_rejected() {
        let entry = ChunkEntry {
            kind:   ChunkKind::Mesh,
            offset: 4,
            length: 10
        };
        let data = [0_u8; 8];
        assert!(entry.slice(&data).is_err());
        let data = [0_u8; 14];
        assert_eq!(entry.slice(&data).unwrap().len(), 10);
    }
}
