/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Channel plane handling
//!
//! The engine works on planar samples internally. Interleaved caller
//! buffers are deinterleaved into one plane per channel on encode and
//! re-interleaved on decode; planar (subsampled YUV) buffers map
//! straight onto their planes.
//!
//! Samples are widened to `u16` regardless of depth so the transform
//! and prediction stages only deal with one integer width. Multi byte
//! samples are little endian on the caller side and in the container.

use fresco_core::bit_depth::BitDepth;
use fresco_core::colorspace::ColorSpace;

/// A single channel held at its own resolution
#[derive(Clone, Eq, PartialEq)]
pub(crate) struct Plane {
    pub width:   usize,
    pub height:  usize,
    pub samples: Vec<u16>
}

impl Plane {
    /// A zero filled plane, used as the decode target before any
    /// tile has landed
    pub fn new(width: usize, height: usize) -> Plane {
        Plane {
            width,
            height,
            samples: vec![0; width * height]
        }
    }

    /// Copy a rectangular region out of the plane, row major
    pub fn extract_region(&self, x0: usize, y0: usize, w: usize, h: usize) -> Vec<u16> {
        debug_assert!(x0 + w <= self.width && y0 + h <= self.height);

        let mut out = Vec::with_capacity(w * h);
        for y in 0..h {
            let start = (y0 + y) * self.width + x0;
            out.extend_from_slice(&self.samples[start..start + w]);
        }
        out
    }

    /// Copy a rectangular region of samples into the plane, row major
    pub fn write_region(&mut self, x0: usize, y0: usize, w: usize, h: usize, region: &[u16]) {
        debug_assert_eq!(region.len(), w * h);
        debug_assert!(x0 + w <= self.width && y0 + h <= self.height);

        for y in 0..h {
            let start = (y0 + y) * self.width + x0;
            self.samples[start..start + w].copy_from_slice(&region[y * w..(y + 1) * w]);
        }
    }

    /// Flood a rectangular region with one value
    pub fn fill_region(&mut self, x0: usize, y0: usize, w: usize, h: usize, value: u16) {
        for y in 0..h {
            let start = (y0 + y) * self.width + x0;
            self.samples[start..start + w].fill(value);
        }
    }
}

/// Dimensions of channel `channel` for an image of the given geometry,
/// chroma planes rounded up
pub(crate) fn plane_dimensions(
    width: usize, height: usize, colorspace: ColorSpace, channel: usize
) -> (usize, usize) {
    let (sx, sy) = colorspace.subsampling(channel);
    (width.div_ceil(sx), height.div_ceil(sy))
}

/// Split a caller buffer into per channel planes.
///
/// The buffer length must already have been validated against the
/// geometry, this only reorders samples
pub(crate) fn split_into_planes(
    data: &[u8], width: usize, height: usize, colorspace: ColorSpace, depth: BitDepth
) -> Vec<Plane> {
    let channels = colorspace.num_components();
    let mut planes = Vec::with_capacity(channels);

    if colorspace.is_planar() {
        let mut offset = 0;
        for channel in 0..channels {
            let (w, h) = plane_dimensions(width, height, colorspace, channel);
            let bytes = w * h * depth.size_of();
            planes.push(Plane {
                width:   w,
                height:  h,
                samples: read_samples(&data[offset..offset + bytes], depth)
            });
            offset += bytes;
        }
    } else {
        let samples = read_samples(data, depth);
        for channel in 0..channels {
            let mut plane = Vec::with_capacity(width * height);
            plane.extend(samples[channel..].iter().step_by(channels));
            planes.push(Plane {
                width,
                height,
                samples: plane
            });
        }
    }
    planes
}

/// Inverse of [`split_into_planes`], producing the caller facing
/// byte layout
pub(crate) fn merge_planes(planes: &[Plane], colorspace: ColorSpace, depth: BitDepth) -> Vec<u8> {
    let channels = colorspace.num_components();
    debug_assert_eq!(planes.len(), channels);

    if colorspace.is_planar() {
        let total: usize = planes.iter().map(|p| p.samples.len()).sum();
        let mut out = Vec::with_capacity(total * depth.size_of());
        for plane in planes {
            write_samples(&plane.samples, depth, &mut out);
        }
        out
    } else {
        let pixels = planes[0].samples.len();
        let mut interleaved = Vec::with_capacity(pixels * channels);
        for i in 0..pixels {
            for plane in planes {
                interleaved.push(plane.samples[i]);
            }
        }
        let mut out = Vec::with_capacity(interleaved.len() * depth.size_of());
        write_samples(&interleaved, depth, &mut out);
        out
    }
}

fn read_samples(data: &[u8], depth: BitDepth) -> Vec<u16> {
    match depth {
        BitDepth::Eight => data.iter().map(|b| u16::from(*b)).collect(),
        BitDepth::Sixteen => data
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }
}

fn write_samples(samples: &[u16], depth: BitDepth, out: &mut Vec<u8>) {
    match depth {
        BitDepth::Eight => out.extend(samples.iter().map(|s| *s as u8)),
        BitDepth::Sixteen => {
            for sample in samples {
                out.extend_from_slice(&sample.to_le_bytes());
            }
        }
    }
}
