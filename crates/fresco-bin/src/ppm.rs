/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Just enough netpbm to feed the codec
//!
//! Binary P5 (grayscale) and P6 (RGB) with a maxval of 255, which
//! covers what the command line tool needs for demos and golden
//! files. Anything fancier should go through the library API.

use fresco_core::colorspace::ColorSpace;

pub struct PpmImage {
    pub width:      usize,
    pub height:     usize,
    pub colorspace: ColorSpace,
    pub pixels:     Vec<u8>
}

/// Read a whitespace delimited ASCII token, skipping `#` comments
fn read_token(data: &[u8], position: &mut usize) -> Result<usize, String> {
    while *position < data.len() {
        match data[*position] {
            b' ' | b'\t' | b'\r' | b'\n' => *position += 1,
            b'#' => {
                while *position < data.len() && data[*position] != b'\n' {
                    *position += 1;
                }
            }
            _ => break
        }
    }
    let start = *position;
    while *position < data.len() && data[*position].is_ascii_digit() {
        *position += 1;
    }
    if start == *position {
        return Err("expected a numeric header field".to_string());
    }
    std::str::from_utf8(&data[start..*position])
        .unwrap()
        .parse::<usize>()
        .map_err(|e| format!("bad header number: {e}"))
}

pub fn read_ppm(data: &[u8]) -> Result<PpmImage, String> {
    if data.len() < 2 {
        return Err("file too short for a netpbm header".to_string());
    }
    let colorspace = match &data[..2] {
        b"P5" => ColorSpace::Gray,
        b"P6" => ColorSpace::RGB,
        _ => return Err("only binary P5/P6 netpbm files are supported".to_string())
    };

    let mut position = 2;
    let width = read_token(data, &mut position)?;
    let height = read_token(data, &mut position)?;
    let maxval = read_token(data, &mut position)?;
    if maxval != 255 {
        return Err(format!("only maxval 255 is supported, found {maxval}"));
    }
    // single whitespace byte separates the header from raster data
    position += 1;

    let expected = width * height * colorspace.num_components();
    let pixels = data
        .get(position..position + expected)
        .ok_or_else(|| "raster data shorter than the header promises".to_string())?;

    Ok(PpmImage {
        width,
        height,
        colorspace,
        pixels: pixels.to_vec()
    })
}

pub fn write_ppm(
    width: usize, height: usize, colorspace: ColorSpace, pixels: &[u8]
) -> Result<Vec<u8>, String> {
    let magic = match colorspace {
        ColorSpace::Gray => "P5",
        ColorSpace::RGB => "P6",
        _ => {
            return Err(format!(
                "colorspace {colorspace:?} has no netpbm representation"
            ))
        }
    };
    let mut out = format!("{magic}\n{width} {height}\n255\n").into_bytes();
    out.extend_from_slice(pixels);
    Ok(out)
}
