/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

use std::fs;
use std::time::Instant;

use clap::ArgMatches;
use fresco::{extract_metadata, FrescoDecoder, FrescoEncoder};
use fresco_core::bit_depth::BitDepth;
use fresco_core::mode::CompressionMode;
use fresco_core::options::{DecoderOptions, EncoderOptions};
use log::info;

use crate::ppm;

pub fn encode(matches: &ArgMatches) -> Result<(), String> {
    let input = matches.get_one::<String>("in").unwrap();
    let output = matches.get_one::<String>("out").unwrap();

    let data = fs::read(input).map_err(|e| format!("cannot read {input}: {e}"))?;
    let image = ppm::read_ppm(&data)?;

    let mode = if matches.get_flag("lossless") {
        CompressionMode::Lossless
    } else {
        CompressionMode::Lossy
    };
    let options = EncoderOptions::new(image.width, image.height, image.colorspace, BitDepth::Eight)
        .set_mode(mode)
        .set_quality(*matches.get_one::<u8>("quality").unwrap())
        .set_effort(*matches.get_one::<u8>("effort").unwrap())
        .set_tile_size(*matches.get_one::<u32>("tile-size").unwrap())
        .set_num_threads(*matches.get_one::<u32>("threads").unwrap());

    let start = Instant::now();
    let container = FrescoEncoder::new(&image.pixels, options)
        .and_then(|encoder| encoder.encode())
        .map_err(|e| format!("{e:?}"))?;

    info!(
        "encoded {}x{} {:?} in {:?}, {} -> {} bytes",
        image.width,
        image.height,
        image.colorspace,
        start.elapsed(),
        image.pixels.len(),
        container.len()
    );

    fs::write(output, container).map_err(|e| format!("cannot write {output}: {e}"))
}

pub fn decode(matches: &ArgMatches) -> Result<(), String> {
    let input = matches.get_one::<String>("in").unwrap();
    let output = matches.get_one::<String>("out").unwrap();

    let data = fs::read(input).map_err(|e| format!("cannot read {input}: {e}"))?;
    let options =
        DecoderOptions::default().set_num_threads(*matches.get_one::<u32>("threads").unwrap());

    let start = Instant::now();
    let mut decoder = FrescoDecoder::new_with_options(&data, options);
    let pixels = decoder.decode().map_err(|e| format!("{e:?}"))?;
    let (width, height) = decoder.dimensions().unwrap();
    let colorspace = decoder.colorspace().unwrap();

    info!(
        "decoded {width}x{height} {colorspace:?} in {:?}",
        start.elapsed()
    );

    let file = ppm::write_ppm(width, height, colorspace, &pixels)?;
    fs::write(output, file).map_err(|e| format!("cannot write {output}: {e}"))
}

pub fn probe(matches: &ArgMatches) -> Result<(), String> {
    let input = matches.get_one::<String>("in").unwrap();
    let data = fs::read(input).map_err(|e| format!("cannot read {input}: {e}"))?;

    let metadata = extract_metadata(&data).map_err(|e| format!("{e:?}"))?;
    let json = serde_json::to_string_pretty(&metadata).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
