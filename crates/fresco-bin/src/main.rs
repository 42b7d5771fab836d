/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Command line front end for the FRESCO codec
//!
//! `fresco encode` turns a PPM/PGM image into a container,
//! `fresco decode` goes the other way and `fresco probe` dumps
//! container metadata as JSON without touching pixel data.

use std::process::exit;

use log::error;

mod cmd_args;
mod commands;
mod ppm;

fn main() {
    let options = cmd_args::create_cmd_args().get_matches();

    setup_logger(&options);

    let result = match options.subcommand() {
        Some(("encode", matches)) => commands::encode(matches),
        Some(("decode", matches)) => commands::decode(matches),
        Some(("probe", matches)) => commands::probe(matches),
        _ => {
            error!("no subcommand given, see --help");
            exit(-1);
        }
    };

    if let Err(reason) = result {
        println!();
        error!(" Could not complete the command, reason: {reason}");
        println!();
        exit(-1);
    }
}

fn setup_logger(options: &clap::ArgMatches) {
    let log_level = if options.get_flag("trace") {
        log::Level::Trace
    } else if options.get_flag("debug") {
        log::Level::Debug
    } else if options.get_flag("info") {
        log::Level::Info
    } else {
        log::Level::Warn
    };

    simple_logger::init_with_level(log_level).unwrap();
}
