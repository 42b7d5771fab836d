/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

use clap::{value_parser, Arg, ArgAction, Command};

fn logging_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("debug")
                .long("debug")
                .action(ArgAction::SetTrue)
                .help_heading("LOGGING")
                .help("Display debug information and higher")
        )
        .arg(
            Arg::new("trace")
                .long("trace")
                .action(ArgAction::SetTrue)
                .help_heading("LOGGING")
                .help("Display very verbose information")
        )
        .arg(
            Arg::new("info")
                .long("info")
                .action(ArgAction::SetTrue)
                .help_heading("LOGGING")
                .help("Display information about the coding options")
        )
}

fn input_output(command: Command) -> Command {
    command
        .arg(
            Arg::new("in")
                .short('i')
                .long("input")
                .help("Input file to read data from")
                .required(true)
        )
        .arg(
            Arg::new("out")
                .short('o')
                .long("output")
                .help("Output file to write data to")
                .required(true)
        )
}

#[rustfmt::skip]
pub fn create_cmd_args() -> Command {
    let encode = input_output(Command::new("encode"))
        .about("Encode a PPM/PGM image into a FRESCO container")
        .arg(Arg::new("lossless")
            .long("lossless")
            .action(ArgAction::SetTrue)
            .help("Use reversible compression, ignores --quality"))
        .arg(Arg::new("quality")
            .long("quality")
            .short('q')
            .value_parser(value_parser!(u8))
            .default_value("85")
            .help("Lossy quality, 1-100, higher is better fidelity"))
        .arg(Arg::new("effort")
            .long("effort")
            .short('e')
            .value_parser(value_parser!(u8))
            .default_value("5")
            .help("Encode effort, 1-10, higher spends more time for smaller files"))
        .arg(Arg::new("tile-size")
            .long("tile-size")
            .value_parser(value_parser!(u32))
            .default_value("256")
            .help("Tile edge length in pixels, a multiple of 8 between 16 and 4096"))
        .arg(Arg::new("threads")
            .long("threads")
            .short('t')
            .value_parser(value_parser!(u32))
            .default_value("0")
            .help("Worker threads, 0 detects hardware concurrency"));

    let decode = input_output(Command::new("decode"))
        .about("Decode a FRESCO container back into a PPM/PGM image")
        .arg(Arg::new("threads")
            .long("threads")
            .short('t')
            .value_parser(value_parser!(u32))
            .default_value("0")
            .help("Worker threads, 0 detects hardware concurrency"));

    let probe = Command::new("probe")
        .about("Print container metadata as JSON, never reads pixel data")
        .arg(Arg::new("in")
            .short('i')
            .long("input")
            .help("Container to inspect")
            .required(true));

    logging_args(
        Command::new("fresco")
            .about("Encode, decode and inspect FRESCO image containers")
            .subcommand(encode)
            .subcommand(decode)
            .subcommand(probe)
            .subcommand_precedence_over_arg(true)
    )
}
