/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Entropy coding of coefficient and residual planes
//!
//! Values are split into a token naming their magnitude class plus
//! raw extra bits, the hybrid integer scheme used by fast lossless
//! JPEG-XL encoders. Tokens travel through a canonical prefix code.
//! Zero runs get a marker token followed by a run length drawn from
//! a second prefix code, which is what makes quantized coefficient
//! planes cheap.
//!
//! A compressed stream is self describing:
//!
//! ```text
//! u32 value count
//! value code lengths  (VALUE_ALPHABET bytes)
//! run   code lengths  (RUN_ALPHABET bytes)
//! u32 bitstream byte length
//! bitstream, LSB first
//! ```
//!
//! [`decompress`] is an exact left inverse of [`compress`] and fails
//! with an error, never out of bounds reads, on any truncated or
//! tampered stream.

use core::fmt::{Debug, Formatter};

use fresco_core::bytestream::{BytesReader, BytesWriter};

use crate::entropy::bits::{BitReader, BitWriter};
use crate::entropy::prefix::{PrefixDecoder, PrefixEncoder};

pub(crate) mod bits;
pub(crate) mod prefix;

/// Tokens 1..=32 cover nonzero magnitudes up to 32 bits,
/// token 0 marks a zero run
pub(crate) const VALUE_ALPHABET: usize = 33;
/// Run lengths below 16 map to their own token, larger ones go
/// exponential. Plane sizes keep runs far below the alphabet limit
pub(crate) const RUN_ALPHABET: usize = 40;

/// Errors produced when decoding an entropy stream
pub(crate) enum EntropyErrors {
    /// Bitstream ended in the middle of a symbol
    Truncated,
    /// Code length table violates the Kraft inequality
    BadCodeLengths,
    /// A bit pattern not reachable from any codeword
    InvalidSymbol,
    /// Stream declares a different value count than the caller expects
    CountMismatch(usize, usize),
    /// A zero run would write past the declared value count
    RunOverrun
}

impl Debug for EntropyErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            EntropyErrors::Truncated => writeln!(f, "Bitstream truncated mid symbol"),
            EntropyErrors::BadCodeLengths => writeln!(f, "Invalid prefix code lengths"),
            EntropyErrors::InvalidSymbol => writeln!(f, "Bit pattern matches no codeword"),
            EntropyErrors::CountMismatch(expected, found) => {
                writeln!(f, "Expected {expected} values but stream declares {found}")
            }
            EntropyErrors::RunOverrun => writeln!(f, "Zero run exceeds declared value count")
        }
    }
}

/// Token, extra bit count and extra bits for a nonzero value
#[inline]
fn value_token(value: u32) -> (usize, u8, u32) {
    debug_assert!(value != 0);
    let n = 31 - value.leading_zeros();
    (n as usize + 1, n as u8, value - (1 << n))
}

/// Token, extra bit count and extra bits for a zero run of
/// `stored = run - 1`
#[inline]
fn run_token(stored: u32) -> (usize, u8, u32) {
    if stored < 16 {
        (stored as usize, 0, 0)
    } else {
        let n = 31 - stored.leading_zeros();
        (n as usize + 12, n as u8, stored - (1 << n))
    }
}

/// Compress a value plane into a self describing byte stream
pub(crate) fn compress(values: &[u32]) -> Vec<u8> {
    let mut value_freqs = [0_u32; VALUE_ALPHABET];
    let mut run_freqs = [0_u32; RUN_ALPHABET];

    // first pass, gather token statistics
    let mut i = 0;
    while i < values.len() {
        if values[i] == 0 {
            let mut run = 1;
            while i + run < values.len() && values[i + run] == 0 {
                run += 1;
            }
            value_freqs[0] += 1;
            run_freqs[run_token(run as u32 - 1).0] += 1;
            i += run;
        } else {
            value_freqs[value_token(values[i]).0] += 1;
            i += 1;
        }
    }

    let value_code = PrefixEncoder::from_lengths(&prefix::code_lengths(&value_freqs));
    let run_code = PrefixEncoder::from_lengths(&prefix::code_lengths(&run_freqs));

    // second pass, emit the bitstream
    let mut bit_writer = BitWriter::new();
    let mut i = 0;
    while i < values.len() {
        if values[i] == 0 {
            let mut run = 1;
            while i + run < values.len() && values[i + run] == 0 {
                run += 1;
            }
            let (token, nbits, bits) = run_token(run as u32 - 1);
            value_code.write(&mut bit_writer, 0);
            run_code.write(&mut bit_writer, token);
            bit_writer.put_bits(nbits, u64::from(bits));
            i += run;
        } else {
            let (token, nbits, bits) = value_token(values[i]);
            value_code.write(&mut bit_writer, token);
            bit_writer.put_bits(nbits, u64::from(bits));
            i += 1;
        }
    }
    let bitstream = bit_writer.finish();

    let mut writer =
        BytesWriter::with_capacity(8 + VALUE_ALPHABET + RUN_ALPHABET + bitstream.len());
    writer.write_u32_le(values.len() as u32);
    writer.write_bytes(value_code.lengths());
    writer.write_bytes(run_code.lengths());
    writer.write_u32_le(bitstream.len() as u32);
    writer.write_bytes(&bitstream);
    writer.into_inner()
}

/// Decompress a stream produced by [`compress`].
///
/// `expected` is the plane shape the caller derived from the
/// container header, any disagreement is treated as corruption.
///
/// Returns the values plus the number of input bytes the stream
/// occupied, streams are concatenated back to back inside a tile
/// payload
pub(crate) fn decompress(
    data: &[u8], expected: usize
) -> Result<(Vec<u32>, usize), EntropyErrors> {
    let mut reader = BytesReader::new(data);

    let count = reader
        .get_u32_le()
        .map_err(|_| EntropyErrors::Truncated)? as usize;
    if count != expected {
        return Err(EntropyErrors::CountMismatch(expected, count));
    }

    let value_lengths = reader
        .get_fixed::<VALUE_ALPHABET>()
        .map_err(|_| EntropyErrors::Truncated)?;
    let run_lengths = reader
        .get_fixed::<RUN_ALPHABET>()
        .map_err(|_| EntropyErrors::Truncated)?;

    let bitstream_len = reader
        .get_u32_le()
        .map_err(|_| EntropyErrors::Truncated)? as usize;
    let bitstream = reader
        .get_slice(bitstream_len)
        .map_err(|_| EntropyErrors::Truncated)?;

    let value_table = PrefixDecoder::from_lengths(&value_lengths)?;
    let run_table = PrefixDecoder::from_lengths(&run_lengths)?;

    let mut out = Vec::with_capacity(count);
    let mut bits = BitReader::new(bitstream);

    while out.len() < count {
        let token = value_table.decode(&mut bits)?;
        if token == 0 {
            let run_sym = run_table.decode(&mut bits)?;
            let stored = if run_sym < 16 {
                run_sym as u32
            } else {
                let nbits = (run_sym - 12) as u8;
                (1_u32 << nbits) | bits.get_bits(nbits)? as u32
            };
            let run = stored as usize + 1;
            if out.len() + run > count {
                return Err(EntropyErrors::RunOverrun);
            }
            out.resize(out.len() + run, 0);
        } else {
            let nbits = (token - 1) as u8;
            let value = (1_u32 << nbits) | bits.get_bits(nbits)? as u32;
            out.push(value);
        }
    }
    Ok((out, reader.position()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_mixed_values() {
        let values: Vec<u32> = vec![0, 0, 0, 5, 1, 0, 700, 0, 0, 0, 0, 0, 2, u32::MAX, 1, 0];
        let compressed = compress(&values);
        let (decoded, consumed) = decompress(&compressed, values.len()).unwrap();
        assert_eq!(decoded, values);
        assert_eq!(consumed, compressed.len());
    }

    #[test]
    fn round_trips_all_zeros_and_empty() {
        let values = vec![0_u32; 10_000];
        let compressed = compress(&values);
        // a ten thousand zero plane is a handful of bytes
        assert!(compressed.len() < 100);
        assert_eq!(decompress(&compressed, values.len()).unwrap().0, values);

        let empty: Vec<u32> = vec![];
        let compressed = compress(&empty);
        assert_eq!(decompress(&compressed, 0).unwrap().0, empty);
    }

    #[test]
    fn round_trips_long_runs() {
        let mut values = vec![0_u32; 100_000];
        values[0] = 9;
        values[99_999] = 3;
        let compressed = compress(&values);
        assert_eq!(decompress(&compressed, values.len()).unwrap().0, values);
    }

    #[test]
    fn count_mismatch_rejected() {
        let values = vec![1_u32, 2, 3];
        let compressed = compress(&values);
        assert!(matches!(
            decompress(&compressed, 4),
            Err(EntropyErrors::CountMismatch(4, 3))
        ));
    }

    #[test]
    fn truncation_rejected_at_every_length() {
        let values: Vec<u32> = (0..512).map(|i| (i * 7919) % 300).collect();
        let compressed = compress(&values);
        let (full, _) = decompress(&compressed, values.len()).unwrap();
        assert_eq!(full, values);

        for cut in 0..compressed.len() {
            assert!(
                decompress(&compressed[..cut], values.len()).is_err(),
                "truncation at {cut} slipped through"
            );
        }
    }

    #[test]
    fn garbage_tables_rejected() {
        let values = vec![4_u32, 0, 0, 17];
        let mut compressed = compress(&values);
        // oversubscribe the value code lengths
        for byte in compressed[4..4 + VALUE_ALPHABET].iter_mut() {
            *byte = 1;
        }
        assert!(decompress(&compressed, values.len()).is_err());
    }
}
