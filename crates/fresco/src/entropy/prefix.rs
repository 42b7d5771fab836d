/*
 * Copyright (c) 2025.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT license
 */

//! Canonical prefix codes with limited code lengths
//!
//! Code lengths are computed with plain Huffman merging, clamped to
//! [`MAX_CODE_LENGTH`] and repaired until the Kraft sum fits again.
//! Canonical code assignment makes the bit patterns a pure function
//! of the lengths, so only the lengths travel in the stream.
//!
//! Decoding uses a single level lookup table indexed by
//! `MAX_CODE_LENGTH` peeked bits, entries not reachable from any
//! codeword stay invalid and reject corrupt streams.

use crate::entropy::bits::{BitReader, BitWriter};
use crate::entropy::EntropyErrors;

pub(crate) const MAX_CODE_LENGTH: u8 = 11;

/// Compute length limited code lengths for the given frequencies.
///
/// Symbols with zero frequency get length zero and no codeword.
/// Fully deterministic for a given frequency table
pub(crate) fn code_lengths(freqs: &[u32]) -> Vec<u8> {
    let mut lengths = vec![0_u8; freqs.len()];

    // clusters of symbols that share a subtree, merged smallest first
    let mut clusters: Vec<(u64, Vec<usize>)> = freqs
        .iter()
        .enumerate()
        .filter(|(_, f)| **f > 0)
        .map(|(i, f)| (u64::from(*f), vec![i]))
        .collect();

    match clusters.len() {
        0 => return lengths,
        1 => {
            lengths[clusters[0].1[0]] = 1;
            return lengths;
        }
        _ => ()
    }

    while clusters.len() > 1 {
        // alphabet is tiny, a linear scan beats a heap and keeps
        // tie-breaking obvious
        let mut lo = 0;
        for i in 1..clusters.len() {
            if clusters[i].0 < clusters[lo].0 {
                lo = i;
            }
        }
        let (count_a, syms_a) = clusters.swap_remove(lo);

        let mut hi = 0;
        for i in 1..clusters.len() {
            if clusters[i].0 < clusters[hi].0 {
                hi = i;
            }
        }
        let (count_b, mut syms_b) = clusters.swap_remove(hi);

        for sym in syms_a.iter().chain(syms_b.iter()) {
            lengths[*sym] += 1;
        }
        let mut merged = syms_a;
        merged.append(&mut syms_b);
        clusters.push((count_a + count_b, merged));
    }

    limit_lengths(&mut lengths);
    lengths
}

/// Clamp lengths to [`MAX_CODE_LENGTH`] and lengthen other codes
/// until the Kraft inequality holds again
fn limit_lengths(lengths: &mut [u8]) {
    let full: u64 = 1 << MAX_CODE_LENGTH;
    let mut kraft: u64 = 0;

    for length in lengths.iter_mut() {
        if *length > MAX_CODE_LENGTH {
            *length = MAX_CODE_LENGTH;
        }
        if *length > 0 {
            kraft += full >> *length;
        }
    }

    while kraft > full {
        // deepen the longest still-extendable code, cheapest in
        // added bits
        let mut pick = usize::MAX;
        for (i, length) in lengths.iter().enumerate() {
            if (1..MAX_CODE_LENGTH).contains(length)
                && (pick == usize::MAX || *length > lengths[pick])
            {
                pick = i;
            }
        }
        kraft -= full >> (lengths[pick] + 1);
        lengths[pick] += 1;
    }
}

/// Reverse the lowest `nbits` bits of `bits`
fn bit_reverse(nbits: u8, bits: u16) -> u16 {
    bits.reverse_bits() >> (16 - nbits)
}

/// Canonical codes laid out for LSB first bit emission
pub(crate) struct PrefixEncoder {
    lengths: Vec<u8>,
    codes:   Vec<u16>
}

impl PrefixEncoder {
    pub fn from_lengths(lengths: &[u8]) -> PrefixEncoder {
        let codes = canonical_codes(lengths);
        PrefixEncoder {
            lengths: lengths.to_vec(),
            codes
        }
    }

    pub fn lengths(&self) -> &[u8] {
        &self.lengths
    }

    pub fn write(&self, writer: &mut BitWriter, symbol: usize) {
        debug_assert!(self.lengths[symbol] > 0, "symbol without a code");
        writer.put_bits(self.lengths[symbol], u64::from(self.codes[symbol]));
    }
}

/// Assign canonical codewords from lengths, already bit reversed
fn canonical_codes(lengths: &[u8]) -> Vec<u16> {
    let mut counts = [0_u16; MAX_CODE_LENGTH as usize + 1];
    for length in lengths {
        counts[usize::from(*length)] += 1;
    }
    counts[0] = 0;

    let mut next_code = [0_u16; MAX_CODE_LENGTH as usize + 1];
    let mut code = 0_u16;
    for length in 1..=usize::from(MAX_CODE_LENGTH) {
        code = (code + counts[length - 1]) << 1;
        next_code[length] = code;
    }

    let mut codes = vec![0_u16; lengths.len()];
    for (sym, length) in lengths.iter().enumerate() {
        if *length > 0 {
            codes[sym] = bit_reverse(*length, next_code[usize::from(*length)]);
            next_code[usize::from(*length)] += 1;
        }
    }
    codes
}

/// Single level decode table for canonical codes
pub(crate) struct PrefixDecoder {
    // symbol << 4 | length, zero marks an unreachable bit pattern
    table: Vec<u16>
}

impl PrefixDecoder {
    /// Build the decode table, rejecting length sets no canonical
    /// code can have produced
    pub fn from_lengths(lengths: &[u8]) -> Result<PrefixDecoder, EntropyErrors> {
        let full: u64 = 1 << MAX_CODE_LENGTH;
        let mut kraft: u64 = 0;

        for length in lengths {
            if *length > MAX_CODE_LENGTH {
                return Err(EntropyErrors::BadCodeLengths);
            }
            if *length > 0 {
                kraft += full >> *length;
            }
        }
        if kraft > full {
            return Err(EntropyErrors::BadCodeLengths);
        }

        let codes = canonical_codes(lengths);
        let mut table = vec![0_u16; 1 << MAX_CODE_LENGTH];

        for (sym, length) in lengths.iter().enumerate() {
            if *length == 0 {
                continue;
            }
            let entry = ((sym as u16) << 4) | u16::from(*length);
            let stride = 1_usize << *length;
            let mut position = usize::from(codes[sym]);
            while position < table.len() {
                table[position] = entry;
                position += stride;
            }
        }
        Ok(PrefixDecoder { table })
    }

    /// Decode one symbol from the reader
    pub fn decode(&self, reader: &mut BitReader) -> Result<usize, EntropyErrors> {
        let (bits, available) = reader.peek_bits(MAX_CODE_LENGTH);
        let entry = self.table[bits as usize];

        if entry == 0 {
            return Err(EntropyErrors::InvalidSymbol);
        }
        let length = (entry & 0xF) as u8;
        if length > available {
            return Err(EntropyErrors::Truncated);
        }
        reader.consume(length)?;
        Ok(usize::from(entry >> 4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(freqs: &[u32], symbols: &[usize]) {
        let lengths = code_lengths(freqs);
        let encoder = PrefixEncoder::from_lengths(&lengths);
        let decoder = PrefixDecoder::from_lengths(&lengths).unwrap();

        let mut writer = BitWriter::new();
        for sym in symbols {
            encoder.write(&mut writer, *sym);
        }
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        for sym in symbols {
            assert_eq!(decoder.decode(&mut reader).unwrap(), *sym);
        }
    }

    #[test]
    fn skewed_frequencies_round_trip() {
        let freqs = [1000, 300, 80, 20, 5, 1, 1, 0, 0, 1];
        round_trip(&freqs, &[0, 1, 2, 3, 4, 5, 6, 9, 0, 0, 1, 2]);
    }

    #[test]
    fn single_symbol_round_trip() {
        let freqs = [0, 42, 0];
        round_trip(&freqs, &[1, 1, 1, 1]);
    }

    #[test]
    fn lengths_respect_limit() {
        // pathologically skewed counts would want a 30+ bit code
        let freqs: Vec<u32> = (0..32).map(|i| 1_u32 << i).collect();
        let lengths = code_lengths(&freqs);
        let full: u64 = 1 << MAX_CODE_LENGTH;
        let kraft: u64 = lengths
            .iter()
            .filter(|l| **l > 0)
            .map(|l| full >> *l)
            .sum();

        assert!(lengths.iter().all(|l| *l <= MAX_CODE_LENGTH));
        assert!(kraft <= full);
        // still decodable
        round_trip(&freqs, &[0, 31, 15, 7, 0]);
    }

    #[test]
    fn oversubscribed_lengths_rejected() {
        // five codes of length two oversubscribe the code space
        let lengths = [2_u8, 2, 2, 2, 2];
        assert!(PrefixDecoder::from_lengths(&lengths).is_err());

        let lengths = [12_u8, 1];
        assert!(PrefixDecoder::from_lengths(&lengths).is_err());
    }

    #[test]
    fn unreachable_pattern_rejected() {
        // single length-two code leaves most patterns invalid
        let lengths = [0_u8, 2];
        let decoder = PrefixDecoder::from_lengths(&lengths).unwrap();
        let bytes = [0b0000_0001_u8, 0, 0];
        let mut reader = BitReader::new(&bytes);
        assert!(decoder.decode(&mut reader).is_err());
    }
}
