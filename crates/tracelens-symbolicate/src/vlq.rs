// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Base64 VLQ decoding of source map `mappings` strings.
//!
//! Lines of the generated file are separated by `;`, segments within a line
//! by `,`. A segment holds 1, 4 or 5 delta-encoded fields: generated column,
//! source index, original line, original column and name index. The
//! generated column delta resets on every line; the other four carry over.

use crate::error::{Result, SymbolicateError};

const INVALID: u8 = u8::MAX;

const BASE64_TABLE: [u8; 128] = {
	let alphabet = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
	let mut table = [INVALID; 128];
	let mut i = 0;
	while i < alphabet.len() {
		table[alphabet[i] as usize] = i as u8;
		i += 1;
	}
	table
};

const CONTINUATION_BIT: u32 = 0b10_0000;
const DIGIT_MASK: u32 = 0b01_1111;

fn base64_digit(byte: u8) -> Result<u32> {
	match BASE64_TABLE.get(byte as usize) {
		Some(&v) if v != INVALID => Ok(u32::from(v)),
		_ => Err(SymbolicateError::InvalidVlqChar(char::from(byte))),
	}
}

/// Decode one segment into `out`, replacing its previous contents.
pub fn decode_segment(segment: &str, out: &mut Vec<i64>) -> Result<()> {
	out.clear();
	let mut accum: u64 = 0;
	let mut shift = 0u32;

	for byte in segment.bytes() {
		let digit = base64_digit(byte)?;
		if shift > 30 {
			return Err(SymbolicateError::VlqOverflow);
		}
		accum |= u64::from(digit & DIGIT_MASK) << shift;

		if digit & CONTINUATION_BIT != 0 {
			shift += 5;
			continue;
		}

		// Lowest bit carries the sign.
		let magnitude = (accum >> 1) as i64;
		out.push(if accum & 1 == 1 { -magnitude } else { magnitude });
		accum = 0;
		shift = 0;
	}

	if shift != 0 {
		return Err(SymbolicateError::UnterminatedVlq);
	}
	Ok(())
}

/// One segment with absolute (0-indexed) coordinates.
///
/// `original` is `None` for single-field segments, which mark generated code
/// with no counterpart in any source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
	pub generated_line: u32,
	pub generated_column: u32,
	pub original: Option<OriginalSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginalSegment {
	pub source_index: u32,
	pub line: u32,
	pub column: u32,
	pub name_index: Option<u32>,
}

/// Decoded mappings ordered by generated position.
#[derive(Debug, Clone, Default)]
pub struct MappingIndex {
	mappings: Vec<Mapping>,
}

impl MappingIndex {
	/// Decode a `mappings` string.
	pub fn decode(encoded: &str) -> Result<Self> {
		let mut mappings = Vec::new();
		let mut fields = Vec::with_capacity(5);

		let mut source: i64 = 0;
		let mut original_line: i64 = 0;
		let mut original_column: i64 = 0;
		let mut name: i64 = 0;

		for (line_idx, line) in encoded.split(';').enumerate() {
			let generated_line = u32::try_from(line_idx).map_err(|_| SymbolicateError::VlqOverflow)?;
			let mut generated_column: i64 = 0;

			for segment in line.split(',').filter(|s| !s.is_empty()) {
				decode_segment(segment, &mut fields)?;

				generated_column += fields[0];
				let generated_column =
					absolute(generated_column, generated_line, "negative generated column")?;

				let original = match fields.len() {
					1 => None,
					4 | 5 => {
						source += fields[1];
						original_line += fields[2];
						original_column += fields[3];
						let name_index = match fields.get(4) {
							Some(delta) => {
								name += delta;
								Some(absolute(name, generated_line, "negative name index")?)
							}
							None => None,
						};
						Some(OriginalSegment {
							source_index: absolute(source, generated_line, "negative source index")?,
							line: absolute(original_line, generated_line, "negative original line")?,
							column: absolute(original_column, generated_line, "negative original column")?,
							name_index,
						})
					}
					_ => {
						return Err(SymbolicateError::InvalidMapping {
							line: generated_line,
							reason: "segment must have 1, 4 or 5 fields",
						})
					}
				};

				mappings.push(Mapping {
					generated_line,
					generated_column,
					original,
				});
			}
		}

		// Generators are not required to emit segments in column order.
		mappings.sort_by_key(|m| (m.generated_line, m.generated_column));

		Ok(Self { mappings })
	}

	/// Find the segment at or immediately before `column` on generated
	/// `line` (both 0-indexed). Segments on earlier lines never match.
	pub fn segment_at(&self, line: u32, column: u32) -> Option<&Mapping> {
		let start = self.mappings.partition_point(|m| m.generated_line < line);
		let end = self.mappings.partition_point(|m| m.generated_line <= line);
		let on_line = &self.mappings[start..end];

		let idx = on_line.partition_point(|m| m.generated_column <= column);
		idx.checked_sub(1).map(|i| &on_line[i])
	}

	/// Original position for a generated location, or `None` when the
	/// nearest preceding segment is missing or unmapped.
	pub fn lookup(&self, line: u32, column: u32) -> Option<&OriginalSegment> {
		self.segment_at(line, column)?.original.as_ref()
	}

	pub fn len(&self) -> usize {
		self.mappings.len()
	}

	pub fn is_empty(&self) -> bool {
		self.mappings.is_empty()
	}
}

fn absolute(value: i64, line: u32, reason: &'static str) -> Result<u32> {
	u32::try_from(value).map_err(|_| SymbolicateError::InvalidMapping { line, reason })
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn decode(segment: &str) -> Result<Vec<i64>> {
		let mut out = Vec::new();
		decode_segment(segment, &mut out)?;
		Ok(out)
	}

	fn encode(value: i64) -> String {
		const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
		let mut vlq = if value < 0 {
			((-value as u64) << 1) | 1
		} else {
			(value as u64) << 1
		};
		let mut out = String::new();
		loop {
			let mut digit = (vlq & 0b1_1111) as usize;
			vlq >>= 5;
			if vlq > 0 {
				digit |= 0b10_0000;
			}
			out.push(ALPHABET[digit] as char);
			if vlq == 0 {
				return out;
			}
		}
	}

	#[test]
	fn decodes_single_digits() {
		assert_eq!(decode("A").unwrap(), vec![0]);
		assert_eq!(decode("C").unwrap(), vec![1]);
		assert_eq!(decode("D").unwrap(), vec![-1]);
		assert_eq!(decode("AACA").unwrap(), vec![0, 0, 1, 0]);
	}

	#[test]
	fn decodes_continuation_digits() {
		assert_eq!(decode("gB").unwrap(), vec![16]);
		assert_eq!(decode("kDAyCU").unwrap(), vec![50, 0, 41, 10]);
		assert_eq!(decode("hC").unwrap(), vec![-32]);
	}

	#[test]
	fn rejects_bad_input() {
		assert!(matches!(decode("!"), Err(SymbolicateError::InvalidVlqChar('!'))));
		assert!(matches!(decode("g"), Err(SymbolicateError::UnterminatedVlq)));
		assert!(matches!(
			decode("gggggggggA"),
			Err(SymbolicateError::VlqOverflow)
		));
	}

	#[test]
	fn fields_carry_over_between_lines() {
		let index = MappingIndex::decode("AAAA;AACA,EAAE").unwrap();
		assert_eq!(index.len(), 3);

		let second = index.lookup(1, 0).unwrap();
		assert_eq!(second.line, 1);
		assert_eq!(second.column, 0);

		let third = index.segment_at(1, 2).unwrap();
		assert_eq!(third.generated_column, 2);
		let original = third.original.unwrap();
		assert_eq!(original.line, 1);
		assert_eq!(original.column, 2);
	}

	#[test]
	fn lookup_uses_nearest_preceding_column() {
		// columns 0, 10, 20 on line 0
		let index = MappingIndex::decode("AAAA,UACK,UACK").unwrap();

		assert_eq!(index.segment_at(0, 5).unwrap().generated_column, 0);
		assert_eq!(index.segment_at(0, 10).unwrap().generated_column, 10);
		assert_eq!(index.lookup(0, 15).unwrap().line, 1);
		assert_eq!(index.segment_at(0, 999).unwrap().generated_column, 20);
	}

	#[test]
	fn lookup_does_not_cross_lines() {
		let index = MappingIndex::decode("UAAA;;AACA").unwrap();
		// line 0 starts mapping at column 10
		assert!(index.lookup(0, 3).is_none());
		// line 1 has no segments
		assert!(index.lookup(1, 50).is_none());
		assert!(index.lookup(7, 0).is_none());
	}

	#[test]
	fn unmapped_segments_are_kept() {
		let index = MappingIndex::decode("A,CAAA").unwrap();
		assert_eq!(index.len(), 2);
		assert!(index.segment_at(0, 0).unwrap().original.is_none());
		assert!(index.lookup(0, 0).is_none());
		assert_eq!(index.lookup(0, 1).unwrap().source_index, 0);
	}

	#[test]
	fn unmapped_segment_ends_preceding_mapping() {
		// mapped at column 0, unmapped from column 10
		let index = MappingIndex::decode("AAAA,U").unwrap();
		assert_eq!(index.lookup(0, 9).unwrap().column, 0);
		assert!(index.lookup(0, 10).is_none());
		assert!(index.lookup(0, 15).is_none());
	}

	#[test]
	fn invalid_field_counts_are_rejected() {
		assert!(matches!(
			MappingIndex::decode("AA"),
			Err(SymbolicateError::InvalidMapping { line: 0, .. })
		));
		assert!(MappingIndex::decode("AAAD").is_err());
	}

	#[test]
	fn names_are_tracked() {
		let index = MappingIndex::decode("AAAAA,CAAAC").unwrap();
		assert_eq!(index.lookup(0, 0).unwrap().name_index, Some(0));
		assert_eq!(index.lookup(0, 1).unwrap().name_index, Some(1));
	}

	proptest! {
		#[test]
		fn decode_inverts_encode(values in prop::collection::vec(-1_000_000i64..1_000_000, 1..6)) {
			let segment: String = values.iter().map(|&v| encode(v)).collect();
			prop_assert_eq!(decode(&segment).unwrap(), values);
		}
	}
}
