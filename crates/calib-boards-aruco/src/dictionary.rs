//! Dictionary metadata and packed marker codes.

use serde::Serialize;

/// A fixed ArUco-style dictionary.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Dictionary {
    /// Human-readable name, also used to look the dictionary up by config.
    pub name: &'static str,
    /// Marker side length (number of inner bits per side).
    pub marker_size: usize,
    /// Maximum error-correcting Hamming distance supported by the dictionary.
    pub max_correction_bits: u8,
    /// One `u64` per marker id, encoding the inner `marker_size × marker_size` bits.
    ///
    /// Bit `row * marker_size + col` (LSB first) holds the cell at `(row, col)`,
    /// set bits are **white**, matching the OpenCV rendering convention.
    #[serde(skip)]
    pub codes: &'static [u64],
}

impl Dictionary {
    /// Total number of inner bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    /// Number of distinct marker ids.
    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Whether inner cell `(row, col)` of marker `id` is white.
    ///
    /// Returns `None` for unknown ids or out-of-range cells.
    pub fn is_white(&self, id: u32, row: usize, col: usize) -> Option<bool> {
        if row >= self.marker_size || col >= self.marker_size {
            return None;
        }
        let code = *self.codes.get(id as usize)?;
        let bit = row * self.marker_size + col;
        Some((code >> bit) & 1 == 1)
    }
}

#[cfg(test)]
mod tests {
    use crate::builtins;

    #[test]
    fn first_marker_matches_opencv_bit_pattern() {
        let dict = builtins::builtin_dictionary("DICT_4X4_50").expect("dict");
        // OpenCV DICT_4X4_50 id 0, rows top to bottom, 1 = white.
        let expected = [[1, 0, 1, 1], [0, 1, 0, 1], [0, 0, 1, 1], [0, 0, 1, 0]];
        for (row, bits) in expected.iter().enumerate() {
            for (col, &bit) in bits.iter().enumerate() {
                assert_eq!(dict.is_white(0, row, col), Some(bit == 1), "({row}, {col})");
            }
        }
    }

    #[test]
    fn out_of_range_access_is_none() {
        let dict = builtins::builtin_dictionary("DICT_4X4_50").expect("dict");
        assert_eq!(dict.is_white(50, 0, 0), None);
        assert_eq!(dict.is_white(0, 4, 0), None);
        assert_eq!(dict.bit_count(), 16);
    }
}
