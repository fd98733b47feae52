//! Canonical keys for board positions, and the move-sequence text format
//!
//! A grid is read row-major, top-to-bottom then left-to-right, as the digits
//! of a base-3 number (empty 0, player one 1, player two 2). The key is that
//! number written out in [`KEY_RADIX`]. A position and its left-right mirror
//! image share one canonical key: whichever of the two strings sorts first
//! once both are zero-padded to the same length.

use crate::error::{EngineError, MoveRejection};
use crate::grid::{Grid, Player};

/// Radix of the rendered keys
pub const KEY_RADIX: u32 = 16;

/// Longest key accepted, in digits of the output radix
pub const MAX_KEY_LENGTH: usize = 512;

/// Unsigned big integer, 32-bit limbs stored least significant first
#[derive(Clone, Debug, Default)]
struct BigNat {
    limbs: Vec<u32>,
}

impl BigNat {
    fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&limb| limb == 0)
    }

    /// self = self * mul + add
    fn mul_add(&mut self, mul: u32, add: u32) {
        let mut carry = add as u64;
        for limb in self.limbs.iter_mut() {
            let value = *limb as u64 * mul as u64 + carry;
            *limb = value as u32;
            carry = value >> 32;
        }
        if carry != 0 {
            self.limbs.push(carry as u32);
        }
    }

    /// self = self / divisor, returning the remainder
    fn div_rem(&mut self, divisor: u32) -> u32 {
        let mut remainder = 0u64;
        for limb in self.limbs.iter_mut().rev() {
            let value = (remainder << 32) | *limb as u64;
            *limb = (value / divisor as u64) as u32;
            remainder = value % divisor as u64;
        }
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
        remainder as u32
    }

    /// Uppercase digits, most significant first, with no leading zeros
    fn to_radix_string(&self, radix: u32) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        let mut value = self.clone();
        let mut digits = Vec::new();
        while !value.is_zero() {
            let digit = value.div_rem(radix);
            // radix is checked by the caller, so every remainder is a valid digit
            if let Some(c) = std::char::from_digit(digit, radix) {
                digits.push(c.to_ascii_uppercase());
            }
        }
        digits.iter().rev().collect()
    }
}

/// Encodes `grid` as a [`KEY_RADIX`] key
pub fn encode(grid: &Grid) -> Result<String, EngineError> {
    encode_radix(grid, KEY_RADIX)
}

/// Encodes `grid` in any radix from 2 to 36
pub fn encode_radix(grid: &Grid, radix: u32) -> Result<String, EngineError> {
    if !(2..=36).contains(&radix) {
        return Err(EngineError::UnsupportedRadix(radix));
    }
    let mut value = BigNat::default();
    for cell in grid.cells() {
        value.mul_add(3, cell.digit() as u32);
    }

    let key = value.to_radix_string(radix);
    if key.len() > MAX_KEY_LENGTH {
        return Err(EngineError::EncodingOverflow {
            length: key.len(),
            limit: MAX_KEY_LENGTH,
        });
    }
    Ok(key)
}

/// The grid reflected left to right
pub fn mirror(grid: &Grid) -> Grid {
    let cols = grid.cols();
    Grid::from_fn(grid.rows(), cols, |row, column| {
        grid.get(row, cols - 1 - column)
    })
}

/// A position's storage key, with the key of its mirror image
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CanonicalKey {
    pub key: String,
    pub alternate: String,
}

/// Orders two keys of mirror-image positions, the smaller becoming canonical
///
/// Keys are compared after left-padding with `'0'` to the same length. If they
/// are equal the first argument is kept as canonical.
pub fn canonicalize(a: String, b: String) -> CanonicalKey {
    let width = a.len().max(b.len());
    let padded_a = format!("{:0>width$}", a, width = width);
    let padded_b = format!("{:0>width$}", b, width = width);

    if padded_a <= padded_b {
        CanonicalKey { key: a, alternate: b }
    } else {
        CanonicalKey { key: b, alternate: a }
    }
}

/// Canonical key of `grid` and its mirror image
pub fn canonical_key(grid: &Grid) -> Result<CanonicalKey, EngineError> {
    Ok(canonicalize(encode(grid)?, encode(&mirror(grid))?))
}

/// Rebuilds a grid from 0-indexed columns, players alternating from player one
pub fn replay(moves: &[usize], rows: usize, cols: usize) -> Result<Grid, EngineError> {
    let mut grid = Grid::new(rows, cols);
    let mut player = Player::One;

    for &column in moves {
        if column >= cols {
            return Err(EngineError::InvalidMove {
                column: column + 1,
                reason: MoveRejection::OutOfRange,
            });
        }
        if grid.drop(column, player).is_none() {
            return Err(EngineError::InvalidMove {
                column: column + 1,
                reason: MoveRejection::ColumnFull,
            });
        }
        player = player.other();
    }
    Ok(grid)
}

/// Parses a move sequence for a board `cols` wide into 0-indexed columns
///
/// Boards of up to nine columns take one 1-based digit per move
/// (`"4534621"`). Wider boards take 1-based numbers separated by commas
/// (`"10,3,12"`), so a lone `"12"` is column 12 there and not two moves.
pub fn parse_sequence(moves: &str, cols: usize) -> Result<Vec<usize>, EngineError> {
    let moves = moves.trim();
    if moves.is_empty() {
        return Ok(Vec::new());
    }

    let invalid = |token: &str| EngineError::InvalidSequence(format!("could not parse '{}' as a valid move", token));
    if cols > 9 {
        moves
            .split(',')
            .map(|token| match token.trim().parse::<usize>() {
                Ok(column @ 1..) => Ok(column - 1),
                _ => Err(invalid(token)),
            })
            .collect()
    } else {
        moves
            .chars()
            .map(|c| match c.to_digit(10) {
                Some(column @ 1..=9) => Ok(column as usize - 1),
                _ => Err(invalid(&c.to_string())),
            })
            .collect()
    }
}

/// Renders 0-indexed columns in the form [`parse_sequence`] reads for a board `cols` wide
pub fn format_sequence(moves: &[usize], cols: usize) -> String {
    let columns = moves.iter().map(|column| (column + 1).to_string());
    if cols <= 9 {
        columns.collect()
    } else {
        columns.collect::<Vec<_>>().join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_nat_radix_conversion() {
        let mut value = BigNat::default();
        assert_eq!(value.to_radix_string(16), "0");

        value.mul_add(1, 255);
        assert_eq!(value.to_radix_string(16), "FF");
        assert_eq!(value.to_radix_string(2), "11111111");

        // 2^32 crosses into a second limb
        let mut value = BigNat::default();
        value.mul_add(1, 1);
        value.mul_add(u32::MAX, 0);
        value.mul_add(1, 1);
        assert_eq!(value.to_radix_string(16), "100000000");
        assert_eq!(value.to_radix_string(10), "4294967296");
    }

    #[test]
    fn unsupported_radix() {
        let grid = Grid::new(2, 2);
        assert_eq!(encode_radix(&grid, 1), Err(EngineError::UnsupportedRadix(1)));
        assert_eq!(encode_radix(&grid, 37), Err(EngineError::UnsupportedRadix(37)));
    }

    #[test]
    fn oversized_grid_overflows() {
        // 3^1024 needs well over 512 binary digits
        let grid = Grid::from_fn(32, 32, |_, _| Player::Two.cell());
        match encode_radix(&grid, 2) {
            Err(EngineError::EncodingOverflow { limit, .. }) => assert_eq!(limit, MAX_KEY_LENGTH),
            other => panic!("expected overflow, got {:?}", other),
        }
        assert!(encode(&grid).is_ok());
    }

    #[test]
    fn padded_comparison() {
        let key = canonicalize("FF".to_string(), "100".to_string());
        assert_eq!(key.key, "FF");
        assert_eq!(key.alternate, "100");

        let key = canonicalize("A0".to_string(), "0A".to_string());
        assert_eq!(key.key, "0A");
    }

    #[test]
    fn sequence_formats() {
        assert_eq!(parse_sequence("4534621", 9).unwrap(), vec![3, 4, 2, 3, 5, 1, 0]);
        assert_eq!(parse_sequence("10, 3,12", 12).unwrap(), vec![9, 2, 11]);
        assert_eq!(parse_sequence("", 12).unwrap(), Vec::<usize>::new());
        assert!(parse_sequence("450", 9).is_err());
        assert!(parse_sequence("4a", 9).is_err());
        assert!(parse_sequence("1,,2", 12).is_err());
        assert!(parse_sequence("1,2", 9).is_err());

        // the board width picks the form, not the text
        assert_eq!(parse_sequence("12", 12).unwrap(), vec![11]);
        assert_eq!(parse_sequence("12", 9).unwrap(), vec![0, 1]);

        assert_eq!(format_sequence(&[3, 4, 2], 9), "453");
        assert_eq!(format_sequence(&[9, 2, 11], 12), "10,3,12");
        assert_eq!(format_sequence(&[9], 12), "10");
    }
}
