//! Conway's Game of Life (B3/S23) on packed 4x4 blocks.
//!
//! A block is stored in a `u16`, one bit per cell, with cell `(row, col)` at bit `row * 4 + col`.
//! ```notrust
//!  0  1  2  3
//!  4  5  6  7
//!  8  9 10 11
//! 12 13 14 15
//! ```
//! Only the four inner cells (bits 5, 6, 9 and 10) have a full neighbourhood inside the block,
//! so those are the ones a step computes.

/// Neighbourhood of the cell at bit 5
const NBHD_MASK: u16 = 0b0000_0111_0101_0111;

/// The cell at bit 5
const CELL_MASK: u16 = 0b0000_0000_0010_0000;

/// Shifts moving bit 5 onto the inner `nw, ne, sw, se` cells
const INNER_SHIFTS: [u32; 4] = [0, 1, 4, 5];

/// Neighbour counts giving birth, one bit per count
const BIRTHS: u16 = 1 << 3;

/// Neighbour counts allowing survival, one bit per count
const SURVIVALS: u16 = 1 << 2 | 1 << 3;

/// Whether a cell is alive next generation, given whether it is alive now and how many of its
/// eight neighbours are.
pub const fn next_state(alive: bool, neighbours: u32) -> bool {
    let rule = if alive { SURVIVALS } else { BIRTHS };

    neighbours < 9 && rule & (1 << neighbours) != 0
}

/// Mask of cell `(row, col)` in a block
pub const fn bit(row: usize, col: usize) -> u16 {
    1 << (row * 4 + col)
}

/// Step the inner 2x2 cells of a block by one generation.
///
/// Returns the next state of the inner cells in `nw, ne, sw, se` order.
pub fn step_block(block: u16) -> [bool; 4] {
    INNER_SHIFTS.map(|shift| {
        let alive = block & (CELL_MASK << shift) != 0;
        let neighbours = (block & (NBHD_MASK << shift)).count_ones();

        next_state(alive, neighbours)
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn block(rows: [&str; 4]) -> u16 {
        let mut b = 0;

        for (row, line) in rows.iter().enumerate() {
            for (col, c) in line.chars().enumerate() {
                if c == '1' {
                    b |= bit(row, col);
                }
            }
        }

        b
    }

    #[test]
    fn conway_rule() {
        for n in 0..=8 {
            assert_eq!(next_state(false, n), n == 3, "birth with {n}");
            assert_eq!(next_state(true, n), n == 2 || n == 3, "survival with {n}");
        }
    }

    #[test]
    fn masks_cover_the_neighbourhood_of_bit_5() {
        assert_eq!(CELL_MASK, bit(1, 1));
        assert_eq!(NBHD_MASK.count_ones(), 8);
        assert_eq!(NBHD_MASK & CELL_MASK, 0);
    }

    #[test]
    fn vertical_blinker_turns() {
        let b = block(["0000", "0100", "0100", "0100"]);

        assert_eq!(step_block(b), [false, false, true, true]);
    }

    #[test]
    fn block_still_life() {
        let b = block(["0000", "0110", "0110", "0000"]);

        assert_eq!(step_block(b), [true; 4]);
    }

    #[test]
    fn empty_and_full() {
        assert_eq!(step_block(0), [false; 4]);

        // Every inner cell has eight neighbours
        assert_eq!(step_block(u16::MAX), [false; 4]);
    }
}
