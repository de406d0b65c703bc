// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Squares of the 8x8 board.
//!
//! A `Cell` is a `Coordinate` that is known to lie on the board. Row 0 is
//! Black's back rank (rank 8) and row 7 is White's (rank 1), so the algebraic
//! name of a cell is `'a' + x` followed by `8 - y`.
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::coord::Coordinate;
use crate::error::CellParseError;

pub const BOARD_SIZE: i32 = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    coord: Coordinate,
}

impl Cell {
    /// Returns the cell at `(x, y)`, or `None` if that point is off the board.
    pub fn new(x: i32, y: i32) -> Option<Cell> {
        Cell::from_coordinate(Coordinate::new(x, y))
    }

    pub fn from_coordinate(coord: Coordinate) -> Option<Cell> {
        if (0..BOARD_SIZE).contains(&coord.x) && (0..BOARD_SIZE).contains(&coord.y) {
            Some(Cell { coord })
        } else {
            None
        }
    }

    pub fn x(self) -> i32 {
        self.coord.x
    }

    pub fn y(self) -> i32 {
        self.coord.y
    }

    pub fn coordinate(self) -> Coordinate {
        self.coord
    }

    /// The cell `by` away from this one. `None` means the edge of the board is
    /// in the way, which move generation treats as a blocked direction.
    pub fn offset(self, by: Coordinate) -> Option<Cell> {
        Cell::from_coordinate(self.coord + by)
    }

    pub fn notation(self) -> String {
        self.to_string()
    }

    /// Every cell on the board, row by row from the top-left.
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..BOARD_SIZE)
            .flat_map(|y| (0..BOARD_SIZE).map(move |x| Cell::new(x, y)))
            .flatten()
    }
}

impl From<Cell> for Coordinate {
    fn from(cell: Cell) -> Coordinate {
        cell.coord
    }
}

impl PartialEq<Coordinate> for Cell {
    fn eq(&self, other: &Coordinate) -> bool {
        self.coord == *other
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let file = (b'a' + self.x() as u8) as char;
        write!(f, "{}{}", file, BOARD_SIZE - self.y())
    }
}

/// Parses algebraic notation such as `e4`. The file letter may be given in
/// either case.
impl FromStr for Cell {
    type Err = CellParseError;

    fn from_str(s: &str) -> Result<Cell, CellParseError> {
        let chrs: Vec<char> = s.chars().collect();
        if chrs.len() != 2 {
            return Err(CellParseError::Length(s.to_owned()));
        }

        let file = chrs[0].to_ascii_lowercase();
        if !('a'..='h').contains(&file) {
            return Err(CellParseError::InvalidFile(chrs[0]));
        }

        let rank = match chrs[1].to_digit(10) {
            Some(rank) if (1..=8).contains(&rank) => rank as i32,
            _ => return Err(CellParseError::InvalidRank(chrs[1])),
        };

        let x = file as i32 - 'a' as i32;
        Cell::new(x, BOARD_SIZE - rank).ok_or_else(|| CellParseError::Length(s.to_owned()))
    }
}

// Cells go over the wire in the one textual form collaborators agree on.
impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
