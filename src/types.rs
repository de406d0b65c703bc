// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use num_traits::{FromPrimitive, ToPrimitive};
use std::convert::TryFrom;
use std::fmt::{self, Display};

// TableIndex is a trait for all types that can serve as an index into a table.
// It is common to use these types as indices into tables, so this trait allows
// any type implementing To and FromPrimitive to be used as table indices.
pub trait TableIndex {
    fn as_index(self) -> usize;
    fn from_index(idx: usize) -> Self;
}

impl<T> TableIndex for T
where
    T: FromPrimitive + ToPrimitive,
{
    fn as_index(self) -> usize {
        self.to_u32().unwrap() as usize
    }

    fn from_index(idx: usize) -> T {
        <T as FromPrimitive>::from_u64(idx as u64).unwrap()
    }
}

/// A side of the board. `Team::None` is the answer to questions like "which
/// team is in check?" when the answer is nobody; no piece ever belongs to it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    None,
    White,
    Black,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::White => Team::Black,
            Team::Black => Team::White,
            Team::None => Team::None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Team::None
    }

    /// The y step a pawn of this team takes when it advances. White starts at
    /// the bottom of the grid (high y) and moves up.
    pub fn forward(self) -> i32 {
        match self {
            Team::White => -1,
            Team::Black => 1,
            Team::None => 0,
        }
    }

    /// Row the team's pawns start on, and the only row they may double-step from.
    pub fn pawn_row(self) -> i32 {
        match self {
            Team::White => 6,
            Team::Black => 1,
            Team::None => -1,
        }
    }

    /// Row on which this team's pawns promote.
    pub fn promotion_row(self) -> i32 {
        match self {
            Team::White => 0,
            Team::Black => 7,
            Team::None => -1,
        }
    }
}

impl Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Team::White => "white",
            Team::Black => "black",
            Team::None => "none",
        };
        f.write_str(name)
    }
}

/// The two teams that actually play, in the order check detection visits them.
pub static TEAMS: [Team; 2] = [Team::White, Team::Black];

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}

const PIECE_VALUES: [u32; 6] = [1, 5, 3, 3, 9, 0];
const PIECE_SYMBOLS: [char; 6] = ['p', 'r', 'n', 'b', 'q', 'k'];

impl PieceKind {
    /// Conventional material value. Kings are priceless and count as zero.
    pub fn value(self) -> u32 {
        PIECE_VALUES[self.as_index()]
    }

    pub fn is_sliding(self) -> bool {
        match self {
            PieceKind::Rook | PieceKind::Bishop | PieceKind::Queen => true,
            _ => false,
        }
    }

    /// Kinds a pawn may turn into on the far rank.
    pub fn can_promote_to(self) -> bool {
        match self {
            PieceKind::Pawn | PieceKind::King => false,
            _ => true,
        }
    }

    /// The kind pawns become when nobody chooses for them: the most valuable
    /// kind a pawn can promote to.
    pub fn promotion_target() -> PieceKind {
        PIECE_KINDS
            .iter()
            .copied()
            .filter(|kind| kind.can_promote_to())
            .max_by_key(|kind| kind.value())
            .unwrap_or(PieceKind::Queen)
    }

    /// FEN letter for this kind, uppercase for White.
    pub fn symbol(self, team: Team) -> char {
        let chr = PIECE_SYMBOLS[self.as_index()];
        if team == Team::White {
            chr.to_ascii_uppercase()
        } else {
            chr
        }
    }
}

impl Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Rook => "rook",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        };
        f.write_str(name)
    }
}

/// Parses a FEN piece letter without regard to case. The team a letter
/// denotes is read off its case by the caller.
impl TryFrom<char> for PieceKind {
    type Error = ();

    fn try_from(value: char) -> Result<Self, Self::Error> {
        let lower = value.to_ascii_lowercase();
        PIECE_SYMBOLS
            .iter()
            .position(|&sym| sym == lower)
            .map(PieceKind::from_index)
            .ok_or(())
    }
}

pub static PIECE_KINDS: [PieceKind; 6] = [
    PieceKind::Pawn,
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
];
