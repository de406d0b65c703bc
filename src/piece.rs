// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Pieces and per-piece move generation.
//!
//! A piece knows how it moves but not where the other pieces are, so every
//! generator takes the `Board` it should consult for occupancy. The moves
//! produced here respect the movement rules and the "can't land on a friend"
//! rule only; whether a move leaves the mover's king exposed is decided by
//! the check simulation in `Board`.
use std::fmt;

use arrayvec::ArrayVec;

use crate::board::Board;
use crate::cell::Cell;
use crate::coord::Coordinate;
use crate::types::{PieceKind, Team};

/// A queen in the middle of an empty board has 27 moves, the most any piece
/// can have.
pub type MoveVec = ArrayVec<Cell, 32>;

/// Index of a piece in its board's piece arena. Stable for the life of the
/// board, including after the piece is captured.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PieceId(pub(crate) usize);

impl PieceId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Piece {
    id: PieceId,
    team: Team,
    kind: PieceKind,
    cell: Cell,
    captured: bool,
}

const ORTHOGONALS: [Coordinate; 4] = [
    Coordinate::new(1, 0),
    Coordinate::new(-1, 0),
    Coordinate::new(0, -1),
    Coordinate::new(0, 1),
];

const DIAGONALS: [Coordinate; 4] = [
    Coordinate::new(-1, -1),
    Coordinate::new(1, -1),
    Coordinate::new(1, 1),
    Coordinate::new(-1, 1),
];

const KNIGHT_JUMPS: [Coordinate; 8] = [
    Coordinate::new(1, 2),
    Coordinate::new(2, 1),
    Coordinate::new(-1, 2),
    Coordinate::new(-2, 1),
    Coordinate::new(1, -2),
    Coordinate::new(2, -1),
    Coordinate::new(-1, -2),
    Coordinate::new(-2, -1),
];

const KING_STEPS: [Coordinate; 8] = [
    Coordinate::new(1, 0),
    Coordinate::new(1, 1),
    Coordinate::new(0, 1),
    Coordinate::new(-1, 1),
    Coordinate::new(-1, 0),
    Coordinate::new(-1, -1),
    Coordinate::new(0, -1),
    Coordinate::new(1, -1),
];

impl Piece {
    /// Panics if `team` is `Team::None`.
    pub(crate) fn new(id: PieceId, team: Team, kind: PieceKind, cell: Cell) -> Piece {
        assert!(!team.is_none(), "a piece must belong to White or Black");
        Piece {
            id,
            team,
            kind,
            cell,
            captured: false,
        }
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Where the piece stands. For a captured piece this is where it was
    /// taken, and nothing treats that cell as occupied.
    pub fn cell(&self) -> Cell {
        self.cell
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// FEN letter for this piece.
    pub fn symbol(&self) -> char {
        self.kind.symbol(self.team)
    }

    pub(crate) fn set_cell(&mut self, cell: Cell) {
        self.cell = cell;
    }

    pub(crate) fn set_captured(&mut self, captured: bool) {
        self.captured = captured;
    }

    pub(crate) fn set_kind(&mut self, kind: PieceKind) {
        self.kind = kind;
    }
}

//
// Move generation
//

impl Piece {
    /// Every cell this piece can move to under its movement rule, before
    /// check safety is considered. Captured pieces have no moves.
    pub fn legal_moves(&self, board: &Board) -> MoveVec {
        let mut moves = MoveVec::new();
        if self.captured {
            return moves;
        }

        match self.kind {
            PieceKind::Pawn => self.pawn_moves(board, &mut moves),
            PieceKind::Rook => self.slide(board, &ORTHOGONALS, &mut moves),
            PieceKind::Bishop => self.slide(board, &DIAGONALS, &mut moves),
            PieceKind::Queen => {
                self.slide(board, &ORTHOGONALS, &mut moves);
                self.slide(board, &DIAGONALS, &mut moves);
            }
            PieceKind::Knight => self.step(board, &KNIGHT_JUMPS, &mut moves),
            PieceKind::King => self.step(board, &KING_STEPS, &mut moves),
        }

        moves
    }

    pub fn can_reach(&self, board: &Board, cell: Cell) -> bool {
        self.legal_moves(board).contains(&cell)
    }

    /// Whether this piece may finish a move on `cell`: the cell must be on the
    /// board and must not hold a piece of the same team.
    pub fn move_filter(&self, board: &Board, cell: Option<Cell>) -> bool {
        let cell = match cell {
            Some(cell) => cell,
            None => return false,
        };

        match board.piece_at(cell) {
            Some(other) => other.team != self.team,
            None => true,
        }
    }

    fn pawn_moves(&self, board: &Board, moves: &mut MoveVec) {
        let forward = self.team.forward();

        // Pushes never capture, and the double step needs both cells empty.
        if let Some(one) = self.cell.offset(Coordinate::new(0, forward)) {
            if board.piece_at(one).is_none() {
                moves.push(one);
                if self.cell.y() == self.team.pawn_row() {
                    if let Some(two) = one.offset(Coordinate::new(0, forward)) {
                        if board.piece_at(two).is_none() {
                            moves.push(two);
                        }
                    }
                }
            }
        }

        for &dx in &[-1, 1] {
            if let Some(target) = self.cell.offset(Coordinate::new(dx, forward)) {
                let enemy = board
                    .piece_at(target)
                    .map_or(false, |other| other.team != self.team);
                if enemy {
                    moves.push(target);
                }
            }
        }
    }

    fn slide(&self, board: &Board, directions: &[Coordinate], moves: &mut MoveVec) {
        for &dir in directions {
            let mut next = self.cell.offset(dir);
            while let Some(cell) = next {
                if let Some(blocker) = board.piece_at(cell) {
                    if blocker.team != self.team {
                        moves.push(cell);
                    }
                    break;
                }

                moves.push(cell);
                next = cell.offset(dir);
            }
        }
    }

    fn step(&self, board: &Board, offsets: &[Coordinate], moves: &mut MoveVec) {
        for &offset in offsets {
            let target = self.cell.offset(offset);
            if self.move_filter(board, target) {
                moves.extend(target);
            }
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.team, self.kind)
    }
}
