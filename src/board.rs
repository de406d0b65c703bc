// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The board and the piece arena it owns.
//!
//! Pieces live in a vector of slots and are referred to by `PieceId`, which
//! is the slot index. Captured pieces stay in their slot with the captured
//! flag set, so ids handed out in events remain meaningful for the rest of
//! the game. At most one uncaptured piece stands on any cell; that is kept
//! true by move validation in `Game`, not by the board.
//!
//! The board also answers the check questions the game needs. Those are
//! answered by trying a move on the board itself and undoing it afterwards,
//! which is why they take `&mut self` even though they leave the board as
//! they found it. A tried piece is only relocated: whatever stood on its
//! destination keeps its captured flag and is simply overrun, hidden behind
//! the tried piece until the trial is rolled back.
use std::convert::TryFrom;
use std::fmt;
use std::fmt::Write;

use crate::cell::{Cell, BOARD_SIZE};
use crate::coord::Coordinate;
use crate::error::FenParseError;
use crate::piece::{MoveVec, Piece, PieceId};
use crate::types::{PieceKind, Team, TEAMS};

/// Piece placement of a fresh game, in FEN.
pub const STARTING_PLACEMENT: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

lazy_static! {
    static ref STARTING_BOARD: Board =
        Board::from_placement(STARTING_PLACEMENT).expect("starting placement is valid FEN");
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Board {
    slots: Vec<Option<Piece>>,
    tried: Option<PieceId>,
}

/// A move tried out on the board. Holds what is needed to put things back.
#[must_use]
struct Trial {
    mover: PieceId,
    from: Cell,
    victim: Option<PieceId>,
}

//
// Setup
//

impl Board {
    /// The standard starting layout: 32 pieces, White on rows 6 and 7.
    pub fn new() -> Board {
        STARTING_BOARD.clone()
    }

    pub fn empty() -> Board {
        Board {
            slots: Vec::new(),
            tried: None,
        }
    }

    /// Builds a board from the piece placement field of a FEN string.
    pub fn from_placement<S: AsRef<str>>(placement: S) -> Result<Board, FenParseError> {
        use std::iter::Peekable;
        use std::str::Chars;

        type Stream<'a> = Peekable<Chars<'a>>;

        fn eat<'a>(iter: &mut Stream<'a>, expected: char) -> Result<(), FenParseError> {
            match iter.next() {
                Some(c) if c == expected => Ok(()),
                Some(c) => Err(FenParseError::UnexpectedChar(c)),
                None => Err(FenParseError::UnexpectedEnd),
            }
        }

        fn advance<'a>(iter: &mut Stream<'a>) {
            let _ = iter.next();
        }

        fn peek<'a>(iter: &mut Stream<'a>) -> Result<char, FenParseError> {
            if let Some(c) = iter.peek() {
                Ok(*c)
            } else {
                Err(FenParseError::UnexpectedEnd)
            }
        }

        let mut board = Board::empty();
        let iter = &mut placement.as_ref().chars().peekable();
        for y in 0..BOARD_SIZE {
            let mut x = 0;
            while x < BOARD_SIZE {
                let c = peek(iter)?;
                // digits 1 through 8 indicate empty cells.
                if c.is_digit(10) {
                    if c < '1' || c > '8' {
                        return Err(FenParseError::InvalidDigit);
                    }

                    x += c as i32 - '0' as i32;
                    if x > BOARD_SIZE {
                        return Err(FenParseError::FileDoesNotSumToEight);
                    }

                    advance(iter);
                    continue;
                }

                if c == '/' {
                    return Err(FenParseError::FileDoesNotSumToEight);
                }

                let kind = PieceKind::try_from(c).map_err(|_| FenParseError::UnknownPiece)?;
                let team = if c.is_ascii_uppercase() {
                    Team::White
                } else {
                    Team::Black
                };

                let cell = Cell::new(x, y).ok_or(FenParseError::FileDoesNotSumToEight)?;
                board.add(team, kind, cell);
                advance(iter);
                x += 1;
            }

            if y != BOARD_SIZE - 1 {
                eat(iter, '/')?;
            }
        }

        if let Some(c) = iter.next() {
            return Err(FenParseError::UnexpectedChar(c));
        }

        Ok(board)
    }

    /// The piece placement field of FEN for this board.
    pub fn placement(&self) -> String {
        let mut buf = String::new();
        for y in 0..BOARD_SIZE {
            let mut empty_cells = 0;
            for cell in (0..BOARD_SIZE).filter_map(|x| Cell::new(x, y)) {
                if let Some(piece) = self.piece_at(cell) {
                    if empty_cells != 0 {
                        write!(&mut buf, "{}", empty_cells).unwrap();
                    }
                    buf.push(piece.symbol());
                    empty_cells = 0;
                } else {
                    empty_cells += 1;
                }
            }

            if empty_cells != 0 {
                write!(&mut buf, "{}", empty_cells).unwrap();
            }

            if y != BOARD_SIZE - 1 {
                buf.push('/');
            }
        }

        buf
    }

    /// Places a new piece and returns its id. Panics if `team` is `Team::None`.
    pub fn add(&mut self, team: Team, kind: PieceKind, cell: Cell) -> PieceId {
        let id = PieceId(self.slots.len());
        self.slots.push(Some(Piece::new(id, team, kind, cell)));
        id
    }

    /// Takes a piece out of the arena altogether. Its id is never reused.
    pub fn remove(&mut self, id: PieceId) -> Option<Piece> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }
}

//
// Queries
//

impl Board {
    /// The cell at `(x, y)`, if that is on the board.
    pub fn at(&self, x: i32, y: i32) -> Option<Cell> {
        Cell::new(x, y)
    }

    pub fn cell<C: Into<Coordinate>>(&self, coord: C) -> Option<Cell> {
        Cell::from_coordinate(coord.into())
    }

    /// Looks a cell up by its algebraic name, such as `e4`.
    pub fn cell_by_notation(&self, notation: &str) -> Option<Cell> {
        notation.parse().ok()
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// The uncaptured piece standing at `coord`, if any.
    pub fn piece_at<C: Into<Coordinate>>(&self, coord: C) -> Option<&Piece> {
        let coord = coord.into();
        if let Some(tried) = self.tried.and_then(|id| self.piece(id)) {
            if tried.cell() == coord {
                return Some(tried);
            }
        }

        self.pieces()
            .find(|piece| !piece.is_captured() && piece.cell() == coord)
    }

    pub fn piece_id_at<C: Into<Coordinate>>(&self, coord: C) -> Option<PieceId> {
        self.piece_at(coord).map(Piece::id)
    }

    /// Every piece in the arena, captured ones included, in the order they
    /// were added.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Panics if `team` is `Team::None`.
    pub fn team_uncaptured_pieces(&self, team: Team) -> Vec<&Piece> {
        assert!(!team.is_none(), "invalid team");
        self.pieces()
            .filter(|piece| piece.team() == team && !piece.is_captured())
            .collect()
    }

    pub(crate) fn team_piece_ids(&self, team: Team) -> Vec<PieceId> {
        self.team_uncaptured_pieces(team)
            .into_iter()
            .map(Piece::id)
            .collect()
    }

    /// The movement-rule moves of a piece. Empty for captured or removed pieces.
    pub fn legal_moves(&self, id: PieceId) -> MoveVec {
        self.piece(id)
            .map_or_else(MoveVec::new, |piece| piece.legal_moves(self))
    }

    pub fn king(&self, team: Team) -> Option<&Piece> {
        self.pieces().find(|piece| {
            piece.team() == team && piece.kind() == PieceKind::King && !piece.is_captured()
        })
    }

    // Standing on the cell a tried piece has moved onto.
    fn is_overrun(&self, piece: &Piece) -> bool {
        self.tried
            .and_then(|id| self.piece(id))
            .map_or(false, |tried| {
                tried.id() != piece.id() && tried.cell() == piece.cell()
            })
    }

    fn slot_mut(&mut self, id: PieceId) -> &mut Piece {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .expect("piece id does not refer to a piece on this board")
    }
}

//
// Mutation
//
// These are how `Game` applies a move. They do not validate anything.
//

impl Board {
    pub(crate) fn capture(&mut self, id: PieceId) {
        self.slot_mut(id).set_captured(true);
    }

    pub(crate) fn relocate(&mut self, id: PieceId, cell: Cell) {
        self.slot_mut(id).set_cell(cell);
    }

    pub(crate) fn set_kind(&mut self, id: PieceId, kind: PieceKind) {
        self.slot_mut(id).set_kind(kind);
    }

    /// Moves a piece, capturing whatever stands on `to`. Returns the captured
    /// piece's id.
    pub(crate) fn play(&mut self, id: PieceId, to: Cell) -> Option<PieceId> {
        let victim = self.piece_id_at(to).filter(|&victim| victim != id);
        if let Some(victim) = victim {
            self.capture(victim);
        }

        self.relocate(id, to);
        victim
    }
}

//
// Check detection
//

impl Board {
    /// Some enemy piece that can move onto `team`'s king, if there is one.
    /// A team without a king on the board is never in check.
    pub fn checking_piece(&self, team: Team) -> Option<PieceId> {
        let target = self.king(team)?.cell();
        self.pieces()
            .filter(|piece| {
                piece.team() != team && !piece.is_captured() && !self.is_overrun(piece)
            })
            .find(|piece| piece.can_reach(self, target))
            .map(Piece::id)
    }

    /// The first team found in check, White first, together with a piece
    /// giving the check.
    pub fn in_check(&self) -> Option<(Team, PieceId)> {
        TEAMS
            .iter()
            .find_map(|&team| self.checking_piece(team).map(|attacker| (team, attacker)))
    }

    /// Relocates `id` to `to` and nothing else.
    fn try_move(&mut self, id: PieceId, to: Cell) -> Trial {
        let from = self.slot_mut(id).cell();
        self.relocate(id, to);
        self.tried = Some(id);
        Trial {
            mover: id,
            from,
            victim: None,
        }
    }

    /// Moves `id` onto `to`, capturing the piece standing there.
    fn try_capture(&mut self, id: PieceId, to: Cell) -> Trial {
        let from = self.slot_mut(id).cell();
        let victim = self.play(id, to);
        Trial {
            mover: id,
            from,
            victim,
        }
    }

    fn rollback(&mut self, trial: Trial) {
        self.tried = None;
        self.relocate(trial.mover, trial.from);
        if let Some(victim) = trial.victim {
            self.slot_mut(victim).set_captured(false);
        }
    }

    /// Whether moving `id` to `to` would leave its own team in check. No
    /// captured flag changes; a piece standing on `to` is overrun for the
    /// duration of the test.
    pub fn would_be_in_check(&mut self, id: PieceId, to: Cell) -> bool {
        let team = self.team_of(id);
        let trial = self.try_move(id, to);
        let checked = self.checking_piece(team).is_some();
        self.rollback(trial);
        trace!(
            "{} to {} {} {} in check",
            team,
            to,
            if checked { "leaves" } else { "does not leave" },
            team
        );
        checked
    }

    /// Whether moving `id` to `to` gets its team out of check. `attacker` is
    /// the piece currently giving check, if known.
    ///
    /// Taking the attacker is tried as a real capture: the attacker is off the
    /// board while the mover's king is examined, so a second piece still
    /// giving check is noticed. Any other move only resolves the check if
    /// afterwards no team at all is in check, so an evasion may not give
    /// check back.
    pub fn removes_check_on(&mut self, id: PieceId, to: Cell, attacker: Option<PieceId>) -> bool {
        let team = self.team_of(id);
        let takes_attacker = attacker
            .and_then(|attacker| self.piece(attacker))
            .map_or(false, |attacker| !attacker.is_captured() && attacker.cell() == to);
        let removes = if takes_attacker {
            let trial = self.try_capture(id, to);
            let removes = self.checking_piece(team).is_none();
            self.rollback(trial);
            removes
        } else {
            let trial = self.try_move(id, to);
            let removes = self.in_check().is_none();
            self.rollback(trial);
            removes
        };

        trace!(
            "{} to {} ({}) {} the check",
            team,
            to,
            if takes_attacker { "capture" } else { "evasion" },
            if removes { "resolves" } else { "does not resolve" }
        );
        removes
    }

    fn team_of(&self, id: PieceId) -> Team {
        self.piece(id).map_or(Team::None, Piece::team)
    }

    /// Every movement-rule move of `team` that does not leave it in check.
    pub fn check_safe_moves(&mut self, team: Team) -> Vec<(PieceId, Cell)> {
        let mut safe = Vec::new();
        for id in self.team_piece_ids(team) {
            for to in self.legal_moves(id) {
                if !self.would_be_in_check(id, to) {
                    safe.push((id, to));
                }
            }
        }

        safe
    }

    pub fn has_check_safe_move(&mut self, team: Team) -> bool {
        for id in self.team_piece_ids(team) {
            for to in self.legal_moves(id) {
                if !self.would_be_in_check(id, to) {
                    return true;
                }
            }
        }

        false
    }

    /// Whether `team`, in check from `attacker`, has any move that
    /// `removes_check_on` accepts.
    pub fn has_check_removing_move(&mut self, team: Team, attacker: Option<PieceId>) -> bool {
        for id in self.team_piece_ids(team) {
            for to in self.legal_moves(id) {
                if self.removes_check_on(id, to, attacker) {
                    return true;
                }
            }
        }

        false
    }
}

//
// Trait implementations
//

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..BOARD_SIZE {
            for cell in (0..BOARD_SIZE).filter_map(|x| Cell::new(x, y)) {
                if let Some(piece) = self.piece_at(cell) {
                    write!(f, " {} ", piece.symbol())?;
                } else {
                    write!(f, " . ")?;
                }
            }

            writeln!(f, "| {}", BOARD_SIZE - y)?;
        }

        for _ in 0..BOARD_SIZE {
            write!(f, "---")?;
        }

        writeln!(f)?;
        for file in (b'a'..=b'h').map(char::from) {
            write!(f, " {} ", file)?;
        }

        writeln!(f)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(notation: &str) -> Cell {
        notation.parse().unwrap()
    }

    #[test]
    fn starting_layout() {
        let board = Board::new();
        assert_eq!(32, board.pieces().count());
        assert_eq!(16, board.team_uncaptured_pieces(Team::White).len());
        assert_eq!(16, board.team_uncaptured_pieces(Team::Black).len());

        let king = board.piece_at(cell("e1")).unwrap();
        assert_eq!(PieceKind::King, king.kind());
        assert_eq!(Team::White, king.team());
        assert_eq!(Coordinate::new(4, 7), king.cell().coordinate());

        let queen = board.piece_at((3, 0)).unwrap();
        assert_eq!(PieceKind::Queen, queen.kind());
        assert_eq!(Team::Black, queen.team());

        for x in 0..8 {
            assert_eq!(PieceKind::Pawn, board.piece_at((x, 6)).unwrap().kind());
            assert_eq!(PieceKind::Pawn, board.piece_at((x, 1)).unwrap().kind());
            assert!(board.piece_at((x, 4)).is_none());
        }
    }

    #[test]
    fn placement_round_trip() {
        let board = Board::new();
        assert_eq!(STARTING_PLACEMENT, board.placement());

        let placement = "4r2k/8/8/3Pp3/8/8/4B3/4K3";
        assert_eq!(placement, Board::from_placement(placement).unwrap().placement());
    }

    #[test]
    fn placement_errors() {
        assert_eq!(
            Err(FenParseError::FileDoesNotSumToEight),
            Board::from_placement("54/8/8/8/8/8/8/8").map(|_| ())
        );
        assert_eq!(
            Err(FenParseError::InvalidDigit),
            Board::from_placement("0/8/8/8/8/8/8/8").map(|_| ())
        );
        assert_eq!(
            Err(FenParseError::FileDoesNotSumToEight),
            Board::from_placement("7/8/8/8/8/8/8/8").map(|_| ())
        );
        assert_eq!(
            Err(FenParseError::UnknownPiece),
            Board::from_placement("x7/8/8/8/8/8/8/8").map(|_| ())
        );
        assert_eq!(
            Err(FenParseError::UnexpectedEnd),
            Board::from_placement("8/8/8").map(|_| ())
        );
        assert_eq!(
            Err(FenParseError::UnexpectedChar(' ')),
            Board::from_placement("8/8/8/8/8/8/8/8 w").map(|_| ())
        );
    }

    #[test]
    fn cell_lookup() {
        let board = Board::empty();
        assert_eq!(Cell::new(4, 4), board.at(4, 4));
        assert_eq!(None, board.at(8, 0));
        assert_eq!(Cell::new(1, 2), board.cell(Coordinate::new(1, 2)));
        assert_eq!(None, board.cell((-1, 2)));
        assert_eq!(Cell::new(4, 4), board.cell_by_notation("e4"));
        assert_eq!(None, board.cell_by_notation("z9"));
    }

    #[test]
    fn captured_pieces_are_not_on_their_cell() {
        let mut board = Board::new();
        let pawn = board.piece_id_at(cell("e2")).unwrap();
        board.capture(pawn);
        assert!(board.piece_at(cell("e2")).is_none());
        assert!(board.piece(pawn).unwrap().is_captured());
        assert_eq!(15, board.team_uncaptured_pieces(Team::White).len());
        assert_eq!(32, board.pieces().count());
    }

    #[test]
    fn remove_keeps_other_ids() {
        let mut board = Board::empty();
        let a = board.add(Team::White, PieceKind::Rook, cell("a1"));
        let b = board.add(Team::Black, PieceKind::Rook, cell("h8"));
        assert_eq!(PieceKind::Rook, board.remove(a).unwrap().kind());
        assert!(board.remove(a).is_none());
        assert!(board.piece(a).is_none());
        assert_eq!(cell("h8"), board.piece(b).unwrap().cell());
        assert!(board.legal_moves(a).is_empty());
    }

    #[test]
    #[should_panic(expected = "invalid team")]
    fn no_pieces_for_the_none_team() {
        Board::new().team_uncaptured_pieces(Team::None);
    }

    #[test]
    #[should_panic]
    fn cannot_add_a_teamless_piece() {
        Board::empty().add(Team::None, PieceKind::Queen, cell("d4"));
    }

    #[test]
    fn in_check_reports_team_and_attacker() {
        let board = Board::from_placement("4r2k/8/8/8/8/8/8/4K3").unwrap();
        let rook = board.piece_id_at(cell("e8")).unwrap();
        assert_eq!(Some((Team::White, rook)), board.in_check());
        assert_eq!(None, board.checking_piece(Team::Black));
    }

    #[test]
    fn no_king_no_check() {
        let board = Board::from_placement("4r3/8/8/8/8/8/8/8").unwrap();
        assert_eq!(None, board.in_check());
    }

    #[test]
    fn trial_moves_are_rolled_back() {
        let mut board = Board::from_placement("4r2k/8/8/8/8/8/4B3/4K3").unwrap();
        let before = board.clone();
        let bishop = board.piece_id_at(cell("e2")).unwrap();
        assert!(board.would_be_in_check(bishop, cell("d3")));
        assert_eq!(before, board);
    }

    #[test]
    fn capturing_the_attacker_is_simulated_as_a_capture() {
        // the rook on e8 would still see e1 if it were left standing.
        let mut board = Board::from_placement("R3r2k/8/8/8/8/8/8/4K3").unwrap();
        let before = board.clone();
        let rook = board.piece_id_at(cell("a8")).unwrap();
        let attacker = board.piece_id_at(cell("e8"));
        assert!(board.removes_check_on(rook, cell("e8"), attacker));
        assert_eq!(before, board);

        let king = board.piece_id_at(cell("e1")).unwrap();
        assert!(!board.removes_check_on(king, cell("e2"), attacker));
        assert!(board.removes_check_on(king, cell("d1"), attacker));
    }

    #[test]
    fn trial_moves_leave_captured_flags_alone() {
        // the rook on e2 may take the rook pinning it.
        let mut board = Board::from_placement("4r2k/8/8/8/8/8/4R3/4K3").unwrap();
        let before = board.clone();
        let rook = board.piece_id_at(cell("e2")).unwrap();
        let pinner = board.piece_id_at(cell("e8")).unwrap();
        assert!(!board.would_be_in_check(rook, cell("e8")));
        assert!(!board.piece(pinner).unwrap().is_captured());
        assert_eq!(before, board);
    }

    #[test]
    fn king_cannot_take_a_defended_piece() {
        let mut board = Board::from_placement("3r3k/8/8/8/8/8/3r4/4K3").unwrap();
        let king = board.piece_id_at(cell("e1")).unwrap();
        assert!(board.would_be_in_check(king, cell("d2")));
        assert_eq!(Some(king), board.piece_id_at(cell("e1")));
        assert_eq!(Team::Black, board.piece_at(cell("d2")).unwrap().team());
    }

    #[test]
    fn evasion_may_not_give_check_back() {
        // blocking on a4 also checks the king on b6. Blocking on a2 does not.
        let mut board = Board::from_placement("r7/8/1k6/8/8/2N5/8/K7").unwrap();
        let before = board.clone();
        let knight = board.piece_id_at(cell("c3")).unwrap();
        let king = board.piece_id_at(cell("a1")).unwrap();
        let attacker = board.checking_piece(Team::White);
        assert_eq!(board.piece_id_at(cell("a8")), attacker);
        assert!(!board.removes_check_on(knight, cell("a4"), attacker));
        assert!(board.removes_check_on(knight, cell("a2"), attacker));
        assert!(board.removes_check_on(king, cell("b1"), attacker));
        assert_eq!(before, board);
        assert!(board.has_check_removing_move(Team::White, attacker));
    }

    #[test]
    fn check_safe_moves_exclude_pinned_piece() {
        let mut board = Board::from_placement("4r2k/8/8/8/8/8/4B3/4K3").unwrap();
        let bishop = board.piece_id_at(cell("e2")).unwrap();
        assert!(board
            .check_safe_moves(Team::White)
            .iter()
            .all(|&(id, _)| id != bishop));
        assert!(board.has_check_safe_move(Team::White));
    }

    #[test]
    fn display_grid() {
        let board = Board::from_placement("7k/8/8/8/8/8/8/K7").unwrap();
        let rendered = board.to_string();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(10, lines.len());
        assert_eq!(" .  .  .  .  .  .  .  k | 8", lines[0]);
        assert_eq!(" K  .  .  .  .  .  .  . | 1", lines[7]);
        assert_eq!(" a  b  c  d  e  f  g  h ", lines[9]);
    }
}
