// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The game: whose turn it is, what state play is in, and the rules that
//! move it from one state to the next.
//!
//! Moves are validated and applied by `make_move`, which then announces the
//! move on `move-finished`. Everything that follows from a move (promotion,
//! check, checkmate and stalemate) is worked out by handlers the game
//! registers on its own event bus when it is built, so collaborators observe
//! those transitions exactly the way the game itself reacts to them.
use std::fmt;

use crate::board::Board;
use crate::cell::Cell;
use crate::coord::Coordinate;
use crate::error::{FenParseError, MoveError};
use crate::events::{self, Channel, Event, EventBus, Observable, SubscriptionId};
use crate::piece::{MoveVec, Piece, PieceId};
use crate::perft;
use crate::types::{PieceKind, Team};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    Playing,
    Check,
    Checkmate,
    Stalemate,
    /// Reserved. No rule currently ends a game in a draw.
    Draw,
}

impl GameState {
    pub fn is_game_over(self) -> bool {
        match self {
            GameState::Checkmate | GameState::Stalemate | GameState::Draw => true,
            GameState::Playing | GameState::Check => false,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            GameState::Playing => "playing",
            GameState::Check => "check",
            GameState::Checkmate => "checkmate",
            GameState::Stalemate => "stalemate",
            GameState::Draw => "draw",
        };

        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct Game {
    turn: Team,
    board: Board,
    state: GameState,
    attacker: Option<PieceId>,
    events: EventBus<Game>,
    default_promotion: Option<SubscriptionId>,
}

//
// Construction
//

impl Game {
    /// A game at the standard starting position with White to move.
    pub fn new() -> Game {
        Game::with_board(Board::new(), Team::White)
    }

    /// A game from the first two fields of a FEN string: piece placement and
    /// side to move. Any further fields are ignored. The position is checked
    /// for check, checkmate and stalemate before the game is returned.
    pub fn from_fen<S: AsRef<str>>(fen: S) -> Result<Game, FenParseError> {
        let mut fields = fen.as_ref().split_whitespace();
        let placement = fields.next().ok_or(FenParseError::UnexpectedEnd)?;
        let board = Board::from_placement(placement)?;
        let turn = match fields.next() {
            Some("w") => Team::White,
            Some("b") => Team::Black,
            Some(_) => return Err(FenParseError::InvalidSideToMove),
            None => return Err(FenParseError::UnexpectedEnd),
        };

        let mut game = Game::with_board(board, turn);
        game.reconcile();
        Ok(game)
    }

    fn with_board(board: Board, turn: Team) -> Game {
        let mut game = Game {
            turn,
            board,
            state: GameState::Playing,
            attacker: None,
            events: EventBus::new(),
            default_promotion: None,
        };

        game.install_rules();
        game
    }

    // The position is examined before any promotion, so a check given by a
    // freshly promoted piece is only seen after the next move.
    fn install_rules(&mut self) {
        self.events
            .subscribe_pinned(Channel::MoveFinished, |game, _| game.reconcile());
        self.events
            .subscribe_pinned(Channel::MoveFinished, |game, event| game.offer_promotion(event));
        let id = self
            .events
            .subscribe_pinned(Channel::PromotionAvailable, |game, event| {
                game.auto_promote(event)
            });
        self.default_promotion = Some(id);
    }

    /// Placement and side to move, e.g. `rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w`.
    pub fn as_fen(&self) -> String {
        let side = match self.turn {
            Team::Black => 'b',
            _ => 'w',
        };

        format!("{} {}", self.board.placement(), side)
    }
}

//
// Accessors
//

impl Game {
    pub fn turn(&self) -> Team {
        self.turn
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The piece giving check. Only meaningful while the state is `Check` or
    /// `Checkmate`.
    pub fn attacker(&self) -> Option<&Piece> {
        self.attacker_id().and_then(|id| self.board.piece(id))
    }

    // A cloned game does not know its attacker until it looks again.
    fn attacker_id(&self) -> Option<PieceId> {
        match self.state {
            GameState::Check | GameState::Checkmate => self
                .attacker
                .or_else(|| self.board.in_check().map(|(_, attacker)| attacker)),
            _ => None,
        }
    }

    pub fn is_check(&self) -> bool {
        self.state == GameState::Check
    }

    pub fn is_checkmate(&self) -> bool {
        self.state == GameState::Checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.state == GameState::Stalemate
    }

    pub fn is_draw(&self) -> bool {
        self.state == GameState::Draw
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }
}

//
// Moves
//

impl Game {
    /// Validates and applies a move of the piece on `from` to `to`.
    ///
    /// An accepted move announces itself on `move`, captures whatever stands
    /// on `to` (announced on `capture`), passes the turn and then announces
    /// `move-finished`, whose handlers deal with check, checkmate and
    /// stalemate, then with promotion, before this returns. A rejected move
    /// changes nothing and emits nothing.
    pub fn make_move<F, T>(&mut self, from: F, to: T) -> Result<(), MoveError>
    where
        F: Into<Coordinate>,
        T: Into<Coordinate>,
    {
        let result = self.validate(from.into(), to.into());
        let (id, from, to) = match result {
            Ok(validated) => validated,
            Err(err) => {
                debug!("rejected move for {}: {}", self.turn, err);
                return Err(err);
            }
        };

        let team = self.turn;
        self.state = GameState::Playing;
        debug!("{} moves {} -> {}", team, from, to);
        events::emit(self, Event::Move { team, from, to });

        if let Some(mut victim) = self.board.piece_at(to).copied() {
            self.board.capture(victim.id());
            victim.set_captured(true);
            debug!("{} takes {} on {}", team, victim, to);
            events::emit(
                self,
                Event::Capture {
                    piece: victim,
                    team,
                    cell: to,
                },
            );
        }

        self.board.relocate(id, to);
        self.turn = team.opponent();
        events::emit(self, Event::MoveFinished { team, from, to });
        Ok(())
    }

    fn validate(
        &mut self,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<(PieceId, Cell, Cell), MoveError> {
        if self.is_game_over() {
            return Err(MoveError::GameOver);
        }

        let from = self.board.cell(from).ok_or(MoveError::NoPieceAtSource)?;
        let piece = *self
            .board
            .piece_at(from)
            .ok_or(MoveError::NoPieceAtSource)?;
        let to = self.board.cell(to).ok_or(MoveError::IllegalMove)?;
        if !piece.can_reach(&self.board, to) {
            return Err(MoveError::IllegalMove);
        }

        if piece.is_captured() {
            return Err(MoveError::PieceAlreadyCaptured);
        }

        if piece.team() != self.turn {
            return Err(MoveError::WrongTurn);
        }

        if self.state == GameState::Check {
            let attacker = self.attacker_id();
            if !self.board.removes_check_on(piece.id(), to, attacker) {
                return Err(MoveError::StillInCheck);
            }
        } else if self.board.would_be_in_check(piece.id(), to) {
            return Err(MoveError::WouldCauseCheck);
        }

        Ok((piece.id(), from, to))
    }

    /// The movement-rule moves of the piece on `from`, without regard to
    /// whose turn it is or to check.
    pub fn legal_moves<C: Into<Coordinate>>(&self, from: C) -> MoveVec {
        self.board
            .piece_at(from)
            .map_or_else(MoveVec::new, |piece| piece.legal_moves(&self.board))
    }

    /// Every move `make_move` would accept right now, as `(from, to)` pairs.
    pub fn available_moves(&mut self) -> Vec<(Cell, Cell)> {
        if self.is_game_over() {
            return Vec::new();
        }

        let in_check = self.state == GameState::Check;
        let attacker = self.attacker_id();
        let mut moves = Vec::new();
        for id in self.board.team_piece_ids(self.turn) {
            let from = match self.board.piece(id) {
                Some(piece) => piece.cell(),
                None => continue,
            };

            for to in self.board.legal_moves(id) {
                let safe = if in_check {
                    self.board.removes_check_on(id, to, attacker)
                } else {
                    !self.board.would_be_in_check(id, to)
                };

                if safe {
                    moves.push((from, to));
                }
            }
        }

        moves
    }

    /// Counts the move sequences of length `depth` from this position.
    pub fn perft(&self, depth: u32) -> u64 {
        perft::perft(&self.board, self.turn, depth)
    }
}

//
// Rules
//
// These run as handlers on the game's own event bus.
//

impl Game {
    /// The team currently in check, or `Team::None`. White is examined first.
    /// Records the piece giving the check.
    pub fn in_check(&mut self) -> Team {
        match self.board.in_check() {
            Some((team, attacker)) => {
                self.attacker = Some(attacker);
                team
            }
            None => {
                self.attacker = None;
                Team::None
            }
        }
    }

    fn reconcile(&mut self) {
        let checked = self.in_check();
        if checked.is_none() {
            if self.board.has_check_safe_move(self.turn) {
                self.state = GameState::Playing;
                return;
            }

            info!("{} has no safe move: stalemate", self.turn);
            self.state = GameState::Stalemate;
            events::emit(self, Event::Stalemate);
            return;
        }

        let attacker = self.attacker;
        info!("{} is in check", checked);
        self.state = GameState::Check;
        events::emit(self, Event::Check { team: checked });
        if self.board.has_check_removing_move(checked, attacker) {
            return;
        }

        let winner = attacker
            .and_then(|id| self.board.piece(id))
            .map_or_else(|| checked.opponent(), Piece::team);
        info!("checkmate, {} wins", winner);
        self.state = GameState::Checkmate;
        events::emit(self, Event::Checkmate { team: winner });
    }

    fn offer_promotion(&mut self, event: &Event) {
        let (team, to) = match *event {
            Event::MoveFinished { team, to, .. } => (team, to),
            _ => return,
        };

        let pawn_arrived = self.board.piece_at(to).map_or(false, |piece| {
            piece.team() == team && piece.kind() == PieceKind::Pawn
        });
        if pawn_arrived && to.y() == team.promotion_row() {
            debug!("{} pawn on {} may promote", team, to);
            events::emit(self, Event::PromotionAvailable { team, cell: to });
        }
    }

    fn auto_promote(&mut self, event: &Event) {
        let cell = match *event {
            Event::PromotionAvailable { cell, .. } => cell,
            _ => return,
        };

        // Someone else may already have promoted it.
        let pawn = self
            .board
            .piece_at(cell)
            .filter(|piece| piece.kind() == PieceKind::Pawn)
            .map(Piece::id);
        if let Some(id) = pawn {
            self.promote(id, PieceKind::promotion_target());
        }
    }

    /// Turns a piece into `kind` and announces it on `promotion`.
    ///
    /// Panics if the piece is not on the board, has been captured, or if
    /// `kind` is a pawn or a king.
    pub fn promote(&mut self, id: PieceId, kind: PieceKind) {
        let piece = *self
            .board
            .piece(id)
            .expect("promoted piece is not on the board");
        assert!(!piece.is_captured(), "cannot promote a captured piece");
        assert!(kind.can_promote_to(), "cannot promote to a {}", kind);

        self.board.set_kind(id, kind);
        info!("{} on {} promoted to {}", piece, piece.cell(), kind);
        events::emit(
            self,
            Event::Promotion {
                team: piece.team(),
                cell: piece.cell(),
                kind,
            },
        );
    }
}

//
// Subscriptions
//

impl Game {
    pub fn subscribe<F>(&mut self, channel: Channel, handler: F) -> SubscriptionId
    where
        F: Fn(&mut Game, &Event) + 'static,
    {
        self.events.subscribe(channel, handler)
    }

    pub fn subscribe_once<F>(&mut self, channel: Channel, handler: F) -> SubscriptionId
    where
        F: Fn(&mut Game, &Event) + 'static,
    {
        self.events.subscribe_once(channel, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Drops collaborator handlers on `channel`, or on every channel. The
    /// game's own rules stay registered.
    pub fn clear_subscriptions(&mut self, channel: Option<Channel>) {
        self.events.clear(channel)
    }

    pub fn listener_count(&self, channel: Channel) -> usize {
        self.events.listener_count(channel)
    }

    /// Replaces the rule that promotes pawns to a queen with `handler`, which
    /// is expected to call `promote` for the pawn named in the event. Like the
    /// rule it replaces, it is not dropped by `clear_subscriptions`.
    pub fn on_promotion_available<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&mut Game, &Event) + 'static,
    {
        if let Some(id) = self.default_promotion.take() {
            self.events.unsubscribe(id);
        }

        self.events
            .subscribe_pinned(Channel::PromotionAvailable, handler)
    }
}

//
// Trait implementations
//

impl Observable for Game {
    fn event_bus(&mut self) -> &mut EventBus<Game> {
        &mut self.events
    }
}

/// Copies the position, the turn and the state. The copy starts with only
/// the game's own rules subscribed, so a custom promotion handler is not
/// carried over.
impl Clone for Game {
    fn clone(&self) -> Game {
        let mut game = Game::with_board(self.board.clone(), self.turn);
        game.state = self.state;
        game
    }
}

impl Default for Game {
    fn default() -> Game {
        Game::new()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.board)?;
        writeln!(f, "{} to move ({})", self.turn, self.state)
    }
}
