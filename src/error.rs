// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use thiserror::Error;

/// Reasons `Game::make_move` can turn a move down. None of these change the
/// game; the caller is free to try another move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("the game is already over")]
    GameOver,

    #[error("there is no piece on the source cell")]
    NoPieceAtSource,

    #[error("illegal move: this piece cannot go there")]
    IllegalMove,

    #[error("the piece has already been captured")]
    PieceAlreadyCaptured,

    #[error("not your turn")]
    WrongTurn,

    #[error("you would still be in check there")]
    StillInCheck,

    #[error("you would be in check there")]
    WouldCauseCheck,
}

/// Possible errors that can arise when parsing a FEN string into a board or game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum FenParseError {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("empty-square digits must be between 1 and 8")]
    InvalidDigit,

    #[error("rank does not sum to eight files")]
    FileDoesNotSumToEight,

    #[error("unknown piece letter")]
    UnknownPiece,

    #[error("side to move must be 'w' or 'b'")]
    InvalidSideToMove,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CellParseError {
    #[error("cell notation must be a file and a rank, got {0:?}")]
    Length(String),

    #[error("invalid file {0:?}")]
    InvalidFile(char),

    #[error("invalid rank {0:?}")]
    InvalidRank(char),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown event channel {0:?}")]
pub struct ChannelParseError(pub String);
