// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A two-player chess rules engine.
//!
//! `Game` is the entry point: it owns the board, validates and applies moves,
//! and announces every transition on an event bus that renderers, loggers and
//! automated players subscribe to.

#[macro_use]
extern crate num_derive;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

mod board;
mod cell;
mod coord;
mod error;
pub mod events;
mod game;
mod perft;
mod piece;
mod types;

pub use board::{Board, STARTING_PLACEMENT};
pub use cell::{Cell, BOARD_SIZE};
pub use coord::Coordinate;
pub use error::{CellParseError, ChannelParseError, FenParseError, MoveError};
pub use events::{Channel, Event, EventBus, Observable, SubscriptionId, CHANNELS};
pub use game::{Game, GameState};
pub use perft::perft;
pub use piece::{MoveVec, Piece, PieceId};
pub use types::{PieceKind, Team, PIECE_KINDS, TEAMS};
