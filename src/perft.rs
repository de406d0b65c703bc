// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use rayon::prelude::*;

use crate::board::Board;
use crate::types::{PieceKind, Team};

/// Counts the sequences of `depth` check-safe moves starting with `side` to
/// move. Pawns reaching the far rank become queens, as they do in a game with
/// the default promotion rule.
pub fn perft(board: &Board, side: Team, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = board.clone().check_safe_moves(side);
    if depth == 1 {
        return moves.len() as u64;
    }

    moves
        .par_iter()
        .map(|&(id, to)| {
            let mut next = board.clone();
            next.play(id, to);
            let promotes = next
                .piece(id)
                .map_or(false, |piece| piece.kind() == PieceKind::Pawn)
                && to.y() == side.promotion_row();
            if promotes {
                next.set_kind(id, PieceKind::promotion_target());
            }

            perft(&next, side.opponent(), depth - 1)
        })
        .sum()
}
