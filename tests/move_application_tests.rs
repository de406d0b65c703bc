// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::cell::RefCell;
use std::rc::Rc;

use chess_core::{Cell, Channel, Event, Game, GameState, MoveError, PieceKind, Team, CHANNELS};

fn cell(notation: &str) -> Cell {
    notation.parse().unwrap()
}

fn record(game: &mut Game) -> Rc<RefCell<Vec<Event>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for &channel in &CHANNELS {
        let log = Rc::clone(&log);
        game.subscribe(channel, move |_, event| log.borrow_mut().push(event.clone()));
    }

    log
}

fn play(game: &mut Game, from: &str, to: &str) -> Result<(), MoveError> {
    game.make_move(cell(from), cell(to))
}

#[test]
fn smoke_test_opening_pawn() {
    let mut game = Game::new();
    play(&mut game, "e2", "e3").unwrap();

    // it should now be Black's turn to move.
    assert_eq!(Team::Black, game.turn());
    assert_eq!(GameState::Playing, game.state());

    // there should be a pawn on e3 and not on e2.
    let pawn = game.board().piece_at(cell("e3")).unwrap();
    assert_eq!(PieceKind::Pawn, pawn.kind());
    assert_eq!(Team::White, pawn.team());
    assert!(game.board().piece_at(cell("e2")).is_none());
}

#[test]
fn coordinates_and_cells_are_interchangeable() {
    let mut game = Game::new();
    game.make_move((6, 7), (5, 5)).unwrap();
    assert_eq!(PieceKind::Knight, game.board().piece_at(cell("f3")).unwrap().kind());
}

#[test]
fn opening_sequence() {
    let mut game = Game::new();
    assert_eq!(Ok(()), play(&mut game, "e2", "e4"));
    assert_eq!(Ok(()), play(&mut game, "e7", "e5"));
    assert_eq!(Ok(()), play(&mut game, "d1", "h5"));

    // three moves in, so Black is to move again.
    assert_eq!(Team::Black, game.turn());
    assert_eq!(GameState::Playing, game.state());
    assert_eq!(PieceKind::Queen, game.board().piece_at(cell("h5")).unwrap().kind());
}

#[test]
fn turns_strictly_alternate() {
    let mut game = Game::new();
    for _ in 0..40 {
        let moves = game.available_moves();
        let (from, to) = match moves.first() {
            Some(&mov) => mov,
            None => break,
        };

        let before = game.turn();
        game.make_move(from, to).unwrap();
        assert_eq!(before.opponent(), game.turn());
    }
}

#[test]
fn pawn_loses_double_step_after_moving() {
    let mut game = Game::new();
    assert_eq!(2, game.legal_moves(cell("a2")).len());
    play(&mut game, "a2", "a3").unwrap();
    play(&mut game, "h7", "h6").unwrap();
    assert_eq!(vec![cell("a4")], game.legal_moves(cell("a3")).to_vec());
}

#[test]
fn capture_marks_piece_and_emits() {
    let mut game = Game::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w").unwrap();
    let log = record(&mut game);
    let victim = game.board().piece_id_at(cell("d5")).unwrap();

    play(&mut game, "e4", "d5").unwrap();

    let taken = game.board().piece(victim).unwrap();
    assert!(taken.is_captured());
    assert_eq!(Team::White, game.board().piece_at(cell("d5")).unwrap().team());
    assert_eq!(1, game.board().team_uncaptured_pieces(Team::Black).len());

    let log = log.borrow();
    let channels: Vec<_> = log.iter().map(Event::channel).collect();
    assert_eq!(
        vec![Channel::Move, Channel::Capture, Channel::MoveFinished],
        channels
    );
    match &log[1] {
        Event::Capture { piece, team, cell: at } => {
            assert_eq!(victim, piece.id());
            assert!(piece.is_captured());
            assert_eq!(Team::White, *team);
            assert_eq!(cell("d5"), *at);
        }
        other => panic!("expected a capture, got {}", other),
    }
}

#[test]
fn capture_handler_sees_flag_set_but_turn_unchanged() {
    let mut game = Game::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w").unwrap();
    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    game.subscribe(Channel::Capture, move |game, event| {
        if let Event::Capture { piece, .. } = event {
            let captured = game.board().piece(piece.id()).unwrap().is_captured();
            *sink.borrow_mut() = Some((captured, game.turn()));
        }
    });

    play(&mut game, "e4", "d5").unwrap();
    assert_eq!(Some((true, Team::White)), *seen.borrow());
}

#[test]
fn move_events_carry_team_and_cells() {
    let mut game = Game::new();
    let log = record(&mut game);
    play(&mut game, "g1", "f3").unwrap();

    let expected = vec![
        Event::Move {
            team: Team::White,
            from: cell("g1"),
            to: cell("f3"),
        },
        Event::MoveFinished {
            team: Team::White,
            from: cell("g1"),
            to: cell("f3"),
        },
    ];
    assert_eq!(expected, *log.borrow());
}

#[test]
fn rejected_moves_change_nothing() {
    let mut game = Game::new();
    let log = record(&mut game);
    let before = game.as_fen();

    assert_eq!(Err(MoveError::NoPieceAtSource), play(&mut game, "e4", "e5"));
    assert_eq!(Err(MoveError::IllegalMove), play(&mut game, "e2", "e5"));
    assert_eq!(Err(MoveError::IllegalMove), play(&mut game, "b1", "d2"));
    assert_eq!(Err(MoveError::WrongTurn), play(&mut game, "e7", "e5"));
    assert_eq!(Err(MoveError::NoPieceAtSource), game.make_move((-1, 3), (0, 3)));
    assert_eq!(Err(MoveError::IllegalMove), game.make_move((0, 6), (0, 9)));

    assert_eq!(before, game.as_fen());
    assert_eq!(Team::White, game.turn());
    assert!(log.borrow().is_empty());
}

#[test]
fn move_errors_have_messages() {
    assert_eq!("not your turn", MoveError::WrongTurn.to_string());
    assert_eq!("the game is already over", MoveError::GameOver.to_string());
}
