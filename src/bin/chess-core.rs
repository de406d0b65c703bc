// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#[macro_use]
extern crate clap;

use std::process;
use std::time::Instant;

use chess_core::{Event, Game, CHANNELS};
use clap::{App, Arg, ArgMatches, SubCommand};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

fn fen_arg() -> Arg<'static, 'static> {
    Arg::with_name("FEN")
        .help("FEN string for a board position, or 'startpos'")
        .default_value("startpos")
        .index(1)
}

fn main() {
    env_logger::init();
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .subcommand(
            SubCommand::with_name("perft")
                .about("Count move paths from a board position")
                .arg(fen_arg())
                .arg(
                    Arg::with_name("depth")
                        .help("Depth of move tree to count")
                        .value_name("DEPTH")
                        .short("d")
                        .long("depth")
                        .default_value("3")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("moves")
                .about("List the moves available to the side to move")
                .arg(fen_arg()),
        )
        .subcommand(
            SubCommand::with_name("selfplay")
                .about("Play random moves until the game ends, printing every event")
                .arg(fen_arg())
                .arg(
                    Arg::with_name("seed")
                        .help("Seed for the move picker")
                        .value_name("SEED")
                        .short("s")
                        .long("seed")
                        .default_value("0")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("max-plies")
                        .help("Stop after this many moves even if the game is not over")
                        .value_name("PLIES")
                        .long("max-plies")
                        .default_value("200")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("json")
                        .help("Print events as JSON lines")
                        .long("json"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("perft", Some(matches)) => run_perft(matches),
        ("moves", Some(matches)) => run_moves(matches),
        ("selfplay", Some(matches)) => run_selfplay(matches),
        _ => {
            eprintln!("{}", matches.usage());
            process::exit(2);
        }
    }
}

fn load_game(matches: &ArgMatches) -> Game {
    let fen = matches.value_of("FEN").unwrap_or("startpos");
    if fen == "startpos" {
        return Game::new();
    }

    match Game::from_fen(fen) {
        Ok(game) => game,
        Err(err) => {
            eprintln!("invalid fen: {}", err);
            process::exit(1);
        }
    }
}

fn run_perft(matches: &ArgMatches) -> ! {
    let depth = value_t_or_exit!(matches, "depth", u32);
    let game = load_game(matches);

    println!("fen:   {}", game.as_fen());
    println!("depth: {}", depth);
    println!();
    println!("{}", game.board());
    for i in 1..depth + 1 {
        let start = Instant::now();
        let results = game.perft(i);
        let ms = start.elapsed().as_millis();
        println!("perft({}) = {} ({} ms)", i, results, ms);
    }

    process::exit(0);
}

fn run_moves(matches: &ArgMatches) -> ! {
    let mut game = load_game(matches);
    println!("{}", game);
    let moves = game.available_moves();
    for (from, to) in &moves {
        println!("{}{}", from, to);
    }

    println!("{} moves", moves.len());
    process::exit(0);
}

fn print_event(event: &Event, json: bool) {
    if !json {
        println!("{}", event);
        return;
    }

    match serde_json::to_string(event) {
        Ok(line) => println!("{}", line),
        Err(err) => eprintln!("failed to encode {}: {}", event, err),
    }
}

fn run_selfplay(matches: &ArgMatches) -> ! {
    let seed = value_t_or_exit!(matches, "seed", u64);
    let max_plies = value_t_or_exit!(matches, "max-plies", u32);
    let json = matches.is_present("json");
    let mut game = load_game(matches);
    for &channel in &CHANNELS {
        game.subscribe(channel, move |_, event| print_event(event, json));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..max_plies {
        let moves = game.available_moves();
        let (from, to) = match moves.choose(&mut rng) {
            Some(&mov) => mov,
            None => break,
        };

        if let Err(err) = game.make_move(from, to) {
            eprintln!("move {}{} was refused: {}", from, to, err);
            process::exit(1);
        }
    }

    println!();
    println!("{}", game);
    process::exit(0);
}
