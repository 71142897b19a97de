// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#[macro_use]
extern crate clap;

use std::fs::File;
use std::process;
use std::time::{Duration, Instant};

use clap::{App, Arg, ArgMatches, SubCommand};

use castellan::search::{
    CsvDataRecorder, DataRecorder, InfoCallback, Record, Search, SearchConfig, SearchInfo,
    TranspositionTable, DEFAULT_TT_SIZE_MB,
};
use castellan::uci::UciServer;
use castellan::{attacks, perft, perft_detail, san, Board, Position};

fn main() {
    env_logger::init();
    attacks::initialize();

    let matches = App::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .subcommand(
            SubCommand::with_name("perft")
                .about("PERFT analysis of board positions")
                .arg(
                    Arg::with_name("FEN")
                        .help("FEN string for a board position")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("depth")
                        .help("Depth of move tree to search")
                        .value_name("DEPTH")
                        .short("-d")
                        .long("--depth")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("evaluate")
                .about("Search a board position and report the best move")
                .arg(
                    Arg::with_name("FEN")
                        .help("FEN string for a board position")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("depth")
                        .help("Depth of move tree to search")
                        .value_name("DEPTH")
                        .short("-d")
                        .long("--depth")
                        .takes_value(true),
                ),
        )
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("perft") {
        run_perft(matches);
    }

    if let Some(matches) = matches.subcommand_matches("evaluate") {
        run_evaluate(matches);
    }

    let server = UciServer::new();
    server.run().unwrap()
}

fn run_perft(matches: &ArgMatches) -> ! {
    let fen = matches.value_of("FEN").unwrap();
    let depth = value_t_or_exit!(matches, "depth", u32);
    let pos = match Position::from_fen(fen) {
        Ok(pos) => pos,
        Err(err) => {
            println!("invalid fen: {}", err);
            process::exit(1);
        }
    };

    println!("fen:   {}", fen);
    println!("depth: {}", depth);
    println!();
    println!("{}", pos);
    println!();
    for i in 1..=depth {
        let start = Instant::now();
        let results = perft(&pos, i);
        let ms = start.elapsed().as_millis();
        println!("perft({}) = {} ({} ms)", i, results, ms);
    }

    let detail = perft_detail(&pos, depth);
    println!();
    println!(
        "captures {} en-passants {} castles {} checks {}",
        detail.captures, detail.en_passants, detail.castles, detail.checks
    );

    process::exit(0);
}

fn run_evaluate(matches: &ArgMatches) -> ! {
    let fen = matches.value_of("FEN").unwrap();
    let depth = value_t_or_exit!(matches, "depth", i32);
    let board = match Board::from_fen(fen) {
        Ok(board) => board,
        Err(err) => {
            println!("invalid fen: {}", err);
            process::exit(1);
        }
    };

    println!("fen:   {}", fen);
    println!("depth: {}", depth);
    println!();
    println!("{}", board);
    println!();

    let recorder = CsvDataRecorder::new(File::create("search.csv").unwrap());
    let fen_owned = fen.to_owned();
    let callback: InfoCallback = Box::new(move |info: &SearchInfo| {
        recorder.record(&Record::from_info(&fen_owned, info));
    });

    let mut tt = TranspositionTable::new(DEFAULT_TT_SIZE_MB);
    let config = SearchConfig {
        search_time: Duration::from_secs(3600),
        max_depth: depth,
        stop_signal: None,
    };
    let mut search = Search::new(board.clone(), config, &mut tt, Some(callback), Vec::new());
    let best = search.find_best_move();

    if best.is_null() {
        println!("no legal moves (checkmate or stalemate)");
    } else {
        println!("best move: {} ({})", best.to_algebraic(), san(&board, best));
    }
    println!("    nodes: {}", search.nodes());
    println!("  tt hits: {:.1}%", tt.stats().hit_rate());
    process::exit(0);
}
