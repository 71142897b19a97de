// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The UCI protocol front-end. The I/O loop runs on the calling thread;
//! `go` launches the search on a worker thread that shares the
//! transposition table through a mutex and is cancelled cooperatively
//! through an atomic stop flag. The search thread emits `info` lines
//! after each iteration and `bestmove` when it finishes.
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::board::Board;
use crate::eval::SCORE_MATE;
use crate::moves::Move;
use crate::search::{
    InfoCallback, Search, SearchConfig, SearchInfo, TranspositionTable, DEFAULT_TT_SIZE_MB,
};
use crate::types::Color;

// Effectively unbounded; used for depth-limited and infinite searches.
const NO_TIME_LIMIT_MS: u64 = 300_000;

pub struct UciServer {
    board: Board,
    game_history: Vec<u64>,
    tt: Arc<Mutex<TranspositionTable>>,
    stop_flag: Arc<AtomicBool>,
    search_thread: Option<thread::JoinHandle<()>>,
}

// UCI requires output to be visible as soon as it is produced, even when
// stdout is a pipe.
fn send(line: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(handle, "{}", line);
    let _ = handle.flush();
}

/// Splits the remaining clock into a budget for this move:
/// `min(remaining / 3, remaining / 30 + increment)`, never spending less
/// than the increment (minus a small overhead margin) when one exists.
fn allocate_time(remaining: i64, increment: i64) -> i64 {
    let mut allocated = (remaining / 30 + increment).min(remaining / 3);
    if increment > 0 {
        allocated = allocated.max(increment - 50);
    }
    allocated.max(1)
}

fn format_info(info: &SearchInfo) -> String {
    let mut out = format!("info depth {}", info.depth);

    if info.score >= SCORE_MATE - 200 {
        let mate_ply = SCORE_MATE - info.score;
        out.push_str(&format!(" score mate {}", (mate_ply + 1) / 2));
    } else if info.score <= -(SCORE_MATE - 200) {
        let mate_ply = SCORE_MATE + info.score;
        out.push_str(&format!(" score mate -{}", (mate_ply + 1) / 2));
    } else {
        out.push_str(&format!(" score cp {}", info.score));
    }

    out.push_str(&format!(" nodes {}", info.nodes));
    let time_ms = info.time_ms.max(1);
    out.push_str(&format!(" nps {}", info.nodes * 1000 / time_ms));
    out.push_str(&format!(" time {}", info.time_ms));

    if !info.pv.is_empty() {
        out.push_str(" pv");
        for mov in &info.pv {
            out.push_str(&format!(" {}", mov.to_algebraic()));
        }
    }

    out
}

impl UciServer {
    pub fn new() -> UciServer {
        UciServer {
            board: Board::new(),
            game_history: Vec::new(),
            tt: Arc::new(Mutex::new(TranspositionTable::new(DEFAULT_TT_SIZE_MB))),
            stop_flag: Arc::new(AtomicBool::new(false)),
            search_thread: None,
        }
    }

    pub fn run(mut self) -> io::Result<()> {
        let stdin = io::stdin();
        for maybe_line in stdin.lock().lines() {
            let line = maybe_line?;
            debug!("uci: {}", line);

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }

            match tokens[0] {
                "uci" => self.handle_uci(),
                "isready" => {
                    self.join_search();
                    send("readyok");
                }
                "ucinewgame" => self.handle_new_game(),
                "position" => self.handle_position(&tokens[1..]),
                "go" => self.handle_go(&tokens[1..]),
                "stop" => self.handle_stop(),
                "quit" => {
                    self.handle_stop();
                    return Ok(());
                }
                _ => warn!("unknown command: {}", tokens[0]),
            }
        }

        // EOF: let a running search finish naturally.
        self.join_search();
        Ok(())
    }

    fn handle_uci(&mut self) {
        send(&format!(
            "id name {} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ));
        send(&format!("id author {}", env!("CARGO_PKG_AUTHORS")));
        send("uciok");
    }

    fn handle_new_game(&mut self) {
        self.join_search();
        self.tt.lock().clear();
        self.board = Board::new();
        self.game_history.clear();
    }

    fn handle_position(&mut self, args: &[&str]) {
        self.join_search();

        let mut rest = args;
        match rest.first() {
            Some(&"startpos") => {
                self.board = Board::new();
                rest = &rest[1..];
            }
            Some(&"fen") => {
                let field_count = rest.len().min(7) - 1;
                let fen = rest[1..=field_count].join(" ");
                match Board::from_fen(&fen) {
                    Ok(board) => self.board = board,
                    Err(err) => {
                        // A bad position command is ignored outright.
                        warn!("ignoring invalid position: {}", err);
                        return;
                    }
                }
                rest = &rest[field_count + 1..];
            }
            _ => {
                warn!("malformed position command");
                return;
            }
        }

        self.game_history.clear();

        if rest.first() == Some(&"moves") {
            rest = &rest[1..];
        }

        for token in rest {
            let parsed = match Move::from_algebraic(token) {
                Some(mov) if !mov.is_null() => mov,
                _ => {
                    warn!("unparseable move: {}", token);
                    continue;
                }
            };

            let promotion = if parsed.is_promotion() {
                Some(parsed.promotion_piece())
            } else {
                None
            };

            match self
                .board
                .find_legal_move(parsed.source(), parsed.destination(), promotion)
            {
                Some(legal) => {
                    // Record the pre-move hash so the search can detect
                    // repetitions reaching back into the game.
                    self.game_history.push(self.board.position().hash());
                    self.board.make_move_unchecked(legal);
                }
                None => warn!("illegal move in position command: {}", token),
            }
        }
    }

    fn handle_go(&mut self, args: &[&str]) {
        self.join_search();

        let mut wtime: i64 = -1;
        let mut btime: i64 = -1;
        let mut winc: i64 = 0;
        let mut binc: i64 = 0;
        let mut depth: i64 = -1;
        let mut movetime: i64 = -1;
        let mut infinite = false;

        let mut iter = args.iter();
        while let Some(&token) = iter.next() {
            let mut numeric = |target: &mut i64| {
                if let Some(value) = iter.next().and_then(|v| v.parse().ok()) {
                    *target = value;
                }
            };

            match token {
                "wtime" => numeric(&mut wtime),
                "btime" => numeric(&mut btime),
                "winc" => numeric(&mut winc),
                "binc" => numeric(&mut binc),
                "depth" => numeric(&mut depth),
                "movetime" => numeric(&mut movetime),
                "infinite" => infinite = true,
                _ => {}
            }
        }

        self.stop_flag.store(false, Ordering::SeqCst);

        let mut config = SearchConfig::default();
        config.stop_signal = Some(Arc::clone(&self.stop_flag));

        if depth > 0 {
            config.max_depth = depth as i32;
            config.search_time = Duration::from_millis(NO_TIME_LIMIT_MS);
        } else if movetime > 0 {
            config.search_time = Duration::from_millis(movetime as u64);
        } else if infinite {
            config.max_depth = 64;
            config.search_time = Duration::from_millis(NO_TIME_LIMIT_MS);
        } else {
            let (remaining, increment) = match self.board.position().side_to_move() {
                Color::White => (wtime, winc),
                Color::Black => (btime, binc),
            };
            if remaining > 0 {
                config.search_time =
                    Duration::from_millis(allocate_time(remaining, increment) as u64);
            }
        }

        let tt = Arc::clone(&self.tt);
        let board = self.board.clone();
        let history = self.game_history.clone();

        self.search_thread = Some(thread::spawn(move || {
            let callback: InfoCallback = Box::new(|info: &SearchInfo| send(&format_info(info)));

            let mut tt = tt.lock();
            let mut search = Search::new(board, config, &mut tt, Some(callback), history);
            let best = search.find_best_move();
            send(&format!("bestmove {}", best.to_algebraic()));
        }));
    }

    fn handle_stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.join_search();
    }

    fn join_search(&mut self) {
        if let Some(handle) = self.search_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Default for UciServer {
    fn default() -> UciServer {
        UciServer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    #[test]
    fn time_allocation() {
        // No increment: a thirtieth of the clock.
        assert_eq!(1000, allocate_time(30_000, 0));

        // Increment raises the allocation, capped by a third of the clock.
        assert_eq!(3000, allocate_time(60_000, 1000));

        // Deep time trouble: never spend less than the increment minus
        // the overhead margin, even past the remaining/3 cap.
        assert_eq!(950, allocate_time(600, 1000));

        // Degenerate clocks still produce a positive budget.
        assert_eq!(1, allocate_time(10, 0));
    }

    #[test]
    fn info_line_centipawns() {
        let info = SearchInfo {
            depth: 7,
            score: 33,
            nodes: 2000,
            time_ms: 100,
            pv: vec![
                Move::double_pawn_push(Square::E2, Square::E4),
                Move::quiet(Square::G8, Square::F6),
            ],
        };
        assert_eq!(
            "info depth 7 score cp 33 nodes 2000 nps 20000 time 100 pv e2e4 g8f6",
            format_info(&info)
        );
    }

    #[test]
    fn info_line_mate_scores() {
        let info = SearchInfo {
            depth: 5,
            score: SCORE_MATE - 3,
            nodes: 10,
            time_ms: 0,
            pv: Vec::new(),
        };
        let line = format_info(&info);
        assert!(line.contains("score mate 2"), "line was: {}", line);

        let info = SearchInfo {
            depth: 5,
            score: -(SCORE_MATE - 4),
            nodes: 10,
            time_ms: 0,
            pv: Vec::new(),
        };
        let line = format_info(&info);
        assert!(line.contains("score mate -2"), "line was: {}", line);
    }
}
