// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The search: iterative deepening over a fail-soft negamax with
//! alpha-beta pruning, principal variation search, null-move pruning,
//! late move reductions, killer-move ordering, and a capture-only
//! quiescence search at the horizon. The transposition table memoizes
//! results across transpositions and across iterations.
//!
//! The search runs on one thread and owns its board; cancellation is
//! cooperative. Every 1024 nodes it checks the wall clock and the
//! externally owned stop flag, and when either trips, the tree unwinds
//! and the best move of the last completed iteration is returned.
use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::board::Board;
use crate::eval::{self, SCORE_DRAW, SCORE_INFINITY, SCORE_MATE};
use crate::movegen::MoveGenerator;
use crate::moves::Move;
use crate::position::UndoInfo;
use crate::search::move_order::MoveOrder;
use crate::search::transposition_table::{
    score_from_tt, score_to_tt, Bound, TranspositionTable,
};
use crate::search::{InfoCallback, SearchConfig, SearchInfo};
use crate::types::{Color, PieceKind};

pub const MAX_PLY: usize = 128;

const NULL_MOVE_REDUCTION: i32 = 2;

const MAX_LMR_DEPTH: usize = 64;
const MAX_LMR_MOVES: usize = 64;

lazy_static! {
    // lmr[d][m] = floor(ln(d) * ln(m) / 2): later moves at higher depths
    // are reduced more.
    static ref LMR_TABLE: [[i32; MAX_LMR_MOVES]; MAX_LMR_DEPTH] = {
        let mut table = [[0i32; MAX_LMR_MOVES]; MAX_LMR_DEPTH];
        for depth in 1..MAX_LMR_DEPTH {
            for mov in 1..MAX_LMR_MOVES {
                let reduction = (depth as f64).ln() * (mov as f64).ln() / 2.0;
                table[depth][mov] = reduction.floor() as i32;
            }
        }
        table
    };
}

pub struct Search<'a> {
    board: Board,
    config: SearchConfig,
    tt: &'a mut TranspositionTable,
    info_callback: Option<InfoCallback>,

    // Repetition detection: hashes of positions played before the search
    // started, and hashes pushed on make / popped on unmake during it.
    game_history: Vec<u64>,
    search_stack: Vec<u64>,

    start_time: Instant,
    stopped: bool,
    nodes: u64,

    // Two quiet moves per ply that caused a beta cutoff.
    killers: [[Move; 2]; MAX_PLY],
}

impl<'a> Search<'a> {
    pub fn new(
        board: Board,
        config: SearchConfig,
        tt: &'a mut TranspositionTable,
        info_callback: Option<InfoCallback>,
        game_history: Vec<u64>,
    ) -> Search<'a> {
        Search {
            board,
            config,
            tt,
            info_callback,
            game_history,
            search_stack: Vec::with_capacity(MAX_PLY),
            start_time: Instant::now(),
            stopped: false,
            nodes: 0,
            killers: [[Move::null(); 2]; MAX_PLY],
        }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Runs the iterative-deepening loop and returns the best move found.
    /// Returns the null move only when the root position has no legal
    /// moves at all.
    pub fn find_best_move(&mut self) -> Move {
        self.start_time = Instant::now();
        self.stopped = false;
        self.nodes = 0;
        self.search_stack.clear();
        self.killers = [[Move::null(); 2]; MAX_PLY];
        self.tt.new_search();

        let mut best_move = Move::null();

        for depth in 1..=self.config.max_depth {
            let mut moves = self.board.get_legal_moves();
            if moves.is_empty() {
                break;
            }

            let root_hash = self.board.position().hash();
            let tt_move = self
                .tt
                .probe(root_hash)
                .map(|entry| entry.mov)
                .unwrap_or_else(Move::null);
            MoveOrder::sort(
                &mut moves,
                self.board.position(),
                tt_move,
                &[Move::null(); 2],
            );

            let mut alpha = -SCORE_INFINITY;
            let beta = SCORE_INFINITY;
            let mut best_score = -SCORE_INFINITY;
            let mut depth_best = Move::null();

            for i in 0..moves.len() {
                let mov = moves[i];
                let (undo, gives_check) = self.make(mov);

                let score = if i == 0 {
                    -self.negamax(depth - 1, -beta, -alpha, 1, gives_check, true)
                } else {
                    // Principal variation search: probe with a null window
                    // and only re-search at full width on a fail-high.
                    let mut s =
                        -self.negamax(depth - 1, -alpha - 1, -alpha, 1, gives_check, true);
                    if s > alpha && s < beta {
                        s = -self.negamax(depth - 1, -beta, -alpha, 1, gives_check, true);
                    }
                    s
                };

                self.unmake(mov, undo);

                if self.stopped {
                    break;
                }

                if score > best_score {
                    best_score = score;
                    depth_best = mov;
                }
                if score > alpha {
                    alpha = score;
                }
            }

            // A stopped iteration is discarded wholesale; the previous
            // iteration's move stands.
            if self.stopped {
                break;
            }

            best_move = depth_best;
            self.tt.store(
                root_hash,
                score_to_tt(best_score, 0),
                depth,
                Bound::Exact,
                best_move,
            );

            let elapsed = self.start_time.elapsed().as_millis() as u64;
            debug!(
                "depth {} score {} nodes {} time {}ms best {}",
                depth, best_score, self.nodes, elapsed, best_move
            );

            let pv = self.extract_pv(depth);
            let info = SearchInfo {
                depth,
                score: best_score,
                nodes: self.nodes,
                time_ms: elapsed,
                pv,
            };
            if let Some(callback) = self.info_callback.as_mut() {
                callback(&info);
            }

            // A forced mate will not improve with more depth.
            if best_score >= SCORE_MATE - self.config.max_depth {
                break;
            }
        }

        best_move
    }

    fn make(&mut self, mov: Move) -> (UndoInfo, bool) {
        self.search_stack.push(self.board.position().hash());
        let undo = self.board.make_move_unchecked(mov);
        self.nodes += 1;
        self.tt.prefetch(self.board.position().hash());
        let gen = MoveGenerator::new();
        let gives_check = gen.is_in_check(self.board.position(), self.board.position().side_to_move());
        (undo, gives_check)
    }

    fn unmake(&mut self, mov: Move, undo: UndoInfo) {
        self.board.unmake_move(mov, undo);
        self.search_stack.pop();
    }

    fn negamax(
        &mut self,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        ply: i32,
        in_check: bool,
        null_ok: bool,
    ) -> i32 {
        debug_assert!(alpha < beta);
        debug_assert!(depth >= 0);

        if self.nodes & 1023 == 0 {
            self.check_time();
        }
        if self.stopped {
            return 0;
        }

        // Draws by the fifty-move rule and by repetition are independent
        // short-circuits; both end the line at once.
        if self.board.position().halfmove_clock() >= 100 || self.is_repetition() {
            return SCORE_DRAW;
        }

        if depth == 0 {
            return self.quiescence(alpha, beta, ply);
        }

        let is_pv = beta - alpha > 1;
        let hash = self.board.position().hash();

        // Probe the table. The stored move seeds the ordering either way;
        // the stored score is only trusted at non-PV nodes with enough
        // depth behind it.
        let mut tt_move = Move::null();
        if let Some(entry) = self.tt.probe(hash) {
            tt_move = entry.mov;
            if !is_pv && entry.depth >= depth {
                let score = score_from_tt(entry.score, ply);
                match entry.bound {
                    Bound::Exact => return score,
                    Bound::Lower if score >= beta => return score,
                    Bound::Upper if score <= alpha => return score,
                    _ => {}
                }
            }
        }

        // Null-move pruning: hand the opponent a free move; if the
        // reduced search still fails high, the real position surely
        // would. Gated on non-pawn material so zugzwang endgames are not
        // pruned into oblivion.
        if null_ok
            && !is_pv
            && !in_check
            && depth >= 3
            && self.has_non_pawn_material(self.board.position().side_to_move())
        {
            let prev_ep = self.board.position().en_passant_square();
            let prev_hash = hash;
            self.search_stack.push(prev_hash);
            self.board.position_mut().make_null_move();
            let score = -self.negamax(
                depth - 1 - NULL_MOVE_REDUCTION,
                -beta,
                -beta + 1,
                ply + 1,
                false,
                false,
            );
            self.board.position_mut().unmake_null_move(prev_ep, prev_hash);
            self.search_stack.pop();

            if self.stopped {
                return 0;
            }
            if score >= beta {
                return beta;
            }
        }

        let mut moves = self.board.get_legal_moves();
        if moves.is_empty() {
            return if in_check {
                -(SCORE_MATE - ply)
            } else {
                SCORE_DRAW
            };
        }

        let killers = if (ply as usize) < MAX_PLY {
            self.killers[ply as usize]
        } else {
            [Move::null(); 2]
        };
        MoveOrder::sort(&mut moves, self.board.position(), tt_move, &killers);

        let original_alpha = alpha;
        let mut best_score = -SCORE_INFINITY;
        let mut best_move = Move::null();
        let mut cutoff = false;

        for i in 0..moves.len() {
            let mov = moves[i];
            let (undo, gives_check) = self.make(mov);

            let score = if i == 0 {
                -self.negamax(depth - 1, -beta, -alpha, ply + 1, gives_check, true)
            } else {
                // Late move reductions: quiet moves far down a well-ordered
                // list get a reduced-depth look first. Checks, captures,
                // and promotions are never reduced.
                let reducible = depth >= 3
                    && i >= 2
                    && !in_check
                    && !gives_check
                    && !mov.is_capture()
                    && !mov.is_promotion();

                if reducible {
                    let mut reduction = LMR_TABLE[(depth as usize).min(MAX_LMR_DEPTH - 1)]
                        [i.min(MAX_LMR_MOVES - 1)];
                    if reduction > depth - 2 {
                        reduction = depth - 2;
                    }

                    let mut s = -self.negamax(
                        depth - 1 - reduction,
                        -alpha - 1,
                        -alpha,
                        ply + 1,
                        gives_check,
                        true,
                    );
                    if s > alpha && reduction > 0 {
                        s = -self.negamax(depth - 1, -alpha - 1, -alpha, ply + 1, gives_check, true);
                    }
                    if s > alpha && s < beta {
                        s = -self.negamax(depth - 1, -beta, -alpha, ply + 1, gives_check, true);
                    }
                    s
                } else {
                    let mut s =
                        -self.negamax(depth - 1, -alpha - 1, -alpha, ply + 1, gives_check, true);
                    if s > alpha && s < beta {
                        s = -self.negamax(depth - 1, -beta, -alpha, ply + 1, gives_check, true);
                    }
                    s
                }
            };

            self.unmake(mov, undo);

            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = mov;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                cutoff = true;
                if !mov.is_capture() && !mov.is_promotion() {
                    self.store_killer(ply, mov);
                }
                break;
            }
        }

        let bound = if cutoff {
            Bound::Lower
        } else if best_score > original_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt
            .store(hash, score_to_tt(best_score, ply), depth, bound, best_move);

        best_score
    }

    /// Searches only captures and promotions until the position goes
    /// quiet, using the static evaluation as a stand-pat floor.
    fn quiescence(&mut self, mut alpha: i32, beta: i32, ply: i32) -> i32 {
        if self.nodes & 1023 == 0 {
            self.check_time();
        }
        if self.stopped {
            return 0;
        }

        let alpha_in = alpha;
        let hash = self.board.position().hash();

        // Any stored depth serves a quiescence node.
        if let Some(entry) = self.tt.probe(hash) {
            let score = score_from_tt(entry.score, ply);
            match entry.bound {
                Bound::Exact => return score,
                Bound::Lower if score >= beta => return score,
                Bound::Upper if score <= alpha => return score,
                _ => {}
            }
        }

        let stand_pat = eval::evaluate(self.board.position());
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut best_score = stand_pat;
        let mut best_move = Move::null();

        let mut moves = self.board.get_legal_captures();
        MoveOrder::sort_captures(&mut moves, self.board.position());

        for i in 0..moves.len() {
            let mov = moves[i];
            let undo = self.board.make_move_unchecked(mov);
            self.nodes += 1;
            let score = -self.quiescence(-beta, -alpha, ply + 1);
            self.board.unmake_move(mov, undo);

            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = mov;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if best_score > alpha_in {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt
            .store(hash, score_to_tt(best_score, ply), 0, bound, best_move);

        best_score
    }

    /// A draw is declared on the first repetition within the search path,
    /// or the second repetition within the pre-search game history (the
    /// current occurrence being the third). Positions older than the
    /// halfmove clock cannot repeat and are not examined.
    fn is_repetition(&self) -> bool {
        let current = self.board.position().hash();
        let mut lookback = self.board.position().halfmove_clock() as usize;

        for &hash in self.search_stack.iter().rev() {
            if lookback == 0 {
                return false;
            }
            lookback -= 1;
            if hash == current {
                return true;
            }
        }

        let mut seen = 0;
        for &hash in self.game_history.iter().rev() {
            if lookback == 0 {
                break;
            }
            lookback -= 1;
            if hash == current {
                seen += 1;
                if seen >= 2 {
                    return true;
                }
            }
        }

        false
    }

    fn store_killer(&mut self, ply: i32, mov: Move) {
        let ply = ply as usize;
        if ply >= MAX_PLY {
            return;
        }

        if self.killers[ply][0] != mov {
            self.killers[ply][1] = self.killers[ply][0];
            self.killers[ply][0] = mov;
        }
    }

    fn has_non_pawn_material(&self, side: Color) -> bool {
        let pos = self.board.position();
        let pieces = pos.pieces_of(side, PieceKind::Knight)
            | pos.pieces_of(side, PieceKind::Bishop)
            | pos.pieces_of(side, PieceKind::Rook)
            | pos.pieces_of(side, PieceKind::Queen);
        !pieces.is_empty()
    }

    fn check_time(&mut self) {
        if let Some(stop) = &self.config.stop_signal {
            if stop.load(Ordering::Relaxed) {
                self.stopped = true;
                return;
            }
        }

        if self.start_time.elapsed() >= self.config.search_time {
            self.stopped = true;
        }
    }

    /// Walks the transposition table from the root, following best moves
    /// while they stay legal, to recover the principal variation. Cycles
    /// through repeated positions terminate the walk.
    fn extract_pv(&mut self, max_length: i32) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut undos: Vec<UndoInfo> = Vec::new();
        let mut seen = Vec::new();

        for _ in 0..max_length {
            let hash = self.board.position().hash();
            if seen.contains(&hash) {
                break;
            }
            seen.push(hash);

            let mov = match self.tt.probe(hash) {
                Some(entry) => entry.mov,
                None => break,
            };
            if mov.is_null() || !self.board.is_move_legal(mov) {
                break;
            }

            undos.push(self.board.make_move_unchecked(mov));
            pv.push(mov);
        }

        for i in (0..pv.len()).rev() {
            self.board.unmake_move(pv[i], undos[i]);
        }

        pv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;

    fn search_with_depth(fen: &str, depth: i32) -> (Move, u64) {
        let board = Board::from_fen(fen).unwrap();
        let mut tt = TranspositionTable::new(16);
        let config = SearchConfig {
            search_time: Duration::from_secs(3600),
            max_depth: depth,
            stop_signal: None,
        };
        let mut search = Search::new(board, config, &mut tt, None, Vec::new());
        let best = search.find_best_move();
        (best, search.nodes())
    }

    #[test]
    fn finds_back_rank_mate_in_one() {
        let (best, _) = search_with_depth("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1", 3);
        assert_eq!(Move::quiet(Square::A1, Square::A8), best);
    }

    #[test]
    fn finds_mate_for_black() {
        // Mirror image: Black mates down the a-file.
        let (best, _) = search_with_depth("r3k3/8/8/8/8/8/5PPP/6K1 b - - 0 1", 3);
        assert_eq!(Move::quiet(Square::A8, Square::A1), best);
    }

    #[test]
    fn takes_a_hanging_queen() {
        let (best, _) = search_with_depth("k7/8/8/3q4/8/8/8/K2Q4 w - - 0 1", 3);
        assert_eq!(Move::capture(Square::D1, Square::D5), best);
    }

    #[test]
    fn mated_root_returns_null() {
        let (best, _) = search_with_depth("R5k1/5ppp/8/8/8/8/8/7K b - - 0 1", 3);
        assert!(best.is_null());
    }

    #[test]
    fn respects_depth_limit() {
        let (best, nodes) = search_with_depth(crate::board::Board::STARTING_FEN, 1);
        assert!(!best.is_null());
        assert!(nodes > 0);
        assert!(nodes < 100);
    }

    #[test]
    fn stop_signal_aborts_search() {
        let board = Board::new();
        let mut tt = TranspositionTable::new(16);
        let stop = Arc::new(AtomicBool::new(true));
        let config = SearchConfig {
            search_time: Duration::from_secs(3600),
            max_depth: 64,
            stop_signal: Some(Arc::clone(&stop)),
        };
        let mut search = Search::new(board, config, &mut tt, None, Vec::new());

        // The flag is polled every 1024 nodes, so a pre-set flag aborts
        // the search at the first poll instead of running to depth 64.
        let best = search.find_best_move();
        assert!(search.nodes() < 3000);

        // Whatever iterations completed before the poll still produce a
        // legal move.
        if !best.is_null() {
            assert!(Board::new().is_move_legal(best));
        }
    }

    #[test]
    fn info_callback_reports_each_depth() {
        use std::sync::Mutex;

        let board = Board::new();
        let mut tt = TranspositionTable::new(16);
        let depths = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&depths);
        let callback: InfoCallback = Box::new(move |info: &SearchInfo| {
            sink.lock().unwrap().push(info.depth);
        });
        let config = SearchConfig {
            search_time: Duration::from_secs(3600),
            max_depth: 3,
            stop_signal: None,
        };
        let mut search = Search::new(board, config, &mut tt, Some(callback), Vec::new());
        let best = search.find_best_move();

        assert!(!best.is_null());
        assert_eq!(vec![1, 2, 3], *depths.lock().unwrap());
    }

    #[test]
    fn pv_starts_with_best_move() {
        let board = Board::new();
        let mut tt = TranspositionTable::new(16);
        let pv_first = Arc::new(std::sync::Mutex::new(Move::null()));
        let sink = Arc::clone(&pv_first);
        let callback: InfoCallback = Box::new(move |info: &SearchInfo| {
            if let Some(&first) = info.pv.first() {
                *sink.lock().unwrap() = first;
            }
        });
        let config = SearchConfig {
            search_time: Duration::from_secs(3600),
            max_depth: 4,
            stop_signal: None,
        };
        let mut search = Search::new(board, config, &mut tt, Some(callback), Vec::new());
        let best = search.find_best_move();

        assert_eq!(best, *pv_first.lock().unwrap());
    }

    #[test]
    fn repetition_within_search_path() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 20 1").unwrap();
        let hash = board.position().hash();
        let mut tt = TranspositionTable::new(1);
        let mut search = Search::new(
            board,
            SearchConfig::default(),
            &mut tt,
            None,
            Vec::new(),
        );

        assert!(!search.is_repetition());
        search.search_stack.push(hash);
        assert!(search.is_repetition());
    }

    #[test]
    fn repetition_needs_two_game_history_hits() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 20 1").unwrap();
        let hash = board.position().hash();
        let mut tt = TranspositionTable::new(1);

        let mut search = Search::new(
            board.clone(),
            SearchConfig::default(),
            &mut tt,
            None,
            vec![hash],
        );
        assert!(!search.is_repetition());

        let mut search = Search::new(
            board,
            SearchConfig::default(),
            &mut tt,
            None,
            vec![hash, hash],
        );
        assert!(search.is_repetition());
    }

    #[test]
    fn halfmove_clock_limits_lookback() {
        // With a clock of zero no earlier position is reachable by
        // repetition, whatever the history says.
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let hash = board.position().hash();
        let mut tt = TranspositionTable::new(1);
        let mut search = Search::new(
            board,
            SearchConfig::default(),
            &mut tt,
            None,
            vec![hash, hash],
        );
        search.search_stack.push(hash);
        assert!(!search.is_repetition());
    }

    #[test]
    fn small_tables_round_down_to_a_power_of_two() {
        let tt = TranspositionTable::new(3);
        assert!(tt.entry_count().is_power_of_two());
    }
}
