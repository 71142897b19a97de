// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The static evaluation. Every term is computed white-relative as a
//! `(mg, eg)` score pair; the pairs are summed, tapered by the remaining
//! material, and finally negated if Black is the side to move, so that
//! the search always sees "positive is good for the side to move".
//!
//! Terms: material and piece-square tables (the square component is
//! maintained incrementally by `Position`), the bishop pair, doubled and
//! isolated pawns, passed pawns, rooks on open and semi-open files,
//! mobility against a pawn-safe area, and king safety (pawn shelter,
//! pawn storms, open king files, and a quadratic attacker-danger term).
use crate::attacks;
use crate::bitboard::{Bitboard, ADJACENT_FILES, FILES, RANKS};
use crate::position::Position;
use crate::types::{Color, PieceKind};

mod pst;
mod score;

pub use score::{s, Score, TOTAL_PHASE};

pub(crate) use pst::pst_value;
use pst::{MATERIAL_VALUE, PHASE_WEIGHT};

pub const SCORE_MATE: i32 = 100_000;
pub const SCORE_INFINITY: i32 = 200_000;
pub const SCORE_DRAW: i32 = 0;

const BISHOP_PAIR_BONUS: Score = s(30, 40);
const DOUBLED_PAWN_PENALTY: Score = s(-10, -15);
const ISOLATED_PAWN_PENALTY: Score = s(-15, -20);
const PASSED_PAWN_BONUS: [Score; 8] = [
    s(0, 0),
    s(5, 10),
    s(10, 20),
    s(20, 35),
    s(35, 55),
    s(60, 90),
    s(100, 150),
    s(0, 0),
];
const ROOK_OPEN_FILE_BONUS: Score = s(15, 10);
const ROOK_SEMI_OPEN_FILE_BONUS: Score = s(8, 5);

// Mobility: score per attacked square above or below the baseline.
const KNIGHT_MOB_WEIGHT: Score = s(4, 4);
const KNIGHT_MOB_BASELINE: i32 = 4;
const BISHOP_MOB_WEIGHT: Score = s(3, 3);
const BISHOP_MOB_BASELINE: i32 = 7;
const ROOK_MOB_WEIGHT: Score = s(2, 2);
const ROOK_MOB_BASELINE: i32 = 7;
const QUEEN_MOB_WEIGHT: Score = s(1, 1);
const QUEEN_MOB_BASELINE: i32 = 14;

// King safety.
const SHELTER_PAWN_BONUS: Score = s(15, 0);
const SHELTER_STORM_PENALTY: Score = s(-10, 0);
// Semi-open file near the king (no own pawn, enemy pawn present): a
// shelter gap with an active storm threat. Fully open: the gap alone.
const KING_SEMI_OPEN_FILE_PENALTY: Score = s(-20, 0);
const KING_OPEN_FILE_PENALTY: Score = s(-10, 0);
// Attacker weights by piece kind. Knights rank highest; they leap past
// defenses and their checks are the hardest to see.
const KING_ATTACKER_WEIGHT: [i32; 6] = [0, 7, 5, 4, 4, 0];
const KING_DANGER_DIVIDER: i32 = 8;

/// Attack bitboards accumulated once per `evaluate` call and shared
/// across the terms that need them, so king safety does not recompute
/// what mobility already produced.
#[derive(Default)]
pub struct EvalState {
    pub attacked_by: [[Bitboard; 6]; 2],
    pub attacked: [Bitboard; 2],
    pub pawn_attacks: [Bitboard; 2],
}

/// Material plus piece-square tables. The square component comes from
/// the incrementally maintained `Position::psqt`; material is recounted
/// from the piece bitboards on demand.
pub fn material_and_pst(pos: &Position) -> Score {
    let mut score = pos.psqt();
    for &kind in &PieceKind::ALL {
        let balance = pos.pieces_of(Color::White, kind).popcount() as i32
            - pos.pieces_of(Color::Black, kind).popcount() as i32;
        score += balance * MATERIAL_VALUE[kind.index()];
    }
    score
}

/// The game phase in `0..=TOTAL_PHASE`: 24 with full material, 0 in a
/// bare pawn ending. Promotions can push the raw sum past the cap, so it
/// is clamped.
pub fn game_phase(pos: &Position) -> i32 {
    let mut phase = 0;
    for &kind in &[
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ] {
        phase += PHASE_WEIGHT[kind.index()] * pos.pieces_of_kind(kind).popcount() as i32;
    }
    phase.min(TOTAL_PHASE)
}

pub fn bishop_pair(pos: &Position) -> Score {
    let mut score = Score::ZERO;
    if pos.bishops(Color::White).popcount() >= 2 {
        score += BISHOP_PAIR_BONUS;
    }
    if pos.bishops(Color::Black).popcount() >= 2 {
        score -= BISHOP_PAIR_BONUS;
    }
    score
}

/// Doubled and isolated pawns, filewise.
pub fn pawn_structure(wp: Bitboard, bp: Bitboard) -> Score {
    let mut score = Score::ZERO;
    for f in 0..8 {
        let file_mask = FILES[f];
        let w_count = (wp & file_mask).popcount() as i32;
        let b_count = (bp & file_mask).popcount() as i32;

        if w_count > 1 {
            score += (w_count - 1) * DOUBLED_PAWN_PENALTY;
        }
        if b_count > 1 {
            score -= (b_count - 1) * DOUBLED_PAWN_PENALTY;
        }

        if w_count > 0 && (wp & ADJACENT_FILES[f]).is_empty() {
            score += w_count * ISOLATED_PAWN_PENALTY;
        }
        if b_count > 0 && (bp & ADJACENT_FILES[f]).is_empty() {
            score -= b_count * ISOLATED_PAWN_PENALTY;
        }
    }
    score
}

/// Passed pawns: no enemy pawn on the same or an adjacent file on any
/// rank ahead of the pawn. The bonus grows with the pawn's rank.
pub fn passed_pawns(wp: Bitboard, bp: Bitboard) -> Score {
    let mut score = Score::ZERO;

    for sq in wp {
        let f = sq.file().index();
        let r = sq.rank().index();
        let mut mask = FILES[f] | ADJACENT_FILES[f];
        for rank in RANKS.iter().take(r + 1) {
            mask &= !*rank;
        }
        if (bp & mask).is_empty() {
            score += PASSED_PAWN_BONUS[r];
        }
    }

    for sq in bp {
        let f = sq.file().index();
        let r = sq.rank().index();
        let mut mask = FILES[f] | ADJACENT_FILES[f];
        for rank in RANKS.iter().skip(r) {
            mask &= !*rank;
        }
        if (wp & mask).is_empty() {
            score -= PASSED_PAWN_BONUS[7 - r];
        }
    }

    score
}

/// Rooks on files with no friendly pawn: the full bonus when the file
/// has no enemy pawn either, half when it does.
pub fn rook_open_files(pos: &Position, wp: Bitboard, bp: Bitboard) -> Score {
    let mut score = Score::ZERO;

    for sq in pos.rooks(Color::White) {
        let file_mask = FILES[sq.file().index()];
        if (wp & file_mask).is_empty() {
            score += if (bp & file_mask).is_empty() {
                ROOK_OPEN_FILE_BONUS
            } else {
                ROOK_SEMI_OPEN_FILE_BONUS
            };
        }
    }

    for sq in pos.rooks(Color::Black) {
        let file_mask = FILES[sq.file().index()];
        if (bp & file_mask).is_empty() {
            score -= if (wp & file_mask).is_empty() {
                ROOK_OPEN_FILE_BONUS
            } else {
                ROOK_SEMI_OPEN_FILE_BONUS
            };
        }
    }

    score
}

/// Mobility for the four non-pawn, non-king piece kinds, measured
/// against a mobility area that excludes friendly pieces and squares
/// controlled by enemy pawns. Fills `state` with the attack maps as a
/// side effect for the king-safety term.
pub fn piece_eval(pos: &Position, wp: Bitboard, bp: Bitboard, state: &mut EvalState) -> Score {
    let mut score = Score::ZERO;
    let occupied = pos.occupied();

    state.pawn_attacks[Color::White.index()] = wp.shift_north_east() | wp.shift_north_west();
    state.pawn_attacks[Color::Black.index()] = bp.shift_south_east() | bp.shift_south_west();

    // Seed the king and pawn attacks into the map.
    for &color in &Color::BOTH {
        let ci = color.index();
        let king_sq = pos.king_square(color).expect("evaluated position has no king");
        let king_atk = attacks::king_attacks(king_sq);
        state.attacked_by[ci][PieceKind::King.index()] = king_atk;
        state.attacked_by[ci][PieceKind::Pawn.index()] = state.pawn_attacks[ci];
        state.attacked[ci] |= king_atk;
        state.attacked[ci] |= state.pawn_attacks[ci];
    }

    let mob_area = [
        !(pos.pieces(Color::White) | state.pawn_attacks[Color::Black.index()]),
        !(pos.pieces(Color::Black) | state.pawn_attacks[Color::White.index()]),
    ];

    for &color in &Color::BOTH {
        let ci = color.index();
        let sign = if color == Color::White { 1 } else { -1 };

        for sq in pos.knights(color) {
            let atk = attacks::knight_attacks(sq);
            state.attacked_by[ci][PieceKind::Knight.index()] |= atk;
            state.attacked[ci] |= atk;
            let mob = (atk & mob_area[ci]).popcount() as i32;
            score += sign * ((mob - KNIGHT_MOB_BASELINE) * KNIGHT_MOB_WEIGHT);
        }

        for sq in pos.bishops(color) {
            let atk = attacks::bishop_attacks(sq, occupied);
            state.attacked_by[ci][PieceKind::Bishop.index()] |= atk;
            state.attacked[ci] |= atk;
            let mob = (atk & mob_area[ci]).popcount() as i32;
            score += sign * ((mob - BISHOP_MOB_BASELINE) * BISHOP_MOB_WEIGHT);
        }

        for sq in pos.rooks(color) {
            let atk = attacks::rook_attacks(sq, occupied);
            state.attacked_by[ci][PieceKind::Rook.index()] |= atk;
            state.attacked[ci] |= atk;
            let mob = (atk & mob_area[ci]).popcount() as i32;
            score += sign * ((mob - ROOK_MOB_BASELINE) * ROOK_MOB_WEIGHT);
        }

        for sq in pos.queens(color) {
            let atk = attacks::queen_attacks(sq, occupied);
            state.attacked_by[ci][PieceKind::Queen.index()] |= atk;
            state.attacked[ci] |= atk;
            let mob = (atk & mob_area[ci]).popcount() as i32;
            score += sign * ((mob - QUEEN_MOB_BASELINE) * QUEEN_MOB_WEIGHT);
        }
    }

    score
}

/// Mobility alone, for callers that do not need the rest of the
/// evaluation.
pub fn mobility(pos: &Position) -> Score {
    let wp = pos.pawns(Color::White);
    let bp = pos.pawns(Color::Black);
    let mut state = EvalState::default();
    piece_eval(pos, wp, bp, &mut state)
}

/// King safety: pawn shelter and storms on the three files around the
/// king, penalties for open king files, and a quadratic danger term from
/// enemy piece attacks into the 3x3 king zone. The danger term is
/// mid-game only; in the endgame an active king is an asset.
pub fn king_safety(pos: &Position, wp: Bitboard, bp: Bitboard, state: &EvalState) -> Score {
    let mut score = Score::ZERO;

    for &color in &Color::BOTH {
        let ci = color.index();
        let them = 1 - ci;

        let king_sq = pos.king_square(color).expect("evaluated position has no king");
        let king_file = king_sq.file().index() as i32;
        let king_rank = king_sq.rank().index() as i32;
        let zone = attacks::king_attacks(king_sq) | Bitboard::from_square(king_sq);

        let (own_pawns, enemy_pawns) = if color == Color::White {
            (wp, bp)
        } else {
            (bp, wp)
        };

        // The two ranks in front of the king, relative to its color.
        let mut ahead_ranks = Bitboard::EMPTY;
        if color == Color::White {
            let mut r = king_rank + 1;
            while r <= (king_rank + 2).min(7) {
                ahead_ranks |= RANKS[r as usize];
                r += 1;
            }
        } else {
            let mut r = (king_rank - 2).max(0);
            while r < king_rank {
                ahead_ranks |= RANKS[r as usize];
                r += 1;
            }
        }

        let file_start = (king_file - 1).max(0);
        let file_end = (king_file + 1).min(7);

        let mut shelter_pawns = 0;
        let mut storm_pawns = 0;
        let mut term_files = Score::ZERO;

        for f in file_start..=file_end {
            let file_mask = FILES[f as usize];

            if !(own_pawns & file_mask & ahead_ranks).is_empty() {
                shelter_pawns += 1;
            }
            if !(enemy_pawns & file_mask & ahead_ranks).is_empty() {
                storm_pawns += 1;
            }

            if (own_pawns & file_mask).is_empty() {
                term_files += if (enemy_pawns & file_mask).is_empty() {
                    KING_OPEN_FILE_PENALTY
                } else {
                    KING_SEMI_OPEN_FILE_PENALTY
                };
            }
        }

        let term_shelter =
            shelter_pawns * SHELTER_PAWN_BONUS + storm_pawns * SHELTER_STORM_PENALTY;

        let mut danger = 0;
        for &kind in &[
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
        ] {
            danger += KING_ATTACKER_WEIGHT[kind.index()]
                * (state.attacked_by[them][kind.index()] & zone).popcount() as i32;
        }
        let term_danger = s(-(danger * danger) / KING_DANGER_DIVIDER, 0);

        let total = term_shelter + term_files + term_danger;
        if color == Color::White {
            score += total;
        } else {
            score -= total;
        }
    }

    score
}

/// The full static evaluation, in centipawns, from the perspective of
/// the side to move.
pub fn evaluate(pos: &Position) -> i32 {
    let wp = pos.pawns(Color::White);
    let bp = pos.pawns(Color::Black);

    let mut state = EvalState::default();
    let score = material_and_pst(pos)
        + bishop_pair(pos)
        + pawn_structure(wp, bp)
        + passed_pawns(wp, bp)
        + rook_open_files(pos, wp, bp)
        + piece_eval(pos, wp, bp, &mut state)
        + king_safety(pos, wp, bp, &state);

    let tapered = score.taper(game_phase(pos));

    match pos.side_to_move() {
        Color::White => tapered,
        Color::Black => -tapered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn starting_position_is_balanced() {
        let pos = Position::from_start_position();
        assert_eq!(0, evaluate(&pos));
    }

    #[test]
    fn evaluation_negates_with_side_to_move() {
        // Same position, opposite sides to move: the tapered score is
        // symmetric around zero.
        let white = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let black = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 b - - 0 1").unwrap();
        assert_eq!(evaluate(&white), -evaluate(&black));
        assert!(evaluate(&white) > 0);
    }

    #[test]
    fn material_advantage_dominates() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        assert!(evaluate(&pos) > 500);
    }

    #[test]
    fn phase_endpoints() {
        let start = Position::from_start_position();
        assert_eq!(TOTAL_PHASE, game_phase(&start));

        let bare = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(0, game_phase(&bare));

        // 2 knights + 2 bishops + 2 rooks + 1 queen = 1+1+1+1+2+2+4 = 12.
        let partial =
            Position::from_fen("4k3/8/8/8/8/2nnbb2/2rrq3/4K3 w - - 0 1").unwrap();
        assert_eq!(12, game_phase(&partial));
    }

    #[test]
    fn phase_is_clamped_after_promotions() {
        // Nine queens apiece would overflow the phase sum without the cap.
        let pos =
            Position::from_fen("QQQQQQQQ/QQQQQQQ1/8/4k3/4K3/8/qqqqqqq1/qqqqqqqq w - - 0 1")
                .unwrap();
        assert_eq!(TOTAL_PHASE, game_phase(&pos));
    }

    #[test]
    fn bishop_pair_requires_two() {
        let pair = Position::from_fen("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1").unwrap();
        assert_eq!(BISHOP_PAIR_BONUS, bishop_pair(&pair));

        let single = Position::from_fen("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert_eq!(Score::ZERO, bishop_pair(&single));

        let both = Position::from_fen("2b1kb2/8/8/8/8/8/8/2B1KB2 w - - 0 1").unwrap();
        assert_eq!(Score::ZERO, bishop_pair(&both));
    }

    #[test]
    fn doubled_and_isolated_pawns_penalized() {
        let pos = Position::from_fen("4k3/8/8/8/8/4P3/4P3/4K3 w - - 0 1").unwrap();
        let wp = pos.pawns(Color::White);
        let bp = pos.pawns(Color::Black);
        let score = pawn_structure(wp, bp);
        // One extra pawn on the e-file, and both pawns are isolated.
        assert_eq!(DOUBLED_PAWN_PENALTY + 2 * ISOLATED_PAWN_PENALTY, score);
    }

    #[test]
    fn connected_pawns_not_isolated() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/3PP3/4K3 w - - 0 1").unwrap();
        let score = pawn_structure(pos.pawns(Color::White), pos.pawns(Color::Black));
        assert_eq!(Score::ZERO, score);
    }

    #[test]
    fn passed_pawn_detection() {
        // The e5 pawn faces no enemy pawns on d, e, or f: passed, rank
        // index 4. The h7 black pawn is passed for Black on rank index 6,
        // mirrored to bonus index 1.
        let pos = Position::from_fen("4k3/7p/8/4P3/8/8/8/4K3 w - - 0 1").unwrap();
        let score = passed_pawns(pos.pawns(Color::White), pos.pawns(Color::Black));
        assert_eq!(PASSED_PAWN_BONUS[4] - PASSED_PAWN_BONUS[1], score);
    }

    #[test]
    fn blocked_pawn_not_passed() {
        let pos = Position::from_fen("4k3/4p3/8/4P3/8/8/8/4K3 w - - 0 1").unwrap();
        let wp = pos.pawns(Color::White);
        let bp = pos.pawns(Color::Black);
        // White's e5 pawn is blocked by e7; Black's e7 pawn is blocked by
        // e5. Neither is passed.
        assert_eq!(Score::ZERO, passed_pawns(wp, bp));
    }

    #[test]
    fn rook_file_bonuses() {
        // White rook on the open a-file, Black rook behind its own pawn.
        let pos = Position::from_fen("4k3/r6p/8/8/8/8/7P/R3K3 w - - 0 1").unwrap();
        let score = rook_open_files(&pos, pos.pawns(Color::White), pos.pawns(Color::Black));
        assert_eq!(ROOK_OPEN_FILE_BONUS, score);

        // White rook on a semi-open file (enemy pawn present).
        let pos = Position::from_fen("4k3/7p/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let wp = pos.pawns(Color::White);
        let bp = pos.pawns(Color::Black);
        // The a-file has no pawn at all for White: full bonus. No Black
        // rooks to offset it.
        assert_eq!(ROOK_OPEN_FILE_BONUS, rook_open_files(&pos, wp, bp));
    }

    #[test]
    fn eval_state_accumulates_attacks() {
        let pos = Position::from_start_position();
        let mut state = EvalState::default();
        piece_eval(
            &pos,
            pos.pawns(Color::White),
            pos.pawns(Color::Black),
            &mut state,
        );

        // Pawn attacks cover the third rank squares reachable by White's
        // pawns.
        assert!(state.pawn_attacks[0].contains(crate::types::Square::E3));
        assert!(state.pawn_attacks[1].contains(crate::types::Square::E6));

        // Knights on b1/g1 attack a3, c3, f3, h3.
        let knight_attacks = state.attacked_by[0][PieceKind::Knight.index()];
        assert!(knight_attacks.contains(crate::types::Square::A3));
        assert!(knight_attacks.contains(crate::types::Square::H3));
    }

    #[test]
    fn king_shelter_symmetric_and_penalized() {
        // Mirrored shelters cancel exactly.
        let balanced = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/6K1 w - - 0 1").unwrap();
        let state = EvalState::default();
        assert_eq!(
            Score::ZERO,
            king_safety(
                &balanced,
                balanced.pawns(Color::White),
                balanced.pawns(Color::Black),
                &state
            )
        );

        // White's pawns have advanced out of the two-rank shelter window;
        // Black keeps the full bonus.
        let exposed = Position::from_fen("6k1/5ppp/8/8/5PPP/8/8/6K1 w - - 0 1").unwrap();
        let score = king_safety(
            &exposed,
            exposed.pawns(Color::White),
            exposed.pawns(Color::Black),
            &state,
        );
        assert!(score.mg < 0);
    }
}
