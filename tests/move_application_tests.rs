// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! make/unmake round-trip laws: for every legal move in a set of varied
//! positions, applying and reverting the move must restore the position
//! bit-for-bit, and the incrementally maintained hash and piece-square
//! score must always agree with a from-scratch recomputation.
use castellan::{Color, MoveGenerator, Position};

static POSITIONS: &[&str] = &[
    // The starting position.
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    // Kiwipete: every special move kind is available somewhere.
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    // Promotion-heavy middlegame.
    "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    // En passant is available.
    "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1",
    // Pawn endgame with double pushes.
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
];

#[test]
fn make_unmake_round_trips_every_legal_move() {
    let gen = MoveGenerator::new();

    for &fen in POSITIONS {
        let pos = Position::from_fen(fen).unwrap();
        let moves = gen.generate_legal(&pos);
        assert!(!moves.is_empty(), "no moves in {}", fen);

        for &mov in &moves {
            let mut work = pos.clone();
            let undo = work.make_move(mov);
            work.unmake_move(mov, undo);

            assert_eq!(pos.as_fen(), work.as_fen(), "fen after {} in {}", mov, fen);
            assert_eq!(pos.hash(), work.hash(), "hash after {} in {}", mov, fen);
            assert_eq!(pos.psqt(), work.psqt(), "psqt after {} in {}", mov, fen);
            assert_eq!(pos.occupied(), work.occupied());
            assert_eq!(
                pos.king_square(Color::White),
                work.king_square(Color::White)
            );
            assert_eq!(
                pos.king_square(Color::Black),
                work.king_square(Color::Black)
            );
        }
    }
}

#[test]
fn incremental_state_matches_recomputation_after_every_move() {
    let gen = MoveGenerator::new();

    for &fen in POSITIONS {
        let pos = Position::from_fen(fen).unwrap();
        let moves = gen.generate_legal(&pos);

        for &mov in &moves {
            let mut work = pos.clone();
            work.make_move(mov);

            let incremental_hash = work.hash();
            let incremental_psqt = work.psqt();
            work.compute_hash();
            work.compute_psqt();

            assert_eq!(incremental_hash, work.hash(), "hash of {} in {}", mov, fen);
            assert_eq!(incremental_psqt, work.psqt(), "psqt of {} in {}", mov, fen);
        }
    }
}

#[test]
fn long_playout_preserves_invariants() {
    // Walk forty plies of first-legal-move chess, checking the structural
    // invariants at every step.
    let gen = MoveGenerator::new();
    let mut pos = Position::from_start_position();

    for ply in 0..40 {
        let moves = gen.generate_legal(&pos);
        if moves.is_empty() {
            break;
        }
        pos.make_move(moves[ply % moves.len()]);

        // Bitboards partition the occupancy.
        assert!((pos.pieces(Color::White) & pos.pieces(Color::Black)).is_empty());
        assert_eq!(
            pos.occupied(),
            pos.pieces(Color::White) | pos.pieces(Color::Black)
        );

        // The mailbox and the bitboards describe the same board.
        for sq in pos.occupied() {
            let piece = pos.piece_at(sq).unwrap();
            assert!(pos.pieces_of(piece.color, piece.kind).contains(sq));
        }

        // The incremental hash never drifts.
        let incremental = pos.hash();
        let mut recomputed = pos.clone();
        recomputed.compute_hash();
        assert_eq!(incremental, recomputed.hash(), "at ply {}", ply);

        // Exactly one king each.
        assert_eq!(1, pos.kings(Color::White).popcount());
        assert_eq!(1, pos.kings(Color::Black).popcount());
    }
}
