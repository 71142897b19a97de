// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Standard algebraic notation for moves: piece letter, minimal
//! disambiguation, `x` on captures, `=Q` promotions, `O-O`/`O-O-O`
//! castles, and `+`/`#` suffixes.
use std::fmt::Write;

use crate::board::Board;
use crate::moves::Move;
use crate::types::PieceKind;

fn piece_letter(kind: PieceKind) -> char {
    match kind {
        PieceKind::Knight => 'N',
        PieceKind::Bishop => 'B',
        PieceKind::Rook => 'R',
        PieceKind::Queen => 'Q',
        PieceKind::King => 'K',
        PieceKind::Pawn => '?',
    }
}

// The check or mate suffix, determined by making the move on a copy.
fn suffix(board: &Board, mov: Move) -> &'static str {
    let mut copy = board.clone();
    copy.make_move_unchecked(mov);
    if copy.is_in_check() {
        if copy.is_checkmate() {
            "#"
        } else {
            "+"
        }
    } else {
        ""
    }
}

/// Renders a move in standard algebraic notation. The move must be legal
/// in the given board position; disambiguators are derived from the other
/// legal moves.
pub fn san(board: &Board, mov: Move) -> String {
    if mov.is_null() {
        return "--".to_owned();
    }

    if mov.is_castle() {
        let base = if mov.is_kingside_castle() {
            "O-O"
        } else {
            "O-O-O"
        };
        return format!("{}{}", base, suffix(board, mov));
    }

    let pos = board.position();
    let kind = pos
        .piece_at(mov.source())
        .expect("SAN for a move with an empty source square")
        .kind;
    let from = mov.source();
    let to = mov.destination();

    let mut out = String::new();

    if kind == PieceKind::Pawn {
        // Pawn moves carry a file prefix only on captures.
        if mov.is_capture() {
            write!(&mut out, "{}x", from.file()).unwrap();
        }
        write!(&mut out, "{}", to).unwrap();

        if mov.is_promotion() {
            write!(
                &mut out,
                "={}",
                piece_letter(mov.promotion_piece())
            )
            .unwrap();
        }
    } else {
        out.push(piece_letter(kind));

        // Disambiguate against other same-kind pieces that can reach the
        // same destination: file if the file differs, rank if the file
        // matches, both when necessary.
        let mut ambiguous = false;
        let mut need_file = false;
        let mut need_rank = false;

        for &other in &board.get_legal_moves() {
            if other.source() == from || other.destination() != to {
                continue;
            }
            let other_kind = match pos.piece_at(other.source()) {
                Some(piece) => piece.kind,
                None => continue,
            };
            if other_kind != kind {
                continue;
            }

            ambiguous = true;
            if other.source().file() == from.file() {
                need_rank = true;
            }
            if other.source().rank() == from.rank() {
                need_file = true;
            }
        }

        if ambiguous && !need_file && !need_rank {
            need_file = true;
        }

        if need_file {
            write!(&mut out, "{}", from.file()).unwrap();
        }
        if need_rank {
            write!(&mut out, "{}", from.rank()).unwrap();
        }

        if mov.is_capture() {
            out.push('x');
        }
        write!(&mut out, "{}", to).unwrap();
    }

    out.push_str(suffix(board, mov));
    out
}

#[cfg(test)]
mod tests {
    use super::san;
    use crate::board::Board;
    use crate::moves::Move;
    use crate::types::{PieceKind, Square};

    #[test]
    fn pawn_moves() {
        let board = Board::new();
        assert_eq!("e4", san(&board, Move::double_pawn_push(Square::E2, Square::E4)));
        assert_eq!("e3", san(&board, Move::quiet(Square::E2, Square::E3)));
    }

    #[test]
    fn pawn_captures_carry_file() {
        let board = Board::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!("exd5", san(&board, Move::capture(Square::E4, Square::D5)));
    }

    #[test]
    fn piece_moves() {
        let board = Board::new();
        assert_eq!("Nf3", san(&board, Move::quiet(Square::G1, Square::F3)));
    }

    #[test]
    fn disambiguation_by_file() {
        // Rooks on a1 and h1 can both reach d1.
        let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K2R w - - 0 1").unwrap();
        assert_eq!("Rad1", san(&board, Move::quiet(Square::A1, Square::D1)));
        assert_eq!("Rhf1", san(&board, Move::quiet(Square::H1, Square::F1)));
    }

    #[test]
    fn disambiguation_by_rank() {
        // Rooks on a1 and a5 share a file; the rank disambiguates.
        let board = Board::from_fen("4k3/8/8/R7/8/8/8/R3K3 w - - 0 1").unwrap();
        assert_eq!("R1a3", san(&board, Move::quiet(Square::A1, Square::A3)));
        assert_eq!("R5a3", san(&board, Move::quiet(Square::A5, Square::A3)));
    }

    #[test]
    fn castles() {
        let board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        assert_eq!("O-O", san(&board, Move::kingside_castle(Square::E1, Square::G1)));
        assert_eq!(
            "O-O-O",
            san(&board, Move::queenside_castle(Square::E1, Square::C1))
        );
    }

    #[test]
    fn promotion() {
        let board = Board::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(
            "a8=Q+",
            san(
                &board,
                Move::promotion(Square::A7, Square::A8, PieceKind::Queen)
            )
        );
        assert_eq!(
            "a8=N",
            san(
                &board,
                Move::promotion(Square::A7, Square::A8, PieceKind::Knight)
            )
        );
    }

    #[test]
    fn check_and_mate_suffixes() {
        let board = Board::from_fen("3k4/8/8/8/8/8/8/K3R3 w - - 0 1").unwrap();
        assert_eq!("Re8+", san(&board, Move::quiet(Square::E1, Square::E8)));

        // Ra8 delivers a back-rank mate.
        let board = Board::from_fen("6k1/5ppp/8/8/8/8/8/R6K w - - 0 1").unwrap();
        assert_eq!("Ra8#", san(&board, Move::quiet(Square::A1, Square::A8)));
    }

    #[test]
    fn en_passant_renders_as_pawn_capture() {
        let board = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert_eq!("exd6", san(&board, Move::en_passant(Square::E5, Square::D6)));
    }
}
