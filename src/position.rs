// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The authoritative board state. A `Position` keeps a 64-entry mailbox,
//! one bitboard per piece kind and per color, a cached king square for
//! each color, the usual game-state fields, and two incrementally
//! maintained quantities: the Zobrist hash and the white-relative
//! piece-square score. `make_move` and `unmake_move` are the engine's
//! hot path; after any make/unmake pair the position is bit-identical to
//! what it was before.
use std::convert::TryFrom;
use std::fmt::{self, Write};

use crate::bitboard::{self, Bitboard};
use crate::eval::{pst_value, Score};
use crate::moves::Move;
use crate::types::{CastleStatus, Color, File, Piece, PieceKind, Rank, Square};
use crate::zobrist;

/// Possible errors that can arise when parsing a FEN string into a `Position`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FenParseError {
    UnexpectedChar(char),
    UnexpectedEnd,
    InvalidDigit,
    FileDoesNotSumToEight,
    UnknownPiece,
    InvalidSideToMove,
    InvalidCastle,
    InvalidEnPassant,
    EmptyHalfmove,
    InvalidHalfmove,
    EmptyFullmove,
    InvalidFullmove,
}

impl fmt::Display for FenParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FenParseError::UnexpectedChar(c) => write!(f, "unexpected character: {}", c),
            FenParseError::UnexpectedEnd => write!(f, "unexpected end of input"),
            FenParseError::InvalidDigit => write!(f, "invalid digit in piece placement"),
            FenParseError::FileDoesNotSumToEight => write!(f, "rank does not sum to eight files"),
            FenParseError::UnknownPiece => write!(f, "unknown piece character"),
            FenParseError::InvalidSideToMove => write!(f, "side to move must be 'w' or 'b'"),
            FenParseError::InvalidCastle => write!(f, "invalid castling rights"),
            FenParseError::InvalidEnPassant => write!(f, "invalid en passant square"),
            FenParseError::EmptyHalfmove => write!(f, "empty halfmove clock"),
            FenParseError::InvalidHalfmove => write!(f, "invalid halfmove clock"),
            FenParseError::EmptyFullmove => write!(f, "empty fullmove number"),
            FenParseError::InvalidFullmove => write!(f, "invalid fullmove number"),
        }
    }
}

/// Errors reported when a parsed position violates the board invariants.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FenValidationError {
    WrongKingCount,
    PawnOnBackRank,
    InvalidEnPassantRank,
}

impl fmt::Display for FenValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FenValidationError::WrongKingCount => {
                write!(f, "position must have exactly one king of each color")
            }
            FenValidationError::PawnOnBackRank => {
                write!(f, "pawns cannot stand on rank 1 or rank 8")
            }
            FenValidationError::InvalidEnPassantRank => {
                write!(f, "en passant square is inconsistent with the side to move")
            }
        }
    }
}

/// The combined error surfaced by `Board::from_fen`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FenError {
    Parse(FenParseError),
    Validation(FenValidationError),
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FenError::Parse(e) => write!(f, "{}", e),
            FenError::Validation(e) => write!(f, "{}", e),
        }
    }
}

impl From<FenParseError> for FenError {
    fn from(e: FenParseError) -> FenError {
        FenError::Parse(e)
    }
}

impl From<FenValidationError> for FenError {
    fn from(e: FenValidationError) -> FenError {
        FenError::Validation(e)
    }
}

/// Everything needed to exactly reverse one `make_move`: the captured
/// piece (the en-passant victim included), and the game-state fields the
/// move overwrote.
#[derive(Copy, Clone, Debug)]
pub struct UndoInfo {
    captured: Option<Piece>,
    castling: CastleStatus,
    en_passant_square: Option<Square>,
    halfmove_clock: u32,
    hash: u64,
}

#[derive(Clone, Debug)]
pub struct Position {
    board: [Option<Piece>; 64],
    piece_bbs: [Bitboard; 6],
    color_bbs: [Bitboard; 2],
    occupied: Bitboard,
    king_squares: [Option<Square>; 2],
    psqt: Score,
    side_to_move: Color,
    castling: CastleStatus,
    en_passant_square: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    hash: u64,
}

//
// Board state getters
//

impl Position {
    pub fn new() -> Position {
        Position {
            board: [None; 64],
            piece_bbs: [Bitboard::EMPTY; 6],
            color_bbs: [Bitboard::EMPTY; 2],
            occupied: Bitboard::EMPTY,
            king_squares: [None; 2],
            psqt: Score::ZERO,
            side_to_move: Color::White,
            castling: CastleStatus::empty(),
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
        }
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.index()]
    }

    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_square
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling_rights(&self) -> CastleStatus {
        self.castling
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// The incrementally maintained white-relative piece-square score.
    pub fn psqt(&self) -> Score {
        self.psqt
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.king_squares[color.index()]
    }

    pub fn can_castle_kingside(&self, color: Color) -> bool {
        self.castling.contains(CastleStatus::kingside(color))
    }

    pub fn can_castle_queenside(&self, color: Color) -> bool {
        self.castling.contains(CastleStatus::queenside(color))
    }

    /// All pieces of one color.
    pub fn pieces(&self, color: Color) -> Bitboard {
        self.color_bbs[color.index()]
    }

    /// All pieces of one kind, either color.
    pub fn pieces_of_kind(&self, kind: PieceKind) -> Bitboard {
        self.piece_bbs[kind.index()]
    }

    /// All pieces of one kind belonging to one color.
    pub fn pieces_of(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.piece_bbs[kind.index()] & self.color_bbs[color.index()]
    }

    pub fn occupied(&self) -> Bitboard {
        self.occupied
    }

    pub fn pawns(&self, color: Color) -> Bitboard {
        self.pieces_of(color, PieceKind::Pawn)
    }

    pub fn knights(&self, color: Color) -> Bitboard {
        self.pieces_of(color, PieceKind::Knight)
    }

    pub fn bishops(&self, color: Color) -> Bitboard {
        self.pieces_of(color, PieceKind::Bishop)
    }

    pub fn rooks(&self, color: Color) -> Bitboard {
        self.pieces_of(color, PieceKind::Rook)
    }

    pub fn queens(&self, color: Color) -> Bitboard {
        self.pieces_of(color, PieceKind::Queen)
    }

    pub fn kings(&self, color: Color) -> Bitboard {
        self.pieces_of(color, PieceKind::King)
    }
}

//
// Bulk board construction. These setters keep the mailbox, bitboards, and
// king cache consistent but deliberately do not touch the hash or the
// piece-square score; `compute_hash` and `compute_psqt` are called once
// after bulk construction (e.g. by the FEN parser).
//

impl Position {
    pub fn set_piece(&mut self, square: Square, piece: Piece) {
        if let Some(old) = self.board[square.index()] {
            self.piece_bbs[old.kind.index()].remove(square);
            self.color_bbs[old.color.index()].remove(square);
        }

        self.board[square.index()] = Some(piece);
        self.piece_bbs[piece.kind.index()].insert(square);
        self.color_bbs[piece.color.index()].insert(square);
        self.update_occupied();

        if piece.kind == PieceKind::King {
            self.king_squares[piece.color.index()] = Some(square);
        }
    }

    pub fn clear_square(&mut self, square: Square) {
        if let Some(old) = self.board[square.index()] {
            self.piece_bbs[old.kind.index()].remove(square);
            self.color_bbs[old.color.index()].remove(square);
            if old.kind == PieceKind::King {
                self.king_squares[old.color.index()] = None;
            }
        }
        self.board[square.index()] = None;
        self.update_occupied();
    }

    /// Recomputes the Zobrist hash from scratch. Called once after bulk
    /// construction; the hash is maintained incrementally afterwards.
    pub fn compute_hash(&mut self) {
        self.hash = zobrist::hash(self);
    }

    /// Recomputes the piece-square score from scratch, the counterpart of
    /// `compute_hash` for the evaluation state.
    pub fn compute_psqt(&mut self) {
        let mut score = Score::ZERO;
        for sq in self.occupied {
            let piece = self.board[sq.index()].expect("occupied square with empty mailbox");
            score += pst_value(piece.kind, piece.color, sq);
        }
        self.psqt = score;
    }
}

//
// Move application. The private helpers below are the hot path: they
// update the mailbox, both bitboard sets, the king cache, the hash, and
// the piece-square score with XOR toggles and no redundant work.
//

impl Position {
    fn move_piece(&mut self, from: Square, to: Square, kind: PieceKind, color: Color) {
        let from_to = Bitboard::from_square(from) | Bitboard::from_square(to);
        self.piece_bbs[kind.index()] ^= from_to;
        self.color_bbs[color.index()] ^= from_to;
        self.board[to.index()] = self.board[from.index()].take();
        self.psqt -= pst_value(kind, color, from);
        self.psqt += pst_value(kind, color, to);
        self.hash ^= zobrist::piece(kind, color, from);
        self.hash ^= zobrist::piece(kind, color, to);
        if kind == PieceKind::King {
            self.king_squares[color.index()] = Some(to);
        }
    }

    fn put_piece(&mut self, sq: Square, kind: PieceKind, color: Color) {
        let bb = Bitboard::from_square(sq);
        self.piece_bbs[kind.index()] ^= bb;
        self.color_bbs[color.index()] ^= bb;
        self.board[sq.index()] = Some(Piece::new(kind, color));
        self.psqt += pst_value(kind, color, sq);
        self.hash ^= zobrist::piece(kind, color, sq);
        if kind == PieceKind::King {
            self.king_squares[color.index()] = Some(sq);
        }
    }

    fn remove_piece(&mut self, sq: Square, kind: PieceKind, color: Color) {
        let bb = Bitboard::from_square(sq);
        self.piece_bbs[kind.index()] ^= bb;
        self.color_bbs[color.index()] ^= bb;
        self.board[sq.index()] = None;
        self.psqt -= pst_value(kind, color, sq);
        self.hash ^= zobrist::piece(kind, color, sq);
        if kind == PieceKind::King {
            self.king_squares[color.index()] = None;
        }
    }

    fn update_occupied(&mut self) {
        self.occupied = self.color_bbs[0] | self.color_bbs[1];
    }

    /// Applies a move to the position. The caller is responsible for the
    /// move being at least pseudo-legal; the returned `UndoInfo` reverses
    /// the move exactly via `unmake_move`.
    pub fn make_move(&mut self, mov: Move) -> UndoInfo {
        debug_assert!(!mov.is_null());

        let us = self.side_to_move;
        let them = us.opponent();
        let from = mov.source();
        let to = mov.destination();
        let moved = self.board[from.index()]
            .expect("invalid move: no piece at source square");

        let mut undo = UndoInfo {
            captured: None,
            castling: self.castling,
            en_passant_square: self.en_passant_square,
            halfmove_clock: self.halfmove_clock,
            hash: self.hash,
        };

        // The castling and en-passant keys are toggled out here and back in
        // at the end, once their post-move values are known.
        self.hash ^= zobrist::castling(self.castling);
        if let Some(ep) = self.en_passant_square {
            self.hash ^= zobrist::en_passant(ep.file());
        }

        if mov.is_castle() {
            // The move encodes the king's travel; the rook swings from the
            // corner to the inside square on the same rank.
            self.move_piece(from, to, PieceKind::King, us);
            let (rook_from, rook_to) = if mov.is_kingside_castle() {
                (from.plus(3), from.plus(1))
            } else {
                (from.plus(-4), from.plus(-1))
            };
            self.move_piece(rook_from, rook_to, PieceKind::Rook, us);
        } else if mov.is_en_passant() {
            // The captured pawn is one rank behind the destination square,
            // relative to the mover.
            let victim_sq = match us {
                Color::White => to.plus(-8),
                Color::Black => to.plus(8),
            };
            let victim = self.board[victim_sq.index()]
                .expect("invalid move: en passant without victim");
            undo.captured = Some(victim);
            self.remove_piece(victim_sq, victim.kind, victim.color);
            self.move_piece(from, to, PieceKind::Pawn, us);
        } else {
            if mov.is_capture() {
                let captured = self.board[to.index()]
                    .expect("invalid move: no piece at capture target");
                undo.captured = Some(captured);
                self.remove_piece(to, captured.kind, captured.color);
            }

            if mov.is_promotion() {
                self.remove_piece(from, PieceKind::Pawn, us);
                self.put_piece(to, mov.promotion_piece(), us);
            } else {
                self.move_piece(from, to, moved.kind, us);
            }
        }

        self.update_occupied();

        if moved.kind == PieceKind::Pawn || mov.is_capture() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.update_castling_rights(mov, moved, them);

        self.en_passant_square = if mov.is_double_pawn_push() {
            Some(match us {
                Color::White => from.plus(8),
                Color::Black => from.plus(-8),
            })
        } else {
            None
        };

        self.hash ^= zobrist::castling(self.castling);
        if let Some(ep) = self.en_passant_square {
            self.hash ^= zobrist::en_passant(ep.file());
        }
        self.hash ^= zobrist::side();
        self.side_to_move = them;

        undo
    }

    /// Exactly reverses a `make_move`. The same move and the `UndoInfo` it
    /// returned must be supplied.
    pub fn unmake_move(&mut self, mov: Move, undo: UndoInfo) {
        let us = self.side_to_move.opponent();
        self.side_to_move = us;

        let from = mov.source();
        let to = mov.destination();

        if mov.is_castle() {
            self.move_piece(to, from, PieceKind::King, us);
            let (rook_from, rook_to) = if mov.is_kingside_castle() {
                (from.plus(3), from.plus(1))
            } else {
                (from.plus(-4), from.plus(-1))
            };
            self.move_piece(rook_to, rook_from, PieceKind::Rook, us);
        } else if mov.is_en_passant() {
            self.move_piece(to, from, PieceKind::Pawn, us);
            let victim_sq = match us {
                Color::White => to.plus(-8),
                Color::Black => to.plus(8),
            };
            let victim = undo.captured.expect("unmake en passant without victim");
            self.put_piece(victim_sq, victim.kind, victim.color);
        } else {
            if mov.is_promotion() {
                self.remove_piece(to, mov.promotion_piece(), us);
                self.put_piece(from, PieceKind::Pawn, us);
            } else {
                let moved = self.board[to.index()]
                    .expect("unmake move: no piece at destination square");
                self.move_piece(to, from, moved.kind, us);
            }

            if let Some(captured) = undo.captured {
                self.put_piece(to, captured.kind, captured.color);
            }
        }

        self.update_occupied();

        self.castling = undo.castling;
        self.en_passant_square = undo.en_passant_square;
        self.halfmove_clock = undo.halfmove_clock;
        self.hash = undo.hash;

        if us == Color::Black {
            self.fullmove_number -= 1;
        }
    }

    /// Flips the side to move without moving a piece, for null-move
    /// pruning. The caller saves the previous en-passant square and hash
    /// and restores them with `unmake_null_move`.
    pub fn make_null_move(&mut self) {
        if let Some(ep) = self.en_passant_square {
            self.hash ^= zobrist::en_passant(ep.file());
        }
        self.en_passant_square = None;
        self.hash ^= zobrist::side();
        self.side_to_move = self.side_to_move.opponent();
    }

    pub fn unmake_null_move(&mut self, prev_ep: Option<Square>, prev_hash: u64) {
        self.side_to_move = self.side_to_move.opponent();
        self.en_passant_square = prev_ep;
        self.hash = prev_hash;
    }

    fn update_castling_rights(&mut self, mov: Move, moved: Piece, them: Color) {
        let us = moved.color;

        // Any king move forfeits both rights for that side; a rook move off
        // a starting corner forfeits the matching right.
        if moved.kind == PieceKind::King {
            self.castling -= CastleStatus::both(us);
        } else if moved.kind == PieceKind::Rook {
            if mov.source() == queenside_rook(us) {
                self.castling -= CastleStatus::queenside(us);
            } else if mov.source() == kingside_rook(us) {
                self.castling -= CastleStatus::kingside(us);
            }
        }

        // Capturing on a starting corner strips the opponent's right, even
        // when the piece standing there is no longer the original rook.
        if mov.is_capture() {
            if mov.destination() == queenside_rook(them) {
                self.castling -= CastleStatus::queenside(them);
            } else if mov.destination() == kingside_rook(them) {
                self.castling -= CastleStatus::kingside(them);
            }
        }
    }
}

//
// FEN parsing and serialization.
//

impl Position {
    pub const STARTING_FEN: &'static str =
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    pub fn from_start_position() -> Position {
        Position::from_fen(Position::STARTING_FEN).unwrap()
    }

    /// Constructs a new position from a FEN representation of a board
    /// position. Parse errors reject malformed text; structural rules
    /// (king counts and the like) are checked separately by `validate`.
    pub fn from_fen<S: AsRef<str>>(fen: S) -> Result<Position, FenParseError> {
        use std::iter::Peekable;
        use std::str::Chars;

        type Stream<'a> = Peekable<Chars<'a>>;

        fn eat(iter: &mut Stream, expected: char) -> Result<(), FenParseError> {
            match iter.next() {
                Some(c) if c == expected => Ok(()),
                Some(c) => Err(FenParseError::UnexpectedChar(c)),
                None => Err(FenParseError::UnexpectedEnd),
            }
        }

        fn advance(iter: &mut Stream) {
            let _ = iter.next();
        }

        fn peek(iter: &mut Stream) -> Result<char, FenParseError> {
            if let Some(c) = iter.peek() {
                Ok(*c)
            } else {
                Err(FenParseError::UnexpectedEnd)
            }
        }

        fn eat_side_to_move(iter: &mut Stream) -> Result<Color, FenParseError> {
            let side = match peek(iter)? {
                'w' => Color::White,
                'b' => Color::Black,
                _ => return Err(FenParseError::InvalidSideToMove),
            };

            advance(iter);
            Ok(side)
        }

        fn eat_castle_status(iter: &mut Stream) -> Result<CastleStatus, FenParseError> {
            if peek(iter)? == '-' {
                advance(iter);
                return Ok(CastleStatus::empty());
            }

            let mut status = CastleStatus::empty();
            for _ in 0..4 {
                match peek(iter)? {
                    'K' => status |= CastleStatus::WHITE_KINGSIDE,
                    'Q' => status |= CastleStatus::WHITE_QUEENSIDE,
                    'k' => status |= CastleStatus::BLACK_KINGSIDE,
                    'q' => status |= CastleStatus::BLACK_QUEENSIDE,
                    ' ' => break,
                    _ => return Err(FenParseError::InvalidCastle),
                }

                advance(iter);
            }

            Ok(status)
        }

        fn eat_en_passant(iter: &mut Stream) -> Result<Option<Square>, FenParseError> {
            let c = peek(iter)?;
            if c == '-' {
                advance(iter);
                return Ok(None);
            }

            if let Ok(file) = File::try_from(c) {
                advance(iter);
                let rank_c = peek(iter)?;
                if let Ok(rank) = Rank::try_from(rank_c) {
                    advance(iter);
                    Ok(Some(Square::of(file, rank)))
                } else {
                    Err(FenParseError::InvalidEnPassant)
                }
            } else {
                Err(FenParseError::InvalidEnPassant)
            }
        }

        fn eat_halfmove(iter: &mut Stream) -> Result<u32, FenParseError> {
            let mut buf = String::new();
            loop {
                let c = peek(iter)?;
                if !c.is_digit(10) {
                    break;
                }

                buf.push(c);
                advance(iter);
            }

            if buf.is_empty() {
                return Err(FenParseError::EmptyHalfmove);
            }

            buf.parse::<u32>().map_err(|_| FenParseError::InvalidHalfmove)
        }

        fn eat_fullmove(iter: &mut Stream) -> Result<u32, FenParseError> {
            let mut buf = String::new();
            for ch in iter {
                if !ch.is_digit(10) {
                    if buf.is_empty() {
                        return Err(FenParseError::EmptyFullmove);
                    }

                    break;
                }

                buf.push(ch);
            }

            if buf.is_empty() {
                return Err(FenParseError::EmptyFullmove);
            }

            buf.parse::<u32>().map_err(|_| FenParseError::InvalidFullmove)
        }

        let mut pos = Position::new();
        let str_ref = fen.as_ref();
        let iter = &mut str_ref.chars().peekable();
        for rank in Rank::all().rev() {
            let mut file = File::A as usize;
            while file <= File::H as usize {
                let c = peek(iter)?;
                // Digits 1 through 8 indicate empty squares.
                if c.is_digit(10) {
                    if c < '1' || c > '8' {
                        return Err(FenParseError::InvalidDigit);
                    }

                    let value = c as usize - 48;
                    file += value;
                    if file > 8 {
                        return Err(FenParseError::FileDoesNotSumToEight);
                    }

                    advance(iter);
                    continue;
                }

                // If it's not a digit, it represents a piece.
                let piece = match Piece::from_fen_char(c) {
                    Some(piece) => piece,
                    None => return Err(FenParseError::UnknownPiece),
                };

                let square = Square::of(File::from_index(file), rank);
                pos.set_piece(square, piece);
                advance(iter);
                file += 1;
            }

            if rank != Rank::One {
                eat(iter, '/')?;
            }
        }

        eat(iter, ' ')?;
        pos.side_to_move = eat_side_to_move(iter)?;
        eat(iter, ' ')?;
        pos.castling = eat_castle_status(iter)?;
        eat(iter, ' ')?;
        pos.en_passant_square = eat_en_passant(iter)?;
        eat(iter, ' ')?;
        pos.halfmove_clock = eat_halfmove(iter)?;
        eat(iter, ' ')?;
        pos.fullmove_number = eat_fullmove(iter)?;
        pos.compute_hash();
        pos.compute_psqt();
        Ok(pos)
    }

    /// Checks the structural invariants that a parsed FEN must satisfy:
    /// exactly one king per side, no pawns on the back ranks, and an
    /// en-passant square on the rank implied by the side to move.
    pub fn validate(&self) -> Result<(), FenValidationError> {
        if self.kings(Color::White).popcount() != 1 || self.kings(Color::Black).popcount() != 1 {
            return Err(FenValidationError::WrongKingCount);
        }

        let pawns = self.pieces_of_kind(PieceKind::Pawn);
        let back_ranks = bitboard::RANKS[0] | bitboard::RANKS[7];
        if !(pawns & back_ranks).is_empty() {
            return Err(FenValidationError::PawnOnBackRank);
        }

        if let Some(ep) = self.en_passant_square {
            let expected = match self.side_to_move {
                Color::White => Rank::Six,
                Color::Black => Rank::Three,
            };
            if ep.rank() != expected {
                return Err(FenValidationError::InvalidEnPassantRank);
            }
        }

        Ok(())
    }

    pub fn as_fen(&self) -> String {
        let mut buf = String::new();
        for rank in Rank::all().rev() {
            let mut empty_squares = 0;
            for file in File::all() {
                let square = Square::of(file, rank);
                if let Some(piece) = self.piece_at(square) {
                    if empty_squares != 0 {
                        write!(&mut buf, "{}", empty_squares).unwrap();
                    }
                    write!(&mut buf, "{}", piece).unwrap();
                    empty_squares = 0;
                } else {
                    empty_squares += 1;
                }
            }

            if empty_squares != 0 {
                write!(&mut buf, "{}", empty_squares).unwrap();
            }

            if rank != Rank::One {
                buf.push('/');
            }
        }

        buf.push(' ');
        match self.side_to_move() {
            Color::White => buf.push('w'),
            Color::Black => buf.push('b'),
        }
        buf.push(' ');
        if self.castling.is_empty() {
            buf.push('-');
        } else {
            if self.can_castle_kingside(Color::White) {
                buf.push('K');
            }
            if self.can_castle_queenside(Color::White) {
                buf.push('Q');
            }
            if self.can_castle_kingside(Color::Black) {
                buf.push('k');
            }
            if self.can_castle_queenside(Color::Black) {
                buf.push('q');
            }
        }
        buf.push(' ');
        if let Some(ep_square) = self.en_passant_square() {
            write!(&mut buf, "{}", ep_square).unwrap();
        } else {
            buf.push('-');
        }
        buf.push(' ');
        write!(
            &mut buf,
            "{} {}",
            self.halfmove_clock(),
            self.fullmove_number()
        )
        .unwrap();
        buf
    }
}

//
// Trait implementations
//

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in Rank::all().rev() {
            for file in File::all() {
                let sq = Square::of(file, rank);
                if let Some(piece) = self.piece_at(sq) {
                    write!(f, " {} ", piece)?;
                } else {
                    write!(f, " . ")?;
                }
            }

            writeln!(f, "| {}", rank)?;
        }

        for _ in File::all() {
            write!(f, "---")?;
        }

        writeln!(f)?;
        for file in File::all() {
            write!(f, " {} ", file)?;
        }

        writeln!(f)?;
        Ok(())
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new()
    }
}

fn kingside_rook(color: Color) -> Square {
    match color {
        Color::White => Square::H1,
        Color::Black => Square::H8,
    }
}

fn queenside_rook(color: Color) -> Square {
    match color {
        Color::White => Square::A1,
        Color::Black => Square::A8,
    }
}
