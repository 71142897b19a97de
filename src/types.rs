// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The core board vocabulary: squares, files, ranks, colors, piece
//! kinds, pieces, and castling rights. Everything here is a thin wrapper
//! over a small integer, because all of these types spend their lives
//! indexing tables.
use num_traits::FromPrimitive;
use std::convert::TryFrom;
use std::fmt::{self, Display, Write};

use crate::attacks;
use crate::bitboard::Bitboard;

// The fieldless enums below all index fixed-size tables. This stamps out
// the two conversions each of them needs; `index` is the discriminant and
// `from_index` is its checked inverse.
macro_rules! table_enum {
    ($ty:ident, $count:expr) => {
        impl $ty {
            pub const COUNT: usize = $count;

            pub fn index(self) -> usize {
                self as usize
            }

            pub fn from_index(index: usize) -> $ty {
                <$ty as FromPrimitive>::from_usize(index).expect("table index out of range")
            }
        }
    };
}

/// A board square. Squares are numbered 0 through 63 in little-endian
/// rank-file order: a1 is 0, h1 is 7, a8 is 56, and h8 is 63, so
/// `file = index & 7` and `rank = index >> 3`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Square(u8);

// Named constants for all sixty-four squares.
macro_rules! squares {
    ($($name:ident = $index:expr),* $(,)?) => {
        impl Square {
            $(pub const $name: Square = Square($index);)*
        }
    };
}

#[rustfmt::skip]
squares! {
    A1 =  0, B1 =  1, C1 =  2, D1 =  3, E1 =  4, F1 =  5, G1 =  6, H1 =  7,
    A2 =  8, B2 =  9, C2 = 10, D2 = 11, E2 = 12, F2 = 13, G2 = 14, H2 = 15,
    A3 = 16, B3 = 17, C3 = 18, D3 = 19, E3 = 20, F3 = 21, G3 = 22, H3 = 23,
    A4 = 24, B4 = 25, C4 = 26, D4 = 27, E4 = 28, F4 = 29, G4 = 30, H4 = 31,
    A5 = 32, B5 = 33, C5 = 34, D5 = 35, E5 = 36, F5 = 37, G5 = 38, H5 = 39,
    A6 = 40, B6 = 41, C6 = 42, D6 = 43, E6 = 44, F6 = 45, G6 = 46, H6 = 47,
    A7 = 48, B7 = 49, C7 = 50, D7 = 51, E7 = 52, F7 = 53, G7 = 54, H7 = 55,
    A8 = 56, B8 = 57, C8 = 58, D8 = 59, E8 = 60, F8 = 61, G8 = 62, H8 = 63,
}

impl Square {
    pub const COUNT: usize = 64;

    /// The square at a raw 0..=63 index.
    pub fn from_index(index: usize) -> Square {
        debug_assert!(index < Square::COUNT);
        Square(index as u8)
    }

    pub fn of(file: File, rank: Rank) -> Square {
        Square(((rank.index() << 3) | file.index()) as u8)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub fn file(self) -> File {
        File::from_index(self.index() & 7)
    }

    pub fn rank(self) -> Rank {
        Rank::from_index(self.index() >> 3)
    }

    /// The square `offset` steps away in index space. Staying on the
    /// board is the caller's obligation.
    pub fn plus(self, offset: i32) -> Square {
        let index = self.0 as i32 + offset;
        debug_assert!((0..64).contains(&index));
        Square(index as u8)
    }

    /// Mirrors the square vertically (a1 <-> a8). White-relative tables
    /// are read through this mirror for Black.
    pub fn flip(self) -> Square {
        Square(self.0 ^ 56)
    }

    /// Parses coordinate notation such as `e4`.
    pub fn parse(s: &str) -> Option<Square> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = File::try_from(bytes[0] as char).ok()?;
        let rank = Rank::try_from(bytes[1] as char).ok()?;
        Some(Square::of(file, rank))
    }

    /// Every square, a1 up through h8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..Square::COUNT).map(Square::from_index)
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum File {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

table_enum!(File, 8);

impl File {
    pub fn all() -> impl DoubleEndedIterator<Item = File> {
        (0..File::COUNT).map(File::from_index)
    }
}

impl Display for File {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_char((b'a' + self.index() as u8) as char)
    }
}

impl TryFrom<char> for File {
    type Error = ();

    fn try_from(c: char) -> Result<File, ()> {
        match c {
            'a'..='h' => Ok(File::from_index((c as u8 - b'a') as usize)),
            _ => Err(()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum Rank {
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
}

table_enum!(Rank, 8);

impl Rank {
    pub fn all() -> impl DoubleEndedIterator<Item = Rank> {
        (0..Rank::COUNT).map(Rank::from_index)
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_char((b'1' + self.index() as u8) as char)
    }
}

impl TryFrom<char> for Rank {
    type Error = ();

    fn try_from(c: char) -> Result<Rank, ()> {
        match c {
            '1'..='8' => Ok(Rank::from_index((c as u8 - b'1') as usize)),
            _ => Err(()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum Color {
    White,
    Black,
}

table_enum!(Color, 2);

impl Color {
    pub const BOTH: [Color; 2] = [Color::White, Color::Black];

    /// The other side.
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_char(if *self == Color::White { 'w' } else { 'b' })
    }
}

// Lowercase FEN letters, in PieceKind order.
const KIND_CHARS: [char; 6] = ['p', 'n', 'b', 'r', 'q', 'k'];

#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

table_enum!(PieceKind, 6);

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// The lowercase FEN letter for this kind.
    pub fn as_char(self) -> char {
        KIND_CHARS[self.index()]
    }

    fn from_char(c: char) -> Option<PieceKind> {
        KIND_CHARS
            .iter()
            .position(|&letter| letter == c)
            .map(PieceKind::from_index)
    }
}

impl Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_char(self.as_char())
    }
}

bitflags! {
    /// The four castling permissions, one bit each, in FEN order `KQkq`.
    pub struct CastleStatus: u8 {
        const WHITE_KINGSIDE = 1 << 0;
        const WHITE_QUEENSIDE = 1 << 1;
        const BLACK_KINGSIDE = 1 << 2;
        const BLACK_QUEENSIDE = 1 << 3;
    }
}

impl CastleStatus {
    pub fn kingside(color: Color) -> CastleStatus {
        match color {
            Color::White => CastleStatus::WHITE_KINGSIDE,
            Color::Black => CastleStatus::BLACK_KINGSIDE,
        }
    }

    pub fn queenside(color: Color) -> CastleStatus {
        match color {
            Color::White => CastleStatus::WHITE_QUEENSIDE,
            Color::Black => CastleStatus::BLACK_QUEENSIDE,
        }
    }

    /// Both of one side's rights, forfeited together when the king moves.
    pub fn both(color: Color) -> CastleStatus {
        CastleStatus::kingside(color) | CastleStatus::queenside(color)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Piece {
        Piece { kind, color }
    }

    /// Decodes a FEN piece letter: uppercase is White, lowercase Black.
    pub fn from_fen_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_char(c.to_ascii_lowercase())?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(kind, color))
    }

    pub fn to_fen_char(self) -> char {
        match self.color {
            Color::White => self.kind.as_char().to_ascii_uppercase(),
            Color::Black => self.kind.as_char(),
        }
    }

    /// The squares this piece attacks from `sq` through the given
    /// occupancy, ignoring the color of any blocker.
    pub fn attacks(self, sq: Square, occupancy: Bitboard) -> Bitboard {
        match self.kind {
            PieceKind::Pawn => attacks::pawn_attacks(sq, self.color),
            PieceKind::Knight => attacks::knight_attacks(sq),
            PieceKind::Bishop => attacks::bishop_attacks(sq, occupancy),
            PieceKind::Rook => attacks::rook_attacks(sq, occupancy),
            PieceKind::Queen => attacks::queen_attacks(sq, occupancy),
            PieceKind::King => attacks::king_attacks(sq),
        }
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_char(self.to_fen_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    #[test]
    fn square_layout() {
        // Index arithmetic pins the little-endian rank-file layout.
        assert_eq!(0, Square::A1.index());
        assert_eq!(7, Square::H1.index());
        assert_eq!(56, Square::A8.index());
        assert_eq!(63, Square::H8.index());
        assert_eq!(28, Square::E4.index());

        assert_eq!(Square::E4, Square::of(File::E, Rank::Four));
        assert_eq!(File::E, Square::E4.file());
        assert_eq!(Rank::Four, Square::E4.rank());
    }

    #[test]
    fn square_all_covers_the_board() {
        let squares: Vec<Square> = Square::all().collect();
        assert_eq!(64, squares.len());
        assert_eq!(Square::A1, squares[0]);
        assert_eq!(Square::H8, squares[63]);
    }

    #[test]
    fn square_arithmetic() {
        assert_eq!(Square::E3, Square::E2.plus(8));
        assert_eq!(Square::D4, Square::E4.plus(-1));
        assert_eq!(Square::E5, Square::E4.flip());
        assert_eq!(Square::A8, Square::A1.flip());
    }

    #[test]
    fn square_text_round_trip() {
        for sq in Square::all() {
            let text = format!("{}", sq);
            assert_eq!(Some(sq), Square::parse(&text));
        }
        assert_eq!(None, Square::parse("i4"));
        assert_eq!(None, Square::parse("a9"));
        assert_eq!(None, Square::parse("a44"));
        assert_eq!(None, Square::parse(""));
    }

    #[test]
    fn file_and_rank_chars() {
        assert_eq!(Ok(File::A), File::try_from('a'));
        assert_eq!(Ok(File::H), File::try_from('h'));
        assert!(File::try_from('i').is_err());
        assert_eq!("c", format!("{}", File::C));

        assert_eq!(Ok(Rank::One), Rank::try_from('1'));
        assert_eq!(Ok(Rank::Eight), Rank::try_from('8'));
        assert!(Rank::try_from('9').is_err());
        assert_eq!("6", format!("{}", Rank::Six));
    }

    #[test]
    fn color_opponent() {
        assert_eq!(Color::Black, Color::White.opponent());
        assert_eq!(Color::White, Color::Black.opponent());
        assert_eq!([Color::White, Color::Black], Color::BOTH);
    }

    #[test]
    fn piece_fen_letters() {
        // Round trip every piece through its FEN letter.
        for &kind in &PieceKind::ALL {
            for &color in &Color::BOTH {
                let piece = Piece::new(kind, color);
                assert_eq!(Some(piece), Piece::from_fen_char(piece.to_fen_char()));
            }
        }

        let knight = Piece::from_fen_char('n').unwrap();
        assert_eq!(PieceKind::Knight, knight.kind);
        assert_eq!(Color::Black, knight.color);

        let queen = Piece::from_fen_char('Q').unwrap();
        assert_eq!(PieceKind::Queen, queen.kind);
        assert_eq!(Color::White, queen.color);

        assert_eq!(None, Piece::from_fen_char('x'));
        assert_eq!(None, Piece::from_fen_char('1'));
    }

    #[test]
    fn castle_rights_by_color() {
        let mut rights = CastleStatus::all();
        rights -= CastleStatus::both(Color::White);
        assert!(!rights.contains(CastleStatus::WHITE_KINGSIDE));
        assert!(!rights.contains(CastleStatus::WHITE_QUEENSIDE));
        assert!(rights.contains(CastleStatus::BLACK_KINGSIDE));

        rights -= CastleStatus::queenside(Color::Black);
        assert!(rights.contains(CastleStatus::kingside(Color::Black)));
        assert!(!rights.contains(CastleStatus::BLACK_QUEENSIDE));
    }

    #[test]
    fn table_enum_round_trip() {
        for index in 0..PieceKind::COUNT {
            assert_eq!(index, PieceKind::from_index(index).index());
        }
        for index in 0..File::COUNT {
            assert_eq!(index, File::from_index(index).index());
        }
    }
}
