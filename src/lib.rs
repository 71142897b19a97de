// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! castellan is a UCI chess engine. The crate is organized as a stack of
//! layers, each depending only on the layers below it:
//!
//! * `types` and `bitboard`: squares, pieces, and the 64-bit set type
//! * `attacks`: precomputed attack tables, including magic bitboards for
//!   the sliding pieces
//! * `zobrist` and `position`: the incremental board representation
//! * `movegen` and `board`: move generation and the playing facade
//! * `eval`: the tapered static evaluation
//! * `search`: iterative deepening alpha-beta with a transposition table
//! * `uci` and `perft`: the protocol front-end and the move generator's
//!   verification driver

#[macro_use]
extern crate num_derive;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod attacks;
mod bitboard;
mod board;
pub mod eval;
mod movegen;
mod moves;
mod notation;
pub mod perft;
mod position;
pub mod search;
mod types;
pub mod uci;
pub mod zobrist;

pub use bitboard::Bitboard;
pub use board::Board;
pub use movegen::{MoveGenerator, MoveList};
pub use moves::Move;
pub use notation::san;
pub use perft::{perft, perft_detail, PerftDetail};
pub use position::{FenError, FenParseError, FenValidationError, Position, UndoInfo};
pub use types::{CastleStatus, Color, File, Piece, PieceKind, Rank, Square};
