// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A convenience facade over `Position` for code that plays a game
//! rather than searching one: checked move application, legal-move
//! queries, and game-state predicates.
use std::fmt;

use crate::movegen::{MoveGenerator, MoveList};
use crate::moves::Move;
use crate::position::{FenError, Position, UndoInfo};
use crate::types::{PieceKind, Square};

#[derive(Clone, Debug)]
pub struct Board {
    position: Position,
}

impl Board {
    pub const STARTING_FEN: &'static str = Position::STARTING_FEN;

    /// A board at the standard starting position.
    pub fn new() -> Board {
        Board {
            position: Position::from_start_position(),
        }
    }

    /// Constructs a board from a FEN string, running both the parser and
    /// the position validator.
    pub fn from_fen<S: AsRef<str>>(fen: S) -> Result<Board, FenError> {
        let position = Position::from_fen(fen)?;
        position.validate()?;
        Ok(Board { position })
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    pub fn as_fen(&self) -> String {
        self.position.as_fen()
    }

    /// Applies a move if it is legal. Returns `false`, leaving the board
    /// untouched, when it is not.
    pub fn make_move(&mut self, mov: Move) -> bool {
        let gen = MoveGenerator::new();
        if !gen.is_legal(&self.position, mov) {
            return false;
        }

        self.position.make_move(mov);
        true
    }

    /// Applies a move the caller already knows to be legal. This is the
    /// search's entry point; it skips the legality test.
    pub fn make_move_unchecked(&mut self, mov: Move) -> UndoInfo {
        self.position.make_move(mov)
    }

    pub fn unmake_move(&mut self, mov: Move, undo: UndoInfo) {
        self.position.unmake_move(mov, undo);
    }

    pub fn get_legal_moves(&self) -> MoveList {
        MoveGenerator::new().generate_legal(&self.position)
    }

    pub fn get_legal_captures(&self) -> MoveList {
        MoveGenerator::new().generate_legal_captures(&self.position)
    }

    pub fn is_move_legal(&self, mov: Move) -> bool {
        MoveGenerator::new().is_legal(&self.position, mov)
    }

    /// Resolves a (from, to, promotion) triple, as parsed from UCI long
    /// algebraic, to the fully-encoded legal move it denotes, if any.
    /// This is how castles, en-passant captures, and double pushes typed
    /// as bare coordinates acquire their move kind.
    pub fn find_legal_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Option<Move> {
        for &mov in &self.get_legal_moves() {
            if mov.source() != from || mov.destination() != to {
                continue;
            }

            if mov.is_promotion() {
                if Some(mov.promotion_piece()) == promotion {
                    return Some(mov);
                }
            } else {
                return Some(mov);
            }
        }
        None
    }

    pub fn is_in_check(&self) -> bool {
        let gen = MoveGenerator::new();
        gen.is_in_check(&self.position, self.position.side_to_move())
    }

    pub fn is_checkmate(&self) -> bool {
        MoveGenerator::new().is_checkmate(&self.position)
    }

    pub fn is_stalemate(&self) -> bool {
        MoveGenerator::new().is_stalemate(&self.position)
    }

    pub fn is_draw(&self) -> bool {
        MoveGenerator::new().is_draw(&self.position)
    }
}

impl Default for Board {
    fn default() -> Board {
        Board::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.position)
    }
}
