use serde::{Deserialize, Serialize};

use crate::core::engine::{Color, PieceType};

/// Board coordinate as `(row, column)`, both in `0..8`.
/// Row 0 is White's home rank, row 7 Black's.
pub type Square = (u8, u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Move {
        Move { from, to }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    pub kind: PieceType,
    pub color: Color,
}

/// What the rendering layer sees in one board cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Figure(Figure),
}

/// Driven externally: the core never alternates colors by itself.
/// `Checkmate` and `Stalemate` carry the player who cannot move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    PlayerMove(Color),
    Checkmate(Color),
    Stalemate(Color),
}

impl GameState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameState::Checkmate(_) | GameState::Stalemate(_))
    }
}
