pub mod core;

// module re-exports
pub use self::core::definitions::{Cell, Figure, GameState, Move, Square};
pub use self::core::engine::{Board, Color, Piece, PieceType};
pub use self::core::game::{ui_board, Game};
