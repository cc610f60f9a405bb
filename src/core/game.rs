use log::{debug, info};
use rand::seq::IteratorRandom;

use crate::core::definitions::{Cell, Figure, GameState, Move};
use crate::core::engine::{Board, Color};

/// Does `candidate` leave the mover's own king out of check? Simulated on
/// an independent board copy, the real board is never touched.
#[inline]
fn leaves_king_safe(board: &Board, candidate: Move, mover: Color) -> bool {
    let mut future = board.clone();
    future.move_piece(candidate.from, candidate.to);
    !future.is_check(mover).0
}

/// Board projection for the rendering layer.
pub fn ui_board(board: &Board) -> Vec<Vec<Cell>> {
    (0..8)
        .map(|rank| {
            (0..8)
                .map(|file| board.get(rank, file))
                .map(|piece| {
                    if piece.kind().is_valid() {
                        Cell::Figure(Figure {
                            kind: piece.kind(),
                            color: piece.color(),
                        })
                    } else {
                        Cell::Empty
                    }
                })
                .collect()
        })
        .collect()
}

/// Turn-sequencing driver on top of `Board`. Alternates the mover,
/// keeps the king-safety-filtered legal move list for the side to move
/// and classifies the terminal states.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    current_player: Color,
    legal_moves: Vec<Move>,
    checked: bool,
    state: GameState,
}

impl Game {
    pub fn new(board: Board) -> Game {
        Game::with_player(board, Color::White)
    }

    /// Precondition: exactly one king per color.
    pub fn with_player(board: Board, player: Color) -> Game {
        #[cfg(debug_assertions)]
        {
            assert!(
                board.king_square(Color::White).is_some(),
                "Board must have a white king!"
            );
            assert!(
                board.king_square(Color::Black).is_some(),
                "Board must have a black king!"
            );
        }
        let mut game = Game {
            board,
            current_player: player,
            legal_moves: Vec::new(),
            checked: false,
            state: GameState::PlayerMove(player),
        };
        game.refresh();
        game
    }

    fn refresh(&mut self) {
        let player = self.current_player;
        self.legal_moves = self
            .board
            .get_moves(player)
            .into_iter()
            .filter(|candidate| leaves_king_safe(&self.board, *candidate, player))
            .collect();
        self.checked = self.board.is_check(player).0;
        self.state = if self.board.check_for_check_mate(player, &self.legal_moves) {
            info!("checkmate, {player} has no reply");
            GameState::Checkmate(player)
        } else if self.board.check_for_pat(player, &self.legal_moves) {
            info!("stalemate, {player} cannot move");
            GameState::Stalemate(player)
        } else {
            GameState::PlayerMove(player)
        };
    }

    /// Applies a legal move and hands the turn to the opponent. Anything
    /// not in the current legal set leaves the game untouched.
    pub fn advance(&mut self, candidate: Move) -> GameState {
        if self.state.is_terminal() || !self.legal_moves.contains(&candidate) {
            debug!("ignored move {candidate:?} in state {:?}", self.state);
            return self.state;
        }
        if !self.board.move_piece(candidate.from, candidate.to) {
            debug!("board rejected {candidate:?}");
            return self.state;
        }
        self.current_player = self.current_player.opposite();
        self.refresh();
        self.state
    }

    pub fn make_random_move(&mut self) -> GameState {
        if self.state.is_terminal() {
            return self.state;
        }
        let chosen = self
            .legal_moves
            .iter()
            .copied()
            .choose(&mut rand::thread_rng());
        match chosen {
            Some(candidate) => self.advance(candidate),
            None => self.state,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Color {
        self.current_player
    }

    pub fn legal_moves(&self) -> &[Move] {
        &self.legal_moves
    }

    pub fn checked(&self) -> bool {
        self.checked
    }

    pub fn state(&self) -> GameState {
        self.state
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new(Default::default())
    }
}
