use anyhow::Result;
use chess_rules::{Game, GameState};
use log::info;

const MOVE_LIMIT: usize = 300;

/// Plays one random game to the terminal. `RUST_LOG=debug` shows the
/// per-move decisions of the core.
fn main() -> Result<()> {
    env_logger::init();
    let mut game = Game::default();
    println!("{}", game.board());
    let mut plies = 0;
    while let GameState::PlayerMove(player) = game.state() {
        if plies >= MOVE_LIMIT {
            info!("move limit reached after {plies} plies, giving up");
            break;
        }
        info!("{player} to move, {} legal moves", game.legal_moves().len());
        game.make_random_move();
        plies += 1;
    }
    println!("{}", game.board());
    match game.state() {
        GameState::Checkmate(loser) => println!("Checkmate! {loser} is in checkmate!"),
        GameState::Stalemate(player) => println!("Pat! {player} is in pat!"),
        GameState::PlayerMove(player) => println!("Game abandoned with {player} to move."),
    }
    let captured = game.board().captured_pieces();
    println!("{} pieces captured over {plies} plies.", captured.len());
    Ok(())
}
