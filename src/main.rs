use anyhow::{anyhow, Result};
use indicatif::ProgressBar;
use log::info;

use std::io::{stdin, stdout, Write};
use std::time::Duration;

use connect4_mtdf::{
    apply_human_move, new_game,
    search::{SearchEngine, DEFAULT_THINK_TIME},
    GameState, Player, WIDTH,
};

mod display;

fn main() -> Result<()> {
    env_logger::init();

    // keep the engine out here so its transposition table is re-used between games
    let mut engine = SearchEngine::new();

    println!("Welcome to Connect 4\n");

    let ai_players = (
        ask_yes_no("Is player 1 (X) AI controlled? y/n: ")?,
        ask_yes_no("Is player 2 (O) AI controlled? y/n: ")?,
    );

    loop {
        play_game(&mut engine, ai_players)?;
        if !ask_yes_no("Play again? y/n: ")? {
            break;
        }
    }
    Ok(())
}

fn play_game(engine: &mut SearchEngine, ai_players: (bool, bool)) -> Result<()> {
    let mut board = new_game();

    // game loop
    loop {
        display::display(&board)?;

        match board.state() {
            GameState::InProgress => {
                let ai_turn = match board.to_move() {
                    Player::A => ai_players.0,
                    Player::B => ai_players.1,
                };

                if ai_turn {
                    // slow down play if both players are AI
                    if ai_players == (true, true) {
                        std::thread::sleep(Duration::from_secs(1));
                    }

                    let spinner = ProgressBar::new_spinner();
                    spinner.set_message("AI is thinking...");
                    spinner.enable_steady_tick(100);
                    let best_move = engine.best_move(&board, DEFAULT_THINK_TIME);
                    spinner.finish_and_clear();

                    let column =
                        best_move.ok_or_else(|| anyhow!("no move found for a game in progress"))?;
                    println!("AI plays column {}", column + 1);
                    board = board.apply_move(column)?;
                } else {
                    let input = prompt("Move input > ")?;
                    let column = match input.trim().parse::<usize>() {
                        Ok(column @ 1..=WIDTH) => column - 1,
                        _ => {
                            println!(
                                "Invalid column: {}. Columns must be between 1 and {}",
                                input.trim(),
                                WIDTH
                            );
                            continue;
                        }
                    };

                    match apply_human_move(&board, column) {
                        Ok(next) => board = next,
                        // try the move again
                        Err(err) => println!("{}", err),
                    }
                }
            }

            // end states
            state => {
                info!(
                    "game over after {} moves, {} nodes searched, {} table entries",
                    board.num_moves(),
                    engine.node_count,
                    engine.transposition_table().map_or(0, |table| table.len())
                );
                match state {
                    GameState::Won(Player::A) => println!("Player 1 wins!"),
                    GameState::Won(Player::B) => println!("Player 2 wins!"),
                    _ => println!("Draw!"),
                }
                return Ok(());
            }
        }
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    stdout().flush()?;

    let mut buffer = String::new();
    if stdin().read_line(&mut buffer)? == 0 {
        return Err(anyhow!("input closed"));
    }
    Ok(buffer)
}

fn ask_yes_no(question: &str) -> Result<bool> {
    loop {
        match prompt(question)?.to_lowercase().chars().next() {
            Some('y') => return Ok(true),
            Some('n') => return Ok(false),
            _ => println!("Unknown answer given"),
        }
    }
}
