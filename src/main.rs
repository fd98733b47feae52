use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{log_enabled, warn, Level};

use std::io::{stdin, stdout, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use connect4_minimax::archive::{archive_game, GameMode, MemoryArchive, ARCHIVE_PATH};
use connect4_minimax::board::{Board, GameState};
use connect4_minimax::config::EngineConfig;
use connect4_minimax::encoding::{canonical_key, parse_sequence, replay};
use connect4_minimax::search::Search;
use connect4_minimax::selfplay::SelfPlay;

mod display;
use display::display;

/// Play Connect 4 against a minimax engine on a board of any size
#[derive(Parser)]
#[command(name = "connect4", about = "Connect 4 with a minimax engine")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "connect4.toml")]
    config: PathBuf,

    /// Override the number of rows
    #[arg(long)]
    rows: Option<usize>,

    /// Override the number of columns
    #[arg(long)]
    cols: Option<usize>,

    /// Override the number of aligned discs needed to win
    #[arg(long)]
    win_length: Option<usize>,

    /// Override the search depth of every engine
    #[arg(long)]
    depth: Option<usize>,

    /// Archive finished games in this file
    #[arg(long)]
    archive: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play an interactive game
    Play {
        /// Player 1 is engine controlled
        #[arg(long)]
        player_one_ai: bool,

        /// Player 2 is engine controlled
        #[arg(long)]
        player_two_ai: bool,
    },
    /// Play a batch of engine-vs-engine games and archive them
    Selfplay {
        #[arg(long, default_value_t = 100)]
        games: usize,

        /// Number of random moves opening each game
        #[arg(long, default_value_t = 2)]
        opening_plies: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Print the canonical key of the position reached by a move sequence
    Key { sequence: String },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut config = EngineConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(rows) = cli.rows {
        config.rows = rows;
    }
    if let Some(cols) = cli.cols {
        config.cols = cols;
    }
    if let Some(win_length) = cli.win_length {
        config.win_length = win_length;
    }
    if let Some(depth) = cli.depth {
        config.depth_vs_human = depth;
        config.depth_vs_ai = depth;
    }
    config.validate()?;

    match cli.command {
        Command::Play {
            player_one_ai,
            player_two_ai,
        } => play(&config, (player_one_ai, player_two_ai), cli.archive.as_deref()),
        Command::Selfplay {
            games,
            opening_plies,
            seed,
        } => {
            let path = cli.archive.unwrap_or_else(|| PathBuf::from(ARCHIVE_PATH));
            let mut archive = MemoryArchive::load_or_default(&path)?;
            let summary = SelfPlay::new(config, games)
                .with_opening_plies(opening_plies)
                .with_seed(seed)
                .with_progress(true)
                .run(&mut archive)?;
            archive.save(&path)?;

            println!(
                "{} games: player 1 won {}, player 2 won {}, {} draws",
                summary.games, summary.player_one_wins, summary.player_two_wins, summary.draws
            );
            println!(
                "{} new situations, {} already known, {} stored in {}",
                summary.new_situations,
                summary.known_situations,
                archive.situations().len(),
                path.display()
            );
            Ok(())
        }
        Command::Key { sequence } => {
            let moves = parse_sequence(&sequence, config.cols)?;
            let grid = replay(&moves, config.rows, config.cols)?;
            let key = canonical_key(&grid)?;
            print!("{}", grid);
            println!("canonical: {}", key.key);
            println!("alternate: {}", key.alternate);
            Ok(())
        }
    }
}

fn play(config: &EngineConfig, ai_players: (bool, bool), archive_path: Option<&Path>) -> Result<()> {
    let mut board = Board::with_config(config);
    let mut archive = match archive_path {
        Some(path) => Some(MemoryArchive::load_or_default(path)?),
        None => None,
    };
    let mode = match ai_players {
        (false, false) => GameMode::HumanVsHuman,
        (true, true) => GameMode::AiVsAi,
        _ => GameMode::HumanVsAi,
    };
    let depth = if mode == GameMode::AiVsAi {
        config.depth_vs_ai
    } else {
        config.depth_vs_human
    };
    let is_ai = |board: &Board| {
        if board.player().number() == 1 {
            ai_players.0
        } else {
            ai_players.1
        }
    };

    let stdin = stdin();
    println!("Welcome to Connect 4\n");

    // game loop
    loop {
        display(&board)?;

        match board.state().clone() {
            GameState::Playing => {
                // AI player
                if is_ai(&board) {
                    println!("AI is thinking...");
                    stdout().flush()?;

                    // slow down play if both players are AI
                    if mode == GameMode::AiVsAi {
                        std::thread::sleep(Duration::from_millis(300));
                    }

                    if log_enabled!(Level::Debug) {
                        // diagnostic scores get their own node count
                        Search::new(board.player(), depth).column_scores(board.grid(), board.win_length());
                    }
                    let column = Search::new(board.player(), depth).choose_column(board.grid(), board.win_length())?;
                    println!("Best move: {}", column + 1);
                    board.drop(column)?;

                // human player
                } else {
                    print!(
                        "{} move input (1-{}, u: undo, r: restart, q: quit) > ",
                        board.player(),
                        board.cols()
                    );
                    stdout().flush()?;
                    let mut input_str = String::new();
                    if stdin.read_line(&mut input_str)? == 0 {
                        return Ok(());
                    }

                    match input_str.trim() {
                        "" => continue,
                        "q" | "quit" => return Ok(()),
                        "r" => board.reset(),
                        "u" => {
                            board.undo();
                            // hand the turn back to the human
                            if is_ai(&board) {
                                board.undo();
                            }
                        }
                        input => match input.parse::<usize>() {
                            Ok(column @ 1..) => {
                                if let Err(err) = board.drop(column - 1) {
                                    println!("{}", err);
                                }
                            }
                            _ => println!("Invalid number: {}", input),
                        },
                    }
                }
            }

            // end states
            state => {
                match state {
                    GameState::Win { winner, .. } => println!("{} wins!", winner),
                    _ => println!("Draw!"),
                }

                if let (Some(archive), Some(path)) = (archive.as_mut(), archive_path) {
                    // the finished game stays on screen whatever happens to the archive
                    match archive_game(archive, &board, mode).and_then(|_| archive.save(path)) {
                        Ok(()) => println!("Game archived in {}", path.display()),
                        Err(err) => warn!("could not archive game: {:#}", err),
                    }
                }

                print!("Play again? y/n: ");
                stdout().flush()?;
                let mut buffer = String::new();
                stdin.read_line(&mut buffer)?;
                match buffer.to_lowercase().chars().next() {
                    Some('y') => board.reset(),
                    _ => break,
                }
            }
        }
    }
    Ok(())
}
