//! Batches of engine-vs-engine games, played in parallel and archived

use anyhow::{anyhow, Context, Result};
use indicatif::*;
use log::info;
use rand::prelude::*;
use rayon::prelude::*;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::*;
use std::sync::Arc;
use std::thread;
use std::time::*;

use crate::archive::{archive_game, GameMode, SituationStore};
use crate::board::Board;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::grid::Player;
use crate::search::Search;

/// Plays one engine-vs-engine game to the end
///
/// The first `opening_plies` moves are drawn at random from the legal columns,
/// the rest are chosen by a [`Search`] of depth `config.depth_vs_ai` playing
/// for whoever is to move.
pub fn play_game<R: Rng + ?Sized>(config: &EngineConfig, opening_plies: usize, rng: &mut R) -> Result<Board, EngineError> {
    let mut board = Board::with_config(config);
    while !board.is_over() {
        let column = if board.num_moves() < opening_plies {
            let legal: Vec<usize> = board.grid().legal_columns().collect();
            *legal.choose(rng).ok_or(EngineError::NoLegalMove)?
        } else {
            Search::new(board.player(), config.depth_vs_ai)
                .choose_column(board.grid(), config.win_length)?
        };
        board.drop(column)?;
    }
    Ok(board)
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SelfPlaySummary {
    pub games: usize,
    pub player_one_wins: usize,
    pub player_two_wins: usize,
    pub draws: usize,
    /// Games whose final position had not been archived before
    pub new_situations: usize,
    pub known_situations: usize,
}

#[derive(Clone, Debug)]
pub struct SelfPlay {
    config: EngineConfig,
    games: usize,
    opening_plies: usize,
    seed: u64,
    show_progress: bool,
}

impl SelfPlay {
    pub fn new(config: EngineConfig, games: usize) -> Self {
        Self {
            config,
            games,
            opening_plies: 0,
            seed: 0,
            show_progress: false,
        }
    }

    /// Randomises the first `plies` moves of every game
    pub fn with_opening_plies(mut self, plies: usize) -> Self {
        self.opening_plies = plies;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Plays all games and archives each one into `store` as it finishes
    ///
    /// The first failing game or store call stops the batch: games not yet
    /// started are skipped, and the worker is joined before the error is
    /// returned.
    pub fn run<S: SituationStore + ?Sized>(&self, store: &mut S) -> Result<SelfPlaySummary> {
        let start = Instant::now();

        enum Message {
            Game(Result<Board, EngineError>),
            Finish,
        }
        let (tx, rx) = channel();
        let cancelled = Arc::new(AtomicBool::new(false));

        let config = self.config.clone();
        let (games, opening_plies, seed) = (self.games, self.opening_plies, self.seed);
        let worker_cancelled = Arc::clone(&cancelled);
        let worker = thread::spawn(move || {
            let played = AtomicUsize::new(0);
            (0..games).into_par_iter().for_each_with(tx.clone(), |tx, i| {
                if worker_cancelled.load(Ordering::Relaxed) {
                    return;
                }
                played.fetch_add(1, Ordering::Relaxed);

                // one generator per game keeps results independent of scheduling
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                let game = play_game(&config, opening_plies, &mut rng);
                if tx.send(Message::Game(game)).is_err() {
                    worker_cancelled.store(true, Ordering::Relaxed);
                }
            });
            let _ = tx.send(Message::Finish);
            played.into_inner()
        });

        let progress = if self.show_progress {
            ProgressBar::new(self.games as u64)
        } else {
            ProgressBar::hidden()
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template("Self-play: {bar:40.cyan/blue} {msg} ~{eta} remaining")
                .progress_chars("█▓▒░  "),
        );

        let mut summary = SelfPlaySummary::default();
        let mut failure = None;
        // a closed channel means the worker died; joining it reports why
        while let Ok(Message::Game(game)) = rx.recv() {
            if let Err(err) = self.tally(store, game, &mut summary) {
                failure = Some(err);
                break;
            }

            progress.inc(1);
            progress.set_message(&format!(
                "({} / {})",
                progress.position(),
                progress.length()
            ));
        }

        cancelled.store(true, Ordering::Relaxed);
        drop(rx);
        let played = worker.join();
        progress.finish();

        if let Some(err) = failure {
            let played = played.unwrap_or(summary.games);
            return Err(err).with_context(|| format!("self-play stopped after {} of {} games", played, games));
        }
        played.map_err(|_| anyhow!("self-play worker panicked"))?;

        info!(
            "self-play finished in {}: {:?}",
            HumanDuration(start.elapsed()),
            summary
        );
        Ok(summary)
    }

    fn tally<S: SituationStore + ?Sized>(
        &self,
        store: &mut S,
        game: Result<Board, EngineError>,
        summary: &mut SelfPlaySummary,
    ) -> Result<()> {
        let board = game?;
        match board.winner() {
            Some(Player::One) => summary.player_one_wins += 1,
            Some(Player::Two) => summary.player_two_wins += 1,
            None => summary.draws += 1,
        }
        if let Some(archived) = archive_game(store, &board, GameMode::AiVsAi)? {
            if archived.known {
                summary.known_situations += 1;
            } else {
                summary.new_situations += 1;
            }
        }
        summary.games += 1;
        Ok(())
    }
}
