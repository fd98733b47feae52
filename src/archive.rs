//! Storage of finished games, deduplicated by canonical position
//!
//! Every archived game points at a *situation*: its final position under its
//! canonical key. Games that end in the same position, or in its mirror
//! image, share one situation and bump its game counter.

use anyhow::{anyhow, Context, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::info;

use std::collections::HashMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::board::{Board, GameState};
use crate::encoding::{canonical_key, format_sequence, replay, CanonicalKey};
use crate::grid::Player;

pub const ARCHIVE_PATH: &str = "situations.bin";
const ARCHIVE_MAGIC: u32 = 0x4334_5349;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    InProgress,
    Draw,
    Win(Player),
}

impl Outcome {
    fn code(self) -> u8 {
        match self {
            Outcome::InProgress => 0,
            Outcome::Win(player) => player.number(),
            Outcome::Draw => 3,
        }
    }

    fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Outcome::InProgress),
            3 => Ok(Outcome::Draw),
            _ => Player::from_number(code)
                .map(Outcome::Win)
                .ok_or_else(|| anyhow!("invalid outcome code {}", code)),
        }
    }
}

impl From<&GameState> for Outcome {
    fn from(state: &GameState) -> Self {
        match state {
            GameState::Playing => Outcome::InProgress,
            GameState::Draw => Outcome::Draw,
            GameState::Win { winner, .. } => Outcome::Win(*winner),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GameMode {
    HumanVsHuman,
    HumanVsAi,
    AiVsAi,
}

impl GameMode {
    fn code(self) -> u8 {
        match self {
            GameMode::HumanVsHuman => 0,
            GameMode::HumanVsAi => 1,
            GameMode::AiVsAi => 2,
        }
    }

    fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(GameMode::HumanVsHuman),
            1 => Ok(GameMode::HumanVsAi),
            2 => Ok(GameMode::AiVsAi),
            _ => Err(anyhow!("invalid game mode code {}", code)),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::HumanVsHuman => "HUMAN_VS_HUMAN",
            GameMode::HumanVsAi => "HUMAN_VS_AI",
            GameMode::AiVsAi => "AI_VS_AI",
        };
        f.write_str(name)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SituationId(pub u32);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Situation {
    pub id: SituationId,
    pub key: CanonicalKey,
    /// Number of games that reached this situation
    pub games: u32,
    pub move_number: usize,
    pub outcome: Outcome,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameRecord {
    pub situation: SituationId,
    /// External move sequence, see [`format_sequence`]
    pub sequence: String,
    pub move_count: usize,
    pub winner: Option<Player>,
    pub mode: GameMode,
}

/// Where finished games are stored
///
/// A game is stored in two steps: [`lookup_or_create_situation`] then
/// [`record_game`]. When the second step fails, [`archive_game`] hands the
/// situation back through [`release_situation`], so a store never counts a
/// game it does not hold.
///
/// [`lookup_or_create_situation`]: SituationStore::lookup_or_create_situation
/// [`record_game`]: SituationStore::record_game
/// [`release_situation`]: SituationStore::release_situation
pub trait SituationStore {
    /// Finds the situation stored under `key.key`, counting one more game for
    /// it, or creates it. Returns its id and whether it was already known.
    fn lookup_or_create_situation(
        &mut self,
        key: &CanonicalKey,
        move_number: usize,
        outcome: Outcome,
    ) -> Result<(SituationId, bool)>;

    fn record_game(&mut self, record: GameRecord) -> Result<()>;

    /// Undoes the last `lookup_or_create_situation` call for `id`: the
    /// situation is removed if that call created it (`known == false`),
    /// otherwise its game counter goes back down by one
    fn release_situation(&mut self, id: SituationId, known: bool) -> Result<()>;
}

/// In-process [`SituationStore`] that can be saved to and loaded from disk
#[derive(Clone, Debug, Default)]
pub struct MemoryArchive {
    situations: Vec<Situation>,
    // canonical key -> index into `situations`
    index: HashMap<String, usize>,
    games: Vec<GameRecord>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn situations(&self) -> &[Situation] {
        &self.situations
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn situation(&self, id: SituationId) -> Option<&Situation> {
        self.situations.get((id.0 as usize).checked_sub(1)?)
    }

    pub fn find(&self, key: &str) -> Option<&Situation> {
        self.index.get(key).map(|&i| &self.situations[i])
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = BufReader::new(
            File::open(path).with_context(|| format!("opening archive {}", path.display()))?,
        );

        if file.read_u32::<BigEndian>()? != ARCHIVE_MAGIC {
            return Err(anyhow!("{} is not a situation archive", path.display()));
        }

        let mut archive = Self::new();
        let num_situations = file.read_u32::<BigEndian>()?;
        for _ in 0..num_situations {
            let id = SituationId(file.read_u32::<BigEndian>()?);
            let key = read_string(&mut file)?;
            let alternate = read_string(&mut file)?;
            let games = file.read_u32::<BigEndian>()?;
            let move_number = file.read_u32::<BigEndian>()? as usize;
            let outcome = Outcome::from_code(file.read_u8()?)?;

            if id.0 as usize != archive.situations.len() + 1 {
                return Err(anyhow!("situation ids out of order at {}", id.0));
            }
            archive.index.insert(key.clone(), archive.situations.len());
            archive.situations.push(Situation {
                id,
                key: CanonicalKey { key, alternate },
                games,
                move_number,
                outcome,
            });
        }

        let num_games = file.read_u32::<BigEndian>()?;
        for _ in 0..num_games {
            let situation = SituationId(file.read_u32::<BigEndian>()?);
            let sequence = read_string(&mut file)?;
            let move_count = file.read_u32::<BigEndian>()? as usize;
            let winner = Player::from_number(file.read_u8()?);
            let mode = GameMode::from_code(file.read_u8()?)?;
            archive.games.push(GameRecord {
                situation,
                sequence,
                move_count,
                winner,
                mode,
            });
        }
        Ok(archive)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut file = BufWriter::new(
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("creating archive {}", path.display()))?,
        );

        file.write_u32::<BigEndian>(ARCHIVE_MAGIC)?;
        file.write_u32::<BigEndian>(self.situations.len() as u32)?;
        for situation in self.situations.iter() {
            file.write_u32::<BigEndian>(situation.id.0)?;
            write_string(&mut file, &situation.key.key)?;
            write_string(&mut file, &situation.key.alternate)?;
            file.write_u32::<BigEndian>(situation.games)?;
            file.write_u32::<BigEndian>(situation.move_number as u32)?;
            file.write_u8(situation.outcome.code())?;
        }

        file.write_u32::<BigEndian>(self.games.len() as u32)?;
        for game in self.games.iter() {
            file.write_u32::<BigEndian>(game.situation.0)?;
            write_string(&mut file, &game.sequence)?;
            file.write_u32::<BigEndian>(game.move_count as u32)?;
            file.write_u8(game.winner.map_or(0, Player::number))?;
            file.write_u8(game.mode.code())?;
        }
        file.flush()?;
        Ok(())
    }
}

impl SituationStore for MemoryArchive {
    fn lookup_or_create_situation(
        &mut self,
        key: &CanonicalKey,
        move_number: usize,
        outcome: Outcome,
    ) -> Result<(SituationId, bool)> {
        if let Some(&i) = self.index.get(&key.key) {
            let situation = &mut self.situations[i];
            situation.games += 1;
            return Ok((situation.id, true));
        }

        let id = SituationId(self.situations.len() as u32 + 1);
        self.index.insert(key.key.clone(), self.situations.len());
        self.situations.push(Situation {
            id,
            key: key.clone(),
            games: 1,
            move_number,
            outcome,
        });
        Ok((id, false))
    }

    fn record_game(&mut self, record: GameRecord) -> Result<()> {
        if self.situation(record.situation).is_none() {
            return Err(anyhow!("unknown situation {}", record.situation.0));
        }
        self.games.push(record);
        Ok(())
    }

    fn release_situation(&mut self, id: SituationId, known: bool) -> Result<()> {
        let i = (id.0 as usize)
            .checked_sub(1)
            .filter(|&i| i < self.situations.len())
            .ok_or_else(|| anyhow!("unknown situation {}", id.0))?;

        if known {
            let situation = &mut self.situations[i];
            situation.games = situation.games.saturating_sub(1);
        } else {
            // ids are positions, so only the newest situation can go
            if i + 1 != self.situations.len() {
                return Err(anyhow!("situation {} is not the newest", id.0));
            }
            let situation = self.situations.remove(i);
            self.index.remove(&situation.key.key);
        }
        Ok(())
    }
}

fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = reader.read_u16::<BigEndian>()? as usize;
    let mut bytes = vec![0; len];
    reader.read_exact(&mut bytes)?;
    Ok(String::from_utf8(bytes)?)
}

fn write_string<W: Write>(writer: &mut W, string: &str) -> Result<()> {
    let len = u16::try_from(string.len()).map_err(|_| anyhow!("string too long to archive"))?;
    writer.write_u16::<BigEndian>(len)?;
    writer.write_all(string.as_bytes())?;
    Ok(())
}

/// What [`archive_game`] stored
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArchivedGame {
    pub situation: SituationId,
    /// The final position had already been reached by an earlier game
    pub known: bool,
    pub key: CanonicalKey,
    pub sequence: String,
}

/// Stores the game on `board` under the canonical key of its final position
///
/// Games without moves are skipped. The board itself is only read, and a
/// game the store fails to record is not counted against its situation.
pub fn archive_game<S: SituationStore + ?Sized>(
    store: &mut S,
    board: &Board,
    mode: GameMode,
) -> Result<Option<ArchivedGame>> {
    let moves = board.moves();
    if moves.is_empty() {
        return Ok(None);
    }

    let sequence = format_sequence(moves, board.cols());
    let final_grid = replay(moves, board.rows(), board.cols())?;
    let key = canonical_key(&final_grid)?;

    let (situation, known) =
        store.lookup_or_create_situation(&key, moves.len(), Outcome::from(board.state()))?;
    let recorded = store.record_game(GameRecord {
        situation,
        sequence: sequence.clone(),
        move_count: moves.len(),
        winner: board.winner(),
        mode,
    });
    if let Err(err) = recorded {
        store
            .release_situation(situation, known)
            .with_context(|| format!("releasing situation {} after: {:#}", situation.0, err))?;
        return Err(err);
    }

    info!(
        "archived game {} as situation {} ({}), winner: {:?}",
        sequence,
        situation.0,
        if known { "known" } else { "new" },
        board.winner()
    );
    Ok(Some(ArchivedGame {
        situation,
        known,
        key,
        sequence,
    }))
}
