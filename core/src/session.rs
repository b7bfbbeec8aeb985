use rand::prelude::*;
use std::sync::Arc;
use web_time::Instant;

use crate::*;

/// Name recorded when the player did not enter one.
pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";

/// One player's sequence of games against a shared leaderboard.
///
/// Finished games are recorded exactly once. A failing leaderboard only costs
/// the ranking, the game itself keeps working.
#[derive(Debug)]
pub struct MatchSession<S> {
    leaderboard: Arc<Leaderboard<S>>,
    player_name: String,
    config: GameConfig,
    rng: SmallRng,
    epoch: u64,
    engine: MatchEngine,
    last_record: Option<RecordOutcome>,
    deferred: bool,
    unrecorded: Option<LeaderboardEntry>,
}

impl<S: LeaderboardStorage> MatchSession<S> {
    pub fn new(
        leaderboard: Arc<Leaderboard<S>>,
        player_name: impl Into<String>,
        seed: u64,
        config: GameConfig,
    ) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let engine = Self::create_engine(&mut rng, config, 0)?;
        let mut session = Self {
            leaderboard,
            player_name: String::new(),
            config,
            rng,
            epoch: 0,
            engine,
            last_record: None,
            deferred: false,
            unrecorded: None,
        };
        session.set_player_name(player_name);
        Ok(session)
    }

    fn create_engine(rng: &mut SmallRng, config: GameConfig, epoch: u64) -> Result<MatchEngine> {
        let board = ShuffledBoardGenerator::new(rng.random()).generate(config.size)?;
        Ok(MatchEngine::new(board)
            .with_resolution_delay(config.resolution_delay)
            .with_epoch(epoch))
    }

    /// Keeps the finished game's entry for [`Self::take_unrecorded`] instead of
    /// recording it, for hosts that must record under their own lock.
    pub fn with_deferred_recording(mut self) -> Self {
        self.deferred = true;
        self
    }

    /// Changes with every new game.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// Trims the name and cuts it to [`MAX_PLAYER_NAME_LEN`] characters; a blank
    /// name becomes [`DEFAULT_PLAYER_NAME`].
    pub fn set_player_name(&mut self, player_name: impl Into<String>) {
        let player_name = player_name.into();
        self.player_name = match player_name.trim() {
            "" => DEFAULT_PLAYER_NAME.to_owned(),
            name => name.chars().take(MAX_PLAYER_NAME_LEN).collect(),
        };
    }

    /// Outcome of recording the last finished game, if it was recorded.
    pub fn last_record(&self) -> Option<&RecordOutcome> {
        self.last_record.as_ref()
    }

    /// Entry of the finished game still waiting to be recorded by the host.
    pub fn take_unrecorded(&mut self) -> Option<LeaderboardEntry> {
        self.unrecorded.take()
    }

    /// Stores the outcome of a deferred record. Outcomes for an earlier game,
    /// by `epoch`, are ignored.
    pub fn set_record(&mut self, epoch: u64, outcome: RecordOutcome) {
        if epoch == self.epoch {
            self.last_record = Some(outcome);
        } else {
            log::debug!("ignored record outcome of game {}", epoch);
        }
    }

    pub fn new_game(&mut self, rows: Coord, cols: Coord) -> Result<()> {
        self.reset_game(rows, cols)
    }

    /// Throws away the current game, including a pending flip-back, and deals a
    /// new board. On error the current game is left untouched.
    pub fn reset_game(&mut self, rows: Coord, cols: Coord) -> Result<()> {
        let config = GameConfig {
            size: BoardSize::new(rows, cols)?,
            ..self.config
        };
        let epoch = self.epoch.wrapping_add(1);
        let engine = Self::create_engine(&mut self.rng, config, epoch)?;

        if let Some(pending) = self.engine.pending() {
            log::debug!("cancelled pending resolution {:?}", pending.ticket);
        }
        log::debug!("new {} game", config.size);
        self.config = config;
        self.epoch = epoch;
        self.engine = engine;
        self.last_record = None;
        self.unrecorded = None;
        Ok(())
    }

    pub fn select_tile(&mut self, index: TileIndex, now: Instant) -> Result<SelectOutcome> {
        let outcome = self.engine.select_tile(index, now)?;
        if let SelectOutcome::Completed(score) = outcome {
            self.record(&score);
        }
        Ok(outcome)
    }

    fn record(&mut self, score: &FinalScore) {
        let entry = match LeaderboardEntry::from_score(&self.player_name, score) {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("score not recorded: {}", err);
                return;
            }
        };
        if self.deferred {
            self.unrecorded = Some(entry);
            return;
        }

        let recorded = self.leaderboard.record(entry);
        match recorded {
            Ok(outcome) => {
                log::debug!("recorded score, rank {:?}", outcome.rank);
                self.last_record = Some(outcome);
            }
            Err(err) => log::warn!("score not recorded: {}", err),
        }
    }

    pub fn resolve(&mut self, ticket: ResolutionTicket) -> ResolveOutcome {
        self.engine.resolve(ticket)
    }

    pub fn tick(&mut self, now: Instant) -> ResolveOutcome {
        self.engine.tick(now)
    }

    pub fn elapsed_secs(&self, now: Instant) -> f64 {
        self.engine.elapsed_secs(now)
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.leaderboard.read()
    }

    pub fn snapshot(&self, now: Instant) -> GameSnapshot {
        self.engine.snapshot(now)
    }
}
