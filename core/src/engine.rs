use core::time::Duration;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use web_time::Instant;

use crate::*;

/// Valid transitions:
/// - Idle -> Awaiting (first tile flipped, clock starts)
/// - Awaiting -> Resolving (second tile flipped, pair mismatched)
/// - Resolving -> Awaiting (mismatched pair flipped back)
/// - Awaiting -> Completed (last pair matched)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePhase {
    Idle,
    Awaiting,
    Resolving,
    Completed,
}

impl EnginePhase {
    pub const fn accepts_selection(self) -> bool {
        matches!(self, Self::Idle | Self::Awaiting)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl Default for EnginePhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Names one scheduled flip-back. The epoch separates games, the sequence
/// separates mismatches within a game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionTicket {
    epoch: u64,
    sequence: u32,
}

impl ResolutionTicket {
    pub const fn epoch(self) -> u64 {
        self.epoch
    }
}

/// A mismatched pair waiting for its resolution delay to elapse.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PendingResolution {
    pub ticket: ResolutionTicket,
    pub tiles: [TileIndex; 2],
    pub due: Instant,
    pub delay: Duration,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FinalScore {
    pub attempts: u32,
    pub elapsed: Duration,
    pub size: BoardSize,
}

impl FinalScore {
    /// Completion time rounded to hundredths, as shown and ranked.
    pub fn time_secs(&self) -> f64 {
        round_centis(self.elapsed.as_secs_f64())
    }
}

/// Everything a view needs to redraw the board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub size: BoardSize,
    pub tiles: Vec<Tile>,
    pub selected: Vec<TileIndex>,
    pub attempts: u32,
    pub matched_count: TileCount,
    pub phase: EnginePhase,
    pub elapsed_secs: f64,
}

impl GameSnapshot {
    pub fn tile_at(&self, coords: Coord2) -> Option<Tile> {
        self.tiles.get(usize::from(self.size.index_of(coords))).copied()
    }
}

/// Authoritative state of one game of pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchEngine {
    board: Board,
    selected: SmallVec<[TileIndex; 2]>,
    attempts: u32,
    matched_count: TileCount,
    phase: EnginePhase,
    clock: ElapsedClock,
    pending: Option<PendingResolution>,
    resolution_delay: Duration,
    epoch: u64,
    mismatches: u32,
    final_score: Option<FinalScore>,
}

impl MatchEngine {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            selected: SmallVec::new(),
            attempts: 0,
            matched_count: 0,
            phase: Default::default(),
            clock: ElapsedClock::new(),
            pending: None,
            resolution_delay: DEFAULT_RESOLUTION_DELAY,
            epoch: 0,
            mismatches: 0,
            final_score: None,
        }
    }

    pub fn with_resolution_delay(mut self, resolution_delay: Duration) -> Self {
        self.resolution_delay = resolution_delay;
        self
    }

    /// Tags tickets issued by this engine so they cannot resolve another game.
    pub fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn size(&self) -> BoardSize {
        self.board.size()
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_finished()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn matched_count(&self) -> TileCount {
        self.matched_count
    }

    pub fn selected(&self) -> &[TileIndex] {
        &self.selected
    }

    pub fn pending(&self) -> Option<PendingResolution> {
        self.pending
    }

    pub fn resolution_delay(&self) -> Duration {
        self.resolution_delay
    }

    pub fn tile(&self, index: TileIndex) -> Result<Tile> {
        Ok(self.board[self.board.validate_index(index)?])
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.clock.elapsed(now)
    }

    pub fn elapsed_secs(&self, now: Instant) -> f64 {
        self.clock.elapsed_secs(now)
    }

    pub fn final_score(&self) -> Option<FinalScore> {
        self.final_score
    }

    /// Whether a click on `index` would flip a tile right now.
    pub fn can_select(&self, index: TileIndex) -> bool {
        self.phase.accepts_selection()
            && self
                .board
                .tile(index)
                .is_some_and(|tile| tile.is_selectable())
    }

    /// Flips the tile at `index`.
    ///
    /// Clicks while a mismatch is on display, on matched tiles, or on the tile
    /// already flipped are ignored and report [`SelectOutcome::NoChange`].
    pub fn select_tile(&mut self, index: TileIndex, now: Instant) -> Result<SelectOutcome> {
        use SelectOutcome::*;

        let index = self.board.validate_index(index)?;

        if !self.can_select(index) {
            log::trace!("ignored selection of tile {} in {:?}", index, self.phase);
            return Ok(NoChange);
        }

        self.board[index].face_up = true;
        self.selected.push(index);
        log::trace!("flipped tile {}", index);

        if self.selected.len() == 1 {
            self.clock.start(now);
            self.phase = EnginePhase::Awaiting;
            return Ok(Flipped);
        }

        let (first, second) = (self.selected[0], self.selected[1]);
        self.attempts += 1;
        self.phase = EnginePhase::Resolving;

        if self.board[first].matches(self.board[second]) {
            Ok(self.resolve_match(first, second, now))
        } else {
            Ok(Mismatched(self.schedule_flip_back(first, second, now)))
        }
    }

    fn resolve_match(&mut self, first: TileIndex, second: TileIndex, now: Instant) -> SelectOutcome {
        self.board[first].matched = true;
        self.board[second].matched = true;
        self.matched_count += 2;
        self.selected.clear();
        log::debug!(
            "matched tiles {} and {} ({}/{})",
            first,
            second,
            self.matched_count,
            self.board.len()
        );

        if self.matched_count == self.board.len() {
            self.clock.stop(now);
            self.phase = EnginePhase::Completed;
            let score = FinalScore {
                attempts: self.attempts,
                elapsed: self.clock.elapsed(now),
                size: self.board.size(),
            };
            log::debug!("completed in {} attempts, {:?}", score.attempts, score.elapsed);
            self.final_score = Some(score);
            SelectOutcome::Completed(score)
        } else {
            self.phase = EnginePhase::Awaiting;
            SelectOutcome::Matched
        }
    }

    fn schedule_flip_back(
        &mut self,
        first: TileIndex,
        second: TileIndex,
        now: Instant,
    ) -> PendingResolution {
        self.mismatches = self.mismatches.wrapping_add(1);
        let pending = PendingResolution {
            ticket: ResolutionTicket {
                epoch: self.epoch,
                sequence: self.mismatches,
            },
            tiles: [first, second],
            due: now + self.resolution_delay,
            delay: self.resolution_delay,
        };
        log::debug!("tiles {} and {} mismatched, locked until resolved", first, second);
        self.pending = Some(pending);
        pending
    }

    /// Flips a mismatched pair back down and unlocks input. Tickets that are not
    /// the one currently pending are ignored.
    pub fn resolve(&mut self, ticket: ResolutionTicket) -> ResolveOutcome {
        let Some(pending) = self.pending.filter(|pending| pending.ticket == ticket) else {
            log::trace!("ignored stale resolution {:?}", ticket);
            return ResolveOutcome::NoChange;
        };

        for index in pending.tiles {
            self.board[index].face_up = false;
        }
        self.selected.clear();
        self.pending = None;
        self.phase = EnginePhase::Awaiting;
        log::trace!("flipped back tiles {:?}", pending.tiles);
        ResolveOutcome::FlippedBack
    }

    /// Resolves the pending mismatch once its delay has elapsed at `now`.
    pub fn tick(&mut self, now: Instant) -> ResolveOutcome {
        match self.pending {
            Some(pending) if now >= pending.due => self.resolve(pending.ticket),
            _ => ResolveOutcome::NoChange,
        }
    }

    pub fn snapshot(&self, now: Instant) -> GameSnapshot {
        GameSnapshot {
            size: self.board.size(),
            tiles: self.board.iter().copied().collect(),
            selected: self.selected.to_vec(),
            attempts: self.attempts,
            matched_count: self.matched_count,
            phase: self.phase,
            elapsed_secs: self.elapsed_secs(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn engine(rows: Coord, cols: Coord, keys: &[PairKey]) -> MatchEngine {
        let size = BoardSize::new(rows, cols).unwrap();
        MatchEngine::new(Board::from_pair_keys(size, keys).unwrap())
    }

    #[test]
    fn starts_idle_with_clock_stopped() {
        let engine = engine(2, 2, &[0, 0, 1, 1]);
        let t0 = Instant::now();

        assert_eq!(engine.phase(), EnginePhase::Idle);
        assert_eq!(engine.elapsed(t0 + ms(5000)), Duration::ZERO);
    }

    #[test]
    fn first_selection_flips_and_starts_clock() {
        let mut engine = engine(2, 2, &[0, 0, 1, 1]);
        let t0 = Instant::now();

        assert_eq!(engine.select_tile(0, t0).unwrap(), SelectOutcome::Flipped);

        assert_eq!(engine.phase(), EnginePhase::Awaiting);
        assert!(engine.tile(0).unwrap().face_up);
        assert_eq!(engine.selected(), &[0]);
        assert_eq!(engine.attempts(), 0);
        assert_eq!(engine.elapsed(t0 + ms(750)), ms(750));
    }

    #[test]
    fn two_pairs_complete_the_small_board() {
        let mut engine = engine(2, 2, &[0, 0, 1, 1]);
        let t0 = Instant::now();

        engine.select_tile(0, t0).unwrap();
        assert_eq!(engine.select_tile(1, t0 + ms(100)).unwrap(), SelectOutcome::Matched);
        assert_eq!(engine.phase(), EnginePhase::Awaiting);
        assert_eq!(engine.matched_count(), 2);
        assert!(engine.tile(0).unwrap().matched && engine.tile(1).unwrap().matched);

        engine.select_tile(2, t0 + ms(200)).unwrap();
        let outcome = engine.select_tile(3, t0 + ms(1234)).unwrap();

        let SelectOutcome::Completed(score) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(score.attempts, 2);
        assert_eq!(score.time_secs(), 1.23);
        assert_eq!(engine.phase(), EnginePhase::Completed);
        assert_eq!(engine.attempts(), 2);
        assert_eq!(engine.matched_count(), 4);
        assert_eq!(engine.final_score(), Some(score));
    }

    #[test]
    fn completed_clock_is_frozen() {
        let mut engine = engine(1, 2, &[0, 0]);
        let t0 = Instant::now();

        engine.select_tile(0, t0).unwrap();
        engine.select_tile(1, t0 + ms(3000)).unwrap();

        assert_eq!(engine.elapsed(t0 + ms(3000)), ms(3000));
        assert_eq!(engine.elapsed(t0 + ms(60_000)), ms(3000));
        assert_eq!(
            engine.snapshot(t0 + ms(9000)).elapsed_secs,
            engine.snapshot(t0 + ms(90_000)).elapsed_secs
        );
    }

    #[test]
    fn mismatch_locks_until_resolved() {
        let mut engine = engine(2, 2, &[0, 1, 1, 0]);
        let t0 = Instant::now();

        engine.select_tile(0, t0).unwrap();
        let outcome = engine.select_tile(2, t0 + ms(100)).unwrap();
        let pending = outcome.pending().expect("mismatch should be pending");

        assert_eq!(pending.tiles, [0, 2]);
        assert_eq!(pending.due, t0 + ms(1100));
        assert_eq!(engine.phase(), EnginePhase::Resolving);
        assert!(engine.tile(0).unwrap().face_up && engine.tile(2).unwrap().face_up);
        assert_eq!(engine.attempts(), 1);

        assert_eq!(engine.tick(t0 + ms(1099)), ResolveOutcome::NoChange);
        assert_eq!(engine.phase(), EnginePhase::Resolving);

        assert_eq!(engine.tick(t0 + ms(1100)), ResolveOutcome::FlippedBack);
        assert_eq!(engine.phase(), EnginePhase::Awaiting);
        assert!(!engine.tile(0).unwrap().face_up && !engine.tile(2).unwrap().face_up);
        assert!(engine.selected().is_empty());
        assert_eq!(engine.attempts(), 1);
    }

    #[test]
    fn selection_while_resolving_is_ignored_entirely() {
        let mut engine = engine(2, 2, &[0, 1, 1, 0]);
        let t0 = Instant::now();

        engine.select_tile(0, t0).unwrap();
        engine.select_tile(1, t0).unwrap();
        let before = engine.clone();

        for index in 0..4 {
            assert_eq!(engine.select_tile(index, t0 + ms(10)).unwrap(), SelectOutcome::NoChange);
        }

        assert_eq!(engine, before);
    }

    #[test]
    fn reselecting_the_armed_tile_is_ignored() {
        let mut engine = engine(2, 2, &[0, 1, 1, 0]);
        let t0 = Instant::now();

        engine.select_tile(0, t0).unwrap();
        assert_eq!(engine.select_tile(0, t0).unwrap(), SelectOutcome::NoChange);

        assert_eq!(engine.phase(), EnginePhase::Awaiting);
        assert_eq!(engine.attempts(), 0);
        assert_eq!(engine.selected(), &[0]);
    }

    #[test]
    fn matched_tiles_cannot_be_selected_again() {
        let mut engine = engine(2, 2, &[0, 0, 1, 1]);
        let t0 = Instant::now();

        engine.select_tile(0, t0).unwrap();
        engine.select_tile(1, t0).unwrap();

        assert_eq!(engine.select_tile(0, t0).unwrap(), SelectOutcome::NoChange);
        assert_eq!(engine.select_tile(1, t0).unwrap(), SelectOutcome::NoChange);
        assert_eq!(engine.attempts(), 1);
        assert_eq!(engine.phase(), EnginePhase::Awaiting);
        assert!(engine.selected().is_empty());
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let mut engine = engine(2, 2, &[0, 0, 1, 1]);

        assert_eq!(
            engine.select_tile(4, Instant::now()),
            Err(GameError::InvalidTileIndex)
        );
        assert_eq!(engine.phase(), EnginePhase::Idle);
    }

    #[test]
    fn stale_ticket_does_not_resolve_newer_mismatch() {
        let mut engine = engine(2, 4, &[0, 1, 2, 3, 3, 2, 1, 0]);
        let t0 = Instant::now();

        engine.select_tile(0, t0).unwrap();
        let first = engine.select_tile(1, t0).unwrap().pending().unwrap();
        assert_eq!(engine.resolve(first.ticket), ResolveOutcome::FlippedBack);
        assert_eq!(engine.resolve(first.ticket), ResolveOutcome::NoChange);

        engine.select_tile(2, t0).unwrap();
        let second = engine.select_tile(3, t0).unwrap().pending().unwrap();

        assert_ne!(first.ticket, second.ticket);
        assert_eq!(engine.resolve(first.ticket), ResolveOutcome::NoChange);
        assert_eq!(engine.phase(), EnginePhase::Resolving);
        assert_eq!(engine.resolve(second.ticket), ResolveOutcome::FlippedBack);
    }

    #[test]
    fn tickets_from_another_epoch_are_ignored() {
        let size = BoardSize::new(1, 4).unwrap();
        let board = Board::from_pair_keys(size, &[0, 1, 0, 1]).unwrap();
        let t0 = Instant::now();

        let mut old = MatchEngine::new(board.clone()).with_epoch(1);
        old.select_tile(0, t0).unwrap();
        let old_ticket = old.select_tile(1, t0).unwrap().pending().unwrap().ticket;

        let mut new = MatchEngine::new(board).with_epoch(2);
        new.select_tile(0, t0).unwrap();
        new.select_tile(1, t0).unwrap();

        assert_eq!(new.resolve(old_ticket), ResolveOutcome::NoChange);
        assert_eq!(new.phase(), EnginePhase::Resolving);
    }

    #[test]
    fn attempts_count_comparisons_not_clicks() {
        use rand::prelude::*;

        let mut rng = SmallRng::seed_from_u64(99);
        let board = ShuffledBoardGenerator::new(5)
            .generate(BoardSize::new(4, 4).unwrap())
            .unwrap();
        let mut engine = MatchEngine::new(board).with_resolution_delay(ms(0));
        let t0 = Instant::now();
        let mut comparisons = 0;

        for step in 0..20_000u64 {
            if engine.is_finished() {
                break;
            }
            let now = t0 + ms(step);
            engine.tick(now);
            let before = engine.selected().len();
            let outcome = engine.select_tile(rng.random_range(0..16), now).unwrap();
            match outcome {
                SelectOutcome::NoChange => assert_eq!(engine.selected().len(), before),
                SelectOutcome::Flipped => assert_eq!(before, 0),
                _ => {
                    assert_eq!(before, 1);
                    comparisons += 1;
                }
            }
            assert_eq!(engine.attempts(), comparisons);
        }

        assert!(engine.is_finished());
        assert_eq!(engine.matched_count(), 16);
        assert!(engine.board().iter().all(|tile| tile.matched && tile.face_up));
    }

    #[test]
    fn snapshot_reflects_board_state() {
        let mut engine = engine(2, 2, &[0, 1, 1, 0]);
        let t0 = Instant::now();

        engine.select_tile(3, t0).unwrap();
        let snapshot = engine.snapshot(t0 + ms(500));

        assert_eq!(snapshot.phase, EnginePhase::Awaiting);
        assert_eq!(snapshot.selected, vec![3]);
        assert_eq!(snapshot.elapsed_secs, 0.5);
        assert!(snapshot.tile_at((1, 1)).unwrap().face_up);
        assert!(!snapshot.tile_at((0, 0)).unwrap().face_up);
    }
}
