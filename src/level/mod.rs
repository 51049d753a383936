//! Puzzle engine shared by all three levels.
//!
//! Each level is a [`LevelConfig`] descriptor plus a [`LevelKind`] tag that
//! picks the board layout, the allowed actions and the validation rule:
//!
//! - `Stacking` (level 1): shuffled blocks, the player swaps neighbours until
//!   the pyramid narrows from bottom to top.
//! - `Resizing` (level 2): random widths, the player grows or shrinks blocks
//!   one step at a time.
//! - `Falling` (level 3): numbered blocks drop through a source area and the
//!   player catches them onto the pyramid in order 7 (bottom) .. 1 (top).
//!
//! All transitions are plain functions over [`PuzzleState`]. Timers, storage
//! and rendering stay with the caller.

use serde::Serialize;

use crate::rng::{self, RandomSource};

mod level1;
mod level2;
mod level3;

pub use level1::LEVEL1;
pub use level2::LEVEL2;
pub use level3::LEVEL3;

// --- Level identity / configuration -----------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelId {
    Level1,
    Level2,
    Level3,
}

impl LevelId {
    pub const ALL: [LevelId; 3] = [LevelId::Level1, LevelId::Level2, LevelId::Level3];

    /// Name used in the stored `levelScores_*` object.
    pub fn key(self) -> &'static str {
        match self {
            LevelId::Level1 => "level1",
            LevelId::Level2 => "level2",
            LevelId::Level3 => "level3",
        }
    }

    pub fn number(self) -> u8 {
        match self {
            LevelId::Level1 => 1,
            LevelId::Level2 => 2,
            LevelId::Level3 => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(LevelId::Level1),
            2 => Some(LevelId::Level2),
            3 => Some(LevelId::Level3),
            _ => None,
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn config(self) -> &'static LevelConfig {
        match self {
            LevelId::Level1 => &LEVEL1,
            LevelId::Level2 => &LEVEL2,
            LevelId::Level3 => &LEVEL3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Stacking,
    Resizing,
    Falling,
}

/// How a fresh board picks its widths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Generation {
    /// Every width of the progression exactly once, shuffled.
    Permutation,
    /// Each block drawn uniformly from the progression; repeats allowed.
    Independent,
}

/// What a correct resizing board looks like.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Goal {
    /// Widths never grow from bottom to top.
    Descending,
    /// Widths equal a generated example pyramid, position by position.
    MatchReference,
}

/// Immutable per-level descriptor.
#[derive(Debug)]
pub struct LevelConfig {
    pub id: LevelId,
    pub kind: LevelKind,
    pub name: &'static str,
    pub min_width: u32,
    pub max_width: u32,
    pub step: u32,
    pub correct_bonus: u32,
    pub wrong_penalty: u32,
    pub duration_secs: u32,
    pub max_stage: u32,
    /// Board generation for `Stacking` and `Resizing`. `Falling` ignores it.
    pub generation: Generation,
    /// Validation rule for `Resizing`. The other kinds ignore it.
    pub goal: Goal,
    // Falling only
    pub spawn_interval_secs: u32,
    pub fall_secs: u32,
    /// Caught blocks slot into width order instead of landing on top.
    pub auto_arrange: bool,
}

impl LevelConfig {
    /// Number of terms in `min_width, min_width + step, .., max_width`.
    pub fn block_count(&self) -> usize {
        self.max_width
            .saturating_sub(self.min_width)
            .checked_div(self.step)
            .map_or(1, |n| n as usize + 1)
    }

    /// The width progression, widest first.
    pub fn widths(&self) -> Vec<u32> {
        (0..self.block_count() as u32)
            .map(|i| self.max_width - i * self.step)
            .collect()
    }

    /// Label shown on a block: its rank in the progression, 1 = narrowest.
    pub fn label_for(&self, width: u32) -> u32 {
        width
            .saturating_sub(self.min_width)
            .checked_div(self.step)
            .map_or(1, |n| n + 1)
    }

    pub fn block(&self, width: u32) -> Block {
        Block {
            id: self.label_for(width),
            width,
        }
    }

    fn generate_widths(&self, rng: &mut impl RandomSource) -> Vec<u32> {
        let mut widths = self.widths();
        match self.generation {
            Generation::Permutation => rng::shuffle(&mut widths, rng),
            Generation::Independent => {
                let pool = widths.clone();
                for w in widths.iter_mut() {
                    *w = pool[rng.next_below(pool.len())];
                }
            }
        }
        widths
    }

    fn generate_blocks(&self, rng: &mut impl RandomSource) -> Vec<Block> {
        self.generate_widths(rng)
            .into_iter()
            .map(|w| self.block(w))
            .collect()
    }
}

// --- State -------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Block {
    pub id: u32,
    pub width: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FallingBlock {
    pub block: Block,
    /// Whole seconds spent falling.
    pub age: u32,
}

/// Board contents per level kind. Index 0 of every pyramid is the bottom.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Board {
    Stacking {
        blocks: Vec<Block>,
        selected: Option<usize>,
    },
    Resizing {
        blocks: Vec<Block>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        reference: Vec<Block>,
    },
    Falling {
        falling: Vec<FallingBlock>,
        pyramid: Vec<Block>,
        elapsed: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Running,
    Completed,
    TimedOut,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Phase::Running)
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleState {
    #[serde(skip)]
    pub config: &'static LevelConfig,
    pub level: LevelId,
    pub stage: u32,
    pub score: u32,
    pub time_remaining: u32,
    pub phase: Phase,
    pub board: Board,
}

impl PuzzleState {
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Stacking: pick the block that `MoveUp` / `MoveDown` act on.
    Select(usize),
    MoveUp,
    MoveDown,
    /// Resizing: widen / narrow the block at this index by one step.
    Grow(usize),
    Shrink(usize),
    /// Falling: take the falling block with this id onto the pyramid.
    Catch(u32),
    /// Falling: send the pyramid block with this id back to the source area.
    Release(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    /// Not enough blocks to judge. Carries no penalty.
    Incomplete,
}

impl Verdict {
    pub fn is_correct(self) -> bool {
        matches!(self, Verdict::Correct)
    }
}

// --- Transitions -------------------------------------------------------------

pub fn apply_penalty(score: u32, penalty: u32) -> u32 {
    score.saturating_sub(penalty)
}

pub fn start(config: &'static LevelConfig, rng: &mut impl RandomSource) -> PuzzleState {
    console_log!("level start", config.name, config.duration_secs);
    PuzzleState {
        config,
        level: config.id,
        stage: 1,
        score: 0,
        time_remaining: config.duration_secs,
        phase: Phase::Running,
        board: new_board(config, rng),
    }
}

fn new_board(config: &LevelConfig, rng: &mut impl RandomSource) -> Board {
    match config.kind {
        LevelKind::Stacking => level1::new_board(config, rng),
        LevelKind::Resizing => level2::new_board(config, rng),
        LevelKind::Falling => level3::new_board(config, rng),
    }
}

/// Player input. Inputs that do not fit the level or point outside the board
/// leave the state as it was.
pub fn apply_action(mut state: PuzzleState, action: Action) -> PuzzleState {
    if state.is_terminal() {
        return state;
    }
    let config = state.config;
    match &mut state.board {
        Board::Stacking { blocks, selected } => level1::apply(blocks, selected, action),
        Board::Resizing { blocks, .. } => level2::apply(config, blocks, action),
        Board::Falling {
            falling, pyramid, ..
        } => level3::apply(config, falling, pyramid, action),
    }
    state
}

pub fn validate(state: &PuzzleState) -> Verdict {
    let config = state.config;
    match &state.board {
        Board::Stacking { blocks, .. } => verdict(is_descending(blocks)),
        Board::Resizing { blocks, reference } => match config.goal {
            Goal::Descending => verdict(is_descending(blocks)),
            Goal::MatchReference => verdict(
                blocks.len() == reference.len()
                    && blocks.iter().zip(reference).all(|(a, b)| a.width == b.width),
            ),
        },
        Board::Falling { pyramid, .. } => level3::validate(config, pyramid),
    }
}

/// Score the verdict and move the stage machine along.
pub fn on_validate(
    mut state: PuzzleState,
    verdict: Verdict,
    rng: &mut impl RandomSource,
) -> PuzzleState {
    if state.is_terminal() {
        return state;
    }
    let config = state.config;
    match verdict {
        Verdict::Correct => {
            state.score = state.score.saturating_add(config.correct_bonus);
            if state.stage < config.max_stage {
                state.stage += 1;
                state.board = new_board(config, rng);
                console_log!("stage advanced", config.name, state.stage);
            } else {
                state.phase = Phase::Completed;
                console_log!("level completed", config.name, state.score);
            }
        }
        Verdict::Incorrect => {
            state.score = apply_penalty(state.score, config.wrong_penalty);
        }
        Verdict::Incomplete => {}
    }
    state
}

/// One second of countdown.
pub fn tick(mut state: PuzzleState, rng: &mut impl RandomSource) -> PuzzleState {
    if state.is_terminal() {
        return state;
    }
    state.time_remaining = state.time_remaining.saturating_sub(1);
    let config = state.config;
    if let Board::Falling {
        falling,
        pyramid,
        elapsed,
    } = &mut state.board
    {
        level3::advance(config, falling, pyramid, elapsed, rng);
    }
    if state.time_remaining == 0 {
        state.phase = Phase::TimedOut;
        console_log!("level timed out", config.name, state.score);
    }
    state
}

/// Bottom to top, each block no wider than the one below it.
pub fn is_descending(blocks: &[Block]) -> bool {
    blocks.windows(2).all(|pair| pair[1].width <= pair[0].width)
}

pub(super) fn verdict(correct: bool) -> Verdict {
    if correct {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SequenceRandom;

    fn blocks(widths: &[u32]) -> Vec<Block> {
        widths.iter().map(|&w| LEVEL2.block(w)).collect()
    }

    #[test]
    fn progression_matches_level_bounds() {
        assert_eq!(LEVEL1.block_count(), 7);
        assert_eq!(LEVEL1.widths(), vec![128, 112, 96, 80, 64, 48, 32]);
        assert_eq!(LEVEL2.block_count(), 8);
        assert_eq!(LEVEL2.label_for(16), 1);
        assert_eq!(LEVEL2.label_for(128), 8);
        assert_eq!(LEVEL3.block_count(), 7);
    }

    #[test]
    fn penalty_clamps_at_zero() {
        assert_eq!(apply_penalty(20, 5), 15);
        assert_eq!(apply_penalty(3, 5), 0);
        assert_eq!(apply_penalty(0, 25), 0);
        for score in 0..40 {
            for p in 0..40 {
                assert_eq!(apply_penalty(score, p) as i64, (score as i64 - p as i64).max(0));
            }
        }
    }

    #[test]
    fn descending_check_reads_bottom_to_top() {
        assert!(is_descending(&blocks(&[64, 48, 32, 16])));
        assert!(!is_descending(&blocks(&[48, 64, 32, 16])));
        assert!(is_descending(&blocks(&[64, 64, 16])));
        assert!(is_descending(&[]));
    }

    #[test]
    fn start_sets_timer_and_stage() {
        let state = start(&LEVEL1, &mut SequenceRandom::new([3, 1, 4]));
        assert_eq!(state.stage, 1);
        assert_eq!(state.score, 0);
        assert_eq!(state.time_remaining, 135);
        assert_eq!(state.phase, Phase::Running);
        assert_eq!(state.level, LevelId::Level1);
    }

    #[test]
    fn permutation_uses_each_width_once() {
        let state = start(&LEVEL1, &mut SequenceRandom::new([5, 2, 0, 6, 1]));
        let Board::Stacking { blocks, selected } = &state.board else {
            panic!("level 1 should be a stacking board");
        };
        assert_eq!(*selected, None);
        let mut widths: Vec<u32> = blocks.iter().map(|b| b.width).collect();
        widths.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(widths, LEVEL1.widths());
    }

    #[test]
    fn independent_sampling_may_repeat() {
        let state = start(&LEVEL2, &mut SequenceRandom::new([0]));
        let Board::Resizing { blocks, reference } = &state.board else {
            panic!("level 2 should be a resizing board");
        };
        assert_eq!(blocks.len(), 8);
        assert!(blocks.iter().all(|b| b.width == 128 && b.id == 8));
        assert!(reference.is_empty());
    }

    #[test]
    fn wrong_answer_only_costs_points() {
        let mut rng = SequenceRandom::new([0]);
        let mut state = start(&LEVEL1, &mut rng);
        state.score = 12;
        let board_before = state.board.clone();
        let state = on_validate(state, Verdict::Incorrect, &mut rng);
        assert_eq!(state.score, 7);
        assert_eq!(state.stage, 1);
        assert_eq!(state.board, board_before);
        let state = on_validate(state, Verdict::Incorrect, &mut rng);
        assert_eq!(state.score, 2);
        let state = on_validate(state, Verdict::Incorrect, &mut rng);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn incomplete_is_free() {
        let mut rng = SequenceRandom::new([0]);
        let mut state = start(&LEVEL3, &mut rng);
        state.score = 30;
        let state = on_validate(state, Verdict::Incomplete, &mut rng);
        assert_eq!(state.score, 30);
        assert_eq!(state.phase, Phase::Running);
    }

    #[test]
    fn stages_advance_then_complete() {
        let mut rng = SequenceRandom::new([1, 2, 3]);
        let mut state = start(&LEVEL1, &mut rng);
        for expected_stage in 2..=3 {
            state = on_validate(state, Verdict::Correct, &mut rng);
            assert_eq!(state.stage, expected_stage);
            assert_eq!(state.phase, Phase::Running);
        }
        state = on_validate(state, Verdict::Correct, &mut rng);
        assert_eq!(state.stage, 3);
        assert_eq!(state.phase, Phase::Completed);
        assert_eq!(state.score, 30);

        // Terminal: nothing moves any more.
        let after = on_validate(state.clone(), Verdict::Correct, &mut rng);
        assert_eq!(after.score, 30);
        let after = tick(after, &mut rng);
        assert_eq!(after.time_remaining, state.time_remaining);
    }

    #[test]
    fn advancing_a_stage_clears_selection() {
        let mut rng = SequenceRandom::new([0]);
        let state = start(&LEVEL1, &mut rng);
        let state = apply_action(state, Action::Select(2));
        let state = on_validate(state, Verdict::Correct, &mut rng);
        assert!(matches!(state.board, Board::Stacking { selected: None, .. }));
    }

    #[test]
    fn countdown_times_out_and_then_ignores_input() {
        let mut rng = SequenceRandom::new([0]);
        let mut state = start(&LEVEL1, &mut rng);
        for _ in 0..134 {
            state = tick(state, &mut rng);
        }
        assert_eq!(state.time_remaining, 1);
        assert_eq!(state.phase, Phase::Running);
        state = tick(state, &mut rng);
        assert_eq!(state.time_remaining, 0);
        assert_eq!(state.phase, Phase::TimedOut);

        state = tick(state, &mut rng);
        assert_eq!(state.time_remaining, 0);
        let board_before = state.board.clone();
        let state = apply_action(state, Action::Select(0));
        assert_eq!(state.board, board_before);
        let state = on_validate(state, Verdict::Correct, &mut rng);
        assert_eq!(state.phase, Phase::TimedOut);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn actions_for_other_levels_are_ignored() {
        let mut rng = SequenceRandom::new([0]);
        let state = start(&LEVEL2, &mut rng);
        let before = state.board.clone();
        let state = apply_action(state, Action::MoveUp);
        let state = apply_action(state, Action::Catch(3));
        assert_eq!(state.board, before);
    }

    #[test]
    fn level_ids_chain_to_results() {
        assert_eq!(LevelId::Level1.next(), Some(LevelId::Level2));
        assert_eq!(LevelId::Level3.next(), None);
        assert_eq!(LevelId::from_number(0), None);
        assert_eq!(LevelId::Level2.config().id, LevelId::Level2);
        assert_eq!(LevelId::Level3.key(), "level3");
    }

    #[test]
    fn state_serializes_for_the_page() {
        let state = start(&LEVEL2, &mut SequenceRandom::new([0]));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["level"], "level2");
        assert_eq!(json["timeRemaining"], 120);
        assert_eq!(json["phase"], "running");
        assert_eq!(json["board"]["kind"], "resizing");
        assert_eq!(json["board"]["blocks"].as_array().unwrap().len(), 8);
        assert!(json["board"].get("reference").is_none());
    }
}
