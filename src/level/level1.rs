// Level 1: shuffled pyramid, swap neighbours until it narrows upward.
use super::{Action, Block, Board, Generation, Goal, LevelConfig, LevelId, LevelKind};
use crate::rng::RandomSource;

pub static LEVEL1: LevelConfig = LevelConfig {
    id: LevelId::Level1,
    kind: LevelKind::Stacking,
    name: "Stack the Pyramid",
    min_width: 32,
    max_width: 128,
    step: 16,
    correct_bonus: 10,
    wrong_penalty: 5,
    duration_secs: 135,
    max_stage: 3,
    generation: Generation::Permutation,
    goal: Goal::Descending,
    spawn_interval_secs: 0,
    fall_secs: 0,
    auto_arrange: false,
};

pub(super) fn new_board(config: &LevelConfig, rng: &mut impl RandomSource) -> Board {
    Board::Stacking {
        blocks: config.generate_blocks(rng),
        selected: None,
    }
}

/// The selection follows the block it was on.
pub(super) fn apply(blocks: &mut [Block], selected: &mut Option<usize>, action: Action) {
    match action {
        Action::Select(index) if index < blocks.len() => *selected = Some(index),
        Action::MoveUp => {
            if let Some(i) = *selected {
                if i + 1 < blocks.len() {
                    blocks.swap(i, i + 1);
                    *selected = Some(i + 1);
                }
            }
        }
        Action::MoveDown => {
            if let Some(i) = *selected {
                if i > 0 && i < blocks.len() {
                    blocks.swap(i, i - 1);
                    *selected = Some(i - 1);
                }
            }
        }
        _ => {}
    }
}
