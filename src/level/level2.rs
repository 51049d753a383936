// Level 2: random widths, grow/shrink each step one notch at a time.
use super::{Action, Block, Board, Generation, Goal, LevelConfig, LevelId, LevelKind};
use crate::rng::RandomSource;

pub static LEVEL2: LevelConfig = LevelConfig {
    id: LevelId::Level2,
    kind: LevelKind::Resizing,
    name: "Resize the Steps",
    min_width: 16,
    max_width: 128,
    step: 16,
    correct_bonus: 20,
    wrong_penalty: 15,
    duration_secs: 120,
    max_stage: 3,
    generation: Generation::Independent,
    goal: Goal::Descending,
    spawn_interval_secs: 0,
    fall_secs: 0,
    auto_arrange: false,
};

pub(super) fn new_board(config: &LevelConfig, rng: &mut impl RandomSource) -> Board {
    let blocks = config.generate_blocks(rng);
    let reference = match config.goal {
        Goal::MatchReference => config.generate_blocks(rng),
        Goal::Descending => Vec::new(),
    };
    Board::Resizing { blocks, reference }
}

pub(super) fn apply(config: &LevelConfig, blocks: &mut [Block], action: Action) {
    match action {
        Action::Grow(index) => {
            if let Some(block) = blocks.get_mut(index) {
                *block = config.block(grow(config, block.width));
            }
        }
        Action::Shrink(index) => {
            if let Some(block) = blocks.get_mut(index) {
                *block = config.block(shrink(config, block.width));
            }
        }
        _ => {}
    }
}

// Past either bound wraps to the other one.
fn grow(config: &LevelConfig, width: u32) -> u32 {
    match width.checked_add(config.step) {
        Some(w) if w <= config.max_width => w,
        _ => config.min_width,
    }
}

fn shrink(config: &LevelConfig, width: u32) -> u32 {
    match width.checked_sub(config.step) {
        Some(w) if w >= config.min_width => w,
        _ => config.max_width,
    }
}
