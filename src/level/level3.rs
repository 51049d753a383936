// Level 3: numbered blocks fall through the source area; catch them onto the
// pyramid so it reads 7 (bottom) .. 1 (top).
use super::{
    Action, Block, Board, FallingBlock, Generation, Goal, LevelConfig, LevelId, LevelKind, Verdict,
    verdict,
};
use crate::rng::RandomSource;

pub static LEVEL3: LevelConfig = LevelConfig {
    id: LevelId::Level3,
    kind: LevelKind::Falling,
    name: "Catch the Falling Steps",
    min_width: 32,
    max_width: 128,
    step: 16,
    correct_bonus: 30,
    wrong_penalty: 25,
    duration_secs: 60,
    max_stage: 1,
    // Unused here: spawning draws from the missing ids and validation wants 7..1.
    generation: Generation::Permutation,
    goal: Goal::Descending,
    spawn_interval_secs: 2,
    fall_secs: 5,
    auto_arrange: false,
};

pub(super) fn new_board(config: &LevelConfig, rng: &mut impl RandomSource) -> Board {
    let mut falling = Vec::new();
    let pyramid = Vec::new();
    spawn(config, &mut falling, &pyramid, rng);
    Board::Falling {
        falling,
        pyramid,
        elapsed: 0,
    }
}

/// Width of the block labelled `id` (1 = narrowest).
fn block_for_id(config: &LevelConfig, id: u32) -> Block {
    let count = config.block_count() as u32;
    let rank_from_top = count.saturating_sub(id);
    config.block(config.max_width.saturating_sub(config.step * rank_from_top))
}

/// Drop a new block whose id is neither on the pyramid nor already falling.
fn spawn(
    config: &LevelConfig,
    falling: &mut Vec<FallingBlock>,
    pyramid: &[Block],
    rng: &mut impl RandomSource,
) {
    let count = config.block_count() as u32;
    let available: Vec<u32> = (1..=count)
        .filter(|id| !pyramid.iter().any(|b| b.id == *id))
        .filter(|id| !falling.iter().any(|f| f.block.id == *id))
        .collect();
    if available.is_empty() {
        return;
    }
    let id = available[rng.next_below(available.len())];
    falling.push(FallingBlock {
        block: block_for_id(config, id),
        age: 0,
    });
}

/// One second passes in the source area.
pub(super) fn advance(
    config: &LevelConfig,
    falling: &mut Vec<FallingBlock>,
    pyramid: &[Block],
    elapsed: &mut u32,
    rng: &mut impl RandomSource,
) {
    *elapsed += 1;
    for f in falling.iter_mut() {
        f.age += 1;
    }
    falling.retain(|f| f.age < config.fall_secs);
    if config.spawn_interval_secs > 0 && *elapsed % config.spawn_interval_secs == 0 {
        spawn(config, falling, pyramid, rng);
    }
}

pub(super) fn apply(
    config: &LevelConfig,
    falling: &mut Vec<FallingBlock>,
    pyramid: &mut Vec<Block>,
    action: Action,
) {
    match action {
        Action::Catch(id) => {
            if let Some(pos) = falling.iter().position(|f| f.block.id == id) {
                let caught = falling.remove(pos).block;
                place(config, pyramid, caught);
            }
        }
        Action::Release(id) => {
            if let Some(pos) = pyramid.iter().position(|b| b.id == id) {
                let block = pyramid.remove(pos);
                falling.push(FallingBlock { block, age: 0 });
            }
        }
        _ => {}
    }
}

fn place(config: &LevelConfig, pyramid: &mut Vec<Block>, block: Block) {
    if config.auto_arrange {
        let at = pyramid
            .iter()
            .position(|b| b.width < block.width)
            .unwrap_or(pyramid.len());
        pyramid.insert(at, block);
    } else {
        pyramid.push(block);
    }
}

pub(super) fn validate(config: &LevelConfig, pyramid: &[Block]) -> Verdict {
    let count = config.block_count();
    if pyramid.len() < count {
        return Verdict::Incomplete;
    }
    verdict(
        pyramid.len() == count
            && pyramid
                .iter()
                .enumerate()
                .all(|(i, b)| b.id as usize == count - i),
    )
}
