//! Pyramid Sort core crate.
//!
//! Three block-sorting levels behind a name gate, with per-level best scores
//! and a local leaderboard kept in browser storage. The page does all drawing
//! and input handling; this crate owns the rules:
//!
//! - [`session`]: player name validation and the logged-in identity.
//! - [`level`]: puzzle state, actions, validation and stage progression.
//! - [`leaderboard`]: best scores per level and the ranked totals.
//! - [`runner`]: glues one level to a [`runner::Presenter`] and the stores.
//! - [`web`]: `wasm-bindgen` exports used by the HTML pages.

use wasm_bindgen::prelude::*;

// Console output only exists in the browser; native builds stay quiet.
macro_rules! console_log {
    ($($arg:expr),+ $(,)?) => {{
        #[cfg(target_arch = "wasm32")]
        {
            gloo::console::log!($($arg),+);
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            $(let _ = &$arg;)+
        }
    }};
}

macro_rules! console_warn {
    ($($arg:expr),+ $(,)?) => {{
        #[cfg(target_arch = "wasm32")]
        {
            gloo::console::warn!($($arg),+);
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            $(let _ = &$arg;)+
        }
    }};
}

pub mod leaderboard;
pub mod level;
pub mod rng;
pub mod runner;
pub mod session;
pub mod store;
pub mod web;

pub use leaderboard::{Leaderboard, LeaderboardEntry, LevelScores};
pub use level::{Action, Block, Board, LevelConfig, LevelId, LevelKind, Phase, PuzzleState, Verdict};
pub use runner::{LevelRunner, Page, Presenter, TickOutcome};
pub use session::{LoginError, NameRules, PlayerIdentity, Session};
pub use store::{BrowserStore, KeyValueStore, MemoryStore, StoreError};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
