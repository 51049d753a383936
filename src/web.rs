//! Browser entry points.
//!
//! The page owns the DOM; it hands us a presenter object and forwards clicks
//! and key presses. The active level and its one-second countdown live in a
//! thread-local slot, replaced whenever another level starts.

use std::cell::RefCell;

use gloo::timers::callback::{Interval, Timeout};
use wasm_bindgen::prelude::*;

use crate::leaderboard::Leaderboard;
use crate::level::{Action, LevelId, PuzzleState, Verdict};
use crate::rng::OsRandom;
use crate::runner::{LevelRunner, Page, Presenter, TickOutcome};
use crate::session::{FEEDBACK_CLEAR_MS, Session};
use crate::store::BrowserStore;

const COUNTDOWN_MS: u32 = 1_000;

#[wasm_bindgen]
extern "C" {
    /// Page-side object with `renderElements(json)`, `renderScore(n)`,
    /// `renderTimer(n)`, `renderStage(n)`, `renderFeedback(msg, ok)` and
    /// `navigateTo(path)`.
    pub type JsPresenter;

    #[wasm_bindgen(method, js_name = renderElements)]
    fn js_render_elements(this: &JsPresenter, json: &str);
    #[wasm_bindgen(method, js_name = renderScore)]
    fn js_render_score(this: &JsPresenter, score: u32);
    #[wasm_bindgen(method, js_name = renderTimer)]
    fn js_render_timer(this: &JsPresenter, seconds: u32);
    #[wasm_bindgen(method, js_name = renderStage)]
    fn js_render_stage(this: &JsPresenter, stage: u32);
    #[wasm_bindgen(method, js_name = renderFeedback)]
    fn js_render_feedback(this: &JsPresenter, message: &str, positive: bool);
    #[wasm_bindgen(method, js_name = navigateTo)]
    fn js_navigate_to(this: &JsPresenter, path: &str);
}

impl Presenter for JsPresenter {
    fn render_elements(&self, state: &PuzzleState) {
        match serde_json::to_string(state) {
            Ok(json) => self.js_render_elements(&json),
            Err(err) => console_warn!("could not encode puzzle state", err.to_string()),
        }
    }
    fn render_score(&self, score: u32) {
        self.js_render_score(score)
    }
    fn render_timer(&self, seconds: u32) {
        self.js_render_timer(seconds)
    }
    fn render_stage(&self, stage: u32) {
        self.js_render_stage(stage)
    }
    fn render_feedback(&self, message: &str, positive: bool) {
        self.js_render_feedback(message, positive)
    }
    fn navigate_to(&self, page: Page) {
        self.js_navigate_to(page.path())
    }
}

type WebRunner = LevelRunner<BrowserStore, JsPresenter, OsRandom>;

struct ActiveLevel {
    runner: WebRunner,
    countdown: Option<Interval>,
}

thread_local! {
    static ACTIVE_LEVEL: RefCell<Option<ActiveLevel>> = const { RefCell::new(None) };
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn browser_store() -> Result<BrowserStore, JsValue> {
    BrowserStore::local().map_err(js_err)
}

// --- Name gate / results -----------------------------------------------------

/// Returns the stored (trimmed) name, or the user-facing error message.
#[wasm_bindgen]
pub fn login(name: &str) -> Result<String, JsValue> {
    let session = Session::new(browser_store()?);
    session.login(name).map(|id| id.name).map_err(js_err)
}

#[wasm_bindgen]
pub fn logout() -> Result<(), JsValue> {
    stop_level();
    Session::new(browser_store()?).logout().map_err(js_err)
}

#[wasm_bindgen]
pub fn current_player() -> Option<String> {
    let store = BrowserStore::local().ok()?;
    Session::new(store).current_identity().map(|id| id.name)
}

/// How long the page should show a login error before clearing it.
#[wasm_bindgen]
pub fn feedback_clear_ms() -> u32 {
    FEEDBACK_CLEAR_MS
}

/// Ranked `[{username, score}]` as JSON.
#[wasm_bindgen]
pub fn ranking_json() -> Result<String, JsValue> {
    let entries = Leaderboard::new(browser_store()?).ranked_entries();
    serde_json::to_string(&entries).map_err(js_err)
}

// --- Level page ----------------------------------------------------------------

/// Start level `level` (1..=3). Returns `false` when nobody is logged in; the
/// presenter has then been told to go back to the index page.
#[wasm_bindgen]
pub fn start_level(level: u8, presenter: JsPresenter) -> Result<bool, JsValue> {
    let id = LevelId::from_number(level).ok_or_else(|| JsValue::from_str("unknown level"))?;
    stop_level();
    let store = browser_store()?;
    let Some(runner) = LevelRunner::enter(id.config(), store, presenter, OsRandom::new()) else {
        return Ok(false);
    };
    let countdown = Interval::new(COUNTDOWN_MS, on_countdown);
    ACTIVE_LEVEL.with(|slot| {
        *slot.borrow_mut() = Some(ActiveLevel {
            runner,
            countdown: Some(countdown),
        });
    });
    Ok(true)
}

/// Whether the one-second countdown is still scheduled.
#[wasm_bindgen]
pub fn level_countdown_running() -> bool {
    ACTIVE_LEVEL.with(|slot| {
        slot.try_borrow().is_ok_and(|slot| {
            slot.as_ref()
                .is_some_and(|active| active.countdown.is_some())
        })
    })
}

fn on_countdown() {
    let outcome = with_runner(|runner| runner.tick());
    if outcome == Some(TickOutcome::Stop) {
        stop_countdown();
    }
}

/// Cancel the interval. The drop is deferred because this may run inside the
/// interval's own callback.
fn stop_countdown() {
    let countdown = ACTIVE_LEVEL.with(|slot| {
        slot.try_borrow_mut()
            .ok()
            .and_then(|mut slot| slot.as_mut().and_then(|active| active.countdown.take()))
    });
    if let Some(countdown) = countdown {
        let _ = Timeout::new(0, move || drop(countdown)).forget();
    }
}

fn stop_level() {
    stop_countdown();
    ACTIVE_LEVEL.with(|slot| {
        if let Ok(mut slot) = slot.try_borrow_mut() {
            slot.take();
        }
    });
}

/// Run `f` on the active runner. A re-entrant call (the page calling back in
/// from inside a presenter notification) is dropped.
fn with_runner<T>(f: impl FnOnce(&mut WebRunner) -> T) -> Option<T> {
    ACTIVE_LEVEL.with(|slot| {
        let Ok(mut slot) = slot.try_borrow_mut() else {
            console_warn!("level busy, input ignored");
            return None;
        };
        slot.as_mut().map(|active| f(&mut active.runner))
    })
}

fn act(action: Action) {
    with_runner(|runner| runner.act(action));
}

#[wasm_bindgen]
pub fn level_select(index: usize) {
    act(Action::Select(index));
}

#[wasm_bindgen]
pub fn level_move_up() {
    act(Action::MoveUp);
}

#[wasm_bindgen]
pub fn level_move_down() {
    act(Action::MoveDown);
}

#[wasm_bindgen]
pub fn level_grow(index: usize) {
    act(Action::Grow(index));
}

#[wasm_bindgen]
pub fn level_shrink(index: usize) {
    act(Action::Shrink(index));
}

#[wasm_bindgen]
pub fn level_catch(id: u32) {
    act(Action::Catch(id));
}

#[wasm_bindgen]
pub fn level_release(id: u32) {
    act(Action::Release(id));
}

/// `"correct"`, `"incorrect"`, `"incomplete"`, or `undefined` when no level
/// is running.
#[wasm_bindgen]
pub fn level_check() -> Option<String> {
    let verdict = with_runner(|runner| runner.check()).flatten()?;
    if with_runner(|runner| runner.state().is_terminal()) == Some(true) {
        stop_countdown();
    }
    let label = match verdict {
        Verdict::Correct => "correct",
        Verdict::Incorrect => "incorrect",
        Verdict::Incomplete => "incomplete",
    };
    Some(label.to_string())
}

/// Page to offer after completion (next level or results).
#[wasm_bindgen]
pub fn level_next_page() -> Option<String> {
    with_runner(|runner| runner.next_page())
        .flatten()
        .map(|page| page.path().to_string())
}

/// Page to reload after a time-out.
#[wasm_bindgen]
pub fn level_retry_page() -> Option<String> {
    with_runner(|runner| runner.retry_page())
        .flatten()
        .map(|page| page.path().to_string())
}

/// Logout button on a level page.
#[wasm_bindgen]
pub fn level_logout() -> Result<(), JsValue> {
    let result = with_runner(|runner| runner.logout().map_err(js_err));
    stop_level();
    match result {
        Some(result) => result,
        None => logout(),
    }
}
