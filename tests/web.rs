// Browser tests for local storage and the exported level API. Run with
// `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use gloo_timers::future::TimeoutFuture;
use pyramid_sort::web::{self, JsPresenter};
use pyramid_sort::{BrowserStore, KeyValueStore, Leaderboard, LevelId, Session};
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn clean_store() -> BrowserStore {
    let store = BrowserStore::local().expect("local storage");
    for key in ["playerName", "rating", "levelScores_WebTester"] {
        store.remove(key).unwrap();
    }
    store
}

#[wasm_bindgen_test]
fn session_persists_in_local_storage() {
    let store = clean_store();
    let session = Session::new(store.clone());
    session.login("WebTester").unwrap();
    assert_eq!(store.get("playerName").as_deref(), Some("WebTester"));
    session.logout().unwrap();
    assert_eq!(session.current_identity(), None);
}

#[wasm_bindgen_test]
fn scores_round_trip_through_local_storage() {
    let store = clean_store();
    let board = Leaderboard::new(store.clone());
    board.record_score("WebTester", LevelId::Level1, 25).unwrap();
    board.record_score("WebTester", LevelId::Level1, 5).unwrap();
    assert_eq!(board.total_score("WebTester"), 25);
    assert_eq!(store.get("levelScores_WebTester").as_deref(), Some(r#"{"level1":25}"#));
    let _ = clean_store();
}

#[wasm_bindgen_test]
fn corrupted_rating_is_ignored() {
    let store = clean_store();
    store.set("rating", "not json").unwrap();
    assert!(Leaderboard::new(store.clone()).ranked_entries().is_empty());
    let _ = clean_store();
}

// --- Level pages through the exported API -----------------------------------

#[wasm_bindgen(inline_js = r#"
export function makePresenter() {
    return {
        elements: null,
        timers: [],
        pages: [],
        renderElements(json) { this.elements = json; },
        renderScore(score) {},
        renderTimer(seconds) { this.timers.push(seconds); },
        renderStage(stage) {},
        renderFeedback(message, positive) {},
        navigateTo(path) { this.pages.push(path); },
    };
}
export function timerCount(p) { return p.timers.length; }
export function lastElements(p) { return p.elements; }
export function lastPage(p) { return p.pages[p.pages.length - 1]; }
"#)]
extern "C" {
    #[wasm_bindgen(js_name = makePresenter)]
    fn make_presenter() -> JsValue;
    #[wasm_bindgen(js_name = timerCount)]
    fn timer_count(presenter: &JsValue) -> u32;
    #[wasm_bindgen(js_name = lastElements)]
    fn last_elements(presenter: &JsValue) -> Option<String>;
    #[wasm_bindgen(js_name = lastPage)]
    fn last_page(presenter: &JsValue) -> Option<String>;
}

fn start(level: u8, presenter: &JsValue) -> bool {
    web::start_level(level, presenter.clone().unchecked_into::<JsPresenter>()).unwrap()
}

fn stacking_widths(presenter: &JsValue) -> Vec<u64> {
    let json = last_elements(presenter).expect("board rendered");
    let state: serde_json::Value = serde_json::from_str(&json).unwrap();
    state["board"]["blocks"]
        .as_array()
        .expect("stacking board")
        .iter()
        .map(|block| block["width"].as_u64().unwrap())
        .collect()
}

// Swap neighbours through the exports until the board narrows upwards.
fn solve_stacking(presenter: &JsValue) {
    loop {
        let widths = stacking_widths(presenter);
        let Some(i) = widths.windows(2).position(|w| w[1] > w[0]) else {
            return;
        };
        web::level_select(i);
        web::level_move_up();
    }
}

#[wasm_bindgen_test]
fn level_page_without_player_goes_home() {
    let _ = clean_store();
    let presenter = make_presenter();
    assert!(!start(1, &presenter));
    assert_eq!(last_page(&presenter).as_deref(), Some("index.html"));
    assert!(!web::level_countdown_running());
}

#[wasm_bindgen_test]
async fn completing_a_level_stops_the_countdown() {
    let _ = clean_store();
    web::login("WebTester").unwrap();
    let presenter = make_presenter();
    assert!(start(1, &presenter));
    assert!(web::level_countdown_running());

    for _ in 0..3 {
        solve_stacking(&presenter);
        assert_eq!(web::level_check().as_deref(), Some("correct"));
    }
    assert!(!web::level_countdown_running());
    assert_eq!(web::level_next_page().as_deref(), Some("gameLevel2.html"));

    let rendered = timer_count(&presenter);
    TimeoutFuture::new(1_500).await;
    assert_eq!(timer_count(&presenter), rendered);
    assert_eq!(
        Leaderboard::new(BrowserStore::local().unwrap()).total_score("WebTester"),
        30
    );

    web::logout().unwrap();
    let _ = clean_store();
}

#[wasm_bindgen_test]
async fn starting_another_level_replaces_the_countdown() {
    let _ = clean_store();
    web::login("WebTester").unwrap();
    let first = make_presenter();
    let second = make_presenter();
    assert!(start(1, &first));
    assert!(start(2, &second));

    TimeoutFuture::new(2_500).await;
    // Only the render from entering the level.
    assert_eq!(timer_count(&first), 1);
    assert!(timer_count(&second) >= 2);

    web::logout().unwrap();
    assert!(!web::level_countdown_running());
    let ticks = timer_count(&second);
    TimeoutFuture::new(1_500).await;
    assert_eq!(timer_count(&second), ticks);
    let _ = clean_store();
}
