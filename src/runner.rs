//! Drives one level page: forwards player input and timer ticks into the
//! engine, tells the presenter what changed, and saves the score when the
//! level is completed.

use crate::leaderboard::Leaderboard;
use crate::level::{
    self, Action, Board, LevelConfig, LevelId, LevelKind, Phase, PuzzleState, Verdict,
};
use crate::rng::RandomSource;
use crate::session::{PlayerIdentity, Session};
use crate::store::{KeyValueStore, StoreError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Index,
    Level(LevelId),
    Results,
}

impl Page {
    pub fn path(self) -> &'static str {
        match self {
            Page::Index => "index.html",
            Page::Level(LevelId::Level1) => "gameLevel1.html",
            Page::Level(LevelId::Level2) => "gameLevel2.html",
            Page::Level(LevelId::Level3) => "gameLevel3.html",
            Page::Results => "results.html",
        }
    }
}

/// Implemented by the page. Every call is a notification; nothing is read
/// back.
pub trait Presenter {
    fn render_elements(&self, state: &PuzzleState);
    fn render_score(&self, score: u32);
    fn render_timer(&self, seconds: u32);
    fn render_stage(&self, stage: u32);
    fn render_feedback(&self, message: &str, positive: bool);
    fn navigate_to(&self, page: Page);
}

impl<P: Presenter + ?Sized> Presenter for &P {
    fn render_elements(&self, state: &PuzzleState) {
        (**self).render_elements(state)
    }
    fn render_score(&self, score: u32) {
        (**self).render_score(score)
    }
    fn render_timer(&self, seconds: u32) {
        (**self).render_timer(seconds)
    }
    fn render_stage(&self, stage: u32) {
        (**self).render_stage(stage)
    }
    fn render_feedback(&self, message: &str, positive: bool) {
        (**self).render_feedback(message, positive)
    }
    fn navigate_to(&self, page: Page) {
        (**self).navigate_to(page)
    }
}

/// Whether the countdown should keep firing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

pub struct LevelRunner<S, P, R>
where
    S: KeyValueStore + Clone,
    P: Presenter,
    R: RandomSource,
{
    state: PuzzleState,
    player: PlayerIdentity,
    session: Session<S>,
    leaderboard: Leaderboard<S>,
    presenter: P,
    rng: R,
}

impl<S, P, R> LevelRunner<S, P, R>
where
    S: KeyValueStore + Clone,
    P: Presenter,
    R: RandomSource,
{
    /// Start a level for the logged-in player. Without a player the page is
    /// sent back to the name gate and `None` is returned.
    pub fn enter(config: &'static LevelConfig, store: S, presenter: P, mut rng: R) -> Option<Self> {
        let session = Session::new(store.clone());
        let Some(player) = session.current_identity() else {
            console_warn!("no player logged in, back to index");
            presenter.navigate_to(Page::Index);
            return None;
        };
        let state = level::start(config, &mut rng);
        presenter.render_elements(&state);
        presenter.render_score(state.score);
        presenter.render_stage(state.stage);
        presenter.render_timer(state.time_remaining);
        Some(Self {
            state,
            player,
            session,
            leaderboard: Leaderboard::new(store),
            presenter,
            rng,
        })
    }

    pub fn state(&self) -> &PuzzleState {
        &self.state
    }

    pub fn player(&self) -> &PlayerIdentity {
        &self.player
    }

    pub fn act(&mut self, action: Action) {
        if self.state.is_terminal() {
            return;
        }
        self.state = level::apply_action(self.state.clone(), action);
        self.presenter.render_elements(&self.state);
    }

    /// The "check" button. `None` once the level is over.
    pub fn check(&mut self) -> Option<Verdict> {
        if self.state.is_terminal() {
            return None;
        }
        let verdict = level::validate(&self.state);
        let stage_before = self.state.stage;
        self.state = level::on_validate(self.state.clone(), verdict, &mut self.rng);

        let config = self.state.config;
        match verdict {
            Verdict::Correct if self.state.phase == Phase::Completed => {
                self.presenter.render_feedback(
                    &format!("Pyramid is correct! Level {} complete!", config.id.number()),
                    true,
                );
                self.save_score();
            }
            Verdict::Correct => {
                self.presenter.render_feedback(
                    &format!("Pyramid is correct! Moving on to stage {}.", self.state.stage),
                    true,
                );
                if self.state.stage != stage_before {
                    self.presenter.render_stage(self.state.stage);
                    self.presenter.render_elements(&self.state);
                }
            }
            Verdict::Incorrect => self.presenter.render_feedback(wrong_message(config), false),
            Verdict::Incomplete => self.presenter.render_feedback(
                &format!("Not enough blocks! Collect all {} steps.", config.block_count()),
                false,
            ),
        }
        self.presenter.render_score(self.state.score);
        Some(verdict)
    }

    /// One second of countdown.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state.is_terminal() {
            return TickOutcome::Stop;
        }
        self.state = level::tick(self.state.clone(), &mut self.rng);
        self.presenter.render_timer(self.state.time_remaining);
        if matches!(self.state.board, Board::Falling { .. }) {
            self.presenter.render_elements(&self.state);
        }
        if self.state.phase == Phase::TimedOut {
            self.presenter.render_feedback("Time is up! Game over.", false);
            return TickOutcome::Stop;
        }
        TickOutcome::Continue
    }

    /// Where the "next" button leads once the level is completed.
    pub fn next_page(&self) -> Option<Page> {
        (self.state.phase == Phase::Completed).then(|| match self.state.level.next() {
            Some(next) => Page::Level(next),
            None => Page::Results,
        })
    }

    /// After a time-out the same level is loaded again.
    pub fn retry_page(&self) -> Option<Page> {
        (self.state.phase == Phase::TimedOut).then_some(Page::Level(self.state.level))
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        self.session.logout()?;
        self.presenter.navigate_to(Page::Index);
        Ok(())
    }

    fn save_score(&self) {
        if let Err(err) = self
            .leaderboard
            .record_score(&self.player.name, self.state.level, self.state.score)
        {
            console_warn!("could not save score", err.to_string());
            self.presenter
                .render_feedback("Level complete, but the score could not be saved.", false);
        }
    }
}

fn wrong_message(config: &LevelConfig) -> &'static str {
    match config.kind {
        LevelKind::Stacking => "The pyramid is out of order. Keep sorting.",
        LevelKind::Resizing => "The sizes are not right yet. Keep going.",
        LevelKind::Falling => {
            "Wrong! The pyramid must narrow from the widest step at the bottom to the smallest on top."
        }
    }
}
