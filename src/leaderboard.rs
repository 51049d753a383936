//! Best scores per player and level, and the shared rating list.

use serde::{Deserialize, Serialize};

use crate::level::LevelId;
use crate::store::{self, KeyValueStore, RATING_KEY, StoreError};

/// Stored as `levelScores_<player>`. Absent levels have never been completed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelScores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level1: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level2: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level3: Option<u32>,
}

impl LevelScores {
    pub fn best(&self, level: LevelId) -> Option<u32> {
        match level {
            LevelId::Level1 => self.level1,
            LevelId::Level2 => self.level2,
            LevelId::Level3 => self.level3,
        }
    }

    fn slot(&mut self, level: LevelId) -> &mut Option<u32> {
        match level {
            LevelId::Level1 => &mut self.level1,
            LevelId::Level2 => &mut self.level2,
            LevelId::Level3 => &mut self.level3,
        }
    }

    /// Keeps the higher of the stored and the new score.
    pub fn raise(&mut self, level: LevelId, score: u32) -> u32 {
        let slot = self.slot(level);
        let best = slot.map_or(score, |prev| prev.max(score));
        *slot = Some(best);
        best
    }

    pub fn total(&self) -> u32 {
        LevelId::ALL
            .iter()
            .map(|&level| self.best(level).unwrap_or(0))
            .fold(0u32, u32::saturating_add)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    /// Sum of the player's best level scores.
    pub score: u32,
}

pub struct Leaderboard<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Leaderboard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn level_scores(&self, player: &str) -> LevelScores {
        store::read_json_or_default(&self.store, &store::level_scores_key(player))
    }

    pub fn total_score(&self, player: &str) -> u32 {
        self.level_scores(player).total()
    }

    /// Raise the player's best for `level` and refresh their rating entry.
    /// Returns the new total.
    pub fn record_score(
        &self,
        player: &str,
        level: LevelId,
        score: u32,
    ) -> Result<u32, StoreError> {
        let mut scores = self.level_scores(player);
        let best = scores.raise(level, score);
        store::write_json(&self.store, &store::level_scores_key(player), &scores)?;

        let total = scores.total();
        let mut rating = self.stored_entries();
        match rating.iter_mut().find(|entry| entry.username == player) {
            Some(entry) => entry.score = total,
            None => rating.push(LeaderboardEntry {
                username: player.to_string(),
                score: total,
            }),
        }
        store::write_json(&self.store, RATING_KEY, &rating)?;
        console_log!("score saved", player, level.key(), best, total);
        Ok(total)
    }

    /// Highest total first. Equal totals keep the order players first
    /// appeared in, so repeated calls agree.
    pub fn ranked_entries(&self) -> Vec<LeaderboardEntry> {
        let mut entries = self.stored_entries();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }

    fn stored_entries(&self) -> Vec<LeaderboardEntry> {
        store::read_json_or_default(&self.store, RATING_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FailingStore, MemoryStore};

    fn entry(username: &str, score: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            username: username.into(),
            score,
        }
    }

    #[test]
    fn best_score_never_decreases() {
        let board = Leaderboard::new(MemoryStore::new());
        board.record_score("Alice", LevelId::Level1, 10).unwrap();
        board.record_score("Alice", LevelId::Level1, 7).unwrap();
        assert_eq!(board.level_scores("Alice").level1, Some(10));
        board.record_score("Alice", LevelId::Level1, 12).unwrap();
        assert_eq!(board.level_scores("Alice").level1, Some(12));
    }

    #[test]
    fn total_sums_recorded_levels_only() {
        let board = Leaderboard::new(MemoryStore::new());
        assert_eq!(board.total_score("Bob"), 0);
        board.record_score("Bob", LevelId::Level1, 30).unwrap();
        let total = board.record_score("Bob", LevelId::Level3, 30).unwrap();
        assert_eq!(total, 60);
        assert_eq!(board.total_score("Bob"), 60);
        assert_eq!(board.level_scores("Bob").level2, None);
    }

    #[test]
    fn rating_entry_is_updated_in_place() {
        let board = Leaderboard::new(MemoryStore::new());
        board.record_score("A", LevelId::Level1, 5).unwrap();
        board.record_score("B", LevelId::Level1, 8).unwrap();
        board.record_score("A", LevelId::Level2, 20).unwrap();
        let ranked = board.ranked_entries();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0], entry("A", 25));
        assert_eq!(ranked[1], entry("B", 8));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let store = MemoryStore::new();
        store
            .set(
                RATING_KEY,
                r#"[{"username":"A","score":50},{"username":"B","score":90},{"username":"C","score":90}]"#,
            )
            .unwrap();
        let board = Leaderboard::new(&store);
        for _ in 0..3 {
            let names: Vec<String> = board
                .ranked_entries()
                .into_iter()
                .map(|e| e.username)
                .collect();
            assert_eq!(names, ["B", "C", "A"]);
        }
    }

    #[test]
    fn corrupted_values_read_as_empty() {
        let store = MemoryStore::new();
        store.set(RATING_KEY, "oops").unwrap();
        store.set("levelScores_Eve", "[1,2").unwrap();
        let board = Leaderboard::new(&store);
        assert!(board.ranked_entries().is_empty());
        assert_eq!(board.level_scores("Eve"), LevelScores::default());
        assert_eq!(board.record_score("Eve", LevelId::Level2, 40).unwrap(), 40);
        assert_eq!(board.ranked_entries().len(), 1);
    }

    #[test]
    fn level_scores_use_stored_json_layout() {
        let store = MemoryStore::new();
        let board = Leaderboard::new(&store);
        board.record_score("Zed", LevelId::Level2, 15).unwrap();
        assert_eq!(store.get("levelScores_Zed").as_deref(), Some(r#"{"level2":15}"#));
        assert_eq!(
            store.get(RATING_KEY).as_deref(),
            Some(r#"[{"username":"Zed","score":15}]"#)
        );
    }

    #[test]
    fn rejected_write_is_reported() {
        let store = FailingStore::default();
        let board = Leaderboard::new(&store);
        board.record_score("Ann", LevelId::Level1, 10).unwrap();
        store.reject_writes();
        assert!(matches!(
            board.record_score("Ann", LevelId::Level2, 20),
            Err(StoreError::Rejected(_))
        ));
        assert_eq!(board.total_score("Ann"), 10);
        assert_eq!(board.ranked_entries(), vec![entry("Ann", 10)]);
    }
}
