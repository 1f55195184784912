use serde::{Deserialize, Serialize};

use crate::SessionEvent;

/// Score and lives as a frontend would display them.
///
/// The best score survives [`reset()`](Self::reset), but only in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    score_per_match: u32,
    score: u32,
    best_score: u32,
    /// `None` if there is no fail limit, in which case lives are not shown.
    lives: Option<u32>,
}

impl Scoreboard {
    pub fn new(score_per_match: u32) -> Self {
        Self {
            score_per_match,
            ..Self::default()
        }
    }

    /// Starts a new session with zero points.
    pub fn reset(&mut self, lives: Option<u32>) {
        self.score = 0;
        self.lives = lives;
    }

    /// Returns true if this match set a new best score.
    pub fn record_match(&mut self) -> bool {
        self.score += self.score_per_match;
        if self.score > self.best_score {
            self.best_score = self.score;
            true
        } else {
            false
        }
    }

    pub fn set_lives(&mut self, lives: Option<u32>) {
        self.lives = lives;
    }

    pub fn apply(&mut self, event: &SessionEvent) {
        match *event {
            SessionEvent::Matched => {
                self.record_match();
            }
            SessionEvent::Failed { remaining } => self.set_lives(remaining),
            SessionEvent::Victory | SessionEvent::GameOver => {}
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn lives(&self) -> Option<u32> {
        self.lives
    }
}

impl std::fmt::Display for Scoreboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Score: {}", self.score)?;
        if self.best_score > 0 {
            write!(f, "  High Score: {}", self.best_score)?;
        }
        if let Some(lives) = self.lives {
            write!(f, "  Lives: {}", lives)?;
        }
        Ok(())
    }
}
