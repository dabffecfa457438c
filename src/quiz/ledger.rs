use log::info;

use crate::quiz::controller::SessionResult;

/// Receives the reward of every completed quiz session.
pub trait RewardSink: Send {
    fn award(&mut self, result: &SessionResult);
}

/// Experience needed to leave `level`.
pub fn experience_for_level(level: u32) -> u32 {
    level.saturating_mul(100)
}

/// In-memory XP account. Experience left over after a level up carries into
/// the next level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpLedger {
    level: u32,
    experience: u32,
    total_earned: u32,
}

impl Default for XpLedger {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            total_earned: 0,
        }
    }
}

impl XpLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn experience(&self) -> u32 {
        self.experience
    }

    pub fn total_earned(&self) -> u32 {
        self.total_earned
    }

    /// Progress toward the next level, in `[0, 1)`.
    pub fn progress(&self) -> f32 {
        self.experience as f32 / experience_for_level(self.level) as f32
    }

    /// Returns the number of levels gained. Totals stop at `u32::MAX`.
    pub fn add_xp(&mut self, xp: u32) -> u32 {
        self.total_earned = self.total_earned.saturating_add(xp);
        self.experience = self.experience.saturating_add(xp);

        let mut gained = 0;
        while self.experience >= experience_for_level(self.level) {
            self.experience -= experience_for_level(self.level);
            self.level += 1;
            gained += 1;
        }
        gained
    }
}

impl RewardSink for XpLedger {
    fn award(&mut self, result: &SessionResult) {
        let gained = self.add_xp(result.reward);
        info!(
            "Awarded {} XP, level {} ({}/{})",
            result.reward,
            self.level,
            self.experience,
            experience_for_level(self.level)
        );
        if gained > 0 {
            info!("Level up! Now level {}", self.level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_level_one() {
        let ledger = XpLedger::new();
        assert_eq!(ledger.level(), 1);
        assert_eq!(ledger.experience(), 0);
        assert_eq!(ledger.progress(), 0.0);
    }

    #[test]
    fn accumulates_below_the_threshold() {
        let mut ledger = XpLedger::new();
        assert_eq!(ledger.add_xp(50), 0);
        assert_eq!(ledger.add_xp(40), 0);
        assert_eq!(ledger.experience(), 90);
        assert!((ledger.progress() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn surplus_carries_into_the_next_level() {
        let mut ledger = XpLedger::new();
        ledger.add_xp(90);
        assert_eq!(ledger.add_xp(50), 1);
        assert_eq!(ledger.level(), 2);
        assert_eq!(ledger.experience(), 40);
    }

    #[test]
    fn large_award_spans_several_levels() {
        let mut ledger = XpLedger::new();
        // 100 for level 1, 200 for level 2, 10 left
        assert_eq!(ledger.add_xp(310), 2);
        assert_eq!(ledger.level(), 3);
        assert_eq!(ledger.experience(), 10);
        assert_eq!(ledger.total_earned(), 310);
    }

    #[test]
    fn oversized_awards_saturate() {
        let mut ledger = XpLedger::new();
        assert!(ledger.add_xp(u32::MAX) > 0);
        ledger.add_xp(u32::MAX);

        assert_eq!(ledger.total_earned(), u32::MAX);
        assert!(ledger.experience() < experience_for_level(ledger.level()));
        assert!(ledger.progress() < 1.0);
    }

    #[test]
    fn award_uses_the_session_reward() {
        let mut ledger = XpLedger::new();
        ledger.award(&SessionResult {
            score: 5,
            total: 5,
            reward: 50,
            review: Vec::new(),
        });
        assert_eq!(ledger.experience(), 50);
    }
}
