//! Condition track - the six-step damage/debuff ladder.
//!
//! Step 0 is Normal, step 5 is Helpless. `persistent` only gates improvement:
//! worsening always goes through, improving a persistent condition requires an
//! explicit force.

/// Highest step (Helpless).
pub const HELPLESS_STEP: u8 = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConditionTrack {
    current: u8,
    pub persistent: bool,
}

impl ConditionTrack {
    pub fn new(step: i32, persistent: bool) -> Self {
        Self {
            current: clamp_step(step),
            persistent,
        }
    }

    pub const fn current(&self) -> u8 {
        self.current
    }

    /// Moves `steps` down the track. Never blocked; clamps at Helpless.
    pub fn worsen(&mut self, steps: u8) {
        self.current = self.current.saturating_add(steps).min(HELPLESS_STEP);
    }

    /// Moves `steps` up the track. Returns false (and changes nothing) when
    /// the condition is persistent and `force` is not set.
    pub fn improve(&mut self, steps: u8, force: bool) -> bool {
        if self.persistent && !force {
            return false;
        }
        self.current = self.current.saturating_sub(steps);
        true
    }

    /// Jumps to `step`, clamped to `[0, 5]`. Lowering a persistent condition
    /// without `force` is refused.
    pub fn set_step(&mut self, step: i32, force: bool) -> bool {
        let target = clamp_step(step);
        if target < self.current && self.persistent && !force {
            return false;
        }
        self.current = target;
        true
    }

    /// Numeric penalty for the current step from a six-entry table.
    pub fn penalty(&self, table: &[i32; 6]) -> i32 {
        table[self.current as usize]
    }

    pub const fn is_helpless(&self) -> bool {
        self.current == HELPLESS_STEP
    }

    pub const fn label(&self) -> &'static str {
        match self.current {
            0 => "Normal",
            1 => "-1 Step",
            2 => "-2 Steps",
            3 => "-5 Steps",
            4 => "-10 Steps",
            _ => "Helpless",
        }
    }
}

fn clamp_step(step: i32) -> u8 {
    step.clamp(0, HELPLESS_STEP as i32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;

    #[test]
    fn worsen_clamps_at_helpless() {
        let mut track = ConditionTrack::new(3, false);
        track.worsen(10);
        assert_eq!(track.current(), 5);
        assert!(track.is_helpless());
    }

    #[test]
    fn worsen_ignores_persistence() {
        let mut track = ConditionTrack::new(1, true);
        track.worsen(1);
        assert_eq!(track.current(), 2);
    }

    #[test]
    fn persistent_blocks_unforced_improvement() {
        let mut track = ConditionTrack::new(3, true);
        assert!(!track.improve(1, false));
        assert_eq!(track.current(), 3);

        assert!(track.improve(1, true));
        assert_eq!(track.current(), 2);
    }

    #[test]
    fn set_step_clamps_and_respects_persistence() {
        let mut track = ConditionTrack::default();
        assert!(track.set_step(9, false));
        assert_eq!(track.current(), 5);

        track.persistent = true;
        assert!(!track.set_step(-3, false));
        assert_eq!(track.current(), 5);
        assert!(track.set_step(-3, true));
        assert_eq!(track.current(), 0);
    }

    #[test]
    fn penalties_follow_table() {
        let table = RulesConfig::CONDITION_PENALTIES;
        let expected = [0, -1, -2, -5, -10, 0];
        for (step, penalty) in expected.into_iter().enumerate() {
            assert_eq!(ConditionTrack::new(step as i32, false).penalty(&table), penalty);
        }
    }
}
