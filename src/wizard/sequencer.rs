// Step sequencer.
//
// Owns forward/back navigation eligibility only. Validation and side
// effects live in the engine; the sequencer just answers "may the index
// move" questions and records completion.

use std::collections::BTreeSet;

/// Where a `jump_to` request lands without further work, or what it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    /// Index moved.
    Moved,
    /// Target is ahead of an incomplete current step: the *current* step
    /// must validate (and run its side effect) before the jump is allowed.
    NeedsCurrentStep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequencer {
    total: usize,
    current: usize,
    completed: BTreeSet<usize>,
}

impl Sequencer {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            current: 1,
            completed: BTreeSet::new(),
        }
    }

    pub fn restore(total: usize, current: usize, completed: BTreeSet<usize>) -> Self {
        Self {
            total,
            current: current.clamp(1, total),
            completed,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn completed(&self) -> &BTreeSet<usize> {
        &self.completed
    }

    pub fn is_last(&self) -> bool {
        self.current == self.total
    }

    /// A step already marked complete, with its field values unchanged since,
    /// is navigable without re-validation.
    pub fn is_completed(&self, step: usize) -> bool {
        self.completed.contains(&step)
    }

    pub fn mark_completed(&mut self, step: usize) {
        self.completed.insert(step);
    }

    pub fn unmark_completed(&mut self, step: usize) {
        self.completed.remove(&step);
    }

    /// Move forward one step, recording the prior index as completed. Only
    /// called after the current step's validation and side effects succeed.
    pub fn advance(&mut self) {
        self.completed.insert(self.current);
        if self.current < self.total {
            self.current += 1;
        }
    }

    /// Backward navigation is unconditionally allowed.
    pub fn retreat(&mut self) {
        if self.current > 1 {
            self.current -= 1;
        }
    }

    /// Jump without validation when the target is behind the cursor or
    /// already completed; otherwise the caller must complete the current
    /// step first (a user cannot skip ahead over unfinished steps).
    pub fn jump_to(&mut self, target: usize) -> JumpOutcome {
        let target = target.clamp(1, self.total);
        if target < self.current || self.completed.contains(&target) {
            self.current = target;
            return JumpOutcome::Moved;
        }
        JumpOutcome::NeedsCurrentStep
    }

    /// Forced reposition, bypassing eligibility (BVN mismatch routing).
    pub fn force_jump(&mut self, target: usize) {
        self.current = target.clamp(1, self.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_records_completion_and_moves() {
        let mut seq = Sequencer::new(10);
        seq.advance();
        assert_eq!(seq.current(), 2);
        assert!(seq.is_completed(1));
    }

    #[test]
    fn advance_at_last_step_stays_put_but_completes() {
        let mut seq = Sequencer::restore(3, 3, BTreeSet::from([1, 2]));
        seq.advance();
        assert_eq!(seq.current(), 3);
        assert!(seq.is_completed(3));
    }

    #[test]
    fn retreat_never_goes_below_one() {
        let mut seq = Sequencer::new(10);
        seq.retreat();
        assert_eq!(seq.current(), 1);
        seq.advance();
        seq.retreat();
        assert_eq!(seq.current(), 1);
    }

    #[test]
    fn jump_backward_is_free() {
        let mut seq = Sequencer::restore(10, 5, BTreeSet::from([1, 2, 3, 4]));
        assert_eq!(seq.jump_to(2), JumpOutcome::Moved);
        assert_eq!(seq.current(), 2);
    }

    #[test]
    fn jump_forward_to_completed_step_is_free() {
        // A user went back from step 5 to step 2; step 4 is still completed.
        let mut seq = Sequencer::restore(10, 2, BTreeSet::from([1, 2, 3, 4]));
        assert_eq!(seq.jump_to(4), JumpOutcome::Moved);
        assert_eq!(seq.current(), 4);
    }

    #[test]
    fn jump_forward_past_incomplete_work_requires_current_step() {
        let mut seq = Sequencer::restore(10, 3, BTreeSet::from([1, 2]));
        assert_eq!(seq.jump_to(7), JumpOutcome::NeedsCurrentStep);
        assert_eq!(seq.current(), 3);
    }

    #[test]
    fn force_jump_bypasses_eligibility() {
        let mut seq = Sequencer::restore(10, 6, BTreeSet::from([1, 2, 3, 4, 5]));
        seq.force_jump(1);
        assert_eq!(seq.current(), 1);
    }
}
