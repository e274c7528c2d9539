//! Bounded linear undo/redo over chain snapshots.

use std::collections::VecDeque;

use super::chain::Chain;

/// Snapshots kept before the oldest is dropped
pub const HISTORY_LIMIT: usize = 50;

/// Snapshot log plus cursor.
///
/// The log is never empty and the cursor always points into it. The entry
/// under the cursor is the committed chain.
pub struct History {
    snapshots: VecDeque<Chain>,
    cursor: usize,
    limit: usize,
}

impl History {
    pub fn new(initial: Chain) -> Self {
        Self::with_limit(initial, HISTORY_LIMIT)
    }

    pub fn with_limit(initial: Chain, limit: usize) -> Self {
        let limit = limit.max(1);
        let mut snapshots = VecDeque::with_capacity(limit + 1);
        snapshots.push_back(initial);
        Self {
            snapshots,
            cursor: 0,
            limit,
        }
    }

    /// Append a snapshot, dropping any redo history past the cursor
    pub fn commit(&mut self, chain: Chain) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push_back(chain);
        self.cursor = self.snapshots.len() - 1;

        // Trim oldest
        while self.snapshots.len() > self.limit {
            self.snapshots.pop_front();
            self.cursor -= 1;
        }
    }

    /// Step back. Returns None (and changes nothing) at the oldest snapshot.
    pub fn undo(&mut self) -> Option<&Chain> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Step forward. Returns None (and changes nothing) at the newest snapshot.
    pub fn redo(&mut self) -> Option<&Chain> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.snapshots[self.cursor])
    }

    pub fn current(&self) -> &Chain {
        &self.snapshots[self.cursor]
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::rig::chain::{Amplifier, Target};

    fn base() -> Chain {
        Chain::new(Amplifier::from_template(catalog::default_amp()))
    }

    /// Distinct chain per n: amp Master set to n
    fn numbered(n: usize) -> Chain {
        base()
            .update_parameter(Target::Amp, "Master", n as f32)
            .unwrap()
    }

    fn master(chain: &Chain) -> f32 {
        chain.parameter(Target::Amp, "Master").unwrap()
    }

    #[test]
    fn starts_with_single_snapshot() {
        let history = History::new(base());
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_returns_previous_and_redo_round_trips() {
        let mut history = History::new(numbered(0));
        history.commit(numbered(1));
        history.commit(numbered(2));

        assert_eq!(history.undo().map(master), Some(1.0));
        assert_eq!(history.redo().map(master), Some(2.0));
        assert_eq!(master(history.current()), 2.0);
    }

    #[test]
    fn boundaries_are_noops() {
        let mut history = History::new(numbered(0));
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.cursor(), 0);

        history.commit(numbered(1));
        assert!(history.redo().is_none());
        assert_eq!(history.cursor(), 1);
    }

    #[test]
    fn commit_after_undo_discards_redo() {
        let mut history = History::new(numbered(0));
        history.commit(numbered(1));
        history.commit(numbered(2));
        history.undo();
        history.commit(numbered(3));

        assert!(history.redo().is_none());
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
        assert_eq!(history.undo().map(master), Some(1.0));
    }

    #[test]
    fn log_is_bounded_and_drops_oldest() {
        let mut history = History::new(numbered(0));
        for n in 1..=80 {
            history.commit(numbered(n));
            assert!(history.len() <= HISTORY_LIMIT);
            assert!(history.cursor() < history.len());
        }
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.cursor(), HISTORY_LIMIT - 1);

        let mut steps = 0;
        while history.undo().is_some() {
            steps += 1;
        }
        assert_eq!(steps, HISTORY_LIMIT - 1);
        // 80 commits + initial = 81 snapshots, the oldest 31 are gone
        assert_eq!(master(history.current()), 31.0);
    }

    #[test]
    fn trim_after_undo_keeps_cursor_valid() {
        let mut history = History::with_limit(numbered(0), 3);
        history.commit(numbered(1));
        history.commit(numbered(2));
        history.undo();
        history.undo();
        history.commit(numbered(3));
        assert_eq!(history.len(), 2);
        assert_eq!(history.cursor(), 1);

        history.commit(numbered(4));
        history.commit(numbered(5));
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
        assert_eq!(master(history.current()), 5.0);
    }

    #[test]
    fn zero_limit_still_holds_current() {
        let mut history = History::with_limit(numbered(0), 0);
        history.commit(numbered(1));
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert_eq!(master(history.current()), 1.0);
    }
}
