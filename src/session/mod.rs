//! One user's editing session: the committed chain history, the selection,
//! an optional in-flight gesture and the transient UI-facing state around it.
//!
//! Every method runs to completion synchronously. A method that returns an
//! error has changed nothing.

pub mod gesture;
pub mod notice;

pub use gesture::{Gesture, GestureEnd};
pub use notice::{Notice, NoticeKind};

use std::time::Instant;

use crate::assist::Blueprint;
use crate::catalog;
use crate::library::SetupDetails;
use crate::rig::{Amplifier, Chain, ChainError, ChainResult, Direction, History, Selection, Target};

/// Text shown when an assistant call fails
pub const ASSIST_FALLBACK: &str = "Failed to get AI recommendation.";

pub struct EditorSession {
    history: History,
    selection: Selection,
    gesture: Option<Gesture>,
    /// Running counter for pedal instance ids
    seq: u64,
    details: SetupDetails,
    suggestion: Option<String>,
    blueprint: Option<Blueprint>,
    notice: Option<Notice>,
}

impl EditorSession {
    /// Session over an existing chain
    pub fn new(initial: Chain) -> Self {
        Self {
            history: History::new(initial),
            selection: Selection::None,
            gesture: None,
            seq: 0,
            details: SetupDetails::default(),
            suggestion: None,
            blueprint: None,
            notice: None,
        }
    }

    /// Default amp and no pedals
    pub fn empty() -> Self {
        Self::new(Chain::new(Amplifier::from_template(catalog::default_amp())))
    }

    /// Default amp with the default pedal selected, as the create flow opens
    pub fn with_default_pedal() -> Self {
        let mut seq = 0;
        let base = Chain::new(Amplifier::from_template(catalog::default_amp()));
        let pedal = catalog::default_pedal();
        let id = base.fresh_id(pedal.id, &mut seq);
        let mut session = Self::new(base.add_pedal(pedal, id));
        session.seq = seq;
        session.selection = Selection::Pedal(0);
        session
    }

    /// The chain as the user sees it, including an uncommitted gesture
    pub fn chain(&self) -> &Chain {
        match &self.gesture {
            Some(g) => g.chain(),
            None => self.history.current(),
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn details(&self) -> &SetupDetails {
        &self.details
    }

    pub fn set_details(&mut self, details: SetupDetails) {
        self.details = details;
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn blueprint(&self) -> Option<&Blueprint> {
        self.blueprint.as_ref()
    }

    /// The current notice, if it has not expired yet
    pub fn notice(&self, now: Instant) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| n.is_live(now))
    }

    pub fn notify(&mut self, text: impl Into<String>, kind: NoticeKind) {
        self.notice = Some(Notice::new(text, kind));
    }

    fn commit(&mut self, chain: Chain) {
        self.history.commit(chain);
    }

    /// Close an open gesture before any other edit touches the chain
    fn settle(&mut self) {
        if self.gesture.is_some() {
            let _ = self.end_gesture(GestureEnd::Cancelled);
        }
    }

    // === Chain edits ===

    /// Append a catalog pedal and select it. Returns its position.
    pub fn add_pedal(&mut self, template_id: &str) -> ChainResult<usize> {
        let template = catalog::pedal(template_id).ok_or_else(|| ChainError::UnknownTemplate {
            id: template_id.to_string(),
        })?;
        self.settle();
        let current = self.history.current();
        let id = current.fresh_id(template.id, &mut self.seq);
        let next = current.add_pedal(template, id);
        let position = next.len() - 1;
        self.commit(next);
        self.selection = Selection::Pedal(position);
        Ok(position)
    }

    pub fn remove_pedal(&mut self, position: usize) -> ChainResult<()> {
        self.settle();
        let next = self.history.current().remove_pedal(position)?;
        self.commit(next);
        self.selection.clear();
        Ok(())
    }

    pub fn move_pedal(&mut self, position: usize, direction: Direction) -> ChainResult<()> {
        self.settle();
        let current = self.history.current();
        let next = current.move_pedal(position, direction)?;
        if &next != current {
            self.commit(next);
            self.selection.clear();
        }
        Ok(())
    }

    /// Drag-and-drop reposition
    pub fn reorder_pedal(&mut self, from: usize, to: usize) -> ChainResult<()> {
        self.settle();
        let current = self.history.current();
        let next = current.reorder_pedal(from, to)?;
        if &next != current {
            self.commit(next);
            self.selection.clear();
        }
        Ok(())
    }

    pub fn toggle_bypass(&mut self, target: Target) -> ChainResult<bool> {
        self.settle();
        let next = self.history.current().toggle_bypass(target)?;
        let bypassed = match target {
            Target::Pedal(p) => next.pedals[p].bypassed,
            Target::Amp => next.amplifier.bypassed,
        };
        self.commit(next);
        Ok(bypassed)
    }

    /// A discrete parameter edit (typed value, keyboard step). Returns the
    /// stored, clamped value.
    pub fn set_param(&mut self, target: Target, key: &str, value: f32) -> ChainResult<f32> {
        self.settle();
        let next = self.history.current().update_parameter(target, key, value)?;
        let stored = next.parameter(target, key).unwrap_or_default();
        self.commit(next);
        Ok(stored)
    }

    pub fn set_notes(&mut self, target: Target, notes: Option<&str>) -> ChainResult<()> {
        self.settle();
        let current = self.history.current();
        let next = current.set_notes(target, notes)?;
        if &next != current {
            self.commit(next);
        }
        Ok(())
    }

    /// Swap in a catalog amp and select it
    pub fn set_amplifier(&mut self, template_id: &str) -> ChainResult<()> {
        let template = catalog::amp(template_id).ok_or_else(|| ChainError::UnknownTemplate {
            id: template_id.to_string(),
        })?;
        self.settle();
        let next = self.history.current().set_amplifier(template);
        self.commit(next);
        self.selection.select_amp();
        Ok(())
    }

    pub fn select_channel(&mut self, channel: &str) -> ChainResult<()> {
        self.settle();
        let next = self.history.current().select_channel(channel)?;
        self.commit(next);
        Ok(())
    }

    pub fn select_variant(&mut self, variant: &str) -> ChainResult<()> {
        self.settle();
        let next = self.history.current().select_variant(variant)?;
        self.commit(next);
        Ok(())
    }

    pub fn auto_arrange(&mut self) {
        self.settle();
        let current = self.history.current();
        let next = current.auto_arrange();
        if &next != current {
            self.commit(next);
            self.selection.clear();
        }
    }

    pub fn clear_chain(&mut self) {
        self.settle();
        let next = self.history.current().clear();
        self.commit(next);
        self.selection.clear();
    }

    /// Replace the whole chain in one commit (loaded setup, applied blueprint)
    pub fn replace_chain(&mut self, chain: Chain) {
        self.settle();
        self.commit(chain);
        self.selection.clear();
    }

    // === Gestures ===

    /// Start a continuous edit. An already open gesture is committed first.
    pub fn begin_gesture(&mut self) {
        self.settle();
        self.gesture = Some(Gesture::begin(self.history.current()));
    }

    pub fn gesture_set(&mut self, target: Target, key: &str, value: f32) -> ChainResult<f32> {
        self.gesture
            .as_mut()
            .ok_or(ChainError::NoGesture)?
            .set(target, key, value)
    }

    pub fn gesture_drag(
        &mut self,
        target: Target,
        key: &str,
        start: f32,
        delta_px: f32,
    ) -> ChainResult<f32> {
        self.gesture
            .as_mut()
            .ok_or(ChainError::NoGesture)?
            .drag(target, key, start, delta_px)
    }

    /// Commit the gesture's working copy as one snapshot. Returns whether a
    /// snapshot was added (an untouched drag adds nothing).
    pub fn end_gesture(&mut self, end: GestureEnd) -> ChainResult<bool> {
        let gesture = self.gesture.take().ok_or(ChainError::NoGesture)?;
        if end == GestureEnd::Cancelled {
            log::debug!("gesture cancelled after {} updates, keeping last value", gesture.updates());
        }
        let working = gesture.finish();
        if &working == self.history.current() {
            return Ok(false);
        }
        self.commit(working);
        Ok(true)
    }

    // === Selection ===

    pub fn select(&mut self, selection: Selection) -> ChainResult<()> {
        match selection {
            Selection::None => self.selection.clear(),
            Selection::Amp => self.selection.select_amp(),
            Selection::Pedal(p) => {
                let mut next = self.selection;
                next.select_pedal(self.chain(), p)?;
                self.selection = next;
            }
        }
        Ok(())
    }

    // === History ===

    pub fn undo(&mut self) -> bool {
        self.settle();
        let moved = self.history.undo().is_some();
        if moved {
            self.selection.clear();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        self.settle();
        let moved = self.history.redo().is_some();
        if moved {
            self.selection.clear();
        }
        moved
    }

    // === Assistant results ===

    pub fn set_suggestion(&mut self, text: impl Into<String>) {
        self.suggestion = Some(text.into());
    }

    /// Drop the previous suggestion while a new one is on its way
    pub fn clear_suggestion(&mut self) {
        self.suggestion = None;
    }

    /// Hold a blueprint until the user applies it
    pub fn offer_blueprint(&mut self, blueprint: Blueprint) {
        self.suggestion = Some(blueprint.insight.clone());
        self.blueprint = Some(blueprint);
    }

    /// Forget the offered blueprint, e.g. because a new one was requested
    pub fn withdraw_blueprint(&mut self) {
        if self.blueprint.take().is_some() {
            self.suggestion = None;
        }
    }

    /// Build the offered blueprint into a chain and commit it. Returns false
    /// if nothing was on offer.
    pub fn apply_blueprint(&mut self) -> bool {
        let Some(blueprint) = self.blueprint.take() else {
            return false;
        };
        self.settle();
        let next = blueprint.to_chain(self.history.current(), &mut self.seq);
        self.replace_chain(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PedalCategory;
    use crate::rig::history::HISTORY_LIMIT;

    fn names(session: &EditorSession) -> Vec<String> {
        session.chain().pedals.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn default_pedal_entry_flow() {
        let session = EditorSession::with_default_pedal();
        assert_eq!(names(&session), vec!["Dyna Comp"]);
        assert_eq!(session.selection(), Selection::Pedal(0));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn remove_undo_add_scenario() {
        // chain = [Compressor, Overdrive], amp = JCM800
        let mut session = EditorSession::empty();
        session.add_pedal("1").unwrap();
        session.add_pedal("2").unwrap();
        let before = session.chain().clone();

        session.remove_pedal(0).unwrap();
        assert_eq!(names(&session), vec!["Tube Screamer"]);

        assert!(session.undo());
        assert_eq!(session.chain(), &before);
        assert_eq!(session.history().cursor(), 2);

        session.add_pedal("5").unwrap();
        assert_eq!(names(&session), vec!["Dyna Comp", "Tube Screamer", "Carbon Copy"]);
        assert!(!session.redo());
        assert_eq!(session.history().cursor(), session.history().len() - 1);
    }

    #[test]
    fn commit_commit_undo_commit_kills_redo() {
        let mut session = EditorSession::empty();
        session.add_pedal("1").unwrap();
        session.add_pedal("2").unwrap();
        session.undo();
        session.add_pedal("3").unwrap();
        assert!(!session.redo());
        assert_eq!(session.history().len(), 3);
    }

    #[test]
    fn failed_edit_changes_nothing() {
        let mut session = EditorSession::with_default_pedal();
        let len = session.history().len();
        assert!(session.remove_pedal(4).is_err());
        assert!(session.set_param(Target::Pedal(0), "Fuzz", 10.0).is_err());
        assert!(session.add_pedal("no-such-pedal").is_err());
        assert_eq!(session.history().len(), len);
        assert_eq!(session.selection(), Selection::Pedal(0));
    }

    #[test]
    fn selection_rules() {
        let mut session = EditorSession::empty();
        assert_eq!(session.add_pedal("1").unwrap(), 0);
        assert_eq!(session.add_pedal("2").unwrap(), 1);
        assert_eq!(session.selection(), Selection::Pedal(1));

        session.select(Selection::Amp).unwrap();
        assert_eq!(session.selection(), Selection::Amp);

        session.select(Selection::Pedal(0)).unwrap();
        session.reorder_pedal(0, 1).unwrap();
        assert_eq!(session.selection(), Selection::None);

        session.select(Selection::Pedal(1)).unwrap();
        session.remove_pedal(1).unwrap();
        assert_eq!(session.selection(), Selection::None);

        session.select(Selection::Pedal(0)).unwrap();
        session.undo();
        assert_eq!(session.selection(), Selection::None);

        assert!(session.select(Selection::Pedal(9)).is_err());

        session.set_amplifier("amp-2").unwrap();
        assert_eq!(session.selection(), Selection::Amp);
    }

    #[test]
    fn noop_moves_do_not_commit() {
        let mut session = EditorSession::empty();
        session.add_pedal("1").unwrap();
        let len = session.history().len();
        session.move_pedal(0, Direction::Left).unwrap();
        session.reorder_pedal(0, 0).unwrap();
        session.auto_arrange();
        assert_eq!(session.history().len(), len);
    }

    #[test]
    fn gesture_commits_once() {
        let mut session = EditorSession::with_default_pedal();
        session.begin_gesture();
        for v in 0..30 {
            session
                .gesture_drag(Target::Pedal(0), "Output", 40.0, v as f32)
                .unwrap();
        }
        // Visible but not committed
        assert_eq!(session.chain().parameter(Target::Pedal(0), "Output"), Some(55.0));
        assert_eq!(session.history().len(), 1);

        assert!(session.end_gesture(GestureEnd::Released).unwrap());
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.chain().parameter(Target::Pedal(0), "Output"), Some(55.0));

        session.undo();
        assert_eq!(session.chain().parameter(Target::Pedal(0), "Output"), Some(40.0));
    }

    #[test]
    fn cancelled_gesture_still_commits() {
        let mut session = EditorSession::with_default_pedal();
        session.begin_gesture();
        session.gesture_set(Target::Amp, "Treble", 99.0).unwrap();
        assert!(session.end_gesture(GestureEnd::Cancelled).unwrap());
        assert_eq!(session.chain().parameter(Target::Amp, "Treble"), Some(99.0));
    }

    #[test]
    fn untouched_gesture_adds_nothing() {
        let mut session = EditorSession::with_default_pedal();
        session.begin_gesture();
        assert!(!session.end_gesture(GestureEnd::Released).unwrap());
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.end_gesture(GestureEnd::Released), Err(ChainError::NoGesture));
        assert_eq!(
            session.gesture_set(Target::Amp, "Treble", 1.0),
            Err(ChainError::NoGesture)
        );
    }

    #[test]
    fn other_commands_settle_open_gesture() {
        let mut session = EditorSession::with_default_pedal();
        session.begin_gesture();
        session.gesture_set(Target::Amp, "Master", 77.0).unwrap();
        session.add_pedal("6").unwrap();
        assert!(!session.gesture_active());
        // gesture snapshot, then the add
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.chain().parameter(Target::Amp, "Master"), Some(77.0));
    }

    #[test]
    fn set_param_clamps_and_commits() {
        let mut session = EditorSession::with_default_pedal();
        assert_eq!(session.set_param(Target::Pedal(0), "Sensitivity", -40.0), Ok(0.0));
        assert_eq!(session.set_param(Target::Pedal(0), "Sensitivity", 230.0), Ok(100.0));
        assert_eq!(session.history().len(), 3);
    }

    #[test]
    fn history_stays_bounded_through_session() {
        let mut session = EditorSession::with_default_pedal();
        for i in 0..120 {
            session.set_param(Target::Amp, "Master", (i % 100) as f32).unwrap();
            let h = session.history();
            assert!(h.len() <= HISTORY_LIMIT);
            assert!(h.cursor() < h.len());
        }
    }

    #[test]
    fn blueprint_applies_as_single_commit() {
        let mut session = EditorSession::with_default_pedal();
        assert!(!session.apply_blueprint());

        session.offer_blueprint(Blueprint {
            insight: "Fuzz into space".into(),
            pedals: vec![PedalCategory::Drive, PedalCategory::Reverb],
            amp_brand: Some("Fender".into()),
        });
        assert_eq!(session.suggestion(), Some("Fuzz into space"));
        let len = session.history().len();

        assert!(session.apply_blueprint());
        assert_eq!(names(&session), vec!["Tube Screamer", "BigSky"]);
        assert_eq!(session.chain().amplifier.brand, "Fender");
        assert_eq!(session.history().len(), len + 1);
        assert!(session.blueprint().is_none());

        session.undo();
        assert_eq!(names(&session), vec!["Dyna Comp"]);
    }

    #[test]
    fn notices_expire() {
        let mut session = EditorSession::empty();
        session.notify("hello", NoticeKind::Info);
        let now = Instant::now();
        assert!(session.notice(now).is_some());
        assert!(session.notice(now + notice::NOTICE_TTL).is_none());
    }
}
