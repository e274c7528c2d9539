use serde::{Deserialize, Serialize};

use super::chain::{Chain, PedalInstance, Target};
use super::error::{ChainError, ChainResult};

/// What the parameter panel is editing. At most one thing at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    None,
    Pedal(usize),
    Amp,
}

impl Selection {
    /// Select a pedal position, validated against the chain
    pub fn select_pedal(&mut self, chain: &Chain, position: usize) -> ChainResult<()> {
        if position >= chain.len() {
            return Err(ChainError::IndexOutOfRange {
                position,
                len: chain.len(),
            });
        }
        *self = Selection::Pedal(position);
        Ok(())
    }

    pub fn select_amp(&mut self) {
        *self = Selection::Amp;
    }

    pub fn clear(&mut self) {
        *self = Selection::None;
    }

    pub fn target(&self) -> Option<Target> {
        match self {
            Selection::None => None,
            Selection::Pedal(p) => Some(Target::Pedal(*p)),
            Selection::Amp => Some(Target::Amp),
        }
    }

    /// The selected pedal, or None if nothing (or the amp) is selected or
    /// the position no longer exists
    pub fn selected_pedal<'a>(&self, chain: &'a Chain) -> Option<&'a PedalInstance> {
        match self {
            Selection::Pedal(p) => chain.pedal(*p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::rig::chain::Amplifier;

    fn two_pedals() -> Chain {
        let chain = Chain::new(Amplifier::from_template(catalog::default_amp()));
        let chain = chain.add_pedal(&catalog::PEDALS[0], "a".into());
        chain.add_pedal(&catalog::PEDALS[1], "b".into())
    }

    #[test]
    fn pedal_and_amp_are_exclusive() {
        let chain = two_pedals();
        let mut sel = Selection::default();
        sel.select_pedal(&chain, 1).unwrap();
        assert_eq!(sel.target(), Some(Target::Pedal(1)));
        sel.select_amp();
        assert_eq!(sel, Selection::Amp);
        assert!(sel.selected_pedal(&chain).is_none());
        sel.select_pedal(&chain, 0).unwrap();
        assert_eq!(sel.target(), Some(Target::Pedal(0)));
        assert_eq!(sel.selected_pedal(&chain).map(|p| p.id.as_str()), Some("a"));
    }

    #[test]
    fn invalid_position_keeps_previous() {
        let chain = two_pedals();
        let mut sel = Selection::Amp;
        assert!(sel.select_pedal(&chain, 2).is_err());
        assert_eq!(sel, Selection::Amp);
    }

    #[test]
    fn stale_position_resolves_to_nothing() {
        let chain = two_pedals();
        let sel = Selection::Pedal(1);
        let shorter = chain.remove_pedal(0).unwrap();
        assert!(sel.selected_pedal(&shorter).is_none());
    }
}
