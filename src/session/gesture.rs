use serde::{Deserialize, Serialize};

use crate::rig::{drag_value, Chain, ChainError, ChainResult, Target};

/// How a continuous gesture finished.
///
/// Both ends commit: a drag that loses its release event still keeps the
/// value the user last saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureEnd {
    Released,
    Cancelled,
}

/// Uncommitted working copy for a knob or slider drag
#[derive(Debug, Clone)]
pub struct Gesture {
    working: Chain,
    updates: usize,
}

impl Gesture {
    pub fn begin(from: &Chain) -> Self {
        Self {
            working: from.clone(),
            updates: 0,
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.working
    }

    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Write an absolute value into the working copy
    pub fn set(&mut self, target: Target, key: &str, value: f32) -> ChainResult<f32> {
        self.working = self.working.update_parameter(target, key, value)?;
        self.updates += 1;
        self.working
            .parameter(target, key)
            .ok_or_else(|| ChainError::UnknownParameterKey {
                key: key.to_string(),
            })
    }

    /// Write a knob-drag value: `start` plus half a step per pixel
    pub fn drag(&mut self, target: Target, key: &str, start: f32, delta_px: f32) -> ChainResult<f32> {
        self.set(target, key, drag_value(start, delta_px))
    }

    /// The chain to commit
    pub fn finish(self) -> Chain {
        self.working
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::rig::Amplifier;

    #[test]
    fn updates_stay_in_working_copy() {
        let chain = Chain::new(Amplifier::from_template(catalog::default_amp()));
        let mut gesture = Gesture::begin(&chain);
        assert_eq!(gesture.set(Target::Amp, "Master", 10.0), Ok(10.0));
        assert_eq!(gesture.drag(Target::Amp, "Master", 10.0, 40.0), Ok(30.0));
        assert_eq!(gesture.updates(), 2);
        assert_eq!(chain.parameter(Target::Amp, "Master"), Some(40.0));
        assert_eq!(gesture.finish().parameter(Target::Amp, "Master"), Some(30.0));
    }

    #[test]
    fn rejected_update_keeps_working_copy() {
        let chain = Chain::new(Amplifier::from_template(catalog::default_amp()));
        let mut gesture = Gesture::begin(&chain);
        gesture.set(Target::Amp, "Master", 5.0).unwrap();
        assert!(gesture.set(Target::Amp, "Nope", 5.0).is_err());
        assert!(gesture.set(Target::Pedal(0), "Tone", 5.0).is_err());
        assert_eq!(gesture.updates(), 1);
        assert_eq!(gesture.chain().parameter(Target::Amp, "Master"), Some(5.0));
    }
}
