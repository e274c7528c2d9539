use serde::{Deserialize, Serialize};

use crate::catalog::{AmpTemplate, PedalCategory, PedalTemplate};

use super::error::{ChainError, ChainResult};
use super::params::ParamMap;

/// Amp parameters shown in the EQ group. Purely a display partition.
pub const TONE_STACK_PARAMS: [&str; 6] = ["Bass", "Mid", "Middle", "Treble", "Presence", "Cut"];

/// One pedal placed in the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PedalInstance {
    /// Instance identity, unique within the chain
    pub id: String,
    /// Catalog pedal this instance was cloned from
    #[serde(default)]
    pub template_id: String,
    pub name: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub category: PedalCategory,
    pub color: String,
    #[serde(default)]
    pub icon: String,
    pub settings: ParamMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, rename = "isBypassed")]
    pub bypassed: bool,
}

impl PedalInstance {
    /// Clone catalog defaults into a fresh, engaged instance
    pub fn from_template(template: &PedalTemplate, id: String) -> Self {
        Self {
            id,
            template_id: template.id.to_string(),
            name: template.name.to_string(),
            brand: template.brand.to_string(),
            category: template.category,
            color: template.color.to_string(),
            icon: template.icon.to_string(),
            settings: ParamMap::from_pairs(template.settings),
            notes: None,
            bypassed: false,
        }
    }
}

/// The single amplifier at the end of the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amplifier {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub color: String,
    pub settings: ParamMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, rename = "isBypassed")]
    pub bypassed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_channel: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_variant: Option<String>,
}

impl Amplifier {
    /// Fresh amp from the catalog. The first channel/variant starts active.
    pub fn from_template(template: &AmpTemplate) -> Self {
        let channels: Vec<String> = template.channels.iter().map(|c| c.to_string()).collect();
        let variants: Vec<String> = template.variants.iter().map(|v| v.to_string()).collect();
        Self {
            id: template.id.to_string(),
            name: template.name.to_string(),
            brand: template.brand.to_string(),
            color: template.color.to_string(),
            settings: ParamMap::from_pairs(template.settings),
            notes: None,
            bypassed: false,
            active_channel: channels.first().cloned(),
            channels,
            active_variant: variants.first().cloned(),
            variants,
        }
    }

    /// EQ-style parameters (Bass, Mid, Treble, ...)
    pub fn tone_stack(&self) -> Vec<(&str, f32)> {
        self.settings
            .iter()
            .filter(|(k, _)| TONE_STACK_PARAMS.contains(k))
            .collect()
    }

    /// Everything that is not tone stack: gain, volume, master, effects
    pub fn gain_stage(&self) -> Vec<(&str, f32)> {
        self.settings
            .iter()
            .filter(|(k, _)| !TONE_STACK_PARAMS.contains(k))
            .collect()
    }
}

/// Which component an edit addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Pedal(usize),
    Amp,
}

/// Neighbour to swap with. Left is towards the input, Right towards the amp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

/// Ordered pedals plus the amp: the unit of editing and of history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub pedals: Vec<PedalInstance>,
    pub amplifier: Amplifier,
}

impl Chain {
    pub fn new(amplifier: Amplifier) -> Self {
        Self {
            pedals: Vec::new(),
            amplifier,
        }
    }

    pub fn len(&self) -> usize {
        self.pedals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pedals.is_empty()
    }

    pub fn pedal(&self, position: usize) -> Option<&PedalInstance> {
        self.pedals.get(position)
    }

    fn check_position(&self, position: usize) -> ChainResult<()> {
        if position < self.pedals.len() {
            Ok(())
        } else {
            Err(ChainError::IndexOutOfRange {
                position,
                len: self.pedals.len(),
            })
        }
    }

    /// An instance id derived from the template id that is not yet used in
    /// this chain. `seq` is the session's running counter.
    pub fn fresh_id(&self, template_id: &str, seq: &mut u64) -> String {
        loop {
            *seq += 1;
            let candidate = format!("{}-{}", template_id, seq);
            if !self.pedals.iter().any(|p| p.id == candidate) {
                return candidate;
            }
        }
    }

    pub fn add_pedal(&self, template: &PedalTemplate, id: String) -> Chain {
        let mut next = self.clone();
        next.pedals.push(PedalInstance::from_template(template, id));
        next
    }

    pub fn remove_pedal(&self, position: usize) -> ChainResult<Chain> {
        self.check_position(position)?;
        let mut next = self.clone();
        next.pedals.remove(position);
        Ok(next)
    }

    /// Swap with the neighbour; moving past either end returns an equal chain
    pub fn move_pedal(&self, position: usize, direction: Direction) -> ChainResult<Chain> {
        self.check_position(position)?;
        let neighbour = match direction {
            Direction::Left => position.checked_sub(1),
            Direction::Right => Some(position + 1).filter(|&n| n < self.pedals.len()),
        };
        let mut next = self.clone();
        if let Some(n) = neighbour {
            next.pedals.swap(position, n);
        }
        Ok(next)
    }

    /// Drag-and-drop reposition. `to` indexes the sequence after the pedal
    /// has been taken out, and is clamped to its end.
    pub fn reorder_pedal(&self, from: usize, to: usize) -> ChainResult<Chain> {
        self.check_position(from)?;
        let mut next = self.clone();
        if from == to {
            return Ok(next);
        }
        let moved = next.pedals.remove(from);
        let to = to.min(next.pedals.len());
        next.pedals.insert(to, moved);
        Ok(next)
    }

    pub fn toggle_bypass(&self, target: Target) -> ChainResult<Chain> {
        let mut next = self.clone();
        match target {
            Target::Pedal(position) => {
                self.check_position(position)?;
                let pedal = &mut next.pedals[position];
                pedal.bypassed = !pedal.bypassed;
            }
            Target::Amp => next.amplifier.bypassed = !next.amplifier.bypassed,
        }
        Ok(next)
    }

    /// Set one existing parameter. Out-of-range values are clamped here, so
    /// every path into the chain shares the same bound.
    pub fn update_parameter(&self, target: Target, key: &str, value: f32) -> ChainResult<Chain> {
        let mut next = self.clone();
        let settings = match target {
            Target::Pedal(position) => {
                self.check_position(position)?;
                &mut next.pedals[position].settings
            }
            Target::Amp => &mut next.amplifier.settings,
        };
        settings
            .set(key, value)
            .ok_or_else(|| ChainError::UnknownParameterKey {
                key: key.to_string(),
            })?;
        Ok(next)
    }

    /// Current value of a parameter, if the target and key exist
    pub fn parameter(&self, target: Target, key: &str) -> Option<f32> {
        match target {
            Target::Pedal(position) => self.pedals.get(position)?.settings.get(key),
            Target::Amp => self.amplifier.settings.get(key),
        }
    }

    /// Stable sort into Dynamics, Drive, Modulation, Delay, Reverb, Utility
    pub fn auto_arrange(&self) -> Chain {
        let mut next = self.clone();
        next.pedals.sort_by_key(|p| p.category.rank());
        next
    }

    pub fn clear(&self) -> Chain {
        Chain::new(self.amplifier.clone())
    }

    /// Swap in a fresh amplifier from the catalog
    pub fn set_amplifier(&self, template: &AmpTemplate) -> Chain {
        Chain {
            pedals: self.pedals.clone(),
            amplifier: Amplifier::from_template(template),
        }
    }

    /// Set or clear a note. Blank text clears it.
    pub fn set_notes(&self, target: Target, notes: Option<&str>) -> ChainResult<Chain> {
        let notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        let mut next = self.clone();
        match target {
            Target::Pedal(position) => {
                self.check_position(position)?;
                next.pedals[position].notes = notes;
            }
            Target::Amp => next.amplifier.notes = notes,
        }
        Ok(next)
    }

    pub fn select_channel(&self, channel: &str) -> ChainResult<Chain> {
        if !self.amplifier.channels.iter().any(|c| c == channel) {
            return Err(ChainError::UnknownChannel {
                name: channel.to_string(),
            });
        }
        let mut next = self.clone();
        next.amplifier.active_channel = Some(channel.to_string());
        Ok(next)
    }

    pub fn select_variant(&self, variant: &str) -> ChainResult<Chain> {
        if !self.amplifier.variants.iter().any(|v| v == variant) {
            return Err(ChainError::UnknownVariant {
                name: variant.to_string(),
            });
        }
        let mut next = self.clone();
        next.amplifier.active_variant = Some(variant.to_string());
        Ok(next)
    }

    /// "Dyna Comp -> Tube Screamer into Marshall JCM800"
    pub fn describe(&self) -> String {
        let amp = format!("{} {}", self.amplifier.brand, self.amplifier.name);
        if self.is_empty() {
            return format!("straight into {}", amp);
        }
        let names: Vec<&str> = self.pedals.iter().map(|p| p.name.as_str()).collect();
        format!("{} into {}", names.join(" -> "), amp)
    }
}
