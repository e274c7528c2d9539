use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const PARAM_MIN: f32 = 0.0;
pub const PARAM_MAX: f32 = 100.0;

/// Knob travel: one pixel of vertical drag moves the value by half a step
pub const DRAG_SENSITIVITY: f32 = 0.5;

/// Clamp a raw parameter value into [0, 100]. NaN lands on 0.
pub fn clamp_param(value: f32) -> f32 {
    if value.is_nan() {
        return PARAM_MIN;
    }
    value.clamp(PARAM_MIN, PARAM_MAX)
}

/// Value produced by dragging a knob `delta_px` pixels upwards from `start`
pub fn drag_value(start: f32, delta_px: f32) -> f32 {
    clamp_param((start + delta_px * DRAG_SENSITIVITY).round())
}

/// Named parameters in display order.
///
/// The key set is fixed once the map is built; `set` only touches existing
/// keys and always stores a clamped value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamMap {
    entries: Vec<(String, f32)>,
}

impl ParamMap {
    /// Build from template defaults, clamping each value
    pub fn from_pairs(pairs: &[(&str, f32)]) -> Self {
        Self {
            entries: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), clamp_param(*v)))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<f32> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    /// Set an existing key. Returns the stored (clamped) value, or None if
    /// the key is not part of this map.
    pub fn set(&mut self, key: &str, value: f32) -> Option<f32> {
        let slot = self.entries.iter_mut().find(|(k, _)| k == key)?;
        slot.1 = clamp_param(value);
        Some(slot.1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Serialize for ParamMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct ParamMapVisitor;

impl<'de> Visitor<'de> for ParamMapVisitor {
    type Value = ParamMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of parameter names to numbers")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ParamMap, A::Error> {
        let mut entries: Vec<(String, f32)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, f32>()? {
            // Stored records may come from elsewhere; never trust their range
            let value = clamp_param(value);
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
        Ok(ParamMap { entries })
    }
}

impl<'de> Deserialize<'de> for ParamMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ParamMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limits_both_ends() {
        assert_eq!(clamp_param(-40.0), 0.0);
        assert_eq!(clamp_param(230.0), 100.0);
        assert_eq!(clamp_param(55.5), 55.5);
        assert_eq!(clamp_param(f32::NAN), 0.0);
        assert_eq!(clamp_param(f32::INFINITY), 100.0);
    }

    #[test]
    fn drag_rounds_and_clamps() {
        assert_eq!(drag_value(50.0, 10.0), 55.0);
        assert_eq!(drag_value(50.0, -3.0), 49.0); // 48.5 rounds away from zero
        assert_eq!(drag_value(90.0, 100.0), 100.0);
        assert_eq!(drag_value(10.0, -100.0), 0.0);
    }

    #[test]
    fn set_never_adds_keys() {
        let mut params = ParamMap::from_pairs(&[("Gain", 50.0)]);
        assert_eq!(params.set("Tone", 10.0), None);
        assert_eq!(params.iter().count(), 1);
        assert_eq!(params.set("Gain", 230.0), Some(100.0));
        assert_eq!(params.get("Gain"), Some(100.0));
    }

    #[test]
    fn json_keeps_display_order() {
        let params = ParamMap::from_pairs(&[("Treble", 1.0), ("Bass", 2.0), ("Mid", 3.0)]);
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"Treble":1.0,"Bass":2.0,"Mid":3.0}"#);

        let back: ParamMap = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = back.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Treble", "Bass", "Mid"]);
    }

    #[test]
    fn json_values_are_clamped_on_load() {
        let back: ParamMap = serde_json::from_str(r#"{"Gain":140,"Level":-3}"#).unwrap();
        assert_eq!(back.get("Gain"), Some(100.0));
        assert_eq!(back.get("Level"), Some(0.0));
    }
}
