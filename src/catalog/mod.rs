pub mod filter;

pub use filter::{
    amp_brands, filter_amps, filter_pedals, group_by_category, pedal_brands, pedal_colors,
    PedalFilter,
};

use serde::{Deserialize, Serialize};

/// Pedal category, in canonical signal-flow order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PedalCategory {
    Dynamics,
    Drive,
    Modulation,
    Delay,
    Reverb,
    Utility,
}

impl PedalCategory {
    pub fn name(&self) -> &'static str {
        match self {
            PedalCategory::Dynamics => "Dynamics",
            PedalCategory::Drive => "Drive",
            PedalCategory::Modulation => "Modulation",
            PedalCategory::Delay => "Delay",
            PedalCategory::Reverb => "Reverb",
            PedalCategory::Utility => "Utility",
        }
    }

    /// Position in the auto-arrange order (0 = first after the input)
    pub fn rank(&self) -> u8 {
        match self {
            PedalCategory::Dynamics => 0,
            PedalCategory::Drive => 1,
            PedalCategory::Modulation => 2,
            PedalCategory::Delay => 3,
            PedalCategory::Reverb => 4,
            PedalCategory::Utility => 5,
        }
    }

    /// Case-insensitive lookup, also accepts a few common aliases
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dynamics" | "compressor" | "compression" => Some(PedalCategory::Dynamics),
            "drive" | "overdrive" | "distortion" | "fuzz" => Some(PedalCategory::Drive),
            "modulation" | "chorus" | "phaser" | "flanger" => Some(PedalCategory::Modulation),
            "delay" | "echo" => Some(PedalCategory::Delay),
            "reverb" => Some(PedalCategory::Reverb),
            "utility" | "tuner" | "eq" => Some(PedalCategory::Utility),
            _ => None,
        }
    }

    pub fn all() -> Vec<PedalCategory> {
        vec![
            PedalCategory::Dynamics,
            PedalCategory::Drive,
            PedalCategory::Modulation,
            PedalCategory::Delay,
            PedalCategory::Reverb,
            PedalCategory::Utility,
        ]
    }
}

/// Catalog pedal: the cloning source for chain instances
#[derive(Debug, Clone, Copy)]
pub struct PedalTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub brand: &'static str,
    pub category: PedalCategory,
    pub color: &'static str,
    pub icon: &'static str,
    pub settings: &'static [(&'static str, f32)],
}

/// Catalog amplifier
#[derive(Debug, Clone, Copy)]
pub struct AmpTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub brand: &'static str,
    pub color: &'static str,
    pub settings: &'static [(&'static str, f32)],
    pub channels: &'static [&'static str],
    pub variants: &'static [&'static str],
}

pub const PEDALS: &[PedalTemplate] = &[
    PedalTemplate {
        id: "1",
        name: "Dyna Comp",
        brand: "MXR",
        category: PedalCategory::Dynamics,
        color: "from-orange-500 to-orange-700",
        icon: "compress",
        settings: &[("Sensitivity", 60.0), ("Output", 40.0)],
    },
    PedalTemplate {
        id: "2",
        name: "Tube Screamer",
        brand: "Ibanez",
        category: PedalCategory::Drive,
        color: "from-green-600 to-green-800",
        icon: "bolt",
        settings: &[("Overdrive", 75.0), ("Tone", 50.0), ("Level", 80.0)],
    },
    PedalTemplate {
        id: "3",
        name: "Big Muff Pi",
        brand: "EHX",
        category: PedalCategory::Drive,
        color: "from-red-600 to-red-800",
        icon: "blur_on",
        settings: &[("Sustain", 70.0), ("Tone", 40.0), ("Volume", 60.0)],
    },
    PedalTemplate {
        id: "4",
        name: "Neo Chorus",
        brand: "Boss",
        category: PedalCategory::Modulation,
        color: "from-blue-400 to-blue-600",
        icon: "waves",
        settings: &[("Rate", 30.0), ("Depth", 70.0)],
    },
    PedalTemplate {
        id: "5",
        name: "Carbon Copy",
        brand: "MXR",
        category: PedalCategory::Delay,
        color: "from-emerald-700 to-emerald-900",
        icon: "timer",
        settings: &[("Delay", 40.0), ("Regen", 30.0), ("Mix", 50.0)],
    },
    PedalTemplate {
        id: "6",
        name: "BigSky",
        brand: "Strymon",
        category: PedalCategory::Reverb,
        color: "from-cyan-500 to-cyan-700",
        icon: "cloud",
        settings: &[("Decay", 65.0), ("Mix", 45.0), ("Tone", 50.0)],
    },
];

pub const AMPS: &[AmpTemplate] = &[
    AmpTemplate {
        id: "amp-1",
        name: "JCM800",
        brand: "Marshall",
        color: "from-yellow-700 to-amber-900",
        settings: &[
            ("Preamp", 70.0),
            ("Master", 40.0),
            ("Bass", 50.0),
            ("Middle", 60.0),
            ("Treble", 70.0),
            ("Presence", 40.0),
        ],
        channels: &[],
        variants: &[],
    },
    AmpTemplate {
        id: "amp-2",
        name: "Twin Reverb",
        brand: "Fender",
        color: "from-gray-300 to-gray-500",
        settings: &[
            ("Volume", 40.0),
            ("Treble", 60.0),
            ("Middle", 50.0),
            ("Bass", 40.0),
            ("Reverb", 30.0),
            ("Speed", 20.0),
        ],
        channels: &["Normal", "Vibrato"],
        variants: &[],
    },
    AmpTemplate {
        id: "amp-3",
        name: "AC30 Top Boost",
        brand: "Vox",
        color: "from-red-800 to-stone-900",
        settings: &[
            ("Volume", 50.0),
            ("Treble", 75.0),
            ("Bass", 45.0),
            ("Cut", 30.0),
            ("Gain", 60.0),
        ],
        channels: &[],
        variants: &["Handwired", "Custom"],
    },
    AmpTemplate {
        id: "amp-4",
        name: "Dual Rectifier",
        brand: "Mesa Boogie",
        color: "from-zinc-700 to-zinc-900",
        settings: &[
            ("Gain", 85.0),
            ("Treble", 60.0),
            ("Mid", 40.0),
            ("Bass", 70.0),
            ("Presence", 50.0),
            ("Master", 30.0),
        ],
        channels: &["Clean", "Vintage", "Modern"],
        variants: &["2 Channel", "3 Channel"],
    },
    AmpTemplate {
        id: "amp-5",
        name: "Rockerverb",
        brand: "Orange",
        color: "from-orange-500 to-orange-700",
        settings: &[
            ("Gain", 65.0),
            ("Bass", 55.0),
            ("Mid", 50.0),
            ("Treble", 60.0),
            ("Reverb", 40.0),
        ],
        channels: &[],
        variants: &[],
    },
];

/// Amp the editor starts with
pub fn default_amp() -> &'static AmpTemplate {
    &AMPS[0]
}

/// Pedal the "start from a pedal" entry flow seeds the chain with
pub fn default_pedal() -> &'static PedalTemplate {
    &PEDALS[0]
}

pub fn pedal(id: &str) -> Option<&'static PedalTemplate> {
    PEDALS.iter().find(|p| p.id == id)
}

pub fn amp(id: &str) -> Option<&'static AmpTemplate> {
    AMPS.iter().find(|a| a.id == id)
}

/// First catalog pedal of a category
pub fn first_pedal_of(category: PedalCategory) -> Option<&'static PedalTemplate> {
    PEDALS.iter().find(|p| p.category == category)
}

/// First catalog amp by brand (case-insensitive)
pub fn first_amp_by_brand(brand: &str) -> Option<&'static AmpTemplate> {
    let brand = brand.trim();
    AMPS.iter().find(|a| a.brand.eq_ignore_ascii_case(brand))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_matches_declaration_order() {
        let ranks: Vec<u8> = PedalCategory::all().iter().map(|c| c.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn category_lookup_is_forgiving() {
        assert_eq!(PedalCategory::from_name(" Reverb "), Some(PedalCategory::Reverb));
        assert_eq!(PedalCategory::from_name("FUZZ"), Some(PedalCategory::Drive));
        assert_eq!(PedalCategory::from_name("wah"), None);
    }

    #[test]
    fn catalog_ids_are_unique() {
        for (i, p) in PEDALS.iter().enumerate() {
            assert!(PEDALS[i + 1..].iter().all(|q| q.id != p.id));
        }
        for (i, a) in AMPS.iter().enumerate() {
            assert!(AMPS[i + 1..].iter().all(|b| b.id != a.id));
        }
    }

    #[test]
    fn lookups() {
        assert_eq!(pedal("5").map(|p| p.name), Some("Carbon Copy"));
        assert!(pedal("99").is_none());
        assert_eq!(first_amp_by_brand("vox").map(|a| a.id), Some("amp-3"));
        assert_eq!(
            first_pedal_of(PedalCategory::Drive).map(|p| p.name),
            Some("Tube Screamer")
        );
        assert!(first_pedal_of(PedalCategory::Utility).is_none());
    }
}
