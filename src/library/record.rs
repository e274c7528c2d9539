use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog;
use crate::config::UserIdentity;
use crate::rig::{Amplifier, Chain, PedalInstance};

pub const RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instrument {
    #[default]
    #[serde(rename = "Electric Guitar")]
    ElectricGuitar,
    #[serde(rename = "Bass Guitar")]
    BassGuitar,
    Synth,
    #[serde(rename = "Acoustic Guitar")]
    AcousticGuitar,
}

impl Instrument {
    pub fn label(&self) -> &'static str {
        match self {
            Instrument::ElectricGuitar => "Electric Guitar",
            Instrument::BassGuitar => "Bass Guitar",
            Instrument::Synth => "Synth",
            Instrument::AcousticGuitar => "Acoustic Guitar",
        }
    }
}

/// What the user types next to the rig before publishing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetupDetails {
    pub title: String,
    pub artist: String,
    pub instrument: Instrument,
    pub genre: String,
    pub tags: Vec<String>,
    pub bpm: Option<u32>,
    pub release_year: Option<u32>,
    pub cover_image: String,
}

/// A published setup as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRecord {
    pub version: u32,
    pub id: String,
    pub title: String,
    pub artist: String,
    pub creator: String,
    pub creator_avatar: String,
    pub instrument: Instrument,
    pub genre: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub bpm: Option<u32>,
    #[serde(default)]
    pub release_year: Option<u32>,
    pub cover_image: String,
    pub likes: u32,
    pub comments: u32,
    pub chain: Vec<PedalInstance>,
    pub amplifier: Amplifier,
    /// Unix millis
    pub updated_at: u64,
}

/// Records written before versioning: amp optional, free-text timestamp
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordV0 {
    id: String,
    title: String,
    artist: String,
    #[serde(default)]
    creator: String,
    #[serde(default)]
    creator_avatar: String,
    #[serde(default)]
    likes: u32,
    #[serde(default)]
    comments: u32,
    #[serde(default)]
    instrument: Instrument,
    #[serde(default)]
    genre: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    cover_image: String,
    chain: Vec<PedalInstance>,
    #[serde(default)]
    amplifier: Option<Amplifier>,
    #[serde(default)]
    updated_at: Value,
}

impl RecordV0 {
    fn migrate(self) -> SetupRecord {
        SetupRecord {
            version: RECORD_VERSION,
            id: self.id,
            title: self.title,
            artist: self.artist,
            creator: self.creator,
            creator_avatar: self.creator_avatar,
            instrument: self.instrument,
            genre: self.genre,
            tags: self.tags,
            bpm: None,
            release_year: None,
            cover_image: self.cover_image,
            likes: self.likes,
            comments: self.comments,
            chain: self.chain,
            amplifier: self
                .amplifier
                .unwrap_or_else(|| Amplifier::from_template(catalog::default_amp())),
            // "2 days ago" can't be placed on a timeline
            updated_at: self.updated_at.as_u64().unwrap_or(0),
        }
    }
}

impl SetupRecord {
    /// Snapshot a chain for publishing
    pub fn from_chain(
        id: String,
        chain: &Chain,
        details: &SetupDetails,
        user: &UserIdentity,
        updated_at: u64,
    ) -> Self {
        Self {
            version: RECORD_VERSION,
            id,
            title: details.title.trim().to_string(),
            artist: details.artist.trim().to_string(),
            creator: user.name.clone(),
            creator_avatar: user.avatar.clone(),
            instrument: details.instrument,
            genre: details.genre.clone(),
            tags: details.tags.clone(),
            bpm: details.bpm,
            release_year: details.release_year,
            cover_image: details.cover_image.clone(),
            likes: 0,
            comments: 0,
            chain: chain.pedals.clone(),
            amplifier: chain.amplifier.clone(),
            updated_at,
        }
    }

    pub fn to_chain(&self) -> Chain {
        Chain {
            pedals: self.chain.clone(),
            amplifier: self.amplifier.clone(),
        }
    }

    pub fn details(&self) -> SetupDetails {
        SetupDetails {
            title: self.title.clone(),
            artist: self.artist.clone(),
            instrument: self.instrument,
            genre: self.genre.clone(),
            tags: self.tags.clone(),
            bpm: self.bpm,
            release_year: self.release_year,
            cover_image: self.cover_image.clone(),
        }
    }

    /// Decode a stored record, migrating version-less files
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(json).context("Failed to parse setup JSON")?;
        let version = raw.get("version").and_then(|v| v.as_u64()).unwrap_or(0);

        if version > u64::from(RECORD_VERSION) {
            bail!(
                "Setup version {} is newer than supported version {}",
                version,
                RECORD_VERSION
            );
        }

        if version == 0 {
            let v0: RecordV0 = serde_json::from_value(raw).context("Failed to parse v0 setup")?;
            Ok(v0.migrate())
        } else {
            serde_json::from_value(raw).context("Failed to parse setup")
        }
    }
}

/// The three community setups a fresh library starts with
pub fn demo_setups() -> Vec<SetupRecord> {
    struct Demo {
        id: &'static str,
        title: &'static str,
        artist: &'static str,
        creator: &'static str,
        avatar: u32,
        likes: u32,
        comments: u32,
        instrument: Instrument,
        genre: &'static str,
        tags: [&'static str; 2],
        cover: u32,
        pedals: &'static [&'static str],
        amp: &'static str,
        age_days: u64,
    }

    const DAY_MS: u64 = 24 * 60 * 60 * 1000;
    // Fixed epoch so seeding is reproducible: 2025-01-01
    const SEEDED_AT: u64 = 1_735_689_600_000;

    let demos = [
        Demo {
            id: "setup-1",
            title: "John's Clean Tone",
            artist: "John Mayer",
            creator: "@GuitarHero99",
            avatar: 1,
            likes: 1542,
            comments: 24,
            instrument: Instrument::ElectricGuitar,
            genre: "Neo-Soul",
            tags: ["Intermediate", "Glassy"],
            cover: 10,
            pedals: &["1", "2", "6"],
            amp: "amp-2",
            age_days: 2,
        },
        Demo {
            id: "setup-2",
            title: "Comfortably Numb Lead",
            artist: "Pink Floyd",
            creator: "@GilmourFan",
            avatar: 2,
            likes: 3120,
            comments: 42,
            instrument: Instrument::ElectricGuitar,
            genre: "Classic Rock",
            tags: ["Pro", "Epic"],
            cover: 11,
            pedals: &["3", "4", "5", "6"],
            amp: "amp-1",
            age_days: 7,
        },
        Demo {
            id: "setup-3",
            title: "Hysteria Bass Fuzz",
            artist: "Muse",
            creator: "@BassGod88",
            avatar: 3,
            likes: 850,
            comments: 15,
            instrument: Instrument::BassGuitar,
            genre: "Alternative Rock",
            tags: ["Fuzz", "Heavy"],
            cover: 12,
            pedals: &["3", "1"],
            amp: "amp-4",
            age_days: 3,
        },
    ];

    demos
        .iter()
        .map(|d| SetupRecord {
            version: RECORD_VERSION,
            id: d.id.to_string(),
            title: d.title.to_string(),
            artist: d.artist.to_string(),
            creator: d.creator.to_string(),
            creator_avatar: format!("https://picsum.photos/100/100?random={}", d.avatar),
            instrument: d.instrument,
            genre: d.genre.to_string(),
            tags: d.tags.iter().map(|t| t.to_string()).collect(),
            bpm: None,
            release_year: None,
            cover_image: format!("https://picsum.photos/800/600?random={}", d.cover),
            likes: d.likes,
            comments: d.comments,
            chain: d
                .pedals
                .iter()
                .filter_map(|id| catalog::pedal(id))
                .map(|t| PedalInstance::from_template(t, t.id.to_string()))
                .collect(),
            amplifier: Amplifier::from_template(
                catalog::amp(d.amp).unwrap_or_else(catalog::default_amp),
            ),
            updated_at: SEEDED_AT - d.age_days * DAY_MS,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_record_migrates() {
        let json = r#"{
            "id": "setup-9",
            "title": "Old",
            "artist": "Someone",
            "instrument": "Bass Guitar",
            "updatedAt": "2 days ago",
            "chain": [{
                "id": "1", "name": "Dyna Comp", "brand": "MXR", "type": "Dynamics",
                "color": "x", "icon": "compress",
                "settings": {"Sensitivity": 160, "Output": 40}
            }]
        }"#;
        let record = SetupRecord::from_json(json).unwrap();
        assert_eq!(record.version, RECORD_VERSION);
        assert_eq!(record.instrument, Instrument::BassGuitar);
        assert_eq!(record.updated_at, 0);
        assert_eq!(record.amplifier.name, "JCM800");
        assert!(!record.chain[0].bypassed);
        // stored values are re-clamped on the way in
        assert_eq!(record.chain[0].settings.get("Sensitivity"), Some(100.0));
    }

    #[test]
    fn newer_version_rejected() {
        let json = format!(r#"{{"version": {}}}"#, RECORD_VERSION + 1);
        let err = SetupRecord::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("newer"));

        // 2^32 + 1 must not wrap around to a supported version
        let err = SetupRecord::from_json(r#"{"version": 4294967297}"#).unwrap_err();
        assert!(err.to_string().contains("newer"));
    }

    #[test]
    fn record_round_trips_through_json() {
        let demo = demo_setups().remove(0);
        let json = serde_json::to_string(&demo).unwrap();
        assert!(json.contains("\"creatorAvatar\""));
        assert!(json.contains("\"Electric Guitar\""));
        assert_eq!(SetupRecord::from_json(&json).unwrap(), demo);
    }

    #[test]
    fn demos_match_community_feed() {
        let demos = demo_setups();
        assert_eq!(demos.len(), 3);
        let names: Vec<&str> = demos[1].chain.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Big Muff Pi", "Neo Chorus", "Carbon Copy", "BigSky"]);
        assert_eq!(demos[2].amplifier.name, "Dual Rectifier");
        assert!(demos[0].updated_at > demos[2].updated_at);
        assert!(demos[2].updated_at > demos[1].updated_at);
    }
}
