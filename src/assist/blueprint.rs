use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::{self, PedalCategory};
use crate::rig::{Amplifier, Chain};

/// A suggested rig: pedal categories in signal order plus an amp brand
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    pub insight: String,
    pub pedals: Vec<PedalCategory>,
    pub amp_brand: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlueprint {
    #[serde(default)]
    insight: String,
    #[serde(default)]
    pedals: Vec<String>,
    #[serde(default, alias = "amp_brand", alias = "amp")]
    amp_brand: Option<String>,
}

impl Blueprint {
    /// Parse an assistant reply. The JSON object may be wrapped in prose or
    /// a code fence; unknown categories are dropped.
    pub fn parse(reply: &str) -> Result<Self> {
        let start = reply.find('{').context("no JSON object in reply")?;
        let end = reply.rfind('}').context("no JSON object in reply")?;
        if end < start {
            anyhow::bail!("no JSON object in reply");
        }
        let raw: RawBlueprint =
            serde_json::from_str(&reply[start..=end]).context("malformed blueprint")?;

        let mut pedals = Vec::new();
        for name in &raw.pedals {
            match PedalCategory::from_name(name) {
                Some(c) => pedals.push(c),
                None => log::debug!("blueprint: skipping unknown category {:?}", name),
            }
        }

        Ok(Self {
            insight: raw.insight.trim().to_string(),
            pedals,
            amp_brand: raw
                .amp_brand
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
        })
    }

    /// Build the suggested chain: first catalog pedal per category, first
    /// amp of the brand. Keeps `base`'s amp when no brand matches.
    pub fn to_chain(&self, base: &Chain, seq: &mut u64) -> Chain {
        let amplifier = self
            .amp_brand
            .as_deref()
            .and_then(catalog::first_amp_by_brand)
            .map(Amplifier::from_template)
            .unwrap_or_else(|| base.amplifier.clone());

        let mut chain = Chain::new(amplifier);
        for category in &self.pedals {
            if let Some(template) = catalog::first_pedal_of(*category) {
                let id = chain.fresh_id(template.id, seq);
                chain = chain.add_pedal(template, id);
            }
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_reply() {
        let reply = "Sure! Here it is:\n```json\n{\"insight\": \" Wall of fuzz \", \
                     \"pedals\": [\"Fuzz\", \"wah\", \"Reverb\"], \"ampBrand\": \"Vox\"}\n```";
        let bp = Blueprint::parse(reply).unwrap();
        assert_eq!(bp.insight, "Wall of fuzz");
        assert_eq!(bp.pedals, vec![PedalCategory::Drive, PedalCategory::Reverb]);
        assert_eq!(bp.amp_brand.as_deref(), Some("Vox"));
    }

    #[test]
    fn rejects_non_json() {
        assert!(Blueprint::parse("Try a delay.").is_err());
        assert!(Blueprint::parse("} oops {").is_err());
        assert!(Blueprint::parse("{\"pedals\": 3}").is_err());
    }

    #[test]
    fn builds_chain_from_catalog() {
        let base = Chain::new(Amplifier::from_template(catalog::default_amp()));
        let bp = Blueprint {
            insight: String::new(),
            pedals: vec![
                PedalCategory::Dynamics,
                PedalCategory::Utility,
                PedalCategory::Delay,
            ],
            amp_brand: Some("unknown".into()),
        };
        let mut seq = 0;
        let chain = bp.to_chain(&base, &mut seq);
        let names: Vec<&str> = chain.pedals.iter().map(|p| p.name.as_str()).collect();
        // No Utility pedal in the catalog
        assert_eq!(names, vec!["Dyna Comp", "Carbon Copy"]);
        assert_eq!(chain.amplifier, base.amplifier);
    }
}
