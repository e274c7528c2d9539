use crate::rig::Chain;

pub(crate) const WELCOME_MARKER: &str = "Write a short welcome";
pub(crate) const BLUEPRINT_MARKER: &str = "Answer with JSON only";

/// Shown when the critique reply is empty
pub const CRITIQUE_FALLBACK: &str = "Try adding a heavy modulated delay.";

/// Style the critique aims for unless the caller asks for another
pub const DEFAULT_STYLE: &str = "professional Shoegaze wall-of-sound";

/// Greeting for a returning user
pub fn welcome_back() -> String {
    format!(
        "{} line for a guitarist who just signed in to the ToneShare community. \
         Ten words at most.",
        WELCOME_MARKER
    )
}

/// Greeting for a new member, mentioning what inspires them
pub fn welcome_new(first_name: &str, inspirations: &str) -> String {
    let inspirations = match inspirations.trim() {
        "" => "music",
        s => s,
    };
    format!(
        "{} line for a new member named {} who just joined ToneShare. \
         Mention that their passion for {} will enrich the community. \
         Fifteen words at most.",
        WELCOME_MARKER,
        first_name.trim(),
        inspirations
    )
}

/// Ask for one pedal that would move the chain towards `style`
pub fn critique(chain: &Chain, style: &str) -> String {
    let flow: Vec<&str> = chain.pedals.iter().map(|p| p.name.as_str()).collect();
    format!(
        "Signal chain: {} into {} {}.\n\
         Recommend one pedal to add to this chain for a {}. Brief suggestion.",
        flow.join(" -> "),
        chain.amplifier.brand,
        chain.amplifier.name,
        style
    )
}

/// Ask for a rig that recreates a recorded tone
pub fn blueprint(song: &str, artist: &str, instrument: &str) -> String {
    format!(
        "Suggest a {} rig that recreates the tone of \"{}\" by {}.\n\
         {}: {{\"insight\": string, \"pedals\": [category], \"ampBrand\": string}}.\n\
         Categories are Dynamics, Drive, Modulation, Delay, Reverb, Utility, \
         listed in signal order.",
        instrument, song, artist, BLUEPRINT_MARKER
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::rig::Amplifier;

    #[test]
    fn critique_lists_flow_and_amp() {
        let mut seq = 0;
        let chain = Chain::new(Amplifier::from_template(catalog::default_amp()));
        let id = chain.fresh_id("2", &mut seq);
        let chain = chain.add_pedal(catalog::pedal("2").unwrap(), id);
        let id = chain.fresh_id("6", &mut seq);
        let chain = chain.add_pedal(catalog::pedal("6").unwrap(), id);

        let p = critique(&chain, DEFAULT_STYLE);
        assert!(p.starts_with("Signal chain: Tube Screamer -> BigSky into Marshall JCM800."));
        assert!(p.contains("Shoegaze"));
    }

    #[test]
    fn welcome_variants() {
        assert!(welcome_back().starts_with(WELCOME_MARKER));
        let p = welcome_new("Kevin ", "  ");
        assert!(p.contains("named Kevin who"));
        assert!(p.contains("passion for music"));
        assert!(welcome_new("Kim", "Sonic Youth").contains("Sonic Youth"));
    }
}
