use super::{AmpTemplate, PedalCategory, PedalTemplate, AMPS, PEDALS};

/// Library panel filters for the pedal list
#[derive(Debug, Clone, Default)]
pub struct PedalFilter {
    pub search: String,
    pub brand: Option<String>,
    pub color: Option<String>,
}

fn matches_search(search: &str, name: &str, brand: &str) -> bool {
    let needle = search.trim().to_lowercase();
    needle.is_empty()
        || name.to_lowercase().contains(&needle)
        || brand.to_lowercase().contains(&needle)
}

pub fn filter_pedals(filter: &PedalFilter) -> Vec<&'static PedalTemplate> {
    PEDALS
        .iter()
        .filter(|p| matches_search(&filter.search, p.name, p.brand))
        .filter(|p| filter.brand.as_deref().map(|b| p.brand == b).unwrap_or(true))
        .filter(|p| filter.color.as_deref().map(|c| p.color == c).unwrap_or(true))
        .collect()
}

pub fn filter_amps(search: &str, brand: Option<&str>) -> Vec<&'static AmpTemplate> {
    AMPS.iter()
        .filter(|a| matches_search(search, a.name, a.brand))
        .filter(|a| brand.map(|b| a.brand == b).unwrap_or(true))
        .collect()
}

/// Group filtered pedals by category, in canonical order, skipping empty groups
pub fn group_by_category(
    pedals: &[&'static PedalTemplate],
) -> Vec<(PedalCategory, Vec<&'static PedalTemplate>)> {
    PedalCategory::all()
        .into_iter()
        .map(|cat| {
            let members: Vec<_> = pedals.iter().copied().filter(|p| p.category == cat).collect();
            (cat, members)
        })
        .filter(|(_, members)| !members.is_empty())
        .collect()
}

/// Distinct pedal brands, sorted
pub fn pedal_brands() -> Vec<&'static str> {
    let mut brands: Vec<&str> = PEDALS.iter().map(|p| p.brand).collect();
    brands.sort_unstable();
    brands.dedup();
    brands
}

/// Distinct pedal colours in catalog order
pub fn pedal_colors() -> Vec<&'static str> {
    let mut colors: Vec<&str> = Vec::new();
    for p in PEDALS {
        if !colors.contains(&p.color) {
            colors.push(p.color);
        }
    }
    colors
}

pub fn amp_brands() -> Vec<&'static str> {
    let mut brands: Vec<&str> = AMPS.iter().map(|a| a.brand).collect();
    brands.sort_unstable();
    brands.dedup();
    brands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_matches_name_or_brand() {
        let filter = PedalFilter {
            search: "mxr".into(),
            ..Default::default()
        };
        let names: Vec<&str> = filter_pedals(&filter).iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Dyna Comp", "Carbon Copy"]);

        let filter = PedalFilter {
            search: "SKY".into(),
            ..Default::default()
        };
        assert_eq!(filter_pedals(&filter).len(), 1);
    }

    #[test]
    fn brand_and_color_filters_combine() {
        let filter = PedalFilter {
            search: String::new(),
            brand: Some("MXR".into()),
            color: Some("from-orange-500 to-orange-700".into()),
        };
        let hits = filter_pedals(&filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
    }

    #[test]
    fn amp_filter() {
        assert_eq!(filter_amps("", None).len(), AMPS.len());
        assert_eq!(filter_amps("twin", None)[0].brand, "Fender");
        assert!(filter_amps("twin", Some("Vox")).is_empty());
    }

    #[test]
    fn brand_lists_are_sorted_and_distinct() {
        assert_eq!(pedal_brands(), vec!["Boss", "EHX", "Ibanez", "MXR", "Strymon"]);
        assert_eq!(amp_brands().len(), 5);
        assert_eq!(pedal_colors().len(), PEDALS.len());
    }

    #[test]
    fn grouping_follows_canonical_order() {
        let all = filter_pedals(&PedalFilter::default());
        let groups = group_by_category(&all);
        let cats: Vec<PedalCategory> = groups.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            cats,
            vec![
                PedalCategory::Dynamics,
                PedalCategory::Drive,
                PedalCategory::Modulation,
                PedalCategory::Delay,
                PedalCategory::Reverb,
            ]
        );
        assert_eq!(groups[1].1.len(), 2);
    }
}
