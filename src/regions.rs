//! Static state → district reference table.
//!
//! The report form validates against this table and the sensor simulator
//! derives its village names from it, so both sides always agree on spelling.

/// States and their districts, in display order.
pub const STATE_DISTRICTS: &[(&str, &[&str])] = &[
    ("Assam", &["Kamrup", "Dibrugarh", "Jorhat", "Tinsukia", "Barpeta"]),
    ("Arunachal Pradesh", &["Itanagar", "Tawang", "Pasighat", "Ziro", "Roing"]),
    ("Manipur", &["Imphal West", "Imphal East", "Thoubal", "Bishnupur"]),
    ("Meghalaya", &["Shillong", "Tura", "Jowai", "Nongpoh"]),
    ("Mizoram", &["Aizawl", "Lunglei", "Champhai", "Kolasib"]),
    ("Nagaland", &["Kohima", "Dimapur", "Mokokchung", "Tuensang"]),
    ("Tripura", &["Agartala", "Udaipur", "Dharmanagar", "Kailashahar"]),
];

pub fn states() -> impl Iterator<Item = &'static str> {
    STATE_DISTRICTS.iter().map(|(state, _)| *state)
}

/// Districts of `state`, or `None` for an unknown state.
pub fn districts(state: &str) -> Option<&'static [&'static str]> {
    STATE_DISTRICTS
        .iter()
        .find(|(s, _)| *s == state)
        .map(|(_, districts)| *districts)
}

pub fn is_known_district(state: &str, district: &str) -> bool {
    districts(state).is_some_and(|ds| ds.contains(&district))
}

/// Every `(state, district)` pair in table order.
pub fn all_districts() -> impl Iterator<Item = (&'static str, &'static str)> {
    STATE_DISTRICTS
        .iter()
        .flat_map(|(state, districts)| districts.iter().map(move |d| (*state, *d)))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_lookup() {
        // ---
        assert_eq!(states().count(), 7);
        assert_eq!(districts("Meghalaya").unwrap().len(), 4);
        assert!(districts("Kerala").is_none());
        assert!(is_known_district("Assam", "Kamrup"));
        assert!(!is_known_district("Assam", "Tura"));
        assert!(!is_known_district("assam", "Kamrup"));
    }

    #[test]
    fn test_all_districts_are_unique() {
        // ---
        let mut names: Vec<&str> = all_districts().map(|(_, d)| d).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(total, 30);
        assert_eq!(names.len(), total);
    }
}
