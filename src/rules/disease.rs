//! Rule-based guess of candidate waterborne diseases.
//!
//! Rules are evaluated independently and their results appended in rule
//! order. Repeated names are kept: high turbidity and a high diarrhea tally
//! each contribute "Diarrhea", so the list also records how many rules agreed.

use std::collections::BTreeMap;

use super::Thresholds;

pub const GASTROENTERITIS: &str = "Gastroenteritis";
pub const DIARRHEA: &str = "Diarrhea";
pub const TYPHOID: &str = "Typhoid";
pub const TYPHOID_OR_CHOLERA: &str = "Typhoid or Cholera";

/// Sole entry of the prediction list when no rule fires.
pub const NO_RISK: &str = "None";

/// Symptom keywords tallied per village.
pub const DIARRHEA_KEYWORD: &str = "diarrhea";
pub const FEVER_KEYWORD: &str = "fever";
pub const TRACKED_KEYWORDS: [&str; 2] = [DIARRHEA_KEYWORD, FEVER_KEYWORD];

/// Keyword → number of reports whose symptom text mentions it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymptomTally(BTreeMap<String, i64>);

impl SymptomTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, keyword: &str, count: i64) -> Self {
        self.set(keyword, count);
        self
    }

    pub fn set(&mut self, keyword: &str, count: i64) {
        self.0.insert(keyword.to_ascii_lowercase(), count);
    }

    /// Missing keywords count as zero.
    pub fn get(&self, keyword: &str) -> i64 {
        self.0
            .get(&keyword.to_ascii_lowercase())
            .copied()
            .unwrap_or(0)
    }
}

/// Predict candidate diseases.
///
/// `keyword_limit` is the tally a symptom keyword must exceed before it
/// contributes a disease.
pub fn predict(
    thresholds: &Thresholds,
    keyword_limit: i64,
    ph: Option<f64>,
    turbidity: Option<f64>,
    tds: Option<f64>,
    tally: &SymptomTally,
) -> Vec<String> {
    // ---
    let mut risks = Vec::new();

    if ph.is_some_and(|ph| thresholds.ph_out_of_range(ph)) {
        risks.push(GASTROENTERITIS.to_string());
    }
    if turbidity.is_some_and(|t| t > thresholds.turbidity_warning) {
        risks.push(DIARRHEA.to_string());
    }
    if tds.is_some_and(|t| t > thresholds.tds_warning) {
        risks.push(TYPHOID.to_string());
    }

    if tally.get(DIARRHEA_KEYWORD) > keyword_limit {
        risks.push(DIARRHEA.to_string());
    }
    if tally.get(FEVER_KEYWORD) > keyword_limit {
        risks.push(TYPHOID_OR_CHOLERA.to_string());
    }

    if risks.is_empty() {
        risks.push(NO_RISK.to_string());
    }
    risks
}

/// True when `predict` found at least one candidate disease.
pub fn has_risk(diseases: &[String]) -> bool {
    !(diseases.is_empty() || diseases.len() == 1 && diseases[0] == NO_RISK)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn run(ph: Option<f64>, turbidity: Option<f64>, tds: Option<f64>, tally: &SymptomTally) -> Vec<String> {
        predict(&Thresholds::default(), 5, ph, turbidity, tds, tally)
    }

    #[test]
    fn test_kamrup_scenario() {
        // ---
        let diseases = run(Some(5.0), Some(12.0), Some(600.0), &SymptomTally::new());
        assert_eq!(diseases, vec!["Gastroenteritis", "Diarrhea", "Typhoid"]);
    }

    #[test]
    fn test_clean_water_predicts_none() {
        // ---
        let diseases = run(Some(7.0), Some(2.0), Some(200.0), &SymptomTally::new());
        assert_eq!(diseases, vec![NO_RISK]);
        assert!(!has_risk(&diseases));
    }

    #[test]
    fn test_ph_out_of_range_always_adds_gastroenteritis() {
        // ---
        for ph in [0.0, 4.2, 6.49, 8.51, 11.0, 14.0] {
            for turbidity in [0.0, 7.0, 15.0] {
                let diseases = run(Some(ph), Some(turbidity), Some(100.0), &SymptomTally::new());
                assert!(diseases.iter().any(|d| d == GASTROENTERITIS), "pH={ph}");
            }
        }
    }

    #[test]
    fn test_duplicates_are_preserved() {
        // ---
        let tally = SymptomTally::new().with("diarrhea", 6);
        let diseases = run(Some(7.0), Some(6.0), Some(100.0), &tally);
        assert_eq!(diseases, vec!["Diarrhea", "Diarrhea"]);
    }

    #[test]
    fn test_symptom_rules_need_more_than_limit() {
        // ---
        let at_limit = SymptomTally::new().with("fever", 5).with("diarrhea", 5);
        assert_eq!(run(None, None, None, &at_limit), vec![NO_RISK]);

        let above = SymptomTally::new().with("fever", 6);
        assert_eq!(run(None, None, None, &above), vec![TYPHOID_OR_CHOLERA]);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        // ---
        let tally = SymptomTally::new().with("diarrhea", 9).with("fever", 9);
        let first = run(Some(9.0), Some(6.0), Some(900.0), &tally);
        let second = run(Some(9.0), Some(6.0), Some(900.0), &tally);
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec!["Gastroenteritis", "Diarrhea", "Typhoid", "Diarrhea", "Typhoid or Cholera"]
        );
    }

    #[test]
    fn test_tally_keys_are_case_insensitive() {
        // ---
        let tally = SymptomTally::new().with("FEVER", 3);
        assert_eq!(tally.get("fever"), 3);
        assert_eq!(tally.get("cough"), 0);
    }
}
