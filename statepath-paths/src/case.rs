//! Named test cases derived from paths.

use crate::path::TestPath;
use serde::{Deserialize, Serialize};

/// A generated test case.
///
/// Carries everything needed to regenerate the expected-transitions block
/// of a generated test: hash, depth, start and end state, and the ordered
/// transition strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// `_{depth}_{hash}_from_{start}_to_{end}`
    pub name: String,
    pub hash: String,
    pub depth: usize,
    pub start_state: String,
    pub end_state: String,
    /// Transitions in runtime log format.
    pub expected_transitions: Vec<String>,
    /// Events to feed a runtime to replay the path.
    pub events: Vec<String>,
}

impl TestCase {
    pub fn from_path(path: &TestPath) -> Self {
        let start_state = path.start_state().to_string();
        let end_state = path.end_state().to_string();
        Self {
            name: test_name(path.depth, &path.hash, &start_state, &end_state),
            hash: path.hash.clone(),
            depth: path.depth,
            start_state,
            end_state,
            expected_transitions: path.transitions(),
            events: path.events(),
        }
    }

    /// Returns true if a runtime transition log matches this case exactly.
    pub fn matches_log(&self, log: &[String]) -> bool {
        self.expected_transitions.as_slice() == log
    }
}

impl From<&TestPath> for TestCase {
    fn from(path: &TestPath) -> Self {
        Self::from_path(path)
    }
}

/// Formats a test name.
pub fn test_name(depth: usize, hash: &str, start: &str, end: &str) -> String {
    format!("_{}_{}_from_{}_to_{}", depth, hash, start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashAlgorithm;
    use crate::path::PathStep;

    #[test]
    fn test_case_from_path() {
        let path = TestPath::new(
            vec![
                PathStep {
                    state: "Idle".to_string(),
                    event: Some("Start".to_string()),
                    next_state: Some("Running".to_string()),
                    guard: None,
                    emitted: Vec::new(),
                },
                PathStep {
                    state: "Running".to_string(),
                    event: None,
                    next_state: None,
                    guard: None,
                    emitted: Vec::new(),
                },
            ],
            HashAlgorithm::Crc16,
        );
        let case = TestCase::from(&path);

        assert_eq!(
            case.name,
            format!("_1_{}_from_Idle_to_Running", path.hash)
        );
        assert_eq!(case.expected_transitions, vec!["Idle_Start_Running"]);
        assert_eq!(case.events, vec!["Start"]);
        assert!(case.matches_log(&["Idle_Start_Running".to_string()]));
        assert!(!case.matches_log(&[]));
    }

    #[test]
    fn test_name_format() {
        assert_eq!(test_name(3, "0A1F", "A", "C"), "_3_0A1F_from_A_to_C");
    }

    #[test]
    fn test_case_json_fields() {
        let case = TestCase {
            name: "_1_FE04_from_A_to_B".to_string(),
            hash: "FE04".to_string(),
            depth: 1,
            start_state: "A".to_string(),
            end_state: "B".to_string(),
            expected_transitions: vec!["A_Go_B".to_string()],
            events: vec!["Go".to_string()],
        };

        let json = serde_json::to_value(&case).unwrap();
        assert_eq!(json["hash"], "FE04");
        assert_eq!(json["start_state"], "A");
        assert_eq!(json["expected_transitions"][0], "A_Go_B");
    }
}
