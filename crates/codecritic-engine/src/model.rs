//! Stage data model
//!
//! One exact structural type per stage output. Unknown fields are rejected at
//! every level; severity/confidence and line numbers decode leniently, and
//! [`Validate`] enforces the invariants serde cannot express.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::embed::Language;

/// A source file prepared for prompting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedFile {
    /// Canonical relative path; the only names the pipeline may reference
    pub path: String,
    pub language: Language,
    pub content: String,
    /// Newline count + 1
    pub total_lines: usize,
}

/// Severity vocabulary of the draft and critique stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSeverity {
    Critical,
    Major,
    Minor,
    Informational,
}

/// Severity vocabulary of the final review
///
/// Deliberately distinct from [`CandidateSeverity`]; no mapping exists between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Error returned when a vocabulary value is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! vocabulary {
    ($ty:ident, $kind:literal, { $($name:literal => $variant:ident),+ $(,)? }) => {
        impl $ty {
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            /// Case-insensitive, surrounding whitespace ignored
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

vocabulary!(CandidateSeverity, "candidate severity", {
    "critical" => Critical,
    "major" => Major,
    "minor" => Minor,
    "informational" => Informational,
});

vocabulary!(Severity, "severity", {
    "critical" => Critical,
    "high" => High,
    "medium" => Medium,
    "low" => Low,
});

vocabulary!(Confidence, "confidence", {
    "low" => Low,
    "medium" => Medium,
    "high" => High,
});

/// Decode a line number from a JSON integer or a string of digits.
///
/// Negative values decode here and are rejected by [`Validate`].
fn deserialize_line<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    struct LineVisitor;

    impl Visitor<'_> for LineVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer or a string of digits")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom(format!("line number {v} out of range")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            let trimmed = v.trim();
            let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(E::custom(format!("invalid int value: {v:?}")));
            }
            trimmed
                .parse()
                .map_err(|_| E::custom(format!("line number {v:?} out of range")))
        }
    }

    deserializer.deserialize_any(LineVisitor)
}

/// Anchors a candidate issue to concrete source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvidenceItem {
    #[serde(deserialize_with = "deserialize_line")]
    pub line: i64,
    pub snippet: String,
    pub relevance: String,
}

/// An unverified defect from the draft or critique pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CandidateIssue {
    pub file: String,
    pub category: String,
    pub severity: CandidateSeverity,
    #[serde(deserialize_with = "deserialize_line")]
    pub line: i64,
    pub title: String,
    pub reasoning: String,
    pub evidence: Vec<EvidenceItem>,
    pub why_it_matters: String,
    pub suggested_fix: String,
    pub confidence: Confidence,
    pub false_positive_risk: String,
    /// Filled in by the critique pass; empty otherwise
    #[serde(default)]
    pub critique_note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DraftStats {
    pub files: u64,
    pub total_lines: u64,
    pub candidate_issue_count: u64,
}

/// Non-binding note passed along to later stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Observation {
    pub file: String,
    pub note: String,
}

/// Output of the draft stage, and of the critique stage that filters it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DraftResult {
    pub stats: DraftStats,
    pub reasoning_trace: String,
    pub observations: Vec<Observation>,
    pub candidate_issues: Vec<CandidateIssue>,
}

/// A verified defect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewIssue {
    pub file: String,
    pub severity: Severity,
    #[serde(deserialize_with = "deserialize_line")]
    pub line: i64,
    pub explanation: String,
}

/// The terminal artifact of a review run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewResult {
    /// Holistic quality assessment of the whole codebase
    pub summary: String,
    pub issues: Vec<ReviewIssue>,
}

/// Invariants checked after a stage response decodes.
///
/// A violation is reported as a human-readable reason and surfaces as a
/// schema mismatch for the stage.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

fn check_line(line: i64, location: impl FnOnce() -> String) -> Result<(), String> {
    if line < 1 {
        return Err(format!("{}: line must be >= 1, got {line}", location()));
    }
    Ok(())
}

impl Validate for DraftResult {
    fn validate(&self) -> Result<(), String> {
        for (i, issue) in self.candidate_issues.iter().enumerate() {
            check_line(issue.line, || format!("candidate_issues[{i}]"))?;
            if issue.evidence.is_empty() {
                return Err(format!(
                    "candidate_issues[{i}]: evidence must contain at least one item"
                ));
            }
            for (j, evidence) in issue.evidence.iter().enumerate() {
                check_line(evidence.line, || format!("candidate_issues[{i}].evidence[{j}]"))?;
            }
        }
        Ok(())
    }
}

impl Validate for ReviewResult {
    fn validate(&self) -> Result<(), String> {
        for (i, issue) in self.issues.iter().enumerate() {
            check_line(issue.line, || format!("issues[{i}]"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate() -> serde_json::Value {
        json!({
            "file": "src/a.c",
            "category": "memory",
            "severity": "major",
            "line": 3,
            "title": "Leak",
            "reasoning": "malloc without free",
            "evidence": [{"line": 3, "snippet": "p = malloc(4);", "relevance": "allocation"}],
            "why_it_matters": "leaks",
            "suggested_fix": "free p",
            "confidence": "high",
            "false_positive_risk": "freed by caller"
        })
    }

    #[test]
    fn test_severity_parsing_is_lenient() {
        assert_eq!(" High ".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!("CRITICAL".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!(
            "Informational".parse::<CandidateSeverity>().unwrap(),
            CandidateSeverity::Informational
        );
        assert!("major".parse::<Severity>().is_err());
        assert!("high".parse::<CandidateSeverity>().is_err());
    }

    #[test]
    fn test_vocabularies_serialize_lowercase() {
        assert_eq!(serde_json::to_value(Severity::Medium).unwrap(), json!("medium"));
        assert_eq!(serde_json::to_value(CandidateSeverity::Minor).unwrap(), json!("minor"));
        assert_eq!(Confidence::Low.to_string(), "low");
    }

    #[test]
    fn test_review_issue_accepts_string_line_and_mixed_case_severity() {
        let issue: ReviewIssue = serde_json::from_value(json!({
            "file": "main.py",
            "severity": " Medium",
            "line": " 42 ",
            "explanation": "x"
        }))
        .unwrap();
        assert_eq!(issue.line, 42);
        assert_eq!(issue.severity, Severity::Medium);
    }

    #[test]
    fn test_line_rejects_non_numeric_strings_and_floats() {
        for line in [json!("forty"), json!("4.2"), json!(4.5), json!(""), json!(null)] {
            let result = serde_json::from_value::<ReviewIssue>(json!({
                "file": "f", "severity": "low", "line": line, "explanation": "x"
            }));
            assert!(result.is_err(), "line {line} should be rejected");
        }
    }

    #[test]
    fn test_critique_note_defaults_to_empty() {
        let issue: CandidateIssue = serde_json::from_value(candidate()).unwrap();
        assert_eq!(issue.critique_note, "");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let mut value = candidate();
        value["extra"] = json!(true);
        assert!(serde_json::from_value::<CandidateIssue>(value).is_err());

        let result = serde_json::from_value::<ReviewResult>(json!({
            "summary": "s", "issues": [], "verdict": "ok"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_line_zero_and_negative() {
        let result = ReviewResult {
            summary: "s".into(),
            issues: vec![ReviewIssue {
                file: "f".into(),
                severity: Severity::Low,
                line: 0,
                explanation: "x".into(),
            }],
        };
        assert!(result.validate().unwrap_err().contains("issues[0]"));

        let issue: ReviewIssue = serde_json::from_value(json!({
            "file": "f", "severity": "low", "line": "-3", "explanation": "x"
        }))
        .unwrap();
        assert_eq!(issue.line, -3);
        let result = ReviewResult {
            summary: "s".into(),
            issues: vec![issue],
        };
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_validate_requires_evidence() {
        let mut value = candidate();
        value["evidence"] = json!([]);
        let draft = DraftResult {
            stats: DraftStats {
                files: 1,
                total_lines: 10,
                candidate_issue_count: 1,
            },
            reasoning_trace: String::new(),
            observations: vec![],
            candidate_issues: vec![serde_json::from_value(value).unwrap()],
        };
        assert!(draft.validate().unwrap_err().contains("evidence"));
    }

    #[test]
    fn test_validate_checks_evidence_lines() {
        let mut value = candidate();
        value["evidence"][0]["line"] = json!(0);
        let draft = DraftResult {
            stats: DraftStats {
                files: 1,
                total_lines: 10,
                candidate_issue_count: 1,
            },
            reasoning_trace: String::new(),
            observations: vec![],
            candidate_issues: vec![serde_json::from_value(value).unwrap()],
        };
        assert!(draft.validate().unwrap_err().contains("evidence[0]"));
    }
}
