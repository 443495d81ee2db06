//! Strict JSON Schema response formats, one per stage output shape
//!
//! Draft and Critique share the [`DraftResult`](crate::model::DraftResult)
//! shape under different names; Review and Translate share
//! [`ReviewResult`](crate::model::ReviewResult).

use once_cell::sync::Lazy;
use serde_json::{Value, json};

const LINE_DESCRIPTION: &str = "1-based line number of the FIRST token directly responsible for the defect. \
Must not be a closing brace, blank line, or comment. \
If multiple lines are involved, put the earliest causal line here \
and reference the others inside the explanation text.";

fn line_property() -> Value {
    json!({
        "type": "integer",
        "minimum": 1,
        "description": LINE_DESCRIPTION,
    })
}

fn stats_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["files", "total_lines", "candidate_issue_count"],
        "properties": {
            "files": {"type": "integer", "minimum": 0},
            "total_lines": {"type": "integer", "minimum": 0},
            "candidate_issue_count": {"type": "integer", "minimum": 0},
        },
    })
}

fn candidate_issue_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": [
            "file",
            "category",
            "severity",
            "line",
            "title",
            "reasoning",
            "evidence",
            "why_it_matters",
            "suggested_fix",
            "confidence",
            "false_positive_risk",
            "critique_note",
        ],
        "properties": {
            "file": {
                "type": "string",
                "description": "Name/path of the file where the issue was found.",
            },
            "category": {
                "type": "string",
                "description": "Normalized category for easier filtering in the verifier pass.",
            },
            "severity": {
                "type": "string",
                "enum": ["critical", "major", "minor", "informational"],
                "description": "Estimated impact if the issue is real.",
            },
            "line": line_property(),
            "title": {"type": "string"},
            "reasoning": {
                "type": "string",
                "description": "Step-by-step reasoning specific to THIS issue: why you believe it's a problem, \
what conditions trigger it, and what you're uncertain about. Written before the conclusion.",
            },
            "evidence": {
                "type": "array",
                "description": "Concrete anchors: cite specific line numbers and snippets from the enumerated source.",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["line", "snippet", "relevance"],
                    "properties": {
                        "line": line_property(),
                        "snippet": {"type": "string"},
                        "relevance": {
                            "type": "string",
                            "description": "One sentence explaining why this snippet is evidence for the issue.",
                        },
                    },
                },
            },
            "why_it_matters": {"type": "string"},
            "suggested_fix": {"type": "string"},
            "confidence": {
                "type": "string",
                "enum": ["low", "medium", "high"],
            },
            "false_positive_risk": {
                "type": "string",
                "description": "Specific scenario in which this issue might NOT be real. \
Forces explicit doubt before the verifier pass.",
            },
            "critique_note": {
                "type": "string",
                "description": "Added by the critique pass: one sentence explaining any remaining doubt \
about this issue after peer review. Empty string if fully confirmed or not yet critiqued.",
            },
        },
    })
}

fn draft_shape(trace_description: &str, issues_description: &str) -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["stats", "reasoning_trace", "observations", "candidate_issues"],
        "properties": {
            "stats": stats_schema(),
            "reasoning_trace": {
                "type": "string",
                "description": trace_description,
            },
            "observations": {
                "type": "array",
                "description": "Non-binding notes that might be useful to later passes.",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["file", "note"],
                    "properties": {
                        "file": {
                            "type": "string",
                            "description": "Filename/path this observation pertains to.",
                        },
                        "note": {"type": "string"},
                    },
                },
            },
            "candidate_issues": {
                "type": "array",
                "description": issues_description,
                "items": candidate_issue_schema(),
            },
        },
    })
}

fn wrap(name: &str, description: &str, schema: Value) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": name,
            "description": description,
            "strict": true,
            "schema": schema,
        },
    })
}

static DRAFT_RESULT: Lazy<Value> = Lazy::new(|| {
    wrap(
        "DraftResult",
        "Structured draft analysis: candidate issues (may include false positives) \
with concrete evidence so a second pass can verify and filter.",
        draft_shape(
            "Free-form scratchpad written BEFORE populating candidate_issues. \
Must follow the chain-of-thought defined in the system prompt.",
            "Potential issues with concrete evidence. May include uncertain items \
that must be filtered by the critique and verifier passes.",
        ),
    )
});

static CRITIQUE_RESULT: Lazy<Value> = Lazy::new(|| {
    wrap(
        "CritiqueResult",
        "Peer-reviewed version of the draft: false positives removed, \
uncertain items annotated, missed issues added.",
        draft_shape(
            "Original trace plus critique verdicts appended.",
            "Surviving issues after false positives are removed and new issues are added.",
        ),
    )
});

static REVIEW_RESULT: Lazy<Value> = Lazy::new(|| {
    wrap(
        "ReviewResult",
        "A concise review summary plus a list of verified issues found in the provided files.",
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["summary", "issues"],
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "3 to 5 sentences describing overall correctness, key positives, and notable negatives.",
                },
                "issues": {
                    "type": "array",
                    "description": "Final list of verified issues.",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["file", "severity", "line", "explanation"],
                        "properties": {
                            "file": {
                                "type": "string",
                                "description": "Name/path of the file where the issue was found.",
                            },
                            "severity": {
                                "type": "string",
                                "enum": ["critical", "high", "medium", "low"],
                                "description": "Severity of the issue.",
                            },
                            "line": line_property(),
                            "explanation": {
                                "type": "string",
                                "description": "1 to 3 sentences explaining what is wrong, why it matters, and how to fix it.",
                            },
                        },
                    },
                },
            },
        }),
    )
});

/// Response format for the draft stage
#[must_use]
pub fn draft_result_format() -> &'static Value {
    &DRAFT_RESULT
}

/// Response format for the critique stage (draft shape, distinct name)
#[must_use]
pub fn critique_result_format() -> &'static Value {
    &CRITIQUE_RESULT
}

/// Response format for the review and translate stages
#[must_use]
pub fn review_result_format() -> &'static Value {
    &REVIEW_RESULT
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every object in a strict schema must list all its properties as
    /// required and forbid additional ones.
    fn assert_strict(schema: &Value, path: &str) {
        if schema["type"] == "object" {
            assert_eq!(schema["additionalProperties"], json!(false), "{path}");
            let mut properties: Vec<&str> = schema["properties"]
                .as_object()
                .unwrap()
                .keys()
                .map(String::as_str)
                .collect();
            let mut required: Vec<&str> = schema["required"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap())
                .collect();
            properties.sort_unstable();
            required.sort_unstable();
            assert_eq!(properties, required, "{path}");
            for (name, child) in schema["properties"].as_object().unwrap() {
                assert_strict(child, &format!("{path}.{name}"));
            }
        } else if schema["type"] == "array" {
            assert_strict(&schema["items"], &format!("{path}[]"));
        }
    }

    #[test]
    fn test_formats_are_strict_json_schema_wrappers() {
        for (format, name) in [
            (draft_result_format(), "DraftResult"),
            (critique_result_format(), "CritiqueResult"),
            (review_result_format(), "ReviewResult"),
        ] {
            assert_eq!(format["type"], "json_schema");
            assert_eq!(format["json_schema"]["name"], name);
            assert_eq!(format["json_schema"]["strict"], true);
            assert!(format["json_schema"]["description"].is_string());
            assert_strict(&format["json_schema"]["schema"], name);
        }
    }

    #[test]
    fn test_draft_and_critique_share_issue_shape() {
        let draft = &draft_result_format()["json_schema"]["schema"]["properties"]["candidate_issues"]["items"];
        let critique = &critique_result_format()["json_schema"]["schema"]["properties"]["candidate_issues"]["items"];
        assert_eq!(draft, critique);
    }

    #[test]
    fn test_line_fields_have_minimum_one() {
        let issue = &review_result_format()["json_schema"]["schema"]["properties"]["issues"]["items"];
        assert_eq!(issue["properties"]["line"]["minimum"], 1);
        assert_eq!(
            issue["properties"]["severity"]["enum"],
            json!(["critical", "high", "medium", "low"])
        );

        let candidate = &draft_result_format()["json_schema"]["schema"]["properties"]["candidate_issues"]["items"];
        assert_eq!(candidate["properties"]["line"]["minimum"], 1);
        assert_eq!(candidate["properties"]["evidence"]["minItems"], 1);
        assert_eq!(
            candidate["properties"]["evidence"]["items"]["properties"]["line"]["minimum"],
            1
        );
    }
}
