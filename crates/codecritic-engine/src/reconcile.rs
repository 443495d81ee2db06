//! Filename reconciliation
//!
//! Deterministic repair of file names emitted by the model so they match the
//! canonical embedded paths. Each cascade step only runs when the previous
//! one found zero or several candidates.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::model::ReviewResult;

/// `" (N)"` immediately before the extension, as left by duplicate uploads
static COPY_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" \(\d+\)(\.[^.]*)$").expect("copy suffix regex is valid"));

/// Which cascade step resolved a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Exact,
    Suffix,
    Prefix,
    Basename,
    CopySuffix,
    SoleFile,
    Unresolved,
}

impl Resolution {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Suffix => "suffix",
            Self::Prefix => "prefix",
            Self::Basename => "basename",
            Self::CopySuffix => "copy_suffix",
            Self::SoleFile => "sole_file",
            Self::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").to_lowercase()
}

fn basename(normalized: &str) -> &str {
    normalized.rsplit('/').next().unwrap_or(normalized)
}

/// `tail` is `path` itself or a trailing run of whole path components.
fn ends_at_component(path: &str, tail: &str) -> bool {
    path.strip_suffix(tail)
        .is_some_and(|head| head.is_empty() || head.ends_with('/'))
}

struct Entry {
    canonical: String,
    normalized: String,
    basename: String,
    stripped_basename: String,
}

/// Resolver over one run's canonical path set
pub struct FilenameReconciler {
    entries: Vec<Entry>,
}

impl FilenameReconciler {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = paths
            .into_iter()
            .map(|path| {
                let canonical = path.into();
                let normalized = normalize(&canonical);
                let base = basename(&normalized).to_string();
                let stripped_basename = COPY_SUFFIX.replace(&base, "$1").into_owned();
                Entry {
                    canonical,
                    normalized,
                    basename: base,
                    stripped_basename,
                }
            })
            .collect();
        Self { entries }
    }

    fn unique<F>(&self, predicate: F) -> Option<&str>
    where
        F: Fn(&Entry) -> bool,
    {
        let mut matches = self.entries.iter().filter(|e| predicate(e));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only.canonical.as_str()),
            _ => None,
        }
    }

    /// Map `candidate` to a canonical path, reporting which step matched.
    ///
    /// Unresolved names come back unchanged.
    #[must_use]
    pub fn resolve(&self, candidate: &str) -> (String, Resolution) {
        if self.entries.iter().any(|e| e.canonical == candidate) {
            return (candidate.to_string(), Resolution::Exact);
        }

        let wanted = normalize(candidate);
        let wanted_base = basename(&wanted);

        let steps: [(Resolution, &dyn Fn(&Entry) -> bool); 4] = [
            (Resolution::Suffix, &|e: &Entry| ends_at_component(&e.normalized, &wanted)),
            (Resolution::Prefix, &|e: &Entry| ends_at_component(&wanted, &e.normalized)),
            (Resolution::Basename, &|e: &Entry| e.basename == wanted_base),
            (Resolution::CopySuffix, &|e: &Entry| e.stripped_basename == wanted_base),
        ];
        for (resolution, predicate) in steps {
            if let Some(path) = self.unique(predicate) {
                return (path.to_string(), resolution);
            }
        }

        if let [only] = self.entries.as_slice() {
            return (only.canonical.clone(), Resolution::SoleFile);
        }

        (candidate.to_string(), Resolution::Unresolved)
    }

    /// Repair the `file` of every issue; no other field is touched.
    #[must_use]
    pub fn reconcile(&self, mut result: ReviewResult) -> ReviewResult {
        for issue in &mut result.issues {
            let (resolved, resolution) = self.resolve(&issue.file);
            match resolution {
                Resolution::Exact => {}
                Resolution::Unresolved => {
                    tracing::warn!(file = %issue.file, "Could not reconcile file name with any source file");
                }
                step => {
                    tracing::debug!(from = %issue.file, to = %resolved, step = %step, "Reconciled file name");
                    issue.file = resolved;
                }
            }
        }
        result
    }
}

/// One-shot form of [`FilenameReconciler::resolve`].
#[must_use]
pub fn reconcile_filename(canonical: &[String], candidate: &str) -> String {
    FilenameReconciler::new(canonical.iter().cloned())
        .resolve(candidate)
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReviewIssue, Severity};
    use tracing_test::traced_test;

    fn resolve(paths: &[&str], candidate: &str) -> (String, Resolution) {
        FilenameReconciler::new(paths.iter().copied()).resolve(candidate)
    }

    #[test]
    fn test_exact_wins_over_copy() {
        assert_eq!(
            resolve(&["main.py", "main (1).py"], "main.py"),
            ("main.py".to_string(), Resolution::Exact)
        );
    }

    #[test]
    fn test_suffix() {
        assert_eq!(
            resolve(&["src/a.cpp", "src/b.cpp"], "a.cpp"),
            ("src/a.cpp".to_string(), Resolution::Suffix)
        );
        assert_eq!(
            resolve(&["src/Util.java", "lib/x.java"], "SRC\\util.JAVA"),
            ("src/Util.java".to_string(), Resolution::Suffix)
        );
    }

    #[test]
    fn test_prefix_recovery() {
        assert_eq!(
            resolve(&["src/a.c", "src/b.c"], "project/src/a.c"),
            ("src/a.c".to_string(), Resolution::Prefix)
        );
    }

    #[test]
    fn test_basename() {
        assert_eq!(
            resolve(&["x/ta.c", "y/data.c", "z/other.c"], "wrong/dir/ta.c"),
            ("x/ta.c".to_string(), Resolution::Basename)
        );
    }

    #[test]
    fn test_partial_component_is_not_a_match() {
        assert_eq!(
            resolve(&["src/data.cpp", "lib/other.c"], "a.cpp"),
            ("a.cpp".to_string(), Resolution::Unresolved)
        );
        assert_eq!(
            resolve(&["a.c", "b.h"], "data.c"),
            ("data.c".to_string(), Resolution::Unresolved)
        );
        assert_eq!(
            resolve(&["x/ta.c", "y/data.c"], "ta.c"),
            ("x/ta.c".to_string(), Resolution::Suffix)
        );
    }

    #[test]
    fn test_ends_at_component() {
        assert!(ends_at_component("src/a.c", "a.c"));
        assert!(ends_at_component("src/a.c", "src/a.c"));
        assert!(!ends_at_component("src/data.c", "ta.c"));
        assert!(!ends_at_component("a.c", "src/a.c"));
    }

    #[test]
    fn test_copy_suffix() {
        assert_eq!(
            resolve(&["upload/main (2).py", "upload/util.py"], "main.py"),
            ("upload/main (2).py".to_string(), Resolution::CopySuffix)
        );
    }

    #[test]
    fn test_sole_file() {
        assert_eq!(
            resolve(&["x/y/z.c"], "unrelated.txt"),
            ("x/y/z.c".to_string(), Resolution::SoleFile)
        );
    }

    #[test]
    fn test_ambiguous_left_unchanged() {
        assert_eq!(
            resolve(&["a/f.c", "b/f.c"], "f.c"),
            ("f.c".to_string(), Resolution::Unresolved)
        );
    }

    #[traced_test]
    #[test]
    fn test_ambiguous_name_logs_warning() {
        let reconciler = FilenameReconciler::new(["a/f.c", "b/f.c"]);
        let result = ReviewResult {
            summary: "s".to_string(),
            issues: vec![ReviewIssue {
                file: "f.c".to_string(),
                severity: Severity::Medium,
                line: 1,
                explanation: "x".to_string(),
            }],
        };

        let reconciled = reconciler.reconcile(result);
        assert_eq!(reconciled.issues[0].file, "f.c");
        assert!(logs_contain("Could not reconcile file name"));
    }

    #[test]
    fn test_empty_set_is_unresolved() {
        assert_eq!(
            resolve(&[], "a.c"),
            ("a.c".to_string(), Resolution::Unresolved)
        );
    }

    #[test]
    fn test_reconcile_only_touches_file() {
        let reconciler = FilenameReconciler::new(["src/a.cpp", "src/b.cpp"]);
        let result = ReviewResult {
            summary: "Mixed quality.".to_string(),
            issues: vec![
                ReviewIssue {
                    file: "A.cpp".to_string(),
                    severity: Severity::High,
                    line: 12,
                    explanation: "`x` overflows".to_string(),
                },
                ReviewIssue {
                    file: "c.cpp".to_string(),
                    severity: Severity::Low,
                    line: 3,
                    explanation: "y".to_string(),
                },
            ],
        };

        let reconciled = reconciler.reconcile(result.clone());
        assert_eq!(reconciled.summary, result.summary);
        assert_eq!(reconciled.issues[0].file, "src/a.cpp");
        assert_eq!(reconciled.issues[0].line, 12);
        assert_eq!(reconciled.issues[0].severity, Severity::High);
        assert_eq!(reconciled.issues[0].explanation, "`x` overflows");
        assert_eq!(reconciled.issues[1].file, "c.cpp");
    }

    #[test]
    fn test_reconcile_filename_helper() {
        let canonical = vec!["src/a.cpp".to_string()];
        assert_eq!(reconcile_filename(&canonical, "a.cpp"), "src/a.cpp");
        assert_eq!(reconcile_filename(&canonical, "src/a.cpp"), "src/a.cpp");
    }
}
