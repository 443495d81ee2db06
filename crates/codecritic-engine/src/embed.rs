//! File embedding
//!
//! Turns a raw path → content map into the ordered, language-tagged list of
//! [`EmbeddedFile`]s. That list is the single source of truth for every file
//! name later stages may reference.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::model::EmbeddedFile;

/// Source language used for prompt fencing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    Python,
    Java,
    JavaScript,
    TypeScript,
    /// Anything not in the table; never embedded
    Text,
}

impl Language {
    /// Classify a path by its extension (case-insensitive).
    #[must_use]
    pub fn detect(path: &str) -> Self {
        let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) else {
            return Self::Text;
        };
        match ext.to_ascii_lowercase().as_str() {
            "c" | "h" => Self::C,
            "cpp" | "cc" | "hpp" => Self::Cpp,
            "py" => Self::Python,
            "java" => Self::Java,
            "js" => Self::JavaScript,
            "ts" => Self::TypeScript,
            _ => Self::Text,
        }
    }

    /// Fence tag for code blocks
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Python => "python",
            Self::Java => "java",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of embedding a file map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embedding {
    /// Sorted by path
    pub files: Vec<EmbeddedFile>,
    /// Paths dropped for having no known language, sorted
    pub skipped: Vec<String>,
}

/// Prefix each line with its 1-based index and `": "`.
///
/// Both `\n` and `\r\n` terminate lines; a trailing terminator does not
/// start a new line.
#[must_use]
pub fn enumerate_lines(content: &str) -> String {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| format!("{}: {line}", index + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Embed every supported file in `files`.
#[must_use]
pub fn embed_files(files: &HashMap<String, String>) -> Embedding {
    let mut entries: Vec<(&String, &String)> = files.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut embedding = Embedding::default();
    let mut total_chars = 0usize;

    for (path, content) in entries {
        let language = Language::detect(path);
        if language == Language::Text {
            tracing::debug!(path = %path, "Skipping unsupported file type");
            embedding.skipped.push(path.clone());
            continue;
        }

        total_chars += content.chars().count();
        embedding.files.push(EmbeddedFile {
            path: path.clone(),
            language,
            content: content.clone(),
            total_lines: content.matches('\n').count() + 1,
        });
    }

    tracing::info!(
        embedded = embedding.files.len(),
        skipped = embedding.skipped.len(),
        total_chars,
        "Embedded source files"
    );
    embedding
}

/// Render the fenced, line-numbered listing used as the user turn of
/// every stage that reads source.
#[must_use]
pub fn source_listing(files: &[EmbeddedFile]) -> String {
    let mut lines = Vec::with_capacity(files.len() * 4);
    for file in files {
        lines.push(format!("\n### FILE: {}", file.path));
        lines.push(format!("```{}", file.language));
        lines.push(enumerate_lines(&file.content));
        lines.push("```".to_string());
    }
    lines.join("\n")
}
