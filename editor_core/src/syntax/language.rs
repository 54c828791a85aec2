//! Language detection.
//!
//! Maps file extensions to tree-sitter grammars.

use std::path::Path;

/// Languages with a bundled grammar, plus plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    C,
    Cpp,
    Json,
    #[default]
    PlainText,
}

/// Extensions recognized for each language.
const EXTENSIONS: &[(Language, &[&str])] = &[
    (Language::Rust, &["rs"]),
    (Language::Python, &["py", "pyw", "pyi"]),
    (Language::JavaScript, &["js", "jsx", "mjs", "cjs"]),
    (Language::TypeScript, &["ts", "tsx", "mts", "cts"]),
    (Language::C, &["c", "h"]),
    (Language::Cpp, &["cpp", "cc", "cxx", "c++", "hpp", "hh", "hxx", "h++"]),
    (Language::Json, &["json", "jsonc"]),
];

impl Language {
    /// Detects language from a file path based on extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or_default()
    }

    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(_, exts)| exts.contains(&ext.as_str()))
            .map(|(language, _)| *language)
            .unwrap_or_default()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rust => "Rust",
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::C => "C",
            Self::Cpp => "C++",
            Self::Json => "JSON",
            Self::PlainText => "Plain Text",
        }
    }

    /// Whether the language is parsed at all.
    pub fn is_parsed(&self) -> bool {
        !matches!(self, Self::PlainText)
    }

    /// Returns the tree-sitter grammar, if the language has one.
    pub fn grammar(&self) -> Option<tree_sitter::Language> {
        match self {
            Self::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Self::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Self::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Self::C => Some(tree_sitter_c::LANGUAGE.into()),
            Self::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
            Self::Json => Some(tree_sitter_json::LANGUAGE.into()),
            Self::PlainText => None,
        }
    }
}
