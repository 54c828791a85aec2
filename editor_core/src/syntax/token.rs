//! Token classification of syntax tree nodes.

use tree_sitter::Node;

use super::language::Language;

/// Kind of a classified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    ControlFlow,
    String,
    Char,
    Number,
    Boolean,
    Constant,
    Comment,
    Type,
    Function,
    Macro,
    Attribute,
    Lifetime,
    /// Object keys in data formats.
    Property,
}

/// A classified span on one line, in character columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub start_col: usize,
    pub end_col: usize,
    pub kind: TokenKind,
}

/// Tokens of one buffer line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineTokens {
    pub line: usize,
    pub spans: Vec<TokenSpan>,
}

impl LineTokens {
    /// Kind of the token covering `col`, if any.
    pub fn kind_at(&self, col: usize) -> Option<TokenKind> {
        self.spans
            .iter()
            .find(|s| col >= s.start_col && col < s.end_col)
            .map(|s| s.kind)
    }
}

const RUST_KEYWORDS: &[&str] = &[
    "fn", "let", "mut", "const", "static", "pub", "mod", "use", "crate", "self", "super", "impl",
    "trait", "struct", "enum", "type", "where", "async", "await", "dyn", "extern", "ref",
    "unsafe", "as", "in", "move",
];
const RUST_CONTROL: &[&str] = &[
    "if", "else", "match", "for", "while", "loop", "break", "continue", "return", "yield",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "def", "class", "import", "from", "as", "global", "nonlocal", "lambda", "with", "assert",
    "del", "pass", "raise", "except", "finally", "try", "async", "await",
];
const PYTHON_CONTROL: &[&str] = &[
    "if", "elif", "else", "for", "while", "break", "continue", "return", "yield", "in", "not",
    "and", "or", "is",
];

const JS_KEYWORDS: &[&str] = &[
    "function", "const", "let", "var", "class", "extends", "import", "export", "default", "from",
    "as", "new", "this", "super", "static", "get", "set", "async", "await", "typeof",
    "instanceof", "void", "delete", "in", "of", "type", "interface", "enum", "namespace",
    "declare", "readonly", "abstract", "implements", "private", "protected", "public",
];
const JS_CONTROL: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "break", "continue", "return", "throw",
    "try", "catch", "finally", "yield",
];

const C_KEYWORDS: &[&str] = &[
    "auto", "const", "default", "enum", "extern", "inline", "register", "restrict", "signed",
    "sizeof", "static", "struct", "typedef", "union", "unsigned", "void", "volatile", "class",
    "namespace", "template", "typename", "virtual", "override", "final", "public", "private",
    "protected", "friend", "new", "delete", "this", "using", "constexpr", "noexcept",
    "decltype", "explicit", "mutable", "operator",
];
const C_CONTROL: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "break", "continue", "return", "goto",
    "throw", "try", "catch",
];

/// Classifies a node, or returns `None` to descend into its children.
pub fn classify(node: &Node, language: Language) -> Option<TokenKind> {
    let kind = node.kind();
    match language {
        Language::Rust => classify_rust(node, kind),
        Language::Python => classify_python(node, kind),
        Language::JavaScript | Language::TypeScript => classify_js(node, kind),
        Language::C | Language::Cpp => classify_c(node, kind),
        Language::Json => classify_json(node, kind),
        Language::PlainText => None,
    }
}

fn keyword(kind: &str, keywords: &[&str], control: &[&str]) -> Option<TokenKind> {
    if control.contains(&kind) {
        Some(TokenKind::ControlFlow)
    } else if keywords.contains(&kind) {
        Some(TokenKind::Keyword)
    } else {
        None
    }
}

/// Whether `node` is the `field` child of its parent, and the parent is one
/// of `parents`.
fn is_field_of(node: &Node, parents: &[&str], field: &str) -> bool {
    node.parent().is_some_and(|parent| {
        parents.contains(&parent.kind()) && parent.child_by_field_name(field) == Some(*node)
    })
}

fn classify_rust(node: &Node, kind: &str) -> Option<TokenKind> {
    if let Some(token) = keyword(kind, RUST_KEYWORDS, RUST_CONTROL) {
        return Some(token);
    }
    match kind {
        "string_literal" | "raw_string_literal" => Some(TokenKind::String),
        "char_literal" => Some(TokenKind::Char),
        "integer_literal" | "float_literal" => Some(TokenKind::Number),
        "boolean_literal" => Some(TokenKind::Boolean),
        "line_comment" | "block_comment" => Some(TokenKind::Comment),
        "type_identifier" | "primitive_type" => Some(TokenKind::Type),
        "attribute_item" | "inner_attribute_item" => Some(TokenKind::Attribute),
        "lifetime" => Some(TokenKind::Lifetime),
        "identifier" => {
            if node.parent().is_some_and(|p| p.kind() == "macro_invocation") {
                Some(TokenKind::Macro)
            } else if is_field_of(node, &["function_item", "function_signature_item"], "name")
                || is_field_of(node, &["call_expression"], "function")
            {
                Some(TokenKind::Function)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn classify_python(node: &Node, kind: &str) -> Option<TokenKind> {
    if let Some(token) = keyword(kind, PYTHON_KEYWORDS, PYTHON_CONTROL) {
        return Some(token);
    }
    match kind {
        "string" => Some(TokenKind::String),
        "integer" | "float" => Some(TokenKind::Number),
        "true" | "false" => Some(TokenKind::Boolean),
        "none" => Some(TokenKind::Constant),
        "comment" => Some(TokenKind::Comment),
        "decorator" => Some(TokenKind::Attribute),
        "identifier"
            if is_field_of(node, &["function_definition", "class_definition"], "name")
                || is_field_of(node, &["call"], "function") =>
        {
            Some(TokenKind::Function)
        }
        _ => None,
    }
}

fn classify_js(node: &Node, kind: &str) -> Option<TokenKind> {
    if let Some(token) = keyword(kind, JS_KEYWORDS, JS_CONTROL) {
        return Some(token);
    }
    match kind {
        "string" | "template_string" => Some(TokenKind::String),
        "number" => Some(TokenKind::Number),
        "true" | "false" => Some(TokenKind::Boolean),
        "null" | "undefined" => Some(TokenKind::Constant),
        "comment" => Some(TokenKind::Comment),
        "type_identifier" | "predefined_type" => Some(TokenKind::Type),
        "identifier" | "property_identifier"
            if is_field_of(
                node,
                &["function_declaration", "method_definition", "function_expression"],
                "name",
            ) || is_field_of(node, &["call_expression"], "function") =>
        {
            Some(TokenKind::Function)
        }
        _ => None,
    }
}

fn classify_c(node: &Node, kind: &str) -> Option<TokenKind> {
    if let Some(token) = keyword(kind, C_KEYWORDS, C_CONTROL) {
        return Some(token);
    }
    match kind {
        "string_literal" | "raw_string_literal" | "system_lib_string" => Some(TokenKind::String),
        "char_literal" => Some(TokenKind::Char),
        "number_literal" => Some(TokenKind::Number),
        "true" | "false" => Some(TokenKind::Boolean),
        "null" | "nullptr" => Some(TokenKind::Constant),
        "comment" => Some(TokenKind::Comment),
        "type_identifier" | "primitive_type" | "sized_type_specifier" => Some(TokenKind::Type),
        "#include" | "#define" | "#ifdef" | "#ifndef" | "#if" | "#else" | "#elif" | "#endif" => {
            Some(TokenKind::Attribute)
        }
        "identifier"
            if is_field_of(node, &["function_declarator"], "declarator")
                || is_field_of(node, &["call_expression"], "function") =>
        {
            Some(TokenKind::Function)
        }
        _ => None,
    }
}

fn classify_json(node: &Node, kind: &str) -> Option<TokenKind> {
    match kind {
        "string" if is_field_of(node, &["pair"], "key") => Some(TokenKind::Property),
        "string" => Some(TokenKind::String),
        "number" => Some(TokenKind::Number),
        "true" | "false" => Some(TokenKind::Boolean),
        "null" => Some(TokenKind::Constant),
        "comment" => Some(TokenKind::Comment),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_at() {
        let tokens = LineTokens {
            line: 0,
            spans: vec![TokenSpan {
                start_col: 2,
                end_col: 4,
                kind: TokenKind::Number,
            }],
        };
        assert_eq!(tokens.kind_at(1), None);
        assert_eq!(tokens.kind_at(2), Some(TokenKind::Number));
        assert_eq!(tokens.kind_at(4), None);
    }

    #[test]
    fn test_keyword_tables() {
        assert_eq!(keyword("fn", RUST_KEYWORDS, RUST_CONTROL), Some(TokenKind::Keyword));
        assert_eq!(keyword("match", RUST_KEYWORDS, RUST_CONTROL), Some(TokenKind::ControlFlow));
        assert_eq!(keyword("foo", RUST_KEYWORDS, RUST_CONTROL), None);
    }
}
