use std::fmt;
use std::sync::Arc;

/// Location and source text of a YAML syntax error
#[derive(Debug, Clone)]
pub struct ParseErrorDetails {
    pub message: String,
    pub source_id: String,
    pub source_text: Arc<str>,
    /// Byte offset into `source_text`, when the YAML parser reported one
    pub index: Option<usize>,
    pub line: usize,
    pub column: usize,
}

/// A user-facing failure tied to one node of a template or variation
#[derive(Debug, Clone)]
pub struct ResolutionErrorDetails {
    /// Short machine-friendly label, e.g. `MissingCase`
    pub user_label: String,
    pub message: String,
    /// YAML rendering of the offending node, if one is known
    pub node: Option<String>,
}

/// Error types for template expansion
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProcgenError {
    /// The YAML text itself could not be parsed
    #[error("{}", format_parse(.0))]
    Parse(Box<ParseErrorDetails>),

    /// A template file could not be read from disk
    #[error("Could not read {path}: {message}")]
    Io { path: String, message: String },

    /// A tag was used with the wrong shape, e.g. mismatched `cases` and `then`
    #[error("Structure error: {message}{}", format_node(.node))]
    Structure {
        message: String,
        node: Option<String>,
    },

    /// A variation could not be finished, e.g. a conditional without a matching case
    #[error("{}", format_resolution(.0))]
    Resolution(Box<ResolutionErrorDetails>),

    /// Broken invariant inside the engine. Never caused by template contents alone.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Any of the above, annotated with the template it came from
    #[error("{} in {source_id}\n{error}", .error.user_label())]
    InSource {
        source_id: String,
        error: Box<ProcgenError>,
    },
}

impl ProcgenError {
    pub fn parse(
        message: impl Into<String>,
        source_id: impl Into<String>,
        source_text: Arc<str>,
        index: Option<usize>,
        line: usize,
        column: usize,
    ) -> Self {
        Self::Parse(Box::new(ParseErrorDetails {
            message: message.into(),
            source_id: source_id.into(),
            source_text,
            index,
            line,
            column,
        }))
    }

    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure {
            message: message.into(),
            node: None,
        }
    }

    /// Structural error that shows the offending node
    pub fn structure_at(message: impl Into<String>, node: impl Into<String>) -> Self {
        Self::Structure {
            message: message.into(),
            node: Some(node.into()),
        }
    }

    pub fn resolution(user_label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution(Box::new(ResolutionErrorDetails {
            user_label: user_label.into(),
            message: message.into(),
            node: None,
        }))
    }

    pub fn resolution_at(
        user_label: impl Into<String>,
        message: impl Into<String>,
        node: impl Into<String>,
    ) -> Self {
        Self::Resolution(Box::new(ResolutionErrorDetails {
            user_label: user_label.into(),
            message: message.into(),
            node: Some(node.into()),
        }))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Attach the template path. Already annotated errors are left alone.
    pub fn in_source(self, source_id: impl Into<String>) -> Self {
        match self {
            annotated @ ProcgenError::InSource { .. } => annotated,
            error => ProcgenError::InSource {
                source_id: source_id.into(),
                error: Box::new(error),
            },
        }
    }

    /// Short label for reports and error artifacts
    pub fn user_label(&self) -> &str {
        match self {
            ProcgenError::Parse(_) => "ParseError",
            ProcgenError::Io { .. } => "IOError",
            ProcgenError::Structure { .. } => "InvalidStructure",
            ProcgenError::Resolution(details) => &details.user_label,
            ProcgenError::Internal(_) => "InternalError",
            ProcgenError::InSource { error, .. } => error.user_label(),
        }
    }

    /// Whether the error is caused by the template and can be reported per document.
    ///
    /// Internal errors are not: they mean the engine itself is broken.
    pub fn is_user_facing(&self) -> bool {
        match self {
            ProcgenError::Internal(_) => false,
            ProcgenError::InSource { error, .. } => error.is_user_facing(),
            _ => true,
        }
    }

    /// The error without any source annotation
    pub fn root(&self) -> &ProcgenError {
        match self {
            ProcgenError::InSource { error, .. } => error.root(),
            error => error,
        }
    }
}

fn format_parse(details: &ParseErrorDetails) -> String {
    format!(
        "Parse error: {} at {}:{}:{}",
        details.message, details.source_id, details.line, details.column
    )
}

fn format_node(node: &Option<String>) -> String {
    match node {
        Some(node) => format!("\n{}", boxed(node)),
        None => String::new(),
    }
}

fn format_resolution(details: &ResolutionErrorDetails) -> String {
    match &details.node {
        Some(node) => format!(
            "{}\nError ({}): {}",
            boxed(node),
            details.user_label,
            details.message
        ),
        None => format!("Error ({}): {}", details.user_label, details.message),
    }
}

/// Indent a node dump and fence it with rules, so it stands out in a terminal
pub fn boxed(node: &str) -> String {
    let rule = "-----------------------------";
    let mut out = String::new();
    out.push_str(rule);
    out.push('\n');
    for line in node.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(rule);
    out
}

impl From<fmt::Error> for ProcgenError {
    fn from(err: fmt::Error) -> Self {
        ProcgenError::Internal(format!("Format error: {}", err))
    }
}
