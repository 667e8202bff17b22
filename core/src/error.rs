use std::fmt;
use std::sync::Arc;

/// Where a syntax node came from. Only used for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub unit: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl SourceInfo {
    pub fn new(unit: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            unit: unit.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.unit, self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operand types are incompatible for an operation or conversion.
    CastError,
    /// A value violates a function precondition.
    IllegalArgument,
    /// A required value was nil.
    NilError,
    IndexOutOfBounds,
    DivisionByZero,
    /// A destructuring bind did not match its subject.
    PatternMismatch,
    UnresolvedReference,
    StackOverflow,
    CannotFindModule,
    IllegalAccess,
    NotSerializable,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::CastError => "CAST_ERROR",
            ErrorKind::IllegalArgument => "ILLEGAL_ARGUMENT",
            ErrorKind::NilError => "NIL_ERROR",
            ErrorKind::IndexOutOfBounds => "INDEX_OUT_OF_BOUNDS",
            ErrorKind::DivisionByZero => "DIVISION_BY_ZERO",
            ErrorKind::PatternMismatch => "PATTERN_MISMATCH",
            ErrorKind::UnresolvedReference => "UNRESOLVED_REFERENCE",
            ErrorKind::StackOverflow => "STACK_OVERFLOW",
            ErrorKind::CannotFindModule => "CANNOT_FIND_MODULE",
            ErrorKind::IllegalAccess => "ILLEGAL_ACCESS",
            ErrorKind::NotSerializable => "NOT_SERIALIZABLE",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of the evaluation stack captured when an error is raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    pub name: Arc<str>,
    pub position: Option<SourceInfo>,
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(pos) => write!(f, "{} ({})", self.name, pos),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Language level failure raised during evaluation.
///
/// Travels inside `anyhow::Error`; use [`error_kind`] or
/// `downcast_ref::<LangError>()` to inspect it.
#[derive(Debug, Clone)]
pub struct LangError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<SourceInfo>,
    pub trace: Vec<TraceFrame>,
}

impl LangError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            trace: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: Option<SourceInfo>) -> Self {
        self.source = source;
        self
    }

    pub fn with_trace(mut self, trace: Vec<TraceFrame>) -> Self {
        self.trace = trace;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for LangError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " at {}", source)?;
        }
        for frame in &self.trace {
            write!(f, "\n  at {}", frame)?;
        }
        Ok(())
    }
}

impl std::error::Error for LangError {}

/// Shorthand for raising a [`LangError`] through `anyhow`.
pub fn lang_error(kind: ErrorKind, message: impl Into<String>) -> anyhow::Error {
    LangError::new(kind, message).into()
}

pub fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.downcast_ref::<LangError>().map(LangError::kind)
}

/// Fill in position and trace on a `LangError` that does not carry them yet.
/// Errors of other types pass through untouched.
pub(crate) fn locate(mut err: anyhow::Error, source: Option<&SourceInfo>, trace: impl FnOnce() -> Vec<TraceFrame>) -> anyhow::Error {
    if let Some(lang) = err.downcast_mut::<LangError>() {
        if lang.source.is_none() {
            lang.source = source.cloned();
        }
        if lang.trace.is_empty() {
            lang.trace = trace();
        }
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_info_display() {
        let src = SourceInfo::new("main.tf", 3, 14);
        assert_eq!(src.to_string(), "main.tf:3:14");
    }

    #[test]
    fn test_lang_error_display() {
        let err = LangError::new(ErrorKind::CastError, "cannot compare types string and long")
            .with_source(Some(SourceInfo::new("main.tf", 1, 5)))
            .with_trace(vec![TraceFrame {
                name: Arc::from("f"),
                position: Some(SourceInfo::new("main.tf", 2, 1)),
            }]);
        assert_eq!(
            err.to_string(),
            "CAST_ERROR: cannot compare types string and long at main.tf:1:5\n  at f (main.tf:2:1)"
        );
    }

    #[test]
    fn test_locate_keeps_existing_position() {
        let first = SourceInfo::new("a", 1, 1);
        let second = SourceInfo::new("b", 2, 2);
        let err = lang_error(ErrorKind::NilError, "nil key");
        let err = locate(err, Some(&first), Vec::new);
        let err = locate(err, Some(&second), Vec::new);
        let lang = err.downcast_ref::<LangError>().unwrap();
        assert_eq!(lang.source, Some(first));
        assert_eq!(error_kind(&err), Some(ErrorKind::NilError));
    }

    #[test]
    fn test_error_kind_of_foreign_error() {
        let err = anyhow::anyhow!("plain");
        assert_eq!(error_kind(&err), None);
    }
}
