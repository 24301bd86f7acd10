use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};

/// How serious a [`Diagnostic`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Processing must stop at the next phase boundary.
    Error,
    /// Informational; the request still succeeds.
    Warning,
}

/// Machine-readable identifier for a class of problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(Cow<'static, str>);

impl Code {
    /// Code backed by a static string, usable in `const` items.
    #[must_use]
    pub const fn from_static(code: &'static str) -> Self {
        Self(Cow::Borrowed(code))
    }

    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(Cow::Owned(code.into()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Codes shared by the stock responses and the bundled endpoints.
pub mod codes {
    use super::Code;

    /// The request body could not be decoded.
    pub const MALFORMED_BODY: Code = Code::from_static("malformed_body");
    /// A required field was absent.
    pub const MISSING_FIELD: Code = Code::from_static("missing_field");
    /// A field was present but its value is not acceptable.
    pub const INVALID_VALUE: Code = Code::from_static("invalid_value");
    /// The request body uses a content type the endpoint cannot read.
    pub const UNSUPPORTED_MEDIA_TYPE: Code = Code::from_static("unsupported_media_type");
    /// Something went wrong on the server side. Never carries details.
    pub const INTERNAL_ERROR: Code = Code::from_static("internal_error");
}

/// One step of a [`Steps`] path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    /// Object member by name
    Field(String),
    /// Array element by position
    Index(usize),
}

/// A structural path into the request, e.g. `/pets/0/name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Steps(Vec<Step>);

impl Steps {
    /// The empty path, pointing at the request as a whole.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.0.push(Step::Field(name.into()));
        self
    }

    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(Step::Index(index));
        self
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Steps {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for step in &self.0 {
            match step {
                // JSON pointer escaping (RFC 6901)
                Step::Field(name) => write!(f, "/{}", name.replace('~', "~0").replace('/', "~1"))?,
                Step::Index(index) => write!(f, "/{index}")?,
            }
        }
        Ok(())
    }
}

/// A structured record of a problem found while processing a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Code,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<Steps>,
}

impl Diagnostic {
    #[must_use]
    pub fn error(code: Code, paths: Vec<Steps>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            paths,
        }
    }

    #[must_use]
    pub fn warning(code: Code, paths: Vec<Steps>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            paths,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Ordered, append-only collection of diagnostics.
///
/// Order is kept for display. Whether the collection represents a failure does not
/// depend on order: [`has_errors`](Self::has_errors) is true as soon as any entry has
/// [`Severity::Error`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Append an error-severity diagnostic.
    pub fn error(&mut self, code: Code, paths: impl IntoIterator<Item = Steps>) {
        self.push(Diagnostic::error(code, paths.into_iter().collect()));
    }

    /// Append a warning-severity diagnostic.
    pub fn warning(&mut self, code: Code, paths: impl IntoIterator<Item = Steps>) {
        self.push(Diagnostic::warning(code, paths.into_iter().collect()));
    }

    #[inline]
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}
