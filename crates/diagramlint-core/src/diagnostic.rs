use std::fmt;

use crate::position::Position;

/// A single text substitution proposed to clear a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fix {
    pub replacement: String,
    pub description: String,
}

impl Fix {
    pub fn new(replacement: impl Into<String>, description: impl Into<String>) -> Self {
        Self { replacement: replacement.into(), description: description.into() }
    }
}

/// A secondary position related to a diagnostic (e.g. the opener of an
/// unclosed block).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RelatedInfo {
    pub position: Position,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A value-object diagnostic: never mutated once built, only ever replaced.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub position: Position,
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub related: Vec<RelatedInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fix: Option<Fix>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}[{}]: {}", self.severity, code, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Builder returned by [`Diagnostics::error`]/[`Diagnostics::warning`].
///
/// Constructing one without calling `.emit()` is a bug, so it must be used.
#[must_use = "call .emit() to record the diagnostic"]
pub struct DiagnosticBuilder<'a> {
    sink: &'a mut Diagnostics,
    diagnostic: Diagnostic,
}

impl<'a> DiagnosticBuilder<'a> {
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.diagnostic.code = Some(code.into());
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.diagnostic.hint = Some(hint.into());
        self
    }

    pub fn related_to(mut self, position: Position, message: impl Into<String>) -> Self {
        self.diagnostic.related.push(RelatedInfo { position, message: message.into() });
        self
    }

    pub fn fix(mut self, fix: Fix) -> Self {
        self.diagnostic.fix = Some(fix);
        self
    }

    pub fn emit(self) {
        self.sink.messages.push(self.diagnostic);
    }
}

/// Accumulates diagnostics for a single pipeline run, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    messages: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, position: Position, message: impl Into<String>) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            sink: self,
            diagnostic: Diagnostic {
                position,
                severity: Severity::Error,
                code: None,
                message: message.into(),
                hint: None,
                related: Vec::new(),
                fix: None,
            },
        }
    }

    pub fn warning(&mut self, position: Position, message: impl Into<String>) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            sink: self,
            diagnostic: Diagnostic {
                position,
                severity: Severity::Warning,
                code: None,
                message: message.into(),
                hint: None,
                related: Vec::new(),
                fix: None,
            },
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.messages.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.messages
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.messages
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|d| d.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    /// Removes a code-less diagnostic when a coded diagnostic already
    /// covers the same spot, per the suppression rule in the semantic
    /// sweeps (same line, column within +/-2).
    pub fn suppress_uncoded_near_coded(&mut self) {
        let coded: Vec<(u32, u32)> = self
            .messages
            .iter()
            .filter(|d| d.code.is_some())
            .map(|d| (d.position.line, d.position.column))
            .collect();

        self.messages.retain(|d| {
            if d.code.is_some() {
                return true;
            }
            !coded.iter().any(|&(line, col)| {
                line == d.position.line && (col as i64 - d.position.column as i64).abs() <= 2
            })
        });
    }

    /// Shifts every diagnostic's line by `offset`, used by Markdown mode to
    /// translate in-block positions back to host-document positions.
    pub fn offset_lines(&self, offset: i64) -> Diagnostics {
        Diagnostics {
            messages: self
                .messages
                .iter()
                .cloned()
                .map(|mut d| {
                    d.position = d.position.offset_line(offset);
                    d
                })
                .collect(),
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<T: IntoIterator<Item = Diagnostic>>(iter: T) -> Self {
        Self { messages: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_pushes_diagnostic() {
        let mut diags = Diagnostics::new();
        diags.error(Position::new(1, 1), "bad").code("FL-DIR-MISSING").emit();
        assert_eq!(diags.len(), 1);
        assert!(diags.has_errors());
        assert_eq!(diags.as_slice()[0].code.as_deref(), Some("FL-DIR-MISSING"));
    }

    #[test]
    fn suppress_uncoded_near_coded_drops_overlapping_generic() {
        let mut diags = Diagnostics::new();
        diags.error(Position::new(2, 3), "specific").code("FL-ARROW-INVALID").emit();
        diags.error(Position::new(2, 4), "generic parser message").emit();
        diags.suppress_uncoded_near_coded();
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn offset_lines_preserves_column_and_code() {
        let mut diags = Diagnostics::new();
        diags.error(Position::new(2, 5), "msg").code("PI-MISSING-COLON").emit();
        let shifted = diags.offset_lines(9);
        let only = &shifted.as_slice()[0];
        assert_eq!(only.position.line, 11);
        assert_eq!(only.position.column, 5);
        assert_eq!(only.code.as_deref(), Some("PI-MISSING-COLON"));
    }

    #[test]
    fn display_includes_code_when_present() {
        let diag = Diagnostic {
            position: Position::new(1, 1),
            severity: Severity::Error,
            code: Some("GEN-HEADER-INVALID".into()),
            message: "unknown diagram".into(),
            hint: None,
            related: Vec::new(),
            fix: None,
        };
        assert_eq!(diag.to_string(), "error[GEN-HEADER-INVALID]: unknown diagram");
    }
}
