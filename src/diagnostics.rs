//! Structured diagnostics produced while resolving mapping plans.
//!
//! Member-level problems are warnings and only drop the offending member.
//! Triple-level problems are errors and suppress the whole plan.

use crate::types::Range;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Every problem the resolver knows how to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Same (other type, direction) declared twice on one shape
    DuplicateMappingDeclaration,
    /// A declaration names a type the metadata provider does not know
    DeclaringTypeNotFound,
    /// Target member resolves to zero or several source members
    NoMatchingMember,
    /// Matched pair has incompatible types and nothing converts them
    NoMatchingPropertyType,
    /// Converter does not convert exactly source type to target type
    InvalidConverterGenericArguments,
    /// Shape has mapping annotations but none yields a declaration
    NoMappingDeclaration,
    /// No target member survived matching and conversion
    NoMatchingProperties,
    /// Existing two-argument constructor does not follow the mapping contract
    InvalidAuxiliaryConstructor,
    /// Recognized annotation whose arguments could not be parsed
    MalformedDirective,
}

impl DiagnosticKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateMappingDeclaration => "MW001",
            Self::DeclaringTypeNotFound => "MW002",
            Self::NoMatchingMember => "MW003",
            Self::NoMatchingPropertyType => "MW004",
            Self::InvalidConverterGenericArguments => "MW005",
            Self::NoMappingDeclaration => "MW006",
            Self::NoMatchingProperties => "MW007",
            Self::InvalidAuxiliaryConstructor => "MW008",
            Self::MalformedDirective => "MW009",
        }
    }

    /// Member-level kinds degrade a plan; the rest abort their triple.
    pub fn severity(&self) -> Severity {
        match self {
            Self::DuplicateMappingDeclaration
            | Self::DeclaringTypeNotFound
            | Self::NoMappingDeclaration
            | Self::NoMatchingProperties => Severity::Error,
            Self::NoMatchingMember
            | Self::NoMatchingPropertyType
            | Self::InvalidConverterGenericArguments
            | Self::InvalidAuxiliaryConstructor
            | Self::MalformedDirective => Severity::Warning,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::DuplicateMappingDeclaration => "Duplicate mapping declaration",
            Self::DeclaringTypeNotFound => "Declaring type not found",
            Self::NoMatchingMember => "No matching member",
            Self::NoMatchingPropertyType => "No matching property type found",
            Self::InvalidConverterGenericArguments => "Invalid converter generic arguments",
            Self::NoMappingDeclaration => "No mapping declaration found",
            Self::NoMatchingProperties => "No matching properties found",
            Self::InvalidAuxiliaryConstructor => "Invalid auxiliary constructor",
            Self::MalformedDirective => "Malformed directive",
        }
    }
}

/// Where a diagnostic points in the user's sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

impl Location {
    pub fn new(file: Option<PathBuf>, range: Option<Range>) -> Self {
        Self { file, range }
    }

    pub fn unknown() -> Self {
        Self::default()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, &self.range) {
            (Some(file), Some(range)) => write!(
                f,
                "{}:{}:{}",
                file.display(),
                range.start_line,
                range.start_column
            ),
            (Some(file), None) => write!(f, "{}", file.display()),
            (None, Some(range)) => write!(f, "{}:{}", range.start_line, range.start_column),
            (None, None) => f.write_str("<unknown>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub code: String,
    pub location: Location,
    pub message: String,

    /// Type a run-level diagnostic is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            code: kind.code().to_string(),
            location,
            message: message.into(),
            subject: None,
        }
    }

    pub fn with_subject(mut self, type_name: impl Into<String>) -> Self {
        self.subject = Some(type_name.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} ({}) at {}",
            self.severity,
            self.code,
            self.message,
            self.kind.title(),
            self.location
        )
    }
}

/// Append-only collector owned by a single resolution unit
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(code = %diagnostic.code, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    pub fn report(&mut self, kind: DiagnosticKind, location: Location, message: impl Into<String>) {
        self.push(Diagnostic::new(kind, location, message));
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
