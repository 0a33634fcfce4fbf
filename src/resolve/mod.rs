//! Resolution of a single (source, target, direction) triple into a plan.
//!
//! A triple is resolved in isolation: it reads the shared provider and
//! directive table and writes only to its own [`DiagnosticSink`].

pub mod assignability;
pub mod conversion;
pub mod matcher;

pub use conversion::ConversionResolver;
pub use matcher::{MemberMatch, MemberMatcher};

use crate::config::Settings;
use crate::descriptor::{TypeProvider, ancestors};
use crate::diagnostics::{DiagnosticKind, DiagnosticSink, Location};
use crate::directive::{DirectiveIndex, DirectiveTable};
use crate::plan::{MappingPlan, MatchedPair, PlanBuilder};
use crate::types::{Direction, Range};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One mapping to resolve, expanded from a declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub source: String,
    pub target: String,
    pub direction: Direction,
    /// Shape carrying the declaration
    pub declaring_type: String,
    #[serde(skip)]
    pub file: Option<PathBuf>,
    #[serde(skip)]
    pub range: Option<Range>,
}

impl Triple {
    /// Expand a declaration on `declaring_type` naming `other`
    pub fn from_declaration(declaring_type: &str, other: &str, direction: Direction) -> Self {
        let (source, target) = match direction {
            Direction::From => (other, declaring_type),
            Direction::To => (declaring_type, other),
        };
        Self {
            source: source.to_string(),
            target: target.to_string(),
            direction,
            declaring_type: declaring_type.to_string(),
            file: None,
            range: None,
        }
    }

    pub fn at(mut self, file: Option<PathBuf>, range: Option<Range>) -> Self {
        self.file = file;
        self.range = range;
        self
    }

    pub fn location(&self) -> Location {
        Location::new(self.file.clone(), self.range)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.source, self.target, self.direction)
    }
}

/// Shared, read-only state every triple resolves against
pub struct ResolveContext<'a> {
    pub provider: &'a dyn TypeProvider,
    pub table: &'a DirectiveTable,
    pub settings: &'a Settings,
}

impl<'a> ResolveContext<'a> {
    pub fn new(provider: &'a dyn TypeProvider, table: &'a DirectiveTable, settings: &'a Settings) -> Self {
        Self {
            provider,
            table,
            settings,
        }
    }

    /// Resolve one triple. The plan is absent whenever an error was reported.
    pub fn resolve(&self, triple: &Triple, sink: &mut DiagnosticSink) -> Option<MappingPlan> {
        let lookup = |name: &str| {
            let ty = self.provider.get(name)?;
            let index = self.table.get(&ty.name)?;
            Some((ty, index))
        };
        let (Some((source, source_index)), Some((target, target_index))) =
            (lookup(&triple.source), lookup(&triple.target))
        else {
            let missing = if lookup(&triple.source).is_none() {
                &triple.source
            } else {
                &triple.target
            };
            sink.report(
                DiagnosticKind::DeclaringTypeNotFound,
                triple.location(),
                format!("type '{missing}' named by '{}' is not described", triple.declaring_type),
            );
            return None;
        };

        let inherits_from_mapped_base = ancestors(self.provider, target).iter().any(|a| {
            self.table
                .get(&a.name)
                .is_some_and(DirectiveIndex::has_declarations)
        });
        let skip_inherited = inherits_from_mapped_base && target_index.has_declarations();

        let matches = MemberMatcher::new(self.provider, source, source_index, target, target_index)
            .skip_inherited_targets(skip_inherited)
            .matches(sink);

        let resolver = ConversionResolver::new(
            self.provider,
            self.table,
            &self.settings.directives,
            (source, source_index),
            (target, target_index),
        );
        let mut builder = PlanBuilder::new(
            self.provider,
            &self.settings.resolution,
            &self.settings.directives,
            source,
            target,
            triple.direction,
        )
        .inherits_from_mapped_base(inherits_from_mapped_base);

        for pair in matches {
            if let Some(strategy) = resolver.resolve(pair, sink) {
                tracing::debug!(
                    "{}.{} <- {}.{}: {strategy}",
                    target.simple_name(),
                    pair.target.name,
                    source.simple_name(),
                    pair.source.name
                );
                builder.push(MatchedPair {
                    target_member: pair.target.name.clone(),
                    source_member: pair.source.name.clone(),
                    target_type: pair.target.ty.clone(),
                    source_type: pair.source.ty.clone(),
                    strategy,
                });
            }
        }

        if builder.is_empty() {
            sink.report(
                DiagnosticKind::NoMatchingProperties,
                Location::new(target.file.clone(), target.range.or(triple.range)),
                format!(
                    "no member of '{}' could be mapped from '{}'",
                    target.name, source.name
                ),
            );
            return None;
        }

        let plan = builder.build(sink);
        if sink.has_errors() {
            return None;
        }
        Some(plan)
    }
}
