//! Resolution runs: candidate expansion and (optionally parallel) resolution.

use crate::config::Settings;
use crate::descriptor::TypeProvider;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, Location, Severity};
use crate::directive::{DirectiveIndex, DirectiveTable};
use crate::error::{MapError, MapResult};
use crate::plan::MappingPlan;
use crate::resolve::{ResolveContext, Triple};
use crate::types::Direction;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of resolving one triple
#[derive(Debug, Clone, Serialize)]
pub struct TripleOutcome {
    pub triple: Triple,
    pub plan: Option<MappingPlan>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TripleOutcome {
    fn failed(triple: Triple, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            triple,
            plan: None,
            diagnostics,
        }
    }

    pub fn is_success(&self) -> bool {
        self.plan.is_some()
    }
}

/// Everything a run produced, in candidate order
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<TripleOutcome>,
    /// Diagnostics not tied to a single triple
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn plans(&self) -> impl Iterator<Item = &MappingPlan> {
        self.outcomes.iter().filter_map(|o| o.plan.as_ref())
    }

    pub fn all_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .chain(self.outcomes.iter().flat_map(|o| o.diagnostics.iter()))
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.all_diagnostics()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Write the successful plans as a JSON array for an emitter to consume
    pub fn save_plans(&self, path: &Path) -> MapResult<()> {
        let plans: Vec<&MappingPlan> = self.plans().collect();
        let json = serde_json::to_string_pretty(&plans)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| MapError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| MapError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("wrote {} plans to {}", plans.len(), path.display());
        Ok(())
    }

    /// Keep only outcomes involving `type_name` as source, target or declaring shape.
    ///
    /// Run-level diagnostics survive when their subject is `type_name` or one
    /// of the retained outcomes' types.
    pub fn retain_type(&mut self, type_name: &str) {
        self.outcomes.retain(|o| {
            o.triple.source == type_name
                || o.triple.target == type_name
                || o.triple.declaring_type == type_name
        });

        let mut related: HashSet<&str> = HashSet::from([type_name]);
        for outcome in &self.outcomes {
            related.insert(&outcome.triple.source);
            related.insert(&outcome.triple.target);
        }
        self.diagnostics.retain(|d| {
            d.subject
                .as_deref()
                .is_none_or(|subject| related.contains(subject))
        });
    }
}

/// A unit of work produced by candidate expansion
enum Work {
    Resolve(Triple),
    Failed(TripleOutcome),
}

pub struct MappingEngine<'a> {
    provider: &'a dyn TypeProvider,
    settings: &'a Settings,
    table: DirectiveTable,
}

impl<'a> MappingEngine<'a> {
    /// Index every described type's directives up front.
    ///
    /// After this the table is only read, so triples can resolve on any thread.
    pub fn new(provider: &'a dyn TypeProvider, settings: &'a Settings) -> Self {
        let table = DirectiveTable::build(provider, &settings.directives);
        Self {
            provider,
            settings,
            table,
        }
    }

    pub fn table(&self) -> &DirectiveTable {
        &self.table
    }

    /// Triples to resolve, in candidate order
    pub fn triples(&self) -> Vec<Triple> {
        self.expand()
            .0
            .into_iter()
            .filter_map(|work| match work {
                Work::Resolve(triple) => Some(triple),
                Work::Failed(_) => None,
            })
            .collect()
    }

    /// Resolve a single triple against this engine's table
    pub fn resolve(&self, triple: &Triple) -> TripleOutcome {
        let context = ResolveContext::new(self.provider, &self.table, self.settings);
        let mut sink = DiagnosticSink::new();
        let plan = context.resolve(triple, &mut sink);
        TripleOutcome {
            triple: triple.clone(),
            plan,
            diagnostics: sink.into_vec(),
        }
    }

    /// Resolve every candidate. Outcome order does not depend on thread count.
    pub fn run(&self) -> MapResult<RunReport> {
        let start = Instant::now();
        let (work, mut diagnostics) = self.expand();
        for index in self.table.iter() {
            diagnostics.extend(
                index
                    .diagnostics()
                    .iter()
                    .map(|d| d.clone().with_subject(index.type_name())),
            );
        }

        let threads = self.settings.resolution.parallel_threads.max(1);
        let outcomes: Vec<TripleOutcome> = if threads == 1 || work.len() < 2 {
            work.into_iter().map(|w| self.execute(w)).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| MapError::ThreadPool {
                    reason: e.to_string(),
                })?;
            pool.install(|| work.into_par_iter().map(|w| self.execute(w)).collect())
        };

        let report = RunReport {
            outcomes,
            diagnostics,
        };
        tracing::info!(
            "resolved {} triples into {} plans in {:?} ({} errors, {} warnings)",
            report.outcomes.len(),
            report.plans().count(),
            start.elapsed(),
            report.error_count(),
            report.warning_count()
        );
        Ok(report)
    }

    fn execute(&self, work: Work) -> TripleOutcome {
        match work {
            Work::Resolve(triple) => self.resolve(&triple),
            Work::Failed(outcome) => outcome,
        }
    }

    /// Expand every annotated shape's declarations into work items.
    ///
    /// Duplicate and unresolvable declarations become failed outcomes here;
    /// a shape whose annotations yield nothing gets a run-level error.
    fn expand(&self) -> (Vec<Work>, Vec<Diagnostic>) {
        let mut work = Vec::new();
        let mut diagnostics = Vec::new();

        for index in self.table.iter() {
            if !index.has_mapping_annotations() {
                continue;
            }
            let Some(ty) = self.provider.get(index.type_name()) else {
                continue;
            };
            let file = ty.file.clone();

            if index.declarations().is_empty() && index.unresolved().is_empty() {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::NoMappingDeclaration,
                    Location::new(file.clone(), ty.range),
                    format!("'{}' has mapping annotations but none names a type", ty.name),
                ).with_subject(&ty.name));
                continue;
            }

            for declaration in index.declarations() {
                let triple = Triple::from_declaration(&ty.name, &declaration.other, declaration.direction)
                    .at(file.clone(), declaration.range.or(ty.range));
                let duplicates = duplicate_diagnostics(index, &triple, file.clone());
                if duplicates.is_empty() {
                    work.push(Work::Resolve(triple));
                } else {
                    work.push(Work::Failed(TripleOutcome::failed(triple, duplicates)));
                }
            }

            for unresolved in index.unresolved() {
                let triple = Triple::from_declaration(&ty.name, &unresolved.written, unresolved.direction)
                    .at(file.clone(), unresolved.range.or(ty.range));
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::DeclaringTypeNotFound,
                    triple.location(),
                    format!(
                        "'{}' declares a mapping {} '{}', which is not a described type",
                        ty.name,
                        unresolved.direction.as_str().to_lowercase(),
                        unresolved.written
                    ),
                );
                work.push(Work::Failed(TripleOutcome::failed(triple, vec![diagnostic])));
            }
        }

        tracing::debug!("expanded {} work items", work.len());
        (work, diagnostics)
    }
}

fn duplicate_diagnostics(
    index: &DirectiveIndex,
    triple: &Triple,
    file: Option<PathBuf>,
) -> Vec<Diagnostic> {
    let other = match triple.direction {
        Direction::From => &triple.source,
        Direction::To => &triple.target,
    };
    index
        .duplicates()
        .iter()
        .filter(|d| &d.other == other && d.direction == triple.direction)
        .map(|d| {
            Diagnostic::new(
                DiagnosticKind::DuplicateMappingDeclaration,
                Location::new(file.clone(), d.range.or(triple.range)),
                format!(
                    "'{}' declares the mapping {} '{}' more than once",
                    triple.declaring_type,
                    d.direction.as_str().to_lowercase(),
                    d.other
                ),
            )
        })
        .collect()
}
