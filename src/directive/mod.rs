//! Typed directive index, built once per shape.
//!
//! Raw annotations are parsed here and nowhere else. The matcher and the
//! conversion resolver only ask scoped questions of a [`DirectiveIndex`]:
//! is this member ignored for that type, what is it renamed to, which
//! converter does it use.

pub mod parse;

pub use parse::{DirectiveParser, ParsedDirective};

use crate::config::DirectiveConfig;
use crate::descriptor::{TypeDescriptor, TypeProvider, flatten_members};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Location};
use crate::types::{Direction, Range, TypeKind};
use std::collections::{HashMap, HashSet};

/// Type-level declaration: this shape maps from/to `other`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingDeclaration {
    /// Fully qualified name of the other shape
    pub other: String,
    pub direction: Direction,
    pub range: Option<Range>,
}

/// Declaration whose type argument the provider could not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDeclaration {
    pub written: String,
    pub direction: Direction,
    pub range: Option<Range>,
}

/// A directive value, optionally restricted to one other-side type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoped<T> {
    pub scope: Option<String>,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterBinding {
    pub converter: String,
    /// Literal constructor parameters in source form
    pub parameters: Vec<String>,
}

/// Directives attached to one member
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberDirectives {
    pub ignores: Vec<Option<String>>,
    pub renames: Vec<Scoped<String>>,
    pub converters: Vec<Scoped<ConverterBinding>>,
}

impl MemberDirectives {
    pub fn is_empty(&self) -> bool {
        self.ignores.is_empty() && self.renames.is_empty() && self.converters.is_empty()
    }

    fn merge(&mut self, other: MemberDirectives) {
        self.ignores.extend(other.ignores);
        self.renames.extend(other.renames);
        self.converters.extend(other.converters);
    }

    pub fn is_ignored_for(&self, other: &str) -> bool {
        self.ignores
            .iter()
            .any(|scope| scope.as_deref().is_none_or(|s| s == other))
    }

    pub fn rename_for(&self, other: &str) -> Option<&str> {
        select_scoped(&self.renames, other).map(String::as_str)
    }

    pub fn converter_for(&self, other: &str) -> Option<&ConverterBinding> {
        select_scoped(&self.converters, other)
    }
}

/// Exact scope beats unscoped; among equals the first declared wins.
fn select_scoped<'a, T>(items: &'a [Scoped<T>], other: &str) -> Option<&'a T> {
    items
        .iter()
        .find(|item| item.scope.as_deref() == Some(other))
        .or_else(|| items.iter().find(|item| item.scope.is_none()))
        .map(|item| &item.value)
}

#[derive(Debug, Clone)]
pub struct DirectiveIndex {
    type_name: String,
    declarations: Vec<MappingDeclaration>,
    duplicates: Vec<MappingDeclaration>,
    unresolved: Vec<UnresolvedDeclaration>,
    has_mapping_annotations: bool,
    members: HashMap<String, MemberDirectives>,
    diagnostics: Vec<Diagnostic>,
}

impl DirectiveIndex {
    /// Parse every annotation on `ty` and its flattened members.
    ///
    /// Type names inside directives are resolved through `provider` so that
    /// scopes compare against fully qualified names.
    pub fn build(ty: &TypeDescriptor, provider: &dyn TypeProvider, config: &DirectiveConfig) -> Self {
        let parser = DirectiveParser::new(config);
        let mut index = Self {
            type_name: ty.name.clone(),
            declarations: Vec::new(),
            duplicates: Vec::new(),
            unresolved: Vec::new(),
            has_mapping_annotations: false,
            members: HashMap::new(),
            diagnostics: Vec::new(),
        };

        let mut seen: HashSet<(String, Direction)> = HashSet::new();
        for attr in &ty.attributes {
            if parser.is_declaration(attr) {
                index.has_mapping_annotations = true;
            }
            let Some(parsed) = parser.parse_type_attribute(attr) else {
                continue;
            };
            let location = Location::new(ty.file.clone(), attr.range.or(ty.range));
            match parsed {
                Ok(ParsedDirective::Declaration { other, direction }) => {
                    match provider.resolve(&other) {
                        Some(resolved) => {
                            let declaration = MappingDeclaration {
                                other: resolved.name.clone(),
                                direction,
                                range: attr.range,
                            };
                            if seen.insert((declaration.other.clone(), direction)) {
                                index.declarations.push(declaration);
                            } else {
                                index.duplicates.push(declaration);
                            }
                        }
                        None => index.unresolved.push(UnresolvedDeclaration {
                            written: other,
                            direction,
                            range: attr.range,
                        }),
                    }
                }
                Ok(_) => {}
                Err(reason) => index.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MalformedDirective,
                    location,
                    format!("{} on '{}': {reason}", attr.name, ty.name),
                )),
            }
        }

        // Record parameters are annotated separately from the properties they back
        let parameters = match ty.kind {
            TypeKind::Record => ty
                .primary_constructor()
                .map_or(&[][..], |c| c.parameters.as_slice()),
            TypeKind::Class => &[],
        };
        for member in flatten_members(provider, ty, true).into_iter().chain(parameters) {
            let mut directives = MemberDirectives::default();
            for attr in &member.attributes {
                let Some(parsed) = parser.parse_member_attribute(attr) else {
                    continue;
                };
                let location = Location::new(ty.file.clone(), attr.range.or(member.range));
                let parsed = match parsed {
                    Ok(parsed) => parsed,
                    Err(reason) => {
                        index.diagnostics.push(Diagnostic::new(
                            DiagnosticKind::MalformedDirective,
                            location,
                            format!("{} on '{}.{}': {reason}", attr.name, ty.name, member.name),
                        ));
                        continue;
                    }
                };

                match parsed {
                    ParsedDirective::Ignore { scope } => {
                        let scope = index.resolve_scope(provider, scope, &location, &member.name);
                        directives.ignores.push(scope);
                    }
                    ParsedDirective::Rename { name, scope } => {
                        let scope = index.resolve_scope(provider, scope, &location, &member.name);
                        directives.renames.push(Scoped { scope, value: name });
                    }
                    ParsedDirective::Converter {
                        converter,
                        parameters,
                        scope,
                    } => {
                        let scope = index.resolve_scope(provider, scope, &location, &member.name);
                        // Keep the written name when unresolved; the resolver reports it
                        let converter = provider
                            .resolve(&converter)
                            .map_or(converter, |c| c.name.clone());
                        directives.converters.push(Scoped {
                            scope,
                            value: ConverterBinding {
                                converter,
                                parameters,
                            },
                        });
                    }
                    ParsedDirective::Declaration { .. } => {}
                }
            }
            if !directives.is_empty() {
                index
                    .members
                    .entry(member.name.clone())
                    .or_default()
                    .merge(directives);
            }
        }

        tracing::debug!(
            "indexed '{}': {} declarations, {} members with directives",
            index.type_name,
            index.declarations.len(),
            index.members.len()
        );
        index
    }

    fn resolve_scope(
        &mut self,
        provider: &dyn TypeProvider,
        scope: Option<String>,
        location: &Location,
        member: &str,
    ) -> Option<String> {
        let written = scope?;
        match provider.resolve(&written) {
            Some(ty) => Some(ty.name.clone()),
            None => {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MalformedDirective,
                    location.clone(),
                    format!(
                        "'{}.{member}' is scoped to '{written}', which is not a described type; the directive never applies",
                        self.type_name
                    ),
                ));
                Some(written)
            }
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Distinct declarations in annotation order
    pub fn declarations(&self) -> &[MappingDeclaration] {
        &self.declarations
    }

    /// Second and later occurrences of an already declared (type, direction)
    pub fn duplicates(&self) -> &[MappingDeclaration] {
        &self.duplicates
    }

    pub fn unresolved(&self) -> &[UnresolvedDeclaration] {
        &self.unresolved
    }

    /// Whether the shape carries any declaration annotation, even a malformed one
    pub fn has_mapping_annotations(&self) -> bool {
        self.has_mapping_annotations
    }

    /// Whether the shape carries at least one valid declaration
    pub fn has_declarations(&self) -> bool {
        !self.declarations.is_empty()
    }

    pub fn declares(&self, other: &str, direction: Direction) -> bool {
        self.declarations
            .iter()
            .any(|d| d.other == other && d.direction == direction)
    }

    pub fn member(&self, name: &str) -> Option<&MemberDirectives> {
        self.members.get(name)
    }

    pub fn is_ignored(&self, member: &str, other: &str) -> bool {
        self.member(member).is_some_and(|d| d.is_ignored_for(other))
    }

    pub fn rename_for(&self, member: &str, other: &str) -> Option<&str> {
        self.member(member).and_then(|d| d.rename_for(other))
    }

    pub fn converter_for(&self, member: &str, other: &str) -> Option<&ConverterBinding> {
        self.member(member).and_then(|d| d.converter_for(other))
    }

    /// Malformed-directive warnings found while building
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Directive indices for every type a provider describes
#[derive(Debug, Default)]
pub struct DirectiveTable {
    indices: Vec<DirectiveIndex>,
    by_name: HashMap<String, usize>,
}

impl DirectiveTable {
    pub fn build(provider: &dyn TypeProvider, config: &DirectiveConfig) -> Self {
        let mut table = Self::default();
        for ty in provider.types() {
            let index = DirectiveIndex::build(ty, provider, config);
            table.by_name.insert(ty.name.clone(), table.indices.len());
            table.indices.push(index);
        }
        table
    }

    pub fn get(&self, type_name: &str) -> Option<&DirectiveIndex> {
        self.by_name.get(type_name).map(|&i| &self.indices[i])
    }

    /// Indices in provider order
    pub fn iter(&self) -> std::slice::Iter<'_, DirectiveIndex> {
        self.indices.iter()
    }

    /// Does `type_name` carry a declaration of `direction` naming `other`?
    pub fn declares(&self, type_name: &str, other: &str, direction: Direction) -> bool {
        self.get(type_name)
            .is_some_and(|index| index.declares(other, direction))
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.indices.iter().flat_map(|index| index.diagnostics.iter())
    }
}
