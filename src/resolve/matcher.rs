//! Pairs target members with source members by name.

use crate::descriptor::{
    MemberDescriptor, TypeDescriptor, TypeProvider, flatten_members, mapped_members,
};
use crate::diagnostics::{DiagnosticKind, DiagnosticSink, Location};
use crate::directive::DirectiveIndex;

/// One target member and the single source member feeding it
#[derive(Debug, Clone, Copy)]
pub struct MemberMatch<'a> {
    pub target: &'a MemberDescriptor,
    pub source: &'a MemberDescriptor,
}

pub struct MemberMatcher<'a> {
    provider: &'a dyn TypeProvider,
    source: &'a TypeDescriptor,
    source_index: &'a DirectiveIndex,
    target: &'a TypeDescriptor,
    target_index: &'a DirectiveIndex,
    include_inherited: bool,
}

impl<'a> MemberMatcher<'a> {
    pub fn new(
        provider: &'a dyn TypeProvider,
        source: &'a TypeDescriptor,
        source_index: &'a DirectiveIndex,
        target: &'a TypeDescriptor,
        target_index: &'a DirectiveIndex,
    ) -> Self {
        Self {
            provider,
            source,
            source_index,
            target,
            target_index,
            include_inherited: true,
        }
    }

    /// Leave inherited target members to the base type's own mapping
    pub fn skip_inherited_targets(mut self, skip: bool) -> Self {
        self.include_inherited = !skip;
        self
    }

    /// Match every target member, in target enumeration order.
    ///
    /// Members without exactly one source candidate are reported and dropped.
    pub fn matches(&self, sink: &mut DiagnosticSink) -> Vec<MemberMatch<'a>> {
        let source_name = self.source.name.as_str();
        let target_name = self.target.name.as_str();

        let sources: Vec<&'a MemberDescriptor> = flatten_members(self.provider, self.source, true)
            .into_iter()
            .filter(|s| !self.source_index.is_ignored(&s.name, target_name))
            .collect();

        let mut matches = Vec::new();
        for target in mapped_members(self.provider, self.target, self.include_inherited) {
            if self.target_index.is_ignored(&target.name, source_name) {
                tracing::debug!("'{target_name}.{}' ignored for '{source_name}'", target.name);
                continue;
            }

            let candidates = self.candidates(target, &sources);
            match candidates.as_slice() {
                [source] => matches.push(MemberMatch { target, source }),
                [] => sink.report(
                    DiagnosticKind::NoMatchingMember,
                    self.location(target),
                    format!(
                        "no member of '{source_name}' maps to '{}.{}'",
                        self.target.simple_name(),
                        target.name
                    ),
                ),
                several => sink.report(
                    DiagnosticKind::NoMatchingMember,
                    self.location(target),
                    format!(
                        "'{}.{}' is ambiguous between {} members of '{source_name}': {}",
                        self.target.simple_name(),
                        target.name,
                        several.len(),
                        several
                            .iter()
                            .map(|s| s.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                ),
            }
        }
        matches
    }

    fn candidates(
        &self,
        target: &MemberDescriptor,
        sources: &[&'a MemberDescriptor],
    ) -> Vec<&'a MemberDescriptor> {
        let source_name = self.source.name.as_str();
        let target_name = self.target.name.as_str();

        if let Some(wanted) = self.target_index.rename_for(&target.name, source_name) {
            return sources.iter().copied().filter(|s| s.name == wanted).collect();
        }

        let redirected: Vec<_> = sources
            .iter()
            .copied()
            .filter(|s| {
                self.source_index.rename_for(&s.name, target_name) == Some(target.name.as_str())
            })
            .collect();
        if !redirected.is_empty() {
            return redirected;
        }

        sources
            .iter()
            .copied()
            .filter(|s| {
                s.name == target.name
                    && self.source_index.rename_for(&s.name, target_name).is_none()
            })
            .collect()
    }

    fn location(&self, member: &MemberDescriptor) -> Location {
        Location::new(self.target.file.clone(), member.range.or(self.target.range))
    }
}
