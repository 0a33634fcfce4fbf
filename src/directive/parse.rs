//! Parser from raw annotations to typed directives.
//!
//! Arguments are kept in the source form the exporter saw, so a type may be
//! written as `typeof(App.User)`, `"App.User"` or `App.User`, and a member
//! name as `nameof(User.Id)` or `"Id"`.

use crate::config::DirectiveConfig;
use crate::descriptor::AttributeInfo;
use crate::types::Direction;

/// Named arguments that scope a member directive to one other-side type
const SCOPE_ARGUMENTS: &[&str] = &["SourceTypeName", "TargetTypeName", "SourceType", "TargetType"];

/// Named arguments carrying the other-side member name
const NAME_ARGUMENTS: &[&str] = &["SourcePropertyName", "TargetPropertyName"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDirective {
    Declaration {
        other: String,
        direction: Direction,
    },
    Ignore {
        scope: Option<String>,
    },
    Rename {
        name: String,
        scope: Option<String>,
    },
    Converter {
        converter: String,
        parameters: Vec<String>,
        scope: Option<String>,
    },
}

/// Result of looking at one annotation: not ours, ours and valid, or ours but malformed
pub type ParseOutcome = Option<Result<ParsedDirective, String>>;

pub struct DirectiveParser<'a> {
    config: &'a DirectiveConfig,
}

impl<'a> DirectiveParser<'a> {
    pub fn new(config: &'a DirectiveConfig) -> Self {
        Self { config }
    }

    fn is(&self, attr: &AttributeInfo, name: &str) -> bool {
        attr.is_named(name, &self.config.root_namespace)
    }

    /// True for any of the three declaration annotations, parseable or not
    pub fn is_declaration(&self, attr: &AttributeInfo) -> bool {
        self.is(attr, &self.config.map_attribute)
            || self.is(attr, &self.config.map_from_attribute)
            || self.is(attr, &self.config.map_to_attribute)
    }

    /// Parse an annotation found on a type
    pub fn parse_type_attribute(&self, attr: &AttributeInfo) -> ParseOutcome {
        let fixed = if self.is(attr, &self.config.map_from_attribute) {
            Some(Direction::From)
        } else if self.is(attr, &self.config.map_to_attribute) {
            Some(Direction::To)
        } else if self.is(attr, &self.config.map_attribute) {
            None
        } else {
            return None;
        };

        let raw_type = attr
            .arguments
            .first()
            .map(String::as_str)
            .or_else(|| attr.any_named_argument(&["TargetType", "SourceType"]));
        let Some(other) = raw_type.and_then(parse_type_argument) else {
            return Some(Err(format!(
                "'{}' needs a type argument such as typeof(OtherType)",
                attr.name
            )));
        };

        let direction = match fixed {
            Some(direction) => direction,
            None => {
                let raw = attr
                    .arguments
                    .get(1)
                    .map(String::as_str)
                    .or_else(|| attr.get_named_argument("Direction"));
                match raw {
                    None => Direction::From,
                    Some(raw) => match raw.parse::<Direction>() {
                        Ok(direction) => direction,
                        Err(_) => {
                            return Some(Err(format!(
                                "'{raw}' is not a mapping direction, expected MappingDirection.From or MappingDirection.To"
                            )));
                        }
                    },
                }
            }
        };

        Some(Ok(ParsedDirective::Declaration { other, direction }))
    }

    /// Parse an annotation found on a member
    pub fn parse_member_attribute(&self, attr: &AttributeInfo) -> ParseOutcome {
        if self.is(attr, &self.config.ignore_attribute) {
            let scope = match self.scope(attr, attr.arguments.first().map(String::as_str)) {
                Ok(scope) => scope,
                Err(reason) => return Some(Err(reason)),
            };
            return Some(Ok(ParsedDirective::Ignore { scope }));
        }

        if self.is(attr, &self.config.property_attribute) {
            let raw_name = attr
                .any_named_argument(NAME_ARGUMENTS)
                .or_else(|| attr.arguments.first().map(String::as_str));
            let Some(name) = raw_name.and_then(parse_name_argument) else {
                return Some(Err(format!(
                    "'{}' needs SourcePropertyName or TargetPropertyName",
                    attr.name
                )));
            };
            let scope = match self.scope(attr, None) {
                Ok(scope) => scope,
                Err(reason) => return Some(Err(reason)),
            };
            return Some(Ok(ParsedDirective::Rename { name, scope }));
        }

        if self.is(attr, &self.config.converter_attribute) {
            let raw_converter = attr
                .arguments
                .first()
                .map(String::as_str)
                .or_else(|| attr.get_named_argument("Converter"));
            let Some(converter) = raw_converter.and_then(parse_type_argument) else {
                return Some(Err(format!(
                    "'{}' needs a converter type such as typeof(MyConverter)",
                    attr.name
                )));
            };

            let mut parameters = Vec::new();
            for raw in attr.arguments.iter().skip(1) {
                parameters.extend(parse_literal_list(raw));
            }
            if let Some(raw) = attr.get_named_argument("ConverterParameters") {
                parameters.extend(parse_literal_list(raw));
            }

            let scope = match self.scope(attr, None) {
                Ok(scope) => scope,
                Err(reason) => return Some(Err(reason)),
            };
            return Some(Ok(ParsedDirective::Converter {
                converter,
                parameters,
                scope,
            }));
        }

        None
    }

    fn scope(&self, attr: &AttributeInfo, positional: Option<&str>) -> Result<Option<String>, String> {
        match attr.any_named_argument(SCOPE_ARGUMENTS).or(positional) {
            None => Ok(None),
            Some(raw) => parse_type_argument(raw)
                .map(Some)
                .ok_or_else(|| format!("'{raw}' is not a type reference")),
        }
    }
}

/// `typeof(App.User)`, `"App.User"`, `App.User` → `App.User`
pub fn parse_type_argument(raw: &str) -> Option<String> {
    let inner = unwrap_call(raw.trim(), "typeof")
        .or_else(|| unwrap_call(raw.trim(), "nameof"))
        .unwrap_or_else(|| raw.trim());
    let inner = unquote(inner).unwrap_or(inner).trim();

    let valid = !inner.is_empty()
        && inner
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '<' | '>' | ','));
    valid.then(|| inner.to_string())
}

/// `nameof(User.Id)` → `Id`, `"Id"` → `Id`, `Id` → `Id`
pub fn parse_name_argument(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let name = if let Some(inner) = unwrap_call(raw, "nameof") {
        inner.rsplit('.').next().unwrap_or(inner).trim()
    } else if let Some(inner) = unquote(raw) {
        inner
    } else {
        raw
    };

    let valid = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    valid.then(|| name.to_string())
}

/// Split an array initializer (`new object[] { 1, "a", null }`) or a single
/// literal into literals in source form, dropping `null`.
pub fn parse_literal_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let body = match (raw.find('{'), raw.rfind('}')) {
        (Some(open), Some(close)) if open < close && (raw.starts_with("new") || open == 0) => {
            &raw[open + 1..close]
        }
        _ => raw,
    };

    split_top_level(body)
        .into_iter()
        .map(str::trim)
        .filter(|literal| !literal.is_empty() && *literal != "null")
        .map(str::to_string)
        .collect()
}

fn unwrap_call<'s>(raw: &'s str, function: &str) -> Option<&'s str> {
    raw.strip_prefix(function)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
        .map(str::trim)
}

fn unquote(raw: &str) -> Option<&str> {
    let raw = raw.strip_prefix('@').unwrap_or(raw);
    raw.strip_prefix('"')?.strip_suffix('"')
}

/// Split on commas that are not inside quotes or nested brackets
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}
