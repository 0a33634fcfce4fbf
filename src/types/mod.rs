use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source span of a declaration or annotation, as reported by the metadata front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

impl Range {
    pub fn new(start_line: u32, start_column: u16, end_line: u32, end_column: u16) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

/// Shape of a declared data-record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Mutable class with settable members
    #[default]
    Class,
    /// Positional record, populated through its primary constructor
    Record,
}

/// Direction of a mapping declaration, relative to the annotated shape.
///
/// `From` means the other shape is the data source, `To` means the other
/// shape receives the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    From,
    To,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::From => "From",
            Direction::To => "To",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = &'static str;

    /// Accepts `From`, `MappingDirection.From` and fully qualified enum paths.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let last = s.trim().rsplit('.').next().unwrap_or_default();
        match last {
            "From" | "from" => Ok(Direction::From),
            "To" | "to" => Ok(Direction::To),
            _ => Err("Invalid mapping direction"),
        }
    }
}

/// Declared value type of a member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    /// Language keyword type (`int`, `string`, `object`, ...)
    Primitive(String),
    /// Fully qualified user or library type
    Named(String),
    /// Enumerable of an element type
    Enumerable(Box<TypeRef>),
}

impl TypeRef {
    pub fn primitive(name: impl Into<String>) -> Self {
        TypeRef::Primitive(name.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn enumerable(element: TypeRef) -> Self {
        TypeRef::Enumerable(Box::new(element))
    }

    pub fn is_enumerable(&self) -> bool {
        matches!(self, TypeRef::Enumerable(_))
    }

    /// Element type for enumerables, the type itself otherwise.
    ///
    /// Only one level is unwrapped.
    pub fn element(&self) -> &TypeRef {
        match self {
            TypeRef::Enumerable(inner) => inner,
            other => other,
        }
    }

    /// Fully qualified name when this is a named type
    pub fn named_type(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Namespace this type lives in, if it needs one to be referenced.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            TypeRef::Primitive(_) => None,
            TypeRef::Named(name) => namespace_of(name),
            TypeRef::Enumerable(inner) => inner.namespace(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(name) | TypeRef::Named(name) => f.write_str(name),
            TypeRef::Enumerable(inner) => write!(f, "IEnumerable<{inner}>"),
        }
    }
}

/// Namespace part of a fully qualified type name, `None` for the global namespace.
pub fn namespace_of(qualified: &str) -> Option<&str> {
    let qualified = qualified.strip_prefix("global::").unwrap_or(qualified);
    qualified
        .rsplit_once('.')
        .map(|(ns, _)| ns)
        .filter(|ns| !ns.is_empty())
}

/// Last segment of a fully qualified type name.
pub fn simple_name(qualified: &str) -> &str {
    let qualified = qualified.strip_prefix("global::").unwrap_or(qualified);
    qualified
        .rsplit_once('.')
        .map_or(qualified, |(_, name)| name)
}
