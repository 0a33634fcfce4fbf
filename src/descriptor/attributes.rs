//! Raw annotation (attribute) data as exported by the metadata front end
//!
//! Annotations arrive exactly as written on the declaration: a name plus its
//! positional and named arguments in source form. They are interpreted once by
//! [`crate::directive`] and never inspected again during resolution.
//!
//! # Example
//!
//! ```csharp
//! [MapFrom(typeof(User))]
//! public partial class UserViewModel {
//!     [MapProperty(SourcePropertyName = nameof(User.Id))]
//!     [MapTypeConverter(typeof(IdConverter))]
//!     public string Key { get; }
//! }
//! ```

use crate::types::Range;
use serde::{Deserialize, Serialize};

/// A single annotation applied to a type or member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    /// Annotation name as written (e.g., "MapFrom", "MapTo.MapProperty", "IgnorePropertyAttribute")
    pub name: String,

    /// Positional arguments in source form
    /// Example: `[Map(typeof(User), MappingDirection.To)]` → ["typeof(User)", "MappingDirection.To"]
    #[serde(default)]
    pub arguments: Vec<String>,

    /// Named arguments (property = value) in source form
    /// Example: `[MapProperty(SourcePropertyName = "Id")]` → {("SourcePropertyName", "\"Id\"")}
    #[serde(default)]
    pub named_arguments: Vec<(String, String)>,

    /// Source location of the annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

impl AttributeInfo {
    /// Create a new annotation without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            named_arguments: Vec::new(),
            range: None,
        }
    }

    /// Add a positional argument
    pub fn with_argument(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    /// Add a named argument
    pub fn with_named_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.named_arguments.push((name.into(), value.into()));
        self
    }

    /// Get a named argument value by name
    pub fn get_named_argument(&self, name: &str) -> Option<&str> {
        self.named_arguments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// First named argument among `names` that is present
    pub fn any_named_argument(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.get_named_argument(name))
    }

    /// Check whether this annotation is `short_name`, tolerating the
    /// `Attribute` suffix and a `root_namespace.` (or `global::root_namespace.`) qualifier.
    ///
    /// `Map`, `MapAttribute`, `MapTo.Map` and `global::MapTo.MapAttribute` all
    /// match `is_named("Map", "MapTo")`.
    pub fn is_named(&self, short_name: &str, root_namespace: &str) -> bool {
        let name = self.name.trim();
        let name = name.strip_prefix("global::").unwrap_or(name);
        let name = name
            .strip_prefix(root_namespace)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name);
        let name = name.strip_suffix("Attribute").unwrap_or(name);
        name == short_name
    }
}
