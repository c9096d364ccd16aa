//! Core, format-agnostic types for bundlesync.
//! Filters parse into these; filters render these.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    fmt::Display,
};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Multi-bundle container: module name to bundle, iterated in ascending module order.
pub type LanguageBundles = BTreeMap<String, LanguageBundle>;

/// A single translatable key/value unit.
///
/// Fields are private; a `ResourceString` is assembled with [`ResourceString::new`]
/// and the `with_*` methods and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceString {
    key: String,
    value: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    source_value: Option<String>,

    /// `None` means "unordered"; the bundle builder may assign one.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    sequence_number: Option<u32>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    notes: Vec<String>,

    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl ResourceString {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            source_value: None,
            sequence_number: None,
            notes: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_source_value(mut self, source_value: Option<String>) -> Self {
        self.source_value = source_value;
        self
    }

    pub fn with_sequence_number(mut self, sequence_number: Option<u32>) -> Self {
        self.sequence_number = sequence_number;
        self
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn source_value(&self) -> Option<&str> {
        self.source_value.as_deref()
    }

    pub fn sequence_number(&self) -> Option<u32> {
        self.sequence_number
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Canonical output order: numbered strings first, ascending; ties and
    /// unnumbered strings fall back to key order.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        let by_sequence = match (self.sequence_number, other.sequence_number) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_sequence.then_with(|| self.key.cmp(&other.key))
    }
}

impl Display for ResourceString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.sequence_number {
            Some(seq) => write!(f, "#{} Key={} Value={}", seq, self.key, self.value),
            None => write!(f, "#- Key={} Value={}", self.key, self.value),
        }
    }
}

/// An immutable snapshot of resource strings for one language.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct LanguageBundle {
    resource_strings: Vec<ResourceString>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    notes: Vec<String>,

    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde(default)]
    metadata: HashMap<String, String>,

    /// Language code written inside the file content, when it differs from the
    /// file-name language id.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    embedded_language_code: Option<String>,
}

impl LanguageBundle {
    /// Resource strings in the order they were added to the builder.
    pub fn resource_strings(&self) -> &[ResourceString] {
        &self.resource_strings
    }

    /// Resource strings in canonical output order.
    pub fn sorted_resource_strings(&self) -> Vec<&ResourceString> {
        let mut sorted: Vec<&ResourceString> = self.resource_strings.iter().collect();
        sorted.sort_by(|a, b| a.canonical_cmp(b));
        sorted
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn embedded_language_code(&self) -> Option<&str> {
        self.embedded_language_code.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&ResourceString> {
        self.resource_strings.iter().find(|rs| rs.key == key)
    }

    pub fn len(&self) -> usize {
        self.resource_strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resource_strings.is_empty()
    }

    /// Key to current value lookup, used by merge passes.
    pub fn key_value_map(&self) -> HashMap<&str, &str> {
        self.resource_strings
            .iter()
            .map(|rs| (rs.key.as_str(), rs.value.as_str()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sequencing {
    Auto { next: u32 },
    Caller,
}

/// Accumulates resource strings and bundle-level data, then freezes them
/// into a [`LanguageBundle`].
///
/// # Example
///
/// ```rust
/// use bundlesync::types::{LanguageBundleBuilder, ResourceString};
///
/// let mut builder = LanguageBundleBuilder::from_parsed_file();
/// builder.add_resource_string(ResourceString::new("hello", "Hello"));
/// builder.add_resource_string(ResourceString::new("bye", "Goodbye"));
/// let bundle = builder.build();
/// assert_eq!(bundle.get("bye").unwrap().sequence_number(), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct LanguageBundleBuilder {
    resource_strings: Vec<ResourceString>,
    index: HashMap<String, usize>,
    notes: Vec<String>,
    metadata: HashMap<String, String>,
    embedded_language_code: Option<String>,
    sequencing: Sequencing,
}

impl LanguageBundleBuilder {
    fn with_sequencing(sequencing: Sequencing) -> Self {
        Self {
            resource_strings: Vec::new(),
            index: HashMap::new(),
            notes: Vec::new(),
            metadata: HashMap::new(),
            embedded_language_code: None,
            sequencing,
        }
    }

    /// Builder for records read from a file: sequence numbers are assigned
    /// 1, 2, 3... in insertion order, replacing any value the caller set.
    pub fn from_parsed_file() -> Self {
        Self::with_sequencing(Sequencing::Auto { next: 1 })
    }

    /// Builder for entries arriving from the translation service: sequence
    /// numbers are kept exactly as supplied.
    pub fn from_service_data() -> Self {
        Self::with_sequencing(Sequencing::Caller)
    }

    /// Adds a resource string. A repeated key replaces the earlier string but
    /// keeps its position and sequence number.
    pub fn add_resource_string(&mut self, resource_string: ResourceString) -> &mut Self {
        if let Some(&pos) = self.index.get(&resource_string.key) {
            warn!(key = %resource_string.key, "duplicate resource key, later value wins");
            let sequence_number = self.resource_strings[pos].sequence_number;
            self.resource_strings[pos] = match self.sequencing {
                Sequencing::Auto { .. } => resource_string.with_sequence_number(sequence_number),
                Sequencing::Caller => resource_string,
            };
            return self;
        }

        let resource_string = match &mut self.sequencing {
            Sequencing::Auto { next } => {
                let seq = *next;
                *next += 1;
                resource_string.with_sequence_number(Some(seq))
            }
            Sequencing::Caller => resource_string,
        };
        self.index
            .insert(resource_string.key.clone(), self.resource_strings.len());
        self.resource_strings.push(resource_string);
        self
    }

    /// Shorthand for adding a plain key/value pair.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.add_resource_string(ResourceString::new(key, value))
    }

    pub fn add_note(&mut self, note: impl Into<String>) -> &mut Self {
        self.notes.push(note.into());
        self
    }

    pub fn add_notes<I: IntoIterator<Item = String>>(&mut self, notes: I) -> &mut Self {
        self.notes.extend(notes);
        self
    }

    pub fn insert_metadata(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn embedded_language_code(&mut self, code: Option<String>) -> &mut Self {
        self.embedded_language_code = code;
        self
    }

    pub fn len(&self) -> usize {
        self.resource_strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resource_strings.is_empty()
    }

    /// Consumes the builder and returns the frozen bundle.
    pub fn build(self) -> LanguageBundle {
        LanguageBundle {
            resource_strings: self.resource_strings,
            notes: self.notes,
            metadata: self.metadata,
            embedded_language_code: self.embedded_language_code,
        }
    }
}
