//! The translation service collaborator.
//!
//! No transport ships with this crate; callers implement [`TranslationService`]
//! over their own client and pass it to [`crate::sync::Exporter`] and
//! [`crate::sync::Importer`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    content::{NewResourceEntry, ResourceEntry},
    error::Error,
};

/// Languages of a service bundle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct BundleInfo {
    pub source_language: String,
    #[serde(default)]
    pub target_languages: BTreeSet<String>,
}

impl BundleInfo {
    /// Whether the bundle holds `language`, as source or target.
    pub fn has_language(&self, language: &str) -> bool {
        self.source_language == language || self.target_languages.contains(language)
    }
}

/// Operations the sync passes need from the translation service.
///
/// Implementations report failures as [`Error::Service`].
pub trait TranslationService {
    fn list_bundle_ids(&self) -> Result<BTreeSet<String>, Error>;

    fn bundle_info(&self, bundle_id: &str) -> Result<BundleInfo, Error>;

    /// Entries of one bundle in one language, keyed by resource key.
    fn resource_entries(
        &self,
        bundle_id: &str,
        language: &str,
    ) -> Result<BTreeMap<String, ResourceEntry>, Error>;

    fn create_bundle(
        &self,
        bundle_id: &str,
        source_language: &str,
        target_languages: &BTreeSet<String>,
        notes: &[String],
        metadata: &HashMap<String, String>,
    ) -> Result<(), Error>;

    fn upload_resource_entries(
        &self,
        bundle_id: &str,
        language: &str,
        entries: &BTreeMap<String, NewResourceEntry>,
    ) -> Result<(), Error>;
}
