//! Resolves filter identifiers to filter instances.
//!
//! Providers are composed explicitly: the registry starts with the
//! [`BuiltinFilterProvider`] and callers append their own with
//! [`FilterRegistry::with_provider`]. Lookups ask providers in order and the
//! first one advertising the identifier wins.

use std::fmt::{self, Debug, Formatter};

use crate::{
    error::Error,
    formats::{
        AndroidStringsFilter, AppleStringsFilter, CsvFilter, FilterType, GlobalizeJsFilter,
        JavaPropertiesFilter, JsonFilter, MultiBundleCsvFilter,
    },
    traits::{MultiBundleResourceFilter, ResourceFilter},
};

/// Whether a filter handles one bundle or several bundles per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Single,
    Multi,
}

/// A filter advertised by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterInfo {
    pub kind: FilterKind,
    pub id: String,
}

impl FilterInfo {
    pub fn new(kind: FilterKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    fn matches(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id.trim())
    }
}

/// A source of filter implementations.
///
/// `resource_filter` and `multi_bundle_resource_filter` are only called with
/// identifiers exactly as listed by `available_filters`.
pub trait FilterProvider: Send + Sync {
    /// Filters this provider can instantiate.
    fn available_filters(&self) -> Vec<FilterInfo>;

    fn resource_filter(&self, id: &str) -> Option<Box<dyn ResourceFilter>>;

    fn multi_bundle_resource_filter(&self, id: &str) -> Option<Box<dyn MultiBundleResourceFilter>>;
}

/// Provides the filters shipped with this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFilterProvider;

impl FilterProvider for BuiltinFilterProvider {
    fn available_filters(&self) -> Vec<FilterInfo> {
        FilterType::ALL
            .into_iter()
            .map(|t| {
                let kind = if t.is_multi_bundle() {
                    FilterKind::Multi
                } else {
                    FilterKind::Single
                };
                FilterInfo::new(kind, t.id())
            })
            .collect()
    }

    fn resource_filter(&self, id: &str) -> Option<Box<dyn ResourceFilter>> {
        match id.parse::<FilterType>().ok()? {
            FilterType::Android => Some(Box::new(AndroidStringsFilter)),
            FilterType::Csv => Some(Box::new(CsvFilter)),
            FilterType::GlobalizeJs => Some(Box::new(GlobalizeJsFilter)),
            FilterType::Ios => Some(Box::new(AppleStringsFilter)),
            FilterType::Java => Some(Box::new(JavaPropertiesFilter::latin1())),
            FilterType::JavaUtf8 => Some(Box::new(JavaPropertiesFilter::utf8())),
            FilterType::Json => Some(Box::new(JsonFilter)),
            FilterType::MultiCsv => None,
        }
    }

    fn multi_bundle_resource_filter(&self, id: &str) -> Option<Box<dyn MultiBundleResourceFilter>> {
        match id.parse::<FilterType>().ok()? {
            FilterType::MultiCsv => Some(Box::new(MultiBundleCsvFilter)),
            _ => None,
        }
    }
}

/// A resolved filter of either kind.
pub enum Filter {
    Single(Box<dyn ResourceFilter>),
    Multi(Box<dyn MultiBundleResourceFilter>),
}

impl Filter {
    pub fn id(&self) -> &'static str {
        match self {
            Filter::Single(filter) => filter.id(),
            Filter::Multi(filter) => filter.id(),
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Single(_) => FilterKind::Single,
            Filter::Multi(_) => FilterKind::Multi,
        }
    }
}

impl Debug for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Single(filter) => f.debug_tuple("Single").field(&filter.id()).finish(),
            Filter::Multi(filter) => f.debug_tuple("Multi").field(&filter.id()).finish(),
        }
    }
}

/// Ordered list of filter providers, built-ins first.
pub struct FilterRegistry {
    providers: Vec<Box<dyn FilterProvider>>,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for FilterRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("providers", &self.providers.len())
            .field("filters", &self.available_filter_ids())
            .finish()
    }
}

impl FilterRegistry {
    /// A registry holding only the built-in filters.
    pub fn new() -> Self {
        Self {
            providers: vec![Box::new(BuiltinFilterProvider)],
        }
    }

    /// Appends an external provider, queried after every provider already registered.
    pub fn with_provider(mut self, provider: impl FilterProvider + 'static) -> Self {
        self.register(Box::new(provider));
        self
    }

    pub fn register(&mut self, provider: Box<dyn FilterProvider>) {
        self.providers.push(provider);
    }

    /// First provider advertising `id`, with the exact advertised info.
    fn lookup(&self, id: &str) -> Option<(&dyn FilterProvider, FilterInfo)> {
        self.providers.iter().find_map(|provider| {
            provider
                .available_filters()
                .into_iter()
                .find(|info| info.matches(id))
                .map(|info| (provider.as_ref(), info))
        })
    }

    /// Describes the filter registered under `id`, if any.
    pub fn filter_info(&self, id: &str) -> Option<FilterInfo> {
        self.lookup(id).map(|(_, info)| info)
    }

    /// Resolves a single-bundle filter. Multi-bundle identifiers resolve to `None`.
    pub fn resource_filter(&self, id: &str) -> Option<Box<dyn ResourceFilter>> {
        match self.lookup(id)? {
            (provider, info) if info.kind == FilterKind::Single => provider.resource_filter(&info.id),
            _ => None,
        }
    }

    /// Resolves a multi-bundle filter. Single-bundle identifiers resolve to `None`.
    pub fn multi_bundle_resource_filter(
        &self,
        id: &str,
    ) -> Option<Box<dyn MultiBundleResourceFilter>> {
        match self.lookup(id)? {
            (provider, info) if info.kind == FilterKind::Multi => {
                provider.multi_bundle_resource_filter(&info.id)
            }
            _ => None,
        }
    }

    /// Resolves a filter of either kind.
    pub fn get(&self, id: &str) -> Option<Filter> {
        let (provider, info) = self.lookup(id)?;
        match info.kind {
            FilterKind::Single => provider.resource_filter(&info.id).map(Filter::Single),
            FilterKind::Multi => provider
                .multi_bundle_resource_filter(&info.id)
                .map(Filter::Multi),
        }
    }

    /// Like [`FilterRegistry::get`], but an unknown identifier is an error.
    pub fn require(&self, id: &str) -> Result<Filter, Error> {
        self.get(id)
            .ok_or_else(|| Error::UnknownFilterType(id.to_string()))
    }

    /// Resolves a single-bundle filter or explains why it cannot.
    pub fn require_resource_filter(&self, id: &str) -> Result<Box<dyn ResourceFilter>, Error> {
        match self.require(id)? {
            Filter::Single(filter) => Ok(filter),
            Filter::Multi(filter) => Err(Error::UnsupportedOperation(format!(
                "{} is a multi-bundle filter",
                filter.id()
            ))),
        }
    }

    /// Identifiers of every registered filter, without duplicates, in lookup order.
    pub fn available_filter_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for info in self.providers.iter().flat_map(|p| p.available_filters()) {
            if !ids.iter().any(|id| info.matches(id)) {
                ids.push(info.id);
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{CSV_FILTER_ID, JAVA_UTF8_FILTER_ID, MULTI_CSV_FILTER_ID};

    #[test]
    fn test_builtin_single_filters() {
        let registry = FilterRegistry::new();
        for id in ["ANDROID", "CSV", "GLOBALIZEJS", "IOS", "JAVA", "JAVAUTF8", "JSON"] {
            let filter = registry.resource_filter(id).unwrap();
            assert_eq!(filter.id(), id);
            assert!(registry.multi_bundle_resource_filter(id).is_none());
        }
    }

    #[test]
    fn test_builtin_multi_filter() {
        let registry = FilterRegistry::new();
        let filter = registry.multi_bundle_resource_filter("CSV-MULTI").unwrap();
        assert_eq!(filter.id(), MULTI_CSV_FILTER_ID);
        assert!(registry.resource_filter("CSV-MULTI").is_none());
        assert_eq!(
            registry.filter_info("csv-multi"),
            Some(FilterInfo::new(FilterKind::Multi, MULTI_CSV_FILTER_ID))
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = FilterRegistry::new();
        assert_eq!(registry.resource_filter("javautf8").unwrap().id(), JAVA_UTF8_FILTER_ID);
        assert_eq!(registry.get(" csv ").unwrap().id(), CSV_FILTER_ID);
    }

    #[test]
    fn test_unknown_identifier() {
        let registry = FilterRegistry::new();
        assert!(registry.get("XLIFF").is_none());
        assert!(registry.filter_info("XLIFF").is_none());
        assert!(matches!(
            registry.require("XLIFF"),
            Err(Error::UnknownFilterType(id)) if id == "XLIFF"
        ));
    }

    #[test]
    fn test_require_resource_filter_rejects_multi() {
        let registry = FilterRegistry::new();
        assert!(registry.require_resource_filter("JSON").is_ok());
        assert!(matches!(
            registry.require_resource_filter("CSV-MULTI"),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_available_filter_ids() {
        let ids = FilterRegistry::new().available_filter_ids();
        assert_eq!(
            ids,
            vec!["ANDROID", "CSV", "CSV-MULTI", "GLOBALIZEJS", "IOS", "JAVA", "JAVAUTF8", "JSON"]
        );
    }

    #[test]
    fn test_get_kind() {
        let registry = FilterRegistry::new();
        assert_eq!(registry.get("CSV").unwrap().kind(), FilterKind::Single);
        assert_eq!(registry.get("CSV-MULTI").unwrap().kind(), FilterKind::Multi);
        assert_eq!(format!("{:?}", registry.get("JSON").unwrap()), "Single(\"JSON\")");
    }
}
