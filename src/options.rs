//! Options controlling a filter's behavior for one parse/write/merge call.

use std::collections::HashMap;

use unic_langid::LanguageIdentifier;

/// Options passed to every [`crate::traits::ResourceFilter`] and
/// [`crate::traits::MultiBundleResourceFilter`] operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterOptions {
    /// Language of the resource contents being processed, if known.
    pub content_locale: Option<LanguageIdentifier>,
    /// Filter implementation specific parameters. Built-in filters ignore them.
    pub custom_params: HashMap<String, String>,
}

impl FilterOptions {
    /// Creates default filter options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the content locale.
    pub fn with_content_locale(mut self, content_locale: Option<LanguageIdentifier>) -> Self {
        self.content_locale = content_locale;
        self
    }

    /// Sets the content locale from a language tag; an unparseable tag leaves it unset.
    pub fn with_language_tag(mut self, tag: &str) -> Self {
        self.content_locale = tag.parse().ok();
        self
    }

    /// Adds one custom parameter.
    pub fn with_custom_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_params.insert(key.into(), value.into());
        self
    }

    pub fn custom_param(&self, key: &str) -> Option<&str> {
        self.custom_params.get(key).map(String::as_str)
    }
}
