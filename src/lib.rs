#![forbid(unsafe_code)]
//! Resource bundle filters and output layout engine for keeping localization
//! files in sync with a translation service.
//!
//! Filters parse source files into [`LanguageBundle`]s, write bundles back
//! out, and merge translations into a copy of the source file. The
//! [`FilterRegistry`] hands out filters by identifier, and the
//! [`layout::BundleLayoutResolver`] decides where each translated file goes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bundlesync::{FilterOptions, FilterRegistry, LanguageBundleBuilder};
//! use std::path::Path;
//!
//! let registry = FilterRegistry::new();
//! let filter = registry.require_resource_filter("JAVA")?;
//! let options = FilterOptions::new().with_language_tag("en");
//!
//! let source = filter.read_from(Path::new("res/messages.properties"), &options)?;
//! println!("{} strings", source.len());
//!
//! let mut french = LanguageBundleBuilder::from_service_data();
//! french.add("hello", "Bonjour");
//! filter.merge_to(
//!     Path::new("res/messages.properties"),
//!     Path::new("res/messages_fr.properties"),
//!     &french.build(),
//!     &options,
//! )?;
//! # Ok::<(), bundlesync::Error>(())
//! ```
//!
//! # Supported Formats
//!
//! - **`CSV`**: `key,value` rows
//! - **`CSV-MULTI`**: `module,key,value` rows, one bundle per module
//! - **`JSON`**: nested objects flattened to JSONPath-style keys
//! - **`GLOBALIZEJS`**: JSON wrapped in a top-level language object
//! - **`JAVA`** / **`JAVAUTF8`**: Java `.properties`, ISO-8859-1 or UTF-8
//! - **`ANDROID`**: Android `strings.xml`
//! - **`IOS`**: Apple `.strings`

pub mod config;
pub mod content;
pub mod error;
pub mod formats;
pub mod language;
pub mod layout;
pub mod mapper;
pub mod options;
pub mod registry;
pub mod service;
pub mod sync;
pub mod text;
pub mod traits;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    config::BundleSetConfig,
    content::{OutputContentOption, ResourceEntry},
    error::Error,
    formats::FilterType,
    language::{LanguageIdResolver, LanguageIdStyle},
    layout::{BundleLayout, BundleLayoutResolver},
    mapper::RegexMapper,
    options::FilterOptions,
    registry::{Filter, FilterInfo, FilterKind, FilterProvider, FilterRegistry},
    traits::{MultiBundleResourceFilter, ResourceFilter},
    types::{LanguageBundle, LanguageBundleBuilder, LanguageBundles, ResourceString},
};
