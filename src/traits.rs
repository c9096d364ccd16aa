//! Filter contracts: format-specific parse, write and merge.
//!
//! Both traits are object safe so the [`crate::registry::FilterRegistry`] can
//! hand out boxed filters. Filters hold no mutable state and are `Send + Sync`.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Cursor, Read, Write},
    path::Path,
};

use crate::{
    error::Error,
    options::FilterOptions,
    types::{LanguageBundle, LanguageBundles},
};

/// A filter for formats holding one bundle per file.
///
/// # Example
///
/// ```rust,no_run
/// use bundlesync::{FilterOptions, formats::CsvFilter, traits::ResourceFilter};
/// use std::path::Path;
///
/// let filter = CsvFilter;
/// let options = FilterOptions::new();
/// let bundle = filter.read_from(Path::new("messages.csv"), &options)?;
/// filter.write_to(Path::new("messages_fr.csv"), &bundle, &options)?;
/// # Ok::<(), bundlesync::Error>(())
/// ```
pub trait ResourceFilter: Send + Sync {
    /// Filter identifier, upper case.
    fn id(&self) -> &'static str;

    /// Parses the resource data into a bundle.
    fn parse(&self, reader: &mut dyn Read, options: &FilterOptions)
    -> Result<LanguageBundle, Error>;

    /// Renders the bundle's strings in canonical order, replacing the destination contents.
    fn write(
        &self,
        writer: &mut dyn Write,
        bundle: &LanguageBundle,
        options: &FilterOptions,
    ) -> Result<(), Error>;

    /// Whether [`ResourceFilter::merge`] is implemented.
    fn supports_merge(&self) -> bool {
        false
    }

    /// Rewrites the base resource, substituting values for keys present in the
    /// bundle and copying everything else through unchanged.
    fn merge(
        &self,
        _base: &mut dyn Read,
        _writer: &mut dyn Write,
        _bundle: &LanguageBundle,
        _options: &FilterOptions,
    ) -> Result<(), Error> {
        Err(Error::UnsupportedOperation(format!(
            "{} filter does not support merge",
            self.id()
        )))
    }

    /// Parse from a file path.
    fn read_from(&self, path: &Path, options: &FilterOptions) -> Result<LanguageBundle, Error> {
        let mut reader = BufReader::new(File::open(path)?);
        self.parse(&mut reader, options)
    }

    /// Parse from a string.
    fn parse_str(&self, s: &str, options: &FilterOptions) -> Result<LanguageBundle, Error> {
        self.parse(&mut Cursor::new(s.as_bytes()), options)
    }

    /// Write to a file path.
    fn write_to(
        &self,
        path: &Path,
        bundle: &LanguageBundle,
        options: &FilterOptions,
    ) -> Result<(), Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer, bundle, options)?;
        writer.flush()?;
        Ok(())
    }

    /// Merge the bundle into the base file, writing the result to `path`.
    fn merge_to(
        &self,
        base_path: &Path,
        path: &Path,
        bundle: &LanguageBundle,
        options: &FilterOptions,
    ) -> Result<(), Error> {
        let mut base = BufReader::new(File::open(base_path)?);
        let mut writer = BufWriter::new(File::create(path)?);
        self.merge(&mut base, &mut writer, bundle, options)?;
        writer.flush()?;
        Ok(())
    }
}

/// A filter for formats holding several named bundles (modules) per file.
pub trait MultiBundleResourceFilter: Send + Sync {
    /// Filter identifier, upper case.
    fn id(&self) -> &'static str;

    /// Parses the resource data into bundles keyed by module name.
    fn parse(
        &self,
        reader: &mut dyn Read,
        options: &FilterOptions,
    ) -> Result<LanguageBundles, Error>;

    /// Renders modules in ascending name order, strings in canonical order.
    fn write(
        &self,
        writer: &mut dyn Write,
        bundles: &LanguageBundles,
        options: &FilterOptions,
    ) -> Result<(), Error>;

    /// Whether [`MultiBundleResourceFilter::merge`] is implemented.
    fn supports_merge(&self) -> bool {
        false
    }

    /// Rewrites the base resource row by row using each row's module bundle.
    fn merge(
        &self,
        _base: &mut dyn Read,
        _writer: &mut dyn Write,
        _bundles: &LanguageBundles,
        _options: &FilterOptions,
    ) -> Result<(), Error> {
        Err(Error::UnsupportedOperation(format!(
            "{} filter does not support merge",
            self.id()
        )))
    }

    /// Parse from a file path.
    fn read_from(&self, path: &Path, options: &FilterOptions) -> Result<LanguageBundles, Error> {
        let mut reader = BufReader::new(File::open(path)?);
        self.parse(&mut reader, options)
    }

    /// Write to a file path.
    fn write_to(
        &self,
        path: &Path,
        bundles: &LanguageBundles,
        options: &FilterOptions,
    ) -> Result<(), Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer, bundles, options)?;
        writer.flush()?;
        Ok(())
    }
}
