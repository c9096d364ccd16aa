//! Download and upload passes between source files and the translation service.
//!
//! [`Exporter`] writes one translated file per language next to (or under an
//! output directory mirroring) a source file. [`Importer`] parses a source
//! file and uploads its strings. Both drive single-bundle filters only.

use std::{
    fs::{self, File},
    io::{BufWriter, Cursor, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    config::BundleSetConfig,
    content::{build_language_bundle, entries_from_bundle},
    error::Error,
    layout::BundleLayoutResolver,
    mapper::apply_mappers,
    options::FilterOptions,
    registry::FilterRegistry,
    service::TranslationService,
    traits::ResourceFilter,
};

/// Exports translated bundles from the translation service.
///
/// # Example
///
/// ```rust,no_run
/// use bundlesync::{BundleSetConfig, FilterRegistry, service::TranslationService, sync::Exporter};
/// use std::path::Path;
///
/// fn download(service: &dyn TranslationService) -> Result<(), bundlesync::Error> {
///     let registry = FilterRegistry::new();
///     let config = BundleSetConfig::from_json_str(r#"{"targetLanguages": ["fr", "de"]}"#)?;
///     let exporter = Exporter::new(service, &registry, &config);
///     for path in exporter.export_bundle("messages", Path::new("res/messages.properties"))? {
///         println!("wrote {}", path.display());
///     }
///     Ok(())
/// }
/// ```
pub struct Exporter<'a> {
    service: &'a dyn TranslationService,
    registry: &'a FilterRegistry,
    config: &'a BundleSetConfig,
    layout: BundleLayoutResolver,
    source_root: Option<PathBuf>,
}

impl<'a> Exporter<'a> {
    pub fn new(
        service: &'a dyn TranslationService,
        registry: &'a FilterRegistry,
        config: &'a BundleSetConfig,
    ) -> Self {
        Self {
            service,
            registry,
            config,
            layout: config.layout_resolver(),
            source_root: None,
        }
    }

    /// Directory source files are relative to when re-rooting them under the
    /// configured output directory.
    pub fn with_source_root(mut self, source_root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(source_root.into());
        self
    }

    /// Where the file for `language` goes.
    ///
    /// `sourcePathToTargetMapper` rules rewrite the source path first: the
    /// path relative to the source root when one is known, else the whole path.
    pub fn output_path(&self, source_file: &Path, language: &str) -> Result<PathBuf, Error> {
        let source_language = self.config.source_language.as_str();
        let path = match &self.config.output_dir {
            Some(output_dir) => {
                let relative =
                    self.map_path(&relative_source_path(self.source_root.as_deref(), source_file))?;
                self.layout
                    .output_path_under(output_dir, &relative, source_language, language)
            }
            None => {
                let target = match self.source_root.as_deref().and_then(|root| {
                    source_file.strip_prefix(root).ok().map(|relative| (root, relative))
                }) {
                    Some((root, relative)) => root.join(self.map_path(relative)?),
                    None => self.map_path(source_file)?,
                };
                self.layout.output_path(&target, source_language, language)
            }
        };
        Ok(path)
    }

    fn map_path(&self, path: &Path) -> Result<PathBuf, Error> {
        let mappers = &self.config.source_path_to_target_mapper;
        if mappers.is_empty() {
            return Ok(path.to_path_buf());
        }
        let mapped = apply_mappers(mappers, &path.to_string_lossy())?;
        debug!(from = %path.display(), to = %mapped, "mapped source path");
        Ok(PathBuf::from(mapped))
    }

    /// Exports one language of a bundle. Returns the written path, or `None`
    /// when an existing file was kept because overwriting is disabled.
    pub fn export_language(
        &self,
        bundle_id: &str,
        source_file: &Path,
        language: &str,
    ) -> Result<Option<PathBuf>, Error> {
        let filter = self
            .registry
            .require_resource_filter(&self.config.filter_type)?;
        let output = self.output_path(source_file, language)?;

        if output.exists() {
            if !self.config.overwrite {
                info!(bundle = bundle_id, language, path = %output.display(), "output exists, skipping");
                return Ok(None);
            }
            debug!(path = %output.display(), "overwriting existing output");
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let option = self.config.output_content_option;
        let embedded = self
            .layout
            .language_resolver()
            .embedded_language_id(language);
        let entries = self.service.resource_entries(bundle_id, language)?;
        let bundle = build_language_bundle(&entries, option, Some(embedded));
        let options = FilterOptions::new().with_language_tag(language);

        if option.merges() && filter.supports_merge() {
            // The output may be the source file itself.
            let base = fs::read(source_file)?;
            let mut writer = BufWriter::new(File::create(&output)?);
            filter.merge(&mut Cursor::new(base), &mut writer, &bundle, &options)?;
            writer.flush()?;
        } else {
            if option.merges() {
                debug!(
                    filter = filter.id(),
                    "filter cannot merge, writing translations with fallback"
                );
            }
            filter.write_to(&output, &bundle, &options)?;
        }

        info!(
            bundle = bundle_id,
            language,
            strings = bundle.len(),
            path = %output.display(),
            "exported bundle"
        );
        Ok(Some(output))
    }

    /// Exports every configured language of a bundle the service holds.
    ///
    /// Languages default to the bundle's target languages. The source
    /// language is included when `output_source_language` is set. Languages
    /// the bundle lacks are skipped, as is a bundle the service does not know.
    pub fn export_bundle(&self, bundle_id: &str, source_file: &Path) -> Result<Vec<PathBuf>, Error> {
        if !self.service.list_bundle_ids()?.contains(bundle_id) {
            warn!(bundle = bundle_id, "bundle does not exist in the service, skipping");
            return Ok(Vec::new());
        }

        let info = self.service.bundle_info(bundle_id)?;
        let source_language = self.config.source_language.as_str();
        if info.source_language != source_language {
            warn!(
                bundle = bundle_id,
                bundle_source = %info.source_language,
                configured_source = source_language,
                "source language differs from the configuration"
            );
        }

        let mut languages: Vec<String> = Vec::new();
        if self.config.output_source_language {
            languages.push(source_language.to_string());
        }
        let targets = self
            .config
            .target_languages
            .as_ref()
            .unwrap_or(&info.target_languages);
        languages.extend(targets.iter().filter(|t| *t != source_language).cloned());

        let mut written = Vec::new();
        for language in &languages {
            if !info.has_language(language) {
                warn!(bundle = bundle_id, language = %language, "language does not exist in the bundle, skipping");
                continue;
            }
            if let Some(path) = self.export_language(bundle_id, source_file, language)? {
                written.push(path);
            }
        }
        Ok(written)
    }

    /// Exports the bundle whose id is derived from the source file path.
    pub fn export_source_file(&self, source_file: &Path) -> Result<Vec<PathBuf>, Error> {
        let relative = relative_source_path(self.source_root.as_deref(), source_file);
        let bundle_id = self.config.bundle_id_for(&relative)?;
        self.export_bundle(&bundle_id, source_file)
    }
}

/// Path of `source_file` relative to `source_root`. Files outside the root
/// keep a relative path as-is and reduce an absolute one to its file name.
fn relative_source_path(source_root: Option<&Path>, source_file: &Path) -> PathBuf {
    if let Some(relative) = source_root.and_then(|root| source_file.strip_prefix(root).ok()) {
        return relative.to_path_buf();
    }
    if source_file.is_relative() {
        return source_file.to_path_buf();
    }
    source_file
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_default()
}

/// Uploads source files to the translation service.
pub struct Importer<'a> {
    service: &'a dyn TranslationService,
    registry: &'a FilterRegistry,
    config: &'a BundleSetConfig,
    source_root: Option<PathBuf>,
}

impl<'a> Importer<'a> {
    pub fn new(
        service: &'a dyn TranslationService,
        registry: &'a FilterRegistry,
        config: &'a BundleSetConfig,
    ) -> Self {
        Self {
            service,
            registry,
            config,
            source_root: None,
        }
    }

    /// Directory bundle ids are derived relative to.
    pub fn with_source_root(mut self, source_root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(source_root.into());
        self
    }

    /// Imports a source file under the bundle id derived from its path.
    /// Returns the bundle id and the number of uploaded strings.
    pub fn import_source_file(&self, source_file: &Path) -> Result<(String, usize), Error> {
        let relative = relative_source_path(self.source_root.as_deref(), source_file);
        let bundle_id = self.config.bundle_id_for(&relative)?;
        let uploaded = self.import_file(&bundle_id, source_file)?;
        Ok((bundle_id, uploaded))
    }

    /// Parses `source_file` and uploads its strings as the source language of
    /// `bundle_id`, creating the bundle first when the service lacks it.
    /// Returns the number of uploaded strings.
    pub fn import_file(&self, bundle_id: &str, source_file: &Path) -> Result<usize, Error> {
        let filter: Box<dyn ResourceFilter> = self
            .registry
            .require_resource_filter(&self.config.filter_type)?;
        let source_language = self.config.source_language.as_str();
        let options = FilterOptions::new().with_language_tag(source_language);
        let bundle = filter.read_from(source_file, &options)?;

        if !self.service.list_bundle_ids()?.contains(bundle_id) {
            let targets = self.config.target_languages.clone().unwrap_or_default();
            self.service.create_bundle(
                bundle_id,
                source_language,
                &targets,
                bundle.notes(),
                bundle.metadata(),
            )?;
            info!(bundle = bundle_id, source_language, "created bundle");
        }

        let entries = entries_from_bundle(&bundle);
        self.service
            .upload_resource_entries(bundle_id, source_language, &entries)?;
        info!(
            bundle = bundle_id,
            strings = entries.len(),
            path = %source_file.display(),
            "uploaded source strings"
        );
        Ok(entries.len())
    }
}
