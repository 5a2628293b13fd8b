//! Themes - named, write-once/read-many fact sets backed by a file.
//!
//! A theme starts unbound. It is either opened for writing (which creates its
//! tsv file in an output folder) and then closed, or bound to an existing
//! file in an input folder. Once bound and not writing, it can be iterated or
//! materialized into a cached [`FactStore`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::cache::CacheSlot;
use crate::codec::{FactReader, FactWriter, FileFormat};
use crate::error::{Result, StoreError, ThemeError};
use crate::fact::{Fact, is_english};
use crate::store::{FactStore, TranslationView};

/// Name prefix of themes that are part of the exported knowledge base.
pub const EXPORT_PREFIX: &str = "yago";

/// Groups of themes, used when exporting and documenting the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThemeGroup {
    Taxonomy,
    SimpleTax,
    Core,
    Geonames,
    Meta,
    Multilingual,
    Link,
    Other,
    Internal,
    Wikipedia,
}

impl ThemeGroup {
    pub const ALL: [Self; 10] = [
        Self::Taxonomy,
        Self::SimpleTax,
        Self::Core,
        Self::Geonames,
        Self::Meta,
        Self::Multilingual,
        Self::Link,
        Self::Other,
        Self::Internal,
        Self::Wikipedia,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Taxonomy => "TAXONOMY",
            Self::SimpleTax => "SIMPLETAX",
            Self::Core => "CORE",
            Self::Geonames => "GEONAMES",
            Self::Meta => "META",
            Self::Multilingual => "MULTILINGUAL",
            Self::Link => "LINK",
            Self::Other => "OTHER",
            Self::Internal => "INTERNAL",
            Self::Wikipedia => "WIKIPEDIA",
        }
    }

    /// Parse an upper-case group name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.as_str() == s)
    }

    /// Group given to a theme created without one: exported themes are
    /// `Other`, everything else is `Internal`.
    #[must_use]
    pub fn default_for(name: &str) -> Self {
        if name.starts_with(EXPORT_PREFIX) {
            Self::Other
        } else {
            Self::Internal
        }
    }
}

impl std::fmt::Display for ThemeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable lifecycle state of a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeState {
    Unbound,
    Writing,
    Bound,
}

enum Binding {
    Unbound,
    Writing(FactWriter),
    Bound(PathBuf),
}

/// A globally unique, named fact set. Created through a [`ThemeRegistry`](crate::ThemeRegistry).
pub struct Theme {
    name: String,
    group: ThemeGroup,
    description: String,
    binding: Mutex<Binding>,
    cache: CacheSlot,
}

impl Theme {
    pub(crate) fn new(name: String, description: String, group: ThemeGroup) -> Self {
        Self {
            name,
            group,
            description,
            binding: Mutex::new(Binding::Unbound),
            cache: CacheSlot::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn group(&self) -> ThemeGroup {
        self.group
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The language suffix of a theme named `base_xx` or `base_xxx`.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        let (base, suffix) = self.name.rsplit_once('_')?;
        let valid = !base.is_empty()
            && (2..=3).contains(&suffix.len())
            && suffix.chars().all(|c| c.is_ascii_alphabetic());
        valid.then_some(suffix)
    }

    /// True if the theme has no language suffix or an English one.
    #[must_use]
    pub fn is_english_or_default(&self) -> bool {
        self.language().is_none_or(is_english)
    }

    /// True for export-ready themes.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.name.starts_with(EXPORT_PREFIX)
    }

    /// The theme as a knowledge base entity.
    #[must_use]
    pub fn as_entity(&self) -> String {
        format!("<yagoTheme_{}>", self.name)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Binding>> {
        self.binding
            .lock()
            .map_err(|_| ThemeError::LockPoisoned(self.name.clone()))
    }

    fn store_error(&self, source: StoreError) -> ThemeError {
        ThemeError::Store {
            theme: self.name.clone(),
            source,
        }
    }

    fn drop_cache(&self) -> Result<()> {
        self.cache
            .invalidate()
            .map_err(|_| ThemeError::LockPoisoned(self.name.clone()))
    }

    #[must_use]
    pub fn state(&self) -> ThemeState {
        match self.binding.lock().as_deref() {
            Ok(Binding::Writing(_)) => ThemeState::Writing,
            Ok(Binding::Bound(_)) => ThemeState::Bound,
            Ok(Binding::Unbound) | Err(_) => ThemeState::Unbound,
        }
    }

    /// The file this theme is written to or bound to.
    #[must_use]
    pub fn file(&self) -> Option<PathBuf> {
        match &*self.binding.lock().ok()? {
            Binding::Writing(writer) => Some(writer.path().to_path_buf()),
            Binding::Bound(file) => Some(file.clone()),
            Binding::Unbound => None,
        }
    }

    /// True if the facts can be read from this theme.
    #[must_use]
    pub fn is_available_for_reading(&self) -> bool {
        self.state() == ThemeState::Bound
    }

    /// The file of this theme in `folder`, preferring tsv over ttl.
    #[must_use]
    pub fn find_file_in_folder(&self, folder: &Path) -> Option<PathBuf> {
        let mut found = FileFormat::PREFERENCE
            .iter()
            .map(|format| folder.join(format!("{}.{}", self.name, format.extension())))
            .filter(|path| path.is_file());
        let chosen = found.next()?;
        if found.next().is_some() {
            warn!(
                "Theme {} exists in several formats in {}. Using {}",
                self.name,
                folder.display(),
                chosen.display()
            );
        }
        Some(chosen)
    }

    /// Create this theme's tsv file in `folder` and start writing.
    pub fn open_for_writing(&self, folder: &Path, header: &str) -> Result<()> {
        let mut binding = self.lock()?;
        match &*binding {
            Binding::Writing(_) => return Err(ThemeError::AlreadyWriting(self.name.clone())),
            Binding::Bound(file) => {
                return Err(ThemeError::AlreadyWritten {
                    theme: self.name.clone(),
                    file: file.clone(),
                });
            }
            Binding::Unbound => {}
        }
        let path = folder.join(format!("{}.{}", self.name, FileFormat::Tsv.extension()));
        info!("Opening theme {} for writing at {}", self.name, path.display());
        let writer = FactWriter::create(&path, header).map_err(|e| self.store_error(e))?;
        *binding = Binding::Writing(writer);
        self.drop_cache()
    }

    pub fn write(&self, fact: &Fact) -> Result<()> {
        let mut binding = self.lock()?;
        let Binding::Writing(writer) = &mut *binding else {
            return Err(ThemeError::NotWriting(self.name.clone()));
        };
        writer.write(fact).map_err(|e| self.store_error(e))
    }

    /// Finish writing. The theme stays bound to the written file.
    pub fn close(&self) -> Result<PathBuf> {
        let mut binding = self.lock()?;
        if !matches!(&*binding, Binding::Writing(_)) {
            return Err(ThemeError::NotWriting(self.name.clone()));
        }
        let Binding::Writing(writer) = std::mem::replace(&mut *binding, Binding::Unbound) else {
            return Err(ThemeError::NotWriting(self.name.clone()));
        };
        let written = writer.written();
        let file = writer.finish().map_err(|e| self.store_error(e))?;
        info!("Closed theme {} with {written} facts", self.name);
        *binding = Binding::Bound(file.clone());
        Ok(file)
    }

    /// Abandon writing: the partial file is deleted and the theme left unbound.
    pub fn abort(&self) -> Result<()> {
        let mut binding = self.lock()?;
        if !matches!(&*binding, Binding::Writing(_)) {
            return Err(ThemeError::NotWriting(self.name.clone()));
        }
        if let Binding::Writing(writer) = std::mem::replace(&mut *binding, Binding::Unbound) {
            warn!(
                "Aborted writing theme {}, removing {}",
                self.name,
                writer.partial_path().display()
            );
            writer.discard().map_err(|e| self.store_error(e))?;
        }
        Ok(())
    }

    /// Bind this theme to its existing file in `folder`.
    ///
    /// Binding again to the same file is a no-op.
    pub fn bind_to_folder(&self, folder: &Path) -> Result<()> {
        let mut binding = self.lock()?;
        if matches!(&*binding, Binding::Writing(_)) {
            return Err(ThemeError::CurrentlyWriting(self.name.clone()));
        }
        let file = self
            .find_file_in_folder(folder)
            .ok_or_else(|| ThemeError::NotFound {
                theme: self.name.clone(),
                folder: folder.to_path_buf(),
            })?;
        if let Binding::Bound(current) = &*binding {
            if *current == file {
                return Ok(());
            }
            return Err(ThemeError::AlreadyBound {
                theme: self.name.clone(),
                file: current.clone(),
                requested: file,
            });
        }
        debug!("Binding theme {} to {}", self.name, file.display());
        *binding = Binding::Bound(file);
        self.drop_cache()
    }

    /// Forget the file binding and the cache.
    pub fn unbind(&self) -> Result<()> {
        let mut binding = self.lock()?;
        if matches!(&*binding, Binding::Writing(_)) {
            return Err(ThemeError::CurrentlyWriting(self.name.clone()));
        }
        *binding = Binding::Unbound;
        self.drop_cache()
    }

    fn readable_file(&self) -> Result<PathBuf> {
        self.readable_file_at_generation().map(|(file, _)| file)
    }

    /// The bound file and the cache generation that belongs to it. Both are
    /// read under the binding lock, which every rebinding holds while it
    /// invalidates the cache.
    fn readable_file_at_generation(&self) -> Result<(PathBuf, u64)> {
        let binding = self.lock()?;
        match &*binding {
            Binding::Bound(file) => {
                let generation = self
                    .cache
                    .generation()
                    .map_err(|_| ThemeError::LockPoisoned(self.name.clone()))?;
                Ok((file.clone(), generation))
            }
            Binding::Writing(_) => Err(ThemeError::CurrentlyWriting(self.name.clone())),
            Binding::Unbound => Err(ThemeError::Unbound(self.name.clone())),
        }
    }

    /// Stream the facts of the bound file, duplicates included, without
    /// touching the cache.
    pub fn iter(&self) -> Result<FactReader> {
        let file = self.readable_file()?;
        FactReader::open(&file).map_err(|e| self.store_error(e))
    }

    /// The cached fact store, loaded on first use.
    ///
    /// The first call decides whether the store is fast or full; later calls
    /// return that same store whatever `fast` they pass.
    pub fn fact_store(&self, fast: bool) -> Result<Arc<FactStore>> {
        let (file, generation) = self.readable_file_at_generation()?;
        self.cache
            .get_or_build(generation, || FactStore::load(&file, fast))
            .map_err(|_| ThemeError::LockPoisoned(self.name.clone()))?
            .map_err(|e| self.store_error(e))
    }

    /// Dictionary view over the `<_hasTranslation>` facts of this theme.
    ///
    /// Forces a full load if nothing is cached yet.
    pub fn translation_view(&self) -> Result<TranslationView> {
        Ok(TranslationView::new(self.fact_store(false)?))
    }

    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }

    pub fn invalidate_cache(&self) -> Result<()> {
        self.drop_cache()
    }
}

impl std::fmt::Debug for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Theme")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl PartialEq for Theme {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Theme {}

impl Hash for Theme {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Theme {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Theme {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}
