//! ProvinceDatabase - load/save orchestration around the store
//!
//! The database owns the store behind a lock and runs the load pipeline
//! (read file, parse, install, rebuild index) either synchronously or as a
//! single background task. Background loads are single-flight: concurrent
//! [`ProvinceDatabase::load_async`] calls collapse into one execution and
//! every registered callback fires exactly once, in registration order,
//! after it completes. The index rebuild happens before the state flips to
//! loaded and before any callback runs.
//!
//! Mutation and save are foreground operations; callers must not mutate
//! while [`ProvinceDatabase::is_loading`] is true. That is a documented
//! precondition of the single-writer desktop-editor model, not a lock.
//! [`ProvinceDatabase::save`] joins any in-flight load first, so a save
//! never observes a half-populated collection.

use crate::{
    Area, Catalogs, Climate, Continent, FileLayout, NameResolver, ParseWarning, ProvinceStore,
    Region, Result, Ruleset, StoreError, Terrain, parser, text, writer,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// What a finished load delivers to callers and callbacks. The error is
/// shared because a single failure fans out to every waiter of the flight.
pub type LoadOutcome = std::result::Result<(), Arc<StoreError>>;

type LoadCallback = Box<dyn FnOnce(LoadOutcome) + Send + 'static>;

/// Construction parameters for a [`ProvinceDatabase`].
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Province file this database loads from and saves to.
    pub path: PathBuf,
    /// Target game version; picks the catalog variant and the file layout.
    /// Owned by the surrounding application and sampled once here.
    pub ruleset: Ruleset,
}

enum LoadPhase {
    Unloaded { failed: bool },
    Loading { callbacks: Vec<LoadCallback> },
    Loaded,
}

/// The data-layer root object for province records. Explicitly constructed
/// and injected; cloning shares the same underlying store.
#[derive(Clone)]
pub struct ProvinceDatabase {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    config: DatabaseConfig,
    catalogs: Catalogs,
    resolver: Arc<dyn NameResolver>,
    store: RwLock<ProvinceStore>,
    phase: Mutex<LoadPhase>,
    last_error: Mutex<Option<Arc<StoreError>>>,
    last_warnings: Mutex<Vec<ParseWarning>>,
    /// Completed load pipelines. The editor invalidates derived caches on
    /// changes of this value.
    generation: AtomicU64,
}

impl ProvinceDatabase {
    /// Create an unloaded database. Catalogs are built here, before any
    /// file is read.
    pub fn new(config: DatabaseConfig, resolver: Arc<dyn NameResolver>) -> Self {
        let catalogs = Catalogs::new(config.ruleset);
        let store = ProvinceStore::new(resolver.clone());
        Self {
            inner: Arc::new(DatabaseInner {
                config,
                catalogs,
                resolver,
                store: RwLock::new(store),
                phase: Mutex::new(LoadPhase::Unloaded { failed: false }),
                last_error: Mutex::new(None),
                last_warnings: Mutex::new(Vec::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    #[inline]
    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    #[inline]
    pub fn catalogs(&self) -> &Catalogs {
        &self.inner.catalogs
    }

    /// Read access to the store.
    pub fn read(&self) -> RwLockReadGuard<'_, ProvinceStore> {
        self.inner.store.read().unwrap()
    }

    /// Write access to the store for mutations and field edits. Must not be
    /// used while a load is in flight.
    pub fn write(&self) -> RwLockWriteGuard<'_, ProvinceStore> {
        self.inner.store.write().unwrap()
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            *self.inner.phase.lock().unwrap(),
            LoadPhase::Loading { .. }
        )
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.inner.phase.lock().unwrap(), LoadPhase::Loaded)
    }

    /// Whether the most recent load attempt failed.
    pub fn load_failed(&self) -> bool {
        matches!(
            *self.inner.phase.lock().unwrap(),
            LoadPhase::Unloaded { failed: true }
        )
    }

    /// Number of completed load pipelines.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Warnings recovered during the most recent load.
    pub fn last_warnings(&self) -> Vec<ParseWarning> {
        self.inner.last_warnings.lock().unwrap().clone()
    }

    /// Load synchronously on the calling thread.
    ///
    /// Joins an in-flight background load instead of starting a second one
    /// and reports that flight's outcome. Already loaded is success without
    /// any I/O.
    pub fn load(&self) -> LoadOutcome {
        let run_here = {
            let mut phase = self.inner.phase.lock().unwrap();
            if matches!(*phase, LoadPhase::Loaded) {
                return Ok(());
            }
            if matches!(*phase, LoadPhase::Loading { .. }) {
                false
            } else {
                *phase = LoadPhase::Loading {
                    callbacks: Vec::new(),
                };
                true
            }
        };
        if !run_here {
            self.wait_loading();
            return self.inner.settled_outcome();
        }
        let outcome = self.inner.run_pipeline().map_err(Arc::new);
        self.inner.finish(outcome.clone());
        outcome
    }

    /// Load in the background, invoking `on_complete` when done.
    ///
    /// Already loaded: the callback fires immediately with success and no
    /// I/O happens. Load in flight: the callback is registered on that
    /// flight. Otherwise exactly one background task is started. Must be
    /// called from within a tokio runtime.
    pub fn load_async<F>(&self, on_complete: F)
    where
        F: FnOnce(LoadOutcome) + Send + 'static,
    {
        let callback: LoadCallback = Box::new(on_complete);
        let mut phase = self.inner.phase.lock().unwrap();
        match std::mem::replace(&mut *phase, LoadPhase::Unloaded { failed: false }) {
            LoadPhase::Loaded => {
                *phase = LoadPhase::Loaded;
                drop(phase);
                callback(Ok(()));
            }
            LoadPhase::Loading { mut callbacks } => {
                callbacks.push(callback);
                *phase = LoadPhase::Loading { callbacks };
            }
            LoadPhase::Unloaded { .. } => {
                *phase = LoadPhase::Loading {
                    callbacks: vec![callback],
                };
                drop(phase);
                self.spawn_background();
            }
        }
    }

    /// Block until no load is in flight. Safe to call with none in flight.
    ///
    /// Cooperative join for the foreground thread: the background worker
    /// owns the heavy work, this thread yields until the state settles.
    pub fn wait_loading(&self) {
        while self.is_loading() {
            std::thread::yield_now();
        }
    }

    /// Mark a loaded database as unloaded so the next load re-reads the
    /// file. Idempotent when already unloaded; a load in flight cannot be
    /// cancelled and is left alone.
    pub fn request_reload(&self) {
        let mut phase = self.inner.phase.lock().unwrap();
        if matches!(*phase, LoadPhase::Loaded) {
            *phase = LoadPhase::Unloaded { failed: false };
            tracing::debug!("reload requested for {}", self.inner.config.path.display());
        }
    }

    /// Serialize the collection back to the province file, joining any
    /// in-flight load first. The dirty flag is cleared only on success, so
    /// a failed save can be retried.
    pub fn save(&self) -> Result<()> {
        self.wait_loading();
        let layout = FileLayout::from(self.inner.config.ruleset);
        let mut store = self.inner.store.write().unwrap();
        writer::write_provinces(&self.inner.config.path, store.provinces(), layout)?;
        store.clear_dirty();
        Ok(())
    }

    /// Display text for an area under this database's ruleset.
    pub fn area_display_name(&self, area: Area) -> String {
        self.display(area.key())
    }

    /// Display text for a region under this database's ruleset.
    pub fn region_display_name(&self, region: Region) -> String {
        self.display(region.key())
    }

    /// Display text for a continent under this database's ruleset.
    pub fn continent_display_name(&self, continent: Continent) -> String {
        self.display(continent.key())
    }

    /// Display text for a climate under this database's ruleset.
    pub fn climate_display_name(&self, climate: Climate) -> String {
        self.display(climate.key())
    }

    /// Display text for a terrain under this database's ruleset.
    pub fn terrain_display_name(&self, terrain: Terrain) -> String {
        self.display(terrain.key())
    }

    fn display(&self, key: &str) -> String {
        text::display_name(
            self.inner.resolver.as_ref(),
            self.inner.config.ruleset,
            key,
        )
    }

    fn spawn_background(&self) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let worker = inner.clone();
            let outcome = match tokio::task::spawn_blocking(move || worker.run_pipeline()).await {
                Ok(result) => result.map_err(Arc::new),
                Err(join_error) => Err(Arc::new(StoreError::Background(join_error.to_string()))),
            };
            inner.finish(outcome);
        });
    }
}

impl DatabaseInner {
    /// Read, parse and install the file, then rebuild the index. Row-level
    /// problems are recovered inside the parser; only file-level I/O errors
    /// surface here.
    fn run_pipeline(&self) -> Result<()> {
        #[cfg(feature = "profiling")]
        profiling::scope!("database::run_pipeline");

        let path = &self.config.path;
        tracing::info!("loading provinces from {}", path.display());
        let started = std::time::Instant::now();

        let bytes = std::fs::read(path)?;
        // Legacy files come in single-byte encodings; lossy decoding keeps
        // the load alive and only ever affects display-name bytes.
        let text = String::from_utf8_lossy(&bytes);
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let report = parser::parse_text(&text, &self.catalogs, &source);

        tracing::info!(
            "loaded {} provinces ({} warnings, {} rows skipped) in {:?}",
            report.provinces.len(),
            report.warnings.len(),
            report.skipped_rows,
            started.elapsed()
        );

        self.store.write().unwrap().install(report.provinces);
        *self.last_warnings.lock().unwrap() = report.warnings;
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Settle the flight: record the outcome, flip the state, then fire the
    /// registered callbacks in order.
    fn finish(&self, outcome: LoadOutcome) {
        if outcome.is_err() {
            // A failed load leaves the collection empty.
            self.store.write().unwrap().clear();
        }
        *self.last_error.lock().unwrap() = outcome.as_ref().err().cloned();

        let callbacks = {
            let mut phase = self.phase.lock().unwrap();
            match std::mem::replace(&mut *phase, LoadPhase::Unloaded { failed: false }) {
                LoadPhase::Loading { callbacks } => {
                    *phase = if outcome.is_ok() {
                        LoadPhase::Loaded
                    } else {
                        LoadPhase::Unloaded { failed: true }
                    };
                    callbacks
                }
                other => {
                    *phase = other;
                    Vec::new()
                }
            }
        };
        for callback in callbacks {
            callback(outcome.clone());
        }
    }

    /// Outcome of the flight that just settled, for joiners.
    fn settled_outcome(&self) -> LoadOutcome {
        if matches!(
            *self.phase.lock().unwrap(),
            LoadPhase::Unloaded { failed: true }
        ) {
            let error = self.last_error.lock().unwrap().clone();
            return Err(error
                .unwrap_or_else(|| Arc::new(StoreError::Background("load failed".to_string()))));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Area, Climate, Continent, Region, Terrain};
    use crate::record::{Province, ProvinceId};
    use crate::text::StaticResolver;
    use crate::writer::render_provinces;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    fn land(id: u32, name: &str) -> Province {
        let mut province = Province::classified(
            ProvinceId(id),
            Area::Poland,
            Region::EasternEurope,
            Continent::Europe,
            Climate::Temperate,
            Terrain::Plains,
        );
        province.name = name.to_string();
        province.ic = 2.0;
        province
    }

    fn write_sample_file(dir: &TempDir, count: u32) -> PathBuf {
        let provinces: Vec<Province> = (1..=count)
            .map(|id| land(id, &format!("PROV_{}", id)))
            .collect();
        let path = dir.path().join("provinces.csv");
        std::fs::write(&path, render_provinces(&provinces, FileLayout::Legacy)).unwrap();
        path
    }

    fn test_resolver() -> Arc<StaticResolver> {
        Arc::new(StaticResolver::with_entries([
            ("SEA_NORTH", "North Sea"),
            ("Iran", "Persien"),
        ]))
    }

    fn test_db(path: PathBuf) -> ProvinceDatabase {
        ProvinceDatabase::new(
            DatabaseConfig {
                path,
                ruleset: Ruleset::Legacy,
            },
            test_resolver(),
        )
    }

    #[test]
    fn test_sync_load_and_noop_reload() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(write_sample_file(&dir, 3));

        db.load().unwrap();
        assert!(db.is_loaded());
        assert_eq!(db.read().len(), 3);
        assert_eq!(db.generation(), 1);
        assert!(db.last_warnings().is_empty());

        // Already loaded: success without another parse pass.
        db.load().unwrap();
        assert_eq!(db.generation(), 1);
    }

    #[test]
    fn test_load_missing_file_fails_and_leaves_unloaded() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(dir.path().join("missing.csv"));

        assert!(db.load().is_err());
        assert!(!db.is_loaded());
        assert!(db.load_failed());
        assert!(db.read().is_empty());
        assert_eq!(db.generation(), 0);
    }

    #[test]
    fn test_request_reload_before_first_load_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(dir.path().join("missing.csv"));

        db.request_reload();
        assert!(!db.is_loaded());
        assert!(!db.is_loading());
        assert!(!db.load_failed());
        // No parse happened.
        assert_eq!(db.generation(), 0);
    }

    #[test]
    fn test_request_reload_allows_reread() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample_file(&dir, 2);
        let db = test_db(path.clone());

        db.load().unwrap();
        assert_eq!(db.generation(), 1);

        // Grow the file, then reload.
        let provinces: Vec<Province> = (1..=5).map(|id| land(id, "PROV")).collect();
        std::fs::write(&path, render_provinces(&provinces, FileLayout::Legacy)).unwrap();
        db.request_reload();
        assert!(!db.is_loaded());

        db.load().unwrap();
        assert_eq!(db.generation(), 2);
        assert_eq!(db.read().len(), 5);
    }

    #[test]
    fn test_wait_loading_with_no_flight_returns() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(dir.path().join("missing.csv"));
        db.wait_loading();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_load_async_is_single_flight() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(write_sample_file(&dir, 4));

        let fired = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let fired = fired.clone();
            db.load_async(move |outcome| {
                assert!(outcome.is_ok());
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }

        while fired.load(Ordering::SeqCst) < 3 {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        assert!(db.is_loaded());
        // One parse pass, three callbacks.
        assert_eq!(db.generation(), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 3);
        assert_eq!(db.read().len(), 4);
    }

    #[tokio::test]
    async fn test_load_async_callbacks_fire_in_registration_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(write_sample_file(&dir, 2));

        // On a current-thread runtime the background task only starts at the
        // first await, so all three registrations land on the same flight.
        let events = Arc::new(Mutex::new(Vec::new()));
        for index in 0..3usize {
            let events = events.clone();
            db.load_async(move |_| events.lock().unwrap().push(index));
        }

        while !db.is_loaded() {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        assert_eq!(*events.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_load_async_when_loaded_fires_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(write_sample_file(&dir, 1));
        db.load().unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let flag = fired.clone();
        db.load_async(move |outcome| {
            assert!(outcome.is_ok());
            flag.fetch_add(1, Ordering::SeqCst);
        });

        // Fired synchronously, no new parse pass.
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(db.generation(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_load_async_failure_reports_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(dir.path().join("missing.csv"));

        let failures = Arc::new(AtomicUsize::new(0));
        let counter = failures.clone();
        db.load_async(move |outcome| {
            assert!(outcome.is_err());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        while failures.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        assert!(db.load_failed());
        assert!(!db.is_loaded());
        assert!(db.read().is_empty());
    }

    #[test]
    fn test_save_round_trips_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample_file(&dir, 2);
        let db = test_db(path.clone());
        db.load().unwrap();

        {
            let mut store = db.write();
            store.modify_area(ProvinceId(1), Area::Bohemia).unwrap();
            store.add(land(9, "PROV_NEW")).unwrap();
            assert!(store.is_dirty());
        }
        db.save().unwrap();
        assert!(!db.read().is_dirty());

        let reloaded = test_db(path);
        reloaded.load().unwrap();
        let store = reloaded.read();
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(ProvinceId(1)).unwrap().area(), Area::Bohemia);
        assert!(store.get(ProvinceId(9)).is_some());
    }

    #[test]
    fn test_failed_save_keeps_dirty_flag() {
        let dir = tempfile::tempdir().unwrap();
        // The target path is an existing directory, so the write must fail.
        let db = test_db(dir.path().to_path_buf());

        db.write().add(land(1, "PROV")).unwrap();
        assert!(db.save().is_err());
        assert!(db.read().is_dirty());
    }

    #[test]
    fn test_save_joins_inflight_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample_file(&dir, 3);
        let db = test_db(path.clone());

        let rt = tokio::runtime::Runtime::new().unwrap();
        {
            let _guard = rt.enter();
            db.load_async(|outcome| assert!(outcome.is_ok()));
        }
        // Joins the background flight before reading the collection.
        db.save().unwrap();
        assert!(db.is_loaded());

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 4);
    }

    #[test]
    fn test_display_names_use_resolver_and_ruleset() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = test_db(dir.path().join("provinces.csv"));
        assert_eq!(legacy.area_display_name(Area::Persia), "Persia");

        let extended = ProvinceDatabase::new(
            DatabaseConfig {
                path: dir.path().join("provinces.csv"),
                ruleset: Ruleset::Extended,
            },
            test_resolver(),
        );
        // The extended game renamed the key; the resolver has text for it.
        assert_eq!(extended.area_display_name(Area::Persia), "Persien");
        assert_eq!(extended.continent_display_name(Continent::Europe), "Europe");
    }
}
