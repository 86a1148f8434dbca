//! Calendars stored as directories of `.ics` files.
//!
//! Every calendar is a directory (searched recursively) holding one event per
//! file. Reads go through the shared [`EventCache`], keyed by calendar name
//! and the file's path relative to the calendar root, and validated against
//! the file's modification time. Writes are atomic: the event is written to a
//! temporary file in the target directory, synced, then renamed into place.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use calcli_core::Event;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::cache::EventCache;
use crate::error::{StoreError, StoreResult};
use crate::ics;

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything that can list events: a single calendar, a group of them, or a
/// test fake.
pub trait EventSource: Send + Sync {
    /// Name used in logs and messages.
    fn name(&self) -> &str;

    /// Lists every stored event (recurring events unexpanded), sorted by start.
    fn list_events(&self) -> BoxFuture<'_, StoreResult<Vec<Event>>>;
}

/// One calendar directory.
#[derive(Debug, Clone)]
pub struct VdirStore {
    name: String,
    path: PathBuf,
    read_only: bool,
    cache: Arc<EventCache>,
}

impl VdirStore {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, cache: Arc<EventCache>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            read_only: false,
            cache,
        }
    }

    /// Builder method to mark the calendar read-only.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn cache(&self) -> &Arc<EventCache> {
        &self.cache
    }

    /// Loads every event file of this calendar.
    ///
    /// Files are loaded concurrently through the cache. Unreadable or
    /// unparsable files are logged and skipped. A missing directory is an
    /// empty calendar.
    pub async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let files = collect_ics_files(&self.path).await?;
        debug!(calendar = %self.name, files = files.len(), "Listing calendar");

        let mut tasks = JoinSet::new();
        for file in files {
            let cache = Arc::clone(&self.cache);
            let calendar = self.name.clone();
            let root = self.path.clone();
            tasks.spawn(async move {
                let result = load_file(&cache, &calendar, &root, &file).await;
                (file, result)
            });
        }

        let mut events = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(event))) => events.push(event),
                Ok((file, Err(e))) => {
                    warn!(path = %file.display(), error = %e, "Skipping event file");
                }
                Err(e) => warn!(calendar = %self.name, error = %e, "Event load task failed"),
            }
        }

        sort_events(&mut events);
        Ok(events)
    }

    /// Finds the event with `uid`, trying `<uid>.ics` before scanning.
    pub async fn find_event(&self, uid: &str) -> StoreResult<Event> {
        self.locate(uid)
            .await?
            .map(|(_, event)| event)
            .ok_or_else(|| StoreError::not_found(uid))
    }

    /// Writes `event` as `<uid>.ics` and returns the file path.
    pub async fn create_event(&self, event: &Event) -> StoreResult<PathBuf> {
        self.ensure_writable()?;
        let path = self.event_path(&event.uid);
        self.write_event(path, event).await
    }

    /// Replaces the file holding `event.uid`, creating `<uid>.ics` if no such
    /// file exists.
    pub async fn update_event(&self, event: &Event) -> StoreResult<PathBuf> {
        self.ensure_writable()?;
        let path = match self.locate(&event.uid).await? {
            Some((path, _)) => path,
            None => self.event_path(&event.uid),
        };
        self.write_event(path, event).await
    }

    /// Canonical file path for an event uid.
    pub fn event_path(&self, uid: &str) -> PathBuf {
        self.path.join(format!("{}.ics", safe_file_stem(uid)))
    }

    fn ensure_writable(&self) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::read_only(&self.name));
        }
        Ok(())
    }

    async fn write_event(&self, path: PathBuf, event: &Event) -> StoreResult<PathBuf> {
        let mut event = event.clone();
        event.calendar = self.name.clone();
        let content = ics::generate_event(&event);

        write_atomic(path.clone(), content).await?;
        self.cache.delete(&self.name, &file_id(&self.path, &path)).await;

        debug!(calendar = %self.name, uid = %event.uid, path = %path.display(), "Wrote event");
        Ok(path)
    }

    /// Returns the file and event holding `uid`, if any.
    async fn locate(&self, uid: &str) -> StoreResult<Option<(PathBuf, Event)>> {
        let direct = self.event_path(uid);
        if fs::try_exists(&direct).await.unwrap_or(false) {
            match load_file(&self.cache, &self.name, &self.path, &direct).await {
                Ok(event) if event.uid == uid => return Ok(Some((direct, event))),
                Ok(_) => {}
                Err(e) => warn!(path = %direct.display(), error = %e, "Skipping event file"),
            }
        }

        for file in collect_ics_files(&self.path).await? {
            if file == direct {
                continue;
            }
            match load_file(&self.cache, &self.name, &self.path, &file).await {
                Ok(event) if event.uid == uid => return Ok(Some((file, event))),
                Ok(_) => {}
                Err(e) => warn!(path = %file.display(), error = %e, "Skipping event file"),
            }
        }
        Ok(None)
    }
}

impl EventSource for VdirStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_events(&self) -> BoxFuture<'_, StoreResult<Vec<Event>>> {
        Box::pin(VdirStore::list_events(self))
    }
}

/// Counts reported by [`Calendars::reindex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReindexStats {
    /// Cache entries before the rebuild.
    pub before: usize,
    /// Cache entries after the rebuild.
    pub after: usize,
}

/// All configured calendars, sharing one cache.
#[derive(Debug, Clone)]
pub struct Calendars {
    stores: Vec<VdirStore>,
    cache: Arc<EventCache>,
}

impl Calendars {
    pub fn new(cache: Arc<EventCache>) -> Self {
        Self {
            stores: Vec::new(),
            cache,
        }
    }

    /// Adds a calendar backed by the shared cache.
    pub fn add(&mut self, name: impl Into<String>, path: impl Into<PathBuf>, read_only: bool) {
        let store = VdirStore::new(name, path, Arc::clone(&self.cache)).with_read_only(read_only);
        self.stores.push(store);
    }

    pub fn get(&self, name: &str) -> Option<&VdirStore> {
        self.stores.iter().find(|store| store.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VdirStore> {
        self.stores.iter()
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn cache(&self) -> &Arc<EventCache> {
        &self.cache
    }

    /// Lists the events of every calendar, sorted by start.
    pub async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let mut events = Vec::new();
        for store in &self.stores {
            events.extend(store.list_events().await?);
        }
        sort_events(&mut events);
        Ok(events)
    }

    /// Finds an event by uid in any calendar.
    pub async fn find_event(&self, uid: &str) -> StoreResult<Event> {
        for store in &self.stores {
            match store.find_event(uid).await {
                Ok(event) => return Ok(event),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Err(StoreError::not_found(uid))
    }

    /// Drops every cached entry and reloads all calendars.
    pub async fn reindex(&self) -> StoreResult<ReindexStats> {
        let before = self.cache.size();
        self.cache.clear().await;
        self.list_events().await?;
        let after = self.cache.size();
        debug!(before = before, after = after, "Rebuilt event cache");
        Ok(ReindexStats { before, after })
    }
}

impl EventSource for Calendars {
    fn name(&self) -> &str {
        "all"
    }

    fn list_events(&self) -> BoxFuture<'_, StoreResult<Vec<Event>>> {
        Box::pin(Calendars::list_events(self))
    }
}

/// Replaces characters that are unsafe in file names.
pub fn safe_file_stem(uid: &str) -> String {
    uid.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.uid.cmp(&b.uid)));
}

fn is_ics(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ics"))
}

/// Cache id for a file: its path relative to the calendar root, without
/// the extension.
fn file_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.with_extension("").to_string_lossy().into_owned()
}

async fn collect_ics_files(root: &Path) -> StoreResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut dirs = vec![root.to_path_buf()];

    while let Some(dir) = dirs.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if dir == root && e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %root.display(), "Calendar directory does not exist");
                return Ok(files);
            }
            Err(e) if dir == root => return Err(StoreError::io(&dir, &e)),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                continue;
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&dir, &e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StoreError::io(&path, &e))?;
            if file_type.is_dir() {
                dirs.push(path);
            } else if is_ics(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

async fn load_file(
    cache: &EventCache,
    calendar: &str,
    root: &Path,
    path: &Path,
) -> StoreResult<Event> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| StoreError::io(path, &e))?;
    let mod_time: DateTime<Utc> = metadata
        .modified()
        .map_err(|e| StoreError::io(path, &e))?
        .into();

    cache
        .load_or_fetch(calendar, &file_id(root, path), mod_time, || {
            read_event_file(path, calendar)
        })
        .await
}

async fn read_event_file(path: &Path, calendar: &str) -> StoreResult<Event> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::io(path, &e))?;
    let mut events = ics::parse_events(&content).map_err(|e| StoreError::parse(path, e))?;

    if events.len() > 1 {
        debug!(path = %path.display(), count = events.len(), "Using first of several events");
    }
    if events.is_empty() {
        return Err(StoreError::parse(path, "no VEVENT found"));
    }

    let mut event = events.swap_remove(0);
    event.calendar = calendar.to_string();
    Ok(event)
}

async fn write_atomic(path: PathBuf, content: String) -> StoreResult<()> {
    let target = path.clone();
    tokio::task::spawn_blocking(move || -> StoreResult<()> {
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, &e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".calcli-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|e| StoreError::io(&dir, &e))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| StoreError::io(tmp.path(), &e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(tmp.path(), &e))?;
        tmp.persist(&path)
            .map_err(|e| StoreError::io(&path, &e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| StoreError::Io {
        path: target.display().to_string(),
        message: e.to_string(),
    })?
}
