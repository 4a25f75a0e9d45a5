//! Bounded per-group notepad files.
//!
//! Every operation reloads the group's file, validates, and (for mutations)
//! writes the full new content to a temp file before renaming it over the
//! old one. A per-group `RwLock` serializes writers for the same group while
//! letting different groups proceed in parallel.

use std::{
    collections::{BTreeSet, HashMap},
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::sync::{Mutex, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, info};

use crate::{
    codec::{self, Entry},
    config::NotepadConfig,
    domain::GroupKey,
    errors::{NoteError, NoteResult},
};

/// Per-call registration behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterOptions {
    pub max_entries: usize,
    pub duplicate_check: bool,
    pub timestamp: bool,
}

impl From<&NotepadConfig> for RegisterOptions {
    fn from(cfg: &NotepadConfig) -> Self {
        Self {
            max_entries: cfg.max_entries,
            duplicate_check: cfg.enable_duplicate_check,
            timestamp: cfg.enable_timestamp,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registered {
    pub code: String,
    pub evicted: usize,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryResult {
    Empty,
    Entries(Vec<String>),
}

/// Parsed argument of a delete request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteSpec {
    All,
    Lines(BTreeSet<usize>),
}

impl DeleteSpec {
    /// Parse `"ALL"` (any case) or a comma-separated list of line numbers.
    ///
    /// Tokens that are not plain digit runs are dropped; if nothing numeric
    /// remains the input is rejected.
    pub fn parse(raw: &str) -> NoteResult<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        let lines: BTreeSet<usize> = raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()))
            // Too large for usize is still a number, just out of range.
            .map(|t| t.parse::<usize>().unwrap_or(usize::MAX))
            .collect();

        if lines.is_empty() {
            return Err(NoteError::InvalidLineSpec);
        }
        Ok(Self::Lines(lines))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteResult {
    /// The whole notepad was removed.
    All,
    /// Nothing to delete from.
    EmptyStore,
    Deleted {
        count: usize,
        remaining: Vec<String>,
    },
}

#[derive(Default)]
struct GroupLocks {
    inner: Mutex<HashMap<GroupKey, Arc<RwLock<()>>>>,
}

impl GroupLocks {
    async fn lock_for(&self, group: &GroupKey) -> Arc<RwLock<()>> {
        let mut map = self.inner.lock().await;
        map.entry(group.clone())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    async fn read(&self, group: &GroupKey) -> OwnedRwLockReadGuard<()> {
        self.lock_for(group).await.read_owned().await
    }

    async fn write(&self, group: &GroupKey) -> OwnedRwLockWriteGuard<()> {
        self.lock_for(group).await.write_owned().await
    }
}

/// File-backed notepad store shared by every group.
pub struct NoteStore {
    data_dir: PathBuf,
    file_prefix: String,
    locks: GroupLocks,
}

impl NoteStore {
    pub fn new(data_dir: impl Into<PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            file_prefix: file_prefix.into(),
            locks: GroupLocks::default(),
        }
    }

    pub fn from_config(cfg: &NotepadConfig) -> Self {
        Self::new(cfg.data_dir.clone(), cfg.file_prefix.clone())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `<data_dir>/<file_prefix>_<storage_key>.txt`
    pub fn path_for(&self, group: &GroupKey) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}.txt", self.file_prefix, group.storage_key()))
    }

    pub async fn register(
        &self,
        group: &GroupKey,
        code: &str,
        opts: RegisterOptions,
    ) -> NoteResult<Registered> {
        let code = code.trim();
        if code.is_empty() {
            return Err(NoteError::EmptyInput);
        }

        let _guard = self.locks.write(group).await;
        let path = self.path_for(group);
        let mut lines = load_lines(&path)?;

        if opts.duplicate_check {
            if let Some(line) = find_duplicate(&lines, code, opts.timestamp) {
                return Err(NoteError::DuplicateCode { line });
            }
        }

        let entry = if opts.timestamp {
            Entry::now(code)
        } else {
            Entry::untimed(code)
        };
        let new_line = codec::encode(&entry, opts.timestamp);

        let max = opts.max_entries.max(1);
        let mut evicted = 0;
        if lines.len() >= max {
            evicted = lines.len() - (max - 1);
            lines.drain(..evicted);
        }
        lines.push(new_line);

        fs::create_dir_all(&self.data_dir)?;
        store_lines(&path, &lines)?;

        info!(
            group = group.as_str(),
            code,
            evicted,
            count = lines.len(),
            "registered gathering code"
        );
        Ok(Registered {
            code: code.to_string(),
            evicted,
            count: lines.len(),
        })
    }

    pub async fn query(&self, group: &GroupKey) -> NoteResult<QueryResult> {
        let _guard = self.locks.read(group).await;
        let lines = load_lines(&self.path_for(group))?;
        debug!(group = group.as_str(), count = lines.len(), "loaded notepad");

        if lines.is_empty() {
            return Ok(QueryResult::Empty);
        }
        Ok(QueryResult::Entries(display_lines(&lines)))
    }

    pub async fn delete(&self, group: &GroupKey, spec: &DeleteSpec) -> NoteResult<DeleteResult> {
        let requested = match spec {
            DeleteSpec::All => return self.clear(group).await,
            DeleteSpec::Lines(requested) => requested,
        };

        let _guard = self.locks.write(group).await;
        let path = self.path_for(group);
        let mut lines = load_lines(&path)?;
        if lines.is_empty() {
            return Ok(DeleteResult::EmptyStore);
        }

        let count = lines.len();
        let valid: Vec<usize> = requested
            .iter()
            .copied()
            .filter(|n| (1..=count).contains(n))
            .collect();
        if valid.is_empty() {
            return Err(NoteError::NoValidIndices { count });
        }

        // Highest first keeps the lower indices pointing at the same lines.
        for n in valid.iter().rev() {
            lines.remove(n - 1);
        }
        store_lines(&path, &lines)?;

        info!(
            group = group.as_str(),
            deleted = valid.len(),
            remaining = lines.len(),
            "deleted gathering codes"
        );
        Ok(DeleteResult::Deleted {
            count: valid.len(),
            remaining: display_lines(&lines),
        })
    }

    /// Remove the whole notepad; succeeds when it is already gone.
    pub async fn clear(&self, group: &GroupKey) -> NoteResult<DeleteResult> {
        let _guard = self.locks.write(group).await;
        match fs::remove_file(self.path_for(group)) {
            Ok(()) => info!(group = group.as_str(), "cleared notepad"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(DeleteResult::All)
    }

    /// Structured view of the stored entries, oldest first.
    pub async fn entries(&self, group: &GroupKey) -> NoteResult<Vec<Entry>> {
        let _guard = self.locks.read(group).await;
        let lines = load_lines(&self.path_for(group))?;
        Ok(lines.iter().map(|l| codec::decode(l)).collect())
    }
}

/// 1-based position among the lines that decode, not among all lines.
fn find_duplicate(lines: &[String], code: &str, timestamp: bool) -> Option<usize> {
    lines
        .iter()
        .filter_map(|l| codec::decode_for_dedup(l, timestamp))
        .position(|c| c == code)
        .map(|i| i + 1)
}

fn display_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|l| codec::decode_for_display(l).to_string())
        .collect()
}

fn load_lines(path: &Path) -> io::Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(txt) => Ok(txt.lines().map(str::to_string).collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

fn store_lines(path: &Path, lines: &[String]) -> io::Result<()> {
    let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    atomic_write(path, content.as_bytes())
}

fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut tmp = path.to_path_buf();
    tmp.set_extension("txt.tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}
