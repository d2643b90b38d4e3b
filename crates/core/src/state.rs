//! File-backed report state — the instance identity plus one "already
//! reported" marker per product family.
//!
//! The state file is plain text, one `key:value` pair per line. The reserved
//! `instanceId` key holds the persisted host identifier; every other key is a
//! product family whose presence means a report was already attempted.
//! Marking is append-only so a run never rewrites history; the file is only
//! rewritten wholesale when it is missing or its instance id is malformed.
//!
//! No file locking: two processes racing on a first run can both pass the
//! not-reported check and both send. Accepted limitation — the cost is one
//! duplicate report, not corruption, since both append whole lines.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::identity;

/// Reserved state-file key holding the persisted instance identifier.
pub const INSTANCE_ID_KEY: &str = "instanceId";

/// The loaded (or freshly initialized) per-host report state.
pub struct StateStore {
    path: PathBuf,
    instance_id: String,
    reported: BTreeSet<String>,
}

impl StateStore {
    /// Load the state file at `path`, reinitializing it when missing or
    /// corrupt.
    ///
    /// A file whose `instanceId` entry is absent or not UUID-shaped is
    /// truncated and recreated with a single `instanceId` line, discarding
    /// any markers that preceded it. The id written on (re)initialization
    /// comes from [`identity::resolve_instance_id`], so an externally
    /// supplied id wins over host resolution.
    pub fn load_or_init(path: &Path, supplied_id: Option<&str>) -> Result<Self> {
        if let Some(existing) = Self::try_load(path)? {
            return Ok(existing);
        }
        let instance_id = identity::resolve_instance_id(supplied_id);
        Self::reinit(path, instance_id)
    }

    /// The persisted instance identifier.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Whether `family` already has a reported marker.
    pub fn is_reported(&self, family: &str) -> bool {
        self.reported.contains(family)
    }

    /// Append a reported marker for `family`.
    ///
    /// Append-only: existing content is never rewritten or reordered, so the
    /// operation stays O(1) and is safe against partial prior writes. A
    /// second mark for the same family is a no-op.
    pub fn mark_reported(&mut self, family: &str) -> Result<()> {
        if self.reported.contains(family) {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        writeln!(file, "{family}:1")?;
        self.reported.insert(family.to_string());
        debug!(family, "marked product family as reported");
        Ok(())
    }

    /// Parse an existing state file. Returns `Ok(None)` when the file is
    /// missing or its instance id entry is unusable.
    fn try_load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!(path = %path.display(), "state file does not exist");
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let entries = parse_entries(&content);

        let instance_id = entries
            .iter()
            .find(|(key, _)| key == INSTANCE_ID_KEY)
            .map(|(_, value)| value.clone());
        let instance_id = match instance_id {
            Some(id) if identity::is_valid_instance_id(&id) => id,
            _ => {
                info!(
                    path = %path.display(),
                    "state file has no valid instance id, reinitializing"
                );
                return Ok(None);
            }
        };

        let reported = entries
            .into_iter()
            .filter(|(key, _)| key != INSTANCE_ID_KEY)
            .map(|(key, _)| key)
            .collect();

        Ok(Some(Self {
            path: path.to_path_buf(),
            instance_id,
            reported,
        }))
    }

    /// Truncate and recreate the file with a single `instanceId` line.
    fn reinit(path: &Path, instance_id: String) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, format!("{INSTANCE_ID_KEY}:{instance_id}\n"))?;
        info!(path = %path.display(), "initialized state file");
        Ok(Self {
            path: path.to_path_buf(),
            instance_id,
            reported: BTreeSet::new(),
        })
    }
}

/// Parse `key:value` lines. Lines with no colon or an empty key are skipped;
/// whitespace around keys and values is trimmed.
fn parse_entries(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}
