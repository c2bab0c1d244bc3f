//! Draft persistence.
//!
//! Drafts of existing load balancers are mirrored to a keyed repository so an
//! interrupted edit can resume. The stored value is the draft serialized as
//! JSON; it is not a compatibility surface.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::{LbType, LoadBalancerDraft};

// ── Keys ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    /// Key for editing an existing resource, e.g. `alb-form-alb-7f3a9c21`.
    pub fn for_edit(lb_type: LbType, resource_id: &str) -> Self {
        Self(format!("{}-form-{}", lb_type.key_prefix(), resource_id))
    }

    /// Constant placeholder key for create mode. Nothing is ever read from it.
    pub fn for_create(lb_type: LbType) -> Self {
        Self(format!("{}-form-new", lb_type.key_prefix()))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource id for edit keys; `None` for create placeholders or foreign keys.
    pub fn resource_id(&self) -> Option<&str> {
        let rest = self
            .0
            .strip_prefix("alb-form-")
            .or_else(|| self.0.strip_prefix("nlb-form-"))?;
        if rest == "new" || rest.is_empty() { None } else { Some(rest) }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Repository trait ──────────────────────────────────────────────────────────

pub trait DraftRepository {
    /// `Ok(None)` when nothing is stored; `Err(CorruptDraft)` when the entry
    /// exists but cannot be parsed.
    fn load(&self, key: &StorageKey) -> Result<Option<LoadBalancerDraft>>;
    fn save(&mut self, key: &StorageKey, draft: &LoadBalancerDraft) -> Result<()>;
    fn clear(&mut self, key: &StorageKey) -> Result<()>;
    fn keys(&self) -> Result<Vec<StorageKey>>;
}

fn decode(key: &StorageKey, raw: &str) -> Result<LoadBalancerDraft> {
    serde_json::from_str(raw).map_err(|e| AppError::CorruptDraft {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

// ── File-backed repository ────────────────────────────────────────────────────

/// One `<key>.json` file per draft under a directory.
#[derive(Debug, Clone)]
pub struct FileRepository {
    dir: PathBuf,
}

pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/root".into()))
                .join(".local")
                .join("share")
        })
        .join("lbdraft")
        .join("drafts")
}

impl FileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &StorageKey) -> Result<PathBuf> {
        let k = key.as_str();
        if k.is_empty() || k.contains(['/', '\\']) || k.starts_with('.') {
            return Err(AppError::Storage(format!("invalid storage key '{}'", k)));
        }
        Ok(self.dir.join(format!("{}.json", k)))
    }
}

impl DraftRepository for FileRepository {
    fn load(&self, key: &StorageKey) -> Result<Option<LoadBalancerDraft>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        decode(key, &content).map(Some)
    }

    fn save(&mut self, key: &StorageKey, draft: &LoadBalancerDraft) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(draft)?;

        // Write to a sibling temp file and rename so a crash never leaves half a draft.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(json.as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))?;
        }
        tmp.persist(&path).map_err(|e| AppError::Io(e.error))?;
        debug!(key = %key, path = %path.display(), "draft written");
        Ok(())
    }

    fn clear(&mut self, key: &StorageKey) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(key = %key, "draft cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<StorageKey>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };
        let mut keys = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(StorageKey::from_raw(stem));
            }
        }
        keys.sort();
        Ok(keys)
    }
}

// ── In-memory repository ──────────────────────────────────────────────────────

/// Serialized drafts in a shared map. Clones see the same entries, so a second
/// session can observe what a first one wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    entries: Rc<RefCell<BTreeMap<StorageKey, String>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text under a key, bypassing serialization.
    #[cfg(test)]
    pub fn insert_raw(&self, key: &StorageKey, raw: &str) {
        self.entries.borrow_mut().insert(key.clone(), raw.to_string());
    }

    #[cfg(test)]
    pub fn contains(&self, key: &StorageKey) -> bool {
        self.entries.borrow().contains_key(key)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl DraftRepository for MemoryRepository {
    fn load(&self, key: &StorageKey) -> Result<Option<LoadBalancerDraft>> {
        match self.entries.borrow().get(key) {
            Some(raw) => decode(key, raw).map(Some),
            None => Ok(None),
        }
    }

    fn save(&mut self, key: &StorageKey, draft: &LoadBalancerDraft) -> Result<()> {
        let raw = serde_json::to_string(draft)?;
        self.entries.borrow_mut().insert(key.clone(), raw);
        Ok(())
    }

    fn clear(&mut self, key: &StorageKey) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<StorageKey>> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Listener;
    use pretty_assertions::assert_eq;

    fn sample() -> LoadBalancerDraft {
        let mut d = LoadBalancerDraft::new(LbType::Alb);
        d.name = "web".into();
        d.region = "us-east-1".into();
        d.listeners.push(Listener::new_for(LbType::Alb));
        d
    }

    #[test]
    fn keys_follow_mode_and_type() {
        assert_eq!(StorageKey::for_edit(LbType::Alb, "alb-1").as_str(), "alb-form-alb-1");
        assert_eq!(StorageKey::for_edit(LbType::Nlb, "x").as_str(), "nlb-form-x");
        assert_eq!(StorageKey::for_create(LbType::Alb).as_str(), "alb-form-new");
        assert_eq!(StorageKey::for_edit(LbType::Alb, "alb-1").resource_id(), Some("alb-1"));
        assert_eq!(StorageKey::for_create(LbType::Nlb).resource_id(), None);
        assert_eq!(StorageKey::from_raw("other").resource_id(), None);
    }

    #[test]
    fn file_repository_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = FileRepository::new(dir.path().join("drafts"));
        let key = StorageKey::for_edit(LbType::Alb, "alb-1");
        let draft = sample();

        assert_eq!(repo.load(&key).unwrap(), None);
        repo.save(&key, &draft).unwrap();
        assert_eq!(repo.load(&key).unwrap(), Some(draft));
        assert_eq!(repo.keys().unwrap(), vec![key.clone()]);

        repo.clear(&key).unwrap();
        assert_eq!(repo.load(&key).unwrap(), None);
        // Clearing twice is fine.
        repo.clear(&key).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn file_repository_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let mut repo = FileRepository::new(dir.path());
        let key = StorageKey::for_edit(LbType::Alb, "alb-3");
        repo.save(&key, &sample()).unwrap();
        let mode = std::fs::metadata(dir.path().join("alb-form-alb-3.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path());
        let key = StorageKey::for_edit(LbType::Alb, "broken");
        std::fs::write(dir.path().join("alb-form-broken.json"), "{not json").unwrap();
        assert!(matches!(repo.load(&key), Err(AppError::CorruptDraft { .. })));
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path());
        assert!(repo.load(&StorageKey::from_raw("../escape")).is_err());
    }

    #[test]
    fn missing_directory_has_no_keys() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path().join("absent"));
        assert!(repo.keys().unwrap().is_empty());
    }

    #[test]
    fn memory_repository_clones_share_entries() {
        let mut a = MemoryRepository::new();
        let b = a.clone();
        let key = StorageKey::for_edit(LbType::Nlb, "n1");
        let draft = sample();
        a.save(&key, &draft).unwrap();
        assert!(b.contains(&key));
        assert_eq!(b.load(&key).unwrap(), Some(draft));
        a.clear(&key).unwrap();
        assert!(b.is_empty());
    }

    #[test]
    fn memory_repository_reports_corrupt_entries() {
        let repo = MemoryRepository::new();
        let key = StorageKey::for_edit(LbType::Alb, "bad");
        repo.insert_raw(&key, "[1, 2");
        assert!(matches!(repo.load(&key), Err(AppError::CorruptDraft { .. })));
    }
}
