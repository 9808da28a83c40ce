//! 起動をまたいでセッションを保持するファイル

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sellerdesk_core::impls::SessionToken;

pub struct SessionStore {
    path: Option<PathBuf>,
}

impl SessionStore {
    /// `None` なら保存しない（そのプロセスの間だけ有効）
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn load(&self) -> Result<Option<SessionToken>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read(path)
            .with_context(|| format!("failed to read session file {}", path.display()))?;
        let token = serde_json::from_slice(&raw)
            .with_context(|| format!("corrupt session file {}", path.display()))?;
        Ok(Some(token))
    }

    pub fn save(&self, token: &SessionToken) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let raw = serde_json::to_vec_pretty(token)?;
        std::fs::write(path, raw)
            .with_context(|| format!("failed to write session file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "session saved");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match &self.path {
            Some(path) if path.exists() => std::fs::remove_file(path)
                .with_context(|| format!("failed to remove session file {}", path.display())),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(Some(dir.path().join("nested/session.json")));
        assert_eq!(store.load().unwrap(), None);

        let token = SessionToken::Cookie("auth=abc".into());
        store.save(&token).unwrap();
        assert_eq!(store.load().unwrap(), Some(token));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(SessionStore::new(Some(path)).load().is_err());
    }

    #[test]
    fn without_a_path_nothing_is_persisted() {
        let store = SessionStore::new(None);
        store.save(&SessionToken::Bearer("t".into())).unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(store.path().is_none());
    }
}
