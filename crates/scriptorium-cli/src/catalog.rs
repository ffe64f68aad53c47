//! Directory-backed collection
//!
//! Replays a locked collection described by a JSON manifest:
//!
//! ```json
//! { "pages": [ { "group": 1, "entries": [
//!     { "title": "Codex Aureus", "label": "Siglo XII", "file": "codex.pdf" },
//!     { "title": "Liber Vitae", "label": "Siglo XIV", "file": "vitae.pdf", "code": "AUREUS12" }
//! ] } ] }
//! ```
//!
//! Like a browser session it is positioned on one page at a time and only
//! sees the cards of that page. An entry with a `code` is only handed out
//! when that code is submitted.

use async_trait::async_trait;
use parking_lot::Mutex;
use scriptorium_core::{
    Acquirer, ArtifactRef, CollaboratorError, DiscoveredItem, Group, Lister, Navigator, Session,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Catalog loading errors
#[derive(Debug, thiserror::Error)]
pub(crate) enum CatalogError {
    #[error("cannot read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid catalog {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct Manifest {
    pages: Vec<Page>,
}

#[derive(Debug, Clone, Deserialize)]
struct Page {
    group: Group,
    #[serde(default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Clone, Deserialize)]
struct Entry {
    title: String,
    label: String,
    file: PathBuf,
    #[serde(default)]
    code: Option<String>,
}

/// How an acquisition tried to open an entry
#[derive(Debug, Clone, Copy)]
enum Unlock<'a> {
    WithoutCode,
    Code(&'a str),
}

/// Session over a catalog directory
#[derive(Debug)]
pub(crate) struct CatalogSession {
    root: PathBuf,
    pages: Vec<Page>,
    downloads_dir: PathBuf,
    current: Mutex<Option<Group>>,
    closed: AtomicBool,
}

impl CatalogSession {
    /// Open the catalog at `manifest`; artifacts are copied into `downloads_dir`
    pub(crate) async fn open(
        manifest: &Path,
        downloads_dir: impl Into<PathBuf>,
    ) -> Result<Self, CatalogError> {
        let raw = tokio::fs::read_to_string(manifest)
            .await
            .map_err(|source| CatalogError::Read {
                path: manifest.to_path_buf(),
                source,
            })?;
        let parsed: Manifest = serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: manifest.to_path_buf(),
            source,
        })?;

        let root = manifest
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        tracing::debug!(catalog = %manifest.display(), pages = parsed.pages.len(), "Catalog opened");

        Ok(Self {
            root,
            pages: parsed.pages,
            downloads_dir: downloads_dir.into(),
            current: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), CollaboratorError> {
        if self.closed.load(Ordering::Acquire) {
            Err(CollaboratorError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn page(&self, group: Group) -> Option<&Page> {
        self.pages.iter().find(|page| page.group == group)
    }

    /// Entry with `title` on the page the session is positioned on
    fn visible_entry(&self, title: &str) -> Option<&Entry> {
        let current = (*self.current.lock())?;
        self.page(current)?
            .entries
            .iter()
            .find(|entry| entry.title == title)
    }

    async fn acquire(
        &self,
        title: &str,
        unlock: Unlock<'_>,
    ) -> Result<Option<ArtifactRef>, CollaboratorError> {
        self.ensure_open()?;

        let Some(entry) = self.visible_entry(title) else {
            tracing::warn!(title, "Card not found on current page");
            return Ok(None);
        };

        match (entry.code.as_deref(), unlock) {
            (None, _) => {}
            (Some(expected), Unlock::Code(given)) if expected == given => {
                tracing::debug!(title, "Unlock code accepted");
            }
            (Some(_), Unlock::Code(_)) => {
                tracing::warn!(title, "Unlock code rejected");
                return Ok(None);
            }
            (Some(_), Unlock::WithoutCode) => {
                tracing::warn!(title, "Item is locked");
                return Ok(None);
            }
        }

        self.download(entry).await.map(Some)
    }

    async fn download(&self, entry: &Entry) -> Result<ArtifactRef, CollaboratorError> {
        tokio::fs::create_dir_all(&self.downloads_dir).await?;
        let target = self.downloads_dir.join(artifact_file_name(&entry.title));
        tokio::fs::copy(self.root.join(&entry.file), &target).await?;

        tracing::info!(title = %entry.title, path = %target.display(), "Artifact downloaded");
        Ok(ArtifactRef::new(target))
    }
}

/// `Liber Vitae` becomes `Liber_Vitae.pdf`
fn artifact_file_name(title: &str) -> String {
    format!("{}.pdf", title.split_whitespace().collect::<Vec<_>>().join("_"))
}

#[async_trait]
impl Navigator for CatalogSession {
    async fn goto_context(&self, group: Group) -> Result<(), CollaboratorError> {
        self.ensure_open()?;
        if self.page(group).is_none() {
            return Err(CollaboratorError::NotFound(group.to_string()));
        }
        *self.current.lock() = Some(group);
        Ok(())
    }
}

#[async_trait]
impl Lister for CatalogSession {
    async fn discover(&self, group: Group) -> Result<Vec<DiscoveredItem>, CollaboratorError> {
        self.ensure_open()?;
        let current = *self.current.lock();
        if current != Some(group) {
            return Err(CollaboratorError::Other(format!(
                "session is not positioned on {group}"
            )));
        }
        let page = self
            .page(group)
            .ok_or_else(|| CollaboratorError::NotFound(group.to_string()))?;

        Ok(page
            .entries
            .iter()
            .map(|entry| DiscoveredItem {
                title: entry.title.clone(),
                ordering_label: entry.label.clone(),
                group,
            })
            .collect())
    }
}

#[async_trait]
impl Acquirer for CatalogSession {
    async fn acquire_initial(&self, title: &str) -> Result<Option<ArtifactRef>, CollaboratorError> {
        self.acquire(title, Unlock::WithoutCode).await
    }

    async fn acquire_with_code(
        &self,
        title: &str,
        code: &str,
    ) -> Result<Option<ArtifactRef>, CollaboratorError> {
        self.acquire(title, Unlock::Code(code)).await
    }

    async fn acquire_with_challenge_code(
        &self,
        title: &str,
        derived_code: &str,
    ) -> Result<Option<ArtifactRef>, CollaboratorError> {
        self.acquire(title, Unlock::Code(derived_code)).await
    }
}

#[async_trait]
impl Session for CatalogSession {
    async fn close(&self) -> Result<(), CollaboratorError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("Catalog session closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "pages": [
            { "group": 1, "entries": [
                { "title": "Liber Vitae", "label": "Siglo XIV", "file": "vitae.pdf", "code": "AUREUS12" },
                { "title": "Codex Aureus", "label": "Siglo XII", "file": "aureus.pdf" }
            ] },
            { "group": 2, "entries": [
                { "title": "Voynich", "label": "Siglo XVI", "file": "voynich.pdf", "code": "VXN" }
            ] }
        ]
    }"#;

    async fn catalog() -> (TempDir, CatalogSession) {
        let dir = tempfile::tempdir().unwrap();
        for file in ["vitae.pdf", "aureus.pdf", "voynich.pdf"] {
            std::fs::write(dir.path().join(file), file.as_bytes()).unwrap();
        }
        let manifest = dir.path().join("catalog.json");
        std::fs::write(&manifest, MANIFEST).unwrap();

        let session = CatalogSession::open(&manifest, dir.path().join("downloads"))
            .await
            .unwrap();
        (dir, session)
    }

    #[tokio::test]
    async fn lists_entries_of_positioned_page() {
        let (_dir, session) = catalog().await;

        session.goto_context(Group(1)).await.unwrap();
        let items = session.discover(Group(1)).await.unwrap();

        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Liber Vitae", "Codex Aureus"]);
        assert_eq!(items[1].ordering_label, "Siglo XII");
        assert!(session.discover(Group(2)).await.is_err());
    }

    #[tokio::test]
    async fn unknown_page_is_not_found() {
        let (_dir, session) = catalog().await;
        assert!(matches!(
            session.goto_context(Group(9)).await,
            Err(CollaboratorError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn downloads_open_entry_with_underscored_name() {
        let (dir, session) = catalog().await;
        session.goto_context(Group(1)).await.unwrap();

        let artifact = session.acquire_initial("Codex Aureus").await.unwrap().unwrap();

        assert_eq!(artifact.path(), dir.path().join("downloads/Codex_Aureus.pdf"));
        assert_eq!(std::fs::read(artifact.path()).unwrap(), b"aureus.pdf");
    }

    #[tokio::test]
    async fn locked_entry_needs_matching_code() {
        let (_dir, session) = catalog().await;
        session.goto_context(Group(1)).await.unwrap();

        assert_eq!(session.acquire_initial("Liber Vitae").await.unwrap(), None);
        assert_eq!(
            session.acquire_with_code("Liber Vitae", "WRONG").await.unwrap(),
            None
        );
        assert!(session
            .acquire_with_code("Liber Vitae", "AUREUS12")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn cards_on_other_pages_are_invisible() {
        let (_dir, session) = catalog().await;
        session.goto_context(Group(1)).await.unwrap();

        assert_eq!(
            session.acquire_with_challenge_code("Voynich", "VXN").await.unwrap(),
            None
        );

        session.goto_context(Group(2)).await.unwrap();
        assert!(session
            .acquire_with_challenge_code("Voynich", "VXN")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn closed_session_refuses_work() {
        let (_dir, session) = catalog().await;
        session.close().await.unwrap();
        session.close().await.unwrap();

        assert!(matches!(
            session.goto_context(Group(1)).await,
            Err(CollaboratorError::SessionClosed)
        ));
    }

    #[tokio::test]
    async fn malformed_manifest_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("catalog.json");
        std::fs::write(&manifest, r#"{ "pages": [ { "entries": [] } ] }"#).unwrap();

        let err = CatalogSession::open(&manifest, dir.path()).await.unwrap_err();

        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn file_names_collapse_whitespace() {
        assert_eq!(artifact_file_name("Liber  Vitae"), "Liber_Vitae.pdf");
        assert_eq!(artifact_file_name("Voynich"), "Voynich.pdf");
    }
}
