//! Local filesystem endpoint.
//!
//! `LocalResolver` maps authorities to root directories on disk. Document ids
//! are `/`-separated paths relative to the root, with `""` naming the root
//! itself. Clients only operate within their own root; copying to another
//! authority is reported as unsupported.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::client::{DocumentClient, EndpointResolver};
use crate::error::RemoteError;
use crate::fs_ops;
use crate::model::{build_document_uri, DocumentFlags, DocumentInfo};

const FILE_MIME_TYPE: &str = "application/octet-stream";

/// Resolver for authorities backed by local directories.
#[derive(Debug, Default, Clone)]
pub struct LocalResolver {
    roots: HashMap<String, PathBuf>,
}

impl LocalResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `authority` from the directory `root`.
    pub fn with_root(mut self, authority: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.roots.insert(authority.into(), root.into());
        self
    }

    fn root(&self, authority: &str) -> Result<&Path, RemoteError> {
        self.roots
            .get(authority)
            .map(PathBuf::as_path)
            .ok_or_else(|| RemoteError::UnknownAuthority {
                authority: authority.to_string(),
            })
    }

    /// Describe the document at `document_id` from what is on disk.
    ///
    /// Ids that would leave the root (`..`, absolute paths) are rejected with
    /// `RemoteError::InvalidUri`.
    pub fn document(
        &self,
        authority: &str,
        document_id: &str,
    ) -> Result<DocumentInfo, RemoteError> {
        let root = self.root(authority)?;
        let document_id = document_id.trim_matches('/');
        describe(authority, root, document_id)
    }
}

impl EndpointResolver for LocalResolver {
    fn acquire(&self, authority: &str) -> Result<Arc<dyn DocumentClient>, RemoteError> {
        let root = self.root(authority)?;
        Ok(Arc::new(LocalClient {
            authority: authority.to_string(),
            root: root.to_path_buf(),
            released: AtomicBool::new(false),
        }))
    }
}

/// Join `document_id` onto `root`, refusing ids that escape it.
fn resolve(authority: &str, root: &Path, document_id: &str) -> Result<PathBuf, RemoteError> {
    let escapes = Path::new(document_id)
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(RemoteError::InvalidUri {
            authority: authority.to_string(),
            uri: build_document_uri(authority, document_id),
        });
    }
    Ok(root.join(document_id))
}

fn describe(authority: &str, root: &Path, document_id: &str) -> Result<DocumentInfo, RemoteError> {
    let path = resolve(authority, root, document_id)?;
    let metadata = fs::metadata(&path).map_err(|source| RemoteError::Io {
        uri: build_document_uri(authority, document_id),
        source,
    })?;

    let display_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(authority)
        .to_string();
    let mime_type = if metadata.is_dir() {
        DocumentInfo::DIRECTORY_MIME_TYPE
    } else {
        FILE_MIME_TYPE
    };
    let writable = !metadata.permissions().readonly();

    Ok(DocumentInfo::new(authority, document_id, display_name, mime_type)
        .with_size(if metadata.is_dir() { 0 } else { metadata.len() })
        .with_flags(DocumentFlags {
            supports_delete: writable,
            supports_move: writable,
            is_virtual: false,
            is_directory: metadata.is_dir(),
        }))
}

fn child_id(parent_id: &str, name: &str) -> String {
    if parent_id.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent_id, name)
    }
}

/// Client handle for one local authority.
#[derive(Debug)]
pub struct LocalClient {
    authority: String,
    root: PathBuf,
    released: AtomicBool,
}

impl LocalClient {
    fn check_live(&self) -> Result<(), RemoteError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(RemoteError::Released {
                authority: self.authority.clone(),
            });
        }
        Ok(())
    }

    fn check_owned(&self, doc: &DocumentInfo, operation: &'static str) -> Result<(), RemoteError> {
        if doc.authority != self.authority {
            return Err(RemoteError::Unsupported {
                authority: self.authority.clone(),
                operation,
            });
        }
        Ok(())
    }

    fn path_of(&self, document_id: &str) -> Result<PathBuf, RemoteError> {
        resolve(&self.authority, &self.root, document_id)
    }

    fn io_error(uri: &str) -> impl FnOnce(io::Error) -> RemoteError + '_ {
        move |source| RemoteError::Io {
            uri: uri.to_string(),
            source,
        }
    }

    fn target_of(
        &self,
        src: &DocumentInfo,
        target_parent: &DocumentInfo,
    ) -> Result<(String, PathBuf), RemoteError> {
        let id = child_id(&target_parent.document_id, &src.display_name);
        let path = self.path_of(&id)?;
        Ok((id, path))
    }
}

impl DocumentClient for LocalClient {
    fn authority(&self) -> &str {
        &self.authority
    }

    fn copy_document(
        &self,
        src: &DocumentInfo,
        target_parent: &DocumentInfo,
    ) -> Result<DocumentInfo, RemoteError> {
        self.check_live()?;
        self.check_owned(src, "copy")?;
        self.check_owned(target_parent, "copy across endpoints")?;

        let from = self.path_of(&src.document_id)?;
        let (id, to) = self.target_of(src, target_parent)?;

        let copied = if src.is_directory() {
            fs_ops::copy_tree(&from, &to)
        } else {
            fs_ops::copy_file_with_metadata(&from, &to)
        };
        let bytes = copied.map_err(Self::io_error(&src.derived_uri))?;

        debug!(
            from = %src.derived_uri,
            to = %build_document_uri(&self.authority, &id),
            bytes,
            "copied document"
        );
        describe(&self.authority, &self.root, &id)
    }

    fn move_document(
        &self,
        src: &DocumentInfo,
        _src_parent: &DocumentInfo,
        target_parent: &DocumentInfo,
    ) -> Result<DocumentInfo, RemoteError> {
        self.check_live()?;
        self.check_owned(src, "move")?;
        self.check_owned(target_parent, "move across endpoints")?;

        let from = self.path_of(&src.document_id)?;
        let (id, to) = self.target_of(src, target_parent)?;

        fs_ops::ensure_parent_dir_exists(&to)
            .and_then(|_| fs::rename(&from, &to))
            .map_err(Self::io_error(&src.derived_uri))?;

        describe(&self.authority, &self.root, &id)
    }

    fn delete_document(&self, uri: &str) -> Result<(), RemoteError> {
        self.check_live()?;

        let prefix = build_document_uri(&self.authority, "");
        let document_id = uri
            .strip_prefix(&prefix)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RemoteError::InvalidUri {
                authority: self.authority.clone(),
                uri: uri.to_string(),
            })?;

        let path = self.path_of(document_id)?;
        fs_ops::remove_path(&path).map_err(Self::io_error(uri))
    }

    /// Releasing twice is harmless.
    fn release(&self) -> Result<(), RemoteError> {
        if !self.released.swap(true, Ordering::SeqCst) {
            debug!(authority = %self.authority, "released local client");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, LocalResolver) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("src/sub")).expect("Failed to create src");
        fs::create_dir_all(temp_dir.path().join("dst")).expect("Failed to create dst");
        fs::write(temp_dir.path().join("src/a.txt"), b"alpha").expect("Failed to write a");
        fs::write(temp_dir.path().join("src/sub/b.txt"), b"beta").expect("Failed to write b");
        let resolver = LocalResolver::new().with_root("local", temp_dir.path());
        (temp_dir, resolver)
    }

    #[test]
    fn test_document_describes_files_and_directories() {
        let (_temp_dir, resolver) = setup();

        let file = resolver.document("local", "src/a.txt").expect("describe file");
        assert_eq!(file.display_name, "a.txt");
        assert_eq!(file.size, 5);
        assert_eq!(file.derived_uri, "content://local/document/src/a.txt");
        assert!(!file.is_directory());

        let dir = resolver.document("local", "/src/sub/").expect("describe dir");
        assert_eq!(dir.document_id, "src/sub");
        assert!(dir.is_directory());

        assert!(matches!(
            resolver.document("local", "missing"),
            Err(RemoteError::Io { .. })
        ));
    }

    #[test]
    fn test_acquire_unknown_authority_fails() {
        let (_temp_dir, resolver) = setup();
        assert!(matches!(
            resolver.acquire("elsewhere"),
            Err(RemoteError::UnknownAuthority { .. })
        ));
    }

    #[test]
    fn test_copy_file_and_directory() {
        let (temp_dir, resolver) = setup();
        let client = resolver.acquire("local").expect("acquire");
        let dst = resolver.document("local", "dst").expect("dst");

        let file = resolver.document("local", "src/a.txt").expect("a");
        let copied = client.copy_document(&file, &dst).expect("copy file");
        assert_eq!(copied.document_id, "dst/a.txt");
        assert_eq!(fs::read_to_string(temp_dir.path().join("dst/a.txt")).unwrap(), "alpha");

        let sub = resolver.document("local", "src/sub").expect("sub");
        client.copy_document(&sub, &dst).expect("copy dir");
        assert_eq!(fs::read_to_string(temp_dir.path().join("dst/sub/b.txt")).unwrap(), "beta");
    }

    #[test]
    fn test_copy_across_authorities_is_unsupported() {
        let (temp_dir, _) = setup();
        let resolver = LocalResolver::new()
            .with_root("local", temp_dir.path())
            .with_root("other", temp_dir.path().join("dst"));
        let client = resolver.acquire("local").expect("acquire");
        let file = resolver.document("local", "src/a.txt").expect("a");
        let other_root = resolver.document("other", "").expect("other root");

        assert!(matches!(
            client.copy_document(&file, &other_root),
            Err(RemoteError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_move_renames_within_root() {
        let (temp_dir, resolver) = setup();
        let client = resolver.acquire("local").expect("acquire");
        let src_parent = resolver.document("local", "src").expect("src");
        let dst = resolver.document("local", "dst").expect("dst");
        let file = resolver.document("local", "src/a.txt").expect("a");

        let moved = client.move_document(&file, &src_parent, &dst).expect("move");
        assert_eq!(moved.document_id, "dst/a.txt");
        assert!(!temp_dir.path().join("src/a.txt").exists());
        assert!(temp_dir.path().join("dst/a.txt").exists());
    }

    #[test]
    fn test_delete_by_uri() {
        let (temp_dir, resolver) = setup();
        let client = resolver.acquire("local").expect("acquire");

        client
            .delete_document("content://local/document/src/sub")
            .expect("delete dir");
        assert!(!temp_dir.path().join("src/sub").exists());

        assert!(matches!(
            client.delete_document("content://other/document/src/a.txt"),
            Err(RemoteError::InvalidUri { .. })
        ));
        assert!(matches!(
            client.delete_document("content://local/document/src/missing"),
            Err(RemoteError::Io { .. })
        ));
    }

    #[test]
    fn test_ids_outside_root_are_rejected() {
        let (temp_dir, _) = setup();
        fs::write(temp_dir.path().join("secret.txt"), b"keep").expect("Failed to write secret");
        let resolver = LocalResolver::new().with_root("local", temp_dir.path().join("src"));
        let client = resolver.acquire("local").expect("acquire");

        assert!(matches!(
            resolver.document("local", "../secret.txt"),
            Err(RemoteError::InvalidUri { .. })
        ));
        assert!(matches!(
            resolver.document("local", "sub/../../secret.txt"),
            Err(RemoteError::InvalidUri { .. })
        ));
        assert!(matches!(
            client.delete_document("content://local/document/../secret.txt"),
            Err(RemoteError::InvalidUri { .. })
        ));
        assert!(matches!(
            client.delete_document("content://local/document//etc"),
            Err(RemoteError::InvalidUri { .. })
        ));

        let outside = DocumentInfo::new("local", "../secret.txt", "secret.txt", FILE_MIME_TYPE);
        let sub = resolver.document("local", "sub").expect("sub");
        assert!(matches!(
            client.copy_document(&outside, &sub),
            Err(RemoteError::InvalidUri { .. })
        ));

        assert!(temp_dir.path().join("secret.txt").exists());
        assert!(temp_dir.path().join("src/a.txt").exists());
    }

    #[test]
    fn test_copy_directory_into_itself_fails_cleanly() {
        let (temp_dir, resolver) = setup();
        let client = resolver.acquire("local").expect("acquire");
        let src = resolver.document("local", "src").expect("src");
        let sub = resolver.document("local", "src/sub").expect("sub");

        let err = client.copy_document(&src, &sub).expect_err("copy into descendant");
        assert!(matches!(err, RemoteError::Io { .. }));
        assert!(!temp_dir.path().join("src/sub/src").exists());

        let err = client.copy_document(&src, &src).expect_err("copy into itself");
        assert!(matches!(err, RemoteError::Io { .. }));
        assert!(!temp_dir.path().join("src/src").exists());
    }

    #[test]
    fn test_released_client_rejects_requests() {
        let (_temp_dir, resolver) = setup();
        let client = resolver.acquire("local").expect("acquire");

        client.release().expect("release");
        client.release().expect("second release");

        assert!(matches!(
            client.delete_document("content://local/document/src/a.txt"),
            Err(RemoteError::Released { .. })
        ));
    }
}
