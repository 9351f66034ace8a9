//! Endpoint clients and the per-job client cache.
//!
//! A job talks to endpoints through `DocumentClient` handles acquired from an
//! `EndpointResolver`. Handles are expensive and must be released, so each job
//! keeps at most one per authority in its `ClientCache` and releases them all
//! in one pass when its work is done.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::model::DocumentInfo;

/// A live connection to an endpoint.
///
/// Copy and move default to `Unsupported` so endpoints only implement what
/// they can serve.
pub trait DocumentClient: Send + Sync {
    /// Authority this handle was acquired for.
    fn authority(&self) -> &str;

    /// Copy `src` into the directory `target_parent`, returning the new document.
    fn copy_document(
        &self,
        src: &DocumentInfo,
        target_parent: &DocumentInfo,
    ) -> Result<DocumentInfo, RemoteError> {
        let _ = (src, target_parent);
        Err(RemoteError::Unsupported {
            authority: self.authority().to_string(),
            operation: "copy",
        })
    }

    /// Move `src` out of `src_parent` into `target_parent`.
    fn move_document(
        &self,
        src: &DocumentInfo,
        src_parent: &DocumentInfo,
        target_parent: &DocumentInfo,
    ) -> Result<DocumentInfo, RemoteError> {
        let _ = (src, src_parent, target_parent);
        Err(RemoteError::Unsupported {
            authority: self.authority().to_string(),
            operation: "move",
        })
    }

    /// Delete the document identified by `uri`.
    fn delete_document(&self, uri: &str) -> Result<(), RemoteError>;

    /// Give the handle back to the endpoint.
    fn release(&self) -> Result<(), RemoteError>;
}

/// Hosting capability that turns an authority into a client handle.
///
/// Acquisition either yields a usable handle or fails; it never hands out an
/// empty one.
pub trait EndpointResolver: Send + Sync {
    fn acquire(&self, authority: &str) -> Result<Arc<dyn DocumentClient>, RemoteError>;
}

/// Lazily populated authority -> handle map owned by a single job.
pub struct ClientCache {
    resolver: Arc<dyn EndpointResolver>,
    clients: HashMap<String, Arc<dyn DocumentClient>>,
}

impl ClientCache {
    pub fn new(resolver: Arc<dyn EndpointResolver>) -> Self {
        ClientCache {
            resolver,
            clients: HashMap::new(),
        }
    }

    /// Return the handle for the document's authority, acquiring it on first use.
    ///
    /// Acquisition errors propagate; nothing is cached for a failed authority.
    pub fn get_client(
        &mut self,
        doc: &DocumentInfo,
    ) -> Result<Arc<dyn DocumentClient>, RemoteError> {
        if let Some(client) = self.clients.get(&doc.authority) {
            return Ok(Arc::clone(client));
        }

        let client = self.resolver.acquire(&doc.authority)?;
        debug!(authority = %doc.authority, "acquired endpoint client");
        self.clients.insert(doc.authority.clone(), Arc::clone(&client));
        Ok(client)
    }

    /// Release every cached handle, ignoring release failures.
    ///
    /// The cache is drained, so a second call releases nothing. Returns the
    /// number of handles released.
    pub fn release_all(&mut self) -> usize {
        let count = self.clients.len();
        for (authority, client) in self.clients.drain() {
            if let Err(e) = client.release() {
                debug!(%authority, error = %e, "ignoring client release failure");
            }
        }
        count
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Drop for ClientCache {
    fn drop(&mut self) {
        if !self.clients.is_empty() {
            warn!(
                count = self.clients.len(),
                "client cache dropped before cleanup; releasing handles"
            );
            self.release_all();
        }
    }
}

impl fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCache")
            .field("authorities", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}
