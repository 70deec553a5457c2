//! Maps template namespaces to files on disk.
//!
//! An application override at
//! `<app resources>/<bundle>/views/<path>.<ext>` wins over the bundle's
//! packaged default at `<bundle root>/lib/resources/views/<path>.<ext>`.
//! The first successful resolution of a namespace is memoized for the life of
//! the resolver.

use crate::constants::{BUNDLE_VIEWS_SUBPATH, VIEWS_SUBPATH};
use crate::error::{Error, Result};
use crate::namespace::{Namespace, NamespaceResolver};
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Non-blocking file existence check.
#[async_trait]
pub trait FileProbe: Send + Sync {
    /// Unreadable paths count as missing.
    async fn exists(&self, path: &Path) -> bool;
}

/// [`FileProbe`] backed by `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFileProbe;

#[async_trait]
impl FileProbe for TokioFileProbe {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

pub struct TemplatePathResolver {
    app_resources: PathBuf,
    namespaces: NamespaceResolver,
    probe: Arc<dyn FileProbe>,
    cache: Mutex<HashMap<String, PathBuf>>,
}

impl TemplatePathResolver {
    /// `app_resources` is the override root, usually `<app_path>/resources`.
    pub fn new(app_resources: impl Into<PathBuf>, namespaces: NamespaceResolver) -> Self {
        Self::with_probe(app_resources, namespaces, Arc::new(TokioFileProbe))
    }

    pub fn with_probe(
        app_resources: impl Into<PathBuf>,
        namespaces: NamespaceResolver,
        probe: Arc<dyn FileProbe>,
    ) -> Self {
        Self {
            app_resources: app_resources.into(),
            namespaces,
            probe,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn app_resources(&self) -> &Path {
        &self.app_resources
    }

    pub fn namespaces(&self) -> &NamespaceResolver {
        &self.namespaces
    }

    /// `<app resources>/<bundle>/views/<path>.<extension>`
    pub fn override_path(&self, namespace: &Namespace, extension: &str) -> PathBuf {
        // ':' becomes `/views/`
        let overridden = namespace.inject_subpath(VIEWS_SUBPATH);
        overridden.join_onto(&self.app_resources.join(overridden.bundle()), extension)
    }

    /// `<bundle root>/lib/resources/views/<path>.<extension>`
    pub fn bundle_path(&self, namespace: &Namespace, extension: &str) -> Result<PathBuf> {
        self.namespaces.resolve_with_subpath(namespace, BUNDLE_VIEWS_SUBPATH, extension)
    }

    /// Resolves `namespace` to a template file, checking the override first.
    pub async fn resolve_path(&self, namespace: &str, extension: &str) -> Result<PathBuf> {
        if let Some(path) = self.cached_path(namespace) {
            debug!("Template path cache hit for '{namespace}'");
            return Ok(path);
        }

        let parsed = Namespace::parse(namespace)?;
        let override_path = self.override_path(&parsed, extension);

        let resolved = if self.probe.exists(&override_path).await {
            debug!("Using override '{}' for '{namespace}'", override_path.display());
            override_path
        } else {
            let bundle_path = self.bundle_path(&parsed, extension)?;
            if !self.probe.exists(&bundle_path).await {
                return Err(unresolvable(namespace, &bundle_path));
            }
            debug!("Using bundle template '{}' for '{namespace}'", bundle_path.display());
            bundle_path
        };

        Ok(self.remember(namespace, resolved))
    }

    /// Blocking variant for callers that cannot suspend, such as a template
    /// engine loading an included template mid-render. Shares the cache.
    pub fn resolve_path_blocking(&self, namespace: &str, extension: &str) -> Result<PathBuf> {
        if let Some(path) = self.cached_path(namespace) {
            return Ok(path);
        }

        let parsed = Namespace::parse(namespace)?;
        let override_path = self.override_path(&parsed, extension);

        let resolved = if override_path.exists() {
            override_path
        } else {
            let bundle_path = self.bundle_path(&parsed, extension)?;
            if !bundle_path.exists() {
                return Err(unresolvable(namespace, &bundle_path));
            }
            bundle_path
        };

        Ok(self.remember(namespace, resolved))
    }

    pub fn cached_path(&self, namespace: &str) -> Option<PathBuf> {
        self.lock_cache().get(namespace).cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    /// Stores `path` unless a concurrent resolution got there first; the
    /// cached entry is returned either way.
    fn remember(&self, namespace: &str, path: PathBuf) -> PathBuf {
        self.lock_cache().entry(namespace.to_string()).or_insert(path).clone()
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<String, PathBuf>> {
        // The map is only ever inserted into; a poisoned guard is still consistent.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn unresolvable(namespace: &str, path: &Path) -> Error {
    Error::TemplatePathUnresolvable {
        namespace: namespace.to_string(),
        path: path.display().to_string(),
    }
}
