//! Logical template names and the bundles that own them.
//!
//! A namespace has the form `bundle:relative/path`. The bundle part names a
//! registered bundle directory and may not contain a path separator; the
//! relative part is a `/`-separated path without empty, `.` or `..` segments.
//! Together these rules keep the `:` → `/` rewrite used for override paths
//! injective.

use crate::constants::NAMESPACE_SEPARATOR;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    bundle: String,
    path: String,
}

impl Namespace {
    /// Parses `bundle:relative/path`.
    pub fn parse(namespace: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidNamespace {
            namespace: namespace.to_string(),
            reason: reason.to_string(),
        };

        let (bundle, path) = namespace
            .split_once(NAMESPACE_SEPARATOR)
            .ok_or_else(|| invalid("missing ':' between bundle and path"))?;

        if bundle.is_empty() {
            return Err(invalid("empty bundle name"));
        }
        if bundle.contains(['/', '\\']) {
            return Err(invalid("bundle name contains a path separator"));
        }
        if path.contains(NAMESPACE_SEPARATOR) {
            return Err(invalid("more than one ':'"));
        }
        if path.contains('\\') {
            return Err(invalid("relative path must use '/'"));
        }
        if path.split('/').any(|segment| matches!(segment, "" | "." | "..")) {
            return Err(invalid("empty or relative path segment"));
        }

        Ok(Self { bundle: bundle.to_string(), path: path.to_string() })
    }

    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    /// The relative template path, without extension.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/')
    }

    /// Inserts `subpath` between the bundle and the relative path:
    /// `demo:default/index` + `views` → `demo:views/default/index`.
    pub fn inject_subpath(&self, subpath: &str) -> Self {
        Self { bundle: self.bundle.clone(), path: format!("{subpath}/{}", self.path) }
    }

    /// Namespace of the template `name` living next to this one.
    pub fn sibling(&self, name: &str) -> Self {
        let path = match self.path.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{name}"),
            None => name.to_string(),
        };
        Self { bundle: self.bundle.clone(), path }
    }

    /// Appends the relative path to `base`, one segment at a time, with
    /// `.extension` on the last segment.
    pub fn join_onto(&self, base: &Path, extension: &str) -> PathBuf {
        let mut joined = base.to_path_buf();
        let mut segments = self.segments().peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_some() || extension.is_empty() {
                joined.push(segment);
            } else {
                joined.push(format!("{segment}.{extension}"));
            }
        }
        joined
    }
}

impl FromStr for Namespace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.bundle, NAMESPACE_SEPARATOR, self.path)
    }
}

/// Maps bundle names to the directories they were installed in.
#[derive(Debug, Clone, Default)]
pub struct NamespaceResolver {
    bundles: IndexMap<String, PathBuf>,
}

impl NamespaceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_bundle(&mut self, name: impl Into<String>, root: impl Into<PathBuf>) {
        self.bundles.insert(name.into(), root.into());
    }

    /// Root directory of the bundle owning `namespace`.
    pub fn bundle_root(&self, namespace: &Namespace) -> Result<&Path> {
        self.bundles.get(namespace.bundle()).map(PathBuf::as_path).ok_or_else(|| {
            Error::UnknownBundle {
                bundle: namespace.bundle().to_string(),
                namespace: namespace.to_string(),
            }
        })
    }

    /// `<bundle root>/<subpath>/<relative path>.<extension>`
    pub fn resolve_with_subpath(
        &self,
        namespace: &Namespace,
        subpath: &str,
        extension: &str,
    ) -> Result<PathBuf> {
        let base = self.bundle_root(namespace)?.join(subpath);
        Ok(namespace.join_onto(&base, extension))
    }
}
