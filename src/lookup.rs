use crate::error::Result;

/// Typed lookup of a startup-registered service by id.
///
/// Implementations fail with [`crate::error::Error::NotRegistered`] for
/// unknown ids.
pub trait Lookup<T> {
    fn lookup(&self, id: &str) -> Result<T>;

    fn contains(&self, id: &str) -> bool {
        self.lookup(id).is_ok()
    }
}
