//! Deferred release of archive readers.
//!
//! Enumeration hands out [`PackageFile`](crate::PackageFile) values that
//! read from an archive after the call that produced them has returned. The
//! reader behind them is parked in a [`ResourceTracker`] and released
//! together with every other tracked reader when the package is closed.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::io::Seek;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::PackageError;
use crate::Result;

/// An archive reader whose release is deferred to teardown.
///
/// Once released, the reader and its file handle are dropped and every
/// further access fails with [`PackageError::Closed`].
pub struct TrackedArchive<R = File> {
    id: usize,
    reader: Mutex<Option<zip::ZipArchive<R>>>,
}

impl<R: Read + Seek> TrackedArchive<R> {
    fn new(id: usize, reader: zip::ZipArchive<R>) -> Self {
        Self {
            id,
            reader: Mutex::new(Some(reader)),
        }
    }

    /// Returns the tracker-assigned id of this reader.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns `true` until the reader has been released.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.reader.lock().is_some()
    }

    /// Drops the reader. Returns `false` if it was already released.
    pub(crate) fn release(&self) -> bool {
        self.reader.lock().take().is_some()
    }

    /// Runs `f` with exclusive access to the open reader.
    pub(crate) fn with_reader<T>(
        &self,
        f: impl FnOnce(&mut zip::ZipArchive<R>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.reader.lock();
        let reader = guard.as_mut().ok_or(PackageError::Closed)?;
        f(reader)
    }
}

impl<R> fmt::Debug for TrackedArchive<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedArchive")
            .field("id", &self.id)
            .field("open", &self.reader.lock().is_some())
            .finish()
    }
}

/// Collection of readers released together by [`release_all`](Self::release_all).
///
/// Released readers stay in the collection so their state can still be
/// queried.
pub struct ResourceTracker<R = File> {
    resources: Vec<Arc<TrackedArchive<R>>>,
}

impl<R: Read + Seek> ResourceTracker<R> {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
        }
    }

    /// Takes ownership of `reader` until [`release_all`](Self::release_all).
    pub fn track(&mut self, reader: zip::ZipArchive<R>) -> Arc<TrackedArchive<R>> {
        let tracked = Arc::new(TrackedArchive::new(self.resources.len(), reader));
        self.resources.push(Arc::clone(&tracked));
        debug!(id = tracked.id(), total = self.resources.len(), "tracking archive reader");
        tracked
    }

    /// Returns every reader tracked so far, released or not.
    #[must_use]
    pub fn resources(&self) -> &[Arc<TrackedArchive<R>>] {
        &self.resources
    }

    /// Returns the number of tracked readers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns `true` if nothing has been tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Returns the number of tracked readers not yet released.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.resources.iter().filter(|r| r.is_open()).count()
    }

    /// Releases every tracked reader and returns how many were still open.
    ///
    /// Already-released readers are skipped, so calling this again is a
    /// no-op that returns 0.
    pub fn release_all(&mut self) -> usize {
        let released = self.resources.iter().filter(|r| r.release()).count();
        if released > 0 {
            debug!(released, "released archive readers");
        }
        released
    }
}

impl<R: Read + Seek> Default for ResourceTracker<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for ResourceTracker<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTracker")
            .field("resources", &self.resources)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::PackageBuilder;
    use std::io::Cursor;

    fn reader() -> zip::ZipArchive<Cursor<Vec<u8>>> {
        let data = PackageBuilder::new().add_file("a.txt", b"a").build();
        zip::ZipArchive::new(Cursor::new(data)).unwrap()
    }

    #[test]
    fn test_track_and_release() {
        let mut tracker = ResourceTracker::new();
        let first = tracker.track(reader());
        let second = tracker.track(reader());

        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.open_count(), 2);
        assert_ne!(first.id(), second.id());

        assert_eq!(tracker.release_all(), 2);
        assert!(!first.is_open());
        assert!(!second.is_open());
        assert_eq!(tracker.open_count(), 0);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_release_all_is_idempotent() {
        let mut tracker = ResourceTracker::new();
        tracker.track(reader());

        assert_eq!(tracker.release_all(), 1);
        assert_eq!(tracker.release_all(), 0);
    }

    #[test]
    fn test_release_tolerates_already_released_member() {
        let mut tracker = ResourceTracker::new();
        let first = tracker.track(reader());
        tracker.track(reader());

        assert!(first.release());
        assert_eq!(tracker.release_all(), 1);
    }

    #[test]
    fn test_with_reader_after_release() {
        let mut tracker = ResourceTracker::new();
        let tracked = tracker.track(reader());

        let len = tracked.with_reader(|r| Ok(r.len())).unwrap();
        assert_eq!(len, 1);

        tracker.release_all();
        let result = tracked.with_reader(|r| Ok(r.len()));
        assert!(matches!(result, Err(PackageError::Closed)));
    }

    #[test]
    fn test_empty_tracker() {
        let mut tracker: ResourceTracker<Cursor<Vec<u8>>> = ResourceTracker::default();
        assert!(tracker.is_empty());
        assert_eq!(tracker.release_all(), 0);
    }
}
