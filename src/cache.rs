// cache.rs

use tracing::info;

use crate::config::Sources;
use crate::error::Result;

/// Holds at most one loaded value, tagged with the sources it came from.
///
/// Populated on first access, reused while the key matches, and dropped
/// only by [`DatasetCache::invalidate`] or by asking for a different key.
#[derive(Debug)]
pub struct DatasetCache<T> {
    entry: Option<(Sources, T)>,
    loads: usize,
}

impl<T> Default for DatasetCache<T> {
    fn default() -> Self {
        DatasetCache {
            entry: None,
            loads: 0,
        }
    }
}

impl<T> DatasetCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load<F>(&mut self, key: &Sources, load: F) -> Result<&T>
    where
        F: FnOnce(&Sources) -> Result<T>,
    {
        let entry = match self.entry.take() {
            Some((cached, value)) if cached == *key => (cached, value),
            _ => {
                let value = load(key)?;
                self.loads += 1;
                info!(loads = self.loads, data_dir = %key.data_dir.display(), "dataset cache populated");
                (key.clone(), value)
            }
        };
        let (_, value) = self.entry.insert(entry);
        Ok(value)
    }

    /// The cached value, if the cache currently holds one for `key`.
    pub fn peek(&self, key: &Sources) -> Option<&T> {
        match &self.entry {
            Some((cached, value)) if cached == key => Some(value),
            _ => None,
        }
    }

    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            info!("dataset cache invalidated");
        }
    }

    /// Number of times the loader has actually run.
    pub fn loads(&self) -> usize {
        self.loads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use std::path::PathBuf;

    #[test]
    fn loads_once_per_key() {
        let mut cache = DatasetCache::new();
        let key = Sources::default();
        assert_eq!(*cache.get_or_load(&key, |_| Ok(1)).unwrap(), 1);
        assert_eq!(*cache.get_or_load(&key, |_| Ok(2)).unwrap(), 1);
        assert_eq!(cache.loads(), 1);
    }

    #[test]
    fn invalidate_forces_reload() {
        let mut cache = DatasetCache::new();
        let key = Sources::default();
        cache.get_or_load(&key, |_| Ok("first")).unwrap();
        cache.invalidate();
        assert!(cache.peek(&key).is_none());
        assert_eq!(*cache.get_or_load(&key, |_| Ok("second")).unwrap(), "second");
        assert_eq!(cache.loads(), 2);
    }

    #[test]
    fn different_key_reloads() {
        let mut cache = DatasetCache::new();
        let a = Sources::default();
        let b = Sources {
            data_dir: PathBuf::from("elsewhere"),
            ..Sources::default()
        };
        cache.get_or_load(&a, |_| Ok('a')).unwrap();
        assert_eq!(*cache.get_or_load(&b, |_| Ok('b')).unwrap(), 'b');
        assert!(cache.peek(&a).is_none());
    }

    #[test]
    fn failed_load_leaves_cache_empty() {
        let mut cache: DatasetCache<u8> = DatasetCache::new();
        let key = Sources::default();
        let err = cache
            .get_or_load(&key, |_| Err(DashboardError::Render("boom".into())))
            .unwrap_err();
        assert!(matches!(err, DashboardError::Render(_)));
        assert!(cache.peek(&key).is_none());
        assert_eq!(cache.loads(), 0);
    }

    #[test]
    fn failed_load_for_new_key_drops_stale_entry() {
        let mut cache = DatasetCache::new();
        let a = Sources::default();
        let b = Sources {
            data_dir: PathBuf::from("elsewhere"),
            ..Sources::default()
        };
        cache.get_or_load(&a, |_| Ok(1)).unwrap();
        assert!(cache.get_or_load(&b, |_| Err(DashboardError::Render("boom".into()))).is_err());
        assert!(cache.peek(&a).is_none());
        assert!(cache.peek(&b).is_none());
    }
}
