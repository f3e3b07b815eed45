//! Memoized tokenizer handles, one per scheme

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokcache_core::Result;
use tracing::debug;

use crate::backend::TokenizerBackend;

/// Lazily built tokenizer handles keyed by scheme name.
///
/// A handle is constructed at most once per scheme and kept for the lifetime
/// of the cache. Schemes the backend does not recognise are served by the
/// backend's fallback handle, cached under the requested name.
pub struct TokenizerCache<B: TokenizerBackend> {
    backend: B,
    handles: Mutex<HashMap<String, Arc<B::Handle>>>,
}

impl<B: TokenizerBackend> TokenizerCache<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get the handle for `scheme`, constructing it on first use
    pub fn get_or_create(&self, scheme: &str) -> Result<Arc<B::Handle>> {
        let mut handles = self.lock();
        if let Some(handle) = handles.get(scheme) {
            return Ok(Arc::clone(handle));
        }

        let handle = match self.backend.for_scheme(scheme) {
            Ok(handle) => handle,
            Err(e) => {
                debug!("No tokenizer for scheme '{}' ({}), using fallback", scheme, e);
                self.backend.fallback()?
            }
        };

        let handle = Arc::new(handle);
        handles.insert(scheme.to_string(), Arc::clone(&handle));
        debug!("Cached tokenizer for scheme '{}' ({} cached)", scheme, handles.len());
        Ok(handle)
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.lock().contains_key(scheme)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Cached scheme names, sorted
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.lock().keys().cloned().collect();
        schemes.sort();
        schemes
    }

    // Entries are only inserted fully constructed, so a poisoned map is still consistent
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<B::Handle>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    #[test]
    fn test_constructs_once_per_scheme() {
        let cache = TokenizerCache::new(FakeBackend::new(&["gpt-4", "gpt-4o"]));

        let first = cache.get_or_create("gpt-4").unwrap();
        let second = cache.get_or_create("gpt-4").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.backend().constructions(), 1);

        cache.get_or_create("gpt-4o").unwrap();
        assert_eq!(cache.backend().constructions(), 2);
        assert_eq!(cache.schemes(), vec!["gpt-4", "gpt-4o"]);
    }

    #[test]
    fn test_unknown_scheme_cached_under_original_name() {
        let cache = TokenizerCache::new(FakeBackend::new(&["gpt-4"]));

        let handle = cache.get_or_create("mystery").unwrap();
        assert_eq!(handle.scheme(), "fallback");
        assert!(cache.contains("mystery"));
        assert!(!cache.contains("fallback"));

        let again = cache.get_or_create("mystery").unwrap();
        assert!(Arc::ptr_eq(&handle, &again));
        assert_eq!(cache.backend().specialized_attempts(), 1);
        assert_eq!(cache.backend().fallback_constructions(), 1);
    }

    #[test]
    fn test_failed_fallback_leaves_cache_untouched() {
        let cache = TokenizerCache::new(FakeBackend::new(&[]).without_fallback());

        assert!(cache.get_or_create("mystery").is_err());
        assert!(cache.is_empty());

        // Nothing was cached, so the next call tries again
        assert!(cache.get_or_create("mystery").is_err());
        assert_eq!(cache.backend().specialized_attempts(), 2);
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(TokenizerCache::new(FakeBackend::new(&["gpt-4"])));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.get_or_create("gpt-4").unwrap();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.backend().constructions(), 1);
    }
}
