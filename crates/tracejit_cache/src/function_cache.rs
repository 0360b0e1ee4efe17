//! The per-function compiled-program cache.

use crate::config::CacheConfig;
use crate::signature::Signature;
use ahash::AHashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracejit_exec::Program;
use tracing::{debug, trace};

/// Cache hit/miss counters.
///
/// `compilations` is the observable trace counter: it increments exactly
/// once per distinct signature compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub compilations: u64,
    pub evictions: u64,
}

struct Entry {
    program: Arc<Program>,
    last_used: u64,
}

#[derive(Default)]
struct Inner {
    entries: AHashMap<Signature, Entry>,
    stats: CacheStats,
    tick: u64,
}

/// Signature-keyed cache of compiled programs.
///
/// One mutex guards all state and is held across the compile closure, so
/// concurrent callers hitting the same new signature compile exactly once.
pub struct CompiledCache {
    config: CacheConfig,
    inner: Mutex<Inner>,
}

impl CompiledCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Look up `signature`; on a miss, run `compile` and cache the result.
    ///
    /// Returns the program and whether this call compiled it. A failed
    /// compile leaves the cache unchanged (the miss is still counted).
    pub fn get_or_compile<E>(
        &self,
        signature: &Signature,
        compile: impl FnOnce() -> Result<Program, E>,
    ) -> Result<(Arc<Program>, bool), E> {
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;

        if let Some(entry) = inner.entries.get_mut(signature) {
            entry.last_used = tick;
            let program = Arc::clone(&entry.program);
            inner.stats.hits += 1;
            trace!(signature = %signature, "cache hit");
            return Ok((program, false));
        }

        inner.stats.misses += 1;
        debug!(signature = %signature, digest = signature.digest(), "cache miss, compiling");

        let program = Arc::new(compile()?);
        inner.stats.compilations += 1;

        if inner.entries.len() >= self.config.capacity {
            if let Some(victim) = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(sig, _)| sig.clone())
            {
                inner.entries.remove(&victim);
                inner.stats.evictions += 1;
                debug!(signature = %victim, "evicted least recently used program");
            }
        }

        inner.entries.insert(
            signature.clone(),
            Entry {
                program: Arc::clone(&program),
                last_used: tick,
            },
        );
        Ok((program, true))
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all compiled programs. Counters are kept.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}
