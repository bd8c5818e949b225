use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A keyed gate: at most one caller runs its critical section per key at a
/// time. Later callers for the same key queue in arrival order; callers for
/// other keys are unaffected.
///
/// This exists to fence read-modify-write sequences against a remote store.
/// Two back-to-back mutations of the same document would otherwise both read
/// the pre-mutation state, both decide their change applies, and the second
/// write would silently overwrite the first.
pub struct Turnstile<K> {
    gates: DashMap<K, Arc<Mutex<()>>>,
}

impl<K> Turnstile<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            gates: DashMap::new(),
        }
    }

    /// Run `work` while holding the gate for `key`.
    ///
    /// The future is not polled until the gate is acquired, so any reads it
    /// performs see the effects of every earlier caller for the same key.
    /// Gates are tiny and reused; they are never removed from the map.
    pub async fn through<Fut, T>(&self, key: K, work: Fut) -> T
    where
        Fut: Future<Output = T>,
    {
        let gate = self
            .gates
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _inside = gate.lock().await;
        work.await
    }
}

impl<K> Default for Turnstile<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
