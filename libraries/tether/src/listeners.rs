use slotmap::SlotMap;
use std::sync::Mutex;

slotmap::new_key_type! {
    /// Handle returned by [`Listeners::register`]; pass it back to
    /// [`Listeners::unregister`] to drop the callback.
    pub struct ListenerKey;
}

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Registry of subscriber callbacks, keyed so individual subscribers can
/// detach without affecting the rest.
pub struct Listeners<T> {
    inner: Mutex<SlotMap<ListenerKey, Callback<T>>>,
}

impl<T> Listeners<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SlotMap::with_key()),
        }
    }

    pub fn register(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> ListenerKey {
        self.inner.lock().unwrap().insert(Box::new(callback))
    }

    pub fn unregister(&self, key: ListenerKey) {
        self.inner.lock().unwrap().remove(key);
    }

    /// Invoke every registered callback with `value`. Callbacks run with
    /// the registry locked: they must not register or unregister from
    /// inside.
    pub fn notify(&self, value: &T) {
        let inner = self.inner.lock().unwrap();
        for callback in inner.values() {
            callback(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}
