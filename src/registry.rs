//! Handle arena and request/response correlation for the client.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;

use tracing::{debug, warn};

/// Components keyed by the handle the daemon addresses them with.
///
/// A handle is only ever looked up here; once unbound, frames that still
/// carry it resolve to nothing and are dropped by the caller.
pub struct Registry<K, C> {
    entries: HashMap<K, C>,
}

impl<K, C> Registry<K, C>
where
    K: Copy + Eq + Hash + fmt::Display,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Binds `component` to `handle`, returning whatever was bound before.
    pub fn bind(&mut self, handle: K, component: C) -> Option<C> {
        let previous = self.entries.insert(handle, component);
        if previous.is_some() {
            warn!(%handle, "handle rebound while still live");
        }
        previous
    }

    pub fn unbind(&mut self, handle: K) -> Option<C> {
        self.entries.remove(&handle)
    }

    pub fn lookup(&self, handle: K) -> Option<&C> {
        self.entries.get(&handle)
    }

    pub fn lookup_mut(&mut self, handle: K) -> Option<&mut C> {
        let found = self.entries.get_mut(&handle);
        if found.is_none() {
            debug!(%handle, "dropping event for unbound handle");
        }
        found
    }

    pub fn contains(&self, handle: K) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &C)> {
        self.entries.iter().map(|(k, c)| (*k, c))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut C)> {
        self.entries.iter_mut().map(|(k, c)| (*k, c))
    }

    /// Unbinds everything, in ascending handle order.
    pub fn drain(&mut self) -> Vec<(K, C)>
    where
        K: Ord,
    {
        let mut drained: Vec<_> = self.entries.drain().collect();
        drained.sort_by_key(|(k, _)| *k);
        drained
    }
}

impl<K, C> Default for Registry<K, C>
where
    K: Copy + Eq + Hash + fmt::Display,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C> fmt::Debug for Registry<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("bound", &self.entries.len())
            .finish()
    }
}

/// Identifier correlating a request with its response.
pub type RequestId = u32;

/// Monotonic source of request ids and client-chosen handles.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

type ResponseCallback<T> = Box<dyn FnOnce(&T) + Send>;

/// Outstanding requests of one kind, oldest first.
pub struct PendingRequests<T> {
    kind: &'static str,
    queue: VecDeque<(RequestId, ResponseCallback<T>)>,
}

impl<T> PendingRequests<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            queue: VecDeque::new(),
        }
    }

    pub fn await_response(&mut self, id: RequestId, callback: impl FnOnce(&T) + Send + 'static) {
        self.queue.push_back((id, Box::new(callback)));
    }

    /// Runs and forgets the callback stored for `id`.
    ///
    /// Returns `false` (and logs) when nothing waits for that id.
    pub fn resolve(&mut self, id: RequestId, payload: &T) -> bool {
        let Some(pos) = self.queue.iter().position(|(pending, _)| *pending == id) else {
            warn!(kind = self.kind, request_id = id, "response has no pending request");
            return false;
        };

        if pos != 0 {
            debug!(kind = self.kind, request_id = id, pos, "response resolved out of order");
        }
        if let Some((_, callback)) = self.queue.remove(pos) {
            callback(payload);
        }
        true
    }

    /// Resolves the oldest outstanding request, for responses that carry no id.
    pub fn resolve_next(&mut self, payload: &T) -> Option<RequestId> {
        let Some((id, callback)) = self.queue.pop_front() else {
            warn!(kind = self.kind, "response has no pending request");
            return None;
        };
        callback(payload);
        Some(id)
    }

    /// Drops every outstanding callback without running it.
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }
}

impl<T> fmt::Debug for PendingRequests<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequests")
            .field("kind", &self.kind)
            .field("outstanding", &self.queue.len())
            .finish()
    }
}
