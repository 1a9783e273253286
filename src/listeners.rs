//! Typed listener lists behind every component event.

use std::fmt;

type Handler<A> = Box<dyn FnMut(&A) + Send>;

struct Entry<A> {
    handler: Handler<A>,
    once: bool,
}

/// Ordered list of callbacks for one event type.
///
/// Listeners run synchronously, in registration order, on the thread driving
/// the client's event loop. They receive plain data and cannot reach the
/// client, so a listener can never re-enter dispatch.
pub struct Listeners<A> {
    entries: Vec<Entry<A>>,
}

impl<A> Listeners<A> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers a listener for every future occurrence.
    pub fn on(&mut self, handler: impl FnMut(&A) + Send + 'static) -> &mut Self {
        self.entries.push(Entry {
            handler: Box::new(handler),
            once: false,
        });
        self
    }

    /// Registers a listener that is dropped after its first call.
    pub fn once(&mut self, handler: impl FnMut(&A) + Send + 'static) -> &mut Self {
        self.entries.push(Entry {
            handler: Box::new(handler),
            once: true,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn emit(&mut self, arg: &A) {
        self.entries.retain_mut(|entry| {
            (entry.handler)(arg);
            !entry.once
        });
    }
}

impl<A> Default for Listeners<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Listeners<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
