//! Listener trait and registry.

use std::collections::HashMap;
use std::rc::Rc;

use super::Event;

/// Receives dispatched events.
///
/// Implemented for every `Fn(&mut Event)` closure, so plain callables and
/// handler objects register through the same API.
pub trait EventListener {
    /// Handles one dispatched event.
    fn handle_event(&self, event: &mut Event);
}

impl<F> EventListener for F
where
    F: Fn(&mut Event),
{
    fn handle_event(&self, event: &mut Event) {
        self(event)
    }
}

/// Wraps a closure as a shareable listener handle.
///
/// Keep the returned `Rc` to remove the listener later; removal compares
/// handles by identity.
pub fn listener<F>(f: F) -> Rc<dyn EventListener>
where
    F: Fn(&mut Event) + 'static,
{
    Rc::new(f)
}

/// Ordered listeners per event name.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: HashMap<String, Vec<Rc<dyn EventListener>>>,
}

impl ListenerRegistry {
    pub(crate) fn add(&mut self, event_type: &str, listener: Rc<dyn EventListener>) {
        self.listeners
            .entry(event_type.to_string())
            .or_default()
            .push(listener);
    }

    /// Removes the first registration of `listener`, returning whether one was found.
    pub(crate) fn remove(&mut self, event_type: &str, listener: &Rc<dyn EventListener>) -> bool {
        let Some(registered) = self.listeners.get_mut(event_type) else {
            return false;
        };
        match registered
            .iter()
            .position(|candidate| std::ptr::addr_eq(Rc::as_ptr(candidate), Rc::as_ptr(listener)))
        {
            Some(index) => {
                registered.remove(index);
                true
            }
            None => false,
        }
    }

    /// Copies the current listeners so dispatch can run without holding a borrow.
    pub(crate) fn snapshot(&self, event_type: &str) -> Vec<Rc<dyn EventListener>> {
        self.listeners
            .get(event_type)
            .map(|registered| registered.to_vec())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn count(&self, event_type: &str) -> usize {
        self.listeners.get(event_type).map_or(0, Vec::len)
    }
}
