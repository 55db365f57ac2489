// Cursormap Event Sources
// The call-through seam to the original "get next event" routine

use std::collections::VecDeque;

use crate::event::{EventMask, EventRecord};

/// Anything that hands out events the way the system's event call does.
///
/// Fills `event` and returns true when an event is available. When nothing
/// matches `mask` it writes a null event and returns false.
pub trait EventSource {
    fn get_next_event(&mut self, mask: EventMask, event: &mut EventRecord) -> bool;
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    fn get_next_event(&mut self, mask: EventMask, event: &mut EventRecord) -> bool {
        (**self).get_next_event(mask, event)
    }
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn get_next_event(&mut self, mask: EventMask, event: &mut EventRecord) -> bool {
        (**self).get_next_event(mask, event)
    }
}

/// Adapts a plain function or closure into an event source
pub struct FnSource<F>(pub F);

impl<F> EventSource for FnSource<F>
where
    F: FnMut(EventMask, &mut EventRecord) -> bool,
{
    fn get_next_event(&mut self, mask: EventMask, event: &mut EventRecord) -> bool {
        (self.0)(mask, event)
    }
}

/// In-memory event queue.
///
/// Hands out the oldest queued event accepted by the mask; events the mask
/// rejects stay queued for a later call.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    queue: VecDeque<EventRecord>,
    calls: usize,
}

impl ScriptedSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source pre-loaded with events
    pub fn from_events<I: IntoIterator<Item = EventRecord>>(events: I) -> Self {
        Self {
            queue: events.into_iter().collect(),
            calls: 0,
        }
    }

    /// Queue another event
    pub fn push(&mut self, event: EventRecord) {
        self.queue.push_back(event);
    }

    /// Number of events still queued
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of times the source has been polled
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl EventSource for ScriptedSource {
    fn get_next_event(&mut self, mask: EventMask, event: &mut EventRecord) -> bool {
        self.calls += 1;
        let position = self.queue.iter().position(|queued| mask.accepts(queued.what));
        match position.and_then(|index| self.queue.remove(index)) {
            Some(next) => {
                *event = next;
                true
            }
            None => {
                *event = EventRecord::default();
                false
            }
        }
    }
}
