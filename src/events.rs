//! Pointer events: what the host reports, what subscribers receive, and the
//! typed channel between them.
//!
//! All coordinates are lng/lat degrees; screen points are pixels.

use crate::types::{LngLat, ScreenPoint, UserData};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    MouseOver,
    MouseOut,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Click, EventKind::MouseOver, EventKind::MouseOut];
}

// ---------------------------------------------------------------------------
// Inbound (from the host's hit testing)
// ---------------------------------------------------------------------------

/// What the renderer's raycast hit.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerTarget {
    Model {
        model_id: String,
    },
    Label {
        /// Composite label group id.
        group_id: String,
        label_index: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: EventKind,
    pub target: PointerTarget,
    pub lng_lat: LngLat,
    pub point: ScreenPoint,
}

// ---------------------------------------------------------------------------
// Outbound (to subscribers)
// ---------------------------------------------------------------------------

/// Resolved target with its scene ownership and caller payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTarget {
    Model {
        model_id: String,
        building_id: String,
        floor_id: Option<String>,
        user_data: UserData,
    },
    Poi {
        group_id: String,
        building_id: String,
        floor_id: String,
        label_index: usize,
        user_data: UserData,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PluginEvent {
    pub kind: EventKind,
    pub target: EventTarget,
    pub lng_lat: LngLat,
    pub point: ScreenPoint,
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

pub type EventHandler = Box<dyn FnMut(&PluginEvent) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Publish/subscribe keyed by [`EventKind`].
#[derive(Default)]
pub struct EventChannel {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<(SubscriptionId, EventHandler)>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.handlers.entry(kind).or_default().push((id, handler));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for list in self.handlers.values_mut() {
            if let Some(pos) = list.iter().position(|(sid, _)| *sid == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Deliver to every handler of `event.kind`, in subscription order.
    pub fn publish(&mut self, event: &PluginEvent) {
        if let Some(list) = self.handlers.get_mut(&event.kind) {
            for (_, handler) in list.iter_mut() {
                handler(event);
            }
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn click_on(model_id: &str) -> PluginEvent {
        PluginEvent {
            kind: EventKind::Click,
            target: EventTarget::Model {
                model_id: model_id.into(),
                building_id: model_id.into(),
                floor_id: None,
                user_data: UserData::default(),
            },
            lng_lat: LngLat::new(0.0, 0.0),
            point: ScreenPoint::default(),
        }
    }

    #[test]
    fn publish_reaches_only_matching_kind() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut channel = EventChannel::new();

        let s = seen.clone();
        channel.subscribe(
            EventKind::Click,
            Box::new(move |e: &PluginEvent| s.lock().push(format!("{:?}", e.kind))),
        );
        let s = seen.clone();
        channel.subscribe(
            EventKind::MouseOver,
            Box::new(move |_: &PluginEvent| s.lock().push("over".into())),
        );

        channel.publish(&click_on("B1"));
        assert_eq!(*seen.lock(), ["Click"]);
    }

    #[test]
    fn unsubscribe_removes_handler() {
        let mut channel = EventChannel::new();
        let id = channel.subscribe(EventKind::Click, Box::new(|_: &PluginEvent| {}));
        assert_eq!(channel.handler_count(EventKind::Click), 1);

        assert!(channel.unsubscribe(id));
        assert!(!channel.unsubscribe(id));
        for kind in EventKind::ALL {
            assert_eq!(channel.handler_count(kind), 0);
        }
    }
}
