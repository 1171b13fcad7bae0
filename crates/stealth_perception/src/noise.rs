//! Noise propagation from emitters to listening agents
//!
//! The router holds weak references to listeners. Emitting a noise locks each
//! live listener in turn, so callers must not hold a listener lock while
//! calling [`NoiseRouter::emit`].

use crate::ids::AgentId;
use glam::Vec3;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// A transient noise at a point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseEvent {
    /// Where the noise was made
    pub origin: Vec3,
    /// How far it carries
    pub radius: f32,
}

impl NoiseEvent {
    pub fn new(origin: Vec3, radius: f32) -> Self {
        Self { origin, radius }
    }

    /// Whether a listener at `position` is within earshot (boundary inclusive)
    pub fn reaches(&self, position: Vec3) -> bool {
        position.distance(self.origin) <= self.radius
    }
}

/// Something that reacts to noises
pub trait NoiseListener {
    /// Where the listener's ears are
    fn listener_position(&self) -> Vec3;

    /// Called for every noise that reaches the listener
    fn hear_noise(&mut self, event: NoiseEvent, now: f64);
}

type ListenerRef = Weak<Mutex<dyn NoiseListener + Send>>;

/// Delivers noise events to every listener in range
#[derive(Default)]
pub struct NoiseRouter {
    listeners: HashMap<AgentId, ListenerRef>,
}

impl std::fmt::Debug for NoiseRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseRouter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl NoiseRouter {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener by weak reference; replaces any previous entry for `id`
    pub fn register(&mut self, id: AgentId, listener: ListenerRef) {
        self.listeners.insert(id, listener);
    }

    /// Register a concrete listener
    pub fn register_listener<T>(&mut self, id: AgentId, listener: &Arc<Mutex<T>>)
    where
        T: NoiseListener + Send + 'static,
    {
        let shared: Arc<Mutex<dyn NoiseListener + Send>> = listener.clone();
        self.register(id, Arc::downgrade(&shared));
    }

    /// Remove a listener; unknown ids are ignored
    pub fn unregister(&mut self, id: AgentId) {
        self.listeners.remove(&id);
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver a noise to every live listener in range; returns how many heard it
    pub fn emit(&mut self, event: NoiseEvent, now: f64) -> usize {
        self.listeners.retain(|_, weak| weak.strong_count() > 0);

        let live: Vec<(AgentId, Arc<Mutex<dyn NoiseListener + Send>>)> = self
            .listeners
            .iter()
            .filter_map(|(id, weak)| weak.upgrade().map(|l| (*id, l)))
            .collect();

        let mut heard = 0;
        for (id, listener) in live {
            let mut listener = listener.lock();
            let position = listener.listener_position();
            if event.reaches(position) {
                log::debug!(
                    "{} heard a noise at distance {:.2}",
                    id,
                    position.distance(event.origin)
                );
                listener.hear_noise(event, now);
                heard += 1;
            }
        }
        heard
    }
}
