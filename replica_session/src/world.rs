//! Shared world-object state.
//!
//! Doors and similar shared objects transition exactly once per session,
//! on the authority's say-so. The session keeps the set of opened objects
//! so a trigger observed twice never re-broadcasts, and so a door that
//! re-locks locally (e.g. after a checkpoint restart) can be re-opened to
//! match the session's canonical state.

use std::collections::HashSet;

use replica_shared::wire::DoorId;

/// Session-scoped world state; constructed at session start, torn down with
/// it. Never a process-wide static.
#[derive(Debug, Default)]
pub struct World {
    opened: HashSet<DoorId>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a door as open. Returns true only the first time.
    pub fn mark_open(&mut self, door: DoorId) -> bool {
        self.opened.insert(door)
    }

    /// Whether the session considers this door open, regardless of what the
    /// local level state currently shows.
    pub fn is_open(&self, door: DoorId) -> bool {
        self.opened.contains(&door)
    }

    pub fn opened_count(&self) -> usize {
        self.opened.len()
    }
}
