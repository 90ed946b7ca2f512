//! Timer queue - delayed and frame-deferred effects for one owner
//!
//! Replaces ad-hoc timeout chains: every delayed effect is an entry in the
//! owner's queue, drained from the frame loop. Once the owner shuts the
//! queue down, nothing it scheduled ever fires again.

/// Handle for cancelling a scheduled entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy)]
enum Due {
    /// Absolute session time in milliseconds
    At(f64),
    /// Remaining frame boundaries before the entry fires
    Frames(u32),
}

#[derive(Debug)]
struct Entry<E> {
    id: TimerId,
    due: Due,
    effect: E,
}

/// Ordered queue of pending effects owned by a single component
#[derive(Debug)]
pub struct TimerQueue<E> {
    entries: Vec<Entry<E>>,
    next_id: u64,
    alive: bool,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            alive: true,
        }
    }

    fn push(&mut self, due: Due, effect: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        if self.alive {
            self.entries.push(Entry { id, due, effect });
        }
        id
    }

    /// Fire `effect` once `delay_ms` has elapsed after `now_ms`
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64, effect: E) -> TimerId {
        self.push(Due::At(now_ms + delay_ms.max(0.0)), effect)
    }

    /// Fire `effect` after `frames` frame boundaries (see [`end_frame`](Self::end_frame))
    pub fn defer_frames(&mut self, frames: u32, effect: E) -> TimerId {
        self.push(Due::Frames(frames), effect)
    }

    /// Cancel a pending entry. Returns false if it already fired or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Mark a frame boundary, counting down frame-deferred entries
    pub fn end_frame(&mut self) {
        for entry in &mut self.entries {
            if let Due::Frames(n) = &mut entry.due {
                *n = n.saturating_sub(1);
            }
        }
    }

    /// Remove and return every entry due at `now_ms`, in due order
    /// (insertion order breaks ties).
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<E> {
        if !self.alive {
            return Vec::new();
        }

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            let fire_at = match self.entries[i].due {
                Due::At(t) if t <= now_ms => Some(t),
                Due::Frames(0) => Some(now_ms),
                _ => None,
            };
            match fire_at {
                Some(t) => {
                    let entry = self.entries.remove(i);
                    due.push((t, entry.id.0, entry.effect));
                }
                None => i += 1,
            }
        }

        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        due.into_iter().map(|(_, _, effect)| effect).collect()
    }

    /// Number of entries still waiting
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Drop every pending entry but keep accepting new ones
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Owner is going away: drop everything and refuse later scheduling
    pub fn shutdown(&mut self) {
        self.alive = false;
        self.entries.clear();
    }
}
