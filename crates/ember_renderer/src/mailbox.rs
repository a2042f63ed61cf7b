//! Per-thread mailbox for de-duplicating object tests.
//!
//! An object that straddles several grid cells would otherwise be
//! intersected once per cell. Each query gets a fresh generation number;
//! an object is tested only if its stamp differs from the current
//! generation. Stamps are cleared explicitly when the counter reaches its
//! wrap limit, so a stale stamp can never alias a live generation.

/// Default generation at which stamps are cleared.
pub const DEFAULT_WRAP_LIMIT: u32 = u32::MAX / 8;

#[derive(Debug, Clone)]
pub struct Mailbox {
    stamps: Vec<u32>,
    generation: u32,
    wrap_limit: u32,
}

impl Mailbox {
    /// A mailbox with one slot per object id.
    pub fn new(objects: usize) -> Self {
        Self::with_wrap_limit(objects, DEFAULT_WRAP_LIMIT)
    }

    pub fn with_wrap_limit(objects: usize, wrap_limit: u32) -> Self {
        Self {
            stamps: vec![0; objects],
            generation: 0,
            wrap_limit: wrap_limit.max(1),
        }
    }

    /// Start a new query and return its generation (serial number).
    pub fn begin_query(&mut self) -> u32 {
        if self.generation >= self.wrap_limit {
            self.reset();
        }
        self.generation += 1;
        self.generation
    }

    /// Returns true the first time `id` is seen in the current generation.
    #[inline]
    pub fn first_visit(&mut self, id: usize) -> bool {
        match self.stamps.get_mut(id) {
            Some(stamp) if *stamp == self.generation => false,
            Some(stamp) => {
                *stamp = self.generation;
                true
            }
            // Unknown ids are never de-duplicated
            None => true,
        }
    }

    /// Clear every stamp and restart the generation counter.
    pub fn reset(&mut self) {
        self.stamps.fill(0);
        self.generation = 0;
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}
