use crate::field::particle::Particle;

/// Fixed-capacity particle slots with a free-list of vacated indices.
///
/// Slots are allocated once up front; inserting into a full arena is
/// rejected rather than growing it.
#[derive(Debug)]
pub struct ParticleArena {
    slots: Vec<Option<Particle>>,
    free: Vec<usize>,
    live: usize,
}

impl ParticleArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            // Reversed so the lowest index is handed out first
            free: (0..capacity).rev().collect(),
            live: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Place a particle in a free slot, returning its index
    pub fn insert(&mut self, particle: Particle) -> Option<usize> {
        let index = self.free.pop()?;
        self.slots[index] = Some(particle);
        self.live += 1;
        Some(index)
    }

    /// Vacate a slot and return its particle
    pub fn remove(&mut self, index: usize) -> Option<Particle> {
        let particle = self.slots.get_mut(index)?.take()?;
        self.free.push(index);
        self.live -= 1;
        Some(particle)
    }

    /// Overwrite an occupied slot with a fresh particle
    pub fn replace(&mut self, index: usize, particle: Particle) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.is_some() => {
                *slot = Some(particle);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.slots.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Indices of occupied slots
    pub fn occupied(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| i))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.free.push(index);
            }
        }
        self.live = 0;
    }
}
