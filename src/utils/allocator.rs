use serde::{Deserialize, Serialize};

/// Generational handle into an [`Arena`], preventing stale references from
/// resolving after a slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

struct Entry<T> {
    generation: u32,
    item: Option<T>,
}

/// Generational arena backing externally-owned body storage.
///
/// Islands keep [`Handle`]s into an arena owned by the caller; the arena
/// itself never appears inside the solver state.
pub struct Arena<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn insert(&mut self, item: T) -> Handle {
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.item = Some(item);
            return Handle {
                index,
                generation: entry.generation,
            };
        }
        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            item: Some(item),
        });
        Handle {
            index,
            generation: 0,
        }
    }

    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let entry = self.entries.get_mut(handle.index())?;
        if entry.generation != handle.generation {
            return None;
        }
        let item = entry.item.take();
        if item.is_some() {
            entry.generation = entry.generation.wrapping_add(1);
            self.free.push(handle.index);
        }
        item
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let entry = self.entries.get(handle.index())?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.item.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let entry = self.entries.get_mut(handle.index())?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.item.as_mut()
    }

    /// Disjoint mutable access to two slots, as constraint resolvers need
    /// both bodies of a pair at once. Returns `None` when the handles alias
    /// or either is stale.
    pub fn get2_mut(&mut self, a: Handle, b: Handle) -> Option<(&mut T, &mut T)> {
        if a.index == b.index {
            return None;
        }
        self.get(a)?;
        self.get(b)?;

        let (lo, hi, flipped) = if a.index < b.index {
            (a.index(), b.index(), false)
        } else {
            (b.index(), a.index(), true)
        };
        let (left, right) = self.entries.split_at_mut(hi);
        let first = left[lo].item.as_mut()?;
        let second = right[0].item.as_mut()?;
        if flipped {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().filter_map(|entry| entry.item.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries
            .iter_mut()
            .filter_map(|entry| entry.item.as_mut())
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.entries.iter().enumerate().filter_map(|(index, entry)| {
            entry.item.as_ref().map(|_| Handle {
                index: index as u32,
                generation: entry.generation,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.item.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
