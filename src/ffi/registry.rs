//! Process-wide handle table and per-thread error slot

use crate::matrix::NumericMatrix;
use std::cell::RefCell;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Slots addressed by `id - 1`; id `0` never names a handle
pub(crate) struct HandleTable {
    slots: Vec<Option<NumericMatrix>>,
    free: Vec<usize>,
}

impl HandleTable {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Store a handle, returning its id, or `None` if ids are exhausted
    pub(crate) fn insert(&mut self, matrix: NumericMatrix) -> Option<u32> {
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(matrix);
                slot
            }
            None => {
                // The id of the new slot must still fit in a u32
                u32::try_from(self.slots.len() + 1).ok()?;
                self.slots.push(Some(matrix));
                self.slots.len() - 1
            }
        };
        let id = u32::try_from(slot + 1).ok()?;
        log::trace!("Registered matrix handle {}", id);
        Some(id)
    }

    pub(crate) fn get(&self, id: u32) -> Option<&NumericMatrix> {
        let slot = (id as usize).checked_sub(1)?;
        self.slots.get(slot)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: u32) -> Option<&mut NumericMatrix> {
        let slot = (id as usize).checked_sub(1)?;
        self.slots.get_mut(slot)?.as_mut()
    }

    pub(crate) fn remove(&mut self, id: u32) -> Option<NumericMatrix> {
        let slot = (id as usize).checked_sub(1)?;
        let matrix = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        log::trace!("Released matrix handle {}", id);
        Some(matrix)
    }

    #[cfg(test)]
    fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

static REGISTRY: Mutex<HandleTable> = Mutex::new(HandleTable::new());

/// Lock the global table; a panic in another caller does not invalidate it
pub(crate) fn table() -> MutexGuard<'static, HandleTable> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

thread_local! {
    static LAST_ERROR: RefCell<String> = const { RefCell::new(String::new()) };
}

pub(crate) fn set_last_error(message: String) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = message);
}

pub(crate) fn with_last_error<T>(f: impl FnOnce(&str) -> T) -> T {
    LAST_ERROR.with(|slot| f(&slot.borrow()))
}
