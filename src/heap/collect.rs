//! Cheney's copying collector.
//!
//! Roots are evacuated first; then a scan cursor walks the new semispace
//! from its base, evacuating the fields of each copied cell, until it meets
//! the allocation cursor. A copied cell's old location is overwritten with
//! `Object::Forwarded`, so a second reference to it is simply redirected.

use std::mem;

use crate::heap::Heap;
use crate::scheme::{Obj, Object, Value};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GcStats {
    pub collections: usize,
    /// Cells allocated since the heap was created.
    pub allocated: usize,
    /// Cells copied by all collections so far.
    pub copied: usize,
    /// Cells that survived the latest collection.
    pub live: usize,
}

impl Heap {
    /// Runs a full collection. Every value reachable from a registered root
    /// keeps its contents, but the cells themselves move: unrooted `Value`s
    /// held across this call are dangling afterwards.
    pub fn collect(&mut self) {
        let mut old = mem::replace(&mut self.space, mem::take(&mut self.reserve));
        let space = &mut self.space;

        for slot in self.roots.slots_mut() {
            *slot = evacuate(&mut old, space, *slot);
        }

        let mut scan = 0;
        while scan < space.len() {
            let mut object = space[scan];
            object.trace(|field| *field = evacuate(&mut old, space, *field));
            space[scan] = object;
            scan += 1;
        }

        let live = space.len();
        old.clear();
        self.reserve = old;

        self.stats.collections += 1;
        self.stats.copied += live;
        self.stats.live = live;
        log::debug!("gc #{}: {} of {} cells live", self.stats.collections,
            live, self.capacity);
        if self.capacity - live < self.capacity / 8 {
            log::warn!("gc #{} reclaimed only {} cells",
                self.stats.collections, self.capacity - live);
        }
    }
}

/// Returns the new location of `value`, copying its cell out of `old` on
/// first visit.
fn evacuate(old: &mut [Object], new: &mut Vec<Object>, value: Value) -> Value {
    let obj = value?;
    match old[obj.index()] {
        Object::Forwarded(image) => Some(image),
        object => {
            let image = Obj::new(new.len());
            new.push(object);
            old[obj.index()] = Object::Forwarded(image);
            Some(image)
        },
    }
}
