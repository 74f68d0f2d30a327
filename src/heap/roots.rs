//! The root stack: every reference the collector must treat as live.
//!
//! Slots are owned by the stack rather than borrowed from the caller, so the
//! collector can rewrite them in place. A scope is registered with
//! `push_scope`, read and updated through its [`Frame`] handle, and
//! unregistered with `pop_scope` in strict LIFO order. Prefer
//! [`Mutator::with_roots`], which pairs the two for you.

use crate::error::{Error, Result};
use crate::heap::Heap;
use crate::scheme::Value;

/// Handle to one registered scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    base: usize,
    len: usize,
    depth: usize,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug)]
pub struct RootStack {
    slots: Vec<Value>,
    // Base slot of each open scope.
    frames: Vec<usize>,
    max_roots: usize,
    max_frames: usize,
}

impl RootStack {
    pub fn new(max_roots: usize, max_frames: usize) -> RootStack {
        RootStack {
            slots: Vec::with_capacity(max_roots),
            frames: Vec::with_capacity(max_frames),
            max_roots,
            max_frames,
        }
    }

    pub fn push_scope(&mut self, values: &[Value]) -> Result<Frame> {
        if self.frames.len() >= self.max_frames {
            return Err(Error::RootStackOverflow("too many nested scopes"));
        }
        if self.slots.len() + values.len() > self.max_roots {
            return Err(Error::RootStackOverflow("too many root slots"));
        }
        let frame = Frame {
            base: self.slots.len(),
            len: values.len(),
            depth: self.frames.len(),
        };
        self.frames.push(frame.base);
        self.slots.extend_from_slice(values);
        log::trace!("push scope {} ({} slots)", frame.depth, frame.len);
        Ok(frame)
    }

    pub fn pop_scope(&mut self, frame: Frame) {
        assert_eq!(self.frames.len(), frame.depth + 1,
            "root scopes must be popped in LIFO order");
        self.frames.pop();
        self.slots.truncate(frame.base);
        log::trace!("pop scope {}", frame.depth);
    }

    pub fn get(&self, frame: Frame, index: usize) -> Value {
        assert!(index < frame.len, "root slot {} out of range", index);
        self.slots[frame.base + index]
    }

    pub fn set(&mut self, frame: Frame, index: usize, value: Value) {
        assert!(index < frame.len, "root slot {} out of range", index);
        self.slots[frame.base + index] = value;
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Number of registered slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Value] {
        &mut self.slots
    }
}

/// Anything that owns a heap and runs code that allocates from it.
pub trait Mutator {
    fn heap(&mut self) -> &mut Heap;

    /// Registers `values` as one scope for the duration of `body`, which
    /// receives the scope's frame. The scope is popped on every exit path.
    fn with_roots<T, F>(&mut self, values: &[Value], body: F) -> Result<T>
        where Self: Sized, F: FnOnce(&mut Self, Frame) -> Result<T> {

        let frame = self.heap().push_scope(values)?;
        let result = body(self, frame);
        self.heap().pop_scope(frame);
        result
    }
}

impl Mutator for Heap {
    fn heap(&mut self) -> &mut Heap {
        self
    }
}

#[cfg(test)]
mod test {
    use crate::error::Error;
    use super::RootStack;

    #[test]
    fn test_push_pop() {
        let mut roots = RootStack::new(8, 4);
        let outer = roots.push_scope(&[None, None]).unwrap();
        let inner = roots.push_scope(&[None]).unwrap();
        assert_eq!((roots.depth(), roots.len()), (2, 3));
        roots.pop_scope(inner);
        assert_eq!((roots.depth(), roots.len()), (1, 2));
        roots.pop_scope(outer);
        assert!(roots.is_empty());
    }

    #[test]
    fn test_slots_are_per_frame() {
        let mut roots = RootStack::new(8, 4);
        let outer = roots.push_scope(&[None]).unwrap();
        let inner = roots.push_scope(&[None, None]).unwrap();
        assert_eq!(inner.len(), 2);
        assert_eq!(roots.get(outer, 0), None);
        roots.pop_scope(inner);
        roots.pop_scope(outer);
    }

    #[test]
    #[should_panic]
    fn test_out_of_order_pop() {
        let mut roots = RootStack::new(8, 4);
        let outer = roots.push_scope(&[None]).unwrap();
        let _inner = roots.push_scope(&[None]).unwrap();
        roots.pop_scope(outer);
    }

    #[test]
    fn test_too_many_frames() {
        let mut roots = RootStack::new(8, 2);
        roots.push_scope(&[]).unwrap();
        roots.push_scope(&[]).unwrap();
        match roots.push_scope(&[]) {
            Err(Error::RootStackOverflow(_)) => {},
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_too_many_slots() {
        let mut roots = RootStack::new(3, 8);
        roots.push_scope(&[None, None]).unwrap();
        match roots.push_scope(&[None, None]) {
            Err(Error::RootStackOverflow(_)) => {},
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(roots.len(), 2);
    }
}
