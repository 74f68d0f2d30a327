use crate::heap::Heap;
use crate::scheme::{Object, Value};

impl Heap {
    /// Identity: the same cell, or atoms with the same interned name.
    pub fn eqv(&self, a: Value, b: Value) -> bool {
        if a == b {
            return true;
        }
        match (self.symbol(a), self.symbol(b)) {
            (Some(s), Some(t)) => s == t,
            _ => false,
        }
    }

    /// Structural equality. Pairs are compared component-wise, everything
    /// else by identity. Walks tails iteratively, so long lists don't
    /// deepen the native stack.
    pub fn equal(&self, a: Value, b: Value) -> bool {
        let (mut a, mut b) = (a, b);
        loop {
            if self.eqv(a, b) {
                return true;
            }
            match (self.pair(a), self.pair(b)) {
                (Some((a1, a2)), Some((b1, b2))) => {
                    if !self.equal(a1, b1) {
                        return false;
                    }
                    a = a2;
                    b = b2;
                },
                _ => return self.same_native(a, b),
            }
        }
    }

    fn same_native(&self, a: Value, b: Value) -> bool {
        match (a.map(|x| self.object(x)), b.map(|y| self.object(y))) {
            (Some(Object::Native(f)), Some(Object::Native(g))) =>
                f.name == g.name,
            _ => false,
        }
    }
}
