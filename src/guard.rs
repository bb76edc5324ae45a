//! Debug-only guard against reentrant calls into a table.
//!
//! Table operations call user hashers and comparers while the slot array
//! may be half-updated (during rehash, for example). In debug builds an
//! operation records its name on entry, and a nested entry panics naming
//! both operations. In release builds the guard is a zero-sized no-op.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug, Default)]
pub(crate) struct OpGuard {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
}

impl OpGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
        }
    }

    /// Mark `op` as running until the returned guard drops.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> ActiveOp<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrant table call: `{op}` started while `{outer}` was running");
            }
            self.active.set(Some(op));
            return ActiveOp {
                owner: self,
                _lt: PhantomData,
            };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return ActiveOp { _lt: PhantomData };
        }
    }

    #[cfg(test)]
    pub(crate) fn is_active(&self) -> bool {
        #[cfg(debug_assertions)]
        {
            return self.active.get().is_some();
        }
        #[cfg(not(debug_assertions))]
        {
            return false;
        }
    }
}

pub(crate) struct ActiveOp<'a> {
    #[cfg(debug_assertions)]
    owner: &'a OpGuard,
    _lt: PhantomData<&'a ()>,
}

impl Drop for ActiveOp<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(None);
    }
}
