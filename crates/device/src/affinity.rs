//! Runtime thread-affinity guard.
//!
//! Native windowing and GL handles are only valid on the thread that
//! created them. [`ThreadBound`] lets a value holding such handles be shared
//! across threads while refusing every access from a thread other than its
//! owner.

use std::mem::ManuallyDrop;
use std::thread::{self, ThreadId};

/// Access attempted from a thread that does not own the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("graphics device owned by thread {owner:?} was used from thread {current:?}")]
pub struct AffinityViolation {
    pub owner: ThreadId,
    pub current: ThreadId,
}

/// Value that may only be touched from the thread that created it.
pub struct ThreadBound<T> {
    owner: ThreadId,
    value: ManuallyDrop<T>,
}

// SAFETY: the inner value is only reachable through `get`/`get_mut`, which
// check the calling thread, and `Drop` never runs the inner destructor off
// the owning thread. No `&T` or `&mut T` ever exists on a foreign thread.
unsafe impl<T> Send for ThreadBound<T> {}
unsafe impl<T> Sync for ThreadBound<T> {}

impl<T> ThreadBound<T> {
    /// Bind `value` to the calling thread.
    pub fn new(value: T) -> Self {
        Self {
            owner: thread::current().id(),
            value: ManuallyDrop::new(value),
        }
    }

    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    pub fn is_owner(&self) -> bool {
        thread::current().id() == self.owner
    }

    pub fn check(&self) -> Result<(), AffinityViolation> {
        let current = thread::current().id();
        if current == self.owner {
            Ok(())
        } else {
            Err(AffinityViolation {
                owner: self.owner,
                current,
            })
        }
    }

    pub fn get(&self) -> Result<&T, AffinityViolation> {
        self.check()?;
        Ok(&self.value)
    }

    pub fn get_mut(&mut self) -> Result<&mut T, AffinityViolation> {
        self.check()?;
        Ok(&mut self.value)
    }
}

impl<T> Drop for ThreadBound<T> {
    fn drop(&mut self) {
        if let Err(violation) = self.check() {
            tracing::error!(target: "graphics", "{violation}; leaking it instead of tearing down off-thread");
            return;
        }
        // SAFETY: dropped exactly once, on the owning thread.
        unsafe { ManuallyDrop::drop(&mut self.value) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn owner_thread_has_access() {
        let mut bound = ThreadBound::new(5);
        assert!(bound.is_owner());
        assert_eq!(*bound.get().unwrap(), 5);
        *bound.get_mut().unwrap() = 6;
        assert_eq!(*bound.get().unwrap(), 6);
    }

    #[test]
    fn other_thread_is_refused() {
        let bound = ThreadBound::new(Rc::new(Cell::new(1)));
        let owner = bound.owner();
        let err = thread::scope(|s| s.spawn(|| bound.get().map(|_| ()).unwrap_err()).join())
            .unwrap();
        assert_eq!(err.owner, owner);
        assert_ne!(err.current, owner);
        assert_eq!(bound.get().unwrap().get(), 1);
    }

    #[test]
    fn other_thread_cannot_borrow_mutably() {
        let mut bound = ThreadBound::new(vec![1, 2]);
        let refused = thread::scope(|s| {
            s.spawn(|| bound.get_mut().map(|v| v.push(3)).is_err())
                .join()
                .unwrap()
        });
        assert!(refused);
        assert_eq!(bound.get_mut().unwrap(), &mut vec![1, 2]);
    }

    #[test]
    fn foreign_drop_leaks_instead_of_running_destructor() {
        struct Flag(Rc<Cell<bool>>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let dropped = Rc::new(Cell::new(false));
        let bound = ThreadBound::new(Flag(dropped.clone()));
        thread::scope(|s| {
            s.spawn(move || drop(bound));
        });
        assert!(!dropped.get());

        let bound = ThreadBound::new(Flag(dropped.clone()));
        drop(bound);
        assert!(dropped.get());
    }
}
