use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// TbObj lets tasks share testbench state (kernel, scoreboards, counters). Tasks of one
// scenario all run on the same thread, so the lock is never contended; it exists so
// that scenarios can be moved to and run on any thread.
pub struct TbObj<T>(Arc<Mutex<T>>);

impl<T> TbObj<T> {
    pub fn new(data: T) -> TbObj<T> {
        TbObj(Arc::new(Mutex::new(data)))
    }
    pub fn get(&self) -> MutexGuard<'_, T> {
        // a panicking task must not take the whole scenario teardown with it
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.get())
    }
}

impl<T> Clone for TbObj<T> {
    fn clone(&self) -> Self {
        TbObj(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = TbObj::new(0u32);
        let b = a.clone();
        b.with_mut(|v| *v += 3);
        assert_eq!(*a.get(), 3);
    }
}
