use super::*;
use std::cell::{Cell, OnceCell};
use std::fmt;

type LocalExecutor<T, E> = Box<dyn Executor<T, E>>;

/// Single-threaded gate.
pub struct LocalGate<T, E> {
    executor: Cell<Option<LocalExecutor<T, E>>>,
    backing: OnceCell<EagerPromise<T, E>>,
}

impl<T, E> LocalGate<T, E> {
    pub(crate) fn new(executor: LocalExecutor<T, E>) -> Self {
        LocalGate { executor: Cell::new(Some(executor)), backing: OnceCell::new() }
    }
}

impl<T: PromiseValue, E: PromiseValue> Gate<T, E> for LocalGate<T, E> {
    fn activate(&self, options: &Options) -> &EagerPromise<T, E> {
        if let Some(backing) = self.backing.get() {
            return backing;
        }

        // The backing is stored before the executor runs, so a call made from
        // inside the executor lands on it instead of starting over.
        let mut resolver = None;
        let backing = self.backing.get_or_init(|| {
            let (promise, pending) = EagerPromise::pending_in(options.runtime().cloned());
            resolver = Some(pending);
            promise
        });

        if let Some(resolver) = resolver {
            if let Some(executor) = self.executor.take() {
                debug!(label = options.label(), "activating lazy promise");
                execute(executor, resolver, options);
            }
        }
        backing
    }

    fn is_activated(&self) -> bool {
        self.backing.get().is_some()
    }
}

impl<T, E> fmt::Debug for LocalGate<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalGate")
            .field("activated", &self.backing.get().is_some())
            .finish()
    }
}
