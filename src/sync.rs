use super::*;
use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};

type SyncExecutor<T, E> = Box<dyn Executor<T, E> + Send>;

/// Thread-safe gate. Threads racing to activate it all get the same backing
/// promise and only one of them runs the executor.
pub struct SyncGate<T, E> {
    executor: Mutex<Option<SyncExecutor<T, E>>>,
    backing: OnceLock<EagerPromise<T, E>>,
}

impl<T, E> SyncGate<T, E> {
    pub(crate) fn new(executor: SyncExecutor<T, E>) -> Self {
        SyncGate { executor: Mutex::new(Some(executor)), backing: OnceLock::new() }
    }
}

impl<T: PromiseValue, E: PromiseValue> Gate<T, E> for SyncGate<T, E> {
    fn activate(&self, options: &Options) -> &EagerPromise<T, E> {
        if let Some(backing) = self.backing.get() {
            return backing;
        }

        let mut resolver = None;
        let backing = self.backing.get_or_init(|| {
            let (promise, pending) = EagerPromise::pending_in(options.runtime().cloned());
            resolver = Some(pending);
            promise
        });

        // No lock is held while the executor runs: it may call back into this gate.
        if let Some(resolver) = resolver {
            let executor = self.executor.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(executor) = executor {
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

impl<T, E> fmt::Debug for SyncGate<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncGate")
            .field("activated", &self.backing.get().is_some())
            .finish()
    }
}
