//! Promises that stay dormant until somebody asks for their result.
//!
//! A [`LazyPromise`] keeps its executor until the first consuming call
//! (`then`, `catch`, `reflect`, `await`, ...). That call runs the executor
//! exactly once, stores the resulting [`EagerPromise`] and delegates to it.
//! From then on the lazy promise is a thin proxy over the eager one.
//!
//! ```
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! use lazy_promise::LazyPromise;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let started = Arc::new(AtomicBool::new(false));
//! let flag = Arc::clone(&started);
//!
//! let promise: LazyPromise<u32, String> = LazyPromise::new(move |resolver| {
//!     flag.store(true, Ordering::SeqCst);
//!     resolver.resolve(40);
//!     Ok(())
//! });
//! assert!(!started.load(Ordering::SeqCst));
//!
//! let answer = promise.then(|value| Ok(value + 2)).await;
//! assert!(started.load(Ordering::SeqCst));
//! assert_eq!(Ok(42), answer);
//! # }
//! ```
//!
//! [`LazyPromise`] is single-threaded. [`SyncLazyPromise`] can be shared
//! between threads and still runs its executor once.

use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

mod eager;
mod inspection;
mod lazy;
mod options;
mod promise;
mod rejection;
mod sync;

pub use eager::{EagerPromise, Resolver};
pub use inspection::Inspection;
pub use lazy::LocalGate;
pub use options::Options;
pub use promise::{LazyPromise, SyncLazyPromise};
pub use rejection::Rejection;
pub use sync::SyncGate;

use rejection::panic_message;

/// What awaiting a promise yields.
pub type Outcome<T, E> = Result<T, Rejection<E>>;

/// Bounds shared by fulfilment values and rejection reasons.
pub trait PromiseValue: Clone + Send + Sync + 'static {}

impl<V: Clone + Send + Sync + 'static> PromiseValue for V {}

/// The producer of a promise's value.
///
/// Returning `Err` rejects the promise with that reason, unless the executor
/// already settled it.
pub trait Executor<T, E> {
    fn execute(self: Box<Self>, resolver: Resolver<T, E>) -> Result<(), E>;
}

impl<T, E, F> Executor<T, E> for F
where
    F: FnOnce(Resolver<T, E>) -> Result<(), E>,
{
    fn execute(self: Box<Self>, resolver: Resolver<T, E>) -> Result<(), E> {
        (*self)(resolver)
    }
}

/// Holds a deferred executor and the promise it produces once activated.
pub trait Gate<T, E> {
    /// Runs the executor on the first call only. Every call returns the same
    /// backing promise.
    fn activate(&self, options: &Options) -> &EagerPromise<T, E>;

    fn is_activated(&self) -> bool;
}

pub(crate) fn execute<T, E, X>(executor: Box<X>, resolver: Resolver<T, E>, options: &Options)
where
    T: PromiseValue,
    E: PromiseValue,
    X: Executor<T, E> + ?Sized,
{
    let settle = resolver.clone();
    let failure = if options.catches_panics() {
        match panic::catch_unwind(AssertUnwindSafe(move || executor.execute(resolver))) {
            Ok(result) => result.err().map(Rejection::Reason),
            Err(payload) => Some(Rejection::Panicked(panic_message(&*payload))),
        }
    } else {
        executor.execute(resolver).err().map(Rejection::Reason)
    };

    if let Some(rejection) = failure {
        debug!(label = options.label(), "executor failed");
        settle.reject_with(rejection);
    }
}
