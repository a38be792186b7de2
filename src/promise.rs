use std::fmt;
use std::future::{Future, IntoFuture};
use std::marker::PhantomData;
use std::ops::Index;

use crate::{
    EagerPromise, Executor, Gate, Inspection, LocalGate, Options, Outcome, PromiseValue,
    Rejection, Resolver, SyncGate,
};

/// A promise whose executor runs on the first consuming call.
///
/// Every method below activates the promise and then forwards to the
/// [`EagerPromise`] method of the same name. Their results are ordinary eager
/// promises, so a chain is only lazy at its head.
pub struct LazyPromise<T, E, G = LocalGate<T, E>> {
    gate: G,
    options: Options,
    marker: PhantomData<fn() -> (T, E)>,
}

/// A [`LazyPromise`] that can be shared between threads.
pub type SyncLazyPromise<T, E> = LazyPromise<T, E, SyncGate<T, E>>;

impl<T: PromiseValue, E: PromiseValue> LazyPromise<T, E> {
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Resolver<T, E>) -> Result<(), E> + 'static,
    {
        Self::with_options(executor, Options::default())
    }

    pub fn with_options<F>(executor: F, options: Options) -> Self
    where
        F: FnOnce(Resolver<T, E>) -> Result<(), E> + 'static,
    {
        Self::from_executor(executor, options)
    }

    pub fn from_executor<X: Executor<T, E> + 'static>(executor: X, options: Options) -> Self {
        LazyPromise { gate: LocalGate::new(Box::new(executor)), options, marker: PhantomData }
    }
}

impl<T: PromiseValue, E: PromiseValue> LazyPromise<T, E, SyncGate<T, E>> {
    pub fn new_sync<F>(executor: F) -> Self
    where
        F: FnOnce(Resolver<T, E>) -> Result<(), E> + Send + 'static,
    {
        Self::sync_with_options(executor, Options::default())
    }

    pub fn sync_with_options<F>(executor: F, options: Options) -> Self
    where
        F: FnOnce(Resolver<T, E>) -> Result<(), E> + Send + 'static,
    {
        Self::sync_from_executor(executor, options)
    }

    pub fn sync_from_executor<X>(executor: X, options: Options) -> Self
    where
        X: Executor<T, E> + Send + 'static,
    {
        LazyPromise { gate: SyncGate::new(Box::new(executor)), options, marker: PhantomData }
    }
}

impl<T: PromiseValue, E: PromiseValue, G: Gate<T, E>> LazyPromise<T, E, G> {
    fn backing(&self) -> &EagerPromise<T, E> {
        self.gate.activate(&self.options)
    }

    /// The backing promise.
    pub fn eager(&self) -> EagerPromise<T, E> {
        self.backing().clone()
    }

    pub fn then<U, F>(&self, on_fulfilled: F) -> EagerPromise<U, E>
    where
        U: PromiseValue,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
    {
        self.backing().then(on_fulfilled)
    }

    pub fn then_async<U, F, Fut>(&self, on_fulfilled: F) -> EagerPromise<U, E>
    where
        U: PromiseValue,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
    {
        self.backing().then_async(on_fulfilled)
    }

    pub fn catch<F>(&self, on_rejected: F) -> EagerPromise<T, E>
    where
        F: FnOnce(Rejection<E>) -> Result<T, E> + Send + 'static,
    {
        self.backing().catch(on_rejected)
    }

    pub fn caught<F>(&self, on_rejected: F) -> EagerPromise<T, E>
    where
        F: FnOnce(Rejection<E>) -> Result<T, E> + Send + 'static,
    {
        self.backing().caught(on_rejected)
    }

    pub fn error<F>(&self, on_error: F) -> EagerPromise<T, E>
    where
        F: FnOnce(E) -> Result<T, E> + Send + 'static,
    {
        self.backing().error(on_error)
    }

    pub fn finally<F>(&self, on_settled: F) -> EagerPromise<T, E>
    where
        F: FnOnce() + Send + 'static,
    {
        self.backing().finally(on_settled)
    }

    pub fn lastly<F>(&self, on_settled: F) -> EagerPromise<T, E>
    where
        F: FnOnce() + Send + 'static,
    {
        self.backing().lastly(on_settled)
    }

    pub fn reflect(&self) -> EagerPromise<Inspection<T, E>, E> {
        self.backing().reflect()
    }

    pub fn tap<F>(&self, on_fulfilled: F) -> EagerPromise<T, E>
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.backing().tap(on_fulfilled)
    }

    /// See [`EagerPromise::done`] for delivery without a runtime.
    pub fn done<F, R>(&self, on_fulfilled: F, on_rejected: R)
    where
        F: FnOnce(T) + Send + 'static,
        R: FnOnce(Rejection<E>) + Send + 'static,
    {
        self.backing().done(on_fulfilled, on_rejected)
    }

    pub fn call<U, F>(&self, operation: F) -> EagerPromise<U, E>
    where
        U: PromiseValue,
        F: FnOnce(&T) -> U + Send + 'static,
    {
        self.backing().call(operation)
    }

    pub fn get<K>(&self, key: K) -> EagerPromise<<T as Index<K>>::Output, E>
    where
        T: Index<K>,
        <T as Index<K>>::Output: PromiseValue,
        K: Send + 'static,
    {
        self.backing().get(key)
    }

    pub fn then_return<U: PromiseValue>(&self, value: U) -> EagerPromise<U, E> {
        self.backing().then_return(value)
    }

    pub fn then_throw(&self, reason: E) -> EagerPromise<T, E> {
        self.backing().then_throw(reason)
    }

    pub fn is_pending(&self) -> bool {
        self.backing().is_pending()
    }

    pub fn is_fulfilled(&self) -> bool {
        self.backing().is_fulfilled()
    }

    pub fn is_rejected(&self) -> bool {
        self.backing().is_rejected()
    }

    pub fn value(&self) -> Option<T> {
        self.backing().value()
    }

    pub fn reason(&self) -> Option<Rejection<E>> {
        self.backing().reason()
    }
}

impl<T: PromiseValue, E: PromiseValue, G: Gate<T, E>> IntoFuture for LazyPromise<T, E, G> {
    type Output = Outcome<T, E>;
    type IntoFuture = EagerPromise<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.eager()
    }
}

impl<T: PromiseValue, E: PromiseValue, G: Gate<T, E>> IntoFuture for &LazyPromise<T, E, G> {
    type Output = Outcome<T, E>;
    type IntoFuture = EagerPromise<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.eager()
    }
}

impl<T, E, G: Gate<T, E>> fmt::Debug for LazyPromise<T, E, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyPromise")
            .field("label", &self.options.label())
            .field("activated", &self.gate.is_activated())
            .finish()
    }
}
