//! A minimal eager promise: the executor runs as soon as the promise is built.
//!
//! Settlement travels over a oneshot channel into a [`Shared`] future, so any
//! number of clones and chained promises observe the same outcome. Chained
//! handlers are never called from the chaining method itself. Inside a Tokio
//! runtime every promise is driven by a spawned task, so handlers run once
//! their source settles whether or not anybody awaits the result. Outside a
//! runtime they run when the returned promise is polled.

use std::fmt;
use std::future::Future;
use std::ops::Index;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::{execute, Executor, Inspection, Options, Outcome, PromiseValue, Rejection};

enum Settlement<T, E> {
    Fulfilled(T),
    Rejected(Rejection<E>),
    Adopted(BoxFuture<'static, Outcome<T, E>>),
}

type Sender<T, E> = oneshot::Sender<Settlement<T, E>>;

/// The `resolve`/`reject` pair handed to an executor.
///
/// Only the first settlement counts. Dropping every clone without settling
/// rejects the promise with [`Rejection::Abandoned`].
pub struct Resolver<T, E> {
    sender: Arc<Mutex<Option<Sender<T, E>>>>,
    identity: Arc<()>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Resolver { sender: Arc::clone(&self.sender), identity: Arc::clone(&self.identity) }
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("settled", &self.lock().is_none())
            .finish()
    }
}

impl<T, E> Resolver<T, E> {
    fn new(sender: Sender<T, E>, identity: Arc<()>) -> Self {
        Resolver { sender: Arc::new(Mutex::new(Some(sender))), identity }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Sender<T, E>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, settlement: Settlement<T, E>) -> bool {
        let Some(sender) = self.lock().take() else {
            trace!("ignoring settlement of an already settled promise");
            return false;
        };
        if sender.send(settlement).is_err() {
            trace!("promise dropped before it was settled");
        }
        true
    }

    /// Returns `true` once one of the settling methods has been called.
    pub fn is_settled(&self) -> bool {
        self.lock().is_none()
    }

    pub fn resolve(&self, value: T) -> bool {
        self.settle(Settlement::Fulfilled(value))
    }

    pub fn reject(&self, reason: E) -> bool {
        self.settle(Settlement::Rejected(Rejection::Reason(reason)))
    }

    pub(crate) fn reject_with(&self, rejection: Rejection<E>) -> bool {
        self.settle(Settlement::Rejected(rejection))
    }

    /// Settle with whatever `future` settles with.
    ///
    /// A future that waits on this resolver's own promise never completes, so
    /// the promise stays pending. Use [`resolve_promise`](Self::resolve_promise)
    /// for promises: it rejects self-resolution.
    pub fn resolve_with<F>(&self, future: F) -> bool
    where
        F: Future<Output = Outcome<T, E>> + Send + 'static,
    {
        self.settle(Settlement::Adopted(future.boxed()))
    }

    /// Adopt the settlement of `promise`. Resolving a promise with itself
    /// rejects it with [`Rejection::SelfResolution`].
    pub fn resolve_promise(&self, promise: EagerPromise<T, E>) -> bool
    where
        T: PromiseValue,
        E: PromiseValue,
    {
        match &promise.origin {
            Some(origin) if Arc::ptr_eq(origin, &self.identity) => {
                debug!("promise resolved with itself");
                self.reject_with(Rejection::SelfResolution)
            }
            _ => self.resolve_with(promise),
        }
    }
}

/// A promise whose executor has already run.
///
/// Awaiting it yields `Result<T, Rejection<E>>`. Clones share the settlement.
#[must_use = "the outcome of a promise is lost unless it is awaited or handled"]
pub struct EagerPromise<T, E> {
    settled: Shared<BoxFuture<'static, Outcome<T, E>>>,
    runtime: Option<Handle>,
    origin: Option<Arc<()>>,
}

impl<T: PromiseValue, E: PromiseValue> Clone for EagerPromise<T, E> {
    fn clone(&self) -> Self {
        EagerPromise {
            settled: self.settled.clone(),
            runtime: self.runtime.clone(),
            origin: self.origin.clone(),
        }
    }
}

impl<T, E> fmt::Debug for EagerPromise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EagerPromise").finish_non_exhaustive()
    }
}

impl<T: PromiseValue, E: PromiseValue> EagerPromise<T, E> {
    /// Runs `executor` right away.
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Resolver<T, E>) -> Result<(), E>,
    {
        Self::from_executor(executor)
    }

    pub fn from_executor<X: Executor<T, E>>(executor: X) -> Self {
        let (promise, resolver) = Self::pending();
        execute(Box::new(executor), resolver, &Options::default());
        promise
    }

    /// A promise settled later through the returned resolver.
    pub fn pending() -> (Self, Resolver<T, E>) {
        Self::pending_in(None)
    }

    pub(crate) fn pending_in(runtime: Option<Handle>) -> (Self, Resolver<T, E>) {
        let (sender, receiver) = oneshot::channel();
        let settled = async move {
            match receiver.await {
                Ok(Settlement::Fulfilled(value)) => Ok(value),
                Ok(Settlement::Rejected(rejection)) => Err(rejection),
                Ok(Settlement::Adopted(future)) => future.await,
                Err(_) => {
                    debug!("every resolver dropped before settling");
                    Err(Rejection::Abandoned)
                }
            }
        };
        let identity = Arc::new(());
        let mut promise = Self::build(settled, runtime);
        promise.origin = Some(Arc::clone(&identity));
        (promise, Resolver::new(sender, identity))
    }

    pub fn resolved(value: T) -> Self {
        Self::from_future(future::ready(Ok(value)))
    }

    pub fn rejected(reason: E) -> Self {
        Self::from_future(future::ready(Err(Rejection::Reason(reason))))
    }

    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Outcome<T, E>> + Send + 'static,
    {
        Self::build(future, None)
    }

    // Without a runtime the promise is only driven by whoever polls it.
    fn build<F>(future: F, runtime: Option<Handle>) -> Self
    where
        F: Future<Output = Outcome<T, E>> + Send + 'static,
    {
        let settled = future.boxed().shared();
        let runtime = runtime.or_else(|| Handle::try_current().ok());
        if let Some(runtime) = &runtime {
            drop(runtime.spawn(settled.clone().map(drop)));
        }
        EagerPromise { settled, runtime, origin: None }
    }

    fn chain<U, F>(&self, future: F) -> EagerPromise<U, E>
    where
        U: PromiseValue,
        F: Future<Output = Outcome<U, E>> + Send + 'static,
    {
        EagerPromise::build(future, self.runtime.clone())
    }

    fn outcome_now(&self) -> Option<Outcome<T, E>> {
        self.settled.clone().now_or_never()
    }

    pub fn then<U, F>(&self, on_fulfilled: F) -> EagerPromise<U, E>
    where
        U: PromiseValue,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
    {
        let settled = self.settled.clone();
        self.chain(async move {
            settled
                .await
                .and_then(|value| on_fulfilled(value).map_err(Rejection::Reason))
        })
    }

    /// Like [`then`](Self::then), but the handler's future is adopted.
    pub fn then_async<U, F, Fut>(&self, on_fulfilled: F) -> EagerPromise<U, E>
    where
        U: PromiseValue,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
    {
        let settled = self.settled.clone();
        self.chain(async move {
            match settled.await {
                Ok(value) => on_fulfilled(value).await.map_err(Rejection::Reason),
                Err(rejection) => Err(rejection),
            }
        })
    }

    /// Recover from any rejection.
    pub fn catch<F>(&self, on_rejected: F) -> Self
    where
        F: FnOnce(Rejection<E>) -> Result<T, E> + Send + 'static,
    {
        let settled = self.settled.clone();
        self.chain(async move {
            match settled.await {
                Err(rejection) => on_rejected(rejection).map_err(Rejection::Reason),
                fulfilled => fulfilled,
            }
        })
    }

    pub fn caught<F>(&self, on_rejected: F) -> Self
    where
        F: FnOnce(Rejection<E>) -> Result<T, E> + Send + 'static,
    {
        self.catch(on_rejected)
    }

    /// Recover from operational rejections only. Panics and abandonment pass
    /// through untouched.
    pub fn error<F>(&self, on_error: F) -> Self
    where
        F: FnOnce(E) -> Result<T, E> + Send + 'static,
    {
        let settled = self.settled.clone();
        self.chain(async move {
            match settled.await {
                Err(Rejection::Reason(reason)) => on_error(reason).map_err(Rejection::Reason),
                other => other,
            }
        })
    }

    pub fn finally<F>(&self, on_settled: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let settled = self.settled.clone();
        self.chain(async move {
            let outcome = settled.await;
            on_settled();
            outcome
        })
    }

    pub fn lastly<F>(&self, on_settled: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.finally(on_settled)
    }

    /// Always fulfils, carrying either the value or the rejection.
    pub fn reflect(&self) -> EagerPromise<Inspection<T, E>, E> {
        let settled = self.settled.clone();
        self.chain(async move { Ok(Inspection::from(settled.await)) })
    }

    pub fn tap<F>(&self, on_fulfilled: F) -> Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        let settled = self.settled.clone();
        self.chain(async move {
            let outcome = settled.await;
            if let Ok(value) = &outcome {
                on_fulfilled(value);
            }
            outcome
        })
    }

    /// Terminal handler pair. Nothing can be chained after it.
    ///
    /// The handlers run on the promise's runtime. With no runtime at all, a
    /// promise that has already settled is reported right away and a pending
    /// one is reported as [`Rejection::Abandoned`], since nothing would ever
    /// drive it.
    pub fn done<F, R>(&self, on_fulfilled: F, on_rejected: R)
    where
        F: FnOnce(T) + Send + 'static,
        R: FnOnce(Rejection<E>) + Send + 'static,
    {
        let runtime = self.runtime.clone().or_else(|| Handle::try_current().ok());
        let Some(runtime) = runtime else {
            match self.outcome_now() {
                Some(Ok(value)) => on_fulfilled(value),
                Some(Err(rejection)) => on_rejected(rejection),
                None => {
                    debug!("no runtime to deliver a pending promise to its done handlers");
                    on_rejected(Rejection::Abandoned);
                }
            }
            return;
        };

        let settled = self.settled.clone();
        drop(runtime.spawn(async move {
            match settled.await {
                Ok(value) => on_fulfilled(value),
                Err(rejection) => on_rejected(rejection),
            }
        }));
    }

    /// Run `operation` against the fulfilled value, e.g. `promise.call(Vec::len)`.
    pub fn call<U, F>(&self, operation: F) -> EagerPromise<U, E>
    where
        U: PromiseValue,
        F: FnOnce(&T) -> U + Send + 'static,
    {
        let settled = self.settled.clone();
        self.chain(async move { settled.await.map(|value| operation(&value)) })
    }

    /// Project `value[key]` out of the fulfilled value.
    pub fn get<K>(&self, key: K) -> EagerPromise<<T as Index<K>>::Output, E>
    where
        T: Index<K>,
        <T as Index<K>>::Output: PromiseValue,
        K: Send + 'static,
    {
        let settled = self.settled.clone();
        self.chain(async move { settled.await.map(|value| value[key].clone()) })
    }

    pub fn then_return<U: PromiseValue>(&self, value: U) -> EagerPromise<U, E> {
        let settled = self.settled.clone();
        self.chain(async move { settled.await.map(|_| value) })
    }

    pub fn then_throw(&self, reason: E) -> Self {
        let settled = self.settled.clone();
        self.chain(async move { settled.await.and_then(|_| Err(Rejection::Reason(reason))) })
    }

    pub fn is_pending(&self) -> bool {
        self.outcome_now().is_none()
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self.outcome_now(), Some(Ok(_)))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.outcome_now(), Some(Err(_)))
    }

    pub fn value(&self) -> Option<T> {
        self.outcome_now()?.ok()
    }

    pub fn reason(&self) -> Option<Rejection<E>> {
        self.outcome_now()?.err()
    }
}

impl<T: PromiseValue, E: PromiseValue> Future for EagerPromise<T, E> {
    type Output = Outcome<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.settled.poll_unpin(cx)
    }
}
