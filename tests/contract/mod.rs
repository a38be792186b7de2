use super::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lazy_promise::{EagerPromise, Inspection, Rejection};
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
struct Failure(&'static str);

#[derive(Default)]
struct Probe {
    resolving: Arc<AtomicBool>,
    resolved: Arc<AtomicBool>,
}

impl Probe {
    fn resolving(&self) -> bool {
        self.resolving.load(Ordering::SeqCst)
    }

    fn resolved(&self) -> bool {
        self.resolved.load(Ordering::SeqCst)
    }
}

// Settles through a second promise, so `resolved` only flips once the chained
// handler has run on the runtime.
fn resolving_promise() -> (Subject<Vec<i32>, String>, Probe) {
    let probe = Probe::default();
    let resolving = Arc::clone(&probe.resolving);
    let resolved = Arc::clone(&probe.resolved);

    let promise = param(move |resolver: Resolver<Vec<i32>, String>| {
        resolving.store(true, Ordering::SeqCst);
        let outcome = EagerPromise::resolved(()).then(move |()| {
            resolved.store(true, Ordering::SeqCst);
            Ok(vec![1, 2, 3])
        });
        resolver.resolve_with(outcome);
        Ok(())
    });
    (promise, probe)
}

async fn next_macrotask() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

macro_rules! activates_with {
    ($($name:ident => |$promise:ident| $invoke:expr;)+) => {$(
        #[tokio::test]
        async fn $name() {
            let ($promise, probe) = resolving_promise();
            next_macrotask().await;
            assert!(!probe.resolving());
            assert!(!probe.resolved());

            $invoke;

            assert!(probe.resolving());
            assert!(probe.resolved());
        }
    )+};
}

activates_with! {
    then => |promise| assert_eq!(Ok(()), promise.then(|_| Ok(())).await);
    then_async => |promise| assert_eq!(Ok(3), promise.then_async(|v| async move { Ok(v.len()) }).await);
    catch => |promise| assert_eq!(Ok(vec![1, 2, 3]), promise.catch(|_| Ok(Vec::new())).await);
    caught => |promise| assert_eq!(Ok(vec![1, 2, 3]), promise.caught(|_| Ok(Vec::new())).await);
    error => |promise| assert_eq!(Ok(vec![1, 2, 3]), promise.error(|_| Ok(Vec::new())).await);
    finally => |promise| assert!(promise.finally(|| ()).await.is_ok());
    lastly => |promise| assert!(promise.lastly(|| ()).await.is_ok());
    reflect => |promise| assert_eq!(Ok(Inspection::Fulfilled(vec![1, 2, 3])), promise.reflect().await);
    tap => |promise| assert!(promise.tap(|_| ()).await.is_ok());
    done => |promise| {
        let (sender, receiver) = oneshot::channel();
        promise.done(move |value| drop(sender.send(value)), |_| ());
        assert_eq!(Ok(vec![1, 2, 3]), receiver.await);
    };
    call => |promise| assert_eq!(Ok(3), promise.call(Vec::len).await);
    get => |promise| assert_eq!(Ok(1), promise.get(0usize).await);
    then_return => |promise| assert_eq!(Ok("foo"), promise.then_return("foo").await);
    then_throw => |promise| {
        let recovered = promise.then_throw("boom".to_owned()).catch(|_| Ok(Vec::new()));
        assert_eq!(Ok(Vec::new()), recovered.await);
    };
    eager => |promise| assert!(promise.eager().await.is_ok());
    await_by_reference => |promise| assert!((&promise).await.is_ok());
    await_by_value => |promise| assert!(promise.await.is_ok());
}

#[tokio::test]
async fn synchronous_inspection_activates() {
    let inspections: [fn(&Subject<Vec<i32>, String>) -> bool; 5] = [
        |promise| promise.is_pending(),
        |promise| promise.is_fulfilled(),
        |promise| promise.is_rejected(),
        |promise| promise.value().is_some(),
        |promise| promise.reason().is_some(),
    ];

    for inspect in inspections {
        let (promise, probe) = resolving_promise();
        assert!(!probe.resolving());

        inspect(&promise);
        assert!(probe.resolving());

        assert_eq!(Ok(vec![1, 2, 3]), promise.await);
        assert!(probe.resolved());
    }
}

#[tokio::test]
async fn stays_dormant_without_consumers() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);

    let _promise = param(move |resolver: Resolver<i32, String>| {
        flag.store(true, Ordering::SeqCst);
        resolver.resolve(1);
        Ok(())
    });
    next_macrotask().await;

    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn should_call_executor_just_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);

    let promise = param(move |resolver: Resolver<i32, String>| {
        counter.fetch_add(1, Ordering::SeqCst);
        resolver.resolve(1);
        Ok(())
    });

    for _ in 0..10 {
        assert_eq!(Ok(2), promise.then(|value| Ok(value + 1)).await);
    }
    assert_eq!(Ok(1), promise.catch(|_| Ok(0)).await);
    assert_eq!(Ok(1), promise.tap(|_| ()).await);
    assert_eq!(Ok(Inspection::Fulfilled(1)), promise.reflect().await);
    assert_eq!(Ok(()), promise.then_return(()).await);
    assert!(!promise.is_pending());
    assert_eq!(Ok(1), promise.eager().await);

    assert_eq!(1, runs.load(Ordering::SeqCst));
}

#[tokio::test]
async fn rejection_passes_through_unchanged() {
    let resolving = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&resolving);

    let promise = param(move |resolver: Resolver<(), String>| {
        flag.store(true, Ordering::SeqCst);
        resolver.reject("Some error".to_owned());
        Ok(())
    });
    next_macrotask().await;
    assert!(!resolving.load(Ordering::SeqCst));

    let (sender, receiver) = oneshot::channel();
    let handled = promise.catch(move |reason| {
        let _ = sender.send(reason);
        Ok(())
    });

    assert_eq!(Ok(()), handled.await);
    assert!(resolving.load(Ordering::SeqCst));
    assert_eq!(Ok(Rejection::Reason("Some error".to_owned())), receiver.await);
}

#[tokio::test]
async fn failing_executor_becomes_a_rejection() {
    let resolving = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&resolving);

    let promise = param(move |_: Resolver<(), Failure>| {
        flag.store(true, Ordering::SeqCst);
        Err(Failure("Some error"))
    });
    next_macrotask().await;
    assert!(!resolving.load(Ordering::SeqCst));

    let (sender, receiver) = oneshot::channel();
    promise.done(|()| (), move |rejection| drop(sender.send(rejection)));
    let rejection = receiver.await.unwrap();

    assert!(resolving.load(Ordering::SeqCst));
    assert_eq!("Some error", rejection.to_string());
    assert_eq!(Some(&Failure("Some error")), rejection.reason());
}

#[tokio::test]
async fn handler_errors_are_not_intercepted() {
    let promise = param(|resolver: Resolver<i32, String>| {
        resolver.resolve(1);
        Ok(())
    });

    let failed = promise.then(|_| Err::<i32, _>("handler failed".to_owned()));

    assert_eq!(Err(Rejection::Reason("handler failed".to_owned())), failed.await);
}

#[tokio::test]
async fn only_touched_promises_run() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let promises = (0..100)
        .map(|index| {
            let log = Arc::clone(&log);
            param(move |resolver: Resolver<usize, String>| {
                log.lock().unwrap().push(index);
                resolver.resolve(index);
                Ok(())
            })
        })
        .collect::<Vec<_>>();
    next_macrotask().await;
    assert!(log.lock().unwrap().is_empty());

    assert_eq!(Ok(42), promises[42].then(Ok).await);
    next_macrotask().await;

    assert_eq!(vec![42], *log.lock().unwrap());
}

#[tokio::test]
async fn resolver_can_settle_after_the_executor_returns() {
    let promise = param(|resolver: Resolver<&'static str, String>| {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            resolver.resolve("later");
        });
        Ok(())
    });

    assert!(promise.is_pending());
    assert_eq!(Ok("later"), promise.await);
}

#[tokio::test]
async fn dropped_resolver_abandons() {
    let promise = param(|_: Resolver<i32, String>| Ok(()));

    assert_eq!(Err(Rejection::Abandoned), promise.await);
}

#[tokio::test]
async fn handlers_run_without_being_awaited() {
    let recovered = Arc::new(AtomicBool::new(false));
    let tapped = Arc::new(AtomicBool::new(false));

    let rejected = param(|resolver: Resolver<i32, String>| {
        resolver.reject("Some error".to_owned());
        Ok(())
    });
    let fulfilled = param(|resolver: Resolver<i32, String>| {
        resolver.resolve(1);
        Ok(())
    });

    let flag = Arc::clone(&recovered);
    let _ = rejected.catch(move |_| {
        flag.store(true, Ordering::SeqCst);
        Ok(0)
    });
    let flag = Arc::clone(&tapped);
    let _ = fulfilled.tap(move |_| flag.store(true, Ordering::SeqCst));
    next_macrotask().await;

    assert!(recovered.load(Ordering::SeqCst));
    assert!(tapped.load(Ordering::SeqCst));
}

struct Constant(i32);

impl Executor<i32, String> for Constant {
    fn execute(self: Box<Self>, resolver: Resolver<i32, String>) -> Result<(), String> {
        resolver.resolve(self.0);
        Ok(())
    }
}

#[tokio::test]
async fn use_executor_trait() {
    let promise = executor_param(Constant(42));

    assert_eq!(Ok(43), promise.then(|value| Ok(value + 1)).await);
    assert_eq!(Some(42), promise.value());
}
