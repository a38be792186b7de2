use std::borrow::Cow;

use tokio::runtime::Handle;

/// Settings that shape how a lazy promise activates.
///
/// ```
/// use lazy_promise::{LazyPromise, Options};
///
/// let promise: LazyPromise<u32, String> = LazyPromise::with_options(
///     |resolver| {
///         resolver.resolve(7);
///         Ok(())
///     },
///     Options::new().with_label("seven").with_catch_panics(true),
/// );
/// # drop(promise);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Options {
    label: Option<Cow<'static, str>>,
    catch_panics: bool,
    runtime: Option<Handle>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name reported in log events about this promise.
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Turn an executor panic into [`Rejection::Panicked`](crate::Rejection::Panicked)
    /// instead of unwinding into whichever call triggered activation.
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    /// Runtime that terminal `done` callbacks are spawned on.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("<anonymous>")
    }

    pub fn catches_panics(&self) -> bool {
        self.catch_panics
    }

    pub fn runtime(&self) -> Option<&Handle> {
        self.runtime.as_ref()
    }
}
