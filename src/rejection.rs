use thiserror::Error;

/// Why a promise was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection<E> {
    /// Rejected by the producer or by a handler. The reason is kept as given.
    #[error("{0}")]
    Reason(E),

    /// The executor panicked while panic capture was enabled.
    #[error("executor panicked: {0}")]
    Panicked(String),

    /// Every resolver was dropped before the promise settled.
    #[error("promise abandoned before it settled")]
    Abandoned,

    /// The promise was resolved with itself.
    #[error("promise resolved with itself")]
    SelfResolution,
}

impl<E> Rejection<E> {
    pub fn reason(&self) -> Option<&E> {
        match self {
            Rejection::Reason(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn into_reason(self) -> Option<E> {
        match self {
            Rejection::Reason(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_operational(&self) -> bool {
        matches!(self, Rejection::Reason(_))
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
