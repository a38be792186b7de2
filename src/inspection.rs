use crate::{Outcome, Rejection};

/// Snapshot of a settled promise, as produced by `reflect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection<T, E> {
    Fulfilled(T),
    Rejected(Rejection<E>),
}

impl<T, E> Inspection<T, E> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Inspection::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Inspection::Rejected(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Inspection::Fulfilled(value) => Some(value),
            Inspection::Rejected(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&Rejection<E>> {
        match self {
            Inspection::Fulfilled(_) => None,
            Inspection::Rejected(rejection) => Some(rejection),
        }
    }

    pub fn into_result(self) -> Outcome<T, E> {
        match self {
            Inspection::Fulfilled(value) => Ok(value),
            Inspection::Rejected(rejection) => Err(rejection),
        }
    }
}

impl<T, E> From<Outcome<T, E>> for Inspection<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        match outcome {
            Ok(value) => Inspection::Fulfilled(value),
            Err(rejection) => Inspection::Rejected(rejection),
        }
    }
}
