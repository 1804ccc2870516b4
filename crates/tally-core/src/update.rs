use std::fmt;

/// One queued request against a [`StateCell`](crate::StateCell).
///
/// A `Replace` discards whatever the batch produced so far. An `Apply` maps
/// the value left by the previous request, which is what lets several
/// requests in one batch accumulate.
pub enum Update<T> {
    Replace(T),
    Apply(Box<dyn FnOnce(&T) -> T>),
}

impl<T> Update<T> {
    pub fn replace(value: T) -> Self {
        Update::Replace(value)
    }

    pub fn apply(f: impl FnOnce(&T) -> T + 'static) -> Self {
        Update::Apply(Box::new(f))
    }

    /// One fold step.
    pub fn apply_to(self, prev: T) -> T {
        match self {
            Update::Replace(v) => v,
            Update::Apply(f) => f(&prev),
        }
    }
}

impl<T> From<T> for Update<T> {
    fn from(value: T) -> Self {
        Update::Replace(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Replace(v) => f.debug_tuple("Replace").field(v).finish(),
            Update::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}

/// Applies `requests` in order, starting from `start`.
pub fn fold<T>(start: T, requests: impl IntoIterator<Item = Update<T>>) -> T {
    requests
        .into_iter()
        .fold(start, |prev, request| request.apply_to(prev))
}

/// How a cell obtains its first value.
pub enum Initial<T> {
    Value(T),
    /// Called once, at construction.
    Producer(Box<dyn FnOnce() -> T>),
}

impl<T> Initial<T> {
    pub fn producer(f: impl FnOnce() -> T + 'static) -> Self {
        Initial::Producer(Box::new(f))
    }

    pub fn resolve(self) -> T {
        match self {
            Initial::Value(v) => v,
            Initial::Producer(f) => f(),
        }
    }
}

impl<T> From<T> for Initial<T> {
    fn from(value: T) -> Self {
        Initial::Value(value)
    }
}
