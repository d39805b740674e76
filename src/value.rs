//! Async values.
//!
//! This module contains [`AsyncValue`], which captures the state of a single asynchronous
//! request, and [`Handlers`], which allows dispatching on it with optional per-state callbacks.
use crate::{ErrorInfo, ResponseEnvelope};

/// State of an asynchronous request.
///
/// A value is always in exactly one state. State transitions replace the value entirely, they
/// never modify a previous state in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AsyncValue<T> {
    /// Request is in progress.
    Pending,
    /// Request failed. A new trigger starts a new attempt.
    Failed(ErrorInfo),
    /// Request succeeded. `None` means the request succeeded without data, which is different
    /// from not being done yet.
    Resolved(Option<T>),
}

impl<T> Default for AsyncValue<T> {
    fn default() -> Self {
        AsyncValue::Resolved(None)
    }
}

impl<T> AsyncValue<T> {
    /// Create a value resolved with the given data.
    pub fn new(data: T) -> Self {
        AsyncValue::Resolved(Some(data))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AsyncValue::Pending)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AsyncValue::Failed(_))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, AsyncValue::Resolved(_))
    }

    /// Return an option with a reference to the data, if resolved with data.
    pub fn data(&self) -> Option<&T> {
        match self {
            AsyncValue::Resolved(data) => data.as_ref(),
            _ => None,
        }
    }

    /// Return the error, if failed.
    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            AsyncValue::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> AsyncValue<&T> {
        match self {
            AsyncValue::Pending => AsyncValue::Pending,
            AsyncValue::Failed(error) => AsyncValue::Failed(error.clone()),
            AsyncValue::Resolved(data) => AsyncValue::Resolved(data.as_ref()),
        }
    }

    /// Map the resolved data, keeping the state.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> AsyncValue<U> {
        match self {
            AsyncValue::Pending => AsyncValue::Pending,
            AsyncValue::Failed(error) => AsyncValue::Failed(error),
            AsyncValue::Resolved(data) => AsyncValue::Resolved(data.map(f)),
        }
    }

    /// Dispatch on the current state.
    ///
    /// Exactly one handler is invoked, the one matching the current state. If that handler was
    /// not given, nothing is invoked and `None` is returned.
    ///
    /// ```
    /// use async_value_cache::{AsyncValue, Handlers};
    ///
    /// let value = AsyncValue::new(3);
    /// let label = value.when(
    ///     Handlers::new()
    ///         .pending(|| "loading".to_string())
    ///         .resolved(|data: Option<&i32>| format!("got {data:?}")),
    /// );
    /// assert_eq!(label.as_deref(), Some("got Some(3)"));
    /// ```
    pub fn when<'a, R>(&'a self, handlers: Handlers<'a, T, R>) -> Option<R> {
        match self {
            AsyncValue::Pending => handlers.pending.map(|f| f()),
            AsyncValue::Failed(error) => handlers.failed.map(|f| f(error)),
            AsyncValue::Resolved(data) => handlers.resolved.map(|f| f(data.as_ref())),
        }
    }
}

impl<T> From<ResponseEnvelope<T>> for AsyncValue<T> {
    fn from(envelope: ResponseEnvelope<T>) -> Self {
        match envelope {
            ResponseEnvelope::Success { data } => AsyncValue::Resolved(Some(data)),
            ResponseEnvelope::Failed { error } => AsyncValue::Failed(error),
        }
    }
}

type PendingFn<'a, R> = Box<dyn FnOnce() -> R + 'a>;
type FailedFn<'a, R> = Box<dyn FnOnce(&'a ErrorInfo) -> R + 'a>;
type ResolvedFn<'a, T, R> = Box<dyn FnOnce(Option<&'a T>) -> R + 'a>;

/// Set of optional handlers for [`AsyncValue::when`].
pub struct Handlers<'a, T, R> {
    pending: Option<PendingFn<'a, R>>,
    failed: Option<FailedFn<'a, R>>,
    resolved: Option<ResolvedFn<'a, T, R>>,
}

impl<'a, T, R> Default for Handlers<'a, T, R> {
    fn default() -> Self {
        Self {
            pending: None,
            failed: None,
            resolved: None,
        }
    }
}

impl<'a, T, R> Handlers<'a, T, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(mut self, f: impl FnOnce() -> R + 'a) -> Self {
        self.pending = Some(Box::new(f));
        self
    }

    pub fn failed(mut self, f: impl FnOnce(&'a ErrorInfo) -> R + 'a) -> Self {
        self.failed = Some(Box::new(f));
        self
    }

    pub fn resolved(mut self, f: impl FnOnce(Option<&'a T>) -> R + 'a) -> Self {
        self.resolved = Some(Box::new(f));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_resolved_none() {
        let value = AsyncValue::<u32>::default();
        assert!(value.is_resolved());
        assert_eq!(value.data(), None);
    }

    #[test]
    fn predicates_are_exclusive() {
        let values = [
            AsyncValue::Pending,
            AsyncValue::Failed(ErrorInfo::new("HttpError", "nope")),
            AsyncValue::new(1),
        ];
        for value in &values {
            let active = [value.is_pending(), value.is_failed(), value.is_resolved()];
            assert_eq!(active.iter().filter(|active| **active).count(), 1);
        }
    }

    #[test]
    fn when_invokes_matching_handler() {
        let failed = AsyncValue::<u32>::Failed(ErrorInfo::new("ParseError", "eof"));
        let result = failed.when(
            Handlers::new()
                .pending(|| "pending".to_string())
                .failed(|error| error.message.clone())
                .resolved(|_| "resolved".to_string()),
        );
        assert_eq!(result.as_deref(), Some("eof"));
    }

    #[test]
    fn when_without_handler_is_none() {
        let pending = AsyncValue::<u32>::Pending;
        let result = pending.when(Handlers::new().resolved(|data| data.copied()));
        assert_eq!(result, None);
    }

    #[test]
    fn when_resolved_none() {
        let empty = AsyncValue::<u32>::Resolved(None);
        let result = empty.when(Handlers::new().resolved(|data| data.is_none()));
        assert_eq!(result, Some(true));
    }

    #[test]
    fn from_envelope() {
        assert_eq!(AsyncValue::from(ResponseEnvelope::success(2)), AsyncValue::new(2));
        let error = ErrorInfo::new("ValidationError", "bad input");
        assert_eq!(
            AsyncValue::<u32>::from(ResponseEnvelope::failed(error.clone())),
            AsyncValue::Failed(error)
        );
    }

    #[test]
    fn map_keeps_state() {
        assert_eq!(AsyncValue::new(2).map(|x| x * 2), AsyncValue::new(4));
        assert_eq!(AsyncValue::<u32>::Pending.map(|x| x * 2), AsyncValue::Pending);
    }
}
