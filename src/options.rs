//! Configuration of clients and bindings.
use crate::{ErrorInfo, Method, RequestInit, ResponseEnvelope};
use serde::{Deserialize, Serialize};
use std::{fmt, rc::Rc, time::Duration};

/// Default options of a [`Client`](crate::Client), used by all of its bindings unless the
/// binding overrides them.
///
/// This can be deserialized from configuration, for example:
///
/// ```
/// # use async_value_cache::ClientDefaults;
/// let defaults: ClientDefaults = serde_json::from_str(r#"{
///     "retry_count": 2,
///     "headers": {"Accept": "application/json"}
/// }"#).unwrap();
/// assert!(defaults.cache);
/// assert_eq!(defaults.retry_count, 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientDefaults {
    /// Whether resolved values are cached.
    pub cache: bool,
    /// How often a request is retried after a network error.
    pub retry_count: u32,
    /// Whether bindings fetch when mounted.
    pub fetch_on_mount: bool,
    /// Default method, body and headers of requests.
    #[serde(flatten)]
    pub init: RequestInit,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            cache: true,
            retry_count: 0,
            fetch_on_mount: true,
            init: RequestInit::default(),
        }
    }
}

pub(crate) type DataFn<T> = Rc<dyn Fn(T) -> T>;
pub(crate) type SuccessFn<T> = Rc<dyn Fn(&T)>;
pub(crate) type ErrorFn = Rc<dyn Fn(&ErrorInfo)>;

/// Options of a single binding.
///
/// Flags that are left unset fall back to the [`ClientDefaults`].
pub struct BindingOptions<T> {
    /// Method, body and headers of this binding's requests.
    pub init: RequestInit,
    pub cache: Option<bool>,
    pub fetch_on_mount: Option<bool>,
    pub retry_count: Option<u32>,
    /// Interval at which the data is refreshed, see [`crate::Binding::run_interval`].
    pub fetch_interval: Option<Duration>,
    /// Initial state, takes precedence over cached values.
    pub initial_data: Option<ResponseEnvelope<T>>,
    pub(crate) on_data: Option<DataFn<T>>,
    pub(crate) on_success: Option<SuccessFn<T>>,
    pub(crate) on_error: Option<ErrorFn>,
}

impl<T> Default for BindingOptions<T> {
    fn default() -> Self {
        Self {
            init: RequestInit::default(),
            cache: None,
            fetch_on_mount: None,
            retry_count: None,
            fetch_interval: None,
            initial_data: None,
            on_data: None,
            on_success: None,
            on_error: None,
        }
    }
}

impl<T> Clone for BindingOptions<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            init: self.init.clone(),
            cache: self.cache,
            fetch_on_mount: self.fetch_on_mount,
            retry_count: self.retry_count,
            fetch_interval: self.fetch_interval,
            initial_data: self.initial_data.clone(),
            on_data: self.on_data.clone(),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BindingOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingOptions")
            .field("init", &self.init)
            .field("cache", &self.cache)
            .field("fetch_on_mount", &self.fetch_on_mount)
            .field("retry_count", &self.retry_count)
            .field("fetch_interval", &self.fetch_interval)
            .field("initial_data", &self.initial_data)
            .field("on_data", &self.on_data.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl<T> BindingOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(mut self, init: RequestInit) -> Self {
        self.init = init;
        self
    }

    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn fetch_on_mount(mut self, fetch_on_mount: bool) -> Self {
        self.fetch_on_mount = Some(fetch_on_mount);
        self
    }

    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    pub fn fetch_interval(mut self, interval: Duration) -> Self {
        self.fetch_interval = Some(interval);
        self
    }

    pub fn initial_data(mut self, initial_data: ResponseEnvelope<T>) -> Self {
        self.initial_data = Some(initial_data);
        self
    }

    /// Transform the payload of successful responses before it is stored.
    pub fn on_data(mut self, f: impl Fn(T) -> T + 'static) -> Self {
        self.on_data = Some(Rc::new(f));
        self
    }

    /// Called with the (transformed) data after every successful fetch.
    pub fn on_success(mut self, f: impl Fn(&T) + 'static) -> Self {
        self.on_success = Some(Rc::new(f));
        self
    }

    /// Called with the error after every failed fetch.
    pub fn on_error(mut self, f: impl Fn(&ErrorInfo) + 'static) -> Self {
        self.on_error = Some(Rc::new(f));
        self
    }
}

/// Per-call overrides of a fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchOverrides {
    pub method: Option<Method>,
    pub body: Option<String>,
}

impl FetchOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl From<FetchOverrides> for RequestInit {
    fn from(overrides: FetchOverrides) -> Self {
        RequestInit {
            method: overrides.method,
            body: overrides.body,
            headers: Default::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_defaults() {
        let defaults = ClientDefaults::default();
        assert!(defaults.cache);
        assert!(defaults.fetch_on_mount);
        assert_eq!(defaults.retry_count, 0);
    }

    #[test]
    fn client_defaults_from_json() {
        let defaults: ClientDefaults = serde_json::from_str(
            r#"{"cache": false, "method": "POST", "headers": {"X-Token": "abc"}}"#,
        )
        .unwrap();
        assert!(!defaults.cache);
        assert!(defaults.fetch_on_mount);
        assert_eq!(defaults.init.method, Some(Method::Post));
        assert_eq!(defaults.init.headers["X-Token"], "abc");
    }

    #[test]
    fn overrides_into_init() {
        let init: RequestInit = FetchOverrides::new().method(Method::Put).body("{}").into();
        assert_eq!(init, RequestInit::new().method(Method::Put).body("{}"));
    }
}
