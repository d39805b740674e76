//! Request coordination.
//!
//! A [`Binding`] is one consumption site of a request. It owns the state of that request, issues
//! fetches through the client's transport, retries them on network errors, and makes sure that
//! only the most recently issued fetch can change the state.
use crate::{
    AsyncValue, BindingOptions, Client, ErrorInfo, FetchError, FetchOverrides, Observer,
    RequestInit, RequestKey, ResponseEnvelope, Subscription,
};
use futures::future::{abortable, AbortHandle};
use serde::de::DeserializeOwned;
use serde_json::Value as Json;
use std::{
    cell::{Cell, RefCell},
    collections::hash_map::DefaultHasher,
    fmt,
    future::Future,
    hash::{Hash, Hasher},
    rc::Rc,
    time::Duration,
};

struct Inner<T> {
    /// Normalized request key, also used as request URL.
    key: String,
    client: Client,
    options: BindingOptions<T>,
    /// Binding options merged on top of the client defaults.
    init: RequestInit,
    cache: bool,
    retry_count: u32,
    fetch_on_mount: bool,
    observer: Observer<T>,
    /// Incremented for every issued fetch. A fetch may only complete if it is still current.
    generation: Cell<u64>,
    /// Handle to abort the in-flight fetch, if any.
    abort: RefCell<Option<AbortHandle>>,
    /// Hash of the last watched dependencies.
    watched: Cell<Option<u64>>,
}

/// Handle to the state of a single request.
///
/// Cloning a binding is cheap, clones refer to the same state.
pub struct Binding<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for Binding<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.inner.key)
            .field("observer", &self.inner.observer)
            .field("generation", &self.inner.generation.get())
            .finish_non_exhaustive()
    }
}

impl<T> Binding<T>
where
    T: Clone + DeserializeOwned + 'static,
{
    pub(crate) fn new(client: Client, key: RequestKey, options: BindingOptions<T>) -> Self {
        let key = key.normalize();
        let defaults = client.defaults();
        let cache = options.cache.unwrap_or(defaults.cache);
        let retry_count = options.retry_count.unwrap_or(defaults.retry_count);
        let fetch_on_mount = options.fetch_on_mount.unwrap_or(defaults.fetch_on_mount);
        let init = defaults.init.merge(&options.init);

        // initial data, then cache, then nothing fetched yet
        let state = match &options.initial_data {
            Some(envelope) => AsyncValue::from(envelope.clone()),
            None => cache
                .then(|| client.cache().get::<T>(&key))
                .flatten()
                .map(AsyncValue::Resolved)
                .unwrap_or_default(),
        };
        debug!("binding {key:?} created, cache: {cache}, retries: {retry_count}");

        Self {
            inner: Rc::new(Inner {
                key,
                client,
                options,
                init,
                cache,
                retry_count,
                fetch_on_mount,
                observer: Observer::new(state),
                generation: Cell::new(0),
                abort: RefCell::new(None),
                watched: Cell::new(None),
            }),
        }
    }

    /// Normalized key of this binding.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    /// Current state.
    pub fn state(&self) -> AsyncValue<T> {
        self.inner.observer.get()
    }

    /// Observer of this binding's state.
    pub fn observer(&self) -> &Observer<T> {
        &self.inner.observer
    }

    /// Subscribe to state transitions, see [`Observer::subscribe`].
    pub fn subscribe(&self, listener: impl Fn(&AsyncValue<T>) + 'static) -> Subscription {
        self.inner.observer.subscribe(listener)
    }

    pub fn fetch_on_mount(&self) -> bool {
        self.inner.fetch_on_mount
    }

    pub fn fetch_interval(&self) -> Option<Duration> {
        self.inner.options.fetch_interval
    }

    /// Determine if a fetch is currently in flight.
    pub fn is_fetching(&self) -> bool {
        self.inner.abort.borrow().is_some()
    }

    /// Abort the in-flight fetch, if any, and start a new generation.
    fn supersede(&self) -> u64 {
        if let Some(handle) = self.inner.abort.borrow_mut().take() {
            debug!("binding {:?} aborting in-flight fetch", self.inner.key);
            handle.abort();
        }
        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.generation.get() == generation
    }

    /// Cancel the in-flight fetch, if any.
    ///
    /// Its result is discarded when it completes. The state is left as it is, which means it
    /// stays pending until the next fetch. Returns whether a fetch was in flight.
    pub fn cancel(&self) -> bool {
        let fetching = self.is_fetching();
        self.supersede();
        fetching
    }

    /// Drop the subscription of a consumer that goes away.
    ///
    /// The in-flight fetch is only cancelled if no other subscriber is left, consumers sharing
    /// this binding keep receiving its result. Returns whether a fetch was cancelled.
    pub fn detach(&self, subscription: Subscription) -> bool {
        subscription.unsubscribe();
        self.inner.observer.subscribers() == 0 && self.cancel()
    }

    /// Fetch the request.
    ///
    /// If caching is enabled and the cache holds a value for this key, that value is adopted and
    /// no request is made. Otherwise the state turns pending and the request is sent, retrying on
    /// network errors as configured. Any fetch still in flight is superseded: its result will be
    /// discarded.
    pub async fn fetch(&self, overrides: FetchOverrides) {
        let generation = self.supersede();
        let key = &self.inner.key;

        if self.inner.cache {
            if let Some(cached) = self.inner.client.cache().get::<T>(key) {
                debug!("binding {key:?} served from cache");
                self.inner.observer.set(AsyncValue::Resolved(cached));
                return;
            }
        }

        self.inner.observer.set(AsyncValue::Pending);
        let init = self.inner.init.merge(&overrides.into());
        let (request, handle) = abortable(self.send(init, generation));
        *self.inner.abort.borrow_mut() = Some(handle);

        let result = match request.await {
            Ok(result) if self.is_current(generation) => result,
            _ => {
                debug!("binding {key:?} discarding superseded fetch {generation}");
                return;
            }
        };
        self.inner.abort.borrow_mut().take();
        self.complete(result);
    }

    /// Fetch with the binding's own options, see [`Binding::fetch`].
    ///
    /// Note that this does not make any request if the value is cached, use [`Binding::refresh`]
    /// to bypass the cache.
    pub async fn refetch(&self) {
        self.fetch(FetchOverrides::default()).await
    }

    /// Invalidate the cached value and fetch again.
    pub async fn refresh(&self) {
        self.invalidate();
        self.refetch().await
    }

    /// Delete the cached value of this binding's key.
    pub fn invalidate(&self) -> bool {
        self.inner.client.cache().delete(&self.inner.key)
    }

    /// Fetch if this binding is configured to fetch on mount.
    pub async fn mount(&self) {
        if self.inner.fetch_on_mount {
            self.refetch().await
        }
    }

    /// Fetch when the watched dependencies change.
    ///
    /// The first call only records the dependencies. Every later call fetches if they differ from
    /// the previously recorded ones. Returns whether a fetch was triggered.
    pub async fn watch<D: Hash + ?Sized>(&self, deps: &D) -> bool {
        let mut hasher = DefaultHasher::new();
        deps.hash(&mut hasher);
        let hash = hasher.finish();
        let previous = self.inner.watched.replace(Some(hash));
        match previous {
            Some(previous) if previous != hash => {
                debug!("binding {:?} watched dependencies changed", self.inner.key);
                self.refetch().await;
                true
            }
            _ => false,
        }
    }

    /// Refresh this binding periodically.
    ///
    /// If a fetch interval is configured, the returned future loops forever: it waits using the
    /// provided `sleep` function, then refreshes the binding. It stops once all handles to this
    /// binding have been dropped. Without a fetch interval, it returns immediately. Consumers that
    /// go away before the binding does should wrap it in [`abortable`] and abort it.
    pub fn run_interval<S, F>(&self, sleep: S) -> impl Future<Output = ()> + 'static
    where
        S: Fn(Duration) -> F + 'static,
        F: Future<Output = ()> + 'static,
    {
        let weak = Rc::downgrade(&self.inner);
        let interval = self.inner.options.fetch_interval;
        async move {
            let Some(interval) = interval else {
                return;
            };
            loop {
                sleep(interval).await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                Binding { inner }.refresh().await;
            }
        }
    }

    /// Replace the resolved data.
    ///
    /// The updater receives the current data and returns the new data. This only has an effect
    /// if the binding is resolved, otherwise it is not called and `false` is returned. The new
    /// data is written to the cache if caching is enabled. No request is made.
    pub fn set_data(&self, updater: impl FnOnce(Option<&T>) -> T) -> bool {
        let AsyncValue::Resolved(previous) = self.state() else {
            return false;
        };
        let data = updater(previous.as_ref());
        if self.inner.cache {
            self.inner
                .client
                .cache()
                .set(&self.inner.key, Some(data.clone()));
        }
        self.inner.observer.set(AsyncValue::Resolved(Some(data)));
        true
    }

    /// Send the request, retrying network errors while the retry budget lasts.
    async fn send(
        &self,
        init: RequestInit,
        generation: u64,
    ) -> Result<ResponseEnvelope<Json>, FetchError> {
        let transport = self.inner.client.transport();
        let mut remaining = self.inner.retry_count;
        loop {
            match transport.send(&self.inner.key, &init).await {
                Err(error)
                    if error.is_retryable() && remaining > 0 && self.is_current(generation) =>
                {
                    remaining -= 1;
                    debug!(
                        "binding {:?} retrying after {error}, {remaining} retries left",
                        self.inner.key
                    );
                }
                result => return result,
            }
        }
    }

    /// Apply the result of a current fetch.
    fn complete(&self, result: Result<ResponseEnvelope<Json>, FetchError>) {
        let envelope = result.unwrap_or_else(ResponseEnvelope::failed);
        match envelope.decode::<T>() {
            ResponseEnvelope::Success { data } => {
                let data = match &self.inner.options.on_data {
                    Some(transform) => transform(data),
                    None => data,
                };
                if self.inner.cache {
                    self.inner
                        .client
                        .cache()
                        .set(&self.inner.key, Some(data.clone()));
                }
                debug!("binding {:?} resolved", self.inner.key);
                self.inner
                    .observer
                    .set(AsyncValue::Resolved(Some(data.clone())));
                if let Some(on_success) = &self.inner.options.on_success {
                    on_success(&data);
                }
            }
            ResponseEnvelope::Failed { error } => {
                warn!("binding {:?} failed: {error}", self.inner.key);
                self.inner.observer.set(AsyncValue::Failed(error.clone()));
                self.report(&error);
            }
        }
    }

    fn report(&self, error: &ErrorInfo) {
        if let Some(on_error) = &self.inner.options.on_error {
            on_error(error);
        }
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.abort.get_mut().take() {
            handle.abort();
        }
    }
}
