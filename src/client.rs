use crate::{Binding, BindingOptions, CacheStore, ClientDefaults, RequestKey, Transport};
use serde::de::DeserializeOwned;
use std::{fmt, rc::Rc};

/// Factory for bindings.
///
/// The client owns the [`Transport`] used to perform requests, the [`CacheStore`] that is shared
/// by all of its bindings, and the [`ClientDefaults`]. Cloning it is cheap, clones share all of
/// these.
#[derive(Clone)]
pub struct Client {
    transport: Rc<dyn Transport>,
    cache: CacheStore,
    defaults: Rc<ClientDefaults>,
}

impl PartialEq for Client {
    fn eq(&self, other: &Self) -> bool {
        self.cache == other.cache
            && Rc::ptr_eq(&self.defaults, &other.defaults)
            && std::ptr::addr_eq(Rc::as_ptr(&self.transport), Rc::as_ptr(&other.transport))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("cache", &self.cache)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client using the given transport, with an empty cache and default options.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Rc::new(transport),
            cache: CacheStore::new(),
            defaults: Default::default(),
        }
    }

    /// Use these defaults for all bindings created from now on.
    pub fn with_defaults(mut self, defaults: ClientDefaults) -> Self {
        self.defaults = Rc::new(defaults);
        self
    }

    /// Use this cache store, which may be shared with other clients.
    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn defaults(&self) -> &ClientDefaults {
        &self.defaults
    }

    pub fn transport(&self) -> &dyn Transport {
        &*self.transport
    }

    /// Create a binding for the given request.
    pub fn bind<T>(&self, key: impl Into<RequestKey>, options: BindingOptions<T>) -> Binding<T>
    where
        T: Clone + DeserializeOwned + 'static,
    {
        Binding::new(self.clone(), key.into(), options)
    }

    /// Invalidate the cached value of a request, so that the next fetch goes to the network.
    pub fn invalidate(&self, key: impl Into<RequestKey>) -> bool {
        self.cache.delete(&key.into().normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FetchError, RequestInit, ResponseEnvelope};
    use async_trait::async_trait;
    use serde_json::Value as Json;

    struct Offline;

    #[async_trait(?Send)]
    impl Transport for Offline {
        async fn send(
            &self,
            _: &str,
            _: &RequestInit,
        ) -> Result<ResponseEnvelope<Json>, FetchError> {
            Err(FetchError::Network("offline".into()))
        }
    }

    #[test]
    fn clones_are_equal() {
        let client = Client::new(Offline);
        assert_eq!(client, client.clone());
        assert_ne!(client, Client::new(Offline));
    }

    #[test]
    fn shared_cache() {
        let cache = CacheStore::new();
        let first = Client::new(Offline).with_cache(cache.clone());
        let second = Client::new(Offline).with_cache(cache.clone());
        first.cache().set("/a", Some(1u32));
        assert_eq!(second.cache().get::<u32>("/a"), Some(Some(1)));
    }

    #[test]
    fn invalidate_normalizes_key() {
        let client = Client::new(Offline);
        let key = RequestKey::url("/items").param("page", Some("1".into()));
        client.cache().set("/items?page=1", Some(1u32));
        assert!(client.invalidate(key));
        assert!(client.cache().is_empty());
    }
}
