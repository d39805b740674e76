//! Request keys.
//!
//! Every binding is identified by a [`RequestKey`], which gets normalized into a canonical string
//! used as the key of the [`CacheStore`](crate::CacheStore). Keys are either opaque strings, which
//! are used verbatim, or descriptors made of a URL and a set of parameters.
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// Description of a request, used to derive its cache key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequestKey {
    /// Opaque key, used as-is.
    Opaque(String),
    /// URL with parameters that are encoded as query string.
    Descriptor {
        url: String,
        /// Parameters, sorted by name. A `None` parameter is encoded as an empty value.
        params: BTreeMap<String, Option<String>>,
    },
}

impl RequestKey {
    /// Create a descriptor key for the given URL, without any parameters.
    pub fn url(url: impl Into<String>) -> Self {
        RequestKey::Descriptor {
            url: url.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter to this key.
    ///
    /// Opaque keys are turned into descriptors, using the opaque key as URL.
    pub fn param(self, name: impl Into<String>, value: Option<String>) -> Self {
        let (url, mut params) = match self {
            RequestKey::Opaque(url) => (url, BTreeMap::new()),
            RequestKey::Descriptor { url, params } => (url, params),
        };
        params.insert(name.into(), value);
        RequestKey::Descriptor { url, params }
    }

    /// Build a descriptor from a JSON object.
    ///
    /// The `url` field is taken as the URL, every other field becomes a parameter. Strings are
    /// used verbatim, `null` is treated as an absent value and anything else is encoded using its
    /// compact JSON representation. Returns `None` if the value is not an object. A missing `url`
    /// is treated as empty.
    pub fn from_json(value: &Json) -> Option<Self> {
        let object = value.as_object()?;
        let url = object
            .get("url")
            .map(json_param)
            .unwrap_or_default()
            .unwrap_or_default();
        let params = object
            .iter()
            .filter(|(name, _)| name.as_str() != "url")
            .map(|(name, value)| (name.clone(), json_param(value)))
            .collect();
        Some(RequestKey::Descriptor { url, params })
    }

    /// Compute the canonical string representation of this key.
    ///
    /// Descriptors that have the same URL and the same parameters always produce the same
    /// string, regardless of the order the parameters were added in.
    pub fn normalize(&self) -> String {
        match self {
            RequestKey::Opaque(url) => url.clone(),
            RequestKey::Descriptor { url, params } if params.is_empty() => url.clone(),
            RequestKey::Descriptor { url, params } => {
                let pairs: Vec<(&str, &str)> = params
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_deref().unwrap_or("")))
                    .collect();
                // string pairs always serialize
                let query = serde_urlencoded::to_string(&pairs).unwrap_or_default();
                let separator = if url.contains('?') { '&' } else { '?' };
                format!("{url}{separator}{query}")
            }
        }
    }
}

fn json_param(value: &Json) -> Option<String> {
    match value {
        Json::Null => None,
        Json::String(string) => Some(string.clone()),
        other => Some(other.to_string()),
    }
}

impl From<&str> for RequestKey {
    fn from(key: &str) -> Self {
        RequestKey::Opaque(key.into())
    }
}

impl From<String> for RequestKey {
    fn from(key: String) -> Self {
        RequestKey::Opaque(key)
    }
}

/// Normalize anything that can be turned into a [`RequestKey`].
pub fn normalize(key: impl Into<RequestKey>) -> String {
    key.into().normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn opaque_key_is_verbatim() {
        assert_eq!(normalize("users/me?b=2&a=1"), "users/me?b=2&a=1");
        assert_eq!(normalize(String::from("")), "");
    }

    #[test]
    fn strings_are_opaque_keys() {
        assert_eq!(RequestKey::from("/a?x=1"), RequestKey::Opaque("/a?x=1".into()));
        assert_eq!(
            RequestKey::Opaque("/a".into()).param("x", Some("1".into())),
            RequestKey::url("/a").param("x", Some("1".into()))
        );
    }

    #[test]
    fn descriptor_without_params_is_url() {
        assert_eq!(RequestKey::url("/api/users").normalize(), "/api/users");
    }

    #[test]
    fn descriptor_param_order_irrelevant() {
        let first = RequestKey::url("/api/users")
            .param("page", Some("2".into()))
            .param("sort", Some("name".into()));
        let second = RequestKey::url("/api/users")
            .param("sort", Some("name".into()))
            .param("page", Some("2".into()));
        assert_eq!(first.normalize(), second.normalize());
        assert_eq!(first.normalize(), "/api/users?page=2&sort=name");
    }

    #[test]
    fn descriptor_encodes_values() {
        let key = RequestKey::url("/search")
            .param("q", Some("a b&c".into()))
            .param("empty", None);
        assert_eq!(key.normalize(), "/search?empty=&q=a+b%26c");
    }

    #[test]
    fn descriptor_appends_to_existing_query() {
        let key = RequestKey::url("/search?lang=en").param("q", Some("x".into()));
        assert_eq!(key.normalize(), "/search?lang=en&q=x");
    }

    #[test]
    fn json_descriptor_insertion_order_irrelevant() {
        let first = RequestKey::from_json(&json!({"url": "/items", "limit": 10, "tag": "new"}));
        let second = RequestKey::from_json(&json!({"tag": "new", "limit": 10, "url": "/items"}));
        assert_eq!(first, second);
        assert_eq!(first.unwrap().normalize(), "/items?limit=10&tag=new");
    }

    #[test]
    fn json_descriptor_absent_fields() {
        let key = RequestKey::from_json(&json!({"url": "/items", "cursor": null})).unwrap();
        assert_eq!(key.normalize(), "/items?cursor=");

        let key = RequestKey::from_json(&json!({"id": 3})).unwrap();
        assert_eq!(key.normalize(), "?id=3");
    }

    #[test]
    fn json_descriptor_requires_object() {
        assert_eq!(RequestKey::from_json(&json!("/items")), None);
    }
}
