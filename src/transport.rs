//! Transport boundary.
//!
//! The [`Transport`] is what actually performs a request. It receives the URL and the merged
//! [`RequestInit`], and produces a [`ResponseEnvelope`]. Transports report exceptions (the request
//! never got a response) as [`FetchError::Network`], which are retried by the binding.
use crate::{FetchError, ResponseEnvelope};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::{collections::BTreeMap, fmt};

#[cfg(feature = "gloo")]
pub mod http;

/// HTTP request method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options of a request.
///
/// Unset fields fall back to less specific options when merged, see [`RequestInit::merge`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestInit {
    pub method: Option<Method>,
    pub body: Option<String>,
    pub headers: BTreeMap<String, String>,
}

impl RequestInit {
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

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Merge more specific options on top of these.
    ///
    /// Method and body of `specific` win if set. Headers are merged, with the headers of
    /// `specific` winning on conflicts.
    pub fn merge(&self, specific: &RequestInit) -> RequestInit {
        let mut headers = self.headers.clone();
        headers.extend(
            specific
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        RequestInit {
            method: specific.method.or(self.method),
            body: specific.body.clone().or_else(|| self.body.clone()),
            headers,
        }
    }

    /// Effective method of this request.
    pub fn effective_method(&self) -> Method {
        self.method.unwrap_or_default()
    }
}

/// Something which can perform requests.
///
/// Returning an error means the request did not produce a response at all. Failures the server
/// reported should be returned as a failed [`ResponseEnvelope`] instead.
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, url: &str, init: &RequestInit)
        -> Result<ResponseEnvelope<Json>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_specific() {
        let defaults = RequestInit::new()
            .method(Method::Get)
            .body("default")
            .header("Accept", "application/json")
            .header("X-Client", "app");
        let specific = RequestInit::new()
            .method(Method::Post)
            .header("X-Client", "widget");
        let merged = defaults.merge(&specific);

        assert_eq!(merged.method, Some(Method::Post));
        assert_eq!(merged.body.as_deref(), Some("default"));
        assert_eq!(merged.headers["Accept"], "application/json");
        assert_eq!(merged.headers["X-Client"], "widget");
    }

    #[test]
    fn merge_empty_keeps_base() {
        let base = RequestInit::new().method(Method::Delete).header("A", "1");
        assert_eq!(base.merge(&RequestInit::new()), base);
        assert_eq!(RequestInit::new().effective_method(), Method::Get);
    }

    #[test]
    fn method_wire_format() {
        let init: RequestInit =
            serde_json::from_str(r#"{"method":"PATCH","headers":{"A":"1"}}"#).unwrap();
        assert_eq!(init.method, Some(Method::Patch));
        assert_eq!(init.body, None);
        assert_eq!(Method::Patch.to_string(), "PATCH");
    }
}
