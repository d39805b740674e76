//! Browser `fetch` transport.
use super::{Method, RequestInit, Transport};
use crate::{envelope::from_http, FetchError, ResponseEnvelope};
use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder};
use serde_json::Value as Json;

/// Transport which performs requests using the browser's `fetch` API.
///
/// Responses are normalized with [`from_http`]: the body must be a response envelope, non-2xx
/// responses are failures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchTransport;

impl FetchTransport {
    fn builder(url: &str, init: &RequestInit) -> RequestBuilder {
        let builder = match init.effective_method() {
            Method::Get => Request::get(url),
            Method::Post => Request::post(url),
            Method::Put => Request::put(url),
            Method::Patch => Request::patch(url),
            Method::Delete => Request::delete(url),
        };
        init.headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value))
    }
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn send(
        &self,
        url: &str,
        init: &RequestInit,
    ) -> Result<ResponseEnvelope<Json>, FetchError> {
        debug!("fetch {} {url}", init.effective_method());
        let builder = Self::builder(url, init);
        let request = match &init.body {
            Some(body) => builder.body(body.clone()),
            None => builder.build(),
        }
        .map_err(|error| FetchError::Request(error.to_string()))?;

        let response = request
            .send()
            .await
            .map_err(|error| FetchError::Network(error.to_string()))?;
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(error) => return Ok(ResponseEnvelope::failed(FetchError::Parse(error.to_string()))),
        };
        Ok(from_http(status, &body))
    }
}
