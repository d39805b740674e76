//! # Async Value Cache
//!
//! This crate tracks the lifecycle of remote requests for WebAssembly applications. Every
//! request is represented as an [`AsyncValue`], which is either pending, failed or resolved with
//! an optional value. Resolved values are kept in a [`CacheStore`] keyed by a normalized request
//! key, so that other consumers of the same request can reuse them.
//!
//! A [`Client`] owns the transport, the cache and the default options. Each consumption site
//! creates a [`Binding`] from it, which drives fetches, retries, cancellation of superseded
//! requests and manual mutations, and lets subscribers observe state transitions.
//!
//! It is intended to be used with the Yew framework, but the core has no dependency on it.

#[cfg(feature = "log")]
macro_rules! debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "log")]
macro_rules! warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! warn {
    ($($arg:tt)*) => {{}};
}

mod binding;
mod client;
mod envelope;
mod error;
mod key;
mod observer;
mod options;
mod store;
pub mod transport;
mod value;
#[cfg(feature = "yew")]
pub mod yew;

pub use crate::{
    binding::*, client::*, envelope::*, error::*, key::*, observer::*, options::*, store::*,
    transport::{Method, RequestInit, Transport},
    value::*,
};
