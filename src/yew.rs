//! Yew integration.
//!
//! Wrap the application in a [`ClientProvider`], then use [`use_fetch`] in components to get the
//! state of a request. Components re-render on every state transition of their binding.
use crate::{AsyncValue, Binding, BindingOptions, Client, RequestKey};
use futures::future::abortable;
use prokio::time::sleep;
use serde::de::DeserializeOwned;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ClientProviderProps {
    pub client: Client,
    pub children: Children,
}

/// Makes a [`Client`] available to [`use_fetch`] in all children.
#[function_component]
pub fn ClientProvider(props: &ClientProviderProps) -> Html {
    let context = props.client.clone();
    html! {
        <ContextProvider<Client> {context}>
        { for props.children.iter() }
        </ContextProvider<Client>>
    }
}

/// Track the state of an existing binding.
///
/// Subscribes to the binding while the component is mounted. On mount, the binding fetches (if
/// configured to) and starts refreshing at its fetch interval. On unmount, the refresh loop stops,
/// and any in-flight fetch is cancelled unless other subscribers share the binding.
#[hook]
pub fn use_binding<T>(binding: &Binding<T>) -> AsyncValue<T>
where
    T: Clone + DeserializeOwned + 'static,
{
    let state = use_state(|| binding.state());
    let setter = state.setter();
    use_effect_with_deps(
        move |binding: &Binding<T>| {
            debug!("use_binding({:?}) mounted", binding.key());
            let subscription = binding.subscribe(move |value| setter.set(value.clone()));
            let mounted = binding.clone();
            spawn_local(async move { mounted.mount().await });
            let (interval, interval_handle) = abortable(binding.run_interval(sleep));
            spawn_local(async move {
                let _ = interval.await;
            });
            let binding = binding.clone();
            move || {
                interval_handle.abort();
                binding.detach(subscription);
            }
        },
        binding.clone(),
    );
    (*state).clone()
}

/// Create a binding for a request using the [`Client`] from context, and track its state.
///
/// The binding is created on first render, later changes of `key` and `options` are ignored.
/// Returns the current state and the binding, which can be used to refetch or mutate the data.
#[hook]
pub fn use_fetch<T>(key: RequestKey, options: BindingOptions<T>) -> (AsyncValue<T>, Binding<T>)
where
    T: Clone + DeserializeOwned + 'static,
{
    let client = use_context::<Client>().expect("Client not present");
    let binding = use_state(move || client.bind(key, options));
    let value = use_binding(&binding);
    (value, (*binding).clone())
}
