//! Lifecycle notifications.
//!
//! Callbacks run synchronously on whichever thread raised the event: a worker, the main
//! context or the caller.

use crate::asset::Asset;
use crate::error::AssetError;
use crate::handle::AssetHandle;
use keel_concurrent::prelude::{EventReceiver, EventSender, event_send};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberHandle(u64);

#[allow(unused_variables)]
pub trait AssetEventCallback: Send + Sync {
    fn on_asset_created(&self, asset: &Asset) {}

    fn on_asset_loaded(&self, asset: &Asset) {}

    fn on_asset_saved(&self, asset: &Asset) {}

    fn on_asset_reloaded(&self, asset: &Asset) {}

    fn on_asset_unloaded(&self, asset: &Asset) {}

    /// The asset may never have been loaded, so only its handle is available
    fn on_asset_removed(&self, handle: AssetHandle) {}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AssetEvent {
    Created(AssetHandle),
    Loaded(AssetHandle),
    Saved(AssetHandle),
    Reloaded(AssetHandle),
    Unloaded(AssetHandle),
    Removed(AssetHandle),
}

impl AssetEvent {
    pub fn handle(&self) -> AssetHandle {
        match self {
            AssetEvent::Created(handle)
            | AssetEvent::Loaded(handle)
            | AssetEvent::Saved(handle)
            | AssetEvent::Reloaded(handle)
            | AssetEvent::Unloaded(handle)
            | AssetEvent::Removed(handle) => *handle,
        }
    }

    /// A subscriber forwarding every event into a channel, for observers that poll
    pub fn channel() -> (ChannelSubscriber, EventReceiver<AssetEvent>) {
        let (send, recv) = event_send();
        (ChannelSubscriber { send }, recv)
    }
}

#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    send: EventSender<AssetEvent>,
}

impl ChannelSubscriber {
    fn forward(&self, event: AssetEvent) {
        // receiver gone means nobody is listening anymore
        let _ = self.send.send(event);
    }
}

impl AssetEventCallback for ChannelSubscriber {
    fn on_asset_created(&self, asset: &Asset) {
        self.forward(AssetEvent::Created(asset.handle()));
    }

    fn on_asset_loaded(&self, asset: &Asset) {
        self.forward(AssetEvent::Loaded(asset.handle()));
    }

    fn on_asset_saved(&self, asset: &Asset) {
        self.forward(AssetEvent::Saved(asset.handle()));
    }

    fn on_asset_reloaded(&self, asset: &Asset) {
        self.forward(AssetEvent::Reloaded(asset.handle()));
    }

    fn on_asset_unloaded(&self, asset: &Asset) {
        self.forward(AssetEvent::Unloaded(asset.handle()));
    }

    fn on_asset_removed(&self, handle: AssetHandle) {
        self.forward(AssetEvent::Removed(handle));
    }
}

type Subscribers = Vec<(SubscriberHandle, Arc<dyn AssetEventCallback>)>;

#[derive(Default)]
pub struct SubscriberBus {
    next: AtomicU64,
    subscribers: Mutex<Subscribers>,
}

impl std::fmt::Debug for SubscriberBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberBus")
            .field("subscribers", &self.len())
            .finish()
    }
}

impl SubscriberBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self, callback: Arc<dyn AssetEventCallback>) -> SubscriberHandle {
        let handle = SubscriberHandle(self.next.fetch_add(1, Ordering::Relaxed) + 1);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((handle, callback));
        handle
    }

    pub fn unsubscribe(&self, handle: SubscriberHandle) -> Result<(), AssetError> {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let position = subscribers
            .iter()
            .position(|(subscriber, _)| *subscriber == handle)
            .ok_or(AssetError::InvalidSubscriber(handle))?;
        subscribers.remove(position);
        Ok(())
    }

    /// Invoke `f` for every subscriber in registration order.
    ///
    /// The list is snapshotted first so callbacks may subscribe or unsubscribe.
    pub fn emit(&self, f: impl Fn(&dyn AssetEventCallback)) {
        let subscribers: Vec<Arc<dyn AssetEventCallback>> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in subscribers {
            f(callback.as_ref());
        }
    }
}
