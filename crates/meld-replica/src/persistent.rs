//! Scoped persistent CRDT handles
//!
//! `Persistent<C>` hydrates a component from storage when opened and
//! writes its snapshot back on `close`. Load failures propagate to the
//! caller at startup; save failures on the shutdown path are logged and
//! swallowed so they never mask the primary exit. Dropping a handle that
//! was never closed, or whose close was cancelled mid-save, schedules a
//! best-effort save on the async runtime rather than discarding the
//! last-known state.

use std::fmt;
use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use meld_core::ReplicaId;
use meld_store::{StoreResult, TypedStore};

use crate::hydrate::Hydrate;

/// A CRDT component bound to a typed store for its lifetime.
///
/// Dereferences to the wrapped component, so mutators and queries read
/// exactly as they do on a plain handle.
pub struct Persistent<C>
where
    C: Hydrate,
    C::State: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    replica: ReplicaId,
    component: C,
    store: TypedStore<C::State>,
    closed: bool,
}

impl<C> Persistent<C>
where
    C: Hydrate,
    C::State: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Open a component: load the persisted snapshot if one exists,
    /// otherwise start empty.
    ///
    /// Load and decode failures propagate; a missing record does not.
    pub async fn open(owner: ReplicaId, store: TypedStore<C::State>) -> StoreResult<Self> {
        let component = match store.load(&owner).await? {
            Some(state) => {
                debug!(replica = %owner, kind = C::KIND, "rehydrated component from storage");
                C::from_state(state)
            }
            None => {
                debug!(replica = %owner, kind = C::KIND, "no persisted state, starting empty");
                C::make(owner.clone())
            }
        };

        Ok(Self {
            replica: owner,
            component,
            store,
            closed: false,
        })
    }

    /// The replica this component writes as.
    pub fn replica(&self) -> &ReplicaId {
        &self.replica
    }

    /// Borrow the wrapped component.
    pub fn component(&self) -> &C {
        &self.component
    }

    /// Checkpoint the current snapshot without closing.
    pub async fn save(&self) -> StoreResult<()> {
        self.store.save(&self.replica, &self.component.query()).await
    }

    /// Decommission the replica: remove its persisted record and consume
    /// the handle without saving.
    pub async fn delete(mut self) -> StoreResult<()> {
        // Marked closed up front: a decommissioned replica must never be
        // resurrected by the drop-time save.
        self.closed = true;
        self.store.delete(&self.replica).await
    }

    /// Orderly shutdown: save the current snapshot and consume the
    /// handle. A save failure is logged and swallowed.
    ///
    /// `closed` flips only once the save future has resolved; if this
    /// future is cancelled while the save is in flight, `Drop` sees an
    /// unclosed handle and reschedules the save.
    pub async fn close(mut self) {
        if let Err(error) = self.store.save(&self.replica, &self.component.query()).await {
            warn!(
                replica = %self.replica,
                kind = C::KIND,
                %error,
                "failed to persist state during shutdown"
            );
        }
        self.closed = true;
    }

    /// Open, run `f` against the component, then close.
    ///
    /// The save finalizer runs even when the surrounding future is
    /// cancelled: dropping the handle mid-close hands the save off to
    /// the runtime.
    pub async fn scoped<R>(
        owner: ReplicaId,
        store: TypedStore<C::State>,
        f: impl FnOnce(&C) -> R,
    ) -> StoreResult<R> {
        let handle = Self::open(owner, store).await?;
        let result = f(&handle.component);
        handle.close().await;
        Ok(result)
    }
}

impl<C> fmt::Debug for Persistent<C>
where
    C: Hydrate + fmt::Debug,
    C::State: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persistent")
            .field("replica", &self.replica)
            .field("component", &self.component)
            .field("closed", &self.closed)
            .finish()
    }
}

impl<C> Deref for Persistent<C>
where
    C: Hydrate,
    C::State: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    type Target = C;

    fn deref(&self) -> &C {
        &self.component
    }
}

impl<C> Drop for Persistent<C>
where
    C: Hydrate,
    C::State: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        // Dropped without an orderly close (or the close was cancelled
        // mid-save): persist the last-known snapshot from a spawned task,
        // since Drop itself cannot await.
        let replica = self.replica.clone();
        let store = self.store.clone();
        let snapshot = self.component.query();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(
                    replica = %replica,
                    kind = C::KIND,
                    "persistent component dropped without close; scheduling save"
                );
                handle.spawn(async move {
                    if let Err(error) = store.save(&replica, &snapshot).await {
                        warn!(
                            replica = %replica,
                            kind = C::KIND,
                            %error,
                            "failed to persist state from drop"
                        );
                    }
                });
            }
            Err(_) => {
                warn!(
                    replica = %replica,
                    kind = C::KIND,
                    "persistent component dropped outside a runtime; latest state was not saved"
                );
            }
        }
    }
}
