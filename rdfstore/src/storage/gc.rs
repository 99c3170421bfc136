//! Background garbage collection for triple stores.
//!
//! The GC task runs asynchronously and processes tombstones in batches,
//! dropping versions that no registered snapshot can see.
//!
//! # Design
//!
//! The GC task uses a `Weak<TripleStore>` to avoid keeping the store alive:
//! - The `TripleStore` owns the `gc_notify` signal
//! - The task holds a weak reference to the store
//! - When the store is dropped, `Weak::upgrade()` returns `None` and the task exits
//!
//! # Usage
//!
//! The storage registry spawns one task per store it creates when a tokio
//! runtime is available. Removals signal the task once the tombstone queue
//! reaches the configured threshold, and releasing the oldest snapshot signals
//! it while tombstones are queued.

use std::sync::{Arc, Weak};

use tokio::sync::Notify;

use crate::config::StoreConfig;
use crate::storage::TripleStore;

/// Configuration for the garbage collector.
#[derive(Debug, Clone, Copy)]
pub struct GcConfig {
    /// Maximum number of tombstones to process per tick.
    pub batch_size: usize,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            batch_size: StoreConfig::DEFAULT_GC_BATCH_SIZE,
        }
    }
}

impl From<&StoreConfig> for GcConfig {
    fn from(config: &StoreConfig) -> Self {
        Self {
            batch_size: config.gc_batch_size,
        }
    }
}

/// Spawn a background GC task for a store.
///
/// The task waits for signals on `notify` and processes tombstones in batches.
/// It exits when the store is dropped or marked corrupt.
///
/// # Invariants
/// - Uses a `Weak` reference, so the task never keeps the store alive
/// - Processes at most `config.batch_size` tombstones per tick
pub fn spawn_gc_task(
    store: Weak<TripleStore>,
    notify: Arc<Notify>,
    config: GcConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        gc_loop(store, notify, config).await;
    })
}

async fn gc_loop(store: Weak<TripleStore>, notify: Arc<Notify>, config: GcConfig) {
    loop {
        notify.notified().await;

        let Some(store) = store.upgrade() else {
            tracing::debug!("triple store dropped, gc task exiting");
            break;
        };

        match store.gc_tick(config.batch_size) {
            Ok(report) => {
                // More collectable work left: go around again without waiting.
                if report.tombstones_remaining > 0 && report.tombstones_processed > 0 {
                    notify.notify_one();
                }
            }
            Err(e) => {
                tracing::error!("gc on '{}' failed: {e}", store.name());
                if store.is_corrupted() {
                    break;
                }
            }
        }
    }
}
