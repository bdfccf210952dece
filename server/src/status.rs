//! Process-wide channel status
//!
//! One [`ServerStatus`] exists per process. Connections reach it through
//! [`StatusCell::acquire`], which hands out a scoped guard: exactly one
//! holder at a time, released when the guard drops on any exit path.

use crate::config::WorldConfig;
use crate::world_link::WorldLink;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug)]
pub struct ServerStatus {
    pub channel_id: i8,
    pub world: WorldConfig,
    pub world_link: Arc<dyn WorldLink>,
}

#[derive(Debug)]
pub struct StatusCell {
    inner: Mutex<ServerStatus>,
}

pub type StatusGuard<'a> = MutexGuard<'a, ServerStatus>;

impl StatusCell {
    pub fn new(status: ServerStatus) -> Self {
        Self {
            inner: Mutex::new(status),
        }
    }

    /// Waits until no other task holds the status, then takes it
    pub async fn acquire(&self) -> StatusGuard<'_> {
        self.inner.lock().await
    }
}
