//! Connection bookkeeping for the channel
//!
//! Tracks which peers are connected, hands out connection ids and enforces
//! the channel's capacity. The per-connection [`Client`](crate::client::Client)
//! lives in its own task; this registry only knows ids and addresses.

use log::{debug, info};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    pub id: u32,
    pub addr: SocketAddr,
    pub connected_at: Instant,
}

pub struct ClientManager {
    clients: HashMap<u32, ConnectionEntry>,
    next_client_id: u32,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Registers a new connection, `None` if the channel is full
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(
            client_id,
            ConnectionEntry {
                id: client_id,
                addr,
                connected_at: Instant::now(),
            },
        );

        Some(client_id)
    }

    pub fn remove_client(&mut self, client_id: u32) -> bool {
        if let Some(entry) = self.clients.remove(&client_id) {
            info!(
                "Client {} ({}) disconnected after {:?}",
                entry.id,
                entry.addr,
                entry.connected_at.elapsed()
            );
            if self.is_empty() {
                debug!("No connections left");
            }
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
