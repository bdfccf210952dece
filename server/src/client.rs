use crate::error::HandlerError;
use crate::session::{ActiveSession, SessionState};
use crate::storage::{CharacterStore, StorageResult};
use shared::PacketWriter;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// One client connection as seen by the handlers
///
/// Owned by the connection's task; nothing else touches it. Outbound
/// messages go through `sender` to the task that writes the socket.
#[derive(Debug)]
pub struct Client {
    pub id: u32,
    pub addr: SocketAddr,
    /// GM chat preference, only honoured for GM accounts
    pub gm_chat: bool,
    state: SessionState,
    last_save: Option<Instant>,
    sender: mpsc::UnboundedSender<Vec<u8>>,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr, sender: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Client {
            id,
            addr,
            gm_chat: true,
            state: SessionState::Unauthenticated,
            last_save: None,
            sender,
        }
    }

    pub fn connected(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        match &self.state {
            SessionState::Active(session) => Some(&**session),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut ActiveSession> {
        match &mut self.state {
            SessionState::Active(session) => Some(&mut **session),
            SessionState::Unauthenticated => None,
        }
    }

    /// Promotes the connection to an authenticated session.
    /// Only called by admission, after the character is marked online.
    pub(crate) fn activate(&mut self, session: ActiveSession) {
        self.state = SessionState::Active(Box::new(session));
    }

    pub fn send(&self, packet: PacketWriter) -> Result<(), HandlerError> {
        self.sender
            .send(packet.into_vec())
            .map_err(|_| HandlerError::Transport(format!("connection to {} is closed", self.addr)))
    }

    /// Whether a client-requested save is allowed right now
    pub fn save_allowed(&self, cooldown: Duration) -> bool {
        self.last_save
            .map_or(true, |last| last.elapsed() >= cooldown)
    }

    /// Flushes the session to storage. Unauthenticated clients have nothing to save.
    pub async fn save(&mut self, store: &dyn CharacterStore) -> StorageResult<()> {
        if let Some(session) = self.session() {
            store.save_character(&session.snapshot()).await?;
            self.last_save = Some(Instant::now());
        }
        Ok(())
    }
}
