//! TCP front end of the channel
//!
//! Every connection gets its own task, with two helpers: a reader task
//! that splits the byte stream into frames and a writer task that drains
//! the client's outbound queue. The connection task itself only reacts to
//! complete frames and a one-second housekeeping tick.
//!
//! Frames are a u16 little-endian length followed by that many bytes, the
//! first two of which are the message opcode. At most
//! [`INBOUND_QUEUE_LEN`] frames wait for the connection task; beyond that
//! the socket is no longer read.

use crate::channel::Channel;
use crate::client::Client;
use crate::client_manager::ClientManager;
use crate::error::HandlerError;
use crate::handler;
use crate::persistence::{self, Autosave};
use log::{debug, error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

/// Largest payload a frame can carry
pub const MAX_PACKET_LEN: usize = u16::MAX as usize;

/// Frames buffered between the socket reader and the connection task.
/// When full the reader stops pulling from the socket.
pub const INBOUND_QUEUE_LEN: usize = 32;

const TICK: Duration = Duration::from_secs(1);

pub struct ChannelServer {
    listener: TcpListener,
    channel: Arc<Channel>,
    clients: Arc<RwLock<ClientManager>>,
}

impl ChannelServer {
    pub async fn bind(addr: &str, channel: Arc<Channel>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(
            "Channel {} listening on {}",
            channel.config.channel_id,
            listener.local_addr()?
        );

        let max_clients = channel.config.max_clients;
        Ok(Self {
            listener,
            channel,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the listener fails
    pub async fn run(self) -> io::Result<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;

            let (client_id, connected) = {
                let mut clients = self.clients.write().await;
                (clients.add_client(addr), clients.len())
            };
            let Some(client_id) = client_id else {
                warn!("Refusing {}, channel is full with {} connections", addr, connected);
                continue;
            };

            if let Err(e) = stream.set_nodelay(true) {
                debug!("Could not disable Nagle for {}: {}", addr, e);
            }

            let channel = Arc::clone(&self.channel);
            let clients = Arc::clone(&self.clients);
            tokio::spawn(async move {
                handle_connection(stream, addr, client_id, &channel).await;
                let mut clients = clients.write().await;
                clients.remove_client(client_id);
            });
        }
    }
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, client_id: u32, channel: &Channel) {
    let (reader, writer) = stream.into_split();
    let (inbound_tx, mut inbound_rx) = mpsc::channel(INBOUND_QUEUE_LEN);
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    let reader_task = spawn_network_receiver(reader, addr, inbound_tx);
    let writer_task = spawn_network_sender(writer, addr, outbound_rx);

    let mut client = Client::new(client_id, addr, outbound_tx);
    let mut autosave = Autosave::from_config(&channel.config, Instant::now());

    let mut tick = interval(TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // the first tick fires immediately
    tick.tick().await;

    loop {
        tokio::select! {
            packet = inbound_rx.recv() => {
                let Some(packet) = packet else {
                    break;
                };
                if !serve(&mut client, channel, &packet).await {
                    break;
                }
            },

            _ = tick.tick() => {
                persistence::tick(&mut client, channel, &mut autosave, Instant::now()).await;
            },
        }
    }

    persistence::disconnect(&mut client, channel).await;
    reader_task.abort();

    // dropping the client closes the outbound queue, the writer flushes and exits
    drop(client);
    if let Err(e) = writer_task.await {
        error!("Writer task for {} failed: {}", addr, e);
    }
}

/// Runs one packet through the handlers. `false` closes the connection.
async fn serve(client: &mut Client, channel: &Channel, packet: &[u8]) -> bool {
    let admitted = client.connected();
    match handler::handle(client, channel, packet).await {
        Ok(true) => true,
        Ok(false) => {
            debug!("Unhandled message from {}: {:02X?}", client.addr, packet);
            true
        }
        Err(e @ HandlerError::Transport(_)) => {
            debug!("{}", e);
            false
        }
        Err(e) if !admitted => {
            warn!("Admission of {} failed: {}", client.addr, e);
            false
        }
        Err(e) => {
            error!("Error handling message from {}: {}", client.addr, e);
            true
        }
    }
}

fn spawn_network_receiver<R>(
    mut reader: R,
    addr: SocketAddr,
    inbound_tx: mpsc::Sender<Vec<u8>>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match read_packet(&mut reader).await {
                Ok(Some(packet)) => {
                    if inbound_tx.send(packet).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("{} closed the connection", addr);
                    break;
                }
                Err(e) => {
                    warn!("Error reading from {}: {}", addr, e);
                    break;
                }
            }
        }
    })
}

fn spawn_network_sender(
    mut writer: OwnedWriteHalf,
    addr: SocketAddr,
    mut outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(packet) = outbound_rx.recv().await {
            if let Err(e) = write_packet(&mut writer, &packet).await {
                error!("Failed to send packet to {}: {}", addr, e);
                break;
            }
        }
        let _ = writer.shutdown().await;
    })
}

/// Reads one frame. `Ok(None)` on a clean end of stream.
pub async fn read_packet<R>(reader: &mut R) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 2];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let mut packet = vec![0u8; u16::from_le_bytes(header) as usize];
    reader.read_exact(&mut packet).await?;
    Ok(Some(packet))
}

pub fn frame(packet: &[u8]) -> io::Result<Vec<u8>> {
    let len = u16::try_from(packet.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("packet of {} bytes does not fit a frame", packet.len()),
        )
    })?;

    let mut framed = Vec::with_capacity(2 + packet.len());
    framed.extend_from_slice(&len.to_le_bytes());
    framed.extend_from_slice(packet);
    Ok(framed)
}

pub async fn write_packet<W>(writer: &mut W, packet: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&frame(packet)?).await?;
    writer.flush().await
}
