use clap::Parser;
use log::{error, info, warn};
use server::channel::Channel;
use server::config::{ChannelConfig, WorldConfig};
use server::gamedata::MapRegistry;
use server::network::ChannelServer;
use server::pending::PendingRegistry;
use server::status::{ServerStatus, StatusCell};
use server::storage::MemoryStore;
use server::world_link::{NullWorldLink, WorldConnection, WorldLink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "7575")]
    port: u16,

    /// Channel id announced to clients and the world server
    #[arg(short, long, default_value = "0")]
    channel: i8,

    /// World id this channel belongs to
    #[arg(short, long, default_value = "0")]
    world: i8,

    /// Scrolling header shown on connect, empty for none
    #[arg(short, long, default_value = "")]
    banner: String,

    /// World server address, pending connections are accepted leniently without one
    #[arg(long)]
    world_server: Option<String>,

    /// JSON file with map and portal definitions
    #[arg(long)]
    maps: Option<PathBuf>,

    /// JSON file seeding accounts and characters
    #[arg(long)]
    characters: Option<PathBuf>,

    /// Maximum number of concurrent connections
    #[arg(long, default_value = "100")]
    max_clients: usize,

    /// Seconds between automatic saves, 0 disables them
    #[arg(long, default_value = "300")]
    autosave_secs: u64,

    /// Minimum milliseconds between client-requested saves
    #[arg(long, default_value = "1000")]
    save_cooldown_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let maps = match &args.maps {
        Some(path) => MapRegistry::load(path)?,
        None => {
            warn!("No map file given, every map lookup will fail");
            MapRegistry::default()
        }
    };
    info!("Loaded {} maps", maps.len());

    let store = match &args.characters {
        Some(path) => MemoryStore::load(path)?,
        None => MemoryStore::new(),
    };

    let pending = Arc::new(PendingRegistry::new());

    let world_link: Arc<dyn WorldLink> = match &args.world_server {
        Some(addr) => Arc::new(WorldConnection::connect(addr, Arc::clone(&pending)).await?),
        None => {
            info!("No world server configured");
            Arc::new(NullWorldLink)
        }
    };

    let config = ChannelConfig {
        channel_id: args.channel,
        max_clients: args.max_clients,
        save_cooldown: Duration::from_millis(args.save_cooldown_ms),
        ..Default::default()
    }
    .with_autosave_secs(args.autosave_secs);

    let channel = Arc::new(Channel {
        config,
        pending,
        status: StatusCell::new(ServerStatus {
            channel_id: args.channel,
            world: WorldConfig {
                world_id: args.world,
                scrolling_header: args.banner,
            },
            world_link,
        }),
        store: Arc::new(store),
        game_data: Arc::new(maps),
    });

    let address = format!("{}:{}", args.host, args.port);
    let server = ChannelServer::bind(&address, channel).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Channel server stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
