use crate::config::ChannelConfig;
use crate::gamedata::GameData;
use crate::pending::PendingRegistry;
use crate::status::StatusCell;
use crate::storage::CharacterStore;
use std::sync::Arc;

/// Everything the handlers share across connections
pub struct Channel {
    pub config: ChannelConfig,
    pub pending: Arc<PendingRegistry>,
    pub status: StatusCell,
    pub store: Arc<dyn CharacterStore>,
    pub game_data: Arc<dyn GameData>,
}
