use std::time::Duration;

/// World-wide settings relayed to every channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldConfig {
    pub world_id: i8,
    /// Scrolling header shown to players on connect, empty for none
    pub scrolling_header: String,
}

impl WorldConfig {
    pub fn scrolling_header(&self) -> Option<&str> {
        if self.scrolling_header.is_empty() {
            None
        } else {
            Some(&self.scrolling_header)
        }
    }
}

/// How long admission waits for the world tier's pending record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    pub poll_interval: Duration,
    pub ceiling: Duration,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            ceiling: Duration::from_secs(30),
        }
    }
}

/// Per-channel runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub channel_id: i8,
    pub max_clients: usize,
    pub admission: AdmissionPolicy,
    /// Interval between automatic saves, `None` disables them
    pub autosave: Option<Duration>,
    /// Minimum spacing between client-requested saves
    pub save_cooldown: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            channel_id: 0,
            max_clients: 100,
            admission: AdmissionPolicy::default(),
            autosave: Some(Duration::from_secs(300)),
            save_cooldown: Duration::from_secs(1),
        }
    }
}

impl ChannelConfig {
    pub fn with_autosave_secs(mut self, secs: u64) -> Self {
        self.autosave = if secs == 0 {
            None
        } else {
            Some(Duration::from_secs(secs))
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_header_is_none() {
        let mut world = WorldConfig::default();
        assert_eq!(world.scrolling_header(), None);
        world.scrolling_header = "Welcome".to_string();
        assert_eq!(world.scrolling_header(), Some("Welcome"));
    }

    #[test]
    fn test_zero_autosave_disables() {
        let config = ChannelConfig::default().with_autosave_secs(0);
        assert_eq!(config.autosave, None);
        let config = config.with_autosave_secs(60);
        assert_eq!(config.autosave, Some(Duration::from_secs(60)));
    }
}
