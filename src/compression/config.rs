use serde::{Deserialize, Serialize};

/// Response compression configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Negotiate gzip with clients that accept it
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// gzip level (0-9)
    #[serde(default = "default_level")]
    pub level: u32,
    /// Bodies below this size are sent as-is
    #[serde(default = "default_min_size_bytes")]
    pub min_size_bytes: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_level() -> u32 {
    6
}

fn default_min_size_bytes() -> usize {
    1400
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            level: default_level(),
            min_size_bytes: default_min_size_bytes(),
        }
    }
}

impl CompressionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.level > 9 {
            return Err(format!(
                "compression.level must be between 0 and 9, got {}",
                self.level
            ));
        }
        Ok(())
    }
}
