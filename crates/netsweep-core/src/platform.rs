//! Operating system family used to pick external tool flags

use serde::{Deserialize, Serialize};

/// Platform family, decided once at startup and passed to resolvers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    /// Platform the binary was compiled for
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    /// `ping` flag for "send N packets"
    pub fn ping_count_flag(&self) -> &'static str {
        match self {
            Self::Windows => "-n",
            Self::Unix => "-c",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_count_flag() {
        assert_eq!(Platform::Windows.ping_count_flag(), "-n");
        assert_eq!(Platform::Unix.ping_count_flag(), "-c");
    }

    #[test]
    fn test_platform_deserializes_lowercase() {
        let platform: Platform = serde_json::from_str("\"windows\"").unwrap();
        assert_eq!(platform, Platform::Windows);
    }
}
