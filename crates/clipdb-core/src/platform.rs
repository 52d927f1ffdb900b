use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A social platform whose creators can be scraped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(alias = "tik_tok")]
    TikTok,
    Instagram,
    #[serde(alias = "you_tube")]
    YouTube,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::TikTok, Platform::Instagram, Platform::YouTube];

    /// Storage and wire representation, e.g. `"tiktok"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::TikTok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::YouTube => "youtube",
        }
    }

    /// Web origin used to absolutize platform-relative URLs.
    #[must_use]
    pub fn origin(self) -> &'static str {
        match self {
            Platform::TikTok => "https://www.tiktok.com",
            Platform::Instagram => "https://www.instagram.com",
            Platform::YouTube => "https://www.youtube.com",
        }
    }

    /// Whether handles on this platform compare case-insensitively.
    ///
    /// YouTube channel ids (`UC...`) are case-sensitive, so handles are passed
    /// upstream exactly as given.
    #[must_use]
    pub fn is_case_insensitive(self) -> bool {
        !matches!(self, Platform::YouTube)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiktok" | "tik_tok" | "tt" => Ok(Platform::TikTok),
            "instagram" | "ig" | "insta" => Ok(Platform::Instagram),
            "youtube" | "you_tube" | "yt" => Ok(Platform::YouTube),
            _ => Err(CoreError::UnknownPlatform(s.to_string())),
        }
    }
}
