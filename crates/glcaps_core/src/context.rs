//! Rendering context descriptions
//!
//! What the negotiator asks the driver for, and what ends up recorded
//! about the context that was actually accepted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Graphics API requested from the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Api {
    /// Desktop OpenGL
    Gl,
    /// OpenGL ES
    GlEs,
    /// Vulkan (cross-platform)
    Vulkan,
    /// Metal (macOS, iOS)
    Metal,
    /// DirectX 12 (Windows)
    Dx12,
}

impl Api {
    pub fn label(&self) -> &'static str {
        match self {
            Api::Gl => "GL",
            Api::GlEs => "GLES",
            Api::Vulkan => "Vulkan",
            Api::Metal => "Metal",
            Api::Dx12 => "DX12",
        }
    }

    /// Whether this API is one of the GL family
    pub fn is_gl(&self) -> bool {
        matches!(self, Api::Gl | Api::GlEs)
    }
}

/// Context profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Core,
    Compatibility,
    ForwardCompatible,
}

impl Profile {
    pub fn label(&self) -> &'static str {
        match self {
            Profile::Core => "core",
            Profile::Compatibility => "compatibility",
            Profile::ForwardCompatible => "forward-compatible",
        }
    }
}

/// Platform-specific context flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformFlags {
    pub debug: bool,
    pub robust: bool,
    pub low_power: bool,
}

/// `major.minor` API version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Extract the first `major.minor` token from a driver version string.
    ///
    /// Handles the usual shapes: `4.6.0 NVIDIA 535.54`, `OpenGL ES 3.2 Mesa 23.1`,
    /// `3.3 (Core Profile) Mesa 22.0`.
    pub fn parse_loose(text: &str) -> Option<Self> {
        text.split_whitespace().find_map(|token| {
            let mut parts = token.split('.');
            let major = parts.next()?.parse().ok()?;
            let minor = parts
                .next()?
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
                .parse()
                .ok()?;
            Some(Self { major, minor })
        })
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| format!("expected major.minor, got {s:?}"))?;
        let major = major.parse().map_err(|_| format!("bad major version in {s:?}"))?;
        let minor = minor.parse().map_err(|_| format!("bad minor version in {s:?}"))?;
        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for ApiVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ApiVersion> for String {
    fn from(version: ApiVersion) -> Self {
        version.to_string()
    }
}

/// One candidate context request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextConfiguration {
    pub api: Api,
    pub version: ApiVersion,
    pub profile: Profile,
    #[serde(default)]
    pub flags: PlatformFlags,
}

impl ContextConfiguration {
    pub const fn new(api: Api, major: u32, minor: u32, profile: Profile) -> Self {
        Self {
            api,
            version: ApiVersion::new(major, minor),
            profile,
            flags: PlatformFlags {
                debug: false,
                robust: false,
                low_power: false,
            },
        }
    }

    pub const fn with_flags(mut self, flags: PlatformFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Short human label, e.g. `GL 4.6 forward-compatible`
    pub fn label(&self) -> String {
        if self.api.is_gl() {
            format!("{} {} {}", self.api.label(), self.version, self.profile.label())
        } else {
            self.api.label().to_string()
        }
    }
}

/// What was recorded about the accepted context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMetadata {
    pub configuration: ContextConfiguration,
    /// Version string exactly as the driver reported it
    pub version_string: String,
    pub version: Option<ApiVersion>,
    /// The preferred configuration failed and a fallback was accepted
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_loose_driver_strings() {
        assert_eq!(
            ApiVersion::parse_loose("4.6.0 NVIDIA 535.54.03"),
            Some(ApiVersion::new(4, 6))
        );
        assert_eq!(
            ApiVersion::parse_loose("OpenGL ES 3.2 Mesa 23.1.4"),
            Some(ApiVersion::new(3, 2))
        );
        assert_eq!(
            ApiVersion::parse_loose("3.3 (Core Profile) Mesa 22.0"),
            Some(ApiVersion::new(3, 3))
        );
        assert_eq!(ApiVersion::parse_loose("unknown"), None);
    }

    #[test]
    fn test_version_ordering() {
        assert!(ApiVersion::new(4, 6) > ApiVersion::new(4, 5));
        assert!(ApiVersion::new(3, 10) > ApiVersion::new(3, 2));
        assert!(ApiVersion::new(2, 1) < ApiVersion::new(3, 0));
    }

    #[test]
    fn test_version_serializes_as_string() {
        let json = serde_json::to_string(&ApiVersion::new(3, 2)).unwrap();
        assert_eq!(json, "\"3.2\"");
        let back: ApiVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ApiVersion::new(3, 2));
        assert!(serde_json::from_str::<ApiVersion>("\"three\"").is_err());
    }

    #[test]
    fn test_configuration_label() {
        let config = ContextConfiguration::new(Api::Gl, 4, 6, Profile::ForwardCompatible);
        assert_eq!(config.label(), "GL 4.6 forward-compatible");
        let native = ContextConfiguration::new(Api::Vulkan, 1, 0, Profile::Core);
        assert_eq!(native.label(), "Vulkan");
    }
}
