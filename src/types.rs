//! Core types shared by the driver seam, the session controller and consumers.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    MacOS,
    Linux,
    Unknown,
}

impl Platform {
    /// Detect the platform this binary was built for
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOS
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::MacOS => "macos",
            Platform::Linux => "linux",
            Platform::Unknown => "unknown",
        }
    }
}

/// Hardware capability tag of a capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Virtual device fusing an ultra-wide and a wide-angle camera
    BuiltInDualWideCamera,
    /// Virtual device fusing a wide-angle and a telephoto camera
    BuiltInDualCamera,
    /// Plain wide-angle camera, present on nearly every device
    BuiltInWideAngleCamera,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::BuiltInDualWideCamera => write!(f, "dual_wide"),
            DeviceType::BuiltInDualCamera => write!(f, "dual"),
            DeviceType::BuiltInWideAngleCamera => write!(f, "wide_angle"),
        }
    }
}

/// Physical position of a capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePosition {
    Back,
    Front,
}

impl std::fmt::Display for DevicePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DevicePosition::Back => write!(f, "back"),
            DevicePosition::Front => write!(f, "front"),
        }
    }
}

/// One entry of the device preference list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceSelector {
    pub device_type: DeviceType,
    pub position: DevicePosition,
}

impl DeviceSelector {
    pub const fn new(device_type: DeviceType, position: DevicePosition) -> Self {
        Self {
            device_type,
            position,
        }
    }
}

impl std::fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.device_type, self.position)
    }
}

/// Default order in which capture devices are tried; the first available wins.
pub const DEFAULT_DEVICE_PREFERENCE: [DeviceSelector; 4] = [
    DeviceSelector::new(DeviceType::BuiltInDualWideCamera, DevicePosition::Back),
    DeviceSelector::new(DeviceType::BuiltInDualCamera, DevicePosition::Back),
    DeviceSelector::new(DeviceType::BuiltInWideAngleCamera, DevicePosition::Back),
    DeviceSelector::new(DeviceType::BuiltInWideAngleCamera, DevicePosition::Front),
];

/// Camera device information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDeviceInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub device_type: DeviceType,
    pub position: DevicePosition,
}

impl CameraDeviceInfo {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            description: None,
            device_type: DeviceType::BuiltInWideAngleCamera,
            position: DevicePosition::Back,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_kind(mut self, device_type: DeviceType, position: DevicePosition) -> Self {
        self.device_type = device_type;
        self.position = position;
        self
    }

    /// Whether this device satisfies a preference-list entry
    pub fn matches(&self, selector: &DeviceSelector) -> bool {
        self.device_type == selector.device_type && self.position == selector.position
    }
}

/// Capture quality preset requested while configuring a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPreset {
    #[default]
    Photo,
    High,
    Medium,
    Low,
    Hd1920x1080,
    Hd1280x720,
    Vga640x480,
}

impl SessionPreset {
    /// Nominal resolution for drivers that negotiate formats by size.
    /// `None` means "highest the device offers".
    pub fn resolution(&self) -> Option<(u32, u32)> {
        match self {
            SessionPreset::Photo | SessionPreset::High => None,
            SessionPreset::Hd1920x1080 => Some((1920, 1080)),
            SessionPreset::Medium | SessionPreset::Hd1280x720 => Some((1280, 720)),
            SessionPreset::Low | SessionPreset::Vga640x480 => Some((640, 480)),
        }
    }
}

/// Orientation applied to the input/output connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeRight,
    LandscapeLeft,
}

/// Raw frame delivered to a frame consumer
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub device_id: String,
    pub orientation: VideoOrientation,
    pub data: Bytes,
}

impl CameraFrame {
    pub fn new(data: impl Into<Bytes>, width: u32, height: u32, device_id: String) -> Self {
        Self {
            sequence: 0,
            timestamp: Utc::now(),
            width,
            height,
            format: "RGB8".to_string(),
            device_id,
            orientation: VideoOrientation::default(),
            data: data.into(),
        }
    }

    pub fn with_format(mut self, format: String) -> Self {
        self.format = format;
        self
    }

    pub fn with_orientation(mut self, orientation: VideoOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preference_order() {
        let tags: Vec<String> = DEFAULT_DEVICE_PREFERENCE
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            tags,
            vec!["dual_wide back", "dual back", "wide_angle back", "wide_angle front"]
        );
    }

    #[test]
    fn test_device_matches_selector() {
        let device = CameraDeviceInfo::new("0".to_string(), "FaceTime HD Camera".to_string())
            .with_kind(DeviceType::BuiltInWideAngleCamera, DevicePosition::Front);
        assert!(device.matches(&DEFAULT_DEVICE_PREFERENCE[3]));
        assert!(!device.matches(&DEFAULT_DEVICE_PREFERENCE[2]));
    }

    #[test]
    fn test_preset_resolution() {
        assert_eq!(SessionPreset::Photo.resolution(), None);
        assert_eq!(SessionPreset::Hd1280x720.resolution(), Some((1280, 720)));
        assert_eq!(SessionPreset::Low.resolution(), Some((640, 480)));
    }

    #[test]
    fn test_frame_builders() {
        let frame = CameraFrame::new(vec![1u8, 2, 3], 1, 1, "cam".to_string())
            .with_format("YUYV".to_string())
            .with_orientation(VideoOrientation::LandscapeLeft);
        assert_eq!(frame.size_bytes(), 3);
        assert_eq!(frame.format, "YUYV");
        assert_eq!(frame.orientation, VideoOrientation::LandscapeLeft);
    }
}
