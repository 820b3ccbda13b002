//! Tests for CrabCapture core types
//!
//! Covers serialization shapes and the device preference helpers.

use crabcapture::types::{
    CameraDeviceInfo, CameraFrame, DevicePosition, DeviceSelector, DeviceType, Platform,
    SessionPreset, VideoOrientation, DEFAULT_DEVICE_PREFERENCE,
};

#[cfg(test)]
mod platform_tests {
    use super::*;

    #[test]
    fn test_platform_as_str() {
        assert_eq!(Platform::Windows.as_str(), "windows");
        assert_eq!(Platform::MacOS.as_str(), "macos");
        assert_eq!(Platform::Linux.as_str(), "linux");
        assert_eq!(Platform::Unknown.as_str(), "unknown");
    }

    #[test]
    fn test_platform_serialization() {
        let json = serde_json::to_string(&Platform::Linux).unwrap();
        assert!(json.contains("Linux"));
    }
}

#[cfg(test)]
mod device_tests {
    use super::*;

    #[test]
    fn test_selector_serialization_is_snake_case() {
        let json = serde_json::to_string(&DEFAULT_DEVICE_PREFERENCE[0]).unwrap();
        assert_eq!(json, r#"{"device_type":"built_in_dual_wide_camera","position":"back"}"#);

        let parsed: DeviceSelector = serde_json::from_str(
            r#"{"device_type":"built_in_wide_angle_camera","position":"front"}"#,
        )
        .unwrap();
        assert_eq!(parsed, DEFAULT_DEVICE_PREFERENCE[3]);
    }

    #[test]
    fn test_preference_ends_with_front_camera() {
        let last = DEFAULT_DEVICE_PREFERENCE[DEFAULT_DEVICE_PREFERENCE.len() - 1];
        assert_eq!(last.position, DevicePosition::Front);
        assert!(DEFAULT_DEVICE_PREFERENCE[..3]
            .iter()
            .all(|s| s.position == DevicePosition::Back));
    }

    #[test]
    fn test_device_info_defaults_to_wide_back() {
        let device = CameraDeviceInfo::new("0".to_string(), "Webcam".to_string());
        assert_eq!(device.device_type, DeviceType::BuiltInWideAngleCamera);
        assert_eq!(device.position, DevicePosition::Back);
        assert!(device.description.is_none());
        assert!(device.matches(&DEFAULT_DEVICE_PREFERENCE[2]));
    }
}

#[cfg(test)]
mod frame_tests {
    use super::*;

    #[test]
    fn test_frame_defaults() {
        let frame = CameraFrame::new(vec![0u8; 12], 2, 2, "cam".to_string());
        assert_eq!(frame.size_bytes(), 12);
        assert_eq!(frame.sequence, 0);
        assert_eq!(frame.orientation, VideoOrientation::Portrait);
    }

    #[test]
    fn test_frame_clone_shares_data() {
        let frame = CameraFrame::new(vec![7u8; 64], 4, 4, "cam".to_string());
        let copy = frame.clone();
        assert_eq!(copy.data.as_ptr(), frame.data.as_ptr());
    }

    #[test]
    fn test_preset_defaults() {
        assert_eq!(SessionPreset::default(), SessionPreset::Photo);
        assert_eq!(SessionPreset::Hd1280x720.resolution(), Some((1280, 720)));
    }
}
