#[cfg(test)]
mod error_tests {
    use crabcapture::errors::{CameraError, ConfigurationError};
    use std::error::Error;

    #[test]
    fn test_camera_error_initialization() {
        let error = CameraError::InitializationError("Test init error".to_string());
        assert!(error.to_string().contains("Camera initialization error"));
        assert!(error.to_string().contains("Test init error"));
    }

    #[test]
    fn test_camera_error_device_busy() {
        let error = CameraError::DeviceBusy("held by another app".to_string());
        assert_eq!(error.to_string(), "Device busy: held by another app");
    }

    #[test]
    fn test_camera_error_debug_format() {
        let error = CameraError::StreamError("Debug test".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("StreamError"));
        assert!(debug_str.contains("Debug test"));
    }

    #[test]
    fn test_camera_error_implements_error_trait() {
        let error = CameraError::PermissionDenied("Error trait test".to_string());
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
    }

    #[test]
    fn test_all_camera_error_variants_display() {
        let errors = vec![
            CameraError::InitializationError("a".to_string()),
            CameraError::PermissionDenied("b".to_string()),
            CameraError::DeviceNotFound("c".to_string()),
            CameraError::DeviceBusy("d".to_string()),
            CameraError::StreamError("e".to_string()),
            CameraError::ConfigError("f".to_string()),
        ];
        for error in errors {
            assert!(!error.to_string().is_empty());
        }
    }

    #[test]
    fn test_configuration_error_messages() {
        assert_eq!(
            ConfigurationError::NoDefaultDeviceAvailable.to_string(),
            "no default capture device is available"
        );
        assert!(ConfigurationError::CannotAddInput.to_string().contains("input"));
        assert!(ConfigurationError::CannotAddOutput.to_string().contains("output"));
        assert_eq!(
            ConfigurationError::CannotStartStream("lost".to_string()).to_string(),
            "driver refused to start streaming: lost"
        );
    }

    #[test]
    fn test_errors_convert_to_anyhow() {
        let camera: anyhow::Error = CameraError::DeviceNotFound("0".to_string()).into();
        assert!(camera.to_string().contains("Device not found"));

        let config: anyhow::Error = ConfigurationError::CannotAddOutput.into();
        assert!(config.downcast_ref::<ConfigurationError>().is_some());
    }
}
