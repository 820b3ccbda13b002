//! Camera authorization status and requests.

use std::sync::Mutex;

/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
    /// Permission not determined (user hasn't been asked yet)
    NotDetermined,
    /// Permission restricted (parental controls, etc)
    Restricted,
}

impl PermissionStatus {
    /// Denied and restricted both end setup without prompting
    pub fn is_refused(&self) -> bool {
        matches!(self, PermissionStatus::Denied | PermissionStatus::Restricted)
    }
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

/// Detailed permission information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
    pub can_request: bool,
}

/// Completion handler for a permission request, called with `true` when granted
pub type AuthorizationCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Check camera permission status
pub fn check_permission() -> PermissionStatus {
    check_permission_detailed().status
}

/// Check camera permission status with detailed information
pub fn check_permission_detailed() -> PermissionInfo {
    #[cfg(target_os = "windows")]
    {
        check_permission_windows()
    }

    #[cfg(target_os = "macos")]
    {
        check_permission_macos()
    }

    #[cfg(target_os = "linux")]
    {
        check_permission_linux()
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Platform not supported".to_string(),
            can_request: false,
        }
    }
}

/// Ask the operating system for camera access.
///
/// `on_complete` runs exactly once, possibly on a thread owned by the OS. On
/// platforms without a runtime prompt it runs immediately with the outcome of
/// the backend initialization.
pub fn request_permission(on_complete: AuthorizationCallback) {
    log::info!("Requesting camera permission");
    let slot = Mutex::new(Some(on_complete));
    nokhwa::nokhwa_initialize(move |granted| {
        let callback = slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(callback) = callback {
            log::info!("Camera permission request completed (granted: {})", granted);
            callback(granted);
        }
    });
}

#[cfg(target_os = "windows")]
fn check_permission_windows() -> PermissionInfo {
    // Windows gates cameras through Privacy settings; enumeration is the proxy
    use nokhwa::query;

    match query(nokhwa::utils::ApiBackend::Auto) {
        Ok(devices) if !devices.is_empty() => PermissionInfo {
            status: PermissionStatus::Granted,
            message: "Camera access granted via Windows Privacy settings".to_string(),
            can_request: false,
        },
        Ok(_) => PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "No cameras found - permission may not be granted".to_string(),
            can_request: true,
        },
        Err(e) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!("Camera access denied: {}", e),
            can_request: false,
        },
    }
}

#[cfg(target_os = "macos")]
fn check_permission_macos() -> PermissionInfo {
    use objc::runtime::{Class, Object};
    use objc::{msg_send, sel, sel_impl};
    use std::ffi::CString;

    let Some(device_class) = Class::get("AVCaptureDevice") else {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "AVFoundation not available".to_string(),
            can_request: false,
        };
    };

    let Ok(video) = CString::new("vide") else {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Invalid media type".to_string(),
            can_request: false,
        };
    };

    // AVAuthorizationStatus: 0 = NotDetermined, 1 = Restricted, 2 = Denied, 3 = Authorized
    let auth_status: i64 = unsafe {
        let media_type: *mut Object = msg_send![device_class, mediaTypeForString: video.as_ptr()];
        msg_send![device_class, authorizationStatusForMediaType: media_type]
    };

    match auth_status {
        3 => PermissionInfo {
            status: PermissionStatus::Granted,
            message: "Camera access authorized".to_string(),
            can_request: false,
        },
        2 => PermissionInfo {
            status: PermissionStatus::Denied,
            message: "Camera access denied - enable in System Settings > Privacy & Security > Camera".to_string(),
            can_request: false,
        },
        1 => PermissionInfo {
            status: PermissionStatus::Restricted,
            message: "Camera access restricted by system policy".to_string(),
            can_request: false,
        },
        _ => PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Camera permission not yet requested".to_string(),
            can_request: true,
        },
    }
}

#[cfg(target_os = "linux")]
fn check_permission_linux() -> PermissionInfo {
    use std::fs;
    use std::path::Path;

    let video_devices: Vec<_> = (0..10)
        .map(|i| format!("/dev/video{}", i))
        .filter(|path| Path::new(path).exists())
        .collect();

    let Some(first_device) = video_devices.first() else {
        // Nothing to guard; setup will fail later on device selection instead
        return PermissionInfo {
            status: PermissionStatus::Granted,
            message: "No video devices found at /dev/video*".to_string(),
            can_request: false,
        };
    };

    match fs::OpenOptions::new().read(true).open(first_device) {
        Ok(_) => PermissionInfo {
            status: PermissionStatus::Granted,
            message: format!("Camera access granted ({} readable)", first_device),
            can_request: false,
        },
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!(
                "Camera device {} not readable - run: sudo usermod -a -G video $USER",
                first_device
            ),
            can_request: false,
        },
        // Busy or transient errors are not an authorization problem
        Err(e) => PermissionInfo {
            status: PermissionStatus::Granted,
            message: format!("Camera device {} present ({})", first_device, e),
            can_request: false,
        },
    }
}
