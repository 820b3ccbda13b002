#[cfg(test)]
mod permissions_tests {
    use crabcapture::permissions::{check_permission, check_permission_detailed, PermissionStatus};

    #[test]
    fn test_check_permission_returns_status() {
        match check_permission() {
            PermissionStatus::Granted
            | PermissionStatus::Denied
            | PermissionStatus::NotDetermined
            | PermissionStatus::Restricted => {}
        }
    }

    #[test]
    fn test_check_permission_is_consistent() {
        let first = check_permission();
        for _ in 0..5 {
            assert_eq!(check_permission(), first, "Permission status should be consistent");
        }
    }

    #[test]
    fn test_check_permission_concurrent() {
        let handles: Vec<_> = (0..10)
            .map(|_| std::thread::spawn(check_permission))
            .collect();

        for handle in handles {
            let _ = handle.join().unwrap();
        }
    }

    #[test]
    fn test_detailed_permission_has_message() {
        let info = check_permission_detailed();
        assert!(!info.message.is_empty());
        if info.status.is_refused() {
            assert!(!info.can_request, "Refused access cannot be re-requested");
        }
    }

    #[test]
    fn test_permission_info_serializes() {
        let info = check_permission_detailed();
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("status"));
        assert!(json.contains("can_request"));
    }
}
