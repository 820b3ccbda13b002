use std::sync::atomic::{AtomicU8, Ordering};

/// Outcome of the setup state machine.
///
/// `Success` is the initial state; the two failure states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum SetupResult {
    #[default]
    Success,
    NotAuthorized,
    ConfigurationFailed,
}

impl SetupResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SetupResult::Success)
    }

    fn to_bits(self) -> u8 {
        match self {
            SetupResult::Success => 0,
            SetupResult::NotAuthorized => 1,
            SetupResult::ConfigurationFailed => 2,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => SetupResult::NotAuthorized,
            2 => SetupResult::ConfigurationFailed,
            _ => SetupResult::Success,
        }
    }
}

impl std::fmt::Display for SetupResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupResult::Success => write!(f, "success"),
            SetupResult::NotAuthorized => write!(f, "not_authorized"),
            SetupResult::ConfigurationFailed => write!(f, "configuration_failed"),
        }
    }
}

/// Monotonic failure latch: the first failure recorded wins and is never reset.
#[derive(Debug, Default)]
pub struct SetupResultCell {
    bits: AtomicU8,
}

impl SetupResultCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> SetupResult {
        SetupResult::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Record a failure. Returns `true` if this call moved the cell out of
    /// `Success`; later failures and attempts to latch `Success` are ignored.
    pub fn latch(&self, failure: SetupResult) -> bool {
        if failure.is_success() {
            return false;
        }
        self.bits
            .compare_exchange(
                SetupResult::Success.to_bits(),
                failure.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_as_success() {
        let cell = SetupResultCell::new();
        assert_eq!(cell.get(), SetupResult::Success);
    }

    #[test]
    fn test_first_failure_wins() {
        let cell = SetupResultCell::new();
        assert!(cell.latch(SetupResult::NotAuthorized));
        assert!(!cell.latch(SetupResult::ConfigurationFailed));
        assert_eq!(cell.get(), SetupResult::NotAuthorized);
    }

    #[test]
    fn test_success_cannot_reset() {
        let cell = SetupResultCell::new();
        cell.latch(SetupResult::ConfigurationFailed);
        assert!(!cell.latch(SetupResult::Success));
        assert_eq!(cell.get(), SetupResult::ConfigurationFailed);
    }
}
