//! Location authorization status.
//!
//! Backends report the platform's current grant state for location access
//! through [`AuthorizationStatus`]. The location crate decides what each
//! status means for a pending request.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};

/// The current status of the location permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    /// Permission has been granted by the user.
    Authorized,
    /// Permission has not been requested yet.
    Undetermined,
    /// Permission has been denied by the user.
    Denied,
    /// Permission is restricted (e.g., parental controls on iOS).
    Restricted,
    /// The platform reported a status this crate does not know about.
    Unrecognized,
}

impl AuthorizationStatus {
    /// Map a raw platform status code to a status.
    ///
    /// Codes follow Core Location: `0` not determined, `1` restricted,
    /// `2` denied, `3` authorized always and `4` authorized when in use.
    /// Anything else is [`AuthorizationStatus::Unrecognized`].
    #[must_use]
    pub const fn from_raw(code: i32) -> Self {
        match code {
            0 => Self::Undetermined,
            1 => Self::Restricted,
            2 => Self::Denied,
            3 | 4 => Self::Authorized,
            _ => Self::Unrecognized,
        }
    }

    /// Returns `true` if location access is granted.
    #[must_use]
    pub const fn is_authorized(self) -> bool {
        matches!(self, Self::Authorized)
    }

    /// Returns `true` once the user (or the platform) has made a decision.
    #[must_use]
    pub const fn is_final(self) -> bool {
        !matches!(self, Self::Undetermined)
    }
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authorized => write!(f, "authorized"),
            Self::Undetermined => write!(f, "undetermined"),
            Self::Denied => write!(f, "denied"),
            Self::Restricted => write!(f, "restricted"),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_codes_map_to_statuses() {
        assert_eq!(AuthorizationStatus::from_raw(0), AuthorizationStatus::Undetermined);
        assert_eq!(AuthorizationStatus::from_raw(1), AuthorizationStatus::Restricted);
        assert_eq!(AuthorizationStatus::from_raw(2), AuthorizationStatus::Denied);
        assert_eq!(AuthorizationStatus::from_raw(3), AuthorizationStatus::Authorized);
        assert_eq!(AuthorizationStatus::from_raw(4), AuthorizationStatus::Authorized);
    }

    #[test]
    fn unknown_codes_are_unrecognized() {
        assert_eq!(AuthorizationStatus::from_raw(5), AuthorizationStatus::Unrecognized);
        assert_eq!(AuthorizationStatus::from_raw(-1), AuthorizationStatus::Unrecognized);
    }

    #[test]
    fn only_undetermined_is_pending() {
        assert!(!AuthorizationStatus::Undetermined.is_final());
        assert!(AuthorizationStatus::Denied.is_final());
        assert!(AuthorizationStatus::Unrecognized.is_final());
        assert!(AuthorizationStatus::Authorized.is_authorized());
        assert!(!AuthorizationStatus::Restricted.is_authorized());
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&AuthorizationStatus::Undetermined).unwrap();
        assert_eq!(json, "\"undetermined\"");
        let status: AuthorizationStatus = serde_json::from_str("\"restricted\"").unwrap();
        assert_eq!(status, AuthorizationStatus::Restricted);
    }
}
