use std::collections::HashMap;

use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LocationPermission {
    /// Approximate location
    Coarse,
    /// Precise location
    Fine,
}

/// Every permission asked for at startup, having either one is enough
pub const REQUIRED_PERMISSIONS: [LocationPermission; 2] =
    [LocationPermission::Fine, LocationPermission::Coarse];

/// Shown once when the user refuses every location permission
pub const PERMISSION_ADVISORY: &str = "Location permission is required for this app";

/// Answers from the user for each requested permission
pub type PermissionGrants = HashMap<LocationPermission, bool>;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
/// Outcome of the one-time permission request
pub enum PermissionState {
    #[default]
    NotRequested,
    Granted,
    Denied,
}

impl PermissionState {
    /// Collapse per-permission answers, either fine or coarse access is enough to track
    pub fn from_grants(grants: &PermissionGrants) -> Self {
        let granted = REQUIRED_PERMISSIONS
            .iter()
            .any(|perm| grants.get(perm).copied().unwrap_or(false));

        if granted {
            Self::Granted
        } else {
            Self::Denied
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Something that can ask the user for location access
pub trait PermissionPrompt {
    fn request(
        &self,
        permissions: &[LocationPermission],
    ) -> impl std::future::Future<Output = PermissionGrants>;

    /// Ask for [REQUIRED_PERMISSIONS] and reduce the answers to a [PermissionState]
    fn request_location(&self) -> impl std::future::Future<Output = PermissionState> {
        async {
            let grants = self.request(&REQUIRED_PERMISSIONS).await;
            let state = PermissionState::from_grants(&grants);
            info!("Location permission resolved: {state:?} ({grants:?})");
            state
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPrompt(bool, bool);

    impl PermissionPrompt for FixedPrompt {
        async fn request(&self, permissions: &[LocationPermission]) -> PermissionGrants {
            permissions
                .iter()
                .map(|perm| {
                    let answer = match perm {
                        LocationPermission::Fine => self.0,
                        LocationPermission::Coarse => self.1,
                    };
                    (*perm, answer)
                })
                .collect()
        }
    }

    #[test]
    fn test_either_permission_grants() {
        let cases = [
            (true, true, PermissionState::Granted),
            (true, false, PermissionState::Granted),
            (false, true, PermissionState::Granted),
            (false, false, PermissionState::Denied),
        ];

        for (fine, coarse, expected) in cases {
            let grants = PermissionGrants::from([
                (LocationPermission::Fine, fine),
                (LocationPermission::Coarse, coarse),
            ]);
            assert_eq!(
                PermissionState::from_grants(&grants),
                expected,
                "fine={fine} coarse={coarse}"
            );
        }
    }

    #[test]
    fn test_missing_answers_deny() {
        assert_eq!(
            PermissionState::from_grants(&PermissionGrants::new()),
            PermissionState::Denied
        );
    }

    #[tokio::test]
    async fn test_prompt_requests_both() {
        assert_eq!(
            FixedPrompt(false, true).request_location().await,
            PermissionState::Granted
        );
        assert_eq!(
            FixedPrompt(false, false).request_location().await,
            PermissionState::Denied
        );
    }
}
