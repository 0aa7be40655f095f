use std::io::Write;

use gps_radar_logic::{LocationPermission, PermissionGrants, PermissionPrompt};
use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader};

fn question(permission: LocationPermission) -> &'static str {
    match permission {
        LocationPermission::Fine => "Allow GPS Radar to access this device's precise location?",
        LocationPermission::Coarse => {
            "Allow GPS Radar to access this device's approximate location instead?"
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Asks for each permission on stdin before the UI takes over the terminal.
/// Granting precise access implies approximate access.
pub struct TerminalPrompt;

impl PermissionPrompt for TerminalPrompt {
    async fn request(&self, permissions: &[LocationPermission]) -> PermissionGrants {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut grants = PermissionGrants::new();

        for &permission in permissions {
            if permission == LocationPermission::Coarse
                && grants.get(&LocationPermission::Fine) == Some(&true)
            {
                grants.insert(permission, true);
                continue;
            }

            print!("{} [y/N] ", question(permission));
            std::io::stdout().flush().ok();

            let granted = match lines.next_line().await {
                Ok(Some(answer)) => is_yes(&answer),
                Ok(None) => false,
                Err(why) => {
                    warn!("Couldn't read permission answer: {why:?}");
                    false
                }
            };

            grants.insert(permission, granted);
        }

        grants
    }
}

/// Used with `--grant-location`, every permission is already granted
pub struct PreGranted;

impl PermissionPrompt for PreGranted {
    async fn request(&self, permissions: &[LocationPermission]) -> PermissionGrants {
        permissions.iter().map(|&perm| (perm, true)).collect()
    }
}
