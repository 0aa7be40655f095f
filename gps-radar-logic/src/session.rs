use std::sync::Arc;

use anyhow::bail;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    location::{LocationProvider, LocationRequest, LocationSample},
    permission::PermissionState,
    prelude::*,
    subscription::{SubscriptionHandle, subscribe},
};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Tracking,
}

/// Owns the lifecycle of at most one location subscription. Starting requires the user to have
/// granted location access, stopping (or dropping the session) releases the provider.
pub struct LocationSession<P: LocationProvider> {
    provider: Arc<P>,
    request: LocationRequest,
    permission: PermissionState,
    subscription: Option<SubscriptionHandle>,
}

impl<P: LocationProvider> LocationSession<P> {
    pub fn new(provider: Arc<P>, request: LocationRequest) -> Self {
        Self {
            provider,
            request,
            permission: PermissionState::NotRequested,
            subscription: None,
        }
    }

    pub fn set_permission(&mut self, permission: PermissionState) {
        self.permission = permission;
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn request(&self) -> &LocationRequest {
        &self.request
    }

    pub fn state(&self) -> SessionState {
        if self.subscription.is_some() {
            SessionState::Tracking
        } else {
            SessionState::Idle
        }
    }

    /// Begin forwarding fixes to `on_sample`. Does nothing if we're already tracking, the
    /// existing subscription (and its callback) is kept.
    pub fn start(&mut self, on_sample: impl FnMut(LocationSample) + Send + 'static) -> Result {
        match self.permission {
            PermissionState::Granted => {}
            PermissionState::NotRequested => bail!("Location permission has not been requested"),
            PermissionState::Denied => bail!("Location permission was denied"),
        }

        if self.subscription.is_some() {
            debug!("Already tracking, ignoring start");
            return Ok(());
        }

        let handle = subscribe(self.provider.clone(), self.request, on_sample);
        self.subscription = Some(handle);
        Ok(())
    }

    /// Stop forwarding fixes, a no-op if not tracking. Returns once the provider has been
    /// deactivated, so a following [LocationSession::start] can't race the release.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.subscription.take() {
            handle.release().await;
        }
    }
}

impl<P: LocationProvider> Drop for LocationSession<P> {
    fn drop(&mut self) {
        if let Some(handle) = self.subscription.take() {
            handle.cancel();
        }
    }
}
