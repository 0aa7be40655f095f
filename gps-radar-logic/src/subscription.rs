use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, error, info};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::location::{LocationProvider, LocationRequest, LocationSample};

type SampleCallback = Box<dyn FnMut(LocationSample) + Send>;

/// Guards the subscriber's callback, delivery and closing both go through the same lock so once
/// [DeliveryGate::close] returns the callback can never run again.
#[derive(Clone)]
struct DeliveryGate(Arc<Mutex<Option<SampleCallback>>>);

impl DeliveryGate {
    fn new(callback: SampleCallback) -> Self {
        Self(Arc::new(Mutex::new(Some(callback))))
    }

    /// Returns false if the gate has been closed
    fn deliver(&self, sample: LocationSample) -> bool {
        let mut callback = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(callback) = callback.as_mut() {
            callback(sample);
            true
        } else {
            false
        }
    }

    fn close(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

/// Handle to an active location subscription, see [subscribe].
/// Dropping the handle cancels the subscription without waiting for the provider to be released.
pub struct SubscriptionHandle {
    gate: DeliveryGate,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    /// Stop the subscription, no samples are delivered after this returns
    pub fn cancel(&self) {
        self.gate.close();
        self.cancel.cancel();
    }

    /// Cancel the subscription and wait for the polling job to deactivate the provider
    pub async fn release(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(why) = task.await {
                error!("Location polling job failed: {why:?}");
            }
        }
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Register interest in periodic fixes from `provider`. A polling job is spawned that activates
/// the provider, then forwards its latest fix to `on_sample` every `request.interval` (the first
/// one right away). Ticks where the provider has no fix are skipped.
pub fn subscribe<P: LocationProvider>(
    provider: Arc<P>,
    request: LocationRequest,
    on_sample: impl FnMut(LocationSample) + Send + 'static,
) -> SubscriptionHandle {
    let gate = DeliveryGate::new(Box::new(on_sample));
    let cancel = CancellationToken::new();

    let task = tokio::spawn({
        let gate = gate.clone();
        let cancel = cancel.clone();
        async move {
            poll_loop(provider, request, gate, cancel).await;
        }
    });

    SubscriptionHandle {
        gate,
        cancel,
        task: Some(task),
    }
}

async fn poll_loop<P: LocationProvider>(
    provider: Arc<P>,
    request: LocationRequest,
    gate: DeliveryGate,
    cancel: CancellationToken,
) {
    // Not raced against cancellation, a successful activate must always be paired with a deactivate
    if let Err(why) = provider.activate(&request).await {
        error!("Failed to activate location provider: {why:?}");
        return;
    }

    info!(
        "Location updates started (every {:?}, {:?})",
        request.interval, request.priority
    );

    let mut interval = tokio::time::interval(request.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                break;
            }

            _ = interval.tick() => {
                if let Some(sample) = provider.last_fix(request.priority) {
                    if !gate.deliver(sample) {
                        break;
                    }
                } else {
                    debug!("No location available, skipping tick");
                }
            }
        }
    }

    provider.deactivate().await;
    info!("Location updates stopped");
}
