use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::anyhow;
use tokio::task::yield_now;

use crate::{
    LocationProvider, LocationRequest, LocationSample, Priority, StateUpdateSender, prelude::Result,
};

pub fn test_sample() -> LocationSample {
    LocationSample::new(37.422, -122.084, 5.0, Some(10.0))
}

/// Let spawned jobs run until they block again
pub async fn settle() {
    for _ in 0..20 {
        yield_now().await;
    }
}

/// Provider that hands out a settable fix. Activating and deactivating can be given a delay to
/// act like a provider that has to talk to hardware.
#[derive(Default)]
pub struct MockProvider {
    fix: Mutex<Option<LocationSample>>,
    fail_activation: bool,
    activate_delay: Duration,
    deactivate_delay: Duration,
    watching: AtomicBool,
    activations: AtomicUsize,
    deactivations: AtomicUsize,
    polls: AtomicUsize,
}

impl MockProvider {
    pub fn new(fix: Option<LocationSample>) -> Arc<Self> {
        Arc::new(Self {
            fix: Mutex::new(fix),
            ..Default::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_activation: true,
            ..Default::default()
        })
    }

    pub fn slow(
        fix: Option<LocationSample>,
        activate_delay: Duration,
        deactivate_delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            fix: Mutex::new(fix),
            activate_delay,
            deactivate_delay,
            ..Default::default()
        })
    }

    /// Whether the provider is currently switched on
    pub fn is_watching(&self) -> bool {
        self.watching.load(Ordering::SeqCst)
    }

    pub fn set_fix(&self, fix: Option<LocationSample>) {
        *self.fix.lock().unwrap() = fix;
    }

    pub fn activations(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    pub fn deactivations(&self) -> usize {
        self.deactivations.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl LocationProvider for MockProvider {
    async fn activate(&self, _request: &LocationRequest) -> Result {
        if self.fail_activation {
            return Err(anyhow!("No location hardware"));
        }
        if !self.activate_delay.is_zero() {
            tokio::time::sleep(self.activate_delay).await;
        }
        self.activations.fetch_add(1, Ordering::SeqCst);
        self.watching.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn last_fix(&self, _priority: Priority) -> Option<LocationSample> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        *self.fix.lock().unwrap()
    }

    async fn deactivate(&self) {
        if !self.deactivate_delay.is_zero() {
            tokio::time::sleep(self.deactivate_delay).await;
        }
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        self.watching.store(false, Ordering::SeqCst);
    }
}

/// Records every sample handed to a subscription callback
#[derive(Clone, Default)]
pub struct SampleLog(Arc<Mutex<Vec<LocationSample>>>);

impl SampleLog {
    pub fn callback(&self) -> impl FnMut(LocationSample) + Send + 'static {
        let log = self.0.clone();
        move |sample| log.lock().unwrap().push(sample)
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

pub struct DummySender;

impl StateUpdateSender for DummySender {
    fn send_update(&self) {}
}

#[derive(Clone, Default)]
pub struct CountingSender(Arc<AtomicUsize>);

impl CountingSender {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl StateUpdateSender for CountingSender {
    fn send_update(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
