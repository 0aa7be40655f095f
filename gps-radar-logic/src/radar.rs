use std::sync::Arc;

use log::{error, info, warn};
use tokio::{
    sync::{Mutex, Notify, RwLock, watch},
    time::Instant,
};
use tokio_util::sync::CancellationToken;

use crate::{
    display::RadarView,
    location::{LocationProvider, LocationRequest, LocationSample},
    model::{Effect, Msg, RadarModel},
    permission::PermissionState,
    session::{LocationSession, SessionState},
};

/// Notifies the front end that the view needs to be redrawn
pub trait StateUpdateSender {
    fn send_update(&self);
}

type SampleSender = Arc<watch::Sender<Option<LocationSample>>>;

/// Runtime for the radar screen. Owns the [RadarModel] and the [LocationSession], feeds
/// messages through [RadarModel::update] and carries out the resulting effects.
/// Samples are handed over through a watch channel so only the newest one is ever pending.
pub struct Radar<P: LocationProvider, S: StateUpdateSender> {
    model: RwLock<RadarModel>,
    session: Mutex<LocationSession<P>>,
    samples: SampleSender,
    wake: Notify,
    state_update_sender: S,
    cancel: CancellationToken,
}

impl<P: LocationProvider, S: StateUpdateSender> Radar<P, S> {
    pub fn new(provider: Arc<P>, request: LocationRequest, state_update_sender: S) -> Self {
        let (samples, _) = watch::channel(None);
        Self {
            model: RwLock::new(RadarModel::default()),
            session: Mutex::new(LocationSession::new(provider, request)),
            samples: Arc::new(samples),
            wake: Notify::new(),
            state_update_sender,
            cancel: CancellationToken::new(),
        }
    }

    async fn apply_effect(&self, effect: Effect) {
        match effect {
            Effect::Subscribe => {
                let samples = self.samples.clone();
                let mut session = self.session.lock().await;
                let res = session.start(move |sample| {
                    samples.send_replace(Some(sample));
                });
                if let Err(why) = res {
                    error!("Couldn't start location updates: {why:?}");
                }
            }
            Effect::Unsubscribe => {
                self.session.lock().await.stop().await;
                // A fix still waiting in the channel belongs to the old subscription
                self.samples.send_replace(None);
            }
            Effect::ShowAdvisory(msg) => {
                warn!("{msg}");
            }
        }
    }

    async fn dispatch(&self, msg: Msg) {
        let mut model = self.model.write().await;
        let effects = model.update(msg, Instant::now());
        for effect in effects {
            self.apply_effect(effect).await;
        }
        drop(model);

        self.wake.notify_one();
        self.state_update_sender.send_update();
    }

    /// Feed in the answer to the startup permission request, only the first answer counts
    pub async fn resolve_permission(&self, permission: PermissionState) {
        let mut session = self.session.lock().await;
        if session.permission() == PermissionState::NotRequested {
            session.set_permission(permission);
        }
        drop(session);
        self.dispatch(Msg::PermissionResolved(permission)).await;
    }

    pub async fn start_tracking(&self) {
        self.dispatch(Msg::StartTracking).await;
    }

    pub async fn stop_tracking(&self) {
        self.dispatch(Msg::StopTracking).await;
    }

    pub async fn toggle_tracking(&self) {
        self.dispatch(Msg::ToggleTracking).await;
    }

    pub async fn session_state(&self) -> SessionState {
        self.session.lock().await.state()
    }

    pub async fn view(&self) -> RadarView {
        self.model.read().await.view(Instant::now())
    }

    /// Get a read handle to the model
    pub async fn model(&self) -> tokio::sync::RwLockReadGuard<'_, RadarModel> {
        self.model.read().await
    }

    pub fn quit(&self) {
        self.cancel.cancel();
    }

    /// Main loop of the screen, moves samples into the model and steps the sweep animation until
    /// [Radar::quit] is called. Tracking is stopped on the way out.
    pub async fn main_loop(&self) {
        let mut samples = self.samples.subscribe();

        loop {
            let next_step = self.model.read().await.next_sweep_step();
            let sweep = async move {
                match next_step {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    break;
                }

                // Tracking started or stopped, re-evaluate the sweep timer
                _ = self.wake.notified() => {}

                Ok(()) = samples.changed() => {
                    let sample = *samples.borrow_and_update();
                    if let Some(sample) = sample {
                        self.dispatch(Msg::Sample(sample)).await;
                    }
                }

                _ = sweep => {
                    self.dispatch(Msg::SweepStep).await;
                }
            }
        }

        self.dispatch(Msg::Teardown).await;
        info!("Radar closed");
    }
}
