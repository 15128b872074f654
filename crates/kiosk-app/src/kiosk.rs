//! # Kiosk Controller
//!
//! Binds the pure state in `kiosk-state` to a [`LockerBackend`] and the
//! tokio clock. All decisions are delegated to [`SessionStore`] and
//! [`Navigator`]; the controller performs the requests they emit, feeds the
//! outcomes back, and owns the timers.
//!
//! ## Concurrency
//!
//! State lives behind one `parking_lot::Mutex` that is never held across an
//! `.await`. Backend calls run unlocked; their results are applied under the
//! lock and checked against request tickets, so a response that arrives
//! after the user went home is discarded.
//!
//! Two epochs guard background work:
//! - the **poll epoch** changes whenever polling stops or restarts, and a
//!   fetch whose epoch is outdated when it returns is dropped;
//! - the **navigation epoch** changes on every screen switch, and an
//!   auto-return timer fires only if no switch happened since it was armed.

use std::sync::{Arc, Weak};

use kiosk_client::{LockerBackend, LockerClient};
use kiosk_core::{FlowKind, LockerId, Session, StatusSnapshot};
use kiosk_state::{
    CloseRequest, CloseTrigger, Completion, Credentials, FlowError, FlowMachine, GridView,
    Navigator, Notice, Screen, SessionPhase, SessionStore, Transition, Visibility,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::config::KioskConfig;
use crate::poller::Poller;
use crate::KioskError;

const EVENT_CAPACITY: usize = 32;

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskEvent {
    /// A status fetch was applied.
    StatusUpdated,
    /// A locker was opened and its session created.
    Opened {
        /// Flow of the new session.
        flow: FlowKind,
        /// Opened locker.
        locker_id: LockerId,
    },
    /// A transaction completed.
    Completed(Completion),
    /// A close request failed; the close can be retried.
    CloseFailed {
        /// Flow whose close failed.
        flow: FlowKind,
        /// Message shown to the user.
        message: String,
    },
    /// The kiosk switched to `screen`.
    ScreenChanged(Screen),
}

/// Result of [`Kiosk::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The door is open.
    Opened(Session),
    /// The backend refused or could not be reached; back to selection.
    Rejected(String),
    /// The user left the flow before the response arrived.
    Discarded,
}

/// Result of a close attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The transaction completed.
    Completed(Completion),
    /// The backend refused or could not be reached; the session is kept.
    Failed(String),
    /// Another trigger already issued the close.
    AlreadyClosing,
    /// The user left the flow before the response arrived.
    Discarded,
}

/// Snapshot of one flow for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowView {
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Selected locker.
    pub selection: Option<LockerId>,
    /// Active session.
    pub session: Option<Session>,
    /// Message line.
    pub notice: Option<Notice>,
    /// Show the loading indicator.
    pub busy: bool,
    /// Offer the close button.
    pub close_available: bool,
}

impl From<&FlowMachine> for FlowView {
    fn from(machine: &FlowMachine) -> Self {
        Self {
            phase: machine.phase(),
            selection: machine.selection(),
            session: machine.session().cloned(),
            notice: machine.notice().cloned(),
            busy: machine.is_busy(),
            close_available: machine.close_available(),
        }
    }
}

struct State {
    store: SessionStore,
    navigator: Navigator,
    poller: Poller,
    poll_epoch: u64,
    nav_epoch: u64,
}

struct Inner<B> {
    backend: B,
    config: KioskConfig,
    state: Mutex<State>,
    events: broadcast::Sender<KioskEvent>,
}

/// The kiosk runtime. Cheap to clone; clones share state.
pub struct Kiosk<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for Kiosk<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Kiosk<LockerClient> {
    /// Kiosk talking HTTP to the backend configured in `config`.
    pub fn connect(config: KioskConfig) -> Result<Self, KioskError> {
        let client = LockerClient::new(config.api.clone())?;
        Ok(Self::new(client, config))
    }
}

impl<B: LockerBackend> Kiosk<B> {
    /// Kiosk on the home screen, not polling.
    pub fn new(backend: B, config: KioskConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let state = State {
            store: SessionStore::new(config.range()),
            navigator: Navigator::new(),
            poller: Poller::new(config.poll_interval),
            poll_epoch: 0,
            nav_epoch: 0,
        };
        Self {
            inner: Arc::new(Inner {
                backend,
                config,
                state: Mutex::new(state),
                events,
            }),
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &KioskConfig {
        &self.inner.config
    }

    /// The backend in use.
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Receive [`KioskEvent`]s from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<KioskEvent> {
        self.inner.events.subscribe()
    }

    // ── Views ───────────────────────────────────────────────────────────

    /// Screen shown or being switched to.
    pub fn screen(&self) -> Screen {
        self.inner.state.lock().navigator.target()
    }

    /// Visibility of `screen` right now.
    pub fn visibility(&self, screen: Screen) -> Visibility {
        self.inner.state.lock().navigator.visibility(screen)
    }

    /// Whether the status poller is running.
    pub fn is_polling(&self) -> bool {
        self.inner.state.lock().poller.is_running()
    }

    /// Render state of `flow`.
    pub fn flow_view(&self, flow: FlowKind) -> FlowView {
        FlowView::from(self.inner.state.lock().store.flow(flow))
    }

    /// Locker grid of `flow`.
    pub fn grid(&self, flow: FlowKind) -> GridView {
        self.inner.state.lock().store.grid(flow)
    }

    // ── Navigation ──────────────────────────────────────────────────────

    /// Show `flow`'s screen and start polling. Any state of the other flow
    /// is discarded. Re-entering the current screen is a no-op.
    pub async fn enter_flow(&self, flow: FlowKind) -> Result<(), KioskError> {
        let screen = Screen::from(flow);
        let transition = {
            let mut state = self.inner.state.lock();
            if state.navigator.target() == screen {
                return Ok(());
            }
            state.nav_epoch += 1;
            state.store.reset();
            state.store.enter(flow)?;
            let transition = state.navigator.begin(screen);
            self.start_polling(&mut state);
            transition
        };
        tracing::info!(%flow, "entering flow");
        self.finish_transition(transition).await;
        Ok(())
    }

    /// Return to the home screen: both sessions and selections are dropped,
    /// polling stops, and in-flight responses become stale.
    pub async fn go_home(&self) {
        let transition = {
            let mut state = self.inner.state.lock();
            state.nav_epoch += 1;
            state.poll_epoch += 1;
            state.poller.stop();
            state.store.reset();
            state.navigator.begin(Screen::Home)
        };
        tracing::info!("returning home");
        self.finish_transition(transition).await;
    }

    async fn finish_transition(&self, transition: Option<Transition>) {
        let Some(transition) = transition else {
            return;
        };
        tokio::time::sleep(self.inner.config.screen_transition).await;
        if self.inner.state.lock().navigator.complete(transition.id) {
            self.emit(KioskEvent::ScreenChanged(transition.to));
        }
    }

    fn schedule_return_home(&self, state: &State, completion: &Completion) {
        let delay = self.inner.config.return_delay(completion.return_delay);
        let armed_at = state.nav_epoch;
        let kiosk = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let current = kiosk.inner.state.lock().nav_epoch;
            if current == armed_at {
                kiosk.go_home().await;
            }
        });
    }

    // ── User input ──────────────────────────────────────────────────────

    /// Choose locker `raw` in `flow`.
    pub fn select(&self, flow: FlowKind, raw: u32) -> Result<LockerId, KioskError> {
        Ok(self.inner.state.lock().store.select(flow, raw)?)
    }

    /// Replace the tracking code or password draft of `flow`.
    pub fn set_input(&self, flow: FlowKind, text: impl Into<String>) -> Result<(), KioskError> {
        Ok(self.inner.state.lock().store.set_input(flow, text)?)
    }

    /// Submit `flow`: validate locally, then ask the backend to open the
    /// selected locker. Validation failures return an error and make no
    /// network call.
    pub async fn submit(&self, flow: FlowKind) -> Result<OpenOutcome, KioskError> {
        let request = self.inner.state.lock().store.submit(flow)?;
        let locker_id = request.locker_id;

        let result = match &request.credentials {
            Credentials::TrackingCode(code) => {
                self.inner.backend.open_deposit(code, locker_id).await
            }
            Credentials::Password(password) => {
                self.inner.backend.open_withdrawal(password, locker_id).await
            }
        };

        let mut state = self.inner.state.lock();
        match result {
            Ok(receipt) => {
                let closet_id = receipt.closet_id.clone();
                match state.store.open_succeeded(request.ticket, receipt.closet_id, receipt.message) {
                    Ok(session) => {
                        tracing::info!(%flow, %locker_id, %closet_id, "locker opened");
                        self.emit(KioskEvent::Opened { flow, locker_id });
                        Ok(OpenOutcome::Opened(session))
                    }
                    Err(FlowError::StaleResponse { .. }) => {
                        tracing::debug!(%flow, %locker_id, "discarding late open response");
                        Ok(OpenOutcome::Discarded)
                    }
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => {
                tracing::warn!(%flow, %locker_id, error = %e, "open request failed");
                let message = e.user_message();
                match state.store.open_failed(request.ticket, message.clone()) {
                    Ok(()) => Ok(OpenOutcome::Rejected(message)),
                    Err(FlowError::StaleResponse { .. }) => Ok(OpenOutcome::Discarded),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    /// Close `flow`'s session on the user's request.
    pub async fn close(&self, flow: FlowKind) -> Result<CloseOutcome, KioskError> {
        let request = self
            .inner
            .state
            .lock()
            .store
            .request_close(flow, CloseTrigger::Manual)?;
        match request {
            Some(request) => Ok(self.run_close(request).await),
            None => {
                tracing::debug!(%flow, "close already in flight");
                Ok(CloseOutcome::AlreadyClosing)
            }
        }
    }

    async fn run_close(&self, request: CloseRequest) -> CloseOutcome {
        let flow = request.ticket.flow();
        let session = &request.session;
        let locker_id = session.locker_id;

        let result = match session.tracking_code() {
            Some(code) => {
                self.inner
                    .backend
                    .close_deposit(locker_id, &session.closet_id, code)
                    .await
            }
            None => {
                self.inner
                    .backend
                    .close_withdrawal(locker_id, &session.closet_id)
                    .await
            }
        };

        let mut state = self.inner.state.lock();
        match result {
            Ok(receipt) => {
                match state
                    .store
                    .close_succeeded(request.ticket, receipt.password, receipt.message)
                {
                    Ok(completion) => {
                        tracing::info!(
                            %flow,
                            %locker_id,
                            trigger = %completion.trigger,
                            "transaction completed"
                        );
                        self.schedule_return_home(&state, &completion);
                        self.emit(KioskEvent::Completed(completion.clone()));
                        CloseOutcome::Completed(completion)
                    }
                    Err(_) => {
                        tracing::debug!(%flow, %locker_id, "discarding late close response");
                        CloseOutcome::Discarded
                    }
                }
            }
            Err(e) => {
                tracing::warn!(%flow, %locker_id, error = %e, "close request failed");
                let message = e.user_message();
                match state.store.close_failed(request.ticket, message.clone()) {
                    Ok(()) => {
                        self.emit(KioskEvent::CloseFailed {
                            flow,
                            message: message.clone(),
                        });
                        CloseOutcome::Failed(message)
                    }
                    Err(_) => CloseOutcome::Discarded,
                }
            }
        }
    }

    // ── Polling ─────────────────────────────────────────────────────────

    fn start_polling(&self, state: &mut State) {
        state.poll_epoch += 1;
        let weak: Weak<Inner<B>> = Arc::downgrade(&self.inner);
        state.poller.start(move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    Kiosk { inner }.poll_tick().await;
                }
            }
        });
    }

    async fn poll_tick(&self) {
        let epoch = self.inner.state.lock().poll_epoch;
        match self.inner.backend.locker_statuses().await {
            Ok(statuses) => self.apply_statuses(Some(epoch), StatusSnapshot::now(statuses)),
            Err(e) => tracing::warn!(error = %e, "status poll failed"),
        }
    }

    /// Fetch statuses once and apply them, outside the poller. Errors are
    /// returned rather than swallowed.
    pub async fn refresh(&self) -> Result<(), KioskError> {
        let statuses = self.inner.backend.locker_statuses().await?;
        self.apply_statuses(None, StatusSnapshot::now(statuses));
        Ok(())
    }

    fn apply_statuses(&self, epoch: Option<u64>, snapshot: StatusSnapshot) {
        let requests = {
            let mut state = self.inner.state.lock();
            if epoch.is_some_and(|e| e != state.poll_epoch) {
                tracing::debug!("discarding status fetched before polling stopped");
                return;
            }
            state.store.apply_snapshot(snapshot)
        };
        self.emit(KioskEvent::StatusUpdated);

        for request in requests {
            tracing::info!(
                flow = %request.ticket.flow(),
                locker_id = %request.session.locker_id,
                "door closure detected, closing"
            );
            let kiosk = self.clone();
            tokio::spawn(async move {
                kiosk.run_close(request).await;
            });
        }
    }

    fn emit(&self, event: KioskEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

