//! End-to-end flows of the kiosk runtime against a scripted backend, on a
//! paused tokio clock.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use kiosk_app::{CloseOutcome, Kiosk, KioskConfig, KioskError, KioskEvent, OpenOutcome};
use kiosk_client::{
    CloseReceipt, HealthStatus, LockerApiConfig, LockerApiError, LockerBackend, OpenReceipt,
};
use kiosk_core::{ClosetId, FlowKind, LockerId, LockerStatus, Secret, StatusMap, ValidationError};
use kiosk_state::{CloseTrigger, FlowError, NoticeLevel, ReturnDelay, Screen, SessionPhase, Visibility};
use parking_lot::Mutex;

// ── Scripted backend ─────────────────────────────────────────────────

type Scripted<T> = Result<T, (u16, String)>;

struct FakeBackend {
    statuses: Mutex<StatusMap>,
    status_fails: AtomicBool,
    open_result: Mutex<Scripted<OpenReceipt>>,
    close_result: Mutex<Scripted<CloseReceipt>>,
    open_delay: Mutex<Duration>,
    close_delay: Mutex<Duration>,
    open_calls: AtomicU32,
    close_calls: AtomicU32,
    status_calls: AtomicU32,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            statuses: Mutex::new(StatusMap::new()),
            status_fails: AtomicBool::new(false),
            open_result: Mutex::new(Ok(OpenReceipt {
                closet_id: ClosetId::from("C9"),
                message: None,
            })),
            close_result: Mutex::new(Ok(CloseReceipt::default())),
            open_delay: Mutex::new(Duration::ZERO),
            close_delay: Mutex::new(Duration::ZERO),
            open_calls: AtomicU32::new(0),
            close_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
        }
    }

    fn set_statuses(&self, entries: &[(u32, LockerStatus)]) {
        *self.statuses.lock() = entries
            .iter()
            .map(|(id, s)| (LockerId::from_raw(*id), *s))
            .collect();
    }

    fn opens(&self) -> u32 {
        self.open_calls.load(Ordering::SeqCst)
    }

    fn closes(&self) -> u32 {
        self.close_calls.load(Ordering::SeqCst)
    }

    fn open(&self) -> Result<OpenReceipt, LockerApiError> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        self.open_result.lock().clone().map_err(api_error)
    }

    fn close(&self) -> Result<CloseReceipt, LockerApiError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.close_result.lock().clone().map_err(api_error)
    }
}

fn api_error((status, message): (u16, String)) -> LockerApiError {
    LockerApiError::Api {
        endpoint: "fake".into(),
        status,
        message: Some(message),
        body: String::new(),
    }
}

impl LockerBackend for FakeBackend {
    async fn open_deposit(
        &self,
        _tracking_code: &str,
        _locker_id: LockerId,
    ) -> Result<OpenReceipt, LockerApiError> {
        let delay = *self.open_delay.lock();
        tokio::time::sleep(delay).await;
        self.open()
    }

    async fn close_deposit(
        &self,
        _locker_id: LockerId,
        _closet_id: &ClosetId,
        _tracking_code: &str,
    ) -> Result<CloseReceipt, LockerApiError> {
        let delay = *self.close_delay.lock();
        tokio::time::sleep(delay).await;
        self.close()
    }

    async fn open_withdrawal(
        &self,
        _password: &Secret,
        _locker_id: LockerId,
    ) -> Result<OpenReceipt, LockerApiError> {
        let delay = *self.open_delay.lock();
        tokio::time::sleep(delay).await;
        self.open()
    }

    async fn close_withdrawal(
        &self,
        _locker_id: LockerId,
        _closet_id: &ClosetId,
    ) -> Result<CloseReceipt, LockerApiError> {
        let delay = *self.close_delay.lock();
        tokio::time::sleep(delay).await;
        self.close()
    }

    async fn locker_statuses(&self) -> Result<StatusMap, LockerApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.status_fails.load(Ordering::SeqCst) {
            return Err(api_error((502, "bad gateway".into())));
        }
        Ok(self.statuses.lock().clone())
    }

    async fn health_check(&self) -> Result<HealthStatus, LockerApiError> {
        Ok(HealthStatus {
            status: "ok".into(),
        })
    }
}

fn kiosk() -> Kiosk<FakeBackend> {
    let config = KioskConfig::new(LockerApiConfig::local_mock(1).unwrap());
    Kiosk::new(FakeBackend::new(), config)
}

async fn open_deposit(kiosk: &Kiosk<FakeBackend>, locker: u32) {
    kiosk.enter_flow(FlowKind::Deposit).await.unwrap();
    kiosk.set_input(FlowKind::Deposit, "PKG123").unwrap();
    kiosk.select(FlowKind::Deposit, locker).unwrap();
    let outcome = kiosk.submit(FlowKind::Deposit).await.unwrap();
    assert!(matches!(outcome, OpenOutcome::Opened(_)));
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

// ── Deposit ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn deposit_with_manual_close_shows_password_then_returns_home() {
    let kiosk = kiosk();
    kiosk.backend().set_statuses(&[(4, LockerStatus::Available)]);
    *kiosk.backend().close_result.lock() = Ok(CloseReceipt {
        password: Some(Secret::new("7731")),
        message: None,
    });

    kiosk.enter_flow(FlowKind::Deposit).await.unwrap();
    assert_eq!(kiosk.visibility(Screen::Deposit), Visibility::Visible);
    assert!(kiosk.is_polling());

    kiosk.set_input(FlowKind::Deposit, "PKG123").unwrap();
    kiosk.select(FlowKind::Deposit, 4).unwrap();
    let outcome = kiosk.submit(FlowKind::Deposit).await.unwrap();
    let OpenOutcome::Opened(session) = outcome else {
        panic!("expected open, got {outcome:?}");
    };
    assert_eq!(session.locker_id, LockerId::from_raw(4));
    assert_eq!(session.closet_id, ClosetId::from("C9"));

    let view = kiosk.flow_view(FlowKind::Deposit);
    assert_eq!(view.phase, SessionPhase::Open);
    assert!(view.close_available);

    let CloseOutcome::Completed(completion) = kiosk.close(FlowKind::Deposit).await.unwrap() else {
        panic!("expected completion");
    };
    assert_eq!(completion.trigger, CloseTrigger::Manual);
    assert_eq!(completion.return_delay, ReturnDelay::PasswordDisplay);
    assert_eq!(completion.password.as_ref().map(Secret::expose), Some("7731"));

    let view = kiosk.flow_view(FlowKind::Deposit);
    assert_eq!(view.phase, SessionPhase::Idle);
    assert!(view.session.is_none());
    assert!(view.selection.is_none());
    assert!(view.notice.unwrap().text.contains("7731"));

    // Still on the deposit screen while the password is displayed.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(kiosk.screen(), Screen::Deposit);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(kiosk.visibility(Screen::Home), Visibility::Visible);
    assert!(!kiosk.is_polling());
}

#[tokio::test(start_paused = true)]
async fn door_closure_closes_deposit_exactly_once() {
    let kiosk = kiosk();
    let mut events = kiosk.subscribe();
    kiosk.backend().set_statuses(&[(4, LockerStatus::Available)]);
    *kiosk.backend().close_delay.lock() = Duration::from_secs(10);

    open_deposit(&kiosk, 4).await;
    kiosk.backend().set_statuses(&[(4, LockerStatus::Occupied)]);

    // Next poll at t=6s fires the close; it stays in flight until t=16s.
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(kiosk.backend().closes(), 1);
    assert_eq!(kiosk.flow_view(FlowKind::Deposit).phase, SessionPhase::Closing);
    assert!(kiosk.flow_view(FlowKind::Deposit).busy);

    // Manual close and further polls are absorbed.
    assert_eq!(
        kiosk.close(FlowKind::Deposit).await.unwrap(),
        CloseOutcome::AlreadyClosing
    );
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(kiosk.backend().closes(), 1);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(kiosk.flow_view(FlowKind::Deposit).phase, SessionPhase::Idle);

    let mut completed = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let KioskEvent::Completed(c) = event {
            completed.push(c);
        }
    }
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].trigger, CloseTrigger::DoorClosed);
    assert_eq!(completed[0].return_delay, ReturnDelay::Confirmation);
}

#[tokio::test(start_paused = true)]
async fn close_failure_keeps_session_and_reoffers_close() {
    let kiosk = kiosk();
    open_deposit(&kiosk, 4).await;
    *kiosk.backend().close_result.lock() = Err((409, "The box is still open".into()));

    let outcome = kiosk.close(FlowKind::Deposit).await.unwrap();
    assert_eq!(outcome, CloseOutcome::Failed("The box is still open".into()));
    let view = kiosk.flow_view(FlowKind::Deposit);
    assert_eq!(view.phase, SessionPhase::Open);
    assert!(view.session.is_some());
    assert!(view.close_available);
    assert_eq!(view.notice.unwrap().level, NoticeLevel::Error);

    *kiosk.backend().close_result.lock() = Ok(CloseReceipt::default());
    assert!(matches!(
        kiosk.close(FlowKind::Deposit).await.unwrap(),
        CloseOutcome::Completed(_)
    ));
    assert_eq!(kiosk.backend().closes(), 2);
}

// ── Withdrawal ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn withdrawal_invalid_password_stays_selecting() {
    let kiosk = kiosk();
    *kiosk.backend().open_result.lock() = Err((400, "Invalid password".into()));

    kiosk.enter_flow(FlowKind::Withdrawal).await.unwrap();
    kiosk.set_input(FlowKind::Withdrawal, "000000").unwrap();
    kiosk.select(FlowKind::Withdrawal, 2).unwrap();

    let outcome = kiosk.submit(FlowKind::Withdrawal).await.unwrap();
    assert_eq!(outcome, OpenOutcome::Rejected("Invalid password".into()));

    let view = kiosk.flow_view(FlowKind::Withdrawal);
    assert_eq!(view.phase, SessionPhase::Selecting);
    assert!(view.session.is_none());
    let notice = view.notice.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.text, "Invalid password");
}

#[tokio::test(start_paused = true)]
async fn withdrawal_auto_closes_when_locker_is_available_again() {
    let kiosk = kiosk();
    // The parcel sits in locker 2.
    kiosk.backend().set_statuses(&[(2, LockerStatus::Occupied)]);

    kiosk.enter_flow(FlowKind::Withdrawal).await.unwrap();
    assert!(kiosk.grid(FlowKind::Withdrawal).cell(LockerId::from_raw(2)).unwrap().enabled);
    kiosk.set_input(FlowKind::Withdrawal, "482913").unwrap();
    kiosk.select(FlowKind::Withdrawal, 2).unwrap();
    let outcome = kiosk.submit(FlowKind::Withdrawal).await.unwrap();
    assert!(matches!(outcome, OpenOutcome::Opened(_)));

    kiosk.backend().set_statuses(&[(2, LockerStatus::Occupied)]);
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(kiosk.backend().closes(), 0);

    kiosk.backend().set_statuses(&[(2, LockerStatus::Open)]);
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(kiosk.backend().closes(), 0);

    kiosk.backend().set_statuses(&[(2, LockerStatus::Available)]);
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(kiosk.backend().closes(), 1);
    assert_eq!(kiosk.flow_view(FlowKind::Withdrawal).phase, SessionPhase::Idle);

    // Short confirmation delay, then home.
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(kiosk.screen(), Screen::Home);
}

// ── Validation ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn validation_failures_make_no_network_call() {
    let kiosk = kiosk();
    kiosk.enter_flow(FlowKind::Deposit).await.unwrap();

    kiosk.select(FlowKind::Deposit, 3).unwrap();
    let err = kiosk.submit(FlowKind::Deposit).await.unwrap_err();
    assert!(matches!(
        err,
        KioskError::Flow(FlowError::Validation {
            reason: ValidationError::MissingTrackingCode,
            ..
        })
    ));
    assert_eq!(err.user_message(), "Please enter the tracking code.");

    assert!(kiosk.select(FlowKind::Deposit, 16).is_err());
    assert!(kiosk.select(FlowKind::Deposit, 0).is_err());
    assert_eq!(kiosk.backend().opens(), 0);
    assert_eq!(kiosk.flow_view(FlowKind::Deposit).phase, SessionPhase::Selecting);
}

#[tokio::test(start_paused = true)]
async fn occupied_locker_cannot_be_selected_for_deposit() {
    let kiosk = kiosk();
    kiosk.backend().set_statuses(&[(2, LockerStatus::Occupied), (3, LockerStatus::Open)]);
    kiosk.enter_flow(FlowKind::Deposit).await.unwrap();

    let grid = kiosk.grid(FlowKind::Deposit);
    assert!(!grid.cell(LockerId::from_raw(2)).unwrap().enabled);
    assert!(!grid.cell(LockerId::from_raw(3)).unwrap().enabled);
    assert!(grid.cell(LockerId::from_raw(4)).unwrap().enabled);
    assert!(grid.updated_at.is_some());

    assert!(kiosk.select(FlowKind::Deposit, 2).is_err());
    assert!(kiosk.select(FlowKind::Deposit, 3).is_err());
}

// ── Navigation ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn screen_switch_is_two_phase() {
    let kiosk = kiosk();
    let entering = tokio::spawn({
        let kiosk = kiosk.clone();
        async move { kiosk.enter_flow(FlowKind::Deposit).await }
    });
    settle().await;

    assert_eq!(kiosk.visibility(Screen::Home), Visibility::Leaving);
    assert_eq!(kiosk.visibility(Screen::Deposit), Visibility::Hidden);

    entering.await.unwrap().unwrap();
    assert_eq!(kiosk.visibility(Screen::Home), Visibility::Hidden);
    assert_eq!(kiosk.visibility(Screen::Deposit), Visibility::Visible);
}

#[tokio::test(start_paused = true)]
async fn going_home_resets_everything() {
    let kiosk = kiosk();
    open_deposit(&kiosk, 4).await;

    kiosk.go_home().await;
    for flow in FlowKind::ALL {
        let view = kiosk.flow_view(flow);
        assert_eq!(view.phase, SessionPhase::Idle);
        assert!(view.session.is_none());
        assert!(view.selection.is_none());
    }
    assert!(!kiosk.is_polling());
    assert_eq!(kiosk.visibility(Screen::Home), Visibility::Visible);
    assert_eq!(kiosk.visibility(Screen::Deposit), Visibility::Hidden);

    let polls = kiosk.backend().status_calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(kiosk.backend().status_calls.load(Ordering::SeqCst), polls);
}

#[tokio::test(start_paused = true)]
async fn late_open_response_after_going_home_is_discarded() {
    let kiosk = kiosk();
    *kiosk.backend().open_delay.lock() = Duration::from_secs(5);

    kiosk.enter_flow(FlowKind::Deposit).await.unwrap();
    kiosk.set_input(FlowKind::Deposit, "PKG123").unwrap();
    kiosk.select(FlowKind::Deposit, 4).unwrap();
    let pending = tokio::spawn({
        let kiosk = kiosk.clone();
        async move { kiosk.submit(FlowKind::Deposit).await }
    });
    settle().await;
    assert!(kiosk.flow_view(FlowKind::Deposit).busy);

    kiosk.go_home().await;
    let outcome = pending.await.unwrap().unwrap();
    assert_eq!(outcome, OpenOutcome::Discarded);
    assert_eq!(kiosk.backend().opens(), 1);

    let view = kiosk.flow_view(FlowKind::Deposit);
    assert_eq!(view.phase, SessionPhase::Idle);
    assert!(view.session.is_none());
}

#[tokio::test(start_paused = true)]
async fn auto_return_is_cancelled_by_manual_navigation() {
    let kiosk = kiosk();
    open_deposit(&kiosk, 4).await;
    kiosk.close(FlowKind::Deposit).await.unwrap();

    // User leaves and starts a withdrawal before the confirmation timer fires.
    kiosk.go_home().await;
    kiosk.enter_flow(FlowKind::Withdrawal).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(kiosk.screen(), Screen::Withdrawal);
    assert!(kiosk.is_polling());
}

// ── Polling ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn poll_failures_are_silent_and_polling_continues() {
    let kiosk = kiosk();
    kiosk.backend().status_fails.store(true, Ordering::SeqCst);
    kiosk.enter_flow(FlowKind::Deposit).await.unwrap();

    tokio::time::sleep(Duration::from_secs(13)).await;
    assert_eq!(kiosk.backend().status_calls.load(Ordering::SeqCst), 3);
    assert!(kiosk.flow_view(FlowKind::Deposit).notice.is_none());
    assert!(kiosk.grid(FlowKind::Deposit).updated_at.is_none());

    kiosk.backend().status_fails.store(false, Ordering::SeqCst);
    kiosk.backend().set_statuses(&[(5, LockerStatus::Occupied)]);
    tokio::time::sleep(Duration::from_secs(6)).await;
    let grid = kiosk.grid(FlowKind::Deposit);
    assert_eq!(grid.cell(LockerId::from_raw(5)).unwrap().status, LockerStatus::Occupied);
}

#[tokio::test(start_paused = true)]
async fn each_poll_replaces_the_cache() {
    let kiosk = kiosk();
    kiosk.backend().set_statuses(&[(1, LockerStatus::Open), (2, LockerStatus::Occupied)]);
    kiosk.enter_flow(FlowKind::Withdrawal).await.unwrap();
    assert_eq!(
        kiosk.grid(FlowKind::Withdrawal).cell(LockerId::from_raw(1)).unwrap().status,
        LockerStatus::Open
    );

    kiosk.backend().set_statuses(&[(2, LockerStatus::Available)]);
    tokio::time::sleep(Duration::from_secs(6)).await;
    let grid = kiosk.grid(FlowKind::Withdrawal);
    // Locker 1 is missing from the latest payload and shown as available.
    assert_eq!(grid.cell(LockerId::from_raw(1)).unwrap().status, LockerStatus::Available);
    assert_eq!(grid.cell(LockerId::from_raw(2)).unwrap().status, LockerStatus::Available);
}

#[tokio::test(start_paused = true)]
async fn refresh_surfaces_backend_errors() {
    let kiosk = kiosk();
    kiosk.backend().status_fails.store(true, Ordering::SeqCst);
    let err = kiosk.refresh().await.unwrap_err();
    assert!(matches!(err, KioskError::Backend(_)));

    kiosk.backend().status_fails.store(false, Ordering::SeqCst);
    kiosk.backend().set_statuses(&[(7, LockerStatus::Open)]);
    kiosk.refresh().await.unwrap();
    assert!(kiosk.grid(FlowKind::Deposit).updated_at.is_some());
}
