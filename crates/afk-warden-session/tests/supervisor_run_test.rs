//! Run-loop tests for the supervisor on a paused tokio clock.

use std::time::Duration;

use afk_warden_core::{Occupant, SessionEvent, SupervisorSettings};
use afk_warden_session::testing::FakeServer;
use afk_warden_session::Supervisor;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;

type Running = (oneshot::Sender<()>, JoinHandle<Supervisor<FakeServer>>);

fn spawn(server: &FakeServer, settings: SupervisorSettings) -> Running {
    let supervisor = Supervisor::new("afkbot", settings, server.clone());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(supervisor.run_until(async {
        let _ = stop_rx.await;
    }));
    (stop_tx, task)
}

async fn stop(stop_tx: oneshot::Sender<()>, task: JoinHandle<Supervisor<FakeServer>>) -> Supervisor<FakeServer> {
    let _ = stop_tx.send(());
    task.await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_two_seconds_after_kick() {
    let server = FakeServer::new();
    let (stop_tx, task) = spawn(&server, SupervisorSettings::default());

    sleep(Duration::from_millis(10)).await;
    assert_eq!(server.connect_count(), 1);
    let first = server.records()[0].session;
    assert!(server.emit(first, SessionEvent::Login));

    sleep(Duration::from_secs(1)).await;
    assert!(server.emit(first, SessionEvent::Kicked("banned".into())));

    sleep(Duration::from_secs(1)).await;
    assert_eq!(server.connect_count(), 1);
    assert!(server.records()[0].quit);

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(server.connect_count(), 2);
    let records = server.records();
    assert_ne!(records[0].identity, records[1].identity);

    stop(stop_tx, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_replaces_silent_session() {
    let server = FakeServer::new();
    let (stop_tx, task) = spawn(&server, SupervisorSettings::default());

    sleep(Duration::from_millis(10)).await;
    let first = server.records()[0].session;
    assert!(server.emit(first, SessionEvent::Login));

    sleep(Duration::from_secs(12)).await;
    assert_eq!(server.connect_count(), 1);

    sleep(Duration::from_secs(4)).await;
    assert_eq!(server.connect_count(), 2);
    assert!(server.records()[0].quit);

    stop(stop_tx, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_hung_connect_is_always_one_counted_failure() {
    for _ in 0..20 {
        let server = FakeServer::new();
        let (stop_tx, task) = spawn(&server, SupervisorSettings::default());

        // Never logs in. Watchdog and presence both notice at the 15s poll.
        sleep(Duration::from_millis(15_500)).await;
        let supervisor = stop(stop_tx, task).await;

        assert_eq!(supervisor.failures().consecutive(), 1);
        assert_eq!(server.connect_count(), 2);
        assert!(server.records()[0].quit);
    }
}

#[tokio::test(start_paused = true)]
async fn test_rotation_survives_presence_polls_during_overlap() {
    let server = FakeServer::new();
    let settings = SupervisorSettings {
        rotation_min_minutes: 1,
        rotation_max_minutes: 1,
        overlap_min_secs: 10,
        overlap_max_secs: 10,
        liveness_timeout_secs: 3600,
        ..SupervisorSettings::default()
    };
    let (stop_tx, task) = spawn(&server, settings);

    sleep(Duration::from_millis(10)).await;
    let first = server.records()[0].session;
    assert!(server.emit(first, SessionEvent::Login));

    sleep(Duration::from_secs(61)).await;
    let second = server.records()[1].session;
    assert!(server.emit(second, SessionEvent::Login));

    // Presence polls at 65s with both identities on the roster.
    sleep(Duration::from_secs(6)).await;
    let records = server.records();
    assert!(!records[0].quit);
    assert!(!records[1].quit);

    sleep(Duration::from_secs(4)).await;
    let records = server.records();
    assert!(records[0].quit);
    assert!(!records[1].quit);
    assert_eq!(server.connect_count(), 2);

    let supervisor = stop(stop_tx, task).await;
    assert_eq!(supervisor.failures().consecutive(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_keep_session_alive() {
    let server = FakeServer::new();
    let (stop_tx, task) = spawn(&server, SupervisorSettings::default());

    sleep(Duration::from_millis(10)).await;
    let first = server.records()[0].session;
    assert!(server.emit(first, SessionEvent::Login));

    for _ in 0..30 {
        sleep(Duration::from_secs(1)).await;
        assert!(server.emit(first, SessionEvent::Tick(Default::default())));
    }
    assert_eq!(server.connect_count(), 1);
    assert!(!server.records()[0].quit);

    stop(stop_tx, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_rotation_overlaps_sessions() {
    let server = FakeServer::new();
    let settings = SupervisorSettings {
        rotation_min_minutes: 1,
        rotation_max_minutes: 1,
        overlap_min_secs: 5,
        overlap_max_secs: 5,
        liveness_timeout_secs: 3600,
        ..SupervisorSettings::default()
    };
    let (stop_tx, task) = spawn(&server, settings);

    sleep(Duration::from_millis(10)).await;
    let first = server.records()[0].session;
    assert!(server.emit(first, SessionEvent::Login));

    sleep(Duration::from_secs(61)).await;
    assert_eq!(server.connect_count(), 2);
    assert!(!server.records()[0].quit, "old session must stay during overlap");

    sleep(Duration::from_secs(5)).await;
    let records = server.records();
    assert!(records[0].quit);
    assert!(!records[1].quit);
    assert_eq!(server.connect_count(), 2);

    stop(stop_tx, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_yields_to_human() {
    let server = FakeServer::new();
    let (stop_tx, task) = spawn(&server, SupervisorSettings::default());

    sleep(Duration::from_millis(10)).await;
    let first = server.records()[0].session;
    assert!(server.emit(first, SessionEvent::Login));
    server.set_roster(vec![Occupant::human("steve")]);

    sleep(Duration::from_secs(5)).await;
    assert!(server.records()[0].quit);

    stop(stop_tx, task).await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_retires_sessions() {
    let server = FakeServer::new();
    let (stop_tx, task) = spawn(&server, SupervisorSettings::default());

    sleep(Duration::from_millis(10)).await;
    assert_eq!(server.connect_count(), 1);

    stop(stop_tx, task).await;
    assert!(server.records().iter().all(|record| record.quit));
}
