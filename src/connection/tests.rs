//! Connection tests over replayed datagrams

use super::*;
use crate::protocol::StringEncoding;
use crate::test_utils::{DatagramBuilder, car_connection, lap_completed, new_session, realtime_update};
use crate::transports::{ReplayTransport, SentDatagram};
use futures::StreamExt;

fn replay(datagrams: Vec<Vec<u8>>) -> Connection {
    Connection::spawn(ReplayTransport::new(datagrams), DriverOptions::default())
}

#[tokio::test]
async fn first_subscriber_sees_every_outcome() {
    let connection = replay(vec![
        new_session("Drift Server", "vallelunga", "drift", "Practice"),
        car_connection(4, "Porx"),
        vec![58, 0x01],
        lap_completed(4, 86_120, 0),
    ]);

    let outcomes: Vec<_> = connection.outcomes().collect().await;
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes[2].is_malformed());
    assert_eq!(connection.stats().total(), 4);
}

#[tokio::test]
async fn snapshots_follow_state() {
    let connection = replay(vec![
        new_session("Drift Server", "vallelunga", "drift", "Practice"),
        car_connection(4, "Porx"),
        car_connection(7, "Kuro"),
        lap_completed(4, 86_120, 0),
        vec![52, 7],
    ]);

    let events: Vec<_> = connection.events().collect().await;
    assert_eq!(events.len(), 5);

    assert_eq!(connection.current_session().track_label(), "vallelunga (drift)");
    let drivers = connection.drivers();
    assert_eq!(drivers.len(), 1);
    assert_eq!(connection.driver(4).and_then(|d| d.best_lap_millis), Some(86_120));
    assert!(connection.driver(7).is_none());
}

#[tokio::test]
async fn telemetry_is_filtered_by_car() {
    let connection = replay(vec![
        realtime_update(4, [0.0; 3], [10.0, 0.0, 0.0], 1.0),
        realtime_update(5, [0.0; 3], [20.0, 0.0, 0.0], 1.0),
        realtime_update(4, [0.0; 3], [0.0, 0.0, 25.0], 2.0),
    ]);

    let samples: Vec<_> = connection.telemetry(4, UpdateRate::Native).collect().await;
    assert_eq!(samples.len(), 2);
    assert!(samples.iter().all(|s| s.car_id == 4));
    assert!((samples[1].speed_kmh() - 90.0).abs() < 1e-3);
}

#[tokio::test(start_paused = true)]
async fn throttled_telemetry_keeps_latest() {
    let transport = ReplayTransport::new(
        (0..10).map(|i| realtime_update(4, [0.0; 3], [1.0, 0.0, 0.0], i as f32)),
    )
    .with_pacing(Duration::from_millis(10));
    let connection =
        Connection::spawn(transport, DriverOptions::default()).with_source_hz(100.0);

    let samples: Vec<_> = connection.telemetry(4, UpdateRate::Max(10)).collect().await;
    assert!(samples.len() < 10);
    assert_eq!(samples.last().map(|s| s.distance_m), Some(9.0));
}

#[tokio::test]
async fn session_updates_skip_initial_placeholder() {
    let connection = replay(vec![
        new_session("A", "monza", "", "Race"),
        new_session("A", "spa", "", "Race"),
    ]);

    let session = connection
        .wait_for_session(Duration::from_secs(5))
        .await
        .expect("session should arrive");
    assert_ne!(*session, SessionInfo::unknown());

    let updates: Vec<_> = connection.session_updates().collect().await;
    assert!(!updates.is_empty());
    assert!(updates.iter().all(|s| s.server_name == "A"));
    assert_eq!(connection.current_session().track_name, "spa");
    assert!(connection.has_session());
}

#[tokio::test]
async fn session_that_looks_like_the_placeholder_is_still_delivered() {
    let placeholder = DatagramBuilder::new(50)
        .u8(0)
        .u8(0)
        .u8(0)
        .u8(0)
        .string("Unknown", StringEncoding::Narrow)
        .string("Unknown", StringEncoding::Narrow)
        .string("", StringEncoding::Narrow)
        .string("Unknown", StringEncoding::Narrow)
        .build();
    let transport = ReplayTransport::new([placeholder]).with_pacing(Duration::from_secs(3600));
    let connection = Connection::spawn(transport, DriverOptions::default());

    let session = connection
        .wait_for_session(Duration::from_secs(5))
        .await
        .expect("session should arrive");
    assert_eq!(*session, SessionInfo::unknown());
    assert!(connection.has_session());

    let mut updates = Box::pin(connection.session_updates());
    assert_eq!(updates.next().await.as_deref(), Some(&SessionInfo::unknown()));
}

#[tokio::test]
async fn wait_for_session_times_out_without_one() {
    let transport = ReplayTransport::new([[52u8, 1]; 2]).with_pacing(Duration::from_secs(3600));
    let connection = Connection::spawn(transport, DriverOptions::default());

    match connection.wait_for_session(Duration::from_millis(20)).await {
        Err(AcspError::Timeout { duration }) => assert_eq!(duration, Duration::from_millis(20)),
        other => panic!("Expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn commands_reach_the_server() {
    let mut transport =
        ReplayTransport::new([[52u8, 1]; 2]).with_pacing(Duration::from_secs(3600));
    let mut outbox = transport.take_outbox().expect("outbox");
    let server = "127.0.0.1:11000".parse().expect("addr");
    let options = DriverOptions { server: Some(server), ..DriverOptions::default() };
    let connection = Connection::spawn(transport, options);

    connection.broadcast_chat("gg").await.expect("chat sent");
    connection.send(Command::GetCarInfo { car_id: 4 }).await.expect("car info sent");

    let chat = outbox.recv().await.expect("chat datagram");
    assert_eq!(chat.bytes[0], 221);
    assert_eq!(outbox.recv().await, Some(SentDatagram { bytes: vec![210, 4], dest: server }));
}

#[tokio::test]
async fn send_after_shutdown_fails() {
    let transport = ReplayTransport::new([[52u8, 1]; 2]).with_pacing(Duration::from_secs(3600));
    let connection = Connection::spawn(transport, DriverOptions::default());

    connection.shutdown();
    assert!(connection.is_closed());
    // Either the queue is already closed or the reply is dropped.
    let result = connection.send(Command::SubscribeUpdate).await;
    assert!(matches!(result, Err(AcspError::ChannelClosed) | Err(AcspError::NoServerAddress)));
}
