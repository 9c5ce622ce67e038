//! Integration tests for the WiFi link against real localhost sockets

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use dashlink_core::{LinkError, LinkRole, SensorLink, SensorSample};
use dashlink_wifi::{WifiLinkConfig, WifiSensorLink};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

fn test_config(port: u16) -> WifiLinkConfig {
    WifiLinkConfig::new()
        .with_port(port)
        .with_bind_addr(LOCALHOST)
        .with_connect_timeout(Duration::from_secs(2))
}

/// Receiver link with channels capturing both callbacks
fn receiver_link(
    port: u16,
) -> (
    WifiSensorLink,
    mpsc::UnboundedReceiver<SensorSample>,
    mpsc::UnboundedReceiver<(bool, Option<String>)>,
) {
    let mut link = WifiSensorLink::new(test_config(port));
    let (data_tx, data_rx) = mpsc::unbounded_channel();
    let (conn_tx, conn_rx) = mpsc::unbounded_channel();
    link.set_on_data_received(Box::new(move |sample| {
        let _ = data_tx.send(sample);
    }));
    link.set_on_connection_change(Box::new(move |up, name| {
        let _ = conn_tx.send((up, name));
    }));
    (link, data_rx, conn_rx)
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("channel closed")
}

#[tokio::test]
async fn happy_path_relays_samples_from_sender_to_receiver() {
    let mut sender = WifiSensorLink::new(test_config(0));
    let addr = sender.start_server().await.unwrap();

    let (mut receiver, mut data_rx, mut conn_rx) = receiver_link(addr.port());
    receiver.connect_to_server("127.0.0.1").await.unwrap();

    assert!(receiver.is_connected());
    assert_eq!(receiver.role(), Some(LinkRole::Receiver));
    assert_eq!(
        recv(&mut conn_rx).await,
        (true, Some("127.0.0.1".to_string()))
    );

    // wait until the accept loop has registered the receiver
    timeout(Duration::from_secs(5), async {
        while !sender.is_connected() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("sender never saw the receiver");
    assert_eq!(sender.role(), Some(LinkRole::Sender));

    let sample = SensorSample::new(12.0, -3.0).with_altitude(500.0).with_speed(40.0);
    sender.send_sample(&sample).await.unwrap();

    let received = recv(&mut data_rx).await;
    assert_eq!(received.pitch, 12.0);
    assert_eq!(received.roll, -3.0);
    assert_eq!(received.altitude, Some(500.0));
    assert_eq!(received.speed, Some(40.0));

    // tear down from the sender side; the receiver must observe it
    sender.destroy().await;
    assert_eq!(recv(&mut conn_rx).await, (false, None));
    assert!(!receiver.is_connected());
    receiver.destroy().await;
}

#[tokio::test]
async fn connect_times_out_when_nobody_answers() {
    // a listener whose handshake never completes: the TCP connect succeeds
    // via the backlog but no websocket upgrade response ever comes
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let config = test_config(port).with_connect_timeout(Duration::from_millis(300));
    let mut link = WifiSensorLink::new(config);

    let result = link.connect_to_server("127.0.0.1").await;
    assert!(matches!(result, Err(LinkError::ConnectTimeout { .. })));
    assert!(!link.is_connected());

    // the failed attempt leaves no dangling state behind
    drop(listener);
    assert!(link
        .send_sample(&SensorSample::new(0.0, 0.0))
        .await
        .is_err());
}

#[tokio::test]
async fn connect_fails_cleanly_without_listener() {
    // grab a free port, then close it again before dialing
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let (mut link, _data_rx, mut conn_rx) = receiver_link(port);
    let result = link.connect_to_server("127.0.0.1").await;
    assert!(result.is_err());
    assert!(!link.is_connected());
    // no connection callback for an attempt that never reached connected
    assert!(conn_rx.try_recv().is_err());

    // a fresh attempt may be issued immediately afterwards
    let result = link.connect_to_server("127.0.0.1").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn malformed_frames_are_dropped_not_fatal() {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text("not json".to_string())).await.unwrap();
        ws.send(Message::Binary(vec![0xde, 0xad, 0xbe, 0xef]))
            .await
            .unwrap();
        ws.send(Message::Text("{\"pitch\":1.5,\"roll\":-0.5}".to_string()))
            .await
            .unwrap();
        // keep the socket open until the client has seen everything
        let _ = timeout(Duration::from_secs(5), ws.next()).await;
    });

    let (mut link, mut data_rx, _conn_rx) = receiver_link(port);
    link.connect_to_server("127.0.0.1").await.unwrap();

    let received = recv(&mut data_rx).await;
    assert_eq!(received, SensorSample::new(1.5, -0.5));
    assert!(link.is_connected());
    assert_eq!(link.dropped_frames(), 2);

    link.destroy().await;
    server.abort();
}

#[tokio::test]
async fn connection_callback_fires_exactly_twice_per_cycle() {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text("{\"pitch\":0.0,\"roll\":0.0}".to_string()))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
    });

    let (mut link, _data_rx, mut conn_rx) = receiver_link(port);
    link.connect_to_server("127.0.0.1").await.unwrap();

    assert_eq!(
        recv(&mut conn_rx).await,
        (true, Some("127.0.0.1".to_string()))
    );
    assert_eq!(recv(&mut conn_rx).await, (false, None));

    // the remote close already ended the link; disconnect must not re-fire
    link.disconnect().await;
    assert!(conn_rx.try_recv().is_err());
    assert!(!link.is_connected());

    server.await.unwrap();
}

#[tokio::test]
async fn frames_after_disconnect_are_discarded() {
    let mut sender = WifiSensorLink::new(test_config(0));
    let addr = sender.start_server().await.unwrap();

    let (mut receiver, mut data_rx, mut conn_rx) = receiver_link(addr.port());
    receiver.connect_to_server("127.0.0.1").await.unwrap();
    assert_eq!(
        recv(&mut conn_rx).await,
        (true, Some("127.0.0.1".to_string()))
    );

    receiver.disconnect().await;
    assert!(!receiver.is_connected());

    // sends from the old sender can no longer reach the data callback
    let _ = sender.send_sample(&SensorSample::new(9.0, 9.0)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(data_rx.try_recv().is_err());

    sender.destroy().await;
    receiver.destroy().await;
}
