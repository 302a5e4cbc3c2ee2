use std::sync::Arc;
use std::time::Duration;

use sweepr_common::error::ProbeError;
use sweepr_common::network::list::TargetList;
use sweepr_core::sweep::sweep;
use sweepr_core::worker::{TcpConnectWorker, UdpProbeWorker};
use sweepr_core::{DispatchOptions, Enumerator, Outcome, StopReason};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

fn options() -> DispatchOptions {
    DispatchOptions {
        concurrency: 8,
        unit_timeout: Duration::from_millis(300),
        ..DispatchOptions::default()
    }
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn tcp_sweep_classifies_open_and_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let open = listener.local_addr().unwrap().port();
    let closed = closed_port().await;

    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut req = [0u8; 128];
                if sock.read(&mut req).await.is_ok() {
                    let _ = sock.write_all(b"HTTP/1.0 200 OK\r\n\r\n").await;
                }
            });
        }
    });

    let ports = TargetList::parse_ports(&format!("{open},{closed}"), false).unwrap();
    let enumerator = Enumerator::new(["127.0.0.1"], ports);
    let worker = TcpConnectWorker::new().with_payload(b"GET / HTTP/1.0\r\n\r\n".to_vec());

    let report = sweep(enumerator, Arc::new(worker), options()).await;

    assert_eq!(report.dispatched, 2);
    assert_eq!(
        report.units[0].result,
        Ok(Outcome::Open {
            banner: Some("HTTP/1.0 200 OK".into())
        })
    );
    assert_eq!(report.units[1].result, Err(ProbeError::Refused));
    assert_eq!(report.failure_counts().get("refused"), Some(&1));
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn tcp_fail_fast_stops_dispatching() {
    let closed = closed_port().await;
    let ports: Vec<String> = std::iter::repeat_n(closed.to_string(), 200).collect();
    let options = DispatchOptions {
        concurrency: 1,
        queue_capacity: 1,
        fail_fast: true,
        ..options()
    };

    let report = sweep(Enumerator::new(["127.0.0.1"], ports), Arc::new(TcpConnectWorker::new()), options).await;

    assert_eq!(report.stop, StopReason::FailFast);
    assert!(report.dispatched < 200);
    assert_eq!(report.units.len(), report.dispatched);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn udp_sweep_reports_reply_and_silence() {
    let echo = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let echo_port = echo.local_addr().unwrap().port();
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let silent_port = silent.local_addr().unwrap().port();

    tokio::spawn(async move {
        let mut buf = [0u8; 64];
        while let Ok((n, from)) = echo.recv_from(&mut buf).await {
            let _ = echo.send_to(&buf[..n], from).await;
        }
    });

    let ports = TargetList::parse_ports(&format!("{echo_port},{silent_port}"), false).unwrap();
    let report = sweep(
        Enumerator::new(["127.0.0.1"], ports),
        Arc::new(UdpProbeWorker::new(b"ping".to_vec())),
        options(),
    )
    .await;

    assert_eq!(
        report.units[0].result,
        Ok(Outcome::Open {
            banner: Some("ping".into())
        })
    );
    assert_eq!(report.units[1].result, Ok(Outcome::Silent));
    assert!(report.is_success());
    drop(silent);
}
