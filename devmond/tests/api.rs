use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use devmond::collectors::{DiskSpace, HostSource, RawProcess};
use devmond::debug_session::FlagDetector;
use devmond::{Config, Monitor};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct FixtureHost;

impl HostSource for FixtureHost {
    fn cpu_stat(&mut self) -> Option<String> {
        Some("cpu  70 0 30 100 0 0 0 0\n".into())
    }

    fn meminfo(&mut self) -> Option<String> {
        Some("MemTotal: 2097152 kB\nMemFree: 524288 kB\nMemAvailable: 1048576 kB\n".into())
    }

    fn disk(&mut self) -> Option<DiskSpace> {
        Some(DiskSpace {
            total: 64 << 30,
            available: 16 << 30,
        })
    }

    fn process_table(&mut self) -> Vec<RawProcess> {
        vec![
            RawProcess {
                pid: 900,
                comm: "ruby".into(),
                cmdline: "puma 6.4.0 (tcp://0.0.0.0:3000) [shop]".into(),
            },
            RawProcess {
                pid: 901,
                comm: "fsevent_watch".into(),
                cmdline: "/gems/listen/bin/fsevent_watch ruby".into(),
            },
        ]
    }
}

fn app() -> (axum::Router, Arc<Monitor>, Arc<FlagDetector>) {
    let flag = Arc::new(FlagDetector::new(false));
    let monitor = Arc::new(
        Monitor::with_parts(
            &Config::default(),
            Box::new(FixtureHost),
            Box::new(Arc::clone(&flag)),
        )
        .unwrap(),
    );
    (devmond::api::router(Arc::clone(&monitor)), monitor, flag)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_query(event: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/queries")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(event.to_string()))
        .unwrap()
}

fn query_event(sql: &str) -> Value {
    json!({
        "name": "sql.active_record",
        "started_at": "2026-10-18T09:30:00.250+00:00",
        "finished_at": "2026-10-18T09:30:00.262+00:00",
        "payload": {"sql": sql, "cached": false},
        "backtrace": [
            "/usr/lib/ruby/gems/3.3.0/gems/activerecord/lib/active_record/relation.rb:12",
            "app/controllers/orders_controller.rb:9:in `index'"
        ]
    })
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _, _) = app();
    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn dashboard_is_served_on_plain_request() {
    let (app, _, _) = app();
    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("/ws"));
}

#[tokio::test]
async fn ingested_query_is_logged_and_pushed() {
    let (app, monitor, _) = app();
    let (id, mut rx) = monitor.hub().connect();
    monitor.hub().open(id);
    rx.recv().await.unwrap(); // handshake

    let response = app
        .oneshot(post_query(&query_event("SELECT * FROM orders WHERE id = 5")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["recorded"], true);
    assert_eq!(body["warning"], true);

    let pushed: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(pushed["sql_query"]["duration"], 12.0);
    assert_eq!(
        pushed["sql_query"]["location"],
        "app/controllers/orders_controller.rb:9:in `index'"
    );
    assert_eq!(monitor.query_log().len(), 1);
}

#[tokio::test]
async fn duplicate_ingest_is_not_recorded_twice() {
    let (app, monitor, _) = app();
    let event = query_event("SELECT 1");

    let first = app.clone().oneshot(post_query(&event)).await.unwrap();
    assert_eq!(body_json(first).await["recorded"], true);
    let second = app.oneshot(post_query(&event)).await.unwrap();
    assert_eq!(body_json(second).await["recorded"], false);
    assert_eq!(monitor.query_log().len(), 1);
}

#[tokio::test]
async fn ingest_during_debug_session_updates_log_silently() {
    let (app, monitor, flag) = app();
    let (id, mut rx) = monitor.hub().connect();
    monitor.hub().open(id);
    rx.recv().await.unwrap();
    flag.set(true);

    let response = app
        .oneshot(post_query(&query_event("SELECT 2")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(monitor.query_log().len(), 1);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn malformed_ingest_is_rejected() {
    let (app, monitor, _) = app();
    let response = app
        .oneshot(post_query(&json!({"payload": {"sql": "SELECT 1"}})))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert!(monitor.query_log().is_empty());
}

#[tokio::test]
async fn snapshot_returns_metrics_and_query_log() {
    let (app, _, _) = app();
    app.clone()
        .oneshot(post_query(&query_event("UPDATE orders SET paid = 1")))
        .await
        .unwrap();

    let response = app
        .oneshot(Request::get("/snapshot").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let state = body_json(response).await;

    assert_eq!(state["cpu_usage"]["capacity"], 100.0);
    assert_eq!(state["cpu_usage"]["used"], 50.0);
    assert_eq!(state["memory_usage"]["total"], 2.0);
    assert_eq!(state["memory_usage"]["used"], 1.0);
    assert_eq!(state["memory_usage"]["free"], 0.5);
    assert_eq!(state["disk_usage"]["used"], 48.0);
    assert_eq!(state["process_info"].as_array().unwrap().len(), 1);
    assert_eq!(state["process_info"][0]["pid"], 900);
    assert_eq!(
        state["process_info"][0]["description"],
        "Puma server (hosting the Rails application)"
    );
    assert_eq!(state["sql_queries"][0]["sql"], "UPDATE orders SET paid = 1");
    assert_eq!(state["sql_queries"][0]["warning"], false);
}

async fn spawn_server(app: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            eprintln!("test server error: {err}");
        }
    });
    addr
}

async fn next_text(socket: &mut Socket) -> String {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("frame within 5s")
            .expect("socket still open")
            .unwrap();
        if let Message::Text(text) = frame {
            return text.as_str().to_owned();
        }
    }
}

async fn wait_for_members(monitor: &Monitor, expected: usize) {
    for _ in 0..200 {
        if monitor.hub().len() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("hub has {} members, expected {expected}", monitor.hub().len());
}

#[tokio::test]
async fn push_channel_handshake_pull_and_disconnect() {
    let (app, monitor, _) = app();
    monitor.on_query_event(&serde_json::from_value(query_event("SELECT 3")).unwrap());
    let url = format!("ws://{}/ws", spawn_server(app).await);

    let (mut a, _) = connect_async(url.as_str()).await.unwrap();
    assert_eq!(next_text(&mut a).await, "Connected");
    let (mut b, _) = connect_async(url.as_str()).await.unwrap();
    assert_eq!(next_text(&mut b).await, "Connected");
    assert_eq!(monitor.hub().len(), 2);

    // text and binary frames are both pull requests answered to everyone
    let pulls = [Message::Text("ping".into()), Message::Binary(b"pull".to_vec().into())];
    for pull in pulls {
        a.send(pull).await.unwrap();
        for socket in [&mut a, &mut b] {
            let state: Value = serde_json::from_str(&next_text(socket).await).unwrap();
            assert_eq!(state["cpu_usage"]["capacity"], 100.0);
            assert_eq!(state["process_info"][0]["pid"], 900);
            assert_eq!(state["sql_queries"][0]["sql"], "SELECT 3");
        }
    }

    a.close(None).await.unwrap();
    wait_for_members(&monitor, 1).await;

    assert_eq!(monitor.hub().notify("after"), 1);
    assert_eq!(next_text(&mut b).await, "after");
}

#[tokio::test]
async fn dropped_socket_is_unregistered() {
    let (app, monitor, _) = app();
    let url = format!("ws://{}/ws", spawn_server(app).await);

    let (mut socket, _) = connect_async(url.as_str()).await.unwrap();
    assert_eq!(next_text(&mut socket).await, "Connected");
    wait_for_members(&monitor, 1).await;

    drop(socket);
    wait_for_members(&monitor, 0).await;
}
