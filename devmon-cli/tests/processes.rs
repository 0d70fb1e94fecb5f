use assert_cmd::Command;
use httpmock::prelude::*;

fn snapshot_with(processes: &str) -> String {
    format!(
        r#"{{"cpu_usage":{{"capacity":100,"used":1,"idle":99}},
            "memory_usage":{{"total":1,"used":0.5,"free":0.5}},
            "disk_usage":{{"total":10,"used":5,"free":5}},
            "process_info":{processes},"sql_queries":[]}}"#
    )
}

#[tokio::test]
async fn processes_command_lists_processes() {
    let server = MockServer::start_async().await;
    let body = snapshot_with(
        r#"[{"pid":1234,"comm":"ruby","cmdline":"puma 6.4.0 (tcp://0.0.0.0:3000)","description":"Puma server (hosting the Rails application)"}]"#,
    );
    let _m = server
        .mock_async(|when, then| {
            when.method(GET).path("/snapshot");
            then.status(200)
                .header("content-type", "application/json")
                .body(body);
        })
        .await;

    Command::cargo_bin("devmon-cli")
        .unwrap()
        .args(["--url", &server.base_url(), "--no-color", "processes"])
        .assert()
        .success()
        .stdout(predicates::str::contains("1234"))
        .stdout(predicates::str::contains("Puma server"));
}

#[tokio::test]
async fn processes_command_handles_empty_list() {
    let server = MockServer::start_async().await;
    let body = snapshot_with("[]");
    let _m = server
        .mock_async(|when, then| {
            when.method(GET).path("/snapshot");
            then.status(200)
                .header("content-type", "application/json")
                .body(body);
        })
        .await;

    Command::cargo_bin("devmon-cli")
        .unwrap()
        .args(["--url", &server.base_url(), "processes"])
        .assert()
        .success()
        .stdout(predicates::str::contains("no watched processes"));
}

#[tokio::test]
async fn default_command_prints_metrics() {
    let server = MockServer::start_async().await;
    let body = snapshot_with("[]");
    let _m = server
        .mock_async(|when, then| {
            when.method(GET).path("/snapshot");
            then.status(200)
                .header("content-type", "application/json")
                .body(body);
        })
        .await;

    Command::cargo_bin("devmon-cli")
        .unwrap()
        .args(["--url", &server.base_url()])
        .assert()
        .success()
        .stdout(predicates::str::contains("disk 5.00/10.00 GB"));
}
