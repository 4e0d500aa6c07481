//! Unit tests for the Docker facade.

#![allow(clippy::expect_used)]

use crate::mocks::{ScriptedRunner, exit_outcome, ok_outcome};
use opsrun::tools::docker::{BuildParams, Docker, RunParams};

#[tokio::test]
async fn test_check_daemon_fails_when_daemon_down() {
    let runner = ScriptedRunner::new(vec![Ok(exit_outcome(
        1,
        b"Cannot connect to the Docker daemon",
    ))]);
    assert!(Docker::new(&runner).check_daemon().await.is_err());
}

#[tokio::test]
async fn test_images_splits_lines() {
    let runner = ScriptedRunner::new(vec![Ok(ok_outcome(
        b"nginx:latest abc123\nalpine:3.20 def456\n",
    ))]);
    let images = Docker::new(&runner).images().await.expect("images");
    assert_eq!(images, vec!["nginx:latest abc123", "alpine:3.20 def456"]);
}

#[tokio::test]
async fn test_build_renders_build_args() {
    let runner = ScriptedRunner::new(vec![Ok(ok_outcome(b""))]);
    let mut params = BuildParams::new("myapp:latest", "./ctx");
    params.build_args = vec![("VERSION".to_string(), "1.2.3".to_string())];
    Docker::new(&runner).build(&params).await.expect("build");
    assert_eq!(
        runner.calls(),
        vec!["docker build -t myapp:latest --build-arg VERSION=1.2.3 ./ctx"]
    );
}

#[tokio::test]
async fn test_run_detached_returns_trimmed_container_id() {
    let runner = ScriptedRunner::new(vec![Ok(ok_outcome(b"0123456789abcdef\n"))]);
    let mut params = RunParams::new("nginx:latest", "web-under-test");
    params.ports = vec![(8080, 80)];
    let id = Docker::new(&runner)
        .run_detached(&params)
        .await
        .expect("run");
    assert_eq!(id, "0123456789abcdef");
    assert_eq!(
        runner.calls(),
        vec!["docker run -d --name web-under-test -p 8080:80 nginx:latest"]
    );
}

#[tokio::test]
async fn test_remove_always_issues_stop_then_rm() {
    // Teardown of a container that already exited must still remove it.
    let runner = ScriptedRunner::new(vec![
        Ok(exit_outcome(1, b"No such container")),
        Ok(ok_outcome(b"")),
    ]);
    Docker::new(&runner)
        .remove("web-under-test")
        .await
        .expect("remove is best-effort");
    assert_eq!(
        runner.calls(),
        vec!["docker stop web-under-test", "docker rm -f web-under-test"]
    );
}

#[tokio::test]
async fn test_exec_renders_command_after_container_name() {
    let runner = ScriptedRunner::new(vec![Ok(ok_outcome(b"total 0\n"))]);
    Docker::new(&runner)
        .exec("web-under-test", &["ls", "-la", "/app"])
        .await
        .expect("exec");
    assert_eq!(runner.calls(), vec!["docker exec web-under-test ls -la /app"]);
}

#[tokio::test]
async fn test_save_then_load_invocations() {
    let runner = ScriptedRunner::new(vec![Ok(ok_outcome(b"")), Ok(ok_outcome(b""))]);
    let docker = Docker::new(&runner);
    docker
        .save("nginx:latest", std::path::Path::new("nginx.tar"))
        .await
        .expect("save");
    docker
        .load(std::path::Path::new("nginx.tar"))
        .await
        .expect("load");
    assert_eq!(
        runner.calls(),
        vec![
            "docker save -o nginx.tar nginx:latest",
            "docker load -i nginx.tar",
        ]
    );
}

#[tokio::test]
async fn test_exec_in_stopped_container_escalates() {
    let runner = ScriptedRunner::new(vec![Ok(exit_outcome(1, b"container is not running"))]);
    let err = Docker::new(&runner)
        .exec("web-under-test", &["true"])
        .await
        .expect_err("exec must fail");
    assert!(format!("{err:#}").contains("web-under-test"));
}

#[tokio::test]
async fn test_inspect_parses_json_array() {
    let runner = ScriptedRunner::new(vec![Ok(ok_outcome(
        br#"[{"Id": "abc", "State": {"Status": "running"}}]"#,
    ))]);
    let value = Docker::new(&runner).inspect("abc").await.expect("inspect");
    assert_eq!(value[0]["State"]["Status"], "running");
}

#[tokio::test]
async fn test_pull_failure_carries_image_name() {
    let runner = ScriptedRunner::new(vec![Ok(exit_outcome(1, b"manifest unknown"))]);
    let err = Docker::new(&runner)
        .pull("ghost:latest")
        .await
        .expect_err("pull must fail");
    assert!(format!("{err:#}").contains("ghost:latest"));
}
