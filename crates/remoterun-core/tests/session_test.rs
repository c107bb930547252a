// remote-run Session integration tests
// author: kodeholic
//
// localhost sshd 에 키 인증으로 접속 가능할 때만 실행, 아니면 건너뜀
// (put/get 복사 로직은 sftp_test.rs 에서 sshd 없이 항상 검증)

use std::process::Command;

use remoterun_core::config::parse;
use remoterun_core::state::{NoopObserver, SessionState};
use remoterun_core::{ConnectionProfile, Error, Session};

/// ssh localhost 가 비밀번호 없이 되는지 확인
fn can_ssh_to_localhost() -> bool {
    let output = Command::new("ssh")
        .args([
            "-o", "ConnectTimeout=2",
            "-o", "StrictHostKeyChecking=no",
            "-o", "UserKnownHostsFile=/dev/null",
            "-o", "PasswordAuthentication=no",
            "-o", "BatchMode=yes",
            "localhost",
            "echo",
            "test",
        ])
        .output();

    matches!(output, Ok(result) if result.status.success())
}

/// 자격 증명 없이 → ssh-agent 또는 ~/.ssh 기본 키로 인증
fn localhost_profile() -> ConnectionProfile {
    parse([("HOSTNAME", "localhost")]).unwrap()
}

async fn open_localhost() -> Session {
    Session::open(&localhost_profile(), Box::new(NoopObserver))
        .await
        .expect("open localhost session")
}

#[tokio::test]
async fn run_command_captures_stdout_and_stderr() {
    if !can_ssh_to_localhost() {
        eprintln!("Skipping integration test: Cannot SSH to localhost");
        return;
    }

    let mut session = open_localhost().await;

    let out = session.run_command("echo hello").await.unwrap();
    assert_eq!(out.stdout, "hello\n");
    assert_eq!(out.stderr, "");
    assert_eq!(out.exit_status, Some(0));

    let out = session.run_command("echo oops >&2; exit 3").await.unwrap();
    assert_eq!(out.stdout, "");
    assert_eq!(out.stderr, "oops\n");
    assert_eq!(out.exit_status, Some(3));

    session.close().await;
    session.close().await;
    assert_eq!(*session.state(), SessionState::Closed);
}

#[tokio::test]
async fn upload_then_download_round_trip() {
    if !can_ssh_to_localhost() {
        eprintln!("Skipping integration test: Cannot SSH to localhost");
        return;
    }

    let local_dir = tempfile::tempdir().unwrap();
    let remote_dir = tempfile::tempdir().unwrap();

    // 청크 경계를 넘는 크기 + 모든 바이트 값
    let original: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let source = local_dir.path().join("payload.bin");
    std::fs::write(&source, &original).unwrap();

    let remote = remote_dir.path().join("payload.bin");
    let remote = remote.to_str().unwrap();
    let copy = local_dir.path().join("copy.bin");

    let mut session = open_localhost().await;

    let up = session.upload(&source, remote).await.unwrap();
    assert_eq!(up.bytes, original.len() as u64);
    assert_eq!(up.destination, remote);

    let down = session.download(remote, &copy).await.unwrap();
    assert_eq!(down.bytes, original.len() as u64);

    session.close().await;

    assert_eq!(std::fs::read(&copy).unwrap(), original);
}

#[tokio::test]
async fn upload_into_remote_directory_keeps_file_name() {
    if !can_ssh_to_localhost() {
        eprintln!("Skipping integration test: Cannot SSH to localhost");
        return;
    }

    let local_dir = tempfile::tempdir().unwrap();
    let remote_dir = tempfile::tempdir().unwrap();
    let source = local_dir.path().join("notes.txt");
    std::fs::write(&source, b"notes").unwrap();

    let target = format!("{}/", remote_dir.path().display());

    let mut session = open_localhost().await;
    let up = session.upload(&source, &target).await.unwrap();
    session.close().await;

    assert_eq!(up.destination, format!("{}notes.txt", target));
    assert_eq!(std::fs::read(remote_dir.path().join("notes.txt")).unwrap(), b"notes");
}

#[tokio::test]
async fn transfer_errors_are_classified() {
    if !can_ssh_to_localhost() {
        eprintln!("Skipping integration test: Cannot SSH to localhost");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let mut session = open_localhost().await;

    let missing_local = dir.path().join("does-not-exist.txt");
    let err = session.upload(&missing_local, "/tmp/never-written.txt").await.unwrap_err();
    assert!(matches!(err, Error::LocalFileNotFound(_)), "{:?}", err);

    let missing_remote = dir.path().join("also-missing.txt");
    let err = session
        .download(missing_remote.to_str().unwrap(), dir.path().join("out.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RemoteFileNotFound(_)), "{:?}", err);
    assert!(!dir.path().join("out.txt").exists());

    // 세션은 실패 후에도 계속 사용 가능
    let out = session.run_command("echo still-open").await.unwrap();
    assert_eq!(out.stdout, "still-open\n");

    session.close().await;
}

#[tokio::test]
async fn unreachable_port_is_a_connection_error() {
    // 포트 1 은 보통 닫혀 있음 → 즉시 거부
    let profile = parse([("HOSTNAME", "127.0.0.1"), ("PORT", "1")]).unwrap();
    match Session::open(&profile, Box::new(NoopObserver)).await {
        Err(Error::ConnectionFailed(msg)) => assert!(msg.contains("127.0.0.1:1")),
        Err(other) => panic!("expected ConnectionFailed, got {:?}", other),
        Ok(_) => panic!("expected ConnectionFailed, got an open session"),
    }
}
