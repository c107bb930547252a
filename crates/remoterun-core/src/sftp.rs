// remote-run SFTP (russh-sftp 기반)
// author: kodeholic
//
// Transferred : put/get 결과 (실제 경로 + 바이트 수)
// SftpClient  : put, get, close
//
// 이어받기/진척률 없음: 매번 처음부터 전체 전송

use std::path::{Path, PathBuf};

use russh_sftp::client::error::Error as SftpError;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::{OpenFlags, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::{Error, Result};

const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// put/get 전송 결과
///
/// source/destination 은 "/" 로 끝나는 디렉토리 대상을 파일명까지 붙여 해석한 경로
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transferred {
    pub source: String,
    pub destination: String,
    pub bytes: u64,
}

pub struct SftpClient {
    sftp: SftpSession,
}

impl SftpClient {
    pub fn new(sftp: SftpSession) -> Self {
        Self { sftp }
    }

    /// 로컬 파일 업로드 (항상 덮어쓰기)
    pub async fn put(&mut self, local: &Path, remote: &str) -> Result<Transferred> {
        let mut local_file = tokio::fs::File::open(local).await
            .map_err(|_| Error::LocalFileNotFound(local.to_path_buf()))?;
        if local_file.metadata().await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(Error::LocalFileNotFound(local.to_path_buf()));
        }

        let remote_path = remote_target(local, remote);
        tracing::debug!("[sftp] put {} -> {}", local.display(), remote_path);

        let mut remote_file = self.sftp
            .open_with_flags(remote_path.as_str(), OpenFlags::CREATE | OpenFlags::WRITE | OpenFlags::TRUNCATE)
            .await
            .map_err(|e| remote_error(&remote_path, e))?;

        let mut buf         = vec![0u8; CHUNK_SIZE];
        let mut transferred = 0u64;

        loop {
            let n = local_file.read(&mut buf).await
                .map_err(|_| Error::LocalFileNotFound(local.to_path_buf()))?;
            if n == 0 { break; }

            remote_file.write_all(&buf[..n]).await
                .map_err(|e| Error::RemoteTransferError(format!("{}: {}", remote_path, e)))?;
            transferred += n as u64;
        }

        // shutdown 시 핸들이 닫히며 서버측 쓰기 실패가 드러남
        remote_file.shutdown().await
            .map_err(|e| Error::RemoteTransferError(format!("{}: {}", remote_path, e)))?;

        Ok(Transferred {
            source: local.display().to_string(),
            destination: remote_path,
            bytes: transferred,
        })
    }

    /// 리모트 파일 다운로드 (항상 덮어쓰기)
    ///
    /// 리모트 파일을 먼저 연다 → 없는 파일이면 로컬에 빈 파일을 만들지 않음
    pub async fn get(&mut self, remote: &str, local: &Path) -> Result<Transferred> {
        let mut remote_file = self.sftp
            .open_with_flags(remote, OpenFlags::READ)
            .await
            .map_err(|e| remote_error(remote, e))?;

        let local_path = local_target(remote, local);
        tracing::debug!("[sftp] get {} -> {}", remote, local_path.display());

        let write_error = |source: std::io::Error| Error::LocalWriteError { path: local_path.clone(), source };

        let mut local_file = tokio::fs::File::create(&local_path).await
            .map_err(write_error)?;

        let mut buf         = vec![0u8; CHUNK_SIZE];
        let mut transferred = 0u64;

        loop {
            let n = remote_file.read(&mut buf).await
                .map_err(|e| Error::RemoteTransferError(format!("{}: {}", remote, e)))?;
            if n == 0 { break; }

            local_file.write_all(&buf[..n]).await
                .map_err(write_error)?;
            transferred += n as u64;
        }

        local_file.flush().await.map_err(write_error)?;

        Ok(Transferred {
            source: remote.to_string(),
            destination: local_path.display().to_string(),
            bytes: transferred,
        })
    }

    /// SFTP 채널 종료. 실패해도 세션에는 영향 없음 → 로그만
    pub async fn close(self) {
        if let Err(e) = self.sftp.close().await {
            tracing::debug!("[sftp] close failed: {}", e);
        }
    }
}

fn remote_error(path: &str, e: SftpError) -> Error {
    match e {
        SftpError::Status(status) if status.status_code == StatusCode::NoSuchFile => {
            Error::RemoteFileNotFound(path.to_string())
        }
        SftpError::Status(status) => {
            Error::RemoteTransferError(format!("{}: {:?} {}", path, status.status_code, status.error_message))
        }
        other => Error::RemoteTransferError(format!("{}: {}", path, other)),
    }
}

/// 리모트 대상이 "/" 로 끝나면 디렉토리로 보고 로컬 파일명을 붙인다
///
/// ("a/b.txt", "/tmp/") → "/tmp/b.txt"
pub fn remote_target(local: &Path, remote: &str) -> String {
    match (remote.ends_with('/'), local.file_name()) {
        (true, Some(name)) => format!("{}{}", remote, name.to_string_lossy()),
        _ => remote.to_string(),
    }
}

/// 로컬 대상이 디렉토리(또는 구분자로 끝남)면 리모트 파일명을 붙인다
///
/// ("/var/log/app.log", "./logs/") → "./logs/app.log"
pub fn local_target(remote: &str, local: &Path) -> PathBuf {
    let looks_like_dir = local.is_dir()
        || local.as_os_str().to_string_lossy().ends_with(std::path::MAIN_SEPARATOR)
        || local.as_os_str().to_string_lossy().ends_with('/');

    match extract_filename(remote) {
        Some(name) if looks_like_dir => local.join(name),
        _ => local.to_path_buf(),
    }
}

/// 경로에서 파일명만 추출 ("/remote/path/file.txt" → "file.txt")
fn extract_filename(path: &str) -> Option<&str> {
    path.rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use russh_sftp::protocol::Status;

    fn status(code: StatusCode) -> SftpError {
        SftpError::Status(Status {
            id: 1,
            status_code: code,
            error_message: "message".to_string(),
            language_tag: "en-US".to_string(),
        })
    }

    #[test]
    fn remote_target_appends_file_name_for_directories() {
        assert_eq!(remote_target(Path::new("dir/a.txt"), "/tmp/"), "/tmp/a.txt");
        assert_eq!(remote_target(Path::new("a.txt"), "/tmp/b.txt"), "/tmp/b.txt");
    }

    #[test]
    fn local_target_appends_file_name_for_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(local_target("/var/log/app.log", dir.path()), dir.path().join("app.log"));
        assert_eq!(local_target("/var/log/app.log", Path::new("out/")), Path::new("out/app.log"));
        assert_eq!(local_target("/var/log/app.log", Path::new("copy.log")), Path::new("copy.log"));
        // 파일명이 없는 리모트 경로는 그대로
        assert_eq!(local_target("/var/log/", dir.path()), dir.path().to_path_buf());
    }

    #[test]
    fn no_such_file_maps_to_remote_file_not_found() {
        match remote_error("/missing", status(StatusCode::NoSuchFile)) {
            Error::RemoteFileNotFound(p) => assert_eq!(p, "/missing"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn other_statuses_map_to_transfer_error() {
        assert!(matches!(
            remote_error("/root/x", status(StatusCode::PermissionDenied)),
            Error::RemoteTransferError(_)
        ));
        assert!(matches!(
            remote_error("/x", SftpError::Timeout),
            Error::RemoteTransferError(_)
        ));
    }
}
