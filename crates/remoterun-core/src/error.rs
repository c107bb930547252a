// remote-run Error Types
// author: kodeholic
//
// thiserror 없이 직접 구현
// Display: 사용자에게 그대로 한 줄로 출력되는 메시지
// From<io::Error>: ? 연산자로 IO 에러 자동 변환

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    // ---- 설정 ----
    ConfigNotFound(PathBuf),
    ConfigInvalid(String),
    // ---- 연결/인증 ----
    ConnectionFailed(String),
    AuthenticationFailed(String),
    // ---- 전송 ----
    LocalFileNotFound(PathBuf),
    RemoteFileNotFound(String),
    LocalWriteError { path: PathBuf, source: std::io::Error },
    RemoteTransferError(String),
    // ---- 원격 명령 ----
    CommandFailed(String),
    SessionClosed,
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigNotFound(p)               => write!(f, "{} not found", p.display()),
            Error::ConfigInvalid(s)                => write!(f, "Invalid configuration: {}", s),
            Error::ConnectionFailed(s)             => write!(f, "Connection failed: {}", s),
            Error::AuthenticationFailed(s)         => write!(f, "Authentication failed: {}", s),
            Error::LocalFileNotFound(p)            => write!(f, "Local file not found: {}", p.display()),
            Error::RemoteFileNotFound(p)           => write!(f, "Remote file not found: {}", p),
            Error::LocalWriteError { path, source } => write!(f, "Cannot write {}: {}", path.display(), source),
            Error::RemoteTransferError(s)          => write!(f, "Remote transfer failed: {}", s),
            Error::CommandFailed(s)                => write!(f, "Remote command failed: {}", s),
            Error::SessionClosed                   => write!(f, "Session is closed"),
            Error::Io(e)                           => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::LocalWriteError { source, .. } => Some(source),
            Error::Io(e)                          => Some(e),
            _                                     => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
