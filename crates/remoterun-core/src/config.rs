// remote-run Connection Profile
// author: kodeholic
//
// .env 형식 설정 파일 → ConnectionProfile
// 프로세스 환경변수를 건드리지 않고 값으로만 반환 (set_var 없음)
//
// 인식하는 키:
//   HOSTNAME (필수), PORT (기본 22), USERNAME, PASSWORD,
//   SSH_KEY, SSH_KEY_PASSPHRASE, HOST_KEY_POLICY, KNOWN_HOSTS

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::utils::expand_home;

pub const DEFAULT_CONFIG_FILE: &str = ".env";
pub const DEFAULT_PORT: u16 = 22;

/// 호스트키 검증 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostKeyPolicy {
    /// 어떤 호스트키든 신뢰 (기존 동작, 보안상 취약)
    #[default]
    AcceptAny,
    /// known_hosts 기반 TOFU: 처음 보는 키는 기록, 바뀐 키는 거부
    KnownHosts,
}

impl FromStr for HostKeyPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept-any" | "accept" | "any" => Ok(HostKeyPolicy::AcceptAny),
            "known-hosts" | "known_hosts" | "tofu" => Ok(HostKeyPolicy::KnownHosts),
            other => Err(Error::ConfigInvalid(format!(
                "HOST_KEY_POLICY must be 'accept-any' or 'known-hosts', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub key_passphrase: Option<String>,
    pub host_key_policy: HostKeyPolicy,
    pub known_hosts_path: Option<PathBuf>,
}

/// 인증 수단 (우선순위: 개인키 > 비밀번호 > 기본 동작)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth<'a> {
    PublicKey { private_key_path: &'a Path, passphrase: Option<&'a str> },
    Password(&'a str),
    Default,
}

impl ConnectionProfile {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn auth(&self) -> Auth<'_> {
        if let Some(path) = &self.private_key_path {
            Auth::PublicKey {
                private_key_path: path,
                passphrase: self.key_passphrase.as_deref(),
            }
        } else if let Some(pw) = &self.password {
            Auth::Password(pw)
        } else {
            Auth::Default
        }
    }
}

/// 설정 파일 로드
///
/// - 파일 없음         → ConfigNotFound
/// - HOSTNAME 없음/빈값 → ConfigInvalid
pub fn load(path: impl AsRef<Path>) -> Result<ConnectionProfile> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }

    tracing::debug!("[config] loading {}", path.display());

    let iter = dotenvy::from_path_iter(path).map_err(|e| config_error(path, e))?;
    let mut pairs = Vec::new();
    for item in iter {
        pairs.push(item.map_err(|e| config_error(path, e))?);
    }
    parse(pairs)
}

/// key/value 목록 → ConnectionProfile (파일 IO 없음, 테스트 용이)
///
/// 같은 키가 여러 번 나오면 마지막 값이 이긴다.
pub fn parse<I, K, V>(pairs: I) -> Result<ConnectionProfile>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut host = None;
    let mut port = None;
    let mut username = None;
    let mut password = None;
    let mut ssh_key = None;
    let mut key_passphrase = None;
    let mut host_key_policy = None;
    let mut known_hosts = None;

    for (key, value) in pairs {
        let value = value.into();
        match key.as_ref() {
            "HOSTNAME"           => host = Some(value),
            "PORT"               => port = Some(value),
            "USERNAME"           => username = Some(value),
            "PASSWORD"           => password = Some(value),
            "SSH_KEY"            => ssh_key = Some(value),
            "SSH_KEY_PASSPHRASE" => key_passphrase = Some(value),
            "HOST_KEY_POLICY"    => host_key_policy = Some(value),
            "KNOWN_HOSTS"        => known_hosts = Some(value),
            other => tracing::debug!("[config] ignoring unknown key {}", other),
        }
    }

    let host = non_empty(host)
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::ConfigInvalid("HOSTNAME is not set".to_string()))?;

    let port = match non_empty(port) {
        None => DEFAULT_PORT,
        Some(p) => p.trim().parse::<u16>()
            .ok()
            .filter(|n| *n != 0)
            .ok_or_else(|| Error::ConfigInvalid(format!("PORT is not a valid port number: '{}'", p)))?,
    };

    let host_key_policy = match non_empty(host_key_policy) {
        Some(p) => p.parse()?,
        None    => HostKeyPolicy::default(),
    };

    Ok(ConnectionProfile {
        host,
        port,
        username: username.unwrap_or_default(),
        password: non_empty(password),
        private_key_path: non_empty(ssh_key).map(|k| expand_home(&k)),
        key_passphrase: non_empty(key_passphrase),
        host_key_policy,
        known_hosts_path: non_empty(known_hosts).map(|k| expand_home(&k)),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn config_error(path: &Path, e: dotenvy::Error) -> Error {
    match e {
        dotenvy::Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            Error::ConfigNotFound(path.to_path_buf())
        }
        other => Error::ConfigInvalid(format!("{}: {}", path.display(), other)),
    }
}
