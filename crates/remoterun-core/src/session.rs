// remote-run Session (russh 기반)
// author: kodeholic
//
// russh로 SSH 연결/인증을 처리하고
// 연결 하나 위에서 upload / download / run_command 중 하나를 수행한 뒤 close
//
// 인증 우선순위: SSH_KEY > PASSWORD > ssh-agent > 기본 키(~/.ssh/id_*) → none

use std::path::{Path, PathBuf};
use std::sync::Arc;

use russh::client;
#[cfg(unix)]
use russh::keys::agent::client::AgentClient;
use russh::Disconnect;
use russh_sftp::client::SftpSession as RusshSftpSession;

use crate::config::{Auth, ConnectionProfile, HostKeyPolicy};
use crate::error::{Error, Result};
use crate::exec::{self, CommandOutput};
use crate::sftp::{SftpClient, Transferred};
use crate::state::{SessionObserver, SessionState};
use crate::utils::local_username;

/// PASSWORD/SSH_KEY 둘 다 없을 때 시도하는 기본 키 (ssh 클라이언트와 같은 순서)
const DEFAULT_KEY_NAMES: [&str; 3] = ["id_ed25519", "id_ecdsa", "id_rsa"];

// russh 클라이언트 핸들러 (호스트키 검증)
struct ClientHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    known_hosts: Option<PathBuf>,
}

impl ClientHandler {
    fn new(profile: &ConnectionProfile) -> Self {
        Self {
            host: profile.host.clone(),
            port: profile.port,
            policy: profile.host_key_policy,
            known_hosts: profile.known_hosts_path.clone(),
        }
    }

    fn known_hosts_path(&self) -> Option<PathBuf> {
        self.known_hosts.clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(".ssh").join("known_hosts")))
    }

    /// TOFU: 알려진 키 → 통과, 처음 보는 키 → 기록 후 통과, 바뀐 키 → 거부
    fn verify_known_host(&self, key: &russh::keys::key::PublicKey) -> bool {
        let Some(path) = self.known_hosts_path() else {
            tracing::warn!("[session] no home directory, cannot locate known_hosts");
            return false;
        };

        match russh::keys::check_known_hosts_path(&self.host, self.port, key, &path) {
            Ok(true) => true,
            Ok(false) => {
                tracing::info!("[session] new host key for {}, adding to {}", self.host, path.display());
                if let Err(e) = russh::keys::learn_known_hosts_path(&self.host, self.port, key, &path) {
                    tracing::warn!("[session] could not record host key: {}", e);
                }
                true
            }
            Err(e) => {
                tracing::warn!("[session] host key for {} rejected: {}", self.host, e);
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.policy {
            HostKeyPolicy::AcceptAny  => Ok(true),
            HostKeyPolicy::KnownHosts => Ok(self.verify_known_host(server_public_key)),
        }
    }
}

/// 인증된 SSH 연결 하나
///
/// close()는 멱등: 두 번째 호출부터는 아무것도 하지 않음
pub struct Session {
    handle: Option<client::Handle<ClientHandler>>,
    state: SessionState,
    observer: Box<dyn SessionObserver>,
}

impl Session {
    pub async fn open(profile: &ConnectionProfile, observer: Box<dyn SessionObserver>) -> Result<Self> {
        let addr = profile.addr();
        tracing::info!("[session] connecting to {}", addr);
        if profile.host_key_policy == HostKeyPolicy::AcceptAny {
            tracing::info!("[session] host key verification disabled (HOST_KEY_POLICY=accept-any)");
        }

        let russh_config = Arc::new(client::Config::default());
        let handler = ClientHandler::new(profile);

        let mut ssh = client::connect(russh_config, (profile.host.as_str(), profile.port), handler)
            .await
            .map_err(|e| Error::ConnectionFailed(format!("{}: {}", addr, e)))?;

        let username = if profile.username.is_empty() {
            local_username().unwrap_or_default()
        } else {
            profile.username.clone()
        };

        // 인증 실패 시 ssh 핸들이 drop 되면서 연결도 끊김
        authenticate(&mut ssh, &username, profile.auth()).await?;

        tracing::info!("[session] authenticated as {}@{}", username, addr);
        Ok(Self {
            handle: Some(ssh),
            state: SessionState::Open,
            observer,
        })
    }

    pub fn state(&self) -> &SessionState { &self.state }

    fn transition(&mut self, next: SessionState) -> bool {
        if !self.state.can_transition_to(&next) {
            return false;
        }
        let prev = std::mem::replace(&mut self.state, next);
        self.observer.on_state_changed(&prev, &self.state);
        true
    }

    fn handle(&self) -> Result<&client::Handle<ClientHandler>> {
        match (&self.state, &self.handle) {
            (SessionState::Open, Some(h)) => Ok(h),
            _ => Err(Error::SessionClosed),
        }
    }

    async fn open_sftp(&self) -> Result<SftpClient> {
        let channel = self.handle()?
            .channel_open_session()
            .await
            .map_err(|e| Error::RemoteTransferError(format!("cannot open channel: {}", e)))?;

        channel.request_subsystem(true, "sftp")
            .await
            .map_err(|e| Error::RemoteTransferError(format!("sftp subsystem unavailable: {}", e)))?;

        let sftp = RusshSftpSession::new(channel.into_stream())
            .await
            .map_err(|e| Error::RemoteTransferError(format!("sftp handshake failed: {}", e)))?;

        Ok(SftpClient::new(sftp))
    }

    /// 로컬 → 리모트. SFTP 채널은 성공/실패와 관계없이 닫힘
    pub async fn upload(&mut self, local: impl AsRef<Path>, remote: &str) -> Result<Transferred> {
        let mut sftp = self.open_sftp().await?;
        let result = sftp.put(local.as_ref(), remote).await;
        sftp.close().await;
        result
    }

    /// 리모트 → 로컬
    pub async fn download(&mut self, remote: &str, local: impl AsRef<Path>) -> Result<Transferred> {
        let mut sftp = self.open_sftp().await?;
        let result = sftp.get(remote, local.as_ref()).await;
        sftp.close().await;
        result
    }

    pub async fn run_command(&mut self, command: &str) -> Result<CommandOutput> {
        exec::exec(self.handle()?, command).await
    }

    /// 연결 종료. 실패하지 않으며 여러 번 불러도 안전
    pub async fn close(&mut self) {
        if !self.state.is_open() {
            tracing::debug!("[session] close() on closed session ignored");
            return;
        }

        if let Some(ssh) = self.handle.take() {
            if let Err(e) = ssh.disconnect(Disconnect::ByApplication, "", "English").await {
                tracing::debug!("[session] disconnect failed: {}", e);
            }
        }
        self.transition(SessionState::Closed);
        tracing::info!("[session] closed");
    }

    #[cfg(test)]
    pub(crate) fn detached(observer: Box<dyn SessionObserver>) -> Self {
        Self { handle: None, state: SessionState::Open, observer }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state.is_open() {
            tracing::warn!("[session] dropped without close(), connection torn down");
        }
    }
}

async fn authenticate(
    ssh: &mut client::Handle<ClientHandler>,
    username: &str,
    auth: Auth<'_>,
) -> Result<()> {
    let authed = match auth {
        Auth::PublicKey { private_key_path, passphrase } => {
            let key = russh::keys::load_secret_key(private_key_path, passphrase)
                .map_err(|e| Error::AuthenticationFailed(
                    format!("cannot load key {}: {}", private_key_path.display(), e)
                ))?;
            ssh.authenticate_publickey(username, Arc::new(key))
                .await
                .map_err(|e| Error::AuthenticationFailed(e.to_string()))?
        }
        Auth::Password(pw) => {
            ssh.authenticate_password(username, pw)
                .await
                .map_err(|e| Error::AuthenticationFailed(e.to_string()))?
        }
        Auth::Default => authenticate_default(ssh, username).await?,
    };

    if !authed {
        return Err(Error::AuthenticationFailed(format!("server rejected credentials for '{}'", username)));
    }
    Ok(())
}

/// 자격 증명이 없을 때: ssh-agent → ~/.ssh 기본 키 차례로 시도, 모두 실패하면 none
async fn authenticate_default(ssh: &mut client::Handle<ClientHandler>, username: &str) -> Result<bool> {
    if authenticate_agent(ssh, username).await {
        return Ok(true);
    }

    for path in default_key_paths() {
        let key = match russh::keys::load_secret_key(&path, None) {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!("[session] skipping {}: {}", path.display(), e);
                continue;
            }
        };
        tracing::debug!("[session] trying default key {}", path.display());
        if ssh.authenticate_publickey(username, Arc::new(key))
            .await
            .map_err(|e| Error::AuthenticationFailed(e.to_string()))?
        {
            return Ok(true);
        }
    }

    ssh.authenticate_none(username)
        .await
        .map_err(|e| Error::AuthenticationFailed(e.to_string()))
}

/// SSH_AUTH_SOCK 의 agent 가 가진 키를 차례로 시도
///
/// agent 가 없거나 응답이 이상하면 조용히 다음 단계로 (false)
#[cfg(unix)]
async fn authenticate_agent(ssh: &mut client::Handle<ClientHandler>, username: &str) -> bool {
    let Some(mut agent) = open_agent(std::env::var_os("SSH_AUTH_SOCK")).await else {
        return false;
    };

    let identities = match agent.request_identities().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::debug!("[session] agent identities unavailable: {}", e);
            return false;
        }
    };
    tracing::debug!("[session] agent offers {} key(s)", identities.len());

    for identity in identities {
        let fingerprint = identity.fingerprint();
        let (returned, result) = ssh.authenticate_future(username, identity, agent).await;
        agent = returned;
        match result {
            Ok(true) => {
                tracing::debug!("[session] agent key {} accepted", fingerprint);
                return true;
            }
            Ok(false) => tracing::debug!("[session] agent key {} rejected", fingerprint),
            Err(e)    => tracing::debug!("[session] agent key {} failed: {}", fingerprint, e),
        }
    }
    false
}

#[cfg(not(unix))]
async fn authenticate_agent(_ssh: &mut client::Handle<ClientHandler>, _username: &str) -> bool {
    false
}

#[cfg(unix)]
async fn open_agent(socket: Option<std::ffi::OsString>) -> Option<AgentClient<tokio::net::UnixStream>> {
    let Some(socket) = socket else {
        tracing::debug!("[session] SSH_AUTH_SOCK not set, skipping agent");
        return None;
    };
    match AgentClient::connect_uds(&socket).await {
        Ok(agent) => Some(agent),
        Err(e) => {
            tracing::debug!("[session] cannot reach agent at {:?}: {}", socket, e);
            None
        }
    }
}

fn default_key_paths() -> Vec<PathBuf> {
    let Some(ssh_dir) = dirs::home_dir().map(|h| h.join(".ssh")) else {
        return Vec::new();
    };
    DEFAULT_KEY_NAMES.iter()
        .map(|name| ssh_dir.join(name))
        .filter(|p| p.is_file())
        .collect()
}
