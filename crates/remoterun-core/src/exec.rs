// remote-run Remote Command
// author: kodeholic
//
// exec 채널 하나로 명령 실행, stdout/stderr 를 끝까지 모아서 반환 (스트리밍 없음)

use russh::{client, ChannelMsg};

use crate::error::{Error, Result};

/// 원격 명령 실행 결과
///
/// exit_status 는 서버가 보고했을 때만 Some. CLI 종료 코드에는 반영하지 않음
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: Option<u32>,
}

/// ChannelMsg 를 받아 버퍼에 쌓는 수집기
#[derive(Default)]
pub(crate) struct OutputCollector {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_status: Option<u32>,
}

impl OutputCollector {
    pub(crate) fn feed(&mut self, msg: &ChannelMsg) {
        match msg {
            ChannelMsg::Data { data } => self.stdout.extend_from_slice(data),
            // ext == 1 : SSH_EXTENDED_DATA_STDERR
            ChannelMsg::ExtendedData { data, ext: 1 } => self.stderr.extend_from_slice(data),
            // ExitStatus 가 데이터보다 먼저 올 수 있으므로 여기서 끝내지 않음
            ChannelMsg::ExitStatus { exit_status } => self.exit_status = Some(*exit_status),
            _ => {}
        }
    }

    pub(crate) fn finish(self) -> CommandOutput {
        CommandOutput {
            stdout: String::from_utf8_lossy(&self.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
            exit_status: self.exit_status,
        }
    }
}

pub(crate) async fn exec<H: client::Handler>(
    handle: &client::Handle<H>,
    command: &str,
) -> Result<CommandOutput> {
    let mut channel = handle.channel_open_session()
        .await
        .map_err(|e| Error::CommandFailed(e.to_string()))?;

    channel.exec(true, command)
        .await
        .map_err(|e| Error::CommandFailed(e.to_string()))?;

    let mut collector = OutputCollector::default();
    while let Some(msg) = channel.wait().await {
        collector.feed(&msg);
    }

    let output = collector.finish();
    tracing::debug!(
        "[exec] '{}' finished: {} stdout bytes, {} stderr bytes, exit status {:?}",
        command, output.stdout.len(), output.stderr.len(), output.exit_status
    );
    Ok(output)
}
