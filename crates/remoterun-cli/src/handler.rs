// remote-run CLI Handler
// author: kodeholic
//
// 설정 로드 → 세션 open → 명령 하나 실행 → 세션 close
// close 는 명령 성공/실패와 관계없이 반드시 한 번 실행

use std::path::Path;

use remoterun_core::error::Result;
use remoterun_core::session::Session;
use remoterun_core::state::{SessionObserver, SessionState};
use remoterun_core::utils::fmt_size;
use remoterun_core::CommandOutput;

use crate::commands::Operation;

struct CliObserver;

impl SessionObserver for CliObserver {
    fn on_state_changed(&self, _prev: &SessionState, next: &SessionState) {
        if *next == SessionState::Closed {
            println!("Connection closed");
        }
    }
}

pub async fn run(config_path: &Path, operation: Operation) -> Result<()> {
    let profile = remoterun_core::load(config_path)?;

    let mut session = Session::open(&profile, Box::new(CliObserver)).await?;
    let result = dispatch(&mut session, operation).await;
    session.close().await;
    result
}

async fn dispatch(session: &mut Session, operation: Operation) -> Result<()> {
    match operation {
        Operation::Upload { local, remote } => {
            let t = session.upload(&local, &remote).await?;
            println!("Uploaded {} to {} ({})", t.source, t.destination, fmt_size(t.bytes));
        }
        Operation::Download { remote, local } => {
            let t = session.download(&remote, &local).await?;
            println!("Downloaded {} to {} ({})", t.source, t.destination, fmt_size(t.bytes));
        }
        Operation::Run { command } => {
            let output = session.run_command(&command).await?;
            print_output(&output);
        }
    }
    Ok(())
}

/// 원격 종료 코드는 출력하지 않음 (debug 로그로만)
fn print_output(output: &CommandOutput) {
    if !output.stdout.is_empty() {
        println!("Output: {}", output.stdout);
    }
    if !output.stderr.is_empty() {
        println!("Error: {}", output.stderr);
    }
    tracing::debug!("remote exit status: {:?}", output.exit_status);
}
