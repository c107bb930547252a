// remote-run CLI
// author: kodeholic
//
// Usage: remote-run [-f <env file>] <help|version|upload|download|run> [args...]

use std::any::Any;
use std::env;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod handler;

use commands::{Command, ParseError};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_DATE: &str = env!("REMOTE_RUN_BUILD_DATE");

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // RUST_LOG=info  remote-run run uptime   (연결/인증 과정)
    // RUST_LOG=debug remote-run run uptime   (설정 키, 종료 코드 포함)
    // 로그는 stderr 로, stdout 은 결과만
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn"))
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // panic 도 한 줄 에러 + exit 1 로 (위치 정보 없이 메시지만)
    std::panic::set_hook(Box::new(|info| {
        println!("ERROR: {}", panic_message(info.payload()));
        std::process::exit(1);
    }));

    let invocation = match commands::parse(env::args().skip(1)) {
        Ok(inv) => inv,
        Err(ParseError::NoCommand) => {
            print_usage();
            return ExitCode::FAILURE;
        }
        Err(e) => {
            if let ParseError::InvalidCommand(name) = &e {
                tracing::debug!("unknown command '{}'", name);
            }
            println!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match invocation.command {
        Command::Help => {
            print_usage();
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("Remote-Run version: {}", VERSION);
            println!("Date: {}", BUILD_DATE);
            ExitCode::SUCCESS
        }
        Command::Remote(operation) => match handler::run(&invocation.config_path, operation).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                println!("ERROR: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

/// panic payload → 한 줄 메시지
fn panic_message(payload: &(dyn Any + Send)) -> String {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    msg.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join(" ")
}

fn print_usage() {
    println!("remote-run - upload, download and run commands over SSH");
    println!();
    println!("Usage:  remote-run help");
    println!("        remote-run version");
    println!("        remote-run upload <local_path> <remote_path>    Upload a file to the remote server");
    println!("        remote-run download <remote_path> <local_path>  Download a file from the remote server");
    println!("        remote-run run <command> [args...]              Run a command on the remote server");
    println!();
    println!("Connection settings are read from .env in the current directory.");
    println!("Use -f <file> anywhere on the command line to read another file.");
    println!();
    println!("Settings:");
    println!("  HOSTNAME            remote host (required)");
    println!("  PORT                SSH port (default 22)");
    println!("  USERNAME            login name (default: local user)");
    println!("  PASSWORD            password, used when SSH_KEY is not set");
    println!("  SSH_KEY             private key path, ~ is expanded");
    println!("  SSH_KEY_PASSPHRASE  passphrase for SSH_KEY");
    println!("  HOST_KEY_POLICY     accept-any (default) | known-hosts");
    println!("  KNOWN_HOSTS         known_hosts file (default ~/.ssh/known_hosts)");
    println!();
    println!("Example:");
    println!("  remote-run -f example.env upload local.txt /remote/path/");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_is_the_payload_only() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(format!("index {} out of range", 3));
        assert_eq!(panic_message(payload.as_ref()), "index 3 out of range");
    }

    #[test]
    fn panic_message_is_one_line() {
        let payload: Box<dyn Any + Send> = Box::new("first\n  second\n".to_string());
        assert_eq!(panic_message(payload.as_ref()), "first second");
    }

    #[test]
    fn panic_message_for_unknown_payload() {
        let payload: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn panic_message_from_a_real_panic() {
        let payload = std::panic::catch_unwind(|| panic!("disk {} gone", "sda")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "disk sda gone");
    }
}
