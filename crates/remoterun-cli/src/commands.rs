// remote-run CLI Commands
// author: kodeholic
//
// 순수 파싱만 담당 (IO 없음, 테스트 용이)
//
// "-f <file>" 은 argv 어디에 있어도 인식 (첫 번째만), 제거한 나머지로 명령 해석
// 단, 명령어(help/version/미지원)는 -f 검사보다 먼저 판정

use std::fmt;
use std::path::PathBuf;

use remoterun_core::config::DEFAULT_CONFIG_FILE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Version,
    Remote(Operation),
}

/// 세션이 필요한 명령 (handler 로 넘어가는 것은 이것뿐)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Upload { local: String, remote: String },
    Download { remote: String, local: String },
    Run { command: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub config_path: PathBuf,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// 인자 없음 → 도움말 출력 후 exit 1
    NoCommand,
    MissingConfigFile,
    InvalidCommand(String),
    MissingArguments,
    MissingCommand,
    TooManyArguments,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::NoCommand          => write!(f, "No command given"),
            ParseError::MissingConfigFile  => write!(f, "Missing file name after -f"),
            ParseError::InvalidCommand(_)  => write!(f, "Invalid command"),
            ParseError::MissingArguments   => write!(f, "Missing arguments"),
            ParseError::MissingCommand     => write!(f, "Missing command"),
            ParseError::TooManyArguments   => write!(f, "Too many arguments"),
        }
    }
}

impl std::error::Error for ParseError {}

/// argv (프로그램 이름 제외) → Invocation
pub fn parse<I, S>(args: I) -> Result<Invocation, ParseError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();

    // 명령어 위치: 맨 앞의 "-f <file>" 한 쌍만 건너뜀
    let name_pos = if args.first().map(String::as_str) == Some("-f") { 2 } else { 0 };
    let Some(name) = args.get(name_pos) else {
        return Err(match args.len() {
            1 => ParseError::MissingConfigFile,
            _ => ParseError::NoCommand,
        });
    };

    match name.as_str() {
        "help" | "version" => {
            // 값 없는 -f 는 무시 (설정 파일을 읽지 않음)
            let config_path = split_config_flag(args.clone())
                .map(|(path, _)| path)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
            let command = if name == "help" { Command::Help } else { Command::Version };
            return Ok(Invocation { config_path, command });
        }
        "upload" | "download" | "run" => {}
        other => return Err(ParseError::InvalidCommand(other.to_string())),
    }

    let (config_path, args) = split_config_flag(args)?;
    let Some((name, rest)) = args.split_first() else {
        return Err(ParseError::NoCommand);
    };

    let operation = match name.as_str() {
        "upload" => {
            let [local, remote] = two_paths(rest)?;
            Operation::Upload { local, remote }
        }
        "download" => {
            let [remote, local] = two_paths(rest)?;
            Operation::Download { remote, local }
        }
        _ => {
            if rest.is_empty() {
                return Err(ParseError::MissingCommand);
            }
            Operation::Run { command: rest.join(" ") }
        }
    };

    Ok(Invocation { config_path, command: Command::Remote(operation) })
}

/// 첫 번째 "-f <file>" 을 제거하고 (설정 경로, 나머지 인자) 반환
fn split_config_flag(mut args: Vec<String>) -> Result<(PathBuf, Vec<String>), ParseError> {
    let config_path = match args.iter().position(|a| a == "-f") {
        Some(pos) => {
            if pos + 1 >= args.len() {
                return Err(ParseError::MissingConfigFile);
            }
            let file = args.remove(pos + 1);
            args.remove(pos);
            PathBuf::from(file)
        }
        None => PathBuf::from(DEFAULT_CONFIG_FILE),
    };
    Ok((config_path, args))
}

fn two_paths(rest: &[String]) -> Result<[String; 2], ParseError> {
    match rest {
        [a, b]          => Ok([a.clone(), b.clone()]),
        [] | [_]        => Err(ParseError::MissingArguments),
        _               => Err(ParseError::TooManyArguments),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(args: &[&str]) -> Result<Invocation, ParseError> {
        parse(args.iter().copied())
    }

    fn run(command: &str) -> Command {
        Command::Remote(Operation::Run { command: command.to_string() })
    }

    #[test]
    fn no_arguments_means_no_command() {
        assert_eq!(cmd(&[]), Err(ParseError::NoCommand));
    }

    #[test]
    fn help_and_version_use_default_config() {
        let inv = cmd(&["help"]).unwrap();
        assert_eq!(inv.command, Command::Help);
        assert_eq!(inv.config_path, PathBuf::from(".env"));

        assert_eq!(cmd(&["version"]).unwrap().command, Command::Version);
    }

    #[test]
    fn config_flag_before_command_is_stripped() {
        let inv = cmd(&["-f", "custom.env", "upload", "a.txt", "/tmp/a.txt"]).unwrap();
        assert_eq!(inv.config_path, PathBuf::from("custom.env"));
        assert_eq!(
            inv.command,
            Command::Remote(Operation::Upload { local: "a.txt".into(), remote: "/tmp/a.txt".into() })
        );
    }

    #[test]
    fn config_flag_anywhere_is_stripped() {
        let inv = cmd(&["download", "/var/log/x.log", "-f", "prod.env", "x.log"]).unwrap();
        assert_eq!(inv.config_path, PathBuf::from("prod.env"));
        assert_eq!(
            inv.command,
            Command::Remote(Operation::Download { remote: "/var/log/x.log".into(), local: "x.log".into() })
        );

        let inv = cmd(&["run", "ls", "-la", "-f", "prod.env"]).unwrap();
        assert_eq!(inv.command, run("ls -la"));
    }

    #[test]
    fn only_first_config_flag_is_consumed() {
        let inv = cmd(&["-f", "a.env", "run", "grep", "-f", "patterns"]).unwrap();
        assert_eq!(inv.config_path, PathBuf::from("a.env"));
        assert_eq!(inv.command, run("grep -f patterns"));
    }

    #[test]
    fn config_flag_without_value() {
        assert_eq!(cmd(&["upload", "a", "b", "-f"]), Err(ParseError::MissingConfigFile));
        assert_eq!(
            ParseError::MissingConfigFile.to_string(),
            "Missing file name after -f"
        );
    }

    #[test]
    fn config_flag_alone_leaves_no_command() {
        assert_eq!(cmd(&["-f", "x.env"]), Err(ParseError::NoCommand));
    }

    #[test]
    fn run_joins_remaining_arguments() {
        let inv = cmd(&["run", "echo", "hello", "world"]).unwrap();
        assert_eq!(inv.command, run("echo hello world"));

        let inv = cmd(&["run", "echo hello"]).unwrap();
        assert_eq!(inv.command, run("echo hello"));
    }

    #[test]
    fn argument_count_errors() {
        assert_eq!(cmd(&["upload", "a.txt"]), Err(ParseError::MissingArguments));
        assert_eq!(cmd(&["download"]), Err(ParseError::MissingArguments));
        assert_eq!(cmd(&["upload", "a", "b", "c"]), Err(ParseError::TooManyArguments));
        assert_eq!(cmd(&["run"]), Err(ParseError::MissingCommand));
    }

    #[test]
    fn unknown_command_is_invalid() {
        let err = cmd(&["delete", "x"]).unwrap_err();
        assert_eq!(err, ParseError::InvalidCommand("delete".into()));
        assert_eq!(err.to_string(), "Invalid command");
    }

    #[test]
    fn command_word_is_judged_before_dangling_config_flag() {
        let inv = cmd(&["help", "-f"]).unwrap();
        assert_eq!(inv.command, Command::Help);
        assert_eq!(inv.config_path, PathBuf::from(".env"));

        assert_eq!(cmd(&["version", "-f"]).unwrap().command, Command::Version);
        assert_eq!(
            cmd(&["bogus", "-f"]),
            Err(ParseError::InvalidCommand("bogus".into()))
        );
    }

    #[test]
    fn config_flag_is_kept_for_help() {
        let inv = cmd(&["-f", "x.env", "help"]).unwrap();
        assert_eq!(inv.command, Command::Help);
        assert_eq!(inv.config_path, PathBuf::from("x.env"));
    }

    #[test]
    fn lone_config_flag_is_missing_file_name() {
        assert_eq!(cmd(&["-f"]), Err(ParseError::MissingConfigFile));
    }

    #[test]
    fn informational_commands_never_reach_the_session() {
        for args in [&["help"][..], &["version"][..], &["-f", "x.env", "version"][..]] {
            assert!(!matches!(cmd(args).unwrap().command, Command::Remote(_)), "{:?}", args);
        }
    }
}
