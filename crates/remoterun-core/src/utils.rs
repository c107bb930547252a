// remote-run Utils
// author: kodeholic
//
// - expand_home    : "~/..." → 홈 디렉토리 기준 절대경로
// - fmt_size       : 바이트 → 사람이 읽기 좋은 단위 (1.2MB 등)
// - local_username : USERNAME 미설정 시 사용할 로컬 로그인 이름

use std::path::PathBuf;

/// 선행 "~" 를 홈 디렉토리로 치환. 홈을 모르면 입력 그대로
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// 바이트 → 사람이 읽기 좋은 단위 문자열
pub fn fmt_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB      { format!("{:.1}GB", bytes as f64 / GB as f64) }
    else if bytes >= MB { format!("{:.1}MB", bytes as f64 / MB as f64) }
    else if bytes >= KB { format!("{:.1}KB", bytes as f64 / KB as f64) }
    else                { format!("{}B",     bytes) }
}

/// 로컬 로그인 이름 (USER → LOGNAME → USERNAME 순)
pub fn local_username() -> Option<String> {
    ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .filter_map(|k| std::env::var(k).ok())
        .find(|v| !v.is_empty())
}
