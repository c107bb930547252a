// remote-run build script
// author: kodeholic
//
// `remote-run version` 에 찍히는 빌드 날짜

fn main() {
    let date = chrono::Utc::now().format("%Y-%m-%d");
    println!("cargo:rustc-env=REMOTE_RUN_BUILD_DATE={}", date);
    println!("cargo:rerun-if-changed=build.rs");
}
