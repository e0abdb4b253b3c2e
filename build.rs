fn main() {
    set_long_version();
}

/// Make the full version string, including the current git hash when one is
/// available, visible to the build as the environment variable
/// `SPEEDSIM_BUILD_LONG_VERSION`.
fn set_long_version() {
    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let long_version = match git_revision_hash() {
        Some(rev) => format!("{} ({})", version, rev),
        None => version,
    };
    println!("cargo:rustc-env=SPEEDSIM_BUILD_LONG_VERSION={}", long_version);
}

fn git_revision_hash() -> Option<String> {
    use std::process::Command;

    let args = &["rev-parse", "--short=10", "HEAD"];
    let output = Command::new("git").args(args).output().ok()?;
    let rev = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if rev.is_empty() {
        None
    } else {
        Some(rev)
    }
}
