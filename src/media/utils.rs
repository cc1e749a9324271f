use std::ffi::OsStr;
use std::process::Output;
use tracing::{info, warn};

/// Runs `<program> <version_flag>` and logs whether the tool is usable.
pub async fn check_tool(program: &OsStr, version_flag: &str) -> bool {
    match tokio::process::Command::new(program)
        .arg(version_flag)
        .output()
        .await
    {
        Ok(output) => {
            if output.status.success() {
                let version_line = String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .unwrap_or("unknown")
                    .trim()
                    .to_string();
                info!(
                    "✅ {} is available: {}",
                    program.to_string_lossy(),
                    version_line
                );
                true
            } else {
                warn!("❌ {} command failed", program.to_string_lossy());
                false
            }
        }
        Err(e) => {
            warn!("❌ {} not found: {}", program.to_string_lossy(), e);
            false
        }
    }
}

/// Best description of why a finished process failed.
pub fn failure_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("process exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[cfg(unix)]
    fn output_with(stderr: &str, code: i32) -> Output {
        use std::os::unix::process::ExitStatusExt;
        Output {
            status: std::process::ExitStatus::from_raw(code << 8),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_detail_prefers_stderr() {
        let output = output_with("ERROR: Unsupported URL\n", 1);
        assert_eq!(failure_detail(&output), "ERROR: Unsupported URL");
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_detail_falls_back_to_status() {
        let output = output_with("  \n", 1);
        assert!(failure_detail(&output).starts_with("process exited with"));
    }

    #[tokio::test]
    async fn test_check_missing_tool() {
        let program = OsString::from("mediagrab-definitely-not-installed");
        assert!(!check_tool(&program, "--version").await);
    }
}
