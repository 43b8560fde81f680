//! Bounded invocation of external system tools

use std::io;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::trace;

/// Run `program` to completion, capturing its output.
///
/// The child is killed if it outlives `limit` or if the returned future is
/// dropped before it finishes.
pub(crate) async fn run_captured(program: &str, args: &[&str], limit: Duration) -> io::Result<Output> {
    trace!(program, ?args, "Spawning external command");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    match timeout(limit, child.wait_with_output()).await {
        Ok(output) => output,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("{} did not finish within {}ms", program, limit.as_millis()),
        )),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let result = run_captured(
            "netsweep-definitely-missing-tool",
            &[],
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_slow_program_times_out() {
        let result = run_captured("sleep", &["5"], Duration::from_millis(50)).await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let output = run_captured("echo", &["hello"], Duration::from_secs(5))
            .await
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }
}
