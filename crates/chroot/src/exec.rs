//! Streaming command execution
//!
//! Runs a command capturing standard output and standard error line by
//! line, mirroring each line to the event channel as it arrives. Both
//! streams are drained by concurrent readers joined before the exit
//! status is awaited, so neither pipe can fill up and deadlock the child
//! while the other is being read.

use pkgsmith_errors::{BuildError, Error};
use pkgsmith_events::{AppEvent, BuildEvent, EventEmitter, EventSender};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Captured result of a command run
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Run a command, mirroring its output to the event channel while
/// capturing it.
///
/// A non-zero exit is not an error here; callers inspect the code.
///
/// # Errors
///
/// Returns an error if the command cannot be spawned or its streams
/// cannot be read.
pub async fn run_logged(
    mut cmd: Command,
    label: &str,
    events: Option<&EventSender>,
) -> Result<CommandOutput, Error> {
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| BuildError::CommandSpawn {
        command: label.to_string(),
        message: e.to_string(),
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::internal("child stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::internal("child stderr was not piped"))?;

    let (stdout_lines, stderr_lines) =
        tokio::join!(read_lines(stdout, events), read_lines(stderr, events));
    let (stdout_lines, stderr_lines) = (stdout_lines?, stderr_lines?);

    let status = child.wait().await.map_err(|e| BuildError::CommandSpawn {
        command: label.to_string(),
        message: e.to_string(),
    })?;

    Ok(CommandOutput {
        code: status.code().unwrap_or(-1),
        stdout: stdout_lines,
        stderr: stderr_lines,
    })
}

async fn read_lines<R: AsyncRead + Unpin>(
    stream: R,
    events: Option<&EventSender>,
) -> Result<Vec<String>, Error> {
    let mut lines = BufReader::new(stream).lines();
    let mut captured = Vec::new();
    while let Some(line) = lines.next_line().await? {
        debug!("{line}");
        events.emit(AppEvent::Build(BuildEvent::Output { line: line.clone() }));
        captured.push(line);
    }
    Ok(captured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_both_streams_and_exit_code() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out1; echo err1 >&2; echo out2; exit 3"]);

        let output = run_logged(cmd, "sh", None).await.unwrap();
        assert_eq!(output.code, 3);
        assert!(!output.success());
        assert_eq!(output.stdout, vec!["out1", "out2"]);
        assert_eq!(output.stderr, vec!["err1"]);
    }

    #[tokio::test]
    async fn mirrors_lines_to_the_event_channel() {
        let (tx, mut rx) = pkgsmith_events::channel();
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo hello"]);

        let output = run_logged(cmd, "sh", Some(&tx)).await.unwrap();
        assert!(output.success());

        match rx.recv().await {
            Some(AppEvent::Build(BuildEvent::Output { line })) => assert_eq!(line, "hello"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn large_output_on_both_streams_does_not_deadlock() {
        // Writes well past the pipe buffer size on each stream.
        let mut cmd = Command::new("sh");
        cmd.args([
            "-c",
            "i=0; while [ $i -lt 5000 ]; do echo line$i; echo line$i >&2; i=$((i+1)); done",
        ]);

        let output = run_logged(cmd, "sh", None).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.len(), 5000);
        assert_eq!(output.stderr.len(), 5000);
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let cmd = Command::new("definitely-not-a-real-binary-name");
        let err = run_logged(cmd, "definitely-not-a-real-binary-name", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Build(BuildError::CommandSpawn { .. })
        ));
    }
}
