//! `execute` action implementation.
//!
//! Commands run through the platform shell in the manifest's work directory and
//! inherit the caller's environment, so package managers and compilers on
//! `PATH` are available to them.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use crate::execute::types::ExecuteError;

/// Run `cmd` through the shell in `cwd`.
///
/// # Arguments
///
/// * `cmd` - The command string to execute
/// * `cwd` - Working directory for the command
/// * `shell` - Shell override (defaults to /bin/sh on Unix, powershell.exe on Windows)
///
/// # Returns
///
/// The stdout of the command on success (trimmed).
pub async fn execute_cmd(cmd: &str, cwd: &Path, shell: Option<&str>) -> Result<String, ExecuteError> {
  info!(cmd = %cmd, "executing command");

  let (shell_cmd, shell_args) = get_shell(shell);

  let mut command = Command::new(&shell_cmd);
  command
    .args(&shell_args)
    .arg(cmd)
    .current_dir(cwd)
    // a timed out action drops this future; take the child down with it
    .kill_on_drop(true);

  debug!(shell = %shell_cmd, working_dir = ?cwd, "spawning process");

  let output = command.output().await?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command stdout");
    }

    return Err(ExecuteError::CmdFailed {
      cmd: cmd.to_string(),
      code: output.status.code(),
      output: if stderr.is_empty() { stdout } else { stderr },
    });
  }

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }

  Ok(stdout)
}

/// Get the shell command and arguments for the current platform.
///
/// Returns `(shell_command, shell_arguments)`; the command string is passed
/// after the arguments.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      powershell_args()
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      // Assume Unix-style shell (bash, sh, zsh, etc.)
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    ("powershell.exe".to_string(), powershell_args())
  }
}

fn powershell_args() -> Vec<String> {
  vec![
    "-NoProfile".to_string(),
    "-ExecutionPolicy".to_string(),
    "Bypass".to_string(),
    "-Command".to_string(),
  ]
}
