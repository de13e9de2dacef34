//! Forced termination of the supervised child.

use std::io;
use std::process::ExitStatus;

use tokio::process::Child;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Kill the child immediately and reap it.
///
/// # Platform behavior
/// - Unix: SIGKILL via nix, then wait
/// - Windows: `Child::kill`, which also waits
pub async fn kill_and_reap(child: &mut Child) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        kill_unix(child).await
    }

    #[cfg(not(unix))]
    {
        child.kill().await?;
        child.wait().await
    }
}

#[cfg(unix)]
async fn kill_unix(child: &mut Child) -> io::Result<ExitStatus> {
    // No pid means the child was already reaped.
    let Some(pid) = child.id() else {
        return child.wait().await;
    };
    let pid = i32::try_from(pid).map_err(io::Error::other)?;

    if let Err(e) = signal::kill(Pid::from_raw(pid), Signal::SIGKILL) {
        // Process may have already exited
        if e != nix::errno::Errno::ESRCH {
            return Err(io::Error::other(e));
        }
    }
    child.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;

    #[tokio::test]
    #[cfg(unix)]
    async fn kill_stops_sleeping_process() {
        let mut child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("failed to spawn sleep");

        let status = kill_and_reap(&mut child).await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn kill_handles_already_exited() {
        let mut child = Command::new("true").spawn().expect("failed to spawn true");
        child.wait().await.unwrap();

        assert!(kill_and_reap(&mut child).await.is_ok());
    }
}
