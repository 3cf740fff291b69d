//! Running the generated program
//!
//! The program is started with `cargo run` inside the staged package so
//! dependency resolution and the build happen in one step. The cargo
//! executable can be swapped through `DOROUTE_CARGO_BIN`.

use std::path::Path;
use std::process::{Child, Command, ExitStatus};
use std::time::Duration;

use crate::config::cargo_bin;
use crate::error::{Error, Result};

/// How long to sleep between checks for signals and child exit.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Why [`wait_for_shutdown`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// A termination signal arrived (signal number)
    Signal(i32),
    /// The program exited on its own
    Exited(ExitStatus),
}

/// Start `cargo run --quiet --bin <bin_name>` in `dir`.
pub fn spawn_server(dir: &Path, bin_name: &str) -> Result<Child> {
    spawn_with(&cargo_bin(), dir, bin_name)
}

fn spawn_with(cargo: &str, dir: &Path, bin_name: &str) -> Result<Child> {
    let mut cmd = Command::new(cargo);
    cmd.args(["run", "--quiet", "--bin", bin_name]).current_dir(dir);
    tracing::debug!(cargo, dir = %dir.display(), bin = bin_name, "starting generated program");
    cmd.spawn().map_err(|source| Error::Run {
        command: format!("{cargo} run --quiet --bin {bin_name}"),
        dir: dir.to_path_buf(),
        source,
    })
}

/// Block until SIGINT/SIGTERM arrives or `child` exits.
#[cfg(unix)]
pub fn wait_for_shutdown(child: &mut Child) -> Result<Shutdown> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).map_err(|e| Error::io("<signals>", e))?;
    loop {
        if let Some(signal) = signals.pending().next() {
            tracing::info!(signal, "received termination signal");
            return Ok(Shutdown::Signal(signal));
        }
        if let Some(status) = child.try_wait().map_err(|e| Error::io("<child>", e))? {
            return Ok(Shutdown::Exited(status));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Block until `child` exits.
#[cfg(not(unix))]
pub fn wait_for_shutdown(child: &mut Child) -> Result<Shutdown> {
    let status = child.wait().map_err(|e| Error::io("<child>", e))?;
    Ok(Shutdown::Exited(status))
}

/// Kill `child` if it is still running and reap it.
pub fn stop(child: &mut Child) -> Result<()> {
    if child.try_wait().map_err(|e| Error::io("<child>", e))?.is_none() {
        tracing::debug!(pid = child.id(), "stopping generated program");
        // the child may exit between the check and the kill
        if let Err(e) = child.kill() {
            tracing::debug!(error = %e, "kill failed");
        }
    }
    child.wait().map_err(|e| Error::io("<child>", e))?;
    Ok(())
}
