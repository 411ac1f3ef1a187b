//! Subprocess construction helpers.

use std::path::Path;
use tokio::process::Command;

/// `CREATE_NO_WINDOW`: keeps child processes from opening a console window.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Build a command that runs without a visible console on every platform.
pub(crate) fn quiet_command(program: &Path) -> Command {
    #[allow(unused_mut)]
    let mut cmd = Command::new(program);
    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);
    cmd
}
