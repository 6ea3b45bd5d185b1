use std::os::unix::prelude::CommandExt;
use std::process::Command;

use nix::unistd::{setgid, setgroups, setuid, Gid, Uid};

use crate::authentication::AuthenticatedUser;
use crate::common::System;

/// Creates a command running with the privileges, environment and home directory of a user.
/// Privileges are only dropped when running as root; otherwise the command keeps the
/// identity of the current process.
///
/// # Arguments
/// * `program` - The program to execute.
/// * `user` - The user the command runs as.
pub fn command_as_user(program: &str, user: &AuthenticatedUser) -> Command {
    let account = user.account();
    let mut command = Command::new(program);

    command
        .env_clear()
        .envs(user.environment())
        .current_dir(account.home());

    if System::is_root() {
        let gids: Vec<Gid> = account.groups().iter().map(|&g| Gid::from_raw(g)).collect();
        let uid = Uid::from_raw(account.uid());
        let gid = Gid::from_raw(account.gid());

        unsafe {
            // Supplementary groups must be set while still privileged, before gid and uid
            command
                .pre_exec(move || {
                    setgroups(&gids)?;
                    setgid(gid)?;
                    setuid(uid)?;
                    Ok(())
                });
        }
    } else if System::get_current_user_uid() != account.uid() {
        warn!("Not running as root, {} will run as uid {} instead of {}", program, System::get_current_user_uid(), account.uid());
    }

    command
}
