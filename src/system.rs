/*
 * Copyright 2023 Oxide Computer Company
 */

use std::io::Write;
use std::process::{Command, Stdio};

use crate::common::*;

pub const MOUNT: &str = "/bin/mount";
pub const UMOUNT: &str = "/bin/umount";
pub const CHPASSWD: &str = "/usr/sbin/chpasswd";
pub const HALT: &str = "/sbin/halt";

/**
 * The external commands the provisioning steps depend on.  Each returns an
 * error if the command could not be run or exited unsuccessfully.
 */
pub trait Host {
    fn mount_ro(&self, log: &Logger, device: &str, dir: &str) -> Result<()>;
    fn umount(&self, log: &Logger, device: &str) -> Result<()>;
    /**
     * Feed "user:password" to the batch password change tool.
     */
    fn chpasswd(&self, log: &Logger, user: &str, password: &str)
        -> Result<()>;
}

/**
 * Stop the machine after a fatal error.  Implementations must not return an
 * error; there is nothing left for the caller to do about it.
 */
pub trait Halt {
    fn halt_system(&self, log: &Logger, message: &str);
}

pub struct System;

impl Host for System {
    fn mount_ro(&self, log: &Logger, device: &str, dir: &str) -> Result<()> {
        info!(log, "exec: mount -o ro {} {}", device, dir);
        let output = Command::new(MOUNT)
            .env_clear()
            .arg("-o")
            .arg("ro")
            .arg(device)
            .arg(dir)
            .output()?;

        if !output.status.success() {
            bail!("mount: {}", output.info());
        }

        Ok(())
    }

    fn umount(&self, log: &Logger, device: &str) -> Result<()> {
        info!(log, "exec: umount {}", device);
        let output = Command::new(UMOUNT).env_clear().arg(device).output()?;

        if !output.status.success() {
            bail!("umount: {}", output.info());
        }

        Ok(())
    }

    fn chpasswd(
        &self,
        log: &Logger,
        user: &str,
        password: &str,
    ) -> Result<()> {
        info!(log, "exec: chpasswd ({})", user);
        let mut child = Command::new(CHPASSWD)
            .env_clear()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        /*
         * Write the credentials and close our end of the pipe so that the
         * command sees EOF:
         */
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(format!("{}:{}", user, password).as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            bail!("chpasswd: {}", output.info());
        }

        Ok(())
    }
}

impl Halt for System {
    fn halt_system(&self, log: &Logger, message: &str) {
        println!("{}\n\nHalting system...\n", message);

        /*
         * Do not wait for halt(8); with -f the machine goes down underneath
         * us.
         */
        info!(log, "exec: halt -f");
        if let Err(e) = Command::new(HALT).env_clear().arg("-f").spawn() {
            error!(log, "could not run {}: {}", HALT, e);
        }
    }
}
