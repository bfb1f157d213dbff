/*
 * Copyright 2023 Oxide Computer Company
 */

mod common;
mod config;
mod file;
mod ovfenv;
mod phase;
mod system;
mod validate;

use common::*;
use config::Paths;
use phase::*;
use system::{Halt, Host, System};

const CONFIG: &str = "/etc/ovfboot.toml";

fn main() {
    let log = init_log();

    match provision(&log, CONFIG, &System, &System) {
        Ok(()) => {
            info!(log, "ok, run complete");
            std::process::exit(0);
        }
        Err(_) => std::process::exit(1),
    }
}

/**
 * Run the whole first boot configuration.  If anything goes wrong the machine
 * is halted: an appliance that comes up with a half applied network or no root
 * password is worse than one that does not come up at all.
 */
fn provision(
    log: &Logger,
    config: &str,
    host: &dyn Host,
    halt: &dyn Halt,
) -> Result<()> {
    let res = config::load(log, config).and_then(|c| run(log, &c.paths, host));

    if let Err(e) = &res {
        error!(log, "fatal error: {:?}", e);
        halt.halt_system(log, &format!("{:#}", e));
    }

    res
}

fn run(log: &Logger, paths: &Paths, host: &dyn Host) -> Result<()> {
    phase_fetch(log, paths, host)?;

    info!(log, "reading OVF environment from {}...", paths.local_copy);
    let props = ovfenv::parse(log, &paths.local_copy).with_context(|| {
        format!(
            "Failed to parse ovf environment document {}",
            paths.local_copy
        )
    })?;

    validate::validate(log, &props)?;

    /*
     * Nothing below here runs unless every property checked out.
     */
    phase_root_password(log, &props, host)?;
    phase_network(log, paths, &props)?;
    phase_interface(log, paths, &props)?;
    phase_dns(log, paths, &props)?;

    Ok(())
}
