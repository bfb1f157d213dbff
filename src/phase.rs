/*
 * Copyright 2023 Oxide Computer Company
 */

use crate::common::*;
use crate::config::Paths;
use crate::file::{ensure_dir, write_lines};
use crate::ovfenv::{PropertyKey, PropertyMap};
use crate::system::Host;

const INTERFACE: &str = "eth0";

/**
 * Copy the OVF environment document off the CDROM device and onto the local
 * disk, so that it remains available to anything else that wants to read it
 * later in boot.
 */
pub fn phase_fetch(log: &Logger, paths: &Paths, host: &dyn Host) -> Result<()> {
    info!(log, "fetching OVF environment...");

    ensure_dir(log, &paths.mount_point).with_context(|| {
        format!("Failed to create temporary mount point {}", paths.mount_point)
    })?;

    host.mount_ro(log, &paths.cdrom, &paths.mount_point).with_context(
        || format!("Failed to mount CDROM device {}", paths.cdrom),
    )?;

    let src = paths.mounted_document();
    info!(log, "copy {} -> {}", src, paths.local_copy);
    std::fs::copy(&src, &paths.local_copy).with_context(|| {
        format!(
            "Failed to copy ovf environment document to local disk {}",
            src
        )
    })?;

    host.umount(log, &paths.cdrom).with_context(|| {
        format!("Failed to unmount CDROM device {}", paths.cdrom)
    })?;

    std::fs::remove_dir_all(&paths.mount_point).with_context(|| {
        format!(
            "Failed to clean up temporary mount point {}",
            paths.mount_point
        )
    })?;

    Ok(())
}

pub fn phase_root_password(
    log: &Logger,
    props: &PropertyMap,
    host: &dyn Host,
) -> Result<()> {
    info!(log, "setting root password...");

    /*
     * chpasswd(8) reads one "user:password" record per line; a line break in
     * the value would let it name and reset some other account.
     */
    let pw = props.get(PropertyKey::RootPassword);
    if pw.contains(['\n', '\r']) {
        bail!("Failed to set root password: password contains a line break");
    }

    host.chpasswd(log, "root", pw).context("Failed to set root password")
}

pub fn interface_lines(props: &PropertyMap) -> Vec<String> {
    vec![
        format!("DEVICE={}", INTERFACE),
        "ONBOOT=yes".to_string(),
        "BOOTPROTO=static".to_string(),
        format!("IPADDR={}", props.get(PropertyKey::Ip0)),
        format!("NETMASK={}", props.get(PropertyKey::Netmask0)),
        format!("GATEWAY={}", props.get(PropertyKey::Gateway0)),
    ]
}

pub fn phase_interface(
    log: &Logger,
    paths: &Paths,
    props: &PropertyMap,
) -> Result<()> {
    info!(log, "configuring network interface {}...", INTERFACE);
    write_lines(log, &paths.interface_config, &interface_lines(props))
}

pub fn network_lines(props: &PropertyMap) -> Vec<String> {
    vec![
        "NETWORKING=yes".to_string(),
        "NETWORKING_IPV6=no".to_string(),
        format!("HOSTNAME={}", props.get(PropertyKey::HostFqdn)),
    ]
}

pub fn phase_network(
    log: &Logger,
    paths: &Paths,
    props: &PropertyMap,
) -> Result<()> {
    info!(log, "configuring network...");
    write_lines(log, &paths.network_config, &network_lines(props))
}

pub fn resolver_lines(props: &PropertyMap) -> Vec<String> {
    props
        .nameservers()
        .iter()
        .map(|ns| format!("nameserver {}", ns))
        .collect()
}

/**
 * Replace the resolver configuration outright.  Anything the image shipped
 * with (search domains, options) is discarded.
 */
pub fn phase_dns(log: &Logger, paths: &Paths, props: &PropertyMap) -> Result<()> {
    info!(log, "configuring name servers...");
    let lines = resolver_lines(props);
    if lines.is_empty() {
        warn!(log, "no name servers provided");
    }
    write_lines(log, &paths.resolv_conf, &lines)
}
