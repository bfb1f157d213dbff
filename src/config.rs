/*
 * Copyright 2023 Oxide Computer Company
 */

use serde::Deserialize;

use crate::common::*;
use crate::file::read_toml;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,
}

/**
 * Locations of the source device and of every file we read or write.  The
 * defaults match a Red Hat style appliance image with the OVF environment
 * attached as the first virtual CDROM.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Paths {
    pub cdrom: String,
    pub mount_point: String,
    pub local_copy: String,
    pub interface_config: String,
    pub network_config: String,
    pub resolv_conf: String,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            cdrom: "/dev/cdrom".into(),
            mount_point: "/tmp/ovfboot-mount".into(),
            local_copy: "/etc/ovf-env.xml".into(),
            interface_config: "/etc/sysconfig/network-scripts/ifcfg-eth0"
                .into(),
            network_config: "/etc/sysconfig/network".into(),
            resolv_conf: "/etc/resolv.conf".into(),
        }
    }
}

impl Paths {
    /**
     * The name under which the environment document appears on the mounted
     * device.
     */
    pub fn mounted_document(&self) -> String {
        format!("{}/{}", self.mount_point.trim_end_matches('/'), OVF_ENV_NAME)
    }
}

pub const OVF_ENV_NAME: &str = "ovf-env.xml";

pub fn load(log: &Logger, p: &str) -> Result<Config> {
    match read_toml::<Config>(p)? {
        Some(c) => {
            info!(log, "loaded configuration from {}", p);
            Ok(c)
        }
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_defaults() -> Result<()> {
        let c: Config = toml::from_str("\n")?;
        assert_eq!(c.paths.cdrom, "/dev/cdrom");
        assert_eq!(c.paths.resolv_conf, "/etc/resolv.conf");
        assert_eq!(c.paths.mounted_document(), "/tmp/ovfboot-mount/ovf-env.xml");
        Ok(())
    }

    #[test]
    fn config_override_one_path() -> Result<()> {
        let input = "[paths]\ncdrom = \"/dev/sr1\"\n";
        let c: Config = toml::from_str(input)?;
        assert_eq!(c.paths.cdrom, "/dev/sr1");
        assert_eq!(c.paths.local_copy, "/etc/ovf-env.xml");
        Ok(())
    }

    #[test]
    fn config_unknown_key() {
        let input = "[paths]\ncdrum = \"/dev/sr1\"\n";
        assert!(toml::from_str::<Config>(input).is_err());
    }

    #[test]
    fn config_missing_file() -> Result<()> {
        let log = init_log();
        let dir = tempfile::tempdir()?;
        let p = dir.path().join("ovfboot.toml");
        let c = load(&log, p.to_str().unwrap())?;
        assert_eq!(c.paths.mount_point, "/tmp/ovfboot-mount");
        Ok(())
    }
}
