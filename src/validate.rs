/*
 * Copyright 2023 Oxide Computer Company
 */

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::common::*;
use crate::ovfenv::{PropertyKey, PropertyMap};

lazy_static! {
    static ref FQDN: Regex =
        Regex::new(r"^[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,6}$").unwrap();
}

/**
 * Accept a dotted quad: exactly four segments, each a non-empty run of ASCII
 * digits with a value no larger than 255.  Leading zeroes are allowed, so
 * "010.1.1.001" passes.
 */
pub fn is_valid_ipv4(a: &str) -> bool {
    let segs: Vec<&str> = a.split('.').collect();
    if segs.len() != 4 {
        return false;
    }

    segs.iter().all(|s| {
        !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_digit())
            && s.parse::<u64>().map(|n| n <= 255).unwrap_or(false)
    })
}

/**
 * Accept a lower case host name with at least two labels, the last of which
 * looks like a top-level domain.  Upper case is rejected rather than folded.
 */
pub fn is_valid_fqdn(fqdn: &str) -> bool {
    FQDN.is_match(fqdn)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: PropertyKey,
    pub value: String,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=\"{}\"", self.key, self.value)
    }
}

#[derive(Debug, Default)]
pub struct Report {
    pub valid: Vec<Entry>,
    pub invalid: Vec<Entry>,
}

impl Report {
    pub fn build(props: &PropertyMap) -> Report {
        let mut r = Report::default();

        let checks = [
            (PropertyKey::Ip0, false),
            (PropertyKey::Netmask0, false),
            (PropertyKey::Gateway0, false),
            (PropertyKey::Dns0, true),
            (PropertyKey::Dns1, true),
            (PropertyKey::Dns2, true),
        ];
        for (key, optional) in checks {
            let value = props.get(key);
            let ok = is_valid_ipv4(value) || (optional && value.is_empty());
            r.push(key, value, ok);
        }

        let fqdn = props.get(PropertyKey::HostFqdn);
        r.push(PropertyKey::HostFqdn, fqdn, is_valid_fqdn(fqdn));

        r
    }

    fn push(&mut self, key: PropertyKey, value: &str, ok: bool) {
        let e = Entry { key, value: value.to_string() };
        if ok {
            self.valid.push(e);
        } else {
            self.invalid.push(e);
        }
    }

    pub fn is_ok(&self) -> bool {
        self.invalid.is_empty()
    }
}

/**
 * Blank lines written ahead of the dump so that it scrolls earlier boot noise
 * off the console.
 */
const CONSOLE_SCROLL: usize = 24;

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&"\n".repeat(CONSOLE_SCROLL))?;
        writeln!(f, "Failed while validating configuration")?;
        writeln!(f)?;
        writeln!(f, "The following parameters have improper values:")?;
        for e in &self.invalid {
            writeln!(f, "{}", e)?;
        }
        writeln!(f)?;
        writeln!(f, "The following parameters appear to be configured correctly:")?;
        for e in &self.valid {
            writeln!(f, "{}", e)?;
        }
        Ok(())
    }
}

pub fn validate(log: &Logger, props: &PropertyMap) -> Result<()> {
    let r = Report::build(props);

    if !r.is_ok() {
        for e in &r.invalid {
            error!(log, "invalid property"; "key" => e.key.as_str(),
                "value" => &e.value);
        }
        bail!("{}\nEnvironment validation failed", r);
    }

    info!(log, "environment validated"; "properties" => r.valid.len());
    Ok(())
}
