/*
 * Copyright 2023 Oxide Computer Company
 */

use std::fmt;
use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::common::*;
use crate::file::read_file;

/**
 * The properties we consume from the OVF environment.  Anything else in the
 * document is ignored.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKey {
    RootPassword,
    HostFqdn,
    Ip0,
    Netmask0,
    Gateway0,
    Dns0,
    Dns1,
    Dns2,
}

impl PropertyKey {
    pub const ALL: [PropertyKey; 8] = [
        PropertyKey::RootPassword,
        PropertyKey::HostFqdn,
        PropertyKey::Ip0,
        PropertyKey::Netmask0,
        PropertyKey::Gateway0,
        PropertyKey::Dns0,
        PropertyKey::Dns1,
        PropertyKey::Dns2,
    ];

    pub const DNS: [PropertyKey; 3] =
        [PropertyKey::Dns0, PropertyKey::Dns1, PropertyKey::Dns2];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKey::RootPassword => "root_password",
            PropertyKey::HostFqdn => "host_fqdn",
            PropertyKey::Ip0 => "ip_0",
            PropertyKey::Netmask0 => "netmask_0",
            PropertyKey::Gateway0 => "gateway_0",
            PropertyKey::Dns0 => "dns_0",
            PropertyKey::Dns1 => "dns_1",
            PropertyKey::Dns2 => "dns_2",
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match PropertyKey::ALL.iter().find(|k| k.as_str() == s) {
            Some(k) => Ok(*k),
            None => bail!("unrecognised property key \"{}\"", s),
        }
    }
}

/**
 * Every recognised key always has a value; a key absent from the document
 * reads as the empty string.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    root_password: String,
    host_fqdn: String,
    ip_0: String,
    netmask_0: String,
    gateway_0: String,
    dns_0: String,
    dns_1: String,
    dns_2: String,
}

impl PropertyMap {
    pub fn get(&self, key: PropertyKey) -> &str {
        match key {
            PropertyKey::RootPassword => &self.root_password,
            PropertyKey::HostFqdn => &self.host_fqdn,
            PropertyKey::Ip0 => &self.ip_0,
            PropertyKey::Netmask0 => &self.netmask_0,
            PropertyKey::Gateway0 => &self.gateway_0,
            PropertyKey::Dns0 => &self.dns_0,
            PropertyKey::Dns1 => &self.dns_1,
            PropertyKey::Dns2 => &self.dns_2,
        }
    }

    pub fn set(&mut self, key: PropertyKey, value: String) {
        let slot = match key {
            PropertyKey::RootPassword => &mut self.root_password,
            PropertyKey::HostFqdn => &mut self.host_fqdn,
            PropertyKey::Ip0 => &mut self.ip_0,
            PropertyKey::Netmask0 => &mut self.netmask_0,
            PropertyKey::Gateway0 => &mut self.gateway_0,
            PropertyKey::Dns0 => &mut self.dns_0,
            PropertyKey::Dns1 => &mut self.dns_1,
            PropertyKey::Dns2 => &mut self.dns_2,
        };
        *slot = value;
    }

    /**
     * Configured name servers, in index order, skipping empty slots.
     */
    pub fn nameservers(&self) -> Vec<&str> {
        PropertyKey::DNS
            .iter()
            .map(|k| self.get(*k))
            .filter(|v| !v.is_empty())
            .collect()
    }
}

/**
 * Pull the key and value attributes out of a Property element.  The
 * attributes are normally namespace qualified (e.g., "oe:key"), but the prefix
 * is chosen by whoever generated the document so we match on the local name.
 */
fn property_attrs(e: &BytesStart) -> Result<(String, String)> {
    let mut key = None;
    let mut value = None;

    for a in e.attributes() {
        let a = a?;
        match a.key.local_name().as_ref() {
            b"key" => key = Some(a.unescape_value()?.into_owned()),
            b"value" => value = Some(a.unescape_value()?.into_owned()),
            _ => (),
        }
    }

    match (key, value) {
        (Some(k), Some(v)) => Ok((k, v)),
        (None, _) => bail!("malformed Property element: no key attribute"),
        (_, None) => bail!("malformed Property element: no value attribute"),
    }
}

pub fn parse_str(log: &Logger, xml: &str) -> Result<PropertyMap> {
    let mut props = PropertyMap::default();
    let mut reader = Reader::from_str(xml);

    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let ev = reader.read_event().with_context(|| {
            format!("XML error at byte {}", reader.error_position())
        })?;

        /*
         * Outside the document element only whitespace (plus comments,
         * processing instructions and the like) may appear.
         */
        let outside = depth == 0;
        let prop = match &ev {
            Event::Start(_) | Event::Empty(_) if outside && seen_root => {
                bail!("junk after document element");
            }
            Event::Start(e) => {
                depth += 1;
                seen_root = true;
                Some(e)
            }
            Event::Empty(e) => {
                seen_root = true;
                Some(e)
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                None
            }
            Event::Text(t) if outside => {
                if !t.iter().all(|b| b.is_ascii_whitespace()) {
                    bail!("text outside of the document element");
                }
                None
            }
            Event::CData(_) if outside => {
                bail!("CDATA outside of the document element");
            }
            Event::Eof => break,
            _ => None,
        };

        let Some(e) = prop else {
            continue;
        };
        if e.local_name().as_ref() != b"Property" {
            continue;
        }

        let (k, v) = property_attrs(e)?;
        match k.parse::<PropertyKey>() {
            Ok(key) => {
                /*
                 * A later occurrence of the same key replaces the earlier one.
                 */
                props.set(key, v);
            }
            Err(_) => {
                info!(log, "ignoring property \"{}\"", k);
            }
        }
    }

    if !seen_root {
        bail!("document has no root element");
    }
    if depth != 0 {
        bail!("document ended with {} unclosed element(s)", depth);
    }

    Ok(props)
}

pub fn parse(log: &Logger, p: &str) -> Result<PropertyMap> {
    let xml = match read_file(p)? {
        Some(xml) => xml,
        None => bail!("\"{}\" does not exist", p),
    };

    parse_str(log, &xml)
}
