/*
 * Copyright 2023 Oxide Computer Company
 */

use crate::common::*;
use std::fs::{DirBuilder, File};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::DirBuilderExt;

pub fn ensure_dir(log: &Logger, path: &str) -> Result<()> {
    if !exists_dir(path)? {
        info!(log, "mkdir {}", path);
        DirBuilder::new().mode(0o700).create(path)?;
    }
    Ok(())
}

pub fn exists_dir(p: &str) -> Result<bool> {
    let md = match std::fs::metadata(p) {
        Ok(md) => md,
        Err(e) => match e.kind() {
            ErrorKind::NotFound => return Ok(false),
            _ => bail!("checking {}: {}", p, e),
        },
    };

    if !md.is_dir() {
        bail!("\"{}\" exists but is not a directory", p);
    }

    Ok(true)
}

pub fn read_file(p: &str) -> Result<Option<String>> {
    let f = match File::open(p) {
        Ok(f) => f,
        Err(e) => {
            match e.kind() {
                ErrorKind::NotFound => return Ok(None),
                _ => bail!("open \"{}\": {}", p, e),
            };
        }
    };
    let mut r = std::io::BufReader::new(f);
    let mut out = String::new();
    r.read_to_string(&mut out)?;
    Ok(Some(out))
}

pub fn read_toml<T>(p: &str) -> Result<Option<T>>
where
    for<'de> T: serde::Deserialize<'de>,
{
    match read_file(p)? {
        None => Ok(None),
        Some(s) => Ok(Some(
            toml::from_str(&s).with_context(|| format!("parsing {}", p))?,
        )),
    }
}

pub fn write_file(p: &str, data: &str) -> Result<()> {
    let f = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(p)?;
    let mut w = std::io::BufWriter::new(f);
    w.write_all(data.as_bytes())?;
    w.flush()?;
    Ok(())
}

pub fn write_lines<L>(log: &Logger, p: &str, lines: &[L]) -> Result<()>
where
    L: AsRef<str> + std::fmt::Debug,
{
    info!(log, "----- WRITE FILE: {} ------ {:#?}", p, lines);
    let mut out = String::new();
    for l in lines {
        out.push_str(l.as_ref());
        out.push('\n');
    }
    write_file(p, &out).with_context(|| format!("writing {}", p))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn write_lines_truncates() -> Result<()> {
        let log = init_log();
        let dir = tempfile::tempdir()?;
        let p = dir.path().join("resolv.conf");
        let p = p.to_str().unwrap();

        write_file(p, "search example.com\nnameserver 9.9.9.9\n")?;
        write_lines(&log, p, &["nameserver 8.8.8.8"])?;

        assert_eq!(read_file(p)?.as_deref(), Some("nameserver 8.8.8.8\n"));
        Ok(())
    }

    #[test]
    fn read_missing_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let p = dir.path().join("absent");
        assert!(read_file(p.to_str().unwrap())?.is_none());
        Ok(())
    }

    #[test]
    fn ensure_dir_rejects_file() -> Result<()> {
        let log = init_log();
        let dir = tempfile::tempdir()?;
        let p = dir.path().join("notadir");
        let p = p.to_str().unwrap();
        write_file(p, "")?;
        assert!(ensure_dir(&log, p).is_err());
        Ok(())
    }
}
