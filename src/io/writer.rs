/*! Corpus file writing

[DataWriter] holds one buffered file per corpus file name.
Files that end up empty are removed on [DataWriter::close].
!*/
use std::{
    collections::HashMap,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::debug;

use crate::error::Error;

pub struct DataWriter {
    dst: PathBuf,
    files: HashMap<&'static str, BufWriter<File>>,
}

impl DataWriter {
    /// Create (or truncate) each of `names` in `dst`.
    pub fn new(dst: &Path, names: &[&'static str]) -> Result<Self, Error> {
        let mut files = HashMap::with_capacity(names.len());
        for name in names {
            let f = File::create(dst.join(name))?;
            files.insert(*name, BufWriter::new(f));
        }
        Ok(Self {
            dst: dst.to_path_buf(),
            files,
        })
    }

    /// Write a `<id> <value>` line to `name` (`<id>` alone for an empty value).
    pub fn write_line(&mut self, name: &str, id: &str, value: &str) -> Result<(), Error> {
        let f = self
            .files
            .get_mut(name)
            .ok_or_else(|| Error::Custom(format!("{} is not opened for writing", name)))?;
        if value.is_empty() {
            writeln!(f, "{}", id)?;
        } else {
            writeln!(f, "{} {}", id, value)?;
        }
        Ok(())
    }

    /// Flush every file and remove the empty ones.
    pub fn close(self) -> Result<(), Error> {
        for (_, mut f) in self.files {
            f.flush()?;
        }
        remove_empty(&self.dst)
    }
}

/// Remove every empty file of `dir`.
pub fn remove_empty(dir: &Path) -> Result<(), Error> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_file() && metadata.len() == 0 {
            debug!("removing empty file {:?}", entry.path());
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Shortest representation that reads back to the same float, always with a decimal part (`2.0`, `0.25`).
pub fn format_float(f: f64) -> String {
    format!("{:?}", f)
}
