/*! Line reader for corpus files

Corpus files hold one record per line: an identifier followed by whitespace separated fields.
Blank lines are skipped.
!*/
use std::{
    fs::File,
    io::{BufRead, BufReader, Lines, Read},
    path::{Path, PathBuf},
};

use crate::error::Error;

/// A single record: identifier and remaining fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    pub fields: Vec<String>,
    /// 1-based line number
    pub line: usize,
}

impl Entry {
    /// Remainder of the line, fields joined by single spaces.
    pub fn value(&self) -> String {
        self.fields.join(" ")
    }
}

/// Iterates over the [Entry] of a corpus file.
///
/// Lines with less than `min_fields` fields after the identifier yield [Error::Malformed].
#[derive(Debug)]
pub struct LineReader<T = File>
where
    T: Read,
{
    path: PathBuf,
    lines: Lines<BufReader<T>>,
    line: usize,
    min_fields: usize,
}

impl LineReader<File> {
    /// Open the file at `path`.
    pub fn new(path: &Path) -> Result<Self, Error> {
        let f = File::open(path)?;
        Ok(Self::from_reader(path, f))
    }
}

impl<T> LineReader<T>
where
    T: Read,
{
    /// `path` is only used for error reporting.
    pub fn from_reader(path: &Path, reader: T) -> Self {
        Self {
            path: path.to_path_buf(),
            lines: BufReader::new(reader).lines(),
            line: 0,
            min_fields: 0,
        }
    }

    pub fn min_fields(mut self, min_fields: usize) -> Self {
        self.min_fields = min_fields;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Iterator for LineReader<T>
where
    T: Read,
{
    type Item = Result<Entry, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;

            let mut tokens = line.split_whitespace().map(String::from);
            let id = match tokens.next() {
                Some(id) => id,
                None => continue,
            };
            let fields: Vec<String> = tokens.collect();

            if fields.len() < self.min_fields {
                return Some(Err(Error::Malformed {
                    path: self.path.clone(),
                    line: self.line,
                }));
            }

            return Some(Ok(Entry {
                id,
                fields,
                line: self.line,
            }));
        }
    }
}
