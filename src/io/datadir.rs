/*! Corpus directory layout

A corpus directory holds the required `text`, `wav.scp` and `utt2spk` files,
an optional `segments` file and optional augmentation files mapping an identifier to a single field.
!*/
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::reader::LineReader;
use crate::error::Error;
use crate::store::UpdatableField;

pub const TEXT: &str = "text";
pub const WAV_SCP: &str = "wav.scp";
pub const UTT2SPK: &str = "utt2spk";
pub const SEGMENTS: &str = "segments";
pub const SPK2UTT: &str = "spk2utt";
pub const FEATS_SCP: &str = "feats.scp";
pub const UTT2DUR: &str = "utt2dur";
pub const RECO2DUR: &str = "reco2dur";
pub const CMVN_SCP: &str = "cmvn.scp";
pub const SPK2GENDER: &str = "spk2gender";
/// Recognized but not imported: recordings have no gender.
pub const RECO2GENDER: &str = "reco2gender";

pub const REQUIRED_FILES: [&str; 3] = [TEXT, WAV_SCP, UTT2SPK];

/// Augmentation files, with the (entity, field) they update.
/// Applied in this order.
pub const AUGMENTATION_FILES: [(&str, &str, &str); 5] = [
    (FEATS_SCP, "Utterance", "feat"),
    (UTT2DUR, "Utterance", "duration"),
    (RECO2DUR, "Recording", "duration"),
    (CMVN_SCP, "Speaker", "cmvn"),
    (SPK2GENDER, "Speaker", "gender"),
];

/// Start/end value meaning "whole recording".
pub const NO_TIME: f64 = -1.0;

/// A `segments` line.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub utt_id: String,
    pub reco_id: String,
    /// `None` when the utterance spans the whole recording.
    pub times: Option<(f64, f64)>,
}

/// Where segments come from.
#[derive(Debug, Clone, PartialEq)]
pub enum Segments {
    File(PathBuf),
    /// No segments file: each utterance of `text` is its own recording.
    Dummy(Vec<String>),
}

impl Segments {
    pub fn is_dummy(&self) -> bool {
        matches!(self, Segments::Dummy(_))
    }

    pub fn read(&self) -> Result<Vec<Segment>, Error> {
        match self {
            Segments::Dummy(utt_ids) => Ok(utt_ids
                .iter()
                .map(|utt_id| Segment {
                    utt_id: utt_id.clone(),
                    reco_id: utt_id.clone(),
                    times: None,
                })
                .collect()),
            Segments::File(path) => LineReader::new(path)?
                .min_fields(3)
                .map(|entry| {
                    let entry = entry?;
                    let parse = |v: &str| {
                        v.parse::<f64>().map_err(|_| Error::InvalidValue {
                            field: format!("{}:{} time", path.display(), entry.line),
                            value: v.to_string(),
                        })
                    };
                    let start = parse(&entry.fields[1])?;
                    let end = parse(&entry.fields[2])?;
                    let times = if start != NO_TIME && end != NO_TIME {
                        Some((start, end))
                    } else {
                        None
                    };

                    Ok(Segment {
                        utt_id: entry.id,
                        reco_id: entry.fields[0].clone(),
                        times,
                    })
                })
                .collect(),
        }
    }
}

/// A corpus directory with its required files present.
#[derive(Debug, Clone)]
pub struct DataDir {
    path: PathBuf,
}

impl DataDir {
    /// Fails with [Error::MissingRequiredFile] if one of [REQUIRED_FILES] is absent.
    pub fn open(path: &Path) -> Result<Self, Error> {
        for name in REQUIRED_FILES {
            let file = path.join(name);
            if !file.is_file() {
                return Err(Error::MissingRequiredFile(file));
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Directory base name.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Segments source: the `segments` file if present,
    /// a dummy built from `text` identifiers otherwise.
    pub fn segments(&self) -> Result<Segments, Error> {
        let seg_file = self.file(SEGMENTS);
        if seg_file.is_file() {
            return Ok(Segments::File(seg_file));
        }

        debug!("no segments file in {:?}, using whole recordings", self.path);
        let utt_ids = LineReader::new(&self.file(TEXT))?
            .map(|entry| entry.map(|e| e.id))
            .collect::<Result<Vec<String>, Error>>()?;
        Ok(Segments::Dummy(utt_ids))
    }

    /// Present augmentation files with the field they update.
    pub fn augmentations(&self) -> Result<Vec<(PathBuf, UpdatableField)>, Error> {
        let mut present = Vec::new();
        for (name, entity, field) in AUGMENTATION_FILES {
            let field = UpdatableField::parse(entity, field)?;
            let file = self.file(name);
            if file.is_file() {
                present.push((file, field));
            }
        }
        let ignored = self.file(RECO2GENDER);
        if ignored.is_file() {
            warn!(
                "{:?} is not imported: recordings have no gender field",
                ignored
            );
        }
        Ok(present)
    }
}
