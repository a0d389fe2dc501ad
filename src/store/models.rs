//! Stored entities and their updatable fields.
use std::{fmt, str::FromStr};

use itertools::Itertools;

use crate::error::Error;

/// Trim and collapse whitespace: tokens are joined by single spaces.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Recording,
    Speaker,
    Sentence,
    Utterance,
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Recording" => Ok(Self::Recording),
            "Speaker" => Ok(Self::Speaker),
            "Sentence" => Ok(Self::Sentence),
            "Utterance" => Ok(Self::Utterance),
            other => Err(Error::InvalidEntityKind(other.to_string())),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Recording => "Recording",
            Self::Speaker => "Speaker",
            Self::Sentence => "Sentence",
            Self::Utterance => "Utterance",
        };
        write!(f, "{}", s)
    }
}

/// A whole audio file.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub reco_id: String,
    pub wav: String,
    pub corpus: Option<String>,
    /// seconds
    pub duration: Option<f64>,
}

impl Recording {
    pub fn new(reco_id: String, wav: String, corpus: Option<String>) -> Self {
        Self {
            reco_id,
            wav,
            corpus,
            duration: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Speaker {
    pub spk_id: String,
    pub gender: Option<String>,
    /// path to cmvn statistics
    pub cmvn: Option<String>,
}

impl Speaker {
    pub fn new(spk_id: String) -> Self {
        Self {
            spk_id,
            gender: None,
            cmvn: None,
        }
    }
}

/// A transcript, shared by every utterance having the same normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub sent_id: String,
    pub text: String,
    /// word count of `text`
    pub length: usize,
}

impl Sentence {
    /// Builds a sentence from a raw transcript, normalizing whitespace.
    pub fn new(sent_id: String, text: &str) -> Self {
        let text = normalize(text);
        let length = text.split_whitespace().count();
        Self {
            sent_id,
            text,
            length,
        }
    }

    /// Sequential identifier of the `index`-th distinct transcript.
    pub fn id_from_index(index: usize) -> String {
        format!("sent_{:05}", index)
    }
}

/// A (possibly segmented) part of a [Recording], said by a [Speaker].
///
/// Holds the foreign keys of its three parents.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub utt_id: String,
    pub reco_id: String,
    pub spk_id: String,
    pub sent_id: String,
    pub feat: Option<String>,
    pub duration: Option<f64>,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub is_segment: bool,
}

impl Utterance {
    /// Utterance spanning a whole recording.
    pub fn new(utt_id: String, reco_id: String, spk_id: String, sent_id: String) -> Self {
        Self {
            utt_id,
            reco_id,
            spk_id,
            sent_id,
            feat: None,
            duration: None,
            start_time: None,
            end_time: None,
            is_segment: false,
        }
    }

    /// Mark as a segment of its recording, setting duration to `end - start`.
    pub fn with_segment(mut self, start: f64, end: f64) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self.duration = Some(end - start);
        self.is_segment = true;
        self
    }
}

/// The fields that can be updated once an entity is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdatableField {
    RecordingWav,
    RecordingDuration,
    SpeakerGender,
    SpeakerCmvn,
    SentenceText,
    UtteranceFeat,
    UtteranceDuration,
}

impl UpdatableField {
    /// Resolve an (entity, field) name couple.
    ///
    /// Fails with [Error::InvalidEntityKind] for unknown entities
    /// and [Error::InvalidField] for fields that are not updatable.
    pub fn parse(entity: &str, field: &str) -> Result<Self, Error> {
        let kind: EntityKind = entity.parse()?;
        let f = match (kind, field) {
            (EntityKind::Recording, "wav") => Self::RecordingWav,
            (EntityKind::Recording, "duration") => Self::RecordingDuration,
            (EntityKind::Speaker, "gender") => Self::SpeakerGender,
            (EntityKind::Speaker, "cmvn") => Self::SpeakerCmvn,
            (EntityKind::Sentence, "text") => Self::SentenceText,
            (EntityKind::Utterance, "feat") => Self::UtteranceFeat,
            (EntityKind::Utterance, "duration") => Self::UtteranceDuration,
            _ => {
                return Err(Error::InvalidField {
                    entity: kind.to_string(),
                    field: field.to_string(),
                })
            }
        };
        Ok(f)
    }

    pub fn entity(&self) -> EntityKind {
        match self {
            Self::RecordingWav | Self::RecordingDuration => EntityKind::Recording,
            Self::SpeakerGender | Self::SpeakerCmvn => EntityKind::Speaker,
            Self::SentenceText => EntityKind::Sentence,
            Self::UtteranceFeat | Self::UtteranceDuration => EntityKind::Utterance,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RecordingWav => "wav",
            Self::RecordingDuration | Self::UtteranceDuration => "duration",
            Self::SpeakerGender => "gender",
            Self::SpeakerCmvn => "cmvn",
            Self::SentenceText => "text",
            Self::UtteranceFeat => "feat",
        }
    }
}
