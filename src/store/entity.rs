/*! Table mapping of stored entities.

Each entity is stored in its own table, keyed by its natural identifier.
!*/
use rusqlite::{Row, ToSql};

use super::models::{EntityKind, Recording, Sentence, Speaker, Utterance};

/// Mapping between an entity and its table.
pub trait Entity: Sized {
    const KIND: EntityKind;
    const TABLE: &'static str;
    /// Column names, natural key first.
    const COLUMNS: &'static [&'static str];

    /// Natural key value.
    fn key(&self) -> &str;

    /// Values in [Entity::COLUMNS] order.
    fn to_params(&self) -> Vec<&dyn ToSql>;

    /// Rows are selected with [Entity::COLUMNS] in order.
    fn from_row(row: &Row) -> rusqlite::Result<Self>;

    fn key_column() -> &'static str {
        Self::COLUMNS[0]
    }
}

impl Entity for Recording {
    const KIND: EntityKind = EntityKind::Recording;
    const TABLE: &'static str = "recordings";
    const COLUMNS: &'static [&'static str] = &["reco_id", "wav", "corpus", "duration"];

    fn key(&self) -> &str {
        &self.reco_id
    }

    fn to_params(&self) -> Vec<&dyn ToSql> {
        vec![&self.reco_id as &dyn ToSql, &self.wav, &self.corpus, &self.duration]
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            reco_id: row.get(0)?,
            wav: row.get(1)?,
            corpus: row.get(2)?,
            duration: row.get(3)?,
        })
    }
}

impl Entity for Speaker {
    const KIND: EntityKind = EntityKind::Speaker;
    const TABLE: &'static str = "speakers";
    const COLUMNS: &'static [&'static str] = &["spk_id", "gender", "cmvn"];

    fn key(&self) -> &str {
        &self.spk_id
    }

    fn to_params(&self) -> Vec<&dyn ToSql> {
        vec![&self.spk_id as &dyn ToSql, &self.gender, &self.cmvn]
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            spk_id: row.get(0)?,
            gender: row.get(1)?,
            cmvn: row.get(2)?,
        })
    }
}

impl Entity for Sentence {
    const KIND: EntityKind = EntityKind::Sentence;
    const TABLE: &'static str = "sentences";
    const COLUMNS: &'static [&'static str] = &["sent_id", "text", "length"];

    fn key(&self) -> &str {
        &self.sent_id
    }

    fn to_params(&self) -> Vec<&dyn ToSql> {
        vec![&self.sent_id as &dyn ToSql, &self.text, &self.length]
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            sent_id: row.get(0)?,
            text: row.get(1)?,
            length: row.get(2)?,
        })
    }
}

impl Entity for Utterance {
    const KIND: EntityKind = EntityKind::Utterance;
    const TABLE: &'static str = "utterances";
    const COLUMNS: &'static [&'static str] = &[
        "utt_id",
        "reco_id",
        "spk_id",
        "sent_id",
        "feat",
        "duration",
        "start_time",
        "end_time",
        "is_segment",
    ];

    fn key(&self) -> &str {
        &self.utt_id
    }

    fn to_params(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.utt_id as &dyn ToSql,
            &self.reco_id,
            &self.spk_id,
            &self.sent_id,
            &self.feat,
            &self.duration,
            &self.start_time,
            &self.end_time,
            &self.is_segment,
        ]
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            utt_id: row.get(0)?,
            reco_id: row.get(1)?,
            spk_id: row.get(2)?,
            sent_id: row.get(3)?,
            feat: row.get(4)?,
            duration: row.get(5)?,
            start_time: row.get(6)?,
            end_time: row.get(7)?,
            is_segment: row.get(8)?,
        })
    }
}
