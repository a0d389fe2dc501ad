/*! Relational store

Holds [Recording], [Speaker], [Sentence] and [Utterance] entities in a single-file SQLite database.

Utterances hold the keys of their parents.
The utterances of a parent are never stored on the parent side, they are queried (see [Store::utterances_of]).

Insertion is done on an insert-if-absent basis (by natural key), which is also what is used to copy entities between stores.
!*/
mod entity;
mod migrations;
pub mod models;

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::error::Error;
pub use entity::Entity;
pub use models::{EntityKind, Recording, Sentence, Speaker, UpdatableField, Utterance};

/// Storage backends. Only SQLite is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Sqlite,
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::UnsupportedProvider(other.to_string())),
        }
    }
}

pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Create a new store at `path`.
    ///
    /// Fails with [Error::TargetAlreadyExists] if there's already something at `path`.
    pub fn create(path: &Path, provider: Provider) -> Result<Self, Error> {
        if path.exists() {
            return Err(Error::TargetAlreadyExists(path.to_path_buf()));
        }
        debug!("creating {:?} store at {:?}", provider, path);
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open an existing store.
    pub fn open(path: &Path, provider: Provider) -> Result<Self, Error> {
        if !path.is_file() {
            return Err(Error::MissingRequiredFile(path.to_path_buf()));
        }
        debug!("opening {:?} store at {:?}", provider, path);
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Non persistent store.
    pub fn in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, Error> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn, path })
    }

    /// None for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Start a transaction. Everything done on the store until `commit` is part of it,
    /// and is rolled back if the transaction is dropped.
    pub fn begin(&self) -> Result<Transaction<'_>, Error> {
        Ok(self.conn.unchecked_transaction()?)
    }

    /// Insert `entity` if its key is not already there.
    ///
    /// Returns `true` if the entity has been inserted.
    pub fn insert<E: Entity>(&self, entity: &E) -> Result<bool, Error> {
        let placeholders: Vec<String> = (1..=E::COLUMNS.len())
            .map(|i| format!("?{}", i))
            .collect();
        let sql = format!(
            "INSERT OR IGNORE INTO {} ({}) VALUES ({})",
            E::TABLE,
            E::COLUMNS.join(", "),
            placeholders.join(", ")
        );
        let params = entity.to_params();
        let changed = self.conn.execute(&sql, params.as_slice())?;
        if changed == 0 {
            debug!("{} {} already stored", E::KIND, entity.key());
        }
        Ok(changed > 0)
    }

    /// Get an entity by its key. Not finding it is not an error.
    pub fn get<E: Entity>(&self, key: &str) -> Result<Option<E>, Error> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            E::COLUMNS.join(", "),
            E::TABLE,
            E::key_column()
        );
        let entity = self
            .conn
            .query_row(&sql, params![key], |row| E::from_row(row))
            .optional()?;
        Ok(entity)
    }

    /// Every entity of a kind, ordered by key.
    pub fn all<E: Entity>(&self) -> Result<Vec<E>, Error> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            E::COLUMNS.join(", "),
            E::TABLE,
            E::key_column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| E::from_row(row))?;
        let entities = rows.collect::<Result<Vec<E>, _>>()?;
        Ok(entities)
    }

    /// Every key of an entity kind, in ascending order.
    pub fn keys<E: Entity>(&self) -> Result<Vec<String>, Error> {
        let sql = format!(
            "SELECT {key} FROM {} ORDER BY {key}",
            E::TABLE,
            key = E::key_column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let keys = rows.collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    pub fn count<E: Entity>(&self) -> Result<usize, Error> {
        let sql = format!("SELECT COUNT(*) FROM {}", E::TABLE);
        let count: usize = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    /// Set `field` of the entity keyed by `key` to `value`.
    ///
    /// Durations are parsed as floats.
    /// Returns `false` if there's no entity with this key.
    pub fn update(&self, field: UpdatableField, key: &str, value: &str) -> Result<bool, Error> {
        let parse_float = |value: &str| {
            value.parse::<f64>().map_err(|_| Error::InvalidValue {
                field: field.name().to_string(),
                value: value.to_string(),
            })
        };

        let changed = match field {
            UpdatableField::RecordingWav => self.conn.execute(
                "UPDATE recordings SET wav = ?1 WHERE reco_id = ?2",
                params![value, key],
            )?,
            UpdatableField::RecordingDuration => self.conn.execute(
                "UPDATE recordings SET duration = ?1 WHERE reco_id = ?2",
                params![parse_float(value)?, key],
            )?,
            UpdatableField::SpeakerGender => self.conn.execute(
                "UPDATE speakers SET gender = ?1 WHERE spk_id = ?2",
                params![value, key],
            )?,
            UpdatableField::SpeakerCmvn => self.conn.execute(
                "UPDATE speakers SET cmvn = ?1 WHERE spk_id = ?2",
                params![value, key],
            )?,
            UpdatableField::SentenceText => {
                // keep length in sync with text
                let sentence = Sentence::new(key.to_string(), value);
                self.conn.execute(
                    "UPDATE sentences SET text = ?1, length = ?2 WHERE sent_id = ?3",
                    params![sentence.text, sentence.length, key],
                )?
            }
            UpdatableField::UtteranceFeat => self.conn.execute(
                "UPDATE utterances SET feat = ?1 WHERE utt_id = ?2",
                params![value, key],
            )?,
            UpdatableField::UtteranceDuration => self.conn.execute(
                "UPDATE utterances SET duration = ?1 WHERE utt_id = ?2",
                params![parse_float(value)?, key],
            )?,
        };

        Ok(changed > 0)
    }

    /// Utterances referencing the `kind` entity keyed by `key`, ordered by utterance id.
    pub fn utterances_of(&self, kind: EntityKind, key: &str) -> Result<Vec<Utterance>, Error> {
        let column = match kind {
            EntityKind::Recording => "reco_id",
            EntityKind::Speaker => "spk_id",
            EntityKind::Sentence => "sent_id",
            EntityKind::Utterance => {
                return Err(Error::InvalidEntityKind(format!(
                    "{} does not own utterances",
                    kind
                )))
            }
        };

        let sql = format!(
            "SELECT {} FROM utterances WHERE {} = ?1 ORDER BY utt_id",
            Utterance::COLUMNS.join(", "),
            column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![key], |row| Utterance::from_row(row))?;
        let utterances = rows.collect::<Result<Vec<Utterance>, _>>()?;
        Ok(utterances)
    }
}
