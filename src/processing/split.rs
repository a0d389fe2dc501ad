/*! splitting

Split a store into named subsets (e.g. train/dev/test) following ratios.

Subset membership is decided on one of the utterance, speaker or sentence identifiers,
so that e.g. splitting by speaker never puts two utterances of the same speaker into different subsets.

Each utterance is then copied, along with its recording, speaker and sentence, into the store of its subset.
Parents are only copied once per subset.
!*/
use std::{
    collections::HashMap,
    fmt,
    path::{Component, Path, PathBuf},
    str::FromStr,
};

use log::{debug, info};
use rand::Rng;

use super::{assign, export::export_store};
use crate::error::Error;
use crate::store::{Provider, Recording, Sentence, Speaker, Store, Utterance};

/// Identifier that decides subset membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKey {
    Utterance,
    Speaker,
    Sentence,
}

impl SplitKey {
    /// Partition key of `utterance`.
    fn of<'a>(&self, utterance: &'a Utterance) -> &'a str {
        match self {
            Self::Utterance => &utterance.utt_id,
            Self::Speaker => &utterance.spk_id,
            Self::Sentence => &utterance.sent_id,
        }
    }

    /// Every distinct key, in ascending order.
    fn keys(&self, store: &Store) -> Result<Vec<String>, Error> {
        match self {
            Self::Utterance => store.keys::<Utterance>(),
            Self::Speaker => store.keys::<Speaker>(),
            Self::Sentence => store.keys::<Sentence>(),
        }
    }
}

impl FromStr for SplitKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "utt" => Ok(Self::Utterance),
            "spk" => Ok(Self::Speaker),
            "sent" => Ok(Self::Sentence),
            other => Err(Error::InvalidSplitKey(other.to_string())),
        }
    }
}

impl fmt::Display for SplitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Utterance => "utt",
            Self::Speaker => "spk",
            Self::Sentence => "sent",
        };
        write!(f, "{}", s)
    }
}

/// Ordered subset names and weights.
///
/// Weights do not have to sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Ratios(Vec<(String, f64)>);

impl Ratios {
    /// Fails on an empty list, on duplicate names and on names that are not a single path component.
    pub fn new(ratios: Vec<(String, f64)>) -> Result<Self, Error> {
        if ratios.is_empty() {
            return Err(Error::InvalidRatio("no subset specified".to_string()));
        }
        for (i, (name, _)) in ratios.iter().enumerate() {
            // names end up in file and directory names
            let mut components = Path::new(name).components();
            if !matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(n)), None) if n == name.as_str()
            ) {
                return Err(Error::InvalidRatio(format!(
                    "subset name {:?} is not a plain file name",
                    name
                )));
            }
            if ratios[..i].iter().any(|(other, _)| other == name) {
                return Err(Error::InvalidRatio(format!("duplicate subset {}", name)));
            }
        }
        Ok(Self(ratios))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn weights(&self) -> Vec<f64> {
        self.0.iter().map(|(_, weight)| *weight).collect()
    }
}

impl Default for Ratios {
    fn default() -> Self {
        Self(vec![
            ("train".to_string(), 0.7),
            ("dev".to_string(), 0.15),
            ("test".to_string(), 0.15),
        ])
    }
}

/// Parse a JSON object of subset name to weight, keeping key order.
impl FromStr for Ratios {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(s)?;
        let ratios = map
            .into_iter()
            .map(|(name, weight)| match weight.as_f64() {
                Some(w) => Ok((name, w)),
                None => Err(Error::InvalidRatio(format!(
                    "weight of {} is not a number: {}",
                    name, weight
                ))),
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Self::new(ratios)
    }
}

#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub split_by: SplitKey,
    /// Where subset corpus directories are written. Required if `save_data` is set.
    pub output_dir: Option<PathBuf>,
    pub ratios: Ratios,
    /// Keep subset stores.
    pub save_store: bool,
    /// Export each subset as a corpus directory in `output_dir/<name>`.
    pub save_data: bool,
    pub provider: Provider,
}

impl SplitOptions {
    pub fn new(split_by: SplitKey) -> Self {
        Self {
            split_by,
            output_dir: None,
            ratios: Ratios::default(),
            save_store: true,
            save_data: true,
            provider: Provider::default(),
        }
    }
}

/// What ended up in a subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetSummary {
    pub name: String,
    /// `None` if the subset store has not been kept.
    pub store: Option<PathBuf>,
    /// `None` if the subset has not been exported.
    pub data: Option<PathBuf>,
    pub recordings: usize,
    pub speakers: usize,
    pub sentences: usize,
    pub utterances: usize,
}

/// `<dir>/<stem>_<split_by>_<name>.store`, whatever the extension of `store_path`.
pub fn subset_store_path(store_path: &Path, split_by: SplitKey, name: &str) -> PathBuf {
    let stem = store_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    store_path.with_file_name(format!("{}_{}_{}.store", stem, split_by, name))
}

/// Parents of every utterance of the source store, by key.
struct Parents {
    recordings: HashMap<String, Recording>,
    speakers: HashMap<String, Speaker>,
    sentences: HashMap<String, Sentence>,
}

impl Parents {
    fn load(store: &Store) -> Result<Self, Error> {
        Ok(Self {
            recordings: store
                .all::<Recording>()?
                .into_iter()
                .map(|r| (r.reco_id.clone(), r))
                .collect(),
            speakers: store
                .all::<Speaker>()?
                .into_iter()
                .map(|s| (s.spk_id.clone(), s))
                .collect(),
            sentences: store
                .all::<Sentence>()?
                .into_iter()
                .map(|s| (s.sent_id.clone(), s))
                .collect(),
        })
    }

    /// Copy `utterance` and its parents into `target`, skipping entities already there.
    ///
    /// Returns `false` if the utterance was already in `target`.
    fn copy_into(&self, target: &Store, utterance: &Utterance) -> Result<bool, Error> {
        let missing = |what: &str, key: &str| {
            Error::Custom(format!(
                "utterance {} references missing {} {}",
                utterance.utt_id, what, key
            ))
        };
        let recording = self
            .recordings
            .get(&utterance.reco_id)
            .ok_or_else(|| missing("recording", &utterance.reco_id))?;
        let speaker = self
            .speakers
            .get(&utterance.spk_id)
            .ok_or_else(|| missing("speaker", &utterance.spk_id))?;
        let sentence = self
            .sentences
            .get(&utterance.sent_id)
            .ok_or_else(|| missing("sentence", &utterance.sent_id))?;

        target.insert(recording)?;
        target.insert(speaker)?;
        target.insert(sentence)?;
        target.insert(utterance)
    }
}

/// Split the store at `store_path` following `options`.
///
/// One subset store is created per ratio name next to the source (see [subset_store_path]),
/// and optionally exported to `output_dir/<name>`.
///
/// `rng` is only used to draw one value per partition key, in ascending key order.
pub fn split<R: Rng + ?Sized>(
    store_path: &Path,
    options: &SplitOptions,
    rng: &mut R,
) -> Result<Vec<SubsetSummary>, Error> {
    let output_dir = match (&options.output_dir, options.save_data) {
        (None, true) => {
            return Err(Error::Custom(
                "an output directory is required to save data".to_string(),
            ))
        }
        (dir, _) => dir.as_deref(),
    };

    let source = Store::open(store_path, options.provider)?;
    let names: Vec<&str> = options.ratios.names().collect();
    let paths: Vec<PathBuf> = names
        .iter()
        .map(|name| subset_store_path(store_path, options.split_by, name))
        .collect();
    if let Some(existing) = paths.iter().find(|p| p.exists()) {
        return Err(Error::TargetAlreadyExists(existing.clone()));
    }

    // assign partition keys
    let keys = options.split_by.keys(&source)?;
    let assignments = assign::assign(&options.ratios.weights(), keys.len(), rng)?;
    let key2subset: HashMap<String, usize> = keys.into_iter().zip(assignments).collect();
    info!(
        "{} {} keys assigned to {} subsets",
        key2subset.len(),
        options.split_by,
        names.len()
    );

    // copy utterances
    let targets = paths
        .iter()
        .map(|p| Store::create(p, options.provider))
        .collect::<Result<Vec<Store>, Error>>()?;
    let txs = targets
        .iter()
        .map(|t| t.begin())
        .collect::<Result<Vec<_>, Error>>()?;

    let parents = Parents::load(&source)?;
    for utterance in source.all::<Utterance>()? {
        let key = options.split_by.of(&utterance);
        let subset = *key2subset.get(key).ok_or_else(|| {
            Error::Custom(format!(
                "no subset for {} {}",
                options.split_by, key
            ))
        })?;
        if !parents.copy_into(&targets[subset], &utterance)? {
            debug!("{} already in {}", utterance.utt_id, names[subset]);
        }
    }

    for tx in txs {
        tx.commit()?;
    }

    let mut summaries = Vec::with_capacity(targets.len());
    for ((target, name), path) in targets.iter().zip(&names).zip(&paths) {
        let summary = SubsetSummary {
            name: name.to_string(),
            store: Some(path.clone()),
            data: None,
            recordings: target.count::<Recording>()?,
            speakers: target.count::<Speaker>()?,
            sentences: target.count::<Sentence>()?,
            utterances: target.count::<Utterance>()?,
        };
        info!(
            "[{}] {} utterances, {} speakers, {} sentences, {} recordings",
            summary.name,
            summary.utterances,
            summary.speakers,
            summary.sentences,
            summary.recordings
        );
        summaries.push(summary);
    }

    if options.save_data {
        if let Some(output_dir) = output_dir {
            std::fs::create_dir_all(output_dir)?;
            for (target, summary) in targets.iter().zip(summaries.iter_mut()) {
                let data_dir = output_dir.join(&summary.name);
                export_store(target, &data_dir)?;
                summary.data = Some(data_dir);
            }
        }
    }

    // close stores before removing them
    drop(targets);
    if !options.save_store {
        for (path, summary) in paths.iter().zip(summaries.iter_mut()) {
            debug!("removing {:?}", path);
            std::fs::remove_file(path)?;
            summary.store = None;
        }
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keys() {
        assert_eq!("utt".parse::<SplitKey>().unwrap(), SplitKey::Utterance);
        assert_eq!("spk".parse::<SplitKey>().unwrap(), SplitKey::Speaker);
        assert_eq!("sent".parse::<SplitKey>().unwrap(), SplitKey::Sentence);
        assert!(matches!(
            "speaker".parse::<SplitKey>(),
            Err(Error::InvalidSplitKey(_))
        ));
        assert_eq!(SplitKey::Sentence.to_string(), "sent");
    }

    #[test]
    fn ratios_keep_order() {
        let r: Ratios = r#"{"train": 8, "test": 1, "dev": 1.5}"#.parse().unwrap();
        assert_eq!(r.names().collect::<Vec<_>>(), vec!["train", "test", "dev"]);
        assert_eq!(r.weights(), vec![8.0, 1.0, 1.5]);
    }

    #[test]
    fn bad_ratios() {
        assert!(matches!(
            r#"{"train": "most"}"#.parse::<Ratios>(),
            Err(Error::InvalidRatio(_))
        ));
        assert!(matches!("{}".parse::<Ratios>(), Err(Error::InvalidRatio(_))));
        assert!(matches!("[0.5]".parse::<Ratios>(), Err(Error::Serde(_))));
        assert!(matches!(
            Ratios::new(vec![("a".into(), 1.0), ("a".into(), 2.0)]),
            Err(Error::InvalidRatio(_))
        ));
        for name in ["../../escaped", "/abs", "a/b", "a/", ".", "..", ""] {
            assert!(
                matches!(
                    Ratios::new(vec![(name.to_string(), 1.0)]),
                    Err(Error::InvalidRatio(_))
                ),
                "{:?} accepted",
                name
            );
        }
        assert!(matches!(
            r#"{"../escaped": 1}"#.parse::<Ratios>(),
            Err(Error::InvalidRatio(_))
        ));
        assert!(Ratios::new(vec![("train.v2".into(), 1.0)]).is_ok());
    }

    #[test]
    fn default_ratios() {
        let r = Ratios::default();
        assert_eq!(r.names().collect::<Vec<_>>(), vec!["train", "dev", "test"]);
        assert_eq!(r.weights(), vec![0.7, 0.15, 0.15]);
    }

    #[test]
    fn store_paths() {
        assert_eq!(
            subset_store_path(Path::new("/data/corpus.db"), SplitKey::Speaker, "train"),
            PathBuf::from("/data/corpus_spk_train.store")
        );
        assert_eq!(
            subset_store_path(Path::new("corpus"), SplitKey::Utterance, "dev"),
            PathBuf::from("corpus_utt_dev.store")
        );
    }
}
