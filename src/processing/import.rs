/*! Corpus directory to store

Recordings come from `wav.scp`, sentences from `text`, speakers from `utt2spk`.
Utterances are then built from `segments` (or from `text` identifiers when there's no segments file),
and augmentation files update the stored entities.

Sentences are deduplicated on their normalized text, and identified by order of first appearance (`sent_00000`, `sent_00001`…).
!*/
use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use log::{debug, info, warn};

use crate::error::Error;
use crate::io::{
    datadir::{Segments, TEXT, UTT2SPK, WAV_SCP},
    DataDir, LineReader,
};
use crate::store::{
    models::normalize, Provider, Recording, Sentence, Speaker, Store, UpdatableField, Utterance,
};

/// Store recordings, returning their ids.
fn build_recordings(
    store: &Store,
    dir: &DataDir,
    corpus: &str,
) -> Result<HashSet<String>, Error> {
    let mut reco_ids = HashSet::new();
    for entry in LineReader::new(&dir.file(WAV_SCP))?.min_fields(1) {
        let entry = entry?;
        let recording = Recording::new(entry.id.clone(), entry.value(), Some(corpus.to_string()));
        if !store.insert(&recording)? {
            warn!("duplicate recording {}, keeping the first one", entry.id);
        }
        reco_ids.insert(entry.id);
    }
    info!("{} recordings", reco_ids.len());
    Ok(reco_ids)
}

/// Store deduplicated sentences, returning an utt_id -> sent_id index.
fn build_sentences(store: &Store, dir: &DataDir) -> Result<HashMap<String, String>, Error> {
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut sentences = HashMap::new();

    for entry in LineReader::new(&dir.file(TEXT))? {
        let entry = entry?;
        let transcript = normalize(&entry.value());

        let sent_id = match seen.get(&transcript) {
            Some(sent_id) => sent_id.clone(),
            None => {
                let sentence = Sentence::new(Sentence::id_from_index(seen.len()), &transcript);
                store.insert(&sentence)?;
                seen.insert(transcript, sentence.sent_id.clone());
                sentence.sent_id
            }
        };
        sentences.insert(entry.id, sent_id);
    }

    info!(
        "{} sentences for {} transcripts",
        seen.len(),
        sentences.len()
    );
    Ok(sentences)
}

/// Store speakers, returning an utt_id -> spk_id index.
fn build_speakers(store: &Store, dir: &DataDir) -> Result<HashMap<String, String>, Error> {
    let mut speakers = HashMap::new();
    let mut nb_speakers = 0;

    for entry in LineReader::new(&dir.file(UTT2SPK))?.min_fields(1) {
        let entry = entry?;
        let spk_id = entry.fields[0].clone();
        if store.insert(&Speaker::new(spk_id.clone()))? {
            nb_speakers += 1;
        }
        speakers.insert(entry.id, spk_id);
    }

    info!("{} speakers", nb_speakers);
    Ok(speakers)
}

/// Store utterances, linking them to their recording, speaker and sentence.
fn build_utterances(
    store: &Store,
    dir: &DataDir,
    segments: &Segments,
    recordings: &HashSet<String>,
    sentences: &HashMap<String, String>,
    speakers: &HashMap<String, String>,
) -> Result<usize, Error> {
    let source = match segments {
        Segments::File(path) => path.clone(),
        Segments::Dummy(_) => dir.file(TEXT),
    };
    let unknown = |id: &str| Error::UnknownIdentifier {
        path: source.clone(),
        id: id.to_string(),
    };

    let mut nb_utterances = 0;
    for segment in segments.read()? {
        if !recordings.contains(&segment.reco_id) {
            return Err(unknown(&segment.reco_id));
        }
        let spk_id = speakers
            .get(&segment.utt_id)
            .ok_or_else(|| unknown(&segment.utt_id))?;
        let sent_id = sentences
            .get(&segment.utt_id)
            .ok_or_else(|| unknown(&segment.utt_id))?;

        let utterance = Utterance::new(
            segment.utt_id.clone(),
            segment.reco_id,
            spk_id.clone(),
            sent_id.clone(),
        );
        let utterance = match segment.times {
            Some((start, end)) => utterance.with_segment(start, end),
            None => utterance,
        };

        if store.insert(&utterance)? {
            nb_utterances += 1;
        } else {
            warn!("duplicate utterance {}, keeping the first one", segment.utt_id);
        }
    }

    info!("{} utterances", nb_utterances);
    Ok(nb_utterances)
}

/// Update `field` from each line of an augmentation file.
///
/// Identifiers that are not in the store are skipped.
fn update_from_file(store: &Store, path: &Path, field: UpdatableField) -> Result<usize, Error> {
    let mut updated = 0;
    for entry in LineReader::new(path)? {
        let entry = entry?;
        if store.update(field, &entry.id, &entry.value())? {
            updated += 1;
        } else {
            warn!(
                "{:?}: no {} {}, skipping",
                path.file_name().unwrap_or_default(),
                field.entity(),
                entry.id
            );
        }
    }
    debug!("{:?}: {} {} updated", path, updated, field.entity());
    Ok(updated)
}

/// Import the corpus directory at `data_dir` into a new store at `store_path`.
///
/// `corpus` labels the recordings, defaulting to the directory name.
///
/// Fails with [Error::TargetAlreadyExists] if `store_path` exists,
/// and with [Error::MissingRequiredFile] if a required corpus file is missing.
/// Everything is written in a single transaction.
pub fn import(
    data_dir: &Path,
    store_path: &Path,
    provider: Provider,
    corpus: Option<&str>,
) -> Result<Store, Error> {
    if store_path.exists() {
        return Err(Error::TargetAlreadyExists(store_path.to_path_buf()));
    }
    let dir = DataDir::open(data_dir)?;
    let corpus = corpus.map(String::from).unwrap_or_else(|| dir.name());

    info!("importing {:?} ({}) into {:?}", data_dir, corpus, store_path);
    let store = Store::create(store_path, provider)?;
    import_into(&store, &dir, &corpus)?;
    Ok(store)
}

/// Import `dir` into an already opened (empty) store.
pub fn import_into(store: &Store, dir: &DataDir, corpus: &str) -> Result<(), Error> {
    let segments = dir.segments()?;
    if segments.is_dummy() {
        info!("no segments file, one utterance per recording");
    }

    let tx = store.begin()?;

    let recordings = build_recordings(store, dir, corpus)?;
    let sentences = build_sentences(store, dir)?;
    let speakers = build_speakers(store, dir)?;
    build_utterances(store, dir, &segments, &recordings, &sentences, &speakers)?;

    for (path, field) in dir.augmentations()? {
        info!("updating {} {} from {:?}", field.entity(), field.name(), path);
        update_from_file(store, &path, field)?;
    }

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::io::datadir::{SEGMENTS, UTT2DUR};
    use crate::store::EntityKind;

    fn data_dir(dir: &Path) -> DataDir {
        fs::write(
            dir.join(TEXT),
            "u1 hello world\nu2  hello   world \nu3 goodbye\n",
        )
        .unwrap();
        fs::write(dir.join(WAV_SCP), "u1 /a/u1.wav\nu2 /a/u2.wav\nu3 sox /a/u3.flac -t wav - |\n").unwrap();
        fs::write(dir.join(UTT2SPK), "u1 s1\nu2 s2\nu3 s1\n").unwrap();
        DataDir::open(dir).unwrap()
    }

    #[test]
    fn sentence_dedup() {
        let dir = tempdir().unwrap();
        let d = data_dir(dir.path());
        let store = Store::in_memory().unwrap();
        import_into(&store, &d, "corpus").unwrap();

        let sentences = store.all::<Sentence>().unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].sent_id, "sent_00000");
        assert_eq!(sentences[0].text, "hello world");
        assert_eq!(sentences[0].length, 2);
        assert_eq!(sentences[1].sent_id, "sent_00001");
        assert_eq!(sentences[1].text, "goodbye");

        let utts = store
            .utterances_of(EntityKind::Sentence, "sent_00000")
            .unwrap();
        let ids: Vec<&str> = utts.iter().map(|u| u.utt_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
    }

    #[test]
    fn whole_recordings() {
        let dir = tempdir().unwrap();
        let d = data_dir(dir.path());
        let store = Store::in_memory().unwrap();
        import_into(&store, &d, "corpus").unwrap();

        let u3: Utterance = store.get("u3").unwrap().unwrap();
        assert_eq!(u3.reco_id, "u3");
        assert_eq!(u3.spk_id, "s1");
        assert!(!u3.is_segment);
        assert_eq!(u3.start_time, None);

        let r3: Recording = store.get("u3").unwrap().unwrap();
        assert_eq!(r3.wav, "sox /a/u3.flac -t wav - |");
        assert_eq!(r3.corpus.as_deref(), Some("corpus"));
        assert_eq!(store.count::<Speaker>().unwrap(), 2);
        assert!(!dir.path().join(SEGMENTS).exists());
    }

    #[test]
    fn segmented() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(TEXT), "a1 one\na2 two\n").unwrap();
        fs::write(dir.path().join(WAV_SCP), "rec /rec.wav\n").unwrap();
        fs::write(dir.path().join(UTT2SPK), "a1 s\na2 s\n").unwrap();
        fs::write(dir.path().join(SEGMENTS), "a1 rec 0.5 2.0\na2 rec -1.0 -1.0\n").unwrap();
        fs::write(dir.path().join(UTT2DUR), "a2 7.25\nghost 1.0\n").unwrap();
        let d = DataDir::open(dir.path()).unwrap();

        let store = Store::in_memory().unwrap();
        import_into(&store, &d, "c").unwrap();

        let a1: Utterance = store.get("a1").unwrap().unwrap();
        assert!(a1.is_segment);
        assert_eq!(a1.start_time, Some(0.5));
        assert_eq!(a1.end_time, Some(2.0));
        assert_eq!(a1.duration, Some(1.5));

        let a2: Utterance = store.get("a2").unwrap().unwrap();
        assert!(!a2.is_segment);
        assert_eq!(a2.duration, Some(7.25));
        assert_eq!(
            store.utterances_of(EntityKind::Recording, "rec").unwrap().len(),
            2
        );
    }

    #[test]
    fn unknown_recording() {
        let dir = tempdir().unwrap();
        let d = data_dir(dir.path());
        fs::write(dir.path().join(SEGMENTS), "u1 nowhere 0.0 1.0\n").unwrap();

        let store = Store::in_memory().unwrap();
        match import_into(&store, &d, "c") {
            Err(Error::UnknownIdentifier { id, .. }) => assert_eq!(id, "nowhere"),
            other => panic!("expected unknown identifier, got {:?}", other),
        }
        // nothing committed
        assert_eq!(store.count::<Recording>().unwrap(), 0);
    }

    #[test]
    fn guards() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        data_dir(&data);

        let store_path = dir.path().join("data.db");
        fs::write(&store_path, "").unwrap();
        assert!(matches!(
            import(&data, &store_path, Provider::Sqlite, None),
            Err(Error::TargetAlreadyExists(_))
        ));
        fs::remove_file(&store_path).unwrap();

        fs::remove_file(data.join(UTT2SPK)).unwrap();
        assert!(matches!(
            import(&data, &store_path, Provider::Sqlite, None),
            Err(Error::MissingRequiredFile(_))
        ));
        assert!(!store_path.exists());
    }

    #[test]
    fn default_corpus_label() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("librispeech");
        fs::create_dir(&data).unwrap();
        data_dir(&data);

        let store = import(&data, &dir.path().join("ls.db"), Provider::Sqlite, None).unwrap();
        let r: Recording = store.get("u1").unwrap().unwrap();
        assert_eq!(r.corpus.as_deref(), Some("librispeech"));
    }
}
