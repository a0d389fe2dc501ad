/*! Store to corpus directory

Writes `wav.scp`/`reco2dur` from recordings, `spk2gender`/`spk2utt`/`cmvn.scp` from speakers,
and `text`/`utt2spk`/`feats.scp`/`utt2dur`/`segments` from utterances.
Lines are ordered by identifier. Optional fields that are not set produce no line,
and files with no line are not kept.
!*/
use std::{collections::HashMap, path::Path};

use itertools::Itertools;
use log::info;

use crate::error::Error;
use crate::io::{
    datadir::{
        CMVN_SCP, FEATS_SCP, RECO2DUR, SEGMENTS, SPK2GENDER, SPK2UTT, TEXT, UTT2DUR, UTT2SPK,
        WAV_SCP,
    },
    writer::format_float,
    DataWriter,
};
use crate::store::{EntityKind, Provider, Recording, Sentence, Speaker, Store, Utterance};

const FILES: [&str; 10] = [
    WAV_SCP, RECO2DUR, SPK2GENDER, SPK2UTT, CMVN_SCP, UTT2SPK, TEXT, FEATS_SCP, UTT2DUR, SEGMENTS,
];

fn write_recordings(store: &Store, w: &mut DataWriter) -> Result<(), Error> {
    let recordings = store.all::<Recording>()?;
    for r in &recordings {
        w.write_line(WAV_SCP, &r.reco_id, &r.wav)?;
        if let Some(duration) = r.duration {
            w.write_line(RECO2DUR, &r.reco_id, &format_float(duration))?;
        }
    }
    info!("{} recordings written", recordings.len());
    Ok(())
}

fn write_speakers(store: &Store, w: &mut DataWriter) -> Result<(), Error> {
    let speakers = store.all::<Speaker>()?;
    for s in &speakers {
        if let Some(gender) = &s.gender {
            w.write_line(SPK2GENDER, &s.spk_id, gender)?;
        }
        if let Some(cmvn) = &s.cmvn {
            w.write_line(CMVN_SCP, &s.spk_id, cmvn)?;
        }

        let utterances = store.utterances_of(EntityKind::Speaker, &s.spk_id)?;
        if !utterances.is_empty() {
            let utt_ids = utterances.iter().map(|u| &u.utt_id).join(" ");
            w.write_line(SPK2UTT, &s.spk_id, &utt_ids)?;
        }
    }
    info!("{} speakers written", speakers.len());
    Ok(())
}

fn write_utterances(store: &Store, w: &mut DataWriter) -> Result<(), Error> {
    let sentences: HashMap<String, Sentence> = store
        .all::<Sentence>()?
        .into_iter()
        .map(|s| (s.sent_id.clone(), s))
        .collect();

    let utterances = store.all::<Utterance>()?;
    for u in &utterances {
        let sentence = sentences
            .get(&u.sent_id)
            .ok_or_else(|| Error::Custom(format!("utterance {} has no sentence", u.utt_id)))?;

        w.write_line(TEXT, &u.utt_id, &sentence.text)?;
        w.write_line(UTT2SPK, &u.utt_id, &u.spk_id)?;
        if let Some(feat) = &u.feat {
            w.write_line(FEATS_SCP, &u.utt_id, feat)?;
        }
        if let Some(duration) = u.duration {
            w.write_line(UTT2DUR, &u.utt_id, &format_float(duration))?;
        }
        if let (true, Some(start), Some(end)) = (u.is_segment, u.start_time, u.end_time) {
            let segment = format!(
                "{} {} {}",
                u.reco_id,
                format_float(start),
                format_float(end)
            );
            w.write_line(SEGMENTS, &u.utt_id, &segment)?;
        }
    }
    info!("{} utterances written", utterances.len());
    Ok(())
}

/// Write the content of `store` as a corpus directory at `data_dir`.
///
/// Fails with [Error::TargetAlreadyExists] if `data_dir` exists.
pub fn export_store(store: &Store, data_dir: &Path) -> Result<(), Error> {
    if data_dir.exists() {
        return Err(Error::TargetAlreadyExists(data_dir.to_path_buf()));
    }
    std::fs::create_dir_all(data_dir)?;
    info!("exporting to {:?}", data_dir);

    let mut w = DataWriter::new(data_dir, &FILES)?;
    write_recordings(store, &mut w)?;
    write_speakers(store, &mut w)?;
    write_utterances(store, &mut w)?;
    w.close()
}

/// Write the store at `store_path` as a corpus directory at `data_dir`.
pub fn export(store_path: &Path, data_dir: &Path, provider: Provider) -> Result<(), Error> {
    if data_dir.exists() {
        return Err(Error::TargetAlreadyExists(data_dir.to_path_buf()));
    }
    let store = Store::open(store_path, provider)?;
    export_store(&store, data_dir)
}
