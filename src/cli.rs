//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use kaldi_store::processing::{Ratios, SplitKey};
use kaldi_store::store::Provider;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "kaldi-store",
    about = "Kaldi-style corpus directory to relational store conversion and splitting."
)]
/// Holds every command that is callable by the `kaldi-store` command.
pub enum KaldiStore {
    #[structopt(about = "Import a corpus directory into a new store")]
    Import(Import),
    #[structopt(about = "Export a store into a new corpus directory")]
    Export(Export),
    #[structopt(about = "Split a store into subsets (train/dev/test by default)")]
    Split(Split),
}

#[derive(Debug, StructOpt)]
/// Import command and parameters.
///
/// ```sh
/// kaldi-store import [OPTIONS] <data-dir> [store]
/// ```
pub struct Import {
    #[structopt(parse(from_os_str), help = "corpus directory (text, wav.scp, utt2spk…)")]
    pub data_dir: PathBuf,
    #[structopt(
        parse(from_os_str),
        help = "store to create. Defaults to the corpus directory name."
    )]
    pub store: Option<PathBuf>,
    #[structopt(long = "provider", default_value = "sqlite", help = "store backend")]
    pub provider: Provider,
    #[structopt(
        long = "corpus",
        help = "corpus label of recordings. Defaults to the corpus directory name."
    )]
    pub corpus: Option<String>,
}

#[derive(Debug, StructOpt)]
/// Export command and parameters.
pub struct Export {
    #[structopt(parse(from_os_str), help = "source store")]
    pub store: PathBuf,
    #[structopt(parse(from_os_str), help = "corpus directory to create")]
    pub data_dir: PathBuf,
    #[structopt(long = "provider", default_value = "sqlite", help = "store backend")]
    pub provider: Provider,
}

#[derive(Debug, StructOpt)]
/// Split command and parameters.
///
/// ```sh
/// kaldi-store split data/corpus.db spk data/split --ratios '{"train": 0.8, "test": 0.2}'
/// ```
pub struct Split {
    #[structopt(parse(from_os_str), help = "source store")]
    pub store: PathBuf,
    #[structopt(help = "split by utterance (utt), speaker (spk) or sentence (sent)")]
    pub split_by: SplitKey,
    #[structopt(
        parse(from_os_str),
        help = "destination of subset corpus directories. Required unless --no-data is set."
    )]
    pub output_dir: Option<PathBuf>,
    #[structopt(
        long = "ratios",
        default_value = r#"{"train": 0.7, "dev": 0.15, "test": 0.15}"#,
        help = "JSON object of subset name -> weight"
    )]
    pub ratios: Ratios,
    #[structopt(long = "no-store", help = "do not keep subset stores")]
    pub no_store: bool,
    #[structopt(long = "no-data", help = "do not export subsets as corpus directories")]
    pub no_data: bool,
    #[structopt(long = "seed", default_value = "3", help = "random seed")]
    pub seed: u64,
    #[structopt(long = "provider", default_value = "sqlite", help = "store backend")]
    pub provider: Provider,
}
