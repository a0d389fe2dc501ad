//! # kaldi-store
//!
//! Converts Kaldi-style corpus directories to and from a relational store,
//! and splits stores into subsets.
//!
//! ```sh
//! USAGE:
//!     kaldi-store <SUBCOMMAND>
//!
//! SUBCOMMANDS:
//!     export    Export a store into a new corpus directory
//!     help      Prints this message or the help of the given subcommand(s)
//!     import    Import a corpus directory into a new store
//!     split     Split a store into subsets (train/dev/test by default)
//! ```
//!
//! Logging is controlled by `RUST_LOG` (e.g. `RUST_LOG=info`).
use std::path::PathBuf;

use kaldi_store::error::Error;
use kaldi_store::processing::{self, SplitOptions};
use rand::{rngs::StdRng, SeedableRng};
use structopt::StructOpt;

#[macro_use]
extern crate log;

mod cli;

fn main() -> Result<(), Error> {
    env_logger::init();

    let opt = cli::KaldiStore::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::KaldiStore::Import(i) => {
            let store = i
                .store
                .or_else(|| i.data_dir.file_name().map(PathBuf::from))
                .ok_or_else(|| {
                    Error::Custom(format!("no store name can be derived from {:?}", i.data_dir))
                })?;
            processing::import(&i.data_dir, &store, i.provider, i.corpus.as_deref())?;
            info!("imported {:?} into {:?}", i.data_dir, store);
        }

        cli::KaldiStore::Export(e) => {
            processing::export(&e.store, &e.data_dir, e.provider)?;
            info!("exported {:?} to {:?}", e.store, e.data_dir);
        }

        cli::KaldiStore::Split(s) => {
            let mut rng = StdRng::seed_from_u64(s.seed);
            let options = SplitOptions {
                split_by: s.split_by,
                output_dir: s.output_dir,
                ratios: s.ratios,
                save_store: !s.no_store,
                save_data: !s.no_data,
                provider: s.provider,
            };
            let summaries = processing::split(&s.store, &options, &mut rng)?;
            for summary in summaries {
                println!(
                    "{}\t{} utterances\t{} speakers\t{} sentences\t{} recordings",
                    summary.name,
                    summary.utterances,
                    summary.speakers,
                    summary.sentences,
                    summary.recordings
                );
            }
        }
    };
    Ok(())
}
