/*!
# IO utilities

Reading and writing of Kaldi-style corpus directories: one record per line, identifier first.
!*/
pub mod datadir;
pub mod reader;
pub mod writer;

pub use datadir::DataDir;
pub use reader::{Entry, LineReader};
pub use writer::DataWriter;
