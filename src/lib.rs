pub mod error;
pub mod io;
pub mod processing;
pub mod store;
