//! Top-level run errors.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Which pipeline stage aborted the run.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("could not open the snapshot database")]
    Database,
    #[display("milestone sync failed")]
    Milestones,
    #[display("export failed")]
    Export,
}
