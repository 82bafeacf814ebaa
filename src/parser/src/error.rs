use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Failed to serialize command line arguments. got [{0}]")]
    SerializeArgs(String),

    #[error("Unknown reference sample id '{0}'. Check the ids against the --references files.")]
    UnknownSampleId(String),
}
