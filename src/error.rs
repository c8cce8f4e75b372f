use camino::Utf8PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("invalid processing mode: {0}")]
    #[diagnostic(help("expected `load` or `preview`"))]
    InvalidMode(String),

    #[error("config file not found: {0}")]
    MissingConfig(Utf8PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("could not open file {path}: {message}")]
    Open { path: Utf8PathBuf, message: String },

    #[error("failed to read input: {0}")]
    InputRead(String),

    #[error("failed to write {artifact}: {message}")]
    Write { artifact: String, message: String },

    #[error("invalid line ({line}): {text}")]
    #[diagnostic(help("every input line needs 16 tab-separated fields"))]
    InvalidLine { line: u64, text: String },

    #[error("failed to read reference store at {0}")]
    StoreRead(Utf8PathBuf),

    #[error("failed to parse reference store: {0}")]
    StoreParse(String),

    #[error("could not seed key counter {0} from the reference store")]
    Seed(String),

    #[error("failed to persist reference store: {0}")]
    StorePersist(String),

    #[error("bulk load failed: {0}")]
    BulkLoad(String),
}

impl LoadError {
    pub(crate) fn open(path: impl Into<Utf8PathBuf>, err: impl ToString) -> Self {
        LoadError::Open {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn write(artifact: impl Into<String>, err: impl ToString) -> Self {
        LoadError::Write {
            artifact: artifact.into(),
            message: err.to_string(),
        }
    }
}
