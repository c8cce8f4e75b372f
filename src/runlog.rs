use std::fs::File;
use std::io::{BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::LoadError;

pub fn timestamp() -> String {
    chrono::Local::now().format("%m/%d/%Y %H:%M:%S").to_string()
}

/// Line-oriented text log (the run's diagnostics and error files).
pub struct RunLog {
    name: String,
    writer: BufWriter<Box<dyn Write>>,
    closed: bool,
}

impl RunLog {
    pub fn create(path: &Utf8Path) -> Result<Self, LoadError> {
        let file = File::create(path.as_std_path()).map_err(|err| LoadError::open(path, err))?;
        Ok(Self::from_writer(path.as_str(), Box::new(file)))
    }

    pub fn from_writer(name: impl Into<String>, writer: Box<dyn Write>) -> Self {
        Self {
            name: name.into(),
            writer: BufWriter::new(writer),
            closed: false,
        }
    }

    pub fn line(&mut self, text: impl AsRef<str>) -> Result<(), LoadError> {
        writeln!(self.writer, "{}", text.as_ref()).map_err(|err| LoadError::write(&self.name, err))
    }

    pub fn start(&mut self) -> Result<(), LoadError> {
        self.line(format!("Start Date/Time: {}", timestamp()))
    }

    /// Writes the end marker and flushes. Safe to call more than once;
    /// only the first call writes.
    pub fn finish(&mut self) -> Result<(), LoadError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.line(format!("\n\nEnd Date/Time: {}", timestamp()))?;
        self.writer
            .flush()
            .map_err(|err| LoadError::write(&self.name, err))
    }
}

/// Where the run writes everything besides the echo file.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    dir: Utf8PathBuf,
    stem: String,
}

impl OutputLayout {
    /// Artifacts are named after the input file: `<dir>/<input name>.<suffix>`.
    pub fn new(dir: impl Into<Utf8PathBuf>, input: &Utf8Path) -> Self {
        let stem = input.file_name().unwrap_or("genotypeload").to_string();
        Self {
            dir: dir.into(),
            stem,
        }
    }

    pub fn diagnostics_path(&self) -> Utf8PathBuf {
        self.dir.join(format!("{}.diagnostics", self.stem))
    }

    pub fn error_path(&self) -> Utf8PathBuf {
        self.dir.join(format!("{}.error", self.stem))
    }

    pub fn table_path(&self, table: &str) -> Utf8PathBuf {
        self.dir.join(format!("{}.{table}.bcp", self.stem))
    }
}
