use std::path::{Path, PathBuf};
use std::process::Command;

use camino::Utf8Path;

use crate::error::LoadError;
use crate::records::Table;

pub trait BulkLoader {
    /// Loads one delimited file into `table`. Returns the command line that
    /// was issued, for the diagnostics log.
    fn load(&self, table: Table, file: &Utf8Path, delimiter: char) -> Result<String, LoadError>;
}

/// Runs an external bulk-copy program as `<program> <table> <file> <delimiter>`.
#[derive(Debug, Clone)]
pub struct CommandBulkLoader {
    program: PathBuf,
}

impl CommandBulkLoader {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolves a bare program name against `PATH`.
    pub fn locate(program: &str) -> Result<Self, LoadError> {
        let candidate = Path::new(program);
        if candidate.components().count() > 1 {
            return Ok(Self::new(candidate));
        }
        find_in_path(program)
            .map(Self::new)
            .ok_or_else(|| LoadError::BulkLoad(format!("program not found: {program}")))
    }
}

impl BulkLoader for CommandBulkLoader {
    fn load(&self, table: Table, file: &Utf8Path, delimiter: char) -> Result<String, LoadError> {
        let args = [
            table.name().to_string(),
            file.to_string(),
            delimiter.to_string(),
        ];
        let command_line = format!("{} {}", self.program.display(), args.join(" "));
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|err| LoadError::BulkLoad(format!("{command_line}: {err}")))?;
        if output.status.success() {
            return Ok(command_line);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("command failed: {command_line}")
        } else {
            format!("{command_line}: {stderr}")
        };
        Err(LoadError::BulkLoad(message))
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn explicit_path_is_kept() {
        let loader = CommandBulkLoader::locate("/opt/pg/bin/bcpin.csh").unwrap();
        assert_eq!(loader.program, PathBuf::from("/opt/pg/bin/bcpin.csh"));
    }

    #[test]
    fn unknown_program_is_an_error() {
        let err = CommandBulkLoader::locate("genotypeload-no-such-program").unwrap_err();
        assert_matches!(err, LoadError::BulkLoad(_));
    }
}
