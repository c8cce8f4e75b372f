use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Read};

use camino::Utf8Path;
use flate2::read::GzDecoder;

use crate::domain::InputRow;
use crate::error::LoadError;

/// Tab-delimited genotype input, read one physical line at a time. Fields
/// are taken verbatim: no quoting, no header line. A `.gz` file is
/// decompressed on the fly.
pub struct InputReader {
    lines: Lines<BufReader<Box<dyn Read>>>,
    lines_read: u64,
}

impl InputReader {
    pub fn open(path: &Utf8Path) -> Result<Self, LoadError> {
        let file = File::open(path.as_std_path()).map_err(|err| LoadError::open(path, err))?;
        let source: Box<dyn Read> = if path.extension() == Some("gz") {
            Box::new(GzDecoder::new(BufReader::new(file)))
        } else {
            Box::new(file)
        };
        Ok(Self::from_reader(source))
    }

    pub fn from_reader(source: Box<dyn Read>) -> Self {
        Self {
            lines: BufReader::new(source).lines(),
            lines_read: 0,
        }
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Reads the next row with its 1-based line number. A line with too few
    /// fields, a blank one included, is a fatal error for the whole file.
    pub fn next_row(&mut self) -> Result<Option<(u64, InputRow)>, LoadError> {
        let Some(text) = self.lines.next() else {
            return Ok(None);
        };
        let text = text.map_err(|err| LoadError::InputRead(err.to_string()))?;
        self.lines_read += 1;
        let line = self.lines_read;

        match InputRow::from_fields(text.split('\t')) {
            Some(row) => Ok(Some((line, row))),
            None => Err(LoadError::InvalidLine { line, text }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use assert_matches::assert_matches;
    use camino::Utf8PathBuf;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    const LINE: &str = "1\t\tS:1\tStrainA\tM:1\tA:1\t\t\t\tno\tMouse Line\t\t\tHomozygous\tNot Applicable\tuser1";

    fn reader(text: &str) -> InputReader {
        InputReader::from_reader(Box::new(Cursor::new(text.as_bytes().to_vec())))
    }

    #[test]
    fn reads_rows_without_trailing_newline() {
        let mut input = reader(&format!("{LINE}\n{LINE}"));
        let (line, row) = input.next_row().unwrap().unwrap();
        assert_eq!(line, 1);
        assert_eq!(row.strain_id, "S:1");
        let (line, row) = input.next_row().unwrap().unwrap();
        assert_eq!(line, 2);
        assert_eq!(row.created_by, "user1");
        assert!(input.next_row().unwrap().is_none());
        assert_eq!(input.lines_read(), 2);
    }

    #[test]
    fn quotes_are_literal() {
        let text = LINE.replace("StrainA", "\"Strain A\"");
        let mut input = reader(&text);
        let (_, row) = input.next_row().unwrap().unwrap();
        assert_eq!(row.strain_name, "\"Strain A\"");
    }

    #[test]
    fn short_line_is_fatal() {
        let mut input = reader(&format!("{LINE}\n1\t\tS:1\n"));
        assert!(input.next_row().unwrap().is_some());
        let err = input.next_row().unwrap_err();
        assert_matches!(err, LoadError::InvalidLine { line: 2, .. });
    }

    #[test]
    fn blank_line_is_fatal() {
        let mut input = reader(&format!("{LINE}\n\n{LINE}\n"));
        assert!(input.next_row().unwrap().is_some());
        let err = input.next_row().unwrap_err();
        assert_matches!(err, LoadError::InvalidLine { line: 2, ref text } if text.is_empty());
        assert_eq!(input.lines_read(), 2);
    }

    #[test]
    fn crlf_endings_are_stripped() {
        let mut input = reader(&format!("{LINE}\r\n"));
        let (_, row) = input.next_row().unwrap().unwrap();
        assert_eq!(row.created_by, "user1");
    }

    #[test]
    fn reads_gzip_input() {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("genotype.txt.gz")).unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(format!("{LINE}\n").as_bytes()).unwrap();
        std::fs::write(path.as_std_path(), encoder.finish().unwrap()).unwrap();

        let mut input = InputReader::open(&path).unwrap();
        let (_, row) = input.next_row().unwrap().unwrap();
        assert_eq!(row.marker_id, "M:1");
    }
}
