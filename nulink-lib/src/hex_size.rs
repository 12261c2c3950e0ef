//! Code size of an Intel HEX firmware image.
//!
//! Only the byte-count field of each record is looked at. Record types,
//! addresses and checksums are not interpreted, so extended address and
//! end-of-file records simply contribute their (usually zero) count.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use crate::{Error, Result};

const RECORD_MARK: char = ':';

/// Total number of data bytes declared by a firmware file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct CodeSize(pub u64);

impl CodeSize {
    pub fn bytes(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CodeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

/// Sum the byte-count fields of every `:` record in the file at `path`.
pub fn compute_code_size(path: impl AsRef<Path>) -> Result<CodeSize> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Io(e),
    })?;

    let size = code_size_from_reader(BufReader::new(file))?;
    tracing::debug!("code size of {}: {}", path.display(), size);
    Ok(size)
}

/// Same as [`compute_code_size`] over an already opened reader.
///
/// Lines that do not start with `:` are skipped. A record whose count field
/// is missing or not two hex digits is rejected with [`Error::HexParse`].
pub fn code_size_from_reader<R: BufRead>(reader: R) -> Result<CodeSize> {
    let mut total = 0u64;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);

        let Some(record) = line.strip_prefix(RECORD_MARK) else {
            continue;
        };

        let count = record_byte_count(record).map_err(|reason| Error::hex_parse(index + 1, reason))?;
        total += u64::from(count);
    }

    Ok(CodeSize(total))
}

fn record_byte_count(record: &str) -> std::result::Result<u8, String> {
    if record.len() < 2 {
        return Err(format!("record `:{record}` is too short for a byte count"));
    }

    let digits = record
        .get(..2)
        .filter(|d| d.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(|| format!("byte count of `:{record}` is not hexadecimal"))?;

    u8::from_str_radix(digits, 16).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn size_of(text: &str) -> Result<CodeSize> {
        code_size_from_reader(Cursor::new(text))
    }

    #[test]
    fn sums_byte_counts() {
        let size = size_of(":10000000AA\n:05001000BB\n").unwrap();
        assert_eq!(size, CodeSize(0x10 + 0x05));
    }

    #[test]
    fn ignores_lines_without_record_mark() {
        let size = size_of("hello\n\n:02000000FF\n; comment :10\n").unwrap();
        assert_eq!(size.bytes(), 2);
    }

    #[test]
    fn accepts_crlf_and_lowercase() {
        let size = size_of(":0a000000\r\n:Ff000000\r\n").unwrap();
        assert_eq!(size.bytes(), 0x0a + 0xff);
    }

    #[test]
    fn minimal_record_is_accepted() {
        assert_eq!(size_of(":20").unwrap().bytes(), 0x20);
    }

    #[test]
    fn short_record_is_rejected() {
        match size_of(":00000001FF\n:1\n") {
            Err(Error::HexParse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn non_hex_count_is_rejected() {
        assert!(matches!(size_of(":G0000000"), Err(Error::HexParse { line: 1, .. })));
        assert!(matches!(size_of(":+1000000"), Err(Error::HexParse { .. })));
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(size_of("").unwrap(), CodeSize::default());
    }

    #[test]
    fn display_appends_unit() {
        assert_eq!(CodeSize(21).to_string(), "21 bytes");
    }
}
