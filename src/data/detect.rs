use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use super::fits;

/// Bytes inspected when sniffing a file.
const SNIFF_LEN: usize = 8192;

/// Content class of an input file, decided from its bytes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    AsciiTable,
    BinaryTable,
    Unknown,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::AsciiTable => write!(f, "ascii_table"),
            FileFormat::BinaryTable => write!(f, "binary_table"),
            FileFormat::Unknown => write!(f, "unknown"),
        }
    }
}

/// Read the head of `path` and classify it. The extension is ignored.
pub fn detect_format(path: &Path) -> std::io::Result<FileFormat> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(classify(&head))
}

/// Classify a file prefix.
pub fn classify(head: &[u8]) -> FileFormat {
    if head.starts_with(fits::MAGIC) {
        FileFormat::BinaryTable
    } else if is_text(head) {
        FileFormat::AsciiTable
    } else {
        FileFormat::Unknown
    }
}

/// Non-empty, and nothing but printable ASCII and whitespace.
fn is_text(head: &[u8]) -> bool {
    !head.is_empty()
        && head
            .iter()
            .all(|&b| b.is_ascii_graphic() || matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_content() {
        assert_eq!(classify(b"SIMPLE  =                    T"), FileFormat::BinaryTable);
        assert_eq!(classify(b"1.0 0.1 2.0 0.2\n3.0 0.3 4.0 0.4\n"), FileFormat::AsciiTable);
        assert_eq!(classify(b"# header\r\n1,2\r\n"), FileFormat::AsciiTable);
        assert_eq!(classify(b"\x89PNG\r\n\x1a\n"), FileFormat::Unknown);
        assert_eq!(classify(b"caf\xc3\xa9"), FileFormat::Unknown);
        assert_eq!(classify(b""), FileFormat::Unknown);
    }

    #[test]
    fn display_matches_serde_names() {
        assert_eq!(FileFormat::AsciiTable.to_string(), "ascii_table");
        assert_eq!(
            serde_json::to_string(&FileFormat::BinaryTable).unwrap(),
            "\"binary_table\""
        );
    }
}
