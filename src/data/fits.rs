//! Minimal FITS reader: header cards, HDU layout and scalar columns of
//! BINTABLE extensions. Image data is located but never decoded.

use std::ops::Range;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use log::debug;

const BLOCK_LEN: usize = 2880;
const CARD_LEN: usize = 80;

/// Every FITS file opens with this card prefix.
pub const MAGIC: &[u8] = b"SIMPLE  =";

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Logical(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Keyword/value cards of one HDU, in file order. Commentary cards are
/// dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<(String, HeaderValue)>,
}

impl Header {
    pub fn get(&self, keyword: &str) -> Option<&HeaderValue> {
        self.cards
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(keyword))
            .map(|(_, v)| v)
    }

    pub fn int(&self, keyword: &str) -> Option<i64> {
        match self.get(keyword)? {
            HeaderValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn float(&self, keyword: &str) -> Option<f64> {
        match self.get(keyword)? {
            HeaderValue::Integer(i) => Some(*i as f64),
            HeaderValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn text(&self, keyword: &str) -> Option<&str> {
        match self.get(keyword)? {
            HeaderValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn require_int(&self, keyword: &str) -> Result<i64> {
        self.int(keyword)
            .with_context(|| format!("missing integer keyword {keyword}"))
    }
}

fn parse_card(card: &[u8]) -> Option<(String, HeaderValue)> {
    let keyword = String::from_utf8_lossy(&card[..8]).trim_end().to_string();
    if keyword.is_empty() || &card[8..10] != b"= " {
        return None;
    }
    let rest = String::from_utf8_lossy(&card[10..]);
    let rest = rest.trim_start();

    if let Some(quoted) = rest.strip_prefix('\'') {
        let mut text = String::new();
        let mut chars = quoted.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    text.push('\'');
                    continue;
                }
                break;
            }
            text.push(c);
        }
        return Some((keyword, HeaderValue::Text(text.trim_end().to_string())));
    }

    let raw = rest.split('/').next().unwrap_or("").trim();
    let value = match raw {
        "" => return None,
        "T" => HeaderValue::Logical(true),
        "F" => HeaderValue::Logical(false),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                HeaderValue::Integer(i)
            } else if let Ok(f) = raw.replace(['D', 'd'], "E").parse::<f64>() {
                HeaderValue::Float(f)
            } else {
                HeaderValue::Text(raw.to_string())
            }
        }
    };
    Some((keyword, value))
}

// ---------------------------------------------------------------------------
// HDUs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Hdu {
    pub index: usize,
    pub header: Header,
    data: Range<usize>,
}

impl Hdu {
    /// `EXTNAME`, falling back to `HDUNAME`.
    pub fn name(&self) -> Option<&str> {
        self.header
            .text("EXTNAME")
            .or_else(|| self.header.text("HDUNAME"))
    }

    pub fn is_bintable(&self) -> bool {
        self.header
            .text("XTENSION")
            .is_some_and(|x| x.eq_ignore_ascii_case("BINTABLE"))
    }
}

/// A FITS file held in memory with its HDU layout resolved.
#[derive(Debug)]
pub struct FitsFile {
    bytes: Vec<u8>,
    hdus: Vec<Hdu>,
}

impl FitsFile {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading FITS file {}", path.display()))?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if !bytes.starts_with(MAGIC) {
            bail!("missing SIMPLE card, not a FITS file");
        }

        let mut hdus = Vec::new();
        let mut offset = 0;
        while offset + CARD_LEN <= bytes.len() {
            let index = hdus.len();
            let (header, header_len) = read_header(&bytes[offset..])
                .with_context(|| format!("HDU {index}: reading header"))?;
            if index > 0 && header.text("XTENSION").is_none() {
                bail!("HDU {index}: extension without XTENSION keyword");
            }

            let data_start = offset + header_len;
            let data_len = data_size(&header).with_context(|| format!("HDU {index}"))?;
            let data_end = data_start
                .checked_add(data_len)
                .with_context(|| format!("HDU {index}: data size {data_len} overflows"))?;
            if data_end > bytes.len() {
                bail!(
                    "HDU {index}: data needs {data_len} bytes, file is truncated at {}",
                    bytes.len()
                );
            }
            debug!("HDU {index}: {data_len} data bytes at {data_start}");

            hdus.push(Hdu {
                index,
                header,
                data: data_start..data_end,
            });
            offset = data_start + padded(data_len);
        }

        Ok(Self { bytes, hdus })
    }

    pub fn hdus(&self) -> &[Hdu] {
        &self.hdus
    }

    /// Look up an HDU by extension name, ignoring case.
    pub fn find(&self, name: &str) -> Option<&Hdu> {
        self.hdus
            .iter()
            .find(|h| h.name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }

    pub fn bintable(&self, hdu: &Hdu) -> Result<BinTable<'_>> {
        BinTable::new(hdu, &self.bytes[hdu.data.clone()])
    }
}

fn padded(len: usize) -> usize {
    len.div_ceil(BLOCK_LEN) * BLOCK_LEN
}

/// Returns the parsed header and the number of bytes it occupies.
fn read_header(bytes: &[u8]) -> Result<(Header, usize)> {
    let mut header = Header::default();
    for (i, card) in bytes.chunks_exact(CARD_LEN).enumerate() {
        if card.starts_with(b"END") && card[3..].iter().all(|&b| b == b' ') {
            return Ok((header, padded((i + 1) * CARD_LEN)));
        }
        if let Some(entry) = parse_card(card) {
            header.cards.push(entry);
        }
    }
    bail!("no END card")
}

fn data_size(header: &Header) -> Result<usize> {
    let bitpix = header.require_int("BITPIX")?;
    let naxis = header.require_int("NAXIS")?;
    if naxis == 0 {
        return Ok(0);
    }
    let mut elements: i64 = 1;
    for n in 1..=naxis {
        let len = header.require_int(&format!("NAXIS{n}"))?;
        if len < 0 {
            bail!("negative NAXIS{n} {len}");
        }
        elements = elements
            .checked_mul(len)
            .with_context(|| format!("NAXIS{n} {len} overflows the data size"))?;
    }
    let pcount = header.int("PCOUNT").unwrap_or(0);
    let gcount = header.int("GCOUNT").unwrap_or(1);
    let size = pcount
        .checked_add(elements)
        .and_then(|n| n.checked_mul(gcount))
        .and_then(|n| n.checked_mul(bitpix.abs() / 8))
        .context("data size overflows")?;
    usize::try_from(size).map_err(|_| anyhow!("negative data size {size}"))
}

// ---------------------------------------------------------------------------
// Binary tables
// ---------------------------------------------------------------------------

/// Field layout of one BINTABLE column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDesc {
    pub name: String,
    pub repeat: usize,
    pub code: char,
    pub offset: usize,
    scale: f64,
    zero: f64,
}

impl ColumnDesc {
    /// Scalar numeric columns are the only ones read into datasets.
    pub fn is_numeric_scalar(&self) -> bool {
        self.repeat == 1 && matches!(self.code, 'L' | 'B' | 'I' | 'J' | 'K' | 'E' | 'D')
    }
}

fn parse_tform(tform: &str) -> Result<(usize, char)> {
    let tform = tform.trim();
    let digits = tform.chars().take_while(char::is_ascii_digit).count();
    let repeat = if digits == 0 {
        1
    } else {
        tform[..digits]
            .parse()
            .with_context(|| format!("bad repeat count in TFORM '{tform}'"))?
    };
    let code = tform[digits..]
        .chars()
        .next()
        .with_context(|| format!("TFORM '{tform}' has no type code"))?;
    Ok((repeat, code.to_ascii_uppercase()))
}

fn field_width(code: char, repeat: usize) -> Result<usize> {
    let (bytes, repeat) = match code {
        'L' | 'B' | 'A' => (1, repeat),
        'X' => (1, repeat.div_ceil(8)),
        'I' => (2, repeat),
        'J' | 'E' => (4, repeat),
        'K' | 'D' | 'C' | 'P' => (8, repeat),
        'M' | 'Q' => (16, repeat),
        other => bail!("unknown TFORM type code '{other}'"),
    };
    repeat
        .checked_mul(bytes)
        .with_context(|| format!("{repeat}{code} field is too wide"))
}

pub struct BinTable<'a> {
    pub name: String,
    rows: usize,
    row_len: usize,
    columns: Vec<ColumnDesc>,
    data: &'a [u8],
}

impl<'a> BinTable<'a> {
    fn new(hdu: &Hdu, data: &'a [u8]) -> Result<Self> {
        let name = hdu
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HDU{}", hdu.index));
        if !hdu.is_bintable() {
            bail!("HDU '{name}' is not a binary table");
        }
        let header = &hdu.header;
        let row_len = usize::try_from(header.require_int("NAXIS1")?)?;
        let rows = usize::try_from(header.require_int("NAXIS2")?)?;
        let fields = header.require_int("TFIELDS")?;

        let mut columns = Vec::new();
        let mut offset = 0;
        for n in 1..=fields {
            let tform = header
                .text(&format!("TFORM{n}"))
                .with_context(|| format!("table '{name}': missing TFORM{n}"))?;
            let (repeat, code) = parse_tform(tform)?;
            let col_name = header
                .text(&format!("TTYPE{n}"))
                .map(str::to_string)
                .unwrap_or_else(|| format!("COL{n}"));
            columns.push(ColumnDesc {
                name: col_name,
                repeat,
                code,
                offset,
                scale: header.float(&format!("TSCAL{n}")).unwrap_or(1.0),
                zero: header.float(&format!("TZERO{n}")).unwrap_or(0.0),
            });
            offset = offset
                .checked_add(field_width(code, repeat)?)
                .with_context(|| format!("table '{name}': row width overflows"))?;
        }
        if offset > row_len {
            bail!("table '{name}': fields need {offset} bytes per row, NAXIS1 is {row_len}");
        }
        let table_len = rows
            .checked_mul(row_len)
            .with_context(|| format!("table '{name}': {rows} rows of {row_len} bytes overflow"))?;
        if table_len > data.len() {
            bail!("table '{name}': {rows} rows do not fit in {} bytes", data.len());
        }

        Ok(Self {
            name,
            rows,
            row_len,
            columns,
            data,
        })
    }

    pub fn columns(&self) -> &[ColumnDesc] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Read a scalar numeric column with `TSCAL`/`TZERO` applied.
    pub fn read_f64(&self, name: &str) -> Result<Vec<f64>> {
        let col = self
            .columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .with_context(|| format!("table '{}' has no column '{name}'", self.name))?;
        if !col.is_numeric_scalar() {
            bail!(
                "column '{name}' has format {}{}, only scalar numeric columns are supported",
                col.repeat,
                col.code
            );
        }

        let width = field_width(col.code, 1)?;
        let mut out = Vec::with_capacity(self.rows);
        for row in 0..self.rows {
            let at = row * self.row_len + col.offset;
            let raw = decode(col.code, &self.data[at..at + width]);
            out.push(raw * col.scale + col.zero);
        }
        Ok(out)
    }
}

fn decode(code: char, b: &[u8]) -> f64 {
    match code {
        'L' => f64::from(u8::from(b[0] == b'T')),
        'B' => f64::from(b[0]),
        'I' => f64::from(i16::from_be_bytes([b[0], b[1]])),
        'J' => f64::from(i32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        'K' => i64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64,
        'E' => f64::from(f32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        'D' => f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
        _ => f64::NAN,
    }
}

/// Column names of the named binary table.
pub fn table_column_names(path: &Path, hdu_name: &str) -> crate::Result<Vec<String>> {
    let file = FitsFile::open(path).map_err(|e| crate::Error::Ingestion(format!("{e:#}")))?;
    let hdu = file
        .find(hdu_name)
        .filter(|h| h.is_bintable())
        .ok_or_else(|| crate::Error::not_found("binary table", hdu_name))?;
    let table = file
        .bintable(hdu)
        .map_err(|e| crate::Error::Ingestion(format!("{e:#}")))?;
    Ok(table.column_names().into_iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(text: &str) -> Vec<u8> {
        format!("{text:<80}").into_bytes()
    }

    #[test]
    fn parses_card_values() {
        assert_eq!(
            parse_card(&card("NAXIS2  =                   12 / rows")),
            Some(("NAXIS2".into(), HeaderValue::Integer(12)))
        );
        assert_eq!(
            parse_card(&card("EXTNAME = 'EVENTS  '           / name")),
            Some(("EXTNAME".into(), HeaderValue::Text("EVENTS".into())))
        );
        assert_eq!(
            parse_card(&card("OBSERVER= 'O''Brien'")),
            Some(("OBSERVER".into(), HeaderValue::Text("O'Brien".into())))
        );
        assert_eq!(
            parse_card(&card("SIMPLE  =                    T")),
            Some(("SIMPLE".into(), HeaderValue::Logical(true)))
        );
        assert_eq!(
            parse_card(&card("TIMEZERO=             1.5D+02")),
            Some(("TIMEZERO".into(), HeaderValue::Float(150.0)))
        );
        assert_eq!(parse_card(&card("COMMENT this is not a value")), None);
    }

    #[test]
    fn parses_tform() {
        assert_eq!(parse_tform("D").unwrap(), (1, 'D'));
        assert_eq!(parse_tform("1J ").unwrap(), (1, 'J'));
        assert_eq!(parse_tform("16X").unwrap(), (16, 'X'));
        assert_eq!(parse_tform("1PE(100)").unwrap(), (1, 'P'));
        assert!(parse_tform("").is_err());
    }

    #[test]
    fn field_widths() {
        assert_eq!(field_width('X', 9).unwrap(), 2);
        assert_eq!(field_width('D', 2).unwrap(), 16);
        assert!(field_width('Z', 1).is_err());
    }

    #[test]
    fn oversized_dimensions_are_errors() {
        let mut header = Header::default();
        for (k, v) in [("BITPIX", 8), ("NAXIS", 2), ("NAXIS1", i64::MAX / 2), ("NAXIS2", 4)] {
            header.cards.push((k.into(), HeaderValue::Integer(v)));
        }
        assert!(data_size(&header).is_err());
        assert!(field_width('Q', usize::MAX / 8).is_err());
    }

    #[test]
    fn rejects_non_fits_bytes() {
        assert!(FitsFile::from_bytes(b"hello world".to_vec()).is_err());
    }

    #[test]
    fn decodes_big_endian() {
        assert_eq!(decode('I', &(-2i16).to_be_bytes()), -2.0);
        assert_eq!(decode('J', &70000i32.to_be_bytes()), 70000.0);
        assert_eq!(decode('E', &1.5f32.to_be_bytes()), 1.5);
        assert_eq!(decode('D', &2.25f64.to_be_bytes()), 2.25);
        assert_eq!(decode('L', b"T"), 1.0);
    }
}
