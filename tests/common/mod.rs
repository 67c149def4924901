#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const BLOCK_LEN: usize = 2880;

/// One binary table column for fixtures.
pub enum Field {
    D(Vec<f64>),
    E(Vec<f32>),
    J(Vec<i32>),
    I(Vec<i16>),
}

impl Field {
    fn code(&self) -> &'static str {
        match self {
            Field::D(_) => "D",
            Field::E(_) => "E",
            Field::J(_) => "J",
            Field::I(_) => "I",
        }
    }

    fn width(&self) -> usize {
        match self {
            Field::D(_) => 8,
            Field::E(_) | Field::J(_) => 4,
            Field::I(_) => 2,
        }
    }

    fn len(&self) -> usize {
        match self {
            Field::D(v) => v.len(),
            Field::E(v) => v.len(),
            Field::J(v) => v.len(),
            Field::I(v) => v.len(),
        }
    }

    fn write_row(&self, row: usize, out: &mut Vec<u8>) {
        match self {
            Field::D(v) => out.extend_from_slice(&v[row].to_be_bytes()),
            Field::E(v) => out.extend_from_slice(&v[row].to_be_bytes()),
            Field::J(v) => out.extend_from_slice(&v[row].to_be_bytes()),
            Field::I(v) => out.extend_from_slice(&v[row].to_be_bytes()),
        }
    }
}

pub fn card(text: &str) -> String {
    assert!(text.len() <= 80, "card too long: {text}");
    format!("{text:<80}")
}

pub fn value_card(keyword: &str, value: &str) -> String {
    card(&format!("{keyword:<8}= {value:>20}"))
}

pub fn text_card(keyword: &str, value: &str) -> String {
    card(&format!("{keyword:<8}= '{value:<8}'"))
}

/// Header cards plus `END`, padded to a whole block.
pub fn header(mut cards: Vec<String>) -> Vec<u8> {
    cards.push(card("END"));
    let mut bytes = cards.concat().into_bytes();
    pad(&mut bytes, b' ');
    bytes
}

fn pad(bytes: &mut Vec<u8>, fill: u8) {
    let len = bytes.len().div_ceil(BLOCK_LEN) * BLOCK_LEN;
    bytes.resize(len, fill);
}

pub fn primary_hdu() -> Vec<u8> {
    header(vec![
        value_card("SIMPLE", "T"),
        value_card("BITPIX", "8"),
        value_card("NAXIS", "0"),
        value_card("EXTEND", "T"),
    ])
}

/// A BINTABLE extension. `extra` cards are added to the header verbatim.
pub fn bintable_hdu(name: &str, columns: &[(&str, Field)], extra: &[String]) -> Vec<u8> {
    let rows = columns.first().map_or(0, |(_, f)| f.len());
    let row_len: usize = columns.iter().map(|(_, f)| f.width()).sum();

    let mut cards = vec![
        text_card("XTENSION", "BINTABLE"),
        value_card("BITPIX", "8"),
        value_card("NAXIS", "2"),
        value_card("NAXIS1", &row_len.to_string()),
        value_card("NAXIS2", &rows.to_string()),
        value_card("PCOUNT", "0"),
        value_card("GCOUNT", "1"),
        value_card("TFIELDS", &columns.len().to_string()),
    ];
    for (i, (col_name, field)) in columns.iter().enumerate() {
        cards.push(text_card(&format!("TTYPE{}", i + 1), col_name));
        cards.push(text_card(&format!("TFORM{}", i + 1), field.code()));
    }
    cards.push(text_card("EXTNAME", name));
    cards.extend(extra.iter().cloned());

    let mut bytes = header(cards);
    let mut data = Vec::with_capacity(rows * row_len);
    for row in 0..rows {
        for (_, field) in columns {
            field.write_row(row, &mut data);
        }
    }
    pad(&mut data, 0);
    bytes.extend(data);
    bytes
}

pub fn write_fits(path: &Path, hdus: &[Vec<u8>]) {
    let mut bytes = primary_hdu();
    for hdu in hdus {
        bytes.extend_from_slice(hdu);
    }
    std::fs::write(path, bytes).unwrap();
}

pub fn gti_hdu(name: &str, gtis: &[(f64, f64)]) -> Vec<u8> {
    bintable_hdu(
        name,
        &[
            ("START", Field::D(gtis.iter().map(|g| g.0).collect())),
            ("STOP", Field::D(gtis.iter().map(|g| g.1).collect())),
        ],
        &[],
    )
}

/// Event file with a `TIME` (D) and `PI` (J) column plus a `GTI` extension.
pub fn event_file(dir: &Path, file_name: &str, times: &[f64], gtis: &[(f64, f64)]) -> PathBuf {
    let path = dir.join(file_name);
    let pi: Vec<i32> = (0..times.len() as i32).map(|i| 100 + i).collect();
    write_fits(
        &path,
        &[
            bintable_hdu(
                "EVENTS",
                &[("TIME", Field::D(times.to_vec())), ("PI", Field::J(pi))],
                &[],
            ),
            gti_hdu("GTI", gtis),
        ],
    );
    path
}

/// Whitespace table with `k` value/error column pairs: value `r * 10 + i`,
/// error `(r * 10 + i) / 100`.
pub fn ascii_file(dir: &Path, file_name: &str, rows: usize, k: usize) -> PathBuf {
    let path = dir.join(file_name);
    let mut text = String::from("# generated\n");
    for r in 0..rows {
        let line: Vec<String> = (0..k)
            .flat_map(|i| {
                let v = (r * 10 + i) as f64;
                [format!("{v}"), format!("{}", v / 100.0)]
            })
            .collect();
        text.push_str(&line.join(" "));
        text.push('\n');
    }
    std::fs::write(&path, text).unwrap();
    path
}
