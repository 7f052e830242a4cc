//! GFF3 and GTF parsers.
//!
//! Both formats share the nine tab-separated columns:
//!
//! ```text
//! seqid  source  type  start  end  score  strand  phase  attributes
//! ```
//!
//! Coordinates are 1-based inclusive on input and 0-based half-open on output.
//! They differ only in the attribute column: GFF3 uses `key=value;` with
//! percent-encoding, GTF uses `key "value";`.

use thiserror::Error;

use super::fasta::{self, FastaError};
use super::ParsedAnnotations;
use crate::model::{Annotation, AnnotationData, Qualifiers, Strand};

/// Errors that can occur during GFF3/GTF parsing.
#[derive(Error, Debug)]
pub enum GffError {
    #[error("Line {line}: expected 9 tab-separated columns, found {found}")]
    WrongColumnCount { line: usize, found: usize },

    #[error("Line {line}: invalid coordinate '{value}' (coordinates are 1-based integers)")]
    InvalidCoordinate { line: usize, value: String },

    #[error("Line {line}: invalid phase '{value}'")]
    InvalidPhase { line: usize, value: String },

    #[error("Embedded FASTA section: {0}")]
    EmbeddedFasta(#[from] FastaError),
}

/// Result type for GFF3/GTF operations.
pub type GffResult<T> = Result<T, GffError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Gff3,
    Gtf,
}

fn parse_coordinate(value: &str, line: usize) -> GffResult<usize> {
    match value.parse::<usize>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(GffError::InvalidCoordinate {
            line,
            value: value.to_string(),
        }),
    }
}

fn parse_phase(value: &str, line: usize) -> GffResult<Option<u8>> {
    match value {
        "." => Ok(None),
        "0" => Ok(Some(0)),
        "1" => Ok(Some(1)),
        "2" => Ok(Some(2)),
        _ => Err(GffError::InvalidPhase {
            line,
            value: value.to_string(),
        }),
    }
}

/// Decodes `%XX` escapes. Malformed escapes are kept literally.
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                decoded.push(byte);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Feature id and qualifiers from a GFF3 attribute column.
fn gff3_attributes(kind: &str, column: &str) -> (Option<String>, Qualifiers) {
    let mut id = None;
    let mut parent = None;
    let mut qualifiers = Qualifiers::new();

    for pair in column.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
        let key = key.trim();
        let values: Vec<String> = raw.split(',').map(percent_decode).collect();
        match key {
            "ID" => id = values.into_iter().next(),
            "Parent" => parent = values.into_iter().next(),
            "Dbxref" => values.into_iter().for_each(|v| qualifiers.push("db_xref", v)),
            "Note" => values.into_iter().for_each(|v| qualifiers.push("note", v)),
            "Name" if kind == "gene" => values.into_iter().for_each(|v| qualifiers.push("gene", v)),
            "Name" => values.into_iter().for_each(|v| qualifiers.push("standard_name", v)),
            _ if raw.is_empty() => qualifiers.push(key, ""),
            _ => values.into_iter().for_each(|v| qualifiers.push(key, v)),
        }
    }

    (id.or(parent), qualifiers)
}

/// Feature id and qualifiers from a GTF attribute column.
fn gtf_attributes(column: &str) -> (Option<String>, Qualifiers) {
    let mut gene_id = None;
    let mut transcript_id = None;
    let mut has_gene_name = false;
    let mut qualifiers = Qualifiers::new();

    for pair in column.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, raw) = pair.split_once(char::is_whitespace).unwrap_or((pair, ""));
        let value = raw.trim().trim_matches('"').to_string();
        match key {
            "gene_id" => gene_id = Some(value),
            "transcript_id" => transcript_id = Some(value),
            "gene_name" => {
                has_gene_name = true;
                qualifiers.push("gene", value);
            }
            _ => qualifiers.push(key, value),
        }
    }

    if !has_gene_name {
        if let Some(gene) = &gene_id {
            qualifiers.push("gene", gene.clone());
        }
    }
    (transcript_id.or(gene_id), qualifiers)
}

fn parse_feature_line(line: &str, line_number: usize, dialect: Dialect) -> GffResult<Annotation> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 9 {
        return Err(GffError::WrongColumnCount {
            line: line_number,
            found: fields.len(),
        });
    }

    let kind = fields[2];
    let start = parse_coordinate(fields[3], line_number)?;
    let end = parse_coordinate(fields[4], line_number)?;
    let strand = Strand::from_symbol(fields[6]);
    let phase = parse_phase(fields[7], line_number)?;
    let (feature_id, qualifiers) = match dialect {
        Dialect::Gff3 => gff3_attributes(kind, fields[8]),
        Dialect::Gtf => gtf_attributes(fields[8]),
    };

    let sequence_id = match dialect {
        Dialect::Gff3 => percent_decode(fields[0]),
        Dialect::Gtf => fields[0].to_string(),
    };

    // 1-based inclusive -> 0-based half-open
    Ok(Annotation {
        kind: kind.to_string(),
        start: start - 1,
        end,
        strand,
        phase,
        sequence_id,
        feature_id,
        qualifiers,
    })
}

fn parse_features(content: &str, dialect: Dialect) -> GffResult<(AnnotationData, Option<usize>)> {
    let mut annotations = AnnotationData::new();
    let mut offset = 0;

    for (index, raw_line) in content.split_inclusive('\n').enumerate() {
        let line = raw_line.trim_end_matches(['\n', '\r']);
        offset += raw_line.len();

        if dialect == Dialect::Gff3 && line.trim() == "##FASTA" {
            return Ok((annotations, Some(offset)));
        }
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        annotations.push(parse_feature_line(line, index + 1, dialect)?);
    }

    Ok((annotations, None))
}

/// Parses GFF3 content. A `##FASTA` section, if present, is parsed as well.
pub fn parse_gff3_str(content: &str) -> GffResult<ParsedAnnotations> {
    let (annotations, fasta_offset) = parse_features(content, Dialect::Gff3)?;
    let sequences = match fasta_offset {
        Some(offset) if !content[offset..].trim().is_empty() => {
            Some(fasta::parse_fasta_str(&content[offset..])?)
        }
        _ => None,
    };
    Ok(ParsedAnnotations {
        annotations,
        sequences,
    })
}

/// Parses GTF content.
pub fn parse_gtf_str(content: &str) -> GffResult<AnnotationData> {
    parse_features(content, Dialect::Gtf).map(|(annotations, _)| annotations)
}
