//! Multi-format input parsers.
//!
//! Supports automatic format detection for:
//! - FASTA (.fasta, .fa, .fna, .ffn, .frn, .fas) - sequences
//! - GFF3 (.gff, .gff3) - annotations, optionally with a `##FASTA` section
//! - GTF (.gtf, .gff2) - annotations
//! - BED (.bed) - annotations
//! - VCF (.vcf) - variant annotations
//!
//! Format detection priority:
//! 1. Explicit format specification
//! 2. File extension
//! 3. Content-based detection
//! 4. Every parser of the requested kind, in priority order
//!
//! All annotation parsers normalize coordinates to 0-based, half-open.

pub mod bed;
pub mod fasta;
pub mod gff;
pub mod vcf;

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::model::{AnnotationData, SequenceData};

/// Detected file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Fasta,
    Gff3,
    Gtf,
    Bed,
    Vcf,
}

impl FileFormat {
    /// Formats that carry nucleotide sequences.
    pub fn is_sequence_format(self) -> bool {
        matches!(self, FileFormat::Fasta)
    }

    /// Formats that carry feature annotations.
    pub fn is_annotation_format(self) -> bool {
        !self.is_sequence_format()
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Fasta => write!(f, "FASTA"),
            FileFormat::Gff3 => write!(f, "GFF3"),
            FileFormat::Gtf => write!(f, "GTF"),
            FileFormat::Bed => write!(f, "BED"),
            FileFormat::Vcf => write!(f, "VCF"),
        }
    }
}

/// Errors that can occur during input parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Empty file")]
    EmptyFile,

    #[error("Could not determine file format")]
    UnknownFormat,

    #[error("{format} input cannot be used as {expected} data")]
    WrongKind {
        format: FileFormat,
        expected: &'static str,
    },

    #[error("FASTA error: {0}")]
    FastaError(#[from] fasta::FastaError),

    #[error("GFF/GTF error: {0}")]
    GffError(#[from] gff::GffError),

    #[error("BED error: {0}")]
    BedError(#[from] bed::BedError),

    #[error("VCF error: {0}")]
    VcfError(#[from] vcf::VcfError),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Annotations read from one input, plus any sequences embedded in it.
#[derive(Debug, Clone, Default)]
pub struct ParsedAnnotations {
    pub annotations: AnnotationData,
    /// Sequences from a GFF3 `##FASTA` section
    pub sequences: Option<SequenceData>,
}

/// Detects format from file extension.
pub fn detect_format_from_extension<P: AsRef<Path>>(path: P) -> Option<FileFormat> {
    let ext = path.as_ref().extension().and_then(OsStr::to_str)?;
    match ext.to_lowercase().as_str() {
        "fa" | "fas" | "fasta" | "fna" | "ffn" | "frn" | "seq" => Some(FileFormat::Fasta),
        "gff" | "gff3" => Some(FileFormat::Gff3),
        "gtf" | "gff2" => Some(FileFormat::Gtf),
        "bed" => Some(FileFormat::Bed),
        "vcf" => Some(FileFormat::Vcf),
        _ => None,
    }
}

fn is_number(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

/// Detects the file format by examining the content.
pub fn detect_format_from_content(content: &str) -> Option<FileFormat> {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Directives are the most specific markers
        if let Some(version) = trimmed.strip_prefix("##gff-version") {
            return if version.trim().starts_with('3') {
                Some(FileFormat::Gff3)
            } else {
                Some(FileFormat::Gtf)
            };
        }
        if trimmed.starts_with("##fileformat=VCF") || trimmed.starts_with("#CHROM") {
            return Some(FileFormat::Vcf);
        }
        if trimmed.starts_with('#') {
            continue;
        }
        if trimmed.starts_with("track") || trimmed.starts_with("browser") {
            return Some(FileFormat::Bed);
        }

        if trimmed.starts_with('>') {
            return Some(FileFormat::Fasta);
        }

        let fields: Vec<&str> = trimmed.split('\t').collect();
        if fields.len() >= 9 && is_number(fields[3]) && is_number(fields[4]) {
            // GTF attributes look like `gene_id "X";`, GFF3 ones like `ID=X;`
            let attributes = fields[8];
            return if attributes.contains('=') {
                Some(FileFormat::Gff3)
            } else {
                Some(FileFormat::Gtf)
            };
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() >= 3 && is_number(fields[1]) && is_number(fields[2]) {
            return Some(FileFormat::Bed);
        }

        // First data line doesn't match any known format
        return None;
    }

    None
}

/// Parses sequence content with a specific format.
pub fn parse_sequence_content(content: &str, format: FileFormat) -> ParseResult<SequenceData> {
    match format {
        FileFormat::Fasta => fasta::parse_fasta_str(content).map_err(ParseError::FastaError),
        other => Err(ParseError::WrongKind {
            format: other,
            expected: "sequence",
        }),
    }
}

/// Parses annotation content with a specific format.
pub fn parse_annotation_content(content: &str, format: FileFormat) -> ParseResult<ParsedAnnotations> {
    match format {
        FileFormat::Gff3 => gff::parse_gff3_str(content).map_err(ParseError::GffError),
        FileFormat::Gtf => gff::parse_gtf_str(content)
            .map(|annotations| ParsedAnnotations {
                annotations,
                sequences: None,
            })
            .map_err(ParseError::GffError),
        FileFormat::Bed => bed::parse_bed_str(content)
            .map(|annotations| ParsedAnnotations {
                annotations,
                sequences: None,
            })
            .map_err(ParseError::BedError),
        FileFormat::Vcf => vcf::parse_vcf_str(content)
            .map(|annotations| ParsedAnnotations {
                annotations,
                sequences: None,
            })
            .map_err(ParseError::VcfError),
        FileFormat::Fasta => Err(ParseError::WrongKind {
            format,
            expected: "annotation",
        }),
    }
}

/// Runs the detection cascade for one input kind.
fn parse_with_detection<T>(
    path: &Path,
    content: &str,
    forced_format: Option<FileFormat>,
    fallbacks: &[FileFormat],
    parse: impl Fn(&str, FileFormat) -> ParseResult<T>,
) -> ParseResult<(T, FileFormat)> {
    if content.trim().is_empty() {
        return Err(ParseError::EmptyFile);
    }

    // 1. Use explicit format if provided
    if let Some(format) = forced_format {
        return parse(content, format).map(|parsed| (parsed, format));
    }

    // 2. Try to detect from extension
    if let Some(format) = detect_format_from_extension(path) {
        if let Ok(parsed) = parse(content, format) {
            return Ok((parsed, format));
        }
        // Extension didn't work, try content detection
    }

    // 3. Try content-based detection
    if let Some(format) = detect_format_from_content(content) {
        return parse(content, format).map(|parsed| (parsed, format));
    }

    // 4. Last resort: every parser of this kind in order of likelihood
    for &format in fallbacks {
        if let Ok(parsed) = parse(content, format) {
            return Ok((parsed, format));
        }
    }
    Err(ParseError::UnknownFormat)
}

/// Parses a sequence input, detecting the format unless one is forced.
///
/// `path` is only used for its extension; the content has already been read.
pub fn parse_sequences_with_options<P: AsRef<Path>>(
    path: P,
    content: &str,
    forced_format: Option<FileFormat>,
) -> ParseResult<(SequenceData, FileFormat)> {
    parse_with_detection(
        path.as_ref(),
        content,
        forced_format,
        &[FileFormat::Fasta],
        parse_sequence_content,
    )
}

/// Parses an annotation input, detecting the format unless one is forced.
pub fn parse_annotations_with_options<P: AsRef<Path>>(
    path: P,
    content: &str,
    forced_format: Option<FileFormat>,
) -> ParseResult<(ParsedAnnotations, FileFormat)> {
    parse_with_detection(
        path.as_ref(),
        content,
        forced_format,
        &[FileFormat::Gff3, FileFormat::Gtf, FileFormat::Bed, FileFormat::Vcf],
        parse_annotation_content,
    )
}
