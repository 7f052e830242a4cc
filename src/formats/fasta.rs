//! FASTA parser.
//!
//! Handles both single-line and multi-line sequences.
//!
//! ## FASTA Format
//!
//! ```text
//! >sequence_identifier optional description
//! ACGTACGTACGT...
//! >another_sequence
//! TGCATGCATGCA...
//! ```

use thiserror::Error;

use crate::model::{ModelError, Sequence, SequenceData};

/// Errors that can occur during FASTA parsing.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("Empty FASTA input")]
    EmptyFile,

    #[error("Invalid FASTA format: {0}")]
    InvalidFormat(String),

    #[error("Sequence without header at line {0}")]
    SequenceWithoutHeader(usize),

    #[error("Duplicate sequence identifier '{id}' at line {line}")]
    DuplicateId { id: String, line: usize },
}

/// Result type for FASTA operations.
pub type FastaResult<T> = Result<T, FastaError>;

struct PendingRecord<'a> {
    id: &'a str,
    description: Option<&'a str>,
    line: usize,
    residues: String,
}

impl PendingRecord<'_> {
    fn finish(self, data: &mut SequenceData) -> FastaResult<()> {
        let mut sequence = Sequence::new(self.id, self.residues).map_err(|_| {
            FastaError::InvalidFormat(format!("Empty sequence identifier at line {}", self.line))
        })?;
        if let Some(description) = self.description {
            sequence = sequence.with_description(description);
        }
        data.push(sequence).map_err(|e| match e {
            ModelError::DuplicateSequenceId(id) => FastaError::DuplicateId { id, line: self.line },
            ModelError::EmptySequenceId => {
                FastaError::InvalidFormat(format!("Empty sequence identifier at line {}", self.line))
            }
        })
    }
}

/// Parses FASTA content from a pre-loaded string.
///
/// Records with a header but no residues are kept as empty sequences; the
/// validator reports them.
pub fn parse_fasta_str(content: &str) -> FastaResult<SequenceData> {
    let mut data = SequenceData::new();
    let mut current: Option<PendingRecord> = None;
    let mut prev_seq_len: usize = 1000;

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim();

        // Skip empty lines and legacy ';' comments
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            // Save previous sequence if exists
            if let Some(record) = current.take() {
                prev_seq_len = record.residues.len();
                record.finish(&mut data)?;
            }

            // ID is everything before the first space, the rest is the description
            let header = header.trim();
            let (id, description) = match header.split_once(char::is_whitespace) {
                Some((id, rest)) => (id, Some(rest.trim()).filter(|d| !d.is_empty())),
                None => (header, None),
            };

            if id.is_empty() {
                return Err(FastaError::InvalidFormat(format!(
                    "Empty sequence identifier at line {}",
                    line_number
                )));
            }

            current = Some(PendingRecord {
                id,
                description,
                line: line_number,
                residues: String::with_capacity(prev_seq_len),
            });
        } else {
            let Some(record) = current.as_mut() else {
                return Err(FastaError::SequenceWithoutHeader(line_number));
            };

            // Fast append: most FASTA lines don't have internal whitespace
            if line.bytes().all(|b| !b.is_ascii_whitespace()) {
                record.residues.push_str(line);
            } else {
                record.residues.extend(line.chars().filter(|c| !c.is_whitespace()));
            }
        }
    }

    // Don't forget the last sequence
    if let Some(record) = current {
        record.finish(&mut data)?;
    }

    if data.is_empty() {
        return Err(FastaError::EmptyFile);
    }

    Ok(data)
}
