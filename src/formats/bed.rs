//! BED parser (BED3 through BED12).
//!
//! BED coordinates are already 0-based half-open. Each line becomes a
//! `misc_feature`; BED12 lines become one segment per block, all sharing a
//! feature id so they are joined on output.

use thiserror::Error;

use crate::model::{Annotation, AnnotationData, Strand};

/// Errors that can occur during BED parsing.
#[derive(Error, Debug)]
pub enum BedError {
    #[error("Line {line}: expected at least 3 columns, found {found}")]
    TooFewColumns { line: usize, found: usize },

    #[error("Line {line}: invalid coordinate '{value}'")]
    InvalidCoordinate { line: usize, value: String },

    #[error("Line {line}: malformed block columns")]
    InvalidBlocks { line: usize },
}

/// Result type for BED operations.
pub type BedResult<T> = Result<T, BedError>;

const FEATURE_KEY: &str = "misc_feature";

fn parse_position(value: &str, line: usize) -> BedResult<usize> {
    value.parse::<usize>().map_err(|_| BedError::InvalidCoordinate {
        line,
        value: value.to_string(),
    })
}

fn parse_list(value: &str, line: usize) -> BedResult<Vec<usize>> {
    value
        .split(',')
        .filter(|v| !v.is_empty())
        .map(|v| v.trim().parse::<usize>().map_err(|_| BedError::InvalidBlocks { line }))
        .collect()
}

/// Parses BED content.
pub fn parse_bed_str(content: &str) -> BedResult<AnnotationData> {
    let mut annotations = AnnotationData::new();

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with("track")
            || trimmed.starts_with("browser")
        {
            continue;
        }

        let fields: Vec<&str> = if trimmed.contains('\t') {
            trimmed.split('\t').collect()
        } else {
            trimmed.split_whitespace().collect()
        };
        if fields.len() < 3 {
            return Err(BedError::TooFewColumns {
                line: line_number,
                found: fields.len(),
            });
        }

        let chrom = fields[0];
        let start = parse_position(fields[1], line_number)?;
        let end = parse_position(fields[2], line_number)?;
        let name = fields.get(3).copied().filter(|n| !n.is_empty() && *n != ".");
        let strand = fields
            .get(5)
            .map(|s| Strand::from_symbol(s))
            .unwrap_or(Strand::Unstranded);

        let mut template = Annotation::new(FEATURE_KEY, chrom, start, end, strand);
        if let Some(name) = name {
            template.qualifiers.push("note", name);
        }

        if fields.len() >= 12 {
            let count = parse_position(fields[9], line_number)
                .map_err(|_| BedError::InvalidBlocks { line: line_number })?;
            let sizes = parse_list(fields[10], line_number)?;
            let starts = parse_list(fields[11], line_number)?;
            if sizes.len() != count || starts.len() != count {
                return Err(BedError::InvalidBlocks { line: line_number });
            }
            // Blocks of one line are one logical feature
            let feature_id = format!("{}:{}", name.unwrap_or(chrom), line_number);
            for (size, offset) in sizes.into_iter().zip(starts) {
                let mut block = template.clone().with_feature_id(feature_id.clone());
                block.start = start + offset;
                block.end = start + offset + size;
                annotations.push(block);
            }
        } else {
            annotations.push(template);
        }
    }

    Ok(annotations)
}
