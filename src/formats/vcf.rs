//! VCF parser.
//!
//! Each variant record becomes a `variation` feature spanning the reference
//! allele: `[POS-1, POS-1+len(REF))`.

use thiserror::Error;

use crate::model::{Annotation, AnnotationData, Strand};

/// Errors that can occur during VCF parsing.
#[derive(Error, Debug)]
pub enum VcfError {
    #[error("Line {line}: expected at least 5 columns, found {found}")]
    TooFewColumns { line: usize, found: usize },

    #[error("Line {line}: invalid position '{value}'")]
    InvalidPosition { line: usize, value: String },
}

/// Result type for VCF operations.
pub type VcfResult<T> = Result<T, VcfError>;

const FEATURE_KEY: &str = "variation";

/// Parses VCF content.
pub fn parse_vcf_str(content: &str) -> VcfResult<AnnotationData> {
    let mut annotations = AnnotationData::new();

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 5 {
            return Err(VcfError::TooFewColumns {
                line: line_number,
                found: fields.len(),
            });
        }

        let pos = match fields[1].parse::<usize>() {
            Ok(pos) if pos > 0 => pos,
            _ => {
                return Err(VcfError::InvalidPosition {
                    line: line_number,
                    value: fields[1].to_string(),
                })
            }
        };
        let (id, reference, alternates) = (fields[2], fields[3], fields[4]);

        let start = pos - 1;
        let mut annotation = Annotation::new(
            FEATURE_KEY,
            fields[0],
            start,
            start + reference.len().max(1),
            Strand::Unstranded,
        );

        for alt in alternates.split(',').filter(|a| *a != "." && *a != "*") {
            if alt.starts_with('<') {
                // Symbolic alleles have no literal replacement
                annotation.qualifiers.push("note", format!("ALT={}", alt));
            } else {
                annotation.qualifiers.push("replace", alt.to_ascii_lowercase());
            }
        }

        for variant_id in id.split(';').filter(|i| *i != "." && !i.is_empty()) {
            match variant_id.strip_prefix("rs") {
                Some(number) if number.bytes().all(|b| b.is_ascii_digit()) => {
                    annotation.qualifiers.push("db_xref", format!("dbSNP:{}", number));
                }
                _ => annotation.qualifiers.push("note", variant_id),
            }
        }

        annotations.push(annotation);
    }

    Ok(annotations)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VCF: &str = "##fileformat=VCFv4.2\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
chr1\t5\trs123\tA\tG,T\t50\tPASS\t.\n\
chr1\t12\tvar7\tAT\tA\t.\t.\t.\n\
chr2\t3\t.\tC\t<DEL>\t.\t.\t.\n";

    #[test]
    fn test_parse_snv() {
        let data = parse_vcf_str(VCF).unwrap();
        let ann = &data.for_sequence("chr1")[0];
        assert_eq!((ann.start, ann.end), (4, 5));
        assert_eq!(ann.kind, "variation");
        let replaces: Vec<&str> = ann.qualifiers.get_all("replace").collect();
        assert_eq!(replaces, vec!["g", "t"]);
        assert_eq!(ann.qualifiers.get("db_xref"), Some("dbSNP:123"));
    }

    #[test]
    fn test_parse_deletion_and_symbolic() {
        let data = parse_vcf_str(VCF).unwrap();
        let deletion = &data.for_sequence("chr1")[1];
        assert_eq!((deletion.start, deletion.end), (11, 13));
        assert_eq!(deletion.qualifiers.get("note"), Some("var7"));

        let symbolic = &data.for_sequence("chr2")[0];
        assert_eq!(symbolic.qualifiers.get("note"), Some("ALT=<DEL>"));
        assert!(!symbolic.qualifiers.contains_key("replace"));
    }

    #[test]
    fn test_invalid_position() {
        let result = parse_vcf_str("chr1\tabc\t.\tA\tG\n");
        assert!(matches!(result, Err(VcfError::InvalidPosition { line: 1, .. })));
    }

    #[test]
    fn test_too_few_columns() {
        let result = parse_vcf_str("chr1\t5\t.\tA\n");
        assert!(matches!(result, Err(VcfError::TooFewColumns { line: 1, found: 4 })));
    }
}
