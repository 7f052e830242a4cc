//! GenBank flat-file writer.
//!
//! Emits one record per sequence in the classic fixed-column layout:
//!
//! ```text
//! LOCUS       seq1                     100 bp    DNA     linear   UNK 01-MAR-2024
//! DEFINITION  Example sequence.
//! ...
//! FEATURES             Location/Qualifiers
//!      source          1..100
//!                      /organism="Homo sapiens"
//! ORIGIN
//!         1 acgtacgtac gtacgtacgt ...
//! //
//! ```
//!
//! Coordinates arrive 0-based half-open and are rendered 1-based inclusive.
//! Records are written line by line, so memory use is bounded by the current
//! record.

use std::io::{self, Write};

use chrono::{Local, NaiveDate};
use textwrap::{Options, WordSeparator, WordSplitter, WrapAlgorithm};

use crate::model::{Feature, Sequence, Strand};
use crate::options::{ConversionOptions, DEFAULT_DIVISION};

/// Maximum printable line width.
pub const LINE_WIDTH: usize = 79;

const HEADER_INDENT: &str = "            ";
const FEATURE_INDENT: &str = "                     ";
const LOCUS_NAME_WIDTH: usize = 16;
/// Longer keys would push the location past column 22.
const FEATURE_KEY_WIDTH: usize = 15;
const DEFAULT_MOLECULE_TYPE: &str = "DNA";

/// Qualifiers whose values are never quoted.
const UNQUOTED_QUALIFIERS: &[&str] = &[
    "codon_start",
    "transl_table",
    "number",
    "anticodon",
    "transl_except",
    "rpt_type",
    "direction",
];

/// Maps common synonyms (mostly Sequence Ontology terms) onto GenBank feature
/// keys. Unknown types pass through unchanged.
pub fn standardize_feature_type(kind: &str) -> &str {
    match kind.to_ascii_lowercase().as_str() {
        "gene" => "gene",
        "exon" => "exon",
        "intron" => "intron",
        "cds" | "coding_sequence" => "CDS",
        "mrna" | "messenger_rna" | "transcript" => "mRNA",
        "trna" | "transfer_rna" => "tRNA",
        "rrna" | "ribosomal_rna" => "rRNA",
        "ncrna" | "non_coding_rna" => "ncRNA",
        "five_prime_utr" | "5utr" | "5'utr" => "5'UTR",
        "three_prime_utr" | "3utr" | "3'utr" => "3'UTR",
        "polya_site" => "polyA_site",
        "snp" | "snv" | "sequence_variant" | "variant" => "variation",
        "repeat_region" => "repeat_region",
        "region" => "source",
        _ => kind,
    }
}

fn wrap_options(indent: &str, width: usize) -> Options<'_> {
    Options::new(width)
        .initial_indent(indent)
        .subsequent_indent(indent)
        .break_words(true)
        .word_separator(WordSeparator::AsciiSpace)
        .word_splitter(WordSplitter::NoHyphenation)
        .wrap_algorithm(WrapAlgorithm::FirstFit)
}

/// Wraps a header field: `label` padded to 12 columns, continuation lines
/// aligned under the value.
fn header_lines(label: &str, value: &str) -> Vec<String> {
    let options = wrap_options(HEADER_INDENT, LINE_WIDTH);
    textwrap::wrap(value, &options)
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            if index == 0 {
                let body = line.strip_prefix(HEADER_INDENT).unwrap_or(&line);
                format!("{:<12}{}", label, body)
            } else {
                line.into_owned()
            }
        })
        .collect()
}

/// Renders one qualifier as wrapped lines indented to the qualifier column.
pub fn qualifier_lines(key: &str, value: &str) -> Vec<String> {
    let value = value.replace(['\n', '\r'], " ");
    let text = if value.is_empty() {
        format!("/{}", key)
    } else if UNQUOTED_QUALIFIERS.contains(&key) || value.bytes().all(|b| b.is_ascii_digit()) {
        format!("/{}={}", key, value)
    } else {
        format!("/{}=\"{}\"", key, value.replace('"', "\"\""))
    };
    textwrap::wrap(&text, &wrap_options(FEATURE_INDENT, LINE_WIDTH))
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

/// 1-based inclusive rendering of a half-open range.
fn format_range(start: usize, end: usize) -> String {
    if end == start {
        // Zero-length: the site between two bases
        if start == 0 {
            "1".to_string()
        } else {
            format!("{}^{}", start, start + 1)
        }
    } else if end == start + 1 {
        end.to_string()
    } else {
        format!("{}..{}", start + 1, end)
    }
}

/// Location descriptor of a merged feature, e.g. `complement(join(1..10,20..30))`.
pub fn format_location(feature: &Feature) -> String {
    let ranges: Vec<String> = feature
        .segments
        .iter()
        .map(|s| format_range(s.start, s.end))
        .collect();
    let location = match ranges.len() {
        0 => String::new(),
        1 => ranges.into_iter().collect(),
        _ => format!("join({})", ranges.join(",")),
    };
    if feature.strand == Strand::Reverse {
        format!("complement({})", location)
    } else {
        location
    }
}

/// Splits a location after commas so no line exceeds the width.
fn location_lines(key: &str, location: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = format!("     {:<width$} ", key, width = FEATURE_KEY_WIDTH);
    let mut has_content = false;
    for token in location.split_inclusive(',') {
        if has_content && current.len() + token.len() > LINE_WIDTH {
            lines.push(std::mem::replace(&mut current, FEATURE_INDENT.to_string()));
        }
        current.push_str(token);
        has_content = true;
    }
    lines.push(current);
    lines
}

fn organism<'s>(options: &'s ConversionOptions, sequence: &'s Sequence) -> Option<&'s str> {
    options.organism.as_deref().or(sequence.organism())
}

fn molecule_type<'s>(options: &'s ConversionOptions, sequence: &'s Sequence) -> &'s str {
    options
        .molecule_type
        .as_deref()
        .or(sequence.molecule_type())
        .unwrap_or(DEFAULT_MOLECULE_TYPE)
}

fn mol_type(molecule_type: &str) -> String {
    match molecule_type {
        "DNA" => "genomic DNA".to_string(),
        "RNA" => "genomic RNA".to_string(),
        other => other.to_string(),
    }
}

/// Streaming GenBank writer over any byte sink.
pub struct GenbankWriter<'a, W: Write> {
    out: W,
    options: &'a ConversionOptions,
    date: String,
    records: usize,
}

impl<'a, W: Write> GenbankWriter<'a, W> {
    pub fn new(out: W, options: &'a ConversionOptions) -> Self {
        let date = options
            .output
            .record_date
            .unwrap_or_else(|| Local::now().date_naive());
        Self {
            out,
            options,
            date: format_date(date),
            records: 0,
        }
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> usize {
        self.records
    }

    /// Writes one complete record, terminated by `//`.
    pub fn write_record(&mut self, sequence: &Sequence, features: &[Feature]) -> io::Result<()> {
        self.write_header(sequence)?;
        self.write_features(sequence, features)?;
        self.write_origin(sequence)?;
        writeln!(self.out, "//")?;
        self.records += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_header(&mut self, sequence: &Sequence) -> io::Result<()> {
        let name: String = sequence
            .name()
            .unwrap_or(sequence.id())
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .take(LOCUS_NAME_WIDTH)
            .collect();
        let topology = self
            .options
            .topology
            .or(sequence.topology())
            .unwrap_or_default();
        let division = self
            .options
            .division
            .as_deref()
            .or(sequence.division())
            .unwrap_or(DEFAULT_DIVISION);
        writeln!(
            self.out,
            "LOCUS       {:<16} {:>11} bp {:<3}{:<6}  {:<8} {} {}",
            name,
            sequence.len(),
            "",
            molecule_type(self.options, sequence),
            topology.to_string(),
            division,
            self.date
        )?;

        let organism = organism(self.options, sequence).unwrap_or(".").to_string();
        let mut lines = header_lines("DEFINITION", sequence.description().unwrap_or("."));
        lines.extend(header_lines("ACCESSION", sequence.id()));
        lines.extend(header_lines("VERSION", sequence.id()));
        lines.extend(header_lines("KEYWORDS", "."));
        lines.extend(header_lines("SOURCE", &organism));
        lines.extend(header_lines("  ORGANISM", &organism));
        for (index, (key, value)) in self.options.custom_metadata.iter().enumerate() {
            let label = if index == 0 { "COMMENT" } else { "" };
            lines.extend(header_lines(label, &format!("{} :: {}", key, value)));
        }
        for line in lines {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    fn write_features(&mut self, sequence: &Sequence, features: &[Feature]) -> io::Result<()> {
        writeln!(self.out, "FEATURES             Location/Qualifiers")?;

        let standardize = self.options.features.standardize_feature_types;
        let key_of = |feature: &'_ Feature| -> String {
            if standardize {
                standardize_feature_type(&feature.kind).to_string()
            } else {
                feature.kind.clone()
            }
        };

        let has_source = features.iter().any(|f| key_of(f) == "source");
        if self.options.features.include_source_feature && !has_source && !sequence.is_empty() {
            let mut lines = location_lines("source", &format_range(0, sequence.len()));
            if let Some(organism) = organism(self.options, sequence) {
                lines.extend(qualifier_lines("organism", organism));
            }
            lines.extend(qualifier_lines("mol_type", &mol_type(molecule_type(self.options, sequence))));
            for line in lines {
                writeln!(self.out, "{}", line)?;
            }
        }

        for feature in features {
            let key = key_of(feature);
            let (key, original) = if key.len() > FEATURE_KEY_WIDTH {
                ("misc_feature".to_string(), Some(key))
            } else {
                (key, None)
            };
            for line in location_lines(&key, &format_location(feature)) {
                writeln!(self.out, "{}", line)?;
            }
            if let Some(original) = original {
                for line in qualifier_lines("note", &original) {
                    writeln!(self.out, "{}", line)?;
                }
            }
            for (key, value) in feature.qualifiers.iter() {
                for line in qualifier_lines(key, value) {
                    writeln!(self.out, "{}", line)?;
                }
            }
        }
        Ok(())
    }

    fn write_origin(&mut self, sequence: &Sequence) -> io::Result<()> {
        writeln!(self.out, "ORIGIN")?;
        let width = self.options.output.line_width();
        let lowercase = self.options.output.lowercase_sequence;

        for (line_index, line) in sequence.residues().as_bytes().chunks(width).enumerate() {
            write!(self.out, "{:>9}", line_index * width + 1)?;
            for group in line.chunks(10) {
                let group: String = group
                    .iter()
                    .map(|&b| {
                        if lowercase {
                            b.to_ascii_lowercase() as char
                        } else {
                            b.to_ascii_uppercase() as char
                        }
                    })
                    .collect();
                write!(self.out, " {}", group)?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }
}

/// LOCUS date, e.g. `01-MAR-2024`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string().to_uppercase()
}

/// Formats a single record into a string.
pub fn format_record(sequence: &Sequence, features: &[Feature], options: &ConversionOptions) -> io::Result<String> {
    let mut writer = GenbankWriter::new(Vec::new(), options);
    writer.write_record(sequence, features)?;
    String::from_utf8(writer.into_inner()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Qualifiers, Segment, Topology};
    use crate::options::{FeatureFormattingOptions, OutputFormattingOptions};

    fn feature(kind: &str, segments: &[(usize, usize)], strand: Strand) -> Feature {
        Feature {
            kind: kind.to_string(),
            segments: segments
                .iter()
                .map(|&(start, end)| Segment { start, end, phase: None })
                .collect(),
            strand,
            feature_id: None,
            qualifiers: Qualifiers::new(),
        }
    }

    fn fixed_date_options() -> ConversionOptions {
        ConversionOptions {
            output: OutputFormattingOptions {
                record_date: NaiveDate::from_ymd_opt(2024, 3, 1),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_location_rendering() {
        assert_eq!(format_location(&feature("gene", &[(0, 100)], Strand::Forward)), "1..100");
        assert_eq!(format_location(&feature("gene", &[(4, 5)], Strand::Forward)), "5");
        assert_eq!(format_location(&feature("gene", &[(4, 4)], Strand::Forward)), "4^5");
        assert_eq!(
            format_location(&feature("gene", &[(9, 20)], Strand::Reverse)),
            "complement(10..20)"
        );
        assert_eq!(
            format_location(&feature("CDS", &[(0, 10), (19, 30)], Strand::Reverse)),
            "complement(join(1..10,20..30))"
        );
    }

    #[test]
    fn test_long_join_wraps_at_commas() {
        let segments: Vec<(usize, usize)> = (0..20).map(|i| (i * 1000, i * 1000 + 500)).collect();
        let f = feature("mRNA", &segments, Strand::Forward);
        let lines = location_lines("mRNA", &format_location(&f));
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= LINE_WIDTH));
        assert!(lines[0].starts_with("     mRNA            join(1..500,"));
        assert!(lines[1].starts_with(FEATURE_INDENT));
        assert_eq!(lines.concat().replace(' ', "").matches("..").count(), 20);
    }

    #[test]
    fn test_qualifier_quoting() {
        assert_eq!(qualifier_lines("gene", "abc"), vec![format!("{}/gene=\"abc\"", FEATURE_INDENT)]);
        assert_eq!(qualifier_lines("codon_start", "2"), vec![format!("{}/codon_start=2", FEATURE_INDENT)]);
        assert_eq!(qualifier_lines("pseudo", ""), vec![format!("{}/pseudo", FEATURE_INDENT)]);
        assert_eq!(
            qualifier_lines("note", "say \"hi\""),
            vec![format!("{}/note=\"say \"\"hi\"\"\"", FEATURE_INDENT)]
        );
    }

    #[test]
    fn test_qualifier_wrapping() {
        let protein = "M".repeat(150);
        let lines = qualifier_lines("translation", &protein);
        assert!(lines.len() >= 3);
        for line in &lines {
            assert!(line.len() <= LINE_WIDTH);
            assert!(line.starts_with(FEATURE_INDENT));
        }
        let joined: String = lines.iter().map(|l| l.trim_start()).collect();
        assert_eq!(joined, format!("/translation=\"{}\"", protein));
    }

    #[test]
    fn test_locus_line_columns() {
        let seq = Sequence::new("seq1", "ACGT".repeat(25)).unwrap();
        let text = format_record(&seq, &[], &fixed_date_options()).unwrap();
        let locus = text.lines().next().unwrap();
        assert_eq!(
            locus,
            "LOCUS       seq1                     100 bp    DNA     linear   UNK 01-MAR-2024"
        );
        assert_eq!(&locus[12..16], "seq1");
        assert_eq!(&locus[29..40].trim_start(), &"100");
        assert_eq!(&locus[47..50], "DNA");
        assert_eq!(&locus[55..61], "linear");
        assert_eq!(&locus[68..79], "01-MAR-2024");
    }

    #[test]
    fn test_long_locus_name_truncated() {
        let seq = Sequence::new("a_very_long_sequence_identifier", "ACGT").unwrap();
        let text = format_record(&seq, &[], &fixed_date_options()).unwrap();
        assert!(text.starts_with("LOCUS       a_very_long_sequ "));
    }

    #[test]
    fn test_origin_blocks() {
        let seq = Sequence::new("s", "ACGTACGTAC".repeat(7)).unwrap();
        let text = format_record(&seq, &[], &fixed_date_options()).unwrap();
        let origin: Vec<&str> = text.lines().skip_while(|l| *l != "ORIGIN").collect();
        assert_eq!(
            origin[1],
            "        1 acgtacgtac acgtacgtac acgtacgtac acgtacgtac acgtacgtac acgtacgtac"
        );
        assert_eq!(origin[2], "       61 acgtacgtac");
        assert_eq!(origin[3], "//");
    }

    #[test]
    fn test_uppercase_and_custom_width() {
        let seq = Sequence::new("s", "acgtacgtacgtacgtacgtacgt").unwrap();
        let mut options = fixed_date_options();
        options.output.lowercase_sequence = false;
        options.output.sequence_line_width = 20;
        let text = format_record(&seq, &[], &options).unwrap();
        assert!(text.contains("\n        1 ACGTACGTAC GTACGTACGT\n       21 ACGT\n//\n"));
    }

    #[test]
    fn test_features_block() {
        let seq = Sequence::new("seq1", "A".repeat(200))
            .unwrap()
            .with_organism("Homo sapiens");
        let mut gene = feature("gene", &[(0, 100)], Strand::Forward);
        gene.qualifiers.push("gene", "abc");
        gene.qualifiers.push("note", "first");
        let text = format_record(&seq, &[gene], &fixed_date_options()).unwrap();
        let expected = "FEATURES             Location/Qualifiers\n\
\x20    source          1..200\n\
\x20                    /organism=\"Homo sapiens\"\n\
\x20                    /mol_type=\"genomic DNA\"\n\
\x20    gene            1..100\n\
\x20                    /gene=\"abc\"\n\
\x20                    /note=\"first\"\n\
ORIGIN\n";
        assert!(text.contains(expected), "{}", text);
        assert!(text.contains("SOURCE      Homo sapiens\n  ORGANISM  Homo sapiens\n"));
    }

    #[test]
    fn test_existing_source_not_duplicated() {
        let seq = Sequence::new("seq1", "ACGTACGTAC").unwrap();
        let options = ConversionOptions {
            features: FeatureFormattingOptions {
                standardize_feature_types: true,
                ..Default::default()
            },
            ..fixed_date_options()
        };
        let region = feature("region", &[(0, 10)], Strand::Unstranded);
        let text = format_record(&seq, &[region], &options).unwrap();
        assert_eq!(text.matches("     source          ").count(), 1);
    }

    #[test]
    fn test_long_feature_type_becomes_misc_feature() {
        let seq = Sequence::new("seq1", "ACGTACGTAC").unwrap();
        let mut transcript = feature("pseudogenic_transcript", &[(0, 5)], Strand::Forward);
        transcript.qualifiers.push("gene", "abc");
        let text = format_record(&seq, &[transcript], &fixed_date_options()).unwrap();
        let expected = "\x20    misc_feature    1..5\n\
\x20                    /note=\"pseudogenic_transcript\"\n\
\x20                    /gene=\"abc\"\n";
        assert!(text.contains(expected), "{}", text);
        assert!(!text.contains("     pseudogenic_transcript"));
    }

    #[test]
    fn test_non_ascii_sequence_length_and_origin() {
        let seq = Sequence::new("seq1", "ACGTé").unwrap();
        let text = format_record(&seq, &[], &fixed_date_options()).unwrap();
        assert!(text.contains("           5 bp "));
        assert!(text.contains("        1 acgtx\n//\n"));
    }

    #[test]
    fn test_standardize_feature_type() {
        assert_eq!(standardize_feature_type("five_prime_UTR"), "5'UTR");
        assert_eq!(standardize_feature_type("coding_sequence"), "CDS");
        assert_eq!(standardize_feature_type("messenger_RNA"), "mRNA");
        assert_eq!(standardize_feature_type("misc_feature"), "misc_feature");
    }

    #[test]
    fn test_header_wrapping_and_comment() {
        let description = "word ".repeat(30);
        let seq = Sequence::new("s", "ACGT").unwrap().with_description(description.trim());
        let mut options = fixed_date_options();
        options.custom_metadata.insert("project".to_string(), "demo".to_string());
        options.custom_metadata.insert("run".to_string(), "7".to_string());
        let text = format_record(&seq, &[], &options).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].starts_with("DEFINITION  word word"));
        assert!(lines[2].starts_with("            word"));
        assert!(lines.iter().all(|l| l.len() <= LINE_WIDTH));
        assert!(text.contains("COMMENT     project :: demo\n            run :: 7\n"));
    }

    #[test]
    fn test_record_metadata_and_overrides() {
        let seq = Sequence::new("NC_000001", "ACGT")
            .unwrap()
            .with_name("chr1")
            .with_molecule_type("RNA")
            .with_topology(Topology::Circular)
            .with_division("BCT");
        let text = format_record(&seq, &[], &fixed_date_options()).unwrap();
        let locus = text.lines().next().unwrap();
        assert_eq!(
            locus,
            "LOCUS       chr1                       4 bp    RNA     circular BCT 01-MAR-2024"
        );
        assert!(text.contains("ACCESSION   NC_000001\n"));
        assert!(text.contains("/mol_type=\"genomic RNA\""));

        let options = ConversionOptions {
            division: Some("PLN".to_string()),
            topology: Some(Topology::Linear),
            ..fixed_date_options()
        };
        let text = format_record(&seq, &[], &options).unwrap();
        assert!(text.lines().next().unwrap().ends_with("linear   PLN 01-MAR-2024"));
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(1999, 6, 21).unwrap()), "21-JUN-1999");
    }
}
