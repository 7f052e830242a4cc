//! Conversion orchestrator.
//!
//! Sequences every step of a conversion:
//! detect and parse inputs, merge and validate, translate CDS features, then
//! stream GenBank records to a sink. Each call works on its own data and
//! options, so independent conversions can run on separate threads.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::error::{ConvertError, ConvertResult};
use crate::fileio::FileService;
use crate::formats::{self, FileFormat, ParsedAnnotations};
use crate::genbank::GenbankWriter;
use crate::genetic_code::GeneticCodeTable;
use crate::merge::{self, MergedData};
use crate::model::{AnnotationData, Feature, Sequence, SequenceData};
use crate::options::ConversionOptions;
use crate::translation::Translator;
use crate::validation::{ValidationIssue, ValidationResult};

/// Counts and diagnostics of one conversion.
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub sequence_count: usize,
    /// Merged features written, excluding generated `source` features
    pub feature_count: usize,
    pub generated_at: DateTime<Utc>,
    pub validation: ValidationResult,
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} record(s), {} feature(s), {} error(s), {} warning(s)",
            self.sequence_count,
            self.feature_count,
            self.validation.error_count(),
            self.validation.warning_count()
        )
    }
}

/// Where formatted output lives.
#[derive(Debug)]
enum GenbankContent {
    Memory(Vec<u8>),
    Spooled(NamedTempFile),
}

/// Formatted GenBank output plus its summary.
#[derive(Debug)]
pub struct GenbankResult {
    content: GenbankContent,
    summary: ConversionSummary,
}

impl GenbankResult {
    pub fn summary(&self) -> &ConversionSummary {
        &self.summary
    }

    pub fn sequence_count(&self) -> usize {
        self.summary.sequence_count
    }

    pub fn feature_count(&self) -> usize {
        self.summary.feature_count
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.summary.generated_at
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.summary.validation
    }

    /// True when the output was spooled to a temporary file.
    pub fn is_spooled(&self) -> bool {
        matches!(self.content, GenbankContent::Spooled(_))
    }

    /// Copies the output into `sink`, returning the number of bytes written.
    pub fn write_to<W: Write + ?Sized>(&self, sink: &mut W) -> ConvertResult<u64> {
        match &self.content {
            GenbankContent::Memory(bytes) => {
                sink.write_all(bytes)?;
                Ok(bytes.len() as u64)
            }
            GenbankContent::Spooled(temp) => {
                let mut file = temp.reopen().map_err(|source| ConvertError::FileProcessing {
                    path: temp.path().to_path_buf(),
                    source,
                })?;
                Ok(io::copy(&mut file, sink)?)
            }
        }
    }

    /// Writes the output to `path`.
    pub fn save(&self, path: &Path) -> ConvertResult<()> {
        let file = File::create(path).map_err(|source| ConvertError::FileProcessing {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush().map_err(|source| ConvertError::FileProcessing {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The whole output as text.
    pub fn to_text(&self) -> ConvertResult<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ConvertError::Conversion(e.to_string()))
    }
}

/// Adds `/codon_start`, `/transl_table` and `/translation` to a CDS.
///
/// An existing `/translation` is kept as is.
fn annotate_cds(
    feature: &Feature,
    sequence: &Sequence,
    translator: &Translator<'_>,
    issues: &mut Vec<ValidationIssue>,
) -> Feature {
    let mut feature = feature.clone();
    if feature.qualifiers.contains_key("translation") {
        return feature;
    }
    let Some((translation, issue)) = translator.translate_feature(&feature, sequence) else {
        return feature;
    };
    issues.extend(issue);

    let phase = feature.leading_phase();
    if phase > 0 && !feature.qualifiers.contains_key("codon_start") {
        feature.qualifiers.push("codon_start", (phase + 1).to_string());
    }
    if !feature.qualifiers.contains_key("transl_table") {
        feature
            .qualifiers
            .push("transl_table", translator.table().id().to_string());
    }
    if !translation.protein.is_empty() {
        feature.qualifiers.push("translation", translation.protein);
    }
    feature
}

/// Conversion façade.
///
/// ```no_run
/// use std::path::Path;
/// use gbconvert::convert::Converter;
/// use gbconvert::options::ConversionOptions;
///
/// let converter = Converter::new(ConversionOptions::default());
/// let result = converter.convert_files(Path::new("genome.fa"), Some(Path::new("genes.gff3")))?;
/// result.save(Path::new("genome.gb"))?;
/// # Ok::<(), gbconvert::error::ConvertError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConversionOptions,
    files: FileService,
    cancel: Option<Arc<AtomicBool>>,
}

impl Converter {
    pub fn new(options: ConversionOptions) -> Self {
        Self {
            options,
            files: FileService::new(),
            cancel: None,
        }
    }

    /// Checks `flag` between records; once raised the conversion stops with
    /// `ConvertError::Cancelled`.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    fn check_cancelled(&self) -> ConvertResult<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(ConvertError::Cancelled),
            _ => Ok(()),
        }
    }

    fn load_sequences(&self, path: &Path) -> ConvertResult<(SequenceData, FileFormat)> {
        let content = self.files.read_text(path)?;
        formats::parse_sequences_with_options(path, &content, self.options.sequence_format)
            .map_err(|e| ConvertError::from_parse(path.display().to_string(), e))
    }

    fn load_annotations(&self, path: &Path) -> ConvertResult<(ParsedAnnotations, FileFormat)> {
        let content = self.files.read_text(path)?;
        formats::parse_annotations_with_options(path, &content, self.options.annotation_format)
            .map_err(|e| ConvertError::from_parse(path.display().to_string(), e))
    }

    /// Reads both inputs. Sequences embedded in a GFF3 `##FASTA` section are
    /// added when their id is not already present.
    fn load_inputs(
        &self,
        sequence_path: &Path,
        annotation_path: Option<&Path>,
    ) -> ConvertResult<(SequenceData, AnnotationData, String)> {
        let (mut sequences, sequence_format) = self.load_sequences(sequence_path)?;
        let mut label = sequence_format.to_string();

        let annotations = match annotation_path {
            Some(path) => {
                let (parsed, annotation_format) = self.load_annotations(path)?;
                label = format!("{}+{}", label, annotation_format);
                for embedded in parsed.sequences.iter().flat_map(SequenceData::iter) {
                    if !sequences.contains(embedded.id()) {
                        sequences
                            .push(embedded.clone())
                            .map_err(|e| ConvertError::Conversion(e.to_string()))?;
                    }
                }
                parsed.annotations
            }
            None => AnnotationData::new(),
        };
        Ok((sequences, annotations, label))
    }

    /// Converts files on disk.
    pub fn convert_files(&self, sequence_path: &Path, annotation_path: Option<&Path>) -> ConvertResult<GenbankResult> {
        let (sequences, annotations, label) = self.load_inputs(sequence_path, annotation_path)?;
        let mut result = self.convert(&sequences, &annotations)?;
        result.summary.validation = result.summary.validation.with_format(label);
        Ok(result)
    }

    /// Converts in-memory data.
    ///
    /// In memory-efficient mode the output is spooled to a temporary file.
    pub fn convert(&self, sequences: &SequenceData, annotations: &AnnotationData) -> ConvertResult<GenbankResult> {
        if self.options.memory_efficient {
            let mut temp = self.files.create_temp()?;
            let summary = {
                let mut sink = BufWriter::new(temp.as_file_mut());
                let summary = self.convert_to_stream(sequences, annotations, &mut sink)?;
                sink.flush()?;
                summary
            };
            Ok(GenbankResult {
                content: GenbankContent::Spooled(temp),
                summary,
            })
        } else {
            let mut buffer = Vec::new();
            let summary = self.convert_to_stream(sequences, annotations, &mut buffer)?;
            Ok(GenbankResult {
                content: GenbankContent::Memory(buffer),
                summary,
            })
        }
    }

    /// Converts files and streams records straight into `sink`.
    pub fn convert_files_to_stream<W: Write>(
        &self,
        sequence_path: &Path,
        annotation_path: Option<&Path>,
        sink: W,
    ) -> ConvertResult<ConversionSummary> {
        let (sequences, annotations, label) = self.load_inputs(sequence_path, annotation_path)?;
        let mut summary = self.convert_to_stream(&sequences, &annotations, sink)?;
        summary.validation = summary.validation.with_format(label);
        Ok(summary)
    }

    /// Streams records into `sink`, one record at a time.
    ///
    /// In strict mode an invalid merge aborts before anything is written.
    pub fn convert_to_stream<W: Write>(
        &self,
        sequences: &SequenceData,
        annotations: &AnnotationData,
        sink: W,
    ) -> ConvertResult<ConversionSummary> {
        let table = self.options.translation.resolve_table()?;
        let (merged, validation) = merge::merge(sequences, annotations, &self.options);
        let validation = validation.with_issues(merge::validate_sequences(sequences));
        if self.options.strict && !validation.is_valid() {
            return Err(ConvertError::Validation(validation.summary()));
        }

        let mut issues = Vec::new();
        let mut writer = GenbankWriter::new(sink, &self.options);
        self.write_records(&merged, table, &mut writer, &mut issues)?;
        writer.flush()?;

        Ok(ConversionSummary {
            sequence_count: writer.records_written(),
            feature_count: merged.feature_count(),
            generated_at: Utc::now(),
            validation: validation.with_issues(issues),
        })
    }

    fn write_records<W: Write>(
        &self,
        merged: &MergedData,
        table: GeneticCodeTable,
        writer: &mut GenbankWriter<'_, W>,
        issues: &mut Vec<ValidationIssue>,
    ) -> ConvertResult<()> {
        let translator = Translator::new(table, &self.options.translation);
        for (sequence, features) in merged.records() {
            self.check_cancelled()?;
            let features: Vec<Feature> = features
                .iter()
                .map(|feature| {
                    if merge::is_cds(&feature.kind) {
                        annotate_cds(feature, sequence, &translator, issues)
                    } else {
                        feature.clone()
                    }
                })
                .collect();
            writer.write_record(sequence, &features)?;
        }
        Ok(())
    }

    /// Validates a sequence file on its own.
    ///
    /// Unreadable files are errors; malformed content yields an invalid report.
    pub fn validate_sequence(&self, path: &Path) -> ConvertResult<ValidationResult> {
        let content = self.files.read_text(path)?;
        match formats::parse_sequences_with_options(path, &content, self.options.sequence_format) {
            Ok((sequences, format)) => Ok(self.validate_sequence_data(&sequences).with_format(format.to_string())),
            Err(e) => Ok(parse_failure(path, e.to_string())),
        }
    }

    /// Validates an annotation file on its own.
    pub fn validate_annotation(&self, path: &Path) -> ConvertResult<ValidationResult> {
        let content = self.files.read_text(path)?;
        match formats::parse_annotations_with_options(path, &content, self.options.annotation_format) {
            Ok((parsed, format)) => Ok(self
                .validate_annotation_data(&parsed.annotations)
                .with_format(format.to_string())),
            Err(e) => Ok(parse_failure(path, e.to_string())),
        }
    }

    /// Cross-validates a sequence file against an annotation file.
    pub fn validate_files(&self, sequence_path: &Path, annotation_path: &Path) -> ConvertResult<ValidationResult> {
        let (sequences, annotations, label) = self.load_inputs(sequence_path, Some(annotation_path))?;
        Ok(self.validate(&sequences, &annotations).with_format(label))
    }

    pub fn validate_sequence_data(&self, sequences: &SequenceData) -> ValidationResult {
        ValidationResult::new(None, sequences.sequence_count(), 0, merge::validate_sequences(sequences))
    }

    pub fn validate_annotation_data(&self, annotations: &AnnotationData) -> ValidationResult {
        ValidationResult::new(
            None,
            0,
            annotations.total_count(),
            merge::validate_annotations(annotations),
        )
    }

    /// Checks that annotations and sequences fit together, without formatting.
    pub fn validate(&self, sequences: &SequenceData, annotations: &AnnotationData) -> ValidationResult {
        let (_, result) = merge::merge(sequences, annotations, &self.options);
        result.with_issues(merge::validate_sequences(sequences))
    }
}

fn parse_failure(path: &Path, message: String) -> ValidationResult {
    let format = formats::detect_format_from_extension(path).map(|f| f.to_string());
    ValidationResult::new(
        format,
        0,
        0,
        vec![ValidationIssue::error(message).at(path.display().to_string())],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, Strand};
    use crate::options::{FeatureFilterOptions, OutputFormattingOptions, TranslationOptions};
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn options(translation: TranslationOptions) -> ConversionOptions {
        ConversionOptions {
            translation,
            output: OutputFormattingOptions {
                record_date: NaiveDate::from_ymd_opt(2024, 3, 1),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn standard() -> TranslationOptions {
        TranslationOptions {
            table_id: Some(1),
            ..Default::default()
        }
    }

    fn cds_input() -> (SequenceData, AnnotationData) {
        let sequences = SequenceData::from_sequences(vec![Sequence::new("seq1", "ATGAAATAA").unwrap()]).unwrap();
        let annotations =
            AnnotationData::from_annotations(vec![Annotation::new("CDS", "seq1", 0, 9, Strand::Forward)]);
        (sequences, annotations)
    }

    #[test]
    fn test_cds_translation_without_stop() {
        let (sequences, annotations) = cds_input();
        let result = Converter::new(options(standard())).convert(&sequences, &annotations).unwrap();
        let text = result.to_text().unwrap();
        assert!(text.contains("     CDS             1..9\n"));
        assert!(text.contains("/translation=\"MK\"\n"));
        assert!(text.contains("/transl_table=1\n"));
        assert!(!text.contains("/codon_start"));
        assert_eq!(result.feature_count(), 1);
        assert!(result.validation().is_valid());
    }

    #[test]
    fn test_cds_translation_with_stop() {
        let (sequences, annotations) = cds_input();
        let translation = TranslationOptions {
            include_stop_codon: true,
            ..standard()
        };
        let text = Converter::new(options(translation))
            .convert(&sequences, &annotations)
            .unwrap()
            .to_text()
            .unwrap();
        assert!(text.contains("/translation=\"MK*\""));
    }

    #[test]
    fn test_unknown_genetic_code_falls_back() {
        let (sequences, annotations) = cds_input();
        let translation = TranslationOptions {
            genetic_code: Some("xyz".to_string()),
            ..Default::default()
        };
        let converter = Converter::new(options(translation));
        let text = converter.convert(&sequences, &annotations).unwrap().to_text().unwrap();
        assert!(text.contains("/transl_table=5\n"));
        assert_eq!(converter.options().translation.genetic_code(), Some("xyz"));
    }

    #[test]
    fn test_unknown_table_id_is_fatal() {
        let (sequences, annotations) = cds_input();
        let translation = TranslationOptions {
            table_id: Some(99),
            ..Default::default()
        };
        let err = Converter::new(options(translation))
            .convert(&sequences, &annotations)
            .unwrap_err();
        assert!(matches!(err, ConvertError::ResourceNotFound(_)));
    }

    #[test]
    fn test_existing_translation_kept() {
        let sequences = SequenceData::from_sequences(vec![Sequence::new("seq1", "ATGAAATAA").unwrap()]).unwrap();
        let annotations = AnnotationData::from_annotations(vec![Annotation::new(
            "CDS",
            "seq1",
            0,
            9,
            Strand::Forward,
        )
        .with_qualifier("translation", "MQ")]);
        let text = Converter::new(options(standard()))
            .convert(&sequences, &annotations)
            .unwrap()
            .to_text()
            .unwrap();
        assert_eq!(text.matches("/translation=").count(), 1);
        assert!(text.contains("/translation=\"MQ\""));
    }

    #[test]
    fn test_phase_adds_codon_start() {
        let sequences = SequenceData::from_sequences(vec![Sequence::new("seq1", "CCATGAAATAA").unwrap()]).unwrap();
        let annotations = AnnotationData::from_annotations(vec![Annotation::new(
            "CDS",
            "seq1",
            0,
            11,
            Strand::Forward,
        )
        .with_phase(2)]);
        let text = Converter::new(options(standard()))
            .convert(&sequences, &annotations)
            .unwrap()
            .to_text()
            .unwrap();
        assert!(text.contains("/codon_start=3\n"));
        assert!(text.contains("/translation=\"MK\""));
    }

    #[test]
    fn test_phased_coding_sequence_translated_in_frame() {
        let sequences = SequenceData::from_sequences(vec![Sequence::new("seq1", "CATGAAATAA").unwrap()]).unwrap();
        let annotations = AnnotationData::from_annotations(vec![Annotation::new(
            "coding_sequence",
            "seq1",
            0,
            10,
            Strand::Unstranded,
        )
        .with_phase(1)]);
        let result = Converter::new(options(standard()))
            .convert(&sequences, &annotations)
            .unwrap();
        let text = result.to_text().unwrap();
        assert!(text.contains("/codon_start=2\n"));
        assert!(text.contains("/translation=\"MK\""));
        assert_eq!(result.validation().warning_count(), 1);
    }

    #[test]
    fn test_filter_keeps_only_genes() {
        let sequences = SequenceData::from_sequences(vec![Sequence::new("seq1", "ATGAAATAA").unwrap()]).unwrap();
        let annotations = AnnotationData::from_annotations(vec![
            Annotation::new("gene", "seq1", 0, 9, Strand::Forward),
            Annotation::new("CDS", "seq1", 0, 9, Strand::Forward),
        ]);
        let mut opts = options(standard());
        opts.filter = FeatureFilterOptions {
            include_feature_types: ["gene".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let result = Converter::new(opts).convert(&sequences, &annotations).unwrap();
        let text = result.to_text().unwrap();
        assert_eq!(result.feature_count(), 1);
        assert!(text.contains("     gene            1..9\n"));
        assert!(!text.contains("     CDS"));
    }

    #[test]
    fn test_merge_sequences_into_one_record() {
        let sequences = SequenceData::from_sequences(vec![
            Sequence::new("a", "A".repeat(10)).unwrap(),
            Sequence::new("b", "C".repeat(15)).unwrap(),
        ])
        .unwrap();
        let annotations =
            AnnotationData::from_annotations(vec![Annotation::new("gene", "b", 2, 6, Strand::Forward)]);
        let mut opts = options(standard());
        opts.merge_sequences = true;
        let result = Converter::new(opts).convert(&sequences, &annotations).unwrap();
        let text = result.to_text().unwrap();
        assert_eq!(result.sequence_count(), 1);
        assert_eq!(text.matches("LOCUS").count(), 1);
        assert!(text.contains(" 25 bp "));
        assert!(text.contains("     gene            13..16\n"));
    }

    #[test]
    fn test_one_based_rendering() {
        let sequences = SequenceData::from_sequences(vec![Sequence::new("seq1", "A".repeat(120)).unwrap()]).unwrap();
        let annotations =
            AnnotationData::from_annotations(vec![Annotation::new("gene", "seq1", 0, 100, Strand::Forward)]);
        let text = Converter::new(options(standard()))
            .convert(&sequences, &annotations)
            .unwrap()
            .to_text()
            .unwrap();
        assert!(text.contains("     gene            1..100\n"));
    }

    #[test]
    fn test_strict_mode_rejects_invalid_input() {
        let sequences = SequenceData::from_sequences(vec![Sequence::new("seq1", "ACGT").unwrap()]).unwrap();
        let annotations =
            AnnotationData::from_annotations(vec![Annotation::new("gene", "chrX", 0, 2, Strand::Forward)]);

        let lenient = Converter::new(options(standard())).convert(&sequences, &annotations).unwrap();
        assert!(!lenient.validation().is_valid());
        assert_eq!(lenient.sequence_count(), 1);

        let mut opts = options(standard());
        opts.strict = true;
        let err = Converter::new(opts).convert(&sequences, &annotations).unwrap_err();
        assert!(matches!(err, ConvertError::Validation(_)));
    }

    #[test]
    fn test_internal_stop_is_warning() {
        let sequences = SequenceData::from_sequences(vec![Sequence::new("seq1", "ATGTAAAAATAG").unwrap()]).unwrap();
        let annotations =
            AnnotationData::from_annotations(vec![Annotation::new("CDS", "seq1", 0, 12, Strand::Forward)]);
        let mut opts = options(standard());
        opts.strict = true;
        let result = Converter::new(opts).convert(&sequences, &annotations).unwrap();
        assert!(result.validation().is_valid());
        assert_eq!(result.validation().warning_count(), 1);
        assert!(result.to_text().unwrap().contains("/translation=\"M\""));
    }

    #[test]
    fn test_memory_efficient_matches_in_memory() {
        let (sequences, annotations) = cds_input();
        let in_memory = Converter::new(options(standard())).convert(&sequences, &annotations).unwrap();
        let mut opts = options(standard());
        opts.memory_efficient = true;
        let spooled = Converter::new(opts).convert(&sequences, &annotations).unwrap();
        assert!(spooled.is_spooled());
        assert!(!in_memory.is_spooled());
        assert_eq!(spooled.to_text().unwrap(), in_memory.to_text().unwrap());
    }

    #[test]
    fn test_cancel_flag() {
        let (sequences, annotations) = cds_input();
        let flag = Arc::new(AtomicBool::new(true));
        let err = Converter::new(options(standard()))
            .with_cancel_flag(flag)
            .convert(&sequences, &annotations)
            .unwrap_err();
        assert!(matches!(err, ConvertError::Cancelled));
    }

    #[test]
    fn test_convert_files_and_save() {
        let dir = tempdir().unwrap();
        let fasta = dir.path().join("genome.fa");
        let gff = dir.path().join("genes.gff3");
        let out = dir.path().join("genome.gb");
        fs::write(&fasta, ">seq1 test sequence\nATGAAA\nTAA\n").unwrap();
        fs::write(
            &gff,
            "##gff-version 3\nseq1\t.\tCDS\t1\t9\t.\t+\t0\tID=cds1;Name=prot\n",
        )
        .unwrap();

        let converter = Converter::new(options(standard()));
        let result = converter.convert_files(&fasta, Some(&gff)).unwrap();
        assert_eq!(result.validation().format(), Some("FASTA+GFF3"));
        result.save(&out).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        assert!(text.starts_with("LOCUS       seq1"));
        assert!(text.contains("DEFINITION  test sequence\n"));
        assert!(text.contains("/translation=\"MK\""));
        assert!(text.ends_with("//\n"));
    }

    #[test]
    fn test_convert_to_stream() {
        let (sequences, annotations) = cds_input();
        let mut sink = Vec::new();
        let summary = Converter::new(options(standard()))
            .convert_to_stream(&sequences, &annotations, &mut sink)
            .unwrap();
        assert_eq!(summary.sequence_count, 1);
        assert_eq!(summary.to_string(), "1 record(s), 1 feature(s), 0 error(s), 0 warning(s)");
        assert!(String::from_utf8(sink).unwrap().contains("ORIGIN\n        1 atgaaataa\n//\n"));
    }

    #[test]
    fn test_validate_sequence_file() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.fasta");
        let bad = dir.path().join("bad.fasta");
        fs::write(&good, ">a\nACGT\n>b\nGGCC\n").unwrap();
        fs::write(&bad, "ACGT\n>a\nAC\n").unwrap();

        let converter = Converter::new(ConversionOptions::default());
        let report = converter.validate_sequence(&good).unwrap();
        assert!(report.is_valid());
        assert_eq!(
            report.summary(),
            "Valid FASTA input: 2 sequence(s), 0 feature(s), 0 error(s), 0 warning(s)"
        );

        let report = converter.validate_sequence(&bad).unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn test_validate_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let err = Converter::new(ConversionOptions::default())
            .validate_sequence(&dir.path().join("nope.fa"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::FileProcessing { .. }));
    }

    #[test]
    fn test_validate_annotation_file() {
        let dir = tempdir().unwrap();
        let bed = dir.path().join("peaks.bed");
        fs::write(&bed, "chr1\t10\t20\tpeak\n").unwrap();
        let report = Converter::new(ConversionOptions::default())
            .validate_annotation(&bed)
            .unwrap();
        assert!(report.is_valid());
        assert_eq!(report.format(), Some("BED"));
        assert_eq!(report.feature_count(), 1);
    }

    #[test]
    fn test_cross_validation() {
        let (sequences, _) = cds_input();
        let annotations = AnnotationData::from_annotations(vec![
            Annotation::new("gene", "seq1", 0, 9, Strand::Forward),
            Annotation::new("gene", "seq9", 0, 9, Strand::Forward),
        ]);
        let report = Converter::new(ConversionOptions::default()).validate(&sequences, &annotations);
        assert!(!report.is_valid());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.feature_count(), 1);
    }
}
