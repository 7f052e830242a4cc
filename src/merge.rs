//! Annotation merging and validation.
//!
//! Reconciles annotations against the sequences they reference:
//! 1. drop annotations whose sequence id is unknown (ERROR)
//! 2. drop annotations with inverted or out-of-range coordinates (ERROR) and
//!    zero-length sites before the first base (WARNING)
//! 3. apply the feature type include/exclude filter
//! 4. group segments sharing a feature id into one logical feature
//! 5. optionally concatenate all sequences and shift coordinates
//!
//! Problems are accumulated, never raised. Re-merging a merged result yields
//! the same result and no new issues.

use std::collections::HashMap;

use crate::genbank::standardize_feature_type;
use crate::model::{Annotation, AnnotationData, Feature, Qualifiers, Segment, Sequence, SequenceData, Strand};
use crate::options::ConversionOptions;
use crate::validation::{ValidationIssue, ValidationResult};

/// Characters accepted in nucleotide sequences (IUPAC plus gap).
const NUCLEOTIDE_SYMBOLS: &[u8] = b"ACGTURYSWKMBDHVN-";

fn location(sequence_id: &str, start: usize, end: usize) -> String {
    format!("{}:{}..{}", sequence_id, start + 1, end)
}

/// True for every type written as a GenBank `CDS`, synonyms included.
pub(crate) fn is_cds(kind: &str) -> bool {
    standardize_feature_type(kind) == "CDS"
}

/// Annotations and features after merging, paired with their sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedData {
    pub sequences: SequenceData,
    /// Surviving annotations, ordered feature by feature
    pub annotations: AnnotationData,
    features: HashMap<String, Vec<Feature>>,
}

impl MergedData {
    /// Merged features of one sequence, ordered by start coordinate.
    pub fn features_for(&self, sequence_id: &str) -> &[Feature] {
        self.features
            .get(sequence_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Records in output order.
    pub fn records(&self) -> impl Iterator<Item = (&Sequence, &[Feature])> {
        self.sequences
            .iter()
            .map(move |seq| (seq, self.features_for(seq.id())))
    }

    pub fn feature_count(&self) -> usize {
        self.features.values().map(Vec::len).sum()
    }
}

/// Segments collected for one logical feature.
struct Group {
    first_index: usize,
    sequence_id: String,
    kind: String,
    feature_id: Option<String>,
    members: Vec<Annotation>,
}

impl Group {
    fn into_feature(self, issues: &mut Vec<ValidationIssue>) -> (String, usize, Feature) {
        let strand = self.members[0].strand;
        if self.members.iter().any(|a| a.strand != strand) {
            issues.push(
                ValidationIssue::warning(format!(
                    "segments of feature '{}' disagree on strand; using {}",
                    self.feature_id.as_deref().unwrap_or("?"),
                    strand
                ))
                .at(self.sequence_id.clone()),
            );
        }

        // Repeats within the first segment are kept
        let mut members = self.members.iter();
        let mut qualifiers = members
            .next()
            .map(|first| first.qualifiers.clone())
            .unwrap_or_else(Qualifiers::new);
        for member in members {
            for (key, value) in member.qualifiers.iter() {
                if !qualifiers.contains(key, value) {
                    qualifiers.push(key, value);
                }
            }
        }

        // Stable: ties keep input order
        let mut segments: Vec<Segment> = self
            .members
            .iter()
            .map(|a| Segment {
                start: a.start,
                end: a.end,
                phase: a.phase,
            })
            .collect();
        segments.sort_by_key(|s| s.start);

        let feature = Feature {
            kind: self.kind,
            segments,
            strand,
            feature_id: self.feature_id,
            qualifiers,
        };
        (self.sequence_id, self.first_index, feature)
    }
}

/// Checks one annotation against its sequence and normalizes strand/phase.
///
/// Returns `None` when the annotation must be dropped.
fn check_annotation(
    annotation: &Annotation,
    sequences: &SequenceData,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Annotation> {
    let here = location(&annotation.sequence_id, annotation.start, annotation.end);

    let Some(sequence) = sequences.get(&annotation.sequence_id) else {
        issues.push(
            ValidationIssue::error(format!(
                "{} annotation references unknown sequence '{}'",
                annotation.kind, annotation.sequence_id
            ))
            .at(here),
        );
        return None;
    };

    if annotation.kind.trim().is_empty() {
        issues.push(ValidationIssue::error("annotation has no feature type").at(here));
        return None;
    }

    if annotation.start > annotation.end {
        issues.push(
            ValidationIssue::error(format!(
                "{} annotation starts after it ends ({} > {})",
                annotation.kind, annotation.start, annotation.end
            ))
            .at(here),
        );
        return None;
    }

    if annotation.end > sequence.len() {
        issues.push(
            ValidationIssue::error(format!(
                "{} annotation ends at {} beyond sequence length {}",
                annotation.kind,
                annotation.end,
                sequence.len()
            ))
            .at(here),
        );
        return None;
    }

    if annotation.end == 0 {
        issues.push(
            ValidationIssue::warning(format!(
                "zero-length {} annotation before the first base cannot be located; dropped",
                annotation.kind
            ))
            .at(here),
        );
        return None;
    }

    let mut normalized = annotation.clone();
    if is_cds(&normalized.kind) {
        if normalized.strand == Strand::Unstranded {
            issues.push(ValidationIssue::warning("CDS without strand; assuming forward").at(here.clone()));
            normalized.strand = Strand::Forward;
        }
        if let Some(phase) = normalized.phase.filter(|p| *p > 2) {
            issues.push(ValidationIssue::warning(format!("phase {} out of range; using {}", phase, phase % 3)).at(here));
            normalized.phase = Some(phase % 3);
        }
    } else {
        normalized.phase = None;
    }
    Some(normalized)
}

/// Merges and validates annotations against sequences.
pub fn merge(
    sequences: &SequenceData,
    annotations: &AnnotationData,
    options: &ConversionOptions,
) -> (MergedData, ValidationResult) {
    let mut issues = Vec::new();
    let mut groups: Vec<Group> = Vec::new();
    let mut group_index: HashMap<(String, String, String), usize> = HashMap::new();

    for (input_index, annotation) in annotations.iter().enumerate() {
        let Some(annotation) = check_annotation(annotation, sequences, &mut issues) else {
            continue;
        };
        if !options.filter.accepts(&annotation.kind) {
            continue;
        }

        let slot = match &annotation.feature_id {
            Some(feature_id) => {
                let key = (
                    annotation.sequence_id.clone(),
                    annotation.kind.clone(),
                    feature_id.clone(),
                );
                *group_index.entry(key).or_insert_with(|| {
                    groups.push(Group {
                        first_index: input_index,
                        sequence_id: annotation.sequence_id.clone(),
                        kind: annotation.kind.clone(),
                        feature_id: Some(feature_id.clone()),
                        members: Vec::new(),
                    });
                    groups.len() - 1
                })
            }
            None => {
                groups.push(Group {
                    first_index: input_index,
                    sequence_id: annotation.sequence_id.clone(),
                    kind: annotation.kind.clone(),
                    feature_id: None,
                    members: Vec::new(),
                });
                groups.len() - 1
            }
        };
        groups[slot].members.push(annotation);
    }

    let mut placed: Vec<(String, usize, Feature)> = groups
        .into_iter()
        .map(|group| group.into_feature(&mut issues))
        .collect();

    let merged_sequences = if options.merge_sequences && sequences.sequence_count() > 1 {
        concatenate(sequences, &mut placed)
    } else {
        sequences.clone()
    };

    placed.sort_by_key(|(_, first_index, feature)| (feature.start(), *first_index));

    let mut features: HashMap<String, Vec<Feature>> = HashMap::new();
    let mut merged_annotations = AnnotationData::new();
    for (sequence_id, _, feature) in placed {
        for segment in &feature.segments {
            merged_annotations.push(Annotation {
                kind: feature.kind.clone(),
                start: segment.start,
                end: segment.end,
                strand: feature.strand,
                phase: segment.phase,
                sequence_id: sequence_id.clone(),
                feature_id: feature.feature_id.clone(),
                qualifiers: feature.qualifiers.clone(),
            });
        }
        features.entry(sequence_id).or_default().push(feature);
    }

    let merged = MergedData {
        sequences: merged_sequences,
        annotations: merged_annotations,
        features,
    };
    let result = ValidationResult::new(None, merged.sequences.sequence_count(), merged.feature_count(), issues);
    (merged, result)
}

/// Joins all sequences into one and shifts every feature by the length of the
/// sequences preceding its own.
fn concatenate(sequences: &SequenceData, placed: &mut [(String, usize, Feature)]) -> SequenceData {
    let mut offsets = HashMap::new();
    let mut prefix = 0;
    for sequence in sequences.iter() {
        offsets.insert(sequence.id().to_string(), prefix);
        prefix += sequence.len();
    }

    let Some(combined) = Sequence::concatenate(sequences.iter()) else {
        return sequences.clone();
    };
    for (sequence_id, _, feature) in placed.iter_mut() {
        let shift = offsets.get(sequence_id.as_str()).copied().unwrap_or(0);
        for segment in &mut feature.segments {
            segment.start += shift;
            segment.end += shift;
        }
        *sequence_id = combined.id().to_string();
    }

    let mut data = SequenceData::new();
    // A fresh collection cannot hold a duplicate
    let _ = data.push(combined);
    data
}

/// Content checks on sequences alone.
pub fn validate_sequences(sequences: &SequenceData) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for sequence in sequences.iter() {
        if sequence.is_empty() {
            issues.push(ValidationIssue::warning("sequence is empty").at(sequence.id()));
            continue;
        }
        let unexpected = sequence
            .residues()
            .bytes()
            .filter(|b| !NUCLEOTIDE_SYMBOLS.contains(&b.to_ascii_uppercase()))
            .count();
        if unexpected > 0 {
            issues.push(
                ValidationIssue::warning(format!(
                    "{} character(s) are not IUPAC nucleotide codes",
                    unexpected
                ))
                .at(sequence.id()),
            );
        }
    }
    issues
}

/// Content checks on annotations alone, without their sequences.
pub fn validate_annotations(annotations: &AnnotationData) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for annotation in annotations.iter() {
        let here = location(&annotation.sequence_id, annotation.start, annotation.end);
        if annotation.kind.trim().is_empty() {
            issues.push(ValidationIssue::error("annotation has no feature type").at(here));
        } else if annotation.start > annotation.end {
            issues.push(
                ValidationIssue::error(format!("{} annotation starts after it ends", annotation.kind)).at(here),
            );
        } else if is_cds(&annotation.kind) && annotation.strand == Strand::Unstranded {
            issues.push(ValidationIssue::warning("CDS without strand").at(here));
        }
    }
    issues
}
