//! Data model for the conversion engine.
//!
//! This module contains the canonical structures every input format is
//! normalized into before formatting:
//! - Sequences and the ordered `SequenceData` collection
//! - Annotations (0-based, half-open coordinates) and `AnnotationData`
//! - Merged multi-segment features ready for the GenBank writer
//!
//! Values are frozen once they are placed into a collection: collections only
//! hand out shared references.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while assembling model collections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Sequence identifier must not be empty")]
    EmptySequenceId,

    #[error("Duplicate sequence identifier: {0}")]
    DuplicateSequenceId(String),
}

/// Strand orientation of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strand {
    Forward,
    Reverse,
    #[default]
    Unstranded,
}

impl Strand {
    /// Parse from a GFF/GTF/BED strand column. "+" and "-" are stranded;
    /// everything else ("." or "?") is unstranded.
    pub fn from_symbol(s: &str) -> Self {
        match s {
            "+" => Self::Forward,
            "-" => Self::Reverse,
            _ => Self::Unstranded,
        }
    }

    /// Numeric encoding: +1, -1 or 0.
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Forward => 1,
            Self::Reverse => -1,
            Self::Unstranded => 0,
        }
    }

    pub fn is_reverse(self) -> bool {
        self == Self::Reverse
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "+"),
            Self::Reverse => write!(f, "-"),
            Self::Unstranded => write!(f, "."),
        }
    }
}

/// Molecule topology as written on the LOCUS line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    #[default]
    Linear,
    Circular,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Linear => write!(f, "linear"),
            Topology::Circular => write!(f, "circular"),
        }
    }
}

impl std::str::FromStr for Topology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(Topology::Linear),
            "circular" => Ok(Topology::Circular),
            other => Err(format!("unknown topology: {}", other)),
        }
    }
}

/// Stand-in for residues outside ASCII.
const NON_ASCII_RESIDUE: char = 'X';

/// A single nucleotide sequence with its record metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    id: String,
    name: Option<String>,
    description: Option<String>,
    residues: String,
    molecule_type: Option<String>,
    topology: Option<Topology>,
    division: Option<String>,
    organism: Option<String>,
}

impl Sequence {
    /// Creates a new sequence. The identifier must be non-empty.
    ///
    /// Non-ASCII characters are replaced by `X`, so every residue is one byte
    /// and coordinates index bytes and characters alike.
    pub fn new(id: impl Into<String>, residues: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ModelError::EmptySequenceId);
        }
        let mut residues = residues.into();
        if !residues.is_ascii() {
            residues = residues
                .chars()
                .map(|c| if c.is_ascii() { c } else { NON_ASCII_RESIDUE })
                .collect();
        }
        Ok(Self {
            id,
            name: None,
            description: None,
            residues,
            molecule_type: None,
            topology: None,
            division: None,
            organism: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_molecule_type(mut self, molecule_type: impl Into<String>) -> Self {
        self.molecule_type = Some(molecule_type.into());
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = Some(topology);
        self
    }

    pub fn with_division(mut self, division: impl Into<String>) -> Self {
        self.division = Some(division.into());
        self
    }

    pub fn with_organism(mut self, organism: impl Into<String>) -> Self {
        self.organism = Some(organism.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn residues(&self) -> &str {
        &self.residues
    }

    pub fn molecule_type(&self) -> Option<&str> {
        self.molecule_type.as_deref()
    }

    pub fn topology(&self) -> Option<Topology> {
        self.topology
    }

    pub fn division(&self) -> Option<&str> {
        self.division.as_deref()
    }

    pub fn organism(&self) -> Option<&str> {
        self.organism.as_deref()
    }

    /// Returns the length of the sequence.
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    /// Returns true if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Gets a slice of the sequence data, clamped to the sequence bounds.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.residues.len());
        let start = start.min(end);
        self.residues.get(start..end).unwrap_or("")
    }

    /// Concatenates several sequences into one synthetic record.
    /// Metadata is taken from the first sequence.
    pub(crate) fn concatenate<'a>(mut parts: impl Iterator<Item = &'a Sequence>) -> Option<Sequence> {
        let first = parts.next()?;
        let mut merged = first.clone();
        for part in parts {
            merged.residues.push_str(&part.residues);
        }
        Some(merged)
    }
}

/// Ordered collection of sequences with unique identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceData {
    sequences: Vec<Sequence>,
    index: HashMap<String, usize>,
}

impl SequenceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection, rejecting duplicate identifiers.
    pub fn from_sequences(sequences: Vec<Sequence>) -> Result<Self, ModelError> {
        let mut data = Self::new();
        for seq in sequences {
            data.push(seq)?;
        }
        Ok(data)
    }

    /// Appends a sequence, preserving insertion order.
    pub fn push(&mut self, sequence: Sequence) -> Result<(), ModelError> {
        if self.index.contains_key(sequence.id()) {
            return Err(ModelError::DuplicateSequenceId(sequence.id().to_string()));
        }
        self.index.insert(sequence.id().to_string(), self.sequences.len());
        self.sequences.push(sequence);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Sequence> {
        self.index.get(id).map(|&i| &self.sequences[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.iter()
    }

    /// Returns the number of sequences.
    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Sum of all sequence lengths.
    pub fn total_length(&self) -> usize {
        self.sequences.iter().map(Sequence::len).sum()
    }
}

/// Ordered multimap of GenBank qualifiers. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualifiers(Vec<(String, String)>);

impl Qualifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.0.iter().any(|(k, v)| k == key && v == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Qualifiers {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A single annotated interval. Coordinates are 0-based, half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Feature key ("gene", "CDS", ...)
    pub kind: String,
    pub start: usize,
    pub end: usize,
    pub strand: Strand,
    /// Reading-frame offset of the first complete codon (CDS only)
    pub phase: Option<u8>,
    /// Identifier of the sequence this annotation lies on
    pub sequence_id: String,
    /// Shared by all segments of one multi-segment feature
    pub feature_id: Option<String>,
    pub qualifiers: Qualifiers,
}

impl Annotation {
    pub fn new(
        kind: impl Into<String>,
        sequence_id: impl Into<String>,
        start: usize,
        end: usize,
        strand: Strand,
    ) -> Self {
        Self {
            kind: kind.into(),
            start,
            end,
            strand,
            phase: None,
            sequence_id: sequence_id.into(),
            feature_id: None,
            qualifiers: Qualifiers::new(),
        }
    }

    pub fn with_phase(mut self, phase: u8) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_feature_id(mut self, feature_id: impl Into<String>) -> Self {
        self.feature_id = Some(feature_id.into());
        self
    }

    pub fn with_qualifier(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.qualifiers.push(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Annotations grouped by sequence identifier, in first-seen order.
///
/// References to unknown sequences are permitted here; the merger is what
/// rejects them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationData {
    groups: Vec<(String, Vec<Annotation>)>,
    index: HashMap<String, usize>,
    total: usize,
}

impl AnnotationData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_annotations(annotations: impl IntoIterator<Item = Annotation>) -> Self {
        let mut data = Self::new();
        for annotation in annotations {
            data.push(annotation);
        }
        data
    }

    pub fn push(&mut self, annotation: Annotation) {
        let slot = match self.index.get(&annotation.sequence_id) {
            Some(&slot) => slot,
            None => {
                self.index
                    .insert(annotation.sequence_id.clone(), self.groups.len());
                self.groups.push((annotation.sequence_id.clone(), Vec::new()));
                self.groups.len() - 1
            }
        };
        self.groups[slot].1.push(annotation);
        self.total += 1;
    }

    /// Annotations attached to one sequence, in insertion order.
    pub fn for_sequence(&self, sequence_id: &str) -> &[Annotation] {
        self.index
            .get(sequence_id)
            .map(|&i| self.groups[i].1.as_slice())
            .unwrap_or(&[])
    }

    /// Sequence identifiers in first-seen order.
    pub fn sequence_ids(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(id, _)| id.as_str())
    }

    /// Every annotation, grouped by sequence in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.groups.iter().flat_map(|(_, anns)| anns.iter())
    }

    pub fn total_count(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Half-open interval of one feature segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub phase: Option<u8>,
}

/// A logical feature after merging: one or more segments sharing a feature id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub kind: String,
    /// Sorted by start coordinate ascending
    pub segments: Vec<Segment>,
    pub strand: Strand,
    pub feature_id: Option<String>,
    pub qualifiers: Qualifiers,
}

impl Feature {
    pub fn start(&self) -> usize {
        self.segments.first().map(|s| s.start).unwrap_or(0)
    }

    pub fn end(&self) -> usize {
        self.segments.iter().map(|s| s.end).max().unwrap_or(0)
    }

    /// Phase of the segment translated first: the lowest segment on the
    /// forward strand, the highest on the reverse strand.
    pub fn leading_phase(&self) -> u8 {
        let leading = if self.strand.is_reverse() {
            self.segments.last()
        } else {
            self.segments.first()
        };
        leading.and_then(|s| s.phase).unwrap_or(0)
    }

    /// Spliced nucleotide content of the feature in ascending coordinate order.
    pub fn spliced_residues(&self, sequence: &Sequence) -> String {
        let mut spliced = String::with_capacity(self.segments.iter().map(|s| s.end - s.start).sum());
        for segment in &self.segments {
            spliced.push_str(sequence.slice(segment.start, segment.end));
        }
        spliced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_creation() {
        let seq = Sequence::new("seq1", "ACGT").unwrap();
        assert_eq!(seq.id(), "seq1");
        assert_eq!(seq.residues(), "ACGT");
        assert_eq!(seq.len(), 4);
    }

    #[test]
    fn test_non_ascii_residues_replaced() {
        let seq = Sequence::new("s", "ACGTé").unwrap();
        assert_eq!(seq.residues(), "ACGTX");
        assert_eq!(seq.len(), seq.residues().chars().count());
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.slice(3, 5), "TX");
    }

    #[test]
    fn test_empty_id_rejected() {
        assert_eq!(Sequence::new("  ", "ACGT"), Err(ModelError::EmptySequenceId));
    }

    #[test]
    fn test_sequence_slice_clamps() {
        let seq = Sequence::new("seq1", "ACGTACGT").unwrap();
        assert_eq!(seq.slice(2, 5), "GTA");
        assert_eq!(seq.slice(6, 100), "GT");
        assert_eq!(seq.slice(10, 12), "");
    }

    #[test]
    fn test_duplicate_sequence_id() {
        let result = SequenceData::from_sequences(vec![
            Sequence::new("seq1", "ACGT").unwrap(),
            Sequence::new("seq1", "TGCA").unwrap(),
        ]);
        assert_eq!(result, Err(ModelError::DuplicateSequenceId("seq1".to_string())));
    }

    #[test]
    fn test_sequence_data_preserves_order() {
        let data = SequenceData::from_sequences(vec![
            Sequence::new("b", "AA").unwrap(),
            Sequence::new("a", "CCC").unwrap(),
        ])
        .unwrap();
        let ids: Vec<&str> = data.iter().map(Sequence::id).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(data.get("a").unwrap().len(), 3);
        assert_eq!(data.total_length(), 5);
    }

    #[test]
    fn test_qualifiers_keep_duplicates_in_order() {
        let mut q = Qualifiers::new();
        q.push("note", "first");
        q.push("gene", "abc");
        q.push("note", "second");
        let notes: Vec<&str> = q.get_all("note").collect();
        assert_eq!(notes, vec!["first", "second"]);
        let keys: Vec<&str> = q.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["note", "gene", "note"]);
    }

    #[test]
    fn test_annotation_data_grouping() {
        let data = AnnotationData::from_annotations(vec![
            Annotation::new("gene", "chr2", 0, 10, Strand::Forward),
            Annotation::new("gene", "chr1", 5, 8, Strand::Reverse),
            Annotation::new("CDS", "chr2", 2, 9, Strand::Forward),
        ]);
        assert_eq!(data.total_count(), 3);
        assert_eq!(data.for_sequence("chr2").len(), 2);
        assert_eq!(data.for_sequence("missing").len(), 0);
        let ids: Vec<&str> = data.sequence_ids().collect();
        assert_eq!(ids, vec!["chr2", "chr1"]);
    }

    #[test]
    fn test_strand_symbols() {
        assert_eq!(Strand::from_symbol("+"), Strand::Forward);
        assert_eq!(Strand::from_symbol("-"), Strand::Reverse);
        assert_eq!(Strand::from_symbol("."), Strand::Unstranded);
        assert_eq!(Strand::Reverse.as_i8(), -1);
    }

    #[test]
    fn test_feature_leading_phase() {
        let feature = Feature {
            kind: "CDS".to_string(),
            segments: vec![
                Segment { start: 0, end: 10, phase: Some(0) },
                Segment { start: 20, end: 30, phase: Some(2) },
            ],
            strand: Strand::Reverse,
            feature_id: None,
            qualifiers: Qualifiers::new(),
        };
        assert_eq!(feature.leading_phase(), 2);
        assert_eq!(feature.start(), 0);
        assert_eq!(feature.end(), 30);
    }
}
