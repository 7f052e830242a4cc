//! Nucleotide to protein translation for CDS features.
//!
//! Translation never fails: malformed input degrades to a partial protein,
//! and internal stop codons are surfaced as validation issues.

use crate::genetic_code::{self, GeneticCode, GeneticCodeTable, Residue};
use crate::model::{Feature, Sequence, Strand};
use crate::options::TranslationOptions;
use crate::validation::ValidationIssue;

/// Complement of one nucleotide, case-preserving. Anything else maps to itself.
fn complement(base: char) -> char {
    match base {
        'A' => 'T',
        'T' => 'A',
        'C' => 'G',
        'G' => 'C',
        'a' => 't',
        't' => 'a',
        'c' => 'g',
        'g' => 'c',
        other => other,
    }
}

/// Reverse complement of a nucleotide string.
pub fn reverse_complement(nucleotides: &str) -> String {
    nucleotides.chars().rev().map(complement).collect()
}

/// Outcome of translating one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub protein: String,
    /// Codon index of the first stop found before the last complete codon
    pub internal_stop: Option<usize>,
}

/// Translates `nucleotides` read on `strand`, starting `start_offset` bases
/// into the (possibly reverse-complemented) sequence.
///
/// Trailing bases that do not form a full codon are ignored.
pub fn translate(
    nucleotides: &str,
    strand: Strand,
    start_offset: usize,
    code: &GeneticCode,
    options: &TranslationOptions,
) -> Translation {
    let oriented;
    let bases = if strand.is_reverse() {
        oriented = reverse_complement(nucleotides);
        oriented.as_bytes()
    } else {
        nucleotides.as_bytes()
    };

    let mut protein = String::with_capacity(bases.len() / 3 + 1);
    let mut internal_stop = None;
    let codons = bases.get(start_offset..).unwrap_or(&[]).chunks_exact(3);
    let codon_count = codons.len();

    for (index, codon) in codons.enumerate() {
        match code.translate_codon(codon) {
            Residue::AminoAcid(aa) => protein.push(aa),
            Residue::Stop => {
                let is_last = index + 1 == codon_count;
                if !is_last {
                    internal_stop.get_or_insert(index);
                    if options.allow_internal_stop_codons {
                        protein.push('*');
                        continue;
                    }
                }
                if options.include_stop_codon {
                    protein.push('*');
                }
                break;
            }
        }
    }

    Translation {
        protein,
        internal_stop,
    }
}

/// Translates CDS features under one resolved genetic code.
pub struct Translator<'a> {
    code: &'static GeneticCode,
    options: &'a TranslationOptions,
}

impl<'a> Translator<'a> {
    pub fn new(table: GeneticCodeTable, options: &'a TranslationOptions) -> Self {
        Self {
            code: genetic_code::catalog().code(table),
            options,
        }
    }

    pub fn table(&self) -> GeneticCodeTable {
        self.code.table()
    }

    /// Translates a merged feature against its sequence.
    ///
    /// Returns `None` when CDS translation is disabled. An internal stop codon
    /// yields a warning unless internal stops are allowed.
    pub fn translate_feature(
        &self,
        feature: &Feature,
        sequence: &Sequence,
    ) -> Option<(Translation, Option<ValidationIssue>)> {
        if !self.options.translate_cds {
            return None;
        }

        let spliced = feature.spliced_residues(sequence);
        let translation = translate(
            &spliced,
            feature.strand,
            usize::from(feature.leading_phase()),
            self.code,
            self.options,
        );

        let issue = match translation.internal_stop {
            Some(codon) if !self.options.allow_internal_stop_codons => Some(
                ValidationIssue::warning(format!(
                    "internal stop codon at codon {} of CDS; translation truncated",
                    codon + 1
                ))
                .at(format!("{}:{}..{}", sequence.id(), feature.start() + 1, feature.end())),
            ),
            _ => None,
        };
        Some((translation, issue))
    }
}
