//! Genetic code definitions and codon lookup.
//!
//! This module provides:
//! - The NCBI genetic code tables (1-33) as a closed enumeration
//! - A read-only catalog built once per process
//! - Table resolution from a numeric id, a free-text name or an enum constant

use std::fmt;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::error::ConvertError;

/// Table used when no selector is given, or a free-text name is not recognized.
pub const DEFAULT_TABLE: GeneticCodeTable = GeneticCodeTable::InvertebrateMitochondrial;

/// The NCBI genetic code tables.
///
/// Variant order matches `TABLES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeneticCodeTable {
    Standard,
    VertebrateMitochondrial,
    YeastMitochondrial,
    MoldMitochondrial,
    InvertebrateMitochondrial,
    CiliateNuclear,
    EchinodermMitochondrial,
    EuplotidNuclear,
    Bacterial,
    AlternativeYeastNuclear,
    AscidianMitochondrial,
    AlternativeFlatwormMitochondrial,
    BlepharismaMacronuclear,
    ChlorophyceanMitochondrial,
    TrematodeMitochondrial,
    ScenedesmusMitochondrial,
    ThraustochytriumMitochondrial,
    RhabdopleuridaeMitochondrial,
    CandidateDivisionSr1,
    PachysolenNuclear,
    KaryorelictNuclear,
    CondylostomaNuclear,
    MesodiniumNuclear,
    PeritrichNuclear,
    BlastocrithidiaNuclear,
    BalanophoraceaePlastid,
    CephalodiscidaeMitochondrial,
}

struct TableDefinition {
    table: GeneticCodeTable,
    id: u8,
    constant: &'static str,
    description: &'static str,
    /// 64 amino acids in NCBI codon order (TTT, TTC, TTA, TTG, TCT, ...)
    ncbieaa: &'static str,
}

#[rustfmt::skip]
const TABLES: [TableDefinition; 27] = [
    TableDefinition { table: GeneticCodeTable::Standard, id: 1, constant: "STANDARD",
        description: "Standard",
        ncbieaa: "FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::VertebrateMitochondrial, id: 2, constant: "VERTEBRATE_MITOCHONDRIAL",
        description: "Vertebrate Mitochondrial",
        ncbieaa: "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSS**VVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::YeastMitochondrial, id: 3, constant: "YEAST_MITOCHONDRIAL",
        description: "Yeast Mitochondrial",
        ncbieaa: "FFLLSSSSYY**CCWWTTTTPPPPHHQQRRRRIIMMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::MoldMitochondrial, id: 4, constant: "MOLD_MITOCHONDRIAL",
        description: "Mold, Protozoan, and Coelenterate Mitochondrial and Mycoplasma/Spiroplasma",
        ncbieaa: "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::InvertebrateMitochondrial, id: 5, constant: "INVERTEBRATE_MITOCHONDRIAL",
        description: "Invertebrate Mitochondrial",
        ncbieaa: "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSSSSVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::CiliateNuclear, id: 6, constant: "CILIATE_NUCLEAR",
        description: "Ciliate, Dasycladacean and Hexamita Nuclear",
        ncbieaa: "FFLLSSSSYYQQCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::EchinodermMitochondrial, id: 9, constant: "ECHINODERM_MITOCHONDRIAL",
        description: "Echinoderm and Flatworm Mitochondrial",
        ncbieaa: "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::EuplotidNuclear, id: 10, constant: "EUPLOTID_NUCLEAR",
        description: "Euplotid Nuclear",
        ncbieaa: "FFLLSSSSYY**CCCWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::Bacterial, id: 11, constant: "BACTERIAL",
        description: "Bacterial, Archaeal and Plant Plastid",
        ncbieaa: "FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::AlternativeYeastNuclear, id: 12, constant: "ALTERNATIVE_YEAST_NUCLEAR",
        description: "Alternative Yeast Nuclear",
        ncbieaa: "FFLLSSSSYY**CC*WLLLSPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::AscidianMitochondrial, id: 13, constant: "ASCIDIAN_MITOCHONDRIAL",
        description: "Ascidian Mitochondrial",
        ncbieaa: "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSSGGVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::AlternativeFlatwormMitochondrial, id: 14, constant: "ALTERNATIVE_FLATWORM_MITOCHONDRIAL",
        description: "Alternative Flatworm Mitochondrial",
        ncbieaa: "FFLLSSSSYYY*CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::BlepharismaMacronuclear, id: 15, constant: "BLEPHARISMA_MACRONUCLEAR",
        description: "Blepharisma Macronuclear",
        ncbieaa: "FFLLSSSSYY*QCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::ChlorophyceanMitochondrial, id: 16, constant: "CHLOROPHYCEAN_MITOCHONDRIAL",
        description: "Chlorophycean Mitochondrial",
        ncbieaa: "FFLLSSSSYY*LCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::TrematodeMitochondrial, id: 21, constant: "TREMATODE_MITOCHONDRIAL",
        description: "Trematode Mitochondrial",
        ncbieaa: "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNNKSSSSVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::ScenedesmusMitochondrial, id: 22, constant: "SCENEDESMUS_MITOCHONDRIAL",
        description: "Scenedesmus obliquus Mitochondrial",
        ncbieaa: "FFLLSS*SYY*LCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::ThraustochytriumMitochondrial, id: 23, constant: "THRAUSTOCHYTRIUM_MITOCHONDRIAL",
        description: "Thraustochytrium Mitochondrial",
        ncbieaa: "FF*LSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::RhabdopleuridaeMitochondrial, id: 24, constant: "RHABDOPLEURIDAE_MITOCHONDRIAL",
        description: "Rhabdopleuridae Mitochondrial",
        ncbieaa: "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSSKVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::CandidateDivisionSr1, id: 25, constant: "CANDIDATE_DIVISION_SR1",
        description: "Candidate Division SR1 and Gracilibacteria",
        ncbieaa: "FFLLSSSSYY**CCGWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::PachysolenNuclear, id: 26, constant: "PACHYSOLEN_NUCLEAR",
        description: "Pachysolen tannophilus Nuclear",
        ncbieaa: "FFLLSSSSYY**CC*WLLLAPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::KaryorelictNuclear, id: 27, constant: "KARYORELICT_NUCLEAR",
        description: "Karyorelict Nuclear",
        ncbieaa: "FFLLSSSSYYQQCCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::CondylostomaNuclear, id: 28, constant: "CONDYLOSTOMA_NUCLEAR",
        description: "Condylostoma Nuclear",
        ncbieaa: "FFLLSSSSYYQQCCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::MesodiniumNuclear, id: 29, constant: "MESODINIUM_NUCLEAR",
        description: "Mesodinium Nuclear",
        ncbieaa: "FFLLSSSSYYYYCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::PeritrichNuclear, id: 30, constant: "PERITRICH_NUCLEAR",
        description: "Peritrich Nuclear",
        ncbieaa: "FFLLSSSSYYEECC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::BlastocrithidiaNuclear, id: 31, constant: "BLASTOCRITHIDIA_NUCLEAR",
        description: "Blastocrithidia Nuclear",
        ncbieaa: "FFLLSSSSYYEECCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::BalanophoraceaePlastid, id: 32, constant: "BALANOPHORACEAE_PLASTID",
        description: "Balanophoraceae Plastid",
        ncbieaa: "FFLLSSSSYY*WCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG" },
    TableDefinition { table: GeneticCodeTable::CephalodiscidaeMitochondrial, id: 33, constant: "CEPHALODISCIDAE_MITOCHONDRIAL",
        description: "Cephalodiscidae Mitochondrial",
        ncbieaa: "FFLLSSSSYYY*CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSSKVVVVAAAADDEEGGGG" },
];

/// Uppercase alphanumerics only, so "Invertebrate Mitochondrial",
/// "INVERTEBRATE_MITOCHONDRIAL" and "invertebrate-mitochondrial" compare equal.
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

impl GeneticCodeTable {
    fn definition(self) -> &'static TableDefinition {
        &TABLES[self as usize]
    }

    /// All tables in NCBI id order.
    pub fn all() -> impl Iterator<Item = GeneticCodeTable> {
        TABLES.iter().map(|d| d.table)
    }

    /// NCBI translation table number.
    pub fn id(self) -> u8 {
        self.definition().id
    }

    /// Enum constant name, e.g. "VERTEBRATE_MITOCHONDRIAL".
    pub fn constant_name(self) -> &'static str {
        self.definition().constant
    }

    /// Human-readable NCBI description.
    pub fn description(self) -> &'static str {
        self.definition().description
    }

    pub fn from_id(id: u8) -> Option<Self> {
        TABLES.iter().find(|d| d.id == id).map(|d| d.table)
    }

    /// Looks up a table from free text: a constant name, a description or a
    /// table number. Matching ignores case and punctuation.
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if let Ok(id) = trimmed.parse::<u8>() {
            return Self::from_id(id);
        }
        let wanted = normalize_name(trimmed);
        if wanted.is_empty() {
            return None;
        }
        TABLES
            .iter()
            .find(|d| normalize_name(d.constant) == wanted || normalize_name(d.description) == wanted)
            .map(|d| d.table)
    }
}

impl fmt::Display for GeneticCodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.id())
    }
}

/// Picks the active table from the caller's selectors.
///
/// Precedence: numeric id, then free-text name, then enum constant. An
/// unrecognized free-text name falls back to `DEFAULT_TABLE`; an unknown
/// numeric id is an error because it names a table that does not exist.
pub fn resolve_table(
    table_id: Option<u8>,
    name: Option<&str>,
    table: Option<GeneticCodeTable>,
) -> Result<GeneticCodeTable, ConvertError> {
    if let Some(id) = table_id {
        return GeneticCodeTable::from_id(id)
            .ok_or_else(|| ConvertError::ResourceNotFound(format!("genetic code table {}", id)));
    }
    if let Some(name) = name {
        return Ok(GeneticCodeTable::from_name(name).unwrap_or(DEFAULT_TABLE));
    }
    Ok(table.unwrap_or(DEFAULT_TABLE))
}

/// Meaning of a single codon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residue {
    AminoAcid(char),
    Stop,
}

impl Residue {
    /// One-letter symbol, `*` for stop.
    pub fn symbol(self) -> char {
        match self {
            Residue::AminoAcid(aa) => aa,
            Residue::Stop => '*',
        }
    }
}

/// A genetic code table for translating codons to amino acids.
#[derive(Debug, Clone)]
pub struct GeneticCode {
    table: GeneticCodeTable,
    /// Indexed by T=0, C=1, A=2, G=3: first*16 + second*4 + third
    amino_acids: [u8; 64],
}

fn base_to_index(b: u8) -> Option<usize> {
    match b {
        b'T' | b't' | b'U' | b'u' => Some(0),
        b'C' | b'c' => Some(1),
        b'A' | b'a' => Some(2),
        b'G' | b'g' => Some(3),
        _ => None,
    }
}

impl GeneticCode {
    fn new(table: GeneticCodeTable) -> Self {
        let mut amino_acids = [b'X'; 64];
        for (slot, aa) in amino_acids.iter_mut().zip(table.definition().ncbieaa.bytes()) {
            *slot = aa;
        }
        Self { table, amino_acids }
    }

    pub fn table(&self) -> GeneticCodeTable {
        self.table
    }

    /// Translates a single codon.
    ///
    /// Case-insensitive, U and T are interchangeable. Codons that contain
    /// anything other than A, C, G, T/U translate to 'X'.
    pub fn translate_codon(&self, codon: &[u8]) -> Residue {
        if codon.len() != 3 {
            return Residue::AminoAcid('X');
        }
        match (base_to_index(codon[0]), base_to_index(codon[1]), base_to_index(codon[2])) {
            (Some(a), Some(b), Some(c)) => match self.amino_acids[a * 16 + b * 4 + c] {
                b'*' => Residue::Stop,
                aa => Residue::AminoAcid(aa as char),
            },
            _ => Residue::AminoAcid('X'),
        }
    }
}

/// All available genetic codes from NCBI.
pub struct GeneticCodes {
    codes: Vec<GeneticCode>,
}

impl GeneticCodes {
    /// Creates the complete set of NCBI genetic codes.
    pub fn new() -> Self {
        Self {
            codes: GeneticCodeTable::all().map(GeneticCode::new).collect(),
        }
    }

    /// Returns all genetic codes.
    pub fn all(&self) -> &[GeneticCode] {
        &self.codes
    }

    /// Gets a genetic code by NCBI id.
    pub fn get(&self, id: u8) -> Option<&GeneticCode> {
        self.codes.iter().find(|c| c.table.id() == id)
    }

    /// Gets the code for a table. Every table is present in the catalog.
    pub fn code(&self, table: GeneticCodeTable) -> &GeneticCode {
        &self.codes[table as usize]
    }
}

impl Default for GeneticCodes {
    fn default() -> Self {
        Self::new()
    }
}

static CATALOG: LazyLock<GeneticCodes> = LazyLock::new(GeneticCodes::new);

/// The process-wide, read-only catalog.
pub fn catalog() -> &'static GeneticCodes {
    &CATALOG
}

/// Resolves one codon under the given table.
pub fn codon_to_amino_acid(codon: &str, table: GeneticCodeTable) -> Residue {
    catalog().code(table).translate_codon(codon.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_enum() {
        for (i, def) in TABLES.iter().enumerate() {
            assert_eq!(def.table as usize, i);
            assert_eq!(def.ncbieaa.len(), 64);
        }
    }

    #[test]
    fn test_standard_code_translation() {
        let t = GeneticCodeTable::Standard;
        assert_eq!(codon_to_amino_acid("ATG", t), Residue::AminoAcid('M'));
        assert_eq!(codon_to_amino_acid("TAA", t), Residue::Stop);
        assert_eq!(codon_to_amino_acid("TAG", t), Residue::Stop);
        assert_eq!(codon_to_amino_acid("TGA", t), Residue::Stop);
        assert_eq!(codon_to_amino_acid("TTT", t), Residue::AminoAcid('F'));
        assert_eq!(codon_to_amino_acid("GGG", t), Residue::AminoAcid('G'));
        assert_eq!(codon_to_amino_acid("AAA", t), Residue::AminoAcid('K'));
    }

    #[test]
    fn test_standard_table_is_total() {
        let code = catalog().code(GeneticCodeTable::Standard);
        let bases = [b'A', b'C', b'G', b'T'];
        let mut stops = 0;
        for &a in &bases {
            for &b in &bases {
                for &c in &bases {
                    match code.translate_codon(&[a, b, c]) {
                        Residue::Stop => stops += 1,
                        Residue::AminoAcid(aa) => assert_ne!(aa, 'X'),
                    }
                }
            }
        }
        assert_eq!(stops, 3);
    }

    #[test]
    fn test_rna_and_case_insensitive() {
        let t = GeneticCodeTable::Standard;
        assert_eq!(codon_to_amino_acid("AUG", t), Residue::AminoAcid('M'));
        assert_eq!(codon_to_amino_acid("uuu", t), Residue::AminoAcid('F'));
        assert_eq!(codon_to_amino_acid("AtG", t), Residue::AminoAcid('M'));
    }

    #[test]
    fn test_ambiguous_nucleotides() {
        let t = GeneticCodeTable::Standard;
        assert_eq!(codon_to_amino_acid("ATN", t), Residue::AminoAcid('X'));
        assert_eq!(codon_to_amino_acid("NNN", t), Residue::AminoAcid('X'));
        assert_eq!(codon_to_amino_acid("AT", t), Residue::AminoAcid('X'));
    }

    #[test]
    fn test_different_genetic_codes() {
        assert_eq!(codon_to_amino_acid("TGA", GeneticCodeTable::VertebrateMitochondrial), Residue::AminoAcid('W'));
        assert_eq!(codon_to_amino_acid("AGA", GeneticCodeTable::VertebrateMitochondrial), Residue::Stop);
        assert_eq!(codon_to_amino_acid("AGA", GeneticCodeTable::InvertebrateMitochondrial), Residue::AminoAcid('S'));
        assert_eq!(codon_to_amino_acid("ATA", GeneticCodeTable::InvertebrateMitochondrial), Residue::AminoAcid('M'));
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(GeneticCodeTable::from_name("Standard"), Some(GeneticCodeTable::Standard));
        assert_eq!(
            GeneticCodeTable::from_name("VERTEBRATE_MITOCHONDRIAL"),
            Some(GeneticCodeTable::VertebrateMitochondrial)
        );
        assert_eq!(
            GeneticCodeTable::from_name("bacterial, archaeal and plant plastid"),
            Some(GeneticCodeTable::Bacterial)
        );
        assert_eq!(GeneticCodeTable::from_name("11"), Some(GeneticCodeTable::Bacterial));
        assert_eq!(GeneticCodeTable::from_name("xyz"), None);
        assert_eq!(GeneticCodeTable::from_name("7"), None);
    }

    #[test]
    fn test_resolution_precedence() {
        assert_eq!(
            resolve_table(Some(2), Some("Standard"), Some(GeneticCodeTable::Bacterial)).unwrap(),
            GeneticCodeTable::VertebrateMitochondrial
        );
        assert_eq!(
            resolve_table(None, Some("Standard"), Some(GeneticCodeTable::Bacterial)).unwrap(),
            GeneticCodeTable::Standard
        );
        assert_eq!(
            resolve_table(None, None, Some(GeneticCodeTable::Bacterial)).unwrap(),
            GeneticCodeTable::Bacterial
        );
        assert_eq!(resolve_table(None, None, None).unwrap(), DEFAULT_TABLE);
    }

    #[test]
    fn test_unknown_name_falls_back() {
        assert_eq!(
            resolve_table(None, Some("xyz"), Some(GeneticCodeTable::Standard)).unwrap(),
            GeneticCodeTable::InvertebrateMitochondrial
        );
    }

    #[test]
    fn test_unknown_table_id_is_not_found() {
        let result = resolve_table(Some(7), None, None);
        assert!(matches!(result, Err(ConvertError::ResourceNotFound(_))));
    }

    #[test]
    fn test_catalog_lookup() {
        let codes = GeneticCodes::new();
        assert_eq!(codes.all().len(), 27);
        assert_eq!(codes.get(5).unwrap().table(), GeneticCodeTable::InvertebrateMitochondrial);
        assert!(codes.get(8).is_none());
    }

    #[test]
    fn test_table_metadata() {
        let table = GeneticCodeTable::Bacterial;
        assert_eq!(table.id(), 11);
        assert_eq!(table.constant_name(), "BACTERIAL");
        assert_eq!(Residue::Stop.symbol(), '*');
        assert_eq!(codon_to_amino_acid("TGG", table).symbol(), 'W');
    }
}
