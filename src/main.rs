//! gbconvert - GenBank flat-file converter
//!
//! ## Usage
//!
//! ```bash
//! gbconvert genome.fa genes.gff3 -o genome.gb
//! gbconvert genome.fa variants.vcf -o - --organism "Homo sapiens"
//! gbconvert genome.fa genes.gtf --validate-only
//! ```
//!
//! ## Supported Formats
//!
//! - Sequences: FASTA (.fasta, .fa, .fna, .fas)
//! - Annotations: GFF3 (.gff, .gff3), GTF (.gtf), BED (.bed), VCF (.vcf)

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use gbconvert::convert::Converter;
use gbconvert::formats::FileFormat;
use gbconvert::model::Topology;
use gbconvert::options::ConversionOptions;
use gbconvert::validation::ValidationResult;

/// File format specification for command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// FASTA format
    Fasta,
    /// GFF3 format
    Gff3,
    /// GTF format
    Gtf,
    /// BED format
    Bed,
    /// VCF format
    Vcf,
    /// Auto-detect from extension and content
    Auto,
}

impl From<FormatArg> for Option<FileFormat> {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Fasta => Some(FileFormat::Fasta),
            FormatArg::Gff3 => Some(FileFormat::Gff3),
            FormatArg::Gtf => Some(FileFormat::Gtf),
            FormatArg::Bed => Some(FileFormat::Bed),
            FormatArg::Vcf => Some(FileFormat::Vcf),
            FormatArg::Auto => None,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TopologyArg {
    Linear,
    Circular,
}

impl From<TopologyArg> for Topology {
    fn from(arg: TopologyArg) -> Self {
        match arg {
            TopologyArg::Linear => Topology::Linear,
            TopologyArg::Circular => Topology::Circular,
        }
    }
}

/// gbconvert - Convert sequences and annotations to GenBank flat files
///
/// Without -o/--output the record is written to stdout.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Sequence file (FASTA)
    sequences: PathBuf,

    /// Annotation file (GFF3, GTF, BED or VCF)
    annotations: Option<PathBuf>,

    /// Output file. Use "-" for stdout.
    #[arg(short = 'o', long = "output", default_value = "-")]
    output: String,

    /// Force the sequence file format (overrides auto-detection)
    #[arg(long = "sequence-format", value_enum, default_value = "auto")]
    sequence_format: FormatArg,

    /// Force the annotation file format (overrides auto-detection)
    #[arg(long = "annotation-format", value_enum, default_value = "auto")]
    annotation_format: FormatArg,

    /// JSON options file; command line flags take precedence
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Organism name for SOURCE/ORGANISM and /organism
    #[arg(long)]
    organism: Option<String>,

    /// Molecule type on the LOCUS line (default: DNA)
    #[arg(long = "molecule-type")]
    molecule_type: Option<String>,

    /// Molecule topology
    #[arg(long, value_enum)]
    topology: Option<TopologyArg>,

    /// GenBank division code (default: UNK)
    #[arg(long)]
    division: Option<String>,

    /// Concatenate all sequences into a single record
    #[arg(short = 'm', long = "merge")]
    merge: bool,

    /// Genetic code by name or number (default: Invertebrate Mitochondrial)
    #[arg(short = 'g', long = "genetic-code")]
    genetic_code: Option<String>,

    /// NCBI genetic code table number; takes precedence over --genetic-code
    #[arg(long = "table-id")]
    table_id: Option<u8>,

    /// Keep the terminal stop codon as '*' in translations
    #[arg(long = "include-stop")]
    include_stop: bool,

    /// Translate through internal stop codons
    #[arg(long = "allow-internal-stops")]
    allow_internal_stops: bool,

    /// Do not add /translation to CDS features
    #[arg(long = "no-translate")]
    no_translate: bool,

    /// Residues per ORIGIN line (default: 60)
    #[arg(long = "line-width")]
    line_width: Option<usize>,

    /// Write the ORIGIN block in upper case
    #[arg(long)]
    uppercase: bool,

    /// Map feature type synonyms onto GenBank feature keys
    #[arg(long)]
    standardize: bool,

    /// Only keep these feature types (repeatable)
    #[arg(long = "include-type")]
    include_type: Vec<String>,

    /// Drop these feature types (repeatable)
    #[arg(long = "exclude-type")]
    exclude_type: Vec<String>,

    /// Fail when validation reports errors
    #[arg(long)]
    strict: bool,

    /// Spool output through a temporary file
    #[arg(long = "memory-efficient")]
    memory_efficient: bool,

    /// Validate inputs without writing GenBank output
    #[arg(long = "validate-only")]
    validate_only: bool,
}

/// Builds options from the config file, then applies command line overrides.
fn build_options(args: &Args) -> Result<ConversionOptions> {
    let mut options = match &args.config {
        Some(path) => ConversionOptions::from_json_file(path)
            .with_context(|| format!("Cannot load options from {}", path.display()))?,
        None => ConversionOptions::default(),
    };

    if let Some(format) = Option::<FileFormat>::from(args.sequence_format) {
        options.sequence_format = Some(format);
    }
    if let Some(format) = Option::<FileFormat>::from(args.annotation_format) {
        options.annotation_format = Some(format);
    }
    if args.organism.is_some() {
        options.organism = args.organism.clone();
    }
    if args.molecule_type.is_some() {
        options.molecule_type = args.molecule_type.clone();
    }
    if let Some(topology) = args.topology {
        options.topology = Some(topology.into());
    }
    if args.division.is_some() {
        options.division = args.division.clone();
    }
    options.merge_sequences |= args.merge;
    options.strict |= args.strict;
    options.memory_efficient |= args.memory_efficient;

    let translation = &mut options.translation;
    if args.genetic_code.is_some() {
        translation.genetic_code = args.genetic_code.clone();
    }
    if args.table_id.is_some() {
        translation.table_id = args.table_id;
    }
    translation.include_stop_codon |= args.include_stop;
    translation.allow_internal_stop_codons |= args.allow_internal_stops;
    if args.no_translate {
        translation.translate_cds = false;
    }

    if let Some(width) = args.line_width {
        if width == 0 {
            anyhow::bail!("Line width must be positive");
        }
        options.output.sequence_line_width = width;
    }
    if args.uppercase {
        options.output.lowercase_sequence = false;
    }
    options.features.standardize_feature_types |= args.standardize;
    options.filter.include_feature_types.extend(args.include_type.iter().cloned());
    options.filter.exclude_feature_types.extend(args.exclude_type.iter().cloned());

    Ok(options)
}

fn report(validation: &ValidationResult) {
    for issue in validation.issues() {
        eprintln!("{}", issue);
    }
    eprintln!("{}", validation.summary());
}

fn run_validation(converter: &Converter, sequences: &Path, annotations: Option<&Path>) -> Result<()> {
    let validation = match annotations {
        Some(annotations) => converter.validate_files(sequences, annotations)?,
        None => converter.validate_sequence(sequences)?,
    };
    report(&validation);
    if !validation.is_valid() {
        anyhow::bail!("Validation failed with {} error(s)", validation.error_count());
    }
    Ok(())
}

fn run_conversion(converter: &Converter, sequences: &Path, annotations: Option<&Path>, output: &str) -> Result<()> {
    if output == "-" {
        // Write to stdout
        let stdout = io::stdout();
        let mut handle = BufWriter::new(stdout.lock());
        let summary = if converter.options().memory_efficient {
            let result = converter.convert_files(sequences, annotations)?;
            result.write_to(&mut handle)?;
            result.summary().clone()
        } else {
            converter.convert_files_to_stream(sequences, annotations, &mut handle)?
        };
        handle.flush()?;
        report(&summary.validation);
    } else {
        // Write to file
        let result = converter.convert_files(sequences, annotations)?;
        result
            .save(Path::new(output))
            .with_context(|| format!("Cannot write {}", output))?;
        report(result.validation());
        eprintln!("Wrote {} records to {}", result.sequence_count(), output);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let options = build_options(&args)?;

    // Resolve the genetic code up front so a bad table id fails before any I/O
    options.translation.resolve_table()?;

    let converter = Converter::new(options);
    let annotations = args.annotations.as_deref();

    if args.validate_only {
        run_validation(&converter, &args.sequences, annotations)
    } else {
        run_conversion(&converter, &args.sequences, annotations, &args.output)
    }
}
