//! # gbconvert - GenBank flat-file converter
//!
//! Turns FASTA sequences plus GFF3/GTF/BED/VCF annotations into GenBank
//! flat files.
//!
//! ## Architecture
//!
//! A conversion flows through these modules in order:
//! - `formats`: format detection and parsing into the data model
//! - `model`: sequences, annotations and merged features
//! - `merge`: attaches annotations to sequences, validates, groups segments
//! - `genetic_code` / `translation`: CDS translation under NCBI code tables
//! - `genbank`: streaming fixed-column GenBank writer
//! - `convert`: the `Converter` façade sequencing the steps above
//!
//! Supporting modules: `options` (configuration), `validation` (reports),
//! `error` (failure taxonomy) and `fileio` (file access).

pub mod convert;
pub mod error;
pub mod fileio;
pub mod formats;
pub mod genbank;
pub mod genetic_code;
pub mod merge;
pub mod model;
pub mod options;
pub mod translation;
pub mod validation;
