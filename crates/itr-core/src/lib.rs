//! Record-splitting, identifier-matching, field-resolution and
//! coordinate-based annotation engine for inspection/test-record forms.
//!
//! This crate is the core shared by the autofill and NA-check modes.
//! Document and spreadsheet parsing stay behind the [`DocumentSource`]
//! and ledger-row interfaces and drawing behind [`AnnotationSink`]; the
//! core only decides what to write where.
//!
//! Pipeline order within one document:
//! Split → Extract → Match → Resolve → Locate → Write, with the report
//! builder observing every stage. Only a [`ConfigError`] aborts a run;
//! everything else is captured as data and surfaced in the report.

pub mod annotate;
pub mod document;
pub mod error;
pub mod extract;
pub mod geom;
pub mod layout;
pub mod ledger;
pub mod manual;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod preset;
pub mod record;
pub mod region;
pub mod report;
pub mod resolve;
pub mod rules;
pub mod split;

pub use annotate::{AnnotationSink, CommitStats};
pub use document::{DocumentSource, TextToken};
pub use error::{ConfigError, DocumentError};
pub use geom::BoundingBox;
pub use ledger::{LedgerIndex, LedgerRow, RawRow};
pub use manual::ManualStore;
pub use preset::{CompiledPreset, FieldMapping, FieldSource, Preset};
pub use record::{FieldOutcome, FieldStatus, MatchState, PageRange, RecordSet};
pub use region::{LocatedRegion, RegionClass, RegionTemplate};
pub use report::{BatchReport, BatchSummary, FailedDocument, ReportBuilder, ReportRow};
pub use rules::RuleRegistry;
