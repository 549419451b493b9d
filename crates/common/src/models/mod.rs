//! Core data models for the citation graph

pub mod graph;
pub mod paper;
pub mod tally;

pub use graph::{CitationGraph, CitationRole, Edge, MergedNode};
pub use paper::PaperRecord;
pub use tally::TallyRecord;
