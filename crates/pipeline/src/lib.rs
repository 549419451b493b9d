//! CiteGraph Pipeline
//!
//! Staged enrichment pipeline turning a bibliographic export into a
//! directed citation graph with external metadata, sentiment tallies
//! and per-edge rhetorical roles:
//!
//! 1. resolve  - normalize export records to canonical paper ids
//! 2. fetch    - metadata lookups through the persistent cache
//! 3. extract  - derive raw citation edges from reference lists
//! 4. filter   - restrict edges to the working collection
//! 5. tally    - sentiment tally lookups through the cache
//! 6. merge    - join metadata and tallies per node
//! 7. graph    - assemble the deduplicated citation graph
//! 8. classify - attach rhetorical roles to edges
//! 9. export   - node and edge tables for downstream analysis
//!
//! Every stage persists its output artifact, so a re-run resumes from
//! the cache instead of repeating upstream network calls.

pub mod artifacts;
pub mod cancel;
pub mod classify;
pub mod export;
pub mod export_input;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod graph;
pub mod merge;
pub mod report;
pub mod resolve;
pub mod run;
pub mod tally;
