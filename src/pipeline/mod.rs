pub mod categories;
pub mod extraction; // Content-addressed text cache + extractor seam
pub mod rules; // Tiered keyword matcher
pub mod learning; // Learned pattern store + feedback
pub mod arbitration; // Verdict policy, remote and photo oracles
pub mod naming;
pub mod processor; // Per-file pipeline
pub mod jobs; // Batch orchestrator + worker pool
