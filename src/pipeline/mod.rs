pub mod assignment;
pub mod extraction; // extract → post-process → store
pub mod postprocess;
pub mod scoring; // comparison, aggregates, metric upserts
pub mod validation;
