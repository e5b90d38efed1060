pub mod ingest;
pub mod relink;
pub mod status;
