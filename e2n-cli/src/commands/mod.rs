mod adapters;
mod convert;
mod ingest;

pub(crate) use adapters::run_adapters;
pub(crate) use convert::run_convert;
pub(crate) use ingest::run_ingest;
