pub mod constants;
pub mod lmdb_config;
