pub mod accession;
pub mod bulk;
pub mod config;
pub mod domain;
pub mod emit;
pub mod error;
pub mod group;
pub mod input;
pub mod keys;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod resolve;
pub mod runlog;
pub mod store;
pub mod validate;
