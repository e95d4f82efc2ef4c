pub mod annotation;
pub mod columns;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod meta;
pub mod navigator;
pub mod records;
pub mod stat_table;
pub mod team;
