//! Shared fixtures for the tests and benches of the `sculpt_blocks_*` crates.

#![deny(rust_2018_idioms, nonstandard_style, unused)]

pub mod data_sets;
pub mod test;
