//! Shared harness for the end-to-end journey tests

pub mod harness;
