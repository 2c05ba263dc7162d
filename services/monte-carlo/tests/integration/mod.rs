//! Integration tests running full simulator workflows

pub mod end_to_end_tests;
