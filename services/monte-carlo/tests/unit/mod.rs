//! Unit tests for the simulator components

pub mod statistics_tests;
