// src/jobs/tests/mod.rs

mod validators_tests;
