// src/candidates/tests/mod.rs

mod validators_tests;
