// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXX (e.g., J_K7NP3X for jobs)
//!
//! No ambiguous characters (excludes I, L, O, U), case-insensitive, and
//! ~1 billion combinations per entity type (32^6). Easy to read over the
//! phone when HR is chasing a specific application.

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// Job posting (J_)
    Job,
    /// Candidate application (A_)
    Application,
    /// HR user (U_)
    User,
    /// Stage history entry (H_)
    History,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Job => "J",
            EntityPrefix::Application => "A",
            EntityPrefix::User => "U",
            EntityPrefix::History => "H",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID in the format "PREFIX_XXXXXX" (e.g., "J_K7NP3X")
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(6))
}

/// Generate a Job ID (J_XXXXXX)
pub fn generate_job_id() -> String {
    generate_id(EntityPrefix::Job)
}

/// Generate an Application ID (A_XXXXXX)
pub fn generate_application_id() -> String {
    generate_id(EntityPrefix::Application)
}

/// Generate a User ID (U_XXXXXX)
pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

/// Generate a History/Audit ID (H_XXXXXX)
pub fn generate_history_id() -> String {
    generate_id(EntityPrefix::History)
}

/// Check whether a string looks like one of our prefixed IDs
pub fn is_valid_entity_id(id: &str) -> bool {
    let mut parts = id.splitn(2, '_');
    let (prefix, random) = match (parts.next(), parts.next()) {
        (Some(p), Some(r)) => (p, r),
        _ => return false,
    };
    if prefix.is_empty() || random.len() != 6 {
        return false;
    }
    random
        .bytes()
        .all(|b| CROCKFORD_ALPHABET.contains(&b.to_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_format() {
        let job_id = generate_job_id();
        assert!(job_id.starts_with("J_"));
        assert_eq!(job_id.len(), 8); // "J_" + 6 chars

        let application_id = generate_application_id();
        assert!(application_id.starts_with("A_"));
        assert_eq!(application_id.len(), 8);
    }

    #[test]
    fn test_crockford_alphabet_only() {
        let id = generate_job_id();
        let random_part = &id[2..]; // Skip "J_"

        for c in random_part.chars() {
            assert!(
                CROCKFORD_ALPHABET.contains(&(c as u8)),
                "Character '{}' not in Crockford alphabet",
                c
            );
        }

        // Verify no ambiguous characters
        assert!(!random_part.contains('I'));
        assert!(!random_part.contains('L'));
        assert!(!random_part.contains('O'));
        assert!(!random_part.contains('U'));
    }

    #[test]
    fn test_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            let id = generate_application_id();
            assert!(ids.insert(id), "Duplicate ID generated");
        }
    }

    #[test]
    fn test_all_prefixes() {
        assert!(generate_job_id().starts_with("J_"));
        assert!(generate_application_id().starts_with("A_"));
        assert!(generate_user_id().starts_with("U_"));
        assert!(generate_history_id().starts_with("H_"));
    }

    #[test]
    fn test_is_valid_entity_id() {
        assert!(is_valid_entity_id(&generate_job_id()));
        assert!(is_valid_entity_id("A_K7NP3X"));
        assert!(!is_valid_entity_id("A_K7NP3")); // too short
        assert!(!is_valid_entity_id("no-separator"));
        assert!(!is_valid_entity_id("A_K7NPLX")); // L is ambiguous
    }
}
