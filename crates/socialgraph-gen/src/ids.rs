//! Identifier allocation.
//!
//! Places, groups, posts, comments and media get prefixed 128-bit random
//! tokens; collisions are not checked. Persons get composite usernames that
//! are retried until unused.

use rand::Rng;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{GenerationError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Place,
    Group,
    Post,
    Comment,
    Media,
}

impl Namespace {
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Place => "plc",
            Namespace::Group => "grp",
            Namespace::Post => "pst",
            Namespace::Comment => "cmt",
            Namespace::Media => "med",
        }
    }
}

/// `"{prefix}-{32 hex digits}"` laid out as a version-4 UUID.
pub fn token<R: Rng + ?Sized>(rng: &mut R, namespace: Namespace) -> String {
    let bytes: [u8; 16] = rng.gen();
    let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
    format!("{}-{}", namespace.prefix(), uuid.simple())
}

#[derive(Debug, Clone, Copy)]
pub struct UsernamePolicy {
    pub suffix_digits: u32,
    pub max_attempts: u32,
}

impl UsernamePolicy {
    /// Number of distinct suffixes, saturating for absurd widths.
    pub fn suffix_space(&self) -> u64 {
        10u64.checked_pow(self.suffix_digits).unwrap_or(u64::MAX)
    }
}

/// Display name with whitespace removed plus a zero-padded numeric suffix.
///
/// Once `person_count` reaches the suffix space a `UsernameDensity`
/// diagnostic is recorded and allocation carries on.
pub fn username<R, F>(
    rng: &mut R,
    display_name: &str,
    is_taken: F,
    person_count: usize,
    policy: UsernamePolicy,
    diagnostics: &mut Diagnostics,
) -> Result<String>
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    let base: String = display_name.split_whitespace().collect();
    let space = policy.suffix_space();
    let width = policy.suffix_digits as usize;

    if person_count as u64 >= space {
        diagnostics.push(
            DiagnosticKind::UsernameDensity,
            format!(
                "{person_count} persons exist for {space} username suffixes; \
                 consider raising username_suffix_digits"
            ),
        );
    }

    for _ in 0..policy.max_attempts {
        let suffix = if width == 0 { 0 } else { rng.gen_range(0..space) };
        let candidate = if width == 0 {
            base.clone()
        } else {
            format!("{base}{suffix:0width$}")
        };
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
    }

    Err(GenerationError::exhausted(format!(
        "no free username for `{display_name}` after {} attempts",
        policy.max_attempts
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    const POLICY: UsernamePolicy = UsernamePolicy {
        suffix_digits: 3,
        max_attempts: 10_000,
    };

    #[test]
    fn tokens_are_prefixed_fixed_width_hex() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let id = token(&mut rng, Namespace::Post);
        let (prefix, hex) = id.split_once('-').unwrap();
        assert_eq!(prefix, "pst");
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, token(&mut rng, Namespace::Post));
    }

    #[test]
    fn username_strips_whitespace_and_pads_suffix() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut diagnostics = Diagnostics::new();
        let name = username(&mut rng, "Amina  Rahman", |_| false, 0, POLICY, &mut diagnostics)
            .unwrap();
        assert!(name.starts_with("AminaRahman"));
        assert_eq!(name.len(), "AminaRahman".len() + 3);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn username_retries_until_free() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut diagnostics = Diagnostics::new();
        let taken: HashSet<String> = (0..999).map(|n| format!("Bo{n:03}")).collect();
        let name = username(
            &mut rng,
            "Bo",
            |candidate| taken.contains(candidate),
            taken.len(),
            POLICY,
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(name, "Bo999");
    }

    #[test]
    fn exhausted_suffix_space_fails_after_the_cap() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut diagnostics = Diagnostics::new();
        let policy = UsernamePolicy {
            suffix_digits: 1,
            max_attempts: 50,
        };
        let result = username(&mut rng, "Bo", |_| true, 10, policy, &mut diagnostics);
        assert!(matches!(result, Err(GenerationError::CapacityExhausted(_))));
        assert_eq!(diagnostics.count_of(DiagnosticKind::UsernameDensity), 1);
    }
}
