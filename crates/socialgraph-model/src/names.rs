//! Name frequency tables.
//!
//! A table is an ordered list of `(cumulative percentile, value)` pairs. The
//! last percentile is the table's total mass; it does not have to be 100.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tables::Gender;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameEntry {
    pub percentile: f64,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameTable(pub Vec<NameEntry>);

impl NameTable {
    pub fn new(entries: Vec<NameEntry>) -> Self {
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Draw a value with probability proportional to its percentile band.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        let total = self.0.last()?.percentile;
        let draw = if total > 0.0 {
            rng.gen_range(0.0..=total)
        } else {
            0.0
        };
        self.0
            .iter()
            .find(|entry| entry.percentile >= draw)
            .or_else(|| self.0.last())
            .map(|entry| entry.value.as_str())
    }
}

/// First-name tables per gender plus the shared last-name table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameTables {
    pub female: NameTable,
    pub male: NameTable,
    pub last: NameTable,
}

impl NameTables {
    pub fn first_name<R: Rng + ?Sized>(&self, rng: &mut R, gender: Gender) -> Option<&str> {
        match gender {
            Gender::Female => self.female.sample(rng),
            Gender::Male => self.male.sample(rng),
            Gender::Other => {
                if rng.gen_bool(0.5) {
                    self.female.sample(rng)
                } else {
                    self.male.sample(rng)
                }
            }
        }
    }

    pub fn last_name<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.last.sample(rng)
    }

    /// `"{first} {last}"`, or `None` when a required table is empty.
    pub fn full_name<R: Rng + ?Sized>(&self, rng: &mut R, gender: Gender) -> Option<String> {
        let first = self.first_name(rng, gender)?.to_string();
        let last = self.last_name(rng)?;
        Some(format!("{first} {last}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn table(entries: &[(f64, &str)]) -> NameTable {
        NameTable::new(
            entries
                .iter()
                .map(|(percentile, value)| NameEntry {
                    percentile: *percentile,
                    value: value.to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn empty_table_samples_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(NameTable::default().sample(&mut rng), None);
    }

    #[test]
    fn dominant_band_wins_most_draws() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let names = table(&[(90.0, "Common"), (100.0, "Rare")]);
        let common = (0..5_000)
            .filter(|_| names.sample(&mut rng) == Some("Common"))
            .count();
        assert!(common > 4_200, "common drawn {common} times");
    }

    #[test]
    fn full_name_joins_first_and_last() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let tables = NameTables {
            female: table(&[(100.0, "Amina")]),
            male: table(&[(100.0, "Omar")]),
            last: table(&[(100.0, "Rahman")]),
        };
        assert_eq!(
            tables.full_name(&mut rng, Gender::Female).as_deref(),
            Some("Amina Rahman")
        );
        let other = tables.full_name(&mut rng, Gender::Other).unwrap();
        assert!(other == "Amina Rahman" || other == "Omar Rahman");
    }
}
