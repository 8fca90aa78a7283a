//! The stock generation script.
//!
//! Calls the generator in a fixed order and concatenates every emitted
//! operation into one stream. Any hard generation error aborts the run,
//! except that the random following and viewing passes stop early once no
//! eligible pair is left.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use socialgraph_gen::{
    Diagnostic, EducationSpec, EmploymentSpec, FollowingSpec, GenerationError, Generator,
    GeneratorConfig, MembershipSpec, PersonSpec, PlaceSpec, ReactionSpec, ResponseSpec,
    SocialRelationSpec, ViewingSpec,
};
use socialgraph_model::MutationOp;
use socialgraph_resources::ResourceBundle;
use tracing::{info, warn};

/// How many times each repeated default operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// One education and one employment per round.
    pub career_rounds: usize,
    pub memberships: usize,
    pub social_relations: usize,
    pub reactions: usize,
    pub responses: usize,
    pub random_followings: usize,
    pub random_viewings: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            career_rounds: 30,
            memberships: 50,
            social_relations: 200,
            reactions: 1000,
            responses: 120,
            random_followings: 100,
            random_viewings: 500,
        }
    }
}

/// Contents of the `--config` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub generator: GeneratorConfig,
    pub script: ScriptConfig,
}

pub struct ScriptOutput {
    pub ops: Vec<MutationOp>,
    pub diagnostics: Vec<Diagnostic>,
}

// ============================================================================
// Place hierarchy
// ============================================================================

struct CountrySeed {
    name: &'static str,
    slug: &'static str,
    languages: &'static [&'static str],
    /// `(state, cities)`; an empty state name puts the cities directly
    /// under the country.
    states: &'static [(&'static str, &'static [&'static str])],
}

struct RegionSeed {
    name: &'static str,
    slug: &'static str,
    subregion: (&'static str, &'static str),
    countries: &'static [CountrySeed],
}

const HIERARCHY: &[RegionSeed] = &[
    RegionSeed {
        name: "Americas",
        slug: "americas",
        subregion: ("Northern America", "northern-america"),
        countries: &[CountrySeed {
            name: "United States",
            slug: "united-states",
            languages: &["English"],
            states: &[
                (
                    "California",
                    &["Sacramento", "Los Angeles", "San Francisco", "Sevastopol"],
                ),
                ("Texas", &["Austin"]),
                ("New York", &["Albany", "New York City"]),
                ("New Jersey", &["Trenton", "Newark"]),
                ("Washington", &["Seattle"]),
                ("Massachusetts", &["Boston"]),
                ("New Mexico", &["Santa Fe", "Albuquerque"]),
                ("Missouri", &["Kansas City"]),
            ],
        }],
    },
    RegionSeed {
        name: "Europe",
        slug: "europe",
        subregion: ("Northern Europe", "northern-europe"),
        countries: &[CountrySeed {
            name: "United Kingdom",
            slug: "united-kingdom",
            languages: &["English"],
            states: &[("", &["London", "Bristol", "Liverpool"])],
        }],
    },
];

/// Canada hangs off the Americas subregion but is emitted after the UK.
const CANADA: CountrySeed = CountrySeed {
    name: "Canada",
    slug: "canada",
    languages: &["English", "French"],
    states: &[
        ("Ontario", &["Toronto"]),
        ("Quebec", &["Quebec City", "Montreal"]),
    ],
};

fn slug(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn country_ops(gen: &mut Generator, parent: &str, country: &CountrySeed) -> Result<Vec<MutationOp>> {
    let id = format!("{parent}/{}", country.slug);
    let mut ops = gen.place(PlaceSpec::country(country.name, parent, country.languages).with_id(&id))?;
    for (state, cities) in country.states {
        let city_parent = if state.is_empty() {
            id.clone()
        } else {
            let state_id = format!("{id}/{}", slug(state));
            ops.extend(gen.place(PlaceSpec::state(state, &id).with_id(&state_id))?);
            state_id
        };
        for city in cities.iter() {
            let city_id = format!("{city_parent}/{}", slug(city));
            ops.extend(gen.place(PlaceSpec::city(city, &city_parent).with_id(&city_id))?);
        }
    }
    Ok(ops)
}

/// The built-in region > subregion > country > state > city tree.
pub fn places(gen: &mut Generator) -> Result<Vec<MutationOp>> {
    let mut ops = Vec::new();
    let mut americas_subregion = None;
    for region in HIERARCHY {
        let region_id = format!("plc-{}", region.slug);
        ops.extend(gen.place(PlaceSpec::region(region.name).with_id(&region_id))?);
        let (sub_name, sub_slug) = region.subregion;
        let sub_id = format!("{region_id}/{sub_slug}");
        ops.extend(gen.place(PlaceSpec::region(sub_name).within(&region_id).with_id(&sub_id))?);
        for country in region.countries {
            ops.extend(country_ops(gen, &sub_id, country)?);
        }
        if region.slug == "americas" {
            americas_subregion = Some(sub_id);
        }
    }
    if let Some(parent) = americas_subregion {
        ops.extend(country_ops(gen, &parent, &CANADA)?);
    }
    Ok(ops)
}

// ============================================================================
// Script
// ============================================================================

fn repeat<F>(count: usize, label: &str, mut step: F) -> Result<Vec<MutationOp>>
where
    F: FnMut() -> socialgraph_gen::Result<Vec<MutationOp>>,
{
    let mut ops = Vec::new();
    for i in 0..count {
        ops.extend(step().with_context(|| format!("{label} #{i}"))?);
    }
    Ok(ops)
}

/// Like [`repeat`], but stops quietly once the pool of eligible pairs is
/// empty.
fn repeat_until_saturated<F>(count: usize, label: &str, mut step: F) -> Result<Vec<MutationOp>>
where
    F: FnMut() -> socialgraph_gen::Result<Vec<MutationOp>>,
{
    let mut ops = Vec::new();
    for i in 0..count {
        match step() {
            Ok(more) => ops.extend(more),
            Err(GenerationError::CapacityExhausted(reason)) => {
                warn!(pass = label, emitted = i, requested = count, %reason, "pass saturated");
                break;
            }
            Err(err) => return Err(err).with_context(|| format!("{label} #{i}")),
        }
    }
    Ok(ops)
}

pub fn run(config: &RunConfig, resources: &ResourceBundle) -> Result<ScriptOutput> {
    let mut gen = Generator::new(config.generator.clone(), resources.names.clone())?;
    let counts = &config.script;
    let mut ops = Vec::new();

    ops.extend(places(&mut gen)?);
    for landmark in &resources.landmarks {
        ops.extend(gen.place(PlaceSpec::landmark(landmark))?);
    }
    for bio in &resources.bios {
        ops.extend(gen.person(PersonSpec::with_bio(bio))?);
    }
    for organisation in &resources.organisations {
        ops.extend(
            gen.organisation(organisation.to_spec())
                .with_context(|| format!("organisation `{}`", organisation.name))?,
        );
    }
    for group in &resources.groups {
        ops.extend(gen.group(group.to_spec())?);
    }
    info!(pages = gen.registry().pages().count(), "pages created");

    for i in 0..counts.career_rounds {
        ops.extend(
            gen.education(EducationSpec::default())
                .with_context(|| format!("education #{i}"))?,
        );
        ops.extend(
            gen.employment(EmploymentSpec::default())
                .with_context(|| format!("employment #{i}"))?,
        );
    }
    ops.extend(repeat(counts.memberships, "membership", || {
        gen.group_membership(MembershipSpec::default())
    })?);
    ops.extend(repeat(counts.social_relations, "social relation", || {
        gen.social_relation(SocialRelationSpec::default())
    })?);

    for spec in &resources.conversations {
        ops.extend(
            gen.conversation(spec.clone())
                .with_context(|| format!("conversation `{}`", spec.template.reference))?,
        );
    }
    ops.extend(gen.relationship_statuses()?);

    ops.extend(repeat(counts.reactions, "reaction", || {
        gen.reaction(ReactionSpec::default())
    })?);
    ops.extend(repeat(counts.responses, "response", || {
        gen.response(ResponseSpec::default())
    })?);

    ops.extend(gen.relation_followings()?);
    ops.extend(gen.member_followings()?);
    ops.extend(repeat_until_saturated(
        counts.random_followings,
        "random following",
        || gen.following(FollowingSpec::default()),
    )?);

    ops.extend(gen.content_subscriptions()?);
    ops.extend(gen.participant_viewings()?);
    ops.extend(gen.reaction_viewings()?);
    ops.extend(gen.response_viewings()?);
    ops.extend(repeat_until_saturated(
        counts.random_viewings,
        "random viewing",
        || gen.viewing(ViewingSpec::default()),
    )?);

    let diagnostics = gen.take_diagnostics();
    info!(
        operations = ops.len(),
        diagnostics = diagnostics.len(),
        "script finished"
    );
    Ok(ScriptOutput { ops, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use socialgraph_model::NameTables;

    #[test]
    fn hierarchy_ids_are_paths() {
        let mut gen = Generator::new(GeneratorConfig::default(), NameTables::default()).unwrap();
        let ops = places(&mut gen).unwrap();
        let registry = gen.registry();

        let seattle = registry.place("plc-americas/northern-america/united-states/washington/seattle");
        assert_eq!(seattle.unwrap().name, "Seattle");
        let london = registry
            .place("plc-europe/northern-europe/united-kingdom/london")
            .unwrap();
        assert_eq!(
            london.parent.as_deref(),
            Some("plc-europe/northern-europe/united-kingdom")
        );
        assert!(registry
            .place("plc-americas/northern-america/canada/quebec/quebec-city")
            .is_some());

        let uk = ops
            .iter()
            .position(|op| op.fields().get_str("name") == Some("United Kingdom"))
            .unwrap();
        let canada = ops
            .iter()
            .position(|op| op.fields().get_str("name") == Some("Canada"))
            .unwrap();
        assert!(uk < canada);
    }

    #[test]
    fn empty_config_uses_stock_counts() {
        let config: RunConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.script.social_relations, 200);
        assert_eq!(config.generator.seed, 0);
    }
}
