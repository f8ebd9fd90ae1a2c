use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::core::model::{MEModel, ReactionDraft, ReactionKind};
use crate::core::types::SpeciesKind;

/// Structural gap categories, in patch priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    /// Every producer of a needed species is bounded to zero flux
    BlockedProducer,
    /// A needed metabolite, RNA or protein has no producing reaction
    UnproducedMetabolite,
    /// A needed complex or generic has no formation reaction
    MissingComplexFormation,
    /// A catalysed reaction on the growth path has no keff
    MissingKeff,
    /// A metabolite or RNA produced on the growth path has no consumer
    UnconsumedMetabolite,
}

impl GapKind {
    /// Lower ranks are patched first
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::BlockedProducer => 0,
            Self::UnproducedMetabolite => 1,
            Self::MissingComplexFormation => 2,
            Self::MissingKeff => 3,
            Self::UnconsumedMetabolite => 4,
        }
    }
}

impl std::fmt::Display for GapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::BlockedProducer => "blocked producer",
            Self::UnproducedMetabolite => "unproduced species",
            Self::MissingComplexFormation => "missing complex formation",
            Self::MissingKeff => "missing keff",
            Self::UnconsumedMetabolite => "unconsumed species",
        };
        write!(f, "{name}")
    }
}

/// A candidate cause of infeasibility.
///
/// Gaps order by kind rank, then target id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Gap {
    pub kind: GapKind,
    /// Species or reaction the patch acts on
    pub target: String,
    /// Species whose balance exposed the gap, when the target is a reaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
}

impl Gap {
    fn new(kind: GapKind, target: &str, species: Option<&str>) -> Self {
        Self {
            kind,
            target: target.to_string(),
            species: species.map(str::to_string),
        }
    }
}

impl std::fmt::Display for Gap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.species {
            Some(species) => write!(f, "{} {} (needed for {species})", self.kind, self.target),
            None => write!(f, "{} {}", self.kind, self.target),
        }
    }
}

fn can_produce(reaction: &ReactionDraft, coefficient: f64) -> bool {
    (coefficient > 0.0 && reaction.upper_bound > 0.0)
        || (coefficient < 0.0 && reaction.lower_bound < 0.0)
}

fn can_consume(reaction: &ReactionDraft, coefficient: f64) -> bool {
    (coefficient < 0.0 && reaction.upper_bound > 0.0)
        || (coefficient > 0.0 && reaction.lower_bound < 0.0)
}

fn is_zero_bounded(reaction: &ReactionDraft) -> bool {
    reaction.lower_bound == 0.0 && reaction.upper_bound == 0.0
}

/// Find the structural gaps on the growth path of a model.
///
/// The growth path is every reaction upstream of the growth reaction:
/// starting from growth, each consumed species pulls in all of its possible
/// producers. Catalysts of reactions whose keff is unset are coupled at
/// `fallback_keff` so they still count as consumed. Bounds are taken from the
/// reactions themselves, so a reaction pinned for lack of a keff still counts
/// as a producer and only surfaces as a missing keff.
///
/// The result is sorted by priority.
#[must_use]
pub fn diagnose(model: &MEModel, fallback_keff: f64) -> Vec<Gap> {
    let reactions: Vec<&ReactionDraft> = model.reactions.values().collect();
    let coupled: Vec<BTreeMap<String, f64>> = reactions
        .iter()
        .map(|r| model.coupled_stoichiometry(r, fallback_keff))
        .collect();

    let mut producers: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut consumers: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut blocked: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, stoichiometry) in coupled.iter().enumerate() {
        let reaction = reactions[index];
        for (species, &coefficient) in stoichiometry {
            if can_produce(reaction, coefficient) {
                producers.entry(species.as_str()).or_default().push(index);
            } else if coefficient > 0.0
                && is_zero_bounded(reaction)
                && reaction.kind != ReactionKind::Growth
            {
                blocked.entry(species.as_str()).or_default().push(index);
            }
            if can_consume(reaction, coefficient) {
                consumers.entry(species.as_str()).or_default().push(index);
            }
        }
    }

    let start: Vec<usize> = match model
        .growth_reaction
        .as_deref()
        .and_then(|id| model.reactions.get_index_of(id))
    {
        Some(index) => vec![index],
        None => (0..reactions.len()).collect(),
    };

    let mut gaps: BTreeSet<Gap> = BTreeSet::new();
    let mut visited: HashSet<usize> = start.iter().copied().collect();
    let mut queue: VecDeque<usize> = start.into_iter().collect();
    let mut needed: HashSet<&str> = HashSet::new();

    while let Some(index) = queue.pop_front() {
        let reaction = reactions[index];
        let is_growth = model.growth_reaction.as_deref() == Some(reaction.id.as_str());

        if reaction.needs_keff() && reaction.keff.is_none() {
            gaps.insert(Gap::new(GapKind::MissingKeff, &reaction.id, None));
        }

        for (species, &coefficient) in &coupled[index] {
            let species = species.as_str();
            let consumes = if is_growth {
                coefficient < 0.0
            } else {
                can_consume(reaction, coefficient)
            };
            let produces = if is_growth {
                coefficient > 0.0
            } else {
                can_produce(reaction, coefficient)
            };

            if produces && !consumers.contains_key(species) {
                if let Some(SpeciesKind::Metabolite | SpeciesKind::Rna) = model.species_kind(species) {
                    gaps.insert(Gap::new(GapKind::UnconsumedMetabolite, species, None));
                }
            }

            if !consumes || !needed.insert(species) {
                continue;
            }

            match producers.get(species) {
                Some(found) => {
                    for &producer in found {
                        if visited.insert(producer) {
                            queue.push_back(producer);
                        }
                    }
                }
                None => {
                    if let Some(zeroed) = blocked.get(species) {
                        for &producer in zeroed {
                            gaps.insert(Gap::new(
                                GapKind::BlockedProducer,
                                &reactions[producer].id,
                                Some(species),
                            ));
                        }
                        continue;
                    }
                    let kind = match model.species_kind(species) {
                        Some(SpeciesKind::Complex | SpeciesKind::Generic) => {
                            GapKind::MissingComplexFormation
                        }
                        Some(_) => GapKind::UnproducedMetabolite,
                        None => continue,
                    };
                    gaps.insert(Gap::new(kind, species, None));
                }
            }
        }
    }

    gaps.into_iter().collect()
}
