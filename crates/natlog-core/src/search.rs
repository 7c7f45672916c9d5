//! # Search
//!
//! Uniform-cost search from a query fact towards a stored fact.
//!
//! ## State Space
//!
//! A state is a fact, the truth state of the path that produced it, its
//! cumulative cost and its depth. Successors come from three mutation
//! kinds:
//! - **Substitute**: a graph edge out of a token's `(word, sense)`
//! - **Delete**: a registered deletion of a token (never below length 1)
//! - **Insert**: a completion proposed by the fact database after a
//!   prefix, or before the first token
//!
//! Each mutation relates the new fact to the old by a natural-logic
//! relation projected through the polarity of the mutated token; a
//! successor whose truth state becomes undetermined is pruned. Polarity
//! is recomputed for every state from the operator words of its fact, so
//! a quantifier substitution changes the scope of the tokens after it.
//!
//! ## Order
//!
//! The frontier is ordered by `(cost, discovery sequence)`. Costs are
//! fixed-point integers, so the order is total and the result of a
//! search depends only on its inputs. The goal test runs when a state
//! is popped, so the first proof found is a cheapest one.
//!
//! ## Budget
//!
//! A search stops with `NotProven` when the frontier is exhausted or
//! `max_ticks` states have been popped. States deeper than `max_steps`
//! or costlier than `max_cost` are never generated.

use crate::fact_db::{CompletionSite, Completions, FactDb};
use crate::graph::Graph;
use crate::hashing::FactHash;
use crate::inference::{self, Relation, TruthState, project};
use crate::primitives::{DEFAULT_MAX_COST, DEFAULT_MAX_STEPS, DEFAULT_MAX_TICKS, MAX_FACT_LENGTH};
use crate::{Cost, Edge, Fact, Monotonicity, TaggedWord};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};
use tracing::debug;

// =============================================================================
// BUDGET
// =============================================================================

/// Limits of one search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchBudget {
    /// Maximum number of mutations on a path.
    pub max_steps: usize,
    /// Maximum cumulative path cost.
    pub max_cost: f32,
    /// Maximum number of states popped from the frontier.
    pub max_ticks: usize,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_cost: DEFAULT_MAX_COST,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// A single edit of one token.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Replace the token at `index` (`edge.source`) by `edge.sink`.
    Substitute { index: usize, edge: Edge },
    /// Drop the token at `index` (`edge.source`), a registered deletion.
    Delete { index: usize, edge: Edge },
    /// Insert `edge.source` so that it lands at `index`.
    Insert { index: usize, edge: Edge },
}

impl Mutation {
    #[must_use]
    pub const fn edge(&self) -> &Edge {
        match self {
            Self::Substitute { edge, .. } | Self::Delete { edge, .. } | Self::Insert { edge, .. } => {
                edge
            }
        }
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Substitute { index, .. } | Self::Delete { index, .. } | Self::Insert { index, .. } => {
                *index
            }
        }
    }

    /// Apply to `fact`. `None` if the mutation does not fit: index out of
    /// range, token mismatch, or a result outside `1..=MAX_FACT_LENGTH`.
    #[must_use]
    pub fn apply(&self, fact: &Fact) -> Option<Fact> {
        let mut words: Vec<TaggedWord> = fact.words().to_vec();
        match *self {
            Self::Substitute { index, edge } => {
                let token = words.get_mut(index)?;
                if token.word() != edge.source() || edge.is_deletion() {
                    return None;
                }
                let replacement = TaggedWord::new(edge.sink(), u32::from(edge.sink_sense()));
                *token = match token.marker() {
                    Some(marker) => replacement.with_monotonicity(marker),
                    None => replacement,
                };
            }
            Self::Delete { index, edge } => {
                if words.len() <= 1 || words.get(index)?.word() != edge.source() {
                    return None;
                }
                words.remove(index);
            }
            Self::Insert { index, edge } => {
                if index > words.len() || words.len() >= MAX_FACT_LENGTH {
                    return None;
                }
                words.insert(
                    index,
                    TaggedWord::new(edge.source(), u32::from(edge.source_sense())),
                );
            }
        }
        Fact::new(words).ok()
    }
}

// =============================================================================
// PATHS & OUTCOMES
// =============================================================================

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    pub mutation: Mutation,
    /// The fact after this step.
    pub fact: Fact,
    /// Cumulative cost up to and including this step.
    pub cost: Cost,
    /// What the fact after this step says about the query.
    pub truth: TruthState,
}

/// An ordered chain of mutations from the query to a stored fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub query: Fact,
    pub steps: Vec<PathStep>,
}

impl Path {
    /// The fact the path ends at.
    #[must_use]
    pub fn final_fact(&self) -> &Fact {
        self.steps.last().map(|s| &s.fact).unwrap_or(&self.query)
    }

    /// Total cost of the path.
    #[must_use]
    pub fn cost(&self) -> Cost {
        self.steps.last().map(|s| s.cost).unwrap_or(Cost::ZERO)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Re-apply every mutation to the query. Returns the final fact if
    /// each step reproduces its recorded fact, `None` otherwise.
    #[must_use]
    pub fn replay(&self) -> Option<Fact> {
        let mut fact = self.query.clone();
        for step in &self.steps {
            fact = step.mutation.apply(&fact)?;
            if fact != step.fact {
                return None;
            }
        }
        Some(fact)
    }
}

/// Result of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SearchOutcome {
    /// The query follows from a stored fact.
    Proven(Path),
    /// A stored fact contradicts the query.
    Refuted(Path),
    /// Nothing was derived within the budget.
    NotProven { ticks: usize },
}

impl SearchOutcome {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Proven(path) | Self::Refuted(path) => Some(path),
            Self::NotProven { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_proven(&self) -> bool {
        matches!(self, Self::Proven(_))
    }
}

// =============================================================================
// SEARCH
// =============================================================================

#[derive(Debug, Clone)]
struct SearchNode {
    fact: Fact,
    parent: Option<usize>,
    mutation: Option<Mutation>,
    cost: Cost,
    truth: TruthState,
    depth: usize,
}

/// A search over read-only structures. Cheap to create; owns nothing.
#[derive(Debug, Clone, Copy)]
pub struct Search<'a, D: FactDb + ?Sized> {
    graph: &'a Graph,
    facts: &'a D,
}

impl<'a, D: FactDb + ?Sized> Search<'a, D> {
    #[must_use]
    pub fn new(graph: &'a Graph, facts: &'a D) -> Self {
        Self { graph, facts }
    }

    /// Polarity of every token of `fact` under its operators' scope.
    fn polarities(&self, fact: &Fact) -> Vec<Monotonicity> {
        inference::polarities(fact.words(), |word| self.graph.operator(word))
    }

    /// Relation of `after` to `before`. Substitutions and deletions are
    /// projected through the polarity the token had; an insertion through
    /// the polarity the new token gets.
    fn relation(&self, before: &[Monotonicity], after: &Fact, mutation: &Mutation) -> Relation {
        match *mutation {
            Mutation::Substitute { index, edge } => {
                let lexical = self
                    .graph
                    .kind_of(edge.edge_type())
                    .map(|kind| kind.lexical_relation())
                    .unwrap_or(Relation::Independent);
                project(lexical, polarity_at(before, index))
            }
            Mutation::Delete { index, .. } => {
                project(Relation::Reverse, polarity_at(before, index))
            }
            Mutation::Insert { index, .. } => {
                project(Relation::Forward, polarity_at(&self.polarities(after), index))
            }
        }
    }

    /// Every candidate mutation of `fact`, in a fixed order: graph edges
    /// token by token, then insertions after each prefix, then insertions
    /// at the start.
    fn candidates(&self, fact: &Fact) -> Vec<Mutation> {
        let mut mutations = Vec::new();
        for (index, token) in fact.iter().enumerate() {
            for &edge in self.graph.mutations_of(token.word(), token.sense()) {
                if edge.is_deletion() {
                    if fact.len() > 1 {
                        mutations.push(Mutation::Delete { index, edge });
                    }
                } else {
                    mutations.push(Mutation::Substitute { index, edge });
                }
            }
        }

        let mut completions = Completions::new();
        for index in 0..fact.len() {
            completions.clear();
            self.facts
                .contains(fact.words(), CompletionSite::After(index), &mut completions);
            mutations.extend(completions.iter().map(|&edge| Mutation::Insert {
                index: index + 1,
                edge,
            }));
        }
        completions.clear();
        self.facts
            .contains(fact.words(), CompletionSite::SentenceStart, &mut completions);
        mutations.extend(
            completions
                .iter()
                .map(|&edge| Mutation::Insert { index: 0, edge }),
        );
        mutations
    }

    fn path_to(query: &Fact, nodes: &[SearchNode], mut index: usize) -> Path {
        let mut steps = Vec::new();
        while let Some(node) = nodes.get(index) {
            let (Some(parent), Some(mutation)) = (node.parent, node.mutation) else {
                break;
            };
            steps.push(PathStep {
                mutation,
                fact: node.fact.clone(),
                cost: node.cost,
                truth: node.truth,
            });
            index = parent;
        }
        steps.reverse();
        Path {
            query: query.clone(),
            steps,
        }
    }

    /// Search from `query` within `budget`.
    #[must_use]
    pub fn run(&self, query: &Fact, budget: &SearchBudget) -> SearchOutcome {
        let max_cost = Cost::from_f32(budget.max_cost);
        let mut nodes = vec![SearchNode {
            fact: query.clone(),
            parent: None,
            mutation: None,
            cost: Cost::ZERO,
            truth: TruthState::Entails,
            depth: 0,
        }];
        let mut frontier = BinaryHeap::new();
        frontier.push(Reverse((Cost::ZERO, 0u64, 0usize)));
        let mut sequence = 1u64;
        let mut visited = BTreeSet::new();
        let mut ticks = 0usize;

        while let Some(Reverse((_, _, current))) = frontier.pop() {
            if ticks >= budget.max_ticks {
                break;
            }
            ticks += 1;

            let node = nodes[current].clone();
            if !visited.insert((FactHash::of_senses(node.fact.words()), node.truth)) {
                continue;
            }

            if self.facts.is_fact(node.fact.words()) {
                let path = Self::path_to(query, &nodes, current);
                debug!(ticks, steps = path.len(), cost = %path.cost(), "Search succeeded");
                return match node.truth {
                    TruthState::Entails => SearchOutcome::Proven(path),
                    TruthState::Contradicts => SearchOutcome::Refuted(path),
                };
            }

            if node.depth >= budget.max_steps {
                continue;
            }

            let polarities = self.polarities(&node.fact);
            for mutation in self.candidates(&node.fact) {
                let step_cost = Cost::from_f32(mutation.edge().cost());
                let cost = node.cost.saturating_add(step_cost);
                if cost > max_cost {
                    continue;
                }
                let Some(fact) = mutation.apply(&node.fact) else {
                    continue;
                };
                let Some(truth) = node.truth.apply(self.relation(&polarities, &fact, &mutation))
                else {
                    continue;
                };
                if visited.contains(&(FactHash::of_senses(fact.words()), truth)) {
                    continue;
                }
                nodes.push(SearchNode {
                    fact,
                    parent: Some(current),
                    mutation: Some(mutation),
                    cost,
                    truth,
                    depth: node.depth + 1,
                });
                frontier.push(Reverse((cost, sequence, nodes.len() - 1)));
                sequence += 1;
            }
        }

        debug!(ticks, "Search exhausted");
        SearchOutcome::NotProven { ticks }
    }
}

fn polarity_at(polarities: &[Monotonicity], index: usize) -> Monotonicity {
    polarities.get(index).copied().unwrap_or_default()
}

// =============================================================================
// TESTS
// =============================================================================
