//! Constrained derangement search.
//!
//! Givers are assigned in roster order. Each giver's compatible receivers are
//! shuffled and tried one at a time; a dead end pops back to the previous
//! giver and tries its next receiver. The search keeps its own explicit stack
//! of frames instead of recursing, so giving up on a giver is a plain `pop`.
//!
//! Before a receiver is accepted, a bipartite matching over the givers still
//! waiting and the receivers still free confirms that the rest of the roster
//! can be completed. That check never rejects a receiver that could lead to a
//! solution, so the search stays exhaustive while skipping branches that are
//! bound to fail.

use crate::domain::model::{Pairing, Roster};
use crate::utils::error::{Result, SantaError};
use crate::utils::validation::validate_roster;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Owns the random source used to break ties between valid receivers.
pub struct Matcher {
    rng: StdRng,
}

struct Frame {
    candidates: Vec<usize>,
    cursor: usize,
}

impl Frame {
    fn next_free(&mut self, taken: &[bool]) -> Option<usize> {
        while let Some(&candidate) = self.candidates.get(self.cursor) {
            self.cursor += 1;
            if !taken[candidate] {
                return Some(candidate);
            }
        }
        None
    }
}

impl Matcher {
    /// Seeded from the operating system, so every run draws differently.
    pub fn new() -> Self {
        Self::from_seed(None)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_seed(Some(seed))
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Draws a pairing where nobody gives to themselves or to anyone on
    /// their `invalid_matches` list, or fails with `Infeasible` when no such
    /// pairing exists.
    pub fn compute_pairing(&mut self, roster: &Roster) -> Result<Pairing> {
        validate_roster(roster)?;

        let participants = roster.participants();
        let graph = compatibility_graph(roster);

        if let Some(stuck) = graph.iter().position(|candidates| candidates.is_empty()) {
            return Err(SantaError::Infeasible {
                reason: format!(
                    "{} has no possible recipient left after exclusions",
                    participants[stuck].name
                ),
            });
        }

        let total = graph.len();
        let mut taken = vec![false; total];
        if !has_completion(&graph, 0, &taken) {
            return Err(infeasible());
        }

        let mut assigned: Vec<usize> = Vec::with_capacity(total);
        let mut stack = vec![self.frame(&graph[0])];
        let mut backtracks = 0usize;

        while let Some(frame) = stack.last_mut() {
            match frame.next_free(&taken) {
                Some(receiver) => {
                    taken[receiver] = true;
                    if !has_completion(&graph, assigned.len() + 1, &taken) {
                        taken[receiver] = false;
                        continue;
                    }

                    assigned.push(receiver);
                    if assigned.len() == total {
                        break;
                    }
                    let next = self.frame(&graph[assigned.len()]);
                    stack.push(next);
                }
                None => {
                    stack.pop();
                    if let Some(receiver) = assigned.pop() {
                        taken[receiver] = false;
                        backtracks += 1;
                    }
                }
            }
        }

        if assigned.len() != total {
            return Err(infeasible());
        }

        tracing::debug!(
            "Matched {} participants ({} backtracks)",
            total,
            backtracks
        );

        Ok(participants
            .iter()
            .zip(assigned)
            .map(|(giver, receiver)| (giver.name.clone(), participants[receiver].name.clone()))
            .collect())
    }

    fn frame(&mut self, candidates: &[usize]) -> Frame {
        let mut candidates = candidates.to_vec();
        candidates.shuffle(&mut self.rng);
        Frame {
            candidates,
            cursor: 0,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Draws a pairing with a freshly seeded [`Matcher`].
pub fn compute_pairing(roster: &Roster) -> Result<Pairing> {
    Matcher::new().compute_pairing(roster)
}

fn infeasible() -> SantaError {
    SantaError::Infeasible {
        reason: "the exclusions leave no way to give every participant a distinct recipient"
            .to_string(),
    }
}

/// For each giver, the roster indices of receivers they may be assigned.
fn compatibility_graph(roster: &Roster) -> Vec<Vec<usize>> {
    let participants = roster.participants();
    participants
        .iter()
        .map(|giver| {
            participants
                .iter()
                .enumerate()
                .filter(|(_, receiver)| !giver.excludes(&receiver.name))
                .map(|(idx, _)| idx)
                .collect()
        })
        .collect()
}

/// Whether givers `from..` can all be given distinct receivers among those
/// not yet `taken`.
fn has_completion(graph: &[Vec<usize>], from: usize, taken: &[bool]) -> bool {
    let mut owner: Vec<Option<usize>> = vec![None; taken.len()];
    (from..graph.len()).all(|giver| {
        let mut visited = vec![false; taken.len()];
        augment(graph, giver, taken, &mut owner, &mut visited)
    })
}

fn augment(
    graph: &[Vec<usize>],
    giver: usize,
    taken: &[bool],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &receiver in &graph[giver] {
        if taken[receiver] || visited[receiver] {
            continue;
        }
        visited[receiver] = true;

        let free = match owner[receiver] {
            None => true,
            Some(current) => augment(graph, current, taken, owner, visited),
        };
        if free {
            owner[receiver] = Some(giver);
            return true;
        }
    }
    false
}
