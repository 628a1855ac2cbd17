use log::{debug, info};
use snafu::prelude::*;

use std::collections::HashMap;

use crate::builder::Election;
use crate::config::*;

/// Compares every pair of candidates head to head.
///
/// A ballot prefers A over B when it ranks A before B. Ballots that leave out
/// A or B do not take part in that comparison. The Condorcet winner beats
/// every other candidate; there may be none, for example with cyclic
/// preferences.
pub fn run_condorcet(election: &Election) -> Result<CondorcetResult, TallyError> {
    ensure!(!election.is_empty(), EmptyElectionSnafu);
    let candidates = election.candidates();
    let n = candidates.len();
    let total_weight = election.total_weight();
    let index: HashMap<&str, usize> = candidates
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();

    let mut preferences: Vec<Vec<u64>> = vec![vec![0; n]; n];
    for b in election.ballots().iter() {
        let positions: Vec<usize> = b
            .ranking
            .iter()
            .filter_map(|c| index.get(c.as_str()).copied())
            .collect();
        for (i, &winner) in positions.iter().enumerate() {
            for &loser in positions[i + 1..].iter() {
                preferences[winner][loser] += b.weight;
            }
        }
    }
    debug!("run_condorcet: preferences: {:?}", preferences);

    let mut contests: Vec<PairwiseContest> = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let first_over_second = preferences[i][j];
            let second_over_first = preferences[j][i];
            let outcome = match first_over_second.cmp(&second_over_first) {
                std::cmp::Ordering::Greater => PairOutcome::Win,
                std::cmp::Ordering::Less => PairOutcome::Loss,
                std::cmp::Ordering::Equal => PairOutcome::Tie,
            };
            contests.push(PairwiseContest {
                first: candidates[i].clone(),
                second: candidates[j].clone(),
                first_over_second,
                second_over_first,
                abstained: total_weight - first_over_second - second_over_first,
                outcome,
            });
        }
    }

    let victories: Vec<(String, u32)> = (0..n)
        .map(|i| {
            let wins = (0..n)
                .filter(|&j| j != i && preferences[i][j] > preferences[j][i])
                .count();
            (candidates[i].clone(), wins as u32)
        })
        .collect();
    let winner: Option<String> = victories
        .iter()
        .find(|(_, wins)| *wins as usize == n - 1)
        .map(|(name, _)| name.clone());

    match &winner {
        Some(name) => info!("run_condorcet: Condorcet winner: {}", name),
        None => info!("run_condorcet: no Condorcet winner, victories: {:?}", victories),
    }

    Ok(CondorcetResult {
        candidates: candidates.to_vec(),
        preferences,
        contests,
        victories,
        total_weight,
        winner,
    })
}
