use log::{debug, info};
use snafu::prelude::*;

use std::collections::HashMap;

use crate::builder::Election;
use crate::config::*;

/// Runs the Borda count on the election.
///
/// With N candidates, the first choice of a ballot scores N-1 points, the
/// second N-2 and so on. Unranked candidates score nothing from that ballot.
pub fn run_borda(election: &Election) -> Result<BordaResult, TallyError> {
    ensure!(!election.is_empty(), EmptyElectionSnafu);
    let candidates = election.candidates();
    let max_points = candidates.len() as u64 - 1;
    let index: HashMap<&str, usize> = candidates
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();

    let mut scores: Vec<u64> = vec![0; candidates.len()];
    for b in election.ballots().iter() {
        for (pos, name) in b.ranking.iter().enumerate() {
            if let Some(idx) = index.get(name.as_str()) {
                scores[*idx] += b.weight * max_points.saturating_sub(pos as u64);
            }
        }
    }
    debug!("run_borda: scores: {:?}", scores);

    let scores: Vec<(String, u64)> = candidates.iter().cloned().zip(scores).collect();
    let top = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
    let mut leaders: Vec<String> = scores
        .iter()
        .filter(|(_, s)| *s == top)
        .map(|(name, _)| name.clone())
        .collect();
    let outcome = if leaders.len() == 1 {
        Outcome::Winner(leaders.remove(0))
    } else {
        Outcome::Tie(leaders)
    };
    info!("run_borda: top score {}: {:?}", top, outcome);

    Ok(BordaResult { scores, outcome })
}
