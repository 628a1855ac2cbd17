use log::{debug, info};
use snafu::prelude::*;

use std::collections::{HashMap, HashSet};

use crate::builder::Election;
use crate::config::*;

/// Runs instant-runoff on the election.
///
/// Every round, each ballot counts for its highest ranked candidate still
/// running. A candidate with more than half of the counted weight wins.
/// Otherwise all the candidates sharing the lowest total are eliminated
/// together. The count stops without a winner when every remaining candidate
/// has the same total.
pub fn run_irv(election: &Election) -> Result<IrvResult, TallyError> {
    ensure!(!election.is_empty(), EmptyElectionSnafu);
    let ballots = election.ballots();
    let total_weight = election.total_weight();
    info!(
        "run_irv: processing {} ballots (total weight {})",
        ballots.len(),
        total_weight
    );
    for (idx, name) in election.candidates().iter().enumerate() {
        info!("Candidate: {}: {}", idx + 1, name);
    }

    // The candidates still running, in candidate order.
    let mut running: Vec<String> = election.candidates().to_vec();
    let mut rounds: Vec<RoundStats> = Vec::new();

    loop {
        let round_id = rounds.len() as u32 + 1;
        let tally = compute_tally(ballots, &running);
        let counted: u64 = tally.iter().map(|(_, vc)| *vc).sum();
        let threshold = counted / 2 + 1;
        info!("Round {} (winning threshold: {})", round_id, threshold);
        for (name, vc) in tally.iter() {
            info!("{:>8} {}", vc, name);
        }

        let mut round = RoundStats {
            round: round_id,
            tally: tally.clone(),
            counted,
            exhausted: total_weight - counted,
            threshold,
            elected: None,
            eliminated: Vec::new(),
        };

        if counted == 0 {
            debug!("run_irv: all ballots exhausted in round {}", round_id);
            rounds.push(round);
            return Ok(IrvResult {
                rounds,
                outcome: Outcome::Tie(running),
            });
        }

        if let Some((name, _)) = tally.iter().find(|(_, vc)| *vc > counted / 2) {
            info!("Round {}: {} -> elected", round_id, name);
            round.elected = Some(name.clone());
            rounds.push(round);
            return Ok(IrvResult {
                rounds,
                outcome: Outcome::Winner(name.clone()),
            });
        }

        let min_count = tally.iter().map(|(_, vc)| *vc).min().unwrap_or(0);
        let losers: Vec<String> = tally
            .iter()
            .filter(|(_, vc)| *vc == min_count)
            .map(|(name, _)| name.clone())
            .collect();

        if losers.len() == running.len() {
            info!(
                "Round {}: no majority and all of {:?} are tied at {}",
                round_id, running, min_count
            );
            rounds.push(round);
            return Ok(IrvResult {
                rounds,
                outcome: Outcome::Tie(running),
            });
        }

        let survivors: Vec<String> = running
            .iter()
            .filter(|name| !losers.contains(name))
            .cloned()
            .collect();
        let eliminated = transfer_stats(ballots, &running, &losers, &survivors);
        for es in eliminated.iter() {
            info!(
                "Round {}: {} -> eliminated: {:?}, {} exhausted",
                round_id, es.name, es.transfers, es.exhausted
            );
        }
        round.eliminated = eliminated;
        rounds.push(round);
        running = survivors;
    }
}

/// The highest ranked running candidate of each ballot receives its weight.
/// All the running candidates appear in the tally, with zero if needed.
fn compute_tally(ballots: &[Ballot], running: &[String]) -> Vec<(String, u64)> {
    let index: HashMap<&str, usize> = running
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();
    let mut counts: Vec<u64> = vec![0; running.len()];
    for b in ballots.iter() {
        if let Some(idx) = b.ranking.iter().find_map(|c| index.get(c.as_str())) {
            counts[*idx] += b.weight;
        }
    }
    debug!("compute_tally: running: {:?} counts: {:?}", running, counts);
    running.iter().cloned().zip(counts).collect()
}

/// For every eliminated candidate, where its ballots go next: the next
/// surviving candidate on the ballot, or nowhere if the ballot is exhausted.
fn transfer_stats(
    ballots: &[Ballot],
    running: &[String],
    eliminated: &[String],
    survivors: &[String],
) -> Vec<EliminationStats> {
    let running_set: HashSet<&str> = running.iter().map(|c| c.as_str()).collect();
    let eliminated_index: HashMap<&str, usize> = eliminated
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();
    let survivor_index: HashMap<&str, usize> = survivors
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();

    let mut stats: Vec<(Vec<u64>, u64)> = vec![(vec![0; survivors.len()], 0); eliminated.len()];
    for b in ballots.iter() {
        let current = b
            .ranking
            .iter()
            .find(|c| running_set.contains(c.as_str()))
            .and_then(|c| eliminated_index.get(c.as_str()));
        if let Some(eidx) = current {
            let (transfers, exhausted) = &mut stats[*eidx];
            match b.ranking.iter().find_map(|c| survivor_index.get(c.as_str())) {
                Some(sidx) => transfers[*sidx] += b.weight,
                None => *exhausted += b.weight,
            }
        }
    }

    eliminated
        .iter()
        .zip(stats)
        .map(|(name, (transfers, exhausted))| EliminationStats {
            name: name.clone(),
            transfers: survivors
                .iter()
                .cloned()
                .zip(transfers)
                .filter(|(_, vc)| *vc > 0)
                .collect(),
            exhausted,
        })
        .collect()
}
