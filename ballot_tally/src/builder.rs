use log::debug;
use snafu::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::config::*;
use crate::parser::{check_declared, normalized_name, serialize_ballots};

/// All the candidates named by the ballots, in order of first appearance.
///
/// This order is the candidate order used by every tally to break ties in
/// reports, so it must stay stable for a given input.
pub fn candidate_universe(ballots: &[Ballot]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for b in ballots.iter() {
        for name in b.ranking.iter() {
            if seen.insert(name.as_str()) {
                res.push(name.clone());
            }
        }
    }
    res
}

/// A set of ballots together with the candidates they may rank.
///
/// Every candidate ranked by a ballot is part of `candidates`. The converse
/// does not hold when the candidates were declared up front.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Election {
    ballots: Vec<Ballot>,
    candidates: Vec<String>,
}

impl Election {
    /// Builds an election whose candidates are inferred from the ballots.
    pub fn new(ballots: Vec<Ballot>) -> Result<Election, TallyError> {
        for b in ballots.iter() {
            check_ballot(b)?;
        }
        let candidates = candidate_universe(&ballots);
        check_spellings(&candidates)?;
        check_weights(&ballots, candidates.len())?;
        debug!(
            "Election::new: {} ballots, candidates: {:?}",
            ballots.len(),
            candidates
        );
        Ok(Election {
            ballots,
            candidates,
        })
    }

    /// Builds an election over a declared list of candidates. The declared
    /// order is kept, and candidates without any vote still take part.
    pub fn with_candidates(
        candidates: &[String],
        ballots: Vec<Ballot>,
    ) -> Result<Election, TallyError> {
        check_declared(candidates)?;
        let known: HashSet<&str> = candidates.iter().map(|c| c.as_str()).collect();
        for b in ballots.iter() {
            check_ballot(b)?;
            for name in b.ranking.iter() {
                ensure!(
                    known.contains(name.as_str()),
                    UndeclaredCandidateSnafu {
                        name: name.as_str()
                    }
                );
            }
        }
        check_weights(&ballots, candidates.len())?;
        Ok(Election {
            ballots,
            candidates: candidates.to_vec(),
        })
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Cannot overflow: the constructors bound it.
    pub fn total_weight(&self) -> u64 {
        self.ballots.iter().map(|b| b.weight).sum()
    }

    /// An election with nothing to count.
    pub fn is_empty(&self) -> bool {
        self.ballots.is_empty() || self.candidates.is_empty()
    }

    /// SHA-256 of the candidate list and the ballots in their line form.
    /// Two runs over the same input report the same digest.
    pub fn digest(&self) -> String {
        let canonical = format!(
            "candidates: {}\n{}",
            self.candidates.join(", "),
            serialize_ballots(&self.ballots)
        );
        sha256::digest(canonical)
    }
}

// Ballots read from different sources may still disagree on a spelling.
fn check_spellings(candidates: &[String]) -> Result<(), TallyError> {
    let mut spellings: HashMap<String, &String> = HashMap::new();
    for name in candidates.iter() {
        if let Some(previous) = spellings.insert(normalized_name(name), name) {
            return InconsistentCandidatesSnafu {
                name: name.as_str(),
                previous: previous.as_str(),
            }
            .fail();
        }
    }
    Ok(())
}

// Every tally total is bounded by the total weight, and a Borda score by the
// total weight times N-1. Both must fit in a u64.
fn check_weights(ballots: &[Ballot], num_candidates: usize) -> Result<(), TallyError> {
    let total = ballots
        .iter()
        .try_fold(0u64, |acc, b| acc.checked_add(b.weight))
        .context(WeightOverflowSnafu {})?;
    let max_points = (num_candidates as u64).saturating_sub(1).max(1);
    total
        .checked_mul(max_points)
        .context(WeightOverflowSnafu {})?;
    Ok(())
}

fn check_ballot(b: &Ballot) -> Result<(), TallyError> {
    ensure!(
        b.weight > 0,
        InvalidBallotSnafu {
            reason: format!("ballot {:?} has a zero weight", b.ranking)
        }
    );
    ensure!(
        !b.ranking.is_empty(),
        InvalidBallotSnafu {
            reason: "ballot has an empty ranking"
        }
    );
    let mut seen: HashSet<&str> = HashSet::new();
    for name in b.ranking.iter() {
        ensure!(
            seen.insert(name.as_str()),
            InvalidBallotSnafu {
                reason: format!("ballot ranks {:?} more than once", name)
            }
        );
    }
    Ok(())
}

/// A builder for adding ballots one at a time.
///
/// ```
/// use ballot_tally::builder::Builder;
/// # use ballot_tally::TallyError;
///
/// let mut builder = Builder::new()
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_vote_simple(&["Anna", "Bob"])?;
/// builder.add_vote(&["Bob".to_string()], 3)?;
///
/// let election = builder.build()?;
/// assert_eq!(election.total_weight(), 4);
///
/// # Ok::<(), TallyError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _candidates: Option<Vec<String>>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Restricts the election to the given candidates, in this order.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, TallyError> {
        check_declared(cands)?;
        Ok(Builder {
            _candidates: Some(cands.to_vec()),
            _ballots: self._ballots,
        })
    }

    /// Adds a single voter's ranking.
    pub fn add_vote_simple(&mut self, ranking: &[&str]) -> Result<(), TallyError> {
        let ranking: Vec<String> = ranking.iter().map(|s| s.to_string()).collect();
        self.add_vote(&ranking, 1)
    }

    /// Adds a ranking cast by `weight` voters.
    pub fn add_vote(&mut self, ranking: &[String], weight: u64) -> Result<(), TallyError> {
        self.add_ballot(&Ballot {
            ranking: ranking.to_vec(),
            weight,
        })
    }

    pub fn add_ballot(&mut self, ballot: &Ballot) -> Result<(), TallyError> {
        check_ballot(ballot)?;
        if let Some(cands) = self._candidates.as_deref() {
            for name in ballot.ranking.iter() {
                ensure!(
                    cands.contains(name),
                    UndeclaredCandidateSnafu {
                        name: name.as_str()
                    }
                );
            }
        }
        self._ballots.push(ballot.clone());
        Ok(())
    }

    pub fn build(self) -> Result<Election, TallyError> {
        match self._candidates {
            Some(cands) => Election::with_candidates(&cands, self._ballots),
            None => Election::new(self._ballots),
        }
    }
}
