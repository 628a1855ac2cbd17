mod borda;
mod condorcet;
mod config;
mod irv;

pub mod builder;
pub mod manual;
pub mod parser;

use log::info;
use snafu::prelude::*;

pub use crate::borda::run_borda;
pub use crate::builder::{candidate_universe, Election};
pub use crate::condorcet::run_condorcet;
pub use crate::config::*;
pub use crate::irv::run_irv;
pub use crate::parser::{
    parse_ballot_line, parse_ballots, parse_ballots_declared, parse_candidates, serialize_ballots,
};

/// Runs a single method on the election.
pub fn run_method(election: &Election, method: TallyMethod) -> Result<TallyReport, TallyError> {
    match method {
        TallyMethod::Irv => run_irv(election).map(TallyReport::Irv),
        TallyMethod::Borda => run_borda(election).map(TallyReport::Borda),
        TallyMethod::Condorcet => run_condorcet(election).map(TallyReport::Condorcet),
    }
}

/// Runs all the requested methods on the election.
///
/// Either every report is returned, in the order of the request, or an error
/// is returned and no report at all.
pub fn run_tally(
    election: &Election,
    request: &TallyRequest,
) -> Result<Vec<TallyReport>, TallyError> {
    info!(
        "run_tally: {} ballots, {} candidates, methods: {:?}",
        election.ballots().len(),
        election.candidates().len(),
        request.methods
    );
    ensure!(!request.methods.is_empty(), NoMethodSelectedSnafu);
    ensure!(!election.is_empty(), EmptyElectionSnafu);
    request
        .methods
        .iter()
        .map(|m| run_method(election, *m))
        .collect()
}

/// Parses the ballot text, builds the election and runs the requested methods.
pub fn simulate(text: &str, request: &TallyRequest) -> Result<Vec<TallyReport>, TallyError> {
    let ballots = parse_ballots(text)?;
    let election = Election::new(ballots)?;
    run_tally(&election, request)
}
