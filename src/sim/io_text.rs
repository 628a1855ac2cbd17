use crate::sim::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Reads one file of ballot lines. Errors carry the path of the file.
pub fn read_ballot_file(path: &str, candidates: Option<&[String]>) -> SimResult<Vec<Ballot>> {
    info!("Attempting to read ballot file {:?}", path);
    let text = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let ballots = match candidates {
        Some(cands) => parse_ballots_declared(&text, cands),
        None => parse_ballots(&text),
    }
    .context(BallotFileSnafu { path })?;
    debug!("read_ballot_file: {} ballots in {:?}", ballots.len(), path);
    Ok(ballots)
}

/// Reads all the ballot files, in order, into a single election.
pub fn read_election(paths: &[String], candidates: Option<&[String]>) -> SimResult<Election> {
    ensure!(!paths.is_empty(), NoBallotSourceSnafu {});
    let mut ballots: Vec<Ballot> = Vec::new();
    for path in paths.iter() {
        let mut file_ballots = read_ballot_file(path, candidates)?;
        ballots.append(&mut file_ballots);
    }
    match candidates {
        Some(cands) => Election::with_candidates(cands, ballots),
        None => Election::new(ballots),
    }
    .context(TallySnafu {})
}
