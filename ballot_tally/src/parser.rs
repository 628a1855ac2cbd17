// Reading ballots from their text form.

use log::debug;
use snafu::prelude::*;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use crate::config::*;

// Accepted between two ranked names. The comma form is kept for older inputs.
const RANK_SEPARATORS: [char; 2] = ['>', ','];

/// Parses one line of the form `<count>: <name> > <name> > ...`.
///
/// Blank lines carry no ballot and return `None`. The line number is only used
/// to label errors.
pub fn parse_ballot_line(line: &str, lineno: usize) -> Result<Option<Ballot>, ParseError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let (count_text, ranking_text) = line
        .split_once(':')
        .context(MissingSeparatorSnafu { lineno })?;

    let count_text = count_text.trim();
    ensure!(!count_text.is_empty(), MissingCountSnafu { lineno });
    if count_text.starts_with('-') {
        let count: i64 = count_text.parse::<i64>().ok().context(InvalidCountSnafu {
            lineno,
            text: count_text,
        })?;
        return NonPositiveCountSnafu { lineno, count }.fail();
    }
    let count: u64 = count_text.parse::<u64>().ok().context(InvalidCountSnafu {
        lineno,
        text: count_text,
    })?;
    ensure!(count > 0, NonPositiveCountSnafu { lineno, count: 0i64 });

    let ranking: Vec<String> = ranking_text
        .split(&RANK_SEPARATORS[..])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    ensure!(!ranking.is_empty(), EmptyRankingSnafu { lineno });

    let mut seen: HashSet<&str> = HashSet::new();
    for name in ranking.iter() {
        ensure!(
            seen.insert(name.as_str()),
            DuplicateCandidateSnafu {
                lineno,
                name: name.as_str()
            }
        );
    }

    Ok(Some(Ballot {
        ranking,
        weight: count,
    }))
}

impl FromStr for Ballot {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Ballot, ParseError> {
        parse_ballot_line(s, 1)?.context(BlankLineSnafu { lineno: 1usize })
    }
}

/// Parses a block of ballot lines, inferring the candidates from the ballots.
///
/// All the malformed lines are reported together.
pub fn parse_ballots(text: &str) -> Result<Vec<Ballot>, TallyError> {
    parse_all(text, None)
}

/// Parses a block of ballot lines that may only rank the given candidates.
pub fn parse_ballots_declared(text: &str, candidates: &[String]) -> Result<Vec<Ballot>, TallyError> {
    parse_all(text, Some(candidates))
}

/// Parses a comma-separated list of candidate names, such as `Alice, Bob, Chen`.
pub fn parse_candidates(raw: &str) -> Result<Vec<String>, TallyError> {
    let candidates: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    ensure!(!candidates.is_empty(), NoDeclaredCandidatesSnafu);
    check_declared(&candidates)?;
    Ok(candidates)
}

/// The ballots back in text form, one line each. Parsing the output gives
/// the same ballots.
pub fn serialize_ballots(ballots: &[Ballot]) -> String {
    ballots
        .iter()
        .map(|b| format!("{}\n", b))
        .collect::<Vec<String>>()
        .concat()
}

pub(crate) fn check_declared(candidates: &[String]) -> Result<(), TallyError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for name in candidates.iter() {
        ensure!(
            seen.insert(name.as_str()),
            DuplicateDeclaredCandidateSnafu {
                name: name.as_str()
            }
        );
    }
    Ok(())
}

// Names that only differ by case or by whitespace runs map to the same key.
pub(crate) fn normalized_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

fn parse_all(text: &str, declared: Option<&[String]>) -> Result<Vec<Ballot>, TallyError> {
    let declared: Option<HashSet<&str>> =
        declared.map(|cands| cands.iter().map(|c| c.as_str()).collect());
    // First spelling of each candidate, by normalized name.
    let mut spellings: HashMap<String, String> = HashMap::new();
    let mut ballots: Vec<Ballot> = Vec::new();
    let mut errors: Vec<ParseError> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;
        let checked = parse_ballot_line(line, lineno).and_then(|ob| match ob {
            Some(ballot) => {
                check_names(&ballot, lineno, declared.as_ref(), &mut spellings).map(|_| Some(ballot))
            }
            None => Ok(None),
        });
        match checked {
            Ok(Some(ballot)) => ballots.push(ballot),
            Ok(None) => {}
            Err(e) => {
                debug!("parse_all: rejecting line {}: {}", lineno, e);
                errors.push(e);
            }
        }
    }

    if !errors.is_empty() {
        return MalformedBallotsSnafu { errors }.fail();
    }
    debug!("parse_all: parsed {} ballots", ballots.len());
    Ok(ballots)
}

fn check_names(
    ballot: &Ballot,
    lineno: usize,
    declared: Option<&HashSet<&str>>,
    spellings: &mut HashMap<String, String>,
) -> Result<(), ParseError> {
    let mut pending: HashMap<String, String> = HashMap::new();
    for name in ballot.ranking.iter() {
        if let Some(known) = declared {
            ensure!(
                known.contains(name.as_str()),
                UnknownCandidateSnafu {
                    lineno,
                    name: name.as_str()
                }
            );
        }
        let key = normalized_name(name);
        let previous = spellings.get(&key).or_else(|| pending.get(&key));
        match previous {
            Some(previous) if previous != name => {
                return InconsistentCandidateNameSnafu {
                    lineno,
                    name: name.as_str(),
                    previous: previous.as_str(),
                }
                .fail();
            }
            Some(_) => {}
            None => {
                pending.insert(key, name.clone());
            }
        }
    }
    spellings.extend(pending);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_a_simple_line() {
        let b = parse_ballot_line("10: Alice > Bob > Chen", 1).unwrap().unwrap();
        assert_eq!(b.weight, 10);
        assert_eq!(b.ranking, names(&["Alice", "Bob", "Chen"]));
    }

    #[test]
    fn keeps_internal_whitespace() {
        let b: Ballot = " 3 :  Mary Ann  >Bob ".parse().unwrap();
        assert_eq!(b.weight, 3);
        assert_eq!(b.ranking, names(&["Mary Ann", "Bob"]));
    }

    #[test]
    fn accepts_commas_between_names() {
        let b: Ballot = "2: A, B > C".parse().unwrap();
        assert_eq!(b.ranking, names(&["A", "B", "C"]));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_ballot_line("   \t ", 4), Ok(None));
        assert_eq!(
            "".parse::<Ballot>(),
            Err(ParseError::BlankLine { lineno: 1 })
        );
    }

    #[test]
    fn invalid_count() {
        let err = parse_ballot_line("abc: X > Y", 1).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidCount {
                lineno: 1,
                text: "abc".to_string()
            }
        );
        assert!(err.to_string().contains("invalid count"));
        assert!(matches!(
            parse_ballot_line("1.5: X", 2),
            Err(ParseError::InvalidCount { lineno: 2, .. })
        ));
    }

    #[test]
    fn count_errors() {
        assert_eq!(
            parse_ballot_line(": X > Y", 3),
            Err(ParseError::MissingCount { lineno: 3 })
        );
        assert_eq!(
            parse_ballot_line("0: X", 3),
            Err(ParseError::NonPositiveCount {
                lineno: 3,
                count: 0
            })
        );
        assert_eq!(
            parse_ballot_line("-4: X", 3),
            Err(ParseError::NonPositiveCount {
                lineno: 3,
                count: -4
            })
        );
    }

    #[test]
    fn counts_use_the_full_unsigned_range() {
        let b: Ballot = "18446744073709551615: A".parse().unwrap();
        assert_eq!(b.weight, u64::MAX);
        assert_eq!(
            parse_ballot_line("-0: A", 2),
            Err(ParseError::NonPositiveCount {
                lineno: 2,
                count: 0
            })
        );
        assert!(matches!(
            parse_ballot_line("18446744073709551616: A", 2),
            Err(ParseError::InvalidCount { lineno: 2, .. })
        ));
    }

    #[test]
    fn structure_errors() {
        assert_eq!(
            parse_ballot_line("10 Alice > Bob", 7),
            Err(ParseError::MissingSeparator { lineno: 7 })
        );
        assert_eq!(
            parse_ballot_line("10:  > ", 7),
            Err(ParseError::EmptyRanking { lineno: 7 })
        );
        assert_eq!(
            parse_ballot_line("10: A > B > A", 7),
            Err(ParseError::DuplicateCandidate {
                lineno: 7,
                name: "A".to_string()
            })
        );
    }

    #[test]
    fn batch_collects_all_errors() {
        let text = "10: A > B\n\nabc: A\n5: B > B\n0: A\n2: B > A\n";
        let err = parse_ballots(text).unwrap_err();
        match err {
            TallyError::MalformedBallots { errors } => {
                let lines: Vec<usize> = errors.iter().map(|e| e.lineno()).collect();
                assert_eq!(lines, vec![3, 4, 5]);
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn batch_skips_blank_lines() {
        let ballots = parse_ballots("\n10: A > B\n   \n2: B\n").unwrap();
        assert_eq!(ballots.len(), 2);
        assert_eq!(ballots[1].weight, 2);
    }

    #[test]
    fn inconsistent_spelling_is_rejected() {
        let err = parse_ballots("1: Alice > Bob\n2: alice > Bob\n3: Bob  Smith\n4: Bob Smith")
            .unwrap_err();
        let TallyError::MalformedBallots { errors } = err else {
            panic!("expected malformed ballots");
        };
        assert_eq!(
            errors,
            vec![
                ParseError::InconsistentCandidateName {
                    lineno: 2,
                    name: "alice".to_string(),
                    previous: "Alice".to_string()
                },
                ParseError::InconsistentCandidateName {
                    lineno: 4,
                    name: "Bob Smith".to_string(),
                    previous: "Bob  Smith".to_string()
                }
            ]
        );
        // Different names that only look alike within one line are caught too.
        assert!(parse_ballots("1: Bob > BOB").is_err());
    }

    #[test]
    fn declared_candidates() {
        let cands = parse_candidates("Alice, Bob ,, Chen").unwrap();
        assert_eq!(cands, names(&["Alice", "Bob", "Chen"]));
        assert!(parse_ballots_declared("3: Bob > Chen", &cands).is_ok());
        let err = parse_ballots_declared("3: Bob > Dan", &cands).unwrap_err();
        assert_eq!(
            err,
            TallyError::MalformedBallots {
                errors: vec![ParseError::UnknownCandidate {
                    lineno: 1,
                    name: "Dan".to_string()
                }]
            }
        );
    }

    #[test]
    fn declared_candidate_errors() {
        assert_eq!(
            parse_candidates(" , "),
            Err(TallyError::NoDeclaredCandidates {})
        );
        assert_eq!(
            parse_candidates("A, B, A"),
            Err(TallyError::DuplicateDeclaredCandidate {
                name: "A".to_string()
            })
        );
    }

    #[test]
    fn serialization_reads_back() {
        let text = "10: Alice > Bob > Chen\n8: Bob > Chen\n";
        let ballots = parse_ballots(text).unwrap();
        assert_eq!(serialize_ballots(&ballots), text);
        assert_eq!(parse_ballots(&serialize_ballots(&ballots)).unwrap(), ballots);
    }
}
