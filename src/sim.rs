use log::{debug, info, warn};

use ballot_tally::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::sim::config_reader::*;
use crate::sim::io_text::*;

pub mod config_reader;
pub mod io_text;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SimError {
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}: {source}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error in ballot file {path}: {source}"))]
    BallotFile { source: TallyError, path: String },
    #[snafu(display("{source}"))]
    Tally { source: TallyError },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("No ballots to read: pass --input or list ballotSources in --config"))]
    NoBallotSource {},
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SimResult<T> = Result<T, SimError>;

/// Everything a run needs, once the configuration file and the command line
/// have been merged.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SimRequest {
    pub output_settings: OutputSettings,
    pub ballot_paths: Vec<String>,
    pub candidates: Option<Vec<String>>,
    pub methods: Vec<TallyMethod>,
    /// A file path. `None` or `stdout` writes to the standard output.
    pub out: Option<String>,
    pub reference: Option<String>,
}

/// Merges the configuration file (if any) with the command line. The command
/// line takes precedence.
pub fn build_request(args: &Args) -> SimResult<SimRequest> {
    let config = match &args.config {
        Some(path) => Some((path.as_str(), read_config(path)?)),
        None => None,
    };

    let mut output_settings = OutputSettings::default();
    let mut ballot_paths: Vec<String> = Vec::new();
    let mut candidates: Option<Vec<String>> = None;
    let mut methods: Option<Vec<TallyMethod>> = None;
    let mut out: Option<String> = None;

    if let Some((path, config)) = config {
        let root_p = Path::new(path).parent().context(MissingParentDirSnafu {})?;
        for source in config.ballot_sources.iter() {
            let p: PathBuf = root_p.join(&source.file_path);
            ballot_paths.push(p.display().to_string());
        }
        methods = config.tally_methods()?;
        candidates = config.candidates.clone();
        if let Some(dir) = &config.output_settings.output_directory {
            let p: PathBuf = root_p.join(dir).join("summary.json");
            out = Some(p.display().to_string());
        }
        output_settings = config.output_settings;
    }

    if let Some(input) = &args.input {
        ballot_paths = vec![input.clone()];
        if output_settings.contest_name.is_empty() {
            output_settings.contest_name = simplify_file_name(input);
        }
    }
    if let Some(raw) = &args.candidates {
        candidates = Some(parse_candidates(raw).context(TallySnafu {})?);
    }
    if !args.method.is_empty() {
        methods = Some(
            args.method
                .iter()
                .map(|s| parse_method(s))
                .collect::<SimResult<Vec<TallyMethod>>>()?,
        );
    }
    if args.out.is_some() {
        out = args.out.clone();
    }

    Ok(SimRequest {
        output_settings,
        ballot_paths,
        candidates,
        methods: methods.unwrap_or_else(|| TallyMethod::ALL.to_vec()),
        out,
        reference: args.reference.clone(),
    })
}

fn outcome_to_json(outcome: &Outcome) -> JSValue {
    match outcome {
        Outcome::Winner(name) => json!({ "winner": name }),
        Outcome::Tie(names) => json!({ "tie": names }),
    }
}

fn counts_to_json(counts: &[(String, u64)]) -> JSMap<String, JSValue> {
    let mut res: JSMap<String, JSValue> = JSMap::new();
    for (name, count) in counts.iter() {
        res.insert(name.clone(), json!(count.to_string()));
    }
    res
}

fn irv_to_json(rs: &IrvResult) -> JSValue {
    let mut rounds: Vec<JSValue> = Vec::new();
    for round_stat in rs.rounds.iter() {
        let mut tally_results: Vec<JSValue> = Vec::new();
        for elim_stats in round_stat.eliminated.iter() {
            let mut transfers = counts_to_json(&elim_stats.transfers);
            if elim_stats.exhausted > 0 {
                transfers.insert(
                    "exhausted".to_string(),
                    json!(elim_stats.exhausted.to_string()),
                );
            }
            tally_results.push(json!({
                "eliminated": elim_stats.name,
                "transfers": transfers
            }));
        }
        if let Some(winner_name) = &round_stat.elected {
            tally_results.push(json!({
                "elected": winner_name,
                "transfers": {}
            }));
        }
        rounds.push(json!({
            "round": round_stat.round,
            "tally": counts_to_json(&round_stat.tally),
            "counted": round_stat.counted.to_string(),
            "exhausted": round_stat.exhausted.to_string(),
            "threshold": round_stat.threshold.to_string(),
            "tallyResults": tally_results
        }));
    }
    json!({ "outcome": outcome_to_json(&rs.outcome), "rounds": rounds })
}

fn borda_to_json(rs: &BordaResult) -> JSValue {
    let ranking: Vec<JSValue> = rs
        .ranking()
        .iter()
        .map(|(name, score)| json!({ "name": name, "score": score.to_string() }))
        .collect();
    json!({ "outcome": outcome_to_json(&rs.outcome), "ranking": ranking })
}

fn pair_outcome_name(outcome: PairOutcome) -> &'static str {
    match outcome {
        PairOutcome::Win => "win",
        PairOutcome::Loss => "loss",
        PairOutcome::Tie => "tie",
    }
}

fn condorcet_to_json(rs: &CondorcetResult) -> JSValue {
    let contests: Vec<JSValue> = rs
        .contests
        .iter()
        .map(|c| {
            json!({
                "first": c.first,
                "second": c.second,
                "firstOverSecond": c.first_over_second.to_string(),
                "secondOverFirst": c.second_over_first.to_string(),
                "abstained": c.abstained.to_string(),
                "outcome": pair_outcome_name(c.outcome)
            })
        })
        .collect();
    let mut victories: JSMap<String, JSValue> = JSMap::new();
    for (name, count) in rs.victories.iter() {
        victories.insert(name.clone(), json!(count.to_string()));
    }
    json!({
        "winner": rs.winner,
        "victories": victories,
        "contests": contests
    })
}

fn report_to_json(report: &TallyReport) -> JSValue {
    match report {
        TallyReport::Irv(rs) => irv_to_json(rs),
        TallyReport::Borda(rs) => borda_to_json(rs),
        TallyReport::Condorcet(rs) => condorcet_to_json(rs),
    }
}

pub fn build_summary_js(
    settings: &OutputSettings,
    election: &Election,
    reports: &[TallyReport],
) -> JSValue {
    let c = OutputConfig {
        contest: settings.contest_name.clone(),
        date: settings.contest_date.clone(),
        jurisdiction: settings.contest_jurisdiction.clone(),
        office: settings.contest_office.clone(),
        candidates: election.candidates().to_vec(),
        total_ballots: election.total_weight().to_string(),
        ballots_digest: election.digest(),
    };
    let mut results: JSMap<String, JSValue> = JSMap::new();
    for report in reports.iter() {
        results.insert(report.method().name().to_string(), report_to_json(report));
    }
    json!({
        "config": c,
        "results": results })
}

fn write_summary(out: Option<&str>, pretty_js: &str) -> SimResult<()> {
    match out {
        None | Some("stdout") => {
            println!("{}", pretty_js);
        }
        Some(path) => {
            if let Some(dir) = Path::new(path).parent() {
                if !dir.as_os_str().is_empty() {
                    fs::create_dir_all(dir).context(WritingFileSnafu { path })?;
                }
            }
            fs::write(path, pretty_js).context(WritingFileSnafu { path })?;
            info!("Summary written to {:?}", path);
        }
    }
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> SimResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("reference summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return ReferenceMismatchSnafu {}.fail();
    }
    Ok(())
}

/// Runs a simulation and returns the JSON summary.
pub fn simulate_request(request: &SimRequest) -> SimResult<JSValue> {
    let election = read_election(&request.ballot_paths, request.candidates.as_deref())?;
    info!(
        "Election: {} ballots, total weight {}, candidates {:?}",
        election.ballots().len(),
        election.total_weight(),
        election.candidates()
    );
    let tally_request = TallyRequest {
        methods: request.methods.clone(),
    };
    let reports = run_tally(&election, &tally_request).context(TallySnafu {})?;
    for report in reports.iter() {
        info!("{} result: {:?}", report.method().name(), report);
    }
    Ok(build_summary_js(
        &request.output_settings,
        &election,
        &reports,
    ))
}

pub fn run_election(args: &Args) -> SimResult<()> {
    let request = build_request(args)?;
    info!("request: {:?}", request);
    let summary = simulate_request(&request)?;
    let pretty_js_stats = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;
    write_summary(request.out.as_deref(), &pretty_js_stats)?;

    // The reference summary, if provided for comparison
    if let Some(reference) = &request.reference {
        check_reference(reference, &pretty_js_stats)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BALLOTS: &str = "10: Alice > Bob > Chen\n8: Bob > Chen > Alice\n7: Chen > Bob > Alice\n";

    // A fresh directory under the system temp dir.
    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ballotsim_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn path_str(p: &Path) -> String {
        p.display().to_string()
    }

    #[test]
    fn request_from_args_only() {
        let args = Args {
            input: Some("/data/board_2022.txt".to_string()),
            method: vec!["borda".to_string()],
            candidates: Some("Alice, Bob".to_string()),
            ..Args::default()
        };
        let request = build_request(&args).unwrap();
        assert_eq!(request.ballot_paths, vec!["/data/board_2022.txt"]);
        assert_eq!(request.output_settings.contest_name, "board_2022");
        assert_eq!(request.methods, vec![TallyMethod::Borda]);
        assert_eq!(
            request.candidates,
            Some(vec!["Alice".to_string(), "Bob".to_string()])
        );
        assert_eq!(request.out, None);
    }

    #[test]
    fn default_request_runs_all_methods() {
        let request = build_request(&Args::default()).unwrap();
        assert_eq!(request.methods, TallyMethod::ALL.to_vec());
        assert!(request.ballot_paths.is_empty());
    }

    #[test]
    fn unknown_method() {
        let args = Args {
            method: vec!["approval".to_string()],
            ..Args::default()
        };
        let err = build_request(&args).unwrap_err();
        assert!(err.to_string().contains("approval"));
    }

    #[test]
    fn config_file_and_overrides() {
        let dir = test_dir("config");
        fs::write(dir.join("ballots.txt"), BALLOTS).unwrap();
        let config_p = dir.join("config.json");
        fs::write(
            &config_p,
            r#"{
              "outputSettings": {"contestName": "Board chair", "outputDirectory": "output"},
              "ballotSources": [{"filePath": "ballots.txt"}],
              "methods": ["irv"]
            }"#,
        )
        .unwrap();

        let args = Args {
            config: Some(path_str(&config_p)),
            ..Args::default()
        };
        let request = build_request(&args).unwrap();
        assert_eq!(request.ballot_paths, vec![path_str(&dir.join("ballots.txt"))]);
        assert_eq!(request.methods, vec![TallyMethod::Irv]);
        assert_eq!(
            request.out,
            Some(path_str(&dir.join("output").join("summary.json")))
        );

        let args = Args {
            config: Some(path_str(&config_p)),
            out: Some("stdout".to_string()),
            method: vec!["condorcet".to_string()],
            ..Args::default()
        };
        let request = build_request(&args).unwrap();
        assert_eq!(request.methods, vec![TallyMethod::Condorcet]);
        assert_eq!(request.out.as_deref(), Some("stdout"));
    }

    #[test]
    fn summary_of_three_way_race() {
        let dir = test_dir("summary");
        let input = dir.join("ballots.txt");
        fs::write(&input, BALLOTS).unwrap();
        let args = Args {
            input: Some(path_str(&input)),
            ..Args::default()
        };
        let js = simulate_request(&build_request(&args).unwrap()).unwrap();

        assert_eq!(js["config"]["contest"], json!("ballots"));
        assert_eq!(js["config"]["totalBallots"], json!("25"));
        assert_eq!(js["config"]["candidates"], json!(["Alice", "Bob", "Chen"]));

        let irv = &js["results"]["irv"];
        assert_eq!(irv["outcome"], json!({ "winner": "Bob" }));
        assert_eq!(irv["rounds"][0]["tally"]["Chen"], json!("7"));
        assert_eq!(irv["rounds"][0]["threshold"], json!("13"));
        assert_eq!(
            irv["rounds"][0]["tallyResults"][0],
            json!({ "eliminated": "Chen", "transfers": { "Bob": "7" } })
        );
        assert_eq!(
            irv["rounds"][1]["tallyResults"][0],
            json!({ "elected": "Bob", "transfers": {} })
        );

        let borda = &js["results"]["borda"];
        assert_eq!(borda["outcome"], json!({ "winner": "Bob" }));
        assert_eq!(borda["ranking"][0], json!({ "name": "Bob", "score": "33" }));

        let condorcet = &js["results"]["condorcet"];
        assert_eq!(condorcet["winner"], json!("Bob"));
        assert_eq!(condorcet["victories"]["Bob"], json!("2"));
        assert_eq!(
            condorcet["contests"][0],
            json!({
                "first": "Alice",
                "second": "Bob",
                "firstOverSecond": "10",
                "secondOverFirst": "15",
                "abstained": "0",
                "outcome": "loss"
            })
        );
    }

    #[test]
    fn writes_and_checks_reference() {
        let dir = test_dir("reference");
        let input = dir.join("ballots.txt");
        fs::write(&input, BALLOTS).unwrap();
        let out = dir.join("out").join("summary.json");
        let args = Args {
            input: Some(path_str(&input)),
            out: Some(path_str(&out)),
            ..Args::default()
        };
        run_election(&args).unwrap();
        assert!(out.exists());

        // The summary just written is a valid reference for the same input.
        let args = Args {
            reference: Some(path_str(&out)),
            out: Some(path_str(&dir.join("second.json"))),
            ..args
        };
        run_election(&args).unwrap();

        let other = dir.join("other.txt");
        fs::write(&other, "3: Alice\n").unwrap();
        let args = Args {
            input: Some(path_str(&other)),
            ..args
        };
        assert!(matches!(
            run_election(&args),
            Err(SimError::ReferenceMismatch {})
        ));
    }

    #[test]
    fn malformed_ballot_file() {
        let dir = test_dir("malformed");
        let input = dir.join("ballots.txt");
        fs::write(&input, "10: Alice > Bob\nten: Bob\n").unwrap();
        let args = Args {
            input: Some(path_str(&input)),
            ..Args::default()
        };
        let err = run_election(&args).unwrap_err();
        match &err {
            SimError::BallotFile {
                source: TallyError::MalformedBallots { errors },
                ..
            } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].lineno(), 2);
            }
            e => panic!("unexpected error {:?}", e),
        }
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn empty_ballot_file() {
        let dir = test_dir("empty");
        let input = dir.join("ballots.txt");
        fs::write(&input, "\n\n").unwrap();
        let args = Args {
            input: Some(path_str(&input)),
            ..Args::default()
        };
        assert!(matches!(
            run_election(&args),
            Err(SimError::Tally {
                source: TallyError::EmptyElection {}
            })
        ));
    }
}
