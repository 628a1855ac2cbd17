use crate::sim::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "contestName", default)]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

/// The `config` block of a summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    pub candidates: Vec<String>,
    #[serde(rename = "totalBallots")]
    pub total_ballots: String,
    #[serde(rename = "ballotsDigest")]
    pub ballots_digest: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotSource {
    /// Relative to the directory of the configuration file.
    #[serde(rename = "filePath")]
    pub file_path: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "ballotSources", default)]
    pub ballot_sources: Vec<BallotSource>,
    pub candidates: Option<Vec<String>>,
    pub methods: Option<Vec<String>>,
}

impl SimConfig {
    pub fn tally_methods(&self) -> SimResult<Option<Vec<TallyMethod>>> {
        match &self.methods {
            None => Ok(None),
            Some(names) => names
                .iter()
                .map(|s| parse_method(s))
                .collect::<SimResult<Vec<TallyMethod>>>()
                .map(Some),
        }
    }
}

pub fn parse_method(s: &str) -> SimResult<TallyMethod> {
    match s.trim().to_lowercase().as_str() {
        "irv" | "instant-runoff" => Ok(TallyMethod::Irv),
        "borda" => Ok(TallyMethod::Borda),
        "condorcet" => Ok(TallyMethod::Condorcet),
        x => whatever!(
            "Unknown voting method {:?}: expected irv, borda or condorcet",
            x
        ),
    }
}

pub fn parse_config(contents: &str) -> SimResult<SimConfig> {
    serde_json::from_str(contents).context(ParsingJsonSnafu {})
}

pub fn read_config(path: &str) -> SimResult<SimConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config = parse_config(&contents)?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> SimResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config() {
        let config = parse_config(
            r#"{
              "outputSettings": {
                "contestName": "Board chair",
                "contestDate": "2022-11-08",
                "outputDirectory": "out"
              },
              "ballotSources": [{"filePath": "ballots.txt"}, {"filePath": "late.txt"}],
              "candidates": ["Alice", "Bob"],
              "methods": ["IRV", "condorcet"]
            }"#,
        )
        .unwrap();
        assert_eq!(config.output_settings.contest_name, "Board chair");
        assert_eq!(config.output_settings.contest_office, None);
        assert_eq!(config.ballot_sources.len(), 2);
        assert_eq!(config.ballot_sources[1].file_path, "late.txt");
        assert_eq!(
            config.tally_methods().unwrap(),
            Some(vec![TallyMethod::Irv, TallyMethod::Condorcet])
        );
    }

    #[test]
    fn minimal_config() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.tally_methods().unwrap(), None);
    }

    #[test]
    fn bad_config() {
        assert!(parse_config("{\"ballotSources\": 3}").is_err());
        let config = parse_config("{\"methods\": [\"approval\"]}").unwrap();
        assert!(config.tally_methods().is_err());
    }
}
