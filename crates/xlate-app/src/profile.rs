use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use xlate_config::Config;

/// Named profile as written by the settings page
#[derive(Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub value: Config,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileFile {
    Named(Profile),
    Bare(Config),
}

/// Profile file if given, environment defaults otherwise
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("Using environment config");
        return Ok(Config::new());
    };

    tracing::info!("Loading profile {}", path.display());
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let config = match serde_json::from_reader(reader)? {
        ProfileFile::Named(profile) => {
            tracing::info!("Profile: {}", profile.name);
            profile.value
        }
        ProfileFile::Bare(config) => config,
    };

    Ok(config)
}
