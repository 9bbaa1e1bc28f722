use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::models::{Company, Config};

const CONFIG_FILE: &str = "config.json";

/// `config.json` in the working directory when present, otherwise the
/// per-user config directory.
pub fn default_path() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return local;
    }
    match directories::ProjectDirs::from("", "", "jobscout") {
        Some(dirs) => dirs.config_dir().join(CONFIG_FILE),
        None => local,
    }
}

/// A missing or blank file is an empty configuration.
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_json::from_str(&content).map_err(|e| anyhow!("Invalid JSON in config file: {}", e))
}

pub fn save(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Split comma-separated input, dropping blanks.
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the keywords that were actually new.
pub fn add_universal_keywords(config: &mut Config, keywords: &[String]) -> Vec<String> {
    let mut added = Vec::new();
    for keyword in keywords {
        if !config.universal_keywords.contains(keyword) {
            config.universal_keywords.push(keyword.clone());
            added.push(keyword.clone());
        }
    }
    added
}

pub fn add_company(config: &mut Config, name: &str, url: &str, keywords: Vec<String>) -> Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow!("Company name is required"));
    }
    if url.trim().is_empty() {
        return Err(anyhow!("Job board URL is required"));
    }
    config.companies.push(Company::new(name.trim(), url.trim(), keywords));
    Ok(())
}

/// Narrow the run to one company, matched case-insensitively.
pub fn select_company(config: &mut Config, name: &str) -> Result<()> {
    let wanted = name.to_lowercase();
    let Some(company) = config.companies.iter().find(|c| c.name.to_lowercase() == wanted).cloned() else {
        let available: Vec<&str> = config.companies.iter().map(|c| c.name.as_str()).collect();
        return Err(anyhow!(
            "Company '{}' not found. Available: {}",
            name,
            if available.is_empty() { "none".to_string() } else { available.join(", ") }
        ));
    };
    config.companies = vec![company];
    Ok(())
}
