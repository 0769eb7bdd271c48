use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::CategoryFilter;
use crate::ConfigError;

/// A selectable business category and its specificity weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheTag {
    /// Category filter in `key=value` form, e.g. `leisure=fitness_centre`.
    pub tag: String,
    /// Specificity tier in `(0, 1]`; higher means a more valuable lead.
    pub weight: f64,
}

impl NicheTag {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCategoryFilter`] if `tag` does not parse.
    pub fn filter(&self) -> Result<CategoryFilter, ConfigError> {
        self.tag.parse()
    }
}

/// Weights for the composite lead score. The three component weights sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub freshness: f64,
    pub specificity: f64,
    pub completeness: f64,
    /// Specificity assigned to records matching no configured niche.
    pub default_specificity: f64,
    /// Lower bound for the specificity of a matched record.
    pub specificity_floor: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            freshness: 0.5,
            specificity: 0.3,
            completeness: 0.2,
            default_specificity: 0.5,
            specificity_floor: 0.1,
        }
    }
}

/// Contents of `config/niches.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NichesFile {
    #[serde(default)]
    pub niches: Vec<NicheTag>,
    #[serde(default)]
    pub blacklist: Vec<String>,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default = "default_probe_tlds")]
    pub probe_tlds: Vec<String>,
}

fn default_probe_tlds() -> Vec<String> {
    ["com", "net", "biz", "co"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl NichesFile {
    /// Built-in defaults, used when no niches file is present.
    #[must_use]
    pub fn builtin() -> Self {
        let niche = |tag: &str, weight: f64| NicheTag {
            tag: tag.to_string(),
            weight,
        };
        Self {
            niches: vec![
                niche("leisure=fitness_centre", 1.0),
                niche("amenity=cafe", 0.8),
                niche("shop=fitness", 0.6),
                niche("shop=hairdresser", 0.6),
                niche("shop=beauty", 0.6),
            ],
            blacklist: [
                "Starbucks",
                "McDonald's",
                "Planet Fitness",
                "Walmart",
                "Target",
                "CVS",
                "7-Eleven",
                "Walgreens",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            scoring: ScoringConfig::default(),
            probe_tlds: default_probe_tlds(),
        }
    }

    /// Parsed category filters for every configured niche, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCategoryFilter`] for an unparseable tag;
    /// cannot happen for a file returned by [`load_niches`].
    pub fn filters(&self) -> Result<Vec<CategoryFilter>, ConfigError> {
        self.niches.iter().map(NicheTag::filter).collect()
    }

    /// `(filter, weight)` pairs used as specificity tiers.
    ///
    /// # Errors
    ///
    /// See [`Self::filters`].
    pub fn specificity_tiers(&self) -> Result<Vec<(CategoryFilter, f64)>, ConfigError> {
        self.niches
            .iter()
            .map(|n| Ok((n.filter()?, n.weight)))
            .collect()
    }
}

/// Load and validate the niches configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_niches(path: &Path) -> Result<NichesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::NichesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_niches(&content)
}

/// Parse and validate niches YAML already in memory.
///
/// Blank blacklist entries are dropped and the remaining ones trimmed.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML does not parse or fails validation.
pub fn parse_niches(content: &str) -> Result<NichesFile, ConfigError> {
    let mut file: NichesFile = serde_yaml::from_str(content).map_err(ConfigError::NichesFileParse)?;

    file.blacklist = file
        .blacklist
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    validate_niches(&file)?;
    Ok(file)
}

fn validate_niches(file: &NichesFile) -> Result<(), ConfigError> {
    let mut seen_tags = HashSet::new();

    for niche in &file.niches {
        niche.filter()?;

        if !(niche.weight > 0.0 && niche.weight <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "niche '{}' has weight {}; must be in (0, 1]",
                niche.tag, niche.weight
            )));
        }

        if !seen_tags.insert(niche.tag.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate niche tag: '{}'",
                niche.tag
            )));
        }
    }

    validate_scoring(&file.scoring)?;

    if file.probe_tlds.is_empty() {
        return Err(ConfigError::Validation(
            "probe_tlds must list at least one TLD".to_string(),
        ));
    }
    for tld in &file.probe_tlds {
        if tld.is_empty() || !tld.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
            return Err(ConfigError::Validation(format!(
                "invalid probe TLD '{tld}'; use bare lowercase labels such as 'com'"
            )));
        }
    }

    Ok(())
}

fn validate_scoring(scoring: &ScoringConfig) -> Result<(), ConfigError> {
    let weights = [
        ("freshness", scoring.freshness),
        ("specificity", scoring.specificity),
        ("completeness", scoring.completeness),
    ];
    for (name, w) in weights {
        if !(0.0..=1.0).contains(&w) {
            return Err(ConfigError::Validation(format!(
                "scoring weight '{name}' is {w}; must be in [0, 1]"
            )));
        }
    }

    let sum = scoring.freshness + scoring.specificity + scoring.completeness;
    if (sum - 1.0).abs() > 1e-6 {
        return Err(ConfigError::Validation(format!(
            "scoring weights must sum to 1, got {sum}"
        )));
    }

    for (name, v) in [
        ("default_specificity", scoring.default_specificity),
        ("specificity_floor", scoring.specificity_floor),
    ] {
        if !(v > 0.0 && v <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "scoring '{name}' is {v}; must be in (0, 1]"
            )));
        }
    }

    Ok(())
}
