use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read niches file {path}: {source}")]
    NichesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse niches file: {0}")]
    NichesFileParse(#[source] serde_yaml::Error),

    #[error("invalid category filter \"{input}\": {reason}")]
    InvalidCategoryFilter { input: String, reason: String },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
