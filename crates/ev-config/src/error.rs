use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be read or did not match [`crate::EvConfig`].
    #[error("failed to load configuration: {0}")]
    Figment(#[from] figment::Error),

    /// A section needed by the requested operation has no credentials.
    #[error("the [{section}] section has no api_key; set it in config.toml or EVIDENTIA_{}__API_KEY", .section.to_uppercase())]
    NotConfigured { section: String },

    /// A value passed extraction but breaks a cross-field constraint.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_configured_names_the_env_var() {
        let err = ConfigError::NotConfigured {
            section: "llm".into(),
        };
        assert!(err.to_string().contains("EVIDENTIA_LLM__API_KEY"));
    }
}
