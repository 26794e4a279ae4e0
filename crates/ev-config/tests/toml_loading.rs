//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use ev_config::{EmbeddingProvider, EvConfig};
use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};

#[test]
fn loads_all_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[llm]
api_base = "http://localhost:11434/v1"
api_key = "sk-local"
model = "llama3"
temperature = 0.0
request_timeout_secs = 30

[embedding]
provider = "hashing"
dimensions = 256

[indexing]
chunk_size = 256
chunk_overlap = 16
top_k = 6
min_score = 0.2

[evaluation]
concurrency = 8
ambiguity_threshold = 0.6
max_attempts = 2
"#,
        )?;

        let config: EvConfig = Figment::from(Serialized::defaults(EvConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.llm.api_base, "http://localhost:11434/v1");
        assert_eq!(config.llm.model, "llama3");
        assert!(config.llm.is_configured());
        assert_eq!(config.llm.request_timeout_secs, 30);
        assert_eq!(config.embedding.provider, EmbeddingProvider::Hashing);
        assert_eq!(config.embedding.dimensions, 256);
        assert_eq!(config.indexing.chunk_size, 256);
        assert_eq!(config.indexing.chunk_overlap, 16);
        assert_eq!(config.indexing.top_k, 6);
        assert_eq!(config.evaluation.concurrency, 8);
        assert_eq!(config.evaluation.max_attempts, 2);
        // Unset fields keep their defaults.
        assert_eq!(config.evaluation.base_delay_ms, 500);
        assert!(config.validate().is_ok());
        Ok(())
    });
}

#[test]
fn explicit_file_overrides_project_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".evidentia")?;
        jail.create_file(
            ".evidentia/config.toml",
            "[indexing]\ntop_k = 3\nchunk_size = 128\n",
        )?;
        jail.create_file("override.toml", "[indexing]\ntop_k = 9\n")?;

        let config = EvConfig::load_from(std::path::Path::new("override.toml"))
            .expect("config loads");
        assert_eq!(config.indexing.top_k, 9);
        assert_eq!(config.indexing.chunk_size, 128);
        Ok(())
    });
}

#[test]
fn invalid_toml_values_fail_validation() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            "[indexing]\nchunk_size = 10\nchunk_overlap = 10\n",
        )?;

        let config: EvConfig = Figment::from(Serialized::defaults(EvConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;
        assert!(config.validate().is_err());
        Ok(())
    });
}
