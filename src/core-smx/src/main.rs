use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use core_smx::{
    AuthSettings, ExpandedSource, HttpFetcher, SitemapTask, StaticLanguages, TaskConfig, TracingSink, auth_header,
    expand, parse_endpoint_declarations, rehydrate, setup_logging,
};

#[derive(Parser)]
#[command(name = "sitemap-index")]
#[command(about = "Generates a sitemap index from paginated content endpoints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Task configuration file (JSON). The generated index path is saved back into it.
    #[arg(short, long, env = "SMX_CONFIG", value_parser = validate_config_file)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick an index file path if none is configured and print it.
    Init,

    /// Fetch every source and publish the sitemap index.
    Run {
        /// Per-request timeout for content endpoints, in seconds.
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
    },

    /// Print the sources a run would paginate.
    Expand,

    /// Print the Authorization header a run would send.
    AuthHeader,
}

fn validate_config_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: {}", path.display()));
    }

    if !path.is_file() {
        return Err(format!("Configuration path is not a file: {}", path.display()));
    }

    Ok(path)
}

/// Loads the configuration, generating and persisting the index path on first use.
fn load_initialized(path: &Path) -> anyhow::Result<TaskConfig> {
    let mut config = TaskConfig::load(path).with_context(|| format!("loading {}", path.display()))?;
    if config.ensure_index_file_path() {
        config
            .save(path)
            .with_context(|| format!("saving generated index path to {}", path.display()))?;
    }
    Ok(config)
}

/// Sources a run would paginate. Read-only: the configuration file is never rewritten.
fn expanded_sources(path: &Path) -> anyhow::Result<Vec<ExpandedSource>> {
    let config = TaskConfig::load(path).with_context(|| format!("loading {}", path.display()))?;
    let sources = parse_endpoint_declarations(&config.endpoints)?;
    let language_ids: Vec<u32> = config.languages.iter().map(|l| l.id).collect();
    Ok(expand(&sources, config.render_all_languages, &language_ids))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    setup_logging("core_smx=info,sitemap_index=info");

    let cli = Cli::parse();
    let auth = AuthSettings::from_env();

    match cli.command {
        Commands::Init => {
            let config = load_initialized(&cli.config)?;
            println!("{}", config.index_file_path.unwrap_or_default());
        }

        Commands::Run { timeout_secs } => {
            let config = load_initialized(&cli.config)?;
            let state = rehydrate(&config, &auth)?;
            let fetcher = HttpFetcher::with_timeout(Duration::from_secs(timeout_secs))?;
            let languages = StaticLanguages(config.languages.clone());
            let sink = TracingSink;

            let task = SitemapTask::new(&config, state, &fetcher, &sink, &languages);
            let report = task.run().await.context("sitemap run failed")?;

            println!("{} ({} sitemap file(s))", report.index_url, report.entries());
        }

        Commands::Expand => {
            for source in expanded_sources(&cli.config)? {
                let language = source.language_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}", source.key.index_token(), language, source.url);
            }
        }

        Commands::AuthHeader => match auth_header(&auth)? {
            Some(header) => println!("Authorization: {}", header.as_str()),
            None => println!("none"),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_leaves_uninitialized_config_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.json");
        let mut config = TaskConfig::new("https://example.com/?eID=sitemap&sitemap=pages&L=1", dir.path());
        config.render_all_languages = true;
        config.languages = vec![
            core_smx::Language { id: 0, title: String::new() },
            core_smx::Language { id: 1, title: String::new() },
        ];
        config.save(&path).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let sources = expanded_sources(&path).unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[1].url, "https://example.com/?eID=sitemap&sitemap=pages&L=1");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert_eq!(TaskConfig::load(&path).unwrap().index_file_path, None);
    }
}
