use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cp_editorial::{
    codechef::{CodeChefEditorials, CodeChefEditorialsBuilder},
    codeforces::{CodeforcesApi, CodeforcesEditorials, CodeforcesEditorialsBuilder},
    normalize::normalize_text,
    render::{HttpRenderer, Renderer},
    report::{hint_prompt, render_text, Report},
    EditorialConfig, EditorialResult, Platform, ProblemMetadata, ProblemRef,
};
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

#[derive(Parser)]
#[command(name = "cp-editorial", about = "Fetch and clean competitive programming editorials")]
struct Cli {
    /// TOML file overriding thresholds, keywords and hosts
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Render pages in headless Chromium instead of plain HTTP
    #[arg(long, global = true)]
    browser: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a problem URL and print the reference
    Parse {
        url: String,
        /// Skip host detection
        #[arg(long)]
        platform: Option<Platform>,
    },
    /// Fetch problem metadata only
    Metadata {
        url: String,
        #[arg(long)]
        platform: Option<Platform>,
    },
    /// Find, extract and clean the editorial
    Editorial {
        url: String,
        #[arg(long)]
        platform: Option<Platform>,
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Truncate the text to this many characters (default from config)
        #[arg(long)]
        preview: Option<usize>,
        /// Print the full text
        #[arg(long, conflicts_with = "preview")]
        full: bool,
    },
    /// Print a graduated-hint prompt built from the editorial
    Prompt {
        url: String,
        #[arg(long)]
        platform: Option<Platform>,
        /// Number of hints, 3 to 5
        #[arg(short = 'n', long, default_value = "3")]
        hints: usize,
    },
    /// Normalize editorial text from a file or stdin
    Clean { file: Option<PathBuf> },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
    Html,
}

enum Pipeline {
    CodeChef(CodeChefEditorials<Box<dyn Renderer>>),
    Codeforces(CodeforcesEditorials<Box<dyn Renderer>, CodeforcesApi>),
}

impl Pipeline {
    fn new(platform: Platform, config: EditorialConfig, browser: bool) -> Result<Self> {
        let renderer = renderer(&config, browser)?;
        Ok(match platform {
            Platform::CodeChef => Self::CodeChef(
                CodeChefEditorialsBuilder::default()
                    .renderer(renderer)
                    .config(config)
                    .build()?,
            ),
            Platform::Codeforces => Self::Codeforces(
                CodeforcesEditorialsBuilder::default()
                    .renderer(renderer)
                    .api(CodeforcesApi::new(&config)?)
                    .config(config)
                    .build()?,
            ),
        })
    }

    async fn get_editorial(&self, url: &str) -> EditorialResult {
        match self {
            Self::CodeChef(p) => p.get_editorial(url).await,
            Self::Codeforces(p) => p.get_editorial(url).await,
        }
    }

    async fn metadata(&self, url: &str) -> Result<ProblemMetadata> {
        Ok(match self {
            Self::CodeChef(p) => p.metadata(url).await?,
            Self::Codeforces(p) => p.metadata(url).await?,
        })
    }
}

#[cfg(feature = "browser")]
fn renderer(config: &EditorialConfig, browser: bool) -> Result<Box<dyn Renderer>> {
    if browser {
        return Ok(Box::new(cp_editorial::render::BrowserRenderer::new(config)));
    }
    Ok(Box::new(HttpRenderer::new(config)?))
}

#[cfg(not(feature = "browser"))]
fn renderer(config: &EditorialConfig, browser: bool) -> Result<Box<dyn Renderer>> {
    if browser {
        bail!("--browser needs a build with the `browser` feature");
    }
    Ok(Box::new(HttpRenderer::new(config)?))
}

fn platform_of(url: &str, platform: Option<Platform>) -> Result<Platform> {
    match platform.or_else(|| Platform::detect(url)) {
        Some(platform) => Ok(platform),
        None => bail!("cannot tell the platform of {url}, pass --platform"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EditorialConfig::from_path(path)?,
        None => EditorialConfig::default(),
    };

    match cli.command {
        Commands::Parse { url, platform } => {
            let problem = ProblemRef::parse(platform_of(&url, platform)?, &url)?;
            println!("{}", serde_json::to_string_pretty(&problem)?);
        }
        Commands::Metadata { url, platform } => {
            let pipeline = Pipeline::new(platform_of(&url, platform)?, config, cli.browser)?;
            let metadata = pipeline.metadata(&url).await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Commands::Editorial {
            url,
            platform,
            format,
            preview,
            full,
        } => {
            let preview_chars = preview.unwrap_or(config.preview_chars);
            let pipeline = Pipeline::new(platform_of(&url, platform)?, config, cli.browser)?;
            let mut result = pipeline.get_editorial(&url).await;
            if !full {
                result = result.preview(preview_chars);
            }

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                Format::Text => print!("{}", render_text(&result)),
                Format::Html => println!("{}", Report::new(&result).generate()?),
            }
        }
        Commands::Prompt {
            url,
            platform,
            hints,
        } => {
            let pipeline = Pipeline::new(platform_of(&url, platform)?, config, cli.browser)?;
            let result = pipeline.get_editorial(&url).await;
            if let Some(error) = &result.error {
                bail!("{error}");
            }
            print!("{}", hint_prompt(&result, hints)?);
        }
        Commands::Clean { file } => {
            let raw = match file {
                Some(path) => fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut raw = String::new();
                    io::stdin().read_to_string(&mut raw)?;
                    raw
                }
            };
            println!("{}", normalize_text(&raw));
        }
    }
    Ok(())
}
