//! DefinitieAgent CLI
//!
//! Subcommands:
//! - `rules`     list the loaded toetsregels
//! - `validate`  score a definition text against the rule set
//! - `generate`  run the iterative generation loop for a begrip

use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use definitie_agent::agentic::OrchestratorBuilder;
use definitie_agent::config::{AppConfig, ConfigLoader};
use definitie_agent::database::{DefinitionRepository, GenerationLogRepository};
use definitie_agent::error::RepositoryError;
use toets_core::{OntologicalCategory, ValidationContext, Validator};

#[derive(Parser)]
#[command(name = "defagent", about = "Genereer en toets definities voor begrippen")]
struct Cli {
    /// Emit JSON instead of formatted output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the loaded toetsregels
    Rules,

    /// Validate a definition text without generation
    Validate {
        /// The begrip being defined
        #[arg(long)]
        term: String,
        /// The definition text to score
        #[arg(long)]
        text: String,
        /// Explicit ontological category (type, exemplaar, proces, resultaat)
        #[arg(long)]
        categorie: Option<String>,
    },

    /// Generate a definition through the iterative loop
    Generate {
        /// The begrip to define
        #[arg(long)]
        term: String,
        #[arg(long)]
        org_context: Option<String>,
        #[arg(long)]
        jur_context: Option<String>,
        /// Explicit ontological category (type, exemplaar, proces, resultaat)
        #[arg(long)]
        categorie: Option<String>,
        /// Persist the result
        #[arg(long)]
        save: bool,
        /// Bypass the duplicate warning when saving
        #[arg(long)]
        allow_duplicate: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Command::Rules => rules(&config, cli.json),
        Command::Validate {
            term,
            text,
            categorie,
        } => validate(&config, &term, &text, categorie.as_deref(), cli.json),
        Command::Generate {
            term,
            org_context,
            jur_context,
            categorie,
            save,
            allow_duplicate,
        } => {
            generate(
                &config,
                &term,
                org_context,
                jur_context,
                categorie.as_deref(),
                save,
                allow_duplicate,
                cli.json,
            )
            .await
        }
    }
}

fn rules(config: &AppConfig, json: bool) -> Result<()> {
    let store = ConfigLoader::new(&config.config_dir).load_rule_store()?;

    if json {
        println!("{}", serde_json::to_string_pretty(store.rules())?);
        return Ok(());
    }

    println!(
        "{} {} toetsregels geladen\n",
        "OK".green().bold(),
        store.len()
    );
    for rule in store.rules() {
        println!(
            "  {} [{}] {} - {}",
            rule.code.cyan().bold(),
            rule.severity,
            rule.naam.bold(),
            rule.beschrijving
        );
    }
    Ok(())
}

fn validate(
    config: &AppConfig,
    term: &str,
    text: &str,
    categorie: Option<&str>,
    json: bool,
) -> Result<()> {
    let store = ConfigLoader::new(&config.config_dir).load_rule_store()?;
    let validator = Validator::new(store)?;
    let ctx = build_context(term, None, None, categorie)?;

    let result = validator.validate(&ctx, text);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let verdict = if result.is_acceptable(
        config.iteration.acceptance_score,
        config.iteration.category_floor,
    ) {
        "GOEDGEKEURD".green().bold()
    } else {
        "AFGEKEURD".red().bold()
    };
    println!(
        "{} score {:.2} voor '{}'\n",
        verdict, result.overall_score, term
    );
    for (categorie, score) in &result.category_scores {
        println!("  {}: {:.2}", categorie, score);
    }
    if !result.violations.is_empty() {
        println!();
        for violation in &result.violations {
            println!("  {}", violation);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn generate(
    config: &AppConfig,
    term: &str,
    org_context: Option<String>,
    jur_context: Option<String>,
    categorie: Option<&str>,
    save: bool,
    allow_duplicate: bool,
    json: bool,
) -> Result<()> {
    let store = ConfigLoader::new(&config.config_dir).load_rule_store()?;

    let mut builder = OrchestratorBuilder::new()
        .with_rule_store(store)
        .with_config(config.iteration.clone());

    if save {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .with_context(|| format!("invalid DATABASE_URL '{}'", config.database_url))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        DefinitionRepository::new(pool.clone()).init_schema().await?;
        GenerationLogRepository::new(pool.clone()).init_schema().await?;
        builder = builder.with_pool(pool);
    }

    let orchestrator = builder.build()?;
    let ctx = build_context(term, org_context, jur_context, categorie)?;

    let result = if save {
        match orchestrator.generate_and_save(&ctx, allow_duplicate).await {
            Ok(result) => result,
            Err(e) => {
                if let Some(RepositoryError::DuplicateDefinition { begrip, existing_id }) =
                    e.downcast_ref::<RepositoryError>()
                {
                    eprintln!(
                        "{} er bestaat al een definitie voor '{}' in deze context ({}). \
                         Gebruik --allow-duplicate om toch op te slaan.",
                        "DUPLICAAT:".yellow().bold(),
                        begrip,
                        existing_id
                    );
                    std::process::exit(1);
                }
                return Err(e);
            }
        }
    } else {
        orchestrator.generate(&ctx).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result.report)?);
        return Ok(());
    }

    let report = &result.report;
    for trace in &report.iterations {
        println!(
            "  iteratie {}: score {:.2} ({} critical, {} high, {} medium, {} low)",
            trace.iteration,
            trace.overall_score,
            trace.critical_violations,
            trace.high_violations,
            trace.medium_violations,
            trace.low_violations
        );
    }

    let verdict = if report.accepted {
        "GOEDGEKEURD".green().bold()
    } else {
        "NIET VOLLEDIG GEVALIDEERD".yellow().bold()
    };
    println!(
        "\n{} ({:?}, score {:.2})\n",
        verdict, report.outcome, report.validation.overall_score
    );
    println!("{}", report.definitie.definitie.bold());
    if !report.definitie.voorbeelden.is_empty() {
        println!("\nVoorbeelden:");
        for voorbeeld in &report.definitie.voorbeelden {
            println!("  - {}", voorbeeld);
        }
    }
    if !report.accepted {
        println!("\nOpenstaande punten:");
        for violation in &report.validation.violations {
            println!("  {}", violation);
        }
    }
    if let Some(definition) = &result.definition {
        println!(
            "\n{} opgeslagen als {} (status {})",
            "OK".green().bold(),
            definition.id,
            definition.status
        );
    }

    Ok(())
}

fn build_context(
    term: &str,
    org_context: Option<String>,
    jur_context: Option<String>,
    categorie: Option<&str>,
) -> Result<ValidationContext> {
    let mut ctx = ValidationContext::for_begrip(term);
    if let Some(org) = org_context {
        ctx = ctx.with_organisatorische_context(org);
    }
    if let Some(jur) = jur_context {
        ctx = ctx.with_juridische_context(jur);
    }
    if let Some(raw) = categorie {
        let categorie = OntologicalCategory::from_str(raw)
            .map_err(|e| anyhow::anyhow!("invalid --categorie: {}", e))?;
        ctx = ctx.with_marker(categorie);
    }
    Ok(ctx)
}
