pub mod config;
pub mod domain;
pub mod models;
pub mod parser;
pub mod services;

use anyhow::Context;
pub use config::Config;
use domain::SpreadMode;
use models::spread::SpreadRecord;
use services::cache::SnapshotKey;
use services::{CatalogCache, TitleFilter};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "episodes" | "ep" | "e" => cmd_timeline(&config, &args[2..], SpreadMode::Episodes),

        "titles" | "t" => cmd_timeline(&config, &args[2..], SpreadMode::Standalone),

        "init" | "--init" => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Yearline - Release Timeline Builder");
    println!("Spreads titles across fractional year intervals for charting");
    println!();
    println!("USAGE:");
    println!("  yearline <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  episodes, ep      Timeline of episodes, spread within each series-year");
    println!("  titles, t         Timeline of standalone titles, one year each");
    println!("  init              Create default config file");
    println!("  help              Show this help message");
    println!();
    println!("OPTIONS:");
    println!("  --min-year <y>    Keep titles released in year y or later");
    println!("  --min-votes <n>   Keep titles with more than n votes");
    println!("  --min-rating <r>  Keep titles rated above r");
    println!("  --adult <bool>    Keep only adult (true) or non-adult (false) titles");
    println!("  --genre <s>       Keep titles whose genres contain s");
    println!("  --type <s>        Keep titles whose type contains s");
    println!("  --limit <n>       Print at most n rows");
    println!("  --json            Emit JSON instead of a table");
    println!();
    println!("EXAMPLES:");
    println!("  yearline episodes --min-votes 50000   # Episodes of well-known series");
    println!("  yearline titles --min-rating 8.0      # Highly rated standalone titles");
    println!("  yearline episodes --json              # Full records for charting");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to point at the source files and set defaults.");
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    flag_value(args, flag)
        .map(|v| v.parse().with_context(|| format!("Invalid value for {flag}: {v}")))
        .transpose()
}

fn build_filter(config: &Config, args: &[String], mode: SpreadMode) -> anyhow::Result<TitleFilter> {
    let defaults = &config.timeline;
    let type_default = if mode.is_episodes() {
        Some("tvEpisode".to_string())
    } else {
        None
    };
    Ok(TitleFilter {
        min_year: Some(parse_flag(args, "--min-year")?.unwrap_or(defaults.min_year)),
        min_votes: Some(parse_flag(args, "--min-votes")?.unwrap_or(defaults.min_votes)),
        min_rating: Some(parse_flag(args, "--min-rating")?.unwrap_or(defaults.min_rating)),
        adult: parse_flag(args, "--adult")?,
        genre_contains: flag_value(args, "--genre").map(str::to_string),
        type_contains: flag_value(args, "--type")
            .map(str::to_string)
            .or(type_default),
        mode,
    })
}

fn cmd_timeline(config: &Config, args: &[String], mode: SpreadMode) -> anyhow::Result<()> {
    let filter = build_filter(config, args, mode)?;
    let limit: Option<usize> = parse_flag(args, "--limit")?;
    let json = args.iter().any(|a| a == "--json");

    let placeholder = config
        .timeline
        .placeholder_year
        .unwrap_or_else(services::catalog::placeholder_year);

    let cache = CatalogCache::new(
        config.cache.enriched_capacity,
        config.cache.spread_capacity,
    );
    let key = SnapshotKey::capture(&config.sources, placeholder)?;
    let enriched = cache.enriched_or_build(&key, &config.sources)?;
    let spread = cache.spread_or_build(&key, &filter, &enriched)?;

    info!(total = enriched.len(), selected = spread.len(), %mode, "timeline built");

    if json {
        let rows: Vec<&SpreadRecord> = match limit {
            Some(n) => spread.iter().take(n).collect(),
            None => spread.iter().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if spread.is_empty() {
        println!("No titles matched the filter.");
        println!();
        println!("Loosen thresholds with --min-votes / --min-rating / --min-year.");
        return Ok(());
    }

    match mode {
        SpreadMode::Episodes => print_episode_table(&spread, limit),
        SpreadMode::Standalone => print_title_table(&spread, limit),
    }
    Ok(())
}

fn print_episode_table(spread: &[SpreadRecord], limit: Option<usize>) {
    println!("Episode Timeline ({} rows)", spread.len());
    println!("{:-<78}", "");

    let shown = limit.unwrap_or(spread.len());
    let mut current_show: Option<&str> = None;

    for row in spread.iter().take(shown) {
        let show = row.display_parent_title.as_deref().unwrap_or("(untitled)");
        if current_show != Some(show) {
            println!("{show}");
            current_show = Some(show);
        }

        let ordinal = match (row.record.season_number, row.record.episode_number) {
            (Some(s), Some(e)) => format!("S{s:02}E{e:02}"),
            _ => "  --  ".to_string(),
        };
        let title = row.record.primary_title.as_deref().unwrap_or("(untitled)");
        let rating = row
            .record
            .average_rating
            .map_or_else(|| "  - ".to_string(), |r| format!("{r:>4.1}"));

        println!(
            "  {:>9.4} - {:>9.4}  {}  {}  {}",
            row.interval_start, row.interval_end, ordinal, rating, title
        );
    }

    if spread.len() > shown {
        println!("  ... and {} more rows", spread.len() - shown);
    }
}

fn print_title_table(spread: &[SpreadRecord], limit: Option<usize>) {
    println!("Title Timeline ({} rows)", spread.len());
    println!("{:-<78}", "");

    // Best-rated first; the intervals already carry the chronology.
    let mut rows: Vec<&SpreadRecord> = spread.iter().collect();
    rows.sort_by(|a, b| {
        b.record
            .average_rating
            .partial_cmp(&a.record.average_rating)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let shown = limit.unwrap_or(rows.len());
    for row in rows.iter().take(shown) {
        let title = row.record.primary_title.as_deref().unwrap_or("(untitled)");
        let rating = row
            .record
            .average_rating
            .map_or_else(|| "  - ".to_string(), |r| format!("{r:>4.1}"));
        let votes = row
            .record
            .num_votes
            .map_or_else(|| "-".to_string(), |v| v.to_string());

        println!(
            "  {:>6.0}  {}  {:>9}  {}",
            row.interval_start, rating, votes, title
        );
    }

    if rows.len() > shown {
        println!("  ... and {} more rows", rows.len() - shown);
    }
}
