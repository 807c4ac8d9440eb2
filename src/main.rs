use clap::Parser;
use sheet_sentry::{alert, cli, config, error, fetcher, rules, watcher, workbook};

use alert::ConsoleAlert;
use cli::{Cli, Commands};
use config::Config;
use error::{Result, SheetSentryError};
use fetcher::SheetFetcher;
use rules::RuleCatalog;
use std::path::PathBuf;
use std::time::Duration;
use watcher::{RetryPolicy, Watcher};
use workbook::Workbook;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Watch {
            delay_ms,
            rules,
            max_retries,
        } => {
            println!("👀 sheet-sentry - watch\n");

            let catalog = load_catalog(rules.or(config.rules_file.clone()))?;
            let spreadsheet_id = config.get_spreadsheet_id()?;
            let cookies = config.get_cookies()?;

            let delay = Duration::from_millis(delay_ms.unwrap_or(config.requests_delay_ms));
            let retry = match max_retries {
                Some(max) => RetryPolicy::bounded(delay, max),
                None => RetryPolicy::unbounded(delay),
            };

            println!(
                "worksheet: {} | {} trigger groups | poll every {:?}",
                catalog.policy.worksheet,
                catalog.groups.len(),
                delay
            );

            let fetcher = SheetFetcher::new(&spreadsheet_id, &cookies);
            let mut sink = ConsoleAlert::new(config.sound_file.clone());
            let watcher = Watcher::new(fetcher, catalog, delay, retry).verbose(cli.verbose);

            tokio::select! {
                result = watcher.run(&mut sink) => result?,
                _ = tokio::signal::ctrl_c() => {
                    println!("\n✔ stopped");
                }
            }
        }

        Commands::Scan { file, rules, sound } => {
            println!("🔍 sheet-sentry - scan\n");

            let catalog = load_catalog(rules.or(config.rules_file.clone()))?;

            if !file.exists() {
                return Err(SheetSentryError::FileNotFound(file.display().to_string()));
            }
            let bytes = std::fs::read(&file)?;
            let workbook = Workbook::from_bytes(&bytes)?;
            let sheet = workbook.sheet(&catalog.policy.worksheet).ok_or_else(|| {
                SheetSentryError::MalformedDocument(format!(
                    "worksheet \"{}\" not found (has: {})",
                    catalog.policy.worksheet,
                    workbook.sheet_names().join(", ")
                ))
            })?;

            let mut sink = if sound {
                ConsoleAlert::new(config.sound_file.clone())
            } else {
                ConsoleAlert::notices_only()
            };
            let report = watcher::scan_sheet(sheet, &catalog, &mut sink);

            println!(
                "\n✔ {} rows scanned, {} skipped, {} matched",
                report.scanned_rows,
                report.skipped_rows,
                report.matched.len()
            );
        }

        Commands::Rules { rules } => {
            println!("📋 sheet-sentry - rules\n");

            let catalog = load_catalog(rules.or(config.rules_file.clone()))?;

            println!("worksheet:    {}", catalog.policy.worksheet);
            println!("label column: {}", catalog.policy.label_column);
            println!("skip column:  {}", catalog.policy.skip_column);
            println!("groups:");
            for (index, group) in catalog.groups.iter().enumerate() {
                let columns: Vec<String> = group
                    .columns
                    .iter()
                    .map(|(column, triggers)| format!("{}({})", column, triggers.len()))
                    .collect();
                println!("  #{}: {}", index + 1, columns.join(" AND "));
            }

            println!("\n✔ rules are valid");
        }

        Commands::Config {
            set_spreadsheet_id,
            set_cookies,
            show,
        } => {
            let mut config = config;
            let show = cli::show_config(show, &set_spreadsheet_id, &set_cookies);

            if let Some(id) = set_spreadsheet_id {
                config.set_spreadsheet_id(id)?;
                println!("✔ spreadsheet id saved");
            }

            if let Some(cookies) = set_cookies {
                config.set_cookies(cookies)?;
                println!("✔ cookies saved");
            }

            if show {
                println!("config ({}):", Config::config_path()?.display());
                println!(
                    "  spreadsheet id: {}",
                    config.spreadsheet_id.as_deref().unwrap_or("not set")
                );
                println!(
                    "  cookies:        {}",
                    if config.cookies.is_some() { "set" } else { "not set" }
                );
                println!("  poll delay:     {} ms", config.requests_delay_ms);
                println!(
                    "  sound file:     {}",
                    config
                        .sound_file
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "not set (terminal bell)".to_string())
                );
                println!(
                    "  rules file:     {}",
                    config
                        .rules_file
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "built-in".to_string())
                );
            }
        }
    }

    Ok(())
}

fn load_catalog(rules_path: Option<PathBuf>) -> Result<RuleCatalog> {
    RuleCatalog::load(rules_path.as_deref())
}
