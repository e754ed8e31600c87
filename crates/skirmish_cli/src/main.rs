use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use skirmish_core::core_api::{CoreErrorCode, Engine, RunOptions};
use skirmish_core::faction::Faction;
use skirmish_render::{
    JsonStyle, TextRenderOptions, render_json_summary, render_text_summary_with_options,
};
use tracing_subscriber::EnvFilter;

/// Makes every ship and hero of the chosen faction instantly buildable in
/// skirmish and hands it the neutral and underworld rosters.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Working mod folder; XML lives under `<DIR>/Data/Xml`.
    #[arg(long = "mod-dir", value_name = "DIR", default_value = ".")]
    mod_dir: PathBuf,
    /// Pristine copy to restore from. Defaults to a `<mod> - copy` sibling.
    #[arg(long = "backup-dir", value_name = "DIR")]
    backup_dir: Option<PathBuf>,
    #[arg(
        long,
        value_name = "1|2|3|4|republic|cis|rebellion|rebel|empire",
        value_parser = parse_faction
    )]
    faction: Option<Faction>,
    #[arg(long = "skip-restore")]
    skip_restore: bool,
    #[arg(long = "skip-fixes")]
    skip_fixes: bool,
    #[arg(long = "skip-income-boost")]
    skip_income_boost: bool,
    #[arg(long = "skip-validation")]
    skip_validation: bool,
    /// Report every rewritten file and unit.
    #[arg(long)]
    diagnostics: bool,
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let faction = match cli.faction {
        Some(faction) => faction,
        None => prompt_faction().unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(2);
        }),
    };

    let options = RunOptions {
        mod_dir: cli.mod_dir.clone(),
        backup_dir: cli.backup_dir.clone(),
        faction,
        restore: !cli.skip_restore,
        fixes: !cli.skip_fixes,
        income_boost: !cli.skip_income_boost,
        validation: !cli.skip_validation,
        diagnostics: cli.diagnostics,
    };

    let report = Engine::new().run(&options).unwrap_or_else(|e| {
        eprintln!("Error applying skirmish god mode to {}", cli.mod_dir.display());
        eprintln!("  {e}");
        let status = if e.code == CoreErrorCode::InvalidSelection {
            2
        } else {
            1
        };
        process::exit(status);
    });

    if cli.json {
        let json = render_json_summary(&report, JsonStyle::CanonicalV1);
        let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        });
        println!("{rendered}");
        return;
    }

    let options = TextRenderOptions {
        verbose: cli.diagnostics,
    };
    print!("{}", render_text_summary_with_options(&report, options));
}

fn parse_faction(value: &str) -> Result<Faction, String> {
    value.parse::<Faction>().map_err(|e| e.message)
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Interactive faction prompt
// ---------------------------------------------------------------------------

const MAX_PROMPT_ATTEMPTS: usize = 5;

fn prompt_faction() -> Result<Faction, String> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stderr = io::stderr();

    for _ in 0..MAX_PROMPT_ATTEMPTS {
        // Prompts go to stderr so `--json` output stays parseable.
        let _ = writeln!(stderr, "Select your faction:");
        for faction in Faction::ALL {
            let profile = faction.profile();
            let _ = writeln!(stderr, "  {}. {}", faction.menu_index(), profile.display_name);
        }
        let _ = write!(stderr, "Enter 1-{}: ", Faction::ALL.len());
        let _ = stderr.flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => return Err(format!("Error reading faction selection: {e}")),
            None => return Err("No faction selected (stdin closed)".to_string()),
        };
        match line.parse::<Faction>() {
            Ok(faction) => return Ok(faction),
            Err(e) => {
                let _ = writeln!(stderr, "{}", e.message);
            }
        }
    }
    Err(format!(
        "No valid faction selected after {MAX_PROMPT_ATTEMPTS} attempts"
    ))
}
