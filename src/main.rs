//! omoritr-installer CLI
//!
//! Thin presentation layer over the installer core: resolve the game
//! directory, probe, plan, apply, re-probe. All decisions live in the
//! library; this binary only renders them.

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use omoritr_installer::apply::{apply, TaskContext};
use omoritr_installer::detect::{self, CompatPatch, Detection, InstallSnapshot};
use omoritr_installer::logging::{init_logger, log_error, log_info, log_warning};
use omoritr_installer::manifest::fetch_manifest;
use omoritr_installer::paths;
use omoritr_installer::planner::{build_plan, LoaderChoice};
use omoritr_installer::steam;

#[derive(Parser)]
#[command(
    name = "omoritr-installer",
    version,
    about = "Installer for the OMORI Turkish translation patch"
)]
struct Cli {
    /// Game directory; discovered through Steam when omitted
    #[arg(long, global = true)]
    game_dir: Option<PathBuf>,

    /// Package manifest URL
    #[arg(long, global = true, default_value = paths::MANIFEST_URL)]
    manifest_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe the installation and print component states
    Status,
    /// Compute and print the actions a reconcile would take
    Plan {
        /// Mod loader to reconcile towards
        #[arg(long, value_enum, default_value_t = LoaderArg::Oneloader)]
        loader: LoaderArg,
    },
    /// Reconcile the installation: download, uninstall and install as needed
    Apply {
        /// Mod loader to reconcile towards
        #[arg(long, value_enum, default_value_t = LoaderArg::Oneloader)]
        loader: LoaderArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LoaderArg {
    Gomori,
    Oneloader,
}

impl From<LoaderArg> for LoaderChoice {
    fn from(arg: LoaderArg) -> Self {
        match arg {
            LoaderArg::Gomori => LoaderChoice::Gomori,
            LoaderArg::Oneloader => LoaderChoice::OneLoader,
        }
    }
}

fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let game_dir = resolve_game_dir(cli.game_dir.clone())?;
    log_info(&format!("Using game directory {:?}", game_dir));

    match cli.command {
        Command::Status => {
            let snapshot = detect::probe(&game_dir);
            print_snapshot(&snapshot);
        }
        Command::Plan { loader } => {
            let candidates = fetch_manifest(&cli.manifest_url)?;
            let snapshot = detect::probe(&game_dir);
            print_snapshot(&snapshot);

            let plan = build_plan(&snapshot, &candidates, loader.into())
                .map_err(|e| format!("{} (nothing was changed)", e))?;
            print_plan(&plan);
        }
        Command::Apply { loader } => {
            let choice = LoaderChoice::from(loader);
            let candidates = fetch_manifest(&cli.manifest_url)?;
            let snapshot = detect::probe(&game_dir);
            print_snapshot(&snapshot);

            if choice == LoaderChoice::OneLoader && snapshot.gomori.is_present() {
                log_warning(
                    "Installing OneLoader next to GOMORI is not recommended; \
                     a clean reinstall of the game is strongly advised.",
                );
            }

            let plan = build_plan(&snapshot, &candidates, choice)
                .map_err(|e| format!("{} (nothing was changed)", e))?;
            print_plan(&plan);

            let ctx = TaskContext::new(
                |status| println!("{}", status),
                |done, total| {
                    match total {
                        Some(total) if total > 0 => {
                            print!("\r  {}% ({}/{} bytes)", done * 100 / total, done, total);
                            if done >= total {
                                println!();
                            }
                        }
                        // server did not report a total size
                        _ => print!("\r  {} bytes", done),
                    }
                    let _ = std::io::stdout().flush();
                },
            );

            if let Err(e) = apply(&plan, &game_dir, &ctx) {
                log_warning(
                    "The plan stopped partway; the installation may be partially \
                     applied. Use Steam's \"Verify integrity of game files\" if the \
                     game misbehaves.",
                );
                return Err(e.into());
            }

            // fresh probe pass is the only source of truth after mutations
            println!();
            println!("Final state:");
            print_snapshot(&detect::probe(&game_dir));
            println!("Installation completed without errors.");
        }
    }

    Ok(())
}

fn resolve_game_dir(overridden: Option<PathBuf>) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(dir) = overridden {
        if detect::is_game_dir(&dir) {
            return Ok(dir);
        }
        return Err(format!("{:?} does not look like an OMORI installation", dir).into());
    }

    let steam_path = steam::find_steam_path()
        .ok_or("Steam installation not found; pass --game-dir explicitly")?;
    steam::find_game_dir(&steam_path)
        .ok_or_else(|| "OMORI not found in any Steam library; pass --game-dir explicitly".into())
}

fn print_snapshot(snapshot: &InstallSnapshot) {
    println!("GOMORI:           {}", describe_detection(&snapshot.gomori));
    if snapshot.gomori.is_present() {
        let compat = match snapshot.gomori_compat {
            CompatPatch::Applied => "applied",
            CompatPatch::Missing => "missing",
            CompatPatch::Unknown => "unknown",
        };
        println!("  data-format fix: {}", compat);
    }
    println!("OneLoader:        {}", describe_detection(&snapshot.oneloader));
    println!("Turkish patch:    {}", describe_detection(&snapshot.translations));
}

fn describe_detection(detection: &Detection) -> String {
    match detection {
        Detection::Found {
            version: Some(version),
        } => format!("installed ({})", version),
        Detection::Found { version: None } => "installed (version unknown)".to_string(),
        Detection::NotFound => "not installed".to_string(),
        Detection::Conflicted => {
            "inconsistent: both packed and extracted forms present".to_string()
        }
    }
}

fn print_plan(plan: &omoritr_installer::planner::InstallationPlan) {
    println!();
    println!("Planned actions:");
    for (i, action) in plan.actions().iter().enumerate() {
        println!("  {}. {}", i + 1, action);
    }
    println!();
}
