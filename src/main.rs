use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use gcu::binary::update_binaries;
use gcu::check::{CheckOptions, DependencyCheck, ResolvedUpgrade, check_updates};
use gcu::config::{self, Config};
use gcu::manifest;
use gcu::module::GoProxyClient;
use gcu::module::locator::locate_module;
use gcu::upgrade::package_manager::GoCommand;
use gcu::upgrade::{UpgradeOptions, upgrade};

#[derive(Parser)]
#[command(name = "gcu")]
#[command(version, about = "Check and upgrade Go module dependencies across major versions")]
struct Cli {
    /// Directory to search upward from for go.mod
    #[arg(long, global = true, default_value = ".")]
    modfile: PathBuf,

    /// Only consider stable releases
    #[arg(long, global = true, conflicts_with = "unstable")]
    stable: bool,

    /// Also consider prerelease versions
    #[arg(long, global = true)]
    unstable: bool,

    /// Only use versions already cached by the proxy
    #[arg(long, global = true)]
    cached: bool,

    /// Only upgrade within the current major version
    #[arg(long, global = true)]
    safe: bool,

    /// Do not rewrite import paths after a major upgrade
    #[arg(long, global = true)]
    no_rewrite: bool,

    /// Do not run `go mod tidy` after rewriting
    #[arg(long, global = true)]
    no_tidy: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List direct dependencies with newer versions
    List,
    /// Upgrade dependencies
    Upgrade {
        /// Upgrade every outdated dependency
        #[arg(long, conflicts_with = "modules")]
        all: bool,
        /// Module paths to upgrade
        modules: Vec<String>,
    },
    /// Find the module providing an import path
    Locate { import: String },
    /// Reinstall Go binaries at their latest version
    Binary {
        /// Use the global binary directory ($GOBIN or $GOPATH/bin)
        #[arg(long, conflicts_with = "path")]
        global: bool,
        /// Binary or directory of binaries (defaults to the current directory)
        path: Option<PathBuf>,
    },
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if self.stable {
            config.stable = true;
        }
        if self.unstable {
            config.stable = false;
        }
        config.cached |= self.cached;
        config.safe |= self.safe;
        if self.no_rewrite {
            config.rewrite = false;
        }
        if self.no_tidy {
            config.tidy = false;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = gcu::logging::init(&config::log_path())
        .inspect_err(|e| eprintln!("gcu: logging disabled: {}", e))
        .ok();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    cli.apply(&mut config);
    let proxy = GoProxyClient::new(&config.proxy_url)?;

    let modules = match cli.command {
        Command::Locate { import } => {
            let module = locate_module(&proxy, &import, config.cached).await?;
            let latest = module.max_version("", config.stable).unwrap_or_default();
            println!("{} {}", module.path, latest);
            return Ok(());
        }
        Command::Binary { global, path } => {
            let target = if global {
                gcu::config::go_bin_dir()
            } else {
                path.unwrap_or_else(|| PathBuf::from("."))
            };
            return update_all_binaries(&target).await;
        }
        Command::List => None,
        Command::Upgrade { all: true, .. } => Some(Vec::new()),
        Command::Upgrade { modules, .. } if !modules.is_empty() => Some(modules),
        Command::Upgrade { .. } => anyhow::bail!("pass --all or name the modules to upgrade"),
    };

    let manifest_path = manifest::find_manifest(&cli.modfile)?;
    let dir = manifest_path.parent().unwrap_or(Path::new("."));
    let dependencies = manifest::direct_dependencies(dir)?;
    let go = GoCommand::new(dir);

    let options = CheckOptions {
        stable: config.stable,
        cached: config.cached,
        safe: config.safe,
    };
    let checks = check_updates(&proxy, &go, dependencies, options).await;
    let upgrades = report_failures(checks);

    let Some(selected) = modules else {
        print_table(&upgrades);
        return Ok(());
    };

    let selected: Vec<_> = if selected.is_empty() {
        upgrades
    } else {
        for name in &selected {
            if !upgrades.iter().any(|u| matches_name(u, name)) {
                eprintln!("{}: no update available", name);
            }
        }
        upgrades
            .into_iter()
            .filter(|u| selected.iter().any(|name| matches_name(u, name)))
            .collect()
    };

    let upgrade_options = UpgradeOptions {
        rewrite: config.rewrite,
        tidy: config.tidy,
    };
    for resolved in &selected {
        let report = upgrade(&go, &resolved.path, &resolved.new, dir, upgrade_options).await?;
        println!(
            "{}: {} -> {} ({} files rewritten)",
            resolved.new_path(),
            resolved.old_version(),
            resolved.new,
            report.rewritten_files
        );
    }

    Ok(())
}

async fn update_all_binaries(target: &Path) -> anyhow::Result<()> {
    let go = GoCommand::new(Path::new("."));
    let updates = update_binaries(&go, target).await?;
    if updates.is_empty() {
        println!("No Go binaries found in {}", target.display());
    }

    for update in &updates {
        match &update.outcome {
            Ok(()) => println!("{}: installed latest", update.path),
            Err(e) => eprintln!("{}: {}", update.path, e),
        }
    }

    Ok(())
}

fn matches_name(upgrade: &ResolvedUpgrade, name: &str) -> bool {
    upgrade.path == name || upgrade.new_path() == name
}

/// Print failed checks to stderr and return the available upgrades
fn report_failures(checks: Vec<DependencyCheck>) -> Vec<ResolvedUpgrade> {
    checks
        .into_iter()
        .filter_map(|check| match check.outcome {
            Ok(upgrade) => upgrade,
            Err(e) => {
                eprintln!("{}: {}", check.dependency.path, e);
                None
            }
        })
        .collect()
}

fn print_table(upgrades: &[ResolvedUpgrade]) {
    if upgrades.is_empty() {
        println!("All dependencies are up to date");
        return;
    }

    let path_width = upgrades.iter().map(|u| u.path.len()).max().unwrap_or(0);
    let old_width = upgrades
        .iter()
        .map(|u| u.old_version().len())
        .max()
        .unwrap_or(0);

    for upgrade in upgrades {
        let breaking = upgrade.diff().is_some_and(|d| d.is_breaking());
        println!(
            "{:path_width$}  {:old_width$}  {}{}",
            upgrade.path,
            upgrade.old_version(),
            upgrade.new,
            if breaking { "  (major)" } else { "" },
        );
    }
}
