use std::process;
use std::sync::Arc;

use clap::Parser;
use invbackup::cli::{Cli, Command};
use invbackup::config::Config;
use invbackup::profile::PlayerProfile;
use invbackup::util::{format_timestamp, plural};
use invbackup::{report, BackupService, Error, Selector};

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn parse_selector(text: &str) -> Selector {
    text.parse().unwrap_or_else(|e: Error| {
        eprintln!("{e}");
        process::exit(2);
    })
}

fn run(cli: Cli) -> invbackup::Result<()> {
    let config = Config::from_cli(&cli)?;
    let service = BackupService::new(Arc::new(config.open_store()?));

    match cli.command {
        Command::List(args) => {
            let records = service.list_snapshots(args.owner)?;
            report::print(&records, args.owner, args.json)?;
        }
        Command::Backup(args) => {
            let profile = PlayerProfile::load(&args.profile)?;
            let record = service.capture_snapshot(&profile)?;
            println!(
                "Backed up {}'s inventory. ID: {} ({})",
                profile.display_name(),
                record.id,
                format_timestamp(record.timestamp)
            );
        }
        Command::Restore(args) => {
            let selector = parse_selector(&args.selector);
            let mut profile = PlayerProfile::load(&args.profile)?;

            match service.restore_snapshot(&mut profile, selector)? {
                Some(record) => {
                    profile.save(&args.profile)?;
                    println!(
                        "Restored {}'s inventory. ID: {} ({})",
                        profile.display_name(),
                        record.id,
                        format_timestamp(record.timestamp)
                    );
                }
                None => {
                    eprintln!("No snapshot '{selector}' found for {}.", profile.display_name());
                    process::exit(1);
                }
            }
        }
        Command::Remove(args) => {
            let selector = parse_selector(&args.selector);

            match service.remove_snapshot(args.owner, selector)? {
                Some(record) => println!(
                    "Removed snapshot {} ({}) of {}.",
                    record.id,
                    format_timestamp(record.timestamp),
                    args.owner
                ),
                None => {
                    eprintln!("No snapshot '{selector}' found for {}.", args.owner);
                    process::exit(1);
                }
            }
        }
        Command::Purge(args) => {
            let removed = service.purge_snapshots(args.owner)?;
            println!("Purged {} of {}.", plural(removed, "snapshot"), args.owner);
        }
        Command::Suggest(args) => {
            for suggestion in service.suggest_selectors(args.owner)? {
                println!("{suggestion}");
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
