mod config;
mod contact;
mod dialer;
mod geo;
mod map;
mod persist;
mod router;
mod search;
mod selection;
mod store;
mod ui;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use config::Config;
use contact::{Contact, Location};
use store::ContactStore;

#[derive(Parser, Debug)]
#[command(name = "firmdex")]
struct Cli {
    /// Contact store file (overrides config and the platform default)
    #[arg(long, value_name = "PATH", global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query contacts by company name (tab-separated output)
    Query(QueryArgs),
    /// Add a contact without opening the interface
    Add(AddArgs),
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Case-insensitive substring matched against the company name
    query: String,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    company: String,

    #[arg(long)]
    manager: String,

    #[arg(long)]
    phone: String,

    #[arg(long)]
    logo: Option<String>,

    /// Latitude in degrees; requires --lng
    #[arg(long)]
    lat: Option<f64>,

    /// Longitude in degrees; requires --lat
    #[arg(long)]
    lng: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load()?;
    let store_path = resolve_store_path(cli.store, &config)?;

    if let Some(command) = cli.command {
        match command {
            Command::Query(args) => handle_query(args, &store_path)?,
            Command::Add(args) => handle_add(args, &store_path)?,
        }
        return Ok(());
    }

    println!("Loaded configuration from {}", config.config_path.display());

    let contacts = persist::load(&store_path);
    let mut app = ui::app::App::new(&config, store_path, contacts);
    app.run()?;

    Ok(())
}

fn resolve_store_path(cli_override: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    if let Some(path) = cli_override {
        return Ok(path);
    }
    if let Some(path) = &config.store_path {
        return Ok(path.clone());
    }
    persist::default_store_path()
}

fn handle_query(args: QueryArgs, store_path: &Path) -> Result<()> {
    let store = ContactStore::new(persist::load(store_path));
    let matches = store.filtered(&args.query);

    if matches.is_empty() {
        println!("No matches for \"{}\"", args.query);
        return Ok(());
    }

    println!(
        "Found {} contact(s) matching \"{}\"",
        matches.len(),
        args.query
    );
    for index in matches {
        if let Some(contact) = store.get(index) {
            println!("{}\t{}\t{}", contact.company, contact.manager, contact.phone);
        }
    }

    Ok(())
}

fn handle_add(args: AddArgs, store_path: &Path) -> Result<()> {
    let location = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) {
                anyhow::bail!("--lat must be between -90 and 90");
            }
            if !(-180.0..=180.0).contains(&lng) {
                anyhow::bail!("--lng must be between -180 and 180");
            }
            Some(Location::new(lat, lng))
        }
        (None, None) => None,
        _ => anyhow::bail!("--lat and --lng must be given together"),
    };

    for (flag, value) in [
        ("--company", &args.company),
        ("--manager", &args.manager),
        ("--phone", &args.phone),
    ] {
        if value.trim().is_empty() {
            anyhow::bail!("{flag} must not be empty");
        }
    }

    let mut contact = Contact::new(args.company.trim(), args.manager.trim(), args.phone.trim());
    if let Some(logo) = &args.logo {
        contact = contact.with_logo(logo.trim());
    }
    contact.location = location;
    let company = contact.company.clone();

    let mut contacts = persist::load(store_path);
    contacts.push(contact.defaulted());
    persist::save(store_path, &contacts)?;

    println!("Added \"{}\" ({} contacts).", company, contacts.len());
    Ok(())
}
