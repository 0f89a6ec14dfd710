//! adb CLI - Address book database backed by a single snapshot file

use addressdb::config::{self, AdbConfig};
use addressdb::ui::{self, Icons};
use addressdb::view::{self, ViewFormat};
use addressdb::{DatabaseManager, HandleState, InstanceRegistry, JobStatus, SearchCriteria};
use anyhow::Context;
use clap::{Parser, Subcommand};
use console::Term;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "adb")]
#[command(version)]
#[command(about = "Address book database - books of shared contacts in one snapshot file")]
#[command(long_about = r#"
adb keeps address books and their contacts in <root>/adb/adb.<format>.
A contact is identified by its name and address, so the same person added
to two books is stored once.

Example usage:
  adb init --format yaml
  adb create-book Friends
  adb add-contact Friends --name "John Doe" --address "123 Main St"
  adb find Friends --name "John*"
  adb show --view markdown
"#)]
struct Cli {
    /// Storage root (defaults to config, then $ADB_ROOT, then $HOME)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Serialization format: json, xml or yaml
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the storage file for the root
    Init {
        /// Also write the resolved root and format to the config file
        #[arg(long)]
        write_config: bool,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show root, format and snapshot statistics
    Status,

    /// Delete the storage file
    Deinit,

    /// List registered formats
    Formats,

    /// List address books
    List,

    /// Create an empty address book
    CreateBook {
        name: String,
    },

    /// Add a contact to a book (missing fields are prompted for)
    AddContact {
        book: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// List contacts of a book
    Contacts {
        book: String,
    },

    /// Find contacts in a book by glob patterns (all must match)
    Find {
        book: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Delete an address book (contacts stay in the database)
    DeleteBook {
        name: String,
    },

    /// Remove all contact references from a book
    ClearBook {
        name: String,
    },

    /// Render every book
    Show {
        /// text, markdown or html
        #[arg(long, default_value = "text")]
        view: String,
    },

    /// Copy the database into another format and make it active
    Migrate {
        #[arg(long)]
        to: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let file_config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let root = file_config.resolve_root(cli.root.as_deref());
    let format = file_config.resolve_format(cli.format.as_deref());
    tracing::debug!("Using root {} with format {}", root.display(), format);

    let registry = InstanceRegistry::global();

    if let Commands::Formats = cli.command {
        ui::header("Formats");
        for name in registry.codecs().supported_formats() {
            let usable = registry
                .codecs()
                .resolve(&name)
                .map(|c| c.is_available())
                .unwrap_or(false);
            let state = if usable { "available" } else { "unavailable" };
            ui::summary_row(&format!("{:<6}", name), &ui::muted(state));
        }
        return Ok(());
    }

    let db = registry
        .get_or_open(Some(&root), &format)
        .with_context(|| format!("failed to open database at {}", root.display()))?;

    match cli.command {
        Commands::Init { write_config, force } => {
            ui::success(&format!("Database ready at {}", db.storage_path()?.display()));
            if write_config {
                let path = cli.config.clone().unwrap_or_else(config::default_config_path);
                let cfg = AdbConfig {
                    root: Some(root.display().to_string()),
                    format: Some(format.clone()),
                };
                config::write_config(&path, &cfg, force)?;
                ui::info("Config", &path.display().to_string());
            }
        }

        Commands::Status => print_status(&db)?,

        Commands::Deinit => {
            let path = db.storage_path()?;
            if db.deinit()? {
                ui::success(&format!("Removed {}", path.display()));
            } else {
                ui::cancelled("Database was not initialized");
            }
        }

        Commands::Formats => {}

        Commands::List => {
            let books = db.list_books()?;
            if books.is_empty() {
                ui::cancelled("No address books");
                return Ok(());
            }
            let mut table = ui::BookTable::new();
            for book in &books {
                table.add_book(book);
            }
            println!("{}", table.build());
        }

        Commands::CreateBook { name } => report(db.create_empty_book(&name)?),

        Commands::AddContact {
            book,
            name,
            address,
            phone,
        } => {
            let term = Term::stdout();
            let name = match name {
                Some(name) => name,
                None => prompt(&term, "Name")?,
            };
            let address = match address {
                Some(address) => address,
                None => prompt(&term, "Address")?,
            };
            let phone = match phone {
                Some(phone) => Some(phone),
                None => Some(prompt(&term, "Phone number (optional)")?),
            }
            .filter(|p| !p.trim().is_empty());

            report(db.add_contact(&book, &name, &address, phone.as_deref())?);
        }

        Commands::Contacts { book } => {
            let contacts = db.list_contacts(&book)?;
            ui::book_header(&book, contacts.len());
            print_contacts(&contacts);
        }

        Commands::Find {
            book,
            name,
            address,
            phone,
        } => {
            let pairs = [("name", name), ("address", address), ("phone_no", phone)]
                .into_iter()
                .filter_map(|(field, pattern)| pattern.map(|p| (field, p)));
            let criteria = SearchCriteria::parse(pairs)?;
            let found = db.find_contacts(&book, &criteria)?;
            ui::status(Icons::SEARCH, "Matches", &found.len().to_string());
            print_contacts(&found);
        }

        Commands::DeleteBook { name } => report(db.delete_book(&name)?),

        Commands::ClearBook { name } => report(db.clear_book(&name)?),

        Commands::Show { view } => {
            let view: ViewFormat = view.parse()?;
            print!("{}", view::render(&db.schema()?, view));
        }

        Commands::Migrate { to } => {
            let codec = registry.codecs().resolve(&to)?;
            let from = db.storage_path()?;
            db.set_codec(Arc::clone(&codec))?;
            ui::success(&format!(
                "Migrated {} -> {}",
                from.display(),
                db.storage_path()?.display()
            ));
        }
    }

    Ok(())
}

fn prompt(term: &Term, label: &str) -> anyhow::Result<String> {
    term.write_str(&format!("{}: ", label))?;
    Ok(term.read_line()?)
}

fn report<T>(job: JobStatus<T>) {
    ui::outcome(job.status, &job.message);
}

fn print_contacts(contacts: &[addressdb::Contact]) {
    if contacts.is_empty() {
        return;
    }
    let mut table = ui::ContactTable::new();
    for contact in contacts {
        table.add_contact(contact);
    }
    println!("{}", table.build());
}

fn print_status(db: &DatabaseManager) -> anyhow::Result<()> {
    ui::header("Address DB");
    ui::status(Icons::HOME, "Root", &db.root().display().to_string());
    if db.state() == HandleState::Deinitialized {
        ui::warn("Database is deinitialized");
        return Ok(());
    }
    ui::status(Icons::GEAR, "Format", &db.format()?);
    ui::status(Icons::FILE, "File", &db.storage_path()?.display().to_string());

    let schema = db.schema()?;
    ui::section("Contents");
    ui::summary_row("Books:", &schema.books.len().to_string());
    ui::summary_row("Contacts:", &schema.contacts.len().to_string());
    let dangling = schema.dangling_references();
    if !dangling.is_empty() {
        ui::warn(&format!("{} dangling contact references", dangling.len()));
    }
    Ok(())
}
