//! Native admin command line.
//!
//! Every command goes through [`DocsSite`] with a file-backed store, an
//! in-memory page built from the catalog and a virtual clock, so the same
//! code paths run here as in the browser.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::admin::DiskSink;
use crate::catalog::Catalog;
use crate::config::{ConfigError, SiteConfig};
use crate::error::DocsError;
use crate::message::{Message, Task};
use crate::model::ParameterKey;
use crate::navigation::ResolverState;
use crate::page::{PageEvent, StaticPage};
use crate::scheduler::ManualScheduler;
use crate::site::DocsSite;
use crate::store::{FileStorage, ImageDocument};
use crate::upload::{self, CompletedRead};

/// Parameter reference browser: manage per-parameter images and check
/// deep links.
#[derive(Parser, Debug)]
#[command(name = "rawteous-docs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted image record (default: user data directory)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Catalog JSON to use instead of the bundled one
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List parameters with their image counts
    List {
        /// Only this panel
        #[arg(long)]
        panel: Option<String>,
    },
    /// Show one parameter's images
    Show { key: String },
    /// Add an image by URL
    Add { key: String, url: String },
    /// Embed image files
    Upload {
        key: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove the image at INDEX
    Remove { key: String, index: usize },
    /// Merge an image document into the store
    Import { file: PathBuf },
    /// Write the whole store as an image document
    Export {
        /// Output file (default: rawteous-images.json in the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Resolve a deep-link fragment against the rendered catalog
    Resolve {
        fragment: String,
        /// Render the content only after this many milliseconds
        #[arg(long)]
        render_after_ms: Option<u64>,
    },
    /// Step a parameter's carousel and show where it lands
    Next {
        key: String,
        #[arg(short, long, default_value_t = 1)]
        steps: usize,
        /// Step backwards
        #[arg(long)]
        back: bool,
    },
    /// Inspect or write the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the effective configuration to the config file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

type NativeSite = DocsSite<FileStorage, StaticPage, ManualScheduler<Task>>;

fn load_catalog(path: Option<&PathBuf>) -> Result<Catalog, DocsError> {
    match path {
        Some(path) => {
            let json = DocsError::read_to_string(path)?;
            Catalog::from_json(&json).map_err(DocsError::Catalog)
        }
        None => Catalog::bundled().map_err(DocsError::Catalog),
    }
}

fn open_site(
    cli: &Cli,
    config: &SiteConfig,
    page: Option<StaticPage>,
) -> Result<NativeSite, DocsError> {
    let catalog = load_catalog(cli.catalog.as_ref())?;
    let storage = match &cli.data_dir {
        Some(dir) => FileStorage::new(dir),
        None => FileStorage::default_location()?,
    };
    log::debug!("Image record under {:?}", storage.dir());
    let page = page.unwrap_or_else(|| StaticPage::from_catalog(&catalog));
    Ok(DocsSite::new(
        catalog,
        config,
        storage,
        page,
        ManualScheduler::new(),
    ))
}

/// Print the notification the last action raised, if any.
fn report(site: &NativeSite) {
    if let Some(n) = site.notifier().current() {
        if n.is_error() {
            eprintln!("{}", n.message);
        } else {
            println!("{}", n.message);
        }
    }
}

fn print_card(site: &NativeSite, key: &ParameterKey) {
    let view = site.card_view(key);
    match &view.image {
        Some(image) => println!("{}  [{}]  {}", key, view.counter_label(), image.summary()),
        None => println!("{}  [no image]", key),
    }
}

/// Run one command.
pub fn run(cli: &Cli, config: &SiteConfig) -> Result<(), DocsError> {
    match &cli.command {
        Command::List { panel } => {
            let site = open_site(cli, config, None)?;
            if let Some(id) = panel.as_deref().filter(|id| site.catalog().panel(id).is_none()) {
                return Err(DocsError::unknown_key(id));
            }
            for p in site.catalog().params() {
                if panel.as_deref().is_some_and(|id| id != p.panel.id) {
                    continue;
                }
                let key = p.key();
                println!(
                    "{:<48} {:>3}  {}",
                    key.as_str(),
                    site.store().count(key.as_str()),
                    p.param.name
                );
            }
            if site.store().dormant_count() > 0 {
                println!(
                    "({} persisted keys not in this catalog)",
                    site.store().dormant_count()
                );
            }
        }
        Command::Show { key } => {
            let site = open_site(cli, config, None)?;
            let key = site.key(key)?;
            if let Some(p) = site.catalog().lookup(key.as_str()) {
                println!("{} / {} / {}", p.panel.name, p.group.name, p.param.name);
                println!("{}", p.param.desc);
            }
            for (i, entry) in site.store().get(key.as_str()).iter().enumerate() {
                println!("  {:>2}: {}", i, entry.summary());
            }
            print_card(&site, &key);
        }
        Command::Add { key, url } => {
            let mut site = open_site(cli, config, None)?;
            let key = site.key(key)?;
            site.update(Message::AddImageUrl {
                key: key.clone(),
                url: url.clone(),
            });
            report(&site);
            print_card(&site, &key);
        }
        Command::Upload { key, files } => {
            let mut site = open_site(cli, config, None)?;
            let key = site.key(key)?;
            let queue = site.admin().upload_queue();
            for path in files {
                let entry = upload::read_image_file(path)?;
                queue.push(CompletedRead {
                    key: key.clone(),
                    name: path.display().to_string(),
                    result: Ok(entry),
                });
            }
            site.update(Message::UploadsCompleted);
            report(&site);
            print_card(&site, &key);
        }
        Command::Remove { key, index } => {
            let mut site = open_site(cli, config, None)?;
            let key = site.key(key)?;
            let before = site.store().count(key.as_str());
            site.update(Message::DeleteImage {
                key: key.clone(),
                index: *index,
            });
            if site.store().count(key.as_str()) == before {
                println!("No image at index {} ({} images)", index, before);
            }
            report(&site);
        }
        Command::Import { file } => {
            let mut site = open_site(cli, config, None)?;
            let raw = DocsError::read_to_string(file)?;
            // Surface the parse error itself; the site only reports that it failed.
            let doc = ImageDocument::parse(&raw)?;
            site.update(Message::ImportDocument(raw));
            report(&site);
            println!("{} keys imported", doc.len());
        }
        Command::Export { out } => {
            let mut site = open_site(cli, config, None)?;
            let mut sink = match out {
                Some(path) => DiskSink::at_path(path),
                None => DiskSink::in_dir("."),
            };
            site.export(&mut sink)?;
            report(&site);
        }
        Command::Resolve {
            fragment,
            render_after_ms,
        } => resolve(cli, config, fragment, *render_after_ms)?,
        Command::Next { key, steps, back } => {
            let mut site = open_site(cli, config, None)?;
            let key = site.key(key)?;
            for _ in 0..*steps {
                let message = if *back {
                    Message::PrevImage(key.clone())
                } else {
                    Message::NextImage(key.clone())
                };
                site.update(message);
            }
            print_card(&site, &key);
        }
        Command::Config { action } => config_command(cli, config, action)?,
    }
    Ok(())
}

fn config_command(cli: &Cli, config: &SiteConfig, action: &ConfigAction) -> Result<(), DocsError> {
    match action {
        ConfigAction::Show => println!("{}", config.to_json().map_err(ConfigError::from)?),
        ConfigAction::Init { force } => {
            let path = cli
                .config
                .clone()
                .or_else(SiteConfig::default_path)
                .ok_or(ConfigError::NoLocation)?;
            if path.exists() && !force {
                return Err(ConfigError::AlreadyExists(path).into());
            }
            config.save_to_path(&path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn resolve(
    cli: &Cli,
    config: &SiteConfig,
    fragment: &str,
    render_after_ms: Option<u64>,
) -> Result<(), DocsError> {
    let mut page = match render_after_ms {
        Some(_) => StaticPage::unrendered(),
        None => StaticPage::from_catalog(&load_catalog(cli.catalog.as_ref())?),
    };
    page.set_fragment(Some(fragment));
    let mut site = open_site(cli, config, Some(page))?;

    site.update(Message::FragmentChanged);
    if let Some(ms) = render_after_ms {
        site.run_for(Duration::from_millis(ms));
        let catalog = site.catalog().clone();
        site.page_mut().render_content(&catalog);
    }
    site.run_until_idle();

    for event in site.page().events() {
        match event {
            PageEvent::ScrolledIntoView { id, align } => println!("scroll {} ({:?})", id, align),
            PageEvent::NavActivated { kind, target } => println!("active {:?} {}", kind, target),
            PageEvent::HighlightAdded(id) => println!("highlight {}", id),
            _ => {}
        }
    }
    match site.resolver().state() {
        ResolverState::Exhausted { target } => {
            let retries = site
                .resolver()
                .diagnostics()
                .last()
                .map(|d| {
                    eprintln!("Known sections: {}", d.known_sections.join(", "));
                    d.retries
                })
                .unwrap_or_default();
            Err(DocsError::Unresolved {
                fragment: target.clone(),
                retries,
            })
        }
        state => {
            println!("{:?} after {:?}", state, site.scheduler().now());
            Ok(())
        }
    }
}
