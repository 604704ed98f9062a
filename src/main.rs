use std::env;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use spdlog::{info, warn};

use postsmith::config::{read_config, Config};
use postsmith::generate::{generate_post, PostDraft};
use postsmith::logger::configure_logger;
use postsmith::post::Category;
use postsmith::registry::Upsert;
use postsmith::sync::sync_posts;

const CFG_FILE_NAME: &str = "postsmith.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile the registry with the published posts
    Sync(SyncArgs),
    /// Publish a markdown source as a post
    Post(PostArgs),
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct SyncArgs {
    /// Regenerate the listing pages even when nothing changed
    #[arg(short, long)]
    force: bool,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct PostArgs {
    /// Category to publish under
    #[arg(short, long)]
    category: CategoryArg,

    /// Title of the post
    #[arg(short, long)]
    title: String,

    /// Markdown source file
    #[arg(short, long)]
    source: PathBuf,

    /// Publication date as YYYY-MM-DD. Defaults to today
    #[arg(short, long)]
    date: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CategoryArg {
    Blog,
    Works,
}

impl From<CategoryArg> for Category {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::Blog => Category::Blog,
            CategoryArg::Works => Category::Works,
        }
    }
}

fn get_config_path() -> Option<PathBuf> {
    let exe_path = env::current_exe().unwrap();
    let exe_dir = exe_path.parent().unwrap();
    let cur_dir = env::current_dir().unwrap();

    if exe_dir.join(CFG_FILE_NAME).exists() {
        return Some(exe_dir.join(CFG_FILE_NAME));
    }

    if cur_dir.join(CFG_FILE_NAME).exists() {
        return Some(cur_dir.join(CFG_FILE_NAME));
    }

    None
}

fn open_config(cfg_path: Option<PathBuf>) -> Result<Config, String> {
    let config_path = cfg_path.unwrap_or(match get_config_path() {
        None => return Err("Could not find postsmith configuration".to_string()),
        Some(x) => x,
    });

    println!("Reading config from {}", config_path.to_str().unwrap());
    match read_config(&config_path) {
        Ok(config) => Ok(config),
        Err(e) => Err(e.to_string()),
    }
}

fn run_sync(config: &Config, args: SyncArgs) -> Result<()> {
    info!("Starting sync pass");
    let report = sync_posts(config, args.force)?;

    println!("{}", report.summary());
    for skipped in &report.skipped {
        println!("Skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    for failed in &report.failed {
        println!("Failed {}: {}", failed.id, failed.error);
    }
    if report.regenerated {
        println!("Listing pages regenerated");
    }

    Ok(())
}

fn run_post(config: &Config, args: PostArgs) -> Result<()> {
    let draft = PostDraft {
        category: args.category.into(),
        title: args.title,
        date: args.date.unwrap_or_else(|| Local::now().date_naive()),
        source_path: args.source,
    };

    let generated = generate_post(config, &draft)?;
    match generated.outcome {
        Upsert::Inserted => println!("Post created in {}", generated.post_dir.display()),
        Upsert::Updated => println!("Post replaced in {}", generated.post_dir.display()),
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match open_config(args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("Please run postsmith --help");
            return Ok(());
        }
    };

    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    match args.command {
        Command::Sync(sync_args) => run_sync(&config, sync_args),
        Command::Post(post_args) => run_post(&config, post_args),
    }
}
