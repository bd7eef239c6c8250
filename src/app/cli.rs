use crate::app::state::{AppState, Selection};
use crate::data::assets;
use crate::data::library::scan_images;
use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "theme-backdrop",
    about = "Pick background images whose colors suit the active theme",
    version
)]
pub struct Cli {
    /// Seed for the random pick among equally good images.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Asset directory (config, themes, state). Defaults to the OS config dir.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replace the image set with the images in a folder and pick one.
    Scan(ScanArgs),

    /// Pick an image for a theme.
    Match(MatchArgs),

    /// Print the representative color of one image.
    Profile { file: PathBuf },

    /// List available themes.
    Themes,

    /// Make a theme the default.
    #[command(name = "use-theme")]
    UseTheme { id: String },

    /// Show recent picks per theme.
    History {
        #[arg(long)]
        theme: Option<String>,
    },

    /// Forget every image and all history.
    Reset,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Folder to read; falls back to `image_dir` from the config.
    pub dir: Option<PathBuf>,

    #[arg(long)]
    pub theme: Option<String>,
}

#[derive(Debug, Args)]
pub struct MatchArgs {
    #[arg(long)]
    pub theme: Option<String>,

    /// Also print every image's score.
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run_from_env() -> Result<()> {
    run(Cli::parse())
}

pub fn run(cli: Cli) -> Result<()> {
    let root = cli.root.clone().unwrap_or_else(assets::resolve_asset_root);
    let mut app = AppState::open(&root)?;
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match cli.command {
        Commands::Scan(args) => {
            let dir = args
                .dir
                .or_else(|| app.config.image_dir.clone())
                .ok_or_else(|| anyhow!("no folder given and no image_dir configured"))?;
            let files = scan_images(&dir)?;
            let kept = app.replace_images(&files)?;
            println!("{kept} images profiled from {}", dir.display());
            if kept > 0 {
                let theme = args.theme.unwrap_or_else(|| app.config.theme.clone());
                let sel = app.select_for_theme(&theme, &mut rng)?;
                print_selection(&sel);
            }
        }
        Commands::Match(args) => {
            let theme = args.theme.unwrap_or_else(|| app.config.theme.clone());
            let sel = app.select_for_theme(&theme, &mut rng)?;
            if args.verbose {
                print_scores(&app, &theme)?;
            }
            print_selection(&sel);
        }
        Commands::Profile { file } => {
            let rgb = app.profile_file(&file)?;
            let (r, g, b) = rgb.to_u8();
            println!("{}  rgb({r}, {g}, {b})", rgb.to_hex());
        }
        Commands::Themes => {
            for t in app.themes().list() {
                let marker = if t.id == app.config.theme { "*" } else { " " };
                println!(
                    "{marker} {:<16} bg {}  accent {}  text {}",
                    t.id,
                    t.colors.background.to_hex(),
                    t.colors.accent.to_hex(),
                    t.colors.text.to_hex()
                );
            }
        }
        Commands::UseTheme { id } => {
            let theme = app.set_theme(&id)?;
            println!("theme set to {}", theme.label());
        }
        Commands::History { theme } => {
            let all = app.history().load_all()?;
            for (id, h) in all.themes() {
                if theme.as_deref().is_some_and(|t| t != id) {
                    continue;
                }
                let names: Vec<&str> = h
                    .indices()
                    .iter()
                    .filter_map(|i| app.images().get(*i).map(|(name, _)| name))
                    .collect();
                println!("{id}: {}", names.join(", "));
            }
        }
        Commands::Reset => {
            app.reset()?;
            println!("image set and history cleared");
        }
    }
    Ok(())
}

fn print_selection(sel: &Selection) {
    let note = if sel.outcome.used_fallback { " (no close hue; best overall)" } else { "" };
    println!(
        "{} -> {} [score {:.2}, pool {}]{note}",
        sel.theme.label(),
        sel.image,
        sel.outcome.score,
        sel.outcome.pool.len()
    );
}

fn print_scores(app: &AppState, theme_id: &str) -> Result<()> {
    let theme = app.themes().load(theme_id)?;
    let mut scored = app.matcher().score_all(app.images(), &theme.colors)?;
    scored.sort_by(|a, b| a.score.total_cmp(&b.score));
    for s in scored {
        let id = app.images().ids().get(s.index).map(String::as_str).unwrap_or("?");
        println!("{:>8.2}  hue {:.2}  {id}", s.score, s.hue_similarity);
    }
    Ok(())
}
