use clap::{Parser, Subcommand};
use gallery_core::config::{self, GalleryConfig};
use gallery_core::gallery::Collaborators;
use gallery_core::mime::MimeTypeRegistry;
use gallery_core::store::MemoryStore;
use gallery_core::{Gallery, logging, output};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(name = "gallery-core")]
#[command(about = "Inspect media files the way the gallery sees them")]
#[command(long_about = "\
Inspect media files the way the gallery sees them

Each command builds a throwaway in-memory gallery around the given file:

  inspect <file>            Mime type, dimensions, rotation and metadata
  mime <ext>                How an extension is classified
  render <file> --out <dir> Copy into <dir> and write the thumbnail and
                            optimized renditions next to it

Settings come from config.toml in --config-dir when present.
Run 'gallery-core gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Print JSON instead of text where supported
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show what the gallery would store for a media file
    Inspect { file: PathBuf },
    /// Look up the mime type for a file extension
    Mime { extension: String },
    /// Add a file to a gallery directory and generate its renditions
    Render {
        file: PathBuf,
        /// Gallery directory to copy the file into
        #[arg(long)]
        out: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(())
        }
        command => {
            let config = config::load_config(&cli.config_dir)?;
            logging::init(&config.logging.filter);
            debug!(config_dir = %cli.config_dir.display(), "config loaded");
            run(command, config, cli.json)
        }
    }
}

fn run(command: Command, config: GalleryConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Inspect { file } => {
            let gallery = local_gallery(config);
            let album_dir = file.parent().unwrap_or(Path::new(".")).to_path_buf();
            let album = gallery.create_root_album(&album_dir, &title_of(&album_dir), &user())?;
            let item = gallery.create_media_item(&album, &file, &user())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&output::object_json(&item))?);
            } else {
                output::print_object(&item);
            }
        }
        Command::Mime { extension } => {
            let registry = MimeTypeRegistry::new(&config.mime_types);
            let mime = registry.lookup_extension(&extension);
            if json {
                println!("{}", serde_json::to_string_pretty(mime.as_ref())?);
            } else {
                output::print_mime(&extension, &mime);
            }
        }
        Command::Render { file, out } => {
            let gallery = local_gallery(config);
            let mut album = gallery.create_root_album(&out, &title_of(&out), &user())?;
            let album_id = album.save(&gallery)?;
            let mut item = gallery.create_media_item(&gallery.get(album_id), &file, &user())?;
            item.generate_renditions(&gallery)?;
            item.save(&gallery)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&output::object_json(&item))?);
            } else {
                output::print_renditions(&item);
            }
        }
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }
    Ok(())
}

fn local_gallery(config: GalleryConfig) -> Gallery {
    let collaborators = Collaborators::local(Arc::new(MemoryStore::new()), &config);
    Gallery::new(config, collaborators)
}

fn title_of(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Gallery".to_string())
}

fn user() -> String {
    std::env::var("USER").unwrap_or_else(|_| "gallery".to_string())
}
