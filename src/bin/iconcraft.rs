//! iconcraft — render catalog icons to PNG from the command line.
//!
//! Loads one or more catalog documents, selects an icon, applies appearance
//! settings from a profile and/or flags, and writes the composited result
//! (or a variant batch, or the whole library) into an output directory.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use iconcraft_renderer::{
    BatchReport, Catalog, Configurable, ExportedImage, FsFetcher, Library, RenderProfile, Studio,
    ThemeMode,
};
use log::{error, info, warn};

#[derive(Parser)]
#[command(
    name = "iconcraft",
    version,
    about = "Composite catalog icons into finished app-icon PNGs",
    long_about = "Composites a recolored vector icon over a rounded, gradient-lit,\n\
        grain-textured background with a gradient border and writes 1024x1024 PNGs."
)]
struct Cli {
    /// Catalog JSON file; the library is named after the file stem (repeatable)
    #[arg(short, long = "catalog", required = true)]
    catalogs: Vec<PathBuf>,

    /// Library to select icons from (defaults to the first catalog)
    #[arg(short, long)]
    library: Option<String>,

    /// Directory icon sources are resolved against (defaults to the first catalog's directory)
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Title of the icon to render (required unless --all)
    #[arg(short, long, conflicts_with = "all", required_unless_present = "all")]
    icon: Option<String>,

    /// Render profile JSON applied before any other flag
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Background color (hex)
    #[arg(long)]
    background_color: Option<String>,

    /// Where the background takes its color from
    #[arg(long, value_enum)]
    background_theme: Option<ThemeMode>,

    /// Icon color (hex); defaults to the catalog color of the icon
    #[arg(long)]
    icon_color: Option<String>,

    /// Where the icon takes its color from
    #[arg(long, value_enum)]
    icon_theme: Option<ThemeMode>,

    /// Corner radius in pixels (0-512)
    #[arg(long)]
    radius: Option<f32>,

    /// Icon size as a percentage of the canvas (0-100)
    #[arg(long)]
    scale: Option<f32>,

    /// Background grain amount
    #[arg(long)]
    background_grain: Option<f32>,

    /// Icon grain amount
    #[arg(long)]
    icon_grain: Option<f32>,

    /// Border width in pixels
    #[arg(long)]
    border: Option<f32>,

    /// Disable the corner gradient lighting
    #[arg(long)]
    no_gradient: bool,

    /// Disable the translucent border undercoat
    #[arg(long)]
    no_undercoat: bool,

    /// Export the six light/dark/color variants of the icon
    #[arg(long, requires = "icon")]
    variants: bool,

    /// Export every icon of the library in its catalog color
    #[arg(long)]
    all: bool,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn load_catalog(paths: &[PathBuf], active: Option<&str>) -> Result<Catalog, Box<dyn Error>> {
    let mut catalog = Catalog::new();
    for path in paths {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| format!("catalog path has no file name: {}", path.display()))?;
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        catalog.add_library(Library::from_json(name, &json)?);
    }
    if let Some(name) = active {
        catalog.set_active(name)?;
    }
    Ok(catalog)
}

fn apply_overrides(cli: &Cli, studio: &mut Studio<FsFetcher>) -> Result<(), Box<dyn Error>> {
    if let Some(color) = &cli.background_color {
        studio.set_background_color(color)?;
    }
    if let Some(mode) = cli.background_theme {
        studio.set_background_theme(mode);
    }
    if let Some(color) = &cli.icon_color {
        studio.set_icon_color(color)?;
    }
    if let Some(mode) = cli.icon_theme {
        studio.set_icon_theme(mode);
    }
    studio.update(|p| {
        if let Some(radius) = cli.radius {
            p.set_corner_radius(radius);
        }
        if let Some(scale) = cli.scale {
            p.set_icon_scale_percent(scale);
        }
        if let Some(amount) = cli.background_grain {
            p.set_background_grain(amount);
        }
        if let Some(amount) = cli.icon_grain {
            p.set_icon_grain(amount);
        }
        if let Some(width) = cli.border {
            p.set_border_width(width);
        }
    });

    if cli.no_gradient || cli.no_undercoat {
        let mut options = studio.options().clone();
        options.gradient_enabled &= !cli.no_gradient;
        options.border_undercoat &= !cli.no_undercoat;
        studio.set_options(options);
    }
    Ok(())
}

async fn save_all(images: &[ExportedImage], out: &Path) -> usize {
    let mut saved = 0;
    for image in images {
        match image.save(out).await {
            Ok(path) => {
                info!("wrote {}", path.display());
                println!("{}", path.display());
                saved += 1;
            }
            Err(e) => error!("{}: {e}", image.filename),
        }
    }
    saved
}

fn report_failures(report: &BatchReport) {
    for failure in &report.failures {
        warn!("skipped {}: {}", failure.item, failure.error);
    }
}

async fn run(cli: Cli) -> Result<usize, Box<dyn Error>> {
    let catalog = load_catalog(&cli.catalogs, cli.library.as_deref())?;
    let assets = match &cli.assets {
        Some(dir) => dir.clone(),
        None => cli.catalogs[0]
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let mut studio = Studio::new(catalog, FsFetcher::new(assets));

    if let Some(path) = &cli.profile {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        studio.apply_profile(&RenderProfile::from_json(&json)?)?;
    }

    if let Some(title) = &cli.icon {
        studio.select_icon(title).await?;
    }
    apply_overrides(&cli, &mut studio)?;

    tokio::fs::create_dir_all(&cli.out).await?;

    let images = if cli.all {
        let report = studio.export_library().await?;
        report_failures(&report);
        report.exported
    } else if cli.variants {
        let report = studio.export_variants()?;
        report_failures(&report);
        report.exported
    } else {
        vec![studio.export_current()?]
    };

    Ok(save_all(&images, &cli.out).await)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .format_timestamp(None)
        .init();

    match run(cli).await {
        Ok(0) => {
            error!("nothing was exported");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
