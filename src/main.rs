use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{info, warn};
use simplelog::{LevelFilter, SimpleLogger};
use std::path::PathBuf;
use ies_cookie_gen::*;
use ies_cookie_gen::types::CookieSettingsFile;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input IES (LM-63) photometric file
    #[arg(short, long)]
    input: PathBuf,

    /// Output path for the cookie texture. Defaults to {input}_cookie.vtf if not set
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with cookie settings. Flags given on the command line win
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Cone angle in degrees, exclusive range (0, 180)
    #[arg(long)]
    cone_angle: Option<f32>,

    /// Texture width and height in pixels, 3 to 65535
    #[arg(long)]
    resolution: Option<usize>,

    /// Apply inverse-square attenuation correction
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    attenuation: Option<bool>,

    /// Projection to use. Defaults to the file's own photometric type
    #[arg(long, value_enum)]
    projection: Option<ProjectionArg>,

    /// Intensity that maps to full brightness
    #[arg(long, value_enum)]
    normalize: Option<NormalizeArg>,

    /// Also write a float EXR copy next to the VTF
    #[arg(long, default_value_t = false)]
    exr: bool,

    /// Generates the cookie and dumps logs, but doesn't write any files to disk
    #[arg(long, default_value_t = false)]
    draft_run: bool,

    /// Verbose info for debugging
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Dump the parsed photometric table to the console as JSON
    #[arg(long, default_value_t = false)]
    dump_data: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ProjectionArg {
    A,
    B,
    C,
}

impl From<ProjectionArg> for PhotometricType {
    fn from(arg: ProjectionArg) -> Self {
        match arg {
            ProjectionArg::A => PhotometricType::TypeA,
            ProjectionArg::B => PhotometricType::TypeB,
            ProjectionArg::C => PhotometricType::TypeC,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum NormalizeArg {
    Lumens,
    Candela,
}

impl From<NormalizeArg> for Normalization {
    fn from(arg: NormalizeArg) -> Self {
        match arg {
            NormalizeArg::Lumens => Normalization::TotalLumens,
            NormalizeArg::Candela => Normalization::MaxCandela,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose)?;

    // Parse IES
    let table = parser::parse_file(&args.input)
        .with_context(|| format!("Failed to load photometric file {:?}", args.input))?;

    info!("Manufacturer: {}", table.manufacturer());
    info!("Luminaire: {} ({})", table.luminaire(), table.luminaire_catalog());
    info!("Lamp: {} ({})", table.lamp(), table.lamp_catalog());
    info!("Photometric type: {}", table.photometric_type().label());
    let (max_intensity, unit) = table.max_intensity();
    info!("Max intensity: {:.1} {}", max_intensity, unit.label());

    if args.dump_data {
        warn!("Dumping parsed photometric data:");
        println!("{}", serde_json::to_string_pretty(&table)?);
        println!("----------------------------------------------");
    }

    // Settings: table defaults < settings file < command line
    let mut settings = CookieSettings::for_table(&table);
    if let Some(path) = &args.settings {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        let file: CookieSettingsFile = serde_json::from_str(&text)
            .with_context(|| format!("Invalid settings file {:?}", path))?;
        file.apply_to(&mut settings);
    }
    if let Some(projection) = args.projection {
        settings.projection = projection.into();
    }
    if let Some(cone_angle) = args.cone_angle {
        settings.cone_angle = cone_angle;
    }
    if let Some(resolution) = args.resolution {
        settings.resolution = resolution;
    }
    if let Some(attenuation) = args.attenuation {
        settings.apply_attenuation = attenuation;
    }
    if let Some(normalize) = args.normalize {
        settings.normalization = normalize.into();
    }

    let (warnings, cookie) = generate_cookie(&table, &settings)?;
    info!("Generated {0}x{0} cookie ({1} warning(s))", cookie.size(), warnings.len());

    if args.draft_run {
        warn!("Draft run complete. No files written.");
        return Ok(());
    }

    let output = match args.output {
        Some(p) => p,
        None => {
            let mut p = args.input.clone();
            if let Some(stem) = p.file_stem() {
                let new_stem = format!("{}_cookie", stem.to_string_lossy());
                p.set_file_name(new_stem);
            }
            p.set_extension("vtf");
            p
        }
    };

    generator::generate_vtf(&cookie, &output)?;
    info!("Saved cookie to: {:?}", output.with_extension("vtf"));

    if args.exr {
        let exr_path = output.with_extension("exr");
        generator::generate_exr(&cookie, &exr_path)?;
        info!("Saved EXR copy to: {:?}", exr_path);
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let config = simplelog::ConfigBuilder::default()
        .set_time_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    let term = simplelog::TermLogger::init(
        level,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    if term.is_err() {
        SimpleLogger::init(level, config)?;
    }

    Ok(())
}
