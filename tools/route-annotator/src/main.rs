use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use como_llego_transit::features::{
    annotate_features, clip_route_features, concat_features, integrate_places,
    segments_from_features,
};
use como_llego_transit::{labels, BoundingBox, ProximityConfig};
use std::path::{Path, PathBuf};

mod io;
mod tabular;

use io::{backup_file, read_collection, write_collection, LoadedCollection};
use tabular::{read_places_csv, DEFAULT_ORIGIN};

#[derive(Parser, Debug)]
#[command(
    name = "route-annotator",
    author,
    version,
    about = "Clip bus routes and annotate facilities with the lines that pass nearby",
    long_about = "Works on GeoJSON FeatureCollections in place.\n\n\
                  `clip` trims route geometries to a bounding box and thins their vertices. \
                  `annotate` measures every facility against every route segment and writes a \
                  \"how to get there\" sentence into each facility, keeping hand-written text \
                  that mentions other lines. `integrate` and `import` add places of interest \
                  to the facility collection. Files are backed up before being overwritten."
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON file with matching and clipping parameters (unset fields keep their defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Do not create a timestamped backup before overwriting a file
    #[arg(long, global = true)]
    no_backup: bool,

    /// Verbose output (show debug messages)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clip route geometries to a bounding box and simplify them
    Clip {
        /// Route GeoJSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum spacing between kept vertices, in meters
        #[arg(long)]
        tolerance: Option<f64>,

        /// Bounding box as min_lon,min_lat,max_lon,max_lat
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: Option<BoundingBox>,
    },

    /// Annotate facilities with the bus routes passing nearby
    Annotate {
        /// Route GeoJSON file (LineString / MultiLineString features)
        #[arg(short, long)]
        routes: PathBuf,

        /// Facility GeoJSON file (Point features)
        #[arg(short, long)]
        facilities: PathBuf,

        /// Output file (defaults to overwriting the facility file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Routes within this many meters are listed as near
        #[arg(long)]
        near_radius: Option<f64>,

        /// Routes within this many meters are listed as walkable
        #[arg(long)]
        far_radius: Option<f64>,

        /// Meters per block, for the walking-distance hint
        #[arg(long)]
        block_length: Option<f64>,

        /// Property holding the annotation text
        #[arg(long)]
        field: Option<String>,
    },

    /// Append places of interest from a GeoJSON file to the facility collection
    Integrate {
        /// Facility GeoJSON file
        #[arg(short, long)]
        base: PathBuf,

        /// Places of interest GeoJSON file
        #[arg(short, long)]
        places: PathBuf,

        /// Output file (defaults to overwriting the base file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Append places of interest from a CSV sheet to the facility collection
    Import {
        /// CSV export of the places sheet
        #[arg(short, long)]
        table: PathBuf,

        /// Facility GeoJSON file
        #[arg(short, long)]
        base: PathBuf,

        /// Output file (defaults to overwriting the base file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Value stored in `origen_lugar` for imported rows
        #[arg(long, default_value = DEFAULT_ORIGIN)]
        origin: String,
    },
}

/// Parse "min_lon,min_lat,max_lon,max_lat" (GeoJSON bbox order).
fn parse_bbox(raw: &str) -> std::result::Result<BoundingBox, String> {
    let values: Vec<f64> = raw
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{}': {}", v.trim(), e)))
        .collect::<std::result::Result<_, _>>()?;

    match values.as_slice() {
        [min_lon, min_lat, max_lon, max_lat] => {
            Ok(BoundingBox::new(*min_lat, *max_lat, *min_lon, *max_lon))
        }
        _ => Err(format!("expected 4 comma-separated values, got {}", values.len())),
    }
}

fn load_config(path: Option<&Path>) -> Result<ProximityConfig> {
    let Some(path) = path else {
        return Ok(ProximityConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn ensure_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} does not exist: {}", what, path.display());
    }
    Ok(())
}

/// Back up `target` if it is about to be overwritten.
fn prepare_target(target: &Path, no_backup: bool) -> Result<()> {
    if !no_backup && target.exists() {
        backup_file(target)?;
    }
    Ok(())
}

fn run_clip(
    input: &Path,
    output: &Path,
    config: &ProximityConfig,
    no_backup: bool,
) -> Result<()> {
    ensure_exists(input, "Route file")?;

    log::info!("Phase 1: Reading routes...");
    let routes = read_collection(input)?;
    let features = routes.features();
    if routes.opaque_count() > 0 {
        log::warn!("  Dropping {} invalid route features", routes.opaque_count());
    }

    log::info!("");
    log::info!(
        "Phase 2: Clipping to {} and simplifying (tolerance {} m)...",
        config.bbox,
        config.simplify_tolerance_m
    );
    let (clipped, stats) = clip_route_features(&features, config);

    log::info!("");
    log::info!("Phase 3: Writing output...");
    prepare_target(output, no_backup)?;
    write_collection(&LoadedCollection::from_features(clipped), output, false)
        .context("Failed to write clipped routes")?;

    log::info!("");
    log::info!("=== Clip Statistics ===");
    log::info!("Original features: {}", routes.entries.len());
    log::info!("Resulting features: {}", stats.output_count);
    Ok(())
}

fn run_annotate(
    routes_path: &Path,
    facilities_path: &Path,
    output: &Path,
    config: &ProximityConfig,
    no_backup: bool,
) -> Result<()> {
    ensure_exists(routes_path, "Route file")?;
    ensure_exists(facilities_path, "Facility file")?;

    log::info!("Phase 1: Building route segments...");
    let routes = read_collection(routes_path)?;
    let (segments, route_stats) = segments_from_features(&routes.features(), labels::derive);
    log::info!(
        "  {} routes from {} features, {} segments",
        route_stats.route_count,
        route_stats.feature_count,
        route_stats.segment_count
    );
    if segments.is_empty() {
        log::warn!("  No route segments found; no facility will be annotated");
    }

    log::info!("");
    log::info!("Phase 2: Matching facilities...");
    let facilities = read_collection(facilities_path)?;
    let (annotated, stats) = annotate_features(&facilities.features(), &segments, config);

    log::info!("");
    log::info!("Phase 3: Writing output...");
    prepare_target(output, no_backup)?;
    let updated = facilities.with_features(annotated)?;
    write_collection(&updated, output, true).context("Failed to write annotated facilities")?;

    log::info!("");
    stats.log_summary();
    if updated.opaque_count() > 0 {
        log::warn!(
            "Invalid features carried through unchanged: {}",
            updated.opaque_count()
        );
    }
    Ok(())
}

fn run_integrate(base_path: &Path, places_path: &Path, output: &Path, no_backup: bool) -> Result<()> {
    ensure_exists(base_path, "Base file")?;
    ensure_exists(places_path, "Places file")?;

    let base = read_collection(base_path)?;
    let places = read_collection(places_path)?;

    let (merged, stats) = integrate_places(&base.features(), &places.features());

    prepare_target(output, no_backup)?;
    let merged = base.with_appended(merged)?;
    write_collection(&merged, output, false).context("Failed to write merged collection")?;

    log::info!("");
    stats.log_summary();
    if merged.opaque_count() > 0 {
        log::warn!(
            "Invalid features carried through unchanged: {}",
            merged.opaque_count()
        );
    }
    Ok(())
}

fn run_import(
    table: &Path,
    base_path: &Path,
    output: &Path,
    origin: &str,
    no_backup: bool,
) -> Result<()> {
    ensure_exists(table, "Places sheet")?;
    ensure_exists(base_path, "Base file")?;

    let (features, stats) = read_places_csv(table, origin)?;
    if stats.row_count == 0 {
        bail!("The places sheet has no data rows: {}", table.display());
    }

    let base = read_collection(base_path)?;

    prepare_target(output, no_backup)?;
    let appended = concat_features(&base.features(), features);
    let merged = base.with_appended(appended)?;
    write_collection(&merged, output, true).context("Failed to write merged collection")?;

    log::info!("");
    log::info!("=== Import Statistics ===");
    log::info!("Rows read: {}", stats.row_count);
    log::info!("Places added: {}", stats.added_count);
    if stats.skipped_count > 0 {
        log::warn!("Rows skipped (no usable coordinate): {}", stats.skipped_count);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    log::info!("=== Route Annotator ===");

    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Clip {
            input,
            output,
            tolerance,
            bbox,
        } => {
            if let Some(tolerance) = tolerance {
                config.simplify_tolerance_m = tolerance;
            }
            if let Some(bbox) = bbox {
                config.bbox = bbox;
            }
            config.validate().context("Invalid configuration")?;

            let output = output.unwrap_or_else(|| input.clone());
            log::info!("Input: {}", input.display());
            log::info!("Output: {}", output.display());
            run_clip(&input, &output, &config, args.no_backup)?;
        }
        Command::Annotate {
            routes,
            facilities,
            output,
            near_radius,
            far_radius,
            block_length,
            field,
        } => {
            if let Some(near) = near_radius {
                config.near_radius_m = near;
            }
            if let Some(far) = far_radius {
                config.far_radius_m = far;
            }
            if let Some(block) = block_length {
                config.block_length_m = block;
            }
            if let Some(field) = field {
                config.annotation_field = field;
            }
            config.validate().context("Invalid configuration")?;

            let output = output.unwrap_or_else(|| facilities.clone());
            log::info!("Routes: {}", routes.display());
            log::info!("Facilities: {}", facilities.display());
            log::info!("Output: {}", output.display());
            run_annotate(&routes, &facilities, &output, &config, args.no_backup)?;
        }
        Command::Integrate {
            base,
            places,
            output,
        } => {
            let output = output.unwrap_or_else(|| base.clone());
            run_integrate(&base, &places, &output, args.no_backup)?;
        }
        Command::Import {
            table,
            base,
            output,
            origin,
        } => {
            let output = output.unwrap_or_else(|| base.clone());
            run_import(&table, &base, &output, &origin, args.no_backup)?;
        }
    }

    log::info!("Done!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = parse_bbox("-58.30,-35.20,-57.30,-34.60").unwrap();
        assert_eq!(bbox, BoundingBox::new(-35.20, -34.60, -58.30, -57.30));
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("a,b,c,d").is_err());
    }

    #[test]
    fn test_cli_parses_annotate() {
        let args = Args::try_parse_from([
            "route-annotator",
            "annotate",
            "--routes",
            "recorridos_lp.geojson",
            "--facilities",
            "camposfiltrados.geojson",
            "--near-radius",
            "250",
            "--no-backup",
        ])
        .unwrap();

        assert!(args.no_backup);
        match args.command {
            Command::Annotate {
                near_radius,
                output,
                ..
            } => {
                assert_eq!(near_radius, Some(250.0));
                assert!(output.is_none());
            }
            other => panic!("Expected annotate, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_negative_bbox() {
        let args = Args::try_parse_from([
            "route-annotator",
            "clip",
            "-i",
            "recorridos_lp.geojson",
            "--bbox",
            "-58.3,-35.2,-57.3,-34.6",
        ])
        .unwrap();

        match args.command {
            Command::Clip { bbox, .. } => assert_eq!(bbox, Some(BoundingBox::new(-35.2, -34.6, -58.3, -57.3))),
            other => panic!("Expected clip, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config() {
        assert_eq!(load_config(None).unwrap(), ProximityConfig::default());
    }
}
