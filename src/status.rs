// Corpus status display — place counts, vocabulary, tiling layout.

use colored::Colorize;

use crate::config::Config;
use crate::model::CoreWordEngine;
use crate::output::terminal::display_stats;
use crate::tiling::geo::tile_extent_meters;
use crate::tiling::Tiling;

/// Display corpus and tiling status to the terminal.
pub fn show(engine: &CoreWordEngine, config: &Config) {
    println!("Data directory: {}", config.data_dir.display());
    display_stats(&engine.stats());

    let tiler = engine.tiler();
    match tiler.tiling() {
        Tiling::Coordinates { tile_size } => {
            match tiler.grid_shape() {
                Some((rows, cols)) => println!(
                    "Tiling: coordinate grid {rows} x {cols} ({} occupied)",
                    tiler.occupied_tiles()
                ),
                None => println!("Tiling: coordinate grid (empty)"),
            }

            // Tiles shrink east-west away from the equator, so measure at the
            // middle of the corpus.
            match engine.store().bounds() {
                Some(bounds) => {
                    let (ns, ew) = tile_extent_meters(bounds.center(), tile_size);
                    println!(
                        "  Tile size: {tile_size}° (~{:.0} m x {:.0} m at the corpus center)",
                        ns, ew
                    );
                }
                None => {
                    println!("  {}", "No geolocated places; every place falls back to the global background".dimmed());
                }
            }
        }
        Tiling::City => {
            println!("Tiling: by city ({} cities)", tiler.occupied_tiles());
        }
    }

    let params = engine.params();
    println!(
        "EM: max {} steps, threshold {}, λ = {}, α = {}, background prior {:?}",
        params.max_steps,
        params.threshold,
        params.mixture_weight,
        params.tile_smoothing,
        params.background_prior
    );
}
