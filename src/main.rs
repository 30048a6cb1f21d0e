//! Bitplane CLI
//!
//! Command-line front end: loads one image, runs one analysis and
//! writes the resulting images (or extracted bytes) to disk.

use bitplane::{
    analysis::{self, MagicEyeConfig},
    config::FileConfig,
    extraction::{Alternation, BitAccumulator, BitOrder, BitstreamExtractor, TraversalConfig},
    raster::{self, PixelMatrix, Scaling},
    transform, ExtractionRule, MaskRule,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Parser)]
#[command(name = "bitplane", version, about = "Bit-level image analysis")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for output files (overrides the config file).
    #[arg(short, long, global = true)]
    out_dir: Option<PathBuf>,

    /// Stretch each output image's sample range to full intensity.
    #[arg(long, global = true)]
    stretch: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write one grayscale image per channel.
    Components { input: PathBuf },

    /// Write one image per bit layer.
    Layers {
        input: PathBuf,
        /// Bits per layer; layers overlap when greater than one.
        #[arg(long)]
        bits: Option<u32>,
        /// Split each channel separately, at its own depth.
        #[arg(long)]
        per_component: bool,
    },

    /// Recombine channels under mask rules such as `&:0:0x0f:4`.
    Mask {
        input: PathBuf,
        /// Rule `op:channel:value[:shift]`, op one of `&`, `|`, `^`.
        #[arg(short, long = "rule")]
        rules: Vec<MaskRule>,
        /// Give every rule its own output channel.
        #[arg(long)]
        independent: bool,
    },

    /// Extract a bitstream by walking pixels.
    Extract {
        input: PathBuf,
        /// Rule `channel:bit`; all rules share the traversal flags below.
        #[arg(short, long = "rule")]
        rules: Vec<ExtractionRule>,
        /// Interleave rules one bit at a time.
        #[arg(long)]
        zip: bool,
        /// Bits per output group.
        #[arg(long)]
        group_bits: Option<u32>,
        /// Put the first bit of each group in the least significant position.
        #[arg(long)]
        lsb_first: bool,
        #[arg(long)]
        right_to_left: bool,
        #[arg(long)]
        bottom_to_top: bool,
        /// Walk columns instead of rows.
        #[arg(long)]
        vertical_first: bool,
        /// Flip the inner direction after every pixel.
        #[arg(long)]
        alternate: bool,
        /// Flip the inner direction after every row or column instead.
        #[arg(long)]
        serpentine: bool,
        /// Output file (defaults to `extracted.bin` in the output directory).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Search an autostereogram for its repeat offset.
    MagicEye {
        input: PathBuf,
        /// Shift vertically instead of horizontally.
        #[arg(long)]
        vertical: bool,
        /// Rank the most dissimilar offsets first.
        #[arg(long)]
        max: bool,
        /// Number of offsets to keep.
        #[arg(short = 'n', long)]
        results: Option<usize>,
        /// Fraction of the searched dimension skipped at both ends.
        #[arg(long)]
        border: Option<f64>,
    },

    /// Write one binarized image per luma level.
    Threshold { input: PathBuf },
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Bitplane v{}", bitplane::VERSION);

    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let out = Output {
        directory: cli
            .out_dir
            .clone()
            .unwrap_or_else(|| config.output.directory.clone()),
        scaling: if cli.stretch || config.output.stretch {
            Scaling::Stretch
        } else {
            Scaling::Depth
        },
    };
    std::fs::create_dir_all(&out.directory)?;

    match cli.command {
        Command::Components { input } => {
            let image = raster::load(&input)?;
            for (i, component) in transform::split_components(&image).enumerate() {
                out.save(&component, &format!("component_{i}.png"))?;
            }
        }

        Command::Layers {
            input,
            bits,
            per_component,
        } => {
            let image = raster::load(&input)?;
            let bits = bits.unwrap_or(config.layers.bits);
            if per_component || config.layers.per_component {
                for (c, layers) in transform::split_bit_layers_components(&image, bits)?.enumerate() {
                    let depth = u32::from(image.bits_per_channel()[c]);
                    for (i, layer) in layers.iter().enumerate() {
                        let start = depth - bits - i as u32;
                        out.save(layer, &format!("component_{c}_layer_{start}.png"))?;
                    }
                }
            } else {
                let depth = u32::from(image.min_bits());
                let layers = transform::split_bit_layers(&image, bits)?;
                if layers.len() == 0 {
                    warn!(bits, depth, "Layer width exceeds image depth, nothing written");
                }
                for (i, layer) in layers.enumerate() {
                    let start = depth - bits - i as u32;
                    out.save(&layer, &format!("layer_{start}.png"))?;
                }
            }
        }

        Command::Mask {
            input,
            rules,
            independent,
        } => {
            let image = raster::load(&input)?;
            let rules = if rules.is_empty() {
                config.masks.rules.clone()
            } else {
                rules
            };
            let multi_mask = !independent && config.masks.multi_mask;
            let masked = transform::masked_components(&image, &rules, multi_mask)?;
            out.save(&masked, "masked.png")?;
        }

        Command::Extract {
            input,
            rules,
            zip,
            group_bits,
            lsb_first,
            right_to_left,
            bottom_to_top,
            vertical_first,
            alternate,
            serpentine,
            output,
        } => {
            let image = raster::load(&input)?;
            let traversal = TraversalConfig::new(
                !right_to_left,
                !bottom_to_top,
                !vertical_first,
                alternate || serpentine,
            )
            .with_alternation(if serpentine {
                Alternation::PerLine
            } else {
                Alternation::PerCoordinate
            });
            let rules: Vec<ExtractionRule> = if rules.is_empty() {
                config.extraction.rules.clone()
            } else {
                rules.into_iter().map(|r| r.with_traversal(traversal)).collect()
            };
            let order = if lsb_first {
                BitOrder::LsbFirst
            } else {
                config.extraction.bit_order
            };
            let mut accumulator =
                BitAccumulator::new(group_bits.unwrap_or(config.extraction.group_bits), order)?;

            let extractor = BitstreamExtractor::new(rules)
                .zip_components(zip || config.extraction.zip_components);
            let bits = extractor.extract_into(&image, &mut accumulator)?;

            let path = output.unwrap_or_else(|| out.directory.join("extracted.bin"));
            std::fs::write(&path, accumulator.bytes())?;
            info!(bits, path = %path.display(), "Wrote extracted bitstream");
        }

        Command::MagicEye {
            input,
            vertical,
            max,
            results,
            border,
        } => {
            let image = raster::load(&input)?;
            let defaults = config.magic_eye.clone();
            let search = MagicEyeConfig {
                min_value: defaults.min_value && !max,
                horizontal: defaults.horizontal && !vertical,
                number_of_results: results.unwrap_or(defaults.number_of_results),
                border_area: border.unwrap_or(defaults.border_area),
            };
            let depth = image.min_bits();
            for (rank, (score, diff)) in analysis::magic_eye(&image, search)?.enumerate() {
                info!(
                    rank,
                    offset = score.offset,
                    dissimilarity = score.dissimilarity,
                    "Offset candidate"
                );
                let name = format!("magiceye_{rank}_offset_{}.png", score.offset);
                out.save(&diff.to_matrix(depth)?, &name)?;
            }
        }

        Command::Threshold { input } => {
            let image = raster::load(&input)?;
            for (level, binary) in analysis::threshold_sweep(&image)? {
                out.save(&binary, &format!("threshold_{level}.png"))?;
            }
        }
    }

    Ok(())
}

/// Where and how output images are written.
struct Output {
    directory: PathBuf,
    scaling: Scaling,
}

impl Output {
    fn save(&self, image: &PixelMatrix, name: &str) -> CliResult<()> {
        let path = self.directory.join(name);
        raster::save_with(image, &path, self.scaling)?;
        info!(path = %path.display(), "Wrote image");
        Ok(())
    }
}
