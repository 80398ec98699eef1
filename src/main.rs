use clap::{Parser, Subcommand};
use focal_crop::config::{self, DEFAULT_CONFIG_FILE};
use focal_crop::imaging::RustBackend;
use focal_crop::request::{RequestParams, Upload, process_request};
use focal_crop::{archive, output, outputs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "focal-crop")]
#[command(about = "Focal-point aware responsive image generator")]
#[command(long_about = "\
Focal-point aware responsive image generator

Takes one source image and a JSON list of target rectangles, crops every
rectangle around a chosen focal point, and prints a ready-to-paste <picture>
element referencing the results.

Output configuration:

  {
    \"outputs\": [
      { \"width\": 1920, \"height\": 800, \"format\": \"webp\", \"quality\": 80 },
      {
        \"breakpoint\": 320,
        \"format\": \"jpeg\",
        \"densities\": {
          \"1x\": { \"width\": 320, \"height\": 480 },
          \"2x\": { \"width\": 640, \"height\": 960 }
        }
      }
    ]
  }

Formats: jpeg (or jpg), png, webp, avif. Quality defaults to 85.

Run 'focal-crop gen-config' to generate a documented focal-crop.toml.")]
#[command(version)]
struct Cli {
    /// Settings file (optional; stock defaults apply when missing)
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Source image (JPEG, PNG, WebP or AVIF)
    image: PathBuf,

    /// Output configuration JSON file
    #[arg(long)]
    outputs: PathBuf,

    /// Horizontal focal point, e.g. "37.5%"
    #[arg(long, default_value = "50%")]
    focal_x: String,

    /// Vertical focal point, e.g. "20%"
    #[arg(long, default_value = "50%")]
    focal_y: String,

    /// URL prefix for the generated markup (overrides output.base_path)
    #[arg(long)]
    base_path: Option<String>,

    /// Results directory (overrides output.results_dir)
    #[arg(long)]
    results: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Crop every configured rectangle and print the <picture> markup
    Generate(GenerateArgs),
    /// Validate an output configuration without touching any image
    Check {
        /// Output configuration JSON file
        #[arg(long)]
        outputs: PathBuf,
    },
    /// Print a stock focal-crop.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => {
            let settings = config::load_settings(&cli.config)?;
            init_thread_pool(&settings.processing);

            let upload = Upload {
                filename: args
                    .image
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                bytes: std::fs::read(&args.image)?,
            };
            let params = RequestParams {
                config_json: std::fs::read_to_string(&args.outputs)?,
                focal_x: args.focal_x,
                focal_y: args.focal_y,
                base_path: args.base_path,
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_plan_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let backend = RustBackend::new();
            let result = process_request(&backend, &upload, &params, &settings, Some(&tx));
            drop(tx);
            printer.join().map_err(|_| "progress printer panicked")?;
            let outcome = result?;

            let results_dir = args
                .results
                .unwrap_or_else(|| PathBuf::from(&settings.output.results_dir));
            let folder = archive::write_results(&results_dir, &outcome)?;
            output::print_request_summary(&outcome, &upload.filename, &folder);
        }
        Command::Check { outputs: path } => {
            let settings = config::load_settings(&cli.config)?;
            println!("==> Checking {}", path.display());
            let json = std::fs::read_to_string(&path)?;
            let parsed = outputs::parse_outputs(&json, settings.limits.max_output_dimension)?;
            output::print_check_output(&parsed);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
