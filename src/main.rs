use clap::{Parser, Subcommand};
use cophotographer::camera::{Dial, parse_stop};
use cophotographer::config::{self, SimConfig};
use cophotographer::dial::DialSession;
use cophotographer::imaging::{RustBackend, classify, supported_input_extensions};
use cophotographer::session::{Session, default_output_path, noise_rng};
use cophotographer::suggest::{HttpSuggestionService, SuggestionClient};
use cophotographer::{logger, output};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Camera settings given on the command line, overriding the config.
#[derive(clap::Args, Clone)]
struct CameraArgs {
    /// Aperture stop (2.8, f/2.8)
    #[arg(long)]
    aperture: Option<String>,
    /// Shutter speed (1/250, 250)
    #[arg(long)]
    shutter: Option<String>,
    /// ISO sensitivity (800)
    #[arg(long)]
    iso: Option<String>,
}

fn version_string() -> &'static str {
    let on_tag = env!("COPHOTO_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("COPHOTO_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "cophotographer")]
#[command(about = "Simulate aperture, shutter speed and ISO on your own photos")]
#[command(long_about = "\
Simulate aperture, shutter speed and ISO on your own photos

The loaded photo stands in for a frame shot at f/5.6, 1/125, ISO 400. Other
settings re-expose it from there:

  aperture   wider lets in more light and blurs the preview (f/1.8 .. f/22)
  shutter    slower lets in more light (1/4 .. 1/8000)
  iso        higher brightens and adds sensor noise (200 .. 6400)

Every render is classified from its luminance histogram as ok, slightly
over/underexposed or over/underexposed. When the suggestion service is
configured, off-target renders also get advice on which dial to turn.

Run 'cophotographer gen-config' to generate a documented cophotographer.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a photo at the given settings and save the preview
    Simulate {
        image: PathBuf,
        #[command(flatten)]
        camera: CameraArgs,
        /// Preview file (default cophotographer_<millis>.png)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Noise seed, for reproducible renders
        #[arg(long)]
        seed: Option<u64>,
        /// Skip the suggestion service
        #[arg(long)]
        no_suggest: bool,
    },
    /// Classify a photo's exposure as-is
    Analyze { image: PathBuf },
    /// List the available stops for each dial
    Stops,
    /// Adjust the dials interactively
    Dial {
        image: PathBuf,
        #[command(flatten)]
        camera: CameraArgs,
        /// Noise seed, for reproducible renders
        #[arg(long)]
        seed: Option<u64>,
        /// Skip the suggestion service
        #[arg(long)]
        no_suggest: bool,
    },
    /// Print a stock cophotographer.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logger::init();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.config)?;
    let backend = RustBackend::new();

    match cli.command {
        Command::Simulate {
            image,
            camera,
            output: out_path,
            seed,
            no_suggest,
        } => {
            let mut session = Session::from_config(&config)?;
            apply_camera_args(&mut session, &camera)?;
            load(&mut session, &backend, &image)?;

            let mut rng = noise_rng(seed.or(config.simulation.seed));
            let render = session.render(&mut rng).ok_or("no image loaded")?;
            let path = out_path.unwrap_or_else(default_output_path);
            render.save_preview(&backend, &path)?;
            output::print_render_report(&render);
            println!("Saved {}", path.display());

            if let Some(client) = suggestion_client(&config, no_suggest) {
                if let Some(alert) = client.suggest(&render.params, &render.classification) {
                    output::print_alert(&alert, &render.params);
                }
            }
        }
        Command::Analyze { image } => {
            let mut session = Session::from_config(&config)?;
            load(&mut session, &backend, &image)?;
            let source = session.source().ok_or("no image loaded")?;
            output::print_classification(&classify(source));
        }
        Command::Stops => {
            output::print_stops(&config.camera.to_parameters()?);
        }
        Command::Dial {
            image,
            camera,
            seed,
            no_suggest,
        } => {
            let mut session = Session::from_config(&config)?;
            apply_camera_args(&mut session, &camera)?;
            load(&mut session, &backend, &image)?;

            let client = suggestion_client(&config, no_suggest).map(Arc::new);
            let dial = DialSession::new(
                session,
                &backend,
                client,
                seed.or(config.simulation.seed),
            );
            println!("Type 'help' for commands.");
            dial.run(std::io::stdin().lock())?;
        }
        Command::GenConfig => unreachable!("handled above"),
    }

    Ok(())
}

fn apply_camera_args(
    session: &mut Session,
    camera: &CameraArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let dials = [
        (Dial::Aperture, &camera.aperture),
        (Dial::Shutter, &camera.shutter),
        (Dial::Iso, &camera.iso),
    ];
    for (dial, value) in dials {
        if let Some(text) = value {
            session.select(dial, parse_stop(dial, text)?);
        }
    }
    Ok(())
}

/// Load `image` into the session, turning a decode failure into a message
/// that names the formats we can read.
fn load(
    session: &mut Session,
    backend: &RustBackend,
    image: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = session.load_image(backend, image) {
        let mut formats: Vec<&str> = supported_input_extensions().iter().copied().collect();
        formats.sort_unstable();
        return Err(format!(
            "Cannot load {}: {e}\nSupported formats: {}",
            image.display(),
            formats.join(", ")
        )
        .into());
    }
    Ok(())
}

fn suggestion_client(
    config: &SimConfig,
    disabled: bool,
) -> Option<SuggestionClient<HttpSuggestionService>> {
    if disabled || !config.suggestions.enabled {
        return None;
    }
    let timeout = config.suggestions.timeout_secs.map(Duration::from_secs);
    Some(SuggestionClient::new(HttpSuggestionService::new(
        &config.suggestions.base_url,
        timeout,
    )))
}
