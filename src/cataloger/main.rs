// This is free and unencumbered software released into the public domain.

#[cfg(not(feature = "std"))]
compile_error!("asimov-camera2-cataloger requires the 'std' feature");

use asimov_camera2_module::{
    cli,
    shared::{CameraConfig, CameraError, CameraSummary, Size},
};
use asimov_module::SysexitsError::{self, *};
use clap::Parser;
use clientele::StandardOptions;
use serde_json::json;
use std::error::Error as StdError;

#[derive(Debug, Parser)]
struct Options {
    #[clap(flatten)]
    flags: StandardOptions,

    /// Preview size to evaluate each camera against.
    #[arg(short, long, value_parser = cli::parse_size, default_value = "1280x720")]
    size: Size,

    #[arg(
        value_name = "FORMAT",
        short = 'o',
        long = "output",
        value_enum,
        default_value = "text"
    )]
    output: OutputFormat,
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Jsonl,
}

pub fn main() -> Result<SysexitsError, Box<dyn StdError>> {
    asimov_module::dotenv().ok();
    let args = asimov_module::args_os()?;
    let options = Options::parse_from(args);

    if options.flags.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(EX_OK);
    }

    if options.flags.license {
        print!("{}", include_str!("../../UNLICENSE"));
        return Ok(EX_OK);
    }

    #[cfg(feature = "tracing")]
    asimov_module::init_tracing_subscriber(&options.flags).expect("failed to initialize logging");

    let exit_code = match run_cataloger(&options) {
        Ok(()) => EX_OK,
        Err(err) => cli::handle_error(&err, &options.flags),
    };

    Ok(exit_code)
}

fn run_cataloger(options: &Options) -> Result<(), CameraError> {
    cli::info_user(&options.flags, "enumerating cameras");

    let config = CameraConfig::new(options.size.width, options.size.height)
        .with_diagnostics(options.flags.debug || options.flags.verbose >= 3);
    let mut cameras = list_cameras(&config)?;
    if cameras.is_empty() {
        cli::warn_user(&options.flags, "no cameras found");
        return Ok(());
    }

    cameras.sort_by(|a, b| a.id.cmp(&b.id));

    for camera in cameras {
        match options.output {
            OutputFormat::Text => println!("{}", describe(&camera)),
            OutputFormat::Jsonl => {
                println!(
                    "{}",
                    json!({
                        "id": camera.id,
                        "facing": camera.facing.map(|f| f.to_string()),
                        "orientation": camera.orientation,
                        "fps_range": camera.fps_range.map(|r| [r.lower, r.upper]),
                        "preview_size": [camera.preview_size.width, camera.preview_size.height],
                        "metering_area_af": camera.metering_area_af,
                    })
                );
            },
        }
    }

    Ok(())
}

fn describe(camera: &CameraSummary) -> String {
    let facing = camera
        .facing
        .map(|f| f.to_string())
        .unwrap_or_else(|| "external".into());
    let mut line = format!("{}: {facing}, preview {}", camera.id, camera.preview_size);
    if let Some(orientation) = camera.orientation {
        line.push_str(&format!(", orientation {orientation}"));
    }
    if let Some(range) = camera.fps_range {
        line.push_str(&format!(", fps {range}"));
    }
    if camera.metering_area_af {
        line.push_str(" [af-regions]");
    }
    line
}

#[cfg(all(feature = "android", target_os = "android"))]
fn list_cameras(config: &CameraConfig) -> Result<Vec<CameraSummary>, CameraError> {
    use asimov_camera2_module::shared::{describe_cameras, drivers::camera2::Camera2Platform};

    // Callbacks are never registered here, so nothing reads the queue.
    let (tx, _rx) = std::sync::mpsc::sync_channel(1);
    let mut platform = Camera2Platform::new(tx)?;
    describe_cameras(&mut platform, config)
}

#[cfg(not(all(feature = "android", target_os = "android")))]
fn list_cameras(_config: &CameraConfig) -> Result<Vec<CameraSummary>, CameraError> {
    Err(CameraError::NoDriver)
}
