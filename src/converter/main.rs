// This is free and unencumbered software released into the public domain.

#[cfg(not(feature = "std"))]
compile_error!("asimov-camera2-converter requires the 'std' feature");

use asimov_camera2_module::{
    cli,
    shared::{CameraError, CropRect, Nv21Converter, Plane, Size, YuvImage},
};
use asimov_module::SysexitsError::{self, *};
use clap::Parser;
use clientele::StandardOptions;
use std::{
    error::Error as StdError,
    fs,
    io::{self, Read, Write},
    path::PathBuf,
};

/// Converts a raw YUV_420_888 frame into NV21.
///
/// The input holds the Y plane followed by the chroma data: with a chroma
/// pixel stride of 1 a U plane then a V plane, with 2 a single interleaved
/// U,V plane.
#[derive(Debug, Parser)]
struct Options {
    #[clap(flatten)]
    flags: StandardOptions,

    /// Input file; stdin when omitted.
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output file; stdout when omitted.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Dimensions of the stored frame.
    #[arg(short, long, value_parser = cli::parse_size, default_value = "1280x720")]
    size: Size,

    /// Region to convert, as L,T,WxH; the whole frame by default.
    #[arg(long, value_parser = cli::parse_crop)]
    crop: Option<CropRect>,

    /// Bytes per luma row; the frame width by default.
    #[arg(long, value_name = "BYTES")]
    row_stride: Option<usize>,

    /// Bytes per chroma row; derived from the width and chroma pixel stride
    /// by default.
    #[arg(long, value_name = "BYTES")]
    chroma_row_stride: Option<usize>,

    /// Distance between chroma samples: 1 for planar, 2 for interleaved.
    #[arg(
        long,
        value_name = "BYTES",
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(1..=2)
    )]
    chroma_pixel_stride: u8,
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

    let exit_code = match run_converter(&options) {
        Ok(()) => EX_OK,
        Err(ConvertError::Io(err)) => {
            eprintln!("ERROR: {err}");
            match err.kind() {
                io::ErrorKind::NotFound => EX_NOINPUT,
                io::ErrorKind::BrokenPipe => EX_OK,
                _ => EX_IOERR,
            }
        },
        Err(ConvertError::Camera(err)) => cli::handle_error(&err, &options.flags),
    };

    Ok(exit_code)
}

#[derive(Debug, thiserror::Error)]
enum ConvertError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Camera(#[from] CameraError),
}

/// Byte layout of the stored frame.
#[derive(Clone, Copy, Debug)]
struct Layout {
    row_stride: usize,
    chroma_row_stride: usize,
    chroma_pixel_stride: usize,
    luma_len: usize,
    chroma_len: usize,
}

impl Layout {
    fn new(options: &Options) -> Result<Self, CameraError> {
        let (width, height) = (options.size.width as usize, options.size.height as usize);
        let chroma_pixel_stride = options.chroma_pixel_stride as usize;
        let row_stride = options.row_stride.unwrap_or(width);
        let chroma_row_stride = options
            .chroma_row_stride
            .unwrap_or(width / 2 * chroma_pixel_stride);

        if row_stride < width {
            return Err(CameraError::invalid_config(format!(
                "row stride {row_stride} is shorter than width {width}"
            )));
        }
        if chroma_row_stride < width / 2 * chroma_pixel_stride {
            return Err(CameraError::invalid_config(format!(
                "chroma row stride {chroma_row_stride} is too short for width {width}"
            )));
        }

        Ok(Self {
            row_stride,
            chroma_row_stride,
            chroma_pixel_stride,
            luma_len: row_stride * height,
            chroma_len: chroma_row_stride * (height / 2),
        })
    }

    fn frame_len(&self) -> usize {
        match self.chroma_pixel_stride {
            1 => self.luma_len + 2 * self.chroma_len,
            _ => self.luma_len + self.chroma_len,
        }
    }

    fn image<'a>(&self, data: &'a [u8], crop: CropRect) -> YuvImage<'a> {
        let (luma, chroma) = data.split_at(self.luma_len);
        let (u, v) = match self.chroma_pixel_stride {
            1 => chroma.split_at(self.chroma_len),
            _ => (chroma, &chroma[1.min(chroma.len())..]),
        };
        YuvImage::new(
            crop,
            [
                Plane::new(luma, self.row_stride, 1),
                Plane::new(u, self.chroma_row_stride, self.chroma_pixel_stride),
                Plane::new(v, self.chroma_row_stride, self.chroma_pixel_stride),
            ],
        )
    }
}

fn run_converter(options: &Options) -> Result<(), ConvertError> {
    let layout = Layout::new(options)?;
    let Size { width, height } = options.size;
    let crop = options
        .crop
        .unwrap_or_else(|| CropRect::full(width as usize, height as usize));

    let data = match &options.input {
        Some(path) => fs::read(path)?,
        None => {
            let mut buf = Vec::with_capacity(layout.frame_len());
            io::stdin().lock().read_to_end(&mut buf)?;
            buf
        },
    };
    if data.len() < layout.frame_len() {
        return Err(CameraError::invalid_frame(format!(
            "expected at least {} bytes for a {} frame, got {}",
            layout.frame_len(),
            options.size,
            data.len()
        ))
        .into());
    }
    if data.len() > layout.frame_len() {
        cli::warn_user(
            &options.flags,
            &format!("ignoring {} trailing bytes", data.len() - layout.frame_len()),
        );
    }

    let image = layout.image(&data[..layout.frame_len()], crop);
    image.validate()?;
    cli::info_user(
        &options.flags,
        &format!("converting {}x{} to NV21", image.width(), image.height()),
    );

    let mut converter = Nv21Converter::new();
    let nv21 = converter.convert_to_vec(&image);

    match &options.output {
        Some(path) => fs::write(path, &nv21)?,
        None => {
            let mut out = io::stdout().lock();
            out.write_all(&nv21)?;
            out.flush()?;
        },
    }
    Ok(())
}
