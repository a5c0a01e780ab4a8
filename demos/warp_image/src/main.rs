use argh::FromArgs;
use std::path::{Path, PathBuf};

use facewarp::image::Image;
use facewarp::imgwarp::{self, FaceDetection, OverlayConfig, Point, WarpConfig, Warper};

#[derive(FromArgs)]
/// Warp images with moving least squares driven by landmarks
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Warp(WarpArgs),
    Overlay(OverlayArgs),
}

#[derive(FromArgs)]
/// Move the landmarks of an image to new positions
#[argh(subcommand, name = "warp")]
struct WarpArgs {
    /// path to the input image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// path to a json file with the `from` and `to` landmarks
    #[argh(option, short = 'l')]
    landmarks_path: PathBuf,

    /// path to a json file with the warp parameters
    #[argh(option, short = 'c')]
    config_path: Option<PathBuf>,

    /// path to the output png
    #[argh(option, short = 'o')]
    output_path: PathBuf,
}

#[derive(FromArgs)]
/// Warp an avatar face onto the shape of a target face
#[argh(subcommand, name = "overlay")]
struct OverlayArgs {
    /// path to the avatar image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// path to a json file with the `avatar` and `target` detections
    #[argh(option, short = 'd')]
    detections_path: PathBuf,

    /// path to a json file with the warp parameters
    #[argh(option, short = 'c')]
    config_path: Option<PathBuf>,

    /// path to the output png
    #[argh(option, short = 'o')]
    output_path: PathBuf,
}

#[derive(serde::Deserialize)]
struct Landmarks {
    from: Vec<Point>,
    to: Vec<Point>,
}

#[derive(serde::Deserialize)]
struct Detections {
    avatar: FaceDetection,
    target: FaceDetection,
    #[serde(default)]
    overlay: OverlayConfig,
}

fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<T, Box<dyn std::error::Error>> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

fn read_config(path: Option<&Path>) -> Result<WarpConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => read_json(path),
        None => Ok(WarpConfig::default()),
    }
}

fn read_image_rgba8(path: &Path) -> Result<Image<u8, 4>, Box<dyn std::error::Error>> {
    let img = image::open(path)?.to_rgba8();
    let size = [img.width() as usize, img.height() as usize].into();
    Ok(Image::new(size, img.into_raw())?)
}

fn write_image_rgba8(path: &Path, img: Image<u8, 4>) -> Result<(), Box<dyn std::error::Error>> {
    let [width, height]: [u32; 2] = img.size().try_into()?;
    let buf = image::RgbaImage::from_raw(width, height, img.into_vec())
        .ok_or("image buffer does not match its size")?;
    buf.save(path)?;
    Ok(())
}

fn warp(args: WarpArgs) -> Result<(), Box<dyn std::error::Error>> {
    let image = read_image_rgba8(&args.image_path)?;
    let landmarks: Landmarks = read_json(&args.landmarks_path)?;
    let config = read_config(args.config_path.as_deref())?;

    log::info!(
        "warping {} with {} landmarks",
        image.size(),
        landmarks.from.len()
    );

    let warper = Warper::new(image.size(), config)?;
    let warped = warper.warp(&image, &landmarks.from, &landmarks.to)?;

    write_image_rgba8(&args.output_path, warped)
}

fn overlay(args: OverlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let image = read_image_rgba8(&args.image_path)?;
    let detections: Detections = read_json(&args.detections_path)?;
    let config = read_config(args.config_path.as_deref())?;

    let overlay = imgwarp::warp_overlay(
        &image,
        &detections.avatar,
        &detections.target,
        &detections.overlay,
        config,
    )?;

    log::info!(
        "overlay canvas {} with the avatar at ({}, {})",
        overlay.layout.size,
        overlay.layout.x_pad,
        overlay.layout.y_pad
    );

    write_image_rgba8(&args.output_path, overlay.image)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();

    match args.command {
        Command::Warp(args) => warp(args),
        Command::Overlay(args) => overlay(args),
    }
}
