use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use maplet_overlay::{
    data::poi::pois_from_json, CameraPose, LatLng, MapSurface, OverlayConfig, OverlayRegistry,
    Point, SoftwareSurface,
};

const SCREEN: Point = Point { x: 1080.0, y: 1920.0 };

/// Headless snapshot of the marker overlay
///
/// Usage: `maplet-overlay-app <pois.json> [--config cfg.json] [--out dir]`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    maplet_overlay::init_logging();

    let args = Args::parse(std::env::args().skip(1))?;
    let pois = pois_from_json(
        &std::fs::read_to_string(&args.pois)
            .with_context(|| format!("reading {}", args.pois.display()))?,
    )?;
    let config = match &args.config {
        Some(path) => OverlayConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => OverlayConfig::default(),
    };

    let center = centroid(pois.iter().map(|poi| poi.position)).unwrap_or(LatLng::new(44.6098, 40.1006));
    let mut surface = SoftwareSurface::new(CameraPose::new(center, 12.0), SCREEN);
    let mut registry = OverlayRegistry::with_http_loader(config)?;

    let report = registry.attach(&surface).set_pois(&mut surface, &pois)?;
    println!(
        "{} markers placed ({} failed)",
        report.added,
        report.failed
    );

    for (step, camera) in camera_path(center).into_iter().enumerate() {
        surface.move_to(camera);
        let renderer = registry.attach(&surface);
        renderer.on_camera_changed();
        let frame = renderer.frame(&surface);
        println!(
            "frame {step}: zoom {:.1} azimuth {:.0} tilt {:.0}: {} shown, {} off-screen, max layer offset {:.3} px",
            camera.zoom,
            camera.azimuth,
            camera.tilt,
            frame.entries.len(),
            frame.dropped,
            frame.max_layer_offset()
        );
        for entry in &frame.entries {
            println!(
                "  {:<24} ({:>7.1}, {:>7.1}) {:?}",
                entry.poi.as_str(),
                entry.interactive.x,
                entry.interactive.y,
                entry.state.image
            );
        }
    }

    let applied = wait_for_photos(&mut registry, &mut surface, args.timeout).await;
    println!("{applied} photos applied");

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    let written = write_icons(&registry, &surface, &args.out)?;
    println!("{written} marker images written to {}", args.out.display());

    registry.detach(&mut surface);
    Ok(())
}

struct Args {
    pois: PathBuf,
    config: Option<PathBuf>,
    out: PathBuf,
    timeout: Duration,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut pois = None;
        let mut config = None;
        let mut out = PathBuf::from("overlay-snapshot");
        let mut timeout = Duration::from_secs(10);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => config = Some(PathBuf::from(args.next().context("--config needs a path")?)),
                "--out" => out = PathBuf::from(args.next().context("--out needs a path")?),
                "--timeout" => {
                    let secs: u64 = args.next().context("--timeout needs seconds")?.parse()?;
                    timeout = Duration::from_secs(secs);
                }
                flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
                path => pois = Some(PathBuf::from(path)),
            }
        }

        Ok(Self {
            pois: pois.context("usage: maplet-overlay-app <pois.json> [--config cfg.json] [--out dir]")?,
            config,
            out,
            timeout,
        })
    }
}

fn centroid(points: impl Iterator<Item = LatLng>) -> Option<LatLng> {
    let (mut lat, mut lng, mut n) = (0.0, 0.0, 0usize);
    for p in points {
        lat += p.lat;
        lng += p.lng;
        n += 1;
    }
    (n > 0).then(|| LatLng::new(lat / n as f64, lng / n as f64))
}

/// Pan, zoom, rotate and tilt around `center`
fn camera_path(center: LatLng) -> Vec<CameraPose> {
    vec![
        CameraPose::new(center, 12.0),
        CameraPose::new(LatLng::new(center.lat + 0.01, center.lng - 0.02), 12.0),
        CameraPose::new(center, 14.0),
        CameraPose::new(center, 14.0).with_azimuth(90.0),
        CameraPose::new(center, 14.0).with_azimuth(180.0).with_tilt(30.0),
        CameraPose::new(center, 10.0),
    ]
}

async fn wait_for_photos(
    registry: &mut OverlayRegistry,
    surface: &mut SoftwareSurface,
    timeout: Duration,
) -> usize {
    let id = surface.id();
    let deadline = tokio::time::Instant::now() + timeout;
    let mut applied = 0;
    while let Some(renderer) = registry.get_mut(id) {
        applied += renderer.pump(surface);
        if renderer.pending_loads() == 0 {
            break;
        }
        if tokio::time::Instant::now() >= deadline {
            log::warn!("{} photo loads still pending at timeout", renderer.pending_loads());
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    applied
}

fn write_icons(registry: &OverlayRegistry, surface: &SoftwareSurface, out: &Path) -> anyhow::Result<usize> {
    let Some(renderer) = registry.get(surface.id()) else {
        return Ok(0);
    };
    let mut written = 0;
    for poi in renderer.tracked() {
        let Some(marker) = renderer.marker(&poi.id) else {
            continue;
        };
        let Some(placemark) = surface.placemark(marker.placemark) else {
            continue;
        };
        let kind = if placemark.icon.has_photo() { "photo" } else { "shell" };
        let path = out.join(format!("{}-{kind}.png", sanitize(poi.id.as_str())));
        placemark
            .icon
            .image()
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        written += 1;
    }
    Ok(written)
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
