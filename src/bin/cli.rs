use anyhow::{bail, Context};
use camtex::catalog::DeviceCatalog;
use camtex::config::CamTexConfig;
use camtex::identifier::CompositeAddress;
use camtex::session::notice::NoticeKind;
use camtex::session::{SessionController, SessionSettings};
use camtex::testing::{SimulatedCameraService, SimulatedGraphics, SimulatedRig};
use std::env;
use std::sync::Arc;
use std::time::Duration;

const USAGE: &str = "Usage: camtex-cli <list|parse|preview> [args]
  list [--rig FILE] [--config FILE] [--json]
  parse <camera_id>
  preview <camera_id> [--rig FILE] [--config FILE] [--frames N] [--timeout MS]";

fn main() -> anyhow::Result<()> {
    camtex::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "list" => cmd_list(&args),
        "parse" => cmd_parse(&args),
        "preview" => cmd_preview(&args),
        _ => {
            eprintln!("Unknown command: {}\n{}", command, USAGE);
            std::process::exit(1);
        }
    }
}

/// Value following `flag`, if present
fn flag_value<'a>(args: &'a [String], flag: &str) -> anyhow::Result<Option<&'a str>> {
    match args.iter().position(|arg| arg == flag) {
        Some(i) => match args.get(i + 1) {
            Some(value) => Ok(Some(value.as_str())),
            None => bail!("{} needs a value", flag),
        },
        None => Ok(None),
    }
}

fn load_rig(args: &[String]) -> anyhow::Result<SimulatedRig> {
    match flag_value(args, "--rig")? {
        Some(path) => {
            SimulatedRig::load_from_file(path).with_context(|| format!("loading rig {}", path))
        }
        None => Ok(SimulatedRig::multi_camera_phone()),
    }
}

fn load_config(args: &[String]) -> anyhow::Result<CamTexConfig> {
    let config = match flag_value(args, "--config")? {
        Some(path) => CamTexConfig::load_from_file(path)?,
        None => CamTexConfig::load_or_default(),
    };
    config.validate()?;
    Ok(config)
}

fn cmd_list(args: &[String]) -> anyhow::Result<()> {
    let service = SimulatedCameraService::new(load_rig(args)?);
    let config = load_config(args)?;
    let report = DeviceCatalog::with_config(&service, config.catalog).enumerate();

    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        for camera in &report.cameras {
            println!(
                "{}: {} {} {}mm",
                camera.display_id(),
                camera.kind.as_str(),
                camera.facing.as_str(),
                camtex::types::format_focal_length(camera.focal_length_mm)
            );
        }
        for diagnostic in &report.diagnostics {
            eprintln!("skipped {}: {}", diagnostic.camera_id, diagnostic.error);
        }
    }
    Ok(())
}

fn cmd_parse(args: &[String]) -> anyhow::Result<()> {
    let Some(camera_id) = args.get(2) else {
        bail!("Usage: camtex-cli parse <camera_id>");
    };
    let address: CompositeAddress = camera_id.parse()?;
    println!("{}", serde_json::to_string(&address)?);
    Ok(())
}

fn cmd_preview(args: &[String]) -> anyhow::Result<()> {
    let Some(camera_id) = args.get(2).filter(|arg| !arg.starts_with("--")) else {
        bail!("Usage: camtex-cli preview <camera_id> [--frames N]");
    };
    let frames: u32 = match flag_value(args, "--frames")? {
        Some(value) => value.parse().context("--frames")?,
        None => 30,
    };
    let timeout_ms: u64 = match flag_value(args, "--timeout")? {
        Some(value) => value.parse().context("--timeout")?,
        None => 2000,
    };

    let config = load_config(args)?;
    let [width, height] = config.session.default_resolution;
    let service = Arc::new(SimulatedCameraService::new(load_rig(args)?));
    let graphics = Arc::new(SimulatedGraphics::new());
    let mut controller = SessionController::with_settings(
        service.clone(),
        graphics.clone(),
        SessionSettings::from(&config),
    );
    let notices = controller.subscribe();

    let texture = controller.start_camera(Some(camera_id), width, height)?;
    println!("texture {}", texture.0);

    loop {
        let notice = notices
            .recv_timeout(Duration::from_millis(timeout_ms))
            .context("waiting for the session to start")?;
        println!("{}", serde_json::to_string(&notice)?);
        match notice.kind {
            NoticeKind::PreviewStarted { .. } => break,
            NoticeKind::Failed { kind, message } => {
                controller.stop();
                bail!("session failed ({}): {}", kind, message);
            }
            _ => {}
        }
    }

    for _ in 0..frames {
        controller.update_texture();
    }
    println!("latched {} frames", graphics.frames_latched(texture));
    if let Some(request) = service.last_request() {
        println!(
            "request on {} physical={:?} zoom={:?}",
            request.camera_id, request.physical_camera_id, request.zoom_ratio
        );
    }

    controller.stop();
    for notice in notices.try_iter() {
        println!("{}", serde_json::to_string(&notice)?);
    }
    Ok(())
}
