use anyhow::{bail, Context};
use crabcapture::permissions::check_permission_detailed;
use crabcapture::testing::SyntheticDriver;
use crabcapture::{
    CameraFrame, CaptureController, CaptureDriver, CrabCaptureConfig, NativeDriver, SetupResult,
};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn main() -> anyhow::Result<()> {
    crabcapture::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: crabcapture-cli <list-devices|permission|run> [args]");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "list-devices" => cmd_list_devices(&args),
        "permission" => cmd_permission(&args),
        "run" => cmd_run(&args),
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn cmd_list_devices(args: &[String]) -> anyhow::Result<()> {
    let devices = NativeDriver::new().devices()?;
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&devices)?);
    } else {
        for d in devices {
            println!("{}: {} ({} {})", d.id, d.name, d.device_type, d.position);
        }
    }
    Ok(())
}

fn cmd_permission(args: &[String]) -> anyhow::Result<()> {
    let info = check_permission_detailed();
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!("{}: {}", info.status, info.message);
    }
    Ok(())
}

const POLL: Duration = Duration::from_millis(100);

#[derive(Debug, PartialEq)]
struct RunOptions {
    synthetic: bool,
    frames: u64,
    timeout_ms: u64,
    config_path: Option<String>,
    json: bool,
}

fn parse_run_options(args: &[String]) -> anyhow::Result<RunOptions> {
    // run [--synthetic] [--frames <n>] [--timeout-ms <ms>] [--config <path>] [--json]
    let mut options = RunOptions {
        synthetic: false,
        frames: 30,
        timeout_ms: 10_000,
        config_path: None,
        json: false,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--synthetic" => options.synthetic = true,
            "--json" => options.json = true,
            "--frames" => {
                i += 1;
                options.frames = args.get(i).context("--frames needs a value")?.parse()?;
            }
            "--timeout-ms" => {
                i += 1;
                options.timeout_ms = args.get(i).context("--timeout-ms needs a value")?.parse()?;
            }
            "--config" => {
                i += 1;
                options.config_path = Some(args.get(i).context("--config needs a path")?.clone());
            }
            other => bail!("Unknown option for run: {}", other),
        }
        i += 1;
    }
    Ok(options)
}

fn cmd_run(args: &[String]) -> anyhow::Result<()> {
    let options = parse_run_options(args)?;

    let config = match &options.config_path {
        Some(path) => CrabCaptureConfig::load_layered(path)?,
        None => CrabCaptureConfig::load_layered(CrabCaptureConfig::default_path())?,
    };

    let driver: Box<dyn CaptureDriver> = if options.synthetic {
        Box::new(SyntheticDriver::new().with_frame_size(320, 240))
    } else {
        Box::new(NativeDriver::new())
    };

    let controller = CaptureController::new(driver, config)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;

    let (tx, rx) = mpsc::sync_channel::<CameraFrame>(8);
    controller.register_frame_consumer(move |frame: CameraFrame| {
        // Drop frames the printer cannot keep up with
        let _ = tx.try_send(frame);
    });

    let timeout = Duration::from_millis(options.timeout_ms);
    let deadline = Instant::now().checked_add(timeout);
    match controller.wait_for_setup(timeout) {
        Some(SetupResult::Success) => {}
        Some(result) => {
            let reason = controller
                .configuration_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| result.to_string());
            bail!("Capture session did not start: {}", reason);
        }
        None => bail!("Capture session setup still pending after {:?}", timeout),
    }

    let mut received = 0u64;
    while received < options.frames && !interrupted.load(Ordering::SeqCst) {
        let wait = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                (deadline - now).min(POLL)
            }
            None => POLL,
        };
        let Ok(frame) = rx.recv_timeout(wait) else {
            continue;
        };
        received += 1;
        if options.json {
            println!(
                "{}",
                serde_json::json!({
                    "sequence": frame.sequence,
                    "timestamp": frame.timestamp.to_rfc3339(),
                    "width": frame.width,
                    "height": frame.height,
                    "format": frame.format,
                    "device_id": frame.device_id,
                    "orientation": frame.orientation,
                    "bytes": frame.size_bytes(),
                })
            );
        } else {
            println!(
                "Frame: {}x{} {} seq:{} ({} bytes)",
                frame.width,
                frame.height,
                frame.format,
                frame.sequence,
                frame.size_bytes()
            );
        }
    }

    controller.stop();
    let output = controller.frame_output();
    eprintln!(
        "Received {} frames (delivered {}, dropped {})",
        received,
        output.delivered_frames(),
        output.dropped_frames()
    );
    Ok(())
}
