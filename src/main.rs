use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

use reba_posture::config::{Config, ConfigSource};
use reba_posture::monitor::{AssessMode, Monitor};
use reba_posture::pose::frame_from_json;
use reba_posture::reba::{parse_weight, ActivityType, AssessmentContext, AssessmentResult, Assessor};
use reba_posture::session::CaptureSession;

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_PATH.to_string());
    let (config, source) =
        Config::load_or_default(&path).with_context(|| format!("failed to load {}", path))?;
    config.log.init();
    if source == ConfigSource::Defaults {
        tracing::info!(%path, "config not found, using defaults");
    }

    println!("=== REBA Posture Assessment ({}) ===", env!("GIT_VERSION"));
    println!("Mode: {:?}  Camera: {}", config.session.mode, config.session.camera);
    println!();
    println!("Commands:");
    println!("  [ ... ]       - landmark frame (JSON array of 33 objects / null)");
    println!("  w <kg>        - set object weight (e.g. w 12)");
    println!("  a <activity>  - set activity: none / bending / lifting");
    println!("  m <mode>      - continuous / snapshot");
    println!("  s             - snapshot: assess the latest frame");
    println!("  c             - switch camera");
    println!("  p             - pause / resume capture");
    println!("  q             - quit");
    println!();

    let mut session = CaptureSession::new(config.session.camera);
    session.start()?;
    let mut monitor = Monitor::new(
        Assessor::new(config.scoring.clone()),
        config.session.mode,
        session.slot().clone(),
    );
    let mut context = AssessmentContext::default();

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            match frame_from_json(line) {
                Ok(frame) => {
                    if !session.accept(frame.clone()) {
                        println!("Capture paused, frame ignored");
                    } else if let Some(result) = monitor.on_frame(&frame, &context) {
                        render(&result);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "frame rejected");
                    println!("Rejected: {}", e);
                }
            }
            continue;
        }

        let (cmd, arg) = line
            .split_once(char::is_whitespace)
            .map(|(c, a)| (c, a.trim()))
            .unwrap_or((line, ""));

        match cmd {
            "w" => {
                context = AssessmentContext::new(parse_weight(arg), context.activity);
                println!("Weight: {} kg", context.object_weight_kg);
            }
            "a" => {
                context.activity = ActivityType::parse_lenient(arg);
                println!("Activity: {}", context.activity);
            }
            "m" => match arg.parse::<AssessMode>() {
                Ok(mode) => {
                    monitor.set_mode(mode);
                    println!("Mode: {:?}", mode);
                }
                Err(e) => println!("{}", e),
            },
            "s" => match monitor.snapshot(&context) {
                Some(result) => render(&result),
                None => println!("No frame received yet"),
            },
            "c" => match session.switch_camera() {
                Ok(facing) => println!("Camera: {}", facing),
                Err(e) => println!("{}", e),
            },
            "p" => {
                let toggled = if session.is_capturing() {
                    session.stop()
                } else {
                    session.start()
                };
                match toggled {
                    Ok(()) => println!("State: {:?}", session.state()),
                    Err(e) => println!("{}", e),
                }
            }
            "q" => {
                println!("Shutting down...");
                break;
            }
            _ => {
                println!("Unknown command: {}", cmd);
            }
        }
    }

    if session.is_capturing() {
        session.stop()?;
    }
    Ok(())
}

fn render(result: &AssessmentResult) {
    print!("{}", result);
}
