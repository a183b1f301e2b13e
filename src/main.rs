use std::env;
use std::fs;
use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use rand::Rng;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use radial_gauge::{GaugeCommand, GaugeConfig, RadialGauge};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut max_value: i32 = 100;
    let mut fill_value: i32 = 0;
    let mut steps: i32 = 48;
    let mut gradient = false;
    let mut demo = false;
    let mut title = "Radial Gauge".to_string();
    let mut font_path: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--max" => {
                if let Some(v) = args.next() {
                    max_value = v.parse().context("--max expects an integer")?;
                }
            }
            "--value" => {
                if let Some(v) = args.next() {
                    fill_value = v.parse().context("--value expects an integer")?;
                }
            }
            "--steps" => {
                if let Some(v) = args.next() {
                    steps = v.parse().context("--steps expects an integer")?;
                }
            }
            "--title" => {
                if let Some(v) = args.next() {
                    title = v;
                }
            }
            "--font" => {
                font_path = args.next();
            }
            "--gradient" => gradient = true,
            "--demo" => demo = true,
            other => debug!(argument = %other, "ignoring unknown argument"),
        }
    }

    // Tick labels and the readout need font outlines; without --font the
    // gauge renders with no text.
    let font_data: &'static [u8] = match &font_path {
        Some(path) => {
            let bytes = fs::read(path).with_context(|| format!("reading font file {path}"))?;
            Box::leak(bytes.into_boxed_slice())
        }
        None => &[],
    };

    let config = GaugeConfig::builder()
        .max_value(max_value)
        .fill_value(fill_value)
        .steps(steps)
        .gradient_fill(gradient)
        .title(title)
        .font_data(font_data)
        .build();

    let mut gauge = RadialGauge::new(config);
    let (tx, rx) = mpsc::channel();

    if demo {
        info!("running demo random walk");
        thread::spawn(move || {
            let mut rng = rand::rng();
            let demo_max = max_value.max(1);
            let mut value = demo_max / 2;
            loop {
                value = (value + rng.random_range(-3..=3)).clamp(0, demo_max);
                if tx.send(GaugeCommand::SetFillValue(value)).is_err() {
                    break;
                }
                thread::sleep(Duration::from_millis(50));
            }
        });
    } else {
        // Feed fill values from stdin, one integer per line
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match line.trim().parse::<i32>() {
                    Ok(value) => {
                        if tx.send(GaugeCommand::SetFillValue(value)).is_err() {
                            break;
                        }
                    }
                    Err(err) => debug!(%err, line = %line, "ignoring unparseable input"),
                }
            }
        });
    }

    gauge.show_with_commands(rx)?;
    Ok(())
}
