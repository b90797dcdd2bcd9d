//! Replays a recorded device trace through the full sensor stack.
//!
//! Reads a JSON-lines trace of legacy device events, drives a manual
//! clock from the record timestamps, feeds the events through the
//! platform into polyfilled sensors, and runs the walking detector and
//! view trackers off their readings. Useful for tuning walking
//! parameters against recorded walks without a phone in hand.
//!
//! Usage: `kin-replay <trace.jsonl> [walk-config.json]`
//!
//! Trace records, one JSON object per line:
//!
//! ```text
//! {"kind":"motion","t":20.0,"acceleration_including_gravity":[0.1,0.2,9.8]}
//! {"kind":"orientation","t":20.0,"alpha":90.0,"beta":85.0,"gamma":1.0}
//! {"kind":"screen_angle","t":500.0,"degrees":90.0}
//! ```

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use kin_core::{
    DeviceMotionEvent, DeviceOrientationEvent, ManualClock, MotionAxes, Platform, PlatformConfig,
    RotationRate,
};
use kin_math::Vec3;
use kin_sensors::{Accelerometer, RelativeOrientationSensor};
use kin_trackers::{PlaybackDirection, ViewTracker};
use kin_walk::{WalkConfig, WalkingDetector};

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TraceRecord {
    Motion {
        /// Milliseconds since the start of the trace.
        t: f64,
        #[serde(default)]
        acceleration: Option<[f64; 3]>,
        #[serde(default)]
        acceleration_including_gravity: Option<[f64; 3]>,
        #[serde(default)]
        rotation_rate: Option<[f64; 3]>,
        #[serde(default = "default_interval")]
        interval: f64,
    },
    Orientation {
        t: f64,
        #[serde(default)]
        alpha: Option<f64>,
        #[serde(default)]
        beta: Option<f64>,
        #[serde(default)]
        gamma: Option<f64>,
        #[serde(default)]
        absolute: bool,
        #[serde(default)]
        compass_heading: Option<f64>,
    },
    ScreenAngle {
        t: f64,
        degrees: f64,
    },
}

impl TraceRecord {
    fn timestamp(&self) -> f64 {
        match self {
            Self::Motion { t, .. } | Self::Orientation { t, .. } | Self::ScreenAngle { t, .. } => {
                *t
            }
        }
    }
}

fn default_interval() -> f64 {
    20.0
}

fn axes(values: Option<[f64; 3]>) -> Option<MotionAxes> {
    values.map(|[x, y, z]| MotionAxes::new(x, y, z))
}

struct ReplaySummary {
    records: usize,
    skipped: usize,
    decisions: usize,
    walking_windows: usize,
    direction_changes: usize,
    errors: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let trace_path = args
        .next()
        .context("usage: kin-replay <trace.jsonl> [walk-config.json]")?;
    let walk_config = match args.next() {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("opening {path}"))?;
            serde_json::from_reader(file).with_context(|| format!("parsing {path}"))?
        }
        None => WalkConfig::default(),
    };

    let trace = File::open(&trace_path).with_context(|| format!("opening {trace_path}"))?;
    let summary = replay(BufReader::new(trace), walk_config)?;

    println!("replayed {} trace records ({} skipped)", summary.records, summary.skipped);
    println!(
        "walking decisions: {} ({} walking windows)",
        summary.decisions, summary.walking_windows
    );
    println!("playback direction changes: {}", summary.direction_changes);
    println!("sensor errors: {}", summary.errors);
    Ok(())
}

fn replay(trace: impl BufRead, walk_config: WalkConfig) -> Result<ReplaySummary> {
    let clock = ManualClock::new();
    let platform = Platform::with_clock(PlatformConfig::default(), Rc::new(clock.clone()));

    let detector = Rc::new(RefCell::new(WalkingDetector::with_config(walk_config)));
    let view = Rc::new(RefCell::new(ViewTracker::new()));
    let playback = Rc::new(RefCell::new(PlaybackDirection::new()));
    let walking_windows = Rc::new(RefCell::new(0usize));
    let decisions = Rc::new(RefCell::new(0usize));
    let direction_changes = Rc::new(RefCell::new(0usize));
    let errors = Rc::new(RefCell::new(0usize));

    let accelerometer = Accelerometer::new(&platform)?;
    {
        let sensor = accelerometer.clone();
        let detector = Rc::clone(&detector);
        let decisions = Rc::clone(&decisions);
        let walking_windows = Rc::clone(&walking_windows);
        accelerometer.on_reading(move |_| {
            let (Some(x), Some(y), Some(z)) = (sensor.x(), sensor.y(), sensor.z()) else {
                return;
            };
            if let Some(walking) = detector.borrow_mut().record(Vec3::new(x, y, z)) {
                *decisions.borrow_mut() += 1;
                if walking {
                    *walking_windows.borrow_mut() += 1;
                }
            }
        });
    }
    {
        let errors = Rc::clone(&errors);
        accelerometer.on_error(move |event| {
            if let Some(error) = event.error_payload() {
                warn!("accelerometer failed: {error}");
            }
            *errors.borrow_mut() += 1;
        });
    }

    let orientation = RelativeOrientationSensor::new(&platform)?;
    {
        let sensor = orientation.clone();
        let screen_angle = platform.screen_angle().clone();
        let view = Rc::clone(&view);
        let playback = Rc::clone(&playback);
        let direction_changes = Rc::clone(&direction_changes);
        orientation.on_reading(move |_| {
            let Some(quaternion) = sensor.quaternion() else {
                return;
            };
            let mut view = view.borrow_mut();
            view.update(&quaternion, screen_angle.radians());
            if playback.borrow_mut().update(view.longitude()) {
                *direction_changes.borrow_mut() += 1;
            }
        });
    }
    {
        let errors = Rc::clone(&errors);
        orientation.on_error(move |event| {
            if let Some(error) = event.error_payload() {
                warn!("orientation sensor failed: {error}");
            }
            *errors.borrow_mut() += 1;
        });
    }

    accelerometer.start();
    orientation.start();

    let mut records = 0usize;
    let mut skipped = 0usize;
    for (number, line) in trace.lines().enumerate() {
        let line = line.context("reading trace")?;
        if line.trim().is_empty() {
            continue;
        }
        let record: TraceRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(error) => {
                warn!("skipping malformed trace line {}: {error}", number + 1);
                skipped += 1;
                continue;
            }
        };
        clock.set(record.timestamp());
        match record {
            TraceRecord::Motion {
                acceleration,
                acceleration_including_gravity,
                rotation_rate,
                interval,
                ..
            } => {
                platform.push_motion(&DeviceMotionEvent {
                    acceleration: axes(acceleration),
                    acceleration_including_gravity: axes(acceleration_including_gravity),
                    rotation_rate: rotation_rate.map(|[alpha, beta, gamma]| {
                        RotationRate::new(alpha, beta, gamma)
                    }),
                    interval,
                });
            }
            TraceRecord::Orientation {
                alpha,
                beta,
                gamma,
                absolute,
                compass_heading,
                ..
            } => {
                platform.push_orientation(&DeviceOrientationEvent {
                    alpha,
                    beta,
                    gamma,
                    absolute,
                    compass_heading,
                });
            }
            TraceRecord::ScreenAngle { degrees, .. } => {
                platform.set_screen_angle(degrees);
            }
        }
        platform.run_timers();
        records += 1;
    }

    accelerometer.stop();
    orientation.stop();

    Ok(ReplaySummary {
        records,
        skipped,
        decisions: *decisions.borrow(),
        walking_windows: *walking_windows.borrow(),
        direction_changes: *direction_changes.borrow(),
        errors: *errors.borrow(),
    })
}
