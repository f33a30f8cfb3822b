//! Implementation of the `simulate` command.
//!
//! Replays a scenario file against simulated surfaces on a virtual clock and prints what
//! every layer rendered. Consecutive frames with identical output are collapsed so that
//! only changes show up.
//!
//! ```toml
//! settle_ms = 1500
//!
//! [[step]]
//! at_ms = 0
//! event = { type = "transition", state = "keyguard" }
//!
//! [[step]]
//! at_ms = 400
//! event = { type = "panel_expansion", fraction = 0.4 }
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::backend::simulated::WakeLockEvent;
use crate::controller::ScrimVisibility;
use crate::layer::ScrimLayer;
use crate::simulate::{
    CallbackEvent, Scenario, Simulation, SimulationOptions, StateDispatch, TraceFrame,
};
use crate::state::ScrimState;

/// Everything a scenario run produced.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub final_state: ScrimState,
    pub frames: Vec<TraceFrame>,
    pub callbacks: Vec<CallbackEvent>,
    pub state_dispatches: Vec<StateDispatch>,
    pub visibility_changes: Vec<ScrimVisibility>,
    pub wake_lock: Vec<WakeLockEvent>,
}

/// Keep the first frame and every frame whose output differs from the one before it.
pub fn collapse_trace(frames: &[TraceFrame]) -> Vec<TraceFrame> {
    let mut collapsed: Vec<TraceFrame> = Vec::new();
    for frame in frames {
        if collapsed
            .last()
            .is_none_or(|previous| !previous.same_output(frame))
        {
            collapsed.push(frame.clone());
        }
    }
    collapsed
}

/// Replay `scenario` with the current configuration.
pub fn run_scenario(scenario: &Scenario) -> Result<SimulationReport> {
    let config = super::load_config()?;
    let options = SimulationOptions {
        frame_interval: config.frame_interval(),
        auxiliary: scenario.auxiliary,
        wake_lock: true,
        screen_on: scenario.screen_on,
    };

    let mut simulation = Simulation::new(config.controller_settings(), options)
        .context("Failed to attach the scrim controller")?;
    simulation.run_scenario(scenario)?;

    Ok(SimulationReport {
        final_state: simulation.controller().state(),
        frames: collapse_trace(simulation.trace()),
        callbacks: simulation.callback_events(),
        state_dispatches: simulation.state_dispatches(),
        visibility_changes: simulation.visibility_changes(),
        wake_lock: simulation.wake_lock().events(),
    })
}

/// Handle the `simulate` command.
///
/// # Arguments
/// * `scenario_path` - Scenario file to replay
/// * `json` - Print the report as JSON instead of the log layout
pub fn handle_simulate_command(scenario_path: &str, json: bool) -> Result<()> {
    let scenario = Scenario::load(Path::new(scenario_path))?;

    if json {
        // Keep stdout machine-readable
        crate::logger::Log::set_enabled(false);
        let report = run_scenario(&scenario)?;
        let output =
            serde_json::to_string_pretty(&report).context("Failed to serialize the trace")?;
        println!("{output}");
        return Ok(());
    }

    log_version!();
    log_block_start!("Simulating {scenario_path}");
    log_indented!("{} steps, settling for {}ms", scenario.steps.len(), scenario.settle_ms);

    let report = run_scenario(&scenario)?;
    print_report(&report);
    log_end!();
    Ok(())
}

fn print_report(report: &SimulationReport) {
    log_block_start!("Frames:");
    for frame in &report.frames {
        log_indented!("{}", format_frame(frame));
    }

    if !report.callbacks.is_empty() {
        log_block_start!("Callbacks:");
        for event in &report.callbacks {
            log_indented!("t={:>6}ms {} {:?}", event.time_ms, event.label, event.kind);
        }
    }

    let acquired = report
        .wake_lock
        .iter()
        .filter(|event| **event == WakeLockEvent::Acquire)
        .count();
    log_block_start!("Final state: {}", report.final_state);
    log_indented!(
        "Wake lock acquired {} times, released {} times",
        acquired,
        report.wake_lock.len() - acquired
    );
    if let Some(visibility) = report.visibility_changes.last() {
        log_indented!("Scrims are {visibility}");
    }
}

/// One trace line: time, state, per-layer alpha, visibility and wake lock.
fn format_frame(frame: &TraceFrame) -> String {
    let layers: Vec<String> = frame
        .layers
        .iter()
        .map(|sample| {
            let name = match sample.layer {
                ScrimLayer::Front => "front",
                ScrimLayer::Behind => "behind",
                ScrimLayer::Notifications => "notif",
                ScrimLayer::Auxiliary => "aux",
            };
            format!("{name}={:.3}/{}", sample.alpha, sample.tint)
        })
        .collect();
    let visibility = frame
        .visibility
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "t={:>6}ms {:<18} {} [{}]{}",
        frame.time_ms,
        frame.state,
        layers.join(" "),
        visibility,
        if frame.wake_lock_held { " wake" } else { "" }
    )
}

/// Display detailed help for the simulate command.
pub fn display_help() {
    log_version!();
    log_block_start!("simulate - Replay a scripted scenario");
    log_block_start!("Usage: scrimctl simulate <scenario.toml> [--json] [--log <file>]");
    log_block_start!("Scenario format:");
    log_indented!("settle_ms = 2000       # Keep running after the last step");
    log_indented!("auxiliary = true       # Attach the auxiliary layer");
    log_indented!("screen_on = true       # Screen is on before the first step");
    log_pipe!();
    log_indented!("[[step]]");
    log_indented!("at_ms = 0");
    log_indented!("event = {{ type = \"transition\", state = \"keyguard\" }}");
    log_block_start!("Events:");
    log_indented!("transition, panel_expansion, qs_position, tracking_started,");
    log_indented!("expanding_finished, screen_on, screen_off, aod_front_alpha,");
    log_indented!("wake_lock_screen_sensor, backdrop, ambient_wallpaper,");
    log_indented!("keyguard_occluded, expansion_affects_alpha, keyguard_fading_away,");
    log_indented!("launching_affordance, docked, always_on, slow_unlock, theme_changed");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::color::Color;
    use crate::simulate::LayerSample;

    fn frame(time_ms: u64, behind: f32) -> TraceFrame {
        TraceFrame {
            time_ms,
            state: ScrimState::Keyguard,
            layers: vec![LayerSample {
                layer: ScrimLayer::Behind,
                alpha: behind,
                tint: Color::BLACK,
            }],
            visibility: Some(ScrimVisibility::classify(0.0, behind)),
            wake_lock_held: false,
        }
    }

    #[test]
    fn test_collapse_trace_keeps_changes() {
        let frames = vec![
            frame(0, 0.0),
            frame(16, 0.1),
            frame(32, 0.2),
            frame(48, 0.2),
            frame(64, 0.2),
        ];
        let times: Vec<_> = collapse_trace(&frames)
            .iter()
            .map(|frame| frame.time_ms)
            .collect();
        assert_eq!(times, vec![0, 16, 32]);
    }

    #[test]
    fn test_collapse_empty_trace() {
        assert!(collapse_trace(&[]).is_empty());
    }

    #[test]
    fn test_format_frame() {
        let line = format_frame(&frame(16, 0.25));
        assert!(line.starts_with("t=    16ms KEYGUARD"));
        assert!(line.contains("behind=0.250/0xff000000"));
        assert!(line.ends_with("[semi-transparent]"));
    }
}
