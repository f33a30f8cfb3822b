use std::path::PathBuf;

use scrimctl::ControllerSettings;
use scrimctl::commands::simulate::collapse_trace;
use scrimctl::layer::ScrimLayer;
use scrimctl::simulate::{CallbackEventKind, Scenario, Simulation, SimulationOptions};
use scrimctl::state::ScrimState;

fn demo(name: &str) -> Scenario {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join(name);
    Scenario::load(&path).unwrap()
}

fn replay(scenario: &Scenario, settings: ControllerSettings) -> Simulation {
    let options = SimulationOptions {
        auxiliary: scenario.auxiliary,
        screen_on: scenario.screen_on,
        ..SimulationOptions::default()
    };
    let mut sim = Simulation::new(settings, options).unwrap();
    sim.run_scenario(scenario).unwrap();
    sim
}

#[test]
fn test_unlock_from_aod_demo() {
    let sim = replay(&demo("unlock_from_aod.toml"), ControllerSettings::default());

    assert_eq!(sim.controller().state(), ScrimState::Unlocked);
    assert_eq!(sim.callback_count("step-1", CallbackEventKind::Finished), 1);
    assert_eq!(sim.callback_count("step-5", CallbackEventKind::Finished), 1);
    assert!(!sim.controller().is_wake_lock_held());

    let states: Vec<_> = sim
        .state_dispatches()
        .iter()
        .map(|dispatch| dispatch.state)
        .collect();
    assert!(states.contains(&ScrimState::Aod));
    assert_eq!(states.last(), Some(&ScrimState::Unlocked));
}

#[test]
fn test_shade_drag_demo() {
    let sim = replay(&demo("shade_drag.toml"), ControllerSettings::default());

    assert_eq!(sim.controller().state(), ScrimState::ShadeLocked);
    assert!(sim.alpha(ScrimLayer::Notifications) > 0.0);
    assert_eq!(sim.controller().qs_expansion(), 0.5);
}

#[test]
fn test_blanking_demo_reports_blanked_display() {
    let mut settings = ControllerSettings::default();
    settings.doze.display_needs_blanking = true;
    let sim = replay(&demo("blanking.toml"), settings);

    assert_eq!(sim.controller().state(), ScrimState::Aod);
    assert_eq!(sim.callback_count("step-2", CallbackEventKind::DisplayBlanked), 1);
    assert_eq!(sim.callback_count("step-2", CallbackEventKind::Finished), 1);
}

#[test]
fn test_collapsed_trace_has_no_repeats() {
    let sim = replay(&demo("shade_drag.toml"), ControllerSettings::default());
    let collapsed = collapse_trace(sim.trace());

    assert!(!collapsed.is_empty());
    assert!(collapsed.len() <= sim.trace().len());
    for pair in collapsed.windows(2) {
        assert!(!pair[0].same_output(&pair[1]));
    }
}
