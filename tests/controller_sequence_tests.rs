use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use scrimctl::ControllerSettings;
use scrimctl::backend::simulated::WakeLockEvent;
use scrimctl::blanking::BlankingPhase;
use scrimctl::layer::ScrimLayer;
use scrimctl::simulate::{CallbackEventKind, Simulation, SimulationOptions};
use scrimctl::state::ScrimState;

const EPSILON: f32 = 1e-6;
const SETTLE_LIMIT: Duration = Duration::from_secs(10);

/// Any state the controller may be asked to enter
fn state_strategy() -> impl Strategy<Value = ScrimState> {
    prop::sample::select(
        ScrimState::ALL
            .into_iter()
            .filter(|state| *state != ScrimState::Uninitialized)
            .collect::<Vec<_>>(),
    )
}

/// A transition and how long to wait before the next one
fn plan_strategy() -> impl Strategy<Value = Vec<(ScrimState, u64)>> {
    prop::collection::vec((state_strategy(), 0u64..600), 1..12)
}

fn run_plan(
    plan: &[(ScrimState, u64)],
    always_on: bool,
    display_needs_blanking: bool,
    screen_on: bool,
) -> Simulation {
    let mut settings = ControllerSettings::default();
    settings.doze.always_on = always_on;
    settings.doze.display_needs_blanking = display_needs_blanking;
    let options = SimulationOptions {
        screen_on,
        ..SimulationOptions::default()
    };

    let mut sim = Simulation::new(settings, options).unwrap();
    for (index, (state, wait_ms)) in plan.iter().enumerate() {
        sim.transition(*state, &format!("t{index}")).unwrap();
        sim.advance(Duration::from_millis(*wait_ms)).unwrap();
    }
    sim.run_until_idle(SETTLE_LIMIT).unwrap();
    sim
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Acquire and release strictly alternate and balance once everything settled
    #[test]
    fn test_wake_lock_balanced(
        plan in plan_strategy(),
        always_on in any::<bool>(),
        blanking in any::<bool>(),
    ) {
        let sim = run_plan(&plan, always_on, blanking, true);
        let events = sim.wake_lock().events();

        for pair in events.windows(2) {
            prop_assert_ne!(pair[0], pair[1], "wake lock events {:?}", events);
        }
        if let Some(first) = events.first() {
            prop_assert_eq!(*first, WakeLockEvent::Acquire);
        }
        prop_assert!(sim.is_idle());
        prop_assert!(!sim.controller().is_wake_lock_held());
        prop_assert_eq!(
            sim.wake_lock().count(WakeLockEvent::Acquire),
            sim.wake_lock().count(WakeLockEvent::Release)
        );
    }

    /// Every callback gets exactly one of finished or cancelled
    #[test]
    fn test_each_callback_terminates_once(
        plan in plan_strategy(),
        blanking in any::<bool>(),
        screen_on in any::<bool>(),
    ) {
        let sim = run_plan(&plan, false, blanking, screen_on);

        for index in 0..plan.len() {
            let label = format!("t{index}");
            let finished = sim.callback_count(&label, CallbackEventKind::Finished);
            let cancelled = sim.callback_count(&label, CallbackEventKind::Cancelled);
            prop_assert_eq!(
                finished + cancelled,
                1,
                "{} finished {} times, cancelled {} times",
                label,
                finished,
                cancelled
            );
        }
    }

    /// Only the last transition can still be reported as finished after a later one started
    #[test]
    fn test_superseded_callbacks_never_finish_late(plan in plan_strategy()) {
        let sim = run_plan(&plan, false, false, true);
        let events = sim.callback_events();

        let mut cancelled = HashSet::new();
        for event in &events {
            match event.kind {
                CallbackEventKind::Cancelled => {
                    cancelled.insert(event.label.clone());
                }
                CallbackEventKind::Finished => {
                    prop_assert!(
                        !cancelled.contains(&event.label),
                        "{} finished after being cancelled",
                        event.label
                    );
                }
                _ => {}
            }
        }
    }

    /// The visibility listener only hears about changes
    #[test]
    fn test_visibility_reports_changes_only(
        plan in plan_strategy(),
        blanking in any::<bool>(),
    ) {
        let sim = run_plan(&plan, false, blanking, true);
        let changes = sim.visibility_changes();

        prop_assert!(!changes.is_empty());
        for pair in changes.windows(2) {
            prop_assert_ne!(pair[0], pair[1], "visibility changes {:?}", changes);
        }
        prop_assert_eq!(changes.last().copied(), sim.controller().visibility());
    }

    /// Once idle, every layer shows its target
    #[test]
    fn test_settles_on_targets(
        plan in plan_strategy(),
        always_on in any::<bool>(),
        blanking in any::<bool>(),
    ) {
        let sim = run_plan(&plan, always_on, blanking, true);
        let controller = sim.controller();

        prop_assert_eq!(controller.state(), plan.last().map(|(state, _)| *state).unwrap());
        for layer in [ScrimLayer::Front, ScrimLayer::Behind, ScrimLayer::Auxiliary] {
            prop_assert!(!controller.is_animating(layer));
            let rendered = controller.rendered_alpha(layer).unwrap();
            let target = controller.target_alpha(layer);
            prop_assert!(
                (rendered - target).abs() < EPSILON,
                "{:?} rendered {} but targets {}",
                layer,
                rendered,
                target
            );
        }
    }
}

#[test]
fn test_aod_without_screen_off_animation_applies_synchronously() {
    let mut settings = ControllerSettings::default();
    settings.doze.controls_screen_off = false;
    let mut sim = Simulation::new(settings, SimulationOptions::default()).unwrap();

    sim.transition(ScrimState::Keyguard, "keyguard").unwrap();
    sim.run_until_idle(SETTLE_LIMIT).unwrap();

    sim.transition(ScrimState::Aod, "aod").unwrap();
    let controller = sim.controller();
    for layer in [ScrimLayer::Front, ScrimLayer::Behind, ScrimLayer::Auxiliary] {
        assert_eq!(
            controller.rendered_alpha(layer).unwrap(),
            controller.target_alpha(layer),
            "{layer:?}"
        );
    }
    assert_eq!(sim.alpha(ScrimLayer::Behind), 1.0);
}

/// Step the clock one millisecond at a time until `phase` is reached.
fn advance_until_phase(sim: &mut Simulation, phase: BlankingPhase) -> Duration {
    for _ in 0..2_000 {
        if sim.controller().blanking_phase() == phase {
            return sim.now();
        }
        sim.advance(Duration::from_millis(1)).unwrap();
    }
    panic!("blanking never reached {phase:?}");
}

#[test]
fn test_blanking_reveal_timing() {
    let mut settings = ControllerSettings::default();
    settings.doze.display_needs_blanking = true;

    for (screen_on, expected_ms) in [(true, 32), (false, 500)] {
        let options = SimulationOptions {
            screen_on,
            ..SimulationOptions::default()
        };
        let mut sim = Simulation::new(settings, options).unwrap();
        sim.transition(ScrimState::Keyguard, "keyguard").unwrap();
        sim.run_until_idle(SETTLE_LIMIT).unwrap();

        sim.transition(ScrimState::Aod, "aod").unwrap();
        let frame_at = advance_until_phase(&mut sim, BlankingPhase::AwaitingFrame);
        assert_eq!(sim.alpha(ScrimLayer::Front), 1.0);

        let reveal_wait_at = advance_until_phase(&mut sim, BlankingPhase::AwaitingReveal);
        assert_eq!(reveal_wait_at - frame_at, Duration::from_millis(32));
        assert_eq!(sim.callback_count("aod", CallbackEventKind::DisplayBlanked), 1);

        let revealed_at = advance_until_phase(&mut sim, BlankingPhase::Idle);
        assert_eq!(
            revealed_at - reveal_wait_at,
            Duration::from_millis(expected_ms),
            "screen_on={screen_on}"
        );

        sim.run_until_idle(SETTLE_LIMIT).unwrap();
        assert_eq!(sim.callback_count("aod", CallbackEventKind::Finished), 1);
    }
}
