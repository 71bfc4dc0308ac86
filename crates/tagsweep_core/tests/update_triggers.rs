use std::time::Duration;

use tagsweep_core::{
    update, Effect, Msg, ScrollMetrics, Settings, TimerKind, TriggerSource, TriggerState,
};

fn init_logging() {
    sweep_logging::initialize_for_tests();
}

fn settings() -> Settings {
    Settings {
        scroll_debounce_ms: 2_000,
        initial_delay_ms: 500,
        near_bottom_px: 1_000,
        ..Settings::default()
    }
}

fn scrolled(scroll_y: u64) -> Msg {
    Msg::Scrolled(ScrollMetrics {
        scroll_y,
        viewport_height: 800,
        document_height: 5_000,
    })
}

fn armed(effects: &[Effect]) -> (TimerKind, u64, Duration) {
    match effects {
        [Effect::ArmTimer {
            timer,
            generation,
            delay,
        }] => (*timer, *generation, *delay),
        other => panic!("expected a single ArmTimer, got {other:?}"),
    }
}

#[test]
fn page_ready_arms_initial_scan() {
    init_logging();
    let (state, effects) = update(TriggerState::new(&settings()), Msg::PageReady);
    let (timer, generation, delay) = armed(&effects);
    assert_eq!(timer, TimerKind::Initial);
    assert_eq!(delay, Duration::from_millis(500));

    let (_, effects) = update(state, Msg::TimerElapsed { timer, generation });
    assert_eq!(
        effects,
        vec![Effect::RequestScan {
            source: TriggerSource::Initial
        }]
    );
}

#[test]
fn scrolling_down_near_bottom_requests_one_scan_after_settling() {
    let state = TriggerState::new(&settings());

    // Far from the bottom: only a settle timer.
    let (state, effects) = update(state, scrolled(1_000));
    assert_eq!(armed(&effects).0, TimerKind::ScrollSettle);
    assert_eq!(armed(&effects).2, Duration::from_millis(1_000));

    // Three quick scrolls near the bottom collapse into one firing.
    let (state, first) = update(state, scrolled(3_300));
    let (state, second) = update(state, scrolled(3_500));
    let (state, third) = update(state, scrolled(3_700));
    assert!(state.is_scrolling());
    for effects in [&first, &second, &third] {
        assert_eq!(armed(effects).0, TimerKind::ScrollProximity);
    }

    let stale = armed(&first);
    let (state, effects) = update(
        state,
        Msg::TimerElapsed {
            timer: stale.0,
            generation: stale.1,
        },
    );
    assert!(effects.is_empty());
    assert!(state.is_scrolling());

    let latest = armed(&third);
    let (state, effects) = update(
        state,
        Msg::TimerElapsed {
            timer: latest.0,
            generation: latest.1,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::RequestScan {
            source: TriggerSource::Scroll
        }]
    );
    assert!(!state.is_scrolling());
}

#[test]
fn scrolling_up_near_bottom_does_not_scan() {
    let (state, _) = update(TriggerState::new(&settings()), scrolled(4_000));
    let (state, effects) = update(state, scrolled(3_900));
    let (timer, generation, _) = armed(&effects);
    assert_eq!(timer, TimerKind::ScrollSettle);

    let (state, effects) = update(state, Msg::TimerElapsed { timer, generation });
    assert!(effects.is_empty());
    assert!(!state.is_scrolling());
}

#[test]
fn mutation_is_debounced_and_ignored_while_scrolling() {
    let state = TriggerState::new(&settings());
    let (state, effects) = update(state, Msg::ContentAdded { item_links: 0 });
    assert!(effects.is_empty());

    let (state, first) = update(state, Msg::ContentAdded { item_links: 3 });
    let (state, second) = update(state, Msg::ContentAdded { item_links: 1 });
    let (_, first_gen, delay) = armed(&first);
    let (_, second_gen, _) = armed(&second);
    assert_eq!(delay, Duration::from_millis(2_000));

    let (state, effects) = update(
        state,
        Msg::TimerElapsed {
            timer: TimerKind::Mutation,
            generation: first_gen,
        },
    );
    assert!(effects.is_empty());
    let (state, effects) = update(
        state,
        Msg::TimerElapsed {
            timer: TimerKind::Mutation,
            generation: second_gen,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::RequestScan {
            source: TriggerSource::Mutation
        }]
    );

    let (state, _) = update(state, scrolled(100));
    let (_, effects) = update(state, Msg::ContentAdded { item_links: 5 });
    assert!(effects.is_empty());
}

#[test]
fn triggers_are_no_ops_while_scanning() {
    init_logging();
    let (state, _) = update(TriggerState::new(&settings()), Msg::ScanStarted);
    assert!(state.is_scanning());

    let (state, effects) = update(state, Msg::PeriodicTick);
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::ScanNowRequested);
    assert!(effects.is_empty());

    let (state, _) = update(state, Msg::ScanFinished);
    let (_, effects) = update(state, Msg::PeriodicTick);
    assert_eq!(
        effects,
        vec![Effect::RequestScan {
            source: TriggerSource::Periodic
        }]
    );
}

#[test]
fn disabled_settings_silence_every_trigger() {
    let disabled = Settings {
        enabled: false,
        ..settings()
    };
    let (state, effects) = update(TriggerState::new(&settings()), Msg::SettingsChanged(disabled));
    assert!(!state.is_enabled());
    let (state, _) = update(state, Msg::PageReady);
    let (state, effects_periodic) = update(state, Msg::PeriodicTick);
    let (_, effects_manual) = update(state, Msg::ScanNowRequested);
    assert!(effects.is_empty());
    assert!(effects_periodic.is_empty());
    assert!(effects_manual.is_empty());
}
