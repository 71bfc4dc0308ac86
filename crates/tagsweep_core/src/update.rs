use crate::{Effect, Msg, ScrollMetrics, TimerKind, TriggerSource, TriggerState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: TriggerState, msg: Msg) -> (TriggerState, Vec<Effect>) {
    let effects = match msg {
        Msg::PageReady => {
            if state.is_enabled() {
                vec![Effect::ArmTimer {
                    timer: TimerKind::Initial,
                    generation: 0,
                    delay: state.initial_delay(),
                }]
            } else {
                Vec::new()
            }
        }
        Msg::Scrolled(metrics) => {
            let downward = state.record_scroll(metrics.scroll_y);
            let (timer, delay) = if downward && is_near_bottom(&metrics, state.near_bottom_px()) {
                (TimerKind::ScrollProximity, state.scroll_debounce())
            } else {
                (TimerKind::ScrollSettle, state.scroll_debounce() / 2)
            };
            let generation = state.bump_generation(timer);
            vec![Effect::ArmTimer {
                timer,
                generation,
                delay,
            }]
        }
        Msg::ContentAdded { item_links } => {
            // Content that appears mid-scroll is picked up by the scroll trigger.
            if item_links == 0 || state.is_scrolling() {
                return (state, Vec::new());
            }
            let generation = state.bump_generation(TimerKind::Mutation);
            vec![Effect::ArmTimer {
                timer: TimerKind::Mutation,
                generation,
                delay: state.scroll_debounce(),
            }]
        }
        Msg::TimerElapsed { timer, generation } => {
            if !state.is_current(timer, generation) {
                return (state, Vec::new());
            }
            match timer {
                TimerKind::Initial => request_if_idle(&state, TriggerSource::Initial),
                TimerKind::ScrollProximity => {
                    state.set_scrolling(false);
                    request_if_idle(&state, TriggerSource::Scroll)
                }
                TimerKind::ScrollSettle => {
                    state.set_scrolling(false);
                    Vec::new()
                }
                TimerKind::Mutation => request_if_idle(&state, TriggerSource::Mutation),
            }
        }
        Msg::PeriodicTick => {
            if state.is_scrolling() {
                Vec::new()
            } else {
                request_if_idle(&state, TriggerSource::Periodic)
            }
        }
        Msg::ScanNowRequested => request_if_idle(&state, TriggerSource::Manual),
        Msg::ScanStarted => {
            state.set_scanning(true);
            Vec::new()
        }
        Msg::ScanFinished => {
            state.set_scanning(false);
            Vec::new()
        }
        Msg::SettingsChanged(settings) => {
            state.apply_settings(&settings);
            Vec::new()
        }
    };

    (state, effects)
}

fn request_if_idle(state: &TriggerState, source: TriggerSource) -> Vec<Effect> {
    if state.is_enabled() && !state.is_scanning() {
        vec![Effect::RequestScan { source }]
    } else {
        Vec::new()
    }
}

fn is_near_bottom(metrics: &ScrollMetrics, threshold: u64) -> bool {
    metrics.viewport_height.saturating_add(metrics.scroll_y)
        >= metrics.document_height.saturating_sub(threshold)
}
