use std::time::Duration;

/// Which producer asked for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Initial,
    Scroll,
    Mutation,
    Periodic,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Initial,
    /// Scroll settled near the bottom of the page.
    ScrollProximity,
    /// Scroll settled elsewhere; only clears the scrolling flag.
    ScrollSettle,
    Mutation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver `Msg::TimerElapsed { timer, generation }` after `delay`.
    /// Arming a newer generation of the same timer supersedes older ones.
    ArmTimer {
        timer: TimerKind,
        generation: u64,
        delay: Duration,
    },
    RequestScan { source: TriggerSource },
}
