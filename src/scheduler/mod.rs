mod escalation;

pub use escalation::{EscalationConfig, EscalationScheduler, SchedulerHandle, SweepOutcome};
