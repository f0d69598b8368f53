use std::fmt;
use thiserror::Error;

/// Which queue mutation produced an error. Messages differ between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOp {
    Add,
    Set,
}

impl fmt::Display for QueueOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueOp::Add => write!(f, "add"),
            QueueOp::Set => write!(f, "set"),
        }
    }
}

fn zone_argument_message(op: QueueOp) -> &'static str {
    match op {
        QueueOp::Add => "Cannot add tzinfo to tdatetime",
        QueueOp::Set => "Cannot set tzinfo on tdatetime",
    }
}

/// Errors produced by the fake clocks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// A zone-aware instant was passed to `add`/`set`. Queues only hold
    /// naive instants.
    #[error("Cannot {op} datetime with tzinfo set")]
    InstantHasZone { op: QueueOp },

    /// Components carried an explicit zone. The zone of a clock is fixed
    /// when it is built.
    #[error("{}", zone_argument_message(*.op))]
    ZoneArgument { op: QueueOp },

    /// Year/month/day/... do not form a valid date and time.
    #[error("invalid date/time components: {0}")]
    InvalidComponents(String),

    #[error("unknown delta unit `{0}`")]
    UnknownDeltaUnit(String),

    /// A value fell outside the range chrono can represent.
    #[error("time value out of range: {0}")]
    Overflow(String),
}
