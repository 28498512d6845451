pub mod probe;
pub mod readiness;

pub use probe::{DiagnosticProbe, ProbeReport, ProbeResult};
pub use readiness::ReadinessGate;
