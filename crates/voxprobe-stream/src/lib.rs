pub mod driver;
pub mod envelope;
pub mod matcher;
pub mod session;

pub use driver::{DriverStats, StreamDriver};
pub use envelope::{parse_envelope, TRANSCRIPTION_PREFIX};
pub use matcher::{MatchState, ResponseMatcher};
pub use session::{StreamSession, CLOSE_TIMEOUT};
