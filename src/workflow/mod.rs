pub mod prefetch_buffer;
pub mod quiz_machine;
pub mod session;

pub use prefetch_buffer::PrefetchBuffer;
pub use quiz_machine::{Effect, FetchPurpose, QuizEvent, QuizMachine};
pub use session::{Generation, Phase, SessionSnapshot, SessionState};
