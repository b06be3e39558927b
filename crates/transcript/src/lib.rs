pub mod accumulator;
pub mod collapse;
pub mod debug;
pub mod input;
pub mod merge;
pub mod normalize;
pub mod types;

pub use accumulator::TranscriptAccumulator;
pub use collapse::{CollapseConfig, collapse, collapse_with};
pub use debug::{DebugLog, SpeechDebugEvent};
pub use input::{RecognitionEntry, RecognitionResult, TranscriptInput};
pub use merge::merge;
pub use normalize::{NormalizeOptions, Token, normalize, tokenize, tokens};
pub use types::{TranscriptState, TranscriptUpdate};
