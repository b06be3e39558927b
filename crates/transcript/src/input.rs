/// One recognition hypothesis inside a result event.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecognitionEntry {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub is_final: bool,
}

impl RecognitionEntry {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    pub fn settled(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

/// A result event as delivered by the recognition engine.
///
/// `results` holds the engine's whole result list for the current run;
/// only entries from `result_index` onward changed in this event.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecognitionResult {
    #[serde(default)]
    pub result_index: usize,
    #[serde(default)]
    pub results: Vec<RecognitionEntry>,
}

/// Engine-agnostic input to [`crate::accumulator::TranscriptAccumulator`].
///
/// Build one with [`TranscriptInput::from_result`], or construct it directly
/// when feeding synthetic chunks (tests, non-streaming sources).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptInput {
    /// Every settled piece of the event, joined with single spaces.
    pub final_chunk: String,
    /// Every provisional piece of the event, joined with single spaces.
    pub interim_chunk: String,
}

impl TranscriptInput {
    pub fn from_result(result: &RecognitionResult) -> Self {
        let changed = result.results.get(result.result_index..).unwrap_or(&[]);

        let mut final_pieces = Vec::new();
        let mut interim_pieces = Vec::new();

        for entry in changed {
            let piece = entry.transcript.trim();
            if piece.is_empty() {
                continue;
            }
            if entry.is_final {
                final_pieces.push(piece);
            } else {
                interim_pieces.push(piece);
            }
        }

        Self {
            final_chunk: final_pieces.join(" "),
            interim_chunk: interim_pieces.join(" "),
        }
    }

    pub fn has_final(&self) -> bool {
        !self.final_chunk.is_empty()
    }
}
