use crate::collapse::{CollapseConfig, collapse_with};
use crate::debug::{DebugLog, SpeechDebugEvent, timestamp_now};
use crate::input::{RecognitionResult, TranscriptInput};
use crate::merge::merge;
use crate::types::{TranscriptState, TranscriptUpdate};

/// Folds recognition events into a [`TranscriptState`].
///
/// Final chunks are merged into the stable text in arrival order and then
/// collapsed. Interim chunks are never merged: each event replaces the whole
/// interim text. The combined text is recomputed from both on every event.
pub struct TranscriptAccumulator {
    state: TranscriptState,
    collapse: CollapseConfig,
    debug: Option<DebugLog>,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::with_config(CollapseConfig::default())
    }

    pub fn with_config(collapse: CollapseConfig) -> Self {
        Self {
            state: TranscriptState::default(),
            collapse,
            debug: None,
        }
    }

    /// Record a [`SpeechDebugEvent`] for every processed result.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled.then(DebugLog::new);
        self
    }

    /// Process one raw engine result, recording it in the debug log if enabled.
    pub fn process_result(&mut self, result: &RecognitionResult) -> TranscriptUpdate {
        let update = self.process(TranscriptInput::from_result(result));

        if let Some(log) = &mut self.debug {
            log.push(SpeechDebugEvent {
                timestamp: timestamp_now(),
                result_index: result.result_index,
                final_chunk: update.final_chunk.clone(),
                interim_chunk: update.interim_chunk.clone(),
                combined_transcript: update.state.combined_text.clone(),
                results_len: result.results.len(),
            });
        }

        update
    }

    pub fn process(&mut self, input: TranscriptInput) -> TranscriptUpdate {
        let TranscriptInput {
            final_chunk,
            interim_chunk,
        } = input;

        let mut final_changed = false;
        if !final_chunk.is_empty() {
            let merged = merge(&self.state.final_text, &final_chunk);
            let collapsed = collapse_with(&merged, self.collapse);
            final_changed = collapsed != self.state.final_text;
            self.state.final_text = collapsed;
        }

        self.state.interim_text = interim_chunk.trim().to_string();
        self.state.combined_text = collapse_with(
            &format!("{} {}", self.state.final_text, self.state.interim_text),
            self.collapse,
        );

        TranscriptUpdate {
            final_chunk,
            interim_chunk: self.state.interim_text.clone(),
            final_changed,
            state: self.state.clone(),
        }
    }

    pub fn state(&self) -> &TranscriptState {
        &self.state
    }

    pub fn debug_events(&self) -> impl Iterator<Item = &SpeechDebugEvent> {
        self.debug.iter().flat_map(|log| log.events())
    }

    /// Clear all text and debug history. Configuration is kept.
    pub fn reset(&mut self) {
        self.state = TranscriptState::default();
        if let Some(log) = &mut self.debug {
            log.clear();
        }
    }
}

impl Default for TranscriptAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RecognitionEntry;

    fn result(index: usize, entries: &[(&str, bool)]) -> RecognitionResult {
        RecognitionResult {
            result_index: index,
            results: entries
                .iter()
                .map(|&(t, f)| RecognitionEntry {
                    transcript: t.to_string(),
                    is_final: f,
                })
                .collect(),
        }
    }

    fn replay(results: &[RecognitionResult]) -> TranscriptState {
        let mut acc = TranscriptAccumulator::new();
        for r in results {
            acc.process_result(r);
        }
        acc.state().clone()
    }

    #[test]
    fn interim_only_leaves_final_untouched() {
        let mut acc = TranscriptAccumulator::new();
        let update = acc.process_result(&result(0, &[("el perro", false)]));

        assert!(!update.final_changed);
        assert_eq!(update.state.final_text, "");
        assert_eq!(update.state.interim_text, "el perro");
        assert_eq!(update.state.combined_text, "el perro");
    }

    #[test]
    fn interim_is_replaced_not_merged() {
        let state = replay(&[
            result(0, &[("el perro", false)]),
            result(0, &[("el perro corre", false)]),
            result(0, &[("el gato", false)]),
        ]);

        assert_eq!(state.final_text, "");
        assert_eq!(state.interim_text, "el gato");
        assert_eq!(state.combined_text, "el gato");
    }

    #[test]
    fn finals_merge_in_arrival_order() {
        let state = replay(&[
            result(0, &[("el perro corre", true)]),
            result(1, &[("el perro corre", true), ("corre rapido", true)]),
            result(2, &[("", true), ("", true), ("por el", false)]),
        ]);

        assert_eq!(state.final_text, "el perro corre rapido");
        assert_eq!(state.interim_text, "por el");
        assert_eq!(state.combined_text, "el perro corre rapido por el");
    }

    #[test]
    fn stray_prefix_replay_is_absorbed() {
        let state = replay(&[
            result(0, &[("la casa es grande", true)]),
            result(0, &[("eh la casa es grande y bonita", true)]),
        ]);
        assert_eq!(state.final_text, "la casa es grande y bonita");
    }

    #[test]
    fn empty_event_clears_interim() {
        let state = replay(&[
            result(0, &[("hola", true), ("mundo", false)]),
            result(1, &[("hola", true)]),
        ]);
        assert_eq!(state.final_text, "hola");
        assert_eq!(state.interim_text, "");
        assert_eq!(state.combined_text, "hola");
    }

    #[test]
    fn runaway_repeats_are_collapsed_in_final_and_combined() {
        let runaway = ["sol"; 8].join(" ");
        let state = replay(&[
            result(0, &[(runaway.as_str(), true)]),
            result(1, &[("sol sol sol", false)]),
        ]);

        assert_eq!(state.final_text, "sol sol sol");
        assert_eq!(state.combined_text, "sol sol sol");
    }

    #[test]
    fn final_word_count_never_shrinks() {
        let events = [
            result(0, &[("uno dos", true)]),
            result(0, &[("dos tres", true)]),
            result(0, &[("uno dos", true)]),
            result(0, &[("eh tres cuatro", true)]),
            result(0, &[("cinco", false)]),
        ];

        let mut acc = TranscriptAccumulator::new();
        let mut last = 0;
        for e in &events {
            acc.process_result(e);
            let count = acc.state().final_text.split_whitespace().count();
            assert!(count >= last, "{:?}", acc.state());
            last = count;
        }
        assert_eq!(
            acc.state().final_text,
            "uno dos tres uno dos eh tres cuatro"
        );
    }

    #[test]
    fn debug_log_records_events_when_enabled() {
        let mut acc = TranscriptAccumulator::new().with_debug(true);
        acc.process_result(&result(0, &[("hola", true), ("mun", false)]));

        let events: Vec<_> = acc.debug_events().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].final_chunk, "hola");
        assert_eq!(events[0].interim_chunk, "mun");
        assert_eq!(events[0].combined_transcript, "hola mun");
        assert_eq!(events[0].results_len, 2);

        acc.reset();
        assert_eq!(acc.debug_events().count(), 0);
        assert!(acc.state().is_empty());
    }

    #[test]
    fn debug_log_is_off_by_default() {
        let mut acc = TranscriptAccumulator::new();
        acc.process_result(&result(0, &[("hola", true)]));
        assert_eq!(acc.debug_events().count(), 0);
    }
}
