//! Turn result returned to the front end.

use serde::{Deserialize, Serialize};

use super::session::ComposeStep;
use crate::speech::AudioHandle;

/// Outcome of one dialogue turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    /// What was heard, or `"[typed] <value>"` for typed compose input.
    pub transcription: String,
    /// Intent label (`send_email`, ...), or `error` when the recognizer is down.
    pub intent: String,
    /// Text to show. Empty means "say nothing" (stop, silence).
    pub response_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioHandle>,
    /// Compose step after the turn, `None` when not composing.
    pub dialogue_step: Option<ComposeStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_step_in_snake_case() {
        let result = TurnResult {
            transcription: "send email".into(),
            intent: "send_email".into(),
            response_text: "Who to?".into(),
            audio: None,
            dialogue_step: Some(ComposeStep::To),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["dialogue_step"], "to");
        assert_eq!(json["intent"], "send_email");
        assert!(json.get("audio").is_none());
    }
}
