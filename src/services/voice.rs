use log::{debug, warn};
use std::collections::BTreeMap;

use crate::error::{JournalError, JournalResult};
use crate::models::voice::{CommandIntent, VoiceCommandRequest, VoiceCommandResult};

/// Turns recognizer output into a typed, confirmable command.
#[derive(Debug, Clone, Copy)]
pub struct VoiceInterpreter {
    confidence_threshold: f32,
}

impl VoiceInterpreter {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold: confidence_threshold.clamp(0.0, 1.0),
        }
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn interpret(
        &self,
        request: &VoiceCommandRequest,
        intent_name: &str,
        params: &BTreeMap<String, String>,
    ) -> JournalResult<VoiceCommandResult> {
        let intent = CommandIntent::from_parameters(intent_name, params).map_err(|errors| {
            warn!("Voice intent {} rejected: {}", intent_name, errors);
            JournalError::Validation(errors)
        })?;
        let result = VoiceCommandResult::interpret(request, intent, self.confidence_threshold);
        debug!(
            "Voice intent {} (confidence {:.2}, confirm={})",
            result.intent.name(),
            result.confidence,
            result.requires_confirmation
        );
        Ok(result)
    }
}
