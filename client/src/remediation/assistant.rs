//! Remediation assistant

use std::sync::Arc;

use tracing::{error, info};

use super::CompletionProvider;

/// Stored in place of a suggestion when the provider fails
pub const FALLBACK_SOLUTION: &str = "Failed to generate a solution. Please try again.";

/// Build the remediation prompt from the error and the full build log
pub fn build_prompt(error: &str, logs: &[String]) -> String {
    format!(
        "Given the following error and build logs, suggest a solution:\n\
         \n\
         Error: {error}\n\
         \n\
         Build Logs:\n\
         {logs}\n\
         \n\
         Provide a step-by-step solution to resolve this issue. Use markdown formatting for \
         better readability, including code blocks where appropriate:",
        logs = logs.join("\n"),
    )
}

/// Turns a failed build into a suggested fix
pub struct RemediationAssistant {
    provider: Arc<dyn CompletionProvider>,
}

impl RemediationAssistant {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Suggest a fix; provider failures yield [`FALLBACK_SOLUTION`]
    pub async fn generate_solution(&self, error: &str, logs: &[String]) -> String {
        info!(
            "Requesting solution from {} ({}) with {} log lines",
            self.provider.name(),
            self.provider.model(),
            logs.len()
        );

        let prompt = build_prompt(error, logs);
        match self.provider.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!("Error generating solution: {}", e);
                FALLBACK_SOLUTION.to_string()
            }
        }
    }
}
