//! Scripted provider for tests: canned responses keyed by prompt label,
//! optional per-label delays and failures, and a log of call events.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{LlmProvider, Prompt};
use crate::types::{ErrorCategory, LlmError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallEvent {
    Started,
    Finished,
}

#[derive(Default)]
pub(crate) struct ScriptedProvider {
    text: HashMap<String, String>,
    json: HashMap<String, Value>,
    delays: HashMap<String, Duration>,
    failures: HashMap<String, LlmError>,
    events: Mutex<Vec<(String, CallEvent)>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, label: &str, text: &str) -> Self {
        self.text.insert(label.to_string(), text.to_string());
        self
    }

    pub fn with_json(mut self, label: &str, value: Value) -> Self {
        self.json.insert(label.to_string(), value);
        self
    }

    pub fn with_delay(mut self, label: &str, delay: Duration) -> Self {
        self.delays.insert(label.to_string(), delay);
        self
    }

    pub fn failing(mut self, label: &str, category: ErrorCategory, message: &str) -> Self {
        self.failures.insert(
            label.to_string(),
            LlmError::with_provider(category, message, "scripted"),
        );
        self
    }

    /// Exact label first, then the part before ':' ("code_analysis:minor" -> "code_analysis").
    fn lookup<'a, T>(map: &'a HashMap<String, T>, label: &str) -> Option<&'a T> {
        map.get(label).or_else(|| {
            label
                .split_once(':')
                .and_then(|(prefix, _)| map.get(prefix))
        })
    }

    fn record(&self, label: &str, event: CallEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push((label.to_string(), event));
        }
    }

    async fn enter(&self, prompt: &Prompt) -> Result<()> {
        self.record(&prompt.label, CallEvent::Started);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }
        if let Some(delay) = Self::lookup(&self.delays, &prompt.label) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(err) = Self::lookup(&self.failures, &prompt.label) {
            self.record(&prompt.label, CallEvent::Finished);
            return Err(err.clone().into());
        }
        Ok(())
    }

    pub fn events(&self) -> Vec<(String, CallEvent)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Labels in the order calls started.
    pub fn started_labels(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|(_, e)| *e == CallEvent::Started)
            .map(|(label, _)| label)
            .collect()
    }

    pub fn call_count(&self, label_prefix: &str) -> usize {
        self.started_labels()
            .iter()
            .filter(|l| l.starts_with(label_prefix))
            .count()
    }

    /// Position of an event in the log.
    pub fn position(&self, label: &str, event: CallEvent) -> Option<usize> {
        self.events()
            .iter()
            .position(|(l, e)| l == label && *e == event)
    }

    pub fn prompt_for(&self, label: &str) -> Option<Prompt> {
        self.prompts
            .lock()
            .ok()
            .and_then(|p| p.iter().rev().find(|p| p.label == label).cloned())
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn invoke(&self, prompt: &Prompt) -> Result<String> {
        self.enter(prompt).await?;
        let text = Self::lookup(&self.text, &prompt.label)
            .cloned()
            .unwrap_or_else(|| format!("{} output", prompt.label));
        self.record(&prompt.label, CallEvent::Finished);
        Ok(text)
    }

    async fn invoke_structured(&self, prompt: &Prompt, _schema: &Value) -> Result<Value> {
        self.enter(prompt).await?;
        let value = Self::lookup(&self.json, &prompt.label).cloned();
        self.record(&prompt.label, CallEvent::Finished);
        value.ok_or_else(|| {
            LlmError::with_provider(
                ErrorCategory::ParseError,
                format!("no scripted JSON for {}", prompt.label),
                "scripted",
            )
            .into()
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}
