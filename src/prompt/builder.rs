use super::engine::TeraEngine;
use tera::Context;

/// First user turn of every run.
pub const DEFAULT_DECISION_TEMPLATE: &str = "\
You are a research assistant filling in a structured record about: {{ topic }}

The record must match this JSON schema:
{{ schema }}

Work step by step. On every turn call exactly one of the available actions:
- use the research actions to gather evidence (search first, then fetch and \
summarize the most promising pages);
- call `submit` with the complete record once the evidence supports every field.

Do not invent values. If a submission is rejected, read the critique and \
gather the missing evidence before submitting again.";

/// Independent review of a submitted candidate.
pub const DEFAULT_JUDGMENT_TEMPLATE: &str = "\
You are reviewing a record that was submitted for the topic: {{ topic }}

Target schema:
{{ schema }}

Submitted record:
{{ candidate }}

Using only the evidence in the conversation so far, decide whether the record \
is accurate, complete and supported. Give at least three distinct reasons for \
your verdict. If the record is not acceptable, explain concretely what is \
missing or wrong and what to research next.";

/// Used by `fetch_and_summarize` to condense a page.
pub const DEFAULT_SUMMARY_TEMPLATE: &str = "\
Summarize the page below for research on: {{ topic }}

Focus on facts that help fill in a record with this schema:
{{ schema }}

Quote figures, names and dates exactly. Say so plainly if the page is irrelevant.

Page content:
{{ content }}";

const DECISION_NAME: &str = "decision";
const JUDGMENT_NAME: &str = "judgment";
const SUMMARY_NAME: &str = "summary";

/// The loop's three prompts, parsed once and rendered per use.
pub struct PromptBuilder {
    engine: TeraEngine,
}

impl PromptBuilder {
    /// Build with the default templates.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_templates(None, None)
    }

    /// Build with optional overrides for the decision and judgment templates.
    pub fn with_templates(
        decision_template: Option<&str>,
        judgment_template: Option<&str>,
    ) -> anyhow::Result<Self> {
        let mut engine = TeraEngine::new();
        engine.add_template(
            DECISION_NAME,
            decision_template.unwrap_or(DEFAULT_DECISION_TEMPLATE),
        )?;
        engine.add_template(
            JUDGMENT_NAME,
            judgment_template.unwrap_or(DEFAULT_JUDGMENT_TEMPLATE),
        )?;
        engine.add_template(SUMMARY_NAME, DEFAULT_SUMMARY_TEMPLATE)?;
        Ok(Self { engine })
    }

    pub fn decision_prompt(&self, topic: &str, schema: &str) -> anyhow::Result<String> {
        let mut ctx = Context::new();
        ctx.insert("topic", topic);
        ctx.insert("schema", schema);
        self.engine.render(DECISION_NAME, &ctx)
    }

    pub fn judgment_prompt(
        &self,
        topic: &str,
        schema: &str,
        candidate: &str,
    ) -> anyhow::Result<String> {
        let mut ctx = Context::new();
        ctx.insert("topic", topic);
        ctx.insert("schema", schema);
        ctx.insert("candidate", candidate);
        self.engine.render(JUDGMENT_NAME, &ctx)
    }

    pub fn summary_prompt(&self, topic: &str, schema: &str, content: &str) -> anyhow::Result<String> {
        let mut ctx = Context::new();
        ctx.insert("topic", topic);
        ctx.insert("schema", schema);
        ctx.insert("content", content);
        self.engine.render(SUMMARY_NAME, &ctx)
    }
}
