//! Template scanning and expression dispatch.

use std::sync::Arc;

use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use regex::Regex;

use super::resolvers::{resolve_expression, ResolveContext, ResolveError};
use super::state::{CallCache, RenderState};
use crate::metrics::SimulatorMetrics;

lazy_static! {
    /// Flat, non-greedy scan: no nesting and no escaping of brackets.
    static ref EXPRESSION: Regex = Regex::new(r"\[(.*?)\]").unwrap();
}

/// Source of "now" for timestamp and date expressions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Local wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A piece of a scanned template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any bracket pair
    Literal(&'a str),
    /// One bracket pair: `raw` includes the brackets, `expression` is the
    /// trimmed inner text
    Expression { raw: &'a str, expression: &'a str },
}

/// Split `template` into literal and expression segments, in textual order.
pub fn tokenize(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last_end = 0;

    for caps in EXPRESSION.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last_end {
            segments.push(Segment::Literal(&template[last_end..whole.start()]));
        }
        segments.push(Segment::Expression {
            raw: whole.as_str(),
            expression: caps.get(1).map_or("", |m| m.as_str()).trim(),
        });
        last_end = whole.end();
    }

    if last_end < template.len() {
        segments.push(Segment::Literal(&template[last_end..]));
    }

    segments
}

/// Renders templates against a caller-owned [`RenderState`].
#[derive(Clone)]
pub struct TemplateEngine {
    clock: Arc<dyn Clock>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").finish_non_exhaustive()
    }
}

impl TemplateEngine {
    /// Create an engine reading the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an engine reading a custom clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Replace every recognised expression in `template`.
    ///
    /// Unrecognised or malformed expressions are kept verbatim. If any
    /// resolver fails, the original template is returned and `state` is left
    /// exactly as it was before the call.
    pub fn render(&self, template: &str, state: &mut RenderState) -> String {
        match self.try_render(template, state) {
            Ok(rendered) => {
                SimulatorMetrics::record_render("ok");
                rendered
            }
            Err(e) => {
                SimulatorMetrics::record_render("failed");
                tracing::warn!(
                    error = %e,
                    template_len = template.len(),
                    "Template render failed, returning original template"
                );
                template.to_string()
            }
        }
    }

    fn try_render(
        &self,
        template: &str,
        state: &mut RenderState,
    ) -> Result<String, ResolveError> {
        let mut working = state.clone();
        let mut cache = CallCache::default();
        let mut rng = rand::rng();
        let mut output = String::with_capacity(template.len());

        {
            let mut ctx = ResolveContext {
                now: self.clock.now(),
                state: &mut working,
                cache: &mut cache,
                rng: &mut rng,
            };

            for segment in tokenize(template) {
                match segment {
                    Segment::Literal(text) => output.push_str(text),
                    Segment::Expression { raw, expression } => {
                        match resolve_expression(expression, &mut ctx)? {
                            Some((kind, replacement)) => {
                                tracing::trace!(
                                    kind = kind.as_str(),
                                    expression,
                                    replacement = %replacement,
                                    "Expression resolved"
                                );
                                SimulatorMetrics::record_substitution(kind.as_str());
                                output.push_str(&replacement);
                            }
                            None => {
                                tracing::trace!(expression, "No resolver accepted expression");
                                SimulatorMetrics::record_substitution("unrecognized");
                                output.push_str(raw);
                            }
                        }
                    }
                }
            }
        }

        *state = working;
        Ok(output)
    }
}

/// Render with the system clock; shorthand for [`TemplateEngine::render`].
pub fn render(template: &str, state: &mut RenderState) -> String {
    TemplateEngine::new().render(template, state)
}
