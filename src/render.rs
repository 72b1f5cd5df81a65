use crate::controller::{Panel, ViewState};
use crate::session::Session;
use crate::verdict::{STYLE_DANGER, STYLE_SUCCESS, STYLE_WARNING};
use crate::wire::{DomainCheckResult, EmailAnalysis};

/// A result payload that knows how to lay itself out in the result panel.
pub trait RenderResult {
    fn render_result(&self, out: &mut String);
}

fn style_marker(style_class: &str) -> &'static str {
    match style_class {
        STYLE_DANGER => "🚨",
        STYLE_WARNING => "⚠️",
        STYLE_SUCCESS => "✅",
        _ => "❔",
    }
}

impl RenderResult for DomainCheckResult {
    fn render_result(&self, out: &mut String) {
        let classification = self.status.classify();

        out.push_str(&format!("Domain:     {}\n", self.domain));
        out.push_str(&format!(
            "Status:     {} {}\n",
            style_marker(classification.style_class),
            classification.label
        ));
        if let Some(confidence) = self.confidence_percent() {
            out.push_str(&format!("Confidence: {confidence}\n"));
        }
        out.push_str(&format!("Message:    {}\n", self.message));
    }
}

impl RenderResult for EmailAnalysis {
    fn render_result(&self, out: &mut String) {
        if let Some(message) = self.message() {
            out.push_str(&format!("Message: {message}\n"));
        }
        let pretty =
            serde_json::to_string_pretty(self.raw()).unwrap_or_else(|_| self.raw().to_string());
        out.push_str(&format!("{pretty}\n"));
    }
}

/// Render the view for one analysis flow. The output depends only on the
/// arguments, and shows at most one of the error banner and the result panel.
pub fn render_view<R: RenderResult>(flow: &str, state: &ViewState<R>, session: &Session) -> String {
    let mut out = String::new();

    match state.panel() {
        Panel::Loading => {
            out.push_str(&format!("⏳ Analyzing {flow}...\n"));
        }
        Panel::Error => {
            if let Some(message) = state.error_message() {
                out.push_str(&format!("❌ {message}\n"));
            }
        }
        Panel::Result => {
            if let Some(result) = &state.result {
                out.push_str("Analysis Result\n");
                out.push_str("═══════════════════════════════════════\n");
                result.render_result(&mut out);
            }
        }
        Panel::Idle => {}
    }

    if !session.is_logged_in() && state.panel() != Panel::Error {
        out.push_str(&format!("🔒 Please log in to use {flow} analysis.\n"));
    }

    out
}
