use crate::event::correlate::FlowEndpoint;
use crate::synth::emitter::{EmitContext, Emitter};
use crate::synth::plan::{Locator, Plan, PlanItem, Statement, StepPlan, TextValue};
use crate::synth::web::file_note;
use crate::synth::TargetFormat;
use std::fmt::Write;

/// `documentation` emitter: human-readable Markdown walkthrough
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownEmitter;

impl Emitter for MarkdownEmitter {
    fn format(&self) -> TargetFormat {
        TargetFormat::Documentation
    }

    fn description(&self) -> &str {
        "Markdown process documentation"
    }

    fn emit(&self, context: EmitContext<'_>) -> String {
        let plan = context.plan;
        let mut out = String::new();

        let _ = writeln!(out, "# {}\n", plan.title);
        let _ = writeln!(
            out,
            "Generated from {} captured step{}.\n",
            plan.step_count(),
            if plan.step_count() == 1 { "" } else { "s" }
        );

        if let Some(state) = &plan.session_state {
            let mut note = format!("> Session state restored from capture: {} cookie(s)", state.cookie_count());
            if let Some(domain) = &state.metadata.domain {
                let _ = write!(note, " for {}", domain);
            }
            if let Some(at) = &state.metadata.captured_at {
                let _ = write!(note, ", captured {}", at);
            }
            note.push_str(". Session setup steps are skipped.");
            let _ = writeln!(out, "{}\n", note);
        }

        out.push_str("## Steps\n\n");
        if plan.items.is_empty() {
            out.push_str("_No steps captured._\n\n");
        }
        render_items(&mut out, &plan.items, 3);

        render_data_flows(&mut out, plan);

        if !plan.warnings.is_empty() {
            out.push_str("## Warnings\n\n");
            for warning in &plan.warnings {
                let _ = writeln!(out, "- {}", warning);
            }
            out.push('\n');
        }

        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        out.push('\n');
        out
    }
}

fn heading(level: usize) -> String {
    "#".repeat(level.min(6))
}

fn render_items(out: &mut String, items: &[PlanItem], level: usize) {
    for item in items {
        match item {
            PlanItem::Step(step) => render_step(out, step, level),
            PlanItem::Skipped {
                step,
                description,
                reason,
                ..
            } => {
                let _ = writeln!(out, "{} Step {}: {} (skipped)\n", heading(level), step, description);
                let _ = writeln!(out, "Skipped: {}.\n", reason);
            }
            PlanItem::Reference { step, description } => {
                let _ = writeln!(out, "_Continues at step {}: {}_\n", step, description);
            }
            PlanItem::Decision(decision) => {
                let _ = writeln!(
                    out,
                    "{} Step {}: {} (decision)\n",
                    heading(level),
                    decision.step,
                    decision.description
                );
                if decision.branches.is_empty() {
                    out.push_str("_No branches defined._\n\n");
                }
                for branch in &decision.branches {
                    if branch.label.is_empty() || branch.label == branch.condition {
                        let _ = writeln!(out, "**If {}**\n", code(&branch.condition));
                    } else {
                        let _ = writeln!(out, "**If {}: {}**\n", code(&branch.condition), branch.label);
                    }
                    if branch.items.is_empty() {
                        out.push_str("_No steps recorded for this branch._\n\n");
                    }
                    render_items(out, &branch.items, level + 1);
                }
            }
        }
    }
}

fn render_step(out: &mut String, step: &StepPlan, level: usize) {
    let _ = writeln!(out, "{} Step {}: {}\n", heading(level), step.step, step.description);
    let _ = writeln!(out, "- **Type:** {}", step.node_type);

    let context = &step.context;
    if let Some(application) = &context.application {
        let _ = writeln!(out, "- **Application:** {}", application);
    }
    if let Some(title) = &context.window_title {
        let _ = writeln!(out, "- **Window:** {}", title);
    }
    if let Some(url) = &context.url {
        let _ = writeln!(out, "- **URL:** {}", url);
    }

    if let Some(selectors) = &step.selectors {
        let best = selectors.best();
        let _ = writeln!(
            out,
            "- **Selector:** {} ({}, stability {:.2})",
            code(&best.selector),
            best.strategy,
            best.stability_score
        );
        let fallbacks: Vec<String> = selectors
            .iter()
            .skip(1)
            .map(|c| format!("{} ({})", code(&c.selector), c.strategy))
            .collect();
        if !fallbacks.is_empty() {
            let _ = writeln!(out, "- **Fallbacks:** {}", fallbacks.join(", "));
        }
        if let Some(path) = selectors.pierce_path() {
            let _ = writeln!(out, "- **Shadow DOM path:** {}", code(path));
        }
    }
    out.push('\n');

    let mut n = 0;
    for statement in &step.statements {
        if let Statement::WaitFor { .. } = statement {
            continue;
        }
        n += 1;
        let _ = writeln!(out, "{}. {}", n, describe(statement));
    }
    if n > 0 {
        out.push('\n');
    }
}

/// One-line prose for a statement
fn describe(statement: &Statement) -> String {
    match statement {
        Statement::Navigate { url } => format!("Open {}", url),
        Statement::WaitFor { locator } => format!("Wait for {}", target(locator)),
        Statement::Click { locator } => format!("Click {}", target(locator)),
        Statement::ClickAt { x, y } => format!("Click at screen position ({}, {})", x, y),
        Statement::Fill { locator, value } => format!("Fill {} with {}", target(locator), text(value)),
        Statement::TypeText { value } => format!("Type {}", text(value)),
        Statement::PressKey { locator, key } => match locator {
            Some(locator) => format!("Press {} in {}", code(&key.combo()), target(locator)),
            None => format!("Press {}", code(&key.combo())),
        },
        Statement::Assert { locator, text } => match text {
            Some(text) => format!("Check that {} shows \"{}\"", target(locator), text),
            None => format!("Check that {} is visible", target(locator)),
        },
        Statement::Wait { ms } => format!("Wait {} ms", ms),
        Statement::CopyData { preview, data_type } => format!("Copy {}: \"{}\"", data_type, preview),
        Statement::FileOperation { op, path, dest } => file_note(*op, path, dest.as_deref()),
        Statement::Comment(text) => format!("_{}_", text),
        Statement::Warning(text) => format!("**Warning:** {}", text),
    }
}

fn target(locator: &Locator) -> String {
    code(&locator.selector)
}

fn text(value: &TextValue) -> String {
    match value {
        TextValue::Literal(text) => format!("\"{}\"", text),
        TextValue::Secret { env } => format!("the secret stored in {}", code(env)),
    }
}

/// Inline code span that survives backticks in the content
fn code(text: &str) -> String {
    if text.contains('`') {
        format!("`` {} ``", text)
    } else {
        format!("`{}`", text)
    }
}

fn render_data_flows(out: &mut String, plan: &Plan) {
    if plan.data_flows.is_empty() {
        return;
    }
    out.push_str("## Data flows\n\n");
    out.push_str("| From | To | Data | Transformation |\n");
    out.push_str("| --- | --- | --- | --- |\n");
    for flow in &plan.data_flows {
        let _ = writeln!(
            out,
            "| {} | {} | {}: {} | {} |",
            endpoint(&flow.source),
            endpoint(&flow.destination),
            flow.data_type,
            flow.preview.replace('|', "\\|"),
            flow.transformation
        );
    }
    out.push('\n');
}

fn endpoint(endpoint: &FlowEndpoint) -> String {
    let application = endpoint.application.as_deref().unwrap_or("unknown application");
    match &endpoint.document {
        Some(document) => format!("{} ({})", application, document),
        None => application.to_string(),
    }
}
