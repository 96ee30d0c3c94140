//! Plan walking shared by the script emitters
//!
//! Step headers, skips, references and decision blocks look the same in every script;
//! only the statement syntax and the block style differ.

use crate::synth::plan::{DecisionPlan, PlanItem, Statement};
use crate::synth::writer::{quote, CodeWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Syntax {
    Python,
    TypeScript,
}

impl Syntax {
    pub(crate) fn comment_prefix(self) -> &'static str {
        match self {
            Syntax::Python => "#",
            Syntax::TypeScript => "//",
        }
    }
}

/// Statement rendering for one target library
pub(crate) trait ScriptStyle {
    fn syntax(&self) -> Syntax;

    /// Render everything except comments and warnings
    fn statement(&self, w: &mut CodeWriter, statement: &Statement);
}

pub(crate) fn render_items<S: ScriptStyle>(style: &S, w: &mut CodeWriter, items: &[PlanItem]) {
    let prefix = style.syntax().comment_prefix();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        match item {
            PlanItem::Step(step) => {
                w.comment(prefix, &format!("Step {}: {}", step.step, step.description));
                for statement in &step.statements {
                    match statement {
                        Statement::Comment(text) => w.comment(prefix, text),
                        Statement::Warning(text) => w.comment(prefix, &format!("WARNING: {}", text)),
                        other => style.statement(w, other),
                    }
                }
            }
            PlanItem::Skipped {
                step,
                description,
                reason,
                ..
            } => w.comment(prefix, &format!("Step {} skipped: {} ({})", step, description, reason)),
            PlanItem::Reference { step, description } => {
                w.comment(prefix, &format!("Continues at step {}: {}", step, description))
            }
            PlanItem::Decision(decision) => render_decision(style, w, decision),
        }
    }
}

fn render_decision<S: ScriptStyle>(style: &S, w: &mut CodeWriter, decision: &DecisionPlan) {
    let syntax = style.syntax();
    let prefix = syntax.comment_prefix();
    w.comment(prefix, &format!("Step {}: {}", decision.step, decision.description));

    let Some(first) = decision.branches.first() else {
        w.comment(prefix, "Decision has no branches");
        return;
    };

    let variable = match syntax {
        Syntax::Python => format!("branch_{}", decision.step),
        Syntax::TypeScript => format!("branch{}", decision.step),
    };
    let env = format!("CAPTURE_BRANCH_STEP_{}", decision.step);
    match syntax {
        Syntax::Python => w.line(format!(
            "{} = os.environ.get({}, {})",
            variable,
            quote(&env),
            quote(&first.condition)
        )),
        Syntax::TypeScript => w.line(format!(
            "const {} = process.env.{} ?? {};",
            variable,
            env,
            quote(&first.condition)
        )),
    }

    for (i, branch) in decision.branches.iter().enumerate() {
        let header = match (syntax, i) {
            (Syntax::Python, 0) => format!("if {} == {}:", variable, quote(&branch.condition)),
            (Syntax::Python, _) => format!("elif {} == {}:", variable, quote(&branch.condition)),
            (Syntax::TypeScript, 0) => format!("if ({} === {}) {{", variable, quote(&branch.condition)),
            (Syntax::TypeScript, _) => format!("}} else if ({} === {}) {{", variable, quote(&branch.condition)),
        };
        w.line(header);
        w.indent();
        if !branch.label.is_empty() && branch.label != branch.condition {
            w.comment(prefix, &branch.label);
        }
        if branch.items.is_empty() {
            w.comment(prefix, "No steps recorded for this branch");
        } else {
            render_items(style, w, &branch.items);
        }
        w.dedent();
    }
    if syntax == Syntax::TypeScript {
        w.line("}");
    }
}

/// Seconds literal for a millisecond delay
pub(crate) fn seconds(ms: u64) -> String {
    let secs = ms as f64 / 1000.0;
    if secs.fract() == 0.0 {
        format!("{}", secs as u64)
    } else {
        format!("{}", secs)
    }
}
