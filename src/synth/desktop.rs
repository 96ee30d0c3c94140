//! PyAutoGUI replay scripts
//!
//! Everything is replayed at screen level: clicks use the captured element centers,
//! navigation goes through the browser address bar, and file moves and deletes are
//! repeated with `shutil`/`os`.

use crate::event::FileOpKind;
use crate::synth::emitter::{EmitContext, Emitter};
use crate::synth::plan::{KeyPress, Locator, Statement, TextValue};
use crate::synth::script::{render_items, seconds, ScriptStyle, Syntax};
use crate::synth::web::file_note;
use crate::synth::writer::{quote, CodeWriter};
use crate::synth::TargetFormat;

/// Delay between typed characters, in seconds
const TYPE_INTERVAL: &str = "0.02";

/// `generic-desktop-automation` emitter
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopEmitter;

impl Emitter for DesktopEmitter {
    fn format(&self) -> TargetFormat {
        TargetFormat::DesktopAutomation
    }

    fn description(&self) -> &str {
        "Screen-level replay script (PyAutoGUI)"
    }

    fn emit(&self, context: EmitContext<'_>) -> String {
        let plan = context.plan;
        let mut w = CodeWriter::python();

        w.line(format!("\"\"\"{}", plan.title.replace("\"\"\"", "'''")));
        w.blank();
        w.line("Desktop replay generated from a captured process. Coordinates are screen");
        w.line("pixels from the capture and assume the same screen layout.");
        w.line("\"\"\"");
        w.blank();
        w.line("import os");
        w.line("import shutil");
        w.line("import time");
        w.blank();
        w.line("import pyautogui");
        w.blank();
        w.line("pyautogui.FAILSAFE = True");
        w.line("pyautogui.PAUSE = 0.5");
        w.blank_lines(2);
        w.line("def run():");
        w.indent();
        if plan.items.is_empty() {
            w.comment("#", "No steps captured");
        }
        render_items(&PyAutoGui, &mut w, &plan.items);
        w.dedent();
        w.blank_lines(2);
        w.line("if __name__ == \"__main__\":");
        w.indent();
        w.line("run()");
        w.finish()
    }
}

struct PyAutoGui;

impl PyAutoGui {
    fn key(key: &str) -> String {
        let name = match key {
            "Enter" | "Return" | "NumpadEnter" => "enter".to_string(),
            "Escape" | "Esc" => "esc".to_string(),
            "ArrowUp" => "up".to_string(),
            "ArrowDown" => "down".to_string(),
            "ArrowLeft" => "left".to_string(),
            "ArrowRight" => "right".to_string(),
            "PageUp" => "pageup".to_string(),
            "PageDown" => "pagedown".to_string(),
            " " | "Space" => "space".to_string(),
            other => other.to_lowercase(),
        };
        quote(&name)
    }

    fn modifier(name: &str) -> String {
        let key = match name {
            "meta" | "cmd" | "command" => "command",
            "alt" | "option" => "alt",
            "shift" => "shift",
            _ => "ctrl",
        };
        quote(key)
    }

    fn press(key: &KeyPress) -> String {
        if key.modifiers.is_empty() {
            return format!("pyautogui.press({})", Self::key(&key.key));
        }
        let mut keys: Vec<String> = key.modifiers.iter().map(|m| Self::modifier(m)).collect();
        keys.push(Self::key(&key.key));
        format!("pyautogui.hotkey({})", keys.join(", "))
    }

    fn text(value: &TextValue) -> String {
        match value {
            TextValue::Literal(text) => quote(text),
            TextValue::Secret { env } => format!("os.environ.get({}, \"\")", quote(env)),
        }
    }

    fn click(w: &mut CodeWriter, locator: &Locator) {
        match locator.point {
            Some((x, y)) => w.line(format!("pyautogui.click({}, {})", x, y)),
            None => w.comment(
                "#",
                &format!("WARNING: no screen position captured for {}; click it manually", locator.selector),
            ),
        }
    }

    fn write(w: &mut CodeWriter, value: &TextValue) {
        w.line(format!("pyautogui.write({}, interval={})", Self::text(value), TYPE_INTERVAL));
    }
}

impl ScriptStyle for PyAutoGui {
    fn syntax(&self) -> Syntax {
        Syntax::Python
    }

    fn statement(&self, w: &mut CodeWriter, statement: &Statement) {
        match statement {
            Statement::Navigate { url } => {
                w.line("pyautogui.hotkey(\"ctrl\", \"l\")");
                Self::write(w, &TextValue::Literal(url.clone()));
                w.line("pyautogui.press(\"enter\")");
            }
            Statement::WaitFor { .. } => {}
            Statement::Click { locator } => Self::click(w, locator),
            Statement::ClickAt { x, y } => w.line(format!("pyautogui.click({}, {})", x, y)),
            Statement::Fill { locator, value } => {
                Self::click(w, locator);
                w.line("pyautogui.hotkey(\"ctrl\", \"a\")");
                Self::write(w, value);
            }
            Statement::TypeText { value } => Self::write(w, value),
            Statement::PressKey { key, .. } => w.line(Self::press(key)),
            Statement::Assert { locator, text } => {
                let expectation = match text {
                    Some(text) => format!("Check that {} shows {}", locator.selector, quote(text)),
                    None => format!("Check that {} is visible", locator.selector),
                };
                w.comment("#", &expectation);
            }
            Statement::Wait { ms } => w.line(format!("time.sleep({})", seconds(*ms))),
            Statement::CopyData { preview, data_type } => {
                w.comment("#", &format!("Copy {}: {}", data_type, preview));
                w.line("pyautogui.hotkey(\"ctrl\", \"c\")");
            }
            Statement::FileOperation { op, path, dest } => match (op, dest) {
                (FileOpKind::Moved, Some(dest)) => w.line(format!("shutil.move({}, {})", quote(path), quote(dest))),
                (FileOpKind::Deleted, _) => {
                    w.line(format!("if os.path.exists({}):", quote(path)));
                    w.indent();
                    w.line(format!("os.remove({})", quote(path)));
                    w.dedent();
                }
                _ => w.comment("#", &file_note(*op, path, dest.as_deref())),
            },
            Statement::Comment(_) | Statement::Warning(_) => {}
        }
    }
}
