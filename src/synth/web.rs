//! Browser automation scripts
//!
//! Playwright pierces open shadow roots with plain CSS, so its locators are used as-is.
//! Selenium cannot, so shadow-hosted elements are reached through explicit
//! `shadow_root` hops from the outermost host inward.

use crate::dom::resolver::xpath_string;
use crate::dom::SelectorStrategy;
use crate::event::FileOpKind;
use crate::graph::SessionState;
use crate::synth::emitter::{EmitContext, Emitter};
use crate::synth::plan::{KeyPress, Locator, Statement, TextValue};
use crate::synth::script::{render_items, seconds, ScriptStyle, Syntax};
use crate::synth::writer::{quote, CodeWriter};
use crate::synth::{TargetFormat, WebDialect};

/// Default wait for elements in Selenium scripts
const SELENIUM_TIMEOUT_SECS: u64 = 10;

/// Cookie fields Selenium's `add_cookie` accepts
const SELENIUM_COOKIE_FIELDS: &str = "(\"name\", \"value\", \"domain\", \"path\", \"secure\", \"httpOnly\", \"expiry\", \"sameSite\")";

/// `generic-web-automation` emitter
#[derive(Debug, Default, Clone, Copy)]
pub struct WebEmitter;

impl Emitter for WebEmitter {
    fn format(&self) -> TargetFormat {
        TargetFormat::WebAutomation
    }

    fn description(&self) -> &str {
        "Browser automation script (Playwright TypeScript or Selenium Python)"
    }

    fn emit(&self, context: EmitContext<'_>) -> String {
        match context.options.web_dialect {
            WebDialect::Playwright => playwright(context),
            WebDialect::Selenium => selenium(context),
        }
    }
}

fn playwright(context: EmitContext<'_>) -> String {
    let plan = context.plan;
    let mut w = CodeWriter::new("  ");

    w.line("import { test, expect } from '@playwright/test';");
    w.blank();
    w.comment("//", &format!("{} (generated from a captured process)", plan.title));

    if let Some(state) = &plan.session_state {
        w.blank();
        w.comment("//", &session_note(state));
        let json = serde_json::to_string_pretty(&state.storage_state()).unwrap_or_else(|_| "{}".to_string());
        let mut lines = json.lines();
        if let Some(first) = lines.next() {
            w.line(format!("test.use({{ storageState: {}", first));
        }
        for line in lines {
            w.line(line);
        }
        w.line("});");
    }

    w.blank();
    w.line(format!("test({}, async ({{ page }}) => {{", quote(&plan.title)));
    w.indent();
    if plan.items.is_empty() {
        w.comment("//", "No steps captured");
    }
    render_items(&Playwright, &mut w, &plan.items);
    w.dedent();
    w.line("});");
    w.finish()
}

struct Playwright;

impl Playwright {
    fn locator(locator: &Locator) -> String {
        let selector = match locator.strategy {
            SelectorStrategy::XPath => format!("xpath={}", locator.selector),
            _ => locator.selector.clone(),
        };
        format!("page.locator({})", quote(&selector))
    }

    fn text(value: &TextValue) -> String {
        match value {
            TextValue::Literal(text) => quote(text),
            TextValue::Secret { env } => format!("process.env.{} ?? ''", env),
        }
    }

    fn key(key: &KeyPress) -> String {
        let mut parts: Vec<&str> = key
            .modifiers
            .iter()
            .map(|m| match m.as_str() {
                "ctrl" | "control" => "Control",
                "meta" | "cmd" | "command" => "Meta",
                "alt" | "option" => "Alt",
                "shift" => "Shift",
                other => other,
            })
            .collect();
        parts.push(key.key.as_str());
        quote(&parts.join("+"))
    }
}

impl ScriptStyle for Playwright {
    fn syntax(&self) -> Syntax {
        Syntax::TypeScript
    }

    fn statement(&self, w: &mut CodeWriter, statement: &Statement) {
        match statement {
            Statement::Navigate { url } => w.line(format!("await page.goto({});", quote(url))),
            Statement::WaitFor { locator } => w.line(format!("await {}.waitFor();", Self::locator(locator))),
            Statement::Click { locator } => w.line(format!("await {}.click();", Self::locator(locator))),
            Statement::ClickAt { x, y } => w.line(format!("await page.mouse.click({}, {});", x, y)),
            Statement::Fill { locator, value } => {
                w.line(format!("await {}.fill({});", Self::locator(locator), Self::text(value)))
            }
            Statement::TypeText { value } => w.line(format!("await page.keyboard.type({});", Self::text(value))),
            Statement::PressKey { locator, key } => match locator {
                Some(locator) => w.line(format!("await {}.press({});", Self::locator(locator), Self::key(key))),
                None => w.line(format!("await page.keyboard.press({});", Self::key(key))),
            },
            Statement::Assert { locator, text } => match text {
                Some(text) => w.line(format!(
                    "await expect({}).toContainText({});",
                    Self::locator(locator),
                    quote(text)
                )),
                None => w.line(format!("await expect({}).toBeVisible();", Self::locator(locator))),
            },
            Statement::Wait { ms } => w.line(format!("await page.waitForTimeout({});", ms)),
            Statement::CopyData { preview, data_type } => {
                w.comment("//", &format!("Copy {}: {}", data_type, preview));
                w.line("await page.keyboard.press('ControlOrMeta+C');");
            }
            Statement::FileOperation { op, path, dest } => w.comment("//", &file_note(*op, path, dest.as_deref())),
            Statement::Comment(_) | Statement::Warning(_) => {}
        }
    }
}

fn selenium(context: EmitContext<'_>) -> String {
    let plan = context.plan;
    let mut w = CodeWriter::python();

    w.line(format!("\"\"\"{}", plan.title.replace("\"\"\"", "'''")));
    w.blank();
    w.line("Generated from a captured process.");
    w.line("\"\"\"");
    w.blank();
    if plan.session_state.is_some() {
        w.line("import json");
    }
    w.line("import os");
    w.line("import time");
    w.blank();
    w.line("from selenium import webdriver");
    w.line("from selenium.webdriver.common.action_chains import ActionChains");
    w.line("from selenium.webdriver.common.by import By");
    w.line("from selenium.webdriver.common.keys import Keys");
    w.line("from selenium.webdriver.support import expected_conditions as EC");
    w.line("from selenium.webdriver.support.ui import WebDriverWait");

    let restore_url = plan.session_state.as_ref().and_then(session_url);
    if let Some(state) = &plan.session_state {
        w.blank();
        w.comment("#", &session_note(state));
        let cookies = serde_json::to_string(&state.cookies).unwrap_or_else(|_| "[]".to_string());
        w.line(format!("SESSION_COOKIES = json.loads({})", quote(&cookies)));
        w.line(format!("COOKIE_FIELDS = {}", SELENIUM_COOKIE_FIELDS));
    }
    if let Some(url) = &restore_url {
        w.line(format!("SESSION_URL = {}", quote(url)));
        w.blank_lines(2);
        w.line("def restore_session(driver):");
        w.indent();
        w.line("driver.get(SESSION_URL)");
        w.line("for cookie in SESSION_COOKIES:");
        w.indent();
        w.line("driver.add_cookie({key: value for key, value in cookie.items() if key in COOKIE_FIELDS})");
        w.dedent();
        w.line("driver.refresh()");
        w.dedent();
    } else if plan.session_state.is_some() {
        w.comment("#", "Session state has no URL or domain; cookies are not restored automatically");
    }

    w.blank_lines(2);
    w.line("def run(driver):");
    w.indent();
    w.line(format!("wait = WebDriverWait(driver, {})", SELENIUM_TIMEOUT_SECS));
    w.blank();
    if plan.items.is_empty() {
        w.comment("#", "No steps captured");
    }
    render_items(&Selenium, &mut w, &plan.items);
    w.dedent();

    w.blank_lines(2);
    w.line("if __name__ == \"__main__\":");
    w.indent();
    w.line("driver = webdriver.Chrome()");
    w.line("try:");
    w.indent();
    if restore_url.is_some() {
        w.line("restore_session(driver)");
    }
    w.line("run(driver)");
    w.dedent();
    w.line("finally:");
    w.indent();
    w.line("driver.quit()");
    w.finish()
}

struct Selenium;

impl Selenium {
    /// `(By.*, selector)` for a light-DOM lookup
    fn by(locator: &Locator) -> (&'static str, String) {
        match locator.strategy {
            SelectorStrategy::XPath => ("By.XPATH", locator.selector.clone()),
            SelectorStrategy::TextContent => (
                "By.XPATH",
                format!(
                    "//{}[contains(normalize-space(.), {})]",
                    locator.tag.to_lowercase(),
                    xpath_string(&locator.value)
                ),
            ),
            _ => ("By.CSS_SELECTOR", locator.selector.clone()),
        }
    }

    /// Expression evaluating to the element, crossing shadow roots when needed
    fn find(locator: &Locator) -> String {
        if !locator.requires_shadow_piercing() {
            let (by, selector) = Self::by(locator);
            return format!("driver.find_element({}, {})", by, quote(&selector));
        }
        let mut expr = String::from("driver");
        for host in &locator.shadow_hosts {
            expr.push_str(&format!(".find_element(By.CSS_SELECTOR, {}).shadow_root", quote(host)));
        }
        expr.push_str(&format!(".find_element(By.CSS_SELECTOR, {})", quote(locator.css_or_tag())));
        expr
    }

    fn text(value: &TextValue) -> String {
        match value {
            TextValue::Literal(text) => quote(text),
            TextValue::Secret { env } => format!("os.environ.get({}, \"\")", quote(env)),
        }
    }

    fn key(key: &str) -> String {
        let named = match key {
            "Enter" | "Return" | "NumpadEnter" => "ENTER",
            "Tab" => "TAB",
            "Escape" | "Esc" => "ESCAPE",
            "Backspace" => "BACKSPACE",
            "Delete" => "DELETE",
            "ArrowUp" => "ARROW_UP",
            "ArrowDown" => "ARROW_DOWN",
            "ArrowLeft" => "ARROW_LEFT",
            "ArrowRight" => "ARROW_RIGHT",
            "Home" => "HOME",
            "End" => "END",
            "PageUp" => "PAGE_UP",
            "PageDown" => "PAGE_DOWN",
            " " | "Space" => "SPACE",
            f if f.len() <= 3 && f.starts_with('F') && f[1..].parse::<u8>().is_ok_and(|n| (1..=12).contains(&n)) => {
                return format!("Keys.{}", f);
            }
            other => return quote(other),
        };
        format!("Keys.{}", named)
    }

    fn modifier(name: &str) -> &'static str {
        match name {
            "meta" | "cmd" | "command" => "Keys.COMMAND",
            "alt" | "option" => "Keys.ALT",
            "shift" => "Keys.SHIFT",
            _ => "Keys.CONTROL",
        }
    }

    fn chord(key: &KeyPress) -> String {
        let mut chain = String::from("ActionChains(driver)");
        for m in &key.modifiers {
            chain.push_str(&format!(".key_down({})", Self::modifier(m)));
        }
        chain.push_str(&format!(".send_keys({})", Self::key(&key.key)));
        for m in key.modifiers.iter().rev() {
            chain.push_str(&format!(".key_up({})", Self::modifier(m)));
        }
        chain.push_str(".perform()");
        chain
    }

    fn wait_for(locator: &Locator) -> String {
        if locator.requires_shadow_piercing() {
            format!("wait.until(lambda _: {})", Self::find(locator))
        } else {
            let (by, selector) = Self::by(locator);
            format!("wait.until(EC.presence_of_element_located(({}, {})))", by, quote(&selector))
        }
    }
}

impl ScriptStyle for Selenium {
    fn syntax(&self) -> Syntax {
        Syntax::Python
    }

    fn statement(&self, w: &mut CodeWriter, statement: &Statement) {
        match statement {
            Statement::Navigate { url } => w.line(format!("driver.get({})", quote(url))),
            Statement::WaitFor { locator } => {
                if locator.requires_shadow_piercing() && locator.css.is_none() {
                    w.comment("#", &format!("Inside shadow root, located by tag instead of {}", locator.strategy));
                }
                w.line(Self::wait_for(locator));
            }
            Statement::Click { locator } => w.line(format!("{}.click()", Self::find(locator))),
            Statement::ClickAt { x, y } => w.line(format!(
                "driver.execute_script(\"document.elementFromPoint(arguments[0], arguments[1]).click();\", {}, {})",
                x, y
            )),
            Statement::Fill { locator, value } => {
                w.line(format!("field = {}", Self::find(locator)));
                w.line("field.clear()");
                w.line(format!("field.send_keys({})", Self::text(value)));
            }
            Statement::TypeText { value } => {
                w.line(format!("ActionChains(driver).send_keys({}).perform()", Self::text(value)))
            }
            Statement::PressKey { locator, key } => match locator {
                Some(locator) if key.modifiers.is_empty() => {
                    w.line(format!("{}.send_keys({})", Self::find(locator), Self::key(&key.key)))
                }
                _ => w.line(Self::chord(key)),
            },
            Statement::Assert { locator, text } => match text {
                Some(text) => w.line(format!("assert {} in {}.text", quote(text), Self::find(locator))),
                None => w.line(format!("assert {}.is_displayed()", Self::find(locator))),
            },
            Statement::Wait { ms } => w.line(format!("time.sleep({})", seconds(*ms))),
            Statement::CopyData { preview, data_type } => {
                w.comment("#", &format!("Copy {}: {}", data_type, preview));
                w.line(Self::chord(&KeyPress::parse("ctrl+c")));
            }
            Statement::FileOperation { op, path, dest } => w.comment("#", &file_note(*op, path, dest.as_deref())),
            Statement::Comment(_) | Statement::Warning(_) => {}
        }
    }
}

fn session_note(state: &SessionState) -> String {
    let mut note = format!("Session restored from capture ({} cookies", state.cookie_count());
    if let Some(domain) = &state.metadata.domain {
        note.push_str(&format!(" for {}", domain));
    }
    if let Some(at) = &state.metadata.captured_at {
        note.push_str(&format!(", captured {}", at));
    }
    note.push(')');
    note
}

/// Page to open before cookies can be set for their domain
fn session_url(state: &SessionState) -> Option<String> {
    state.metadata.url.clone().or_else(|| {
        let domain = state.metadata.domain.clone().or_else(|| {
            state
                .cookies
                .iter()
                .find_map(|c| c.get("domain").and_then(|d| d.as_str()).map(String::from))
        })?;
        Some(format!("https://{}", domain.trim_start_matches('.')))
    })
}

pub(crate) fn file_note(op: FileOpKind, path: &str, dest: Option<&str>) -> String {
    match dest {
        Some(dest) => format!("File {}: {} -> {}", op, path, dest),
        None => format!("File {}: {}", op, path),
    }
}
