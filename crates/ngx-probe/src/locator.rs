//! Typed element selectors.
//!
//! A [`Selector`] describes how to find elements on a page. Drivers decide how
//! to evaluate it: the Chromium driver turns it into a JavaScript expression
//! with [`Selector::to_query_all`], the in-memory showcase matches it
//! structurally.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ARIA role used by role selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Text input or textarea
    Textbox,
    /// Radio input
    Radio,
    /// Checkbox input
    Checkbox,
    /// Button or submit input
    Button,
}

impl Role {
    /// CSS matching the native elements that carry this role
    #[must_use]
    pub const fn css(&self) -> &'static str {
        match self {
            Self::Textbox => {
                "input:not([type]),input[type=text],input[type=email],input[type=password],textarea,[role=textbox]"
            }
            Self::Radio => "input[type=radio],[role=radio]",
            Self::Checkbox => "input[type=checkbox],[role=checkbox]",
            Self::Button => "button,input[type=submit],[role=button]",
        }
    }

    /// Role name as written in ARIA
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Textbox => "textbox",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Button => "button",
        }
    }
}

/// Selector types supported by the drivers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "nb-calendar-view-mode")
    Css(String),
    /// Innermost elements whose text contains the value
    Text(String),
    /// Innermost elements whose trimmed text equals the value
    ExactText(String),
    /// Elements with the given `placeholder` attribute
    Placeholder(String),
    /// Elements with the given `title` attribute
    Title(String),
    /// Elements with an ARIA role, optionally filtered by accessible name
    Role {
        /// Role to match
        role: Role,
        /// Accessible name (label, aria-label, placeholder or text)
        name: Option<String>,
    },
    /// CSS elements whose text contains a value (Playwright `hasText`)
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
    /// `inner` evaluated inside every element matched by `container`
    Within {
        /// Scoping selector
        container: Box<Selector>,
        /// Selector evaluated inside the container
        inner: Box<Selector>,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create an exact text selector
    #[must_use]
    pub fn exact_text(text: impl Into<String>) -> Self {
        Self::ExactText(text.into())
    }

    /// Create a placeholder selector
    #[must_use]
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::Placeholder(text.into())
    }

    /// Create a title selector
    #[must_use]
    pub fn title(text: impl Into<String>) -> Self {
        Self::Title(text.into())
    }

    /// Create a role selector without a name filter
    #[must_use]
    pub const fn role(role: Role) -> Self {
        Self::Role { role, name: None }
    }

    /// Create a role selector filtered by accessible name
    #[must_use]
    pub fn role_named(role: Role, name: impl Into<String>) -> Self {
        Self::Role {
            role,
            name: Some(name.into()),
        }
    }

    /// Create a CSS selector filtered by contained text
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// Scope another selector inside this one
    #[must_use]
    pub fn within(self, inner: Self) -> Self {
        Self::Within {
            container: Box::new(self),
            inner: Box::new(inner),
        }
    }

    /// JavaScript expression evaluating to an array of all matching elements
    #[must_use]
    pub fn to_query_all(&self) -> String {
        self.js_all("document")
    }

    /// JavaScript expression evaluating to the first matching element or null
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("({}[0] || null)", self.to_query_all())
    }

    /// JavaScript expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("{}.length", self.to_query_all())
    }

    fn js_all(&self, root: &str) -> String {
        match self {
            Self::Css(css) => format!("Array.from({root}.querySelectorAll({}))", js_str(css)),
            Self::Text(text) => {
                let t = js_str(text);
                format!(
                    "Array.from({root}.querySelectorAll('*')).filter(el => el.textContent.includes({t}) && !Array.from(el.children).some(c => c.textContent.includes({t})))"
                )
            }
            Self::ExactText(text) => {
                let t = js_str(text);
                format!(
                    "Array.from({root}.querySelectorAll('*')).filter(el => el.textContent.trim() === {t} && !Array.from(el.children).some(c => c.textContent.trim() === {t}))"
                )
            }
            Self::Placeholder(value) => format!(
                "Array.from({root}.querySelectorAll('[placeholder]')).filter(el => el.getAttribute('placeholder') === {})",
                js_str(value)
            ),
            Self::Title(value) => format!(
                "Array.from({root}.querySelectorAll('[title]')).filter(el => el.getAttribute('title') === {})",
                js_str(value)
            ),
            Self::Role { role, name } => {
                let base = format!(
                    "Array.from({root}.querySelectorAll({}))",
                    js_str(role.css())
                );
                match name {
                    None => base,
                    Some(name) => format!(
                        "{base}.filter(el => [el.getAttribute('aria-label'), el.getAttribute('placeholder'), ...Array.from(el.labels || []).map(l => l.textContent), el.textContent].some(n => n && n.trim() === {}))",
                        js_str(name)
                    ),
                }
            }
            Self::CssWithText { css, text } => format!(
                "Array.from({root}.querySelectorAll({})).filter(el => el.textContent.includes({}))",
                js_str(css),
                js_str(text)
            ),
            Self::Within { container, inner } => format!(
                "{}.flatMap(scope => {})",
                container.js_all(root),
                inner.js_all("scope")
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "css={css}"),
            Self::Text(text) => write!(f, "text={text:?}"),
            Self::ExactText(text) => write!(f, "text-is={text:?}"),
            Self::Placeholder(value) => write!(f, "placeholder={value:?}"),
            Self::Title(value) => write!(f, "title={value:?}"),
            Self::Role { role, name: None } => write!(f, "role={}", role.as_str()),
            Self::Role {
                role,
                name: Some(name),
            } => write!(f, "role={}[name={name:?}]", role.as_str()),
            Self::CssWithText { css, text } => write!(f, "css={css}[has-text={text:?}]"),
            Self::Within { container, inner } => write!(f, "{container} >> {inner}"),
        }
    }
}

fn js_str(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}
