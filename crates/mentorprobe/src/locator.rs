//! Element location strategies and ordered candidate lists.
//!
//! A [`CandidateList`] names one logical UI concept ("search input", "mentor
//! card") and holds the strategies that may locate it, in priority order.
//! Earlier strategies win. Each [`Strategy`] renders to a JavaScript
//! expression so any CDP-backed driver can evaluate it; the first match is
//! bound for single-element queries and all matches are enumerated for
//! counting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One way of locating an element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// CSS selector (e.g., "input[type='search']")
    Css(String),
    /// Innermost element whose text content contains the string
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// Placeholder attribute of an input
    Placeholder(String),
    /// ARIA role, optionally narrowed by accessible name
    Role {
        /// Role name ("button", "searchbox", ...)
        role: String,
        /// Accessible name fragment
        #[serde(default)]
        name: Option<String>,
    },
    /// CSS selector filtered by text content
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Strategy {
    /// Create a CSS strategy
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text strategy
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a test ID strategy
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a placeholder strategy
    #[must_use]
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::Placeholder(text.into())
    }

    /// Create a role strategy
    #[must_use]
    pub fn role(role: impl Into<String>, name: Option<&str>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.map(str::to_string),
        }
    }

    /// Create a CSS strategy filtered by text
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// JavaScript expression evaluating to an array of all matching elements
    #[must_use]
    pub fn to_all_query(&self) -> String {
        match self {
            Self::Css(s) => all_css(s),
            Self::Text(t) => {
                let t = js_str(t);
                format!(
                    "Array.from(document.querySelectorAll('body *')).filter(el => \
                     el.textContent.includes({t}) && \
                     !Array.from(el.children).some(c => c.textContent.includes({t})))"
                )
            }
            Self::TestId(id) => all_css(&format!("[data-testid={}]", js_str(id))),
            Self::Placeholder(p) => all_css(&format!("[placeholder*={}]", js_str(p))),
            Self::Role { role, name } => {
                let all = all_css(&role_css(role));
                match name {
                    Some(n) => format!(
                        "{all}.filter(el => \
                         ((el.getAttribute('aria-label') || '') + ' ' + el.textContent).includes({}))",
                        js_str(n)
                    ),
                    None => all,
                }
            }
            Self::CssWithText { css, text } => format!(
                "{}.filter(el => el.textContent.includes({}))",
                all_css(css),
                js_str(text)
            ),
        }
    }

    /// JavaScript expression evaluating to the first matching element or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("({}[0] || null)", self.to_all_query())
    }

    /// JavaScript expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("{}.length", self.to_all_query())
    }

    /// Short kind tag for logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::Text(_) => "text",
            Self::TestId(_) => "test_id",
            Self::Placeholder(_) => "placeholder",
            Self::Role { .. } => "role",
            Self::CssWithText { .. } => "css_with_text",
        }
    }
}

/// Encode a string as a JavaScript string literal
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

fn all_css(css: &str) -> String {
    format!("Array.from(document.querySelectorAll({}))", js_str(css))
}

/// CSS covering explicit and implicit ARIA roles for common elements
fn role_css(role: &str) -> String {
    let implicit = match role {
        "button" => Some("button, input[type='button'], input[type='submit']"),
        "link" => Some("a[href]"),
        "heading" => Some("h1, h2, h3, h4, h5, h6"),
        "searchbox" => Some("input[type='search']"),
        "textbox" => Some("input:not([type]), input[type='text'], textarea"),
        "img" => Some("img"),
        "navigation" => Some("nav"),
        "main" => Some("main"),
        "list" => Some("ul, ol"),
        "listitem" => Some("li"),
        _ => None,
    };
    match implicit {
        Some(tags) => format!("[role=\"{role}\"], {tags}"),
        None => format!("[role=\"{role}\"]"),
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::Text(t) => write!(f, "text={t:?}"),
            Self::TestId(id) => write!(f, "test_id={id}"),
            Self::Placeholder(p) => write!(f, "placeholder={p:?}"),
            Self::Role { role, name: None } => write!(f, "role={role}"),
            Self::Role {
                role,
                name: Some(n),
            } => write!(f, "role={role}[name={n:?}]"),
            Self::CssWithText { css, text } => write!(f, "css={css}:has-text({text:?})"),
        }
    }
}

/// Ordered strategies for one logical UI concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateList {
    /// Human-readable concept name used in diagnostics
    pub concept: String,
    /// Strategies in priority order
    pub candidates: Vec<Strategy>,
}

impl CandidateList {
    /// Create an empty list for a concept
    #[must_use]
    pub fn new(concept: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            candidates: Vec::new(),
        }
    }

    /// Append a lower-priority strategy
    #[must_use]
    pub fn or(mut self, strategy: Strategy) -> Self {
        self.candidates.push(strategy);
        self
    }

    /// Number of strategies
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the list has no strategies
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Iterate strategies in priority order
    pub fn iter(&self) -> std::slice::Iter<'_, Strategy> {
        self.candidates.iter()
    }
}

impl fmt::Display for CandidateList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.concept)
    }
}
