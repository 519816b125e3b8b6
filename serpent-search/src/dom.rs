//! DOM query helpers over a parsed page snapshot.
//!
//! Thin layer over [`scraper`] giving the extraction protocol the four
//! operations it needs: select, read text, read an attribute, count.
//! Snapshots are not `Send`, so parse and query them without crossing an
//! `.await`.

use scraper::{ElementRef, Html, Selector};

use crate::error::SearchError;

/// A parsed page.
pub struct Snapshot {
    html: Html,
}

impl Snapshot {
    /// Parse a raw HTML document. Parsing is lenient and never fails.
    pub fn parse(raw: &str) -> Self {
        Self {
            html: Html::parse_document(raw),
        }
    }

    /// All elements matching `selector`, in document order.
    pub fn select<'a>(&'a self, selector: &Selector) -> Vec<ElementRef<'a>> {
        self.html.select(selector).collect()
    }

    /// Number of elements matching `selector`.
    pub fn count(&self, selector: &Selector) -> usize {
        self.html.select(selector).count()
    }

    /// First selector in `chain` with at least one match, with its index and
    /// matches.
    pub fn first_matching<'a>(
        &'a self,
        chain: &[Selector],
    ) -> Option<(usize, Vec<ElementRef<'a>>)> {
        chain.iter().enumerate().find_map(|(i, selector)| {
            let matches = self.select(selector);
            (!matches.is_empty()).then_some((i, matches))
        })
    }

    /// Visible text of the whole document, whitespace-collapsed.
    pub fn text(&self) -> String {
        collapse(self.html.root_element().text())
    }

    /// Class and id labels of the first `limit` elements under `<body>`.
    pub fn element_labels(&self, limit: usize) -> Vec<String> {
        let Ok(all) = Selector::parse("body *") else {
            return Vec::new();
        };
        self.html
            .select(&all)
            .filter_map(|el| {
                let value = el.value();
                let classes: Vec<&str> = value.classes().collect();
                match (value.id(), classes.is_empty()) {
                    (None, true) => None,
                    (Some(id), true) => Some(format!("{}#{id}", value.name())),
                    (None, false) => Some(format!("{}.{}", value.name(), classes.join("."))),
                    (Some(id), false) => Some(format!(
                        "{}#{id}.{}",
                        value.name(),
                        classes.join(".")
                    )),
                }
            })
            .take(limit)
            .collect()
    }
}

/// Compile a selector chain.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] naming the first invalid selector.
pub fn compile(chain: &[&str]) -> Result<Vec<Selector>, SearchError> {
    chain
        .iter()
        .map(|s| {
            Selector::parse(s).map_err(|e| SearchError::Parse(format!("invalid selector '{s}': {e}")))
        })
        .collect()
}

/// Compile a single selector.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if the selector is invalid.
pub fn compile_one(selector: &str) -> Result<Selector, SearchError> {
    Selector::parse(selector)
        .map_err(|e| SearchError::Parse(format!("invalid selector '{selector}': {e}")))
}

/// Text content of `element`, trimmed with internal whitespace collapsed.
pub fn text_of(element: ElementRef<'_>) -> String {
    collapse(element.text())
}

/// First non-empty text under `scope` along `chain`.
pub fn first_text(scope: ElementRef<'_>, chain: &[Selector]) -> Option<String> {
    chain.iter().find_map(|selector| {
        scope
            .select(selector)
            .map(text_of)
            .find(|text| !text.is_empty())
    })
}

/// Attribute value of `element`, if present and non-blank.
pub fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Whether `element` itself or any descendant matches `selector`.
pub fn has_match(element: ElementRef<'_>, selector: &Selector) -> bool {
    selector.matches(&element) || element.select(selector).next().is_some()
}

fn collapse<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in parts.flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
