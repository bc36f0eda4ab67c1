use std::collections::BTreeMap;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{EntryKind, ExtractorKind, Field, FieldRule, RuleSet, Target};
use crate::error::RuleError;

/// One feed's slice of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub html: String,
    /// Visible text, one trimmed non-empty line per text node.
    pub text: String,
}

impl Entry {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}

/**
    A rule set with every pattern compiled.

    Built once per rule set and reused for every page, so a bad pattern is
    reported when the rules are loaded instead of on each fetch.
*/
#[derive(Debug)]
pub struct CompiledRules {
    segmenter: Segmenter,
    fields: BTreeMap<Field, CompiledField>,
    keywords: Vec<String>,
}

#[derive(Debug)]
enum Segmenter {
    Css(Selector),
    Regex(Regex),
}

#[derive(Debug)]
struct CompiledField {
    matcher: Matcher,
    filter: Option<Regex>,
    default: Option<String>,
    unescape: bool,
}

#[derive(Debug)]
enum Matcher {
    Regex { re: Regex, target: Target },
    Css { selector: Selector, target: CssTarget },
    Line(LineRef),
    Const(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CssTarget {
    Text,
    Attr(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineRef {
    First,
    /// Final line of a multi-line entry; single-line entries have none.
    Last,
    Index(isize),
}

impl CompiledRules {
    pub fn new(rules: &RuleSet) -> Result<Self, RuleError> {
        let segmenter = match rules.entries.kind {
            EntryKind::Css => Segmenter::Css(compile_selector("entries", &rules.entries.path)?),
            EntryKind::Regex => Segmenter::Regex(compile_regex("entries", &rules.entries.path)?),
        };

        let mut fields = BTreeMap::new();
        for (field, rule) in &rules.fields {
            fields.insert(*field, compile_field(*field, rule)?);
        }

        let keywords = rules
            .encryption
            .keywords
            .iter()
            .map(|k| k.to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Ok(Self {
            segmenter,
            fields,
            keywords,
        })
    }

    /// Cut a page body into entries. An empty or unmatched body yields no entries.
    pub fn entries(&self, body: &str) -> Vec<Entry> {
        match &self.segmenter {
            Segmenter::Css(selector) => {
                let document = Html::parse_document(body);
                document
                    .select(selector)
                    .map(|element| Entry {
                        html: element.html(),
                        text: element_text(element),
                    })
                    .collect()
            }
            Segmenter::Regex(re) => re
                .captures_iter(body)
                .filter_map(|captures| captures.get(1).or_else(|| captures.get(0)))
                .map(|m| m.as_str())
                .filter(|chunk| !chunk.trim().is_empty())
                .map(|chunk| Entry {
                    html: chunk.to_string(),
                    text: fragment_text(chunk),
                })
                .collect(),
        }
    }

    /**
        Extract one field from an entry, falling back to the rule's default.
        Returns `None` when the table has no rule for the field, or the rule
        missed and has no default.
    */
    pub fn field(&self, field: Field, entry: &Entry) -> Option<String> {
        let compiled = self.fields.get(&field)?;

        let value = match &compiled.matcher {
            Matcher::Regex { re, target } => {
                let haystack = match target {
                    Target::Text => entry.text.as_str(),
                    Target::Html => entry.html.as_str(),
                };
                first_capture(re, haystack)
            }
            Matcher::Css { selector, target } => {
                let fragment = Html::parse_fragment(&entry.html);
                fragment
                    .select(selector)
                    .find_map(|element| css_value(element, target))
            }
            Matcher::Line(line) => pick_line(entry, *line),
            Matcher::Const(value) => Some(value.clone()),
        };

        let value = match (&compiled.filter, value) {
            (Some(filter), Some(value)) => first_capture(filter, &value),
            (_, value) => value,
        };

        let value = if compiled.unescape {
            value.map(|v| unescape_html_string(&v))
        } else {
            value
        };

        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| compiled.default.clone())
    }

    /// Whether any encryption keyword appears in the entry text.
    pub fn is_encrypted(&self, entry: &Entry) -> bool {
        let text = entry.text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

fn compile_field(field: Field, rule: &FieldRule) -> Result<CompiledField, RuleError> {
    let name = field.to_name();
    let path = move || {
        rule.path.as_deref().ok_or_else(|| RuleError::Missing {
            rule: format!("field '{}'", name),
            what: "path",
        })
    };

    let matcher = match rule.kind {
        ExtractorKind::Regex => Matcher::Regex {
            re: compile_regex(name, path()?)?,
            target: rule.target,
        },
        ExtractorKind::Css => {
            let (selector, target) = parse_css_path(path()?);
            Matcher::Css {
                selector: compile_selector(name, &selector)?,
                target,
            }
        }
        ExtractorKind::Line => Matcher::Line(parse_line_ref(name, path()?)?),
        ExtractorKind::Const => Matcher::Const(path()?.to_string()),
    };

    let filter = rule
        .regex
        .as_deref()
        .map(|pattern| compile_regex(name, pattern))
        .transpose()?;

    Ok(CompiledField {
        matcher,
        filter,
        default: rule.default.clone(),
        unescape: rule.unescape,
    })
}

fn compile_regex(rule: &str, pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|source| RuleError::Regex {
        rule: rule.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_selector(rule: &str, selector: &str) -> Result<Selector, RuleError> {
    Selector::parse(selector).map_err(|e| RuleError::Selector {
        rule: rule.to_string(),
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

fn parse_line_ref(rule: &str, path: &str) -> Result<LineRef, RuleError> {
    match path.trim() {
        "first" => Ok(LineRef::First),
        "last" => Ok(LineRef::Last),
        other => other
            .parse::<isize>()
            .map(LineRef::Index)
            .map_err(|_| RuleError::Missing {
                rule: format!("line rule '{}'", rule),
                what: "path of first, last or an integer index",
            }),
    }
}

// ── Regex ────────────────────────────────────────────────────────────────────

fn first_capture(re: &Regex, haystack: &str) -> Option<String> {
    let captures = re.captures(haystack)?;

    if captures.len() > 1 {
        return (1..captures.len())
            .filter_map(|idx| captures.get(idx))
            .map(|m| m.as_str())
            .find(|s| !s.trim().is_empty())
            .map(|s| s.to_string());
    }

    captures.get(0).map(|m| m.as_str().to_string())
}

// ── CSS ──────────────────────────────────────────────────────────────────────

fn parse_css_path(path: &str) -> (String, CssTarget) {
    if let Some(idx) = path.rfind("::attr(") {
        let (selector, rest) = path.split_at(idx);
        let attr_name = rest.trim_start_matches("::attr(").trim_end_matches(')');
        return (
            selector.trim().to_string(),
            CssTarget::Attr(attr_name.to_string()),
        );
    }

    let selector = path
        .trim_end_matches("::text()")
        .trim_end_matches("::text")
        .trim();
    (selector.to_string(), CssTarget::Text)
}

fn css_value(element: ElementRef, target: &CssTarget) -> Option<String> {
    match target {
        CssTarget::Text => {
            let text = element.text().collect::<Vec<_>>().join(" ");
            let text = collapse_whitespace(&text);
            if text.is_empty() { None } else { Some(text) }
        }
        CssTarget::Attr(name) => element.value().attr(name).map(|s| s.to_string()),
    }
}

// ── Lines ────────────────────────────────────────────────────────────────────

fn pick_line(entry: &Entry, line: LineRef) -> Option<String> {
    let lines: Vec<&str> = entry.lines().collect();
    let picked = match line {
        LineRef::First => lines.first(),
        LineRef::Last if lines.len() > 1 => lines.last(),
        LineRef::Last => None,
        LineRef::Index(idx) if idx >= 0 => lines.get(idx as usize),
        LineRef::Index(idx) => lines
            .len()
            .checked_sub(idx.unsigned_abs())
            .and_then(|i| lines.get(i)),
    };
    picked.map(|s| s.to_string())
}

// ── Text helpers ─────────────────────────────────────────────────────────────

fn element_text(element: ElementRef) -> String {
    text_lines(element.text())
}

fn fragment_text(chunk: &str) -> String {
    let fragment = Html::parse_fragment(chunk);
    text_lines(fragment.root_element().text())
}

fn text_lines<'a>(nodes: impl Iterator<Item = &'a str>) -> String {
    nodes
        .flat_map(|node| node.lines())
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn unescape_html_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '&' {
            out.push(ch);
            continue;
        }

        let mut entity = String::new();
        let mut terminated = false;
        while let Some(&c) = chars.peek() {
            chars.next();
            if c == ';' {
                terminated = true;
                break;
            }
            entity.push(c);
            if entity.len() > 12 {
                break;
            }
        }

        let decoded = match entity.as_str() {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "nbsp" => Some(' '),
            "deg" => Some('°'),
            "#39" | "#x27" => Some('\''),
            _ => {
                if let Some(hex) = entity.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok().and_then(char::from_u32)
                } else {
                    None
                }
            }
        };

        match decoded {
            Some(c) if terminated => out.push(c),
            _ => {
                out.push('&');
                out.push_str(&entity);
                if terminated {
                    out.push(';');
                }
            }
        }
    }

    out
}
