use std::collections::BTreeMap;
use std::path::Path;

use include_dir::{Dir, include_dir};
use serde::{Deserialize, Serialize};

use crate::error::RuleError;

pub mod extractor;

pub use extractor::{CompiledRules, Entry};

/// Embedded extraction rule sets.
static RULES_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/rules");

/// Keywords that mark a feed as scrambled when a rule set names none.
pub const DEFAULT_ENCRYPTION_KEYWORDS: [&str; 5] =
    ["Encrypted", "Scrambled", "BISS", "PowerVu", "crypt"];

/**
    A declarative extraction rule table for one listing site.

    The table is the only place that knows about the site's markup: how to cut
    the page into feed entries, and for each record field which pattern to try
    and what to fall back to. When the site changes its markup, the rule set
    changes and the parser stays as it is.
*/
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleSet {
    pub source: SourceInfo,
    pub entries: EntryRule,
    pub fields: BTreeMap<Field, FieldRule>,
    #[serde(default)]
    pub encryption: EncryptionRule,
}

/// Rule set metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    /// Listing page the rules were written against.
    #[serde(default)]
    pub url: Option<String>,
}

/// How a page is split into one chunk per feed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntryRule {
    pub kind: EntryKind,
    pub path: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Every element matching a CSS selector is one entry.
    Css,
    /// Every match of a regex is one entry (capture group 1 if present).
    Regex,
}

/// Record fields a rule can target.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Satellite,
    Frequency,
    Polarization,
    SymbolRate,
    Fec,
    Category,
    Title,
    System,
    Modulation,
}

impl Field {
    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Satellite => "satellite",
            Self::Frequency => "frequency",
            Self::Polarization => "polarization",
            Self::SymbolRate => "symbol_rate",
            Self::Fec => "fec",
            Self::Category => "category",
            Self::Title => "title",
            Self::System => "system",
            Self::Modulation => "modulation",
        }
    }
}

/// A rule for one record field.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldRule {
    pub kind: ExtractorKind,
    #[serde(default)]
    pub path: Option<String>,
    /// Value used when the rule does not match.
    #[serde(default)]
    pub default: Option<String>,
    /// Optional post-filter applied to the extracted value (first capture group wins).
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub unescape: bool,
}

/// The kind of field extractor.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Regex over the entry; the first non-empty capture group wins.
    Regex,
    /// CSS selector inside the entry, `selector::text` or `selector::attr(name)`.
    Css,
    /// A line of the entry's text: `first`, `last`, or a zero-based index (negative counts from the end).
    Line,
    /// A fixed value taken from `path`.
    Const,
}

/// What a regex field rule runs against.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// The entry's visible text, one line per text node.
    #[default]
    Text,
    /// The entry's raw markup.
    Html,
}

/// Keywords that mark an entry as encrypted (case-insensitive substring match).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncryptionRule {
    pub keywords: Vec<String>,
}

impl Default for EncryptionRule {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_ENCRYPTION_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl RuleSet {
    /// Parse a rule set from YAML text; `name` is only used in error messages.
    pub fn from_yaml(name: &str, content: &str) -> Result<Self, RuleError> {
        serde_yaml::from_str(content).map_err(|source| RuleError::Yaml {
            name: name.to_string(),
            source,
        })
    }

    /// Load a rule set from a YAML file on disk.
    pub fn from_file(path: &Path) -> Result<Self, RuleError> {
        let content = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&path.display().to_string(), &content)
    }

    /// Compile every pattern in the table, failing on the first invalid one.
    pub fn compile(&self) -> Result<CompiledRules, RuleError> {
        CompiledRules::new(self)
    }
}

/// Load all embedded rule sets.
pub fn load_all() -> Result<Vec<RuleSet>, RuleError> {
    let mut rule_sets = Vec::new();

    for file in RULES_DIR.files() {
        let path = file.path();
        if path
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            let name = path.display().to_string();
            let content = file.contents_utf8().ok_or_else(|| RuleError::Missing {
                rule: name.clone(),
                what: "UTF-8 content",
            })?;

            rule_sets.push(RuleSet::from_yaml(&name, content)?);
        }
    }

    rule_sets.sort_by(|a, b| a.source.id.cmp(&b.source.id));
    Ok(rule_sets)
}

/// Find an embedded rule set by ID (case-insensitive, exact match before partial match).
pub fn find_by_id(id: &str) -> Result<RuleSet, RuleError> {
    let rule_sets = load_all()?;
    let id_lower = id.to_lowercase();

    if let Some(rules) = rule_sets
        .iter()
        .find(|r| r.source.id.to_lowercase() == id_lower)
    {
        return Ok(rules.clone());
    }

    if let Some(rules) = rule_sets
        .iter()
        .find(|r| r.source.id.to_lowercase().contains(&id_lower))
    {
        return Ok(rules.clone());
    }

    Err(RuleError::NotFound(id.to_string()))
}

/// List all embedded rule set IDs.
pub fn list_rule_sets() -> Result<Vec<String>, RuleError> {
    Ok(load_all()?.into_iter().map(|r| r.source.id).collect())
}
