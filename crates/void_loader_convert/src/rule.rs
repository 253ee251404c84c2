//! Rule engine - ordered text rewrites
//!
//! A [`RuleSet`] is an ordered list of [`RewriteRule`]s grouped into
//! pipeline [`Stage`]s. Rules run one after another over the whole text, so
//! a later rule sees everything earlier rules produced. Several stages exist
//! only to correct what a broader earlier stage did; those rules carry an
//! `after` note explaining the dependency.
//!
//! A rule that finds nothing to rewrite is skipped silently. Use
//! [`RuleSet::apply_with_report`] to see per-rule match counts.

use regex::Regex;
use serde::Serialize;

use crate::error::{ConvertError, Result};

/// Pipeline stage, in execution order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Header,
    ClassSignature,
    Namespaces,
    GenericConstraints,
    LiteralConstructs,
    ArrayTypes,
    Casts,
    DomainArrays,
    EnumArrays,
    SetterArguments,
    CastSweep,
    AssetReferences,
}

/// How a rule was derived
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Exact text substitution
    Literal,
    /// Regular expression with capture groups
    Pattern,
    /// One pattern covering an enumerated set of names
    Enumerated,
    /// Generated once for each name in a type table
    PerName,
}

/// The text transformation a rule performs
#[derive(Clone, Debug)]
pub enum Rewrite {
    /// Insert text at the start
    Prepend(String),
    /// Replace every occurrence of `from`
    Literal { from: String, to: String },
    /// Replace every match; `$1`/`${1}` refer to capture groups
    Pattern { regex: Regex, replacement: String },
}

impl Rewrite {
    /// Apply to `text`, returning the new text and the number of matches
    pub fn apply(&self, text: &str) -> (String, usize) {
        match self {
            Self::Prepend(prefix) => (format!("{}{}", prefix, text), 1),
            Self::Literal { from, to } => {
                let count = text.matches(from.as_str()).count();
                if count == 0 {
                    (text.to_string(), 0)
                } else {
                    (text.replace(from.as_str(), to), count)
                }
            }
            Self::Pattern { regex, replacement } => {
                let count = regex.find_iter(text).count();
                if count == 0 {
                    (text.to_string(), 0)
                } else {
                    (regex.replace_all(text, replacement.as_str()).into_owned(), count)
                }
            }
        }
    }
}

/// One step of the pipeline
#[derive(Clone, Debug)]
pub struct RewriteRule {
    /// Rule name, unique within a set
    pub name: String,
    /// Stage this rule belongs to
    pub stage: Stage,
    /// Derivation
    pub kind: RuleKind,
    /// The transformation
    pub rewrite: Rewrite,
    /// Why the rule must run after earlier ones
    pub after: Option<&'static str>,
}

impl RewriteRule {
    /// Literal substitution
    pub fn literal(stage: Stage, name: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage,
            kind: RuleKind::Literal,
            rewrite: Rewrite::Literal {
                from: from.into(),
                to: to.into(),
            },
            after: None,
        }
    }

    /// Regex substitution
    pub fn pattern(
        stage: Stage,
        name: impl Into<String>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|source| ConvertError::Pattern {
            rule: name.clone(),
            source,
        })?;

        Ok(Self {
            name,
            stage,
            kind: RuleKind::Pattern,
            rewrite: Rewrite::Pattern {
                regex,
                replacement: replacement.into(),
            },
            after: None,
        })
    }

    /// Prepend text
    pub fn prepend(stage: Stage, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage,
            kind: RuleKind::Literal,
            rewrite: Rewrite::Prepend(text.into()),
            after: None,
        }
    }

    /// Override the derivation kind
    pub fn with_kind(mut self, kind: RuleKind) -> Self {
        self.kind = kind;
        self
    }

    /// Record why this rule depends on earlier ones
    pub fn after(mut self, reason: &'static str) -> Self {
        self.after = Some(reason);
        self
    }
}

/// Match count of one rule in one run
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RuleHit {
    pub rule: String,
    pub stage: Stage,
    pub kind: RuleKind,
    pub matches: usize,
    /// Dependency on earlier rules, if recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<&'static str>,
}

/// Ordered rule list
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule. Stages must not go backwards.
    pub fn push(&mut self, rule: RewriteRule) -> Result<()> {
        if let Some(previous) = self.rules.last() {
            if rule.stage < previous.stage {
                return Err(ConvertError::StageOrder {
                    rule: rule.name,
                    stage: rule.stage,
                    previous: previous.stage,
                });
            }
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Append several rules
    pub fn extend(&mut self, rules: impl IntoIterator<Item = RewriteRule>) -> Result<()> {
        for rule in rules {
            self.push(rule)?;
        }
        Ok(())
    }

    /// Rules in execution order
    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Rules of one stage
    pub fn stage(&self, stage: Stage) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter().filter(move |r| r.stage == stage)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule in order
    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |current, rule| rule.rewrite.apply(&current).0)
    }

    /// Run every rule in order, recording how often each matched
    pub fn apply_with_report(&self, text: &str) -> (String, Vec<RuleHit>) {
        let mut current = text.to_string();
        let mut hits = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let (next, matches) = rule.rewrite.apply(&current);
            if matches == 0 {
                match rule.after {
                    Some(after) => log::debug!(
                        "Rule '{}' ({:?}) matched nothing (runs after: {})",
                        rule.name,
                        rule.stage,
                        after
                    ),
                    None => log::debug!("Rule '{}' ({:?}) matched nothing", rule.name, rule.stage),
                }
            }
            hits.push(RuleHit {
                rule: rule.name.clone(),
                stage: rule.stage,
                kind: rule.kind,
                matches,
                after: rule.after,
            });
            current = next;
        }

        (current, hits)
    }
}
