// ── Field rules ──
//
// Rules are plain values attached to a field. Models recompute their rule
// tables on state transitions and run them on demand, collecting every
// violation into a `ValidationErrors` map instead of failing fast.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::lwm2m;

/// Letters and digits only (MQTT client id).
pub const PATTERN_ALPHANUMERIC: &str = "^[A-Za-z0-9]+$";

static ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PATTERN_ALPHANUMERIC).expect("alphanumeric pattern compiles"));

static HEX_DEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(lwm2m::KEY_REGEXP_HEX_DEC).expect("hex/dec pattern compiles"));

/// Named patterns a [`Rule::Pattern`] can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Alphanumeric,
    HexDec,
}

impl Pattern {
    fn regex(self) -> &'static Regex {
        match self {
            Self::Alphanumeric => &ALPHANUMERIC,
            Self::HexDec => &HEX_DEC,
        }
    }
}

/// A single constraint on a text field.
///
/// Every rule except [`Rule::Required`] and [`Rule::Lwm2mSecurityConfig`]
/// accepts an empty value, so optional fields only get checked once filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Pattern(Pattern),
    /// Value must be a structurally complete LwM2M client security document.
    Lwm2mSecurityConfig,
}

impl Rule {
    /// Key reported in [`ValidationErrors`] when this rule fails.
    pub fn name(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength(_) => "minlength",
            Self::MaxLength(_) => "maxlength",
            Self::Pattern(_) => "pattern",
            Self::Lwm2mSecurityConfig => "jsonError",
        }
    }

    /// `true` when `value` satisfies the rule.
    pub fn check(self, value: Option<&str>) -> bool {
        let value = value.unwrap_or_default();
        match self {
            Self::Required => !value.is_empty(),
            Self::MinLength(min) => value.is_empty() || value.chars().count() >= min,
            Self::MaxLength(max) => value.is_empty() || value.chars().count() <= max,
            Self::Pattern(pattern) => value.is_empty() || pattern.regex().is_match(value),
            Self::Lwm2mSecurityConfig => lwm2m::validate_security_config(value),
        }
    }
}

/// Rule name reported for a group where none of the members is filled.
pub const AT_LEAST_ONE: &str = "atLeastOne";

/// `true` when at least one member of a group is present and non-empty.
///
/// Members that do not exist in the group are passed as `None` and count as
/// empty, so an absent group simply fails the check.
pub fn at_least_one<'a>(members: impl IntoIterator<Item = Option<&'a str>>) -> bool {
    members
        .into_iter()
        .any(|member| member.is_some_and(|v| !v.is_empty()))
}

// ── Collected violations ─────────────────────────────────────────────

/// Field name → names of the rules it violates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<&'static str>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `rules` against `value`, recording every failure under `field`.
    pub fn check(&mut self, field: &'static str, value: Option<&str>, rules: &[Rule]) {
        for rule in rules {
            if !rule.check(value) {
                self.add(field, rule.name());
            }
        }
    }

    pub fn add(&mut self, field: &'static str, rule: &'static str) {
        let entry = self.0.entry(field).or_default();
        if !entry.contains(&rule) {
            entry.push(rule);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn has(&self, field: &str, rule: &str) -> bool {
        self.0
            .get(field)
            .is_some_and(|rules| rules.iter().any(|r| *r == rule))
    }

    pub fn field(&self, field: &str) -> &[&'static str] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[&'static str])> {
        self.0.iter().map(|(field, rules)| (*field, rules.as_slice()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, rules) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {}", rules.join(", "))?;
        }
        Ok(())
    }
}
