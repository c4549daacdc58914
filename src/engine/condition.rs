use std::cmp::Ordering;

use crate::error::{DbError, Result};

/// Comparison operator of a single condition term.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Like,
}

impl Operator {
    /// Longest lexemes first so `>=` is never read as `>` followed by `=`.
    const LEXEMES: [(&'static str, Operator); 8] = [
        ("==", Operator::Eq),
        (">=", Operator::Ge),
        ("<=", Operator::Le),
        ("!=", Operator::Ne),
        (">", Operator::Gt),
        ("<", Operator::Lt),
        ("=", Operator::Eq),
        ("LIKE", Operator::Like),
    ];

    fn strip_prefix(text: &str) -> Option<(Operator, &str)> {
        Self::LEXEMES.iter().find_map(|(lexeme, op)| {
            let head = text.get(..lexeme.len())?;
            head.eq_ignore_ascii_case(lexeme)
                .then(|| (*op, &text[lexeme.len()..]))
        })
    }
}

/// `attribute operator value`, the unit every condition is built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term {
    pub attribute: String,
    pub operator: Operator,
    pub value: String,
}

impl Term {
    /// Parses `attr op value`. The value is everything after the operator,
    /// trimmed, with one surrounding pair of single quotes removed.
    pub fn parse(text: &str) -> Option<Term> {
        let text = text.trim();
        let attr_len = text
            .char_indices()
            .take_while(|&(i, c)| {
                if i == 0 {
                    c.is_ascii_alphabetic() || c == '_'
                } else {
                    c.is_ascii_alphanumeric() || c == '_'
                }
            })
            .count();
        if attr_len == 0 {
            return None;
        }

        let (attribute, rest) = text.split_at(attr_len);
        let (operator, rest) = Operator::strip_prefix(rest.trim_start())?;
        let value = rest.trim();
        if value.is_empty() {
            return None;
        }

        let value = if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
            &value[1..value.len() - 1]
        } else {
            value
        };

        Some(Term {
            attribute: attribute.to_string(),
            operator,
            value: value.to_string(),
        })
    }

    fn column_index<H: AsRef<str>>(&self, header: &[H]) -> Option<usize> {
        header
            .iter()
            .position(|h| h.as_ref().eq_ignore_ascii_case(&self.attribute))
    }

    fn matches<H: AsRef<str>, R: AsRef<str>>(&self, header: &[H], row: &[R]) -> bool {
        match self.column_index(header) {
            Some(index) => {
                let cell = row.get(index).map(|c| c.as_ref()).unwrap_or("");
                compare(cell, self.operator, &self.value)
            }
            None => false,
        }
    }
}

/// How the groups of a compound condition are reduced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

/// One term slot: the raw text is kept so diagnostics can quote it even when
/// it failed to parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub raw: String,
    pub term: Option<Term>,
}

impl Slot {
    fn new(raw: &str) -> Self {
        Slot {
            raw: raw.trim().to_string(),
            term: Term::parse(raw),
        }
    }

    fn diagnostic<H: AsRef<str>>(&self, header: &[H]) -> Option<String> {
        match &self.term {
            None => Some(format!("Invalid condition format: {}", self.raw)),
            Some(term) if term.column_index(header).is_none() => Some(format!(
                "Condition attribute not found: {}",
                term.attribute
            )),
            Some(_) => None,
        }
    }
}

/// A parsed WHERE clause.
///
/// Conditions without parentheses are a single term. Otherwise every
/// parenthesised group is one term and the whole statement uses a single
/// combinator: OR if the text contains ` OR ` anywhere, AND otherwise. There
/// is no nesting or mixed precedence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Empty condition; every row matches.
    Always,
    Single(Slot),
    Grouped {
        combinator: Combinator,
        terms: Vec<Slot>,
    },
}

impl Condition {
    pub fn parse(text: &str) -> Condition {
        let text = text.trim();
        if text.is_empty() {
            return Condition::Always;
        }
        if !text.contains('(') && !text.contains(')') {
            return Condition::Single(Slot::new(text));
        }

        let groups = extract_groups(text);
        if groups.is_empty() {
            return Condition::Single(Slot::new(text));
        }

        let combinator = if text.to_ascii_uppercase().contains(" OR ") {
            Combinator::Or
        } else {
            Combinator::And
        };
        Condition::Grouped {
            combinator,
            terms: groups.into_iter().map(Slot::new).collect(),
        }
    }

    /// Evaluates the condition against one row. Unknown attributes and
    /// malformed terms evaluate to false.
    pub fn matches<H: AsRef<str>, R: AsRef<str>>(&self, header: &[H], row: &[R]) -> bool {
        let slot_matches = |slot: &Slot| {
            slot.term
                .as_ref()
                .is_some_and(|term| term.matches(header, row))
        };
        match self {
            Condition::Always => true,
            Condition::Single(slot) => slot_matches(slot),
            Condition::Grouped {
                combinator: Combinator::Or,
                terms,
            } => terms.iter().any(slot_matches),
            Condition::Grouped {
                combinator: Combinator::And,
                terms,
            } => terms.iter().all(slot_matches),
        }
    }

    /// Strict check for the ungrouped form: a malformed term or an attribute
    /// missing from `header` fails the statement. Grouped conditions always
    /// pass; their problems are reported through [`Condition::diagnostics`].
    pub fn validate<H: AsRef<str>>(&self, header: &[H]) -> Result<()> {
        let Condition::Single(slot) = self else {
            return Ok(());
        };
        match &slot.term {
            None => Err(DbError::InvalidCondition(slot.raw.clone())),
            Some(term) if term.column_index(header).is_none() => {
                Err(DbError::UnknownConditionAttribute(term.attribute.clone()))
            }
            Some(_) => Ok(()),
        }
    }

    /// Non-fatal problems with the terms of this condition.
    pub fn diagnostics<H: AsRef<str>>(&self, header: &[H]) -> Vec<String> {
        match self {
            Condition::Always => Vec::new(),
            Condition::Single(slot) => slot.diagnostic(header).into_iter().collect(),
            Condition::Grouped { terms, .. } => {
                terms.iter().filter_map(|s| s.diagnostic(header)).collect()
            }
        }
    }
}

/// Every `(...)` group without nested closing parentheses, trimmed.
fn extract_groups(text: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('(') {
        let after = &rest[open + 1..];
        let Some(close) = after.find(')') else {
            break;
        };
        if close > 0 {
            groups.push(after[..close].trim());
        }
        rest = &after[close + 1..];
    }
    groups
}

/// Evaluates `condition_text` against one row given as parallel header and
/// value slices. An empty condition is vacuously true.
pub fn evaluate<H: AsRef<str>, R: AsRef<str>>(condition_text: &str, header: &[H], row: &[R]) -> bool {
    Condition::parse(condition_text).matches(header, row)
}

/// Compares a cell against a condition value.
///
/// Numeric when both sides parse as numbers; `LIKE` never matches two
/// numbers. Otherwise `LIKE` is a case-sensitive substring test, `==`/`!=`
/// are exact string (in)equality and the ordering operators compare
/// lexicographically.
pub fn compare(cell: &str, operator: Operator, value: &str) -> bool {
    if let (Some(a), Some(b)) = (parse_number(cell), parse_number(value)) {
        return match operator {
            Operator::Eq => a == b,
            Operator::Ne => a != b,
            Operator::Gt => a > b,
            Operator::Lt => a < b,
            Operator::Ge => a >= b,
            Operator::Le => a <= b,
            Operator::Like => false,
        };
    }

    let ordering = cell.cmp(value);
    match operator {
        Operator::Eq => cell == value,
        Operator::Ne => cell != value,
        Operator::Gt => ordering == Ordering::Greater,
        Operator::Lt => ordering == Ordering::Less,
        Operator::Ge => ordering != Ordering::Less,
        Operator::Le => ordering != Ordering::Greater,
        Operator::Like => cell.contains(value),
    }
}

/// Spellings accepted besides plain decimal notation. Matched exactly, so
/// `nan` or `inf` stay text.
const SPECIAL_NUMBERS: [&str; 4] = ["NaN", "Infinity", "+Infinity", "-Infinity"];

/// Decimal notation with optional sign and exponent, or one of
/// [`SPECIAL_NUMBERS`].
fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let plausible = SPECIAL_NUMBERS.contains(&text)
        || (text.chars().any(|c| c.is_ascii_digit())
            && text
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')));
    if !plausible {
        return None;
    }
    text.parse::<f64>().ok()
}
