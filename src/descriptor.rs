//! Textual ingress descriptors.
//!
//! A descriptor lists optional, case-insensitive clauses in any order:
//!
//! ```text
//! DISORDER DROP 10
//! PUNCTUATE EVERY 100
//! FLUSH ON PUNCTUATION
//! COMPLETE END OF STREAM
//! BATCH 1024
//! STRATEGY PRIORITY QUEUE
//! ```
//!
//! Omitted clauses keep their `IngressConfig` defaults.

use crate::error::ConfigError;
use crate::policy::{
    CompletionPolicy, DisorderPolicy, FlushPolicy, IngressConfig, PunctuationPolicy,
    ReorderStrategy,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

static DISORDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bDISORDER\s+(NONE|DROP|THROW|ADJUST)\b(?:\s+(-?\d+)\b)?").unwrap()
});

static PUNCTUATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPUNCTUATE\s+(?:(NONE)\b|EVERY\s+(-?\d+)\b)").unwrap());

static FLUSH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bFLUSH\s+(NONE|ON\s+BATCH(?:\s+BOUNDARY)?|ON\s+PUNCTUATION)\b").unwrap()
});

static COMPLETE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bCOMPLETE\s+(NONE|END\s+OF\s+STREAM|LAST\s+EVENT(?:\s+TIME)?)\b").unwrap()
});

static BATCH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bBATCH\s+(\d+)\b").unwrap());

static STRATEGY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bSTRATEGY\s+(IMPATIENCE(?:\s+WINDOW)?|PRIORITY\s+QUEUE)\b").unwrap()
});

/// Parses an ingress descriptor into a validated `IngressConfig`.
pub struct IngressDescriptorParser {
    descriptor: String,
}

impl IngressDescriptorParser {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
        }
    }

    pub fn parse(&self) -> Result<IngressConfig, ConfigError> {
        let mut remaining = self.descriptor.clone();
        let mut config = IngressConfig::default();

        if let Some(caps) = take_clause(&DISORDER_RE, "DISORDER", &mut remaining)? {
            config.disorder = parse_disorder(&caps)?;
        }
        if let Some(caps) = take_clause(&PUNCTUATE_RE, "PUNCTUATE", &mut remaining)? {
            config.punctuation = match caps.group(2) {
                Some(period) => PunctuationPolicy::PeriodicTime(parse_number(period)?),
                None => PunctuationPolicy::None,
            };
        }
        // FLUSH ON BATCH must be consumed before the BATCH clause is searched.
        if let Some(caps) = take_clause(&FLUSH_RE, "FLUSH", &mut remaining)? {
            let mode = normalize(&caps[1]);
            config.flush = match mode.as_str() {
                "NONE" => FlushPolicy::None,
                "ON PUNCTUATION" => FlushPolicy::FlushOnPunctuation,
                _ => FlushPolicy::FlushOnBatchBoundary,
            };
        }
        if let Some(caps) = take_clause(&COMPLETE_RE, "COMPLETE", &mut remaining)? {
            let mode = normalize(&caps[1]);
            config.completion = match mode.as_str() {
                "NONE" => CompletionPolicy::None,
                "END OF STREAM" => CompletionPolicy::EndOfStream,
                _ => CompletionPolicy::LastEventTime,
            };
        }
        if let Some(caps) = take_clause(&BATCH_RE, "BATCH", &mut remaining)? {
            config.batch_capacity = caps[1].parse().map_err(|_| {
                ConfigError::InvalidDescriptor(format!(
                    "batch capacity `{}` is out of range",
                    &caps[1]
                ))
            })?;
        }
        if let Some(caps) = take_clause(&STRATEGY_RE, "STRATEGY", &mut remaining)? {
            config.strategy = if normalize(&caps[1]).starts_with("IMPATIENCE") {
                ReorderStrategy::ImpatienceWindow
            } else {
                ReorderStrategy::PriorityQueue
            };
        }

        let leftover = remaining.trim();
        if !leftover.is_empty() {
            return Err(ConfigError::InvalidDescriptor(format!(
                "unrecognized clause `{}`",
                leftover.split_whitespace().collect::<Vec<_>>().join(" ")
            )));
        }

        config.validate()?;
        Ok(config)
    }
}

impl FromStr for IngressConfig {
    type Err = ConfigError;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        IngressDescriptorParser::new(descriptor).parse()
    }
}

/// Capture groups of a matched clause, owned so the descriptor can be edited.
struct Clause(Vec<Option<String>>);

impl Clause {
    fn group(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|g| g.as_deref())
    }
}

impl std::ops::Index<usize> for Clause {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        self.group(index).unwrap_or("")
    }
}

/// Extracts the first match of `re` from `remaining`, blanking it out.
fn take_clause(
    re: &Regex,
    name: &str,
    remaining: &mut String,
) -> Result<Option<Clause>, ConfigError> {
    let Some(caps) = re.captures(remaining) else {
        return Ok(None);
    };
    let clause = Clause(
        caps.iter()
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect(),
    );
    let span = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
    remaining.replace_range(span.clone(), &" ".repeat(span.len()));
    if re.is_match(remaining) {
        return Err(ConfigError::InvalidDescriptor(format!(
            "duplicate {} clause",
            name
        )));
    }
    Ok(Some(clause))
}

fn parse_disorder(clause: &Clause) -> Result<DisorderPolicy, ConfigError> {
    let mode = clause[1].to_ascii_uppercase();
    let slack = clause.group(2).map(parse_number).transpose()?;
    match (mode.as_str(), slack) {
        ("NONE", None) => Ok(DisorderPolicy::None),
        ("NONE", Some(_)) => Err(ConfigError::InvalidDescriptor(
            "DISORDER NONE takes no slack".to_string(),
        )),
        ("DROP", Some(k)) => Ok(DisorderPolicy::Drop(k)),
        ("THROW", Some(k)) => Ok(DisorderPolicy::Throw(k)),
        ("ADJUST", Some(k)) => Ok(DisorderPolicy::Adjust(k)),
        (other, _) => Err(ConfigError::InvalidDescriptor(format!(
            "DISORDER {} requires a slack",
            other
        ))),
    }
}

fn parse_number(raw: &str) -> Result<i64, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::InvalidDescriptor(format!("number `{}` is out of range", raw)))
}

/// Uppercases and collapses whitespace so multi-word modes compare exactly.
fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| word.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join(" ")
}
