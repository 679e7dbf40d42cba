// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.

use crate::VerdantError;
use logos::Logos;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// The axiom used when neither the caller nor the grammar names one
pub const DEFAULT_AXIOM: &str = "X";

/// Produces the symbol sequence the turtle walks
pub trait SymbolGenerator {
    fn generate(&self, axiom: &str, iterations: u32, seed: u64) -> Result<Vec<char>, VerdantError>;
}

/// Parallel rewriting over a rule table.
///
/// A predecessor may have several successors, in that case one is picked per occurrence with a
/// random generator seeded by the `seed` given to [`SymbolGenerator::generate`]. Symbols without
/// a rule are copied unchanged.
#[derive(Debug, Clone)]
pub struct RewriteRules {
    pub(super) rules: FxHashMap<char, SmallVec<[String; 1]>>,
    pub(super) axiom: Option<String>,
    pub(super) timeout: Option<Duration>,
    pub(super) max_symbols: usize,
}

impl RewriteRules {
    /// Default limit of the expanded sequence length. The default tree reaches 351 559 symbols
    /// at 7 iterations and 1 757 809 at 8.
    pub const MAX_SYMBOLS: usize = 1_000_000;

    /// A bushy tree branching in both rotation planes
    pub fn default_tree() -> Self {
        let mut rv = Self {
            axiom: Some(DEFAULT_AXIOM.to_string()),
            ..Self::default()
        };
        rv.insert_rule('X', "F[+X][-X]F[<X][>X]X".to_string());
        rv
    }

    fn insert_rule(&mut self, predecessor: char, successor: String) {
        self.rules.entry(predecessor).or_default().push(successor);
    }

    /// Adds a successor for `predecessor`, spaces are removed. Adding more than one successor
    /// for the same predecessor makes the rule stochastic.
    pub fn add_rule(&mut self, predecessor: char, successor: &str) -> Result<&mut Self, VerdantError> {
        let cleaned: String = successor.chars().filter(|c| !c.is_whitespace()).collect();
        if cleaned.is_empty() {
            return Err(VerdantError::LSystems(format!(
                "Rule too short {predecessor}"
            )));
        }
        self.insert_rule(predecessor, cleaned);
        Ok(self)
    }

    pub fn set_axiom(&mut self, axiom: &str) -> Result<&mut Self, VerdantError> {
        if self.axiom.is_some() {
            return Err(VerdantError::LSystems(format!(
                "already contains an axiom, can't add {axiom}"
            )));
        }
        self.axiom = Some(axiom.chars().filter(|c| !c.is_whitespace()).collect());
        Ok(self)
    }

    pub fn set_timeout(&mut self, seconds: f64) -> Result<&mut Self, VerdantError> {
        self.timeout = Some(Duration::try_from_secs_f64(seconds).map_err(|e| {
            VerdantError::InvalidParameter(format!("Invalid timeout {seconds}: {e}"))
        })?);
        Ok(self)
    }

    /// Expansion stops with an error once the sequence grows past `max_symbols`
    pub fn set_max_symbols(&mut self, max_symbols: usize) -> &mut Self {
        self.max_symbols = max_symbols;
        self
    }

    pub fn axiom(&self) -> Option<&str> {
        self.axiom.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn rule_count(&self) -> usize {
        self.rules.values().map(|alternatives| alternatives.len()).sum()
    }

    /// Reads axiom, rules and timeout from a text like:
    /// ```text
    /// # comments run to the end of the line
    /// axiom("X")
    /// rule("X", "F[+X][-X]FX")
    /// rule("F", "FF")
    /// timeout(2)
    /// ```
    pub fn parse(&mut self, text: &str) -> Result<&mut Self, VerdantError> {
        #[derive(Logos, Debug, PartialEq)]
        enum GrammarToken {
            #[token("axiom")]
            Axiom,

            #[token("rule")]
            Rule,

            #[token("timeout")]
            Timeout,

            #[token("\n")]
            Eol,

            #[regex("[0-9]+(\\.[0-9]+)?")]
            Number,

            #[regex(r#""[^"\n]*""#)]
            QuotedText,

            #[regex(r"[ \t\f\r(),;]+", logos::skip)]
            Skip,
        }

        #[derive(Debug, PartialEq)]
        enum ParseState {
            Start,
            Axiom,
            Rule(Option<char>),
            Timeout,
        }

        let text = strip_comments(text);
        let mut lex = GrammarToken::lexer(&text);
        let mut state = ParseState::Start;
        let mut line = 1_usize;

        while let Some(token) = lex.next() {
            let token = token.map_err(|_| {
                VerdantError::ParseError(format!(
                    "Unexpected input '{}' at line {line}",
                    lex.slice()
                ))
            })?;
            match token {
                GrammarToken::Axiom | GrammarToken::Rule | GrammarToken::Timeout => {
                    if state != ParseState::Start {
                        return Err(VerdantError::ParseError(format!(
                            "Expected to be in Start state, was in state:{state:?} when reading:{} at line {line}.",
                            lex.slice()
                        )));
                    }
                    state = match token {
                        GrammarToken::Axiom => ParseState::Axiom,
                        GrammarToken::Rule => ParseState::Rule(None),
                        _ => ParseState::Timeout,
                    };
                }
                GrammarToken::QuotedText => {
                    let quoted = lex.slice();
                    let text = &quoted[1..quoted.len() - 1];
                    state = match state {
                        ParseState::Axiom => {
                            debug!("Got axiom(\"{text}\")");
                            let _ = self.set_axiom(text)?;
                            ParseState::Start
                        }
                        ParseState::Rule(None) => {
                            let mut chars = text.chars();
                            match (chars.next(), chars.next()) {
                                (Some(predecessor), None) => ParseState::Rule(Some(predecessor)),
                                _ => {
                                    return Err(VerdantError::ParseError(format!(
                                        "Rule id must be one single char, got '{text}' at line {line}"
                                    )));
                                }
                            }
                        }
                        ParseState::Rule(Some(predecessor)) => {
                            debug!("Got rule('{predecessor}', \"{text}\")");
                            let _ = self.add_rule(predecessor, text)?;
                            ParseState::Start
                        }
                        _ => {
                            return Err(VerdantError::ParseError(format!(
                                "Bad state for QuotedText:{state:?} at line {line}"
                            )));
                        }
                    };
                }
                GrammarToken::Number => {
                    if state != ParseState::Timeout {
                        return Err(VerdantError::ParseError(format!(
                            "Bad state for Number:{state:?} at line {line}"
                        )));
                    }
                    let seconds = lex.slice().parse::<f64>().map_err(|e| {
                        VerdantError::ParseError(format!(
                            "Could not parse number :{} at line {line}. {e:?}",
                            lex.slice()
                        ))
                    })?;
                    debug!("Got timeout({seconds})");
                    let _ = self.set_timeout(seconds)?;
                    state = ParseState::Start;
                }
                GrammarToken::Eol => {
                    if state != ParseState::Start {
                        return Err(VerdantError::ParseError(format!(
                            "Incomplete statement, in state:{state:?} at line {line}"
                        )));
                    }
                    line += 1;
                }
                GrammarToken::Skip => {}
            }
        }
        if state != ParseState::Start {
            return Err(VerdantError::ParseError(format!(
                "Incomplete statement, in state:{state:?} at line {line}"
            )));
        }
        Ok(self)
    }

    /// Expands the rules over the axiom `iterations` times
    fn expand(&self, axiom: &str, iterations: u32, seed: u64) -> Result<Vec<char>, VerdantError> {
        let start_time = Instant::now();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut rv: Vec<char> = axiom.chars().filter(|c| !c.is_whitespace()).collect();

        for i in 0..iterations {
            if let Some(timeout) = self.timeout {
                if start_time.elapsed() >= timeout {
                    return Err(VerdantError::LSystems(format!(
                        "Timeout after {timeout:?} while processing iteration {i}/{iterations}"
                    )));
                }
            }
            let mut tmp = Vec::<char>::with_capacity(rv.len() * 2);
            for symbol in rv.iter() {
                match self.rules.get(symbol) {
                    Some(alternatives) if alternatives.len() == 1 => {
                        tmp.extend(alternatives[0].chars())
                    }
                    Some(alternatives) => {
                        let pick = rng.random_range(0..alternatives.len());
                        tmp.extend(alternatives[pick].chars())
                    }
                    None => tmp.push(*symbol),
                }
                if tmp.len() > self.max_symbols {
                    warn!("L-system expansion exceeded {} symbols", self.max_symbols);
                    return Err(VerdantError::Overflow(format!(
                        "More than {} symbols at iteration {}/{iterations}",
                        self.max_symbols,
                        i + 1
                    )));
                }
            }
            rv = tmp;
        }
        debug!(
            "expanded '{axiom}' {iterations} times into {} symbols in {:?}",
            rv.len(),
            start_time.elapsed()
        );
        Ok(rv)
    }
}

impl SymbolGenerator for RewriteRules {
    fn generate(&self, axiom: &str, iterations: u32, seed: u64) -> Result<Vec<char>, VerdantError> {
        self.expand(axiom, iterations, seed)
    }
}

/// remove comments and surrounding whitespace, keeping the line structure
fn strip_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for line in input.lines() {
        let line_without_comments = line.split('#').next().unwrap_or("");
        result.push_str(line_without_comments.trim());
        result.push('\n');
    }
    result
}
