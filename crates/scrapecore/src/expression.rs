//! Input-key expressions.
//!
//! A node declares which state keys it reads with a small boolean language:
//! bare keys joined by `&` (all of) and `|` (first of), grouped with
//! parentheses. Resolution is availability based: a segment matches when its
//! keys are present in the state, whatever their values are.
//!
//! ```text
//! "url | local_dir"            -> ["url"] if present, else ["local_dir"]
//! "user_prompt & (doc | html)" -> ["user_prompt", "doc"] or ["user_prompt", "html"]
//! ```

use crate::error::ExpressionError;
use crate::state::State;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Two key tokens, or a key and a group, with nothing but whitespace between them.
fn adjacency_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\w\s+\w|\w\s*\(|\)\s*\w|\)\s*\(").expect("adjacency pattern is valid")
    })
}

fn is_operator(c: char) -> bool {
    c == '&' || c == '|'
}

/// A syntactically checked input expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputExpression {
    source: String,
    compact: String,
}

impl InputExpression {
    /// Check the expression's syntax. Errors here are pipeline definition bugs.
    pub fn parse(expression: &str) -> Result<Self, ExpressionError> {
        if expression.trim().is_empty() {
            return Err(ExpressionError::Empty);
        }

        if adjacency_pattern().is_match(expression) {
            return Err(ExpressionError::AdjacentKeys);
        }

        let compact: String = expression.chars().filter(|c| !c.is_whitespace()).collect();

        if compact.starts_with(is_operator) {
            return Err(ExpressionError::LeadingOperator);
        }
        if compact.ends_with(is_operator) {
            return Err(ExpressionError::TrailingOperator);
        }

        let chars: Vec<char> = compact.chars().collect();
        if chars
            .windows(2)
            .any(|pair| is_operator(pair[0]) && is_operator(pair[1]))
        {
            return Err(ExpressionError::AdjacentOperators);
        }

        let mut depth: usize = 0;
        for c in &chars {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or(ExpressionError::UnbalancedParentheses)?;
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(ExpressionError::UnbalancedParentheses);
        }

        Ok(Self {
            source: expression.to_string(),
            compact,
        })
    }

    /// The expression as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Resolve against a key-availability predicate.
    ///
    /// Innermost groups are resolved first and spliced back into the outer
    /// expression as an OR list of their keys; a group with no match splices
    /// in nothing. The flat result takes the first OR segment whose keys are
    /// all available. Keys are returned in written order, de-duplicated.
    pub fn resolve<F>(&self, is_available: F) -> Result<Vec<String>, ExpressionError>
    where
        F: Fn(&str) -> bool,
    {
        let mut expression = self.compact.clone();

        while let Some(start) = expression.rfind('(') {
            let end = expression[start..]
                .find(')')
                .map(|offset| start + offset)
                .ok_or(ExpressionError::UnbalancedParentheses)?;
            let group = evaluate_flat(&expression[start + 1..end], &is_available);
            expression = format!(
                "{}{}{}",
                &expression[..start],
                group.join("|"),
                &expression[end + 1..]
            );
        }

        let keys = evaluate_flat(&expression, &is_available);
        if keys.is_empty() {
            return Err(ExpressionError::NoMatch);
        }

        let mut unique: Vec<String> = Vec::with_capacity(keys.len());
        for key in keys {
            if !unique.contains(&key) {
                unique.push(key);
            }
        }
        Ok(unique)
    }

    /// Resolve against the keys currently present in `state`.
    pub fn resolve_in(&self, state: &State) -> Result<Vec<String>, ExpressionError> {
        self.resolve(|key| state.contains_key(key))
    }
}

/// First OR segment whose AND keys are all available, or nothing.
fn evaluate_flat<F>(expression: &str, is_available: &F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    for segment in expression.split('|') {
        let keys: Vec<&str> = segment.split('&').collect();
        if keys.iter().all(|key| !key.is_empty() && is_available(key)) {
            return keys.into_iter().map(str::to_string).collect();
        }
    }
    Vec::new()
}

impl FromStr for InputExpression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InputExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and resolve in one go.
pub fn resolve_input_keys(expression: &str, state: &State) -> Result<Vec<String>, ExpressionError> {
    InputExpression::parse(expression)?.resolve_in(state)
}
