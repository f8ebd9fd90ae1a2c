//! Gene-reaction rules.
//!
//! A rule such as `(b0001 and b0002) or b0003` is parsed into a [`GeneRule`]
//! tree and normalised to disjunctive normal form: a list of isozymes, each the
//! set of genes whose products must assemble together to catalyse the reaction.
//! `and` binds tighter than `or`. The symbolic forms `&`, `&&`, `|` and `||`
//! are accepted as well.

use std::collections::BTreeSet;

use thiserror::Error;

/// Upper bound on isozymes produced by DNF expansion
pub const MAX_DNF_CLAUSES: usize = 1_024;

/// Deepest parenthesis nesting accepted by the parser
pub const MAX_GPR_DEPTH: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GprError {
    #[error("invalid character '{ch}' at position {position}")]
    InvalidCharacter { ch: char, position: usize },

    #[error("unexpected '{token}' at position {position}")]
    UnexpectedToken { token: String, position: usize },

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("rule ends unexpectedly")]
    UnexpectedEnd,

    #[error("rule expands to more than {0} isozymes")]
    TooComplex(usize),

    #[error("parentheses nested deeper than {max} at position {position}")]
    TooDeep { max: usize, position: usize },
}

/// Boolean expression over gene identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneRule {
    Gene(String),
    And(Vec<GeneRule>),
    Or(Vec<GeneRule>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Ident(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Ident(id) => write!(f, "{id}"),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | ':')
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, GprError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            _ if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push((Token::LParen, i));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, i));
                i += 1;
            }
            '&' | '|' => {
                let token = if c == '&' { Token::And } else { Token::Or };
                tokens.push((token, i));
                i += if chars.get(i + 1) == Some(&c) { 2 } else { 1 };
            }
            _ if is_ident_char(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let token = match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    _ => Token::Ident(word),
                };
                tokens.push((token, start));
            }
            _ => return Err(GprError::InvalidCharacter { ch: c, position: i }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn unexpected(&self) -> GprError {
        match self.tokens.get(self.pos) {
            Some((Token::RParen, _)) => GprError::UnbalancedParentheses,
            Some((token, position)) => GprError::UnexpectedToken {
                token: token.to_string(),
                position: *position,
            },
            None => GprError::UnexpectedEnd,
        }
    }

    fn expression(&mut self) -> Result<GeneRule, GprError> {
        let mut terms = vec![self.term()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            terms.push(self.term()?);
        }
        Ok(GeneRule::or(terms))
    }

    fn term(&mut self) -> Result<GeneRule, GprError> {
        let mut factors = vec![self.factor()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            factors.push(self.factor()?);
        }
        Ok(GeneRule::and(factors))
    }

    fn factor(&mut self) -> Result<GeneRule, GprError> {
        match self.tokens.get(self.pos).cloned() {
            Some((Token::Ident(id), _)) => {
                self.pos += 1;
                Ok(GeneRule::Gene(id))
            }
            Some((Token::LParen, position)) => {
                if self.depth == MAX_GPR_DEPTH {
                    return Err(GprError::TooDeep {
                        max: MAX_GPR_DEPTH,
                        position,
                    });
                }
                self.pos += 1;
                self.depth += 1;
                let inner = self.expression()?;
                self.depth -= 1;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    None => Err(GprError::UnbalancedParentheses),
                    Some(_) => Err(self.unexpected()),
                }
            }
            _ => Err(self.unexpected()),
        }
    }
}

impl GeneRule {
    /// Parse a rule, returning `None` for an empty rule
    ///
    /// # Errors
    ///
    /// Returns a [`GprError`] if the text is not a well-formed Boolean
    /// expression over gene identifiers.
    pub fn parse(text: &str) -> Result<Option<Self>, GprError> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Ok(None);
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let rule = parser.expression()?;
        if parser.pos < parser.tokens.len() {
            return Err(parser.unexpected());
        }
        Ok(Some(rule))
    }

    fn and(mut parts: Vec<Self>) -> Self {
        if parts.len() == 1 {
            return parts.remove(0);
        }
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Self::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Self::And(flat)
    }

    fn or(mut parts: Vec<Self>) -> Self {
        if parts.len() == 1 {
            return parts.remove(0);
        }
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Self::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Self::Or(flat)
    }

    /// All gene identifiers mentioned by the rule
    #[must_use]
    pub fn genes(&self) -> BTreeSet<String> {
        let mut genes = BTreeSet::new();
        self.collect_genes(&mut genes);
        genes
    }

    fn collect_genes(&self, genes: &mut BTreeSet<String>) {
        match self {
            Self::Gene(id) => {
                genes.insert(id.clone());
            }
            Self::And(parts) | Self::Or(parts) => {
                for part in parts {
                    part.collect_genes(genes);
                }
            }
        }
    }

    /// Expand to disjunctive normal form.
    ///
    /// Clauses are deduplicated, clauses that are supersets of another clause
    /// are absorbed, and the result is sorted.
    ///
    /// # Errors
    ///
    /// Returns `GprError::TooComplex` if expansion exceeds [`MAX_DNF_CLAUSES`].
    pub fn to_dnf(&self) -> Result<Vec<BTreeSet<String>>, GprError> {
        let clauses = self.expand()?;

        let unique: BTreeSet<BTreeSet<String>> = clauses.into_iter().collect();
        let minimal: Vec<BTreeSet<String>> = unique
            .iter()
            .filter(|clause| {
                !unique
                    .iter()
                    .any(|other| other != *clause && other.is_subset(clause))
            })
            .cloned()
            .collect();

        Ok(minimal)
    }

    fn expand(&self) -> Result<Vec<BTreeSet<String>>, GprError> {
        match self {
            Self::Gene(id) => Ok(vec![BTreeSet::from([id.clone()])]),
            Self::Or(parts) => {
                let mut clauses = Vec::new();
                for part in parts {
                    clauses.extend(part.expand()?);
                    if clauses.len() > MAX_DNF_CLAUSES {
                        return Err(GprError::TooComplex(MAX_DNF_CLAUSES));
                    }
                }
                Ok(clauses)
            }
            Self::And(parts) => {
                let mut clauses = vec![BTreeSet::new()];
                for part in parts {
                    let expanded = part.expand()?;
                    if clauses.len() * expanded.len() > MAX_DNF_CLAUSES {
                        return Err(GprError::TooComplex(MAX_DNF_CLAUSES));
                    }
                    let mut next = Vec::with_capacity(clauses.len() * expanded.len());
                    for left in &clauses {
                        for right in &expanded {
                            next.push(left.union(right).cloned().collect());
                        }
                    }
                    clauses = next;
                }
                Ok(clauses)
            }
        }
    }
}

impl std::fmt::Display for GeneRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gene(id) => write!(f, "{id}"),
            Self::And(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " and ")?;
                    }
                    match part {
                        Self::Or(_) => write!(f, "({part})")?,
                        _ => write!(f, "{part}")?,
                    }
                }
                Ok(())
            }
            Self::Or(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " or ")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(genes: &[&str]) -> BTreeSet<String> {
        genes.iter().map(|g| (*g).to_string()).collect()
    }

    #[test]
    fn test_parse_single_gene() {
        let rule = GeneRule::parse("b0001").unwrap().unwrap();
        assert_eq!(rule, GeneRule::Gene("b0001".to_string()));
    }

    #[test]
    fn test_parse_empty() {
        assert!(GeneRule::parse("").unwrap().is_none());
        assert!(GeneRule::parse("   ").unwrap().is_none());
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let rule = GeneRule::parse("a or b and c").unwrap().unwrap();
        let dnf = rule.to_dnf().unwrap();
        assert_eq!(dnf, vec![clause(&["a"]), clause(&["b", "c"])]);
    }

    #[test]
    fn test_distribution() {
        let rule = GeneRule::parse("(a or b) and (c or d)").unwrap().unwrap();
        let dnf = rule.to_dnf().unwrap();
        assert_eq!(
            dnf,
            vec![
                clause(&["a", "c"]),
                clause(&["a", "d"]),
                clause(&["b", "c"]),
                clause(&["b", "d"]),
            ]
        );
    }

    #[test]
    fn test_symbolic_operators_and_case() {
        let rule = GeneRule::parse("a && (b || c) AND d").unwrap().unwrap();
        let dnf = rule.to_dnf().unwrap();
        assert_eq!(dnf, vec![clause(&["a", "b", "d"]), clause(&["a", "c", "d"])]);
    }

    #[test]
    fn test_absorption_and_dedup() {
        let rule = GeneRule::parse("a or (a and b) or a").unwrap().unwrap();
        assert_eq!(rule.to_dnf().unwrap(), vec![clause(&["a"])]);
    }

    #[test]
    fn test_unbalanced() {
        assert_eq!(
            GeneRule::parse("(a and b"),
            Err(GprError::UnbalancedParentheses)
        );
        assert_eq!(
            GeneRule::parse("a and b)"),
            Err(GprError::UnbalancedParentheses)
        );
    }

    #[test]
    fn test_dangling_operator() {
        assert_eq!(GeneRule::parse("a and"), Err(GprError::UnexpectedEnd));
        assert!(matches!(
            GeneRule::parse("or a"),
            Err(GprError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            GeneRule::parse("a b"),
            Err(GprError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            GeneRule::parse("a + b"),
            Err(GprError::InvalidCharacter { ch: '+', position: 2 })
        );
    }

    #[test]
    fn test_display_round_trip() {
        let rule = GeneRule::parse("(a or b) and c").unwrap().unwrap();
        assert_eq!(rule.to_string(), "(a or b) and c");
        let reparsed = GeneRule::parse(&rule.to_string()).unwrap().unwrap();
        assert_eq!(reparsed, rule);
    }

    #[test]
    fn test_genes() {
        let rule = GeneRule::parse("(a and b) or (b and c)").unwrap().unwrap();
        assert_eq!(rule.genes(), clause(&["a", "b", "c"]));
    }

    #[test]
    fn test_too_complex() {
        let text = (0..11)
            .map(|i| format!("(x{i} or y{i})"))
            .collect::<Vec<_>>()
            .join(" and ");
        let rule = GeneRule::parse(&text).unwrap().unwrap();
        assert_eq!(rule.to_dnf(), Err(GprError::TooComplex(MAX_DNF_CLAUSES)));
    }

    #[test]
    fn test_nesting_depth() {
        let nested = |depth: usize| format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
        let rule = GeneRule::parse(&nested(MAX_GPR_DEPTH)).unwrap().unwrap();
        assert_eq!(rule, GeneRule::Gene("a".to_string()));

        assert_eq!(
            GeneRule::parse(&nested(MAX_GPR_DEPTH + 1)),
            Err(GprError::TooDeep {
                max: MAX_GPR_DEPTH,
                position: MAX_GPR_DEPTH,
            })
        );
    }
}
