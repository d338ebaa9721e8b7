//! Condition/action rules for reactive agents.
//!
//! A [`Rule`] pairs a [`Condition`] over named belief fields with the [`Action`] to
//! take when it holds. Rules live in an ordered [`RuleSet`] and the first matching
//! rule wins. Conditions can be built in code or parsed from short expressions:
//!
//! ```
//! # use grid_agents::rules::Condition;
//! let cond = Condition::parse("position.x > 5 and orientation == 'left'").unwrap();
//! assert!(matches!(cond, Condition::And(_)));
//! ```

use crate::action::Action;
use crate::error::{Error, Result};
use crate::observation::Perception;
use crate::types::{Timestamp, Value, ValueRange};
use serde::{Deserialize, Serialize};

/// A predicate over the agent's belief.
///
/// Comparisons against a field the belief does not know evaluate to `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// True if the field loosely equals `value`.
    Equals { field: String, value: Value },
    NotEquals { field: String, value: Value },
    /// True if the numeric field is strictly greater than `threshold`.
    Above { field: String, threshold: f64 },
    /// True if the numeric field is strictly less than `threshold`.
    Below { field: String, threshold: f64 },
    AtLeast { field: String, threshold: f64 },
    AtMost { field: String, threshold: f64 },
    /// True if the numeric field lies inside `range` (inclusive).
    InRange { field: String, range: ValueRange },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    Always,
    Never,
}

impl Condition {
    /// Creates an equality condition.
    pub fn equals(field: &str, value: impl Into<Value>) -> Self {
        Condition::Equals {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Creates an inequality condition.
    pub fn not_equals(field: &str, value: impl Into<Value>) -> Self {
        Condition::NotEquals {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Creates a "greater than" condition.
    pub fn above(field: &str, threshold: f64) -> Self {
        Condition::Above {
            field: field.to_string(),
            threshold,
        }
    }

    /// Creates a "less than" condition.
    pub fn below(field: &str, threshold: f64) -> Self {
        Condition::Below {
            field: field.to_string(),
            threshold,
        }
    }

    /// Creates a "greater than or equal" condition.
    pub fn at_least(field: &str, threshold: f64) -> Self {
        Condition::AtLeast {
            field: field.to_string(),
            threshold,
        }
    }

    /// Creates a "less than or equal" condition.
    pub fn at_most(field: &str, threshold: f64) -> Self {
        Condition::AtMost {
            field: field.to_string(),
            threshold,
        }
    }

    /// Creates a range condition.
    pub fn in_range(field: &str, range: impl Into<ValueRange>) -> Self {
        Condition::InRange {
            field: field.to_string(),
            range: range.into(),
        }
    }

    /// Combines this condition with another using a logical AND.
    pub fn and(self, other: Condition) -> Self {
        match self {
            Condition::And(mut conditions) => {
                conditions.push(other);
                Condition::And(conditions)
            }
            _ => Condition::And(vec![self, other]),
        }
    }

    /// Combines this condition with another using a logical OR.
    pub fn or(self, other: Condition) -> Self {
        match self {
            Condition::Or(mut conditions) => {
                conditions.push(other);
                Condition::Or(conditions)
            }
            _ => Condition::Or(vec![self, other]),
        }
    }

    /// Negates this condition.
    pub fn negate(self) -> Self {
        Condition::Not(Box::new(self))
    }

    /// Evaluates the condition against a belief.
    pub fn evaluate(&self, belief: &Perception) -> bool {
        let number = |field: &str| belief.field(field).and_then(|v| v.as_f64());
        match self {
            Condition::Equals { field, value } => belief
                .field(field)
                .map(|v| v.loosely_equals(value))
                .unwrap_or(false),
            Condition::NotEquals { field, value } => belief
                .field(field)
                .map(|v| !v.loosely_equals(value))
                .unwrap_or(false),
            Condition::Above { field, threshold } => {
                number(field).map(|v| v > *threshold).unwrap_or(false)
            }
            Condition::Below { field, threshold } => {
                number(field).map(|v| v < *threshold).unwrap_or(false)
            }
            Condition::AtLeast { field, threshold } => {
                number(field).map(|v| v >= *threshold).unwrap_or(false)
            }
            Condition::AtMost { field, threshold } => {
                number(field).map(|v| v <= *threshold).unwrap_or(false)
            }
            Condition::InRange { field, range } => {
                number(field).map(|v| range.contains(v)).unwrap_or(false)
            }
            Condition::And(conditions) => conditions.iter().all(|c| c.evaluate(belief)),
            Condition::Or(conditions) => conditions.iter().any(|c| c.evaluate(belief)),
            Condition::Not(condition) => !condition.evaluate(belief),
            Condition::Always => true,
            Condition::Never => false,
        }
    }

    /// Parses a textual condition.
    ///
    /// Grammar: comparisons `field op literal` with `op` one of `== != > < >= <=`,
    /// combined with `and`/`&&`, `or`/`||`, `not`/`!` and parentheses. Literals are
    /// numbers, quoted strings, `true`/`false` or bare words.
    pub fn parse(expr: &str) -> Result<Condition> {
        let tokens = tokenize(expr)?;
        if tokens.is_empty() {
            return Err(Error::Rule("empty expression".into()));
        }
        let mut parser = Parser { tokens, pos: 0 };
        let condition = parser.or_expr()?;
        match parser.peek() {
            None => Ok(condition),
            Some(token) => Err(Error::Rule(format!(
                "unexpected '{}' in '{}'",
                token.describe(),
                expr
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    Op(CmpOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => s.clone(),
            Token::Number(n) => n.to_string(),
            Token::Str(s) => format!("'{}'", s),
            Token::Op(op) => op.as_str().to_string(),
            Token::And => "and".into(),
            Token::Or => "or".into(),
            Token::Not => "not".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CmpOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CmpOp {
    fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
            CmpOp::Ge => ">=",
            CmpOp::Le => "<=",
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']')
}

fn tokenize(expr: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::Op(CmpOp::Eq));
                i += 2;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Op(CmpOp::Ne));
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '>' | '<' => {
                let op = match (c, next == Some('=')) {
                    ('>', true) => CmpOp::Ge,
                    ('>', false) => CmpOp::Gt,
                    ('<', true) => CmpOp::Le,
                    _ => CmpOp::Lt,
                };
                tokens.push(Token::Op(op));
                i += if next == Some('=') { 2 } else { 1 };
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or_else(|| Error::Rule(format!("unterminated string in '{}'", expr)))?;
                tokens.push(Token::Str(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            c if c.is_ascii_digit()
                || (c == '-' && next.map(|n| n.is_ascii_digit()).unwrap_or(false)) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| Error::Rule(format!("invalid number '{}'", text)))?;
                tokens.push(Token::Number(number));
            }
            c if is_ident_char(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Ident(word),
                });
            }
            other => {
                return Err(Error::Rule(format!(
                    "unexpected character '{}' in '{}'",
                    other, expr
                )))
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn or_expr(&mut self) -> Result<Condition> {
        let mut condition = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            condition = condition.or(self.and_expr()?);
        }
        Ok(condition)
    }

    fn and_expr(&mut self) -> Result<Condition> {
        let mut condition = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            condition = condition.and(self.unary()?);
        }
        Ok(condition)
    }

    fn unary(&mut self) -> Result<Condition> {
        match self.next() {
            Some(Token::Not) => Ok(self.unary()?.negate()),
            Some(Token::LParen) => {
                let inner = self.or_expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(Error::Rule("missing ')'".into())),
                }
            }
            Some(Token::Ident(word)) if word == "true" && !self.at_operator() => {
                Ok(Condition::Always)
            }
            Some(Token::Ident(word)) if word == "false" && !self.at_operator() => {
                Ok(Condition::Never)
            }
            Some(Token::Ident(field)) => self.comparison(field),
            Some(other) => Err(Error::Rule(format!(
                "expected a field name, found '{}'",
                other.describe()
            ))),
            None => Err(Error::Rule("unexpected end of expression".into())),
        }
    }

    fn at_operator(&self) -> bool {
        matches!(self.peek(), Some(Token::Op(_)))
    }

    fn comparison(&mut self, field: String) -> Result<Condition> {
        let op = match self.next() {
            Some(Token::Op(op)) => op,
            _ => return Err(Error::Rule(format!("missing operator after '{}'", field))),
        };
        let literal = match self.next() {
            Some(Token::Number(n)) => Value::Float(n),
            Some(Token::Str(s)) => Value::String(s),
            Some(Token::Ident(word)) => match word.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(word),
            },
            _ => return Err(Error::Rule(format!("missing value after '{}'", field))),
        };

        let field = field.as_str();
        let threshold = || {
            literal.as_f64().ok_or_else(|| {
                Error::Rule(format!(
                    "'{}' needs a numeric operand, got '{}'",
                    op.as_str(),
                    literal.as_string()
                ))
            })
        };
        Ok(match op {
            CmpOp::Eq => Condition::equals(field, literal.clone()),
            CmpOp::Ne => Condition::not_equals(field, literal.clone()),
            CmpOp::Gt => Condition::above(field, threshold()?),
            CmpOp::Lt => Condition::below(field, threshold()?),
            CmpOp::Ge => Condition::at_least(field, threshold()?),
            CmpOp::Le => Condition::at_most(field, threshold()?),
        })
    }
}

/// A rule that maps a [`Condition`] to an [`Action`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub condition: Condition,
    pub action: Action,
    /// The source text, for rules built from an expression.
    pub expression: Option<String>,
    pub enabled: bool,
    pub trigger_count: u64,
    pub last_triggered: Option<Timestamp>,
}

impl Rule {
    /// Creates an enabled rule that has never fired.
    pub fn new(name: &str, condition: Condition, action: Action) -> Self {
        Self {
            name: name.to_string(),
            condition,
            action,
            expression: None,
            enabled: true,
            trigger_count: 0,
            last_triggered: None,
        }
    }

    /// Builds a rule from a textual condition.
    pub fn from_expression(expr: &str, action: Action) -> Result<Self> {
        let condition = Condition::parse(expr)?;
        Ok(Self {
            expression: Some(expr.to_string()),
            ..Self::new(expr, condition, action)
        })
    }

    /// Checks whether the rule is enabled and its condition holds.
    pub fn matches(&self, belief: &Perception) -> bool {
        self.enabled && self.condition.evaluate(belief)
    }

    fn trigger(&mut self) {
        self.trigger_count += 1;
        self.last_triggered = Some(Timestamp::now());
    }
}

/// An ordered collection of rules. The first matching rule wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule at the lowest priority.
    ///
    /// A rule whose expression matches an existing rule's expression replaces that
    /// rule's action in place instead.
    pub fn add(&mut self, rule: Rule) {
        if let Some(expr) = &rule.expression {
            if let Some(existing) = self
                .rules
                .iter_mut()
                .find(|r| r.expression.as_deref() == Some(expr.as_str()))
            {
                existing.action = rule.action;
                return;
            }
        }
        self.rules.push(rule);
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates over the rules in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Returns the action of the first matching rule, without recording a trigger.
    pub fn first_match(&self, belief: &Perception) -> Option<Action> {
        self.rules.iter().find(|r| r.matches(belief)).map(|r| r.action)
    }

    /// Like [`RuleSet::first_match`], but counts the trigger on the winning rule.
    pub fn fire(&mut self, belief: &Perception) -> Option<Action> {
        let rule = self.rules.iter_mut().find(|r| r.matches(belief))?;
        rule.trigger();
        Some(rule.action)
    }

    /// Removes every rule.
    pub fn clear(&mut self) {
        self.rules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::GridState;
    use crate::types::{Orientation, Position};

    fn belief_at(x: i32, y: i32, orientation: Orientation) -> Perception {
        Perception::from(&GridState::new(
            Position::new(x, y),
            orientation,
            Position::new(9, 9),
        ))
    }

    #[test]
    fn test_condition_above() {
        let cond = Condition::above("position.x", 5.0);
        assert!(cond.evaluate(&belief_at(6, 0, Orientation::Up)));
        assert!(!cond.evaluate(&belief_at(5, 0, Orientation::Up)));
    }

    #[test]
    fn test_condition_and() {
        let cond = Condition::above("position.x", 1.0).and(Condition::equals("orientation", "left"));
        assert!(cond.evaluate(&belief_at(3, 0, Orientation::Left)));
        assert!(!cond.evaluate(&belief_at(3, 0, Orientation::Right)));
    }

    #[test]
    fn test_condition_in_range() {
        let cond = Condition::in_range("distance_to_goal", 0.0..4.0);
        assert!(cond.evaluate(&belief_at(8, 7, Orientation::Up)));
        assert!(!cond.evaluate(&belief_at(0, 0, Orientation::Up)));
    }

    #[test]
    fn test_missing_field_is_false() {
        let cond = Condition::above("position.x", -100.0);
        assert!(!cond.evaluate(&Perception::default()));
        assert!(!Condition::equals("altitude", 3).evaluate(&belief_at(0, 0, Orientation::Up)));
    }

    #[test]
    fn test_parse_comparisons() {
        assert_eq!(
            Condition::parse("position.x > 5").unwrap(),
            Condition::above("position.x", 5.0)
        );
        assert_eq!(
            Condition::parse("position[1] <= -2").unwrap(),
            Condition::at_most("position[1]", -2.0)
        );
        assert_eq!(
            Condition::parse("orientation == 'left'").unwrap(),
            Condition::equals("orientation", "left")
        );
        assert_eq!(
            Condition::parse("orientation != down").unwrap(),
            Condition::not_equals("orientation", "down")
        );
    }

    #[test]
    fn test_parse_boolean_structure() {
        let cond = Condition::parse("position.x > 5 && (orientation == \"up\" || not position.y < 2)")
            .unwrap();
        assert!(cond.evaluate(&belief_at(6, 4, Orientation::Right)));
        assert!(!cond.evaluate(&belief_at(6, 1, Orientation::Right)));
        assert!(cond.evaluate(&belief_at(6, 1, Orientation::Up)));
        assert_eq!(Condition::parse("true").unwrap(), Condition::Always);
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "position.x >", "position.x 5", "(position.x > 1", "x > 'a", "x > left", "#"] {
            assert!(
                matches!(Condition::parse(bad), Err(Error::Rule(_))),
                "expected error for '{}'",
                bad
            );
        }
    }

    #[test]
    fn test_rule_set_first_match_wins() {
        let mut rules = RuleSet::new();
        rules.add(Rule::new("never", Condition::Never, Action::Wait));
        rules.add(Rule::from_expression("position.x >= 0", Action::TurnLeft).unwrap());
        rules.add(Rule::new("always", Condition::Always, Action::TurnRight));

        let belief = belief_at(0, 0, Orientation::Up);
        assert_eq!(rules.first_match(&belief), Some(Action::TurnLeft));
        assert_eq!(rules.fire(&belief), Some(Action::TurnLeft));
        let fired: Vec<u64> = rules.iter().map(|r| r.trigger_count).collect();
        assert_eq!(fired, vec![0, 1, 0]);
    }

    #[test]
    fn test_same_expression_replaces_action() {
        let mut rules = RuleSet::new();
        rules.add(Rule::from_expression("position.x > 1", Action::Wait).unwrap());
        rules.add(Rule::new("always", Condition::Always, Action::TurnRight));
        rules.add(Rule::from_expression("position.x > 1", Action::TurnLeft).unwrap());

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.first_match(&belief_at(2, 0, Orientation::Up)), Some(Action::TurnLeft));
        assert_eq!(rules.first_match(&belief_at(0, 0, Orientation::Up)), Some(Action::TurnRight));
    }

    #[test]
    fn test_named_rules_are_not_merged() {
        let mut rules = RuleSet::new();
        rules.add(Rule::new("always", Condition::Always, Action::Wait));
        rules.add(Rule::new("always", Condition::Always, Action::TurnLeft));
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_disabled_rule_is_skipped() {
        let mut rule = Rule::new("always", Condition::Always, Action::Wait);
        rule.enabled = false;
        assert!(!rule.matches(&Perception::default()));
    }
}
