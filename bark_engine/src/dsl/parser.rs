//! Recursive-descent compiler from rule text to a [`RulePack`].
//!
//! ```text
//! program   := (alias | rule)*
//! alias     := ALIAS FLAG id AS id .
//! rule      := WHEN guard+ DO action+ .
//! guard     := ACTION [IS] name | OBSERVER IS id | AGENT IS id | OBJECT [IS] name
//!            | (FLAGS ARE | FLAG [IS]) flag_item (, flag_item)*
//!            | CHANCE number % [ONCE] | fact_expr            each followed by an optional ,
//! action    := SAY [key] string [DURATION n] [DELAY n] | SET target TO literal [DELAY n]
//!            | ADD literal TO target [DELAY n] | RAISE name [DELAY n] | RESET [DELAY n]
//!            | DISABLE id action object                    each followed by an optional ,
//! ```
//!
//! Keywords are case-insensitive. The parser never recovers: the first
//! malformed rule aborts the whole compile and nothing is added to the pack.

use bark_world::FactValue;
use std::collections::HashMap;
use tracing::debug;

use super::lexer::{tokenize, RelOp, Token, TokenKind};
use super::ParseError;
use crate::events::ActionName;
use crate::rules::{
    ActorFactFilter, AgentStateFilter, Command, CompareOp, FactFilter, FactTarget, Rule, RulePack,
};

/// Words that start a guard clause. A flag list stops when it reaches one.
const GUARD_KEYWORDS: &[&str] = &[
    "ACTION", "OBSERVER", "AGENT", "OBJECT", "FLAGS", "FLAG", "CHANCE", "DO",
];

/// Compiles rule text. Flag aliases declared with `ALIAS` persist across calls.
#[derive(Debug, Clone, Default)]
pub struct RuleCompiler {
    aliases: HashMap<String, String>,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical name for a flag after alias remapping.
    pub fn canonical_flag<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(|s| s.as_str()).unwrap_or(name)
    }

    /// Compile `source` into a new, sorted pack.
    pub fn compile(&mut self, source: &str) -> Result<RulePack, ParseError> {
        let mut pack = RulePack::new();
        self.compile_into(&mut pack, source)?;
        pack.compile();
        Ok(pack)
    }

    /// Parse `source` and append its rules to `pack` without sorting.
    ///
    /// Returns the number of rules added. On error the pack and the alias
    /// table are left untouched.
    pub fn compile_into(&mut self, pack: &mut RulePack, source: &str) -> Result<usize, ParseError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            aliases: self.aliases.clone(),
        };
        let rules = parser.program()?;

        let count = rules.len();
        for rule in rules {
            pack.add_rule(rule);
        }
        self.aliases = parser.aliases;
        debug!(rules = count, aliases = self.aliases.len(), "compiled rule source");
        Ok(count)
    }
}

/// Compile `source` with a fresh compiler.
pub fn compile(source: &str) -> Result<RulePack, ParseError> {
    RuleCompiler::new().compile(source)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    aliases: HashMap<String, String>,
}

impl<'t> Parser<'t> {
    // --- token helpers ------------------------------------------------------

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'t Token> {
        self.tokens.get(self.pos + offset)
    }

    fn line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn error(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                line: token.line,
                found: token.kind.to_string(),
                expected: expected.to_string(),
            },
            None => ParseError::UnexpectedEof {
                line: self.line(),
                expected: expected.to_string(),
            },
        }
    }

    fn is_keyword(token: Option<&Token>, keyword: &str) -> bool {
        matches!(token, Some(Token { kind: TokenKind::Word(w), .. }) if w.eq_ignore_ascii_case(keyword))
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        Self::is_keyword(self.peek(), keyword)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(keyword))
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().map(|t| &t.kind) == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_word(&mut self, expected: &str) -> Result<&'t str, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Word(w),
                ..
            }) => {
                self.pos += 1;
                Ok(w.as_str())
            }
            _ => Err(self.error(expected)),
        }
    }

    /// A plain identifier with no `.` qualifier.
    fn expect_ident(&mut self, expected: &str) -> Result<String, ParseError> {
        let line = self.line();
        let word = self.expect_word(expected)?;
        if word.contains('.') {
            return Err(ParseError::UnexpectedToken {
                line,
                found: word.to_string(),
                expected: expected.to_string(),
            });
        }
        Ok(word.to_string())
    }

    fn expect_number(&mut self, expected: &str) -> Result<(f64, &'t str), ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Number(text),
                line,
            }) => {
                let value = text.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                    line: *line,
                    found: text.clone(),
                })?;
                self.pos += 1;
                Ok((value, text.as_str()))
            }
            _ => Err(self.error(expected)),
        }
    }

    /// A non-negative number of seconds.
    fn expect_seconds(&mut self, expected: &str) -> Result<f64, ParseError> {
        let line = self.line();
        let (value, text) = self.expect_number(expected)?;
        if value < 0.0 {
            return Err(ParseError::InvalidNumber {
                line,
                found: text.to_string(),
            });
        }
        Ok(value)
    }

    fn expect_action_name(&mut self) -> Result<ActionName, ParseError> {
        let line = self.line();
        let word = self.expect_word("action name")?;
        ActionName::new(word).ok_or_else(|| ParseError::InvalidActionName {
            line,
            found: word.to_string(),
        })
    }

    fn canonical_flag(&self, name: &str) -> String {
        self.aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    // --- grammar ------------------------------------------------------------

    fn program(&mut self) -> Result<Vec<Rule>, ParseError> {
        let mut rules = Vec::new();
        while self.peek().is_some() {
            if self.at_keyword("ALIAS") {
                self.alias()?;
            } else if self.at_keyword("WHEN") {
                rules.push(self.rule()?);
            } else {
                return Err(self.error("WHEN or ALIAS"));
            }
        }
        Ok(rules)
    }

    fn alias(&mut self) -> Result<(), ParseError> {
        self.expect_keyword("ALIAS")?;
        self.expect_keyword("FLAG")?;
        let from = self.expect_ident("flag name")?;
        self.expect_keyword("AS")?;
        let to = self.expect_ident("canonical flag name")?;
        if !self.eat(&TokenKind::Dot) {
            return Err(self.error("'.'"));
        }
        let to = self.canonical_flag(&to);
        self.aliases.insert(from, to);
        Ok(())
    }

    fn rule(&mut self) -> Result<Rule, ParseError> {
        let mut rule = Rule::new(self.line());
        self.expect_keyword("WHEN")?;

        if self.at_keyword("DO") {
            return Err(self.error("guard"));
        }
        while !self.at_keyword("DO") {
            if self.peek().is_none() {
                return Err(self.error("DO"));
            }
            self.guard(&mut rule)?;
        }
        self.expect_keyword("DO")?;

        if self.peek().map(|t| &t.kind) == Some(&TokenKind::Dot) {
            return Err(self.error("action"));
        }
        while !self.eat(&TokenKind::Dot) {
            if self.peek().is_none() {
                return Err(self.error("'.'"));
            }
            let command = self.action()?;
            rule.program.push(command);
        }

        Ok(rule)
    }

    fn guard(&mut self, rule: &mut Rule) -> Result<(), ParseError> {
        if self.eat_keyword("ACTION") {
            self.eat_keyword("IS");
            rule.action = Some(self.expect_action_name()?);
        } else if self.eat_keyword("OBSERVER") {
            self.expect_keyword("IS")?;
            rule.observer = Some(self.expect_ident("observer name")?);
        } else if self.eat_keyword("AGENT") {
            self.expect_keyword("IS")?;
            rule.agent = Some(self.expect_ident("agent name")?);
        } else if self.eat_keyword("OBJECT") {
            self.eat_keyword("IS");
            rule.object = Some(self.expect_word("object name")?.to_string());
        } else if self.eat_keyword("FLAGS") {
            self.expect_keyword("ARE")?;
            self.flag_list(rule)?;
        } else if self.eat_keyword("FLAG") {
            self.eat_keyword("IS");
            self.flag_list(rule)?;
        } else if self.eat_keyword("CHANCE") {
            self.chance(rule)?;
        } else if matches!(self.peek(), Some(Token { kind: TokenKind::Word(_), .. })) {
            self.fact_expr(rule)?;
        } else {
            return Err(self.error("guard"));
        }
        self.eat(&TokenKind::Comma);
        Ok(())
    }

    fn flag_list(&mut self, rule: &mut Rule) -> Result<(), ParseError> {
        loop {
            self.flag_item(rule)?;
            let continues = self.peek().map(|t| &t.kind) == Some(&TokenKind::Comma)
                && self.flag_item_follows(1);
            if !continues {
                return Ok(());
            }
            self.pos += 1;
        }
    }

    /// Whether the token at `offset` starts another flag item rather than a new guard.
    fn flag_item_follows(&self, offset: usize) -> bool {
        match self.peek_at(offset).map(|t| &t.kind) {
            Some(TokenKind::Bang) => true,
            Some(TokenKind::Word(w)) => {
                let is_guard = GUARD_KEYWORDS.iter().any(|k| w.eq_ignore_ascii_case(k));
                let next = self.peek_at(offset + 1);
                let starts_fact_expr = matches!(next, Some(Token { kind: TokenKind::Op(_), .. }))
                    || Self::is_keyword(next, "IS");
                !is_guard && !starts_fact_expr
            }
            _ => false,
        }
    }

    fn flag_item(&mut self, rule: &mut Rule) -> Result<(), ParseError> {
        let negated = self.eat(&TokenKind::Bang);
        let name = self.expect_word("flag name")?;
        // A flag named twice, directly or through an alias, is one condition.
        match name.split_once('.') {
            Some((actor, flag)) => {
                let filter = AgentStateFilter {
                    actor: actor.to_string(),
                    flag: self.canonical_flag(flag),
                    negated,
                };
                if !rule.agent_flags.contains(&filter) {
                    rule.agent_flags.push(filter);
                }
            }
            None => {
                let flag = self.canonical_flag(name);
                let list = if negated {
                    &mut rule.flags_clear
                } else {
                    &mut rule.flags_set
                };
                if !list.contains(&flag) {
                    list.push(flag);
                }
            }
        }
        Ok(())
    }

    fn chance(&mut self, rule: &mut Rule) -> Result<(), ParseError> {
        let line = self.line();
        let (percent, text) = self.expect_number("chance percentage")?;
        if !(0.0..=100.0).contains(&percent) {
            return Err(ParseError::InvalidChance {
                line,
                found: text.to_string(),
            });
        }
        if !self.eat(&TokenKind::Percent) {
            return Err(self.error("'%'"));
        }
        rule.probability = (percent / 100.0) as f32;
        rule.no_retry = self.eat_keyword("ONCE");
        Ok(())
    }

    fn fact_expr(&mut self, rule: &mut Rule) -> Result<(), ParseError> {
        let name = self.expect_word("fact name")?;

        let (op, value) = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Op(op)) => {
                let op = match op {
                    RelOp::Eq => CompareOp::Eq,
                    RelOp::Ne => CompareOp::Ne,
                    RelOp::Lt => CompareOp::Lt,
                    RelOp::Le => CompareOp::Le,
                    RelOp::Gt => CompareOp::Gt,
                    RelOp::Ge => CompareOp::Ge,
                };
                self.pos += 1;
                (op, Some(self.literal()?))
            }
            _ => {
                self.expect_keyword("IS")?;
                if self.eat_keyword("SET") {
                    (CompareOp::Exists, None)
                } else if self.eat_keyword("UNSET") {
                    (CompareOp::NotExists, None)
                } else {
                    return Err(self.error("SET or UNSET"));
                }
            }
        };

        match name.split_once('.') {
            Some((actor, fact)) => rule.agent_filters.push(ActorFactFilter {
                actor: actor.to_string(),
                filter: FactFilter::new(fact, op, value),
            }),
            None => rule.world_filters.push(FactFilter::new(name, op, value)),
        }
        Ok(())
    }

    fn literal(&mut self) -> Result<FactValue, ParseError> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Number(text)) => {
                let line = self.line();
                self.pos += 1;
                let parsed = if text.contains('.') {
                    text.parse::<f64>().map(FactValue::Float).ok()
                } else {
                    text.parse::<i64>().map(FactValue::Int).ok()
                };
                parsed.ok_or_else(|| ParseError::InvalidNumber {
                    line,
                    found: text.clone(),
                })
            }
            Some(TokenKind::Str(text)) => {
                self.pos += 1;
                Ok(FactValue::Text(text.clone()))
            }
            Some(TokenKind::Word(word)) => {
                self.pos += 1;
                if word.eq_ignore_ascii_case("TRUE") {
                    Ok(FactValue::Bool(true))
                } else if word.eq_ignore_ascii_case("FALSE") {
                    Ok(FactValue::Bool(false))
                } else {
                    Ok(FactValue::Text(word.clone()))
                }
            }
            _ => Err(self.error("literal")),
        }
    }

    fn target(&mut self) -> Result<(FactTarget, String), ParseError> {
        let name = self.expect_word("fact name")?;
        Ok(match name.split_once('.') {
            Some((owner, fact)) if owner.eq_ignore_ascii_case("WORLD") => {
                (FactTarget::World, fact.to_string())
            }
            Some((owner, fact)) => (FactTarget::Actor(owner.to_string()), fact.to_string()),
            None => (FactTarget::Subject, name.to_string()),
        })
    }

    fn optional_delay(&mut self) -> Result<f64, ParseError> {
        if self.eat_keyword("DELAY") {
            self.expect_seconds("delay in seconds")
        } else {
            Ok(0.0)
        }
    }

    fn action(&mut self) -> Result<Command, ParseError> {
        let command = if self.eat_keyword("SAY") {
            let key = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Word(_)) => Some(self.expect_ident("text key")?),
                _ => None,
            };
            let text = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Str(text)) => {
                    self.pos += 1;
                    text.clone()
                }
                _ => return Err(self.error("quoted text")),
            };
            let mut duration = 0.0;
            let mut delay = 0.0;
            loop {
                if self.eat_keyword("DURATION") {
                    duration = self.expect_seconds("duration in seconds")?;
                } else if self.eat_keyword("DELAY") {
                    delay = self.expect_seconds("delay in seconds")?;
                } else {
                    break;
                }
            }
            Command::Say {
                key: key.unwrap_or_else(|| text.clone()),
                text,
                duration,
                delay,
            }
        } else if self.eat_keyword("SET") {
            let (target, fact) = self.target()?;
            self.expect_keyword("TO")?;
            let value = self.literal()?;
            Command::Set {
                target,
                fact,
                value,
                delay: self.optional_delay()?,
            }
        } else if self.eat_keyword("ADD") {
            let delta = self.literal()?;
            self.expect_keyword("TO")?;
            let (target, fact) = self.target()?;
            Command::Add {
                target,
                fact,
                delta,
                delay: self.optional_delay()?,
            }
        } else if self.eat_keyword("RAISE") {
            let event = self.expect_word("event name")?.to_string();
            Command::Raise {
                event,
                delay: self.optional_delay()?,
            }
        } else if self.eat_keyword("RESET") {
            Command::Reset {
                delay: self.optional_delay()?,
            }
        } else if self.eat_keyword("DISABLE") {
            let actor = self.expect_ident("actor name")?;
            let action = self.expect_action_name()?;
            let object = self.expect_word("object name")?.to_string();
            Command::Disable {
                actor,
                action,
                object,
            }
        } else {
            return Err(self.error("action (SAY, SET, ADD, RAISE, RESET or DISABLE)"));
        };

        self.eat(&TokenKind::Comma);
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleId;

    fn single(source: &str) -> Rule {
        let pack = compile(source).unwrap();
        assert_eq!(pack.len(), 1);
        pack.get(RuleId(0)).unwrap().clone()
    }

    #[test]
    fn test_minimal_rule() {
        let rule = single(r#"WHEN ACTION IS SAY, OBJECT IS greet DO SAY "Hi" ."#);
        assert_eq!(rule.action, Some(ActionName::SAY));
        assert_eq!(rule.object.as_deref(), Some("greet"));
        assert_eq!(rule.line, 1);
        assert_eq!(
            rule.program,
            vec![Command::Say {
                key: "Hi".into(),
                text: "Hi".into(),
                duration: 0.0,
                delay: 0.0,
            }]
        );
        assert_eq!(rule.priority, 2);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let rule = single(r#"when action see object is door do raise door.opened."#);
        assert_eq!(rule.action, ActionName::new("SEE"));
        assert_eq!(
            rule.program,
            vec![Command::Raise {
                event: "door.opened".into(),
                delay: 0.0,
            }]
        );
    }

    #[test]
    fn test_guards() {
        let rule = single(
            r#"
            WHEN ACTION HEAR, OBSERVER IS guard, AGENT IS thief,
                 FLAGS ARE night, !peace, guard.alert, !thief.hidden
                 gold >= 100, thief.stealth < 0.5, mood = "tense", bribed IS UNSET
                 CHANCE 25% ONCE
            DO SAY "Who goes there?" ."#,
        );
        assert_eq!(rule.observer.as_deref(), Some("guard"));
        assert_eq!(rule.agent.as_deref(), Some("thief"));
        assert_eq!(rule.flags_set, vec!["night".to_string()]);
        assert_eq!(rule.flags_clear, vec!["peace".to_string()]);
        assert_eq!(
            rule.agent_flags,
            vec![
                AgentStateFilter {
                    actor: "guard".into(),
                    flag: "alert".into(),
                    negated: false,
                },
                AgentStateFilter {
                    actor: "thief".into(),
                    flag: "hidden".into(),
                    negated: true,
                },
            ]
        );
        assert_eq!(
            rule.world_filters,
            vec![
                FactFilter::new("gold", CompareOp::Ge, Some(FactValue::Int(100))),
                FactFilter::new("mood", CompareOp::Eq, Some(FactValue::Text("tense".into()))),
                FactFilter::new("bribed", CompareOp::NotExists, None),
            ]
        );
        assert_eq!(
            rule.agent_filters,
            vec![ActorFactFilter {
                actor: "thief".into(),
                filter: FactFilter::new("stealth", CompareOp::Lt, Some(FactValue::Float(0.5))),
            }]
        );
        assert!((rule.probability - 0.25).abs() < f32::EPSILON);
        assert!(rule.no_retry);
        // 2 (action, agent) + 2 world flags + 2 actor flags + 3 world filters + 1 actor filter + chance
        assert_eq!(rule.priority, 11);
    }

    #[test]
    fn test_flag_list_stops_before_fact_expr() {
        let rule = single("WHEN FLAG alarm, hunger > 3 DO RESET .");
        assert_eq!(rule.flags_set, vec!["alarm".to_string()]);
        assert_eq!(rule.world_filters.len(), 1);

        let rule = single("WHEN FLAG IS alarm, courage IS SET DO RESET .");
        assert_eq!(rule.flags_set, vec!["alarm".to_string()]);
        assert_eq!(
            rule.world_filters,
            vec![FactFilter::new("courage", CompareOp::Exists, None)]
        );
    }

    #[test]
    fn test_actions() {
        let rule = single(
            r#"WHEN OBJECT food
               DO SAY hungry_line "I could eat." DURATION 3 DELAY 0.5,
                  SET guard.hunger TO 10,
                  SET world.feast TO true DELAY 2,
                  ADD -1 TO hunger,
                  RAISE meal.served DELAY 4,
                  RESET DELAY 60,
                  DISABLE cook SAY food ."#,
        );
        assert_eq!(
            rule.program,
            vec![
                Command::Say {
                    key: "hungry_line".into(),
                    text: "I could eat.".into(),
                    duration: 3.0,
                    delay: 0.5,
                },
                Command::Set {
                    target: FactTarget::Actor("guard".into()),
                    fact: "hunger".into(),
                    value: FactValue::Int(10),
                    delay: 0.0,
                },
                Command::Set {
                    target: FactTarget::World,
                    fact: "feast".into(),
                    value: FactValue::Bool(true),
                    delay: 2.0,
                },
                Command::Add {
                    target: FactTarget::Subject,
                    fact: "hunger".into(),
                    delta: FactValue::Int(-1),
                    delay: 0.0,
                },
                Command::Raise {
                    event: "meal.served".into(),
                    delay: 4.0,
                },
                Command::Reset { delay: 60.0 },
                Command::Disable {
                    actor: "cook".into(),
                    action: ActionName::SAY,
                    object: "food".into(),
                },
            ]
        );
    }

    #[test]
    fn test_alias_remaps_later_flags() {
        let mut compiler = RuleCompiler::new();
        let pack = compiler
            .compile(
                r#"
                ALIAS FLAG dark AS night.
                WHEN FLAGS ARE dark, guard.dark DO RESET ."#,
            )
            .unwrap();
        let rule = pack.get(RuleId(0)).unwrap();
        assert_eq!(rule.flags_set, vec!["night".to_string()]);
        assert_eq!(rule.agent_flags[0].flag, "night");

        // Aliases survive into the next compile on the same compiler.
        assert_eq!(compiler.canonical_flag("dark"), "night");
        let pack = compiler.compile("WHEN FLAG !dark DO RESET .").unwrap();
        assert_eq!(
            pack.get(RuleId(0)).unwrap().flags_clear,
            vec!["night".to_string()]
        );
    }

    #[test]
    fn test_priority_order_and_ties() {
        let pack = compile(
            r#"
            WHEN ACTION SAY DO SAY "generic" .
            WHEN ACTION SAY, OBJECT greet DO SAY "first" .
            WHEN ACTION SAY, OBJECT greet DO SAY "second" .
            WHEN ACTION SAY, OBJECT greet, FLAG night DO SAY "specific" ."#,
        )
        .unwrap();
        let lines: Vec<_> = pack.iter().map(|(_, r)| r.line).collect();
        assert_eq!(lines, vec![5, 3, 4, 2]);
    }

    #[test]
    fn test_repeated_flags_count_once() {
        let pack = compile(
            r#"
            ALIAS FLAG dark AS night.
            WHEN ACTION SAY, FLAGS ARE dark, night, guard.alert, guard.alert DO SAY "dark" .
            WHEN ACTION SAY, OBJECT greet, FLAG night, guard.alert DO SAY "greet" ."#,
        )
        .unwrap();

        let (_, first) = pack.iter().next().unwrap();
        assert_eq!(first.line, 4);
        assert_eq!(first.priority, 4);

        let (_, dark) = pack.iter().nth(1).unwrap();
        assert_eq!(dark.line, 3);
        assert_eq!(dark.flags_set, vec!["night".to_string()]);
        assert_eq!(dark.agent_flags.len(), 1);
        assert_eq!(dark.priority, 3);
    }

    #[test]
    fn test_idempotent_compile() {
        let source = r#"
            WHEN ACTION SAY, OBJECT greet DO SAY "Hi" .
            WHEN ACTION SEE, FLAG night, CHANCE 50% DO SET world.seen TO 1 .
            WHEN OBJECT greet DO RESET ."#;
        let a = compile(source).unwrap();
        let b = compile(source).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn test_syntax_errors() {
        let err = compile("WHEN ACTION SAY DO .").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "action"));

        let err = compile("WHEN DO SAY \"x\" .").unwrap_err();
        assert_eq!(err.lexeme().as_deref(), Some("DO"));

        let err = compile("WHEN ACTION SAY\nDO SAY \"x\"").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { line: 2, .. }));

        let err = compile("WHEN ACTION SHOUT DO RESET .").unwrap_err();
        assert!(matches!(err, ParseError::InvalidActionName { ref found, .. } if found == "SHOUT"));

        let err = compile("WHEN CHANCE 150% DO RESET .").unwrap_err();
        assert!(matches!(err, ParseError::InvalidChance { .. }));

        let err = compile("WHEN OBJECT x DO SAY \"x\" DELAY -2 .").unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { .. }));

        let err = compile("\n\nTHEN foo .").unwrap_err();
        assert_eq!(err.line(), 3);
        assert_eq!(err.lexeme().as_deref(), Some("THEN"));
    }

    #[test]
    fn test_one_bad_rule_aborts_everything() {
        let mut compiler = RuleCompiler::new();
        let mut pack = RulePack::new();
        let result = compiler.compile_into(
            &mut pack,
            r#"
            ALIAS FLAG dark AS night.
            WHEN OBJECT a DO RESET .
            WHEN OBJECT b DO FLY ."#,
        );
        assert!(result.is_err());
        assert!(pack.is_empty());
        assert_eq!(compiler.canonical_flag("dark"), "dark");
    }
}
