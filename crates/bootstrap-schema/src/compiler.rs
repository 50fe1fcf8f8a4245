//! # Schema Compiler
//!
//! Parses schema text into [`Definition`]s.
//!
//! ## Grammar
//!
//! ```text
//! schema      := definition*
//! definition  := "definition" type_name "{" (relation | permission)* "}"
//! relation    := "relation" ident ":" subject ("|" subject)*
//! subject     := type_name ( "#" ident | ":" "*" )?
//! permission  := "permission" ident "=" union
//! union       := intersection ("+" intersection)*
//! intersection:= exclusion ("&" exclusion)*
//! exclusion   := primary ("-" primary)*
//! primary     := "nil" | ident ("->" ident)? | "(" union ")"
//! type_name   := ident ("/" ident)?
//! ```
//!
//! `//` and `/* */` comments are allowed anywhere. Comments directly before a
//! definition or relation are kept on that node.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::model::{AllowedSubject, Definition, Expression, Relation};

/// A compile failure with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {message}")]
pub struct CompileError {
    /// Line of the offending token.
    pub line: usize,
    /// Column of the offending token.
    pub column: usize,
    /// What went wrong.
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Comment(String),
    Slash,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Colon,
    Pipe,
    Hash,
    Star,
    Equals,
    Plus,
    Amp,
    Minus,
    Arrow,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "`{name}`"),
            Token::Comment(_) => write!(f, "comment"),
            Token::Slash => write!(f, "`/`"),
            Token::LBrace => write!(f, "`{{`"),
            Token::RBrace => write!(f, "`}}`"),
            Token::LParen => write!(f, "`(`"),
            Token::RParen => write!(f, "`)`"),
            Token::Colon => write!(f, "`:`"),
            Token::Pipe => write!(f, "`|`"),
            Token::Hash => write!(f, "`#`"),
            Token::Star => write!(f, "`*`"),
            Token::Equals => write!(f, "`=`"),
            Token::Plus => write!(f, "`+`"),
            Token::Amp => write!(f, "`&`"),
            Token::Minus => write!(f, "`-`"),
            Token::Arrow => write!(f, "`->`"),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

/// Normalized names may start with a digit, so identifiers can too.
fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn tokenize(source: &str) -> Result<Vec<Spanned>, CompileError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line = 1;
    let mut column = 1;

    while i < chars.len() {
        let ch = chars[i];
        let (start_line, start_column) = (line, column);

        if ch == '\n' {
            i += 1;
            line += 1;
            column = 1;
            continue;
        }
        if ch.is_whitespace() {
            i += 1;
            column += 1;
            continue;
        }

        // Line comment
        if ch == '/' && chars.get(i + 1) == Some(&'/') {
            let start = i;
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
                column += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Spanned {
                token: Token::Comment(text.trim_end().to_string()),
                line: start_line,
                column: start_column,
            });
            continue;
        }

        // Block comment
        if ch == '/' && chars.get(i + 1) == Some(&'*') {
            let start = i;
            i += 2;
            column += 2;
            loop {
                match chars.get(i) {
                    None => {
                        return Err(CompileError {
                            line: start_line,
                            column: start_column,
                            message: "unterminated block comment".to_string(),
                        })
                    }
                    Some('*') if chars.get(i + 1) == Some(&'/') => {
                        i += 2;
                        column += 2;
                        break;
                    }
                    Some('\n') => {
                        i += 1;
                        line += 1;
                        column = 1;
                    }
                    Some(_) => {
                        i += 1;
                        column += 1;
                    }
                }
            }
            tokens.push(Spanned {
                token: Token::Comment(chars[start..i].iter().collect()),
                line: start_line,
                column: start_column,
            });
            continue;
        }

        if is_ident_char(ch) {
            let start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
                column += 1;
            }
            tokens.push(Spanned {
                token: Token::Ident(chars[start..i].iter().collect()),
                line: start_line,
                column: start_column,
            });
            continue;
        }

        let token = match ch {
            '-' if chars.get(i + 1) == Some(&'>') => {
                i += 1;
                column += 1;
                Token::Arrow
            }
            '/' => Token::Slash,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ':' => Token::Colon,
            '|' => Token::Pipe,
            '#' => Token::Hash,
            '*' => Token::Star,
            '=' => Token::Equals,
            '+' => Token::Plus,
            '&' => Token::Amp,
            '-' => Token::Minus,
            other => {
                return Err(CompileError {
                    line: start_line,
                    column: start_column,
                    message: format!("unexpected character `{other}`"),
                })
            }
        };
        i += 1;
        column += 1;
        tokens.push(Spanned {
            token,
            line: start_line,
            column: start_column,
        });
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    pending_comments: Vec<String>,
    end: (usize, usize),
}

impl Parser {
    fn new(tokens: Vec<Spanned>, source: &str) -> Self {
        let end_line = source.lines().count().max(1);
        let end_column = source.lines().last().map(|l| l.chars().count() + 1).unwrap_or(1);
        Self {
            tokens,
            pos: 0,
            pending_comments: Vec::new(),
            end: (end_line, end_column),
        }
    }

    fn skip_comments(&mut self) {
        while let Some(Spanned {
            token: Token::Comment(text),
            ..
        }) = self.tokens.get(self.pos)
        {
            self.pending_comments.push(text.clone());
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<Token> {
        self.skip_comments();
        self.tokens.get(self.pos).map(|s| s.token.clone())
    }

    fn advance(&mut self) -> Option<Token> {
        self.skip_comments();
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn location(&mut self) -> (usize, usize) {
        self.skip_comments();
        self.tokens
            .get(self.pos)
            .map(|s| (s.line, s.column))
            .unwrap_or(self.end)
    }

    fn error_at(&self, (line, column): (usize, usize), message: impl Into<String>) -> CompileError {
        CompileError {
            line,
            column,
            message: message.into(),
        }
    }

    fn unexpected(&mut self, expected: &str) -> CompileError {
        let location = self.location();
        match self.peek() {
            Some(token) => self.error_at(location, format!("unexpected {token}, expected {expected}")),
            None => self.error_at(location, format!("unexpected end of input, expected {expected}")),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), CompileError> {
        if self.peek().as_ref() == Some(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, CompileError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn parse_type_name(&mut self) -> Result<String, CompileError> {
        let mut name = self.expect_ident("type name")?;
        if self.peek() == Some(Token::Slash) {
            self.advance();
            let rest = self.expect_ident("type name after `/`")?;
            name.push('/');
            name.push_str(&rest);
        }
        Ok(name)
    }

    fn parse_schema(&mut self) -> Result<Vec<Definition>, CompileError> {
        let mut definitions = Vec::new();
        let mut seen = HashSet::new();

        while let Some(token) = self.peek() {
            match token {
                Token::Ident(keyword) if keyword == "definition" => {
                    let location = self.location();
                    let definition = self.parse_definition()?;
                    if !seen.insert(definition.name.clone()) {
                        return Err(self.error_at(
                            location,
                            format!("duplicate definition `{}`", definition.name),
                        ));
                    }
                    definitions.push(definition);
                }
                _ => return Err(self.unexpected("`definition`")),
            }
        }

        Ok(definitions)
    }

    fn parse_definition(&mut self) -> Result<Definition, CompileError> {
        let comments = std::mem::take(&mut self.pending_comments);
        self.advance();

        let mut definition = Definition::new(self.parse_type_name()?);
        definition.comments = comments;
        self.expect(Token::LBrace)?;

        let mut seen = HashSet::new();
        loop {
            let location = self.location();
            let relation = match self.peek() {
                Some(Token::RBrace) => {
                    self.advance();
                    self.pending_comments.clear();
                    break;
                }
                Some(Token::Ident(keyword)) if keyword == "relation" => self.parse_relation()?,
                Some(Token::Ident(keyword)) if keyword == "permission" => self.parse_permission()?,
                _ => return Err(self.unexpected("`relation`, `permission` or `}`")),
            };
            if !seen.insert(relation.name.clone()) {
                return Err(self.error_at(
                    location,
                    format!(
                        "duplicate relation `{}` on definition `{}`",
                        relation.name, definition.name
                    ),
                ));
            }
            definition.relations.push(relation);
        }

        Ok(definition)
    }

    fn parse_relation(&mut self) -> Result<Relation, CompileError> {
        let comments = std::mem::take(&mut self.pending_comments);
        self.advance();

        let name = self.expect_ident("relation name")?;
        self.expect(Token::Colon)?;

        let mut subjects = vec![self.parse_subject()?];
        while self.peek() == Some(Token::Pipe) {
            self.advance();
            subjects.push(self.parse_subject()?);
        }

        let mut relation = Relation::direct(name, subjects);
        relation.comments = comments;
        Ok(relation)
    }

    fn parse_subject(&mut self) -> Result<AllowedSubject, CompileError> {
        let object_type = self.parse_type_name()?;
        match self.peek() {
            Some(Token::Hash) => {
                self.advance();
                let relation = self.expect_ident("subject relation")?;
                Ok(AllowedSubject::relation(object_type, relation))
            }
            Some(Token::Colon) => {
                self.advance();
                self.expect(Token::Star)?;
                Ok(AllowedSubject::wildcard(object_type))
            }
            _ => Ok(AllowedSubject::object(object_type)),
        }
    }

    fn parse_permission(&mut self) -> Result<Relation, CompileError> {
        let comments = std::mem::take(&mut self.pending_comments);
        self.advance();

        let name = self.expect_ident("permission name")?;
        self.expect(Token::Equals)?;
        let expression = self.parse_union()?;

        let mut relation = Relation::permission(name, expression);
        relation.comments = comments;
        Ok(relation)
    }

    fn parse_union(&mut self) -> Result<Expression, CompileError> {
        let first = self.parse_intersection()?;
        if self.peek() != Some(Token::Plus) {
            return Ok(first);
        }
        let mut children = vec![first];
        while self.peek() == Some(Token::Plus) {
            self.advance();
            children.push(self.parse_intersection()?);
        }
        Ok(Expression::Union(children))
    }

    fn parse_intersection(&mut self) -> Result<Expression, CompileError> {
        let first = self.parse_exclusion()?;
        if self.peek() != Some(Token::Amp) {
            return Ok(first);
        }
        let mut children = vec![first];
        while self.peek() == Some(Token::Amp) {
            self.advance();
            children.push(self.parse_exclusion()?);
        }
        Ok(Expression::Intersection(children))
    }

    fn parse_exclusion(&mut self) -> Result<Expression, CompileError> {
        let mut base = self.parse_primary()?;
        while self.peek() == Some(Token::Minus) {
            self.advance();
            let subtracted = self.parse_primary()?;
            base = Expression::exclusion(base, subtracted);
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expression, CompileError> {
        match self.peek() {
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_union()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) if name == "nil" => {
                self.advance();
                Ok(Expression::Nil)
            }
            Some(Token::Ident(name)) => {
                self.advance();
                if self.peek() == Some(Token::Arrow) {
                    self.advance();
                    let computed = self.expect_ident("relation after `->`")?;
                    Ok(Expression::arrow(name, computed))
                } else {
                    Ok(Expression::Computed(name))
                }
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}

/// Compile schema text into ordered definitions.
///
/// Fails on lexical or syntax errors, duplicate definition names, and duplicate
/// relation names within a definition. Relation references are not resolved.
///
/// ```
/// use bootstrap_schema::compiler::compile;
///
/// let definitions = compile("definition user {}\n\ndefinition doc {\n\trelation owner: user\n}").unwrap();
/// assert_eq!(definitions.len(), 2);
/// assert!(definitions[1].has_relation("owner"));
/// ```
pub fn compile(source: &str) -> Result<Vec<Definition>, CompileError> {
    let tokens = tokenize(source)?;
    Parser::new(tokens, source).parse_schema()
}
