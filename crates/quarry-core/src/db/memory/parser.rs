use super::lexer::{Token, tokenize};
use crate::{
    db::{
        criteria::{CompareOp, CriteriaQuery, Expr, Param, Projection, Scalar, StatementKind},
        predicate::{Direction, OrderItem},
    },
    error::PersistenceError,
    model::{AttributePath, EntityModel, MetadataRegistry},
    value::Value,
};

/// Parse a query string into the structured form the evaluator runs.
///
/// `native` selects SQL conventions: unnumbered `?` are numbered in
/// order of appearance and attribute names need no alias.
pub(super) fn parse_statement(
    query: &str,
    registry: &MetadataRegistry,
    native: bool,
) -> Result<CriteriaQuery, PersistenceError> {
    let tokens = tokenize(query)?;
    let mut parser = Parser {
        query,
        registry,
        native,
        tokens,
        pos: 0,
        alias: None,
        next_position: 0,
    };

    let statement = parser.statement()?;
    if let Some(token) = parser.peek() {
        return Err(parser.error(format!("unexpected trailing token {token:?}")));
    }

    Ok(statement)
}

///
/// Parser
/// Recursive descent over the token stream.
///

struct Parser<'q> {
    query: &'q str,
    registry: &'q MetadataRegistry,
    native: bool,
    tokens: Vec<Token>,
    pos: usize,
    alias: Option<String>,
    next_position: usize,
}

impl Parser<'_> {
    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn statement(&mut self) -> Result<CriteriaQuery, PersistenceError> {
        if self.eat_keyword("select") {
            self.select()
        } else if self.eat_keyword("delete") {
            self.delete()
        } else {
            Err(self.error("expected select or delete"))
        }
    }

    fn select(&mut self) -> Result<CriteriaQuery, PersistenceError> {
        let mut distinct = self.eat_keyword("distinct");

        // projection is checked against the alias once the from clause is known
        let projection_word = if self.eat_keyword("count") {
            self.expect(&Token::LParen)?;
            distinct |= self.eat_keyword("distinct");
            let word = self.projection_word()?;
            self.expect(&Token::RParen)?;
            (Projection::Count, word)
        } else {
            (Projection::Entity, self.projection_word()?)
        };

        self.expect_keyword("from")?;
        let model = self.entity()?;
        self.alias = self.optional_alias();

        if let Some(word) = projection_word.1
            && self.alias.as_deref() != Some(word.as_str())
        {
            return Err(self.error(format!("unknown projection '{word}'")));
        }

        let predicate = self.where_clause(model)?;

        let mut order = Vec::new();
        if self.eat_keyword("order") {
            self.expect_keyword("by")?;
            loop {
                let path = self.path(model)?;
                let direction = if self.eat_keyword("desc") {
                    Direction::Desc
                } else {
                    self.eat_keyword("asc");
                    Direction::Asc
                };
                order.push(OrderItem { path, direction });
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }

        Ok(CriteriaQuery {
            entity: model.entity_name.to_string(),
            kind: StatementKind::Select,
            projection: projection_word.0,
            distinct,
            predicate,
            order,
        })
    }

    fn delete(&mut self) -> Result<CriteriaQuery, PersistenceError> {
        self.expect_keyword("from")?;
        let model = self.entity()?;
        self.alias = self.optional_alias();
        let predicate = self.where_clause(model)?;

        Ok(CriteriaQuery {
            predicate,
            ..CriteriaQuery::delete(model.entity_name)
        })
    }

    // `*` projects the whole row; a word must be the alias
    fn projection_word(&mut self) -> Result<Option<String>, PersistenceError> {
        if self.eat(&Token::Star) {
            return Ok(None);
        }
        match self.next() {
            Some(Token::Word(word)) => Ok(Some(word)),
            _ => Err(self.error("expected projection")),
        }
    }

    fn entity(&mut self) -> Result<&'static EntityModel, PersistenceError> {
        match self.next() {
            Some(Token::Word(name)) => self
                .registry
                .get(&name)
                .ok_or(PersistenceError::UnknownEntity { name }),
            _ => Err(self.error("expected entity name")),
        }
    }

    fn optional_alias(&mut self) -> Option<String> {
        match self.peek() {
            Some(Token::Word(word)) if !is_reserved(word) => {
                let alias = word.clone();
                self.pos += 1;
                Some(alias)
            }
            _ => {
                if self.peek().is_some_and(|token| token.is_keyword("as")) {
                    self.pos += 1;
                    return self.optional_alias();
                }
                None
            }
        }
    }

    fn where_clause(
        &mut self,
        model: &'static EntityModel,
    ) -> Result<Option<Expr>, PersistenceError> {
        if self.eat_keyword("where") {
            Ok(Some(self.or_expr(model)?))
        } else {
            Ok(None)
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn or_expr(&mut self, model: &'static EntityModel) -> Result<Expr, PersistenceError> {
        let mut children = vec![self.and_expr(model)?];
        while self.eat_keyword("or") {
            children.push(self.and_expr(model)?);
        }

        Ok(Expr::or(children))
    }

    fn and_expr(&mut self, model: &'static EntityModel) -> Result<Expr, PersistenceError> {
        let mut children = vec![self.not_expr(model)?];
        while self.eat_keyword("and") {
            children.push(self.not_expr(model)?);
        }

        Ok(Expr::and(children))
    }

    fn not_expr(&mut self, model: &'static EntityModel) -> Result<Expr, PersistenceError> {
        if self.eat_keyword("not") {
            return Ok(Expr::Not(Box::new(self.not_expr(model)?)));
        }
        if self.eat(&Token::LParen) {
            let inner = self.or_expr(model)?;
            self.expect(&Token::RParen)?;
            return Ok(inner);
        }

        self.predicate(model)
    }

    fn predicate(&mut self, model: &'static EntityModel) -> Result<Expr, PersistenceError> {
        let target = self.scalar(model)?;

        if let Some(Token::Op(op)) = self.peek() {
            let op = match *op {
                "=" => CompareOp::Eq,
                "<>" => CompareOp::Ne,
                "<" => CompareOp::Lt,
                "<=" => CompareOp::Lte,
                ">" => CompareOp::Gt,
                _ => CompareOp::Gte,
            };
            self.pos += 1;
            let right = self.scalar(model)?;
            return Ok(Expr::compare(target, op, right));
        }

        if self.eat_keyword("is") {
            let negated = self.eat_keyword("not");
            if self.eat_keyword("null") {
                return Ok(Expr::IsNull { target, negated });
            }
            if self.eat_keyword("empty") {
                let Scalar::Path(path) = target else {
                    return Err(self.error("is empty requires an attribute path"));
                };
                self.require_collection(model, &path)?;
                return Ok(Expr::IsEmpty { path, negated });
            }
            return Err(self.error("expected null or empty"));
        }

        let negated = self.eat_keyword("not");

        if self.eat_keyword("like") {
            let pattern = self.scalar(model)?;
            let escape = if self.eat_keyword("escape") {
                match self.next() {
                    Some(Token::Str(text)) if text.chars().count() == 1 => text.chars().next(),
                    _ => return Err(self.error("escape requires a single character")),
                }
            } else {
                None
            };
            return Ok(Expr::Like {
                target,
                pattern,
                escape,
                negated,
            });
        }

        if self.eat_keyword("between") {
            let low = self.scalar(model)?;
            self.expect_keyword("and")?;
            let high = self.scalar(model)?;
            return Ok(Expr::Between {
                target,
                low,
                high,
                negated,
            });
        }

        if self.eat_keyword("in") {
            let values = if self.eat(&Token::LParen) {
                let mut values = vec![self.scalar(model)?];
                while self.eat(&Token::Comma) {
                    values.push(self.scalar(model)?);
                }
                self.expect(&Token::RParen)?;
                values
            } else {
                vec![self.scalar(model)?]
            };
            return Ok(Expr::In {
                target,
                values,
                negated,
            });
        }

        if self.eat_keyword("member") {
            self.eat_keyword("of");
            let path = self.path(model)?;
            self.require_collection(model, &path)?;
            return Ok(Expr::MemberOf {
                element: target,
                path,
                negated,
            });
        }

        Err(self.error("expected comparison"))
    }

    fn scalar(&mut self, model: &'static EntityModel) -> Result<Scalar, PersistenceError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error("unexpected end of query"));
        };

        match token {
            Token::Positional(Some(n)) => {
                self.pos += 1;
                Ok(Scalar::Param(Param::Position(n)))
            }
            Token::Positional(None) => {
                self.pos += 1;
                self.next_position += 1;
                Ok(Scalar::Param(Param::Position(self.next_position)))
            }
            Token::Named(name) => {
                self.pos += 1;
                Ok(Scalar::Param(Param::Named(name)))
            }
            Token::Str(text) => {
                self.pos += 1;
                Ok(Scalar::Literal(Value::Text(text)))
            }
            Token::Int(n) => {
                self.pos += 1;
                Ok(Scalar::Literal(Value::Int(n)))
            }
            Token::Uint(n) => {
                self.pos += 1;
                Ok(Scalar::Literal(Value::Uint(n)))
            }
            Token::Word(word) if word.eq_ignore_ascii_case("true") => {
                self.pos += 1;
                Ok(Scalar::Literal(Value::Bool(true)))
            }
            Token::Word(word) if word.eq_ignore_ascii_case("false") => {
                self.pos += 1;
                Ok(Scalar::Literal(Value::Bool(false)))
            }
            Token::Word(word) if word.eq_ignore_ascii_case("null") => {
                self.pos += 1;
                Ok(Scalar::Literal(Value::Null))
            }
            Token::Word(word)
                if (word.eq_ignore_ascii_case("upper") || word.eq_ignore_ascii_case("lower"))
                    && self.tokens.get(self.pos + 1) == Some(&Token::LParen) =>
            {
                self.pos += 2;
                let inner = self.scalar(model)?;
                self.expect(&Token::RParen)?;
                Ok(if word.eq_ignore_ascii_case("upper") {
                    inner.upper()
                } else {
                    inner.lower()
                })
            }
            Token::Word(_) => Ok(Scalar::Path(self.path(model)?)),
            other => Err(self.error(format!("unexpected token {other:?}"))),
        }
    }

    fn path(&mut self, model: &'static EntityModel) -> Result<AttributePath, PersistenceError> {
        let mut segments = Vec::new();
        loop {
            match self.next() {
                Some(Token::Word(word)) => segments.push(word),
                _ => return Err(self.error("expected attribute path")),
            }
            if !self.eat(&Token::Dot) {
                break;
            }
        }

        if segments.len() > 1 && self.alias.as_deref() == segments.first().map(String::as_str) {
            segments.remove(0);
        } else if !self.native && self.alias.is_some() {
            return Err(self.error(format!(
                "attribute '{}' must be qualified by the entity alias",
                segments.join(".")
            )));
        }

        let path = AttributePath::from_segments(segments);
        if model.resolve(&path).is_none() {
            return Err(PersistenceError::UnknownAttribute {
                entity: model.entity_name.to_string(),
                path: path.to_string(),
            });
        }

        Ok(path)
    }

    fn require_collection(
        &self,
        model: &'static EntityModel,
        path: &AttributePath,
    ) -> Result<(), PersistenceError> {
        let is_collection = model
            .resolve(path)
            .and_then(|chain| chain.last().map(|field| field.kind.is_collection()))
            .unwrap_or(false);
        if is_collection {
            Ok(())
        } else {
            Err(self.error(format!("'{path}' is not a collection attribute")))
        }
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_some_and(|token| token.is_keyword(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), PersistenceError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected {token:?}")))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), PersistenceError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{keyword}'")))
        }
    }

    fn error(&self, message: impl Into<String>) -> PersistenceError {
        PersistenceError::syntax(self.query, message)
    }
}

fn is_reserved(word: &str) -> bool {
    ["where", "order", "as", "set", "join"]
        .iter()
        .any(|reserved| word.eq_ignore_ascii_case(reserved))
}
