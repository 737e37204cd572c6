use logos::Logos;
use snailquote::unescape;

use crate::MailweaveError;
use crate::MailweaveResult;

/// Raw tokens for the restricted literal syntax used by directive mappings
/// and config values.
#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
	#[token("[")]
	BracketOpen,
	#[token("]")]
	BracketClose,
	#[token(",")]
	Comma,
	#[token(":")]
	Colon,
	#[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
	Ident,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'([^'\\]|\\.)*'")]
	SingleQuotedString,
	#[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
	Number,
}

/// A parsed literal value. The syntax is deliberately restricted: numbers,
/// strings, booleans, and nested lists of those. There is no expression
/// evaluation of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
	Int(i64),
	Float(f64),
	Bool(bool),
	Str(String),
	List(Vec<Literal>),
}

impl std::fmt::Display for Literal {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Int(value) => write!(f, "{value}"),
			Self::Float(value) => write!(f, "{value}"),
			Self::Bool(value) => write!(f, "{value}"),
			Self::Str(value) => f.write_str(value),
			Self::List(items) => {
				f.write_str("[")?;
				for (index, item) in items.iter().enumerate() {
					if index > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{item}")?;
				}
				f.write_str("]")
			}
		}
	}
}

/// Parse a single literal value. Trailing input after the value is an
/// error.
pub fn parse_literal(source: &str) -> MailweaveResult<Literal> {
	let mut parser = Parser::new(source);
	let value = parser.parse_value()?;
	parser.expect_end()?;
	Ok(value)
}

/// Parse a directive mapping body: a comma-separated sequence of
/// `key: value` pairs, where keys are bare identifiers or quoted strings.
/// An empty body yields an empty mapping. A trailing comma is accepted.
pub fn parse_mapping(source: &str) -> MailweaveResult<Vec<(String, Literal)>> {
	let mut parser = Parser::new(source);
	let mut pairs = Vec::new();

	while !parser.at_end() {
		let key = parser.parse_key()?;
		parser.expect(&RawToken::Colon, "`:`")?;
		let value = parser.parse_value()?;
		pairs.push((key, value));

		if parser.at_end() {
			break;
		}
		parser.expect(&RawToken::Comma, "`,`")?;
	}

	Ok(pairs)
}

struct Parser<'a> {
	source: &'a str,
	tokens: Vec<(Result<RawToken, ()>, std::ops::Range<usize>)>,
	cursor: usize,
}

impl<'a> Parser<'a> {
	fn new(source: &'a str) -> Self {
		let tokens: Vec<_> = RawToken::lexer(source).spanned().collect();
		Self {
			source,
			tokens,
			cursor: 0,
		}
	}

	fn at_end(&self) -> bool {
		self.cursor >= self.tokens.len()
	}

	fn current_slice(&self) -> &'a str {
		let (_, span) = &self.tokens[self.cursor];
		&self.source[span.clone()]
	}

	fn bump(&mut self) -> MailweaveResult<(&RawToken, &'a str)> {
		if self.at_end() {
			return Err(MailweaveError::LiteralSyntax(
				"unexpected end of input".into(),
			));
		}
		let slice = self.current_slice();
		let (result, _) = &self.tokens[self.cursor];
		self.cursor += 1;
		match result {
			Ok(token) => Ok((token, slice)),
			Err(()) => {
				Err(MailweaveError::LiteralSyntax(format!(
					"unexpected character `{slice}`"
				)))
			}
		}
	}

	fn expect(&mut self, expected: &RawToken, label: &str) -> MailweaveResult<()> {
		let (token, slice) = self.bump()?;
		if token == expected {
			Ok(())
		} else {
			Err(MailweaveError::LiteralSyntax(format!(
				"expected {label}, found `{slice}`"
			)))
		}
	}

	fn expect_end(&self) -> MailweaveResult<()> {
		if self.at_end() {
			Ok(())
		} else {
			Err(MailweaveError::LiteralSyntax(format!(
				"unexpected trailing input `{}`",
				self.current_slice()
			)))
		}
	}

	fn parse_key(&mut self) -> MailweaveResult<String> {
		let (token, slice) = self.bump()?;
		match token {
			RawToken::Ident => Ok(slice.to_string()),
			RawToken::DoubleQuotedString | RawToken::SingleQuotedString => Ok(unquote(slice)?),
			_ => {
				Err(MailweaveError::LiteralSyntax(format!(
					"expected a mapping key, found `{slice}`"
				)))
			}
		}
	}

	fn parse_value(&mut self) -> MailweaveResult<Literal> {
		let (token, slice) = self.bump()?;
		match token {
			RawToken::Number => parse_number(slice),
			RawToken::DoubleQuotedString | RawToken::SingleQuotedString => {
				Ok(Literal::Str(unquote(slice)?))
			}
			RawToken::Ident => {
				match slice {
					"true" | "True" => Ok(Literal::Bool(true)),
					"false" | "False" => Ok(Literal::Bool(false)),
					_ => {
						Err(MailweaveError::LiteralSyntax(format!(
							"`{slice}` is not a literal value"
						)))
					}
				}
			}
			RawToken::BracketOpen => self.parse_list(),
			_ => {
				Err(MailweaveError::LiteralSyntax(format!(
					"expected a value, found `{slice}`"
				)))
			}
		}
	}

	fn parse_list(&mut self) -> MailweaveResult<Literal> {
		let mut items = Vec::new();

		loop {
			if self.peek_is(&RawToken::BracketClose) {
				self.cursor += 1;
				return Ok(Literal::List(items));
			}
			items.push(self.parse_value()?);

			if self.peek_is(&RawToken::Comma) {
				self.cursor += 1;
				continue;
			}
			self.expect(&RawToken::BracketClose, "`]`")?;
			return Ok(Literal::List(items));
		}
	}

	fn peek_is(&self, expected: &RawToken) -> bool {
		self.tokens
			.get(self.cursor)
			.is_some_and(|(result, _)| result.as_ref() == Ok(expected))
	}
}

/// Parse a number slice. Determines whether it's a float or an int, the
/// same split the lexer uses for filter arguments.
fn parse_number(slice: &str) -> MailweaveResult<Literal> {
	let is_float = slice.contains('.') || slice.contains('e') || slice.contains('E');

	if is_float {
		slice
			.parse::<f64>()
			.map(Literal::Float)
			.map_err(|_| MailweaveError::LiteralSyntax(format!("invalid number `{slice}`")))
	} else {
		slice
			.parse::<i64>()
			.map(Literal::Int)
			.map_err(|_| MailweaveError::LiteralSyntax(format!("invalid number `{slice}`")))
	}
}

/// Strip surrounding quotes and unescape if needed.
fn unquote(slice: &str) -> MailweaveResult<String> {
	let inner = &slice[1..slice.len() - 1];

	if inner.contains('\\') {
		unescape(inner)
			.map_err(|_| MailweaveError::LiteralSyntax(format!("invalid string escape in {slice}")))
	} else {
		Ok(inner.to_string())
	}
}
