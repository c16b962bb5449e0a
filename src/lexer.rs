use std::collections::VecDeque;
use std::fmt;

// Bring the `Casing` trait into scope, which allows us to use `.to_case()` on strings. This is used
// to convert `TokenType` enum variant names into Title Case when printing human-readable errors. We
// assign this to `as _` to indicate clearly that the trait is not referenced directly and is only
// brought into scope for its methods.
use convert_case::Casing as _;
// Bring the `IntoEnumIterator` trait into scope, which allows us to use `::iter()` on enums that
// `#[derive(strum_macros::EnumIter)]`. This is used on `TokenType` to try each token pattern in
// declaration order against the front of the source string.
use strum::IntoEnumIterator as _;

use crate::errors::ParserError;

/// A position in EPL source code: the line the construct starts on, and its offset within that
/// line. Both are 1-based, matching how editors display positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
	pub line: usize,
	pub column: usize,
}

impl Span {
	#[must_use]
	pub fn new(line: usize, column: usize) -> Self {
		Self { line, column }
	}
}

impl fmt::Display for Span {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "line {}, offset {}", self.line, self.column)
	}
}

/// A type of token in EPL source code. Tokenization is the first step of compilation: it splits a
/// raw string of source code into tokens, each carrying a type and the exact snippet of source text
/// it matched.
///
/// The variants are tried in declaration order (via `strum`'s `EnumIter`), so ordering is load
/// bearing in two places: every keyword must come before `Identifier`, or keywords would tokenize
/// as plain identifiers, and `FloatLiteral` must come before `IntegerLiteral`, or `1.5` would
/// tokenize as the integer `1` followed by garbage.
#[derive(strum_macros::EnumIter, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
	/// The `enum` keyword, which introduces an enumeration type, either named
	/// (`enum Color { red, green }`) or anonymous (`enum { yes, no }`).
	KeywordEnum,

	/// The `type` keyword, which declares a type alias: `type T = U`.
	KeywordType,

	/// The `let` keyword, which declares an immutable binding.
	KeywordLet,

	/// The `var` keyword, which declares a mutable binding. Mutability is what separates
	/// compile-time values from runtime values, so `var` is the only way to force a value to
	/// survive to runtime.
	KeywordVar,

	/// The `fn` keyword, used both for named function definitions and anonymous function literals.
	KeywordFn,

	/// The `if` keyword.
	KeywordIf,

	/// The `else` keyword.
	KeywordElse,

	/// The `while` keyword.
	KeywordWhile,

	/// An identifier: a letter followed by letters, digits, or underscores. Term and type names
	/// share this one token type; the language does not distinguish them lexically.
	Identifier,

	/// A float literal such as `1.5` or `-0.25`. Floats are recognized by the lexer but the
	/// language currently defines no operators over them.
	FloatLiteral,

	/// An integer literal such as `42` or `-3`. The leading minus is part of the literal; EPL has
	/// no infix operators, so a bare `-` can appear nowhere else (except in `->`).
	IntegerLiteral,

	/// The `->` arrow, which precedes a function's return type.
	Arrow,

	/// The left parenthesis, used for parameter lists and call argument lists.
	LeftParenthesis,

	/// The right parenthesis.
	RightParenthesis,

	/// The left brace, which opens a block, a function body, or an enum variant list.
	LeftBrace,

	/// The right brace.
	RightBrace,

	/// The comma, separating parameters, arguments, and enum variants.
	Comma,

	/// The colon, which precedes a declared type on bindings and parameters.
	Colon,

	/// The equal sign, used in declarations and assignments.
	Equal,

	/// The dot, used for attribute access such as `Color.red`.
	Dot,

	/// Whitespace between tokens. Matched so the tokenizer can consume it, never emitted.
	Whitespace,

	/// A `//` line comment. Matched and discarded.
	LineComment,

	/// A `/* ... */` block comment, possibly spanning multiple lines. Matched and discarded.
	BlockComment,
}

impl TokenType {
	/// Returns the regular expression pattern that matches this token type at the start of a
	/// string.
	fn pattern(self) -> &'static regex_macro::Regex {
		match self {
			Self::KeywordEnum => regex_macro::regex!(r"^enum\b"),
			Self::KeywordType => regex_macro::regex!(r"^type\b"),
			Self::KeywordLet => regex_macro::regex!(r"^let\b"),
			Self::KeywordVar => regex_macro::regex!(r"^var\b"),
			Self::KeywordFn => regex_macro::regex!(r"^fn\b"),
			Self::KeywordIf => regex_macro::regex!(r"^if\b"),
			Self::KeywordElse => regex_macro::regex!(r"^else\b"),
			Self::KeywordWhile => regex_macro::regex!(r"^while\b"),
			Self::Identifier => regex_macro::regex!(r"^[a-zA-Z][a-zA-Z0-9_]*"),
			Self::FloatLiteral => regex_macro::regex!(r"^-?[0-9]+\.[0-9]+"),
			Self::IntegerLiteral => regex_macro::regex!(r"^-?[0-9]+"),
			Self::Arrow => regex_macro::regex!("^->"),
			Self::LeftParenthesis => regex_macro::regex!(r"^\("),
			Self::RightParenthesis => regex_macro::regex!(r"^\)"),
			Self::LeftBrace => regex_macro::regex!(r"^\{"),
			Self::RightBrace => regex_macro::regex!(r"^\}"),
			Self::Comma => regex_macro::regex!("^,"),
			Self::Colon => regex_macro::regex!("^:"),
			Self::Equal => regex_macro::regex!("^="),
			Self::Dot => regex_macro::regex!(r"^\."),

			// Ignored tokens
			Self::Whitespace => regex_macro::regex!(r"^\s+"),
			Self::LineComment => regex_macro::regex!("^//[^\n\r]*"),
			Self::BlockComment => regex_macro::regex!(r"^/\*(?s:.)*?\*/"),
		}
	}

	/// Returns the text this token type matches at the start of the given code, or `None` if the
	/// code does not start with this token type.
	#[must_use]
	pub fn get_match(self, code: &str) -> Option<String> {
		self.pattern().find(code).map(|matched| matched.as_str().to_owned())
	}

	/// Finds the first token type that matches the start of the given code, in declaration order.
	fn find_match(code: &str) -> Option<(Self, String)> {
		for token_type in Self::iter() {
			if let Some(matched) = token_type.get_match(code) {
				return Some((token_type, matched));
			}
		}
		None
	}

	/// Whether tokens of this type are dropped by the tokenizer instead of being emitted.
	fn is_ignored(self) -> bool {
		matches!(self, Self::Whitespace | Self::LineComment | Self::BlockComment)
	}
}

impl fmt::Display for TokenType {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "{}", format!("{self:?}").to_case(convert_case::Case::Title))
	}
}

/// A token in EPL source code.
#[derive(Debug, Clone)]
pub struct Token {
	/// The type of the token.
	pub token_type: TokenType,
	/// The source text of the token, exactly as it appears in the input.
	pub value: String,
	/// The position of the token's first character in the input.
	pub span: Span,
}

/// Tokenizes a string of EPL source code into a queue of tokens. This is the first step of
/// compilation; the returned queue is consumed from the front by the parser.
///
/// Whitespace and comments are consumed and dropped. The only error this function can produce is
/// an unrecognized character: a piece of code that matches no known token type.
pub fn tokenize(code: &str) -> Result<VecDeque<Token>, ParserError> {
	let mut tokens = VecDeque::new();
	let mut line = 1;
	let mut column = 1;
	let mut rest = code;

	// Tokens are only ever read from the start of the remaining string, so we repeatedly match
	// against the front and cut off what we matched.
	while !rest.is_empty() {
		let Some((token_type, value)) = TokenType::find_match(rest) else {
			let offending = rest.lines().next().unwrap_or(rest);
			return Err(ParserError::new(format!("unrecognized token: {offending}"), Span::new(line, column)));
		};

		let span = Span::new(line, column);
		let newline_count = value.chars().filter(|character| *character == '\n').count();
		if newline_count > 0 {
			line += newline_count;
			column = value.len() - value.rfind('\n').unwrap();
		} else {
			column += value.len();
		}
		rest = &rest[value.len()..];

		if !token_type.is_ignored() {
			tokens.push_back(Token { token_type, value, span });
		}
	}

	Ok(tokens)
}

#[cfg(test)]
mod tests {
	use super::{tokenize, TokenType};

	#[test]
	fn keywords_are_not_identifiers() {
		let tokens = tokenize("let letter = 1").unwrap();
		let types = tokens.iter().map(|token| token.token_type).collect::<Vec<_>>();
		assert_eq!(
			types,
			vec![TokenType::KeywordLet, TokenType::Identifier, TokenType::Equal, TokenType::IntegerLiteral]
		);
		assert_eq!(tokens[1].value, "letter");
	}

	#[test]
	fn floats_win_over_integers() {
		let tokens = tokenize("1.5 -2.25 3").unwrap();
		let types = tokens.iter().map(|token| token.token_type).collect::<Vec<_>>();
		assert_eq!(types, vec![TokenType::FloatLiteral, TokenType::FloatLiteral, TokenType::IntegerLiteral]);
	}

	#[test]
	fn comments_and_whitespace_are_dropped() {
		let tokens = tokenize("// line\nadd /* block\nstill block */ ( 1 , 2 )").unwrap();
		assert_eq!(tokens.len(), 6);
		assert_eq!(tokens[0].value, "add");
		// The block comment spans a line, so the parenthesis lands on line 3.
		assert_eq!(tokens[1].span.line, 3);
	}

	#[test]
	fn spans_track_lines_and_columns() {
		let tokens = tokenize("let x = 1\nlet y = 2").unwrap();
		let y = tokens.iter().find(|token| token.value == "y").unwrap();
		assert_eq!(y.span.line, 2);
		assert_eq!(y.span.column, 5);
	}

	#[test]
	fn unrecognized_characters_error_with_position() {
		let error = tokenize("let x = @").unwrap_err();
		assert!(error.message.contains("unrecognized token"));
		assert_eq!(error.span.line, 1);
	}

	#[test]
	fn arrow_is_not_a_negative_number() {
		let tokens = tokenize("-> -5").unwrap();
		assert_eq!(tokens[0].token_type, TokenType::Arrow);
		assert_eq!(tokens[1].token_type, TokenType::IntegerLiteral);
		assert_eq!(tokens[1].value, "-5");
	}
}
