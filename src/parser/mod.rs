use std::collections::VecDeque;

use crate::{
	errors::ParserError,
	lexer::{Span, Token, TokenType},
	parser::ast::Program,
};

/// The abstract syntax tree node types.
pub mod ast;
/// Expression parsing rules.
pub mod expressions;
/// Definition and statement parsing rules.
pub mod statements;

/// The queue of tokens the parser consumes from the front.
pub type TokenQueue = VecDeque<Token>;

/// A trait for parsing a token stream into an abstract syntax tree node using a specific rule.
pub trait Parse {
	/// The type of abstract syntax tree node that this rule parses into.
	type Output;

	/// Parses a token stream into an abstract syntax tree node using this rule. Tokens consumed
	/// before an error are not put back; parsing does not recover.
	fn parse(tokens: &mut TokenQueue) -> Result<Self::Output, ParserError>;
}

/// Queue operations the parsing rules need on top of `VecDeque`. Implemented for `TokenQueue`
/// rather than wrapped in a new type so rules can keep using the deque directly.
pub trait TokenQueueFunctionality {
	/// Removes and returns the next token if it matches the given token type; errors otherwise.
	fn pop(&mut self, token_type: TokenType) -> Result<Token, ParserError>;

	/// Returns a reference to the next token without removing it.
	fn peek(&self) -> Option<&Token>;

	/// Returns a reference to the token after the next one without removing anything. Needed to
	/// tell a named definition (`fn name(`) from a literal (`fn (`), and an assignment statement
	/// (`name =`) from a plain expression.
	fn peek_second(&self) -> Option<&Token>;

	/// Whether the next token matches the given token type.
	fn next_is(&self, token_type: TokenType) -> bool;

	/// Whether the token after the next one matches the given token type.
	fn second_is(&self, token_type: TokenType) -> bool;

	/// The source position of the next token, or of the end of the file if none remain.
	fn current_span(&self) -> Span;
}

impl TokenQueueFunctionality for TokenQueue {
	fn pop(&mut self, token_type: TokenType) -> Result<Token, ParserError> {
		match self.pop_front() {
			Some(token) if token.token_type == token_type => Ok(token),
			Some(token) => Err(ParserError::new(
				format!("expected {token_type} but found {} ({:?})", token.token_type, token.value),
				token.span,
			)),
			None => Err(ParserError::new(format!("expected {token_type} but found end of file"), Span::new(0, 0))),
		}
	}

	fn peek(&self) -> Option<&Token> {
		self.front()
	}

	fn peek_second(&self) -> Option<&Token> {
		self.get(1)
	}

	fn next_is(&self, token_type: TokenType) -> bool {
		self.peek().is_some_and(|token| token.token_type == token_type)
	}

	fn second_is(&self, token_type: TokenType) -> bool {
		self.peek_second().is_some_and(|token| token.token_type == token_type)
	}

	fn current_span(&self) -> Span {
		self.peek().map_or(Span::new(0, 0), |token| token.span)
	}
}

/// Parses a comma-separated list of things. The block is run once, and then again after each
/// consumed comma; a trailing comma before the closing token is allowed by checking for the
/// closer inside the block.
#[macro_export]
macro_rules! parse_list {
	(
		$tokens: expr, $body: block
	) => {
		$body;
		while $tokens.next_is(TokenType::Comma) {
			$tokens.pop(TokenType::Comma)?;
			$body;
		}
	};
}

impl Parse for Program {
	type Output = Self;

	fn parse(tokens: &mut TokenQueue) -> Result<Self::Output, ParserError> {
		let span = tokens.current_span();
		let mut statements = Vec::new();
		while !tokens.is_empty() {
			statements.push(ast::Statement::parse(tokens)?);
		}
		Ok(Self { statements, span })
	}
}

/// Parses a token stream into an abstract syntax tree.
pub fn parse(tokens: &mut TokenQueue) -> Result<Program, ParserError> {
	Program::parse(tokens)
}
