use crate::{
	errors::ParserError,
	lexer::TokenType,
	parser::{
		ast::{Assignment, Enum, Expression, Statement, TypeAlias, Var},
		expressions::{parse_enum_values, parse_function_signature, parse_type},
		Parse, TokenQueue, TokenQueueFunctionality as _,
	},
};

impl Parse for Statement {
	type Output = Statement;

	fn parse(tokens: &mut TokenQueue) -> Result<Self::Output, ParserError> {
		let Some(next) = tokens.peek() else {
			return Err(ParserError::new("expected a statement but found end of file", tokens.current_span()));
		};

		match next.token_type {
			TokenType::KeywordLet | TokenType::KeywordVar => Ok(Statement::Var(Var::parse(tokens)?)),
			TokenType::KeywordType => Ok(Statement::TypeAlias(TypeAlias::parse(tokens)?)),

			// `fn name(...)` is a named definition; `fn (...)` falls through and parses as a
			// function literal expression.
			TokenType::KeywordFn if tokens.second_is(TokenType::Identifier) => {
				let span = tokens.pop(TokenType::KeywordFn)?.span;
				let name = tokens.pop(TokenType::Identifier)?.value;
				let function = parse_function_signature(tokens, span)?;
				Ok(Statement::Var(Var {
					name,
					type_annotation: None,
					readonly: true,
					value: Some(Expression::Function(function)),
					span,
				}))
			},

			// Same split for `enum Name { ... }` versus the anonymous `enum { ... }` literal.
			TokenType::KeywordEnum if tokens.second_is(TokenType::Identifier) => {
				let span = tokens.pop(TokenType::KeywordEnum)?.span;
				let name = tokens.pop(TokenType::Identifier)?.value;
				let values = parse_enum_values(tokens)?;
				Ok(Statement::Var(Var {
					name,
					type_annotation: None,
					readonly: true,
					value: Some(Expression::Enum(Enum { values, span })),
					span,
				}))
			},

			// `name = value` is an assignment statement. Assignments are not expressions, so this
			// is the only place they parse.
			TokenType::Identifier if tokens.second_is(TokenType::Equal) => {
				let destination_token = tokens.pop(TokenType::Identifier)?;
				tokens.pop(TokenType::Equal)?;
				let value = Expression::parse(tokens)?;
				Ok(Statement::Expression(Expression::Assignment(Assignment {
					destination: destination_token.value,
					value: Box::new(value),
					span: destination_token.span,
				})))
			},

			_ => Ok(Statement::Expression(Expression::parse(tokens)?)),
		}
	}
}

impl Parse for Var {
	type Output = Var;

	fn parse(tokens: &mut TokenQueue) -> Result<Self::Output, ParserError> {
		let keyword = if tokens.next_is(TokenType::KeywordLet) {
			tokens.pop(TokenType::KeywordLet)?
		} else {
			tokens.pop(TokenType::KeywordVar)?
		};
		let readonly = keyword.token_type == TokenType::KeywordLet;
		let name = tokens.pop(TokenType::Identifier)?.value;

		let type_annotation = if tokens.next_is(TokenType::Colon) {
			tokens.pop(TokenType::Colon)?;
			Some(parse_type(tokens)?)
		} else {
			None
		};

		let value = if tokens.next_is(TokenType::Equal) {
			tokens.pop(TokenType::Equal)?;
			Some(Expression::parse(tokens)?)
		} else {
			None
		};

		Ok(Var {
			name,
			type_annotation,
			readonly,
			value,
			span: keyword.span,
		})
	}
}

impl Parse for TypeAlias {
	type Output = TypeAlias;

	fn parse(tokens: &mut TokenQueue) -> Result<Self::Output, ParserError> {
		let span = tokens.pop(TokenType::KeywordType)?.span;
		let name = tokens.pop(TokenType::Identifier)?.value;
		tokens.pop(TokenType::Equal)?;
		let target = parse_type(tokens)?;
		Ok(TypeAlias { name, target, span })
	}
}
