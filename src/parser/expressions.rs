use crate::{
	errors::ParserError,
	lexer::TokenType,
	parse_list,
	parser::{
		ast::{
			Argument, AttributeAccess, Block, Call, Enum, Expression, Function, If, LiteralValue, Statement, Term,
			Tuple, Value, While,
		},
		Parse, TokenQueue, TokenQueueFunctionality as _,
	},
};

impl Parse for Expression {
	type Output = Expression;

	/// Parses one expression. EPL has no infix operators, so the grammar is a primary expression
	/// followed by any number of postfix call and attribute-access suffixes.
	fn parse(tokens: &mut TokenQueue) -> Result<Self::Output, ParserError> {
		let mut expression = parse_primary(tokens)?;

		loop {
			if tokens.next_is(TokenType::LeftParenthesis) {
				let span = expression.span();
				tokens.pop(TokenType::LeftParenthesis)?;
				let mut arguments = Vec::new();
				if !tokens.next_is(TokenType::RightParenthesis) {
					parse_list!(tokens, {
						if !tokens.next_is(TokenType::RightParenthesis) {
							arguments.push(Expression::parse(tokens)?);
						}
					});
				}
				tokens.pop(TokenType::RightParenthesis)?;
				expression = Expression::Call(Call {
					callee: Box::new(expression),
					arguments,
					span,
				});
			} else if tokens.next_is(TokenType::Dot) {
				let span = expression.span();
				tokens.pop(TokenType::Dot)?;
				let attribute = tokens.pop(TokenType::Identifier)?.value;
				expression = Expression::AttributeAccess(AttributeAccess {
					object: Box::new(expression),
					attribute,
					span,
				});
			} else {
				return Ok(expression);
			}
		}
	}
}

/// Parses a primary expression: a literal, a name, or one of the structured forms.
fn parse_primary(tokens: &mut TokenQueue) -> Result<Expression, ParserError> {
	let Some(next) = tokens.peek() else {
		return Err(ParserError::new("expected an expression but found end of file", tokens.current_span()));
	};

	match next.token_type {
		TokenType::IntegerLiteral => {
			let token = tokens.pop(TokenType::IntegerLiteral)?;
			let integer = token
				.value
				.parse::<i64>()
				.map_err(|error| ParserError::new(format!("invalid integer literal: {error}"), token.span))?;
			Ok(Expression::Value(Value {
				value: LiteralValue::Integer(integer),
				span: token.span,
			}))
		},
		TokenType::FloatLiteral => {
			let token = tokens.pop(TokenType::FloatLiteral)?;
			let float = token
				.value
				.parse::<f64>()
				.map_err(|error| ParserError::new(format!("invalid float literal: {error}"), token.span))?;
			Ok(Expression::Value(Value {
				value: LiteralValue::Float(float),
				span: token.span,
			}))
		},
		TokenType::Identifier => {
			let token = tokens.pop(TokenType::Identifier)?;
			Ok(Expression::Term(Term {
				name: token.value,
				span: token.span,
			}))
		},
		TokenType::KeywordIf => Ok(Expression::If(If::parse(tokens)?)),
		TokenType::KeywordWhile => Ok(Expression::While(While::parse(tokens)?)),
		TokenType::LeftBrace => Ok(Expression::Block(Block::parse(tokens)?)),
		TokenType::KeywordFn => Ok(Expression::Function(Function::parse(tokens)?)),
		TokenType::KeywordEnum => Ok(Expression::Enum(Enum::parse(tokens)?)),
		other => Err(ParserError::new(format!("expected an expression but found {other}"), next.span)),
	}
}

impl Parse for If {
	type Output = If;

	fn parse(tokens: &mut TokenQueue) -> Result<Self::Output, ParserError> {
		let span = tokens.pop(TokenType::KeywordIf)?.span;
		let condition = Box::new(Expression::parse(tokens)?);
		let on_true = Block::parse(tokens)?;
		let on_false = if tokens.next_is(TokenType::KeywordElse) {
			tokens.pop(TokenType::KeywordElse)?;
			Some(Block::parse(tokens)?)
		} else {
			None
		};
		Ok(If {
			condition,
			on_true,
			on_false,
			span,
		})
	}
}

impl Parse for While {
	type Output = While;

	fn parse(tokens: &mut TokenQueue) -> Result<Self::Output, ParserError> {
		let span = tokens.pop(TokenType::KeywordWhile)?.span;
		let condition = Box::new(Expression::parse(tokens)?);
		let body = Block::parse(tokens)?;
		Ok(While { condition, body, span })
	}
}

impl Parse for Block {
	type Output = Block;

	fn parse(tokens: &mut TokenQueue) -> Result<Self::Output, ParserError> {
		let span = tokens.pop(TokenType::LeftBrace)?.span;
		let mut statements = Vec::new();
		while !tokens.next_is(TokenType::RightBrace) {
			if tokens.peek().is_none() {
				return Err(ParserError::new("unclosed block: expected Right Brace but found end of file", span));
			}
			statements.push(Statement::parse(tokens)?);
		}
		tokens.pop(TokenType::RightBrace)?;
		Ok(Block { statements, span })
	}
}

impl Parse for Function {
	type Output = Function;

	/// Parses an anonymous function literal. Named definitions share this rule: the statement
	/// parser consumes `fn name` itself and calls here with the queue positioned at the
	/// parameter list.
	fn parse(tokens: &mut TokenQueue) -> Result<Self::Output, ParserError> {
		let span = tokens.pop(TokenType::KeywordFn)?.span;
		parse_function_signature(tokens, span)
	}
}

/// Parses a function's parameter list, optional return type, and body. The `fn` keyword (and the
/// name, for named definitions) must already be consumed.
pub(crate) fn parse_function_signature(tokens: &mut TokenQueue, span: crate::lexer::Span) -> Result<Function, ParserError> {
	tokens.pop(TokenType::LeftParenthesis)?;
	let mut arguments = Vec::new();
	if !tokens.next_is(TokenType::RightParenthesis) {
		parse_list!(tokens, {
			if !tokens.next_is(TokenType::RightParenthesis) {
				let name_token = tokens.pop(TokenType::Identifier)?;
				tokens.pop(TokenType::Colon)?;
				let type_expression = parse_type(tokens)?;
				arguments.push(Argument {
					name: name_token.value,
					type_expression,
					span: name_token.span,
				});
			}
		});
	}
	tokens.pop(TokenType::RightParenthesis)?;

	let return_type = if tokens.next_is(TokenType::Arrow) {
		tokens.pop(TokenType::Arrow)?;
		Some(Box::new(parse_type(tokens)?))
	} else {
		None
	};

	let body = Block::parse(tokens)?;
	Ok(Function {
		arguments,
		return_type,
		body,
		span,
	})
}

impl Parse for Enum {
	type Output = Enum;

	/// Parses an anonymous enumeration literal. As with functions, named definitions consume
	/// `enum Name` in the statement parser and reuse the variant-list rule.
	fn parse(tokens: &mut TokenQueue) -> Result<Self::Output, ParserError> {
		let span = tokens.pop(TokenType::KeywordEnum)?.span;
		let values = parse_enum_values(tokens)?;
		Ok(Enum { values, span })
	}
}

/// Parses the braced, comma-separated variant list of an enumeration. Empty lists and trailing
/// commas are allowed.
pub(crate) fn parse_enum_values(tokens: &mut TokenQueue) -> Result<Vec<String>, ParserError> {
	tokens.pop(TokenType::LeftBrace)?;
	let mut values = Vec::new();
	if !tokens.next_is(TokenType::RightBrace) {
		parse_list!(tokens, {
			if !tokens.next_is(TokenType::RightBrace) {
				values.push(tokens.pop(TokenType::Identifier)?.value);
			}
		});
	}
	tokens.pop(TokenType::RightBrace)?;
	Ok(values)
}

/// Parses a type position: a bare name or a parenthesized tuple of types. Types are ordinary
/// compile-time expressions in EPL, but the grammar in type position is restricted so that
/// `fn(a: Int, b: Int)` does not swallow the comma.
pub(crate) fn parse_type(tokens: &mut TokenQueue) -> Result<Expression, ParserError> {
	if tokens.next_is(TokenType::LeftParenthesis) {
		let span = tokens.pop(TokenType::LeftParenthesis)?.span;
		let mut members = Vec::new();
		if !tokens.next_is(TokenType::RightParenthesis) {
			parse_list!(tokens, {
				if !tokens.next_is(TokenType::RightParenthesis) {
					members.push(parse_type(tokens)?);
				}
			});
		}
		tokens.pop(TokenType::RightParenthesis)?;
		return Ok(Expression::Tuple(Tuple { members, span }));
	}

	let token = tokens.pop(TokenType::Identifier)?;
	let mut expression = Expression::Term(Term {
		name: token.value,
		span: token.span,
	});

	// Allow reaching nested type names, such as an alias accessed through an enum's type.
	while tokens.next_is(TokenType::Dot) {
		tokens.pop(TokenType::Dot)?;
		let attribute = tokens.pop(TokenType::Identifier)?.value;
		expression = Expression::AttributeAccess(AttributeAccess {
			object: Box::new(expression),
			attribute,
			span: token.span,
		});
	}

	Ok(expression)
}
