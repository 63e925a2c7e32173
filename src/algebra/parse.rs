use crate::algebra::{BinaryOperation, Expression, Parameter};
use std::{
    fmt::{self, Display, Formatter},
    iter::Peekable,
    ops::Range,
    str::CharIndices,
    str::FromStr,
};
use thiserror::Error;

/// Parse an [`Expression`] tree from some text.
pub fn parse(s: &str) -> Result<Expression, ParseError> {
    Parser::new(s).parse()
}

/// A simple recursive descent parser (`LL(1)`) for converting a string into an
/// expression tree.
///
/// The grammar:
///
/// ```text
/// expression     := term (("+" | "-") term)*
///
/// term           := factor (("*" | "/") factor)*
///
/// factor         := "-" factor
///                 | IDENTIFIER
///                 | "(" expression ")"
///                 | NUMBER
/// ```
///
/// Binary operators are left-associative, so `a - b - c` is `(a - b) - c`.
#[derive(Debug, Clone)]
pub(crate) struct Parser<'a> {
    src: &'a str,
    tokens: Peekable<Lexer<'a>>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Parser {
            src,
            tokens: Lexer::new(src).peekable(),
        }
    }

    pub(crate) fn parse(mut self) -> Result<Expression, ParseError> {
        let expr = self.expression()?;

        match self.tokens.next() {
            None => Ok(expr),
            Some(Ok(token)) => Err(ParseError::UnexpectedToken {
                found: token.kind,
                span: token.span,
                expected: &[
                    TokenKind::Plus,
                    TokenKind::Minus,
                    TokenKind::Times,
                    TokenKind::Divide,
                ],
            }),
            Some(Err(e)) => Err(e),
        }
    }

    fn peek(&mut self) -> Option<TokenKind> {
        self.tokens
            .peek()
            .and_then(|result| result.as_ref().ok())
            .map(|tok| tok.kind)
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        match self.tokens.next() {
            Some(result) => result,
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }

    fn expression(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.term()?;

        while let Some(op) =
            self.binary_op(&[TokenKind::Plus, TokenKind::Minus])?
        {
            let right = self.term()?;
            left = Expression::Binary {
                left: Box::new(left),
                right: Box::new(right),
                op,
            };
        }

        Ok(left)
    }

    fn term(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.factor()?;

        while let Some(op) =
            self.binary_op(&[TokenKind::Times, TokenKind::Divide])?
        {
            let right = self.factor()?;
            left = Expression::Binary {
                left: Box::new(left),
                right: Box::new(right),
                op,
            };
        }

        Ok(left)
    }

    /// Consume the next token if it is one of the `expected` operators.
    fn binary_op(
        &mut self,
        expected: &[TokenKind],
    ) -> Result<Option<BinaryOperation>, ParseError> {
        match self.peek() {
            Some(kind) if expected.contains(&kind) => {
                // skip past the operator
                let _ = self.advance()?;
                Ok(Some(kind.as_binary_op()))
            },
            _ => Ok(None),
        }
    }

    fn factor(&mut self) -> Result<Expression, ParseError> {
        let expected =
            &[TokenKind::Number, TokenKind::Identifier, TokenKind::Minus];

        match self.peek() {
            Some(TokenKind::Number) => {
                return self.number();
            },
            Some(TokenKind::Minus) => {
                let _ = self.advance()?;
                let operand = self.factor()?;
                return Ok(Expression::Negate(Box::new(operand)));
            },
            Some(TokenKind::Identifier) => {
                let ident = self.advance()?;
                let name = &self.src[ident.span];
                return Ok(Expression::Parameter(Parameter::named(name)));
            },
            Some(TokenKind::OpenParen) => {
                let _ = self.advance()?;
                let expr = self.expression()?;
                let close_paren = self.advance()?;

                if close_paren.kind == TokenKind::CloseParen {
                    return Ok(expr);
                } else {
                    return Err(ParseError::UnexpectedToken {
                        found: close_paren.kind,
                        span: close_paren.span,
                        expected: &[TokenKind::CloseParen],
                    });
                }
            },
            _ => {},
        }

        // we couldn't parse the factor, return a nice error
        match self.tokens.next() {
            Some(Ok(Token { span, kind })) => {
                Err(ParseError::UnexpectedToken {
                    found: kind,
                    expected,
                    span,
                })
            },
            Some(Err(e)) => Err(e),
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }

    fn number(&mut self) -> Result<Expression, ParseError> {
        let token = self
            .tokens
            .next()
            .ok_or(ParseError::UnexpectedEndOfInput)??;

        debug_assert_eq!(token.kind, TokenKind::Number);
        let number = self.src[token.span.clone()].parse().map_err(|_| {
            ParseError::InvalidNumber {
                span: token.span.clone(),
            }
        })?;

        Ok(Expression::Constant(number))
    }
}

/// Possible errors that may occur while parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Invalid character, {character:?}, at index {index}")]
    InvalidCharacter { character: char, index: usize },
    #[error("Unable to parse the number at {span:?}")]
    InvalidNumber { span: Range<usize> },
    #[error("Unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("Found a {found} at {span:?} but expected one of {expected:?}")]
    UnexpectedToken {
        found: TokenKind,
        span: Range<usize>,
        expected: &'static [TokenKind],
    },
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { parse(s) }
}

/// A token, identified by its position in the source text.
#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    span: Range<usize>,
}

/// Splits the source text into [`Token`]s, skipping whitespace.
///
/// Numbers are unsigned decimals with an optional exponent (`2.5e-3`), so
/// `-` is always its own token.
#[derive(Debug, Clone)]
struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    /// The byte offset of the next character.
    fn offset(&mut self) -> usize {
        match self.chars.peek() {
            Some(&(index, _)) => index,
            None => self.src.len(),
        }
    }

    fn skip_while<P>(&mut self, mut predicate: P) -> usize
    where
        P: FnMut(char) -> bool,
    {
        let mut skipped = 0;

        while self.chars.next_if(|&(_, c)| predicate(c)).is_some() {
            skipped += 1;
        }

        skipped
    }

    fn single(&mut self, start: usize, kind: TokenKind) -> Token {
        self.chars.next();
        Token {
            kind,
            span: start..self.offset(),
        }
    }

    fn number(&mut self, start: usize) -> Token {
        let mut digits = self.skip_while(|c| c.is_ascii_digit());

        if self.chars.next_if(|&(_, c)| c == '.').is_some() {
            digits += self.skip_while(|c| c.is_ascii_digit());
        }

        // only an exponent when digits follow, so "2e" is "2" then "e"
        if digits > 0 && self.has_exponent() {
            self.chars.next();
            self.chars.next_if(|&(_, c)| c == '+' || c == '-');
            self.skip_while(|c| c.is_ascii_digit());
        }

        Token {
            kind: TokenKind::Number,
            span: start..self.offset(),
        }
    }

    fn has_exponent(&self) -> bool {
        let mut rest = self.chars.clone().map(|(_, c)| c);

        match (rest.next(), rest.next(), rest.next()) {
            (Some('e'), Some(d), _) | (Some('E'), Some(d), _)
                if d.is_ascii_digit() =>
            {
                true
            },
            (Some('e'), Some('+'), Some(d))
            | (Some('e'), Some('-'), Some(d))
            | (Some('E'), Some('+'), Some(d))
            | (Some('E'), Some('-'), Some(d)) => d.is_ascii_digit(),
            _ => false,
        }
    }

    fn identifier(&mut self, start: usize) -> Token {
        self.skip_while(|c| c.is_alphanumeric() || c == '_');

        Token {
            kind: TokenKind::Identifier,
            span: start..self.offset(),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_while(char::is_whitespace);
        let (start, c) = *self.chars.peek()?;

        let token = match c {
            '(' => self.single(start, TokenKind::OpenParen),
            ')' => self.single(start, TokenKind::CloseParen),
            '+' => self.single(start, TokenKind::Plus),
            '-' => self.single(start, TokenKind::Minus),
            '*' => self.single(start, TokenKind::Times),
            '/' => self.single(start, TokenKind::Divide),
            '0'..='9' | '.' => self.number(start),
            c if c.is_alphabetic() || c == '_' => self.identifier(start),
            other => {
                return Some(Err(ParseError::InvalidCharacter {
                    character: other,
                    index: start,
                }))
            },
        };

        Some(Ok(token))
    }
}

/// The kinds of token that can appear in an [`Expression`]'s text form.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TokenKind {
    Identifier,
    Number,
    OpenParen,
    CloseParen,
    Plus,
    Minus,
    Times,
    Divide,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::OpenParen => "\"(\"",
            TokenKind::CloseParen => "\")\"",
            TokenKind::Plus => "\"+\"",
            TokenKind::Minus => "\"-\"",
            TokenKind::Times => "\"*\"",
            TokenKind::Divide => "\"/\"",
        };

        write!(f, "{}", name)
    }
}

impl TokenKind {
    fn as_binary_op(self) -> BinaryOperation {
        match self {
            TokenKind::Plus => BinaryOperation::Plus,
            TokenKind::Minus => BinaryOperation::Minus,
            TokenKind::Times => BinaryOperation::Times,
            TokenKind::Divide => BinaryOperation::Divide,
            other => unreachable!("{:?} is not a binary op", other),
        }
    }
}


#[cfg(test)]
mod parser_tests {
    use super::*;

    macro_rules! parser_test {
        ($name:ident, $src:expr) => {
            parser_test!($name, $src, $src);
        };
        ($name:ident, $src:expr, $should_be:expr) => {
            #[test]
            fn $name() {
                let got = Parser::new($src).parse().unwrap();

                let round_tripped = got.to_string();
                assert_eq!(round_tripped, $should_be);
            }
        };
    }

    parser_test!(simple_integer, "1");
    parser_test!(one_plus_one, "1 + 1");
    parser_test!(one_plus_one_plus_negative_one, "1 + -1");
    parser_test!(one_plus_one_times_three, "1 + 1*3");
    parser_test!(one_plus_one_all_times_three, "(1 + 1)*3");
    parser_test!(negative_one, "-1");
    parser_test!(negative_one_plus_one, "-1 + 1");
    parser_test!(negative_one_plus_x, "-1 + x");
    parser_test!(number_in_parens, "(1)", "1");
    parser_test!(bimdas, "1*2 + 3*4/(5 - 2)*1 - 3");
    parser_test!(variables_in_a_product, "u*v - w");
    parser_test!(subtraction_is_left_associative, "u - v - w");
    parser_test!(grouped_subtraction, "u - (v - w)");
    parser_test!(division_is_left_associative, "u/v/w");
    parser_test!(nested_parens, "((u))*(v + 1)", "u*(v + 1)");
    parser_test!(scientific_notation, "2.5E3*u - 1e-3", "2500*u - 0.001");

    #[test]
    fn trailing_tokens_are_an_error() {
        let got = parse("u (v)").unwrap_err();

        assert_eq!(
            got,
            ParseError::UnexpectedToken {
                found: TokenKind::OpenParen,
                span: 2..3,
                expected: &[
                    TokenKind::Plus,
                    TokenKind::Minus,
                    TokenKind::Times,
                    TokenKind::Divide,
                ],
            }
        );
    }

    #[test]
    fn unknown_characters_are_reported() {
        let got = parse("u % v").unwrap_err();

        assert_eq!(
            got,
            ParseError::InvalidCharacter {
                character: '%',
                index: 2
            }
        );
    }

    #[test]
    fn missing_close_paren() {
        assert_eq!(parse("(u + v").unwrap_err(), ParseError::UnexpectedEndOfInput);
    }
}
