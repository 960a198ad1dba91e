//! Type expression model and a parser for Java-style type text.
//!
//! A [`TypeReference`] is the structural form of a type as it appears in an
//! accessor signature or a type parameter bound. It is what the rewriter walks
//! and what the renderer prints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a wildcard bound: `? extends T` or `? super T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variance {
    Upper,
    Lower,
}

/// A (possibly nested) type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TypeReference {
    /// A class, interface, or primitive referenced by (qualified) name.
    Named { name: String },
    /// A generic type applied to arguments, e.g. `java.util.List<String>`.
    Parameterized {
        raw: Box<TypeReference>,
        args: Vec<TypeReference>,
    },
    /// `?`, `? extends T` or `? super T`. An unbounded wildcard has no bound.
    Wildcard {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bound: Option<Box<TypeReference>>,
        variance: Variance,
    },
    /// `T[]`. Multi-dimensional arrays nest.
    Array { element: Box<TypeReference> },
    /// A type variable. In use position the bounds are usually empty.
    TypeVariable {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bounds: Vec<TypeReference>,
    },
}

impl TypeReference {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into() }
    }

    pub fn parameterized(raw: TypeReference, args: Vec<TypeReference>) -> Self {
        Self::Parameterized {
            raw: Box::new(raw),
            args,
        }
    }

    /// `? extends bound`
    pub fn extends(bound: TypeReference) -> Self {
        Self::Wildcard {
            bound: Some(Box::new(bound)),
            variance: Variance::Upper,
        }
    }

    /// `? super bound`
    pub fn super_of(bound: TypeReference) -> Self {
        Self::Wildcard {
            bound: Some(Box::new(bound)),
            variance: Variance::Lower,
        }
    }

    /// The bare `?`.
    pub const fn unbounded() -> Self {
        Self::Wildcard {
            bound: None,
            variance: Variance::Upper,
        }
    }

    pub fn array(element: TypeReference) -> Self {
        Self::Array {
            element: Box::new(element),
        }
    }

    pub fn variable(name: impl Into<String>, bounds: Vec<TypeReference>) -> Self {
        Self::TypeVariable {
            name: name.into(),
            bounds,
        }
    }

    /// Render a type variable in declaration position (`T extends A & B`).
    /// Any other variant renders as in use position.
    pub fn declaration_form(&self) -> String {
        match self {
            Self::TypeVariable { name, bounds } if !bounds.is_empty() => {
                let bounds: Vec<String> = bounds.iter().map(ToString::to_string).collect();
                format!("{} extends {}", name, bounds.join(" & "))
            }
            other => other.to_string(),
        }
    }

    /// Whether this is a primitive such as `int` or `boolean`.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Named { name } if PRIMITIVES.contains(&name.as_str()))
    }
}

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { name } | Self::TypeVariable { name, .. } => f.write_str(name),
            Self::Parameterized { raw, args } => {
                write!(f, "{raw}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            Self::Wildcard { bound: None, .. } => f.write_str("?"),
            Self::Wildcard {
                bound: Some(bound),
                variance: Variance::Upper,
            } => write!(f, "? extends {bound}"),
            Self::Wildcard {
                bound: Some(bound),
                variance: Variance::Lower,
            } => write!(f, "? super {bound}"),
            Self::Array { element } => write!(f, "{element}[]"),
        }
    }
}

/// Errors from [`parse_type`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeParseError {
    #[error("empty type expression")]
    Empty,
    #[error("unexpected `{found}` at offset {offset} in `{input}`")]
    Unexpected {
        found: String,
        offset: usize,
        input: String,
    },
    #[error("unexpected end of type expression `{input}`")]
    UnexpectedEnd { input: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Punct(char),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => f.write_str(s),
            Token::Punct(c) => write!(f, "{c}"),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token<'_>)>, TypeParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if is_ident_start(c) {
            let mut end = offset + c.len_utf8();
            while let Some(&(i, next)) = chars.peek() {
                if !is_ident_continue(next) {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
            tokens.push((offset, Token::Ident(&input[offset..end])));
        } else if matches!(c, '<' | '>' | ',' | '?' | '[' | ']' | '.') {
            tokens.push((offset, Token::Punct(c)));
        } else {
            return Err(TypeParseError::Unexpected {
                found: c.to_string(),
                offset,
                input: input.to_string(),
            });
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<(usize, Token<'a>)>,
    pos: usize,
    type_params: &'a [&'a str],
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).map(|(_, t)| *t)
    }

    fn next(&mut self) -> Result<Token<'a>, TypeParseError> {
        let token = self.peek().ok_or_else(|| TypeParseError::UnexpectedEnd {
            input: self.input.to_string(),
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn unexpected(&self, token: Token<'_>) -> TypeParseError {
        let offset = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map_or(self.input.len(), |(o, _)| *o);
        TypeParseError::Unexpected {
            found: token.to_string(),
            offset,
            input: self.input.to_string(),
        }
    }

    fn eat(&mut self, punct: char) -> bool {
        if self.peek() == Some(Token::Punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: char) -> Result<(), TypeParseError> {
        match self.next()? {
            Token::Punct(c) if c == punct => Ok(()),
            other => Err(self.unexpected(other)),
        }
    }

    fn parse_type(&mut self) -> Result<TypeReference, TypeParseError> {
        let name = self.parse_qualified_name()?;
        let mut ty = if self.type_params.contains(&name.as_str()) {
            TypeReference::variable(name, Vec::new())
        } else {
            TypeReference::named(name)
        };

        if self.eat('<') {
            let mut args = vec![self.parse_argument()?];
            while self.eat(',') {
                args.push(self.parse_argument()?);
            }
            self.expect('>')?;
            ty = TypeReference::parameterized(ty, args);
        }

        while self.eat('[') {
            self.expect(']')?;
            ty = TypeReference::array(ty);
        }

        Ok(ty)
    }

    /// `Ident ('.' Ident)*`; every segment must be non-empty.
    fn parse_qualified_name(&mut self) -> Result<String, TypeParseError> {
        let mut name = match self.next()? {
            Token::Ident(segment) => segment.to_string(),
            other => return Err(self.unexpected(other)),
        };
        while self.eat('.') {
            match self.next()? {
                Token::Ident(segment) => {
                    name.push('.');
                    name.push_str(segment);
                }
                other => return Err(self.unexpected(other)),
            }
        }
        Ok(name)
    }

    fn parse_argument(&mut self) -> Result<TypeReference, TypeParseError> {
        if !self.eat('?') {
            return self.parse_type();
        }
        match self.peek() {
            Some(Token::Ident("extends")) => {
                self.pos += 1;
                Ok(TypeReference::extends(self.parse_type()?))
            }
            Some(Token::Ident("super")) => {
                self.pos += 1;
                Ok(TypeReference::super_of(self.parse_type()?))
            }
            _ => Ok(TypeReference::unbounded()),
        }
    }
}

/// Parse Java-style type text such as `java.util.Map<String, ? extends pkg.Foo>[]`.
///
/// Identifiers listed in `type_params` become bare [`TypeReference::TypeVariable`]
/// leaves; every other identifier is taken as a [`TypeReference::Named`] verbatim.
/// Names are not resolved against imports.
pub fn parse_type(input: &str, type_params: &[&str]) -> Result<TypeReference, TypeParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(TypeParseError::Empty);
    }

    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
        type_params,
    };
    let ty = parser.parse_type()?;
    if let Some(extra) = parser.peek() {
        parser.pos += 1;
        return Err(parser.unexpected(extra));
    }
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named() {
        assert_eq!(
            parse_type("java.lang.String", &[]).unwrap(),
            TypeReference::named("java.lang.String")
        );
    }

    #[test]
    fn test_parse_nested_generics_and_wildcards() {
        let ty = parse_type(
            "java.util.Map<String, java.util.List<? extends pkg.FooPOJO>>",
            &[],
        )
        .unwrap();
        assert_eq!(
            ty,
            TypeReference::parameterized(
                TypeReference::named("java.util.Map"),
                vec![
                    TypeReference::named("String"),
                    TypeReference::parameterized(
                        TypeReference::named("java.util.List"),
                        vec![TypeReference::extends(TypeReference::named("pkg.FooPOJO"))],
                    ),
                ],
            )
        );
    }

    #[test]
    fn test_parse_super_and_unbounded_wildcards() {
        let ty = parse_type("Pair<? super Number, ?>", &[]).unwrap();
        let TypeReference::Parameterized { args, .. } = ty else {
            panic!("expected parameterized type");
        };
        assert_eq!(args[0], TypeReference::super_of(TypeReference::named("Number")));
        assert_eq!(args[1], TypeReference::unbounded());
    }

    #[test]
    fn test_parse_multi_dimensional_array() {
        let ty = parse_type("int[][]", &[]).unwrap();
        assert_eq!(
            ty,
            TypeReference::array(TypeReference::array(TypeReference::named("int")))
        );
        assert_eq!(ty.to_string(), "int[][]");
    }

    #[test]
    fn test_parse_type_parameter_becomes_variable() {
        let ty = parse_type("java.util.List<T>", &["T"]).unwrap();
        assert_eq!(
            ty,
            TypeReference::parameterized(
                TypeReference::named("java.util.List"),
                vec![TypeReference::variable("T", vec![])],
            )
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_type("   ", &[]), Err(TypeParseError::Empty));
        assert!(matches!(
            parse_type("List<String", &[]),
            Err(TypeParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse_type("List<String>>", &[]),
            Err(TypeParseError::Unexpected { .. })
        ));
        assert!(matches!(
            parse_type("Map<String; Integer>", &[]),
            Err(TypeParseError::Unexpected { .. })
        ));
    }

    #[test]
    fn test_malformed_qualified_names_rejected() {
        assert!(matches!(
            parse_type("pkg.", &[]),
            Err(TypeParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse_type("java..util.List", &[]),
            Err(TypeParseError::Unexpected { ref found, offset: 5, .. }) if found == "."
        ));
        assert!(matches!(
            parse_type(".String", &[]),
            Err(TypeParseError::Unexpected { offset: 0, .. })
        ));
        assert!(matches!(
            parse_type("java.util.List<pkg.>", &[]),
            Err(TypeParseError::Unexpected { ref found, .. }) if found == ">"
        ));
        assert_eq!(
            parse_type("java . lang . String", &[]).unwrap(),
            TypeReference::named("java.lang.String")
        );
    }

    #[test]
    fn test_display_matches_input() {
        for text in [
            "java.util.List<pkg.User>",
            "java.util.Map<K, ? super V>",
            "Comparable<?>",
            "byte[]",
        ] {
            assert_eq!(parse_type(text, &["K", "V"]).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_declaration_form() {
        let t = TypeReference::variable(
            "T",
            vec![
                TypeReference::parameterized(
                    TypeReference::named("java.lang.Comparable"),
                    vec![TypeReference::variable("T", vec![])],
                ),
                TypeReference::named("java.io.Serializable"),
            ],
        );
        assert_eq!(
            t.declaration_form(),
            "T extends java.lang.Comparable<T> & java.io.Serializable"
        );
        assert_eq!(t.to_string(), "T");
    }

    #[test]
    fn test_is_primitive() {
        assert!(TypeReference::named("int").is_primitive());
        assert!(!TypeReference::named("java.lang.Integer").is_primitive());
        assert!(!TypeReference::array(TypeReference::named("int")).is_primitive());
    }

    #[test]
    fn test_serde_shape() {
        let ty = TypeReference::array(TypeReference::named("int"));
        let json = serde_json::to_value(&ty).unwrap();
        assert_eq!(json["kind"], "array");
        assert_eq!(json["element"]["kind"], "named");
        assert_eq!(json["element"]["name"], "int");
    }
}
