// Path expression parser - converts token streams into an AST.
// Grammar (XPath 1.0 subset):
//   expr      := or
//   or        := and ('or' and)*
//   and       := compare ('and' compare)*
//   compare   := primary (('=' | '!=' | '<' | '<=' | '>' | '>=') primary)*
//   primary   := literal | number | function '(' args ')' | '(' expr ')' | path
//   path      := ('/' | '//')? step (('/' | '//') step)*  |  '/'
//   step      := '.' | '..' | '@' (name | '*') pred* | (name | '*' | 'text()' | 'node()') pred*

use super::lexer::Token;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(String),
    Number(f64),
    Path(LocationPath),
    Call { function: Function, args: Vec<Expr> },
    Binary { op: Op, left: Box<Expr>, right: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Op {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Function {
    Not,
    Position,
    Last,
    Count,
    Contains,
    StartsWith,
    NormalizeSpace,
    String,
    Name,
    LocalName,
    True,
    False,
}

impl Function {
    fn lookup(name: &str) -> Option<Function> {
        Some(match name {
            "not" => Function::Not,
            "position" => Function::Position,
            "last" => Function::Last,
            "count" => Function::Count,
            "contains" => Function::Contains,
            "starts-with" => Function::StartsWith,
            "normalize-space" => Function::NormalizeSpace,
            "string" => Function::String,
            "name" => Function::Name,
            "local-name" => Function::LocalName,
            "true" => Function::True,
            "false" => Function::False,
            _ => return None,
        })
    }

    /// Accepted argument counts (inclusive).
    fn arity(self) -> (usize, usize) {
        match self {
            Function::Not => (1, 1),
            Function::Position | Function::Last | Function::True | Function::False => (0, 0),
            Function::Count => (1, 1),
            Function::Contains | Function::StartsWith => (2, 2),
            Function::NormalizeSpace | Function::String => (0, 1),
            Function::Name | Function::LocalName => (0, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Axis {
    Child,
    Attribute,
    SelfNode,
    Parent,
    DescendantOrSelf,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeTest {
    Name(String),
    AnyName,
    Text,
    Node,
}

pub(crate) fn parse(tokens: &[Token]) -> Result<Expr, String> {
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    let (expr, pos) = parse_or(tokens, 0)?;
    if pos != tokens.len() {
        return Err(format!("unexpected token {:?}", tokens[pos]));
    }
    Ok(expr)
}

fn is_keyword(tokens: &[Token], pos: usize, keyword: &str) -> bool {
    matches!(tokens.get(pos), Some(Token::Name(n)) if n == keyword)
}

fn parse_or(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_and(tokens, pos)?;

    while is_keyword(tokens, pos, "or") {
        let (right, new_pos) = parse_and(tokens, pos + 1)?;
        left = Expr::Binary {
            op: Op::Or,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_and(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_comparison(tokens, pos)?;

    while is_keyword(tokens, pos, "and") {
        let (right, new_pos) = parse_comparison(tokens, pos + 1)?;
        left = Expr::Binary {
            op: Op::And,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_comparison(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_primary(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Eq => Op::Eq,
            Token::NotEq => Op::NotEq,
            Token::Lt => Op::Lt,
            Token::LtEq => Op::LtEq,
            Token::Gt => Op::Gt,
            Token::GtEq => Op::GtEq,
            _ => break,
        };
        let (right, new_pos) = parse_primary(tokens, pos + 1)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_primary(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    match tokens.get(pos) {
        None => Err("unexpected end of expression".to_string()),
        Some(Token::Literal(s)) => Ok((Expr::Literal(s.clone()), pos + 1)),
        Some(Token::Number(n)) => Ok((Expr::Number(*n), pos + 1)),
        Some(Token::LParen) => {
            let (expr, pos) = parse_or(tokens, pos + 1)?;
            match tokens.get(pos) {
                Some(Token::RParen) => Ok((expr, pos + 1)),
                _ => Err("expected ')'".to_string()),
            }
        }
        Some(Token::Name(name)) if matches!(tokens.get(pos + 1), Some(Token::LParen)) => {
            if name == "text" || name == "node" {
                return parse_path(tokens, pos);
            }
            let function =
                Function::lookup(name).ok_or_else(|| format!("unknown function '{}'", name))?;
            parse_call(tokens, pos + 2, function, name)
        }
        Some(_) => parse_path(tokens, pos),
    }
}

fn parse_call(
    tokens: &[Token],
    mut pos: usize,
    function: Function,
    name: &str,
) -> Result<(Expr, usize), String> {
    let mut args = Vec::new();

    if matches!(tokens.get(pos), Some(Token::RParen)) {
        pos += 1;
    } else {
        loop {
            let (arg, new_pos) = parse_or(tokens, pos)?;
            args.push(arg);
            pos = new_pos;
            match tokens.get(pos) {
                Some(Token::Comma) => pos += 1,
                Some(Token::RParen) => {
                    pos += 1;
                    break;
                }
                _ => return Err(format!("expected ',' or ')' in call to '{}'", name)),
            }
        }
    }

    let (min, max) = function.arity();
    if args.len() < min || args.len() > max {
        return Err(format!(
            "function '{}' takes {} argument(s), got {}",
            name,
            if min == max {
                min.to_string()
            } else {
                format!("{}-{}", min, max)
            },
            args.len()
        ));
    }

    if function == Function::Count && !matches!(args[0], Expr::Path(_)) {
        return Err("count() expects a node-set".to_string());
    }

    Ok((Expr::Call { function, args }, pos))
}

fn parse_path(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let mut pos = pos;
    let mut steps = Vec::new();
    let absolute = match tokens.get(pos) {
        Some(Token::Slash) => {
            pos += 1;
            // A bare "/" selects the root
            if !starts_step(tokens.get(pos)) {
                return Ok((
                    Expr::Path(LocationPath {
                        absolute: true,
                        steps,
                    }),
                    pos,
                ));
            }
            true
        }
        Some(Token::DoubleSlash) => {
            pos += 1;
            steps.push(descendant_or_self());
            true
        }
        _ => false,
    };

    let (step, new_pos) = parse_step(tokens, pos)?;
    steps.push(step);
    pos = new_pos;

    loop {
        match tokens.get(pos) {
            Some(Token::Slash) => {
                let (step, new_pos) = parse_step(tokens, pos + 1)?;
                steps.push(step);
                pos = new_pos;
            }
            Some(Token::DoubleSlash) => {
                steps.push(descendant_or_self());
                let (step, new_pos) = parse_step(tokens, pos + 1)?;
                steps.push(step);
                pos = new_pos;
            }
            _ => break,
        }
    }

    Ok((Expr::Path(LocationPath { absolute, steps }), pos))
}

fn starts_step(token: Option<&Token>) -> bool {
    matches!(
        token,
        Some(Token::Name(_) | Token::Star | Token::At | Token::Dot | Token::DotDot)
    )
}

fn descendant_or_self() -> Step {
    Step {
        axis: Axis::DescendantOrSelf,
        test: NodeTest::Node,
        predicates: Vec::new(),
    }
}

fn parse_step(tokens: &[Token], pos: usize) -> Result<(Step, usize), String> {
    let (axis, test, mut pos) = match tokens.get(pos) {
        Some(Token::Dot) => return Ok((simple_step(Axis::SelfNode), pos + 1)),
        Some(Token::DotDot) => return Ok((simple_step(Axis::Parent), pos + 1)),
        Some(Token::At) => match tokens.get(pos + 1) {
            Some(Token::Name(n)) => (Axis::Attribute, NodeTest::Name(n.clone()), pos + 2),
            Some(Token::Star) => (Axis::Attribute, NodeTest::AnyName, pos + 2),
            _ => return Err("expected attribute name after '@'".to_string()),
        },
        Some(Token::Star) => (Axis::Child, NodeTest::AnyName, pos + 1),
        Some(Token::Name(n)) => {
            if matches!(tokens.get(pos + 1), Some(Token::LParen)) {
                let test = match n.as_str() {
                    "text" => NodeTest::Text,
                    "node" => NodeTest::Node,
                    other => return Err(format!("'{}()' is not a node test", other)),
                };
                match tokens.get(pos + 2) {
                    Some(Token::RParen) => (Axis::Child, test, pos + 3),
                    _ => return Err(format!("expected ')' after '{}('", n)),
                }
            } else {
                (Axis::Child, NodeTest::Name(n.clone()), pos + 1)
            }
        }
        Some(other) => return Err(format!("unexpected token {:?} in path", other)),
        None => return Err("path ends with '/'".to_string()),
    };

    let mut predicates = Vec::new();
    while matches!(tokens.get(pos), Some(Token::LBracket)) {
        let (predicate, new_pos) = parse_or(tokens, pos + 1)?;
        match tokens.get(new_pos) {
            Some(Token::RBracket) => pos = new_pos + 1,
            _ => return Err("expected ']'".to_string()),
        }
        predicates.push(predicate);
    }

    Ok((
        Step {
            axis,
            test,
            predicates,
        },
        pos,
    ))
}

fn simple_step(axis: Axis) -> Step {
    Step {
        axis,
        test: NodeTest::Node,
        predicates: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::lexer::tokenize;

    fn parse_str(s: &str) -> Result<Expr, String> {
        parse(&tokenize(s)?)
    }

    #[test]
    fn test_parse_absolute_path() {
        let expr = parse_str("/test/complexElement").unwrap();
        let Expr::Path(path) = expr else {
            panic!("expected path");
        };
        assert!(path.absolute);
        assert_eq!(path.steps.len(), 2);
        assert_eq!(path.steps[1].test, NodeTest::Name("complexElement".into()));
    }

    #[test]
    fn test_parse_predicates() {
        let expr = parse_str("a[@type = 'B'][2]").unwrap();
        let Expr::Path(path) = expr else {
            panic!("expected path");
        };
        assert!(!path.absolute);
        assert_eq!(path.steps[0].predicates.len(), 2);
        assert_eq!(path.steps[0].predicates[1], Expr::Number(2.0));
    }

    #[test]
    fn test_parse_double_slash() {
        let Expr::Path(path) = parse_str("//b").unwrap() else {
            panic!("expected path");
        };
        assert_eq!(path.steps[0].axis, Axis::DescendantOrSelf);
        assert_eq!(path.steps[1].test, NodeTest::Name("b".into()));
    }

    #[test]
    fn test_parse_boolean_operators() {
        let expr = parse_str("not(type = 'typeA') and @x or text()").unwrap();
        assert!(matches!(expr, Expr::Binary { op: Op::Or, .. }));
    }

    #[test]
    fn test_parse_names_that_look_like_keywords() {
        // 'and' / 'or' are only operators in operator position
        let Expr::Path(path) = parse_str("or/and").unwrap() else {
            panic!("expected path");
        };
        assert_eq!(path.steps.len(), 2);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_str("").is_err());
        assert!(parse_str("/a/").is_err());
        assert!(parse_str("a[").is_err());
        assert!(parse_str("a[1").is_err());
        assert!(parse_str("unknown(1)").is_err());
        assert!(parse_str("contains('a')").is_err());
        assert!(parse_str("count('a')").is_err());
        assert!(parse_str("a b").is_err());
        assert!(parse_str("@").is_err());
    }
}
