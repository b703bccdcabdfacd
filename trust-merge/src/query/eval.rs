// Path expression evaluator - walks a node tree for a parsed expression.

use std::cmp::Ordering;

use super::parser::{Axis, Expr, Function, LocationPath, NodeTest, Op, Step};
use super::Hit;
use crate::node::{local_part, NodeInner, NodeRef, XmlContent};

/// Intermediate result of evaluating an expression.
#[derive(Debug, Clone)]
enum Value {
    Nodes(Vec<Hit>),
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Value {
    fn to_bool(&self) -> bool {
        match self {
            Value::Nodes(hits) => !hits.is_empty(),
            Value::Str(s) => !s.is_empty(),
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
        }
    }

    fn to_string_value(&self) -> String {
        match self {
            Value::Nodes(hits) => hits.first().map(string_value).unwrap_or_default(),
            Value::Str(s) => s.clone(),
            Value::Num(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            Value::Num(n) => *n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            other => parse_number(&other.to_string_value()),
        }
    }
}

/// Evaluation context: the current item plus its position in the step result.
struct Context<'a> {
    item: &'a Hit,
    position: usize,
    size: usize,
}

/// Evaluates a location path from `context`, returning hits in document order.
pub(crate) fn select(path: &LocationPath, context: &Hit) -> Vec<Hit> {
    let mut current = if path.absolute {
        vec![Hit::Node(NodeInner::tree_root_of_ref(context.node()))]
    } else {
        vec![context.clone()]
    };

    for step in &path.steps {
        let mut next = Vec::new();
        for hit in &current {
            next.extend(apply_step(step, hit));
        }
        current = sort_document_order(next);
    }

    current
}

/// Returns the string-value of a hit.
pub(crate) fn string_value(hit: &Hit) -> String {
    match hit {
        Hit::Attribute { value, .. } => value.clone(),
        Hit::Node(node) => {
            let node = node.borrow();
            match node.content() {
                Some(XmlContent::Comment(c)) => c.text().to_string(),
                _ => node.text_content(),
            }
        }
    }
}

fn apply_step(step: &Step, hit: &Hit) -> Vec<Hit> {
    let candidates = match hit {
        Hit::Node(node) => axis_nodes(step, node),
        Hit::Attribute { owner, .. } => match step.axis {
            Axis::SelfNode | Axis::DescendantOrSelf => vec![hit.clone()],
            Axis::Parent => vec![Hit::Node(owner.clone())],
            Axis::Child | Axis::Attribute => Vec::new(),
        },
    };

    let mut matched: Vec<Hit> = candidates
        .into_iter()
        .filter(|candidate| node_test(step, candidate))
        .collect();

    for predicate in &step.predicates {
        let size = matched.len();
        matched = matched
            .into_iter()
            .enumerate()
            .filter(|(i, item)| {
                let context = Context {
                    item,
                    position: i + 1,
                    size,
                };
                match evaluate(predicate, &context) {
                    Value::Num(n) => n == (i + 1) as f64,
                    other => other.to_bool(),
                }
            })
            .map(|(_, item)| item)
            .collect();
    }

    matched
}

fn axis_nodes(step: &Step, node: &NodeRef) -> Vec<Hit> {
    match step.axis {
        Axis::Child => node
            .borrow()
            .children()
            .iter()
            .map(|c| Hit::Node(c.clone()))
            .collect(),
        Axis::SelfNode => vec![Hit::Node(node.clone())],
        Axis::Parent => NodeInner::parent_of_ref(node)
            .map(|p| vec![Hit::Node(p)])
            .unwrap_or_default(),
        Axis::DescendantOrSelf => {
            let mut out = Vec::new();
            collect_descendants_or_self(node, &mut out);
            out
        }
        Axis::Attribute => {
            let borrowed = node.borrow();
            let Some(element) = borrowed.element() else {
                return Vec::new();
            };
            let hits = element
                .sorted_attribute_names()
                .into_iter()
                .map(|name| Hit::Attribute {
                    owner: node.clone(),
                    name: name.clone(),
                    value: element.attributes()[name].clone(),
                })
                .collect();
            hits
        }
    }
}

fn collect_descendants_or_self(node: &NodeRef, out: &mut Vec<Hit>) {
    out.push(Hit::Node(node.clone()));
    for child in node.borrow().children() {
        collect_descendants_or_self(child, out);
    }
}

fn node_test(step: &Step, hit: &Hit) -> bool {
    match hit {
        Hit::Attribute { name, .. } => match &step.test {
            NodeTest::Name(wanted) => name == wanted,
            NodeTest::AnyName | NodeTest::Node => true,
            NodeTest::Text => false,
        },
        Hit::Node(node) => {
            let node = node.borrow();
            match &step.test {
                NodeTest::Node => true,
                NodeTest::Text => matches!(node.content(), Some(XmlContent::Text(_))),
                NodeTest::AnyName => node.is_element(),
                NodeTest::Name(wanted) => node
                    .element()
                    .is_some_and(|e| e.qname() == wanted.as_str()),
            }
        }
    }
}

fn sort_document_order(hits: Vec<Hit>) -> Vec<Hit> {
    let mut keyed: Vec<((Vec<usize>, Option<String>), Hit)> = hits
        .into_iter()
        .map(|hit| {
            let key = match &hit {
                Hit::Node(node) => (NodeInner::document_order_key(node), None),
                Hit::Attribute { owner, name, .. } => {
                    (NodeInner::document_order_key(owner), Some(name.clone()))
                }
            };
            (key, hit)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.dedup_by(|a, b| a.0 == b.0);
    keyed.into_iter().map(|(_, hit)| hit).collect()
}

fn evaluate(expr: &Expr, context: &Context) -> Value {
    match expr {
        Expr::Literal(s) => Value::Str(s.clone()),
        Expr::Number(n) => Value::Num(*n),
        Expr::Path(path) => Value::Nodes(select(path, context.item)),
        Expr::Call { function, args } => call(*function, args, context),
        Expr::Binary { op, left, right } => match op {
            Op::Or => Value::Bool(
                evaluate(left, context).to_bool() || evaluate(right, context).to_bool(),
            ),
            Op::And => Value::Bool(
                evaluate(left, context).to_bool() && evaluate(right, context).to_bool(),
            ),
            _ => Value::Bool(compare(
                *op,
                &evaluate(left, context),
                &evaluate(right, context),
            )),
        },
    }
}

fn call(function: Function, args: &[Expr], context: &Context) -> Value {
    let arg = |i: usize| evaluate(&args[i], context);
    let string_arg = |i: usize| -> String {
        if args.len() > i {
            arg(i).to_string_value()
        } else {
            string_value(context.item)
        }
    };
    let first_hit = || -> Option<Hit> {
        if args.is_empty() {
            Some(context.item.clone())
        } else {
            match arg(0) {
                Value::Nodes(hits) => hits.into_iter().next(),
                _ => None,
            }
        }
    };

    match function {
        Function::Not => Value::Bool(!arg(0).to_bool()),
        Function::Position => Value::Num(context.position as f64),
        Function::Last => Value::Num(context.size as f64),
        Function::Count => match arg(0) {
            Value::Nodes(hits) => Value::Num(hits.len() as f64),
            _ => Value::Num(f64::NAN),
        },
        Function::Contains => Value::Bool(string_arg(0).contains(string_arg(1).as_str())),
        Function::StartsWith => Value::Bool(string_arg(0).starts_with(string_arg(1).as_str())),
        Function::NormalizeSpace => Value::Str(
            string_arg(0)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Function::String => Value::Str(string_arg(0)),
        Function::Name => Value::Str(first_hit().map(|h| hit_name(&h)).unwrap_or_default()),
        Function::LocalName => Value::Str(
            first_hit()
                .map(|h| local_part(&hit_name(&h)).to_string())
                .unwrap_or_default(),
        ),
        Function::True => Value::Bool(true),
        Function::False => Value::Bool(false),
    }
}

fn hit_name(hit: &Hit) -> String {
    match hit {
        Hit::Attribute { name, .. } => name.clone(),
        Hit::Node(node) => node
            .borrow()
            .element()
            .map(|e| e.qname().to_string())
            .unwrap_or_default(),
    }
}

fn compare(op: Op, left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nodes(l), Value::Nodes(r)) => l.iter().any(|a| {
            let a = string_value(a);
            r.iter()
                .any(|b| compare_atoms(op, &Value::Str(a.clone()), &Value::Str(string_value(b))))
        }),
        (Value::Nodes(hits), other) => compare_node_set(op, hits, other, false),
        (other, Value::Nodes(hits)) => compare_node_set(op, hits, other, true),
        _ => compare_atoms(op, left, right),
    }
}

fn compare_node_set(op: Op, hits: &[Hit], other: &Value, swapped: bool) -> bool {
    if let Value::Bool(_) = other {
        let set = Value::Bool(!hits.is_empty());
        return if swapped {
            compare_atoms(op, other, &set)
        } else {
            compare_atoms(op, &set, other)
        };
    }
    hits.iter().any(|hit| {
        let atom = match other {
            Value::Num(_) => Value::Num(parse_number(&string_value(hit))),
            _ => Value::Str(string_value(hit)),
        };
        if swapped {
            compare_atoms(op, other, &atom)
        } else {
            compare_atoms(op, &atom, other)
        }
    })
}

fn compare_atoms(op: Op, left: &Value, right: &Value) -> bool {
    match op {
        Op::Eq | Op::NotEq => {
            let equal = match (left, right) {
                (Value::Bool(_), _) | (_, Value::Bool(_)) => left.to_bool() == right.to_bool(),
                (Value::Num(_), _) | (_, Value::Num(_)) => left.to_number() == right.to_number(),
                _ => left.to_string_value() == right.to_string_value(),
            };
            if op == Op::Eq {
                equal
            } else {
                !equal
            }
        }
        _ => {
            let ordering = left.to_number().partial_cmp(&right.to_number());
            match (op, ordering) {
                (_, None) => false,
                (Op::Lt, Some(o)) => o == Ordering::Less,
                (Op::LtEq, Some(o)) => o != Ordering::Greater,
                (Op::Gt, Some(o)) => o == Ordering::Greater,
                (Op::GtEq, Some(o)) => o != Ordering::Less,
                _ => false,
            }
        }
    }
}

/// Parses an XPath number: optional minus, digits, optional fraction.
fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let valid = !digits.is_empty()
        && digits != "."
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1;
    if valid {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 12 "), 12.0);
        assert_eq!(parse_number("-1.5"), -1.5);
        assert!(parse_number("abc").is_nan());
        assert!(parse_number("1e3").is_nan());
        assert!(parse_number("").is_nan());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_compare_atoms() {
        assert!(compare_atoms(
            Op::Eq,
            &Value::Str("1".into()),
            &Value::Num(1.0)
        ));
        assert!(compare_atoms(
            Op::NotEq,
            &Value::Str("a".into()),
            &Value::Str("b".into())
        ));
        assert!(compare_atoms(Op::Lt, &Value::Num(1.0), &Value::Str("2".into())));
        assert!(!compare_atoms(
            Op::Lt,
            &Value::Num(1.0),
            &Value::Str("x".into())
        ));
    }
}
