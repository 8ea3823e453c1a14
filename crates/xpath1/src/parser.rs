//! A `nom`-based parser for the XPath 1.0 expression language.

use super::ast::*;
use crate::error::XPathError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, multispace0, satisfy},
    combinator::{map, not, opt, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

// --- Main Public Parser ---

/// Deepest nesting of parentheses and predicate brackets accepted.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Most operators accepted in one expression. Each operator adds a level to
/// the expression tree, which is parsed, evaluated and dropped recursively.
pub const MAX_OPERATORS: usize = 128;

pub fn parse_expression(input: &str) -> Result<Expression, XPathError> {
    check_complexity(input)?;
    match delimited(multispace0, expression, multispace0).parse(input) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(XPathError::XPathParse(
            input.to_string(),
            format!("Unexpected input at '{}'", rem),
        )),
        Err(e) => Err(XPathError::XPathParse(input.to_string(), e.to_string())),
    }
}

/// Rejects expressions whose tree would be too deep to build or walk.
///
/// This is a lexical pass: it skips string literals, tracks bracket depth and
/// counts operator tokens. Unary and binary `-` are both counted, as is a `*`
/// wildcard, so the operator count is an upper bound.
fn check_complexity(input: &str) -> Result<(), XPathError> {
    let too_complex =
        |msg: String| Err(XPathError::XPathParse(input.to_string(), msg));
    let mut depth = 0usize;
    let mut operators = 0usize;
    let mut chars = input.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            '\'' | '"' => {
                for (_, d) in chars.by_ref() {
                    if d == c {
                        break;
                    }
                }
            }
            '(' | '[' => {
                depth += 1;
                if depth > MAX_NESTING_DEPTH {
                    return too_complex(format!(
                        "Expression nests deeper than {} levels",
                        MAX_NESTING_DEPTH
                    ));
                }
            }
            ')' | ']' => depth = depth.saturating_sub(1),
            '+' | '-' | '*' | '|' | '=' | '<' | '>' => operators += 1,
            c if is_name_start_char(c) => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, d)) = chars.peek() {
                    if !is_name_char(d) {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                if matches!(&input[start..end], "and" | "or" | "div" | "mod") {
                    operators += 1;
                }
            }
            _ => {}
        }
        if operators > MAX_OPERATORS {
            return too_complex(format!(
                "Expression has more than {} operators",
                MAX_OPERATORS
            ));
        }
    }
    Ok(())
}

/// Checks whether `s` is a non-colonized XML name, as required for namespace prefixes.
pub fn is_nc_name(s: &str) -> bool {
    matches!(nc_name(s), Ok(("", _)))
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '\u{B7}')
}

/// An operator name such as `and` or `div`; it must not run on into a longer name.
fn keyword<'a>(
    word: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    terminated(tag(word), not(satisfy(is_name_char)))
}

fn build_binary_expr_parser<'a, F, G>(
    sub_expr_parser: F,
    op_parser: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = nom::error::Error<&'a str>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = nom::error::Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = sub_expr_parser.clone().parse(input)?;
        let (input, remainder) =
            many0(pair(ws(op_parser.clone()), sub_expr_parser.clone())).parse(input)?;

        for (op, right) in remainder {
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok((input, left))
    }
}

// --- Expression Parsers (in order of precedence) ---

fn expression(input: &str) -> IResult<&str, Expression> {
    or_expr(input)
}

fn or_op(input: &str) -> IResult<&str, BinaryOperator> {
    value(BinaryOperator::Or, keyword("or")).parse(input)
}

fn and_op(input: &str) -> IResult<&str, BinaryOperator> {
    value(BinaryOperator::And, keyword("and")).parse(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::NotEquals, tag("!=")),
        value(BinaryOperator::Equals, char('=')),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::LessThanOrEqual, tag("<=")),
        value(BinaryOperator::GreaterThanOrEqual, tag(">=")),
        value(BinaryOperator::LessThan, char('<')),
        value(BinaryOperator::GreaterThan, char('>')),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::Plus, char('+')),
        value(BinaryOperator::Minus, char('-')),
    ))
    .parse(input)
}

fn multiplicative_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::Multiply, char('*')),
        value(BinaryOperator::Divide, keyword("div")),
        value(BinaryOperator::Modulo, keyword("mod")),
    ))
    .parse(input)
}

fn union_op(input: &str) -> IResult<&str, BinaryOperator> {
    value(BinaryOperator::Union, char('|')).parse(input)
}

fn or_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(and_expr, or_op)(input)
}

fn and_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(equality_expr, and_op)(input)
}

fn equality_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(relational_expr, equality_op)(input)
}

fn relational_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(additive_expr, relational_op)(input)
}

fn additive_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(multiplicative_expr, additive_op)(input)
}

fn multiplicative_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(unary_expr, multiplicative_op)(input)
}

fn unary_expr(input: &str) -> IResult<&str, Expression> {
    alt((
        map(preceded(ws(char('-')), unary_expr), |expr| {
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(expr),
            }
        }),
        union_expr,
    ))
    .parse(input)
}

fn union_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(path_expr, union_op)(input)
}

/// A path is either a filter expression (a primary expression with optional
/// predicates) optionally followed by `/` steps, or a plain location path.
/// Primary expressions are tried first so that `position()` is read as a
/// function call rather than a step named `position`.
fn path_expr(input: &str) -> IResult<&str, Expression> {
    alt((filter_path, map(location_path, Expression::LocationPath))).parse(input)
}

fn filter_path(input: &str) -> IResult<&str, Expression> {
    let (i, primary) = primary_expr(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    let base = if predicates.is_empty() {
        primary
    } else {
        Expression::Filter {
            base: Box::new(primary),
            predicates,
        }
    };

    let (i, steps) = continuation_steps(i)?;
    if steps.is_empty() {
        return Ok((i, base));
    }
    Ok((
        i,
        Expression::LocationPath(LocationPath {
            start_point: Some(Box::new(base)),
            is_absolute: false,
            steps,
        }),
    ))
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    alt((
        variable_reference,
        map(number_literal, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(
            terminated(char('('), multispace0),
            expression,
            preceded(multispace0, char(')')),
        ),
    ))
    .parse(input)
}

// --- Literal Parsers ---

/// `Digits ('.' Digits?)? | '.' Digits`; XPath 1.0 has no exponent form.
fn number_literal(input: &str) -> IResult<&str, f64> {
    let digits = |s: &str| s.bytes().take_while(u8::is_ascii_digit).count();
    let whole = digits(input);
    let mut end = whole;
    if input[end..].starts_with('.') {
        let fraction = digits(&input[end + 1..]);
        if whole == 0 && fraction == 0 {
            return Err(number_error(input));
        }
        end += 1 + fraction;
    } else if whole == 0 {
        return Err(number_error(input));
    }
    let (text, rest) = input.split_at(end);
    match text.parse::<f64>() {
        Ok(n) => Ok((rest, n)),
        Err(_) => Err(number_error(input)),
    }
}

fn number_error(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
}

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

// --- Variable Reference Parser ---
fn variable_reference(input: &str) -> IResult<&str, Expression> {
    map(preceded(char('$'), recognize(q_name)), |name: &str| {
        Expression::Variable(name.to_string())
    })
    .parse(input)
}

// --- Name and NodeTest Parsers ---
fn nc_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(is_name_start_char),
        take_while(is_name_char),
    ))
    .parse(input)
}

/// Returns `(prefix, local)`.
fn q_name(input: &str) -> IResult<&str, (Option<&str>, &str)> {
    map(
        pair(nc_name, opt(preceded(char(':'), nc_name))),
        |(first, second)| match second {
            Some(local) => (Some(first), local),
            None => (None, first),
        },
    )
    .parse(input)
}

fn node_type_name(name: &str) -> Option<NodeTypeTest> {
    match name {
        "text" => Some(NodeTypeTest::Text),
        "node" => Some(NodeTypeTest::Node),
        "comment" => Some(NodeTypeTest::Comment),
        "processing-instruction" => Some(NodeTypeTest::ProcessingInstruction),
        _ => None,
    }
}

fn node_type_test(input: &str) -> IResult<&str, NodeTest> {
    let (i, name) = nc_name(input)?;
    let Some(kind) = node_type_name(name) else {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    };
    let (i, target) = delimited(
        ws(char('(')),
        opt(string_literal),
        preceded(multispace0, char(')')),
    )
    .parse(i)?;
    let test = match target {
        Some(target) if kind == NodeTypeTest::ProcessingInstruction => {
            NodeTest::ProcessingInstruction(target)
        }
        // Only processing-instruction() takes a literal.
        Some(_) => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            )));
        }
        None => NodeTest::NodeType(kind),
    };
    Ok((i, test))
}

fn node_test(input: &str) -> IResult<&str, NodeTest> {
    alt((
        node_type_test,
        value(NodeTest::Wildcard, char('*')),
        map(terminated(nc_name, tag(":*")), |prefix: &str| {
            NodeTest::NamespaceWildcard(prefix.to_string())
        }),
        map(q_name, |(prefix, local)| NodeTest::name(prefix, local)),
    ))
    .parse(input)
}

// --- Path Parsers ---
fn axis(input: &str) -> IResult<&str, Axis> {
    terminated(
        alt((
            value(Axis::AncestorOrSelf, tag("ancestor-or-self")),
            value(Axis::Ancestor, tag("ancestor")),
            value(Axis::Attribute, tag("attribute")),
            value(Axis::Child, tag("child")),
            value(Axis::DescendantOrSelf, tag("descendant-or-self")),
            value(Axis::Descendant, tag("descendant")),
            value(Axis::FollowingSibling, tag("following-sibling")),
            value(Axis::Following, tag("following")),
            value(Axis::Namespace, tag("namespace")),
            value(Axis::Parent, tag("parent")),
            value(Axis::PrecedingSibling, tag("preceding-sibling")),
            value(Axis::Preceding, tag("preceding")),
            value(Axis::SelfAxis, tag("self")),
        )),
        ws(tag("::")),
    )
    .parse(input)
}

fn predicate(input: &str) -> IResult<&str, Expression> {
    delimited(ws(char('[')), expression, preceded(multispace0, char(']'))).parse(input)
}

fn abbreviated_step(axis: Axis) -> Step {
    Step {
        axis,
        node_test: NodeTest::NodeType(NodeTypeTest::Node),
        predicates: vec![],
    }
}

fn step(input: &str) -> IResult<&str, Step> {
    alt((
        map(tag(".."), |_| abbreviated_step(Axis::Parent)),
        map(char('.'), |_| abbreviated_step(Axis::SelfAxis)),
        full_step,
    ))
    .parse(input)
}

fn full_step(input: &str) -> IResult<&str, Step> {
    let (i, axis) = opt(alt((value(Axis::Attribute, ws(char('@'))), axis))).parse(input)?;
    let (i, node_test) = node_test(i)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    Ok((
        i,
        Step {
            axis: axis.unwrap_or(Axis::Child),
            node_test,
            predicates,
        },
    ))
}

/// Zero or more `/step` or `//step` continuations; `//` expands to
/// `/descendant-or-self::node()/`.
fn continuation_steps(input: &str) -> IResult<&str, Vec<Step>> {
    let (i, remainder) = many0(pair(
        ws(alt((tag("//"), tag("/")))),
        step,
    ))
    .parse(input)?;

    let mut steps = Vec::with_capacity(remainder.len());
    for (sep, next_step) in remainder {
        if sep == "//" {
            steps.push(Step::descendant_or_self());
        }
        steps.push(next_step);
    }
    Ok((i, steps))
}

fn relative_location_path(input: &str) -> IResult<&str, Vec<Step>> {
    let (i, first) = step(input)?;
    let (i, rest) = continuation_steps(i)?;
    let mut steps = Vec::with_capacity(rest.len() + 1);
    steps.push(first);
    steps.extend(rest);
    Ok((i, steps))
}

fn location_path(input: &str) -> IResult<&str, LocationPath> {
    let absolute = |steps| LocationPath {
        start_point: None,
        is_absolute: true,
        steps,
    };

    if let Ok((rem, _)) = tag::<&str, &str, nom::error::Error<&str>>("//")(input) {
        let (rem, mut steps) = preceded(multispace0, relative_location_path).parse(rem)?;
        steps.insert(0, Step::descendant_or_self());
        return Ok((rem, absolute(steps)));
    }
    if let Ok((rem, _)) = char::<&str, nom::error::Error<&str>>('/')(input) {
        // A lone `/` selects the root.
        let (rem, steps) = opt(preceded(multispace0, relative_location_path)).parse(rem)?;
        return Ok((rem, absolute(steps.unwrap_or_default())));
    }

    let (rem, steps) = relative_location_path(input)?;
    Ok((
        rem,
        LocationPath {
            start_point: None,
            is_absolute: false,
            steps,
        },
    ))
}

// --- Function Call Parser ---
fn function_call(input: &str) -> IResult<&str, Expression> {
    let (i, name) = recognize(q_name).parse(input)?;

    // Node-type tests like text() look like calls but belong to the step parser.
    if node_type_name(name).is_some() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (i, args) = delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), expression),
        preceded(multispace0, char(')')),
    )
    .parse(i)?;

    Ok((
        i,
        Expression::FunctionCall {
            name: name.to_string(),
            args,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(prefix: Option<&str>, local: &str) -> Step {
        Step {
            axis: Axis::Child,
            node_test: NodeTest::name(prefix, local),
            predicates: vec![],
        }
    }

    fn relative(steps: Vec<Step>) -> Expression {
        Expression::LocationPath(LocationPath {
            start_point: None,
            is_absolute: false,
            steps,
        })
    }

    #[test]
    fn test_parse_simple_path() {
        let result = parse_expression("foo/bar").unwrap();
        assert_eq!(
            result,
            relative(vec![child(None, "foo"), child(None, "bar")])
        );
    }

    #[test]
    fn test_parse_srcml_count() {
        let result = parse_expression("count(//src:unit)").unwrap();
        assert_eq!(
            result,
            Expression::FunctionCall {
                name: "count".to_string(),
                args: vec![Expression::LocationPath(LocationPath {
                    start_point: None,
                    is_absolute: true,
                    steps: vec![Step::descendant_or_self(), child(Some("src"), "unit")],
                })],
            }
        );
    }

    #[test]
    fn test_parse_namespace_wildcard() {
        let result = parse_expression("cpp:*").unwrap();
        assert_eq!(
            result,
            relative(vec![Step {
                axis: Axis::Child,
                node_test: NodeTest::NamespaceWildcard("cpp".to_string()),
                predicates: vec![],
            }])
        );
    }

    #[test]
    fn test_parse_unary_minus() {
        let result = parse_expression("-5").unwrap();
        assert_eq!(
            result,
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(Expression::Number(5.0))
            }
        );

        let result2 = parse_expression("10 - -5").unwrap();
        assert_eq!(
            result2,
            Expression::BinaryOp {
                left: Box::new(Expression::Number(10.0)),
                op: BinaryOperator::Minus,
                right: Box::new(Expression::UnaryOp {
                    op: UnaryOperator::Minus,
                    expr: Box::new(Expression::Number(5.0))
                }),
            }
        );

        assert!(parse_expression("--5").is_ok());
    }

    #[test]
    fn test_parse_axes() {
        for (text, axis) in [
            ("following-sibling::foo", Axis::FollowingSibling),
            ("preceding::*", Axis::Preceding),
            ("ancestor-or-self::node()", Axis::AncestorOrSelf),
            ("namespace::*", Axis::Namespace),
            ("self :: foo", Axis::SelfAxis),
        ] {
            match parse_expression(text).unwrap() {
                Expression::LocationPath(lp) => assert_eq!(lp.steps[0].axis, axis, "{text}"),
                other => panic!("Expected location path for {text}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_abbreviated_steps() {
        let result = parse_expression("../@id").unwrap();
        assert_eq!(
            result,
            relative(vec![
                abbreviated_step(Axis::Parent),
                Step {
                    axis: Axis::Attribute,
                    node_test: NodeTest::name(None, "id"),
                    predicates: vec![],
                },
            ])
        );
        assert_eq!(
            parse_expression(".").unwrap(),
            relative(vec![abbreviated_step(Axis::SelfAxis)])
        );
    }

    #[test]
    fn test_parse_root_only() {
        assert_eq!(
            parse_expression("/").unwrap(),
            Expression::LocationPath(LocationPath {
                start_point: None,
                is_absolute: true,
                steps: vec![],
            })
        );
    }

    #[test]
    fn test_parse_path_starting_with_variable() {
        let result = parse_expression("$myVar/foo//bar").unwrap();
        assert_eq!(
            result,
            Expression::LocationPath(LocationPath {
                start_point: Some(Box::new(Expression::Variable("myVar".to_string()))),
                is_absolute: false,
                steps: vec![
                    child(None, "foo"),
                    Step::descendant_or_self(),
                    child(None, "bar"),
                ]
            })
        );
    }

    #[test]
    fn test_parse_filter_expression() {
        let result = parse_expression("(//a)[2]").unwrap();
        assert!(matches!(result, Expression::Filter { ref predicates, .. } if predicates.len() == 1));
    }

    #[test]
    fn test_parse_predicate() {
        let result = parse_expression("foo[@id = 'a']").unwrap();
        let id_attr = relative(vec![Step {
            axis: Axis::Attribute,
            node_test: NodeTest::name(None, "id"),
            predicates: vec![],
        }]);
        assert_eq!(
            result,
            relative(vec![Step {
                axis: Axis::Child,
                node_test: NodeTest::name(None, "foo"),
                predicates: vec![Expression::BinaryOp {
                    left: Box::new(id_attr),
                    op: BinaryOperator::Equals,
                    right: Box::new(Expression::Literal("a".into())),
                }]
            }])
        );
    }

    #[test]
    fn test_parse_function_in_predicate() {
        let result = parse_expression("para[position()=1]").unwrap();
        assert!(result.is_location_path());
        if let Expression::LocationPath(lp) = result {
            assert_eq!(lp.steps.len(), 1);
            assert_eq!(lp.steps[0].predicates.len(), 1);
            assert!(lp.steps[0].predicates[0].is_binary_op());
        }
    }

    #[test]
    fn test_parse_node_type_tests() {
        let result = parse_expression("foo/text()").unwrap();
        if let Expression::LocationPath(lp) = result {
            assert_eq!(lp.steps[1].node_test, NodeTest::NodeType(NodeTypeTest::Text));
        } else {
            panic!("Expected location path");
        }

        let pi = parse_expression("processing-instruction('xml-stylesheet')").unwrap();
        if let Expression::LocationPath(lp) = pi {
            assert_eq!(
                lp.steps[0].node_test,
                NodeTest::ProcessingInstruction("xml-stylesheet".to_string())
            );
        } else {
            panic!("Expected location path");
        }
    }

    #[test]
    fn test_parse_operator_precedence() {
        let result = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(
            result,
            Expression::BinaryOp {
                left: Box::new(Expression::Number(1.0)),
                op: BinaryOperator::Plus,
                right: Box::new(Expression::BinaryOp {
                    left: Box::new(Expression::Number(2.0)),
                    op: BinaryOperator::Multiply,
                    right: Box::new(Expression::Number(3.0)),
                }),
            }
        );
    }

    #[test]
    fn test_parse_boolean_logic() {
        let path = |name: &str| relative(vec![child(None, name)]);
        let eq = |l: &str, r: &str| Expression::BinaryOp {
            left: Box::new(path(l)),
            op: BinaryOperator::Equals,
            right: Box::new(path(r)),
        };

        let result = parse_expression("a = b or c = d and e = f").unwrap();
        assert_eq!(
            result,
            Expression::BinaryOp {
                left: Box::new(eq("a", "b")),
                op: BinaryOperator::Or,
                right: Box::new(Expression::BinaryOp {
                    left: Box::new(eq("c", "d")),
                    op: BinaryOperator::And,
                    right: Box::new(eq("e", "f")),
                }),
            }
        );
    }

    #[test]
    fn test_operator_names_need_word_boundaries() {
        // `order` and `divide` are element names, not `or` / `div` operators.
        assert_eq!(
            parse_expression("a or order").unwrap(),
            Expression::BinaryOp {
                left: Box::new(relative(vec![child(None, "a")])),
                op: BinaryOperator::Or,
                right: Box::new(relative(vec![child(None, "order")])),
            }
        );
        assert!(parse_expression("a divide").is_err());
        assert_eq!(
            parse_expression("div div div").unwrap(),
            Expression::BinaryOp {
                left: Box::new(relative(vec![child(None, "div")])),
                op: BinaryOperator::Divide,
                right: Box::new(relative(vec![child(None, "div")])),
            }
        );
    }

    #[test]
    fn test_multiply_versus_wildcard() {
        assert_eq!(
            parse_expression("* * *").unwrap(),
            Expression::BinaryOp {
                left: Box::new(relative(vec![Step {
                    axis: Axis::Child,
                    node_test: NodeTest::Wildcard,
                    predicates: vec![]
                }])),
                op: BinaryOperator::Multiply,
                right: Box::new(relative(vec![Step {
                    axis: Axis::Child,
                    node_test: NodeTest::Wildcard,
                    predicates: vec![]
                }])),
            }
        );
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_expression("3.25").unwrap(), Expression::Number(3.25));
        assert_eq!(parse_expression(".5").unwrap(), Expression::Number(0.5));
        assert_eq!(parse_expression("7.").unwrap(), Expression::Number(7.0));
        // No exponent and no special values: these are element names.
        assert!(parse_expression("nan").unwrap().is_location_path());
        assert!(parse_expression("1e5").is_err());
    }

    #[test]
    fn test_parse_fractions_in_operands() {
        let product = parse_expression("2 * 1.5").unwrap();
        assert_eq!(
            product,
            Expression::BinaryOp {
                left: Box::new(Expression::Number(2.0)),
                op: BinaryOperator::Multiply,
                right: Box::new(Expression::Number(1.5)),
            }
        );
        for (text, n) in [("0.5", 0.5), ("10.75", 10.75), ("(0.25)", 0.25), ("1.", 1.0)] {
            assert_eq!(parse_expression(text).unwrap(), Expression::Number(n), "{text}");
        }
        assert!(parse_expression(".").unwrap().is_location_path());
        assert!(parse_expression("1.2.3").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(
            parse_expression(&nested(MAX_NESTING_DEPTH)).unwrap(),
            Expression::Number(1.0)
        );
        assert!(matches!(
            parse_expression(&nested(MAX_NESTING_DEPTH + 1)),
            Err(XPathError::XPathParse(..))
        ));
        assert!(parse_expression(&nested(10_000)).is_err());

        let predicates = format!("a{}", "[b".repeat(10_000));
        assert!(parse_expression(&predicates).is_err());
        // Brackets inside string literals do not nest.
        let literal = format!("'{}'", "(".repeat(1_000));
        assert!(parse_expression(&literal).is_ok());
    }

    #[test]
    fn test_operator_limit() {
        let sum = |terms: usize| vec!["1"; terms].join(" + ");
        assert!(parse_expression(&sum(MAX_OPERATORS + 1)).is_ok());
        assert!(parse_expression(&sum(MAX_OPERATORS + 2)).is_err());
        assert!(parse_expression(&sum(100_000)).is_err());
        assert!(parse_expression(&format!("{}1", "-".repeat(10_000))).is_err());
        assert!(parse_expression(&vec!["a"; 1_000].join(" or ")).is_err());
        // Hyphens inside names are not operators.
        let axes = vec!["ancestor-or-self::node()"; 100].join("/");
        assert!(parse_expression(&axes).is_ok());
    }

    #[test]
    fn test_malformed_expressions_are_rejected() {
        for bad in [
            "",
            "   ",
            "count(//src:unit",
            "count(//src:unit))",
            "(1 + 2",
            "foo[1",
            "foo]",
            "1 +",
            "concat('a',)",
            "'unterminated",
            "//",
            "src:",
            "@",
            "foo::bar",
        ] {
            let err = parse_expression(bad).unwrap_err();
            assert!(
                matches!(err, XPathError::XPathParse(..)),
                "{bad:?} should be a parse error"
            );
        }
    }

    #[test]
    fn test_whitespace_between_tokens() {
        assert_eq!(
            parse_expression(" count ( //src:unit ) ").unwrap(),
            parse_expression("count(//src:unit)").unwrap()
        );
        assert_eq!(
            parse_expression("a [ 1 ] / b").unwrap(),
            parse_expression("a[1]/b").unwrap()
        );
    }

    #[test]
    fn test_is_nc_name() {
        assert!(is_nc_name("src"));
        assert!(is_nc_name("_x-1.y"));
        assert!(!is_nc_name("1x"));
        assert!(!is_nc_name("a:b"));
        assert!(!is_nc_name(""));
    }
}
