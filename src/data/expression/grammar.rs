// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

use crate::data::expression::ast::{BinaryOp, Expr, ExprVar, UnaryOp};
use crate::data::expression::Value;

peg::parser! {
    grammar bulletml_expression() for str {
        rule ws() = quiet!{ [' ' | '\t' | '\r' | '\n']* }

        rule number() -> Value
            = n:$(['0'..='9']+ ("." ['0'..='9']*)?) {? n.parse().or(Err("number")) }
            / n:$("." ['0'..='9']+) {? n.parse().or(Err("number")) }

        rule variable() -> ExprVar
            = "$" name:$(['a'..='z' | 'A'..='Z' | '0'..='9' | '_']+) { ExprVar::from_name(name) }

        rule factor() -> Expr
            = "-" ws() e:factor() { Expr::unary(UnaryOp::Negate, e) }
            / "+" ws() e:factor() { e }
            / "(" ws() e:sum() ws() ")" { e }
            / v:variable() { Expr::Var(v) }
            / f:number() { Expr::Float(f) }

        rule product_op() -> BinaryOp
            = "*" { BinaryOp::Mul }
            / "/" { BinaryOp::Div }
            / "%" { BinaryOp::Mod }

        rule product() -> Expr
            = first:factor() rest:(ws() op:product_op() ws() e:factor() { (op, e) })* {
                Expr::chain(first, rest)
            }

        rule sum_op() -> BinaryOp
            = "+" { BinaryOp::Add }
            / "-" { BinaryOp::Sub }

        rule sum() -> Expr
            = first:product() rest:(ws() op:sum_op() ws() e:product() { (op, e) })* {
                Expr::chain(first, rest)
            }

        pub rule expression() -> Expr
            = ws() e:sum() ws() { e }
    }
}

pub use self::bulletml_expression::expression;

#[cfg(test)]
mod test {
    use crate::data::expression::ast::{BinaryOp, Expr, ExprVar, UnaryOp};
    use crate::data::expression::grammar;
    use crate::data::expression::Value;

    #[test]
    fn test_parse_paren_mismatch_fail() {
        let err = grammar::expression("(").unwrap_err();

        assert_eq!(err.location.line, 1);
        assert_eq!(err.location.column, 2);
        assert_eq!(err.location.offset, 1);
    }

    #[test]
    fn test_parse_lonely_binop_fail() {
        let err = grammar::expression("*").unwrap_err();

        assert_eq!(err.location.line, 1);
        assert_eq!(err.location.column, 1);
        assert_eq!(err.location.offset, 0);
    }

    #[test]
    fn test_parse_lonely_sign_fail() {
        let err = grammar::expression("+").unwrap_err();

        assert_eq!(err.location.offset, 1);
    }

    #[test]
    fn test_parse_half_binop_fail() {
        let err = grammar::expression("4+").unwrap_err();

        assert_eq!(err.location.line, 1);
        assert_eq!(err.location.column, 3);
        assert_eq!(err.location.offset, 2);
    }

    fn check_literal(actual: Expr, expected: Value) {
        check_literal_ref(&actual, expected);
    }

    fn check_literal_ref(actual: &Expr, expected: Value) {
        if let Expr::Float(actual) = *actual {
            assert_eq!(actual, expected);
        } else {
            panic!("did not parse a float: {:?}", actual);
        }
    }

    #[test]
    fn test_parse_literal() {
        let res = grammar::expression("4").unwrap();

        check_literal(res, 4.);
    }

    #[test]
    fn test_parse_literal_float() {
        let res = grammar::expression("4.").unwrap();

        check_literal(res, 4.);
    }

    #[test]
    fn test_parse_literal_float_implicit_zero() {
        let res = grammar::expression(".5").unwrap();

        check_literal(res, 0.5);
    }

    #[test]
    fn test_parse_literal_float_decimals() {
        let res = grammar::expression("4.5").unwrap();

        check_literal(res, 4.5);
    }

    #[test]
    fn test_parse_literal_whitespace() {
        let res = grammar::expression("  \n4.5\t").unwrap();

        check_literal(res, 4.5);
    }

    fn check_binop(actual: Expr, op: BinaryOp, lhs: Value, rhs: Value) {
        if let Expr::Binary {
            op: aop,
            lhs: alhs,
            rhs: arhs,
        } = actual
        {
            assert_eq!(aop, op);
            check_literal_ref(alhs.as_ref(), lhs);
            check_literal_ref(arhs.as_ref(), rhs);
        } else {
            panic!("did not parse a binary operation: {:?}", actual);
        }
    }

    #[test]
    fn test_parse_binary_ops() {
        let res = grammar::expression("4+2").unwrap();
        check_binop(res, BinaryOp::Add, 4., 2.);

        let res = grammar::expression("4-2").unwrap();
        check_binop(res, BinaryOp::Sub, 4., 2.);

        let res = grammar::expression("4*2").unwrap();
        check_binop(res, BinaryOp::Mul, 4., 2.);

        let res = grammar::expression("4/2").unwrap();
        check_binop(res, BinaryOp::Div, 4., 2.);

        let res = grammar::expression("4 % 2").unwrap();
        check_binop(res, BinaryOp::Mod, 4., 2.);
    }

    #[test]
    fn test_parse_precedence() {
        let res = grammar::expression("1+2*3").unwrap();

        if let Expr::Binary {
            op: BinaryOp::Add,
            lhs,
            rhs,
        } = res
        {
            check_literal_ref(lhs.as_ref(), 1.);
            check_binop(*rhs, BinaryOp::Mul, 2., 3.);
        } else {
            panic!("did not parse an addition: {:?}", res);
        }
    }

    #[test]
    fn test_parse_left_associative() {
        let res = grammar::expression("8-4-2").unwrap();

        if let Expr::Binary {
            op: BinaryOp::Sub,
            lhs,
            rhs,
        } = res
        {
            check_binop(*lhs, BinaryOp::Sub, 8., 4.);
            check_literal_ref(rhs.as_ref(), 2.);
        } else {
            panic!("did not parse a subtraction: {:?}", res);
        }
    }

    fn check_unaryop(actual: Expr, op: UnaryOp, expected: Value) {
        if let Expr::Unary {
            op: aop,
            expr: aexpr,
        } = actual
        {
            assert_eq!(aop, op);
            check_literal_ref(aexpr.as_ref(), expected);
        } else {
            panic!("did not parse an unary operation: {:?}", actual);
        }
    }

    #[test]
    fn test_parse_unary_ops() {
        let res = grammar::expression("-4").unwrap();
        check_unaryop(res, UnaryOp::Negate, 4.);

        let res = grammar::expression("+4").unwrap();
        check_literal(res, 4.);
    }

    fn check_variable(actual: Expr, expected: ExprVar) {
        if let Expr::Var(actual) = actual {
            assert_eq!(actual, expected);
        } else {
            panic!("did not parse a variable: {:?}", actual);
        }
    }

    #[test]
    fn test_parse_rank() {
        let res = grammar::expression("$rank").unwrap();
        check_variable(res, ExprVar::Rank);
    }

    #[test]
    fn test_parse_rand() {
        let res = grammar::expression("$rand").unwrap();
        check_variable(res, ExprVar::Rand);
    }

    #[test]
    fn test_parse_param() {
        let res = grammar::expression("$1").unwrap();
        check_variable(res, ExprVar::Param(1));

        let res = grammar::expression("$10").unwrap();
        check_variable(res, ExprVar::Param(10));
    }

    #[test]
    fn test_parse_variable() {
        let res = grammar::expression("$var").unwrap();
        check_variable(res, ExprVar::Named("var".into()));
    }

    #[test]
    fn test_parse_rank_trailing() {
        let res = grammar::expression("$rankvar").unwrap();
        check_variable(res, ExprVar::Named("rankvar".into()));
    }

    #[test]
    fn test_parse_rand_trailing() {
        let res = grammar::expression("$randvar").unwrap();
        check_variable(res, ExprVar::Named("randvar".into()));
    }
}
