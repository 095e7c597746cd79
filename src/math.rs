//! Structural math representation and MathML emission.
//!
//! Source items carry math as a structural tree, never as formula-syntax
//! strings. Normalization rewrites legacy constructs into the explicit form
//! (fenced groups become rows with literal delimiter operators) while
//! preserving every operator, fraction, exponent and inequality.

use serde::Deserialize;

use crate::error::{BannedConstruct, BannedConstructError};

pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";

/// A structural math node.
///
/// The set is closed: emission handles every variant, and `Fenced` never
/// survives normalization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MathNode {
    /// Horizontal run of children.
    Row { children: Vec<MathNode> },
    /// A variable or symbolic name.
    Identifier { text: String },
    /// A numeric literal.
    Number { text: String },
    /// An operator character (`+`, `=`, `<`, `≥`, ...), kept raw and escaped
    /// only at emission.
    Operator { text: String },
    /// Plain words inside math.
    Text { text: String },
    Fraction {
        numerator: Box<MathNode>,
        denominator: Box<MathNode>,
    },
    /// Base with superscript exponent.
    Power {
        base: Box<MathNode>,
        exponent: Box<MathNode>,
    },
    Subscript {
        base: Box<MathNode>,
        subscript: Box<MathNode>,
    },
    Sqrt { radicand: Box<MathNode> },
    Root {
        radicand: Box<MathNode>,
        index: Box<MathNode>,
    },
    /// Legacy delimited group (`<mfenced>` equivalent). Accepted on input,
    /// rewritten by [`normalize`]; emission refuses it.
    Fenced {
        open: String,
        close: String,
        #[serde(default)]
        separator: Option<String>,
        children: Vec<MathNode>,
    },
}

/// Rewrite legacy constructs into explicit structure.
///
/// `Fenced { open, close, sep, c1..cn }` becomes
/// `Row [ Operator(open), c1, Operator(sep), c2, ..., cn, Operator(close) ]`.
/// Everything else is rebuilt recursively, content-preserving.
pub fn normalize(node: MathNode) -> MathNode {
    match node {
        MathNode::Fenced {
            open,
            close,
            separator,
            children,
        } => {
            let sep = separator.unwrap_or_else(|| ",".to_string());
            let n = children.len();
            let mut out = Vec::with_capacity(n * 2 + 2);
            if !open.is_empty() {
                out.push(MathNode::Operator { text: open });
            }
            for (i, child) in children.into_iter().enumerate() {
                if i > 0 && !sep.is_empty() {
                    out.push(MathNode::Operator { text: sep.clone() });
                }
                out.push(normalize(child));
            }
            if !close.is_empty() {
                out.push(MathNode::Operator { text: close });
            }
            MathNode::Row { children: out }
        }
        MathNode::Row { children } => MathNode::Row {
            children: children.into_iter().map(normalize).collect(),
        },
        MathNode::Fraction {
            numerator,
            denominator,
        } => MathNode::Fraction {
            numerator: Box::new(normalize(*numerator)),
            denominator: Box::new(normalize(*denominator)),
        },
        MathNode::Power { base, exponent } => MathNode::Power {
            base: Box::new(normalize(*base)),
            exponent: Box::new(normalize(*exponent)),
        },
        MathNode::Subscript { base, subscript } => MathNode::Subscript {
            base: Box::new(normalize(*base)),
            subscript: Box::new(normalize(*subscript)),
        },
        MathNode::Sqrt { radicand } => MathNode::Sqrt {
            radicand: Box::new(normalize(*radicand)),
        },
        MathNode::Root { radicand, index } => MathNode::Root {
            radicand: Box::new(normalize(*radicand)),
            index: Box::new(normalize(*index)),
        },
        leaf => leaf,
    }
}

/// Reject banned constructs anywhere in the tree.
///
/// `field` is the path reported in the error (e.g. `"body[2].math"`).
pub fn check(node: &MathNode, field: &str) -> Result<(), BannedConstructError> {
    match node {
        MathNode::Fenced { .. } => Err(BannedConstructError {
            field: field.to_string(),
            construct: BannedConstruct::Mfenced,
        }),
        MathNode::Identifier { text } | MathNode::Text { text } | MathNode::Number { text } => {
            check_leaf_text(text, field)
        }
        MathNode::Operator { text } => {
            check_leaf_text(text, field)?;
            // Operators hold the raw character; entity text means the source
            // was escaped upstream and would double-escape at emission.
            if text.contains('&') {
                return Err(BannedConstructError {
                    field: field.to_string(),
                    construct: BannedConstruct::PreEscapedEntity(text.clone()),
                });
            }
            // Comparison characters are legitimate operators ("<", ">=", ...);
            // anything longer carrying angle brackets is markup leakage.
            if text.chars().count() > 2 && (text.contains('<') || text.contains('>')) {
                return Err(BannedConstructError {
                    field: field.to_string(),
                    construct: BannedConstruct::RawMarkup(text.clone()),
                });
            }
            Ok(())
        }
        MathNode::Row { children } => {
            for child in children {
                check(child, field)?;
            }
            Ok(())
        }
        MathNode::Fraction {
            numerator,
            denominator,
        } => {
            check(numerator, field)?;
            check(denominator, field)
        }
        MathNode::Power { base, exponent } => {
            check(base, field)?;
            check(exponent, field)
        }
        MathNode::Subscript { base, subscript } => {
            check(base, field)?;
            check(subscript, field)
        }
        MathNode::Sqrt { radicand } => check(radicand, field),
        MathNode::Root { radicand, index } => {
            check(radicand, field)?;
            check(index, field)
        }
    }
}

fn check_leaf_text(text: &str, field: &str) -> Result<(), BannedConstructError> {
    if let Some(cmd) = find_latex_leakage(text) {
        return Err(BannedConstructError {
            field: field.to_string(),
            construct: BannedConstruct::LatexLeakage(cmd),
        });
    }
    Ok(())
}

/// Detect formula-syntax leakage in a text leaf: backslash commands
/// (`\frac`, `\sqrt`, ...) and `$` fences.
pub fn find_latex_leakage(text: &str) -> Option<String> {
    if text.contains('$') {
        return Some("$".to_string());
    }
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\\' {
            let rest: String = text[i + 1..]
                .chars()
                .take_while(|c| c.is_ascii_alphabetic())
                .collect();
            if !rest.is_empty() {
                return Some(format!("\\{rest}"));
            }
        }
    }
    None
}

/// Emit the node as MathML into `out`.
///
/// Expects a normalized tree; a surviving `Fenced` is a caller bug upstream
/// and is reported as a banned construct rather than emitted.
pub fn emit_mathml(node: &MathNode, out: &mut String) -> Result<(), BannedConstructError> {
    match node {
        MathNode::Row { children } => {
            out.push_str("<mrow>");
            for child in children {
                emit_mathml(child, out)?;
            }
            out.push_str("</mrow>");
        }
        MathNode::Identifier { text } => emit_leaf(out, "mi", text),
        MathNode::Number { text } => emit_leaf(out, "mn", text),
        MathNode::Operator { text } => emit_leaf(out, "mo", text),
        MathNode::Text { text } => emit_leaf(out, "mtext", text),
        MathNode::Fraction {
            numerator,
            denominator,
        } => {
            out.push_str("<mfrac>");
            emit_mathml(numerator, out)?;
            emit_mathml(denominator, out)?;
            out.push_str("</mfrac>");
        }
        MathNode::Power { base, exponent } => {
            out.push_str("<msup>");
            emit_mathml(base, out)?;
            emit_mathml(exponent, out)?;
            out.push_str("</msup>");
        }
        MathNode::Subscript { base, subscript } => {
            out.push_str("<msub>");
            emit_mathml(base, out)?;
            emit_mathml(subscript, out)?;
            out.push_str("</msub>");
        }
        MathNode::Sqrt { radicand } => {
            out.push_str("<msqrt>");
            emit_mathml(radicand, out)?;
            out.push_str("</msqrt>");
        }
        MathNode::Root { radicand, index } => {
            out.push_str("<mroot>");
            emit_mathml(radicand, out)?;
            emit_mathml(index, out)?;
            out.push_str("</mroot>");
        }
        MathNode::Fenced { .. } => {
            return Err(BannedConstructError {
                field: "math".to_string(),
                construct: BannedConstruct::Mfenced,
            });
        }
    }
    Ok(())
}

/// Emit a complete `<math>` element in the MathML namespace.
pub fn emit_math_element(node: &MathNode, out: &mut String) -> Result<(), BannedConstructError> {
    out.push_str(&format!("<math xmlns=\"{MATHML_NS}\">"));
    emit_mathml(node, out)?;
    out.push_str("</math>");
    Ok(())
}

fn emit_leaf(out: &mut String, tag: &str, text: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&crate::svg::escape_xml(text));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(s: &str) -> MathNode {
        MathNode::Identifier {
            text: s.to_string(),
        }
    }

    fn num(s: &str) -> MathNode {
        MathNode::Number {
            text: s.to_string(),
        }
    }

    #[test]
    fn test_normalize_fenced_to_explicit_delimiters() {
        let fenced = MathNode::Fenced {
            open: "(".to_string(),
            close: ")".to_string(),
            separator: Some(",".to_string()),
            children: vec![ident("x"), ident("y")],
        };

        let normalized = normalize(fenced);
        match &normalized {
            MathNode::Row { children } => {
                assert_eq!(children.len(), 5);
                assert_eq!(
                    children[0],
                    MathNode::Operator {
                        text: "(".to_string()
                    }
                );
                assert_eq!(
                    children[2],
                    MathNode::Operator {
                        text: ",".to_string()
                    }
                );
                assert_eq!(
                    children[4],
                    MathNode::Operator {
                        text: ")".to_string()
                    }
                );
            }
            other => panic!("expected Row, got {other:?}"),
        }

        // The rewritten form passes the banned-construct check.
        assert!(check(&normalized, "test").is_ok());
    }

    #[test]
    fn test_normalize_recurses_into_fractions() {
        let node = MathNode::Fraction {
            numerator: Box::new(MathNode::Fenced {
                open: "(".to_string(),
                close: ")".to_string(),
                separator: None,
                children: vec![ident("a")],
            }),
            denominator: Box::new(num("2")),
        };

        let normalized = normalize(node);
        assert!(check(&normalized, "test").is_ok());
    }

    #[test]
    fn test_unnormalized_fenced_is_banned() {
        let fenced = MathNode::Fenced {
            open: "(".to_string(),
            close: ")".to_string(),
            separator: None,
            children: vec![ident("x")],
        };
        let err = check(&fenced, "body[0].math").unwrap_err();
        assert_eq!(err.construct, BannedConstruct::Mfenced);
        assert_eq!(err.field, "body[0].math");
    }

    #[test]
    fn test_latex_leakage_rejected() {
        let node = MathNode::Text {
            text: "\\frac{1}{2}".to_string(),
        };
        let err = check(&node, "f").unwrap_err();
        assert!(matches!(err.construct, BannedConstruct::LatexLeakage(ref s) if s == "\\frac"));

        let node = MathNode::Text {
            text: "the cost is $4".to_string(),
        };
        assert!(check(&node, "f").is_err());
    }

    #[test]
    fn test_operator_entity_text_rejected() {
        let node = MathNode::Operator {
            text: "&lt;".to_string(),
        };
        let err = check(&node, "f").unwrap_err();
        assert!(matches!(
            err.construct,
            BannedConstruct::PreEscapedEntity(_)
        ));

        // The raw character is what operators must hold.
        let node = MathNode::Operator {
            text: "<".to_string(),
        };
        assert!(check(&node, "f").is_ok());
        let node = MathNode::Operator {
            text: ">=".to_string(),
        };
        assert!(check(&node, "f").is_ok());
    }

    #[test]
    fn test_markup_shaped_operator_rejected() {
        let node = MathNode::Operator {
            text: "<span>".to_string(),
        };
        let err = check(&node, "f").unwrap_err();
        assert!(matches!(err.construct, BannedConstruct::RawMarkup(_)));
    }

    #[test]
    fn test_emit_escapes_operators() {
        let node = MathNode::Row {
            children: vec![
                ident("x"),
                MathNode::Operator {
                    text: "<".to_string(),
                },
                num("5"),
            ],
        };
        let mut out = String::new();
        emit_mathml(&node, &mut out).unwrap();
        assert_eq!(out, "<mrow><mi>x</mi><mo>&lt;</mo><mn>5</mn></mrow>");
    }

    #[test]
    fn test_emit_fraction_power() {
        let node = MathNode::Fraction {
            numerator: Box::new(MathNode::Power {
                base: Box::new(ident("x")),
                exponent: Box::new(num("2")),
            }),
            denominator: Box::new(num("3")),
        };
        let mut out = String::new();
        emit_mathml(&node, &mut out).unwrap();
        assert_eq!(
            out,
            "<mfrac><msup><mi>x</mi><mn>2</mn></msup><mn>3</mn></mfrac>"
        );
    }

    #[test]
    fn test_parse_math_json() {
        let json = r###"{
            "type": "fraction",
            "numerator": { "type": "identifier", "text": "a" },
            "denominator": { "type": "number", "text": "4" }
        }"###;
        let node: MathNode = serde_json::from_str(json).unwrap();
        assert!(matches!(node, MathNode::Fraction { .. }));
    }
}
