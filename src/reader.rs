//! Reading source text into values.
//!
//! Reading happens in two phases. The tokenizer chops the input into an
//! ordered sequence of token slices borrowing from the input: delimiters,
//! reader-macro prefixes, string literals (quotes included) and atom text.
//! The parser then walks that sequence through a [`Reader`] cursor,
//! building the value tree by recursive descent and desugaring reader
//! macros into their list forms.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, one_of},
    combinator::recognize,
};

use crate::ReadError;
use crate::ast::{NumberType, Value, keyword};
use std::collections::HashMap;

/// Single-character tokens. `~` is listed here but `~@` wins when the
/// tilde is followed by an at-sign.
const SPECIAL_TOKEN_CHARS: &str = "[]{}()'`~^@";

/// Commas count as whitespace between forms
fn is_form_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | ',')
}

/// A string token, surrounding quotes included. A backslash consumes the
/// following character verbatim; unescaping happens later in `read_atom`.
/// Reaching end of input before the closing quote is a hard failure.
fn string_token(input: &str) -> IResult<&str, &str> {
    let (body, _) = char('"').parse(input)?;
    let mut chars = body.char_indices();
    while let Some((offset, ch)) = chars.next() {
        match ch {
            '"' => {
                let len = 1 + offset + ch.len_utf8();
                return Ok((&input[len..], &input[..len]));
            }
            '\\' => {
                chars.next();
            }
            _ => {}
        }
    }
    Err(nom::Err::Failure(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

/// Atom text: everything up to the next whitespace, delimiter, quote or
/// comment start
fn atom_token(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| {
        !is_form_whitespace(c) && !SPECIAL_TOKEN_CHARS.contains(c) && c != '"' && c != ';'
    })
    .parse(input)
}

/// One token from the head of the input
fn token(input: &str) -> IResult<&str, &str> {
    alt((
        tag("~@"),
        recognize(one_of(SPECIAL_TOKEN_CHARS)),
        string_token,
        atom_token,
    ))
    .parse(input)
}

/// Split the input into tokens, skipping whitespace and comments.
///
/// Comments start at `;` and run to the end of the line.
pub(crate) fn tokenize(input: &str) -> Result<Vec<&str>, ReadError> {
    let mut tokens = Vec::new();
    let mut rest = input;
    loop {
        rest = rest.trim_start_matches(is_form_whitespace);
        if rest.is_empty() {
            break;
        }
        if let Some(comment) = rest.strip_prefix(';') {
            rest = match comment.find('\n') {
                Some(end) => &comment[end + 1..],
                None => "",
            };
            continue;
        }
        match token(rest) {
            Ok((after, tok)) => {
                tokens.push(tok);
                rest = after;
            }
            // The only input the token alternatives reject outright is a
            // string opened but never closed
            Err(_) => return Err(ReadError::UnfinishedQuote),
        }
    }
    Ok(tokens)
}

/// Cursor over the token sequence
pub(crate) struct Reader<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(tokens: Vec<&'a str>) -> Self {
        Reader { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<&'a str> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }
}

/// Parse one complete form from the input.
///
/// Tokens after the first form are ignored; the REPL feeds one line at a
/// time and a line holds one form.
pub fn read_str(input: &str) -> Result<Value, ReadError> {
    let tokens = tokenize(input)?;
    log::trace!("tokens: {tokens:?}");
    let mut reader = Reader::new(tokens);
    read_form(&mut reader)
}

fn read_form(reader: &mut Reader) -> Result<Value, ReadError> {
    let tok = reader.peek().ok_or(ReadError::Underflow)?;
    match tok {
        "(" => {
            reader.next();
            Ok(Value::List(read_seq(reader, ")")?))
        }
        "[" => {
            reader.next();
            Ok(Value::Vector(read_seq(reader, "]")?))
        }
        "{" => {
            reader.next();
            read_map(reader)
        }
        ")" | "]" | "}" => Err(ReadError::UnbalancedParenthesis),
        "'" => read_macro(reader, "quote"),
        "`" => read_macro(reader, "quasiquote"),
        "~" => read_macro(reader, "unquote"),
        "~@" => read_macro(reader, "splice-unquote"),
        "@" => read_macro(reader, "deref"),
        "^" => read_with_meta(reader),
        atom => {
            reader.next();
            Ok(read_atom(atom))
        }
    }
}

/// Desugar a one-form reader macro into `(symbol form)`
fn read_macro(reader: &mut Reader, symbol: &str) -> Result<Value, ReadError> {
    reader.next();
    let form = read_form(reader)?;
    Ok(Value::List(vec![Value::Symbol(symbol.to_owned()), form]))
}

/// `^meta target` desugars to `(with-meta target meta)`: the metadata is
/// written first but applied second
fn read_with_meta(reader: &mut Reader) -> Result<Value, ReadError> {
    reader.next();
    let meta = read_form(reader)?;
    let target = read_form(reader)?;
    Ok(Value::List(vec![
        Value::Symbol("with-meta".to_owned()),
        target,
        meta,
    ]))
}

/// Forms until the matching closing delimiter
fn read_seq(reader: &mut Reader, closer: &str) -> Result<Vec<Value>, ReadError> {
    let mut items = Vec::new();
    loop {
        match reader.peek() {
            None => return Err(ReadError::UnbalancedParenthesis),
            Some(tok) if tok == closer => {
                reader.next();
                return Ok(items);
            }
            Some(_) => items.push(read_form(reader)?),
        }
    }
}

/// `{k1 v1 k2 v2 ...}` with string or keyword keys
fn read_map(reader: &mut Reader) -> Result<Value, ReadError> {
    let forms = read_seq(reader, "}")?;
    if forms.len() % 2 != 0 {
        return Err(ReadError::UnevenHashMap);
    }
    let mut entries = HashMap::with_capacity(forms.len() / 2);
    let mut forms = forms.into_iter();
    while let (Some(key), Some(value)) = (forms.next(), forms.next()) {
        match key {
            Value::String(key) => {
                entries.insert(key, value);
            }
            _ => return Err(ReadError::KeyIsNotString),
        }
    }
    Ok(Value::HashMap(entries))
}

/// Classify a non-structural token
fn read_atom(token: &str) -> Value {
    match token {
        "nil" => Value::Nil,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        // Bare + and - are the arithmetic symbols, not number prefixes
        "+" | "-" => Value::Symbol(token.to_owned()),
        _ => {
            if let Ok(n) = token.parse::<NumberType>() {
                return Value::Number(n);
            }
            if let Some(body) = token.strip_prefix('"') {
                return Value::String(unescape(body.strip_suffix('"').unwrap_or(body)));
            }
            if let Some(name) = token.strip_prefix(':') {
                return keyword(name);
            }
            Value::Symbol(token.to_owned())
        }
    }
}

/// Resolve the escape sequences the printer emits: `\n`, `\"` and `\\`.
/// Any other escaped character is kept verbatim, backslash included.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{KEYWORD_MARKER, sym, val};
    use crate::printer::pr_str;

    /// Test result variants for comprehensive reading tests
    #[derive(Debug)]
    enum ReadTestResult {
        Success(Value),        // Reading should succeed with this value
        Failure(ReadError),    // Reading should fail with exactly this error
    }
    use ReadTestResult::*;

    /// Helper for successful read test cases
    fn success<T: Into<Value>>(value: T) -> ReadTestResult {
        Success(value.into())
    }

    /// Run read tests with per-case ids and round-trip validation
    fn run_read_tests(test_cases: Vec<(&str, ReadTestResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Read test #{}", i + 1);
            match (read_str(input), expected) {
                (Ok(actual), Success(expected_val)) => {
                    assert_eq!(actual, *expected_val, "{test_id}: value mismatch for '{input}'");

                    // Round-trip: printing readably and re-reading must
                    // yield a structurally equal value
                    let displayed = pr_str(&actual, true);
                    let reparsed = read_str(&displayed).unwrap_or_else(|e| {
                        panic!("{test_id}: round-trip read failed for '{displayed}': {e:?}")
                    });
                    assert_eq!(
                        reparsed, actual,
                        "{test_id}: round-trip value mismatch for '{input}'"
                    );
                }
                (Err(err), Failure(expected_err)) => {
                    assert_eq!(
                        err, *expected_err,
                        "{test_id}: error kind mismatch for '{input}'"
                    );
                }
                (Ok(actual), Failure(expected_err)) => {
                    panic!("{test_id}: expected {expected_err:?}, got {actual:?}");
                }
                (Err(err), Success(expected_val)) => {
                    panic!("{test_id}: expected {expected_val:?}, got error {err:?}");
                }
            }
        }
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_reader_comprehensive() {
        let test_cases = vec![
            // ===== NUMBERS =====
            ("42", success(42)),
            ("-5", success(-5)),
            ("0", success(0)),
            ("9223372036854775807", success(i64::MAX)),
            ("-9223372036854775808", success(i64::MIN)),
            // ===== NIL AND BOOLEANS =====
            ("nil", Success(Value::Nil)),
            ("true", success(true)),
            ("false", success(false)),
            // ===== SYMBOLS =====
            ("foo", success(sym("foo"))),
            ("+", success(sym("+"))),
            ("-", success(sym("-"))),
            (">=", success(sym(">="))),
            ("empty?", success(sym("empty?"))),
            ("fn*", success(sym("fn*"))),
            // A failed number parse falls through to symbol
            ("12abc", success(sym("12abc"))),
            // ===== STRINGS =====
            ("\"hello\"", success("hello")),
            ("\"hello world\"", success("hello world")),
            ("\"\"", success("")),
            (r#""a\nb""#, success("a\nb")),
            (r#""say \"hi\"""#, success("say \"hi\"")),
            (r#""back\\slash""#, success("back\\slash")),
            // Unknown escapes stay verbatim
            (r#""a\tb""#, success("a\\tb")),
            // A string may contain delimiters and comment starts
            ("\"(; not a comment)\"", success("(; not a comment)")),
            // ===== KEYWORDS =====
            (":kw", Success(keyword("kw"))),
            (":a-b?", Success(keyword("a-b?"))),
            // ===== LISTS =====
            ("()", success(Vec::<Value>::new())),
            ("(1 2 3)", success([1, 2, 3])),
            ("( + 1 2 )", success(vec![sym("+"), val(1), val(2)])),
            (
                "(+ 1 (* 2 3))",
                success(vec![
                    sym("+"),
                    val(1),
                    val(vec![sym("*"), val(2), val(3)]),
                ]),
            ),
            // Commas are whitespace
            ("(1, 2,, 3)", success([1, 2, 3])),
            // ===== VECTORS =====
            ("[]", Success(Value::Vector(vec![]))),
            ("[1 2]", Success(Value::Vector(vec![val(1), val(2)]))),
            (
                "[1 [2 3]]",
                Success(Value::Vector(vec![
                    val(1),
                    Value::Vector(vec![val(2), val(3)]),
                ])),
            ),
            // ===== HASH MAPS =====
            ("{}", Success(Value::HashMap(HashMap::new()))),
            (
                "{\"a\" 1}",
                Success(Value::HashMap(HashMap::from([("a".to_owned(), val(1))]))),
            ),
            (
                "{:b (1 2)}",
                Success(Value::HashMap(HashMap::from([(
                    format!("{KEYWORD_MARKER}b"),
                    val([1, 2]),
                )]))),
            ),
            (
                "{\"a\" 1 :b 2}",
                Success(Value::HashMap(HashMap::from([
                    ("a".to_owned(), val(1)),
                    (format!("{KEYWORD_MARKER}b"), val(2)),
                ]))),
            ),
            // ===== READER MACROS =====
            ("'a", success(vec![sym("quote"), sym("a")])),
            ("'(1 2)", success(vec![sym("quote"), val([1, 2])])),
            ("`a", success(vec![sym("quasiquote"), sym("a")])),
            ("~a", success(vec![sym("unquote"), sym("a")])),
            ("~@a", success(vec![sym("splice-unquote"), sym("a")])),
            ("@a", success(vec![sym("deref"), sym("a")])),
            ("''a", success(vec![
                sym("quote"),
                val(vec![sym("quote"), sym("a")]),
            ])),
            // Metadata is written first but lands second in the list
            (
                "^{\"m\" 1} [1 2]",
                success(vec![
                    sym("with-meta"),
                    Value::Vector(vec![val(1), val(2)]),
                    Value::HashMap(HashMap::from([("m".to_owned(), val(1))])),
                ]),
            ),
            // ===== COMMENTS =====
            ("(+ 1 2) ; trailing", success(vec![sym("+"), val(1), val(2)])),
            ("; leading\n42", success(42)),
            // ===== WHITESPACE =====
            ("  42  ", success(42)),
            ("\t(1\n2)\r", success([1, 2])),
            // ===== FAILURES =====
            ("(", Failure(ReadError::UnbalancedParenthesis)),
            (")", Failure(ReadError::UnbalancedParenthesis)),
            ("(1 2", Failure(ReadError::UnbalancedParenthesis)),
            ("[1 2", Failure(ReadError::UnbalancedParenthesis)),
            ("{\"a\" 1", Failure(ReadError::UnbalancedParenthesis)),
            ("]", Failure(ReadError::UnbalancedParenthesis)),
            ("}", Failure(ReadError::UnbalancedParenthesis)),
            ("((1 2)", Failure(ReadError::UnbalancedParenthesis)),
            ("\"abc", Failure(ReadError::UnfinishedQuote)),
            (r#""ends with backslash\"#, Failure(ReadError::UnfinishedQuote)),
            (r#""escaped close\""#, Failure(ReadError::UnfinishedQuote)),
            ("", Failure(ReadError::Underflow)),
            ("   ", Failure(ReadError::Underflow)),
            ("; only a comment", Failure(ReadError::Underflow)),
            ("'", Failure(ReadError::Underflow)),
            ("~@", Failure(ReadError::Underflow)),
            ("^{}", Failure(ReadError::Underflow)),
            ("{\"a\"}", Failure(ReadError::UnevenHashMap)),
            ("{\"a\" 1 \"b\"}", Failure(ReadError::UnevenHashMap)),
            ("{1 2}", Failure(ReadError::KeyIsNotString)),
            ("{[1] 2}", Failure(ReadError::KeyIsNotString)),
            ("{sym 2}", Failure(ReadError::KeyIsNotString)),
        ];

        run_read_tests(test_cases);
    }

    #[test]
    fn test_tokenizer_sequences() {
        let test_cases: Vec<(&str, Vec<&str>)> = vec![
            ("(+ 1 2)", vec!["(", "+", "1", "2", ")"]),
            ("~@(1)", vec!["~@", "(", "1", ")"]),
            ("~ @", vec!["~", "@"]),
            ("'a", vec!["'", "a"]),
            ("[{:k \"v\"}]", vec!["[", "{", ":k", "\"v\"", "}", "]"]),
            ("a;comment\nb", vec!["a", "b"]),
            ("a ; rest is gone", vec!["a"]),
            (",,a,,b,,", vec!["a", "b"]),
            ("^{} x", vec!["^", "{", "}", "x"]),
            // Strings keep their quotes and embedded specials
            (r#""a b" c"#, vec![r#""a b""#, "c"]),
            (r#""a\"b""#, vec![r#""a\"b""#]),
        ];

        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let tokens = tokenize(input).unwrap();
            assert_eq!(&tokens, expected, "Tokenizer test #{} failed", i + 1);
        }
    }

    #[test]
    fn test_tokenizer_retokenizes_own_output() {
        let inputs = [
            "(def! sq (fn* (n) (* n n)))",
            "{\"a b\" [1 2 3] :k \"v;w\"}",
            "'(1 ~@(2 3) ^{} x)",
            "(if (< 3 2) :yes :no)",
        ];
        for input in inputs {
            let tokens = tokenize(input).unwrap();
            let rejoined = tokens.join(" ");
            let retokenized = tokenize(&rejoined).unwrap();
            assert_eq!(tokens, retokenized, "re-tokenization differs for '{input}'");
        }
    }

    #[test]
    fn test_unescape_round_trip_through_printer() {
        // Printing a string readably and reading it back is the identity
        let originals = ["a\nb", "say \"hi\"", "back\\slash", "", "plain"];
        for original in originals {
            let printed = pr_str(&val(original), true);
            let reread = read_str(&printed).unwrap();
            assert_eq!(reread, val(original), "string round trip for {original:?}");
        }
    }
}
