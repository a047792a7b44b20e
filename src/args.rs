//! Argument encoding for operations.
//!
//! Two escaping levels exist in the filtergraph grammar:
//! - value level: `\`, `:` and `'` are backslash-escaped inside one option value
//! - graph level: the whole `name=<args>` payload is quoted so that `\`, `'`
//!   and `,` survive the chain parser
//!
//! Example: `[Arg::map([("text", "a:b")])]` encodes to `text=a\:b`, which is
//! quoted as `'text=a'\\':b'` when embedded in `drawtext=...`.

use std::fmt;

/// One value inside a keyed argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    /// Rendered as `key=/path`: the option value is read from a file.
    File(String),
}

impl Value {
    pub fn file(path: impl Into<String>) -> Self {
        Value::File(path.into())
    }
}

/// One positional argument of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Scalar(String),
    List(Vec<String>),
    Map(Vec<(String, Value)>),
}

impl Arg {
    pub fn scalar(v: impl fmt::Display) -> Self {
        Arg::Scalar(v.to_string())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        Arg::List(items.into_iter().map(|v| v.to_string()).collect())
    }

    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Arg::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    fn push_parts(&self, parts: &mut Vec<String>) {
        match self {
            Arg::Scalar(s) => parts.push(escape_value(s)),
            Arg::List(items) => parts.extend(items.iter().map(|s| escape_value(s))),
            Arg::Map(pairs) => {
                for (key, value) in pairs {
                    match value {
                        Value::Text(s) => parts.push(format!("{}={}", key, escape_value(s))),
                        Value::File(p) => parts.push(format!("{}=/{}", key, escape_value(p))),
                    }
                }
            }
        }
    }
}

macro_rules! text_from {
    ($($t:ty),*) => {
        $(impl From<$t> for Arg {
            fn from(v: $t) -> Self {
                Arg::Scalar(v.to_string())
            }
        }

        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Text(v.to_string())
            }
        })*
    };
}

text_from!(&str, String, i32, i64, u32, u64, usize, f32, f64, bool);

/// Backslash-escape `\`, `:` and `'` for use inside one option value.
pub fn escape_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | ':' | '\'') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Encode a full argument list into the unquoted `a:b:key=value` form.
///
/// A single scalar passes through untouched; callers use it to supply an
/// already-formatted argument string.
pub fn encode_args(args: &[Arg]) -> String {
    if let [Arg::Scalar(raw)] = args {
        return raw.clone();
    }
    let mut parts = Vec::new();
    for arg in args {
        arg.push_parts(&mut parts);
    }
    parts.join(":")
}

/// Quote an encoded argument string for embedding after `name=`.
pub fn quote_args(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    let mut run = String::new();
    for c in s.chars() {
        if matches!(c, '\\' | '\'' | ',') {
            flush_run(&mut out, &mut run);
            out.push('\\');
            out.push(c);
        } else {
            run.push(c);
        }
    }
    flush_run(&mut out, &mut run);
    out
}

fn flush_run(out: &mut String, run: &mut String) {
    if run.is_empty() {
        return;
    }
    out.push('\'');
    out.push_str(run);
    out.push('\'');
    run.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Undo `quote_args`: strip quotes, resolve backslash escapes outside them.
    fn unquote(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        let mut quoted = false;
        while let Some(c) = chars.next() {
            match c {
                '\'' => quoted = !quoted,
                '\\' if !quoted => {
                    if let Some(n) = chars.next() {
                        out.push(n);
                    }
                }
                _ => out.push(c),
            }
        }
        out
    }

    /// Split on unescaped `:` and unescape each part.
    fn split_values(s: &str) -> Vec<String> {
        let mut parts = vec![String::new()];
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(n) = chars.next() {
                        parts.last_mut().unwrap().push(n);
                    }
                }
                ':' => parts.push(String::new()),
                _ => parts.last_mut().unwrap().push(c),
            }
        }
        parts
    }

    #[test]
    fn single_scalar_passes_through() {
        assert_eq!(encode_args(&["w=100:h=50".into()]), "w=100:h=50");
        assert_eq!(encode_args(&[Arg::scalar(2)]), "2");
    }

    #[test]
    fn positional_and_keyed_parts_are_joined() {
        let args = [
            Arg::from("a:b"),
            Arg::list([1, 2]),
            Arg::map([("x", Value::from("it's")), ("f", Value::file("/tmp/c.txt"))]),
        ];
        assert_eq!(
            encode_args(&args),
            r"a\:b:1:2:x=it\'s:f=//tmp/c.txt"
        );
    }

    #[test]
    fn escape_value_handles_reserved_chars() {
        assert_eq!(escape_value(r"a\b:c'd"), r"a\\b\:c\'d");
        assert_eq!(escape_value("plain"), "plain");
    }

    #[test]
    fn quote_wraps_literal_runs() {
        assert_eq!(quote_args("w=1:h=2"), "'w=1:h=2'");
        assert_eq!(quote_args(r"a\:b"), r"'a'\\':b'");
        assert_eq!(quote_args("x,y"), r"'x'\,'y'");
        assert_eq!(quote_args(","), r"\,");
        assert_eq!(quote_args(""), "");
    }

    #[test]
    fn keyed_values_survive_grammar_decoding() {
        let pairs = [
            ("text", "hello: world"),
            ("font", r"C:\fonts\a.ttf"),
            ("quote", "it's, ok"),
        ];
        let encoded = encode_args(&[Arg::map(pairs), Arg::from("tail")]);
        let decoded = split_values(&unquote(&quote_args(&encoded)));
        let expected: Vec<String> = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .chain(["tail".to_string()])
            .collect();
        assert_eq!(decoded, expected);
    }
}
