//! Parses the command-line call string, e.g. `errors:7,service=api`.
//!
//! The part before the first `:` names the query; the rest is a comma
//! separated list of values, where `key=value` pairs become keyword values
//! and everything else is positional. Separators can be escaped with a
//! backslash: `mark users:name='bob\, jr'` passes the literal `bob, jr`.
//! (The single quotes are for the shell; they never reach us.)
//!
//! No arity checking happens here. Whether a value is wanted at all is the
//! binder's call, so unknown keywords and extra positionals pass through.
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentCall {
    pub query_name: String,
    pub positional: Vec<String>,
    pub keyword: HashMap<String, String>,
}

impl ArgumentCall {
    pub fn parse(raw: &str) -> ArgumentCall {
        let Some((query_name, argstr)) = raw.split_once(':') else {
            return ArgumentCall {
                query_name: raw.to_owned(),
                positional: Vec::new(),
                keyword: HashMap::new(),
            };
        };

        let mut positional = Vec::new();
        let mut keyword = HashMap::new();

        for piece in escape_split(',', argstr) {
            let mut parts = escape_split('=', &piece);

            if parts.len() > 1 {
                let key = parts.remove(0);
                // only the first unescaped `=` splits; the rest stay in the value
                keyword.insert(key, parts.join("="));
            } else {
                positional.push(parts.remove(0));
            }
        }

        ArgumentCall {
            query_name: query_name.to_owned(),
            positional,
            keyword,
        }
    }
}

/// Splits on `sep`, except where it is escaped with a backslash; the
/// backslash is consumed.
///
/// The algorithm is the recursive one from fabric's command-line parsing.
/// Split normally up to the first escaped separator, resolve the rest
/// recursively, then stitch the piece that the escaped separator
/// interrupted back together.
fn escape_split(sep: char, argstr: &str) -> Vec<String> {
    let escaped_sep = format!("\\{}", sep);

    let Some((before, after)) = argstr.split_once(&escaped_sep) else {
        return argstr.split(sep).map(str::to_owned).collect();
    };

    let mut pieces: Vec<String> = before.split(sep).map(str::to_owned).collect();
    let mut interrupted = pieces
        .pop()
        .expect("split always yields at least one piece");

    // recurse because there may be more escaped separators
    let mut rest = escape_split(sep, after);

    // the first piece of the recursive result is the tail of the value the
    // escaped separator cut in half
    interrupted.push(sep);
    interrupted.push_str(&rest.remove(0));

    pieces.push(interrupted);
    pieces.extend(rest);

    pieces
}
