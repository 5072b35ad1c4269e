//! Structural validation of rendered queries.
//!
//! Graphs need to know the columns a query selects before any rows exist, so
//! after rendering we parse just the head of the statement: the `select`
//! keyword and its column list. A query selecting a single bare column counts
//! as a one-element list; there's no reason to treat `select a from t` worse
//! than `select a, b from t`.
use crate::engine::QueryError;
use log::debug;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "engine/select.pest"]
struct SelectParser;

/// Extracts the output names of the columns selected in `sql`, deduplicated,
/// in select-list order.
///
/// An aliased column reports its alias, a function call its function name, a
/// wildcard its literal `*`, and a plain column its own name with any table
/// qualifiers stripped. A select list the grammar cannot read through to the
/// end of the statement is rejected rather than guessed at.
pub fn parse_query_columns(query_name: &str, sql: &str) -> Result<Vec<String>, QueryError> {
    if !starts_with_select(sql) {
        return Err(QueryError::NotASelect {
            query: query_name.to_owned(),
        });
    }

    let mut pairs = SelectParser::parse(Rule::query, sql).map_err(|error| {
        debug!("column list of `{}` did not parse: {}", query_name, error);
        QueryError::MissingColumns {
            query: query_name.to_owned(),
        }
    })?;

    let query = pairs.next().expect("the query rule matches exactly once");
    let column_list = query
        .into_inner()
        .find(|pair| pair.as_rule() == Rule::column_list)
        .expect("the grammar always produces a column list");

    let mut columns: Vec<String> = Vec::new();
    for column in column_list.into_inner() {
        let name = output_name(column);
        if !columns.contains(&name) {
            columns.push(name);
        }
    }

    if columns.is_empty() {
        return Err(QueryError::NoColumns {
            query: query_name.to_owned(),
        });
    }

    Ok(columns)
}

fn starts_with_select(sql: &str) -> bool {
    let leading: String = sql
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    leading.eq_ignore_ascii_case("select")
}

fn output_name(column: Pair<Rule>) -> String {
    assert_eq!(Rule::column, column.as_rule());

    let mut inners = column.into_inner();
    let body = inners.next().expect("columns always have a body");

    if let Some(alias) = inners.next() {
        // alias = "as" ~ identifier; the keyword itself is not captured
        return alias
            .into_inner()
            .next()
            .expect("aliases always name an identifier")
            .as_str()
            .to_owned();
    }

    match body.as_rule() {
        Rule::wildcard => body.as_str().to_owned(),
        Rule::qualified => body
            .into_inner()
            .last()
            .expect("qualified names end with an identifier")
            .as_str()
            .to_owned(),
        Rule::function_call => body
            .into_inner()
            .next()
            .expect("function calls start with their name")
            .as_str()
            .to_owned(),
        other => panic!("unexpected column body {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_columns_come_back_in_order() {
        let columns = parse_query_columns("q", "select a, b from t").unwrap();

        assert_eq!(columns, vec!["a", "b"]);
    }

    #[test]
    fn a_single_bare_column_is_a_one_element_list() {
        let columns = parse_query_columns("q", "select a from t").unwrap();

        assert_eq!(columns, vec!["a"]);
    }

    #[test]
    fn aliases_win_over_names() {
        let columns = parse_query_columns("q", "select count(x) as total from t").unwrap();

        assert_eq!(columns, vec!["total"]);
    }

    #[test]
    fn unaliased_function_calls_report_the_function_name() {
        let columns = parse_query_columns("q", "select day, count(1) from t").unwrap();

        assert_eq!(columns, vec!["day", "count"]);
    }

    #[test]
    fn nested_function_arguments_balance() {
        let columns =
            parse_query_columns("q", "select coalesce(a, round(b, 2)) as v from t").unwrap();

        assert_eq!(columns, vec!["v"]);
    }

    #[test]
    fn wildcards_keep_their_literal_text() {
        let columns = parse_query_columns("q", "select * from t").unwrap();

        assert_eq!(columns, vec!["*"]);
    }

    #[test]
    fn duplicate_columns_collapse_keeping_order() {
        let columns = parse_query_columns("q", "select a, a, b from t").unwrap();

        assert_eq!(columns, vec!["a", "b"]);
    }

    #[test]
    fn keyword_case_does_not_matter_but_column_case_survives() {
        let columns = parse_query_columns("q", "SELECT Day FROM t").unwrap();

        assert_eq!(columns, vec!["Day"]);
    }

    #[test]
    fn qualified_columns_report_their_last_segment() {
        let columns = parse_query_columns("q", "select t.col, db.t.other from t").unwrap();

        assert_eq!(columns, vec!["col", "other"]);
    }

    #[test]
    fn select_distinct_is_rejected_not_misread() {
        let error = parse_query_columns("q", "select distinct a, b from t").unwrap_err();

        assert!(matches!(error, QueryError::MissingColumns { query } if query == "q"));
    }

    #[test]
    fn implicit_aliases_are_rejected_not_misread() {
        let error = parse_query_columns("q", "select a b from t").unwrap_err();

        assert!(matches!(error, QueryError::MissingColumns { query } if query == "q"));
    }

    #[test]
    fn the_tail_must_open_at_a_keyword_boundary() {
        let error = parse_query_columns("q", "select a fromage").unwrap_err();

        assert!(matches!(error, QueryError::MissingColumns { .. }));
    }

    #[test]
    fn string_literal_columns_are_rejected_not_guessed() {
        let error = parse_query_columns("q", "select 'now' as label").unwrap_err();

        assert!(matches!(error, QueryError::MissingColumns { .. }));
    }

    #[test]
    fn updates_are_not_selects() {
        let error = parse_query_columns("q", "update t set a = 1").unwrap_err();

        assert!(matches!(error, QueryError::NotASelect { query } if query == "q"));
    }

    #[test]
    fn a_select_without_columns_is_rejected() {
        let error = parse_query_columns("q", "select from t").unwrap_err();

        assert!(matches!(error, QueryError::MissingColumns { query } if query == "q"));
    }

    #[test]
    fn leading_whitespace_is_fine() {
        let columns = parse_query_columns("q", "\n  select a\n  from t\n").unwrap();

        assert_eq!(columns, vec!["a"]);
    }
}
