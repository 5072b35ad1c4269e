//! The template engine behind query specs.
//!
//! Variables are referenced in templates with `[ ]`, so a spec reads like the
//! SQL it produces: `select day, count from errors where day > [days]`.
//!
//! Rendering is strict: every `[variable]` must have a value in the context or
//! the render fails naming the first one (in document order) that doesn't. The
//! one escape hatch is filters, which are best-effort; see [`filters::Popen`].
mod filters;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::collections::HashMap;
use thiserror::Error;

pub use filters::Filter;

#[derive(Error, Debug)]
pub enum TemplateError {
    // Pest has quite nice error output, which we rely on.
    #[error("Invalid template syntax, failed to parse:\n{0}")]
    Syntax(Box<pest::error::Error<Rule>>),
    #[error("Template requires missing `{name}` variable.")]
    MissingVariable { name: String },
    #[error("`{name}` is not a known template filter.")]
    UnknownFilter { name: String },
}

/// Pest will autogenerate all of the parsing code, plus the Rule enum with
/// all the rule names from the template.pest file.
#[derive(Parser)]
#[grammar = "engine/template.pest"]
struct TemplateParser;

/// A free variable found in a template, tagged with the byte offset of its
/// first occurrence. The extracted list is unique by name and sorted ascending
/// by that offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVariable {
    pub name: String,
    pub offset: usize,
}

pub struct TemplateEngine {
    filters: HashMap<&'static str, Box<dyn Filter>>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut engine = TemplateEngine {
            filters: HashMap::new(),
        };

        engine.register("popen", Box::new(filters::Popen));

        engine
    }

    pub fn register(&mut self, name: &'static str, filter: Box<dyn Filter>) {
        self.filters.insert(name, filter);
    }

    /// Returns every variable the template references, deduplicated, ordered
    /// by first occurrence.
    pub fn extract_variables(
        &self,
        template: &str,
    ) -> Result<Vec<TemplateVariable>, TemplateError> {
        let root = parse(template)?;

        let mut variables: Vec<TemplateVariable> = Vec::new();
        for part in root.into_inner() {
            if part.as_rule() != Rule::substitution {
                continue;
            }

            let Some(variable) = substitution_variable(part) else {
                continue; // string literals reference no variable
            };

            // Walking the parse tree visits references in document order, so
            // keeping the first sighting of each name is all the sorting needed.
            if !variables.iter().any(|seen| seen.name == variable.name) {
                variables.push(variable);
            }
        }

        Ok(variables)
    }

    /// Substitutes every reference with its value from `context`.
    ///
    /// Scans left to right and fails on the first variable with no value, so
    /// the reported name is the first unresolved one in document order.
    pub fn render(
        &self,
        template: &str,
        context: &HashMap<String, String>,
    ) -> Result<String, TemplateError> {
        let root = parse(template)?;

        let mut rendered = String::new();
        for part in root.into_inner() {
            match part.as_rule() {
                Rule::text => rendered.push_str(part.as_str()),
                Rule::substitution => rendered.push_str(&self.evaluate(part, context)?),
                Rule::EOI => {}
                other => panic!("unexpected template part {:?}", other),
            }
        }

        Ok(rendered)
    }

    fn evaluate(
        &self,
        substitution: Pair<Rule>,
        context: &HashMap<String, String>,
    ) -> Result<String, TemplateError> {
        let expression = substitution
            .into_inner()
            .next()
            .expect("substitutions always hold an expression");

        let mut inners = expression.into_inner();
        let value = inners.next().expect("expressions always hold a value");
        let filter_name = inners.next();

        let value = value
            .into_inner()
            .next()
            .expect("values are either strings or variables");
        let resolved = match value.as_rule() {
            Rule::variable => context
                .get(value.as_str())
                .cloned()
                .ok_or_else(|| TemplateError::MissingVariable {
                    name: value.as_str().to_owned(),
                })?,
            Rule::string => value
                .into_inner()
                .next()
                .expect("strings always hold their inner text")
                .as_str()
                .to_owned(),
            other => panic!("unexpected value type {:?}", other),
        };

        match filter_name {
            None => Ok(resolved),
            Some(name) => {
                let filter =
                    self.filters
                        .get(name.as_str())
                        .ok_or_else(|| TemplateError::UnknownFilter {
                            name: name.as_str().to_owned(),
                        })?;

                // Filters are best-effort: a failed filter renders as nothing
                // rather than aborting the whole query.
                Ok(filter.apply(&resolved).unwrap_or_default())
            }
        }
    }
}

/// Attempts to satisfy all variables by consuming positional and keyword
/// values, in extraction order: positional values first, then keyword values
/// by name. Variables left over stay out of the context entirely; rendering
/// is where their absence turns into an error.
pub fn bind(
    variables: &[TemplateVariable],
    positional: &mut Vec<String>,
    keyword: &mut HashMap<String, String>,
) -> HashMap<String, String> {
    let mut context = HashMap::new();

    for variable in variables {
        if !positional.is_empty() {
            context.insert(variable.name.clone(), positional.remove(0));
        } else if let Some(value) = keyword.remove(&variable.name) {
            context.insert(variable.name.clone(), value);
        }
    }

    context
}

fn parse(template: &str) -> Result<Pair<'_, Rule>, TemplateError> {
    let mut pairs = TemplateParser::parse(Rule::template, template)
        .map_err(|error| TemplateError::Syntax(Box::new(error)))?;

    Ok(pairs
        .next()
        .expect("the template rule always matches exactly once"))
}

fn substitution_variable(substitution: Pair<Rule>) -> Option<TemplateVariable> {
    let expression = substitution
        .into_inner()
        .next()
        .expect("substitutions always hold an expression");
    let value = expression
        .into_inner()
        .next()
        .expect("expressions always hold a value");
    let inner = value
        .into_inner()
        .next()
        .expect("values are either strings or variables");

    match inner.as_rule() {
        Rule::variable => Some(TemplateVariable {
            name: inner.as_str().to_owned(),
            offset: inner.as_span().start(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;
    impl Filter for Upper {
        fn apply(&self, input: &str) -> Option<String> {
            Some(input.to_uppercase())
        }
    }

    struct Failing;
    impl Filter for Failing {
        fn apply(&self, _input: &str) -> Option<String> {
            None
        }
    }

    fn context(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn variables_come_back_in_document_order() {
        let engine = TemplateEngine::new();

        let variables = engine
            .extract_variables("select [a] from t where x > [b] and y = [c]")
            .unwrap();

        let names: Vec<&str> = variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(variables.windows(2).all(|w| w[0].offset < w[1].offset));
    }

    #[test]
    fn repeated_references_collapse_to_the_first_offset() {
        let engine = TemplateEngine::new();

        let variables = engine
            .extract_variables("select [b], [a] from t where x = [b]")
            .unwrap();

        let names: Vec<&str> = variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(variables[0].offset, 8);
    }

    #[test]
    fn render_substitutes_from_the_context() {
        let engine = TemplateEngine::new();

        let rendered = engine
            .render(
                "select a from t where d > [days] limit [limit]",
                &context(&[("days", "7"), ("limit", "10")]),
            )
            .unwrap();

        assert_eq!(rendered, "select a from t where d > 7 limit 10");
    }

    #[test]
    fn render_names_the_first_unresolved_variable() {
        let engine = TemplateEngine::new();

        let error = engine
            .render("[a] and [b]", &context(&[("b", "2")]))
            .unwrap_err();

        match error {
            TemplateError::MissingVariable { name } => assert_eq!(name, "a"),
            other => panic!("expected a missing variable error, got {:?}", other),
        }
    }

    #[test]
    fn spaces_inside_brackets_are_fine() {
        let engine = TemplateEngine::new();

        let rendered = engine
            .render("hello [ name ]", &context(&[("name", "bob")]))
            .unwrap();

        assert_eq!(rendered, "hello bob");
    }

    #[test]
    fn unclosed_brackets_are_a_syntax_error() {
        let engine = TemplateEngine::new();

        let error = engine.extract_variables("select [oops from t").unwrap_err();

        assert!(matches!(error, TemplateError::Syntax(_)));
    }

    #[test]
    fn string_literals_are_not_variables() {
        let engine = TemplateEngine::new();

        let variables = engine
            .extract_variables("select [\"echo hi\" | popen] from t")
            .unwrap();

        assert!(variables.is_empty());
    }

    #[test]
    fn filters_apply_to_their_value() {
        let mut engine = TemplateEngine::new();
        engine.register("upper", Box::new(Upper));

        let rendered = engine
            .render("x [\"abc\" | upper] y", &context(&[]))
            .unwrap();

        assert_eq!(rendered, "x ABC y");
    }

    #[test]
    fn failed_filters_render_as_nothing() {
        let mut engine = TemplateEngine::new();
        engine.register("broken", Box::new(Failing));

        let rendered = engine
            .render("x [\"abc\" | broken] y", &context(&[]))
            .unwrap();

        assert_eq!(rendered, "x  y");
    }

    #[test]
    fn unknown_filters_are_an_error() {
        let engine = TemplateEngine::new();

        let error = engine.render("[\"abc\" | nope]", &context(&[])).unwrap_err();

        assert!(matches!(error, TemplateError::UnknownFilter { name } if name == "nope"));
    }

    #[test]
    fn bind_drains_positional_values_first() {
        let variables = vec![
            TemplateVariable {
                name: "a".into(),
                offset: 0,
            },
            TemplateVariable {
                name: "b".into(),
                offset: 5,
            },
        ];
        let mut positional = vec!["1".to_string()];
        let mut keyword = context(&[("b", "2"), ("extra", "ignored")]);

        let bound = bind(&variables, &mut positional, &mut keyword);

        assert_eq!(bound, context(&[("a", "1"), ("b", "2")]));
        assert!(positional.is_empty());
        assert_eq!(keyword, context(&[("extra", "ignored")]));
    }

    #[test]
    fn unbound_variables_get_no_placeholder() {
        let variables = vec![TemplateVariable {
            name: "a".into(),
            offset: 0,
        }];
        let mut positional = Vec::new();
        let mut keyword = HashMap::new();

        let bound = bind(&variables, &mut positional, &mut keyword);

        assert!(bound.is_empty());
    }

    #[test]
    fn full_binding_round_trips_through_render() {
        let engine = TemplateEngine::new();
        let template = "select [a] from t where x = [b] and y = [c]";

        let variables = engine.extract_variables(template).unwrap();
        let mut positional = vec!["col".to_string()];
        let mut keyword = context(&[("b", "1"), ("c", "2")]);

        let bound = bind(&variables, &mut positional, &mut keyword);
        let rendered = engine.render(template, &bound).unwrap();

        assert_eq!(rendered, "select col from t where x = 1 and y = 2");
    }
}
