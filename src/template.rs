use std::collections::BTreeMap;

use thiserror::Error;

pub type Params = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template placeholder ${{{name}}} has no value")]
    MissingKey { name: String },

    #[error("Error rendering invoice fragment: {source}")]
    Askama {
        #[from]
        source: askama::Error,
    },
}

/// What to do with a placeholder that has no parameter.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub enum Missing {
    #[default]
    Fail,
    Empty,
}

const OPEN: &str = "${";

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Name of the placeholder at the start of `s` (just after `${`) and the
/// length consumed including the closing brace.
fn placeholder(s: &str) -> Option<(&str, usize)> {
    let end = s.find('}')?;
    let name = &s[..end];
    if name.is_empty() || !name.chars().all(is_name_char) {
        return None;
    }
    Some((name, end + 1))
}

/// Substitutes every `${name}` in `template` with its parameter.
///
/// A placeholder preceded by an odd run of backslashes is escaped: one
/// backslash is dropped and the placeholder is copied literally. An even
/// run (a LaTeX `\\` line break, say) leaves the placeholder live.
/// Anything that does not form a valid placeholder is copied as is.
pub fn render(
    template: &str,
    params: &Params,
    missing: Missing,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(OPEN) {
        let (before, after) = rest.split_at(pos);
        let after = &after[OPEN.len()..];
        let backslashes =
            before.len() - before.trim_end_matches('\\').len();

        if backslashes % 2 == 1 {
            out.push_str(&before[..before.len() - 1]);
            out.push_str(OPEN);
            rest = after;
            continue;
        }

        out.push_str(before);
        match placeholder(after) {
            Some((name, consumed)) => {
                match (params.get(name), missing) {
                    (Some(value), _) => out.push_str(value),
                    (None, Missing::Empty) => {}
                    (None, Missing::Fail) => {
                        return Err(TemplateError::MissingKey {
                            name: name.to_string(),
                        })
                    }
                }
                rest = &after[consumed..];
            }
            None => {
                out.push_str(OPEN);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_placeholders() -> Result<(), TemplateError> {
        let p = params(&[("id", "00042"), ("name", "Ada")]);
        let out = render("Invoice ${id} from ${name}.", &p, Missing::Fail)?;
        assert_eq!(out, "Invoice 00042 from Ada.");
        Ok(())
    }

    #[test]
    fn values_are_not_rescanned() -> Result<(), TemplateError> {
        let p = params(&[("a", "${b}"), ("b", "x")]);
        assert_eq!(render("${a}", &p, Missing::Fail)?, "${b}");
        Ok(())
    }

    #[test]
    fn escaped_placeholder_is_literal() -> Result<(), TemplateError> {
        let p = params(&[("total", "10.00")]);
        let out = render(r"cost \${total} is ${total}", &p, Missing::Fail)?;
        assert_eq!(out, "cost ${total} is 10.00");
        Ok(())
    }

    #[test]
    fn latex_line_break_keeps_placeholder() -> Result<(), TemplateError> {
        let p = params(&[("email", "a@b.c")]);
        assert_eq!(render(r"Ada\\${email}", &p, Missing::Fail)?, r"Ada\\a@b.c");
        assert_eq!(
            render(r"Ada\\\${email}", &p, Missing::Fail)?,
            r"Ada\\${email}"
        );
        Ok(())
    }

    #[test]
    fn missing_key_fails_by_default() {
        let result = render("${nope}", &Params::new(), Missing::default());
        match result {
            Err(TemplateError::MissingKey { name }) => assert_eq!(name, "nope"),
            other => panic!("expected missing key, got {:?}", other),
        }
    }

    #[test]
    fn missing_key_can_be_empty() -> Result<(), TemplateError> {
        let out = render("[${nope}]", &Params::new(), Missing::Empty)?;
        assert_eq!(out, "[]");
        Ok(())
    }

    #[test]
    fn malformed_placeholders_pass_through() -> Result<(), TemplateError> {
        let p = params(&[("x", "1")]);
        assert_eq!(render("${x", &p, Missing::Fail)?, "${x");
        assert_eq!(render("${}", &p, Missing::Fail)?, "${}");
        assert_eq!(render("${a b} ${x}", &p, Missing::Fail)?, "${a b} 1");
        assert_eq!(render("$x {x}", &p, Missing::Fail)?, "$x {x}");
        Ok(())
    }

    proptest! {
        #[test]
        fn plain_text_is_unchanged(text in "[^$]*") {
            let out = render(&text, &params(&[("x", "1")]), Missing::Fail);
            prop_assert_eq!(out.ok(), Some(text));
        }

        #[test]
        fn escaped_is_never_substituted(
            name in "[a-z_]{1,12}",
            value in "[a-z0-9 ]{0,12}",
        ) {
            let template = format!("\\${{{}}}", name);
            let p = params(&[(name.as_str(), value.as_str())]);
            let out = render(&template, &p, Missing::Fail);
            prop_assert_eq!(out.ok(), Some(format!("${{{}}}", name)));
        }
    }
}
