use crate::grammar::{Rule, TemplateParser};
use pest::Parser;
use pipeconf_core::TemplateError;

/// A dotted field reference such as `.Repo.Owner` or `branch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// The path exactly as written in the template
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Field(FieldPath),
}

/// A parsed template, ready to be rendered against any event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the template contains no field references
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }
}

/// Parse a template string into literal and field segments
pub fn parse_template(input: &str) -> Result<Template, TemplateError> {
    let mut pairs = TemplateParser::parse(Rule::template, input).map_err(|e| {
        TemplateError::Parse {
            template: input.to_string(),
            message: e.to_string(),
        }
    })?;

    let template_pair = pairs.next().ok_or_else(|| TemplateError::Parse {
        template: input.to_string(),
        message: "empty parse result".to_string(),
    })?;

    let mut segments = Vec::new();
    for inner_pair in template_pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::literal => segments.push(Segment::Literal(inner_pair.as_str().to_string())),
            Rule::action => {
                if let Some(path_pair) = inner_pair
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::field_path)
                {
                    segments.push(Segment::Field(parse_field_path(path_pair)));
                }
            }
            _ => {}
        }
    }

    Ok(Template {
        source: input.to_string(),
        segments,
    })
}

fn parse_field_path(pair: pest::iterators::Pair<Rule>) -> FieldPath {
    let raw = pair.as_str().to_string();
    let segments = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::ident)
        .map(|p| p.as_str().to_string())
        .collect();

    FieldPath { raw, segments }
}
