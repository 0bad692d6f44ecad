use crate::parser::{parse_template, FieldPath, Segment, Template};
use pipeconf_core::{EventContext, PipelineInfo, Repository, TemplateError};
use tracing::debug;

/// Parse and render a template against an event in one step
pub fn render(template: &str, event: &EventContext) -> Result<String, TemplateError> {
    parse_template(template)?.render(event)
}

impl Template {
    /// Render against an event. Any field that does not resolve fails the
    /// whole render; nothing is ever substituted with empty text.
    pub fn render(&self, event: &EventContext) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source().len());

        for segment in self.segments() {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(path) => {
                    let value = lookup(path, event).ok_or_else(|| TemplateError::UnknownField {
                        template: self.source().to_string(),
                        field: path.as_str().to_string(),
                    })?;
                    out.push_str(value);
                }
            }
        }

        debug!(template = %self.source(), rendered = %out, "Rendered template");
        Ok(out)
    }
}

/// Case-insensitive, underscore-insensitive key
fn normalize(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn lookup<'a>(path: &FieldPath, event: &'a EventContext) -> Option<&'a str> {
    let keys: Vec<String> = path.segments().iter().map(|s| normalize(s)).collect();

    match keys.as_slice() {
        [scope, field] if scope == "repo" => repo_field(&event.repo, field),
        [scope, field] if scope == "pipeline" => pipeline_field(&event.pipeline, field),
        [field] => pipeline_field(&event.pipeline, field).or_else(|| repo_field(&event.repo, field)),
        _ => None,
    }
}

fn repo_field<'a>(repo: &'a Repository, field: &str) -> Option<&'a str> {
    let value = match field {
        "name" => &repo.name,
        "owner" | "namespace" => &repo.owner,
        "fullname" => &repo.full_name,
        "cloneurl" => &repo.clone_url,
        "defaultbranch" | "branch" => &repo.default_branch,
        _ => return None,
    };
    Some(value.as_str())
}

fn pipeline_field<'a>(pipeline: &'a PipelineInfo, field: &str) -> Option<&'a str> {
    let value = match field {
        "branch" => &pipeline.branch,
        "commit" => &pipeline.commit,
        "ref" => &pipeline.ref_field,
        _ => return None,
    };
    Some(value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, owner: &str, branch: &str) -> EventContext {
        EventContext {
            repo: Repository {
                name: name.to_string(),
                owner: owner.to_string(),
                full_name: format!("{}/{}", owner, name),
                clone_url: format!("https://git.local.lan/{}/{}.git", owner, name),
                default_branch: "main".to_string(),
            },
            pipeline: PipelineInfo {
                branch: branch.to_string(),
                commit: "abc123".to_string(),
                ref_field: format!("refs/heads/{}", branch),
            },
        }
    }

    #[test]
    fn test_render_go_style_fields() {
        let ev = event("myrepo", "admin", "develop");
        assert_eq!(render("{{ .Repo.Name }}", &ev).unwrap(), "myrepo");
        assert_eq!(render("{{ .Repo.Owner }}", &ev).unwrap(), "admin");
        assert_eq!(render("{{ .Repo.Namespace }}", &ev).unwrap(), "admin");
        assert_eq!(render("{{ .Repo.FullName }}", &ev).unwrap(), "admin/myrepo");
        assert_eq!(render("{{ .Repo.Branch }}", &ev).unwrap(), "main");
        assert_eq!(render("{{ .Pipeline.Branch }}", &ev).unwrap(), "develop");
        assert_eq!(render("{{ .Pipeline.Commit }}", &ev).unwrap(), "abc123");
        assert_eq!(render("{{ .Pipeline.Ref }}", &ev).unwrap(), "refs/heads/develop");
    }

    #[test]
    fn test_render_snake_case_fields() {
        let ev = event("myrepo", "admin", "develop");
        assert_eq!(render("{{repo.full_name}}", &ev).unwrap(), "admin/myrepo");
        assert_eq!(
            render("{{repo.clone_url}}", &ev).unwrap(),
            "https://git.local.lan/admin/myrepo.git"
        );
        assert_eq!(render("{{repo.default_branch}}", &ev).unwrap(), "main");
    }

    #[test]
    fn test_render_bare_names_prefer_pipeline() {
        let ev = event("myapp", "admin", "feature/auth");
        assert_eq!(render("{{branch}}", &ev).unwrap(), "feature/auth");
        assert_eq!(render("{{owner}}", &ev).unwrap(), "admin");
        assert_eq!(render("{{name}}", &ev).unwrap(), "myapp");
    }

    #[test]
    fn test_render_mixed_static_and_dynamic() {
        let ev = event("backend", "team", "main");
        assert_eq!(
            render("configs/{{ .Repo.Owner }}/{{ .Repo.Name }}", &ev).unwrap(),
            "configs/team/backend"
        );
        assert_eq!(render("dronefiles", &ev).unwrap(), "dronefiles");
    }

    #[test]
    fn test_render_unknown_field_fails() {
        let ev = event("myapp", "admin", "main");
        let err = render("{{ .Repo.Nmae }}", &ev).unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownField {
                template: "{{ .Repo.Nmae }}".to_string(),
                field: ".Repo.Nmae".to_string(),
            }
        );
        assert!(render("{{ .Build.Number }}", &ev).is_err());
        assert!(render("{{ .Repo.Owner.Login }}", &ev).is_err());
    }

    #[test]
    fn test_render_empty_value_is_not_an_error() {
        let mut ev = event("myapp", "admin", "main");
        ev.pipeline.commit.clear();
        assert_eq!(render("c-{{ .Pipeline.Commit }}", &ev).unwrap(), "c-");
    }

    #[test]
    fn test_render_is_deterministic() {
        let ev = event("myapp", "admin", "main");
        let template = parse_template("{{repo.name}}/{{branch}}").unwrap();
        let first = template.render(&ev).unwrap();
        let second = template.render(&ev).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, render("{{repo.name}}/{{branch}}", &ev).unwrap());
    }
}
