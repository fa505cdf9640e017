//! Rendering of reports into notification messages

use crate::report::Report;
use crate::NotifyError;
use minijinja::{context, AutoEscape, Environment};
use std::collections::BTreeMap;

/// Built-in templates as (name, source)
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("html", include_str!("../../templates/html.jinja")),
    ("text", include_str!("../../templates/text.jinja")),
];

/// Immutable registry of message templates
///
/// Built once at startup and shared by reference. Besides the standard
/// filters, templates can call `has_prefix(value, prefix)`.
#[derive(Debug)]
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Creates the registry with the built-in `html` and `text` templates
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|name| {
            if name == "html" {
                AutoEscape::Html
            } else {
                AutoEscape::None
            }
        });
        env.add_function("has_prefix", has_prefix);

        for &(name, source) in BUILTIN_TEMPLATES {
            env.add_template(name, source)?;
        }

        Ok(Self { env })
    }

    /// Adds a template, replacing any template with the same name
    pub fn add_template(
        &mut self,
        name: &'static str,
        source: &'static str,
    ) -> Result<(), minijinja::Error> {
        self.env.add_template(name, source)
    }

    /// Returns true if a template with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Renders the reports of several sites, keyed by site URL
    ///
    /// # Arguments
    ///
    /// * `name` - Template name
    /// * `reports` - Reports exposed to the template as `reports`
    pub fn render(
        &self,
        name: &str,
        reports: &BTreeMap<String, Report>,
    ) -> Result<String, NotifyError> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(context! { reports => reports }))
            .map_err(|source| NotifyError::Render {
                template: name.to_string(),
                source,
            })
    }
}

fn has_prefix(value: &str, prefix: &str) -> bool {
    value.starts_with(prefix)
}
