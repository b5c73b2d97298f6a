//! Prompt template for the routing classification call
//!
//! A template is plain text with two named substitution points,
//! `{{query}}` and `{{options}}`. Unknown placeholders are left
//! untouched so custom templates can carry their own markers.

/// Default routing prompt shown to the chat model
pub const DEFAULT_ROUTING_TEMPLATE: &str =
    "Based on the user query, determine the most suitable data source(s) \
     to retrieve relevant information from the following options:\n\
     {{options}}\n\
     It is very important that your answer consists of either a single number \
     or multiple numbers separated by commas and nothing else!\n\
     User query: {{query}}";

/// Text template with `{{query}}` and `{{options}}` substitution points
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template from custom text
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Render the template with the query text and option listing
    ///
    /// Only markers present in the template source are substituted;
    /// substituted values are never re-scanned for markers.
    pub fn render(&self, query: &str, options: &str) -> String {
        const QUERY_MARKER: &str = "{{query}}";
        const OPTIONS_MARKER: &str = "{{options}}";

        let mut rendered =
            String::with_capacity(self.template.len() + query.len() + options.len());
        let mut rest = self.template.as_str();

        loop {
            let query_at = rest.find(QUERY_MARKER);
            let options_at = rest.find(OPTIONS_MARKER);

            let (at, marker, value) = match (query_at, options_at) {
                (Some(q), Some(o)) if q < o => (q, QUERY_MARKER, query),
                (Some(q), None) => (q, QUERY_MARKER, query),
                (_, Some(o)) => (o, OPTIONS_MARKER, options),
                (None, None) => break,
            };

            rendered.push_str(&rest[..at]);
            rendered.push_str(value);
            rest = &rest[at + marker.len()..];
        }

        rendered.push_str(rest);
        rendered
    }

    /// The raw template text
    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_ROUTING_TEMPLATE)
    }
}

impl From<&str> for PromptTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}
