//! Resume document rendering.
//!
//! Lays the finished resume document out as a downloadable file. Sections
//! with nothing in them are left out.

use serde_json::Value;

use crate::error::RenderError;

/// A rendered file ready to be sent to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub content_type: &'static str,
    pub file_extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Turns a resume document into a file.
pub trait ResumeRenderer: Send + Sync {
    fn render(&self, resume: &Value) -> Result<RenderedDocument, RenderError>;
}

/// Markdown resume layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl ResumeRenderer for MarkdownRenderer {
    fn render(&self, resume: &Value) -> Result<RenderedDocument, RenderError> {
        if !resume.is_object() {
            return Err(RenderError::NotAnObject {
                found: kind_of(resume).to_string(),
            });
        }

        let mut sections: Vec<String> = Vec::new();
        let personal = &resume["personalInfo"];

        if let Some(name) = text(&personal["name"]) {
            let mut header = format!("# {name}");
            let contact: Vec<&str> = ["phone", "email", "city"]
                .iter()
                .filter_map(|key| text(&personal[*key]))
                .collect();
            if !contact.is_empty() {
                header.push_str("\n\n");
                header.push_str(&contact.join(" | "));
            }
            sections.push(header);
        }

        let jobs = objects(&resume["workExperience"]);
        if !jobs.is_empty() {
            let entries: Vec<String> = jobs.iter().map(|job| render_job(job)).collect();
            sections.push(format!("## Work Experience\n\n{}", entries.join("\n\n")));
        }

        let skills = strings(&resume["skills"]);
        if !skills.is_empty() {
            sections.push(format!("## Skills\n\n{}", skills.join(", ")));
        }

        let schools = objects(&resume["education"]);
        if !schools.is_empty() {
            let entries: Vec<String> = schools.iter().map(|edu| render_education(edu)).collect();
            sections.push(format!(
                "## Education & Training\n\n{}",
                entries.join("\n\n")
            ));
        }

        let languages = strings(&personal["languages"]);
        if !languages.is_empty() {
            sections.push(format!("## Languages\n\n{}", languages.join(", ")));
        }

        let mut body = sections.join("\n\n");
        body.push('\n');

        Ok(RenderedDocument {
            content_type: "text/markdown; charset=utf-8",
            file_extension: "md",
            bytes: body.into_bytes(),
        })
    }
}

fn render_job(job: &Value) -> String {
    let mut line = format!("**{}**", text(&job["jobTitle"]).unwrap_or("Job Title"));
    if let Some(company) = text(&job["company"]) {
        line.push_str(&format!(" - *{company}*"));
    }
    if let Some(years) = job["yearsWorked"].as_f64() {
        let unit = if years == 1.0 { "year" } else { "years" };
        line.push_str(&format!(" ({} {unit})", job["yearsWorked"]));
    }
    for duty in strings(&job["responsibilities"]) {
        line.push_str(&format!("\n• {duty}"));
    }
    line
}

fn render_education(edu: &Value) -> String {
    let mut line = format!("**{}**", text(&edu["degree"]).unwrap_or("Degree"));
    if let Some(institution) = text(&edu["institution"]) {
        line.push_str(&format!(", *{institution}*"));
    }
    if let Some(years) = text(&edu["years"]) {
        line.push_str(&format!(" ({years})"));
    }
    line
}

/// Non-empty string at `value`.
fn text(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn strings(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(text).collect())
        .unwrap_or_default()
}

/// Non-empty objects in a list. Padding slots that were never filled are skipped.
fn objects(value: &Value) -> Vec<&Value> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter(|item| item.as_object().is_some_and(|o| !o.is_empty()))
                .collect()
        })
        .unwrap_or_default()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn render(value: Value) -> String {
        let doc = MarkdownRenderer.render(&value).unwrap();
        String::from_utf8(doc.bytes).unwrap()
    }

    #[test]
    fn full_resume_layout() {
        let out = render(json!({
            "personalInfo": {
                "name": "Maria Lopez",
                "phone": "555-0100",
                "email": "maria@example.com",
                "city": "Austin, TX",
                "languages": ["English", "Spanish"]
            },
            "workExperience": [{
                "jobTitle": "Forklift Operator",
                "company": "Acme",
                "yearsWorked": 1,
                "responsibilities": ["loaded trucks.", "cleaned warehouse."]
            }],
            "skills": ["forklift", "inventory"],
            "education": [{"degree": "GED", "institution": "ACC", "years": "2015-2016"}]
        }));

        assert!(out.starts_with("# Maria Lopez\n\n555-0100 | maria@example.com | Austin, TX"));
        assert!(out.contains("## Work Experience\n\n**Forklift Operator** - *Acme* (1 year)"));
        assert!(out.contains("\n• loaded trucks.\n• cleaned warehouse."));
        assert!(out.contains("## Skills\n\nforklift, inventory"));
        assert!(out.contains("## Education & Training\n\n**GED**, *ACC* (2015-2016)"));
        assert!(out.contains("## Languages\n\nEnglish, Spanish"));
    }

    #[test]
    fn plural_years_and_zero() {
        let out = render(json!({"workExperience": [{"jobTitle": "Cook", "yearsWorked": 0}]}));
        assert!(out.contains("**Cook** (0 years)"));
        let out = render(json!({"workExperience": [{"jobTitle": "Cook", "yearsWorked": 2.5}]}));
        assert!(out.contains("(2.5 years)"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let out = render(json!({"skills": []}));
        assert_eq!(out, "\n");

        let out = render(json!({"workExperience": [{}, {}], "personalInfo": {"phone": "555"}}));
        assert!(!out.contains("Work Experience"));
        assert!(!out.contains("555"), "contact line needs a name");
    }

    #[test]
    fn missing_titles_get_placeholders() {
        let out = render(json!({
            "workExperience": [{"company": "Acme"}],
            "education": [{"institution": "ACC"}]
        }));
        assert!(out.contains("**Job Title** - *Acme*"));
        assert!(out.contains("**Degree**, *ACC*"));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = MarkdownRenderer.render(&json!(["nope"])).unwrap_err();
        assert_eq!(err.to_string(), "Resume data must be an object, got array");
    }

    #[test]
    fn metadata_for_download() {
        let doc = MarkdownRenderer.render(&json!({})).unwrap();
        assert_eq!(doc.file_extension, "md");
        assert!(doc.content_type.starts_with("text/markdown"));
    }
}
