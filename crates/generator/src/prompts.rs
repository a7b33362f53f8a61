use taskpub_core::TaskContext;

pub struct GenerationPrompts;

const OUTPUT_FORMAT: &str = r##"Return ONLY a JSON array where each object has:
- "name": filename (e.g., "index.html")
- "content": the complete file content

Example format:
[
  {
    "name": "index.html",
    "content": "<!DOCTYPE html>..."
  },
  {
    "name": "README.md",
    "content": "# Project..."
  }
]"##;

impl GenerationPrompts {
    pub fn initial(context: &TaskContext) -> String {
        format!(
            r#"Create a complete web application for: {brief}

The application should be a professional, working solution that includes:

1. index.html - Main HTML file with a clean, modern interface
2. README.md - Professional documentation with setup instructions
3. script.js - JavaScript functionality
4. style.css - CSS styling
5. Any other necessary files for the application

The files are published as-is to a static site, so everything must run in the browser without a build step.
{requirements}
{output_format}

Make sure the code is complete and runnable."#,
            brief = context.brief,
            requirements = Self::requirements(context),
            output_format = OUTPUT_FORMAT,
        )
    }

    pub fn revision(context: &TaskContext, feedback: &str) -> String {
        format!(
            r#"Based on this feedback: {feedback}

Improve and fix the existing code for: {brief}

The previous implementation had issues that need to be addressed.
Provide the complete updated files.
{requirements}
{output_format}

Make sure all issues from the feedback are resolved."#,
            feedback = feedback,
            brief = context.brief,
            requirements = Self::requirements(context),
            output_format = OUTPUT_FORMAT,
        )
    }

    fn requirements(context: &TaskContext) -> String {
        let mut section = String::new();

        if !context.checks.is_empty() {
            section.push_str("\n## The result will be evaluated against these checks\n");
            for check in &context.checks {
                section.push_str(&format!("- {}\n", check));
            }
        }

        if !context.attachments.is_empty() {
            section.push_str("\n## Attachments provided with the task\n");
            for attachment in &context.attachments {
                // data: URIs carry the whole payload; only the name is useful here
                if attachment.url.starts_with("data:") {
                    section.push_str(&format!("- {} (inline data URI)\n", attachment.name));
                } else {
                    section.push_str(&format!("- {}: {}\n", attachment.name, attachment.url));
                }
            }
        }

        section
    }
}
