use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use askama::Template;
use chrono::Local;

use crate::history::{load_previous_urls, split_matches};
use crate::models::JobMatch;

const RULE_WIDTH: usize = 80;

fn plural_matches(count: usize) -> &'static str {
    if count == 1 { "match" } else { "matches" }
}

/// Matches of one company, in extraction order.
pub struct CompanyGroup<'a> {
    pub name: &'a str,
    pub jobs: Vec<&'a JobMatch>,
}

impl CompanyGroup<'_> {
    pub fn count_label(&self) -> String {
        format!("{} {}", self.jobs.len(), plural_matches(self.jobs.len()))
    }
}

/// Group by company name, companies sorted alphabetically.
pub fn group_by_company(matches: &[JobMatch]) -> Vec<CompanyGroup<'_>> {
    let mut groups: BTreeMap<&str, Vec<&JobMatch>> = BTreeMap::new();
    for m in matches {
        groups.entry(m.company.as_str()).or_default().push(m);
    }
    groups
        .into_iter()
        .map(|(name, jobs)| CompanyGroup { name, jobs })
        .collect()
}

fn push_groups(out: &mut Vec<String>, matches: &[JobMatch]) {
    for group in group_by_company(matches) {
        out.push(format!("\n{} ({})", group.name, group.count_label()));
        out.push("-".repeat(RULE_WIDTH));
        for job in group.jobs {
            out.push(format!("\n  Title: {}", job.title));
            out.push(format!("  URL: {}", job.url));
            out.push(format!("  Keywords: {}", job.matched_keywords.join(", ")));
        }
    }
}

pub fn format_stdout(new: &[JobMatch], existing: &[JobMatch]) -> String {
    let total = new.len() + existing.len();
    if total == 0 {
        return "No matching jobs found.".to_string();
    }

    let rule = "=".repeat(RULE_WIDTH);
    let mut out = vec![
        format!("\n{}", rule),
        format!("Found {} total matching job(s)", total),
        format!("  {} new, {} previously found", new.len(), existing.len()),
        format!("{}\n", rule),
    ];

    if !new.is_empty() {
        out.push("\nNEW MATCHES".to_string());
        out.push(rule.clone());
        push_groups(&mut out, new);
    }
    if !existing.is_empty() {
        out.push("\n\nPREVIOUSLY FOUND MATCHES".to_string());
        out.push(rule.clone());
        push_groups(&mut out, existing);
    }

    out.push(format!("\n{}\n", rule));
    out.join("\n")
}

pub struct ReportSection<'a> {
    pub heading: &'static str,
    pub css_class: &'static str,
    pub groups: Vec<CompanyGroup<'a>>,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    total: usize,
    new_count: usize,
    existing_count: usize,
    search_date: String,
    generated_at: String,
    sections: Vec<ReportSection<'a>>,
}

pub fn generate_html(new: &[JobMatch], existing: &[JobMatch]) -> Result<String> {
    let now = Local::now();
    let mut sections = Vec::new();
    if !new.is_empty() {
        sections.push(ReportSection {
            heading: "New Matches",
            css_class: "section-title",
            groups: group_by_company(new),
        });
    }
    if !existing.is_empty() {
        sections.push(ReportSection {
            heading: "Previously Found Matches",
            css_class: "section-title seen",
            groups: group_by_company(existing),
        });
    }

    let template = ReportTemplate {
        total: new.len() + existing.len(),
        new_count: new.len(),
        existing_count: existing.len(),
        search_date: now.format("%B %d, %Y").to_string(),
        generated_at: now.format("%B %d, %Y at %I:%M %p").to_string(),
        sections,
    };
    template.render().context("Failed to render HTML report")
}

/// Print the stdout report and write the HTML report, marking matches already
/// present in the previous report at `html_path`.
pub fn output_results(matches: &[JobMatch], html_path: &Path) -> Result<()> {
    let previous = load_previous_urls(html_path);
    let (new, existing) = split_matches(matches, &previous);

    println!("{}", format_stdout(&new, &existing));

    let html = generate_html(&new, &existing)?;
    std::fs::write(html_path, html).with_context(|| format!("Failed to write {}", html_path.display()))?;

    println!("Results saved to {}", html_path.display());
    if !new.is_empty() {
        println!("{} new {} found!", new.len(), plural_matches(new.len()));
    }
    if !existing.is_empty() {
        println!("{} previously found {}", existing.len(), plural_matches(existing.len()));
    }
    Ok(())
}
