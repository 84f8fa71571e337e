use tabled::{settings::Style, Table, Tabled};

use crate::content::LocalizedContent;
use crate::page::Page;

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct PageRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Title")]
    title: String,
}

#[derive(Tabled)]
struct ContentRow {
    #[tabled(rename = "Pos")]
    position: i64,
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Context")]
    context: String,
    #[tabled(rename = "Attachment")]
    attachment: String,
}

fn render<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn stats_table(stats: &[(&str, String)]) -> String {
    let rows: Vec<StatRow> = stats
        .iter()
        .map(|(label, value)| StatRow {
            metric: label.to_string(),
            value: value.clone(),
        })
        .collect();
    render(&rows)
}

pub fn pages_table(pages: &[Page]) -> String {
    let rows: Vec<PageRow> = pages
        .iter()
        .map(|p| PageRow {
            id: p.id,
            path: p.path.clone(),
            title: p.title.clone(),
        })
        .collect();
    render(&rows)
}

pub fn contents_table(contents: &[LocalizedContent]) -> String {
    let rows: Vec<ContentRow> = contents
        .iter()
        .map(|c| ContentRow {
            position: c.position,
            id: c.id,
            title: c.title.clone(),
            context: c.context.clone().unwrap_or_default(),
            attachment: c
                .attachment
                .as_ref()
                .map(|a| a.file_name.clone())
                .unwrap_or_default(),
        })
        .collect();
    render(&rows)
}
