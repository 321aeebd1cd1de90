//! Report output helpers
//!
//! Section headers and aligned text tables for the diagnosis report.
//! Column widths are computed per table as the max of the header width and
//! every cell width in that column, recomputed independently for each table.

use colored::Colorize;

/// Print a bold section title over a 40-dash rule, preceded by a blank line.
pub fn section_header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("----------------------------------------");
}

/// An aligned text table indented under a diagnosis section.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_widths(&self) -> Vec<usize> {
        (0..self.headers.len())
            .map(|i| {
                let header_width = self.headers[i].chars().count();
                self.rows
                    .iter()
                    .map(|row| row.get(i).map(|c| c.chars().count()).unwrap_or(0))
                    .fold(header_width, usize::max)
            })
            .collect()
    }

    /// Render with a 4-space indent, two-space column gap, and a dash rule
    /// between the header and the rows.
    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let mut lines = Vec::with_capacity(self.rows.len() + 2);

        lines.push(format_row(&self.headers, &widths));
        lines.push(format!(
            "    {}",
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  ")
        ));
        for row in &self.rows {
            lines.push(format_row(row, &widths));
        }
        lines.join("\n")
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            format!("{:<width$}", cell, width = w)
        })
        .collect();
    format!("    {}", padded.join("  "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new(&["RESOURCE", "COMMAND"]);
        table.add_row(vec![
            "pod/web".to_string(),
            "kubectl delete pod/web -n app".to_string(),
        ]);
        table.add_row(vec![
            "configmap/settings".to_string(),
            "kubectl delete configmap/settings -n app".to_string(),
        ]);
        table
    }

    #[test]
    fn test_widths_are_max_of_header_and_cells() {
        let table = sample();
        // "configmap/settings" (18) beats "RESOURCE" (8)
        assert_eq!(table.column_widths(), vec![18, 40]);
    }

    #[test]
    fn test_header_width_wins_over_short_cells() {
        let mut table = Table::new(&["RESOURCE TYPE", "RESOURCE"]);
        table.add_row(vec!["pods".to_string(), "pod/a".to_string()]);
        assert_eq!(table.column_widths(), vec![13, 8]);
    }

    #[test]
    fn test_render_layout() {
        let table = sample();
        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("    RESOURCE"));
        assert_eq!(lines[1], format!("    {}  {}", "-".repeat(18), "-".repeat(40)));
        // all rows share the same indent
        assert!(lines.iter().all(|l| l.starts_with("    ")));
        // cells are left-aligned into their columns
        assert!(lines[2].contains("pod/web             kubectl delete pod/web -n app"));
    }

    #[test]
    fn test_widths_recomputed_per_table() {
        let mut narrow = Table::new(&["RESOURCE", "COMMAND"]);
        narrow.add_row(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(narrow.column_widths(), vec![8, 7]);

        let wide = sample();
        assert_ne!(narrow.column_widths(), wide.column_widths());
    }
}
