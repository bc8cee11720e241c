//! Deterministic text report of an archive's layout.

use std::collections::BTreeMap;

use super::classify::{FileCategory, FileClassification};

/// Directory tree node; `None` marks a file leaf.
#[derive(Debug, Default)]
struct TreeNode {
    children: BTreeMap<String, Option<TreeNode>>,
}

impl TreeNode {
    fn insert(&mut self, path: &str, is_dir: bool) {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let mut current = self;
        for (i, part) in parts.iter().enumerate() {
            let is_leaf_file = i == parts.len() - 1 && !is_dir;
            let slot = current
                .children
                .entry(part.to_string())
                .or_insert_with(|| (!is_leaf_file).then(TreeNode::default));
            match slot {
                Some(node) => current = node,
                None => return,
            }
        }
    }

    fn render(&self, prefix: &str, lines: &mut Vec<String>) {
        let count = self.children.len();
        for (i, (name, child)) in self.children.iter().enumerate() {
            let is_last = i + 1 == count;
            let connector = match (prefix.is_empty(), is_last) {
                (true, _) => "",
                (false, true) => "└── ",
                (false, false) => "├── ",
            };
            lines.push(format!("{}{}{}", prefix, connector, name));

            if let Some(node) = child {
                let extension = if is_last { "    " } else { "│   " };
                node.render(&format!("{}{}", prefix, extension), lines);
            }
        }
    }
}

/// Render the structure report: summary counts, file tree, per-category listing.
pub fn format_report(classification: &FileClassification) -> String {
    let mut lines = vec![
        "PROJECT STRUCTURE ANALYSIS".to_string(),
        "=".repeat(50),
        format!("\nTotal Directories: {}", classification.directories.len()),
    ];
    for category in FileCategory::ALL {
        lines.push(format!(
            "{}: {}",
            category.count_label(),
            classification.files(category).len()
        ));
    }

    lines.push("\n\nPROJECT FILE TREE:".to_string());
    let mut tree = TreeNode::default();
    let mut paths: Vec<(&str, bool)> = classification
        .directories
        .iter()
        .map(|d| (d.as_str(), true))
        .chain(classification.all_files().map(|f| (f, false)))
        .collect();
    paths.sort_by(|a, b| a.0.cmp(b.0));
    for (path, is_dir) in paths {
        tree.insert(path, is_dir);
    }
    tree.render("", &mut lines);

    lines.push("\n\nFILE TYPE BREAKDOWN:".to_string());
    for category in FileCategory::ALL {
        let files = classification.files(category);
        if files.is_empty() {
            continue;
        }
        lines.push(format!("\n  {}:", category.breakdown_heading()));
        lines.extend(files.iter().map(|f| format!("    - {}", f)));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileClassification {
        FileClassification::from_entries([
            ("app/", true),
            ("app/main.py", false),
            ("app/routes/", true),
            ("app/routes/orders.py", false),
            ("app/routes/users.py", false),
            ("Dockerfile", false),
            ("infra/main.tf", false),
        ])
    }

    #[test]
    fn test_report_layout() {
        let report = format_report(&sample());
        let expected = "\
PROJECT STRUCTURE ANALYSIS
==================================================

Total Directories: 2
Python Files: 3
TypeScript Files: 0
TSX Files: 0
JavaScript Files: 0
PHP Files: 0
Java Files: 0
XML Files: 0
Terraform Files: 1
Configuration Files: 1
Other Files: 0


PROJECT FILE TREE:
Dockerfile
app
│   ├── main.py
│   └── routes
│       ├── orders.py
│       └── users.py
infra
    └── main.tf


FILE TYPE BREAKDOWN:

  Python Source Files:
    - app/main.py
    - app/routes/orders.py
    - app/routes/users.py

  Terraform Files:
    - infra/main.tf

  Configuration Files:
    - Dockerfile";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_report_is_deterministic() {
        let c = sample();
        assert_eq!(format_report(&c), format_report(&c));
    }

    #[test]
    fn test_non_last_top_level_uses_bar_prefix() {
        let c = FileClassification::from_entries([("a/x.py", false), ("b/y.py", false)]);
        let report = format_report(&c);
        assert!(report.contains("a\n│   └── x.py\nb\n    └── y.py"));
    }

    #[test]
    fn test_empty_archive() {
        let report = format_report(&FileClassification::default());
        assert!(report.contains("Total Directories: 0"));
        assert!(report.ends_with("FILE TYPE BREAKDOWN:"));
    }
}
