// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Chart and graph page templates with a single payload substitution point.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::GraphMetrics;

pub const PAYLOAD_MARKER: &str = "{{payload}}";

const BUILTIN_BAR: &str = include_str!("../../templates/fcn_bar.html");
const BUILTIN_RADIAL: &str = include_str!("../../templates/fcn_radial.html");
const BUILTIN_GRAPH: &str = include_str!("../../templates/mini_graph.html");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    BarChart,
    RadialChart,
    MiniGraph,
}

impl TemplateKind {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::BarChart => "fcn_bar.html",
            Self::RadialChart => "fcn_radial.html",
            Self::MiniGraph => "mini_graph.html",
        }
    }

    fn builtin(self) -> &'static str {
        match self {
            Self::BarChart => BUILTIN_BAR,
            Self::RadialChart => BUILTIN_RADIAL,
            Self::MiniGraph => BUILTIN_GRAPH,
        }
    }
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("missing template {name} at {path:?}: {source}")]
    Missing {
        name: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[error("template {name} has no {{{{payload}}}} substitution point")]
    NoMarker { name: &'static str },
}

/// Rendered bar and radial chart pages for one set of metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPages {
    pub bar: String,
    pub radial: String,
}

/// Source of chart and graph templates.
///
/// Without a directory the built-in pages are used. With one, each render reads the file
/// fresh so edits show up on the next focus change.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    dir: Option<PathBuf>,
}

impl TemplateStore {
    pub fn builtin() -> Self {
        Self { dir: None }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn load(&self, kind: TemplateKind) -> Result<String, TemplateError> {
        let text = match &self.dir {
            None => kind.builtin().to_owned(),
            Some(dir) => {
                let path = dir.join(kind.file_name());
                fs::read_to_string(&path).map_err(|source| TemplateError::Missing {
                    name: kind.file_name(),
                    path,
                    source,
                })?
            }
        };
        if !text.contains(PAYLOAD_MARKER) {
            return Err(TemplateError::NoMarker {
                name: kind.file_name(),
            });
        }
        Ok(text)
    }

    pub fn render(&self, kind: TemplateKind, payload: &str) -> Result<String, TemplateError> {
        let template = self.load(kind)?;
        Ok(template.replacen(PAYLOAD_MARKER, payload, 1))
    }

    /// Bar charts take quoted values, radial charts bare numbers; both in chart field order.
    pub fn render_charts(&self, metrics: &GraphMetrics) -> Result<ChartPages, TemplateError> {
        let values = metrics.chart_fields();
        let mut buffer = itoa::Buffer::new();
        let mut quoted = String::new();
        let mut bare = String::new();
        for (idx, value) in values.iter().enumerate() {
            if idx > 0 {
                quoted.push_str(", ");
                bare.push_str(", ");
            }
            let digits = buffer.format(*value);
            quoted.push('"');
            quoted.push_str(digits);
            quoted.push('"');
            bare.push_str(digits);
        }

        Ok(ChartPages {
            bar: self.render(TemplateKind::BarChart, &quoted)?,
            radial: self.render(TemplateKind::RadialChart, &bare)?,
        })
    }

    /// The description is embedded as a JSON string literal.
    pub fn render_graph(&self, description: &str) -> Result<String, TemplateError> {
        let literal = serde_json::Value::String(description.to_owned()).to_string();
        self.render(TemplateKind::MiniGraph, &literal)
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::{TemplateError, TemplateKind, TemplateStore, PAYLOAD_MARKER};
    use crate::model::GraphMetrics;

    fn metrics() -> GraphMetrics {
        GraphMetrics {
            outgoing: 1,
            incoming: 2,
            cyclomatic_complexity: 3,
            basic_blocks: 4,
            exit_blocks: 5,
        }
    }

    #[test]
    fn builtin_templates_have_marker() {
        let store = TemplateStore::builtin();
        for kind in [
            TemplateKind::BarChart,
            TemplateKind::RadialChart,
            TemplateKind::MiniGraph,
        ] {
            assert!(store.load(kind).expect("builtin").contains(PAYLOAD_MARKER));
        }
    }

    #[test]
    fn charts_use_fixed_field_order() {
        let pages = TemplateStore::builtin()
            .render_charts(&metrics())
            .expect("charts");
        assert!(pages.bar.contains(r#"["3", "1", "4", "2", "5"]"#));
        assert!(pages.radial.contains("[3, 1, 4, 2, 5]"));
        assert!(!pages.bar.contains(PAYLOAD_MARKER));
    }

    #[test]
    fn graph_description_is_escaped() {
        let page = TemplateStore::builtin()
            .render_graph("digraph \"main\" {\n}")
            .expect("graph");
        assert!(page.contains(r#"var description = "digraph \"main\" {\n}";"#));
    }

    #[test]
    fn missing_directory_template_is_reported() {
        let store = TemplateStore::from_dir(env::temp_dir().join("disview-no-such-template-dir"));
        let err = store.render_charts(&metrics()).unwrap_err();
        assert!(matches!(err, TemplateError::Missing { name: "fcn_bar.html", .. }));
    }

    #[test]
    fn template_without_marker_is_rejected() {
        let dir = env::temp_dir().join(format!("disview-templates-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("mini_graph.html"), "<html></html>").unwrap();
        let err = TemplateStore::from_dir(&dir).render_graph("g").unwrap_err();
        let _ = std::fs::remove_dir_all(&dir);
        assert!(matches!(err, TemplateError::NoMarker { .. }));
    }
}
