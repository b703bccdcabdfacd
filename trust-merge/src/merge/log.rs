//! Diagnostics collected while reconciling.
//!
//! Nothing recorded here stops a merge. Notices describe expected situations
//! (a rule location absent from the result); warnings describe rule sets that
//! probably do not do what their author meant.

use std::io::Write;

/// Kinds of log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    /// A rule's location has no parent in the trusted document.
    StructuralAbsence,
    /// A stop rule has child rules, which are never applied.
    StopRuleChildren,
    /// A rule or id path failed to compile.
    InvalidQuery,
    /// A rule's matches had more than one parent; only the last is used.
    SplitParents,
    /// The rule set has no docroot rule.
    MissingDocroot,
    /// The merge produced no root element.
    EmptyResult,
}

/// How serious an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Notice,
    Warning,
}

impl LogKind {
    /// Returns the XML tag name for this kind.
    pub fn tag_name(&self) -> &'static str {
        match self {
            LogKind::StructuralAbsence => "absent",
            LogKind::StopRuleChildren => "stop-children",
            LogKind::InvalidQuery => "invalid-query",
            LogKind::SplitParents => "split-parents",
            LogKind::MissingDocroot => "missing-docroot",
            LogKind::EmptyResult => "empty-result",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            LogKind::StructuralAbsence | LogKind::EmptyResult => Severity::Notice,
            _ => Severity::Warning,
        }
    }
}

/// A single notice or warning.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub kind: LogKind,
    pub text: String,
    /// Absolute path of the rule being applied, if any.
    pub rule_path: Option<String>,
}

/// Log of notices and warnings from one merge.
#[derive(Debug, Default)]
pub struct MergeLog {
    notices: Vec<LogEntry>,
    warnings: Vec<LogEntry>,
}

impl MergeLog {
    pub fn new() -> Self {
        MergeLog::default()
    }

    /// Records an entry and emits the matching tracing event.
    pub fn add(&mut self, kind: LogKind, text: impl Into<String>, rule_path: Option<&str>) {
        let entry = LogEntry {
            kind,
            text: text.into(),
            rule_path: rule_path.map(str::to_string),
        };
        let rule = entry.rule_path.as_deref().unwrap_or("");

        match kind {
            LogKind::StructuralAbsence => {
                tracing::debug!(rule, kind = kind.tag_name(), "{}", entry.text)
            }
            LogKind::EmptyResult => tracing::info!(kind = kind.tag_name(), "{}", entry.text),
            _ => tracing::warn!(rule, kind = kind.tag_name(), "{}", entry.text),
        }

        match kind.severity() {
            Severity::Notice => self.notices.push(entry),
            Severity::Warning => self.warnings.push(entry),
        }
    }

    pub fn notices(&self) -> &[LogEntry] {
        &self.notices
    }

    pub fn warnings(&self) -> &[LogEntry] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty() && self.warnings.is_empty()
    }

    /// Returns all entries of one kind, notices first.
    pub fn entries_of(&self, kind: LogKind) -> impl Iterator<Item = &LogEntry> {
        self.notices
            .iter()
            .chain(self.warnings.iter())
            .filter(move |e| e.kind == kind)
    }

    /// Writes the log as XML.
    pub fn write_xml<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(writer, "<mergelog>")?;

        if !self.warnings.is_empty() {
            writeln!(writer, "  <warnings>")?;
            for entry in &self.warnings {
                write_entry(writer, entry, "    ")?;
            }
            writeln!(writer, "  </warnings>")?;
        }

        if !self.notices.is_empty() {
            writeln!(writer, "  <notices>")?;
            for entry in &self.notices {
                write_entry(writer, entry, "    ")?;
            }
            writeln!(writer, "  </notices>")?;
        }

        writeln!(writer, "</mergelog>")?;
        Ok(())
    }
}

fn write_entry<W: Write>(writer: &mut W, entry: &LogEntry, indent: &str) -> std::io::Result<()> {
    let tag = entry.kind.tag_name();
    match &entry.rule_path {
        Some(path) => writeln!(writer, "{}<{} rule=\"{}\">", indent, tag, escape_xml(path))?,
        None => writeln!(writer, "{}<{}>", indent, tag)?,
    }
    writeln!(writer, "{}  {}", indent, escape_xml(&entry.text))?;
    writeln!(writer, "{}</{}>", indent, tag)?;
    Ok(())
}

/// Escapes special characters in XML content.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_split() {
        let mut log = MergeLog::new();
        assert!(log.is_empty());

        log.add(LogKind::StructuralAbsence, "no parent", Some("/a/b"));
        log.add(LogKind::StopRuleChildren, "stop rule has children", Some("/a"));

        assert_eq!(log.notices().len(), 1);
        assert_eq!(log.warnings().len(), 1);
        assert!(log.has_warnings());
        assert_eq!(log.entries_of(LogKind::StopRuleChildren).count(), 1);
        assert_eq!(log.entries_of(LogKind::InvalidQuery).count(), 0);
    }

    #[test]
    fn test_write_xml() {
        let mut log = MergeLog::new();
        log.add(LogKind::InvalidQuery, "bad <path>", Some("/a[@x='1']"));
        log.add(LogKind::EmptyResult, "empty", None);

        let mut out = Vec::new();
        log.write_xml(&mut out).unwrap();
        let xml = String::from_utf8(out).unwrap();

        assert!(xml.contains("<invalid-query rule=\"/a[@x='1']\">"));
        assert!(xml.contains("bad &lt;path&gt;"));
        assert!(xml.contains("<empty-result>"));
        assert!(xml.find("<warnings>").unwrap() < xml.find("<notices>").unwrap());
    }
}
