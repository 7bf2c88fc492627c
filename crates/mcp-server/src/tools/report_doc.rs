/// Minimal markdown document helpers for tool output.
pub(crate) struct ReportDocBuilder {
    out: String,
}

impl ReportDocBuilder {
    const ITEM_INDENT: &'static str = "  ";

    #[must_use]
    pub(crate) fn new() -> Self {
        Self { out: String::new() }
    }

    #[must_use]
    pub(crate) fn finish(self) -> String {
        self.out.trim_end().to_string()
    }

    pub(crate) fn push_line(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }

    pub(crate) fn push_blank(&mut self) {
        if self.out.is_empty() || self.out.ends_with("\n\n") {
            return;
        }
        if !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out.push('\n');
    }

    /// `**label:** value`
    pub(crate) fn push_field(&mut self, label: &str, value: &str) {
        self.push_line(&format!("**{label}:** {value}"));
    }

    pub(crate) fn push_heading(&mut self, label: &str) {
        self.push_line(&format!("**{label}:**"));
    }

    /// Indented line under the previous heading or field.
    pub(crate) fn push_item(&mut self, text: &str) {
        self.push_line(&format!("{}{text}", Self::ITEM_INDENT));
    }

    /// Italic side note.
    pub(crate) fn push_note(&mut self, text: &str) {
        self.push_line(&format!("*{text}*"));
    }
}
