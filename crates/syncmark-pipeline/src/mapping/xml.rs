//! Small string-based XML writer for mapped documents.
//!
//! Output is compact (no whitespace between elements) so the bytes that are
//! digested are exactly the bytes that are sent.

use quick_xml::escape::escape;

#[derive(Debug, Default)]
pub(crate) struct XmlBuilder {
    out: String,
    open: Vec<String>,
}

impl XmlBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn start_tag(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&escape(*value));
            self.out.push('"');
        }
        self.out.push('>');
    }

    pub(crate) fn open(&mut self, name: &str) -> &mut Self {
        self.open_with(name, &[])
    }

    pub(crate) fn open_with(&mut self, name: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.start_tag(name, attrs);
        self.open.push(name.to_string());
        self
    }

    pub(crate) fn leaf(&mut self, name: &str, value: &str) -> &mut Self {
        self.leaf_with(name, &[], value)
    }

    pub(crate) fn leaf_with(&mut self, name: &str, attrs: &[(&str, &str)], value: &str) -> &mut Self {
        self.start_tag(name, attrs);
        self.out.push_str(&escape(value));
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
        self
    }

    /// Emit the element only when a value is present.
    pub(crate) fn leaf_opt(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.leaf(name, value);
        }
        self
    }

    pub(crate) fn close(&mut self) -> &mut Self {
        if let Some(name) = self.open.pop() {
            self.out.push_str("</");
            self.out.push_str(&name);
            self.out.push('>');
        }
        self
    }

    /// Close all open elements and return the document.
    pub(crate) fn finish(mut self) -> String {
        while !self.open.is_empty() {
            self.close();
        }
        self.out
    }
}
