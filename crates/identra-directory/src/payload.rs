//! Denormalized XML entity records.
//!
//! The keeper stores one XML record per entity. The record is flat: one
//! element per field, with relationship collections as nested lists.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::DirectoryError;

/// Builder for a keeper record.
///
/// ```
/// use identra_directory::payload::RecordPayload;
///
/// let xml = RecordPayload::new("account")
///     .field("login", "jane.doe")
///     .field("active", "true")
///     .list("memberships", "group", ["Auditors".to_string()])
///     .to_xml()
///     .unwrap();
/// assert!(xml.contains("<login>jane.doe</login>"));
/// ```
#[derive(Debug, Clone)]
pub struct RecordPayload {
    root: String,
    fields: Vec<(String, String)>,
    lists: Vec<(String, String, Vec<String>)>,
}

impl RecordPayload {
    /// Start a record with the given root element name.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            fields: Vec::new(),
            lists: Vec::new(),
        }
    }

    /// Add a field element.
    #[must_use]
    pub fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    /// Add a field element when a value is present; absent fields are
    /// omitted from the record entirely.
    #[must_use]
    pub fn optional_field(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.field(name, v),
            None => self,
        }
    }

    /// Add a nested list: `<name><item>..</item>..</name>`.
    #[must_use]
    pub fn list(
        mut self,
        name: &str,
        item: &str,
        values: impl IntoIterator<Item = String>,
    ) -> Self {
        self.lists
            .push((name.to_string(), item.to_string(), values.into_iter().collect()));
        self
    }

    /// Serialize the record. Text content is escaped by the writer.
    pub fn to_xml(&self) -> Result<String, DirectoryError> {
        let mut writer = Writer::new(Vec::new());

        write_start(&mut writer, &self.root)?;
        for (name, value) in &self.fields {
            write_element(&mut writer, name, value)?;
        }
        for (name, item, values) in &self.lists {
            write_start(&mut writer, name)?;
            for value in values {
                write_element(&mut writer, item, value)?;
            }
            write_end(&mut writer, name)?;
        }
        write_end(&mut writer, &self.root)?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| DirectoryError::Payload(e.to_string()))
    }
}

fn write_start(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), DirectoryError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| DirectoryError::Payload(e.to_string()))
}

fn write_end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), DirectoryError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| DirectoryError::Payload(e.to_string()))
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &str,
) -> Result<(), DirectoryError> {
    write_start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(|e| DirectoryError::Payload(e.to_string()))?;
    write_end(writer, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_fields_become_elements() {
        let xml = RecordPayload::new("account")
            .field("id", "ACC1")
            .field("login", "jane.doe")
            .to_xml()
            .unwrap();

        assert_eq!(
            xml,
            "<account><id>ACC1</id><login>jane.doe</login></account>"
        );
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let xml = RecordPayload::new("account")
            .optional_field("email", Some("jane@example.com"))
            .optional_field("phone", None)
            .to_xml()
            .unwrap();

        assert!(xml.contains("<email>jane@example.com</email>"));
        assert!(!xml.contains("phone"));
    }

    #[test]
    fn lists_nest_items() {
        let xml = RecordPayload::new("group")
            .field("name", "Auditors")
            .list(
                "members",
                "member",
                ["jane".to_string(), "john".to_string()],
            )
            .to_xml()
            .unwrap();

        assert!(xml.contains("<members><member>jane</member><member>john</member></members>"));
    }

    #[test]
    fn text_content_is_escaped() {
        let xml = RecordPayload::new("account")
            .field("display_name", "Fry & Laurie <dev>")
            .to_xml()
            .unwrap();

        assert!(xml.contains("Fry &amp; Laurie &lt;dev&gt;"));
    }

    #[test]
    fn empty_list_still_emits_container() {
        let xml = RecordPayload::new("account")
            .list("memberships", "group", Vec::new())
            .to_xml()
            .unwrap();

        assert!(xml.contains("<memberships></memberships>"));
    }
}
