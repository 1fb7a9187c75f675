/// Errors that can occur while reading or writing channel-list files.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Invalid lamedb: {0}")]
    InvalidLamedb(String),

    #[error("Invalid XML document: {0}")]
    InvalidXml(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl FormatError {
    pub fn invalid_lamedb(msg: impl Into<String>) -> Self {
        Self::InvalidLamedb(msg.into())
    }

    pub fn invalid_xml(msg: impl Into<String>) -> Self {
        Self::InvalidXml(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
