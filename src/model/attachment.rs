//! Attachment metadata and decoded content.

/// Metadata about an email attachment.
#[derive(Debug, Clone)]
pub struct AttachmentMeta {
    /// Filename of the attachment. Generated if missing from the headers.
    pub filename: String,

    /// MIME content type (e.g. `"image/jpeg"`, `"application/pdf"`).
    pub content_type: String,

    /// Decoded size in bytes.
    pub size: u64,

    /// `true` if the part is inline (embedded in HTML), `false` if a regular attachment.
    pub is_inline: bool,
}

/// A decoded attachment ready to be written to disk.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub meta: AttachmentMeta,
    pub data: Vec<u8>,
}
