//! HTML fragment rendering
//!
//! Builds the preview tiles and the analysis modal as plain HTML strings.
//! Styling and DOM wiring live in the consuming front end; the fragments
//! only carry class names and `data-index` attributes for it to hook into.

use crate::store::AnalysisRecord;

/// Message shown on the tile of a rejected file.
pub const MSG_UNSUPPORTED_FORMAT: &str = "unsupported file format";

/// Message shown when the HEIC path runs without a transcoder.
pub const MSG_TRANSCODER_UNAVAILABLE: &str = "HEIC/HEIF support library not loaded";

/// Message shown when the transcoder rejects a file.
pub const MSG_TRANSCODE_FAILED: &str = "HEIC/HEIF conversion failed";

/// Message shown when a file could not be read from disk.
pub const MSG_UNREADABLE_FILE: &str = "could not read file";

/// Modal body shown for a record with no projected fields.
pub const MSG_NO_EXIF: &str = "no EXIF information found";

/// Preview tile for a decodable image, with an inline data-URL thumbnail.
pub fn preview_tile(file_name: &str, data_url: &str, size_bytes: u64, index: usize) -> String {
    format!(
        concat!(
            "<div class=\"image-item\">",
            "<img src=\"{src}\" alt=\"{name}\">",
            "<div class=\"image-title\">{name}</div>",
            "<div class=\"image-size\">{size}</div>",
            "<button class=\"analyze-button\" data-index=\"{index}\">Show analysis</button>",
            "</div>"
        ),
        src = data_url,
        name = file_name,
        size = format_file_size(size_bytes),
        index = index,
    )
}

/// Tile for a RAW file. No preview image, decoding is not attempted.
pub fn raw_placeholder_tile(file_name: &str, index: usize) -> String {
    format!(
        concat!(
            "<div class=\"image-item\">",
            "<div class=\"raw-placeholder\">RAW</div>",
            "<div class=\"image-title\">{name}</div>",
            "<button class=\"analyze-button\" data-index=\"{index}\">Show analysis</button>",
            "</div>"
        ),
        name = file_name,
        index = index,
    )
}

/// Tile reserved at intake while a file's pipeline is still running.
pub fn pending_tile(file_name: &str) -> String {
    format!(
        concat!(
            "<div class=\"image-item pending-item\">",
            "<div class=\"image-title\">{name}</div>",
            "</div>"
        ),
        name = file_name,
    )
}

/// Tile for a file the pipeline gave up on.
pub fn error_tile(file_name: &str, message: &str) -> String {
    format!(
        concat!(
            "<div class=\"image-item error-item\">",
            "<div class=\"image-title\">{name}</div>",
            "<div class=\"error-message\">{message}</div>",
            "</div>"
        ),
        name = file_name,
        message = message,
    )
}

/// Control opening the position in Google Maps in a new browsing context.
/// The URL keeps full float precision; only the visible coordinate string
/// is truncated.
pub fn map_link_button(lat: f64, lon: f64) -> String {
    format!(
        "<button class=\"map-link-button\" \
         onclick=\"window.open('https://www.google.com/maps?q={lat},{lon}', '_blank')\">\
         Open in Google Maps</button>"
    )
}

/// Analysis modal for one stored record.
///
/// Dismissed only by the close control; nothing limits how many modals a
/// caller may have open at once.
pub fn modal(record: &AnalysisRecord, index: usize) -> String {
    let fields = record.summary.fields();
    let body = if fields.is_empty() {
        format!("<div class=\"no-exif\">{MSG_NO_EXIF}</div>")
    } else {
        fields
            .iter()
            .map(|(label, value)| {
                format!(
                    "<div class=\"exif-item\">\
                     <span class=\"exif-label\">{label}:</span> \
                     <span class=\"exif-value\">{value}</span>\
                     </div>"
                )
            })
            .collect::<Vec<_>>()
            .join("")
    };

    format!(
        concat!(
            "<div class=\"exif-modal\" id=\"exif-modal-{index}\">",
            "<div class=\"modal-content\">",
            "<div class=\"modal-header\">",
            "<h3>{name}</h3>",
            "<button class=\"modal-close\" onclick=\"this.closest('.exif-modal').remove()\">&times;</button>",
            "</div>",
            "<div class=\"modal-body\">{body}</div>",
            "</div>",
            "</div>"
        ),
        index = index,
        name = record.file_name,
        body = body,
    )
}

/// Human-readable byte count for tile captions.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    format!("{:.2} {}", value, UNITS[exp])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ExifSummary;

    #[test]
    fn test_modal_with_fields() {
        let record = AnalysisRecord {
            file_name: "shot.jpg".to_string(),
            summary: ExifSummary {
                make: Some("Nikon".to_string()),
                model: Some("D850".to_string()),
                ..Default::default()
            },
        };
        let html = modal(&record, 3);
        assert!(html.contains("exif-modal-3"));
        assert!(html.contains("shot.jpg"));
        assert!(html.contains("Manufacturer:"));
        assert!(html.contains("Nikon"));
        assert!(!html.contains(MSG_NO_EXIF));
    }

    #[test]
    fn test_modal_without_fields() {
        let record = AnalysisRecord {
            file_name: "blank.png".to_string(),
            summary: ExifSummary::default(),
        };
        let html = modal(&record, 0);
        assert!(html.contains(MSG_NO_EXIF));
        assert!(html.contains("blank.png"));
    }

    #[test]
    fn test_map_link_url() {
        let html = map_link_button(35.689444, 139.691667);
        assert!(html.contains("https://www.google.com/maps?q=35.689444,139.691667"));
        assert!(html.contains("_blank"));
    }

    #[test]
    fn test_error_tile_message() {
        let html = error_tile("notes.txt", MSG_UNSUPPORTED_FORMAT);
        assert!(html.contains("notes.txt"));
        assert!(html.contains(MSG_UNSUPPORTED_FORMAT));
        assert!(html.contains("error-item"));
    }

    #[test]
    fn test_file_size_formatting() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.00 B");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.00 MB");
    }
}
