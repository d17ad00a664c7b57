//! EXIF metadata projection
//!
//! Reads the EXIF block of an image with kamadak-exif and projects a fixed
//! subset of tags into [`ExifSummary`]:
//!
//! - camera manufacturer and model (`Make`, `Model`)
//! - capture timestamp (`DateTime`)
//! - GPS position as signed decimal degrees, plus a map-link control
//! - GPS timestamp and altitude
//!
//! A tag that is missing from the file is an absent field, never an empty
//! string. Files without a readable EXIF block yield an empty summary.

use exif::{Exif, In, Tag, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::render;

/// Field labels used by the modal renderer, in display order.
pub const LABEL_MAKE: &str = "Manufacturer";
pub const LABEL_MODEL: &str = "Model";
pub const LABEL_CAPTURED: &str = "Captured";
pub const LABEL_COORDINATES: &str = "Coordinates";
pub const LABEL_MAP: &str = "Google Map";
pub const LABEL_GPS_TIME: &str = "GPS time";
pub const LABEL_ALTITUDE: &str = "Altitude";

/// Projected EXIF metadata for one file.
///
/// Every field is optional; absence means the source tag was not present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExifSummary {
    /// Camera manufacturer (`Make`)
    pub make: Option<String>,

    /// Camera model (`Model`)
    pub model: Option<String>,

    /// Capture timestamp (`DateTime`), as rendered by the reader
    pub captured_at: Option<String>,

    /// Position as `"{lat:.6}, {lon:.6}"`, present only when the file
    /// carries both latitude and longitude
    pub coordinates: Option<String>,

    /// Map-link control markup derived from the decimal position
    pub map_link: Option<String>,

    /// GPS timestamp (`GPSTimeStamp`)
    pub gps_time: Option<String>,

    /// GPS altitude with an `m` suffix
    pub altitude: Option<String>,
}

impl ExifSummary {
    /// True when no tag was projected at all.
    pub fn is_empty(&self) -> bool {
        self.make.is_none()
            && self.model.is_none()
            && self.captured_at.is_none()
            && self.coordinates.is_none()
            && self.map_link.is_none()
            && self.gps_time.is_none()
            && self.altitude.is_none()
    }

    /// Present fields as `(label, value)` pairs in display order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        fn add<'a>(
            out: &mut Vec<(&'static str, &'a str)>,
            label: &'static str,
            value: Option<&'a String>,
        ) {
            if let Some(v) = value {
                out.push((label, v.as_str()));
            }
        }

        let mut out = Vec::new();
        add(&mut out, LABEL_MAKE, self.make.as_ref());
        add(&mut out, LABEL_MODEL, self.model.as_ref());
        add(&mut out, LABEL_CAPTURED, self.captured_at.as_ref());
        add(&mut out, LABEL_COORDINATES, self.coordinates.as_ref());
        add(&mut out, LABEL_MAP, self.map_link.as_ref());
        add(&mut out, LABEL_GPS_TIME, self.gps_time.as_ref());
        add(&mut out, LABEL_ALTITUDE, self.altitude.as_ref());
        out
    }
}

/// Read and project the EXIF block of an in-memory image.
///
/// An unreadable or absent EXIF block is not an error: it yields an empty
/// summary, which the projector renders as "no EXIF information found".
pub fn read_summary(bytes: &[u8]) -> ExifSummary {
    let mut cursor = std::io::Cursor::new(bytes);
    let parsed = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(error = %err, "no readable EXIF block");
            return ExifSummary::default();
        }
    };
    project(&parsed)
}

fn project(data: &Exif) -> ExifSummary {
    let get_str = |tag: Tag| -> Option<String> {
        let field = data.get_field(tag, In::PRIMARY)?;
        // kamadak-exif quotes ASCII values when displaying them
        let text = field.display_value().to_string();
        let text = text.trim().trim_matches('"').trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    };

    let altitude = data
        .get_field(Tag::GPSAltitude, In::PRIMARY)
        .and_then(|field| match &field.value {
            Value::Rational(v) if !v.is_empty() && v[0].denom != 0 => {
                Some(format!("{}m", v[0].to_f64()))
            }
            _ => None,
        });

    let mut summary = ExifSummary {
        make: get_str(Tag::Make),
        model: get_str(Tag::Model),
        captured_at: get_str(Tag::DateTime),
        gps_time: get_str(Tag::GPSTimeStamp),
        altitude,
        ..Default::default()
    };

    if let Some((lat, lon)) = gps_pair(data) {
        summary.coordinates = Some(coordinate_string(lat, lon));
        summary.map_link = Some(render::map_link_button(lat, lon));
    }

    summary
}

/// Signed decimal position, present only when both coordinate tags parse.
fn gps_pair(data: &Exif) -> Option<(f64, f64)> {
    let lat_field = data.get_field(Tag::GPSLatitude, In::PRIMARY)?;
    let lon_field = data.get_field(Tag::GPSLongitude, In::PRIMARY)?;

    let [d, m, s] = rational_triplet(&lat_field.value)?;
    let lat = dms_to_decimal(d, m, s, ref_letter(data, Tag::GPSLatitudeRef).as_deref());

    let [d, m, s] = rational_triplet(&lon_field.value)?;
    let lon = dms_to_decimal(d, m, s, ref_letter(data, Tag::GPSLongitudeRef).as_deref());

    Some((lat, lon))
}

/// Degrees/minutes/seconds from an EXIF rational sequence.
/// Returns None on short sequences or zero denominators.
fn rational_triplet(value: &Value) -> Option<[f64; 3]> {
    if let Value::Rational(rats) = value {
        if rats.len() >= 3 {
            if rats[0].denom == 0 || rats[1].denom == 0 || rats[2].denom == 0 {
                return None;
            }
            return Some([rats[0].to_f64(), rats[1].to_f64(), rats[2].to_f64()]);
        }
    }
    None
}

fn ref_letter(data: &Exif, tag: Tag) -> Option<String> {
    let field = data.get_field(tag, In::PRIMARY)?;
    let text = field.value.display_as(tag).to_string();
    let text = text.trim().trim_matches('"').trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// DMS to signed decimal degrees: `dd = deg + min/60 + sec/3600`,
/// negated for southern latitudes and western longitudes.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, reference: Option<&str>) -> f64 {
    let dd = degrees + minutes / 60.0 + seconds / 3600.0;
    match reference {
        Some(r) if r.eq_ignore_ascii_case("S") || r.eq_ignore_ascii_case("W") => -dd,
        _ => dd,
    }
}

/// Display form of a decimal position, fixed at six decimal places.
pub fn coordinate_string(lat: f64, lon: f64) -> String {
    format!("{lat:.6}, {lon:.6}")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal little-endian TIFF with Make="Ab" and Model="Cd" in IFD0.
    fn tiff_with_make_and_model() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"II\x2a\x00");
        buf.extend_from_slice(&8u32.to_le_bytes()); // IFD0 offset
        buf.extend_from_slice(&2u16.to_le_bytes()); // entry count
        // Make (0x010f), ASCII, 3 bytes, inline value
        buf.extend_from_slice(&0x010fu16.to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(b"Ab\x00\x00");
        // Model (0x0110), ASCII, 3 bytes, inline value
        buf.extend_from_slice(&0x0110u16.to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(b"Cd\x00\x00");
        buf.extend_from_slice(&0u32.to_le_bytes()); // no next IFD
        buf
    }

    // TIFF whose IFD0 points at a GPS IFD with 35°41'22"N, 139°41'30"E.
    fn tiff_with_gps() -> Vec<u8> {
        fn entry(buf: &mut Vec<u8>, tag: u16, typ: u16, count: u32, value: [u8; 4]) {
            buf.extend_from_slice(&tag.to_le_bytes());
            buf.extend_from_slice(&typ.to_le_bytes());
            buf.extend_from_slice(&count.to_le_bytes());
            buf.extend_from_slice(&value);
        }

        let mut buf = Vec::new();
        buf.extend_from_slice(b"II\x2a\x00");
        buf.extend_from_slice(&8u32.to_le_bytes());
        // IFD0: one entry, the GPS IFD pointer (0x8825) at offset 26
        buf.extend_from_slice(&1u16.to_le_bytes());
        entry(&mut buf, 0x8825, 4, 1, 26u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        // GPS IFD: refs inline, rational triplets at offsets 80 and 104
        buf.extend_from_slice(&4u16.to_le_bytes());
        entry(&mut buf, 0x0001, 2, 2, *b"N\x00\x00\x00");
        entry(&mut buf, 0x0002, 5, 3, 80u32.to_le_bytes());
        entry(&mut buf, 0x0003, 2, 2, *b"E\x00\x00\x00");
        entry(&mut buf, 0x0004, 5, 3, 104u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        for (num, denom) in [(35, 1), (41, 1), (22, 1), (139, 1), (41, 1), (30, 1)] {
            buf.extend_from_slice(&(num as u32).to_le_bytes());
            buf.extend_from_slice(&(denom as u32).to_le_bytes());
        }
        assert_eq!(buf.len(), 128);
        buf
    }

    #[test]
    fn test_dms_conversion() {
        assert_eq!(dms_to_decimal(10.0, 30.0, 0.0, Some("N")), 10.5);
        assert_eq!(dms_to_decimal(10.0, 30.0, 0.0, Some("S")), -10.5);
        assert_eq!(dms_to_decimal(10.0, 30.0, 0.0, Some("W")), -10.5);
        assert_eq!(dms_to_decimal(10.0, 30.0, 0.0, None), 10.5);
    }

    #[test]
    fn test_coordinate_string_rounding() {
        let lat = dms_to_decimal(35.0, 41.0, 22.0, Some("N"));
        let lon = dms_to_decimal(139.0, 41.0, 30.0, Some("E"));
        assert_eq!(coordinate_string(lat, lon), "35.689444, 139.691667");
    }

    #[test]
    fn test_summary_from_tiff() {
        let summary = read_summary(&tiff_with_make_and_model());
        assert_eq!(summary.make.as_deref(), Some("Ab"));
        assert_eq!(summary.model.as_deref(), Some("Cd"));
        assert!(summary.coordinates.is_none());
        assert!(!summary.is_empty());
    }

    #[test]
    fn test_gps_projection_from_tiff() {
        let summary = read_summary(&tiff_with_gps());
        assert_eq!(summary.coordinates.as_deref(), Some("35.689444, 139.691667"));
        let link = summary.map_link.as_deref().unwrap();
        assert!(link.contains("https://www.google.com/maps?q="));
        assert!(summary.make.is_none());
        assert!(summary.altitude.is_none());
    }

    #[test]
    fn test_unreadable_bytes_yield_empty_summary() {
        let summary = read_summary(b"definitely not an image");
        assert!(summary.is_empty());
        assert!(summary.fields().is_empty());
    }

    #[test]
    fn test_fields_skip_absent_tags() {
        let summary = ExifSummary {
            model: Some("X100".to_string()),
            altitude: Some("35.5m".to_string()),
            ..Default::default()
        };
        let fields = summary.fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], (LABEL_MODEL, "X100"));
        assert_eq!(fields[1], (LABEL_ALTITUDE, "35.5m"));
    }
}
