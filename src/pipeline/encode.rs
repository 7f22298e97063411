//! Format conversions for downloads: `DynamicImage` → PNG, table → CSV.
//!
//! Images are always re-encoded as PNG whatever their source filter was
//! (DCT, Flate, JBIG2, …), so every image artifact opens in any viewer.

use crate::output::ExtractedTable;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode an image as PNG bytes.
pub fn png_bytes(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} PNG bytes",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Encode an image as base64 PNG, the form used in JSON output.
pub fn png_base64(img: &DynamicImage) -> Result<String, image::ImageError> {
    Ok(STANDARD.encode(png_bytes(img)?))
}

/// Render a table as UTF-8 CSV: one header row with the column names, then
/// the data rows. No index column; `\n` record terminators.
pub fn table_to_csv(table: &ExtractedTable) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn table(columns: &[&str], rows: &[&[&str]]) -> ExtractedTable {
        ExtractedTable {
            page: 1,
            table_number: 1,
            columns: columns.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            header_detected: true,
        }
    }

    fn parse_csv(bytes: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);
        let headers = reader
            .headers()
            .expect("headers")
            .iter()
            .map(str::to_string)
            .collect();
        let rows = reader
            .records()
            .map(|r| r.expect("record").iter().map(str::to_string).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let png = png_bytes(&img).expect("encode should succeed");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let b64 = png_base64(&img).expect("encode should succeed");
        let decoded = STANDARD.decode(&b64).expect("valid base64");
        assert_eq!(decoded, png);
    }

    #[test]
    fn csv_has_header_then_rows() {
        let t = table(&["Name", "Qty"], &[&["apple", "3"], &["pear", "10"]]);
        let csv = String::from_utf8(table_to_csv(&t).expect("csv")).expect("utf-8");
        assert_eq!(csv, "Name,Qty\napple,3\npear,10\n");
    }

    #[test]
    fn csv_round_trips_awkward_cells() {
        let t = table(
            &["Item, description", "Note"],
            &[
                &["say \"hi\"", "multi\nline"],
                &["", "ümlaut €"],
            ],
        );
        let bytes = table_to_csv(&t).expect("csv");
        let (headers, rows) = parse_csv(&bytes);
        assert_eq!(headers, t.columns);
        assert_eq!(rows, t.rows);
    }

    #[test]
    fn header_only_table() {
        let t = table(&["A", "B"], &[]);
        let csv = String::from_utf8(table_to_csv(&t).expect("csv")).expect("utf-8");
        assert_eq!(csv, "A,B\n");
    }
}
