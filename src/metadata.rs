use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Line substituted when a file carries no readable photographic metadata.
pub const NO_METADATA: &str = "No photographic EXIF data found";

/// Best-effort source of human-readable `key: value` metadata lines.
/// Implementations must not fail: degraded output is the fallback line.
pub trait MetadataSource {
    fn read(&self, path: &Path) -> Vec<String>;
}

/// Reads photographic EXIF tags in-process.
pub struct ExifSource;

impl MetadataSource for ExifSource {
    fn read(&self, path: &Path) -> Vec<String> {
        let mut lines = Vec::new();

        if let Ok(file) = File::open(path) {
            let mut reader = BufReader::new(file);
            if let Ok(exif) = exif::Reader::new().read_from_container(&mut reader) {
                let tags = [
                    (exif::Tag::Make, "Make"),
                    (exif::Tag::Model, "Model"),
                    (exif::Tag::ExposureTime, "ExposureTime"),
                    (exif::Tag::FNumber, "FNumber"),
                    (exif::Tag::PhotographicSensitivity, "ISO"),
                    (exif::Tag::DateTimeOriginal, "DateTimeOriginal"),
                ];
                for (tag, label) in tags {
                    if let Some(field) = exif.get_field(tag, exif::In::PRIMARY) {
                        lines.push(format!(
                            "{}: {}",
                            label,
                            field.display_value().with_unit(&exif)
                        ));
                    }
                }
            }
        }

        if lines.is_empty() {
            lines.push(NO_METADATA.to_string());
        }
        lines
    }
}

/// Source that never reports anything; keeps tests free of EXIF fixtures.
pub struct NoMetadata;

impl MetadataSource for NoMetadata {
    fn read(&self, _path: &Path) -> Vec<String> {
        vec![NO_METADATA.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exif_source_degrades_to_fallback_line() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plain.png");
        image::RgbaImage::new(2, 2).save(&path).unwrap();

        assert_eq!(ExifSource.read(&path), vec![NO_METADATA.to_string()]);
    }

    #[test]
    fn missing_file_degrades_to_fallback_line() {
        assert_eq!(
            ExifSource.read(Path::new("/nonexistent/x.jpg")),
            vec![NO_METADATA.to_string()]
        );
    }
}
