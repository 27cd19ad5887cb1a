pub mod align;
pub mod attach;
pub mod capture;
pub mod config;
pub mod export;
pub mod frames;
pub mod info;
pub mod init;
pub mod remove;
pub mod validate;

use std::path::Path;

use framedoc_common::config::ExportDefaults;
use framedoc_common::timecode::parse_timestamp;
use framedoc_project_model::options::{ExportOptions, PageGeometry};
use framedoc_project_model::LoadedSession;

/// Load a session bundle with the CLI's error wording.
pub fn load_session(path: &Path) -> anyhow::Result<LoadedSession> {
    LoadedSession::load(path).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))
}

/// Parse a playback time given as seconds (`12.5`) or a timestamp (`01:02:03`, `02:03`).
pub fn parse_time(value: &str) -> anyhow::Result<f64> {
    if value.contains(':') {
        let secs = parse_timestamp(value).map_err(|e| anyhow::anyhow!("Invalid time '{value}': {e}"))?;
        return Ok(secs as f64);
    }
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| anyhow::anyhow!("Invalid time '{value}': expected seconds or HH:MM:SS"))
}

/// Typed export options from the config file's primitive defaults.
pub fn options_from_defaults(defaults: &ExportDefaults) -> anyhow::Result<ExportOptions> {
    let geometry =
        PageGeometry::preset(&defaults.page_size)?.with_image_scale(defaults.image_scale_percent);
    Ok(ExportOptions {
        format: defaults.format.parse()?,
        geometry,
        pdf_image_size: defaults.pdf_image_size.parse()?,
        ..ExportOptions::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use framedoc_project_model::options::{ExportFormat, PdfImageSize};

    #[test]
    fn test_parse_time_forms() {
        assert_eq!(parse_time("12.5").unwrap(), 12.5);
        assert_eq!(parse_time("01:02").unwrap(), 62.0);
        assert_eq!(parse_time("01:00:05").unwrap(), 3605.0);
        assert!(parse_time("soon").is_err());
        assert!(parse_time("00:75").is_err());
    }

    #[test]
    fn test_options_from_defaults() {
        let defaults = ExportDefaults {
            format: "docx".into(),
            image_scale_percent: 150,
            pdf_image_size: "small".into(),
            page_size: "letter".into(),
        };
        let options = options_from_defaults(&defaults).unwrap();
        assert_eq!(options.format, ExportFormat::Docx);
        assert_eq!(options.pdf_image_size, PdfImageSize::Small);
        assert_eq!(options.image_scale_percent(), 100);
        assert_eq!(options.geometry.page_width, PageGeometry::letter().page_width);

        let bad = ExportDefaults {
            format: "odt".into(),
            ..ExportDefaults::default()
        };
        assert!(options_from_defaults(&bad).is_err());
    }
}
