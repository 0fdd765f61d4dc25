//! Print-readiness validation for generated card artwork.
//!
//! Pure, stateless checks applied to every successful provider result
//! before it is cached or returned. Images whose aspect ratio falls
//! outside tolerance are center-cropped to the target print ratio and
//! re-validated rather than rejected outright.

use std::io::Cursor;

use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Tunable print-quality thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintRules {
    /// Minimum pixel width.
    pub min_width: u32,
    /// Minimum pixel height.
    pub min_height: u32,
    /// Target aspect ratio (width / height). 1.75 for a 3.5in x 2.0in card.
    pub target_ratio: f64,
    /// Acceptable deviation from the target ratio before auto-cropping.
    pub ratio_tolerance: f64,
    /// Reject near-empty payloads below this size.
    pub min_bytes: usize,
    /// Reject implausibly large payloads above this size.
    pub max_bytes: usize,
    /// Minimum effective print DPI against the physical card size.
    pub min_dpi: f64,
    /// Physical card width in inches.
    pub card_width_in: f64,
    /// Physical card height in inches.
    pub card_height_in: f64,
}

impl Default for PrintRules {
    fn default() -> Self {
        Self {
            min_width: 512,
            min_height: 512,
            target_ratio: 1.75,
            ratio_tolerance: 0.1,
            min_bytes: 1024,
            max_bytes: 10 * 1024 * 1024,
            min_dpi: 150.0,
            card_width_in: 3.5,
            card_height_in: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// The specific rule an artifact failed, reported to the caller so it can
/// decide whether regeneration is worthwhile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleViolation {
    #[error("Payload is not a decodable image: {0}")]
    Undecodable(String),

    #[error("Resolution {width}x{height} below minimum {min_width}x{min_height}")]
    MinResolution {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },

    #[error("Color mode {mode} not allowed; multi-channel color required")]
    ColorMode { mode: &'static str },

    #[error("Payload size {bytes} bytes outside allowed band [{min_bytes}, {max_bytes}]")]
    FileSize {
        bytes: usize,
        min_bytes: usize,
        max_bytes: usize,
    },

    #[error("Effective print DPI {dpi:.1} below minimum {min_dpi:.1}")]
    PrintDpi { dpi: f64, min_dpi: f64 },
}

impl RuleViolation {
    /// Short rule name for metrics labels and event payloads.
    pub fn rule(&self) -> &'static str {
        match self {
            RuleViolation::Undecodable(_) => "decode",
            RuleViolation::MinResolution { .. } => "min_resolution",
            RuleViolation::ColorMode { .. } => "color_mode",
            RuleViolation::FileSize { .. } => "file_size",
            RuleViolation::PrintDpi { .. } => "print_dpi",
        }
    }
}

// ---------------------------------------------------------------------------
// Validated artifact
// ---------------------------------------------------------------------------

/// An artifact that passed all print-readiness rules.
#[derive(Debug, Clone)]
pub struct ValidatedArtifact {
    /// Final image bytes. Re-encoded PNG when a crop was applied,
    /// otherwise the original payload untouched.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Whether an auto-crop to the target ratio was applied.
    pub cropped: bool,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate artifact bytes against the print rules.
///
/// Check order: decode, minimum resolution, color mode, payload size,
/// aspect ratio (with centered auto-crop on deviation), post-crop
/// resolution, effective DPI.
pub fn validate_artifact(bytes: &[u8], rules: &PrintRules) -> Result<ValidatedArtifact, RuleViolation> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| RuleViolation::Undecodable(e.to_string()))?;

    let (width, height) = img.dimensions();
    check_min_resolution(width, height, rules)?;
    check_color_mode(img.color())?;

    if bytes.len() < rules.min_bytes || bytes.len() > rules.max_bytes {
        return Err(RuleViolation::FileSize {
            bytes: bytes.len(),
            min_bytes: rules.min_bytes,
            max_bytes: rules.max_bytes,
        });
    }

    let ratio = width as f64 / height as f64;
    let (final_img, final_bytes, cropped) = if (ratio - rules.target_ratio).abs()
        > rules.ratio_tolerance
    {
        let cropped_img = crop_to_ratio(&img, rules.target_ratio);
        let mut buf = Cursor::new(Vec::new());
        cropped_img
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| RuleViolation::Undecodable(format!("re-encode after crop: {e}")))?;
        (cropped_img, buf.into_inner(), true)
    } else {
        (img, bytes.to_vec(), false)
    };

    let (width, height) = final_img.dimensions();
    // Cropping can only shrink one dimension; re-check the floor.
    check_min_resolution(width, height, rules)?;

    let dpi = effective_dpi(width, height, rules);
    if dpi < rules.min_dpi {
        return Err(RuleViolation::PrintDpi {
            dpi,
            min_dpi: rules.min_dpi,
        });
    }

    Ok(ValidatedArtifact {
        bytes: final_bytes,
        width,
        height,
        cropped,
    })
}

/// Effective print DPI: the more conservative of the two axes against
/// the physical card dimensions.
pub fn effective_dpi(width: u32, height: u32, rules: &PrintRules) -> f64 {
    let width_dpi = width as f64 / rules.card_width_in;
    let height_dpi = height as f64 / rules.card_height_in;
    width_dpi.min(height_dpi)
}

fn check_min_resolution(width: u32, height: u32, rules: &PrintRules) -> Result<(), RuleViolation> {
    if width < rules.min_width || height < rules.min_height {
        return Err(RuleViolation::MinResolution {
            width,
            height,
            min_width: rules.min_width,
            min_height: rules.min_height,
        });
    }
    Ok(())
}

fn check_color_mode(color: ColorType) -> Result<(), RuleViolation> {
    let mode = match color {
        ColorType::L8 => "L8",
        ColorType::La8 => "La8",
        ColorType::L16 => "L16",
        ColorType::La16 => "La16",
        _ => return Ok(()),
    };
    Err(RuleViolation::ColorMode { mode })
}

/// Center-crop to the largest region matching `target_ratio`.
fn crop_to_ratio(img: &DynamicImage, target_ratio: f64) -> DynamicImage {
    let (width, height) = img.dimensions();
    let ratio = width as f64 / height as f64;

    if ratio > target_ratio {
        // Too wide: trim the sides.
        let new_width = ((height as f64 * target_ratio).round() as u32).max(1);
        let x = (width - new_width) / 2;
        img.crop_imm(x, 0, new_width, height)
    } else {
        // Too tall: trim top and bottom.
        let new_height = ((width as f64 / target_ratio).round() as u32).max(1);
        let y = (height - new_height) / 2;
        img.crop_imm(0, y, width, new_height)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use image::{GrayImage, RgbImage};

    /// Encode a solid RGB image as PNG bytes.
    fn rgb_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([10, 10, 10]),
        ));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    /// Encode a grayscale image as PNG bytes.
    fn gray_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, image::Luma([128])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    /// Rules with the byte-size band disabled so dimension-focused tests
    /// are not confounded by how well solid PNGs compress.
    fn rules_without_size_band() -> PrintRules {
        PrintRules {
            min_bytes: 0,
            max_bytes: usize::MAX,
            ..PrintRules::default()
        }
    }

    #[test]
    fn valid_card_image_passes_untouched() {
        let bytes = rgb_png(1536, 878); // 1.7494, within tolerance
        let rules = rules_without_size_band();
        let artifact = validate_artifact(&bytes, &rules).unwrap();
        assert!(!artifact.cropped);
        assert_eq!(artifact.width, 1536);
        assert_eq!(artifact.height, 878);
        assert_eq!(artifact.bytes, bytes);
    }

    #[test]
    fn tiny_image_rejected_for_resolution() {
        let bytes = rgb_png(100, 100);
        let rules = rules_without_size_band();
        assert_matches!(
            validate_artifact(&bytes, &rules),
            Err(RuleViolation::MinResolution {
                width: 100,
                height: 100,
                ..
            })
        );
    }

    #[test]
    fn grayscale_image_rejected_for_color_mode() {
        let bytes = gray_png(1536, 878);
        let rules = rules_without_size_band();
        assert_matches!(
            validate_artifact(&bytes, &rules),
            Err(RuleViolation::ColorMode { mode: "L8" })
        );
    }

    #[test]
    fn square_image_is_auto_cropped_to_card_ratio() {
        let bytes = rgb_png(1024, 1024);
        let rules = rules_without_size_band();
        let artifact = validate_artifact(&bytes, &rules).unwrap();
        assert!(artifact.cropped);
        assert_eq!(artifact.width, 1024);
        assert_eq!(artifact.height, 585); // 1024 / 1.75, rounded
        let ratio = artifact.width as f64 / artifact.height as f64;
        assert!((ratio - 1.75).abs() <= 0.1);
    }

    #[test]
    fn overly_wide_image_is_cropped_on_the_sides() {
        let bytes = rgb_png(2048, 878); // ratio 2.33
        let rules = rules_without_size_band();
        let artifact = validate_artifact(&bytes, &rules).unwrap();
        assert!(artifact.cropped);
        assert_eq!(artifact.height, 878);
        assert_eq!(artifact.width, 1537); // 878 * 1.75, rounded
    }

    #[test]
    fn garbage_bytes_rejected_as_undecodable() {
        let rules = PrintRules::default();
        assert_matches!(
            validate_artifact(b"definitely not a png", &rules),
            Err(RuleViolation::Undecodable(_))
        );
    }

    #[test]
    fn oversized_payload_rejected() {
        let bytes = rgb_png(1536, 878);
        let rules = PrintRules {
            max_bytes: 16,
            min_bytes: 0,
            ..PrintRules::default()
        };
        assert_matches!(
            validate_artifact(&bytes, &rules),
            Err(RuleViolation::FileSize { .. })
        );
    }

    #[test]
    fn near_empty_payload_rejected() {
        let bytes = rgb_png(1536, 878);
        let rules = PrintRules {
            min_bytes: 100 * 1024 * 1024,
            ..PrintRules::default()
        };
        assert_matches!(
            validate_artifact(&bytes, &rules),
            Err(RuleViolation::FileSize { .. })
        );
    }

    #[test]
    fn low_dpi_rejected_with_distinct_rule() {
        // 896x512 is 256 effective DPI; raise the floor above it.
        let bytes = rgb_png(896, 512);
        let rules = PrintRules {
            min_dpi: 300.0,
            min_bytes: 0,
            ..PrintRules::default()
        };
        let err = validate_artifact(&bytes, &rules).unwrap_err();
        assert_matches!(err, RuleViolation::PrintDpi { .. });
        assert_eq!(err.rule(), "print_dpi");
    }

    #[test]
    fn effective_dpi_uses_conservative_axis() {
        let rules = PrintRules::default();
        // 1536/3.5 = 438.9, 878/2.0 = 439.0 -> min is the width axis.
        let dpi = effective_dpi(1536, 878, &rules);
        assert!((dpi - 438.857).abs() < 0.01);
    }

    #[test]
    fn rule_names_are_stable() {
        assert_eq!(RuleViolation::Undecodable("x".into()).rule(), "decode");
        assert_eq!(
            RuleViolation::PrintDpi {
                dpi: 100.0,
                min_dpi: 150.0
            }
            .rule(),
            "print_dpi"
        );
    }
}
