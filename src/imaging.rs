use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("unsupported photo format (JPEG or PNG expected)")]
    Unsupported,

    #[error("could not decode photo: {0}")]
    Decode(#[source] image::ImageError),

    #[error("could not encode photo: {0}")]
    Encode(#[source] image::ImageError),
}

/// Clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rotation(u8);

impl Rotation {
    pub fn turned(self) -> Self {
        Rotation((self.0 + 1) % 4)
    }

    pub fn degrees(self) -> u16 {
        u16::from(self.0) * 90
    }

    fn apply(self, img: DynamicImage) -> DynamicImage {
        match self.0 {
            1 => img.rotate90(),
            2 => img.rotate180(),
            3 => img.rotate270(),
            _ => img,
        }
    }
}

/// SHA-256 of the uploaded bytes, hex encoded.
pub fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Only JPEG and PNG uploads are accepted.
pub fn sniff_format(bytes: &[u8]) -> Result<ImageFormat, PhotoError> {
    match image::guess_format(bytes) {
        Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => Ok(format),
        _ => Err(PhotoError::Unsupported),
    }
}

/// Decode, rotate and shrink the photo to fit `max_dim`, then re-encode as JPEG.
pub fn prepare_for_scan(
    bytes: &[u8],
    rotation: Rotation,
    max_dim: u32,
    quality: u8,
) -> Result<Vec<u8>, PhotoError> {
    let format = sniff_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format).map_err(PhotoError::Decode)?;
    let (orig_w, orig_h) = (img.width(), img.height());

    let mut img = rotation.apply(img);
    if img.width() > max_dim || img.height() > max_dim {
        img = img.thumbnail(max_dim, max_dim);
    }

    let mut out = Vec::new();
    img.to_rgb8()
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
        .map_err(PhotoError::Encode)?;

    info!(
        orig_w,
        orig_h,
        width = img.width(),
        height = img.height(),
        rotation = rotation.degrees(),
        bytes = out.len(),
        "Photo prepared"
    );
    Ok(out)
}
