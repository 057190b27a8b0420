//! In-process QR decoding with `rqrr`

use image::GenericImageView;
use tracing::debug;

use crate::error::Result;

use super::QrDecoder;

/// Detects every QR grid in a greyscale rendering of the image
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl QrDecoder for RqrrDecoder {
    fn name(&self) -> &str {
        "rqrr"
    }

    fn decode(&self, image: &[u8]) -> Result<Vec<String>> {
        let img = image::load_from_memory(image)?;
        let (width, height) = img.dimensions();
        let luma = img.to_luma8();

        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
                luma.get_pixel(x as u32, y as u32)[0]
            });

        let grids = prepared.detect_grids();
        let payloads: Vec<String> = grids
            .iter()
            .filter_map(|grid| match grid.decode() {
                Ok((_, content)) => Some(content),
                Err(e) => {
                    debug!("Skipping undecodable QR grid: {:?}", e);
                    None
                }
            })
            .collect();

        Ok(payloads)
    }
}
