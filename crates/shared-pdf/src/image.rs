//! PNG decoding into PDF image XObjects

use crate::error::PdfError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

/// PNG signature bytes
pub const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Device color space of the decoded samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
}

impl ColorSpace {
    fn pdf_name(self) -> &'static str {
        match self {
            ColorSpace::Gray => "DeviceGray",
            ColorSpace::Rgb => "DeviceRGB",
        }
    }
}

/// 8-bit samples split into color and (optional) alpha planes
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub pixels: Vec<u8>,
    /// `None` when every pixel is fully opaque
    pub alpha: Option<Vec<u8>>,
}

/// Decode a PNG of any bit depth or color type to 8-bit gray or RGB samples
pub fn decode_png(bytes: &[u8]) -> Result<DecodedImage, PdfError> {
    if !bytes.starts_with(&PNG_MAGIC) {
        return Err(PdfError::Image("missing PNG signature".to_string()));
    }

    let mut decoder = png::Decoder::new(bytes);
    // Palette and low bit depths become 8-bit, tRNS becomes an alpha channel
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| PdfError::Image(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| PdfError::Image(e.to_string()))?;
    buf.truncate(info.buffer_size());

    if info.bit_depth != png::BitDepth::Eight {
        return Err(PdfError::Image(format!(
            "unsupported bit depth after expansion: {:?}",
            info.bit_depth
        )));
    }

    let (color_space, channels, has_alpha) = match info.color_type {
        png::ColorType::Grayscale => (ColorSpace::Gray, 1, false),
        png::ColorType::GrayscaleAlpha => (ColorSpace::Gray, 2, true),
        png::ColorType::Rgb => (ColorSpace::Rgb, 3, false),
        png::ColorType::Rgba => (ColorSpace::Rgb, 4, true),
        png::ColorType::Indexed => {
            return Err(PdfError::Image("palette was not expanded".to_string()))
        }
    };

    let expected = info.width as usize * info.height as usize * channels;
    if buf.len() < expected {
        return Err(PdfError::Image(format!(
            "truncated pixel data: {} of {} bytes",
            buf.len(),
            expected
        )));
    }
    buf.truncate(expected);

    let (pixels, alpha) = if has_alpha {
        let color_channels = channels - 1;
        let pixel_count = info.width as usize * info.height as usize;
        let mut pixels = Vec::with_capacity(pixel_count * color_channels);
        let mut alpha = Vec::with_capacity(pixel_count);
        for px in buf.chunks_exact(channels) {
            pixels.extend_from_slice(&px[..color_channels]);
            alpha.push(px[color_channels]);
        }
        let alpha = alpha.iter().any(|&a| a != u8::MAX).then_some(alpha);
        (pixels, alpha)
    } else {
        (buf, None)
    };

    Ok(DecodedImage {
        width: info.width,
        height: info.height,
        color_space,
        pixels,
        alpha,
    })
}

impl DecodedImage {
    /// Add this image to `doc` as an image XObject (with an SMask for
    /// transparency) and return its object id.
    pub fn add_to(&self, doc: &mut Document) -> Result<ObjectId, PdfError> {
        let smask_id = match &self.alpha {
            Some(alpha) => Some(doc.add_object(image_stream(
                self.width,
                self.height,
                ColorSpace::Gray,
                alpha,
            )?)),
            None => None,
        };

        let mut stream = image_stream(self.width, self.height, self.color_space, &self.pixels)?;
        if let Some(smask_id) = smask_id {
            stream.dict.set("SMask", Object::Reference(smask_id));
        }
        Ok(doc.add_object(stream))
    }
}

fn image_stream(
    width: u32,
    height: u32,
    color_space: ColorSpace,
    samples: &[u8],
) -> Result<Stream, PdfError> {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => color_space.pdf_name(),
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    Ok(Stream::new(dict, deflate(samples)?))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfError::Image(format!("deflate failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| PdfError::Image(format!("deflate failed: {}", e)))
}

#[cfg(test)]
pub(crate) fn encode_png(width: u32, height: u32, color: png::ColorType, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
    }
    out
}
