//! Identicon domain: digest a request key, paint the digest as a bitmap,
//! and serve it through a cache-aside resolver.

pub mod bitmap;
pub mod service;

pub use bitmap::{encode_png, BitPng, BitmapGeometry, PixelSource};
pub use service::{CacheOutcome, IdenticonResolver, RenderedImage, Resolution, ResolverStats};

use sha2::{Digest, Sha256};
use shared::Result;

/// Length in bytes of the request-key digest (SHA-256).
pub const DIGEST_LEN: usize = 32;

/// SHA-256 of the raw key bytes.
pub fn digest_key(key: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(key).into()
}

/// Full compute path for one key: digest, render, PNG-encode.
pub fn render_identicon(key: &[u8], geometry: BitmapGeometry) -> Result<Vec<u8>> {
    let digest = digest_key(key);
    let bitmap = BitPng::new(&digest, geometry)?;
    encode_png(&bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_sha256() {
        // sha256("abc")
        let expected: [u8; 32] = [
            0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae,
            0x22, 0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61,
            0xf2, 0x00, 0x15, 0xad,
        ];
        assert_eq!(digest_key(b"abc"), expected);
    }

    #[test]
    fn test_render_is_deterministic() {
        let geometry = BitmapGeometry::new(16, 128).unwrap();
        let first = render_identicon(b"/img/hello", geometry).unwrap();
        let second = render_identicon(b"/img/hello", geometry).unwrap();
        assert_eq!(first, second);

        let other = render_identicon(b"/img/world", geometry).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_render_matches_digest_bits() {
        let geometry = BitmapGeometry::new(16, 256).unwrap();
        let digest = digest_key(b"/img/hello");
        let bitmap = BitPng::new(&digest, geometry).unwrap();

        let png = render_identicon(b"/img/hello", geometry).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();

        for cy in 0..16 {
            for cx in 0..16 {
                let pixel = decoded.get_pixel(cx * 16 + 8, cy * 16 + 8);
                assert_eq!(*pixel, bitmap.cell_color(cx, cy));
            }
        }
    }
}
