//! Artifact classification and image sniffing.
//!
//! An artifact's kind is decided by its file extension; whether bytes are
//! actually an embeddable image is decided by magic numbers, not the name.
//! Dimensions are read from the container headers so embeds keep their
//! aspect ratio at a fixed display width.

// ─── Kind by extension ───────────────────────────────────────────────────────

/// How an attendance-sheet artifact is rendered into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
  /// Embedded as a picture.
  Image,
  /// Parsed and inlined as a sub-table.
  Delimited,
  /// Referenced by filename only; content is never inlined.
  Other,
}

pub fn classify(artifact_ref: &str) -> ArtifactKind {
  let ext = artifact_ref
    .rsplit('.')
    .next()
    .unwrap_or("")
    .to_ascii_lowercase();
  match ext.as_str() {
    "png" | "jpg" | "jpeg" | "gif" => ArtifactKind::Image,
    "csv" => ArtifactKind::Delimited,
    _ => ArtifactKind::Other,
  }
}

// ─── Image sniffing ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
  Png,
  Jpeg,
  Gif,
}

impl ImageFormat {
  /// The WordprocessingML `w:binData` name extension for this format.
  pub fn extension(self) -> &'static str {
    match self {
      ImageFormat::Png  => "png",
      ImageFormat::Jpeg => "jpg",
      ImageFormat::Gif  => "gif",
    }
  }
}

/// A sniffed image: format plus pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
  pub format: ImageFormat,
  pub width:  u32,
  pub height: u32,
}

/// Identify PNG/JPEG/GIF bytes and their dimensions. `None` means the bytes
/// are not a readable image of a supported format.
pub fn sniff(bytes: &[u8]) -> Option<ImageInfo> {
  sniff_png(bytes)
    .or_else(|| sniff_jpeg(bytes))
    .or_else(|| sniff_gif(bytes))
}

/// PNG: 8-byte signature, then the IHDR chunk whose first eight data bytes
/// are big-endian width and height.
fn sniff_png(bytes: &[u8]) -> Option<ImageInfo> {
  const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
  if bytes.len() < 24 || bytes[..8] != SIGNATURE || &bytes[12..16] != b"IHDR" {
    return None;
  }
  let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
  let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
  (width > 0 && height > 0).then_some(ImageInfo {
    format: ImageFormat::Png,
    width,
    height,
  })
}

/// JPEG: walk the marker segments from SOI until a start-of-frame marker,
/// which carries the dimensions.
fn sniff_jpeg(bytes: &[u8]) -> Option<ImageInfo> {
  if bytes.len() < 4 || bytes[0] != 0xff || bytes[1] != 0xd8 {
    return None;
  }
  let mut pos = 2usize;
  while pos + 4 <= bytes.len() {
    if bytes[pos] != 0xff {
      return None;
    }
    let marker = bytes[pos + 1];
    // Standalone markers without a length field.
    if (0xd0..=0xd9).contains(&marker) || marker == 0x01 {
      pos += 2;
      continue;
    }
    let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
    if len < 2 {
      return None;
    }
    // SOF0..SOF15, excluding DHT/JPG/DAC (0xc4, 0xc8, 0xcc).
    if (0xc0..=0xcf).contains(&marker)
      && !matches!(marker, 0xc4 | 0xc8 | 0xcc)
    {
      if pos + 9 > bytes.len() {
        return None;
      }
      let height = u16::from_be_bytes([bytes[pos + 5], bytes[pos + 6]]);
      let width = u16::from_be_bytes([bytes[pos + 7], bytes[pos + 8]]);
      return (width > 0 && height > 0).then_some(ImageInfo {
        format: ImageFormat::Jpeg,
        width:  width.into(),
        height: height.into(),
      });
    }
    pos += 2 + len;
  }
  None
}

/// GIF: `GIF87a`/`GIF89a`, then little-endian logical screen dimensions.
fn sniff_gif(bytes: &[u8]) -> Option<ImageInfo> {
  if bytes.len() < 10 || (&bytes[..6] != b"GIF87a" && &bytes[..6] != b"GIF89a") {
    return None;
  }
  let width = u16::from_le_bytes([bytes[6], bytes[7]]);
  let height = u16::from_le_bytes([bytes[8], bytes[9]]);
  (width > 0 && height > 0).then_some(ImageInfo {
    format: ImageFormat::Gif,
    width:  width.into(),
    height: height.into(),
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
