//! Reader for uncompressed single-channel DICOM Part 10 files.
//!
//! Only the little-endian transfer syntaxes are decoded. Encapsulated (compressed)
//! pixel data is reported as an unsupported format.

use crate::error::AnalysisError;
use image::{ImageBuffer, Luma};

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8] = b"DICM";

const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";

type Tag = (u16, u16);

const TRANSFER_SYNTAX: Tag = (0x0002, 0x0010);
const SAMPLES_PER_PIXEL: Tag = (0x0028, 0x0002);
const ROWS: Tag = (0x0028, 0x0010);
const COLUMNS: Tag = (0x0028, 0x0011);
const BITS_ALLOCATED: Tag = (0x0028, 0x0100);
const BITS_STORED: Tag = (0x0028, 0x0101);
const PIXEL_REPRESENTATION: Tag = (0x0028, 0x0103);
const PIXEL_DATA: Tag = (0x7FE0, 0x0010);

const ITEM: Tag = (0xFFFE, 0xE000);
const ITEM_END: Tag = (0xFFFE, 0xE00D);
const SEQUENCE_END: Tag = (0xFFFE, 0xE0DD);

const UNDEFINED_LENGTH: u32 = u32::MAX;

/// Explicit VRs whose length field is 32 bits, after two reserved bytes.
const LONG_VRS: [&[u8; 2]; 13] = [
    b"OB", b"OD", b"OF", b"OL", b"OV", b"OW", b"SQ", b"SV", b"UC", b"UN", b"UR", b"UT", b"UV",
];

/// True when the buffer carries the 128-byte preamble and `DICM` marker.
pub fn is_dicom(bytes: &[u8]) -> bool {
    bytes.get(PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()) == Some(MAGIC)
}

/// Decodes the first frame into stored pixel values.
///
/// Signed samples are offset by 32768 so their order survives in `u16`. Bits
/// above `BitsStored` are masked off.
pub fn decode_grayscale(bytes: &[u8]) -> Result<ImageBuffer<Luma<u16>, Vec<u16>>, AnalysisError> {
    if !is_dicom(bytes) {
        return Err(malformed("missing DICM marker"));
    }

    let mut reader = Reader {
        bytes,
        pos: PREAMBLE_LEN + MAGIC.len(),
        explicit: true,
    };

    let syntax = reader.read_transfer_syntax()?;
    reader.explicit = match syntax.as_str() {
        EXPLICIT_VR_LITTLE_ENDIAN => true,
        IMPLICIT_VR_LITTLE_ENDIAN => false,
        other => {
            return Err(AnalysisError::UnsupportedFormat(format!(
                "DICOM transfer syntax {other}"
            )));
        }
    };

    let mut layout = PixelLayout::default();
    let pixels = loop {
        if reader.is_exhausted() {
            return Err(malformed("no pixel data"));
        }
        let element = reader.header()?;
        match element.tag {
            PIXEL_DATA if element.len == UNDEFINED_LENGTH => {
                return Err(AnalysisError::UnsupportedFormat(
                    "encapsulated DICOM pixel data".to_string(),
                ));
            }
            PIXEL_DATA => break reader.take(element.len as usize)?,
            SAMPLES_PER_PIXEL => layout.samples = Some(reader.us(&element)?),
            ROWS => layout.rows = Some(reader.us(&element)?),
            COLUMNS => layout.columns = Some(reader.us(&element)?),
            BITS_ALLOCATED => layout.bits_allocated = Some(reader.us(&element)?),
            BITS_STORED => layout.bits_stored = Some(reader.us(&element)?),
            PIXEL_REPRESENTATION => layout.signed = reader.us(&element)? == 1,
            _ => reader.skip_value(&element)?,
        }
    };

    layout.decode(pixels)
}

#[derive(Default)]
struct PixelLayout {
    samples: Option<u16>,
    rows: Option<u16>,
    columns: Option<u16>,
    bits_allocated: Option<u16>,
    bits_stored: Option<u16>,
    signed: bool,
}

impl PixelLayout {
    fn decode(&self, pixels: &[u8]) -> Result<ImageBuffer<Luma<u16>, Vec<u16>>, AnalysisError> {
        let rows = self.rows.ok_or_else(|| malformed("missing Rows"))? as u32;
        let columns = self.columns.ok_or_else(|| malformed("missing Columns"))? as u32;
        let bits_allocated = self
            .bits_allocated
            .ok_or_else(|| malformed("missing BitsAllocated"))?;
        let bits_stored = self.bits_stored.unwrap_or(bits_allocated);

        let samples = self.samples.unwrap_or(1);
        if samples != 1 {
            return Err(AnalysisError::UnsupportedFormat(format!(
                "DICOM with {samples} samples per pixel"
            )));
        }
        if bits_allocated != 8 && bits_allocated != 16 {
            return Err(AnalysisError::UnsupportedFormat(format!(
                "DICOM with {bits_allocated} bits allocated"
            )));
        }
        if bits_stored == 0 || bits_stored > bits_allocated {
            return Err(malformed("BitsStored outside BitsAllocated"));
        }

        let count = rows as usize * columns as usize;
        let width = bits_allocated as usize / 8;
        if pixels.len() < count * width {
            return Err(malformed("pixel data shorter than Rows x Columns"));
        }

        let mask = (1u32 << bits_stored) - 1;
        let shift = 32 - bits_stored as u32;
        let values: Vec<u16> = pixels
            .chunks_exact(width)
            .take(count)
            .map(|chunk| {
                let raw = match chunk {
                    [low, high] => u16::from_le_bytes([*low, *high]) as u32,
                    [byte] => *byte as u32,
                    _ => 0,
                };
                let stored = raw & mask;
                if self.signed {
                    (((stored << shift) as i32 >> shift) + 32768) as u16
                } else {
                    stored as u16
                }
            })
            .collect();

        ImageBuffer::from_raw(columns, rows, values)
            .ok_or_else(|| malformed("pixel buffer does not match dimensions"))
    }
}

struct Element {
    tag: Tag,
    len: u32,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    explicit: bool,
}

impl<'a> Reader<'a> {
    fn is_exhausted(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], AnalysisError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| malformed("unexpected end of data"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, AnalysisError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, AnalysisError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn header(&mut self) -> Result<Element, AnalysisError> {
        let tag = (self.u16()?, self.u16()?);
        // Items and delimiters never carry a VR.
        if tag.0 == 0xFFFE || !self.explicit {
            return Ok(Element {
                tag,
                len: self.u32()?,
            });
        }

        let vr = self.take(2)?;
        let len = if LONG_VRS.iter().any(|long| long.as_slice() == vr) {
            self.take(2)?;
            self.u32()?
        } else {
            self.u16()? as u32
        };
        Ok(Element { tag, len })
    }

    /// Meta group elements are always explicit VR little endian.
    fn read_transfer_syntax(&mut self) -> Result<String, AnalysisError> {
        let mut syntax = None;
        while self.bytes.get(self.pos..self.pos + 2) == Some(&[0x02u8, 0x00][..]) {
            let element = self.header()?;
            if element.tag == TRANSFER_SYNTAX {
                let raw = self.take(element.len as usize)?;
                let uid = String::from_utf8_lossy(raw);
                syntax = Some(uid.trim_end_matches(['\0', ' ']).to_string());
            } else {
                self.skip_value(&element)?;
            }
        }
        syntax.ok_or_else(|| malformed("missing transfer syntax"))
    }

    fn us(&mut self, element: &Element) -> Result<u16, AnalysisError> {
        if element.len != 2 {
            return Err(malformed("expected a 2-byte unsigned short"));
        }
        self.u16()
    }

    fn skip_value(&mut self, element: &Element) -> Result<(), AnalysisError> {
        if element.len == UNDEFINED_LENGTH {
            return self.skip_sequence();
        }
        self.take(element.len as usize)?;
        Ok(())
    }

    fn skip_sequence(&mut self) -> Result<(), AnalysisError> {
        loop {
            let element = self.header()?;
            match element.tag {
                SEQUENCE_END => return Ok(()),
                ITEM if element.len == UNDEFINED_LENGTH => self.skip_item()?,
                ITEM => {
                    self.take(element.len as usize)?;
                }
                _ => return Err(malformed("unexpected element inside sequence")),
            }
        }
    }

    fn skip_item(&mut self) -> Result<(), AnalysisError> {
        loop {
            let element = self.header()?;
            if element.tag == ITEM_END {
                return Ok(());
            }
            self.skip_value(&element)?;
        }
    }
}

fn malformed(detail: &str) -> AnalysisError {
    AnalysisError::Dicom(detail.to_string())
}
