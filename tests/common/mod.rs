//! Synthetic PNG streams for tests
//!
//! Images are structurally valid (signature, chunk framing, CRCs) but carry
//! filler instead of real compressed pixels, which the splitter never reads.

#![allow(dead_code)]

use png_split::{Event, Splitter, SplitterConfig, SIGNATURE};

/// Length + type + CRC
pub const CHUNK_OVERHEAD: usize = 12;

/// A complete IEND chunk
pub const IEND_LEN: usize = CHUNK_OVERHEAD;

pub const GRAY: u8 = 0;
pub const RGB: u8 = 2;
pub const INDEXED: u8 = 3;
pub const GRAYA: u8 = 4;
pub const RGBA: u8 = 6;

/// Chunk-by-chunk PNG writer
#[derive(Debug, Clone, Default)]
pub struct PngBuilder {
    bytes: Vec<u8>,
}

impl PngBuilder {
    /// Start an image with the signature
    pub fn new() -> Self {
        Self {
            bytes: SIGNATURE.to_vec(),
        }
    }

    /// Chunks only, no signature
    pub fn chunks() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn chunk(mut self, tag: &[u8; 4], body: &[u8]) -> Self {
        let mut crc = crc32fast::Hasher::new();
        crc.update(tag);
        crc.update(body);

        self.bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
        self.bytes.extend_from_slice(tag);
        self.bytes.extend_from_slice(body);
        self.bytes.extend_from_slice(&crc.finalize().to_be_bytes());
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn ihdr(self, width: u32, height: u32, bit_depth: u8, color_type: u8) -> Self {
        let mut body = Vec::with_capacity(13);
        body.extend_from_slice(&width.to_be_bytes());
        body.extend_from_slice(&height.to_be_bytes());
        body.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
        self.chunk(b"IHDR", &body)
    }

    pub fn plte(self, entries: &[[u8; 3]]) -> Self {
        let body: Vec<u8> = entries.iter().flatten().copied().collect();
        self.chunk(b"PLTE", &body)
    }

    pub fn trns(self, alphas: &[u8]) -> Self {
        self.chunk(b"tRNS", alphas)
    }

    pub fn text(self, key: &str, value: &str) -> Self {
        let mut body = key.as_bytes().to_vec();
        body.push(0);
        body.extend_from_slice(value.as_bytes());
        self.chunk(b"tEXt", &body)
    }

    pub fn actl(self, num_frames: u32, num_plays: u32) -> Self {
        let mut body = num_frames.to_be_bytes().to_vec();
        body.extend_from_slice(&num_plays.to_be_bytes());
        self.chunk(b"acTL", &body)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fctl(
        self,
        sequence: u32,
        width: u32,
        height: u32,
        x: u32,
        y: u32,
        delay_num: u16,
        delay_den: u16,
    ) -> Self {
        let mut body = Vec::with_capacity(26);
        for value in [sequence, width, height, x, y] {
            body.extend_from_slice(&value.to_be_bytes());
        }
        body.extend_from_slice(&delay_num.to_be_bytes());
        body.extend_from_slice(&delay_den.to_be_bytes());
        body.extend_from_slice(&[0, 0]);
        self.chunk(b"fcTL", &body)
    }

    pub fn idat(self, data: &[u8]) -> Self {
        self.chunk(b"IDAT", data)
    }

    pub fn fdat(self, sequence: u32, data: &[u8]) -> Self {
        let mut body = sequence.to_be_bytes().to_vec();
        body.extend_from_slice(data);
        self.chunk(b"fdAT", &body)
    }

    /// Append an IDAT sized so the finished image is `total` bytes long,
    /// given `after` more chunk bytes before IEND
    pub fn idat_filling(self, total: usize, after: usize) -> Self {
        let n = total - self.bytes.len() - CHUNK_OVERHEAD - after - IEND_LEN;
        self.idat(&filler(n))
    }

    pub fn iend(self) -> Vec<u8> {
        self.chunk(b"IEND", &[]).into_bytes()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Deterministic stand-in for compressed data
pub fn filler(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Small RGB image with one IDAT
pub fn rgb_image(width: u32, height: u32) -> Vec<u8> {
    PngBuilder::new()
        .ihdr(width, height, 8, RGB)
        .idat(&filler(64))
        .iend()
}

/// Indexed image with palette and transparency
pub fn indexed_image() -> Vec<u8> {
    PngBuilder::new()
        .ihdr(16, 16, 8, INDEXED)
        .plte(&[[255, 0, 0], [0, 255, 0], [0, 0, 255]])
        .trns(&[0, 128, 255])
        .idat(&filler(40))
        .iend()
}

/// Two-frame APNG looping forever
pub fn animated_image() -> Vec<u8> {
    PngBuilder::new()
        .ihdr(32, 32, 8, RGBA)
        .actl(2, 0)
        .fctl(0, 32, 32, 0, 0, 1, 10)
        .idat(&filler(50))
        .fctl(1, 16, 16, 8, 8, 100, 0)
        .fdat(2, &filler(30))
        .iend()
}

/// The six images of the regression stream, with their kinds matching the
/// original fixture set: animated, RGBA, gray+alpha, indexed, gray, RGB
pub const FIXTURE_LENGTHS: [usize; 6] = [288313, 129722, 97918, 36533, 151800, 400304];

pub fn fixture_images() -> Vec<Vec<u8>> {
    let [chompy, djay, graya, indexed, gray, trees] = FIXTURE_LENGTHS;

    let tail = PngBuilder::chunks()
        .fctl(1, 100, 80, 10, 10, 100, 0)
        .fdat(2, &filler(4096))
        .into_bytes();
    let animated = PngBuilder::new()
        .ihdr(200, 160, 8, RGBA)
        .actl(2, 0)
        .fctl(0, 200, 160, 0, 0, 1, 25)
        .idat_filling(chompy, tail.len())
        .raw(&tail)
        .iend();

    vec![
        animated,
        PngBuilder::new()
            .ihdr(256, 256, 8, RGBA)
            .text("Software", "png-split tests")
            .idat_filling(djay, 0)
            .iend(),
        PngBuilder::new()
            .ihdr(300, 200, 8, GRAYA)
            .chunk(b"gAMA", &45455u32.to_be_bytes())
            .idat_filling(graya, 0)
            .iend(),
        PngBuilder::new()
            .ihdr(256, 256, 8, INDEXED)
            .plte(&[[0, 0, 0], [255, 255, 255], [255, 0, 0], [0, 0, 255]])
            .trns(&[0, 255, 128, 64])
            .idat_filling(indexed, 0)
            .iend(),
        PngBuilder::new()
            .ihdr(400, 300, 16, GRAY)
            .idat_filling(gray, 0)
            .iend(),
        PngBuilder::new()
            .ihdr(640, 480, 8, RGB)
            .text("Title", "Trees")
            .idat_filling(trees, 0)
            .iend(),
    ]
}

/// Feed `data` in pieces of `piece` bytes, collecting events
pub fn feed_in_pieces(config: SplitterConfig, data: &[u8], piece: usize) -> Vec<Event> {
    let mut splitter = Splitter::with_config(config);
    let mut events = Vec::new();
    for part in data.chunks(piece.max(1)) {
        splitter
            .feed(part, |event| events.push(event))
            .expect("well-formed input");
    }
    events
}

/// Completed images among `events`
pub fn images(events: &[Event]) -> Vec<Vec<u8>> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Image(bytes) => Some(bytes.clone()),
            _ => None,
        })
        .collect()
}

/// Events with image-data relays merged per chunk run, so that streams fed
/// with different slicing compare equal
pub fn normalize(events: Vec<Event>) -> Vec<Event> {
    let mut out: Vec<Event> = Vec::new();
    for event in events {
        if let (Some(Event::ImageData(total)), Event::ImageData(n)) = (out.last_mut(), &event) {
            *total += n;
            continue;
        }
        out.push(event);
    }
    out
}
