//! Minimal ID3 reading for log output.
//!
//! ID3v2.3/2.4 text frames are preferred; the 128-byte ID3v1 trailer is
//! the fallback. Nothing here influences what gets copied or deleted.

use crate::hasher::hash_file;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

const ID3V1_LEN: u64 = 128;
const ID3V2_HEADER_LEN: usize = 10;
const ID3V2_FRAME_HEADER_LEN: usize = 10;
/// Upper bound on how much of an ID3v2 tag is read.
const MAX_ID3V2_LEN: u64 = 1 << 20;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub album: Option<String>,
    pub performer: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
}

impl TrackTags {
    fn is_empty(&self) -> bool {
        *self == TrackTags::default()
    }
}

pub fn read_tags(path: &Path) -> io::Result<Option<TrackTags>> {
    let mut file = File::open(path)?;
    if let Some(tags) = read_id3v2(&mut file)? {
        return Ok(Some(tags));
    }
    read_id3v1(&mut file)
}

/// Debug-log a file's tags and content fingerprint.
pub fn log_track_details(path: &Path) {
    let tags = match read_tags(path) {
        Ok(tags) => tags.unwrap_or_default(),
        Err(err) => {
            debug!("Could not read tags from {}: {}", path.display(), err);
            TrackTags::default()
        }
    };
    let fingerprint = match hash_file(path) {
        Ok(digest) => digest.short(),
        Err(err) => {
            debug!("Could not hash {}: {}", path.display(), err);
            "-".to_string()
        }
    };
    let show = |field: &Option<String>| field.clone().unwrap_or_else(|| "-".to_string());

    debug!(
        "{}\n  album:     {}\n  performer: {}\n  title:     {}\n  year:      {}\n  {}",
        path.display(),
        show(&tags.album),
        show(&tags.performer),
        show(&tags.title),
        show(&tags.year),
        fingerprint
    );
}

fn read_id3v2<R: Read + Seek>(reader: &mut R) -> io::Result<Option<TrackTags>> {
    reader.seek(SeekFrom::Start(0))?;
    let mut header = Vec::with_capacity(ID3V2_HEADER_LEN);
    reader
        .by_ref()
        .take(ID3V2_HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    if header.len() < ID3V2_HEADER_LEN || &header[0..3] != b"ID3" {
        return Ok(None);
    }

    let major = header[3];
    if major != 3 && major != 4 {
        debug!("Unsupported ID3v2.{} tag", major);
        return Ok(None);
    }
    let flags = header[5];
    let size = u64::from(syncsafe(&header[6..10])).min(MAX_ID3V2_LEN);

    let mut body = Vec::new();
    reader.by_ref().take(size).read_to_end(&mut body)?;
    Ok(parse_id3v2_frames(&body, major, flags))
}

fn parse_id3v2_frames(body: &[u8], major: u8, flags: u8) -> Option<TrackTags> {
    let mut pos = 0usize;
    if flags & 0x40 != 0 {
        if body.len() < 4 {
            return None;
        }
        // v2.4 counts the size field itself, v2.3 does not.
        pos = if major == 4 {
            syncsafe(&body[0..4]) as usize
        } else {
            be_u32(&body[0..4]) as usize + 4
        };
    }

    let mut tags = TrackTags::default();
    while pos + ID3V2_FRAME_HEADER_LEN <= body.len() {
        let id = &body[pos..pos + 4];
        if id[0] == 0 {
            break; // padding
        }
        let size_bytes = &body[pos + 4..pos + 8];
        let size = if major == 4 {
            syncsafe(size_bytes)
        } else {
            be_u32(size_bytes)
        } as usize;

        let start = pos + ID3V2_FRAME_HEADER_LEN;
        let end = match start.checked_add(size) {
            Some(end) if end <= body.len() => end,
            _ => break,
        };
        let data = &body[start..end];

        match id {
            b"TIT2" => tags.title = decode_text_frame(data),
            b"TPE1" => tags.performer = decode_text_frame(data),
            b"TALB" => tags.album = decode_text_frame(data),
            b"TYER" | b"TDRC" if tags.year.is_none() => tags.year = decode_text_frame(data),
            _ => {}
        }
        pos = end;
    }

    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

fn decode_text_frame(data: &[u8]) -> Option<String> {
    let (&encoding, text) = data.split_first()?;
    let decoded = match encoding {
        0 => latin1(text),
        1 => match text {
            [0xFF, 0xFE, rest @ ..] => utf16(rest, u16::from_le_bytes),
            [0xFE, 0xFF, rest @ ..] => utf16(rest, u16::from_be_bytes),
            _ => utf16(text, u16::from_le_bytes),
        },
        2 => utf16(text, u16::from_be_bytes),
        3 => String::from_utf8_lossy(text).into_owned(),
        _ => return None,
    };
    // v2.4 separates multiple values with NUL; keep the first.
    clean(decoded.split('\0').next().unwrap_or_default())
}

fn read_id3v1<R: Read + Seek>(reader: &mut R) -> io::Result<Option<TrackTags>> {
    let len = reader.seek(SeekFrom::End(0))?;
    if len < ID3V1_LEN {
        return Ok(None);
    }
    reader.seek(SeekFrom::Start(len - ID3V1_LEN))?;
    let mut block = [0u8; ID3V1_LEN as usize];
    reader.read_exact(&mut block)?;
    Ok(parse_id3v1(&block))
}

fn parse_id3v1(block: &[u8; ID3V1_LEN as usize]) -> Option<TrackTags> {
    if &block[0..3] != b"TAG" {
        return None;
    }
    let field = |range: std::ops::Range<usize>| {
        let raw = &block[range];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        clean(&latin1(&raw[..end]))
    };
    Some(TrackTags {
        title: field(3..33),
        performer: field(33..63),
        album: field(63..93),
        year: field(93..97),
    })
}

fn syncsafe(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 7) | u32::from(b & 0x7F))
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn utf16(bytes: &[u8], decode: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| decode([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn clean(text: &str) -> Option<String> {
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
