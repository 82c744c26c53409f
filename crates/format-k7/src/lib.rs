//! VG5000µ K7 cassette image.
//!
//! A K7 file is the byte stream the VG5000µ ROM writes to tape, without the
//! pulse encoding. One file on the tape looks like this:
//!
//! | Offset  | Size | Content                             |
//! |---------|------|-------------------------------------|
//! | 0       | 10   | `0xD3` leader                       |
//! | 10      | 1    | format                              |
//! | 11      | 6    | name                                |
//! | 17      | 1    | version                             |
//! | 18      | 5    | start line (ASCII)                  |
//! | 23      | 1    | protection                          |
//! | 24      | 2    | check position (LE)                 |
//! | 26      | 2    | start address (LE)                  |
//! | 28      | 2    | data length (LE)                    |
//! | 30      | 2    | checksum (LE)                       |
//! | 32      | 10   | `0xD6` marker                       |
//! | 42      | n    | payload                             |
//!
//! followed by a trailing `0xD6` marker. A valid image holds at least
//! `32 + data length + 10` bytes. Only the first file on a tape is parsed.

use std::fmt;

use tracing::debug;

/// Leader byte repeated before the header.
pub const LEADER_BYTE: u8 = 0xD3;
/// Marker byte repeated after the header and after the payload.
pub const MARKER_BYTE: u8 = 0xD6;
/// Length of the leader and of each marker.
pub const MARKER_LEN: usize = 10;
/// Leader plus header fields.
pub const HEADER_LEN: usize = 32;
/// Offset of the first payload byte.
pub const PAYLOAD_OFFSET: usize = HEADER_LEN + MARKER_LEN;
/// Largest tape the recorder holds.
pub const MAX_TAPE_SIZE: usize = 32 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum K7Error {
    /// Shorter than the leader, header and marker.
    TooShort(usize),
    /// Larger than the recorder buffer.
    TooLarge(usize),
    /// Leader byte at `offset` is not `0xD3`.
    BadLeadingPreamble { offset: usize },
    /// Marker byte at `offset` is not `0xD6`.
    BadTrailingPreamble { offset: usize },
    /// The header declares more data than the image holds.
    DataLengthExceedsImage { required: usize, size: usize },
}

impl fmt::Display for K7Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort(size) => write!(
                f,
                "K7 image too short: {size} bytes, need at least {PAYLOAD_OFFSET}"
            ),
            Self::TooLarge(size) => write!(
                f,
                "K7 image too large: {size} bytes, at most {MAX_TAPE_SIZE}"
            ),
            Self::BadLeadingPreamble { offset } => {
                write!(f, "K7 leader byte at offset {offset} is not ${LEADER_BYTE:02X}")
            }
            Self::BadTrailingPreamble { offset } => {
                write!(f, "K7 marker byte at offset {offset} is not ${MARKER_BYTE:02X}")
            }
            Self::DataLengthExceedsImage { required, size } => write!(
                f,
                "K7 header declares {required} bytes but the image holds {size}"
            ),
        }
    }
}

impl std::error::Error for K7Error {}

/// Header fields of the first file on a tape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct K7Header {
    pub format: u8,
    pub name: [u8; 6],
    pub version: u8,
    pub start_line: [u8; 5],
    pub protection: u8,
    pub check_pos: u16,
    pub start_address: u16,
    pub data_length: u16,
    pub checksum: u16,
}

impl K7Header {
    /// File name as text, cut at the first NUL.
    #[must_use]
    pub fn name_str(&self) -> String {
        text(&self.name)
    }

    /// BASIC start line as text, cut at the first NUL.
    #[must_use]
    pub fn start_line_str(&self) -> String {
        text(&self.start_line)
    }

    fn read(bytes: &[u8]) -> Self {
        let word = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let mut name = [0; 6];
        name.copy_from_slice(&bytes[11..17]);
        let mut start_line = [0; 5];
        start_line.copy_from_slice(&bytes[18..23]);
        Self {
            format: bytes[10],
            name,
            version: bytes[17],
            start_line,
            protection: bytes[23],
            check_pos: word(24),
            start_address: word(26),
            data_length: word(28),
            checksum: word(30),
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[LEADER_BYTE; MARKER_LEN]);
        out.push(self.format);
        out.extend_from_slice(&self.name);
        out.push(self.version);
        out.extend_from_slice(&self.start_line);
        out.push(self.protection);
        out.extend_from_slice(&self.check_pos.to_le_bytes());
        out.extend_from_slice(&self.start_address.to_le_bytes());
        out.extend_from_slice(&self.data_length.to_le_bytes());
        out.extend_from_slice(&self.checksum.to_le_bytes());
    }
}

fn text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// A tape image: raw bytes plus the parsed header, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct K7Image {
    data: Vec<u8>,
    header: Option<K7Header>,
}

impl K7Image {
    /// Validate and parse a K7 image.
    pub fn parse(data: &[u8]) -> Result<Self, K7Error> {
        if data.len() > MAX_TAPE_SIZE {
            return Err(K7Error::TooLarge(data.len()));
        }
        if data.len() < PAYLOAD_OFFSET {
            return Err(K7Error::TooShort(data.len()));
        }

        if let Some(offset) = data[..MARKER_LEN].iter().position(|&b| b != LEADER_BYTE) {
            return Err(K7Error::BadLeadingPreamble { offset });
        }

        let header = K7Header::read(data);

        if let Some(offset) = data[HEADER_LEN..PAYLOAD_OFFSET]
            .iter()
            .position(|&b| b != MARKER_BYTE)
        {
            return Err(K7Error::BadTrailingPreamble {
                offset: HEADER_LEN + offset,
            });
        }

        let required = HEADER_LEN + usize::from(header.data_length) + MARKER_LEN;
        if data.len() < required {
            return Err(K7Error::DataLengthExceedsImage {
                required,
                size: data.len(),
            });
        }

        debug!(
            format = header.format,
            name = %header.name_str(),
            version = header.version,
            start_line = %header.start_line_str(),
            protection = header.protection,
            check_pos = header.check_pos,
            start_address = header.start_address,
            data_length = header.data_length,
            checksum = header.checksum,
            "K7 header"
        );

        Ok(Self {
            data: data.to_vec(),
            header: Some(header),
        })
    }

    /// An unrecorded tape: `MAX_TAPE_SIZE` zero bytes, no header.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            data: vec![0; MAX_TAPE_SIZE],
            header: None,
        }
    }

    /// Build an image from header fields and a payload. The header's data
    /// length is taken from `payload`.
    pub fn build(header: &K7Header, payload: &[u8]) -> Result<Self, K7Error> {
        let size = PAYLOAD_OFFSET + payload.len() + MARKER_LEN;
        if size > MAX_TAPE_SIZE {
            return Err(K7Error::TooLarge(size));
        }
        let header = K7Header {
            data_length: payload.len() as u16,
            ..header.clone()
        };

        let mut data = Vec::with_capacity(size);
        header.write(&mut data);
        data.extend_from_slice(&[MARKER_BYTE; MARKER_LEN]);
        data.extend_from_slice(payload);
        data.extend_from_slice(&[MARKER_BYTE; MARKER_LEN]);

        Ok(Self {
            data,
            header: Some(header),
        })
    }

    #[must_use]
    pub fn header(&self) -> Option<&K7Header> {
        self.header.as_ref()
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.header.is_none()
    }

    /// Raw image bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Payload bytes declared by the header. Empty for a blank tape.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        match &self.header {
            Some(header) => {
                let end = (PAYLOAD_OFFSET + usize::from(header.data_length)).min(self.data.len());
                &self.data[PAYLOAD_OFFSET.min(end)..end]
            }
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> K7Header {
        K7Header {
            format: 0x20,
            name: *b"HELLO\0",
            version: 1,
            start_line: *b"10\0\0\0",
            protection: 0,
            check_pos: 0x1234,
            start_address: 0x49FC,
            data_length: 0,
            checksum: 0xBEEF,
        }
    }

    #[test]
    fn build_layout() {
        let image = K7Image::build(&sample_header(), &[1, 2, 3]).expect("fits");
        let data = image.data();
        assert_eq!(data.len(), 42 + 3 + 10);
        assert!(data[..10].iter().all(|&b| b == 0xD3));
        assert_eq!(data[10], 0x20);
        assert_eq!(&data[11..17], b"HELLO\0");
        assert_eq!(data[17], 1);
        assert_eq!(&data[18..23], b"10\0\0\0");
        assert_eq!(&data[24..26], &[0x34, 0x12]);
        assert_eq!(&data[26..28], &[0xFC, 0x49]);
        assert_eq!(&data[28..30], &[3, 0]);
        assert_eq!(&data[30..32], &[0xEF, 0xBE]);
        assert!(data[32..42].iter().all(|&b| b == 0xD6));
        assert_eq!(&data[42..45], &[1, 2, 3]);
        assert!(data[45..].iter().all(|&b| b == 0xD6));
    }

    #[test]
    fn parse_fields() {
        let built = K7Image::build(&sample_header(), b"PAYLOAD").expect("fits");
        let image = K7Image::parse(built.data()).expect("valid");
        let header = image.header().expect("header");
        assert_eq!(header.format, 0x20);
        assert_eq!(header.name_str(), "HELLO");
        assert_eq!(header.version, 1);
        assert_eq!(header.start_line_str(), "10");
        assert_eq!(header.protection, 0);
        assert_eq!(header.check_pos, 0x1234);
        assert_eq!(header.start_address, 0x49FC);
        assert_eq!(header.data_length, 7);
        assert_eq!(header.checksum, 0xBEEF);
        assert_eq!(image.payload(), b"PAYLOAD");
        assert!(!image.is_blank());
    }

    #[test]
    fn too_short() {
        let built = K7Image::build(&sample_header(), &[]).expect("fits");
        assert_eq!(K7Image::parse(&built.data()[..9]), Err(K7Error::TooShort(9)));
        assert_eq!(K7Image::parse(&built.data()[..41]), Err(K7Error::TooShort(41)));
        assert_eq!(K7Image::parse(&[]), Err(K7Error::TooShort(0)));
    }

    #[test]
    fn bad_leader() {
        let mut data = K7Image::build(&sample_header(), &[]).expect("fits").data().to_vec();
        data[4] = 0xD2;
        assert_eq!(
            K7Image::parse(&data),
            Err(K7Error::BadLeadingPreamble { offset: 4 })
        );
    }

    #[test]
    fn bad_marker() {
        let mut data = K7Image::build(&sample_header(), &[]).expect("fits").data().to_vec();
        data[41] = 0x00;
        assert_eq!(
            K7Image::parse(&data),
            Err(K7Error::BadTrailingPreamble { offset: 41 })
        );
    }

    #[test]
    fn declared_length_must_fit() {
        let payload = [0x55; 20];
        let built = K7Image::build(&sample_header(), &payload).expect("fits");
        // 32 + 20 + 10 bytes are required
        assert!(K7Image::parse(&built.data()[..62]).is_ok());
        assert_eq!(
            K7Image::parse(&built.data()[..61]),
            Err(K7Error::DataLengthExceedsImage { required: 62, size: 61 })
        );
    }

    #[test]
    fn oversized_images_rejected() {
        let payload = vec![0; MAX_TAPE_SIZE];
        assert!(matches!(
            K7Image::build(&sample_header(), &payload),
            Err(K7Error::TooLarge(_))
        ));
        let data = vec![LEADER_BYTE; MAX_TAPE_SIZE + 1];
        assert_eq!(K7Image::parse(&data), Err(K7Error::TooLarge(MAX_TAPE_SIZE + 1)));
    }

    #[test]
    fn blank_tape() {
        let blank = K7Image::blank();
        assert_eq!(blank.len(), MAX_TAPE_SIZE);
        assert!(blank.is_blank());
        assert!(blank.data().iter().all(|&b| b == 0));
        assert!(blank.payload().is_empty());
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            K7Error::BadLeadingPreamble { offset: 3 }.to_string(),
            "K7 leader byte at offset 3 is not $D3"
        );
        assert_eq!(
            K7Error::TooShort(5).to_string(),
            "K7 image too short: 5 bytes, need at least 42"
        );
    }
}
