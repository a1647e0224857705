//! Binary Interchange File Format 8 (BIFF8), the record stream of Excel 97-2003 workbooks.
//!
//! A record is a 2-byte type, a 2-byte length and its payload. Payloads longer than
//! 8224 bytes spill into following `CONTINUE` records; the reader presents a record and
//! its continuations as one logical sequence of chunks.

use crate::error::TablesError;
use crate::helpers::string::to_f64;
use crate::helpers::string::to_u16;
use crate::helpers::string::to_u32;
use crate::helpers::string::to_u64;
use encoding_rs::UTF_16LE;
use thiserror::Error;

const CONTINUE: u16 = 60;

#[derive(Error, Debug)]
pub enum Biff8Error {
    #[error("Fewer than {0} bytes remaining in record")]
    NoEnoughDataError(usize),
}

pub(crate) struct Biff8Reader {
    buffer: Vec<u8>,
    /// Start of the next record header
    pointer: usize,
    /// Payload ranges of the current record and its continuations
    chunks: Vec<(usize, usize)>,
    index: usize,
    offset: usize,
}

impl Biff8Reader {
    pub(crate) fn new(data: Vec<u8>) -> Biff8Reader {
        Biff8Reader {
            buffer: data,
            pointer: 0,
            chunks: Vec::new(),
            index: 0,
            offset: 0,
        }
    }

    /// Advances to the next record and returns its type, or `None` at end of stream.
    pub(crate) fn next(&mut self) -> Result<Option<u16>, TablesError> {
        if self.pointer + 4 > self.buffer.len() {
            return Ok(None);
        }
        self.index = 0;
        self.offset = 0;
        self.chunks.clear();

        let kind = self.get_u16_at(self.pointer)?;
        self.push_chunk()?;
        while self.pointer + 4 <= self.buffer.len() && self.get_u16_at(self.pointer)? == CONTINUE {
            self.push_chunk()?;
        }
        Ok(Some(kind))
    }

    fn push_chunk(&mut self) -> Result<(), TablesError> {
        let size = self.get_u16_at(self.pointer + 2)? as usize;
        let lower = self.pointer + 4;
        let upper = lower + size;
        if upper > self.buffer.len() {
            Err(Biff8Error::NoEnoughDataError(size))?;
        }
        self.chunks.push((lower, upper));
        self.pointer = upper;
        Ok(())
    }

    /// Moves to an absolute stream offset, e.g. a worksheet substream from `BOUNDSHEET8`.
    pub(crate) fn goto(&mut self, pointer: usize) {
        self.pointer = pointer;
        self.chunks.clear();
    }

    /// Reads up to `length` bytes without crossing into the next chunk.
    fn read(&mut self, length: usize) -> &[u8] {
        while let Some((lower, upper)) = self.chunks.get(self.index).copied() {
            let source = lower + self.offset;
            if source >= upper {
                self.index += 1;
                self.offset = 0;
                continue;
            }
            let target = upper.min(source + length);
            if target == upper {
                self.index += 1;
                self.offset = 0;
            } else {
                self.offset += target - source;
            }
            return &self.buffer[source..target];
        }
        &[]
    }

    /// Reads exactly `N` bytes, following continuations when a value straddles them.
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], TablesError> {
        let mut bytes = [0u8; N];
        let mut filled = 0;
        while filled < N {
            let data = self.read(N - filled);
            if data.is_empty() {
                Err(Biff8Error::NoEnoughDataError(N))?;
            }
            bytes[filled..filled + data.len()].copy_from_slice(data);
            filled += data.len();
        }
        Ok(bytes)
    }

    pub(crate) fn skip(&mut self, length: usize) -> Result<(), TablesError> {
        let mut remaining = length;
        while remaining > 0 {
            let size = self.read(remaining).len();
            if size == 0 {
                Err(Biff8Error::NoEnoughDataError(length))?;
            }
            remaining -= size;
        }
        Ok(())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, TablesError> {
        self.read_array::<1>().map(|bytes| bytes[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, TablesError> {
        self.read_array::<2>().map(|bytes| to_u16(&bytes))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, TablesError> {
        self.read_array::<4>().map(|bytes| to_u32(&bytes))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, TablesError> {
        self.read_array::<8>().map(|bytes| to_u64(&bytes))
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, TablesError> {
        self.read_array::<8>().map(|bytes| to_f64(&bytes))
    }

    /// Reads a u16 located `offset` bytes before the end of the current record.
    pub(crate) fn get_u16_back(&self, offset: usize) -> Result<u16, TablesError> {
        let mut offset = offset;
        for (lower, upper) in self.chunks.iter().rev() {
            if *lower + offset <= *upper {
                return self.get_u16_at(*upper - offset);
            }
            offset -= *upper - *lower;
        }
        Err(Biff8Error::NoEnoughDataError(2).into())
    }

    fn get_u16_at(&self, index: usize) -> Result<u16, TablesError> {
        match self.buffer.get(index..index + 2) {
            Some(bytes) => Ok(to_u16(bytes)),
            None => Err(Biff8Error::NoEnoughDataError(2).into()),
        }
    }

    /// Decodes an RK value: a 30-bit integer or the high 30 bits of an IEEE double,
    /// optionally divided by 100.
    pub(crate) fn read_rk_number(&mut self) -> Result<f64, TablesError> {
        let value = self.read_u32()?;
        let is_percentage = (value & 0x01) != 0;
        let is_integer = (value & 0x02) != 0;
        let number = if is_integer {
            ((value as i32) >> 2) as f64
        } else {
            f64::from_bits(((value & 0xFFFF_FFFC) as u64) << 32)
        };
        Ok(if is_percentage { number / 100.0 } else { number })
    }

    /// ShortXLUnicodeString: 1-byte character count.
    pub(crate) fn read_short_xl_unicode_string(&mut self) -> Result<String, TablesError> {
        let chars = self.read_u8()? as usize;
        self.read_string(chars, false)
    }

    /// XLUnicodeString: 2-byte character count.
    pub(crate) fn read_xl_unicode_string(&mut self) -> Result<String, TablesError> {
        let chars = self.read_u16()? as usize;
        self.read_string(chars, false)
    }

    /// XLUnicodeRichExtendedString, as stored in the shared string table.
    pub(crate) fn read_xl_unicode_rich_extended_string(&mut self) -> Result<String, TablesError> {
        let chars = self.read_u16()? as usize;
        self.read_string(chars, true)
    }

    fn read_string(&mut self, chars: usize, is_extended: bool) -> Result<String, TablesError> {
        let mut content = String::new();
        let flag = self.read_u8()?;
        let rich_runs = if is_extended && (flag & 0x8) != 0 {
            self.read_u16()? as usize
        } else {
            0
        };
        let phonetic_size = if is_extended && (flag & 0x4) != 0 {
            self.read_u32()? as usize
        } else {
            0
        };

        // Character data that crosses a CONTINUE boundary restarts with its own flag byte.
        let mut remaining = chars;
        let mut is_high_byte = (flag & 0x1) != 0;
        loop {
            remaining -= self.read_chars_into(remaining, is_high_byte, &mut content);
            if remaining == 0 {
                break;
            }
            is_high_byte = (self.read_u8()? & 0x1) != 0;
        }

        self.skip(4 * rich_runs)?;
        self.skip(phonetic_size)?;
        Ok(content)
    }

    /// Appends up to `chars` characters from the current chunk, returning how many were read.
    fn read_chars_into(&mut self, chars: usize, is_high_byte: bool, content: &mut String) -> usize {
        if is_high_byte {
            let bytes = self.read(chars * 2);
            let (string, _) = UTF_16LE.decode_without_bom_handling(bytes);
            content.push_str(&string);
            bytes.len() / 2
        } else {
            // Compressed strings hold the low byte of each UTF-16 code unit.
            let bytes = self.read(chars);
            content.extend(bytes.iter().map(|byte| *byte as char));
            bytes.len()
        }
    }
}

/// Loops over the records of a reader, matching each record type against the given arms.
#[macro_export]
macro_rules! match_biff8_record {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(kind) = $reader.next()? {
            match kind {
                $($arms)*
                _ => (),
            }
        }
    };
}
