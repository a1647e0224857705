//! OLE Compound File Binary (CFB) reader.
//! Legacy `.xls` workbooks store their BIFF8 record stream inside this container.

use crate::error::TablesError;
use crate::helpers::string::to_u16;
use crate::helpers::string::to_u64;
use crate::helpers::string::to_usize;
use crate::helpers::string::to_usize_iter;
use encoding_rs::UTF_16LE;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use thiserror::Error;

/// Sector ids at or above this value are markers (free, end of chain, ...).
const MAX_REG_SECT: usize = 0xFFFF_FFFA;
const SIGNATURE: u64 = 0xE11A_B1A1_E011_CFD0;
const HEADER_SIZE: usize = 512;
const MINI_SECTOR_SIZE: usize = 64;
/// Streams smaller than this live in the mini stream.
const MINI_STREAM_CUTOFF: usize = 4096;
const ROOT_ENTRY: &str = "Root Entry";

#[derive(Error, Debug)]
pub enum CfbError {
    #[error("The file is corrupted or has an invalid CFB structure")]
    FileFormatError,

    #[error("Invalid OLE signature (not an office document?)")]
    OleSignatureError,

    #[error("Invalid sector size '2 ^ {1}' for major version '{0}'")]
    SectorSizeError(u16, u16),

    #[error("Sector chain is broken at sector '{0}'")]
    SectorChainError(usize),

    #[error("Empty root directory")]
    RootDirectoryError,
}

/// An in-memory compound file: every stream is addressable by its directory name.
pub(crate) struct Cfb {
    directories: HashMap<String, Directory>,
    fat: Vec<usize>,
    sectors: Sectors,
    mini_fat: Vec<usize>,
    mini_sectors: Sectors,
}

impl Cfb {
    /// Loads the whole container into memory and indexes its directory.
    pub(crate) fn new<RS: Read + Seek>(reader: &mut RS) -> Result<Cfb, TablesError> {
        let size = reader.seek(SeekFrom::End(0))? as usize;
        if size < HEADER_SIZE {
            Err(CfbError::FileFormatError)?;
        }
        reader.seek(SeekFrom::Start(0))?;
        let mut data = vec![0u8; size];
        reader.read_exact(&mut data)?;

        let header = Header::new(&data[..HEADER_SIZE])?;
        let sector_size = header.sector_size()?;
        let sectors = Sectors { data, size: sector_size, offset: sector_size };
        let fat = Self::load_fat(&sectors, &header)?;
        let directories = Self::load_directories(&fat, &sectors, header.directory_start)?;
        let mini_fat = if header.mini_fat_count > 0 {
            to_usize_iter(&Self::read_chain(&fat, &sectors, header.mini_fat_start)?).collect()
        } else {
            Vec::new()
        };
        let mini_sectors = match directories.get(ROOT_ENTRY) {
            Some(root) => {
                let mut data = Self::read_chain(&fat, &sectors, root.start)?;
                data.truncate(root.size);
                Sectors { data, size: MINI_SECTOR_SIZE, offset: 0 }
            }
            None => Sectors { data: Vec::new(), size: MINI_SECTOR_SIZE, offset: 0 },
        };

        Ok(Cfb { directories, fat, sectors, mini_fat, mini_sectors })
    }

    pub(crate) fn exists(&self, name: &str) -> bool {
        self.directories.contains_key(name)
    }

    /// Returns the full content of the named stream, or `None` if it does not exist.
    pub(crate) fn read(&self, name: &str) -> Result<Option<Vec<u8>>, TablesError> {
        let Some(directory) = self.directories.get(name) else {
            return Ok(None);
        };
        let mut bytes = if directory.size < MINI_STREAM_CUTOFF {
            Self::read_chain(&self.mini_fat, &self.mini_sectors, directory.start)?
        } else {
            Self::read_chain(&self.fat, &self.sectors, directory.start)?
        };
        bytes.truncate(directory.size);
        Ok(Some(bytes))
    }

    /// Collects the FAT by walking the DIFAT: 109 ids in the header, then chained DIFAT sectors
    /// whose last id points at the next one.
    fn load_fat(sectors: &Sectors, header: &Header) -> Result<Vec<usize>, TablesError> {
        let mut difat: Vec<usize> = to_usize_iter(&sectors.data[76..HEADER_SIZE]).collect();
        let mut next = header.difat_start;
        let mut visited = 0usize;
        while next < MAX_REG_SECT {
            if visited > header.difat_count {
                Err(CfbError::SectorChainError(next))?;
            }
            let ids: Vec<usize> = to_usize_iter(sectors.get(next)?).collect();
            let Some((last, ids)) = ids.split_last() else {
                return Err(CfbError::SectorChainError(next).into());
            };
            difat.extend_from_slice(ids);
            next = *last;
            visited += 1;
        }

        let mut fat = Vec::new();
        for index in difat.into_iter().filter(|index| *index < MAX_REG_SECT) {
            fat.extend(to_usize_iter(sectors.get(index)?));
        }
        if fat.is_empty() {
            Err(CfbError::FileFormatError)?;
        }
        Ok(fat)
    }

    fn load_directories(fat: &[usize], sectors: &Sectors, start: usize) -> Result<HashMap<String, Directory>, TablesError> {
        let bytes = Self::read_chain(fat, sectors, start)?;
        let directories: HashMap<String, Directory> = bytes
            .chunks_exact(128)
            .filter_map(Directory::new)
            .collect();
        if directories.is_empty() {
            Err(CfbError::RootDirectoryError)?
        }
        Ok(directories)
    }

    /// Concatenates the sectors of the chain starting at `start`.
    fn read_chain(fat: &[usize], sectors: &Sectors, start: usize) -> Result<Vec<u8>, TablesError> {
        let mut content = Vec::new();
        let mut index = start;
        let mut steps = 0usize;
        while index < MAX_REG_SECT {
            // A chain longer than the table itself must contain a cycle.
            if steps > fat.len() {
                Err(CfbError::SectorChainError(index))?;
            }
            content.extend_from_slice(sectors.get(index)?);
            index = *fat.get(index).ok_or(CfbError::SectorChainError(index))?;
            steps += 1;
        }
        Ok(content)
    }
}

/// Fixed-size sectors laid out after `offset` bytes of `data`.
struct Sectors {
    data: Vec<u8>,
    size: usize,
    offset: usize,
}

impl Sectors {
    fn get(&self, index: usize) -> Result<&[u8], CfbError> {
        let source = self.offset + index * self.size;
        let target = self.data.len().min(source + self.size);
        if source < target {
            Ok(&self.data[source..target])
        } else {
            Err(CfbError::SectorChainError(index))
        }
    }
}

struct Header {
    major_version: u16,
    sector_shift: u16,
    directory_start: usize,
    mini_fat_start: usize,
    mini_fat_count: usize,
    difat_start: usize,
    difat_count: usize,
}

impl Header {
    fn new(data: &[u8]) -> Result<Self, CfbError> {
        if to_u64(&data[0..8]) != SIGNATURE {
            return Err(CfbError::OleSignatureError);
        }
        Ok(Header {
            major_version: to_u16(&data[26..28]),
            sector_shift: to_u16(&data[30..32]),
            directory_start: to_usize(&data[48..52]),
            mini_fat_start: to_usize(&data[60..64]),
            mini_fat_count: to_usize(&data[64..68]),
            difat_start: to_usize(&data[68..72]),
            difat_count: to_usize(&data[72..76]),
        })
    }

    fn sector_size(&self) -> Result<usize, CfbError> {
        match (self.major_version, self.sector_shift) {
            (3, 0x0009) => Ok(512),
            (4, 0x000C) => Ok(4096),
            (version, shift) => Err(CfbError::SectorSizeError(version, shift)),
        }
    }
}

/// Starting sector and byte length of a stream.
struct Directory {
    start: usize,
    size: usize,
}

impl Directory {
    /// Parses a 128-byte directory entry; unused entries (empty name) are skipped.
    fn new(bytes: &[u8]) -> Option<(String, Directory)> {
        let length = (to_u16(&bytes[64..66]) as usize).min(64);
        if length == 0 {
            return None;
        }
        let (name, _, _) = UTF_16LE.decode(&bytes[..length]);
        let name = match name.find('\0') {
            Some(position) => name[..position].to_owned(),
            None => name.into_owned(),
        };
        let start = to_usize(&bytes[116..120]);
        let size = to_u64(&bytes[120..128]) as usize;
        Some((name, Directory { start, size }))
    }
}
