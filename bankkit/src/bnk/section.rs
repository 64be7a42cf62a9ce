//! The section layer of a SoundBank: an ordered list of
//! identifier-plus-length framed blocks, a few of which the bank understands.

use std::collections::HashSet;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::rc::Rc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::io::{ResettingReader, SourceRef, Window};
use crate::wwise::{Wem, WemDescriptor};

use super::hirc::ObjectHierarchySection;

/// Bytes in every section header: four identifier bytes plus a u32 length.
pub(crate) const SECTION_HEADER_SIZE: u32 = 8;
/// The known portion of the BKHD body: bank version plus bank ID.
pub(crate) const BANK_DESCRIPTOR_SIZE: u32 = 8;
/// Bytes per DIDX index entry.
pub(crate) const INDEX_ENTRY_SIZE: u32 = 12;
/// Wem payloads within the DATA region start on multiples of this.
pub(crate) const WEM_ALIGNMENT: u32 = 16;

pub(crate) const BKHD: [u8; 4] = *b"BKHD";
pub(crate) const DIDX: [u8; 4] = *b"DIDX";
pub(crate) const DATA: [u8; 4] = *b"DATA";
pub(crate) const HIRC: [u8; 4] = *b"HIRC";

/// An 8-byte section header: identifier plus body length.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SectionHeader {
    pub identifier: [u8; 4],
    pub length: u32,
}

impl SectionHeader {
    /// Read the next section header, or `None` at a clean end of file.
    ///
    /// An end of file part-way through a header is a truncation, not a clean
    /// end, and surfaces as an error.
    pub(crate) fn parse(r: &mut Window) -> Result<Option<Self>> {
        let mut identifier = [0u8; 4];
        let n = r.read(&mut identifier)?;
        if n == 0 {
            return Ok(None);
        }
        r.read_exact(&mut identifier[n..])?;
        let length = r.read_u32::<LittleEndian>()?;
        Ok(Some(Self { identifier, length }))
    }

    pub(crate) fn write(&self, w: &mut dyn Write) -> io::Result<()> {
        w.write_all(&self.identifier)?;
        w.write_u32::<LittleEndian>(self.length)
    }
}

/// A SoundBank section, held in the order encountered on disk. Rewriting
/// iterates this same order.
#[derive(Debug)]
pub(crate) enum Section {
    BankHeader(BankHeaderSection),
    DataIndex(DataIndexSection),
    Data(DataSection),
    ObjectHierarchy(ObjectHierarchySection),
    Unknown(UnknownSection),
}

impl Section {
    pub(crate) fn header(&self) -> &SectionHeader {
        match self {
            Section::BankHeader(s) => &s.header,
            Section::DataIndex(s) => &s.header,
            Section::Data(s) => &s.header,
            Section::ObjectHierarchy(s) => s.header(),
            Section::Unknown(s) => &s.header,
        }
    }
}

/// The BKHD section: bank version and ID, plus an opaque remainder carried
/// through rewrites verbatim.
#[derive(Debug)]
pub(crate) struct BankHeaderSection {
    pub(crate) header: SectionHeader,
    pub(crate) version: u32,
    pub(crate) bank_id: u32,
    remainder: Vec<u8>,
}

impl BankHeaderSection {
    pub(crate) fn parse(header: SectionHeader, r: &mut Window) -> Result<Self> {
        let version = r.read_u32::<LittleEndian>()?;
        let bank_id = r.read_u32::<LittleEndian>()?;
        let remaining = header
            .length
            .checked_sub(BANK_DESCRIPTOR_SIZE)
            .ok_or(Error::TruncatedSection { identifier: BKHD })?;
        let mut remainder = vec![0u8; remaining as usize];
        r.read_exact(&mut remainder)?;
        Ok(Self {
            header,
            version,
            bank_id,
            remainder,
        })
    }

    pub(crate) fn write(&self, w: &mut dyn Write) -> io::Result<u64> {
        self.header.write(w)?;
        w.write_u32::<LittleEndian>(self.version)?;
        w.write_u32::<LittleEndian>(self.bank_id)?;
        w.write_all(&self.remainder)?;
        Ok(u64::from(SECTION_HEADER_SIZE + BANK_DESCRIPTOR_SIZE) + self.remainder.len() as u64)
    }
}

/// The DIDX section. The descriptors parsed out of it live with their wems in
/// the DATA section; only the header stays here, and serialization draws the
/// live descriptors back out of the wem list.
#[derive(Debug)]
pub(crate) struct DataIndexSection {
    pub(crate) header: SectionHeader,
}

impl DataIndexSection {
    pub(crate) fn parse(header: SectionHeader, r: &mut Window) -> Result<(Self, Vec<WemDescriptor>)> {
        if header.length % INDEX_ENTRY_SIZE != 0 {
            return Err(Error::MalformedDataIndex {
                length: header.length,
                entry_size: INDEX_ENTRY_SIZE,
            });
        }
        let count = header.length / INDEX_ENTRY_SIZE;
        let mut descriptors = Vec::with_capacity(count as usize);
        let mut seen = HashSet::with_capacity(count as usize);
        for _ in 0..count {
            let wem_id = r.read_u32::<LittleEndian>()?;
            let offset = r.read_u32::<LittleEndian>()?;
            let length = r.read_u32::<LittleEndian>()?;
            if !seen.insert(wem_id) {
                return Err(Error::DuplicateWemId { wem_id });
            }
            descriptors.push(WemDescriptor {
                wem_id,
                offset,
                length,
            });
        }
        Ok((Self { header }, descriptors))
    }

    pub(crate) fn write(&self, descriptors: &[WemDescriptor], w: &mut dyn Write) -> io::Result<u64> {
        self.header.write(w)?;
        for descriptor in descriptors {
            w.write_u32::<LittleEndian>(descriptor.wem_id)?;
            w.write_u32::<LittleEndian>(descriptor.offset)?;
            w.write_u32::<LittleEndian>(descriptor.length)?;
        }
        Ok(u64::from(
            SECTION_HEADER_SIZE + INDEX_ENTRY_SIZE * descriptors.len() as u32,
        ))
    }
}

/// The DATA section: the wem payload region.
#[derive(Debug)]
pub(crate) struct DataSection {
    pub(crate) header: SectionHeader,
    /// The absolute offset in the file where wem payloads begin.
    pub(crate) data_start: u32,
    pub(crate) wems: Vec<Wem>,
}

impl DataSection {
    /// Build the wem list by pairing the index descriptors with their byte
    /// ranges. Each wem's padding spans the gap to the next wem's offset, or
    /// to the end of the section for the last wem.
    pub(crate) fn parse(
        header: SectionHeader,
        r: &mut Window,
        source: &SourceRef,
        descriptors: Vec<WemDescriptor>,
    ) -> Result<Self> {
        let data_start = r.stream_position()?;
        let mut wems = Vec::with_capacity(descriptors.len());
        for (i, descriptor) in descriptors.iter().enumerate() {
            let wem_start = data_start + u64::from(descriptor.offset);
            let reader =
                ResettingReader::new(Rc::clone(source), wem_start, u64::from(descriptor.length));

            let wem_end = wem_start + u64::from(descriptor.length);
            let next_offset = match descriptors.get(i + 1) {
                Some(next) => data_start + u64::from(next.offset),
                None => data_start + u64::from(header.length),
            };
            let padding_size = next_offset
                .checked_sub(wem_end)
                .ok_or(Error::WemOverlap {
                    wem_id: descriptor.wem_id,
                })?;

            wems.push(Wem::new(
                reader,
                *descriptor,
                ResettingReader::zeros(padding_size),
            ));
        }
        r.seek(SeekFrom::Current(i64::from(header.length)))?;
        Ok(Self {
            header,
            data_start: data_start as u32,
            wems,
        })
    }

    pub(crate) fn write(&mut self, w: &mut dyn Write) -> io::Result<u64> {
        self.header.write(w)?;
        let mut written = u64::from(SECTION_HEADER_SIZE);
        for wem in &mut self.wems {
            written += io::copy(&mut wem.reader, w)?;
            written += io::copy(&mut wem.padding, w)?;
        }
        Ok(written)
    }
}

/// Any section the bank does not understand, carried as an opaque blob.
#[derive(Debug)]
pub(crate) struct UnknownSection {
    pub(crate) header: SectionHeader,
    data: Vec<u8>,
}

impl UnknownSection {
    pub(crate) fn parse(header: SectionHeader, r: &mut Window) -> Result<Self> {
        let mut data = vec![0u8; header.length as usize];
        r.read_exact(&mut data)?;
        Ok(Self { header, data })
    }

    pub(crate) fn write(&self, w: &mut dyn Write) -> io::Result<u64> {
        self.header.write(w)?;
        w.write_all(&self.data)?;
        Ok(u64::from(SECTION_HEADER_SIZE) + self.data.len() as u64)
    }
}
