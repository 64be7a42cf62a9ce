//! Access to the Wwise File Package (`.pck`) file format.
//!
//! A File Package is flatter than a SoundBank: one fixed 56-byte header, a
//! run of 20-byte index entries, four opaque bytes, then the wem payloads
//! laid end to end. Fresh packages carry no padding between wems; a rewrite
//! that shrinks a wem leaves a NUL gap up to the next recorded offset, and
//! the parser reads such gaps back as padding. Index offsets are absolute
//! file offsets, so [`Container::data_start`] is zero.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::rc::Rc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::{ResettingReader, SourceRef, Window};
use crate::wwise::{self, Container, ReplacementWem, Wem, WemDescriptor};

/// Bytes in the File Package header.
const HEADER_SIZE: u32 = 4 + 4 + 44 + 4;
/// Bytes per index entry.
const INDEX_ENTRY_SIZE: u32 = 20;

/// The fixed header of a File Package. Everything but the wem count is
/// carried through rewrites verbatim.
#[derive(Debug)]
struct PackageHeader {
    identifier: [u8; 4],
    length: u32,
    unknown: [u8; 44],
    wem_count: u32,
}

impl PackageHeader {
    fn parse(r: &mut Window) -> Result<Self> {
        let mut identifier = [0u8; 4];
        r.read_exact(&mut identifier)?;
        let length = r.read_u32::<LittleEndian>()?;
        let mut unknown = [0u8; 44];
        r.read_exact(&mut unknown)?;
        let wem_count = r.read_u32::<LittleEndian>()?;
        Ok(Self {
            identifier,
            length,
            unknown,
            wem_count,
        })
    }

    fn write(&self, w: &mut dyn Write) -> io::Result<u64> {
        w.write_all(&self.identifier)?;
        w.write_u32::<LittleEndian>(self.length)?;
        w.write_all(&self.unknown)?;
        w.write_u32::<LittleEndian>(self.wem_count)?;
        Ok(u64::from(HEADER_SIZE))
    }
}

/// The non-positional fields of one index entry. The wem ID, offset, and
/// length live in the wem's descriptor; serialization interleaves the two.
#[derive(Debug)]
struct IndexEntry {
    /// The type of data contained at this location.
    kind: u32,
    unknown: u32,
}

/// An open Wwise File Package.
#[derive(Debug)]
pub struct FilePackage {
    header: PackageHeader,
    entries: Vec<IndexEntry>,
    /// Four opaque bytes between the index block and the wem payloads,
    /// preserved verbatim on rewrite.
    index_tail: [u8; 4],
    wems: Vec<Wem>,
}

impl FilePackage {
    /// Open the File Package at `path`. The returned package keeps the file
    /// handle alive for its wem readers; dropping (or
    /// [`close`](Self::close)-ing) the package releases it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or is not a well-formed
    /// File Package.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(Rc::new(file))
    }

    /// Parse a File Package from a positional byte source. The package is
    /// expected to start at position 0.
    ///
    /// # Errors
    /// Returns an error on a short read, or when a wem does not begin at the
    /// offset its index entry records.
    pub fn from_reader(source: SourceRef) -> Result<Self> {
        let mut cursor = Window::new(Rc::clone(&source), 0, u64::MAX);
        let header = PackageHeader::parse(&mut cursor)?;

        let mut descriptors = Vec::with_capacity(header.wem_count as usize);
        let mut entries = Vec::with_capacity(header.wem_count as usize);
        for _ in 0..header.wem_count {
            let wem_id = cursor.read_u32::<LittleEndian>()?;
            let kind = cursor.read_u32::<LittleEndian>()?;
            let length = cursor.read_u32::<LittleEndian>()?;
            let offset = cursor.read_u32::<LittleEndian>()?;
            let unknown = cursor.read_u32::<LittleEndian>()?;
            descriptors.push(WemDescriptor {
                wem_id,
                offset,
                length,
            });
            entries.push(IndexEntry { kind, unknown });
        }

        let mut index_tail = [0u8; 4];
        cursor.read_exact(&mut index_tail)?;

        let mut wems = Vec::with_capacity(descriptors.len());
        for (i, descriptor) in descriptors.iter().enumerate() {
            let position = cursor.stream_position()?;
            if position != u64::from(descriptor.offset) {
                return Err(Error::WemOffsetMismatch {
                    wem_id: descriptor.wem_id,
                    expected: descriptor.offset,
                    actual: position,
                });
            }
            let reader =
                ResettingReader::new(Rc::clone(&source), position, u64::from(descriptor.length));
            // Unmodified packages lay wems flush against each other, but a
            // shrunk wem leaves a NUL gap before the next recorded offset;
            // carry that gap as the wem's padding so rewrites keep it.
            let wem_end = position + u64::from(descriptor.length);
            let padding_size = match descriptors.get(i + 1) {
                Some(next) => u64::from(next.offset)
                    .checked_sub(wem_end)
                    .ok_or(Error::WemOverlap {
                        wem_id: descriptor.wem_id,
                    })?,
                None => 0,
            };
            wems.push(Wem::new(
                reader,
                *descriptor,
                ResettingReader::zeros(padding_size),
            ));
            cursor.seek(SeekFrom::Current(
                i64::from(descriptor.length) + padding_size as i64,
            ))?;
        }

        debug!(wems = wems.len(), "parsed File Package");
        Ok(Self {
            header,
            entries,
            index_tail,
            wems,
        })
    }

    /// Release the package and its underlying byte source, including the
    /// file handle when the package was opened from a path.
    pub fn close(self) {}
}

impl Container for FilePackage {
    fn wems(&self) -> &[Wem] {
        &self.wems
    }

    fn wems_mut(&mut self) -> &mut [Wem] {
        &mut self.wems
    }

    fn alignment(&self) -> u32 {
        1
    }

    fn data_start(&self) -> u32 {
        0
    }

    fn replace_wems(&mut self, requests: Vec<ReplacementWem>) -> Result<()> {
        // The package has no aggregate data length of its own, so the
        // surplus has nowhere further to propagate.
        wwise::replace_wems(self, requests)?;
        Ok(())
    }

    fn write_to(&mut self, sink: &mut dyn Write) -> Result<u64> {
        let mut written = self.header.write(sink)?;
        for (entry, wem) in self.entries.iter().zip(&self.wems) {
            sink.write_u32::<LittleEndian>(wem.descriptor.wem_id)?;
            sink.write_u32::<LittleEndian>(entry.kind)?;
            sink.write_u32::<LittleEndian>(wem.descriptor.length)?;
            sink.write_u32::<LittleEndian>(wem.descriptor.offset)?;
            sink.write_u32::<LittleEndian>(entry.unknown)?;
            written += u64::from(INDEX_ENTRY_SIZE);
        }
        sink.write_all(&self.index_tail)?;
        written += 4;
        for wem in &mut self.wems {
            written += io::copy(&mut wem.reader, sink)?;
            written += io::copy(&mut wem.padding, sink)?;
        }
        Ok(written)
    }

    fn describe(&self) -> String {
        let mut out = String::new();
        let title = format!(
            "{:<7}|{:<15}|{:<15}|{:<8}|",
            "Index", "Id", "Offset", "Length"
        );
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "{}", "-".repeat(title.len()));
        for (i, wem) in self.wems.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:<7}|{:<15}|{:<15}|{:<8}|",
                i + 1,
                wem.descriptor.wem_id,
                wem.descriptor.offset,
                wem.descriptor.length
            );
        }
        out
    }
}
