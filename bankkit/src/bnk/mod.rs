//! Access to the Wwise SoundBank (`.bnk`) file format.
//!
//! A SoundBank is a stream of identifier-plus-length sections. The bank
//! header (`BKHD`), data index (`DIDX`), wem data (`DATA`), and object
//! hierarchy (`HIRC`) sections are understood structurally; anything else is
//! carried through rewrites untouched. Wem payloads are 16-byte aligned
//! within the data region, with NUL padding filling the gaps.

mod hirc;
mod section;

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::io::SourceRef;
use crate::wwise::{self, Container, ReplacementWem, Wem, WemDescriptor};

use hirc::ObjectHierarchySection;
use section::{
    BankHeaderSection, DataIndexSection, DataSection, Section, SectionHeader, UnknownSection,
    BKHD, DATA, DIDX, HIRC, WEM_ALIGNMENT,
};

/// The loop behavior of a sound object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopSetting {
    /// The sound plays once.
    Off,
    /// The sound repeats forever.
    Infinite,
    /// The sound plays this many times in total. Only counts of two or more
    /// can be encoded; a count of one is the same as not looping.
    Times(u32),
}

/// An open Wwise SoundBank.
#[derive(Debug)]
pub struct SoundBank {
    /// The sections of this bank, in the order they were read; rewriting
    /// iterates this same list.
    sections: Vec<Section>,
    /// Index into `sections` of the DATA section.
    data: usize,
    /// Index into `sections` of the HIRC section, when the bank has one.
    hirc: Option<usize>,
}

impl SoundBank {
    /// Open the SoundBank at `path`. The returned bank keeps the file handle
    /// alive for its wem readers; dropping (or [`close`](Self::close)-ing)
    /// the bank releases it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or is not a well-formed
    /// SoundBank.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(Rc::new(file))
    }

    /// Parse a SoundBank from a positional byte source. The bank is expected
    /// to start at position 0.
    ///
    /// # Errors
    /// Returns an error on a short read, a duplicate wem ID in the data
    /// index, or a bank with no wem data.
    pub fn from_reader(source: SourceRef) -> Result<Self> {
        let mut cursor = crate::io::Window::new(Rc::clone(&source), 0, u64::MAX);
        let mut sections = Vec::new();
        let mut data = None;
        let mut hirc = None;
        // Descriptors read from the DIDX, waiting for the DATA section that
        // carries their payloads.
        let mut pending_index: Vec<WemDescriptor> = Vec::new();

        while let Some(header) = SectionHeader::parse(&mut cursor)? {
            match header.identifier {
                BKHD => {
                    let sec = BankHeaderSection::parse(header, &mut cursor)?;
                    sections.push(Section::BankHeader(sec));
                }
                DIDX => {
                    let (sec, descriptors) = DataIndexSection::parse(header, &mut cursor)?;
                    pending_index = descriptors;
                    sections.push(Section::DataIndex(sec));
                }
                DATA => {
                    let descriptors = std::mem::take(&mut pending_index);
                    let sec = DataSection::parse(header, &mut cursor, &source, descriptors)?;
                    data = Some(sections.len());
                    sections.push(Section::Data(sec));
                }
                HIRC => {
                    let sec = ObjectHierarchySection::parse(header, &mut cursor)?;
                    hirc = Some(sections.len());
                    sections.push(Section::ObjectHierarchy(sec));
                }
                _ => {
                    let sec = UnknownSection::parse(header, &mut cursor)?;
                    sections.push(Section::Unknown(sec));
                }
            }
        }

        let Some(data) = data else {
            return Err(Error::NoWems);
        };
        let bank = Self {
            sections,
            data,
            hirc,
        };
        if bank.data_section().wems.is_empty() {
            return Err(Error::NoWems);
        }
        debug!(
            sections = bank.sections.len(),
            wems = bank.data_section().wems.len(),
            "parsed SoundBank"
        );
        Ok(bank)
    }

    /// Release the bank and its underlying byte source, including the file
    /// handle when the bank was opened from a path.
    pub fn close(self) {}

    /// The bank format version recorded in the header section, if the bank
    /// has one.
    #[must_use]
    pub fn version(&self) -> Option<u32> {
        self.sections.iter().find_map(|section| match section {
            Section::BankHeader(sec) => Some(sec.version),
            _ => None,
        })
    }

    /// The bank ID recorded in the header section, if the bank has one.
    #[must_use]
    pub fn bank_id(&self) -> Option<u32> {
        self.sections.iter().find_map(|section| match section {
            Section::BankHeader(sec) => Some(sec.bank_id),
            _ => None,
        })
    }

    /// The declared length of the DATA section's data region: the sum of
    /// every wem's length and padding.
    #[must_use]
    pub fn data_region_length(&self) -> u32 {
        self.data_section().header.length
    }

    /// The loop setting of the wem at `wem_index`. An index outside the wem
    /// list, or a bank without an object hierarchy, reads as
    /// [`LoopSetting::Off`].
    #[must_use]
    pub fn loop_of(&self, wem_index: usize) -> LoopSetting {
        let Some(wem) = self.data_section().wems.get(wem_index) else {
            return LoopSetting::Off;
        };
        match self.hirc_section() {
            Some(hirc) => hirc.loop_of(wem.descriptor.wem_id),
            None => LoopSetting::Off,
        }
    }

    /// Set the loop behavior of the wem at `wem_index`, updating the sound
    /// object's parameter list and both enclosing length fields. Idempotent:
    /// applying the current setting changes nothing.
    ///
    /// # Errors
    /// Returns [`Error::WemIndexOutOfRange`] for an index outside the wem
    /// list, [`Error::InvalidLoopCount`] for a finite count below two, and
    /// [`Error::NoSoundObject`] when no sound object plays the wem.
    pub fn set_loop(&mut self, wem_index: usize, setting: LoopSetting) -> Result<()> {
        let wems = &self.data_section().wems;
        let wem_id = wems
            .get(wem_index)
            .ok_or(Error::WemIndexOutOfRange {
                index: wem_index,
                count: wems.len(),
            })?
            .descriptor
            .wem_id;
        let Some(hirc) = self.hirc_section_mut() else {
            return Err(Error::NoSoundObject { wem_id });
        };
        hirc.set_loop(wem_id, setting)
    }

    fn data_section(&self) -> &DataSection {
        match &self.sections[self.data] {
            Section::Data(sec) => sec,
            _ => unreachable!("the data index always points at a DATA section"),
        }
    }

    fn data_section_mut(&mut self) -> &mut DataSection {
        match &mut self.sections[self.data] {
            Section::Data(sec) => sec,
            _ => unreachable!("the data index always points at a DATA section"),
        }
    }

    fn hirc_section(&self) -> Option<&ObjectHierarchySection> {
        match self.hirc.map(|i| &self.sections[i]) {
            Some(Section::ObjectHierarchy(sec)) => Some(sec),
            _ => None,
        }
    }

    fn hirc_section_mut(&mut self) -> Option<&mut ObjectHierarchySection> {
        match self.hirc.map(|i| &mut self.sections[i]) {
            Some(Section::ObjectHierarchy(sec)) => Some(sec),
            _ => None,
        }
    }
}

impl Container for SoundBank {
    fn wems(&self) -> &[Wem] {
        &self.data_section().wems
    }

    fn wems_mut(&mut self) -> &mut [Wem] {
        &mut self.data_section_mut().wems
    }

    fn alignment(&self) -> u32 {
        WEM_ALIGNMENT
    }

    fn data_start(&self) -> u32 {
        self.data_section().data_start
    }

    fn replace_wems(&mut self, requests: Vec<ReplacementWem>) -> Result<()> {
        let surplus = wwise::replace_wems(self, requests)?;
        if surplus > 0 {
            // The DATA header must account for the grown data region.
            self.data_section_mut().header.length += surplus as u32;
        }
        Ok(())
    }

    fn write_to(&mut self, sink: &mut dyn Write) -> Result<u64> {
        // The data index serializes the live descriptors, which live with
        // their wems over in the DATA section.
        let descriptors: Vec<WemDescriptor> =
            self.wems().iter().map(|wem| wem.descriptor).collect();

        let mut written = 0u64;
        for section in &mut self.sections {
            written += match section {
                Section::BankHeader(sec) => sec.write(sink)?,
                Section::DataIndex(sec) => sec.write(&descriptors, sink)?,
                Section::Data(sec) => sec.write(sink)?,
                Section::ObjectHierarchy(sec) => sec.write(sink)?,
                Section::Unknown(sec) => sec.write(sink)?,
            };
        }
        Ok(written)
    }

    fn describe(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            let header = section.header();
            let id = String::from_utf8_lossy(&header.identifier);
            let _ = writeln!(out, "{id}: len({})", header.length);
        }

        let title = format!(
            "{:<7}|{:<15}|{:<15}|{:<8}|{:<12}|",
            "Index", "Offset", "Length", "Padding", "Loop (0=Inf)"
        );
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "{}", "-".repeat(title.len()));
        for (i, wem) in self.data_section().wems.iter().enumerate() {
            let loop_column = match self.loop_of(i) {
                LoopSetting::Off => -1,
                LoopSetting::Infinite => 0,
                LoopSetting::Times(count) => i64::from(count),
            };
            let _ = writeln!(
                out,
                "{:<7}|{:<15}|{:<15}|{:<8}|{:<12}|",
                i + 1,
                wem.descriptor.offset,
                wem.descriptor.length,
                wem.padding_size(),
                loop_column
            );
        }
        out
    }
}
