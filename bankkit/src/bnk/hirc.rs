//! The HIRC section: the bank's object hierarchy.
//!
//! Only SFX/Voice sound objects are parsed in full, because they carry the
//! loop parameter the bank editor mutates. Every other object type passes
//! through as an opaque blob behind its descriptor.

use std::collections::HashMap;
use std::io::{self, Cursor, Read, Seek, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::io::Window;

use super::section::{SectionHeader, SECTION_HEADER_SIZE};
use super::LoopSetting;

/// Object type byte for SFX/Voice sound objects.
const SOUND_OBJECT_TYPE: u8 = 0x02;
/// Parameter type byte for the loop count parameter.
const LOOP_PARAMETER_TYPE: u8 = 0x3A;
/// Bytes in a HIRC object descriptor: type, length, object ID.
const OBJECT_DESCRIPTOR_SIZE: u32 = 9;
/// The object ID is counted by the descriptor's length field.
const OBJECT_ID_SIZE: u32 = 4;
/// Bytes a loop parameter adds to an object: one type byte plus four value
/// bytes.
const LOOP_PARAMETER_SIZE: u32 = 5;
/// The loop count encoding for endless playback.
const INFINITE_LOOPS: u32 = 0;

/// The HIRC section of a SoundBank.
#[derive(Debug)]
pub(crate) struct ObjectHierarchySection {
    header: SectionHeader,
    object_count: u32,
    objects: Vec<Object>,
    /// wem ID -> index into `objects` of the sound object that plays it.
    sound_object_of: HashMap<u32, usize>,
    /// wem ID -> raw loop count, for the wems whose sound object loops.
    /// Derived state, rebuilt whenever a sound object is mutated.
    loop_of: HashMap<u32, u32>,
}

#[derive(Debug)]
enum Object {
    Sound(SoundObject),
    Unknown(UnknownObject),
}

/// Describes a single object within the HIRC section.
#[derive(Debug)]
struct ObjectDescriptor {
    kind: u8,
    /// The length in bytes of the ID and data portion of this object.
    length: u32,
    object_id: u32,
}

impl ObjectDescriptor {
    fn parse(r: &mut Window) -> Result<(Self, u32)> {
        let kind = r.read_u8()?;
        let length = r.read_u32::<LittleEndian>()?;
        let object_id = r.read_u32::<LittleEndian>()?;
        // The length counts the object ID, which has already been read.
        let payload_length = length
            .checked_sub(OBJECT_ID_SIZE)
            .ok_or(Error::MalformedObject { object_id, length })?;
        Ok((
            Self {
                kind,
                length,
                object_id,
            },
            payload_length,
        ))
    }

    fn write(&self, w: &mut dyn Write) -> io::Result<()> {
        w.write_u8(self.kind)?;
        w.write_u32::<LittleEndian>(self.length)?;
        w.write_u32::<LittleEndian>(self.object_id)
    }
}

/// An object the editor has no structural knowledge of.
#[derive(Debug)]
struct UnknownObject {
    descriptor: ObjectDescriptor,
    data: Vec<u8>,
}

impl UnknownObject {
    fn write(&self, w: &mut dyn Write) -> io::Result<u64> {
        self.descriptor.write(w)?;
        w.write_all(&self.data)?;
        Ok(u64::from(OBJECT_DESCRIPTOR_SIZE) + self.data.len() as u64)
    }
}

/// An SFX/Voice sound object: the playback description of one wem.
#[derive(Debug)]
struct SoundObject {
    descriptor: ObjectDescriptor,
    prefix: [u8; 5],
    /// The wem this object plays, by ID, with the length the bank recorded
    /// for it.
    wem_id: u32,
    wem_length: u32,
    sound_kind: u8,
    structure: SoundStructure,
}

impl SoundObject {
    fn parse(descriptor: ObjectDescriptor, payload_length: u32, r: &mut Window) -> Result<Self> {
        let mut payload = vec![0u8; payload_length as usize];
        r.read_exact(&mut payload)?;
        let mut c = Cursor::new(payload.as_slice());

        let mut prefix = [0u8; 5];
        c.read_exact(&mut prefix)?;
        let wem_id = c.read_u32::<LittleEndian>()?;
        let wem_length = c.read_u32::<LittleEndian>()?;
        let sound_kind = c.read_u8()?;
        let structure = SoundStructure::parse(&mut c)?;

        Ok(Self {
            descriptor,
            prefix,
            wem_id,
            wem_length,
            sound_kind,
            structure,
        })
    }

    fn write(&self, w: &mut dyn Write) -> io::Result<u64> {
        self.descriptor.write(w)?;
        w.write_all(&self.prefix)?;
        w.write_u32::<LittleEndian>(self.wem_id)?;
        w.write_u32::<LittleEndian>(self.wem_length)?;
        w.write_u8(self.sound_kind)?;
        let structure_size = self.structure.write(w)?;
        Ok(u64::from(OBJECT_DESCRIPTOR_SIZE) + 5 + 8 + 1 + structure_size)
    }

    fn loop_value(&self) -> Option<u32> {
        let slot = self.structure.loop_slot()?;
        Some(u32::from_le_bytes(self.structure.parameter_values[slot]))
    }
}

/// The common playback structure embedded in a sound object. The bytes after
/// the parameter list are captured at parse time and re-emitted after it, so
/// inserting or removing a parameter never disturbs downstream fields.
#[derive(Debug)]
struct SoundStructure {
    override_parent_effects: u8,
    effects: EffectContainer,
    unknown: [u8; 10],
    parameter_types: Vec<u8>,
    parameter_values: Vec<[u8; 4]>,
    remainder: Vec<u8>,
}

impl SoundStructure {
    fn parse(c: &mut Cursor<&[u8]>) -> Result<Self> {
        let override_parent_effects = c.read_u8()?;
        let effects = EffectContainer::parse(c)?;
        let mut unknown = [0u8; 10];
        c.read_exact(&mut unknown)?;

        let parameter_count = c.read_u8()?;
        let mut parameter_types = vec![0u8; parameter_count as usize];
        c.read_exact(&mut parameter_types)?;
        let mut parameter_values = Vec::with_capacity(parameter_count as usize);
        for _ in 0..parameter_count {
            let mut value = [0u8; 4];
            c.read_exact(&mut value)?;
            parameter_values.push(value);
        }

        let mut remainder = Vec::new();
        c.read_to_end(&mut remainder)?;

        Ok(Self {
            override_parent_effects,
            effects,
            unknown,
            parameter_types,
            parameter_values,
            remainder,
        })
    }

    fn write(&self, w: &mut dyn Write) -> io::Result<u64> {
        w.write_u8(self.override_parent_effects)?;
        let effects_size = self.effects.write(w)?;
        w.write_all(&self.unknown)?;
        w.write_u8(self.parameter_types.len() as u8)?;
        w.write_all(&self.parameter_types)?;
        for value in &self.parameter_values {
            w.write_all(value)?;
        }
        w.write_all(&self.remainder)?;
        Ok(1 + effects_size
            + 10
            + 1
            + self.parameter_types.len() as u64 * 5
            + self.remainder.len() as u64)
    }

    fn loop_slot(&self) -> Option<usize> {
        self.parameter_types
            .iter()
            .position(|&t| t == LOOP_PARAMETER_TYPE)
    }
}

/// The effect list of a sound structure. The bypass mask byte is only
/// present when the list is non-empty.
#[derive(Debug)]
struct EffectContainer {
    bypass_mask: Option<u8>,
    effects: Vec<Effect>,
}

#[derive(Debug)]
struct Effect {
    index: u8,
    id: u32,
    pad: [u8; 2],
}

impl EffectContainer {
    fn parse(c: &mut Cursor<&[u8]>) -> Result<Self> {
        let count = c.read_u8()?;
        let bypass_mask = if count > 0 { Some(c.read_u8()?) } else { None };
        let mut effects = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let index = c.read_u8()?;
            let id = c.read_u32::<LittleEndian>()?;
            let mut pad = [0u8; 2];
            c.read_exact(&mut pad)?;
            effects.push(Effect { index, id, pad });
        }
        Ok(Self {
            bypass_mask,
            effects,
        })
    }

    fn write(&self, w: &mut dyn Write) -> io::Result<u64> {
        w.write_u8(self.effects.len() as u8)?;
        let mut written = 1u64;
        if let Some(mask) = self.bypass_mask {
            w.write_u8(mask)?;
            written += 1;
        }
        for effect in &self.effects {
            w.write_u8(effect.index)?;
            w.write_u32::<LittleEndian>(effect.id)?;
            w.write_all(&effect.pad)?;
            written += 7;
        }
        Ok(written)
    }
}

impl ObjectHierarchySection {
    pub(crate) fn parse(header: SectionHeader, r: &mut Window) -> Result<Self> {
        let start = r.stream_position()?;
        let object_count = r.read_u32::<LittleEndian>()?;
        let mut objects = Vec::with_capacity(object_count as usize);
        for _ in 0..object_count {
            let (descriptor, payload_length) = ObjectDescriptor::parse(r)?;
            let object = if descriptor.kind == SOUND_OBJECT_TYPE {
                Object::Sound(SoundObject::parse(descriptor, payload_length, r)?)
            } else {
                let mut data = vec![0u8; payload_length as usize];
                r.read_exact(&mut data)?;
                Object::Unknown(UnknownObject { descriptor, data })
            };
            objects.push(object);
        }

        // The declared section length and the object list must agree, or the
        // next section header would be read from inside this section.
        if r.stream_position()? - start != u64::from(header.length) {
            return Err(Error::TruncatedSection {
                identifier: header.identifier,
            });
        }

        let mut section = Self {
            header,
            object_count,
            objects,
            sound_object_of: HashMap::new(),
            loop_of: HashMap::new(),
        };
        section.rebuild_loop_index();
        Ok(section)
    }

    pub(crate) fn header(&self) -> &SectionHeader {
        &self.header
    }

    pub(crate) fn write(&self, w: &mut dyn Write) -> io::Result<u64> {
        self.header.write(w)?;
        w.write_u32::<LittleEndian>(self.object_count)?;
        let mut written = u64::from(SECTION_HEADER_SIZE) + 4;
        for object in &self.objects {
            written += match object {
                Object::Sound(sound) => sound.write(w)?,
                Object::Unknown(unknown) => unknown.write(w)?,
            };
        }
        Ok(written)
    }

    /// The loop setting of the sound object that plays `wem_id`.
    pub(crate) fn loop_of(&self, wem_id: u32) -> LoopSetting {
        match self.loop_of.get(&wem_id) {
            Some(&INFINITE_LOOPS) => LoopSetting::Infinite,
            Some(&count) => LoopSetting::Times(count),
            None => LoopSetting::Off,
        }
    }

    /// Change the loop parameter of the sound object that plays `wem_id`,
    /// growing or shrinking the object and this section by the parameter
    /// size as needed. A no-op when the setting already holds.
    pub(crate) fn set_loop(&mut self, wem_id: u32, setting: LoopSetting) -> Result<()> {
        if let LoopSetting::Times(count) = setting {
            if count < 2 {
                return Err(Error::InvalidLoopCount(count));
            }
        }
        if self.loop_of(wem_id) == setting {
            return Ok(());
        }

        let index = *self
            .sound_object_of
            .get(&wem_id)
            .ok_or(Error::NoSoundObject { wem_id })?;
        let object = match &mut self.objects[index] {
            Object::Sound(sound) => sound,
            Object::Unknown(_) => return Err(Error::NoSoundObject { wem_id }),
        };

        let slot = object.structure.loop_slot();
        match (slot, setting) {
            (None, LoopSetting::Off) => {}
            (Some(slot), LoopSetting::Off) => {
                object.structure.parameter_types.remove(slot);
                object.structure.parameter_values.remove(slot);
                object.descriptor.length -= LOOP_PARAMETER_SIZE;
                self.header.length -= LOOP_PARAMETER_SIZE;
            }
            (Some(slot), looping) => {
                object.structure.parameter_values[slot] = wire_value(looping).to_le_bytes();
            }
            (None, looping) => {
                object.structure.parameter_types.push(LOOP_PARAMETER_TYPE);
                object
                    .structure
                    .parameter_values
                    .push(wire_value(looping).to_le_bytes());
                object.descriptor.length += LOOP_PARAMETER_SIZE;
                self.header.length += LOOP_PARAMETER_SIZE;
            }
        }
        self.rebuild_loop_index();
        Ok(())
    }

    fn rebuild_loop_index(&mut self) {
        self.sound_object_of.clear();
        self.loop_of.clear();
        for (i, object) in self.objects.iter().enumerate() {
            if let Object::Sound(sound) = object {
                self.sound_object_of.insert(sound.wem_id, i);
                if let Some(value) = sound.loop_value() {
                    self.loop_of.insert(sound.wem_id, value);
                }
            }
        }
    }
}

fn wire_value(setting: LoopSetting) -> u32 {
    match setting {
        LoopSetting::Off => unreachable!("only looping settings reach the wire"),
        LoopSetting::Infinite => INFINITE_LOOPS,
        LoopSetting::Times(count) => count,
    }
}
