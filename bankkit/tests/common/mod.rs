//! Builders that synthesize byte-exact container images, standing in for the
//! binary corpus the large-file tests would otherwise need on disk.

#![allow(dead_code)]

use std::rc::Rc;

use bankkit::prelude::*;

/// Wem payloads within a SoundBank DATA region start on multiples of this.
pub const ALIGNMENT: u32 = 16;

/// A payload of `len` identical bytes.
pub fn payload(len: usize, fill: u8) -> Vec<u8> {
    vec![fill; len]
}

/// Frame `body` as a section with the given four-byte identifier.
pub fn section(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + body.len());
    out.extend_from_slice(id);
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    out
}

/// Build a SoundBank image holding the given wems (16-aligned, NUL padded),
/// an optional HIRC body, and an optional trailing opaque section.
pub fn bank_image(
    wems: &[(u32, Vec<u8>)],
    hirc: Option<Vec<u8>>,
    extra: Option<(&[u8; 4], Vec<u8>)>,
) -> Vec<u8> {
    let mut bkhd = Vec::new();
    bkhd.extend_from_slice(&134u32.to_le_bytes());
    bkhd.extend_from_slice(&0x1A2B_3C4Du32.to_le_bytes());
    bkhd.extend_from_slice(&[0u8; 8]);

    let mut didx = Vec::new();
    let mut data = Vec::new();
    let mut offset = 0u32;
    for (wem_id, bytes) in wems {
        let length = bytes.len() as u32;
        didx.extend_from_slice(&wem_id.to_le_bytes());
        didx.extend_from_slice(&offset.to_le_bytes());
        didx.extend_from_slice(&length.to_le_bytes());

        data.extend_from_slice(bytes);
        let end = offset + length;
        let padding = (ALIGNMENT - end % ALIGNMENT) % ALIGNMENT;
        data.extend(std::iter::repeat(0u8).take(padding as usize));
        offset = end + padding;
    }

    let mut image = section(b"BKHD", &bkhd);
    image.extend(section(b"DIDX", &didx));
    image.extend(section(b"DATA", &data));
    if let Some(body) = hirc {
        image.extend(section(b"HIRC", &body));
    }
    if let Some((id, body)) = extra {
        image.extend(section(id, &body));
    }
    image
}

/// A HIRC body holding the given pre-framed objects.
pub fn hirc_body(objects: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&(objects.len() as u32).to_le_bytes());
    for object in objects {
        body.extend_from_slice(object);
    }
    body
}

/// One SFX/Voice sound object (type 0x02) playing `wem_id`, with optional
/// effects and an optional raw loop parameter value.
pub fn sound_object(
    object_id: u32,
    wem_id: u32,
    wem_length: u32,
    effects: &[(u8, u32)],
    loop_value: Option<u32>,
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[0u8; 5]);
    body.extend_from_slice(&wem_id.to_le_bytes());
    body.extend_from_slice(&wem_length.to_le_bytes());
    body.push(0x00); // sound kind
    body.push(0x00); // override parent effects

    body.push(effects.len() as u8);
    if !effects.is_empty() {
        body.push(0x00); // bypass mask
        for (index, effect_id) in effects {
            body.push(*index);
            body.extend_from_slice(&effect_id.to_le_bytes());
            body.extend_from_slice(&[0u8; 2]);
        }
    }

    body.extend_from_slice(&[0u8; 10]);
    match loop_value {
        Some(value) => {
            body.push(1);
            body.push(0x3A);
            body.extend_from_slice(&value.to_le_bytes());
        }
        None => body.push(0),
    }
    // Trailing structure bytes the editor must carry through untouched.
    body.extend_from_slice(&[0x11, 0x22, 0x33]);

    framed_object(0x02, object_id, &body)
}

/// An object of any other type, carried opaquely.
pub fn opaque_object(kind: u8, object_id: u32, data: &[u8]) -> Vec<u8> {
    framed_object(kind, object_id, data)
}

fn framed_object(kind: u8, object_id: u32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(kind);
    out.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
    out.extend_from_slice(&object_id.to_le_bytes());
    out.extend_from_slice(body);
    out
}

/// Build a File Package image: 56-byte header, 20-byte index entries with
/// absolute offsets, a 4-byte opaque tail, then the wems laid end to end.
pub fn package_image(wems: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let count = wems.len() as u32;
    let mut image = Vec::new();
    image.extend_from_slice(b"AKPK");
    image.extend_from_slice(&0x1000u32.to_le_bytes());
    image.extend_from_slice(&[0xAB; 44]);
    image.extend_from_slice(&count.to_le_bytes());

    let mut offset = 56 + 20 * count + 4;
    for (i, (wem_id, bytes)) in wems.iter().enumerate() {
        image.extend_from_slice(&wem_id.to_le_bytes());
        image.extend_from_slice(&1u32.to_le_bytes());
        image.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        image.extend_from_slice(&offset.to_le_bytes());
        image.extend_from_slice(&(0x0100 + i as u32).to_le_bytes());
        offset += bytes.len() as u32;
    }
    image.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    for (_, bytes) in wems {
        image.extend_from_slice(bytes);
    }
    image
}

pub fn parse_bank(image: &[u8]) -> SoundBank {
    SoundBank::from_reader(Rc::new(image.to_vec())).expect("bank image should parse")
}

pub fn parse_package(image: &[u8]) -> FilePackage {
    FilePackage::from_reader(Rc::new(image.to_vec())).expect("package image should parse")
}

/// Serialize a container, checking the reported byte count against the bytes
/// actually produced.
pub fn serialize<C: Container>(container: &mut C) -> Vec<u8> {
    let mut out = Vec::new();
    let written = container
        .write_to(&mut out)
        .expect("serialization should succeed");
    assert_eq!(
        written,
        out.len() as u64,
        "reported written bytes must match the bytes produced"
    );
    out
}

/// Check the adjacency and aggregate-length bookkeeping of a container's wem
/// list: each wem's padded extent must land exactly on the next wem's offset,
/// and the extents must sum to `region_length` when given.
pub fn assert_wem_layout(container: &dyn Container, region_length: Option<u64>) {
    let wems = container.wems();
    let mut total = 0u64;
    for pair in wems.windows(2) {
        assert_eq!(
            u64::from(pair[0].descriptor.offset)
                + u64::from(pair[0].descriptor.length)
                + pair[0].padding_size(),
            u64::from(pair[1].descriptor.offset),
            "wem {} must end where wem {} begins",
            pair[0].descriptor.wem_id,
            pair[1].descriptor.wem_id
        );
    }
    for wem in wems {
        total += u64::from(wem.descriptor.length) + wem.padding_size();
    }
    if let Some(region_length) = region_length {
        assert_eq!(total, region_length, "wem extents must fill the data region");
    }
}
