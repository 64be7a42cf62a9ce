//! The surface shared by every Wwise container format, and the wem
//! replacement engine both formats drive.

use std::io::{Read, Write};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::io::{ResettingReader, SourceRef};

/// Location of a single wem within a container's data region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WemDescriptor {
    pub wem_id: u32,
    /// The number of bytes from the start of the wem data region that this
    /// wem begins.
    pub offset: u32,
    /// The length in bytes of this wem.
    pub length: u32,
}

/// A single sound entity stored within a container.
#[derive(Debug)]
pub struct Wem {
    /// The bytes of the wem payload.
    pub(crate) reader: ResettingReader,
    pub descriptor: WemDescriptor,
    /// The bytes that remain until the next wem if there is one, or the end
    /// of the data region. These are NUL(0x00) padding up to the next aligned
    /// offset.
    pub(crate) padding: ResettingReader,
}

impl Wem {
    pub(crate) fn new(
        reader: ResettingReader,
        descriptor: WemDescriptor,
        padding: ResettingReader,
    ) -> Self {
        Self {
            reader,
            descriptor,
            padding,
        }
    }

    /// The number of padding bytes between the end of this wem and the next
    /// wem's offset.
    #[must_use]
    pub fn padding_size(&self) -> u64 {
        self.padding.size()
    }
}

/// Reading a wem yields its payload only, never its trailing padding.
impl Read for Wem {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

/// A request to substitute the wem at `wem_index` with `length` bytes drawn
/// from `source`.
pub struct ReplacementWem {
    /// The source holding the contents of the new wem.
    pub source: SourceRef,
    /// The index, where zero is the first wem, into the container's wems.
    pub wem_index: usize,
    /// The number of bytes to read in for this wem.
    pub length: u64,
}

/// The operations every container format exposes.
pub trait Container {
    /// The wems stored in this container, first wem at index 0.
    fn wems(&self) -> &[Wem];

    fn wems_mut(&mut self) -> &mut [Wem];

    /// The alignment wem offsets must satisfy within the data region.
    fn alignment(&self) -> u32;

    /// The offset into the serialized file where the wem data region begins.
    /// `data_start() + descriptor.offset` gives the true position of a wem.
    fn data_start(&self) -> u32;

    /// Replace wems with the given requests, updating every descriptor,
    /// padding run, and aggregate length the container keeps.
    ///
    /// # Errors
    /// Returns [`Error::WemIndexOutOfRange`] before any mutation if a request
    /// targets a wem the container does not have.
    fn replace_wems(&mut self, requests: Vec<ReplacementWem>) -> Result<()>;

    /// Serialize the whole container to `sink`, returning the bytes written.
    ///
    /// # Errors
    /// Propagates IO errors from the source or the sink.
    fn write_to(&mut self, sink: &mut dyn Write) -> Result<u64>;

    /// A printable summary of the container's structure and wem table.
    fn describe(&self) -> String;
}

/// Replace the wems of `container` with all the replacements in `requests`,
/// rewriting descriptors, padding, and the offsets of every affected
/// successor. Returns the net growth in bytes of the data region; callers
/// fold a positive surplus into their own enclosing length fields.
///
/// Amending offsets in a single pass requires that replacements happen in the
/// order their wems appear in the file, so requests are sorted by index
/// first. Only growth propagates: a shrunk wem donates the freed bytes to its
/// own padding, leaving every later offset untouched.
pub(crate) fn replace_wems(
    container: &mut dyn Container,
    mut requests: Vec<ReplacementWem>,
) -> Result<i64> {
    let count = container.wems().len();
    for request in &requests {
        if request.wem_index >= count {
            return Err(Error::WemIndexOutOfRange {
                index: request.wem_index,
                count,
            });
        }
    }
    requests.sort_by_key(|request| request.wem_index);

    let align = i64::from(container.alignment());
    // The number of bytes later wem offsets must grow by, because of size
    // increases in the wems before them.
    let mut surplus: i64 = 0;
    for (i, request) in requests.iter().enumerate() {
        {
            let wem = &mut container.wems_mut()[request.wem_index];
            let old_length = i64::from(wem.descriptor.length);
            let new_length = request.length as i64;
            wem.reader = ResettingReader::new(Rc::clone(&request.source), 0, request.length);

            let old_padding = wem.padding.size() as i64;
            let new_padding;
            if new_length > old_length {
                surplus += new_length - old_length;
                // Pad the new end of this wem out to the next aligned offset.
                let end = i64::from(wem.descriptor.offset) + new_length;
                new_padding = (align - end % align) % align;
                // Later offsets move by the change in padding as well.
                surplus += new_padding - old_padding;
            } else {
                // Pad from the end of the new wem to the offset of the next
                // wem; nothing after this wem moves.
                new_padding = old_padding + (old_length - new_length);
            }

            wem.descriptor.length = request.length as u32;
            wem.padding = ResettingReader::zeros(new_padding as u64);
        }

        if surplus > 0 {
            // Shift the offsets of the wems that follow, up to and including
            // the next replacement's wem. Past that point the surplus must be
            // re-evaluated, since that replacement changes it.
            let next_index = requests.get(i + 1).map(|next| next.wem_index);
            let wems = container.wems_mut();
            for wi in (request.wem_index + 1)..wems.len() {
                let offset = i64::from(wems[wi].descriptor.offset) + surplus;
                wems[wi].descriptor.offset = offset as u32;
                if Some(wi) == next_index {
                    break;
                }
            }
        }
    }

    Ok(surplus)
}

/// The canonical file name for a wem unpacked from a container: names are
/// 1-based and zero-padded to the decimal width of the wem count.
#[must_use]
pub fn canonical_wem_name(index: usize, wem_count: usize) -> String {
    let width = wem_count.to_string().len();
    format!("{:0width$}.wem", index + 1)
}
