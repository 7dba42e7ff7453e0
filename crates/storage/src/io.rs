//! Byte stream seam for array buffers
//!
//! Element encoding is little endian; booleans are one byte (`0` or `1`).
//! Only the raw tuple payload is read or written, the container format around
//! it belongs to the caller.

use crate::store::{with_typed_store, AnyDataStore, DataStore, StoreElement};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use tessera_core::{DataPath, Error, Result};

/// Elements with a fixed little-endian byte encoding
pub trait StreamElement: StoreElement {
    /// Read one element
    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self>;

    /// Write one element
    fn write_to<W: Write>(self, writer: &mut W) -> std::io::Result<()>;
}

macro_rules! impl_stream_element {
    ($($ty:ty => $read:ident, $write:ident);* $(;)?) => {
        $(
            impl StreamElement for $ty {
                fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
                    reader.$read::<LittleEndian>()
                }

                fn write_to<W: Write>(self, writer: &mut W) -> std::io::Result<()> {
                    writer.$write::<LittleEndian>(self)
                }
            }
        )*
    };
}

impl_stream_element!(
    i16 => read_i16, write_i16;
    u16 => read_u16, write_u16;
    i32 => read_i32, write_i32;
    u32 => read_u32, write_u32;
    i64 => read_i64, write_i64;
    u64 => read_u64, write_u64;
    f32 => read_f32, write_f32;
    f64 => read_f64, write_f64;
);

impl StreamElement for i8 {
    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        reader.read_i8()
    }

    fn write_to<W: Write>(self, writer: &mut W) -> std::io::Result<()> {
        writer.write_i8(self)
    }
}

impl StreamElement for u8 {
    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        reader.read_u8()
    }

    fn write_to<W: Write>(self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u8(self)
    }
}

impl StreamElement for bool {
    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        Ok(reader.read_u8()? != 0)
    }

    fn write_to<W: Write>(self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u8(u8::from(self))
    }
}

fn checked_len<T: StreamElement>(store: &DataStore<T>, tuples: usize) -> Result<usize> {
    if tuples > store.number_of_tuples() {
        return Err(Error::IndexOutOfRange {
            axis: "tuple",
            index: tuples,
            len: store.number_of_tuples(),
        });
    }
    Ok(tuples * store.number_of_components())
}

/// Fill the first `tuples` tuples of a typed store from `reader`
pub fn read_typed<T: StreamElement, R: Read>(
    reader: &mut R,
    store: &mut DataStore<T>,
    tuples: usize,
) -> Result<()> {
    let len = checked_len(store, tuples)?;
    for slot in &mut store.as_mut_slice()[..len] {
        *slot = T::read_from(reader)?;
    }
    Ok(())
}

/// Write the first `tuples` tuples of a typed store to `writer`
pub fn write_typed<T: StreamElement, W: Write>(
    writer: &mut W,
    store: &DataStore<T>,
    tuples: usize,
) -> Result<()> {
    let len = checked_len(store, tuples)?;
    for value in &store.as_slice()[..len] {
        value.write_to(writer)?;
    }
    Ok(())
}

/// Fill the first `tuples` tuples of any allocated store from `reader`
///
/// A short stream surfaces as `Error::Io` with `UnexpectedEof`; tuples read
/// before the failure keep their new values.
pub fn read_tuples<R: Read>(reader: &mut R, store: &mut AnyDataStore, tuples: usize) -> Result<()> {
    with_typed_store!(
        store,
        s => read_typed(reader, s, tuples),
        _e => Err(Error::NotAllocated(DataPath::root()))
    )
}

/// Write the first `tuples` tuples of any allocated store to `writer`
pub fn write_tuples<W: Write>(writer: &mut W, store: &AnyDataStore, tuples: usize) -> Result<()> {
    with_typed_store!(
        store,
        s => write_typed(writer, s, tuples),
        _e => Err(Error::NotAllocated(DataPath::root()))
    )
}
