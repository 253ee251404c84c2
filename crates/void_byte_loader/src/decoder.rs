//! Model decoders - the deserialization routine run by a loader
//!
//! Generated loaders read the byte stream sequentially and keep every
//! object they create in an index table so later records can refer to
//! earlier ones. [`DecodeContext`] bundles both; it lives only for the
//! duration of one load and is dropped together with the bytes.

use std::any::{type_name, Any};
use std::marker::PhantomData;

use crate::error::{DecodeError, DecodeResult};
use crate::reader::ByteReader;

/// Context handed to a decoder for one load
pub struct DecodeContext<'a> {
    /// Name of the loader being decoded
    pub name: &'a str,
    reader: ByteReader<'a>,
    objects: Vec<Option<Box<dyn Any + Send>>>,
}

impl<'a> DecodeContext<'a> {
    /// Create a context over a byte buffer
    pub fn new(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            reader: ByteReader::new(data),
            objects: Vec::new(),
        }
    }

    /// The binary reader
    pub fn reader(&mut self) -> &mut ByteReader<'a> {
        &mut self.reader
    }

    /// Reserve capacity for about `count` objects.
    ///
    /// `count` usually comes from the byte stream, so the reservation is
    /// capped at the number of unread bytes. No slots are created.
    pub fn reserve_objects(&mut self, count: usize) {
        self.objects.reserve(count.min(self.reader.remaining()));
    }

    /// Store an object, returning its index
    pub fn push_object<T: Any + Send>(&mut self, value: T) -> usize {
        self.objects.push(Some(Box::new(value)));
        self.objects.len() - 1
    }

    /// Borrow an object by index
    pub fn object<T: Any>(&self, index: usize) -> DecodeResult<&T> {
        self.objects
            .get(index)
            .and_then(|slot| slot.as_ref())
            .ok_or(DecodeError::MissingObject(index))?
            .downcast_ref::<T>()
            .ok_or(DecodeError::ObjectType {
                index,
                expected: type_name::<T>(),
            })
    }

    /// Mutably borrow an object by index
    pub fn object_mut<T: Any>(&mut self, index: usize) -> DecodeResult<&mut T> {
        self.objects
            .get_mut(index)
            .and_then(|slot| slot.as_mut())
            .ok_or(DecodeError::MissingObject(index))?
            .downcast_mut::<T>()
            .ok_or(DecodeError::ObjectType {
                index,
                expected: type_name::<T>(),
            })
    }

    /// Move an object out of the table, leaving its slot empty
    pub fn take_object<T: Any>(&mut self, index: usize) -> DecodeResult<T> {
        let slot = self
            .objects
            .get_mut(index)
            .ok_or(DecodeError::MissingObject(index))?;

        match slot.take() {
            Some(boxed) => match boxed.downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(boxed) => {
                    *slot = Some(boxed);
                    Err(DecodeError::ObjectType {
                        index,
                        expected: type_name::<T>(),
                    })
                }
            },
            None => Err(DecodeError::MissingObject(index)),
        }
    }

    /// Number of object slots
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

/// A deserialization routine producing one model from raw bytes
pub trait ModelDecoder: Send + Sync + 'static {
    /// Model type this decoder produces
    type Model: Send + Sync + 'static;

    /// Decode a model
    fn decode(&self, ctx: &mut DecodeContext<'_>) -> DecodeResult<Self::Model>;
}

/// Decoder backed by a closure
pub struct FnDecoder<F, M> {
    decode: F,
    _marker: PhantomData<fn() -> M>,
}

impl<F, M> FnDecoder<F, M>
where
    F: Fn(&mut DecodeContext<'_>) -> DecodeResult<M> + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    pub fn new(decode: F) -> Self {
        Self {
            decode,
            _marker: PhantomData,
        }
    }
}

impl<F, M> ModelDecoder for FnDecoder<F, M>
where
    F: Fn(&mut DecodeContext<'_>) -> DecodeResult<M> + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    type Model = M;

    fn decode(&self, ctx: &mut DecodeContext<'_>) -> DecodeResult<M> {
        (self.decode)(ctx)
    }
}
