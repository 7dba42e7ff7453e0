//! Typed data stores
//!
//! A [`DataStore<T>`] owns the buffer of one data array: `number_of_tuples *
//! number_of_components` elements laid out tuple-major. [`AnyDataStore`] is the
//! closed sum over every element kind plus [`EmptyDataStore`], a metadata-only
//! placeholder created when actions run in preflight mode.
//!
//! # Typed access
//!
//! | Call | Fails with |
//! |------|------------|
//! | `AnyDataStore::typed::<T>()` on another kind | `Error::TypeMismatch` |
//! | `AnyDataStore::typed::<T>()` on an empty store | `Error::NotAllocated` |
//! | `DataStore::get(tuple, component)` past the end | `Error::IndexOutOfRange` |

use tessera_core::{dispatch_data_type, shape_size, DataPath, DataType, Error, Result, Scalar, Shape};

/// Owned, typed buffer with a tuple shape and a component shape
#[derive(Debug, Clone, PartialEq)]
pub struct DataStore<T> {
    tuple_shape: Shape,
    component_shape: Shape,
    data: Vec<T>,
}

impl<T: Scalar> DataStore<T> {
    /// Allocate a store with every element set to `fill`
    pub fn new(tuple_shape: Shape, component_shape: Shape, fill: T) -> Self {
        let len = shape_size(&tuple_shape) * shape_size(&component_shape);
        Self {
            tuple_shape,
            component_shape,
            data: vec![fill; len],
        }
    }

    /// Wrap an existing buffer; its length must match the shapes
    pub fn from_vec(tuple_shape: Shape, component_shape: Shape, data: Vec<T>) -> Result<Self> {
        let expected = shape_size(&tuple_shape) * shape_size(&component_shape);
        if data.len() != expected {
            return Err(Error::ShapeMismatch {
                expected: vec![expected],
                actual: vec![data.len()],
            });
        }
        Ok(Self {
            tuple_shape,
            component_shape,
            data,
        })
    }

    /// Element kind
    pub fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    /// Tuple shape
    pub fn tuple_shape(&self) -> &[usize] {
        &self.tuple_shape
    }

    /// Component shape
    pub fn component_shape(&self) -> &[usize] {
        &self.component_shape
    }

    /// Number of tuples
    pub fn number_of_tuples(&self) -> usize {
        shape_size(&self.tuple_shape)
    }

    /// Number of components per tuple
    pub fn number_of_components(&self) -> usize {
        shape_size(&self.component_shape)
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the store holds no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check_index(&self, tuple: usize, component: usize) -> Result<usize> {
        let tuples = self.number_of_tuples();
        if tuple >= tuples {
            return Err(Error::IndexOutOfRange {
                axis: "tuple",
                index: tuple,
                len: tuples,
            });
        }
        let components = self.number_of_components();
        if component >= components {
            return Err(Error::IndexOutOfRange {
                axis: "component",
                index: component,
                len: components,
            });
        }
        Ok(tuple * components + component)
    }

    /// Read one element
    pub fn get(&self, tuple: usize, component: usize) -> Result<T> {
        let index = self.check_index(tuple, component)?;
        Ok(self.data[index])
    }

    /// Write one element
    pub fn set(&mut self, tuple: usize, component: usize, value: T) -> Result<()> {
        let index = self.check_index(tuple, component)?;
        self.data[index] = value;
        Ok(())
    }

    /// All components of one tuple
    pub fn tuple(&self, tuple: usize) -> Result<&[T]> {
        let start = self.check_index(tuple, 0)?;
        Ok(&self.data[start..start + self.number_of_components()])
    }

    /// All components of one tuple, mutable
    pub fn tuple_mut(&mut self, tuple: usize) -> Result<&mut [T]> {
        let start = self.check_index(tuple, 0)?;
        let end = start + self.number_of_components();
        Ok(&mut self.data[start..end])
    }

    /// Whole buffer, tuple-major
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Whole buffer, tuple-major, mutable
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Set every element to `value`
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Change the tuple shape; existing tuples keep their values, new slots
    /// are `T::default()`
    pub fn resize_tuples(&mut self, tuple_shape: Shape) {
        let len = shape_size(&tuple_shape) * self.number_of_components();
        self.data.resize(len, T::default());
        self.tuple_shape = tuple_shape;
    }
}

/// Metadata-only store used in preflight mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyDataStore {
    data_type: DataType,
    tuple_shape: Shape,
    component_shape: Shape,
}

impl EmptyDataStore {
    /// Describe a store without allocating it
    pub fn new(data_type: DataType, tuple_shape: Shape, component_shape: Shape) -> Self {
        Self {
            data_type,
            tuple_shape,
            component_shape,
        }
    }
}

/// A data store of any element kind
#[derive(Debug, Clone, PartialEq)]
pub enum AnyDataStore {
    /// `i8` elements
    Int8(DataStore<i8>),
    /// `u8` elements
    UInt8(DataStore<u8>),
    /// `i16` elements
    Int16(DataStore<i16>),
    /// `u16` elements
    UInt16(DataStore<u16>),
    /// `i32` elements
    Int32(DataStore<i32>),
    /// `u32` elements
    UInt32(DataStore<u32>),
    /// `i64` elements
    Int64(DataStore<i64>),
    /// `u64` elements
    UInt64(DataStore<u64>),
    /// `f32` elements
    Float32(DataStore<f32>),
    /// `f64` elements
    Float64(DataStore<f64>),
    /// `bool` elements
    Boolean(DataStore<bool>),
    /// Shape and kind only, no buffer
    Empty(EmptyDataStore),
}

/// Apply an expression to whichever typed store is inside an `AnyDataStore`
macro_rules! with_typed_store {
    ($any:expr, $s:ident => $body:expr, $e:ident => $empty:expr) => {
        match $any {
            AnyDataStore::Int8($s) => $body,
            AnyDataStore::UInt8($s) => $body,
            AnyDataStore::Int16($s) => $body,
            AnyDataStore::UInt16($s) => $body,
            AnyDataStore::Int32($s) => $body,
            AnyDataStore::UInt32($s) => $body,
            AnyDataStore::Int64($s) => $body,
            AnyDataStore::UInt64($s) => $body,
            AnyDataStore::Float32($s) => $body,
            AnyDataStore::Float64($s) => $body,
            AnyDataStore::Boolean($s) => $body,
            AnyDataStore::Empty($e) => $empty,
        }
    };
}

pub(crate) use with_typed_store;

/// Element types that have a variant in [`AnyDataStore`]
pub trait StoreElement: Scalar {
    /// Wrap a typed store
    fn into_any(store: DataStore<Self>) -> AnyDataStore;

    /// Borrow the typed store if the kind matches
    fn downcast_ref(any: &AnyDataStore) -> Option<&DataStore<Self>>;

    /// Mutably borrow the typed store if the kind matches
    fn downcast_mut(any: &mut AnyDataStore) -> Option<&mut DataStore<Self>>;
}

macro_rules! impl_store_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl StoreElement for $ty {
                fn into_any(store: DataStore<Self>) -> AnyDataStore {
                    AnyDataStore::$variant(store)
                }

                fn downcast_ref(any: &AnyDataStore) -> Option<&DataStore<Self>> {
                    match any {
                        AnyDataStore::$variant(s) => Some(s),
                        _ => None,
                    }
                }

                fn downcast_mut(any: &mut AnyDataStore) -> Option<&mut DataStore<Self>> {
                    match any {
                        AnyDataStore::$variant(s) => Some(s),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_store_element!(
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    bool => Boolean,
);

impl<T: StoreElement> From<DataStore<T>> for AnyDataStore {
    fn from(store: DataStore<T>) -> Self {
        T::into_any(store)
    }
}

impl AnyDataStore {
    /// Allocate a zero-filled store of the given kind
    pub fn allocate(data_type: DataType, tuple_shape: Shape, component_shape: Shape) -> Self {
        dispatch_data_type!(data_type, T => {
            T::into_any(DataStore::<T>::new(tuple_shape, component_shape, T::default()))
        })
    }

    /// Allocate a store of the given kind filled with a parsed value
    pub fn allocate_filled(
        data_type: DataType,
        tuple_shape: Shape,
        component_shape: Shape,
        fill: &str,
    ) -> Result<Self> {
        dispatch_data_type!(data_type, T => {
            let value = T::parse_value(fill)?;
            Ok(T::into_any(DataStore::<T>::new(tuple_shape, component_shape, value)))
        })
    }

    /// Metadata-only store
    pub fn empty(data_type: DataType, tuple_shape: Shape, component_shape: Shape) -> Self {
        AnyDataStore::Empty(EmptyDataStore::new(data_type, tuple_shape, component_shape))
    }

    /// Element kind
    pub fn data_type(&self) -> DataType {
        with_typed_store!(self, s => s.data_type(), e => e.data_type)
    }

    /// Tuple shape
    pub fn tuple_shape(&self) -> &[usize] {
        with_typed_store!(self, s => s.tuple_shape(), e => &e.tuple_shape)
    }

    /// Component shape
    pub fn component_shape(&self) -> &[usize] {
        with_typed_store!(self, s => s.component_shape(), e => &e.component_shape)
    }

    /// Number of tuples
    pub fn number_of_tuples(&self) -> usize {
        shape_size(self.tuple_shape())
    }

    /// Number of components per tuple
    pub fn number_of_components(&self) -> usize {
        shape_size(self.component_shape())
    }

    /// False for a metadata-only store
    pub fn is_allocated(&self) -> bool {
        !matches!(self, AnyDataStore::Empty(_))
    }

    /// Change the tuple shape, keeping existing tuples
    pub fn resize_tuples(&mut self, tuple_shape: Shape) {
        with_typed_store!(self, s => s.resize_tuples(tuple_shape), e => e.tuple_shape = tuple_shape)
    }

    /// Replace a metadata-only store with a zero-filled allocation of the same shape
    pub fn ensure_allocated(&mut self) {
        if let AnyDataStore::Empty(e) = self {
            *self = AnyDataStore::allocate(
                e.data_type,
                e.tuple_shape.clone(),
                e.component_shape.clone(),
            );
        }
    }

    /// Borrow as a typed store
    ///
    /// A metadata-only store reports `NotAllocated` with the root path; the
    /// data graph replaces it with the array's real path.
    pub fn typed<T: StoreElement>(&self) -> Result<&DataStore<T>> {
        if !self.is_allocated() {
            return Err(Error::NotAllocated(DataPath::root()));
        }
        T::downcast_ref(self).ok_or(Error::TypeMismatch {
            expected: T::DATA_TYPE,
            actual: self.data_type(),
        })
    }

    /// Mutably borrow as a typed store
    pub fn typed_mut<T: StoreElement>(&mut self) -> Result<&mut DataStore<T>> {
        if !self.is_allocated() {
            return Err(Error::NotAllocated(DataPath::root()));
        }
        let actual = self.data_type();
        T::downcast_mut(self).ok_or(Error::TypeMismatch {
            expected: T::DATA_TYPE,
            actual,
        })
    }

    /// Read one element widened to `f64`, whatever the kind
    pub fn get_as_f64(&self, tuple: usize, component: usize) -> Result<f64> {
        with_typed_store!(
            self,
            s => s.get(tuple, component).map(Scalar::to_f64),
            _e => Err(Error::NotAllocated(DataPath::root()))
        )
    }
}
