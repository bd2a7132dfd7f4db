//! Dtype descriptor abstraction.
//!
//! The original source relies on an external descriptor object (a numpy
//! `PyArray_Descr`) with opaque element layout. Here it is a small owned
//! value: a vector of [`ElementDesc`] plus a [`Layout`] saying whether the
//! table is one shared descriptor applied to every column (2-D, homogeneous)
//! or one descriptor per column (1-D of records, structured).

/// Byte order a fixed-width element should be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Native,
    Little,
    Big,
}

impl ByteOrder {
    pub(crate) fn is_native(self) -> bool {
        match self {
            ByteOrder::Native => true,
            ByteOrder::Little => cfg!(target_endian = "little"),
            ByteOrder::Big => cfg!(target_endian = "big"),
        }
    }
}

/// The scalar kind a single output column parses into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Bool,
    /// Fixed-width narrow (Latin-1/byte) string cell, `elsize` bytes.
    NarrowString,
    /// Fixed-width wide (UCS-4) string cell, `elsize` bytes (`elsize / 4` code points).
    WideString,
    /// Catch-all: route through a caller-supplied text/bytes-to-value function.
    Generic,
}

/// Output element descriptor for one logical column.
#[derive(Clone)]
pub struct ElementDesc {
    pub kind: ElementKind,
    /// Byte size of one element. Required (and the only thing that matters)
    /// for `NarrowString`/`WideString`; derived from `kind` otherwise.
    pub size: usize,
    pub byte_order: ByteOrder,
}

impl ElementDesc {
    pub fn new(kind: ElementKind) -> Self {
        let size = default_size(kind);
        ElementDesc {
            kind,
            size,
            byte_order: ByteOrder::Native,
        }
    }

    pub fn with_size(kind: ElementKind, size: usize) -> Self {
        ElementDesc {
            kind,
            size,
            byte_order: ByteOrder::Native,
        }
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }
}

fn default_size(kind: ElementKind) -> usize {
    match kind {
        ElementKind::Int8 | ElementKind::UInt8 | ElementKind::Bool => 1,
        ElementKind::Int16 | ElementKind::UInt16 => 2,
        ElementKind::Int32 | ElementKind::UInt32 | ElementKind::Float32 => 4,
        ElementKind::Int64 | ElementKind::UInt64 | ElementKind::Float64 | ElementKind::Complex64 => 8,
        ElementKind::Complex128 => 16,
        ElementKind::NarrowString | ElementKind::WideString | ElementKind::Generic => 0,
    }
}

/// Whether output columns share one element descriptor or each has its own.
#[derive(Clone)]
pub enum Layout {
    /// All columns share `elements[0]`; result is rows × columns.
    Homogeneous,
    /// Each column has its own descriptor and byte offset; result is rows of records.
    Structured { offsets: Vec<usize> },
}

/// A full output schema: one [`ElementDesc`] per homogeneous column family
/// (length 1) or per structured field (length N), plus the layout tag.
#[derive(Clone)]
pub struct Schema {
    pub elements: Vec<ElementDesc>,
    pub layout: Layout,
}

impl Schema {
    /// A 2-D homogeneous schema: every selected column parsed with `element`.
    pub fn homogeneous(element: ElementDesc) -> Self {
        Schema {
            elements: vec![element],
            layout: Layout::Homogeneous,
        }
    }

    /// A 1-D structured schema: one descriptor (and byte offset) per field.
    ///
    /// `elements[i]` is written at `offsets[i]` within the record's byte arena.
    pub fn structured(elements: Vec<ElementDesc>, offsets: Vec<usize>) -> Self {
        debug_assert_eq!(elements.len(), offsets.len());
        Schema {
            elements,
            layout: Layout::Structured { offsets },
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self.layout, Layout::Structured { .. })
    }

    /// Number of output columns this schema describes (structured only;
    /// homogeneous schemas don't fix a column count on their own).
    pub fn field_count(&self) -> usize {
        match &self.layout {
            Layout::Homogeneous => self.elements.len().max(1),
            Layout::Structured { offsets } => offsets.len(),
        }
    }

    /// Size in bytes of one logical row/record under this schema.
    ///
    /// For a homogeneous schema the caller must supply the number of
    /// selected output columns, since the schema itself only fixes the
    /// per-cell size; a structured schema already fixes its own width.
    pub fn row_size(&self, num_cols: usize) -> usize {
        match &self.layout {
            Layout::Homogeneous => self.elements[0].size * num_cols,
            Layout::Structured { offsets } => offsets
                .iter()
                .zip(self.elements.iter())
                .map(|(&off, el)| off + el.size)
                .max()
                .unwrap_or(0),
        }
    }
}

/// Stand-in for "whatever opaque object type the embedding host would
/// normally allocate" for the catch-all `Generic` element kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericValue {
    Bytes(Vec<u8>),
    Text(String),
}
