//! Fixed, versioned, little-endian wire types for the shuffle paths.
//!
//! All multi-byte integers in these structs are **little-endian** on the wire.
//! We store them pre-LE with `.to_le()` and decode with `from_le`.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::{align_of, size_of};

use crate::quad_error::QuadError;
use crate::topology::adjacency::{Edge, VertexId};

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

/// Receive-side length check shared by every exchange.
///
/// # Errors
/// [`QuadError::BufferSizeMismatch`] naming `neighbor` when `got != expected`.
pub fn expect_exact_len(neighbor: usize, expected: usize, got: usize) -> Result<(), QuadError> {
    if got == expected {
        Ok(())
    } else {
        Err(QuadError::BufferSizeMismatch {
            neighbor,
            expected,
            got,
        })
    }
}

/// Copy `raw` into a fresh, properly aligned vector of records.
///
/// # Errors
/// [`QuadError::CorruptPayload`] if `raw` is not a whole number of records.
pub fn decode_records<T: Pod>(raw: &[u8], neighbor: usize) -> Result<Vec<T>, QuadError> {
    let width = size_of::<T>();
    if width == 0 || raw.len() % width != 0 {
        return Err(QuadError::corrupt(
            neighbor,
            format!(
                "{} bytes is not a whole number of {width}-byte records",
                raw.len()
            ),
        ));
    }
    let mut out = vec![T::zeroed(); raw.len() / width];
    cast_slice_mut(&mut out).copy_from_slice(raw);
    Ok(out)
}

/// Bump when the layout or semantics change in incompatible ways.
pub const WIRE_VERSION: u16 = 1;

/// Record count announced in the size round.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u32,
}

impl WireCount {
    pub fn new(n: usize) -> Self {
        Self {
            n_le: (n as u32).to_le(),
        }
    }
    pub fn get(&self) -> usize {
        u32::from_le(self.n_le) as usize
    }
}

/// Graph header sent ahead of a broadcast edge list.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireGraphHdr {
    pub version_le: u16,
    pub _pad: [u8; 6],
    pub vertex_count_le: u64,
    pub edge_count_le: u64,
}

impl WireGraphHdr {
    pub fn new(vertex_count: usize, edge_count: usize) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            _pad: [0; 6],
            vertex_count_le: (vertex_count as u64).to_le(),
            edge_count_le: (edge_count as u64).to_le(),
        }
    }
    pub fn version(&self) -> u16 {
        u16::from_le(self.version_le)
    }
    pub fn vertex_count(&self) -> u64 {
        u64::from_le(self.vertex_count_le)
    }
    pub fn edge_count(&self) -> u64 {
        u64::from_le(self.edge_count_le)
    }
}

/// One undirected edge.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireEdge {
    pub u_le: u32,
    pub v_le: u32,
}

impl WireEdge {
    pub fn new((u, v): Edge) -> Self {
        Self {
            u_le: u.to_le(),
            v_le: v.to_le(),
        }
    }
    pub fn get(&self) -> Edge {
        (u32::from_le(self.u_le), u32::from_le(self.v_le))
    }
}

/// A wedge `(v1, v2, center)` with `v1 <= v2`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireWedge {
    pub v1_le: u32,
    pub v2_le: u32,
    pub center_le: u32,
}

impl WireWedge {
    pub fn new(v1: VertexId, v2: VertexId, center: VertexId) -> Self {
        Self {
            v1_le: v1.to_le(),
            v2_le: v2.to_le(),
            center_le: center.to_le(),
        }
    }
    pub fn decode(&self) -> (VertexId, VertexId, VertexId) {
        (
            u32::from_le(self.v1_le),
            u32::from_le(self.v2_le),
            u32::from_le(self.center_le),
        )
    }
}

/// A partial per-vertex total.
/// NOTE: explicit padding keeps `count_le` 8-byte aligned.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireVertexCount {
    pub vertex_le: u32,
    pub _pad: u32,
    pub count_le: i64,
}

impl WireVertexCount {
    pub fn new(vertex: VertexId, count: i64) -> Self {
        Self {
            vertex_le: vertex.to_le(),
            _pad: 0,
            count_le: count.to_le(),
        }
    }
    pub fn decode(&self) -> (VertexId, i64) {
        (u32::from_le(self.vertex_le), i64::from_le(self.count_le))
    }
}

/// A single signed total (sum-reduce payload).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireTotal {
    pub value_le: i64,
}

impl WireTotal {
    pub fn new(value: i64) -> Self {
        Self {
            value_le: value.to_le(),
        }
    }
    pub fn get(&self) -> i64 {
        i64::from_le(self.value_le)
    }
}

// ===== Compile-time sanity checks =========================================

const_assert_eq!(size_of::<WireCount>(), 4);
const_assert_eq!(size_of::<WireGraphHdr>(), 24);
const_assert_eq!(size_of::<WireEdge>(), 8);
const_assert_eq!(size_of::<WireWedge>(), 12);
const_assert_eq!(size_of::<WireVertexCount>(), 16);
const_assert_eq!(align_of::<WireVertexCount>(), 8);
const_assert_eq!(size_of::<WireTotal>(), 8);
