//! Device Memory Management
//!
//! Provides RAII wrappers for simulated device memory and the paired host
//! containers the harness transfers against.
//!
//! # Design Philosophy
//!
//! - **RAII**: device blocks are freed when the owning buffer drops
//! - **Type Safety**: buffers are generic over the element type, device
//!   pointers carry the type as a phantom parameter
//! - **Strided Layout**: a buffer holds a logical vector of `len` elements
//!   spaced `inc` apart, so the physical extent is `len * inc` elements
//!
//! Zero-length buffers are legal: they carry a null device pointer, are
//! never dereferenced, and all transfers on them are no-ops.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::mem;

use super::context::DeviceContext;
use crate::element::Element;
use crate::error::{HarnessError, Result};

// ============================================================================
// Device Pointer
// ============================================================================

/// Typed device pointer (simulated device memory address)
#[derive(Debug, PartialEq, Eq)]
pub struct DevPtr<T> {
    addr: u64,
    _marker: PhantomData<T>,
}

// Manual Copy/Clone implementations to not require T: Copy
impl<T> Copy for DevPtr<T> {}

impl<T> Clone for DevPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> DevPtr<T> {
    /// Create a null device pointer
    #[must_use]
    pub const fn null() -> Self {
        Self {
            addr: 0,
            _marker: PhantomData,
        }
    }

    /// Create from a raw device address
    pub(crate) const fn from_raw(addr: u64) -> Self {
        Self {
            addr,
            _marker: PhantomData,
        }
    }

    /// Get the raw device address
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.addr
    }

    /// Check if null
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.addr == 0
    }
}

// ============================================================================
// Device Heap
// ============================================================================

/// One device allocation, backed by `u64` words so that any element type up
/// to 8-byte alignment can be viewed through it.
struct Block {
    words: Box<[u64]>,
    bytes: usize,
}

/// Simulated device heap: allocation table plus a capacity limit
///
/// Addresses are opaque handles starting at 1, so 0 stays reserved as the
/// null pointer.
pub(crate) struct Heap {
    blocks: HashMap<u64, Block>,
    next_addr: u64,
    used: usize,
    limit: usize,
}

impl Heap {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            blocks: HashMap::new(),
            next_addr: 1,
            used: 0,
            limit,
        }
    }

    /// Allocate `bytes` of device memory, rounded up to whole words
    pub(crate) fn alloc(&mut self, bytes: usize) -> std::result::Result<u64, String> {
        if self.used + bytes > self.limit {
            return Err(format!(
                "out of device memory: {} requested, {} of {} in use",
                bytes, self.used, self.limit
            ));
        }
        let words = bytes.div_ceil(mem::size_of::<u64>());
        let addr = self.next_addr;
        self.next_addr += 1;
        self.blocks.insert(
            addr,
            Block {
                words: vec![0u64; words].into_boxed_slice(),
                bytes,
            },
        );
        self.used += bytes;
        Ok(addr)
    }

    pub(crate) fn free(&mut self, addr: u64) {
        if let Some(block) = self.blocks.remove(&addr) {
            self.used -= block.bytes;
        }
    }

    /// View an allocation as a typed slice of `len` elements
    pub(crate) fn slice<T: Element>(
        &self,
        ptr: DevPtr<T>,
        len: usize,
    ) -> std::result::Result<&[T], String> {
        let block = self
            .blocks
            .get(&ptr.as_raw())
            .ok_or_else(|| format!("invalid device pointer {:#x}", ptr.as_raw()))?;
        if len * mem::size_of::<T>() > block.bytes {
            return Err(format!(
                "device access out of bounds: {} elements in a {}-byte block",
                len, block.bytes
            ));
        }
        // SAFETY: the block is u64-backed so alignment covers f32/f64, the
        // length was bounds-checked against the allocation size, and Element
        // types are plain-old-data.
        Ok(unsafe { std::slice::from_raw_parts(block.words.as_ptr().cast::<T>(), len) })
    }

    /// View an allocation as a mutable typed slice of `len` elements
    pub(crate) fn slice_mut<T: Element>(
        &mut self,
        ptr: DevPtr<T>,
        len: usize,
    ) -> std::result::Result<&mut [T], String> {
        let block = self
            .blocks
            .get_mut(&ptr.as_raw())
            .ok_or_else(|| format!("invalid device pointer {:#x}", ptr.as_raw()))?;
        if len * mem::size_of::<T>() > block.bytes {
            return Err(format!(
                "device access out of bounds: {} elements in a {}-byte block",
                len, block.bytes
            ));
        }
        // SAFETY: same invariants as `slice`, with exclusive access through
        // the mutable borrow of the heap.
        Ok(unsafe { std::slice::from_raw_parts_mut(block.words.as_mut_ptr().cast::<T>(), len) })
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }
}

// ============================================================================
// Host Buffer
// ============================================================================

/// Host-resident strided buffer
///
/// Holds a logical vector of `len` elements with increment `inc` between
/// consecutive logical elements; the backing storage spans the full physical
/// extent so generated inputs can fill it end to end.
#[derive(Debug, Clone, PartialEq)]
pub struct HostBuffer<T> {
    data: Vec<T>,
    len: usize,
    inc: usize,
}

impl<T: Element> HostBuffer<T> {
    /// Create a zero-filled host buffer of `len` logical elements
    #[must_use]
    pub fn new(len: usize, inc: usize) -> Self {
        let inc = inc.max(1);
        Self {
            data: vec![T::default(); len * inc],
            len,
            inc,
        }
    }

    /// Logical element count
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the buffer holds no logical elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Increment between consecutive logical elements
    #[must_use]
    pub fn inc(&self) -> usize {
        self.inc
    }

    /// Physical element count (`len * inc`)
    #[must_use]
    pub fn physical_len(&self) -> usize {
        self.data.len()
    }

    /// Full physical storage
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Full physical storage, mutable
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

// ============================================================================
// Device Buffer
// ============================================================================

/// Device-resident strided buffer with RAII cleanup
///
/// The buffer owns its device allocation and frees it on drop. Transfers are
/// synchronous from the caller's perspective: they first drain any queued
/// device work, so a transfer back always observes completed kernel output.
///
/// # Example
///
/// ```
/// use comprobar::driver::{DeviceBuffer, DeviceContext, HostBuffer};
///
/// let ctx = DeviceContext::new();
/// let mut host = HostBuffer::<f32>::new(16, 1);
/// host.as_mut_slice()[0] = 2.5;
///
/// let mut dev = DeviceBuffer::new(&ctx, 16, 1).unwrap();
/// dev.copy_from_host(&host).unwrap();
///
/// let mut back = HostBuffer::<f32>::new(16, 1);
/// dev.copy_to_host(&mut back).unwrap();
/// assert_eq!(back.as_slice()[0], 2.5);
/// ```
pub struct DeviceBuffer<T> {
    ctx: DeviceContext,
    ptr: DevPtr<T>,
    len: usize,
    inc: usize,
}

impl<T: Element> DeviceBuffer<T> {
    /// Allocate a device buffer of `len` logical elements
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Allocation`] if the device heap is exhausted.
    pub fn new(ctx: &DeviceContext, len: usize, inc: usize) -> Result<Self> {
        let inc = inc.max(1);
        let bytes = len * inc * mem::size_of::<T>();
        let ptr = if bytes == 0 {
            DevPtr::null()
        } else {
            DevPtr::from_raw(ctx.alloc(bytes)?)
        };
        Ok(Self {
            ctx: ctx.clone(),
            ptr,
            len,
            inc,
        })
    }

    /// Logical element count
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the buffer holds no logical elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Increment between consecutive logical elements
    #[must_use]
    pub fn inc(&self) -> usize {
        self.inc
    }

    /// Physical element count (`len * inc`)
    #[must_use]
    pub fn physical_len(&self) -> usize {
        self.len * self.inc
    }

    /// Size of the allocation in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.physical_len() * mem::size_of::<T>()
    }

    /// Device pointer backing this buffer
    #[must_use]
    pub fn ptr(&self) -> DevPtr<T> {
        self.ptr
    }

    /// Copy the paired host buffer's contents to the device
    ///
    /// Drains queued device work first, so the upload is ordered after every
    /// previously launched kernel.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transfer`] on shape mismatch and
    /// [`HarnessError::Execution`] if draining queued work fails.
    pub fn copy_from_host(&mut self, host: &HostBuffer<T>) -> Result<()> {
        self.check_shape(host)?;
        if self.physical_len() == 0 {
            return Ok(());
        }
        self.ctx.synchronize()?;
        let ptr = self.ptr;
        let n = self.physical_len();
        self.ctx.with_heap(|heap| {
            let dst = heap.slice_mut::<T>(ptr, n).map_err(HarnessError::Transfer)?;
            dst.copy_from_slice(host.as_slice());
            Ok(())
        })
    }

    /// Copy the device contents back into the paired host buffer
    ///
    /// A mandatory synchronization point: queued kernels complete before the
    /// read.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transfer`] on shape mismatch and
    /// [`HarnessError::Execution`] if draining queued work fails.
    pub fn copy_to_host(&self, host: &mut HostBuffer<T>) -> Result<()> {
        self.check_shape(host)?;
        if self.physical_len() == 0 {
            return Ok(());
        }
        self.ctx.synchronize()?;
        let ptr = self.ptr;
        let n = self.physical_len();
        self.ctx.with_heap(|heap| {
            let src = heap.slice::<T>(ptr, n).map_err(HarnessError::Transfer)?;
            host.as_mut_slice().copy_from_slice(src);
            Ok(())
        })
    }

    fn check_shape(&self, host: &HostBuffer<T>) -> Result<()> {
        if host.len() != self.len || host.inc() != self.inc {
            return Err(HarnessError::Transfer(format!(
                "shape mismatch: host {}x{} vs device {}x{}",
                host.len(),
                host.inc(),
                self.len,
                self.inc
            )));
        }
        Ok(())
    }
}

impl<T> Drop for DeviceBuffer<T> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            self.ctx.free(self.ptr.as_raw());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
