//! Device Context Management
//!
//! The execution handle for the simulated device. One context owns the
//! device heap, the command queue, the device clock, the memory-size-query
//! state, and the committed scratch workspace: the pieces a kernel launch
//! negotiates with.
//!
//! # Design Philosophy
//!
//! The harness is single-threaded and synchronous from the caller's
//! perspective, so the handle is a cheap `Rc` clone rather than a shared
//! global: buffers hold their own handle and the context is never sent
//! across threads.
//!
//! Launches are asynchronous relative to the issuing code: a kernel
//! validates its arguments at launch time and queues its body, which runs
//! when the stream is next drained. Timestamps taken through
//! [`DeviceContext::time_us_sync`] therefore bracket real execution, not
//! dispatch.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

use super::memory::Heap;
use crate::error::{HarnessError, Result};

/// Queued device work: runs against the heap at the next sync point
pub(crate) type DeviceOp = Box<dyn FnOnce(&mut Heap) -> std::result::Result<(), String>>;

/// Default device heap capacity (bytes)
const DEFAULT_HEAP_LIMIT: usize = 256 * 1024 * 1024;

// ============================================================================
// Configuration
// ============================================================================

/// Construction-time device parameters
#[derive(Debug, Clone, Copy)]
pub struct DeviceConfig {
    /// Device heap capacity in bytes
    pub heap_limit: usize,
    /// Whether the runtime grows kernel scratch memory on demand
    ///
    /// When `false`, callers must negotiate the workspace size up front via
    /// the query protocol before launching for real.
    pub realloc_on_demand: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            heap_limit: DEFAULT_HEAP_LIMIT,
            realloc_on_demand: true,
        }
    }
}

/// Profiling layer configuration armed on the context
///
/// A best-effort side channel: arming it never changes execution or timing
/// semantics, it only makes the context count launches while armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileLayer {
    /// Maximum nesting depth recorded by the profiling layer
    pub max_levels: u32,
    /// Also record kernel-level detail
    pub log_kernels: bool,
}

// ============================================================================
// Device Context
// ============================================================================

struct ContextInner {
    heap: RefCell<Heap>,
    queue: RefCell<VecDeque<DeviceOp>>,
    /// `Some(bytes)` while a memory-size query is armed
    query: Cell<Option<usize>>,
    /// Committed scratch workspace: (device address, bytes)
    workspace: Cell<(u64, usize)>,
    profile: Cell<Option<ProfileLayer>>,
    profiled_launches: Cell<u64>,
    realloc_on_demand: bool,
    epoch: Instant,
}

/// Execution-context handle for the simulated device
///
/// Cloning the handle shares the same underlying device. The handle is
/// intentionally single-threaded (`Rc` inside); the harness never overlaps
/// kernel invocations.
#[derive(Clone)]
pub struct DeviceContext {
    inner: Rc<ContextInner>,
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceContext {
    /// Create a context with default parameters
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DeviceConfig::default())
    }

    /// Create a context with explicit parameters
    #[must_use]
    pub fn with_config(config: DeviceConfig) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                heap: RefCell::new(Heap::new(config.heap_limit)),
                queue: RefCell::new(VecDeque::new()),
                query: Cell::new(None),
                workspace: Cell::new((0, 0)),
                profile: Cell::new(None),
                profiled_launches: Cell::new(0),
                realloc_on_demand: config.realloc_on_demand,
                epoch: Instant::now(),
            }),
        }
    }

    /// Whether the runtime grows kernel scratch memory on demand
    #[must_use]
    pub fn realloc_on_demand(&self) -> bool {
        self.inner.realloc_on_demand
    }

    // ------------------------------------------------------------------------
    // Stream
    // ------------------------------------------------------------------------

    /// Block until all queued device work has completed
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Execution`] if a queued kernel body fails;
    /// the remaining queue is discarded.
    pub fn synchronize(&self) -> Result<()> {
        loop {
            let op = self.inner.queue.borrow_mut().pop_front();
            let Some(op) = op else {
                return Ok(());
            };
            let outcome = {
                let mut heap = self.inner.heap.borrow_mut();
                op(&mut heap)
            };
            if let Err(msg) = outcome {
                self.inner.queue.borrow_mut().clear();
                return Err(HarnessError::Execution(msg));
            }
        }
    }

    /// Synchronize, then read the device clock in microseconds
    ///
    /// This is the only sanctioned way to take a timing boundary: the
    /// timestamp is meaningful only once the execution stream is idle.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Execution`] if draining queued work fails.
    pub fn time_us_sync(&self) -> Result<f64> {
        self.synchronize()?;
        Ok(self.time_us())
    }

    /// Read the clock without synchronizing (host-side timing)
    #[must_use]
    pub fn time_us(&self) -> f64 {
        self.inner.epoch.elapsed().as_secs_f64() * 1e6
    }

    /// Number of queued, not-yet-executed device ops
    #[must_use]
    pub fn pending_ops(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    pub(crate) fn enqueue(&self, op: DeviceOp) {
        if self.inner.profile.get().is_some() {
            self.inner
                .profiled_launches
                .set(self.inner.profiled_launches.get() + 1);
        }
        self.inner.queue.borrow_mut().push_back(op);
    }

    // ------------------------------------------------------------------------
    // Memory-size query protocol
    // ------------------------------------------------------------------------

    /// Arm the memory-size query: subsequent launches report their scratch
    /// requirement instead of executing
    pub fn begin_size_query(&self) {
        self.inner.query.set(Some(0));
    }

    /// Disarm the query and return the largest requirement recorded
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Workspace`] if no query was armed.
    pub fn end_size_query(&self) -> Result<usize> {
        match self.inner.query.replace(None) {
            Some(bytes) => Ok(bytes),
            None => Err(HarnessError::Workspace(
                "no memory size query in progress".to_string(),
            )),
        }
    }

    /// Whether a memory-size query is currently armed
    #[must_use]
    pub fn size_query_active(&self) -> bool {
        self.inner.query.get().is_some()
    }

    /// Record a kernel's scratch requirement during an armed query
    ///
    /// Kernels call this from their query-mode path. Requirements
    /// max-accumulate so one query can cover several launches.
    pub fn record_workspace(&self, bytes: usize) {
        if let Some(current) = self.inner.query.get() {
            self.inner.query.set(Some(current.max(bytes)));
        }
    }

    /// Commit a scratch workspace of `bytes` for subsequent launches
    ///
    /// Replaces any previously committed workspace.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Allocation`] if the heap cannot hold it.
    pub fn set_workspace_size(&self, bytes: usize) -> Result<()> {
        let (old_addr, _) = self.inner.workspace.get();
        if old_addr != 0 {
            self.inner.heap.borrow_mut().free(old_addr);
        }
        if bytes == 0 {
            self.inner.workspace.set((0, 0));
            return Ok(());
        }
        let addr = self
            .inner
            .heap
            .borrow_mut()
            .alloc(bytes)
            .map_err(HarnessError::Allocation)?;
        self.inner.workspace.set((addr, bytes));
        Ok(())
    }

    /// Committed scratch workspace size in bytes
    #[must_use]
    pub fn workspace_size(&self) -> usize {
        self.inner.workspace.get().1
    }

    pub(crate) fn workspace_raw(&self) -> (u64, usize) {
        self.inner.workspace.get()
    }

    // ------------------------------------------------------------------------
    // Profiling layer
    // ------------------------------------------------------------------------

    /// Arm the profiling layer
    pub fn set_profile_layer(&self, layer: ProfileLayer) {
        self.inner.profile.set(Some(layer));
    }

    /// Currently armed profiling layer, if any
    #[must_use]
    pub fn profile_layer(&self) -> Option<ProfileLayer> {
        self.inner.profile.get()
    }

    /// Launches observed while the profiling layer was armed
    #[must_use]
    pub fn profiled_launches(&self) -> u64 {
        self.inner.profiled_launches.get()
    }

    // ------------------------------------------------------------------------
    // Heap access (buffers and kernel bodies)
    // ------------------------------------------------------------------------

    pub(crate) fn alloc(&self, bytes: usize) -> Result<u64> {
        self.inner
            .heap
            .borrow_mut()
            .alloc(bytes)
            .map_err(HarnessError::Allocation)
    }

    pub(crate) fn free(&self, addr: u64) {
        self.inner.heap.borrow_mut().free(addr);
    }

    pub(crate) fn with_heap<R>(&self, f: impl FnOnce(&mut Heap) -> R) -> R {
        f(&mut self.inner.heap.borrow_mut())
    }

    /// Bytes currently allocated on the device heap
    #[must_use]
    pub fn heap_used(&self) -> usize {
        self.inner.heap.borrow().used()
    }
}

// ============================================================================
// Tests
// ============================================================================
