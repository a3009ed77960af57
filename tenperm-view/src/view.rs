//! Read-only and writable views binding a [`TensorShape`] to borrowed data.

use std::marker::PhantomData;

use crate::shape::{Layout, TensorShape};
use crate::{Result, TransError};

fn check_span(len: usize, shape: &TensorShape) -> Result<()> {
    let required = shape.span();
    if len < required {
        return Err(TransError::BufferTooSmall { required, len });
    }
    Ok(())
}

// ============================================================================
// TensorView
// ============================================================================

/// Immutable view of a (sub-)tensor. Does not own its data.
pub struct TensorView<'a, T> {
    ptr: *const T,
    shape: TensorShape,
    _marker: PhantomData<&'a [T]>,
}

unsafe impl<T: Sync> Send for TensorView<'_, T> {}
unsafe impl<T: Sync> Sync for TensorView<'_, T> {}

impl<T> Clone for TensorView<'_, T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            shape: self.shape.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for TensorView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensorView")
            .field("shape", &self.shape)
            .finish()
    }
}

impl<'a, T> TensorView<'a, T> {
    /// Contiguous column-major view of `data` with the given sizes.
    pub fn new(data: &'a [T], sizes: &[usize]) -> Result<Self> {
        Self::with_shape(data, TensorShape::new(sizes, Layout::ColMajor)?)
    }

    /// View of `data` with an explicit geometry.
    pub fn with_shape(data: &'a [T], shape: TensorShape) -> Result<Self> {
        check_span(data.len(), &shape)?;
        Ok(Self {
            ptr: data.as_ptr(),
            shape,
            _marker: PhantomData,
        })
    }

    /// View over a raw allocation.
    ///
    /// # Safety
    /// `ptr` must be valid for reads of `shape.span()` elements for `'a`.
    pub unsafe fn from_raw(ptr: *const T, shape: TensorShape) -> Result<Self> {
        if ptr.is_null() {
            return Err(TransError::NullPointer);
        }
        Ok(Self {
            ptr,
            shape,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.shape.order()
    }

    /// Pointer to the start of the enclosing allocation.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    /// Pointer to the sub-tensor's first element.
    #[inline]
    pub fn base_ptr(&self) -> *const T {
        // Offsets were validated against the outer sizes.
        unsafe { self.ptr.offset(self.shape.base_offset()) }
    }

    /// The whole enclosing allocation.
    pub fn as_slice(&self) -> &'a [T] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.shape.span()) }
    }
}

impl<T: Copy> TensorView<'_, T> {
    /// Read one element of the sub-tensor.
    pub fn get(&self, indices: &[usize]) -> T {
        unsafe { *self.ptr.offset(self.shape.offset_of(indices)) }
    }
}

// ============================================================================
// TensorViewMut
// ============================================================================

/// Writable view of a (sub-)tensor. Does not own its data.
pub struct TensorViewMut<'a, T> {
    ptr: *mut T,
    shape: TensorShape,
    _marker: PhantomData<&'a mut [T]>,
}

unsafe impl<T: Send> Send for TensorViewMut<'_, T> {}

impl<T> std::fmt::Debug for TensorViewMut<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensorViewMut")
            .field("shape", &self.shape)
            .finish()
    }
}

impl<'a, T> TensorViewMut<'a, T> {
    /// Contiguous column-major view of `data` with the given sizes.
    pub fn new(data: &'a mut [T], sizes: &[usize]) -> Result<Self> {
        Self::with_shape(data, TensorShape::new(sizes, Layout::ColMajor)?)
    }

    /// View of `data` with an explicit geometry.
    pub fn with_shape(data: &'a mut [T], shape: TensorShape) -> Result<Self> {
        check_span(data.len(), &shape)?;
        Ok(Self {
            ptr: data.as_mut_ptr(),
            shape,
            _marker: PhantomData,
        })
    }

    /// View over a raw allocation.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `shape.span()` elements
    /// for `'a`, and not aliased by any other live reference.
    pub unsafe fn from_raw(ptr: *mut T, shape: TensorShape) -> Result<Self> {
        if ptr.is_null() {
            return Err(TransError::NullPointer);
        }
        Ok(Self {
            ptr,
            shape,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.shape.order()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }

    /// Pointer to the sub-tensor's first element.
    #[inline]
    pub fn base_ptr(&mut self) -> *mut T {
        unsafe { self.ptr.offset(self.shape.base_offset()) }
    }

    /// The whole enclosing allocation.
    pub fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.shape.span()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.shape.span()) }
    }
}

impl<T: Copy> TensorViewMut<'_, T> {
    pub fn get(&self, indices: &[usize]) -> T {
        unsafe { *self.ptr.offset(self.shape.offset_of(indices)) }
    }

    pub fn set(&mut self, indices: &[usize], value: T) {
        unsafe {
            *self.ptr.offset(self.shape.offset_of(indices)) = value;
        }
    }
}
