// copyright 2017 Kaz Wesley

use libc::{
    self, c_void, MADV_HUGEPAGE, MAP_ANONYMOUS, MAP_HUGETLB, MAP_PRIVATE, PROT_READ, PROT_WRITE,
};
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

const HUGE_PAGE: usize = 1 << 21;

enum Type {
    Mmap { bytes: usize },
    Malloc,
}

/// A zero-initialized `[T]` outside the Rust heap, for plain-data `T`.
pub(crate) struct Mmap<T> {
    ptr: NonNull<T>,
    len: usize,
    typ: Type,
    _marker: PhantomData<T>,
}

// The mapping is uniquely owned.
unsafe impl<T: Send> Send for Mmap<T> {}

impl<T: Copy> Mmap<T> {
    /// Anonymous mapping backed by explicit huge pages.
    pub fn new_huge(len: usize) -> Option<Self> {
        let size = len.checked_mul(size_of::<T>())?;
        if size == 0 {
            return None;
        }
        let bytes = size.checked_add(HUGE_PAGE - 1)? / HUGE_PAGE * HUGE_PAGE;
        unsafe {
            let pmap = libc::mmap(
                ptr::null_mut(),
                bytes,
                PROT_READ | PROT_WRITE,
                MAP_PRIVATE | MAP_ANONYMOUS | MAP_HUGETLB,
                -1,
                0,
            );
            if pmap == libc::MAP_FAILED {
                return None;
            }
            Some(Mmap {
                ptr: NonNull::new(pmap as *mut T)?,
                len,
                typ: Type::Mmap { bytes },
                _marker: PhantomData,
            })
        }
    }

    /// Aligned allocation, advised toward transparent huge pages.
    pub fn new_slow(len: usize) -> Option<Self> {
        let size = len.checked_mul(size_of::<T>())?;
        if size == 0 {
            return None;
        }
        let align = align_of::<T>().max(size_of::<*mut c_void>()).max(4096);
        unsafe {
            let mut p = ptr::null_mut();
            if libc::posix_memalign(&mut p, align, size) != 0 {
                return None;
            }
            libc::madvise(p, size, MADV_HUGEPAGE);
            ptr::write_bytes(p as *mut u8, 0, size);
            Some(Mmap {
                ptr: NonNull::new(p as *mut T)?,
                len,
                typ: Type::Malloc,
                _marker: PhantomData,
            })
        }
    }

    pub fn is_huge(&self) -> bool {
        match self.typ {
            Type::Mmap { .. } => true,
            Type::Malloc => false,
        }
    }
}

impl<T> Drop for Mmap<T> {
    fn drop(&mut self) {
        unsafe {
            match self.typ {
                Type::Mmap { bytes } => {
                    libc::munmap(self.ptr.as_ptr() as *mut c_void, bytes);
                }
                Type::Malloc => libc::free(self.ptr.as_ptr() as *mut c_void),
            }
        }
    }
}

impl<T> Deref for Mmap<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> DerefMut for Mmap<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}
